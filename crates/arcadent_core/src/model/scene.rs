//! Ordered element collection for one arch/category pair.
//!
//! # Responsibility
//! - Own element lifecycle for a single design context.
//! - Preserve insertion order as paint (z-) order.
//!
//! # Invariants
//! - Element IDs are unique within a scene.
//! - Later elements draw on top of earlier ones.
//! - Mutations are all-or-nothing: a failed lookup changes nothing.

use crate::model::element::{AssetRef, Element, ElementId};
use crate::model::transform::Transform;
use crate::model::{Arch, AssetCategory};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SceneResult<T> = Result<T, SceneError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SceneError {
    NotFound(ElementId),
    /// Insertion of an element whose ID already exists in this scene.
    DuplicateId(ElementId),
}

impl Display for SceneError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "element not found: {id}"),
            Self::DuplicateId(id) => write!(f, "element id already present: {id}"),
        }
    }
}

impl Error for SceneError {}

/// All placed elements of one category on one arch, in paint order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    arch: Arch,
    category: AssetCategory,
    elements: Vec<Element>,
    selected: Option<ElementId>,
}

impl Scene {
    pub fn new(arch: Arch, category: AssetCategory) -> Self {
        Self {
            arch,
            category,
            elements: Vec::new(),
            selected: None,
        }
    }

    /// Rebuilds a scene from persisted elements, keeping the given order.
    pub fn from_elements(arch: Arch, category: AssetCategory, elements: Vec<Element>) -> Self {
        Self {
            arch,
            category,
            elements,
            selected: None,
        }
    }

    pub fn arch(&self) -> Arch {
        self.arch
    }

    pub fn category(&self) -> AssetCategory {
        self.category
    }

    /// Appends a fresh element at the top of the z-order.
    pub fn add_element(&mut self, asset: AssetRef, transform: Transform) -> ElementId {
        let element = Element::new(asset, transform);
        let id = element.id;
        self.elements.push(element);
        id
    }

    /// Re-inserts an existing element at an explicit index.
    ///
    /// Used by undo to restore exact z-order; `index` is clamped to the
    /// current length so a stale index can never panic.
    pub fn insert_element(&mut self, index: usize, element: Element) -> SceneResult<()> {
        if self.contains(element.id) {
            return Err(SceneError::DuplicateId(element.id));
        }
        let index = index.min(self.elements.len());
        self.elements.insert(index, element);
        Ok(())
    }

    /// Removes an element, returning it together with its z-index.
    ///
    /// Relative order of the remaining elements is preserved.
    pub fn remove_element(&mut self, id: ElementId) -> SceneResult<(Element, usize)> {
        let index = self.index_of(id)?;
        let element = self.elements.remove(index);
        if self.selected == Some(id) {
            self.selected = None;
        }
        Ok((element, index))
    }

    /// Removes every element, returning the prior list in paint order.
    pub fn clear(&mut self) -> Vec<Element> {
        self.selected = None;
        std::mem::take(&mut self.elements)
    }

    pub fn get_element(&self, id: ElementId) -> SceneResult<&Element> {
        self.elements
            .iter()
            .find(|element| element.id == id)
            .ok_or(SceneError::NotFound(id))
    }

    /// Elements in paint order, bottom first.
    pub fn list_elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.iter().any(|element| element.id == id)
    }

    pub fn set_transform(&mut self, id: ElementId, transform: Transform) -> SceneResult<()> {
        self.get_element_mut(id)?.transform = transform;
        Ok(())
    }

    pub fn set_visibility(&mut self, id: ElementId, visible: bool) -> SceneResult<()> {
        self.get_element_mut(id)?.visible = visible;
        Ok(())
    }

    pub fn rename(&mut self, id: ElementId, label: impl Into<String>) -> SceneResult<()> {
        self.get_element_mut(id)?.label = label.into();
        Ok(())
    }

    /// Marks an element as referencing an unresolvable asset.
    pub fn set_missing_asset(&mut self, id: ElementId, missing: bool) -> SceneResult<()> {
        self.get_element_mut(id)?.missing_asset = missing;
        Ok(())
    }

    /// Selects an element, or clears the selection with `None`.
    pub fn select(&mut self, id: Option<ElementId>) -> SceneResult<()> {
        if let Some(id) = id {
            if !self.contains(id) {
                return Err(SceneError::NotFound(id));
            }
        }
        self.selected = id;
        Ok(())
    }

    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    fn index_of(&self, id: ElementId) -> SceneResult<usize> {
        self.elements
            .iter()
            .position(|element| element.id == id)
            .ok_or(SceneError::NotFound(id))
    }

    fn get_element_mut(&mut self, id: ElementId) -> SceneResult<&mut Element> {
        self.elements
            .iter_mut()
            .find(|element| element.id == id)
            .ok_or(SceneError::NotFound(id))
    }
}
