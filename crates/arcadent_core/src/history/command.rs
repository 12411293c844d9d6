//! Reversible scene commands.
//!
//! # Responsibility
//! - Define the closed set of scene mutations as a tagged enum.
//! - Capture, at apply time, exactly the prior state each mutation
//!   overwrites, so inverses never re-query the scene later.
//!
//! # Invariants
//! - Applied records are immutable once created.
//! - `revert` after `reapply` (and vice versa) restores identical scene
//!   state, including element IDs, z-order and selection.

use crate::model::element::{AssetRef, Element, ElementId};
use crate::model::scene::{Scene, SceneResult};
use crate::model::transform::Transform;

/// One unit of scene mutation, dispatched by exhaustive match.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Place a new element at the top of the z-order.
    AddElement {
        asset: AssetRef,
        transform: Transform,
    },
    RemoveElement {
        id: ElementId,
    },
    SetTransform {
        id: ElementId,
        transform: Transform,
    },
    SetVisibility {
        id: ElementId,
        visible: bool,
    },
    Rename {
        id: ElementId,
        label: String,
    },
    /// Remove every element ("Effacer Toutes les Selles" / global reset).
    ClearAll,
    /// Show or hide every element at once.
    BulkSetVisibility {
        visible: bool,
    },
}

/// Executed command together with the state it overwrote.
///
/// `Added` and `Removed` store the full element so undo/redo cycles keep the
/// original ID and z-index instead of minting new ones.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Applied {
    Added {
        element: Element,
        index: usize,
    },
    Removed {
        element: Element,
        index: usize,
        /// Selection at removal time; removing a selected element clears
        /// the selection, so undo has to put it back.
        selected: Option<ElementId>,
    },
    TransformSet {
        id: ElementId,
        previous: Transform,
        next: Transform,
    },
    VisibilitySet {
        id: ElementId,
        previous: bool,
        next: bool,
    },
    Renamed {
        id: ElementId,
        previous: String,
        next: String,
    },
    Cleared {
        elements: Vec<Element>,
        selected: Option<ElementId>,
    },
    BulkVisibilitySet {
        previous: Vec<(ElementId, bool)>,
        next: bool,
    },
}

impl Applied {
    /// Applies the stored inverse to the scene.
    pub(crate) fn revert(&self, scene: &mut Scene) -> SceneResult<()> {
        match self {
            Self::Added { element, .. } => {
                scene.remove_element(element.id)?;
                Ok(())
            }
            Self::Removed {
                element,
                index,
                selected,
            } => {
                scene.insert_element(*index, element.clone())?;
                scene.select(*selected)
            }
            Self::TransformSet { id, previous, .. } => scene.set_transform(*id, *previous),
            Self::VisibilitySet { id, previous, .. } => scene.set_visibility(*id, *previous),
            Self::Renamed { id, previous, .. } => scene.rename(*id, previous.clone()),
            Self::Cleared { elements, selected } => {
                for (index, element) in elements.iter().enumerate() {
                    scene.insert_element(index, element.clone())?;
                }
                scene.select(*selected)
            }
            Self::BulkVisibilitySet { previous, .. } => {
                for (id, visible) in previous {
                    scene.set_visibility(*id, *visible)?;
                }
                Ok(())
            }
        }
    }

    /// Re-applies the forward mutation to the scene.
    pub(crate) fn reapply(&self, scene: &mut Scene) -> SceneResult<()> {
        match self {
            Self::Added { element, index } => scene.insert_element(*index, element.clone()),
            Self::Removed { element, .. } => {
                // Re-removal clears the selection again if it pointed at
                // this element, matching the original forward application.
                scene.remove_element(element.id)?;
                Ok(())
            }
            Self::TransformSet { id, next, .. } => scene.set_transform(*id, *next),
            Self::VisibilitySet { id, next, .. } => scene.set_visibility(*id, *next),
            Self::Renamed { id, next, .. } => scene.rename(*id, next.clone()),
            Self::Cleared { .. } => {
                scene.clear();
                Ok(())
            }
            Self::BulkVisibilitySet { previous, next } => {
                for (id, _) in previous {
                    scene.set_visibility(*id, *next)?;
                }
                Ok(())
            }
        }
    }
}
