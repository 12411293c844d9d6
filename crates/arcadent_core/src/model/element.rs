//! Placed element domain model.
//!
//! # Responsibility
//! - Define the canonical record for a saddle or tooth placed on an arch.
//! - Keep asset identity immutable once an element exists.
//!
//! # Invariants
//! - `id` is stable across save/load and never reused for another element.
//! - `asset` is never mutated after creation; repositioning goes through
//!   `transform`, replacement is a remove + add.
//! - `missing_asset` is derived at load-time reconciliation and never
//!   persisted.

use crate::model::transform::Transform;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a placed element.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type ElementId = Uuid;

/// The two independent design contexts of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arch {
    /// Maxillary arch ("arcade supérieure").
    Upper,
    /// Mandibular arch ("arcade inférieure").
    Lower,
}

/// Category of a placeable asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    /// Prosthetic saddle insert ("selle").
    Saddle,
    /// Numbered tooth marker ("dent").
    Tooth,
}

/// Immutable reference to an image asset in the asset store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    /// Asset file name relative to its category folder, e.g. `dent_36.png`.
    pub path: String,
    pub category: AssetCategory,
    pub arch: Arch,
}

impl AssetRef {
    pub fn new(path: impl Into<String>, category: AssetCategory, arch: Arch) -> Self {
        Self {
            path: path.into(),
            category,
            arch,
        }
    }

    /// Default display label derived from the file name, extension stripped.
    pub fn default_label(&self) -> String {
        match self.path.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem.to_string(),
            _ => self.path.clone(),
        }
    }
}

/// One placed instance on a scene canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Stable ID used for addressing, undo records and persistence rows.
    pub id: ElementId,
    pub asset: AssetRef,
    pub transform: Transform,
    /// Hidden elements are kept in the scene and in persistence but are
    /// excluded from composite export.
    pub visible: bool,
    /// Clinician-facing name, editable independently of the asset path.
    pub label: String,
    /// Set when the referenced asset failed to resolve at load time. The
    /// element is kept so the user can fix or remove it explicitly.
    #[serde(skip)]
    pub missing_asset: bool,
}

impl Element {
    /// Creates a new element with a generated stable ID and a default label.
    pub fn new(asset: AssetRef, transform: Transform) -> Self {
        let label = asset.default_label();
        Self::with_parts(Uuid::new_v4(), asset, transform, true, label)
    }

    /// Creates an element from already-known parts.
    ///
    /// Used by the load path and by undo records, where identity and state
    /// already exist.
    pub fn with_parts(
        id: ElementId,
        asset: AssetRef,
        transform: Transform,
        visible: bool,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id,
            asset,
            transform,
            visible,
            label: label.into(),
            missing_asset: false,
        }
    }
}
