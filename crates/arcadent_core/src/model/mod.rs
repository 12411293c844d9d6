//! Domain model for arch layout design.
//!
//! # Responsibility
//! - Define the canonical data structures used by core business logic.
//! - Keep one element-centric shape shared by editing, persistence and
//!   rendering.
//!
//! # Invariants
//! - Every placed element is identified by a stable `ElementId`.
//! - Scene insertion order is paint order.

pub mod catalog;
pub mod element;
pub mod scene;
pub mod transform;

pub use element::{Arch, AssetCategory, AssetRef, Element, ElementId};
pub use scene::{Scene, SceneError, SceneResult};
pub use transform::{Transform, TransformError};
