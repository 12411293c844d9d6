//! Core scene engine for dental arch layout design.
//! This crate is the single source of truth for layout invariants:
//! transform consistency, undo/redo ordering and save/restore fidelity.

pub mod config;
pub mod db;
pub mod history;
pub mod logging;
pub mod model;
pub mod render;
pub mod repo;
pub mod service;

pub use config::{ConfigError, SessionConfig};
pub use history::command::Command;
pub use history::{History, HistoryError, DEFAULT_HISTORY_DEPTH};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::{
    Arch, AssetCategory, AssetRef, Element, ElementId, Scene, SceneError, Transform,
    TransformError,
};
pub use render::{
    AssetStore, AssetStoreError, CancelToken, CompositeError, CompositeLayer, Compositor,
    DirAssetStore, SoftwareCompositor,
};
pub use repo::layout_repo::{LayoutRepository, RepoError, RepoResult, SqliteLayoutRepository};
pub use service::session::{Session, SessionError, SessionResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
