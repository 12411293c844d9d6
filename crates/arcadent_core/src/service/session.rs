//! Design session facade.
//!
//! # Responsibility
//! - Bind one arch's saddle scene, tooth scene, histories, persistence and
//!   asset resolution behind the operations the UI shell calls.
//! - Decide load-time reconciliation for missing assets.
//!
//! # Invariants
//! - Saddle and tooth categories have independent histories.
//! - No two command applications interleave on one session (re-entrancy
//!   guard, single mutator).
//! - A failed reload leaves the prior in-memory state untouched.
//! - Layouts are persisted only on explicit `save`, never per mutation.

use crate::config::SessionConfig;
use crate::db::{open_db, DbError};
use crate::history::{History, HistoryError};
use crate::history::command::Command;
use crate::model::catalog;
use crate::model::element::{Arch, AssetCategory, Element, ElementId};
use crate::model::scene::{Scene, SceneError};
use crate::repo::layout_repo::{LayoutRepository, RepoError, SqliteLayoutRepository};
use crate::render::{
    AssetStore, AssetStoreError, CancelToken, CompositeError, CompositeLayer, Compositor,
};
use image::RgbaImage;
use log::{info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug)]
pub enum SessionError {
    /// A command application is already in flight on this session.
    Busy,
    Db(DbError),
    Repo(RepoError),
    History(HistoryError),
    Scene(SceneError),
    Asset(AssetStoreError),
    Composite(CompositeError),
}

impl SessionError {
    /// True for the empty-history no-op condition, which callers surface as
    /// a disabled action rather than a failure.
    pub fn is_empty_history(&self) -> bool {
        matches!(self, Self::History(HistoryError::Empty))
    }
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Busy => write!(f, "another command is being applied to this session"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::History(err) => write!(f, "{err}"),
            Self::Scene(err) => write!(f, "{err}"),
            Self::Asset(err) => write!(f, "{err}"),
            Self::Composite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Busy => None,
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::History(err) => Some(err),
            Self::Scene(err) => Some(err),
            Self::Asset(err) => Some(err),
            Self::Composite(err) => Some(err),
        }
    }
}

impl From<DbError> for SessionError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for SessionError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<HistoryError> for SessionError {
    fn from(value: HistoryError) -> Self {
        Self::History(value)
    }
}

impl From<SceneError> for SessionError {
    fn from(value: SceneError) -> Self {
        Self::Scene(value)
    }
}

impl From<AssetStoreError> for SessionError {
    fn from(value: AssetStoreError) -> Self {
        Self::Asset(value)
    }
}

impl From<CompositeError> for SessionError {
    fn from(value: CompositeError) -> Self {
        Self::Composite(value)
    }
}

struct Workspace {
    scene: Scene,
    history: History,
}

impl Workspace {
    fn new(scene: Scene, history_depth: usize) -> Self {
        Self {
            scene,
            history: History::new(history_depth),
        }
    }
}

/// One arch-mode editing session.
///
/// Owns two scenes (saddles, teeth) with independent undo timelines, the
/// layout database connection and the asset store.
pub struct Session<S: AssetStore> {
    arch: Arch,
    conn: Connection,
    store: S,
    saddles: Workspace,
    teeth: Workspace,
    /// Explicit or persisted background file name; `None` falls back to the
    /// catalog default for the arch.
    background: Option<String>,
    history_depth: usize,
    busy: bool,
}

impl<S: AssetStore> Session<S> {
    /// Opens the layout database, loads both scenes for the configured arch
    /// and reconciles missing assets.
    pub fn open(config: &SessionConfig, store: S) -> SessionResult<Self> {
        let conn = open_db(&config.db_path)?;
        let arch = config.arch;

        let (saddle_scene, tooth_scene, persisted_background) =
            load_arch_state(&conn, arch, &store)?;
        let background = config.background.clone().or(persisted_background);

        info!(
            "event=session_open module=service status=ok arch={arch:?} saddles={} teeth={}",
            saddle_scene.len(),
            tooth_scene.len()
        );

        Ok(Self {
            arch,
            conn,
            store,
            saddles: Workspace::new(saddle_scene, config.history_depth),
            teeth: Workspace::new(tooth_scene, config.history_depth),
            background,
            history_depth: config.history_depth,
            busy: false,
        })
    }

    pub fn arch(&self) -> Arch {
        self.arch
    }

    pub fn scene(&self, category: AssetCategory) -> &Scene {
        &self.workspace(category).scene
    }

    pub fn background(&self) -> &str {
        self.background
            .as_deref()
            .unwrap_or_else(|| catalog::default_background(self.arch))
    }

    /// Overrides the background choice; persisted on the next `save`.
    pub fn set_background(&mut self, path: Option<String>) {
        self.background = path;
    }

    /// Applies a command to the category's scene and records it for undo.
    ///
    /// Returns the created element ID for `Command::AddElement`.
    pub fn execute(
        &mut self,
        category: AssetCategory,
        command: Command,
    ) -> SessionResult<Option<ElementId>> {
        self.with_guard(|session| {
            let workspace = session.workspace_mut(category);
            let created = workspace.history.apply(&mut workspace.scene, command)?;
            Ok(created)
        })
    }

    /// Reverts the category's most recent command.
    ///
    /// # Errors
    /// An empty timeline reports `HistoryError::Empty`, a recoverable no-op
    /// (`SessionError::is_empty_history`).
    pub fn undo(&mut self, category: AssetCategory) -> SessionResult<()> {
        self.with_guard(|session| {
            let workspace = session.workspace_mut(category);
            workspace.history.undo(&mut workspace.scene)?;
            Ok(())
        })
    }

    /// Re-applies the category's most recently undone command.
    pub fn redo(&mut self, category: AssetCategory) -> SessionResult<()> {
        self.with_guard(|session| {
            let workspace = session.workspace_mut(category);
            workspace.history.redo(&mut workspace.scene)?;
            Ok(())
        })
    }

    pub fn can_undo(&self, category: AssetCategory) -> bool {
        self.workspace(category).history.can_undo()
    }

    pub fn can_redo(&self, category: AssetCategory) -> bool {
        self.workspace(category).history.can_redo()
    }

    pub fn select(
        &mut self,
        category: AssetCategory,
        id: Option<ElementId>,
    ) -> SessionResult<()> {
        self.workspace_mut(category).scene.select(id)?;
        Ok(())
    }

    pub fn selected(&self, category: AssetCategory) -> Option<ElementId> {
        self.workspace(category).scene.selected()
    }

    /// Persists both scenes and the background choice for this arch,
    /// replacing prior records atomically.
    pub fn save(&mut self) -> SessionResult<()> {
        let repo = SqliteLayoutRepository::new(&self.conn);
        repo.replace_arch(
            self.arch,
            self.background.as_deref(),
            &[&self.saddles.scene, &self.teeth.scene],
        )?;
        info!(
            "event=layout_save module=service status=ok arch={:?} saddles={} teeth={}",
            self.arch,
            self.saddles.scene.len(),
            self.teeth.scene.len()
        );
        Ok(())
    }

    /// Discards in-memory edits and histories and reloads both scenes from
    /// persistence.
    ///
    /// Destructive by contract; the shell warns the user before calling.
    /// On failure the prior in-memory state is left fully intact.
    pub fn reload(&mut self) -> SessionResult<()> {
        let (saddle_scene, tooth_scene, persisted_background) =
            load_arch_state(&self.conn, self.arch, &self.store)?;

        self.saddles = Workspace::new(saddle_scene, self.history_depth);
        self.teeth = Workspace::new(tooth_scene, self.history_depth);
        self.background = persisted_background;
        info!(
            "event=layout_reload module=service status=ok arch={:?}",
            self.arch
        );
        Ok(())
    }

    /// Seeds the tooth scene with the arch's full default dentition.
    ///
    /// No-op unless the tooth scene is empty; seeding is initial state, not
    /// an edit, so it bypasses the undo timeline.
    pub fn seed_default_teeth(&mut self) -> usize {
        if !self.teeth.scene.is_empty() {
            return 0;
        }
        let layout = catalog::default_tooth_layout(self.arch);
        let count = layout.len();
        for (asset, transform) in layout {
            self.teeth.scene.add_element(asset, transform);
        }
        count
    }

    /// Renders the flattened composite: background, then saddles, then
    /// teeth, each scene bottom-up.
    ///
    /// Only visible elements with resolvable assets contribute; elements
    /// flagged `missing_asset` are skipped rather than failing the export.
    /// All-or-nothing under cancellation.
    pub fn export_composite<C: Compositor>(
        &self,
        compositor: &C,
        cancel: &CancelToken,
    ) -> SessionResult<RgbaImage> {
        let background = self.store.resolve_background(self.background())?;

        let ordered: Vec<&Element> = self
            .saddles
            .scene
            .list_elements()
            .iter()
            .chain(self.teeth.scene.list_elements().iter())
            .filter(|element| element.visible && !element.missing_asset)
            .collect();

        let mut buffers = Vec::with_capacity(ordered.len());
        for element in &ordered {
            buffers.push(self.store.resolve(&element.asset)?);
        }

        let layers: Vec<CompositeLayer<'_>> = ordered
            .iter()
            .zip(buffers.iter())
            .map(|(element, pixels)| CompositeLayer {
                pixels,
                transform: element.transform,
            })
            .collect();

        let composite = compositor.render(&background, &layers, cancel)?;
        info!(
            "event=export_composite module=service status=ok arch={:?} layers={}",
            self.arch,
            layers.len()
        );
        Ok(composite)
    }

    fn workspace(&self, category: AssetCategory) -> &Workspace {
        match category {
            AssetCategory::Saddle => &self.saddles,
            AssetCategory::Tooth => &self.teeth,
        }
    }

    fn workspace_mut(&mut self, category: AssetCategory) -> &mut Workspace {
        match category {
            AssetCategory::Saddle => &mut self.saddles,
            AssetCategory::Tooth => &mut self.teeth,
        }
    }

    fn with_guard<T>(
        &mut self,
        operation: impl FnOnce(&mut Self) -> SessionResult<T>,
    ) -> SessionResult<T> {
        if self.busy {
            return Err(SessionError::Busy);
        }
        self.busy = true;
        let result = operation(self);
        self.busy = false;
        result
    }
}

/// Loads both category scenes and the background row for an arch, flagging
/// elements whose assets no longer resolve.
fn load_arch_state<S: AssetStore>(
    conn: &Connection,
    arch: Arch,
    store: &S,
) -> SessionResult<(Scene, Scene, Option<String>)> {
    let repo = SqliteLayoutRepository::new(conn);
    let mut saddle_scene = repo.load_scene(arch, AssetCategory::Saddle)?;
    let mut tooth_scene = repo.load_scene(arch, AssetCategory::Tooth)?;
    let background = repo.background(arch)?;

    reconcile_missing_assets(&mut saddle_scene, store);
    reconcile_missing_assets(&mut tooth_scene, store);

    Ok((saddle_scene, tooth_scene, background))
}

fn reconcile_missing_assets<S: AssetStore>(scene: &mut Scene, store: &S) {
    let missing: Vec<ElementId> = scene
        .list_elements()
        .iter()
        .filter(|element| !store.contains(&element.asset))
        .map(|element| element.id)
        .collect();

    for id in missing {
        // The element stays in the scene as a placeholder the user can fix
        // or remove explicitly; dropping it would silently lose data.
        if scene.set_missing_asset(id, true).is_ok() {
            if let Ok(element) = scene.get_element(id) {
                warn!(
                    "event=asset_missing module=service status=warn element={} asset={}",
                    id, element.asset.path
                );
            }
        }
    }
}
