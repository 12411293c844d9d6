//! Undo/redo stacks over reversible scene commands.
//!
//! # Responsibility
//! - Execute commands against a scene and record their inverses.
//! - Walk the recorded timeline backwards (`undo`) and forwards (`redo`).
//!
//! # Invariants
//! - A new command application clears the redo stack (no branching
//!   timelines).
//! - `undo` then `redo` restores structurally identical scene state.
//! - Every application is all-or-nothing: a failed scene mutation records
//!   nothing.
//! - The undo stack is bounded; the oldest record is dropped when full.

pub mod command;

use crate::model::element::ElementId;
use crate::model::scene::{Scene, SceneError};
use crate::model::transform::TransformError;
use command::{Applied, Command};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default undo depth, matching the application's historical limit.
pub const DEFAULT_HISTORY_DEPTH: usize = 50;

pub type HistoryResult<T> = Result<T, HistoryError>;

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryError {
    /// Undo/redo requested with nothing recorded; recoverable, not fatal.
    Empty,
    Scene(SceneError),
    /// A command carried a transform violating the value invariants.
    Transform(TransformError),
}

impl Display for HistoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "nothing to undo or redo"),
            Self::Scene(err) => write!(f, "{err}"),
            Self::Transform(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HistoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Empty => None,
            Self::Scene(err) => Some(err),
            Self::Transform(err) => Some(err),
        }
    }
}

impl From<SceneError> for HistoryError {
    fn from(value: SceneError) -> Self {
        Self::Scene(value)
    }
}

impl From<TransformError> for HistoryError {
    fn from(value: TransformError) -> Self {
        Self::Transform(value)
    }
}

/// Bounded undo/redo timeline for one scene.
#[derive(Debug)]
pub struct History {
    undo_stack: Vec<Applied>,
    redo_stack: Vec<Applied>,
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_default_depth()
    }
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    pub fn with_default_depth() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }

    /// Executes a command against the scene and records its inverse.
    ///
    /// Returns the ID of the created element for `Command::AddElement`,
    /// `None` for every other variant.
    ///
    /// # Contract
    /// - Transforms carried by the command must satisfy the value
    ///   invariants; invalid ones are rejected before any mutation.
    /// - Prior state is captured before any mutation.
    /// - The redo stack is cleared on success.
    /// - On error the scene and both stacks are unchanged.
    pub fn apply(&mut self, scene: &mut Scene, command: Command) -> HistoryResult<Option<ElementId>> {
        let (applied, created) = match command {
            Command::AddElement { asset, transform } => {
                transform.validate()?;
                let index = scene.len();
                let id = scene.add_element(asset, transform);
                let element = scene.get_element(id)?.clone();
                (Applied::Added { element, index }, Some(id))
            }
            Command::RemoveElement { id } => {
                let selected = scene.selected();
                let (element, index) = scene.remove_element(id)?;
                (
                    Applied::Removed {
                        element,
                        index,
                        selected,
                    },
                    None,
                )
            }
            Command::SetTransform { id, transform } => {
                transform.validate()?;
                let previous = scene.get_element(id)?.transform;
                scene.set_transform(id, transform)?;
                (
                    Applied::TransformSet {
                        id,
                        previous,
                        next: transform,
                    },
                    None,
                )
            }
            Command::SetVisibility { id, visible } => {
                let previous = scene.get_element(id)?.visible;
                scene.set_visibility(id, visible)?;
                (
                    Applied::VisibilitySet {
                        id,
                        previous,
                        next: visible,
                    },
                    None,
                )
            }
            Command::Rename { id, label } => {
                let previous = scene.get_element(id)?.label.clone();
                scene.rename(id, label.clone())?;
                (
                    Applied::Renamed {
                        id,
                        previous,
                        next: label,
                    },
                    None,
                )
            }
            Command::ClearAll => {
                let selected = scene.selected();
                let elements = scene.clear();
                (Applied::Cleared { elements, selected }, None)
            }
            Command::BulkSetVisibility { visible } => {
                let previous: Vec<(ElementId, bool)> = scene
                    .list_elements()
                    .iter()
                    .map(|element| (element.id, element.visible))
                    .collect();
                for (id, _) in &previous {
                    scene.set_visibility(*id, visible)?;
                }
                (
                    Applied::BulkVisibilitySet {
                        previous,
                        next: visible,
                    },
                    None,
                )
            }
        };

        self.redo_stack.clear();
        self.undo_stack.push(applied);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        debug!(
            "event=command_applied module=history status=ok undo_depth={}",
            self.undo_stack.len()
        );
        Ok(created)
    }

    /// Reverts the most recent command.
    ///
    /// # Errors
    /// `HistoryError::Empty` when nothing is recorded; the caller treats this
    /// as a no-op.
    pub fn undo(&mut self, scene: &mut Scene) -> HistoryResult<()> {
        let applied = self.undo_stack.pop().ok_or(HistoryError::Empty)?;
        if let Err(err) = applied.revert(scene) {
            self.undo_stack.push(applied);
            return Err(err.into());
        }
        self.redo_stack.push(applied);
        Ok(())
    }

    /// Re-applies the most recently undone command.
    pub fn redo(&mut self, scene: &mut Scene) -> HistoryResult<()> {
        let applied = self.redo_stack.pop().ok_or(HistoryError::Empty)?;
        if let Err(err) = applied.reapply(scene) {
            self.redo_stack.push(applied);
            return Err(err.into());
        }
        self.undo_stack.push(applied);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Drops both stacks. Used by session reload, which starts a fresh
    /// timeline over freshly loaded scenes.
    pub fn reset(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
