//! Layout repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist placed elements and background choices per arch.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths must validate transforms before SQL mutations.
//! - Read paths must reject invalid persisted state instead of masking it.
//! - `replace_arch` is transactional: a failed save leaves the previously
//!   persisted rows for that arch untouched.

use crate::db::DbError;
use crate::model::element::{Arch, AssetCategory, AssetRef, Element, ElementId};
use crate::model::scene::Scene;
use crate::model::transform::{Transform, TransformError};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const ELEMENT_SELECT_SQL: &str = "SELECT
    element_id,
    asset_path,
    label,
    x,
    y,
    angle_deg,
    scale,
    flip_x,
    flip_y,
    visible
FROM elements";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for layout persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(TransformError),
    Db(DbError),
    NotFound(ElementId),
    InvalidData(String),
    /// A scene handed to `replace_arch` belongs to a different arch than
    /// the replace target; writing it would land outside the replaced set.
    ArchMismatch { expected: Arch, found: Arch },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "element not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted element data: {message}"),
            Self::ArchMismatch { expected, found } => write!(
                f,
                "scene arch {found:?} does not match replace target {expected:?}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
            Self::ArchMismatch { .. } => None,
        }
    }
}

impl From<TransformError> for RepoError {
    fn from(value: TransformError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for arch layout persistence.
pub trait LayoutRepository {
    /// Atomically replaces every persisted row for `arch` with the given
    /// scenes and background choice. Every scene must belong to `arch`.
    fn replace_arch(
        &self,
        arch: Arch,
        background: Option<&str>,
        scenes: &[&Scene],
    ) -> RepoResult<()>;

    /// Loads one scene in persisted paint order.
    fn load_scene(&self, arch: Arch, category: AssetCategory) -> RepoResult<Scene>;

    /// Returns the persisted background choice for `arch`, if any.
    fn background(&self, arch: Arch) -> RepoResult<Option<String>>;
}

/// SQLite-backed layout repository.
pub struct SqliteLayoutRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLayoutRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl LayoutRepository for SqliteLayoutRepository<'_> {
    fn replace_arch(
        &self,
        arch: Arch,
        background: Option<&str>,
        scenes: &[&Scene],
    ) -> RepoResult<()> {
        for scene in scenes {
            if scene.arch() != arch {
                return Err(RepoError::ArchMismatch {
                    expected: arch,
                    found: scene.arch(),
                });
            }
            for element in scene.list_elements() {
                element.transform.validate()?;
            }
        }

        // The repository borrows the connection immutably, so the atomic
        // replace runs under an unchecked transaction. Drop-on-error rolls
        // the delete back, keeping the last good save readable.
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "DELETE FROM elements WHERE arch = ?1;",
            [arch_to_db(arch)],
        )?;
        tx.execute(
            "DELETE FROM backgrounds WHERE arch = ?1;",
            [arch_to_db(arch)],
        )?;

        for scene in scenes {
            for (z_index, element) in scene.list_elements().iter().enumerate() {
                tx.execute(
                    "INSERT INTO elements (
                        arch,
                        category,
                        element_id,
                        asset_path,
                        label,
                        x,
                        y,
                        angle_deg,
                        scale,
                        flip_x,
                        flip_y,
                        visible,
                        z_index
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13);",
                    params![
                        arch_to_db(scene.arch()),
                        category_to_db(scene.category()),
                        element.id.to_string(),
                        element.asset.path.as_str(),
                        element.label.as_str(),
                        element.transform.x,
                        element.transform.y,
                        element.transform.angle_deg,
                        element.transform.scale,
                        bool_to_int(element.transform.flip_x),
                        bool_to_int(element.transform.flip_y),
                        bool_to_int(element.visible),
                        z_index as i64,
                    ],
                )?;
            }
        }

        if let Some(path) = background {
            tx.execute(
                "INSERT INTO backgrounds (arch, asset_path) VALUES (?1, ?2);",
                params![arch_to_db(arch), path],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn load_scene(&self, arch: Arch, category: AssetCategory) -> RepoResult<Scene> {
        let mut stmt = self.conn.prepare(&format!(
            "{ELEMENT_SELECT_SQL}
             WHERE arch = ?1 AND category = ?2
             ORDER BY z_index ASC;"
        ))?;

        let mut rows = stmt.query(params![arch_to_db(arch), category_to_db(category)])?;
        let mut elements = Vec::new();
        while let Some(row) = rows.next()? {
            elements.push(parse_element_row(row, arch, category)?);
        }

        Ok(Scene::from_elements(arch, category, elements))
    }

    fn background(&self, arch: Arch) -> RepoResult<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT asset_path FROM backgrounds WHERE arch = ?1;")?;
        let mut rows = stmt.query([arch_to_db(arch)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(row.get(0)?));
        }
        Ok(None)
    }
}

fn parse_element_row(row: &Row<'_>, arch: Arch, category: AssetCategory) -> RepoResult<Element> {
    let id_text: String = row.get("element_id")?;
    let id: ElementId = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{id_text}` in elements.element_id"
        ))
    })?;

    let transform = Transform::new(
        row.get("x")?,
        row.get("y")?,
        row.get("angle_deg")?,
        row.get("scale")?,
        int_to_bool(row.get::<_, i64>("flip_x")?, "elements.flip_x")?,
        int_to_bool(row.get::<_, i64>("flip_y")?, "elements.flip_y")?,
    );
    transform
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("element `{id}`: {err}")))?;

    let asset_path: String = row.get("asset_path")?;
    let visible = int_to_bool(row.get::<_, i64>("visible")?, "elements.visible")?;
    let label: String = row.get("label")?;

    Ok(Element::with_parts(
        id,
        AssetRef::new(asset_path, category, arch),
        transform,
        visible,
        label,
    ))
}

fn arch_to_db(arch: Arch) -> &'static str {
    match arch {
        Arch::Upper => "upper",
        Arch::Lower => "lower",
    }
}

fn category_to_db(category: AssetCategory) -> &'static str {
    match category {
        AssetCategory::Saddle => "saddle",
        AssetCategory::Tooth => "tooth",
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}
