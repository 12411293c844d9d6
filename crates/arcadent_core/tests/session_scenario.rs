use arcadent_core::{
    Arch, AssetCategory, AssetRef, AssetStore, AssetStoreError, CancelToken, Command,
    CompositeError, Session, SessionConfig, SessionError, SoftwareCompositor, Transform,
};
use image::{Rgba, RgbaImage};
use std::collections::HashMap;
use std::path::Path;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

/// Test double resolving assets from memory instead of an image directory.
struct MemoryAssetStore {
    assets: HashMap<String, RgbaImage>,
    backgrounds: HashMap<String, RgbaImage>,
}

impl MemoryAssetStore {
    fn new() -> Self {
        Self {
            assets: HashMap::new(),
            backgrounds: HashMap::new(),
        }
    }

    fn with_asset(mut self, name: &str, pixels: RgbaImage) -> Self {
        self.assets.insert(name.to_string(), pixels);
        self
    }

    fn with_background(mut self, name: &str, pixels: RgbaImage) -> Self {
        self.backgrounds.insert(name.to_string(), pixels);
        self
    }
}

impl AssetStore for MemoryAssetStore {
    fn resolve(&self, asset: &AssetRef) -> Result<RgbaImage, AssetStoreError> {
        self.assets
            .get(&asset.path)
            .cloned()
            .ok_or_else(|| AssetStoreError::NotFound(asset.path.clone()))
    }

    fn resolve_background(&self, path: &str) -> Result<RgbaImage, AssetStoreError> {
        self.backgrounds
            .get(path)
            .cloned()
            .ok_or_else(|| AssetStoreError::NotFound(path.to_string()))
    }
}

fn config(db_path: &Path, arch: Arch) -> SessionConfig {
    SessionConfig {
        db_path: db_path.to_path_buf(),
        arch,
        ..SessionConfig::default()
    }
}

fn saddle(name: &str) -> AssetRef {
    AssetRef::new(name, AssetCategory::Saddle, Arch::Lower)
}

fn store_with_saddle(name: &str) -> MemoryAssetStore {
    MemoryAssetStore::new()
        .with_asset(name, RgbaImage::from_pixel(2, 2, RED))
        .with_background("fond_inferieur.png", RgbaImage::from_pixel(4, 4, BLUE))
}

#[test]
fn edit_undo_save_reload_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("arcadent.db");
    let t0 = Transform::at(400.0, 300.0);
    let t1 = Transform::new(420.0, 310.0, 30.0, 1.5, true, false);

    let mut session = Session::open(
        &config(&db_path, Arch::Lower),
        store_with_saddle("selle_38.png"),
    )
    .unwrap();
    assert!(session.scene(AssetCategory::Saddle).is_empty());

    let id = session
        .execute(
            AssetCategory::Saddle,
            Command::AddElement {
                asset: saddle("selle_38.png"),
                transform: t0,
            },
        )
        .unwrap()
        .unwrap();

    session
        .execute(AssetCategory::Saddle, Command::SetTransform { id, transform: t1 })
        .unwrap();
    session.undo(AssetCategory::Saddle).unwrap();
    assert_eq!(
        session
            .scene(AssetCategory::Saddle)
            .get_element(id)
            .unwrap()
            .transform,
        t0
    );

    session
        .execute(AssetCategory::Saddle, Command::RemoveElement { id })
        .unwrap();
    session.undo(AssetCategory::Saddle).unwrap();
    let scene = session.scene(AssetCategory::Saddle);
    assert_eq!(scene.list_elements()[0].id, id);
    assert_eq!(scene.list_elements()[0].transform, t0);

    session.save().unwrap();
    session.reload().unwrap();

    let scene = session.scene(AssetCategory::Saddle);
    assert_eq!(scene.len(), 1);
    assert_eq!(scene.list_elements()[0].id, id);
    assert_eq!(scene.list_elements()[0].transform, t0);
}

#[test]
fn reload_discards_unsaved_edits_and_history() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("arcadent.db");

    let mut session = Session::open(
        &config(&db_path, Arch::Lower),
        store_with_saddle("selle_38.png"),
    )
    .unwrap();

    session
        .execute(
            AssetCategory::Saddle,
            Command::AddElement {
                asset: saddle("selle_38.png"),
                transform: Transform::at(400.0, 300.0),
            },
        )
        .unwrap();
    session.save().unwrap();

    session
        .execute(AssetCategory::Saddle, Command::ClearAll)
        .unwrap();
    assert!(session.scene(AssetCategory::Saddle).is_empty());
    assert!(session.can_undo(AssetCategory::Saddle));

    session.reload().unwrap();
    assert_eq!(session.scene(AssetCategory::Saddle).len(), 1);
    assert!(!session.can_undo(AssetCategory::Saddle));
    assert!(!session.can_redo(AssetCategory::Saddle));
}

#[test]
fn saddle_and_tooth_histories_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("arcadent.db");

    let mut session = Session::open(
        &config(&db_path, Arch::Lower),
        store_with_saddle("selle_38.png"),
    )
    .unwrap();

    session
        .execute(
            AssetCategory::Saddle,
            Command::AddElement {
                asset: saddle("selle_38.png"),
                transform: Transform::at(400.0, 300.0),
            },
        )
        .unwrap();

    let err = session.undo(AssetCategory::Tooth).unwrap_err();
    assert!(err.is_empty_history());
    assert_eq!(session.scene(AssetCategory::Saddle).len(), 1);
}

#[test]
fn missing_asset_loads_as_placeholder_and_is_skipped_on_export() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("arcadent.db");

    {
        let mut session = Session::open(
            &config(&db_path, Arch::Lower),
            store_with_saddle("selle_38.png"),
        )
        .unwrap();
        session
            .execute(
                AssetCategory::Saddle,
                Command::AddElement {
                    asset: saddle("selle_38.png"),
                    transform: Transform::at(2.0, 2.0),
                },
            )
            .unwrap();
        session.save().unwrap();
    }

    // Reopen with a store that no longer carries the saddle image.
    let bare_store = MemoryAssetStore::new()
        .with_background("fond_inferieur.png", RgbaImage::from_pixel(4, 4, BLUE));
    let session = Session::open(&config(&db_path, Arch::Lower), bare_store).unwrap();

    let scene = session.scene(AssetCategory::Saddle);
    assert_eq!(scene.len(), 1, "missing asset must not drop the element");
    assert!(scene.list_elements()[0].missing_asset);

    let composite = session
        .export_composite(&SoftwareCompositor, &CancelToken::new())
        .unwrap();
    assert!(composite.pixels().all(|pixel| *pixel == BLUE));
}

#[test]
fn export_composite_flattens_visible_elements_over_background() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("arcadent.db");

    let store = store_with_saddle("selle_38.png")
        .with_asset("selle_48.png", RgbaImage::from_pixel(2, 2, GREEN));
    let mut session = Session::open(&config(&db_path, Arch::Lower), store).unwrap();

    session
        .execute(
            AssetCategory::Saddle,
            Command::AddElement {
                asset: saddle("selle_38.png"),
                transform: Transform::at(2.0, 2.0),
            },
        )
        .unwrap();
    let hidden = session
        .execute(
            AssetCategory::Saddle,
            Command::AddElement {
                asset: saddle("selle_48.png"),
                transform: Transform::at(2.0, 2.0),
            },
        )
        .unwrap()
        .unwrap();
    session
        .execute(
            AssetCategory::Saddle,
            Command::SetVisibility {
                id: hidden,
                visible: false,
            },
        )
        .unwrap();

    let composite = session
        .export_composite(&SoftwareCompositor, &CancelToken::new())
        .unwrap();

    assert_eq!(composite.dimensions(), (4, 4));
    // The 2x2 red saddle centered at (2,2) covers exactly pixels 1..3 in
    // both axes; the hidden green saddle contributes nothing.
    for y in 0..4 {
        for x in 0..4 {
            let expected = if (1..3).contains(&x) && (1..3).contains(&y) {
                RED
            } else {
                BLUE
            };
            assert_eq!(*composite.get_pixel(x, y), expected, "pixel ({x},{y})");
        }
    }
}

#[test]
fn cancelled_export_returns_no_partial_buffer() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("arcadent.db");

    let session = Session::open(
        &config(&db_path, Arch::Lower),
        store_with_saddle("selle_38.png"),
    )
    .unwrap();

    let cancel = CancelToken::new();
    cancel.cancel();
    let err = session
        .export_composite(&SoftwareCompositor, &cancel)
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Composite(CompositeError::Cancelled)
    ));
}

#[test]
fn seed_default_teeth_fills_an_empty_arch_once() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("arcadent.db");

    let mut session = Session::open(
        &config(&db_path, Arch::Upper),
        MemoryAssetStore::new(),
    )
    .unwrap();

    assert_eq!(session.seed_default_teeth(), 16);
    assert_eq!(session.scene(AssetCategory::Tooth).len(), 16);
    let paths: Vec<&str> = session
        .scene(AssetCategory::Tooth)
        .list_elements()
        .iter()
        .map(|element| element.asset.path.as_str())
        .collect();
    assert!(paths.contains(&"dent_11.png"));
    assert!(paths.contains(&"dent_28.png"));

    // Seeding is idempotent over a populated scene.
    assert_eq!(session.seed_default_teeth(), 0);
    assert_eq!(session.scene(AssetCategory::Tooth).len(), 16);
}

#[test]
fn default_background_follows_the_arch() {
    let dir = tempfile::tempdir().unwrap();

    let lower = Session::open(
        &config(&dir.path().join("lower.db"), Arch::Lower),
        MemoryAssetStore::new(),
    )
    .unwrap();
    assert_eq!(lower.background(), "fond_inferieur.png");

    let upper = Session::open(
        &config(&dir.path().join("upper.db"), Arch::Upper),
        MemoryAssetStore::new(),
    )
    .unwrap();
    assert_eq!(upper.background(), "fond_superieur.png");
}

#[test]
fn background_choice_persists_across_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("arcadent.db");

    let mut session = Session::open(
        &config(&db_path, Arch::Lower),
        MemoryAssetStore::new(),
    )
    .unwrap();
    session.set_background(Some("fond_scanner.png".to_string()));
    session.save().unwrap();
    session.set_background(None);

    session.reload().unwrap();
    assert_eq!(session.background(), "fond_scanner.png");
}
