use arcadent_core::{Arch, AssetCategory, AssetRef, Scene, SceneError, Transform};
use uuid::Uuid;

fn saddle_asset(name: &str) -> AssetRef {
    AssetRef::new(name, AssetCategory::Saddle, Arch::Lower)
}

fn scene_with(names: &[&str]) -> Scene {
    let mut scene = Scene::new(Arch::Lower, AssetCategory::Saddle);
    for name in names {
        scene.add_element(saddle_asset(name), Transform::identity());
    }
    scene
}

#[test]
fn add_appends_at_top_of_paint_order() {
    let scene = scene_with(&["selle_38.png", "selle_45-48.png"]);

    let paths: Vec<&str> = scene
        .list_elements()
        .iter()
        .map(|element| element.asset.path.as_str())
        .collect();
    assert_eq!(paths, ["selle_38.png", "selle_45-48.png"]);
}

#[test]
fn added_element_gets_label_from_asset_stem() {
    let mut scene = Scene::new(Arch::Lower, AssetCategory::Saddle);
    let id = scene.add_element(saddle_asset("selle_36_37_38.png"), Transform::at(400.0, 300.0));

    assert_eq!(scene.get_element(id).unwrap().label, "selle_36_37_38");
}

#[test]
fn remove_preserves_relative_order_and_reports_index() {
    let mut scene = scene_with(&["a.png", "b.png", "c.png"]);
    let middle = scene.list_elements()[1].id;

    let (removed, index) = scene.remove_element(middle).unwrap();
    assert_eq!(removed.asset.path, "b.png");
    assert_eq!(index, 1);

    let paths: Vec<&str> = scene
        .list_elements()
        .iter()
        .map(|element| element.asset.path.as_str())
        .collect();
    assert_eq!(paths, ["a.png", "c.png"]);
}

#[test]
fn mutations_on_unknown_id_return_not_found_and_change_nothing() {
    let mut scene = scene_with(&["a.png"]);
    let before = scene.clone();
    let ghost = Uuid::new_v4();

    assert_eq!(
        scene.remove_element(ghost).unwrap_err(),
        SceneError::NotFound(ghost)
    );
    assert_eq!(
        scene.set_transform(ghost, Transform::identity()).unwrap_err(),
        SceneError::NotFound(ghost)
    );
    assert_eq!(
        scene.set_visibility(ghost, false).unwrap_err(),
        SceneError::NotFound(ghost)
    );
    assert_eq!(
        scene.rename(ghost, "x").unwrap_err(),
        SceneError::NotFound(ghost)
    );
    assert_eq!(scene, before);
}

#[test]
fn insert_rejects_duplicate_ids() {
    let mut scene = scene_with(&["a.png"]);
    let existing = scene.get_element(scene.list_elements()[0].id).unwrap().clone();

    assert_eq!(
        scene.insert_element(0, existing.clone()).unwrap_err(),
        SceneError::DuplicateId(existing.id)
    );
    assert_eq!(scene.len(), 1);
}

#[test]
fn clear_returns_elements_in_paint_order() {
    let mut scene = scene_with(&["a.png", "b.png"]);
    let cleared = scene.clear();

    assert!(scene.is_empty());
    assert_eq!(cleared.len(), 2);
    assert_eq!(cleared[0].asset.path, "a.png");
    assert_eq!(cleared[1].asset.path, "b.png");
}

#[test]
fn selection_tracks_membership() {
    let mut scene = scene_with(&["a.png"]);
    let id = scene.list_elements()[0].id;

    scene.select(Some(id)).unwrap();
    assert_eq!(scene.selected(), Some(id));

    assert!(matches!(
        scene.select(Some(Uuid::new_v4())),
        Err(SceneError::NotFound(_))
    ));
    // Failed select keeps the prior selection.
    assert_eq!(scene.selected(), Some(id));

    scene.remove_element(id).unwrap();
    assert_eq!(scene.selected(), None);
}
