#![allow(missing_docs)]

//! The self-describing file facade: save, typed load, dynamic load.

use packtree::{write_object, Packable, Packtree, PacktreeError};

#[derive(Packable, Debug, Default, Clone, PartialEq)]
struct SaveState {
    level: u32,
    score: u64,
    title: String,
    checkpoints: Vec<f64>,
}

fn state() -> SaveState {
    SaveState {
        level: 3,
        score: 880,
        title: "second run".to_owned(),
        checkpoints: vec![10.5, 44.0, 71.25],
    }
}

#[test]
fn save_and_load_typed() -> packtree::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("state.pkt");

    Packtree::save(&path, &state())?;
    let loaded: SaveState = Packtree::load(&path)?;
    assert_eq!(loaded, state());
    Ok(())
}

#[test]
fn load_object_uses_embedded_schema() -> packtree::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("state.pkt");

    Packtree::save(&path, &state())?;
    let tree = Packtree::load_object(&path)?;

    // The dynamic view equals a direct object write of the value.
    assert_eq!(tree, write_object(&state())?);
    assert_eq!(tree.at("level").get::<i64>()?, 3);
    assert_eq!(tree.at("checkpoints").size(), 3);
    Ok(())
}

#[derive(Packable, Debug, Default, Clone, PartialEq)]
struct OtherShape {
    level: u32,
}

#[test]
fn load_with_wrong_type_is_rejected() -> packtree::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("state.pkt");

    Packtree::save(&path, &state())?;
    let result: packtree::Result<OtherShape> = Packtree::load(&path);
    assert!(matches!(result, Err(PacktreeError::Load(_))));
    Ok(())
}

#[test]
fn corrupt_magic_is_rejected() -> packtree::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("state.pkt");

    std::fs::write(&path, b"not a packtree file")?;
    let result: packtree::Result<SaveState> = Packtree::load(&path);
    assert!(matches!(result, Err(PacktreeError::Load(_))));
    Ok(())
}

#[cfg(feature = "lz4_flex")]
#[test]
fn compressed_files_round_trip() -> packtree::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("state.pkt");

    Packtree::builder().compression(true).write(&path, &state())?;
    let loaded: SaveState = Packtree::load(&path)?;
    assert_eq!(loaded, state());

    let tree = Packtree::load_object(&path)?;
    assert_eq!(tree.at("title").get::<String>()?, "second run");
    Ok(())
}
