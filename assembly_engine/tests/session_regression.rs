use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use assembly_engine::{AssemblySession, DisplayMode, LoadState, UploadItem};
use assembly_formats::{ArchiveEntry, InstructionDocument};
use chrono::Utc;
use tempfile::tempdir;

fn fixture_bytes() -> Result<Vec<u8>> {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let fixture = manifest_dir
        .parent()
        .expect("workspace root should exist")
        .join("assembly_formats")
        .join("tests")
        .join("fixtures")
        .join("bracket.gltf");
    fs::read(&fixture).with_context(|| format!("reading {}", fixture.display()))
}

const PLATE: &str = "Frame / Plate";
const BOLT: &str = "Frame / Bolt";
const WASHER: &str = "Frame / unnamed_object / Washer";

const INSTRUCTIONS: &str = r#"{
    "version": "1.0",
    "createdAt": "2024-05-01T12:00:00Z",
    "assemblyStages": [
        {"id": 1, "name": "Base plate", "parts": ["Frame / Plate"]},
        {"id": 2, "name": "Fasteners", "description": "washer first",
         "parts": ["Frame / unnamed_object / Washer", "Frame / Bolt"]}
    ]
}"#;

fn visible(session: &AssemblySession) -> Vec<String> {
    session
        .registry()
        .visible_parts()
        .iter()
        .filter(|(_, shown)| **shown)
        .map(|(path, _)| path.clone())
        .collect()
}

#[test]
fn upload_batch_applies_model_before_instructions() -> Result<()> {
    let mut session = AssemblySession::default();
    let ticket = session.begin_upload();
    // Instructions listed first on purpose.
    let applied = session.apply_upload(
        ticket,
        vec![
            UploadItem::file("steps.json", INSTRUCTIONS.as_bytes().to_vec()),
            UploadItem::file("bracket.gltf", fixture_bytes()?),
        ],
    );
    assert!(applied, "notices: {:?}", session.notices().iter().collect::<Vec<_>>());
    assert_eq!(session.load_state(), LoadState::Loaded);

    let parts: Vec<&str> = session.registry().part_paths().collect();
    assert_eq!(parts, vec![BOLT, PLATE, WASHER]);
    assert_eq!(session.instructions().len(), 2);

    session.jump_to_step(1);
    assert_eq!(visible(&session), vec![PLATE.to_string()]);
    session.set_display_mode(DisplayMode::Isolated);
    session.jump_to_step(2);
    assert_eq!(visible(&session), vec![BOLT.to_string(), WASHER.to_string()]);
    Ok(())
}

#[test]
fn archive_upload_uses_first_model_and_instructions() -> Result<()> {
    let mut session = AssemblySession::default();
    let ticket = session.begin_upload();
    let entries = vec![
        ArchiveEntry::new("kit/", Vec::new()),
        ArchiveEntry::new("kit/bracket.gltf", fixture_bytes()?),
        ArchiveEntry::new("kit/steps.json", INSTRUCTIONS.as_bytes().to_vec()),
        ArchiveEntry::new("kit/old-steps.json", b"not json".to_vec()),
    ];
    let summary = session
        .try_apply_upload(
            ticket,
            vec![UploadItem::Archive {
                name: "kit.zip".into(),
                entries: Ok(entries),
            }],
        )?
        .expect("ticket is current");
    assert_eq!(summary.model.as_deref(), Some("bracket.gltf"));
    assert_eq!(summary.parts, 3);
    assert_eq!(summary.steps, Some(2));
    Ok(())
}

#[test]
fn exported_instructions_round_trip_through_disk() -> Result<()> {
    let mut session = AssemblySession::default();
    session.load_model(
        "bracket.gltf",
        assembly_formats::ModelFormat::Gltf,
        fixture_bytes()?,
    )?;
    session.add_step("Plate", None, vec![PLATE.to_string()])?;
    session.add_step("Bolt", Some("hand tight"), vec![BOLT.to_string()])?;
    session.add_step("Washer", None, vec![WASHER.to_string()])?;
    session.reorder_steps(2, 1)?;

    let dir = tempdir().context("creating temporary export directory")?;
    let path = dir.path().join("instructions.json");
    fs::write(&path, session.export_json(Utc::now(), true)?)?;

    let text = fs::read_to_string(&path)?;
    let document = InstructionDocument::parse(&text)?;
    assert_eq!(document.version.as_deref(), Some("1.0"));
    assert!(document.created_at.is_some());
    let names: Vec<&str> = document
        .assembly_stages
        .iter()
        .map(|stage| stage.name.as_str())
        .collect();
    assert_eq!(names, vec!["Plate", "Washer", "Bolt"]);
    let ids: Vec<u32> = document.assembly_stages.iter().map(|stage| stage.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let mut restored = AssemblySession::default();
    assert!(restored.import_instructions(&text));
    assert_eq!(restored.instructions(), session.instructions());
    Ok(())
}

#[test]
fn focus_step_frames_translated_bolt() -> Result<()> {
    let mut session = AssemblySession::default();
    session.load_model(
        "bracket.gltf",
        assembly_formats::ModelFormat::Gltf,
        fixture_bytes()?,
    )?;
    let id = session.add_step("Bolt", None, vec![BOLT.to_string()])?;
    let plan = session.focus_step(id).expect("bolt has bounds");
    assert!((plan.target[1] - 2.5).abs() < 1e-4, "target {:?}", plan.target);
    assert_eq!(session.camera().target.to_array(), plan.target);
    Ok(())
}

#[test]
fn broken_model_keeps_previous_scene() -> Result<()> {
    let mut session = AssemblySession::default();
    session.load_model(
        "bracket.gltf",
        assembly_formats::ModelFormat::Gltf,
        fixture_bytes()?,
    )?;
    let ticket = session.begin_upload();
    assert!(!session.apply_upload(ticket, vec![UploadItem::file("broken.glb", b"glTF".to_vec())]));
    assert_eq!(session.registry().len(), 3);
    assert_eq!(session.model().map(|model| model.name.as_str()), Some("bracket.gltf"));
    Ok(())
}

#[test]
fn malformed_instructions_reject_the_whole_batch() -> Result<()> {
    let mut session = AssemblySession::default();
    let ticket = session.begin_upload();
    let applied = session.apply_upload(
        ticket,
        vec![
            UploadItem::file("bracket.gltf", fixture_bytes()?),
            UploadItem::file("steps.json", br#"{"assemblyStages": 4}"#.to_vec()),
        ],
    );
    assert!(!applied);
    assert_eq!(session.load_state(), LoadState::Unloaded);
    assert!(session.model().is_none());
    assert_eq!(session.registry().len(), 0);
    Ok(())
}
