//! CLI, configuration and import tests.

use clap::Parser;
use std::io::Write;
use termstore::cli::{self, Cli, Commands, ViewArgs};
use termstore::config::{Config, LogFormat};
use termstore_core::{Chronology, FlushControl, Nid, SpineConfig, Status, TermstoreError, terms};

const IMPORT_JSON: &str = r#"[
  {
    "kind": "concept",
    "nid": 100,
    "versions": [
      {"stamp": {"status": "active", "time": 100, "author": 12, "module": 9, "path": 3}}
    ]
  },
  {
    "kind": "semantic",
    "nid": 101,
    "pattern": 24,
    "referenced_component": 100,
    "versions": [
      {
        "stamp": {"status": "active", "time": 100, "author": 12, "module": 9, "path": 3},
        "fields": [
          {"type": "nid", "value": 17},
          {"type": "text", "value": "Heart"},
          {"type": "nid", "value": 44},
          {"type": "nid", "value": 33}
        ]
      }
    ]
  }
]"#;

// =============================================================================
// CONFIGURATION
// =============================================================================

#[test]
fn config_file_loaded() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("termstore.toml");
    let mut file = std::fs::File::create(&path).expect("create");
    writeln!(
        file,
        "[store]\npath = \"data/terms.redb\"\nspine_size = 256\n\n[log]\nformat = \"json\"\nfilter = \"termstore=debug\""
    )
    .expect("write");

    let config = Config::load(Some(&path)).expect("load");
    assert_eq!(config.store.path, std::path::PathBuf::from("data/terms.redb"));
    assert_eq!(config.spine_config(), SpineConfig::with_spine_size(256));
    assert_eq!(config.log.format, LogFormat::Json);
    assert_eq!(config.log.filter, "termstore=debug");
}

#[test]
fn unknown_config_key_rejected() {
    let err = Config::parse("[store]\nspine = 10\n").expect_err("unknown key");
    assert!(matches!(err, TermstoreError::InvalidConfig(_)));
}

#[test]
fn invalid_toml_rejected() {
    assert!(Config::parse("[store\n").is_err());
}

// =============================================================================
// ARGUMENTS
// =============================================================================

#[test]
fn latest_arguments_parse() {
    let cli = Cli::try_parse_from([
        "termstore",
        "--json-mode",
        "latest",
        "100",
        "--path",
        "4",
        "--time",
        "250",
        "--states",
        "active",
        "--exclude-module",
        "9,10",
    ])
    .expect("parse");
    assert!(cli.json_mode);

    let Some(Commands::Latest { nid, view }) = cli.command else {
        unreachable!("expected latest command");
    };
    assert_eq!(nid, 100);

    let coordinate = cli::stamp_coordinate(&view).expect("coordinate");
    assert_eq!(coordinate.position.path, terms::DEVELOPMENT_PATH);
    assert_eq!(coordinate.position.time, 250);
    assert!(coordinate.allows(Status::Active));
    assert!(!coordinate.allows(Status::Inactive));
    assert!(coordinate.excludes_module(terms::SOLOR_MODULE));
    assert!(coordinate.excludes_module(terms::SOLOR_OVERLAY_MODULE));
}

#[test]
fn bad_state_set_rejected() {
    let view = ViewArgs {
        states: Some("alive".to_string()),
        ..ViewArgs::default()
    };
    assert!(cli::stamp_coordinate(&view).is_err());
}

// =============================================================================
// IMPORT
// =============================================================================

#[test]
fn import_shape_parses() {
    let chronologies = cli::parse_chronologies(IMPORT_JSON.as_bytes()).expect("parse");
    assert_eq!(chronologies.len(), 2);
    assert!(matches!(chronologies[0], Chronology::Concept(_)));
    let Chronology::Semantic(semantic) = &chronologies[1] else {
        unreachable!("expected semantic");
    };
    assert_eq!(semantic.pattern, terms::DESCRIPTION_PATTERN);
    assert_eq!(semantic.referenced_component, Nid(100));
}

#[test]
fn import_rejects_non_array() {
    let err = cli::parse_chronologies(br#"{"kind": "concept"}"#).expect_err("not an array");
    assert!(matches!(err, TermstoreError::DeserializationError(_)));
}

#[test]
fn import_then_describe() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("terms.redb");
    let input = dir.path().join("import.json");
    std::fs::write(&input, IMPORT_JSON).expect("write import");

    let spine = SpineConfig::default();
    cli::cmd_init(&db_path, spine, false).expect("init");
    assert!(cli::cmd_init(&db_path, spine, false).is_err());
    cli::cmd_import(&db_path, spine, true, &input).expect("import");

    // Importing twice changes nothing.
    cli::cmd_import(&db_path, spine, true, &input).expect("re-import");

    let (store, segments) = cli::open_store(&db_path, spine).expect("open");
    let entity = store.get_entity(Nid(101)).expect("get").expect("entity");
    assert_eq!(entity.version_count(), 1);
    assert_eq!(store.semantic_nids_for_component(Nid(100)).expect("index"), vec![Nid(101)]);
    assert_eq!(segments.stored_segments("records").expect("count"), 1);
    store.close(&FlushControl::new()).expect("close");
    drop(segments);

    cli::cmd_describe(
        &db_path,
        spine,
        true,
        100,
        "us-english-regular-name",
        &ViewArgs::default(),
    )
    .expect("describe");
    assert!(
        cli::cmd_describe(&db_path, spine, false, 100, "klingon", &ViewArgs::default()).is_err()
    );
}
