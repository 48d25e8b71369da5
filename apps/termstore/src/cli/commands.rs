//! # CLI Command Implementations
//!
//! Every command opens the redb store, does its work and closes the store
//! with a full flush, so nothing stays dirty between invocations.

use super::ViewArgs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use termstore_core::coordinate::presets;
use termstore_core::spine::SPINES;
use termstore_core::{
    Chronology, FlushControl, LanguageCalculator, Nid, PathRegistry, RedbSegments, SpineConfig,
    SpineStore, StampCalculator, StampCoordinate, StateSet, TermstoreError, Versioned,
};

// =============================================================================
// FILE LIMITS
// =============================================================================

/// Maximum import file size (500 MB).
const MAX_IMPORT_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Maximum chronologies accepted from one import file.
const MAX_IMPORT_CHRONOLOGIES: usize = 1_000_000;

/// Canonicalize `path` and require a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, TermstoreError> {
    let canonical = path.canonicalize().map_err(|e| {
        TermstoreError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;
    if !canonical.is_file() {
        return Err(TermstoreError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }
    Ok(canonical)
}

fn validate_file_size(path: &Path, max_size: u64) -> Result<(), TermstoreError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| TermstoreError::IoError(format!("Cannot read file metadata: {}", e)))?;
    if metadata.len() > max_size {
        return Err(TermstoreError::InvalidConfig(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Create an empty database.
pub fn cmd_init(db_path: &Path, spine: SpineConfig, force: bool) -> Result<(), TermstoreError> {
    if db_path.exists() {
        if !force {
            return Err(TermstoreError::InvalidConfig(format!(
                "Database {} already exists. Use --force to overwrite.",
                db_path.display()
            )));
        }
        std::fs::remove_file(db_path).map_err(|e| {
            TermstoreError::IoError(format!("Remove {}: {}", db_path.display(), e))
        })?;
    }

    let (store, _) = open_store(db_path, spine)?;
    store.close(&FlushControl::new())?;
    println!("Initialized new database at {}", db_path.display());
    Ok(())
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// Parse a JSON array of chronologies.
pub fn parse_chronologies(contents: &[u8]) -> Result<Vec<Chronology>, TermstoreError> {
    let chronologies: Vec<Chronology> = serde_json::from_slice(contents)
        .map_err(|e| TermstoreError::DeserializationError(format!("Import JSON: {}", e)))?;
    if chronologies.len() > MAX_IMPORT_CHRONOLOGIES {
        return Err(TermstoreError::InvalidConfig(format!(
            "Chronology count {} exceeds maximum allowed {}",
            chronologies.len(),
            MAX_IMPORT_CHRONOLOGIES
        )));
    }
    Ok(chronologies)
}

/// Merge every chronology of `file` and flush.
pub fn cmd_import(
    db_path: &Path,
    spine: SpineConfig,
    json_mode: bool,
    file: &Path,
) -> Result<(), TermstoreError> {
    tracing::info!(file = %file.display(), "Importing chronologies");

    let validated_path = validate_file_path(file)?;
    validate_file_size(&validated_path, MAX_IMPORT_FILE_SIZE)?;
    let contents = std::fs::read(&validated_path)
        .map_err(|e| TermstoreError::IoError(format!("Read file: {}", e)))?;
    let chronologies = parse_chronologies(&contents)?;

    let (store, _) = open_store(db_path, spine)?;
    for chronology in &chronologies {
        store.put(chronology)?;
    }
    let next_nid = store.next_nid();
    let report = store.close(&FlushControl::new())?;

    if json_mode {
        print_json(&serde_json::json!({
            "imported": chronologies.len(),
            "segments_written": report.written,
            "next_nid": next_nid,
        }));
        return Ok(());
    }
    println!("Imported {} chronologies", chronologies.len());
    println!("Segments written: {}", report.written);
    Ok(())
}

// =============================================================================
// SHOW COMMAND
// =============================================================================

/// Print the decoded entity of `nid`.
pub fn cmd_show(
    db_path: &Path,
    spine: SpineConfig,
    json_mode: bool,
    nid: i32,
) -> Result<(), TermstoreError> {
    let (store, _) = open_store(db_path, spine)?;
    let entity = store.get_entity(Nid(nid))?;
    store.close(&FlushControl::new())?;

    let Some(entity) = entity else {
        if json_mode {
            print_json(&serde_json::Value::Null);
        } else {
            println!("Nid {} not found", nid);
        }
        return Ok(());
    };

    if json_mode {
        let value = serde_json::to_value(&entity)
            .map_err(|e| TermstoreError::SerializationError(e.to_string()))?;
        print_json(&value);
        return Ok(());
    }

    println!("Nid:        {}", entity.nid());
    println!("Kind:       {}", entity.kind());
    println!("Definition: {}", entity.definition_nid());
    if !entity.referenced_component_nid().is_sentinel() {
        println!("References: {}", entity.referenced_component_nid());
    }
    println!("Versions:   {}", entity.version_count());
    for version in entity.versions() {
        let stamp = version.stamp();
        println!(
            "  {} t={} author={} module={} path={}",
            stamp.status, stamp.time, stamp.author, stamp.module, stamp.path
        );
    }
    Ok(())
}

// =============================================================================
// LATEST COMMAND
// =============================================================================

/// Stamp coordinate from the command-line overrides.
pub fn stamp_coordinate(view: &ViewArgs) -> Result<StampCoordinate, TermstoreError> {
    let mut coordinate = presets::stamp::master_latest();
    if let Some(path) = view.path {
        coordinate = coordinate.on_path(Nid(path).check()?);
    }
    if let Some(time) = view.time {
        coordinate = coordinate.at_time(time);
    }
    if let Some(states) = &view.states {
        coordinate = coordinate.with_states(states.parse::<StateSet>()?);
    }
    if !view.exclude_modules.is_empty() {
        coordinate = coordinate.excluding_modules(view.exclude_modules.iter().map(|m| Nid(*m)));
    }
    Ok(coordinate)
}

fn stamp_calculator(view: &ViewArgs) -> Result<StampCalculator, TermstoreError> {
    let registry = PathRegistry::standard()?;
    StampCalculator::new(stamp_coordinate(view)?, &registry)
}

/// Resolve the latest version of `nid`.
pub fn cmd_latest(
    db_path: &Path,
    spine: SpineConfig,
    json_mode: bool,
    nid: i32,
    view: &ViewArgs,
) -> Result<(), TermstoreError> {
    let calculator = stamp_calculator(view)?;
    let (store, _) = open_store(db_path, spine)?;
    let entity = store.get_entity(Nid(nid))?;
    store.close(&FlushControl::new())?;

    let latest = entity
        .as_ref()
        .map(|e| calculator.latest_entity_version(e))
        .unwrap_or_default();

    if json_mode {
        let value = serde_json::to_value(&latest)
            .map_err(|e| TermstoreError::SerializationError(e.to_string()))?;
        print_json(&serde_json::json!({
            "nid": nid,
            "coordinate": serde_json::to_value(calculator.coordinate())
                .map_err(|e| TermstoreError::SerializationError(e.to_string()))?,
            "latest": value,
        }));
        return Ok(());
    }

    match latest.value() {
        Some(version) => {
            let stamp = version.stamp();
            println!(
                "Latest of {}: {} t={} module={} path={}",
                nid, stamp.status, stamp.time, stamp.module, stamp.path
            );
            if latest.is_contradicted() {
                println!(
                    "  {} contradicting version(s) at the same position",
                    latest.contradictions().len()
                );
            }
        }
        None => println!("No visible version of {}", nid),
    }
    Ok(())
}

// =============================================================================
// DESCRIBE COMMAND
// =============================================================================

/// Print the best description of `concept`.
pub fn cmd_describe(
    db_path: &Path,
    spine: SpineConfig,
    json_mode: bool,
    concept: i32,
    language: &str,
    view: &ViewArgs,
) -> Result<(), TermstoreError> {
    let coordinate = presets::language::by_name(language).ok_or_else(|| {
        TermstoreError::InvalidConfig(format!(
            "Unknown language preset '{}'. Use one of: {}",
            language,
            presets::language::NAMES.join(", ")
        ))
    })?;
    let calculator = stamp_calculator(view)?;

    let (store, _) = open_store(db_path, spine)?;
    let description =
        LanguageCalculator::new(&store, calculator, coordinate).description(Nid(concept))?;
    store.close(&FlushControl::new())?;

    if json_mode {
        let value = serde_json::to_value(&description)
            .map_err(|e| TermstoreError::SerializationError(e.to_string()))?;
        print_json(&value);
        return Ok(());
    }
    match description {
        Some(description) => println!("{}", description.text),
        None => println!("No description of {} under {}", concept, language),
    }
    Ok(())
}

// =============================================================================
// STATS COMMAND
// =============================================================================

/// Persisted segment counts per spine.
pub fn cmd_stats(db_path: &Path, spine: SpineConfig, json_mode: bool) -> Result<(), TermstoreError> {
    let (store, segments) = open_store(db_path, spine)?;
    let next_nid = store.next_nid();
    let mut counts = Vec::with_capacity(SPINES.len());
    for name in SPINES {
        counts.push((name, segments.stored_segments(name)?));
    }
    store.close(&FlushControl::new())?;

    if json_mode {
        let spines: serde_json::Map<String, serde_json::Value> = counts
            .iter()
            .map(|(name, count)| ((*name).to_string(), serde_json::json!(count)))
            .collect();
        print_json(&serde_json::json!({
            "database": db_path.to_string_lossy(),
            "spine_size": spine.spine_size,
            "next_nid": next_nid,
            "stored_segments": spines,
        }));
        return Ok(());
    }

    println!("termstore Status");
    println!("================");
    println!("Database:   {}", db_path.display());
    println!("Spine size: {}", spine.spine_size);
    println!("Next nid:   {}", next_nid);
    println!();
    println!("Stored segments:");
    for (name, count) in counts {
        println!("  {:<20} {}", name, count);
    }
    Ok(())
}

// =============================================================================
// CHECKPOINT COMMAND
// =============================================================================

/// Flush dirty segments (bounded by `max_segments`) and compact the file.
pub fn cmd_checkpoint(
    db_path: &Path,
    spine: SpineConfig,
    json_mode: bool,
    max_segments: Option<usize>,
) -> Result<(), TermstoreError> {
    let control = max_segments.map_or_else(FlushControl::new, FlushControl::with_max_segments);
    let (store, segments) = open_store(db_path, spine)?;
    let report = store.flush(&control)?;
    drop(store);

    let compacted = match Arc::try_unwrap(segments) {
        Ok(mut segments) => segments.compact()?,
        Err(_) => false,
    };

    if json_mode {
        print_json(&serde_json::json!({
            "written": report.written,
            "remaining": report.remaining,
            "compacted": compacted,
        }));
        return Ok(());
    }
    println!(
        "Checkpoint: {} segment(s) written, {} remaining, compacted: {}",
        report.written, report.remaining, compacted
    );
    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Open the redb store at `db_path`, keeping a handle on its segment storage.
pub fn open_store(
    db_path: &Path,
    spine: SpineConfig,
) -> Result<(SpineStore, Arc<RedbSegments>), TermstoreError> {
    let segments = Arc::new(RedbSegments::open(db_path)?);
    let store = SpineStore::open(spine, Arc::clone(&segments))?;
    Ok((store, segments))
}
