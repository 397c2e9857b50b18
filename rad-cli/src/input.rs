//! Profile and memory files

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rad_model::{parse_memory_list, MemoryRecord, ModelAdapter, TransposedProfile};
use tracing::{debug, info};

/// Read a settings profile and transpose it for `model`
pub fn load_profile(path: &Path, model: &ModelAdapter) -> Result<TransposedProfile> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile {}", path.display()))?;
    let profile = TransposedProfile::from_json_str(&data, model.id())
        .with_context(|| format!("Invalid profile {}", path.display()))?;

    debug!(
        "Profile {} has {} settings for {}",
        path.display(),
        profile.len(),
        model.id()
    );
    Ok(profile)
}

/// Read memory files in order and concatenate their entries
///
/// Entries get the model's default power level.
pub fn load_memories(
    paths: &[PathBuf],
    model: &ModelAdapter,
    verbose: bool,
) -> Result<Vec<MemoryRecord>> {
    let power = model.default_power_level();
    let mut records = Vec::new();

    for path in paths {
        if verbose {
            info!("Loading memories from {}", path.display());
        } else {
            debug!("Loading memories from {}", path.display());
        }

        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read memory file {}", path.display()))?;
        let entries = parse_memory_list(&data)
            .with_context(|| format!("Invalid memory file {}", path.display()))?;
        records.extend(entries.into_iter().map(|e| e.into_record(power)));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rad_model::{ConfigError, ModelRegistry};

    fn uv5r() -> ModelAdapter {
        ModelRegistry::builtin().resolve("uv5r").unwrap().clone()
    }

    #[test]
    fn memory_files_concatenate_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.json");
        let second = dir.path().join("b.json");
        fs::write(&first, r#"[{"name":"A1","frequency":145500000},{"name":"A2","frequency":145525000}]"#).unwrap();
        fs::write(&second, r#"[{"name":"B1","frequency":446006250,"mode":"FM"}]"#).unwrap();

        let records = load_memories(&[first, second], &uv5r(), false).unwrap();

        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A1", "A2", "B1"]);
        assert!(records.iter().all(|r| r.power_level.label == "High"));
    }

    #[test]
    fn malformed_memory_file_keeps_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"[{"frequency":145500000}]"#).unwrap();

        let err = load_memories(&[path], &uv5r(), true).unwrap_err();
        assert!(err.chain().any(|c| c.downcast_ref::<ConfigError>().is_some()));
    }

    #[test]
    fn profile_is_transposed_for_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        fs::write(
            &path,
            r#"{"Squelch": {"uv5r": {"name": "squelch", "value": 4}, "rt470": {"name": "sql", "value": 2}}}"#,
        )
        .unwrap();

        let profile = load_profile(&path, &uv5r()).unwrap();
        assert_eq!(profile.model(), "uv5r");
        assert!(profile.contains("squelch"));
        assert!(!profile.contains("sql"));
    }
}
