//! Modular configuration loader.
//!
//! Module settings are kept in their own files next to `config.json`:
//! - `config.json` - Shared settings (logging, data locations)
//! - `engine.json` - Screening, portfolio and pair-trade parameters
//!
//! A module file may be partial; it is deep-merged over the module's
//! serialized defaults before deserializing, so omitted fields keep their
//! default values at every nesting level.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::config_dir;

/// Configuration file names
pub const CONFIG_FILES: &[&str] = &["config.json", "engine.json"];

/// Load a JSON file and return its contents as a Value.
/// Returns None if file doesn't exist.
pub fn load_json_file(path: &Path) -> Result<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    Ok(Some(value))
}

/// Deep merge two JSON values.
/// Source values override target values, with object merging at each level.
pub fn merge_json(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            for (key, source_value) in source_map {
                match target_map.get_mut(&key) {
                    Some(target_value) => {
                        merge_json(target_value, source_value);
                    }
                    None => {
                        target_map.insert(key, source_value);
                    }
                }
            }
        }
        (target, source) => {
            *target = source;
        }
    }
}

/// Load a module section from an explicit file, merged over `T::default()`.
///
/// A missing file yields the defaults.
pub fn load_section_from<T>(path: &Path) -> Result<T>
where
    T: Default + Serialize + DeserializeOwned,
{
    let mut merged = serde_json::to_value(T::default())
        .context("Failed to serialize default section")?;

    match load_json_file(path)? {
        Some(overrides) => {
            merge_json(&mut merged, overrides);
            tracing::debug!(path = %path.display(), "Loaded config section");
        }
        None => {
            tracing::debug!(path = %path.display(), "Config section not found, using defaults");
        }
    }

    serde_json::from_value(merged)
        .with_context(|| format!("Invalid settings in {}", path.display()))
}

/// Load a module section by file name from the config directory.
pub fn load_section<T>(dir: Option<PathBuf>, file_name: &str) -> Result<T>
where
    T: Default + Serialize + DeserializeOwned,
{
    let cfg_dir = dir.unwrap_or_else(config_dir);
    load_section_from(&cfg_dir.join(file_name))
}

/// Check which modular config files exist.
pub fn check_modular_files(dir: Option<PathBuf>) -> Vec<(String, bool)> {
    let cfg_dir = dir.unwrap_or_else(config_dir);

    CONFIG_FILES
        .iter()
        .map(|file| {
            let path = cfg_dir.join(file);
            (file.to_string(), path.exists())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Section {
        cap: usize,
        nested: Nested,
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Nested {
        floor: f64,
        labels: Vec<String>,
    }

    impl Default for Section {
        fn default() -> Self {
            Self {
                cap: 4,
                nested: Nested {
                    floor: 100.0,
                    labels: vec!["ETF".into()],
                },
            }
        }
    }

    #[test]
    fn test_merge_json_objects() {
        let mut target = json!({
            "a": 1,
            "b": {
                "x": 10,
                "y": 20
            }
        });

        let source = json!({
            "b": {
                "y": 25,
                "z": 30
            },
            "c": 3
        });

        merge_json(&mut target, source);

        assert_eq!(target["a"], 1);
        assert_eq!(target["b"]["x"], 10);
        assert_eq!(target["b"]["y"], 25);
        assert_eq!(target["b"]["z"], 30);
        assert_eq!(target["c"], 3);
    }

    #[test]
    fn test_merge_json_overwrite_non_object() {
        let mut target = json!({ "a": [1, 2, 3] });
        let source = json!({ "a": [4, 5] });

        merge_json(&mut target, source);

        assert_eq!(target["a"], json!([4, 5]));
    }

    #[test]
    fn test_load_section_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let section: Section = load_section(Some(dir.path().to_path_buf()), "engine.json").unwrap();
        assert_eq!(section, Section::default());
    }

    #[test]
    fn test_load_section_partial_nested_override() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("engine.json"), r#"{"nested": {"floor": 5.0}}"#).unwrap();

        let section: Section = load_section(Some(dir.path().to_path_buf()), "engine.json").unwrap();
        assert_eq!(section.cap, 4);
        assert_eq!(section.nested.floor, 5.0);
        assert_eq!(section.nested.labels, vec!["ETF".to_string()]);
    }

    #[test]
    fn test_load_section_type_error_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        fs::write(&path, r#"{"cap": "four"}"#).unwrap();

        let err = load_section_from::<Section>(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid settings"));
    }

    #[test]
    fn test_check_modular_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("engine.json"), "{}").unwrap();

        let files = check_modular_files(Some(dir.path().to_path_buf()));
        assert!(files.contains(&("config.json".to_string(), false)));
        assert!(files.contains(&("engine.json".to_string(), true)));
    }
}
