//! Modular configuration loader for Zero services.
//!
//! Supports loading configuration from multiple files:
//! - `config.json` - Core configuration
//! - `screener.json` - Screener service configuration
//!
//! Files are loaded from `~/.codecoder/` with proper merging.

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::config_dir;

/// Load a JSON file and return its contents as a Value.
/// Returns None if file doesn't exist.
fn load_json_file(path: &Path) -> Result<Option<Value>> {
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
pub(crate) fn merge_json(target: &mut Value, source: Value) {
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

/// Load modular configuration from the config directory.
///
/// Priority (lowest to highest):
/// 1. config.json
/// 2. screener.json, merged into the `screener` section
/// 3. Environment variables (applied separately)
pub fn load_modular_config(dir: Option<PathBuf>) -> Result<Value> {
    let cfg_dir = dir.unwrap_or_else(config_dir);

    let config_path = cfg_dir.join("config.json");
    let mut config = load_json_file(&config_path)?.unwrap_or(Value::Object(Default::default()));

    tracing::debug!("Loading modular config from {}", cfg_dir.display());

    if let Some(screener) = load_json_file(&cfg_dir.join("screener.json"))? {
        if let Some(config_obj) = config.as_object_mut() {
            match config_obj.get_mut("screener") {
                Some(existing) => merge_json(existing, screener),
                None => {
                    config_obj.insert("screener".to_string(), screener);
                }
            }
        }
        tracing::debug!("Loaded screener.json");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

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
    fn test_screener_file_without_config_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("screener.json"), r#"{"workers": 3}"#).unwrap();

        let value = load_modular_config(Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(value["screener"]["workers"], 3);
        assert_eq!(value.as_object().map(|obj| obj.len()), Some(1));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.json"), "{ not json").unwrap();

        let err = load_modular_config(Some(dir.path().to_path_buf())).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }
}
