//! SE-024: Host configuration (`scenectl.yaml`).
//!
//! Every field has a default, so a missing file is a valid configuration.
//! `SCENECTL_ENGINE_PATH` and `SCENECTL_TIMEOUT_SECS` override the file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILE: &str = "scenectl.yaml";
pub const ENV_ENGINE_PATH: &str = "SCENECTL_ENGINE_PATH";
pub const ENV_TIMEOUT_SECS: &str = "SCENECTL_TIMEOUT_SECS";

pub const DEFAULT_ENGINE_PATH: &str = "scenectl-engine";
pub const DEFAULT_OPERATIONS_SCRIPT: &str = "res://addons/scenectl/operations.gd";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// How the host finds and drives the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Engine executable, looked up on `PATH` when not a path.
    pub engine_path: String,
    /// Entry script handed to the engine with `--script`.
    pub operations_script: String,
    /// Bounded wait for one operation; `0` waits forever.
    pub timeout_secs: u64,
    /// Arguments placed before `--headless`.
    pub extra_args: Vec<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            engine_path: DEFAULT_ENGINE_PATH.to_string(),
            operations_script: DEFAULT_OPERATIONS_SCRIPT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            extra_args: Vec::new(),
        }
    }
}

impl HostConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Apply environment overrides from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_ENGINE_PATH).filter(|p| !p.is_empty()) {
            self.engine_path = path;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = raw
                .trim()
                .parse()
                .map_err(|e| format!("invalid {} '{}': {}", ENV_TIMEOUT_SECS, raw, e))?;
        }
        Ok(())
    }
}

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Parse a config from a string.
pub fn parse_config(yaml: &str) -> Result<HostConfig, String> {
    if yaml.trim().is_empty() {
        return Ok(HostConfig::default());
    }
    serde_yaml_ng::from_str(yaml).map_err(|e| format!("YAML parse error: {}", e))
}

/// Parse a config file; a missing file yields the defaults.
pub fn parse_config_file(path: &Path) -> Result<HostConfig, String> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("no config at {}, using defaults", path.display());
            Ok(HostConfig::default())
        }
        Err(e) => Err(format!("failed to read {}: {}", path.display(), e)),
    }
}

/// File, then process environment.
pub fn load(path: &Path) -> Result<HostConfig, String> {
    let mut config = parse_config_file(path)?;
    config.apply_overrides(|key| std::env::var(key).ok())?;
    Ok(config)
}

/// Validate a parsed config. Returns a list of errors (empty = valid).
pub fn validate_config(config: &HostConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.engine_path.trim().is_empty() {
        errors.push(ValidationError {
            message: "engine_path must not be empty".to_string(),
        });
    }
    if config.operations_script.trim().is_empty() {
        errors.push(ValidationError {
            message: "operations_script must not be empty".to_string(),
        });
    }
    for arg in &config.extra_args {
        if arg == "--" || arg == "--headless" || arg == "--script" || arg == "--path" {
            errors.push(ValidationError {
                message: format!("extra_args must not contain '{}'", arg),
            });
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_se024_parse_full() {
        let yaml = r#"
engine_path: /usr/local/bin/godot
operations_script: res://tools/ops.gd
timeout_secs: 30
extra_args: [--verbose]
"#;
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.engine_path, "/usr/local/bin/godot");
        assert_eq!(config.operations_script, "res://tools/ops.gd");
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.extra_args, vec!["--verbose"]);
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn test_se024_defaults() {
        let config = parse_config("timeout_secs: 0\n").unwrap();
        assert_eq!(config.engine_path, DEFAULT_ENGINE_PATH);
        assert_eq!(config.timeout(), None);
        assert_eq!(parse_config("").unwrap(), HostConfig::default());
        assert_eq!(
            HostConfig::default().timeout(),
            Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        );
    }

    #[test]
    fn test_se024_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = parse_config_file(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, HostConfig::default());
    }

    #[test]
    fn test_se024_bad_yaml() {
        let err = parse_config("timeout_secs: [nope").unwrap_err();
        assert!(err.starts_with("YAML parse error"));
        assert!(parse_config("timeout_secs: soon\n").is_err());
    }

    #[test]
    fn test_se024_env_overrides() {
        let mut config = HostConfig::default();
        config
            .apply_overrides(|key| match key {
                ENV_ENGINE_PATH => Some("/opt/engine".to_string()),
                ENV_TIMEOUT_SECS => Some(" 12 ".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.engine_path, "/opt/engine");
        assert_eq!(config.timeout_secs, 12);

        let err = config
            .apply_overrides(|key| (key == ENV_TIMEOUT_SECS).then(|| "x".to_string()))
            .unwrap_err();
        assert!(err.contains(ENV_TIMEOUT_SECS));
    }

    #[test]
    fn test_se024_validation() {
        let config = HostConfig {
            engine_path: " ".into(),
            operations_script: "".into(),
            timeout_secs: 1,
            extra_args: vec!["--".into()],
        };
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 3);
        assert!(errors[0].to_string().contains("engine_path"));
    }
}
