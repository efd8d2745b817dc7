use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::CliError;

/// Default settings file looked up in the working directory.
pub const SETTINGS_FILE: &str = "asn1rt.toml";

/// Defaults read from `asn1rt.toml`; command-line flags override them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliSettings {
    pub log_level: String,
    pub log_json: bool,
    pub log_file: Option<PathBuf>,
    pub testcase_seed: u64,
    pub testcase_count: u64,
    pub max_collection_len: u64,
}

impl Default for CliSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_json: false,
            log_file: None,
            testcase_seed: 42,
            testcase_count: 10,
            max_collection_len: 16,
        }
    }
}

/// Read settings from `path`, or the defaults when the file does not exist.
pub fn load_settings(path: &Path) -> Result<CliSettings, CliError> {
    if !path.exists() {
        return Ok(CliSettings::default());
    }
    let content = std::fs::read_to_string(path)?;
    parse_settings(&content)
}

pub fn parse_settings(content: &str) -> Result<CliSettings, CliError> {
    let settings: CliSettings = toml::from_str(content)?;
    if settings.testcase_count == 0 {
        return Err(CliError::InvalidConfig(
            "testcase_count must be at least 1".to_string(),
        ));
    }
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let settings = parse_settings("log_level = \"debug\"\ntestcase_seed = 7\n").expect("parse");
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.testcase_seed, 7);
        assert_eq!(settings.testcase_count, CliSettings::default().testcase_count);
        assert!(!settings.log_json);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = parse_settings("log_colour = true\n").unwrap_err();
        assert!(matches!(err, CliError::Toml(_)));
    }

    #[test]
    fn zero_testcase_count_is_invalid() {
        let err = parse_settings("testcase_count = 0\n").unwrap_err();
        assert!(matches!(err, CliError::InvalidConfig(_)));
    }

    #[test]
    fn absent_file_yields_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("does-not-exist.toml");
        assert_eq!(load_settings(&path).expect("defaults"), CliSettings::default());
    }
}
