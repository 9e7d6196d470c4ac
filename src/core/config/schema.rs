//! core::config::schema
//!
//! Guard policy schema types.
//!
//! # Shape
//!
//! ```toml
//! [fs]
//! deny_prefixes = ["/etc", "/proc"]
//! write_snapshot_bytes = 262144
//!
//! [shell]
//! deny_patterns = ["rm -rf /", "mkfs"]
//! snapshot_patterns = ["rm ", "mv "]
//!
//! [net]
//! deny_hosts = ["metadata.internal"]
//! allow_hosts = []
//! ```
//!
//! All sections are optional; absent sections fall back to defaults.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Filesystem guard policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FsGuardConfig {
    /// Path prefixes where both reads and writes are denied.
    pub deny_prefixes: Vec<String>,

    /// Writes at or above this many bytes require a snapshot first.
    pub write_snapshot_bytes: u64,
}

impl Default for FsGuardConfig {
    fn default() -> Self {
        Self {
            deny_prefixes: vec![
                "/etc".into(),
                "/proc".into(),
                "/sys".into(),
                "/boot".into(),
            ],
            write_snapshot_bytes: 256 * 1024,
        }
    }
}

/// Shell guard policy.
///
/// Patterns are plain substrings matched against the full command line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ShellGuardConfig {
    /// Commands containing any of these substrings are denied.
    pub deny_patterns: Vec<String>,

    /// Commands containing any of these substrings require a snapshot.
    pub snapshot_patterns: Vec<String>,
}

impl Default for ShellGuardConfig {
    fn default() -> Self {
        Self {
            deny_patterns: vec![
                "rm -rf /".into(),
                "mkfs".into(),
                "dd if=".into(),
                ":(){".into(),
            ],
            snapshot_patterns: vec!["rm ".into(), "mv ".into(), "truncate ".into()],
        }
    }
}

/// Network guard policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct NetGuardConfig {
    /// Hosts (exact or suffix match) that are denied.
    pub deny_hosts: Vec<String>,

    /// When non-empty, only hosts matching this list are allowed.
    pub allow_hosts: Vec<String>,
}

/// The full guard policy configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GuardConfig {
    pub fs: FsGuardConfig,
    pub shell: ShellGuardConfig,
    pub net: NetGuardConfig,
}

impl GuardConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any pattern or prefix is empty;
    /// an empty pattern would match every input.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let lists: [(&str, &[String]); 5] = [
            ("fs.deny_prefixes", &self.fs.deny_prefixes),
            ("shell.deny_patterns", &self.shell.deny_patterns),
            ("shell.snapshot_patterns", &self.shell.snapshot_patterns),
            ("net.deny_hosts", &self.net.deny_hosts),
            ("net.allow_hosts", &self.net.allow_hosts),
        ];
        for (name, values) in lists {
            if values.iter().any(|v| v.is_empty()) {
                return Err(ConfigError::InvalidValue(format!(
                    "{} contains an empty entry",
                    name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(GuardConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_pattern_rejected() {
        let mut config = GuardConfig::default();
        config.shell.deny_patterns.push(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: GuardConfig = toml::from_str(
            r#"
            [net]
            deny_hosts = ["internal.example"]
            "#,
        )
        .unwrap();
        assert_eq!(config.net.deny_hosts, vec!["internal.example"]);
        assert!(!config.fs.deny_prefixes.is_empty());
    }

    #[test]
    fn unknown_fields_rejected() {
        let result: Result<GuardConfig, _> = toml::from_str("[fs]\nbogus = 1\n");
        assert!(result.is_err());
    }

    #[test]
    fn toml_roundtrip() {
        let config = GuardConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: GuardConfig = toml::from_str(&text).unwrap();
        assert_eq!(config, parsed);
    }
}
