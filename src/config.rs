//! Inspector configuration.
//!
//! Loaded from `~/.inspector/config.toml`. A missing file means defaults.
//! `INSPECTOR_CLI` and `INSPECTOR_TARGET_ORG` override the file.

use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const DEFAULT_CLI: &str = "sf";
const DEFAULT_LOG_EXTENSION: &str = "log";

/// Inspector configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Name or path of the data CLI.
    pub cli: String,

    /// Org alias passed as `--target-org`.
    /// When unset the CLI's own default org is used.
    pub target_org: Option<String>,

    /// Extension of files offered as debug logs.
    pub log_extension: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cli: DEFAULT_CLI.to_string(),
            target_org: None,
            log_extension: DEFAULT_LOG_EXTENSION.to_string(),
        }
    }
}

impl Config {
    /// Load config from `~/.inspector/config.toml`, then apply the
    /// environment overrides.
    pub fn load() -> Result<Self, String> {
        let path = Self::path().ok_or("could not determine home directory")?;

        let mut config = if path.exists() {
            let contents = fs::read_to_string(&path)
                .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
            Self::parse(&contents)
                .map_err(|e| format!("invalid config at {}: {e}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_overrides(
            env::var("INSPECTOR_CLI").ok(),
            env::var("INSPECTOR_TARGET_ORG").ok(),
        );
        tracing::debug!(?config, "loaded config");
        Ok(config)
    }

    fn parse(contents: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(contents).map_err(|e| e.to_string())?;
        if config.cli.trim().is_empty() {
            return Err("cli must not be empty".to_string());
        }
        Ok(config)
    }

    fn apply_overrides(&mut self, cli: Option<String>, target_org: Option<String>) {
        if let Some(cli) = cli.filter(|c| !c.trim().is_empty()) {
            self.cli = cli;
        }
        if let Some(org) = target_org.filter(|o| !o.trim().is_empty()) {
            self.target_org = Some(org);
        }
    }

    /// Whether `path` looks like a debug log by extension.
    pub fn is_log_file(&self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.log_extension))
    }

    /// The config file path: `~/.inspector/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".inspector").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::Path;

    #[test]
    fn empty_file_is_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn parses_kebab_case_keys() {
        let config = Config::parse(
            r#"
            cli = "/opt/sf/bin/sf"
            target-org = "dev-sandbox"
            log-extension = "txt"
            "#,
        )
        .unwrap();

        assert_eq!(config.cli, "/opt/sf/bin/sf");
        assert_eq!(config.target_org.as_deref(), Some("dev-sandbox"));
        assert_eq!(config.log_extension, "txt");
    }

    #[test]
    fn rejects_blank_cli() {
        assert!(Config::parse("cli = \"  \"").is_err());
    }

    #[test]
    fn rejects_unknown_value_types() {
        assert!(Config::parse("target-org = 3").is_err());
    }

    #[test]
    fn environment_overrides_file() {
        let mut config = Config::parse("target-org = \"dev\"").unwrap();

        config.apply_overrides(Some("sfdx".into()), Some("prod".into()));

        assert_eq!(config.cli, "sfdx");
        assert_eq!(config.target_org.as_deref(), Some("prod"));
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let mut config = Config::default();
        config.apply_overrides(Some(String::new()), Some(" ".into()));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn log_files_match_by_extension() {
        let config = Config::default();
        assert!(config.is_log_file(Path::new("apex-07L000.log")));
        assert!(config.is_log_file(Path::new("DEBUG.LOG")));
        assert!(!config.is_log_file(Path::new("notes.txt")));
        assert!(!config.is_log_file(Path::new("log")));
    }
}
