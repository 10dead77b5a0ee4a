//! Config version stamping.
//!
//! The first line of the config file records the barscope version that wrote
//! it. Older stamps are replaced on startup; the rest of the file is kept.

use anyhow::anyhow;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

/// Current application version from Cargo.toml
const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// What startup has to do with the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupAction {
    /// No config file yet
    Create,
    /// File exists with an older or missing stamp
    Migrate(String),
    None,
}

/// Represents a semantic version (major.minor.patch)
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
struct SemanticVersion {
    major: u32,
    minor: u32,
    patch: u32,
}

impl SemanticVersion {
    /// Parse a version string like "0.1.0" into a SemanticVersion
    fn parse(version_str: &str) -> anyhow::Result<Self> {
        let parts: Vec<&str> = version_str.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(anyhow!(
                "Invalid version format: '{}'. Expected 'major.minor.patch'",
                version_str
            ));
        }

        let number = |part: &str, name: &str| {
            part.parse::<u32>()
                .map_err(|_| anyhow!("Invalid {} version: '{}'", name, part))
        };

        Ok(SemanticVersion {
            major: number(parts[0], "major")?,
            minor: number(parts[1], "minor")?,
            patch: number(parts[2], "patch")?,
        })
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Extracts the version from a `config_version = "X.Y.Z"` line.
fn parse_version_line(line: &str) -> anyhow::Result<Option<String>> {
    let regex = Regex::new(r#"^\s*config_version\s*=\s*"([^"]+)""#)?;
    Ok(regex.captures(line).map(|caps| caps[1].to_string()))
}

/// Determines what setup has to do with the file at `config_path`.
///
/// A file that cannot be read is left alone; loading it later reports the
/// problem and falls back to the default. A malformed stamp is re-stamped.
///
/// # Errors
/// Returns an error only if the application version itself is malformed.
pub fn check_setup_needed(config_path: &Path) -> anyhow::Result<SetupAction> {
    if !config_path.exists() {
        return Ok(SetupAction::Create);
    }

    let content = match std::fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Cannot read {} for version check: {e}", config_path.display());
            return Ok(SetupAction::None);
        }
    };
    let first_line = content.lines().next().unwrap_or_default();

    let Some(config_version) = parse_version_line(first_line)? else {
        return Ok(SetupAction::Migrate("unknown (unversioned config)".to_string()));
    };

    let config_parsed = match SemanticVersion::parse(&config_version) {
        Ok(version) => version,
        Err(e) => {
            tracing::warn!("Ignoring config version stamp: {e}");
            return Ok(SetupAction::Migrate(format!("invalid ({config_version})")));
        }
    };
    let current_parsed = SemanticVersion::parse(CURRENT_VERSION)?;

    match config_parsed.cmp(&current_parsed) {
        Ordering::Less => Ok(SetupAction::Migrate(config_parsed.to_string())),
        Ordering::Equal => Ok(SetupAction::None),
        Ordering::Greater => {
            tracing::warn!(
                "Config version {} is newer than app version {}",
                config_version,
                CURRENT_VERSION
            );
            Ok(SetupAction::None)
        }
    }
}

/// Adds or updates the config_version line as the first line of the config file.
pub fn update_config_version(config_path: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(config_path)?;

    let lines: Vec<&str> = content
        .lines()
        .filter(|line| !line.trim().starts_with("config_version"))
        .collect();

    let version_line = format!(r#"config_version = "{}""#, CURRENT_VERSION);
    let new_content = if lines.is_empty() {
        version_line
    } else {
        format!("{}\n{}", version_line, lines.join("\n"))
    };

    std::fs::write(config_path, new_content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_version_parse() {
        let v = SemanticVersion::parse("0.1.5").unwrap();
        assert_eq!(v.major, 0);
        assert_eq!(v.minor, 1);
        assert_eq!(v.patch, 5);
    }

    #[test]
    fn test_semantic_version_comparison() {
        let v1 = SemanticVersion::parse("0.0.4").unwrap();
        let v2 = SemanticVersion::parse("0.0.5").unwrap();
        let v3 = SemanticVersion::parse("0.1.0").unwrap();

        assert!(v1 < v2);
        assert!(v2 < v3);
    }

    #[test]
    fn test_invalid_version_format() {
        assert!(SemanticVersion::parse("0.0").is_err());
        assert!(SemanticVersion::parse("0.0.5.1").is_err());
        assert!(SemanticVersion::parse("invalid").is_err());
    }

    #[test]
    fn test_version_line() {
        assert_eq!(
            parse_version_line(r#"config_version = "1.2.3""#).unwrap(),
            Some("1.2.3".to_string())
        );
        assert_eq!(parse_version_line(r#"# config_version = "1.2.3""#).unwrap(), None);
        assert_eq!(parse_version_line("[main]").unwrap(), None);
    }

    #[test]
    fn test_old_config_is_restamped() {
        let path = std::env::temp_dir().join(format!(
            "barscope-version-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "config_version = \"0.0.1\"\n[main]\nsource = 1\n").unwrap();

        assert_eq!(
            check_setup_needed(&path).unwrap(),
            SetupAction::Migrate("0.0.1".to_string())
        );
        update_config_version(&path).unwrap();
        assert_eq!(check_setup_needed(&path).unwrap(), SetupAction::None);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.ends_with("[main]\nsource = 1"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_malformed_stamp_is_restamped() {
        let path = std::env::temp_dir().join(format!(
            "barscope-bad-stamp-{}.toml",
            std::process::id()
        ));
        for stamp in ["banana", "1.2"] {
            std::fs::write(&path, format!("config_version = \"{stamp}\"\n[main]\n")).unwrap();
            assert_eq!(
                check_setup_needed(&path).unwrap(),
                SetupAction::Migrate(format!("invalid ({stamp})"))
            );
        }
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_unreadable_config_is_left_alone() {
        let path = std::env::temp_dir().join(format!(
            "barscope-not-utf8-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x9f]).unwrap();
        assert_eq!(check_setup_needed(&path).unwrap(), SetupAction::None);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_config_needs_creation() {
        let path = std::env::temp_dir().join("barscope-missing/never.toml");
        assert_eq!(check_setup_needed(&path).unwrap(), SetupAction::Create);
    }
}
