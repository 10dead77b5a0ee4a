//! First-run setup.
//!
//! Writes the default configuration file when none exists and keeps the
//! `config_version` stamp of an existing file current.

pub mod version;

use std::path::Path;

use version::SetupAction;

/// Embedded default configuration template.
pub const DEFAULT_CONFIG: &str = include_str!("../../config/barscope.toml");

/// Current application version from Cargo.toml
const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Creates or re-stamps the config file at `config_path`.
///
/// # Errors
/// Returns an error if the config directory or file cannot be written.
pub fn ensure_config(config_path: &Path) -> anyhow::Result<()> {
    match version::check_setup_needed(config_path)? {
        SetupAction::Create => {
            write_default_config(config_path)?;
            tracing::info!("Created default configuration at {}", config_path.display());
            println!("It seems you have started barscope for the first time.");
            println!("New configuration file was created:");
            println!("{}", config_path.display());
        }
        SetupAction::Migrate(old_version) => {
            tracing::info!(
                "Updating config version from {} to {}",
                old_version,
                CURRENT_VERSION
            );
            version::update_config_version(config_path)?;
        }
        SetupAction::None => {
            tracing::debug!("Config version up to date ({})", CURRENT_VERSION);
        }
    }
    Ok(())
}

/// Writes the default configuration prefixed with the version stamp.
fn write_default_config(config_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let version_line = format!(r#"config_version = "{}""#, CURRENT_VERSION);
    std::fs::write(config_path, format!("{}\n{}", version_line, DEFAULT_CONFIG))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BarscopeConfig;

    #[test]
    fn test_first_run_writes_loadable_config() {
        let dir = std::env::temp_dir().join(format!("barscope-setup-{}", std::process::id()));
        let path = dir.join("barscope.toml");
        std::fs::remove_dir_all(&dir).ok();

        ensure_config(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("config_version = "));
        assert!(BarscopeConfig::load_from(&path).is_ok());

        // A second run leaves the file alone
        ensure_config(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), content);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_bad_stamp_falls_back_to_default_config() {
        let path = std::env::temp_dir().join(format!(
            "barscope-banana-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "config_version = \"banana\"\n[main]\nsource = 0\n").unwrap();

        ensure_config(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(&format!("config_version = \"{CURRENT_VERSION}\"")));

        let config = BarscopeConfig::load_or_default(&path).unwrap();
        assert_eq!(config.main.source, 0);
        assert!(config.bars.scale > 0.0);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_non_utf8_config_falls_back_to_default_config() {
        let path = std::env::temp_dir().join(format!(
            "barscope-binary-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x9f]).unwrap();

        ensure_config(&path).unwrap();
        assert!(BarscopeConfig::load_or_default(&path).is_ok());

        std::fs::remove_file(&path).ok();
    }
}
