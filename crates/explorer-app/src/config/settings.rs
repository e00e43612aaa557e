//! Settings parser for `config.toml`

use std::path::{Path, PathBuf};

use explorer_core::prelude::*;

use super::types::{OutputSettings, Settings};
use crate::script::is_identifier;

pub const CONFIG_FILENAME: &str = "config.toml";
const APP_DIR: &str = "sdk-explorer";

/// `<config_dir>/sdk-explorer/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILENAME))
}

/// Load settings from `config_path`
///
/// A missing, unreadable or invalid file yields defaults.
pub fn load_settings(config_path: &Path) -> Settings {
    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                validate_output(settings)
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Replace `[output]` values that emitted expressions could not be
/// replayed with
///
/// The accessor must be a single identifier and the separator a comma with
/// optional whitespace around it.
fn validate_output(mut settings: Settings) -> Settings {
    let defaults = OutputSettings::default();
    let output = &mut settings.output;

    if !is_identifier(&output.global_accessor) {
        warn!(
            "global_accessor {:?} is not an identifier, using {:?}",
            output.global_accessor, defaults.global_accessor
        );
        output.global_accessor = defaults.global_accessor;
    }
    if output.argument_separator.trim() != "," {
        warn!(
            "argument_separator {:?} is not a comma, using {:?}",
            output.argument_separator, defaults.argument_separator
        );
        output.argument_separator = defaults.argument_separator;
    }
    settings
}

/// Write a commented default config unless one exists
///
/// Returns whether a file was written.
pub fn init_config(config_path: &Path) -> Result<bool> {
    if config_path.exists() {
        return Ok(false);
    }
    let dir = parent_dir(config_path)?;
    std::fs::create_dir_all(dir)
        .map_err(|e| Error::config(format!("Failed to create {:?}: {}", dir, e)))?;
    std::fs::write(config_path, DEFAULT_CONFIG)
        .map_err(|e| Error::config(format!("Failed to write config.toml: {}", e)))?;
    info!("Created default config at {:?}", config_path);
    Ok(true)
}

fn parent_dir(path: &Path) -> Result<&Path> {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| Error::config(format!("{:?} has no parent directory", path)))
}

const DEFAULT_CONFIG: &str = r#"# SDK Explorer configuration

[output]
# Object that emitted references go through: window.<identifier>
global_accessor = "window"
# Text placed between emitted arguments
argument_separator = ", "

[storage]
# "file" keeps form values between runs, "memory" forgets them on exit
backend = "file"
# dir = "/path/to/snapshots"

[behavior]
# Keep typed input even when it cannot be serialized
persist_on_serialize_error = true
# Store results of pages that declare a result identifier
store_results = true

[ui]
menu_width = 32
show_descriptions = true
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::StorageBackend;
    use tempfile::tempdir;

    #[test]
    fn test_load_settings_defaults() {
        let temp = tempdir().unwrap();
        let settings = load_settings(&temp.path().join(CONFIG_FILENAME));

        assert_eq!(settings.output.global_accessor, "window");
        assert_eq!(settings.output.argument_separator, ", ");
        assert_eq!(settings.storage.backend, StorageBackend::File);
        assert!(settings.behavior.persist_on_serialize_error);
        assert_eq!(settings.ui.menu_width, 32);
    }

    #[test]
    fn test_load_settings_partial() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            r#"
[output]
global_accessor = "globalThis"

[storage]
backend = "memory"
"#,
        )
        .unwrap();

        let settings = load_settings(&path);
        assert_eq!(settings.output.global_accessor, "globalThis");
        assert_eq!(settings.output.argument_separator, ", ");
        assert_eq!(settings.storage.backend, StorageBackend::Memory);
        assert!(settings.behavior.store_results);
    }

    #[test]
    fn test_load_settings_invalid_toml() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[output\nbroken = ").unwrap();

        assert_eq!(load_settings(&path), Settings::default());
    }

    fn load_output(temp: &tempfile::TempDir, toml: &str) -> OutputSettings {
        let path = temp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, toml).unwrap();
        load_settings(&path).output
    }

    #[test]
    fn test_unreplayable_output_settings_fall_back() {
        let temp = tempdir().unwrap();

        let output = load_output(
            &temp,
            "[output]\nglobal_accessor = \"globalThis.app\"\nargument_separator = \" ; \"\n",
        );
        assert_eq!(output, OutputSettings::default());

        let output = load_output(&temp, "[output]\nglobal_accessor = \"\"\n");
        assert_eq!(output.global_accessor, "window");

        let output = load_output(&temp, "[output]\nargument_separator = \"\"\n");
        assert_eq!(output.argument_separator, ", ");
    }

    #[test]
    fn test_valid_output_settings_are_kept() {
        let temp = tempdir().unwrap();
        let output = load_output(
            &temp,
            "[output]\nglobal_accessor = \"$app\"\nargument_separator = \" ,\"\n",
        );
        assert_eq!(output.global_accessor, "$app");
        assert_eq!(output.argument_separator, " ,");
    }

    #[test]
    fn test_init_config_is_idempotent() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("sdk-explorer").join(CONFIG_FILENAME);

        assert!(init_config(&path).unwrap());
        std::fs::write(&path, "[ui]\nmenu_width = 20\n").unwrap();
        assert!(!init_config(&path).unwrap());
        assert_eq!(load_settings(&path).ui.menu_width, 20);
    }

    #[test]
    fn test_default_config_parses_to_defaults() {
        let parsed: Settings = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(parsed, Settings::default());
    }
}
