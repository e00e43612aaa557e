//! Configuration types for SDK Explorer
//!
//! Every section and field has a serde default, so a partial `config.toml`
//! (or none at all) still yields complete settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Application settings (`config.toml`)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub output: OutputSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub behavior: BehaviorSettings,

    #[serde(default)]
    pub ui: UiSettings,
}

/// How emitted call expressions are written
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OutputSettings {
    /// Object that emitted global references go through (`window.foo`)
    #[serde(default = "default_global_accessor")]
    pub global_accessor: String,

    /// Text placed between emitted arguments
    #[serde(default = "default_argument_separator")]
    pub argument_separator: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            global_accessor: default_global_accessor(),
            argument_separator: default_argument_separator(),
        }
    }
}

fn default_global_accessor() -> String {
    "window".to_string()
}

fn default_argument_separator() -> String {
    ", ".to_string()
}

/// Where form snapshots live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Snapshot directory; the platform data directory when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// Submit behavior
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BehaviorSettings {
    /// Keep typed input even when it fails to serialize
    #[serde(default = "default_true")]
    pub persist_on_serialize_error: bool,

    /// Store results of pages that declare a result identifier
    #[serde(default = "default_true")]
    pub store_results: bool,
}

impl Default for BehaviorSettings {
    fn default() -> Self {
        Self {
            persist_on_serialize_error: true,
            store_results: true,
        }
    }
}

/// UI settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UiSettings {
    /// Menu panel width in columns
    #[serde(default = "default_menu_width")]
    pub menu_width: u16,

    /// Show parameter descriptions under the focused control
    #[serde(default = "default_true")]
    pub show_descriptions: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            menu_width: default_menu_width(),
            show_descriptions: true,
        }
    }
}

fn default_menu_width() -> u16 {
    32
}

fn default_true() -> bool {
    true
}
