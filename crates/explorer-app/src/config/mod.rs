//! Configuration file handling
//!
//! - `types` - `Settings` and its sections
//! - `settings` - loading, validation and first-run initialization

pub mod settings;
pub mod types;

pub use settings::{default_config_path, init_config, load_settings, CONFIG_FILENAME};
pub use types::*;
