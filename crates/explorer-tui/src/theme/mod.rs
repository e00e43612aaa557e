//! Theme for the explorer TUI
//!
//! - `palette` - raw color constants
//! - `styles` - semantic style builders used by the widgets

pub mod palette;
pub mod styles;
