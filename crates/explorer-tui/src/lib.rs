//! explorer-tui - Terminal UI for SDK Explorer
//!
//! This crate provides the ratatui-based terminal interface. It drives an
//! `Explorer` from explorer-app and adds terminal rendering, event polling,
//! and widget display.

pub mod event;
pub mod layout;
pub mod render;
pub mod runner;
pub mod terminal;
pub mod theme;
pub mod widgets;

#[cfg(test)]
pub mod test_utils;

// Re-export main entry points
pub use runner::{console_sink, run, MESSAGE_CHANNEL_CAPACITY};
