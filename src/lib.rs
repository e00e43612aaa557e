//! SDK Explorer library
//!
//! Wires the demo catalog and loopback SDK to the explorer engine and
//! provides the headless commands behind the `sdkx` binary.

pub mod commands;
pub mod demo;
pub mod headless;

pub use commands::build_explorer;
pub use headless::HeadlessEvent;
