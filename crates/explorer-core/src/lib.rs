//! # explorer-core - Core Domain Types
//!
//! Foundation crate for SDK Explorer. Provides parameter schemas, raw form
//! values, live call arguments, the navigation menu tree and error handling.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, serde_json, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Schemas (`schema`)
//! - [`ParameterKind`] - Text, Number, Boolean, Binary, Structured, CallbackLiteral
//! - [`ParameterDescriptor`] - One declared parameter with its default
//! - [`ParameterSchema`] - Ordered descriptors for one method
//! - [`FormKey`] - `<namespace>.<method>` identifier scoping persisted snapshots
//!
//! ### Values (`value`, `live`)
//! - [`FormValue`], [`FormValueMap`] - Literal control input
//! - [`Attachment`] - Handle to a picked file
//! - [`LiveValue`] - Execute-mode argument tree
//! - [`Callback`], [`CompiledFunction`] - Callback arguments
//!
//! ### Menu (`menu`)
//! - [`MenuNode`] - Static navigation tree
//! - [`find_ancestor_keys()`] - Branches to expand for a page
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum; `is_recoverable` marks user-input errors
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use explorer_core::prelude::*;
//! ```

pub mod error;
pub mod live;
pub mod logging;
pub mod menu;
pub mod prelude;
pub mod schema;
pub mod value;

// Re-export commonly used types at crate root for convenience
pub use error::{Error, Result, ResultExt};
pub use live::{Callback, CallbackError, CompiledFunction, LiveValue};
pub use menu::{
    duplicate_keys, find_ancestor_keys, find_node, label_path, leaf_keys, visible_rows, MenuNode,
    VisibleRow,
};
pub use schema::{FormKey, ParameterDescriptor, ParameterKind, ParameterSchema};
pub use value::{Attachment, FormValue, FormValueMap};
