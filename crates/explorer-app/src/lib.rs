//! explorer-app - Serialization engine and application state for SDK Explorer
//!
//! Turns a page's parameter schema and raw form values into either live
//! arguments for a registered SDK method or a copy-pasteable call
//! expression, and drives the TUI with a TEA (The Elm Architecture) state
//! machine.
//!
//! - `serializer` - Execute/Output serialization, call expression assembly and replay
//! - `invocation` - outcome normalization for sync, failing and deferred calls
//! - `persistence` - per-form snapshots over a key-value store
//! - `form`, `page` - controls, catalog, menu
//! - `engine` - submit, emit and replay flows
//! - `state`, `message`, `handler` - TEA model, messages and update

pub mod config;
pub mod engine;
pub mod form;
pub mod globals;
pub mod handler;
pub mod input_key;
pub mod invocation;
pub mod message;
pub mod page;
pub mod persistence;
pub mod registry;
pub mod script;
pub mod serializer;
pub mod signals;
pub mod sink;
pub mod state;

// Re-export primary types
pub use engine::{open_store, CallReport, Explorer, PreparedCall, SettledCall, SubmitError};
pub use form::{Control, ControlKind, FormState};
pub use globals::GlobalRegistry;
pub use handler::{UpdateAction, UpdateResult};
pub use input_key::InputKey;
pub use invocation::{invoke, Deferred, InvocationError, Outcome, Thrown};
pub use message::Message;
pub use page::{Catalog, PageSpec};
pub use persistence::{FileStore, KeyValueStore, MemoryStore, PersistedFormState};
pub use registry::{SdkMethod, SdkRegistry};
pub use script::{ConsoleSink, ExprEngine, ScriptEngine, ScriptError, SourceOnlyEngine};
pub use serializer::{
    serialize, Literal, SerializationMode, SerializeContext, SerializeError, SerializedArgs,
};
pub use sink::{BufferSink, OutputSink, StdoutSink};
pub use state::AppState;
