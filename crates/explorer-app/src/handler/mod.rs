//! Handler module - TEA update function and event handlers
//!
//! - `update`: main `update()` function and message dispatch
//! - `keys`: key bindings per focus and edit mode
//! - `form`: form editing and submit/emit handlers
//! - `menu`: menu navigation handlers

pub(crate) mod form;
pub(crate) mod keys;
pub(crate) mod menu;
pub(crate) mod update;


use crate::engine::PreparedCall;
use crate::message::Message;

pub use update::update;

/// Actions that the event loop should perform after update
#[derive(Debug)]
pub enum UpdateAction {
    /// Run a prepared call in the background and report back with
    /// `Message::CallSettled`
    SpawnCall(PreparedCall),
}

/// Result of processing a message
#[derive(Debug, Default)]
pub struct UpdateResult {
    /// Optional follow-up message to process
    pub message: Option<Message>,
    /// Optional action for the event loop to perform
    pub action: Option<UpdateAction>,
}

impl UpdateResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn message(msg: Message) -> Self {
        Self {
            message: Some(msg),
            action: None,
        }
    }

    pub fn action(action: UpdateAction) -> Self {
        Self {
            message: None,
            action: Some(action),
        }
    }
}
