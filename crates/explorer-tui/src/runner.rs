//! Main TUI runner - entry point and event loop
//!
//! - `run`: takes over the terminal and drives an [`Explorer`]
//! - `run_loop`: drains background messages, renders, polls the terminal
//! - `process_message`: TEA update plus action dispatch

use std::sync::Arc;

use explorer_app::handler::{self, UpdateAction};
use explorer_app::signals;
use explorer_app::state::OutputKind;
use explorer_app::{AppState, ConsoleSink, Explorer, Message};
use explorer_core::prelude::*;
use explorer_core::FormKey;
use tokio::sync::mpsc;

use crate::{event, render, terminal};

/// Capacity of the background message channel
pub const MESSAGE_CHANNEL_CAPACITY: usize = 256;

/// Console sink that forwards callback `console.log` lines into the UI
///
/// Lines are dropped (and logged) if the channel is full.
pub fn console_sink(tx: mpsc::Sender<Message>) -> ConsoleSink {
    Arc::new(move |line: &str| {
        if let Err(e) = tx.try_send(Message::ConsoleLine(line.to_string())) {
            debug!("Dropped console line: {}", e);
        }
    })
}

/// Run the TUI until the user quits
///
/// `msg_tx`/`msg_rx` are one channel; the sender is shared with anything
/// that reports back asynchronously (settled calls, console lines, signals).
pub async fn run(
    mut explorer: Explorer,
    msg_tx: mpsc::Sender<Message>,
    msg_rx: mpsc::Receiver<Message>,
    open: Option<FormKey>,
) -> Result<()> {
    terminal::install_panic_hook();

    let mut state = AppState::new(
        explorer.catalog().menu().to_vec(),
        explorer.settings().ui.clone(),
    );
    state.push_output(
        OutputKind::Info,
        format!(
            "{} methods in {} namespaces",
            explorer.registry().len(),
            explorer.registry().namespaces().len()
        ),
    );
    info!("Starting TUI with {} pages", explorer.catalog().len());

    if let Some(key) = open {
        process_message(&mut state, &mut explorer, Message::OpenPage(key), &msg_tx);
    }

    let signals = signals::spawn_signal_handler(msg_tx.clone());

    let mut term = ratatui::init();
    let result = run_loop(&mut term, &mut state, &mut explorer, msg_rx, &msg_tx);
    ratatui::restore();
    signals.abort();

    if let Some(key) = &state.submitting {
        warn!("Exiting while {} is still in flight", key);
    }
    result
}

fn run_loop(
    terminal: &mut ratatui::DefaultTerminal,
    state: &mut AppState,
    explorer: &mut Explorer,
    mut msg_rx: mpsc::Receiver<Message>,
    msg_tx: &mpsc::Sender<Message>,
) -> Result<()> {
    while !state.should_quit() {
        while let Ok(msg) = msg_rx.try_recv() {
            process_message(state, explorer, msg, msg_tx);
        }

        terminal
            .draw(|frame| render::view(frame, state))
            .map_err(|e| Error::terminal(format!("Failed to draw frame: {}", e)))?;

        if let Some(message) = event::poll()? {
            process_message(state, explorer, message, msg_tx);
        }
    }

    Ok(())
}

/// Process a message through the TEA update function, following up
/// messages and dispatching actions
pub fn process_message(
    state: &mut AppState,
    explorer: &mut Explorer,
    message: Message,
    msg_tx: &mpsc::Sender<Message>,
) {
    let mut msg = Some(message);
    while let Some(m) = msg {
        let result = handler::update(state, explorer, m);
        if let Some(action) = result.action {
            handle_action(action, msg_tx.clone());
        }
        msg = result.message;
    }
}

fn handle_action(action: UpdateAction, msg_tx: mpsc::Sender<Message>) {
    match action {
        UpdateAction::SpawnCall(prepared) => {
            let key = prepared.key().clone();
            debug!("Spawning call {}", key);
            tokio::spawn(async move {
                let settled = prepared.run().await;
                if msg_tx
                    .send(Message::CallSettled(Box::new(settled)))
                    .await
                    .is_err()
                {
                    warn!("UI closed before {} settled", key);
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_state, test_explorer};
    use explorer_core::LiveValue;

    #[tokio::test]
    async fn test_submit_round_trips_through_channel() {
        let mut explorer = test_explorer();
        let mut state = create_test_state();
        let (tx, mut rx) = mpsc::channel(MESSAGE_CHANNEL_CAPACITY);

        process_message(
            &mut state,
            &mut explorer,
            Message::OpenPage(FormKey::new("im", "sendText")),
            &tx,
        );
        assert!(state.form.is_some());

        process_message(&mut state, &mut explorer, Message::Submit, &tx);
        assert!(state.is_submitting());

        let settled = rx.recv().await.unwrap();
        assert!(matches!(settled, Message::CallSettled(_)));
        process_message(&mut state, &mut explorer, settled, &tx);

        assert!(!state.is_submitting());
        assert_eq!(
            explorer.globals().get("lastText"),
            Some(&LiveValue::from("alice"))
        );
        assert!(state
            .output
            .iter()
            .any(|e| e.kind == OutputKind::Result && e.text.contains("alice")));
    }

    #[tokio::test]
    async fn test_console_sink_forwards_lines() {
        let (tx, mut rx) = mpsc::channel(4);
        let sink = console_sink(tx);

        sink("hello from callback");

        match rx.recv().await.unwrap() {
            Message::ConsoleLine(line) => assert_eq!(line, "hello from callback"),
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_console_sink_drops_when_full() {
        let (tx, mut rx) = mpsc::channel(1);
        let sink = console_sink(tx);

        sink("first");
        sink("second");

        assert!(matches!(rx.recv().await, Some(Message::ConsoleLine(l)) if l == "first"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_follow_up_messages_are_processed() {
        let mut explorer = test_explorer();
        let mut state = create_test_state();
        let (tx, _rx) = mpsc::channel(1);

        // q maps to RequestQuit, which is handled in the same pass
        process_message(
            &mut state,
            &mut explorer,
            Message::Key(explorer_app::InputKey::Char('q')),
            &tx,
        );

        assert!(state.should_quit());
    }
}
