//! SDK Explorer - browse a messaging SDK, fill in parameter forms, call
//! methods and copy the call expressions
//!
//! This is the binary entry point. All logic lives in the library crates.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::eyre;
use explorer_app::config::{default_config_path, load_settings, Settings};
use explorer_core::FormKey;
use sdk_explorer::commands::{self, parse_assignment, Assignment};
use sdk_explorer::HeadlessEvent;
use tokio::sync::mpsc;

/// SDK Explorer - call SDK methods from parameter forms
#[derive(Parser, Debug)]
#[command(name = "sdkx")]
#[command(about = "Explore a messaging SDK from the terminal", long_about = None)]
struct Args {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Keep form snapshots in memory only
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive explorer (default)
    Tui {
        /// Open this page on start, e.g. `im.sendText`
        #[arg(long, value_name = "KEY")]
        open: Option<String>,
    },

    /// List every page with its parameters
    List,

    /// Call a method with its saved form values
    Call {
        /// Page key, e.g. `im.sendText`
        method: String,

        /// Override a parameter for this call
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        sets: Vec<Assignment>,
    },

    /// Print the call expression for a page
    Emit {
        method: String,

        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        sets: Vec<Assignment>,

        /// Print the bare expression instead of an event
        #[arg(long)]
        raw: bool,
    },

    /// Run a previously emitted call expression
    Replay { expression: String },

    /// Restore a form's declared defaults
    Reset { method: String },

    /// Show where a key sits in the menu
    Menu {
        #[arg(long, value_name = "KEY")]
        find: String,
    },

    /// Write a default config file
    Init,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    explorer_core::logging::init()?;

    let args = Args::parse();
    let config_path = args.config.clone().or_else(default_config_path);
    let settings = match &config_path {
        Some(path) => load_settings(path),
        None => Settings::default(),
    };

    let command = args.command.unwrap_or(Command::Tui { open: None });
    if let Command::Tui { open } = command {
        let open = open.as_deref().map(FormKey::parse).transpose()?;
        let (msg_tx, msg_rx) = mpsc::channel(explorer_tui::MESSAGE_CHANNEL_CAPACITY);
        let console = explorer_tui::console_sink(msg_tx.clone());
        let explorer = commands::build_explorer(settings, args.ephemeral, Some(console))?;
        explorer_tui::run(explorer, msg_tx, msg_rx, open).await?;
        return Ok(());
    }

    let console: explorer_app::ConsoleSink =
        Arc::new(|line: &str| HeadlessEvent::console(line).emit());
    let mut explorer = commands::build_explorer(settings, args.ephemeral, Some(console))?;

    let result = match command {
        Command::Tui { .. } => Ok(Vec::new()),
        Command::List => Ok(commands::list(&explorer)),
        Command::Call { method, sets } => commands::call(&mut explorer, &method, &sets).await,
        Command::Emit { method, sets, raw } => commands::emit(&explorer, &method, &sets, raw),
        Command::Replay { expression } => Ok(commands::replay(&mut explorer, &expression).await),
        Command::Reset { method } => commands::reset(&explorer, &method),
        Command::Menu { find } => Ok(vec![commands::menu_find(&explorer, &find)]),
        Command::Init => {
            let path = config_path.ok_or_else(|| eyre!("No config directory; pass --config"))?;
            commands::init(&path).map(|event| vec![event])
        }
    };

    let events = commands::report(result)?;
    for event in &events {
        event.emit();
    }
    if events.iter().any(HeadlessEvent::is_failure) {
        std::process::exit(1);
    }
    Ok(())
}
