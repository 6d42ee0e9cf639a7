//! Command-line arguments for the `pocket-todo` binary.

use crate::types::TodoId;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parsed command line
#[derive(Parser, Debug)]
#[command(name = "pocket-todo")]
#[command(about = "A single to-do list kept on this device")]
#[command(version)]
pub struct Cli {
    /// Storage file; overrides `POCKET_TODO_DATA_FILE`
    #[arg(long, global = true)]
    pub data_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    /// Command to run; no subcommand means [`Command::List`]
    #[must_use]
    pub fn to_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::List)
    }
}

/// A single change (or none) applied before the list is printed
#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Print the list
    List,
    /// Add a todo
    Add {
        /// Todo text; words are joined with spaces
        #[arg(required = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Flip a todo between pending and completed
    Toggle {
        /// Todo id as shown by `list`
        id: TodoId,
    },
    /// Remove a todo
    Delete {
        /// Todo id as shown by `list`
        id: TodoId,
    },
}
