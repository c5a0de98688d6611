use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// User whose tasks to work with (overrides the stored `username`)
    #[arg(short = 'u', long = "user", global = true)]
    pub user: Option<String>,

    /// Task service base URL (overrides the stored `api_base_url`)
    #[arg(long = "api", global = true)]
    pub api: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the timer TUI
    Tui,
    /// List tasks
    List {
        /// Only completed tasks
        #[arg(long, conflicts_with = "active")]
        completed: bool,
        /// Only tasks still to do
        #[arg(long)]
        active: bool,
    },
    /// Add a task
    Add {
        #[arg(value_name = "TITLE")]
        title: String,
        /// H:MM:SS or e.g. "1 hour 30 minutes"
        #[arg(value_name = "DURATION")]
        duration: String,
    },
    /// Mark a task completed
    Done {
        #[arg(value_name = "TITLE")]
        title: String,
    },
    /// Put a completed task back on the active list
    Restore {
        #[arg(value_name = "TITLE")]
        title: String,
    },
    /// Delete a task
    Delete {
        #[arg(value_name = "TITLE")]
        title: String,
    },
    /// Set a configuration value
    Set {
        #[arg(value_name = "KEY")]
        key: String,
        #[arg(value_name = "VALUE")]
        value: String,
    },
    /// Get a configuration value
    Get {
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// List all configuration values
    ConfigList,
    /// Delete a configuration value
    ConfigDelete {
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// Print a shell completion script
    Completions {
        #[arg(value_name = "SHELL")]
        shell: String,
    },
}
