use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Dashboard, task list and calendar for your tasks", long_about = None)]
pub struct Cli {
    /// SQLite file holding tasks and config
    #[arg(long, env = "TASKMASTER_DB", global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch TUI interface
    Tui,
    /// Show counters, overall progress and the next open tasks
    Dashboard,
    /// List tasks
    List {
        /// all, pending, in-progress or completed
        #[arg(short, long, default_value = "all")]
        filter: String,
    },
    /// Print a month calendar with task markers
    Calendar {
        /// Month to show as YYYY-MM, defaults to the current month
        #[arg(short, long, value_name = "YYYY-MM")]
        month: Option<String>,
    },
    /// Show one task with its subtasks
    Show {
        #[arg(value_name = "TASK")]
        task: String,
    },
    /// Add a task
    Add {
        #[arg(value_name = "NAME")]
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
        /// low, medium or high
        #[arg(short, long, default_value = "medium")]
        priority: String,
        /// Due date as YYYY-MM-DD, defaults to tomorrow
        #[arg(long, value_name = "DATE")]
        due: Option<String>,
        /// Subtask name, repeat for more
        #[arg(short, long = "subtask", value_name = "NAME")]
        subtasks: Vec<String>,
    },
    /// Edit a task. Subtasks are rebuilt, so all come back unchecked
    Edit {
        #[arg(value_name = "TASK")]
        task: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        priority: Option<String>,
        #[arg(long, value_name = "DATE")]
        due: Option<String>,
        /// Replacement subtask names; without any, current names are kept
        #[arg(short, long = "subtask", value_name = "NAME", conflicts_with = "clear_subtasks")]
        subtasks: Vec<String>,
        /// Remove every subtask
        #[arg(long)]
        clear_subtasks: bool,
    },
    /// Flip a task between completed and pending
    Toggle {
        #[arg(value_name = "TASK")]
        task: String,
    },
    /// Check or uncheck a subtask
    Subtask {
        #[arg(value_name = "TASK")]
        task: String,
        #[arg(value_name = "SUBTASK_ID")]
        subtask_id: u64,
    },
    /// Delete a task
    Delete {
        #[arg(value_name = "TASK")]
        task: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Fuzzy search task names
    Search {
        #[arg(value_name = "QUERY")]
        query: String,
    },
    /// Print the stored task list as JSON
    Export,
    /// Remove stored tasks; the demo tasks come back on next start
    Reset {
        #[arg(short, long)]
        yes: bool,
    },
    /// Set a config value
    Set {
        #[arg(value_name = "KEY")]
        key: String,
        #[arg(value_name = "VALUE")]
        value: String,
    },
    /// Get a config value
    Get {
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// List config values
    ConfigList,
    /// Delete a config value
    ConfigDelete {
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_name = "SHELL")]
        shell: String,
    },
}
