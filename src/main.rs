mod app;
mod cli;
mod commands;
mod database;
mod editor;
mod form;
mod logging;
mod models;
mod settings;
mod store;
mod ui;
mod view;

use anyhow::Result;
use chrono::Local;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use database::Database;
use logging::LogTarget;
use settings::Settings;
use std::path::Path;
use store::TaskStore;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let target = match cli.command {
        None | Some(Commands::Tui) => LogTarget::File(logging::default_log_path()),
        Some(_) => LogTarget::Stderr,
    };
    if let Err(e) = logging::init(target) {
        eprintln!("Warning: {}", e);
    }

    let db_path = cli.db.clone().unwrap_or_else(Database::default_path);
    let today = Local::now().date_naive();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            use clap_complete::{generate, Shell};
            let shell = shell.to_lowercase();
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "elvish" => Shell::Elvish,
                "powershell" => Shell::PowerShell,
                _ => {
                    println!("Unsupported shell: {}", shell);
                    return Ok(());
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "taskmaster", &mut std::io::stdout());
        }
        Some(Commands::Reset { yes }) => {
            let db = Database::open(&db_path)?;
            commands::reset_tasks(&db, yes)?;
        }
        Some(Commands::Set { key, value }) => {
            let db = Database::open(&db_path)?;
            commands::set_config(&db, &key, &value)?;
        }
        Some(Commands::Get { key }) => {
            let db = Database::open(&db_path)?;
            commands::get_config(&db, &key)?;
        }
        Some(Commands::ConfigList) => {
            let db = Database::open(&db_path)?;
            commands::list_configs(&db)?;
        }
        Some(Commands::ConfigDelete { key }) => {
            let db = Database::open(&db_path)?;
            commands::delete_config(&db, &key)?;
        }
        Some(Commands::Dashboard) => commands::print_dashboard(&load_store(&db_path)?, today),
        Some(Commands::List { filter }) => commands::print_list(&load_store(&db_path)?, &filter)?,
        Some(Commands::Calendar { month }) => {
            commands::print_calendar(&load_store(&db_path)?, month.as_deref(), today)?;
        }
        Some(Commands::Show { task }) => commands::show_task(&load_store(&db_path)?, &task)?,
        Some(Commands::Add { name, description, priority, due, subtasks }) => {
            let args = commands::AddArgs { name, description, priority, due, subtasks };
            commands::add_task(&mut load_store(&db_path)?, args, today)?;
        }
        Some(Commands::Edit { task, name, description, priority, due, subtasks, clear_subtasks }) => {
            let args = commands::EditArgs { name, description, priority, due, subtasks, clear_subtasks };
            commands::edit_task(&mut load_store(&db_path)?, &task, args)?;
        }
        Some(Commands::Toggle { task }) => commands::toggle_task(&mut load_store(&db_path)?, &task)?,
        Some(Commands::Subtask { task, subtask_id }) => {
            commands::toggle_subtask(&mut load_store(&db_path)?, &task, subtask_id)?;
        }
        Some(Commands::Delete { task, yes }) => {
            commands::delete_task(&mut load_store(&db_path)?, &task, yes)?;
        }
        Some(Commands::Search { query }) => commands::search_tasks(&load_store(&db_path)?, &query),
        Some(Commands::Export) => commands::export_tasks(&load_store(&db_path)?)?,
        Some(Commands::Tui) | None => {
            // Default behavior: launch TUI
            let db = Database::open(&db_path)?;
            let settings = Settings::load(&db)?;
            let store = TaskStore::load(db);
            log::info!("Starting TUI with {} task(s)", store.tasks().len());
            ui::run_tui(app::App::new(store, &settings))?;
        }
    }

    Ok(())
}

fn load_store(path: &Path) -> Result<TaskStore> {
    Ok(TaskStore::load(Database::open(path)?))
}
