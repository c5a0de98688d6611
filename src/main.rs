mod arc;
mod cli;
mod commands;
mod config;
mod database;
mod form;
mod home;
mod logging;
mod matcher;
mod models;
mod stack;
mod tasks_api;
mod time;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use config::AppConfig;
use database::Database;
use tasks_api::TasksApi;
use ui::run_tui;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init(&logging::default_log_dir())?;
    let db = Database::new()?;
    // Settings commands must keep working even when a stored value is bad.
    let config = || AppConfig::resolve(&db, cli.user.clone(), cli.api.clone());

    match cli.command {
        Some(Commands::Set { key, value }) => {
            commands::set_config(&db, &key, &value)?;
        }
        Some(Commands::Get { key }) => {
            commands::get_config(&db, &key)?;
        }
        Some(Commands::ConfigList) => {
            commands::list_configs(&db)?;
        }
        Some(Commands::ConfigDelete { key }) => {
            commands::delete_config(&db, &key)?;
        }
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
            generate(shell_enum, &mut cmd, "tasktimer", &mut std::io::stdout());
        }
        Some(Commands::List { completed, active }) => {
            let filter = match (completed, active) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            with_api(&config()?, |api, user| async move {
                commands::list_tasks(&api, &user, filter).await
            })?;
        }
        Some(Commands::Add { title, duration }) => {
            with_api(&config()?, |api, user| async move {
                commands::add_task(&api, &user, &title, &duration).await
            })?;
        }
        Some(Commands::Done { title }) => {
            with_api(&config()?, |api, user| async move {
                commands::complete_task(&api, &user, &title).await
            })?;
        }
        Some(Commands::Restore { title }) => {
            with_api(&config()?, |api, user| async move {
                commands::restore_task(&api, &user, &title).await
            })?;
        }
        Some(Commands::Delete { title }) => {
            with_api(&config()?, |api, user| async move {
                commands::delete_task(&api, &user, &title).await
            })?;
        }
        Some(Commands::Tui) | None => {
            let config = config()?;
            let username = config.require_username()?.to_string();
            let api = TasksApi::new(&config.api_base_url)?;
            let rt = tokio::runtime::Runtime::new()?;
            run_tui(&config, api, username, rt.handle().clone())?;
        }
    }

    Ok(())
}

/// Runs one store command on a fresh runtime.
fn with_api<F, Fut>(config: &AppConfig, f: F) -> Result<()>
where
    F: FnOnce(TasksApi, String) -> Fut,
    Fut: std::future::Future<Output = Result<()>>,
{
    let username = config.require_username()?.to_string();
    let api = TasksApi::new(&config.api_base_url)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(f(api, username))
}
