use anyhow::{bail, Result};
use std::io::{self, Write};

use crate::config::validate_setting;
use crate::database::Database;
use crate::matcher::find_task;
use crate::models::{Task, TaskPatch};
use crate::tasks_api::TasksApi;
use crate::time::{format_duration, format_time, parse_task_duration};

// Helper function to ask user for confirmation
fn ask_user_confirmation(input: &str, suggested: &str) -> Result<bool> {
    print!("'{}' not found. Did you mean '{}'? (y/n): ", input, suggested);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

/// Resolves a title typed on the command line to one of `tasks`.
fn pick_task(tasks: Vec<Task>, title: &str) -> Result<Option<Task>> {
    let Some(found) = find_task(&tasks, title) else {
        println!("Task '{}' not found.", title);
        return Ok(None);
    };

    if !found.exact && !ask_user_confirmation(title, found.task.display_title())? {
        println!("Operation cancelled.");
        return Ok(None);
    }
    Ok(Some(found.task.clone()))
}

fn task_id(task: &Task) -> Result<&str> {
    match task.id.as_deref() {
        Some(id) => Ok(id),
        None => bail!("task '{}' has no id", task.display_title()),
    }
}

pub async fn list_tasks(api: &TasksApi, username: &str, completed: Option<bool>) -> Result<()> {
    let tasks = api.get_tasks(username, completed).await?;
    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    println!("Tasks for {}:", username);
    for task in &tasks {
        let state = if task.is_completed { "done" } else { "todo" };
        println!(
            "  [{}] {} | {} | {} left",
            state,
            task.display_title(),
            format_duration(task.duration()),
            format_time(task.remaining())
        );
    }
    Ok(())
}

pub async fn add_task(api: &TasksApi, username: &str, title: &str, duration: &str) -> Result<()> {
    let seconds = match parse_task_duration(duration) {
        Some(secs) => secs,
        None => {
            println!("Error: duration must be H:MM:SS or like \"1 hour 30 minutes\".");
            return Ok(());
        }
    };

    let task = Task::new(title.trim(), seconds);
    api.create_task(username, &task).await?;
    println!("Task '{}' added ({}).", task.display_title(), format_duration(seconds));
    Ok(())
}

pub async fn complete_task(api: &TasksApi, username: &str, title: &str) -> Result<()> {
    let tasks = api.get_tasks(username, Some(false)).await?;
    if let Some(task) = pick_task(tasks, title)? {
        api.update_task(username, task_id(&task)?, &TaskPatch::completed()).await?;
        println!("Task '{}' marked completed.", task.display_title());
    }
    Ok(())
}

pub async fn restore_task(api: &TasksApi, username: &str, title: &str) -> Result<()> {
    let tasks = api.get_tasks(username, Some(true)).await?;
    if let Some(task) = pick_task(tasks, title)? {
        api.update_task(username, task_id(&task)?, &TaskPatch::restored(&task)).await?;
        println!("Task '{}' is back on the list.", task.display_title());
    }
    Ok(())
}

pub async fn delete_task(api: &TasksApi, username: &str, title: &str) -> Result<()> {
    let tasks = api.get_tasks(username, None).await?;
    if let Some(task) = pick_task(tasks, title)? {
        api.delete_task(username, task_id(&task)?).await?;
        println!("Task '{}' deleted.", task.display_title());
    }
    Ok(())
}

pub fn set_config(db: &Database, key: &str, value: &str) -> Result<()> {
    validate_setting(key, value)?;
    db.set_config(key, value)?;
    println!("Config '{}' set to '{}'", key, value);
    Ok(())
}

pub fn get_config(db: &Database, key: &str) -> Result<()> {
    match db.get_config(key)? {
        Some(value) => println!("{}", value),
        None => println!("Config '{}' not found", key),
    }
    Ok(())
}

pub fn list_configs(db: &Database) -> Result<()> {
    let configs = db.get_all_configs()?;
    if configs.is_empty() {
        println!("No configs found.");
        return Ok(());
    }
    for config in configs {
        match config.description {
            Some(description) => println!("{} = {}  # {}", config.key_name, config.value, description),
            None => println!("{} = {}", config.key_name, config.value),
        }
    }
    Ok(())
}

pub fn delete_config(db: &Database, key: &str) -> Result<()> {
    if db.delete_config(key)? {
        println!("Config '{}' deleted", key);
    } else {
        println!("Config '{}' not found", key);
    }
    Ok(())
}
