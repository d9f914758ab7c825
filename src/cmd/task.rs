//! Operator task commands: `flowsync task add` and `flowsync task list`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use flowsync::config::{CliOverrides, SyncConfig};
use flowsync::webhook::models::{NewTask, Task, TaskStatus};
use flowsync::webhook::server::open_database;

pub struct TaskArgs {
    pub title: String,
    pub repo: String,
    pub branch_hint: String,
    pub status: String,
    pub creator: i64,
    pub project: Option<i64>,
}

fn load_config(config_path: Option<&Path>, db_path: Option<PathBuf>) -> Result<SyncConfig> {
    SyncConfig::load(
        config_path,
        &CliOverrides {
            addr: None,
            db_path,
        },
    )
}

pub fn cmd_task_add(
    config_path: Option<&Path>,
    db_path: Option<PathBuf>,
    args: TaskArgs,
) -> Result<()> {
    let status: TaskStatus = args.status.parse().map_err(anyhow::Error::msg)?;
    if args.title.trim().is_empty() {
        anyhow::bail!("Task title must not be empty");
    }

    let config = load_config(config_path, db_path)?;
    let db = open_database(&config)?;

    let mut new_task = NewTask::new(args.title, args.creator)
        .in_repo(args.repo, args.branch_hint)
        .with_status(status);
    new_task.project_id = args.project;

    let now = chrono::Utc::now().to_rfc3339();
    let task = db.create_task(&new_task, &now).context("Failed to create task")?;
    println!(
        "Created task #{} [{}] {}",
        task.id,
        task.status.as_str(),
        task.title
    );
    Ok(())
}

pub fn cmd_task_list(
    config_path: Option<&Path>,
    db_path: Option<PathBuf>,
    repo: Option<String>,
) -> Result<()> {
    let config = load_config(config_path, db_path)?;
    let db = open_database(&config)?;
    let tasks = db.list_tasks(repo.as_deref())?;

    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    println!(
        "{:<6} {:<12} {:<24} {:<24} TITLE",
        "ID", "STATUS", "REPO", "BRANCH HINT"
    );
    for task in &tasks {
        println!("{}", format_row(task));
    }
    Ok(())
}

fn format_row(task: &Task) -> String {
    format!(
        "{:<6} {:<12} {:<24} {:<24} {}",
        task.id,
        task.status.as_str(),
        task.repo_full_name.as_deref().unwrap_or("-"),
        task.branch_hint.as_deref().unwrap_or("-"),
        task.title
    )
}
