//! Task management commands for CLI.

use clap::Subcommand;
use kairos_core::{Config, Database, FilterSpec};
use std::sync::Arc;

use super::{resolve_user, task_assistant, CliResult};
use crate::render;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a task from free text, e.g. `Finish homework [high] due:tomorrow project:Math`
    Add {
        /// Task text with optional inline tags
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        /// Owner (defaults to chat.user_id)
        #[arg(long)]
        user: Option<String>,
    },
    /// List tasks, narrowed by words such as `open`, `done`, `today`, `tomorrow`, `week`
    List {
        words: Vec<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
        /// Owner (defaults to chat.user_id)
        #[arg(long)]
        user: Option<String>,
    },
    /// Mark a task done
    Done {
        /// Task ID or title
        #[arg(required = true, num_args = 1..)]
        task: Vec<String>,
        /// Owner (defaults to chat.user_id)
        #[arg(long)]
        user: Option<String>,
    },
}

pub async fn run(action: TaskAction) -> CliResult {
    let config = Config::load()?;
    let assistant = task_assistant(Arc::new(Database::open()?), &config)?;

    match action {
        TaskAction::Add { text, user } => {
            let user = resolve_user(user, &config);
            let task = assistant.create_task(&user, &text.join(" ")).await?;
            println!("Task created: {}", task.id);
            println!("{}", render::task_line(&task));
        }
        TaskAction::List { words, json, user } => {
            let user = resolve_user(user, &config);
            let spec = FilterSpec::parse(words.iter().map(String::as_str));
            let tasks = assistant.list_tasks(&user, &spec).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() {
                println!("No tasks.");
            } else {
                for task in &tasks {
                    println!("{}", render::task_line(task));
                }
            }
        }
        TaskAction::Done { task, user } => {
            let user = resolve_user(user, &config);
            let task = assistant.complete_task(&user, &task.join(" ")).await?;
            println!("Task done: {}", render::task_line(&task));
        }
    }
    Ok(())
}
