//! # TB - Task Board CLI
//!
//! A local task board with priority columns, day tabs, and deadline-driven
//! automatic priority escalation, plus an interactive TUI.
//!
//! ## Key Features
//!
//! - **Priority Columns**: High / Medium / Low lanes, reordered by deadline
//! - **Automatic Escalation**: tasks approaching or past their deadline are
//!   raised to high priority, with one-shot notifications per transition
//! - **Day Tabs**: Today (including overdue and undated tasks) plus the next
//!   six days
//! - **Achievements**: completed tasks are celebrated and archived, and can
//!   be reviewed or pruned later
//! - **Local File Storage**: two plain JSON files, easy to back up
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the board UI
//! tb
//!
//! # Add a task via CLI
//! tb add "Write the quarterly report" --priority high --due tomorrow --time 17:00
//!
//! # List today's tasks (including overdue)
//! tb list
//!
//! # Run an escalation check without opening the UI
//! tb check
//! ```
//!
//! Data is stored locally in `~/.taskboard/` as `tasks.json` and
//! `completed_tasks.json`.

use std::path::PathBuf;

use clap::Parser;

pub mod cli;
pub mod cmd;
pub mod complete;
pub mod escalate;
pub mod fields;
pub mod notify;
pub mod store;
pub mod task;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod task_form;
    pub mod utils;
}

use chrono::Local;
use cli::Cli;
use cmd::*;
use complete::recover_interrupted;
use store::{Archive, TaskStore, COMPLETED_FILE, TASKS_FILE};

fn main() {
    let cli = Cli::parse();

    // Determine the data directory.
    let data_dir = cli.dir.unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".taskboard")
    });
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        eprintln!("Failed to create data directory {}: {}", data_dir.display(), e);
        std::process::exit(1);
    }

    let command = cli.command.unwrap_or(Commands::Ui);

    // Commands that don't need the collections loaded.
    match command {
        Commands::Ui => {
            cmd_ui(&data_dir);
            return;
        }
        Commands::Completions { shell } => {
            cmd_completions(shell);
            return;
        }
        _ => {}
    }

    let mut store = TaskStore::load(&data_dir.join(TASKS_FILE));
    let mut archive = Archive::load(&data_dir.join(COMPLETED_FILE));

    // A session torn down mid-celebration may leave completed tasks in the
    // active file; fold them into the archive before doing anything else.
    if recover_interrupted(&mut store, &mut archive, Local::now()) {
        let _ = store.save(&data_dir.join(TASKS_FILE));
        let _ = archive.save(&data_dir.join(COMPLETED_FILE));
    }

    match command {
        Commands::Ui | Commands::Completions { .. } => unreachable!("handled above"),

        Commands::Add { title, desc, priority, due, time, progress } =>
            cmd_add(&mut store, &archive, &data_dir, title, desc, priority, due, time, progress),

        Commands::List { day, sort } => cmd_list(&store, day, sort),

        Commands::View { id } => cmd_view(&store, &archive, id),

        Commands::Update { id, title, desc, priority, due, time, progress, clear_due } =>
            cmd_update(&mut store, &data_dir, id, title, desc, priority, due, time, progress, clear_due),

        Commands::Complete { id } => cmd_complete(&mut store, &mut archive, &data_dir, id),

        Commands::Undo { id } => cmd_undo(&mut store, &data_dir, id),

        Commands::Delete { id } => cmd_delete(&mut store, &data_dir, id),

        Commands::Done { delete } => cmd_done(&mut archive, &data_dir, delete),

        Commands::Check { quiet } => cmd_check(&mut store, &data_dir, quiet),
    }
}
