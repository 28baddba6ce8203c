//! Command implementations for the CLI interface.
//!
//! This module contains all the command handlers that implement the various
//! subcommands available in the CLI, from basic CRUD operations to the
//! one-shot escalation check and the TUI interface.

use clap::Subcommand;
use clap_complete::{generate, Shell};

use std::path::Path;

use chrono::Local;

use crate::complete::CompletionWorkflow;
use crate::escalate::{run_tick, EscalationConfig};
use crate::fields::{Priority, SortKey};
use crate::notify::{NotificationSink, SilentSink, StderrSink};
use crate::store::*;
use crate::task::{TaskDraft, TaskPatch};
use crate::tui::run::run_tui;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive board interface.
    Ui,

    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Priority lane: high | medium | low.
        #[arg(long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", or "in Nd".
        #[arg(long)]
        due: Option<String>,
        /// Due time in HH:MM (defaults to 23:59 when a date is set).
        #[arg(long)]
        time: Option<String>,
        /// Initial progress percentage (0-100).
        #[arg(long, default_value_t = 0)]
        progress: u8,
    },

    /// List tasks for a day tab.
    List {
        /// Day offset: 0 = today (plus overdue and undated), 1 = tomorrow, ...
        #[arg(long, default_value_t = 0)]
        day: u32,
        /// Sort key.
        #[arg(long, value_enum, default_value_t = SortKey::Due)]
        sort: SortKey,
    },

    /// View a single task by ID.
    View {
        /// Task ID to view.
        id: u64,
    },

    /// Update fields on a task. Setting --priority is a manual override:
    /// it resets the escalation baseline.
    Update {
        /// Task ID to update.
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", or "in Nd".
        #[arg(long)]
        due: Option<String>,
        /// Due time in HH:MM.
        #[arg(long)]
        time: Option<String>,
        /// Progress percentage (0-100).
        #[arg(long)]
        progress: Option<u8>,
        /// Clear the due date and time.
        #[arg(long)]
        clear_due: bool,
    },

    /// Complete a task: archive it and remove it from the board.
    Complete {
        /// Task ID to complete.
        id: u64,
    },

    /// Revert a task that was marked completed but not yet archived.
    Undo {
        /// Task ID to reopen.
        id: u64,
    },

    /// Delete an active task. The archive is not touched.
    Delete {
        /// Task ID to delete.
        id: u64,
    },

    /// List completed tasks, or delete one from the archive.
    Done {
        /// Delete this entry from the archive instead of listing.
        #[arg(long)]
        delete: Option<u64>,
    },

    /// Run one escalation tick now and report any priority changes.
    Check {
        /// Suppress per-task alerts; only print the summary line.
        #[arg(long)]
        quiet: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Launch the terminal user interface.
pub fn cmd_ui(data_dir: &Path) {
    if let Err(e) = run_tui(data_dir) {
        eprintln!("UI error: {e}");
        std::process::exit(1);
    }
}

/// Add a new task to the board.
pub fn cmd_add(
    store: &mut TaskStore,
    archive: &Archive,
    data_dir: &Path,
    title: String,
    desc: Option<String>,
    priority: Priority,
    due: Option<String>,
    time: Option<String>,
    progress: u8,
) {
    let due_date = match due {
        Some(ref s) => match parse_due_input(s) {
            Some(d) => Some(d),
            None => {
                eprintln!("Could not parse due date '{s}'");
                std::process::exit(1);
            }
        },
        None => None,
    };
    let due_time = match time {
        Some(ref s) => match parse_time_input(s) {
            Some(t) => Some(t),
            None => {
                eprintln!("Could not parse due time '{s}' (expected HH:MM)");
                std::process::exit(1);
            }
        },
        None => None,
    };

    let draft = TaskDraft {
        title,
        description: desc.unwrap_or_default(),
        priority,
        due_date,
        due_time,
        progress,
    };
    match store.create(draft, archive) {
        Ok(id) => {
            save_store(store, data_dir);
            println!("Added task #{id}");
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

/// List tasks visible on a day tab.
pub fn cmd_list(store: &TaskStore, day: u32, sort: SortKey) {
    let today = Local::now().date_naive();
    let mut tasks = visible_on_day(&store.tasks, day, today);
    match sort {
        SortKey::Due => tasks.sort_by(|a, b| deadline_order(a, b)),
        SortKey::Priority => tasks.sort_by_key(|t| {
            Priority::ALL.iter().position(|&p| p == t.priority).unwrap_or(usize::MAX)
        }),
        SortKey::Id => tasks.sort_by_key(|t| t.id),
    }
    if tasks.is_empty() {
        let label = if day == 0 { "today".to_string() } else { format!("+{day}d") };
        println!("No tasks for {label}.");
        return;
    }
    print_table(&tasks);
}

/// View a single task in detail.
pub fn cmd_view(store: &TaskStore, archive: &Archive, id: u64) {
    let today = Local::now().date_naive();
    let task = match store.get(id).or_else(|| archive.get(id)) {
        Some(t) => t,
        None => {
            eprintln!("Task {id} not found");
            std::process::exit(1);
        }
    };
    println!("Task #{}: {}", task.id, task.title);
    println!("Priority:  {}", format_priority(task.priority));
    println!("Baseline:  {}", format_priority(task.original_priority));
    println!("Escalated: {}", if task.auto_escalated { "yes" } else { "no" });
    println!("Due:       {}", format_due_relative(task.due_date, today));
    if let Some(t) = task.due_time {
        println!("Due time:  {}", t.format("%H:%M"));
    }
    println!("Progress:  {}%", task.progress);
    if let Some(at) = task.completed_at {
        println!("Completed: {}", at.format("%Y-%m-%d %H:%M"));
    }
    if !task.description.is_empty() {
        println!("\n{}", task.description);
    }
}

/// Update fields on a task.
pub fn cmd_update(
    store: &mut TaskStore,
    data_dir: &Path,
    id: u64,
    title: Option<String>,
    desc: Option<String>,
    priority: Option<Priority>,
    due: Option<String>,
    time: Option<String>,
    progress: Option<u8>,
    clear_due: bool,
) {
    let due_date = if clear_due {
        Some(None)
    } else {
        match due {
            Some(ref s) => match parse_due_input(s) {
                Some(d) => Some(Some(d)),
                None => {
                    eprintln!("Could not parse due date '{s}'");
                    std::process::exit(1);
                }
            },
            None => None,
        }
    };
    let due_time = if clear_due {
        Some(None)
    } else {
        match time {
            Some(ref s) => match parse_time_input(s) {
                Some(t) => Some(Some(t)),
                None => {
                    eprintln!("Could not parse due time '{s}' (expected HH:MM)");
                    std::process::exit(1);
                }
            },
            None => None,
        }
    };

    let patch = TaskPatch {
        title,
        description: desc,
        priority,
        due_date,
        due_time,
        progress,
    };
    match store.update(id, patch) {
        Ok(()) => {
            save_store(store, data_dir);
            println!("Updated task #{id}");
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

/// Complete a task. The CLI has nothing to animate, so the workflow settles
/// immediately: one archive entry, task gone from the board.
pub fn cmd_complete(store: &mut TaskStore, archive: &mut Archive, data_dir: &Path, id: u64) {
    let mut workflow = CompletionWorkflow::new();
    let now = Local::now();
    if !workflow.begin(store, archive, id, now) {
        eprintln!("Task {id} not found or already completed");
        std::process::exit(1);
    }
    workflow.force_settle(store, archive, now);
    save_store(store, data_dir);
    save_archive(archive, data_dir);
    println!("Completed task #{id}");
}

/// Reopen a task that is still on the board.
pub fn cmd_undo(store: &mut TaskStore, data_dir: &Path, id: u64) {
    let workflow = CompletionWorkflow::new();
    if workflow.undo(store, id) {
        save_store(store, data_dir);
        println!("Reopened task #{id}");
    } else {
        eprintln!("Task {id} is not on the board (archived tasks cannot be reopened)");
        std::process::exit(1);
    }
}

/// Delete an active task.
pub fn cmd_delete(store: &mut TaskStore, data_dir: &Path, id: u64) {
    if store.delete(id) {
        save_store(store, data_dir);
        println!("Deleted task #{id}");
    } else {
        eprintln!("Task {id} not found");
        std::process::exit(1);
    }
}

/// List the archive, or delete one entry from it.
pub fn cmd_done(archive: &mut Archive, data_dir: &Path, delete: Option<u64>) {
    if let Some(id) = delete {
        if archive.delete(id) {
            save_archive(archive, data_dir);
            println!("Removed #{id} from completed tasks");
        } else {
            eprintln!("Completed task {id} not found");
            std::process::exit(1);
        }
        return;
    }
    if archive.tasks.is_empty() {
        println!("No completed tasks yet.");
        return;
    }
    println!("{:<5} {:<17} {:<8} {}", "ID", "Completed", "Pri", "Title");
    for t in &archive.tasks {
        let when = t
            .completed_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<5} {:<17} {:<8} {}",
            t.id,
            when,
            format_priority(t.priority),
            t.title
        );
    }
}

/// Run one escalation tick, reporting transitions on stderr.
pub fn cmd_check(store: &mut TaskStore, data_dir: &Path, quiet: bool) {
    let mut sink: Box<dyn NotificationSink> = if quiet {
        Box::new(SilentSink)
    } else {
        Box::new(StderrSink)
    };
    let changed = run_tick(
        &mut store.tasks,
        Local::now(),
        &EscalationConfig::default(),
        sink.as_mut(),
    );
    if changed {
        save_store(store, data_dir);
        println!("Priorities updated.");
    } else {
        println!("No priority changes.");
    }
}

/// Generate shell completion scripts for the given shell.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    let mut cmd = crate::cli::Cli::command();
    generate(shell, &mut cmd, "tb", &mut std::io::stdout());
}

fn save_store(store: &TaskStore, data_dir: &Path) {
    if let Err(e) = store.save(&data_dir.join(TASKS_FILE)) {
        eprintln!("Failed to save tasks: {e}");
        std::process::exit(1);
    }
}

fn save_archive(archive: &Archive, data_dir: &Path) {
    if let Err(e) = archive.save(&data_dir.join(COMPLETED_FILE)) {
        eprintln!("Failed to save completed tasks: {e}");
        std::process::exit(1);
    }
}
