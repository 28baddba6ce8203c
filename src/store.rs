//! Task store, completed-task archive, and utility functions.
//!
//! The `TaskStore` is the in-memory source of truth for active tasks; the
//! `Archive` holds completed snapshots. Each persists to its own JSON file
//! (a flat array of tasks) and is written in full on every mutation. Corrupt
//! or missing data never crashes anything: the store falls back to a small
//! seed list, the archive to empty.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate};

use crate::fields::Priority;
use crate::task::{Task, TaskDraft, TaskPatch};

/// File name for the active task collection.
pub const TASKS_FILE: &str = "tasks.json";
/// File name for the completed-task archive.
pub const COMPLETED_FILE: &str = "completed_tasks.json";

/// In-memory store for active tasks.
#[derive(Debug, Default)]
pub struct TaskStore {
    pub tasks: Vec<Task>,
}

/// Completed-task snapshots, newest first. Immutable except for deletion.
#[derive(Debug, Default)]
pub struct Archive {
    pub tasks: Vec<Task>,
}

impl TaskStore {
    /// Load the active collection, seeding a few example tasks when the file
    /// is missing or unreadable.
    pub fn load(path: &Path) -> Self {
        match load_task_vec(path) {
            Some(tasks) => TaskStore { tasks },
            None => TaskStore { tasks: seed_tasks() },
        }
    }

    /// Save the whole collection using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        save_task_vec(&self.tasks, path)
    }

    /// Generate the next task ID, unique across the store and the archive.
    /// An archived task keeps its id, so both collections are consulted.
    pub fn next_id(&self, archive: &Archive) -> u64 {
        self.tasks
            .iter()
            .chain(archive.tasks.iter())
            .map(|t| t.id)
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Get a task by ID.
    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Get a mutable reference to a task by ID.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Create a task from a draft. Rejects blank titles. The draft priority
    /// becomes both the displayed priority and the escalation baseline.
    pub fn create(&mut self, draft: TaskDraft, archive: &Archive) -> Result<u64, String> {
        if draft.title.trim().is_empty() {
            return Err("Task title cannot be empty".to_string());
        }
        let id = self.next_id(archive);
        self.tasks.push(Task {
            id,
            title: draft.title,
            description: draft.description,
            priority: draft.priority,
            original_priority: draft.priority,
            auto_escalated: false,
            due_date: draft.due_date,
            due_time: draft.due_time,
            progress: draft.progress.min(100),
            completed: false,
            completed_at: None,
        });
        Ok(id)
    }

    /// Apply a partial edit to an existing task.
    ///
    /// A priority in the patch is a human decision: it resets
    /// `original_priority` to the new value and clears `auto_escalated`,
    /// taking precedence over anything the escalation engine inferred.
    pub fn update(&mut self, id: u64, patch: TaskPatch) -> Result<(), String> {
        let task = self
            .get_mut(id)
            .ok_or_else(|| format!("Task {id} not found"))?;
        if let Some(title) = patch.title {
            if title.trim().is_empty() {
                return Err("Task title cannot be empty".to_string());
            }
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
            task.original_priority = priority;
            task.auto_escalated = false;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        if let Some(due_time) = patch.due_time {
            task.due_time = due_time;
        }
        if let Some(progress) = patch.progress {
            task.progress = progress.min(100);
        }
        Ok(())
    }

    /// Remove a task from the active collection. The archive is untouched.
    pub fn delete(&mut self, id: u64) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// Mark a task completed and return its snapshot for the completion
    /// workflow. The task stays in the store until the workflow removes it.
    pub fn set_completed(&mut self, id: u64) -> Option<Task> {
        let task = self.get_mut(id)?;
        task.completed = true;
        task.progress = 100;
        Some(task.clone())
    }

    /// Revert a still-active completed task back to open. Only valid while
    /// the task is in the store; the completion workflow refuses undo once
    /// a celebration run has started.
    pub fn set_uncompleted(&mut self, id: u64) -> bool {
        match self.get_mut(id) {
            Some(task) => {
                task.completed = false;
                task.progress = 0;
                true
            }
            None => false,
        }
    }
}

impl Archive {
    /// Load the archive, empty when the file is missing or unreadable.
    pub fn load(path: &Path) -> Self {
        Archive {
            tasks: load_task_vec(path).unwrap_or_default(),
        }
    }

    /// Save the whole archive using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        save_task_vec(&self.tasks, path)
    }

    /// Insert a completed snapshot at the front (newest first), stamping
    /// `completed_at`. Refuses duplicates by id: the completion workflow may
    /// converge on the same task from both the effect signal and the timeout
    /// fallback, and only the first insert wins.
    pub fn push_completed(&mut self, mut task: Task, now: DateTime<Local>) -> bool {
        if self.tasks.iter().any(|t| t.id == task.id) {
            return false;
        }
        task.completed = true;
        task.progress = 100;
        if task.completed_at.is_none() {
            task.completed_at = Some(now);
        }
        self.tasks.insert(0, task);
        true
    }

    /// Get an archived task by ID.
    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Remove an archived entry. The active store is untouched.
    pub fn delete(&mut self, id: u64) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }
}

fn load_task_vec(path: &Path) -> Option<Vec<Task>> {
    if !path.exists() {
        return None;
    }
    let mut buf = String::new();
    match File::open(path).and_then(|mut f| f.read_to_string(&mut buf)) {
        Ok(_) => match serde_json::from_str(&buf) {
            Ok(tasks) => Some(tasks),
            Err(e) => {
                eprintln!("Error parsing {}, starting fresh: {e}", path.display());
                None
            }
        },
        Err(e) => {
            eprintln!("Error reading {}, starting fresh: {e}", path.display());
            None
        }
    }
}

fn save_task_vec(tasks: &[Task], path: &Path) -> std::io::Result<()> {
    // Atomic-ish write via temp + rename.
    let tmp = path.with_extension("json.tmp");
    let mut f = File::create(&tmp)?;
    let data = serde_json::to_string_pretty(tasks)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    f.write_all(data.as_bytes())?;
    f.flush()?;
    fs::rename(tmp, path)?;
    Ok(())
}

/// Built-in example tasks used when no saved data exists.
pub fn seed_tasks() -> Vec<Task> {
    let seed = [
        (
            1,
            "Complete project proposal",
            "Draft and finalize the project proposal document",
            Priority::High,
        ),
        (
            2,
            "Schedule team meeting",
            "Coordinate with team members for weekly sync-up",
            Priority::Medium,
        ),
        (
            3,
            "Research market trends",
            "Analyze current industry trends and compile findings",
            Priority::Low,
        ),
    ];
    seed.iter()
        .map(|&(id, title, description, priority)| Task {
            id,
            title: title.to_string(),
            description: description.to_string(),
            priority,
            original_priority: priority,
            auto_escalated: false,
            due_date: None,
            due_time: None,
            progress: 0,
            completed: false,
            completed_at: None,
        })
        .collect()
}

/// Tasks visible for a given day tab. Pure function over the collection.
///
/// Offset 0 is the Today view: tasks with no due date, plus everything due
/// today or earlier (overdue tasks collapse into Today). A positive offset
/// shows only tasks due exactly on `today + offset` days; tasks without a
/// due date never appear outside Today. Comparison is at day granularity,
/// the due time is ignored.
pub fn visible_on_day(tasks: &[Task], selected_offset: u32, today: NaiveDate) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|t| match t.due_date {
            None => selected_offset == 0,
            Some(due) => {
                if selected_offset == 0 {
                    due <= today
                } else {
                    due == today + chrono::Duration::days(selected_offset as i64)
                }
            }
        })
        .collect()
}

/// Column ordering: earliest deadline first, tasks without a deadline last.
pub fn deadline_order(a: &Task, b: &Task) -> std::cmp::Ordering {
    match (a.deadline(), b.deadline()) {
        (None, None) => std::cmp::Ordering::Equal,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (Some(_), None) => std::cmp::Ordering::Less,
        (Some(da), Some(db)) => da.cmp(&db),
    }
}

/// Format a priority for display.
pub fn format_priority(p: Priority) -> &'static str {
    match p {
        Priority::High => "High",
        Priority::Medium => "Medium",
        Priority::Low => "Low",
    }
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let delta = d - today;
            if delta.num_days() == 0 {
                "today".into()
            } else if delta.num_days() == 1 {
                "tomorrow".into()
            } else if delta.num_days() > 1 {
                format!("in {}d", delta.num_days())
            } else {
                format!("{}d late", -delta.num_days())
            }
        }
    }
}

/// Print tasks in a formatted table.
pub fn print_table(tasks: &[&Task]) {
    println!(
        "{:<5} {:<8} {:<10} {:<6} {:<5} {}",
        "ID", "Pri", "Due", "Time", "Prog", "Title"
    );
    let today = Local::now().date_naive();
    for t in tasks {
        let due = format_due_relative(t.due_date, today);
        let time = t
            .due_time
            .map(|tm| tm.format("%H:%M").to_string())
            .unwrap_or_else(|| "-".into());
        let escalated = if t.auto_escalated { "*" } else { "" };
        println!(
            "{:<5} {:<8} {:<10} {:<6} {:>3}%  {}{}",
            t.id,
            format_priority(t.priority),
            due,
            time,
            t.progress,
            truncate(&t.title, 48),
            escalated
        );
    }
}

/// Parse human-readable due date input.
///
/// Supports:
/// - "today", "tomorrow"
/// - "in 3d", "in 2w"
/// - "YYYY-MM-DD" format
pub fn parse_due_input(s: &str) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();
    let today = Local::now().date_naive();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + chrono::Duration::days(1)),
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix('d') {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return Some(today + chrono::Duration::days(days));
            }
        }
        if let Some(nw) = rest.strip_suffix('w') {
            if let Ok(weeks) = nw.trim().parse::<i64>() {
                return Some(today + chrono::Duration::weeks(weeks));
            }
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Parse a due time in HH:MM form.
pub fn parse_time_input(s: &str) -> Option<chrono::NaiveTime> {
    chrono::NaiveTime::parse_from_str(s.trim(), "%H:%M").ok()
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn draft(title: &str, priority: Priority) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            description: String::new(),
            priority,
            due_date: None,
            due_time: None,
            progress: 0,
        }
    }

    #[test]
    fn create_rejects_blank_title() {
        let mut store = TaskStore::default();
        let archive = Archive::default();
        assert!(store.create(TaskDraft::new("   "), &archive).is_err());
        assert!(store.tasks.is_empty());
    }

    #[test]
    fn create_sets_baseline_and_defaults() {
        let mut store = TaskStore::default();
        let archive = Archive::default();
        let mut d = draft("Write report", Priority::Low);
        d.progress = 130;
        let id = store.create(d, &archive).unwrap();
        let task = store.get(id).unwrap();
        assert_eq!(task.original_priority, Priority::Low);
        assert!(!task.auto_escalated);
        assert!(!task.completed);
        assert_eq!(task.progress, 100);
    }

    #[test]
    fn ids_are_unique_across_store_and_archive() {
        let mut store = TaskStore::default();
        let mut archive = Archive::default();
        let id = store.create(draft("a", Priority::Medium), &archive).unwrap();
        let snapshot = store.set_completed(id).unwrap();
        archive.push_completed(snapshot, Local::now());
        store.delete(id);

        let next = store.create(draft("b", Priority::Medium), &archive).unwrap();
        assert!(next > id);
    }

    #[test]
    fn manual_priority_edit_resets_baseline() {
        let mut store = TaskStore::default();
        let archive = Archive::default();
        let id = store.create(draft("a", Priority::Medium), &archive).unwrap();
        // Simulate a prior engine escalation.
        {
            let task = store.get_mut(id).unwrap();
            task.priority = Priority::High;
            task.auto_escalated = true;
        }
        store
            .update(
                id,
                TaskPatch {
                    priority: Some(Priority::Low),
                    ..TaskPatch::default()
                },
            )
            .unwrap();
        let task = store.get(id).unwrap();
        assert_eq!(task.priority, Priority::Low);
        assert_eq!(task.original_priority, Priority::Low);
        assert!(!task.auto_escalated);
    }

    #[test]
    fn non_priority_update_preserves_escalation_state() {
        let mut store = TaskStore::default();
        let archive = Archive::default();
        let id = store.create(draft("a", Priority::Low), &archive).unwrap();
        {
            let task = store.get_mut(id).unwrap();
            task.priority = Priority::High;
            task.auto_escalated = true;
        }
        store
            .update(
                id,
                TaskPatch {
                    progress: Some(40),
                    ..TaskPatch::default()
                },
            )
            .unwrap();
        let task = store.get(id).unwrap();
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.original_priority, Priority::Low);
        assert!(task.auto_escalated);
    }

    #[test]
    fn deletion_independence() {
        let mut store = TaskStore::default();
        let mut archive = Archive::default();
        let keep = store.create(draft("keep", Priority::Low), &archive).unwrap();
        let gone = store.create(draft("gone", Priority::Low), &archive).unwrap();
        let snapshot = store.set_completed(keep).unwrap();
        archive.push_completed(snapshot, Local::now());
        store.delete(keep);

        assert!(store.delete(gone));
        assert!(archive.get(keep).is_some());

        assert!(archive.delete(keep));
        assert_eq!(store.tasks.len(), 0);
        assert_eq!(archive.tasks.len(), 0);
    }

    #[test]
    fn archive_refuses_duplicate_ids() {
        let mut archive = Archive::default();
        let task = seed_tasks().remove(0);
        let now = Local::now();
        assert!(archive.push_completed(task.clone(), now));
        assert!(!archive.push_completed(task, now));
        assert_eq!(archive.tasks.len(), 1);
    }

    #[test]
    fn load_falls_back_to_seeds_on_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TASKS_FILE);
        fs::write(&path, "not json {{").unwrap();
        let store = TaskStore::load(&path);
        assert_eq!(store.tasks.len(), 3);
        assert_eq!(store.tasks[0].title, "Complete project proposal");

        let archive_path = dir.path().join(COMPLETED_FILE);
        fs::write(&archive_path, "[1, 2").unwrap();
        let archive = Archive::load(&archive_path);
        assert!(archive.tasks.is_empty());
    }

    #[test]
    fn save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TASKS_FILE);
        let mut store = TaskStore::default();
        let archive = Archive::default();
        let mut d = draft("persisted", Priority::High);
        d.due_date = NaiveDate::from_ymd_opt(2026, 9, 1);
        store.create(d, &archive).unwrap();
        store.save(&path).unwrap();

        let reloaded = TaskStore::load(&path);
        assert_eq!(reloaded.tasks, store.tasks);
    }

    #[test]
    fn today_view_includes_overdue_and_undated() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let mut tasks = seed_tasks();
        tasks[0].due_date = Some(today - Duration::days(1)); // yesterday
        tasks[1].due_date = Some(today + Duration::days(1)); // tomorrow
        // tasks[2] has no due date

        let visible = visible_on_day(&tasks, 0, today);
        let ids: Vec<u64> = visible.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn future_day_matches_exact_date_only() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let mut tasks = seed_tasks();
        tasks[0].due_date = Some(today + Duration::days(2));
        tasks[1].due_date = Some(today + Duration::days(3));

        let visible = visible_on_day(&tasks, 2, today);
        let ids: Vec<u64> = visible.iter().map(|t| t.id).collect();
        // The undated task 3 must not leak into a future tab.
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn deadline_order_puts_undated_last() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let mut tasks = seed_tasks();
        tasks[0].due_date = Some(today + Duration::days(5));
        tasks[1].due_date = Some(today + Duration::days(1));

        let mut refs: Vec<&Task> = tasks.iter().collect();
        refs.sort_by(|a, b| deadline_order(a, b));
        let ids: Vec<u64> = refs.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }
}
