//! Task form handling for the terminal user interface.
//!
//! This module provides the `TaskForm` structure for creating and editing
//! tasks in the TUI, including field ordering and form state management.
//! Saving an edited priority goes through the store's manual-override path,
//! so the form never has to know about escalation state.

use crate::fields::Priority;
use crate::store::{parse_due_input, parse_time_input};
use crate::task::{Task, TaskDraft, TaskPatch};
use crate::tui::input::InputField;

/// Global order constants for form fields.
pub const TITLE_ORDER: usize = 0;
pub const DESCRIPTION_ORDER: usize = 1;
pub const PRIORITY_ORDER: usize = 2;
pub const DUE_DATE_ORDER: usize = 3;
pub const DUE_TIME_ORDER: usize = 4;
pub const PROGRESS_ORDER: usize = 5;

const PROGRESS_STEP: u8 = 5;

/// Form state for adding or editing a task.
pub struct TaskForm {
    pub title: InputField,
    pub description: InputField,
    pub due_date: InputField,
    pub due_time: InputField,
    pub priority: usize,
    pub progress: u8,
    pub current_field: usize,
    pub priorities: Vec<Priority>,
    // Priority the edited task was loaded with. An edit patch carries a
    // priority only when the selector moved off this value; anything else
    // would count as a manual override and reset the escalation baseline.
    loaded_priority: Option<Priority>,
}

impl TaskForm {
    /// Create a new empty form. Priority defaults to Medium, matching the
    /// board's default lane for new tasks.
    pub fn new() -> Self {
        let mut form = Self {
            title: InputField::new(),
            description: InputField::new(),
            due_date: InputField::new(),
            due_time: InputField::new(),
            priority: 1, // Medium
            progress: 0,
            current_field: TITLE_ORDER,
            priorities: Priority::ALL.to_vec(),
            loaded_priority: None,
        };
        form.update_active_field();
        form
    }

    /// Create a form populated from an existing task.
    pub fn from_task(task: &Task) -> Self {
        let mut form = Self::new();
        form.title = InputField::with_value(&task.title);
        form.description = InputField::with_value(&task.description);
        form.due_date = InputField::with_value(
            &task.due_date.map(|d| d.to_string()).unwrap_or_default(),
        );
        form.due_time = InputField::with_value(
            &task
                .due_time
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_default(),
        );
        form.priority = form
            .priorities
            .iter()
            .position(|&p| p == task.priority)
            .unwrap_or(1);
        form.loaded_priority = Some(task.priority);
        form.progress = task.progress;
        form.update_active_field();
        form
    }

    /// Total number of fields (text fields + selectors).
    pub fn field_count(&self) -> usize {
        6
    }

    /// Move to the next field in the form.
    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % self.field_count();
        self.update_active_field();
    }

    /// Move to the previous field in the form.
    pub fn prev_field(&mut self) {
        self.current_field = if self.current_field == 0 {
            self.field_count() - 1
        } else {
            self.current_field - 1
        };
        self.update_active_field();
    }

    /// Update which field is currently active for editing.
    pub fn update_active_field(&mut self) {
        self.title.active = self.current_field == TITLE_ORDER;
        self.description.active = self.current_field == DESCRIPTION_ORDER;
        self.due_date.active = self.current_field == DUE_DATE_ORDER;
        self.due_time.active = self.current_field == DUE_TIME_ORDER;
    }

    /// Handle character input for the currently active field.
    pub fn handle_char(&mut self, c: char) {
        match self.current_field {
            TITLE_ORDER => self.title.handle_char(c),
            DESCRIPTION_ORDER => self.description.handle_char(c),
            DUE_DATE_ORDER => self.due_date.handle_char(c),
            DUE_TIME_ORDER => self.due_time.handle_char(c),
            _ => {}
        }
    }

    /// Handle backspace input for the currently active field.
    pub fn handle_backspace(&mut self) {
        match self.current_field {
            TITLE_ORDER => self.title.handle_backspace(),
            DESCRIPTION_ORDER => self.description.handle_backspace(),
            DUE_DATE_ORDER => self.due_date.handle_backspace(),
            DUE_TIME_ORDER => self.due_time.handle_backspace(),
            _ => {}
        }
    }

    /// Handle forward delete for the currently active field.
    pub fn handle_delete(&mut self) {
        match self.current_field {
            TITLE_ORDER => self.title.handle_delete(),
            DESCRIPTION_ORDER => self.description.handle_delete(),
            DUE_DATE_ORDER => self.due_date.handle_delete(),
            DUE_TIME_ORDER => self.due_time.handle_delete(),
            _ => {}
        }
    }

    /// Clear the currently active text field.
    pub fn clear_active(&mut self) {
        match self.current_field {
            TITLE_ORDER => self.title.clear(),
            DESCRIPTION_ORDER => self.description.clear(),
            DUE_DATE_ORDER => self.due_date.clear(),
            DUE_TIME_ORDER => self.due_time.clear(),
            _ => {}
        }
    }

    /// Handle left/right arrow keys: cursor movement in text fields,
    /// cycling for the priority selector, stepping for progress.
    pub fn handle_left_right(&mut self, right: bool) {
        match self.current_field {
            TITLE_ORDER => cursor_move(&mut self.title, right),
            DESCRIPTION_ORDER => cursor_move(&mut self.description, right),
            DUE_DATE_ORDER => cursor_move(&mut self.due_date, right),
            DUE_TIME_ORDER => cursor_move(&mut self.due_time, right),
            PRIORITY_ORDER => {
                if right {
                    self.priority = (self.priority + 1) % self.priorities.len();
                } else {
                    self.priority = if self.priority == 0 {
                        self.priorities.len() - 1
                    } else {
                        self.priority - 1
                    };
                }
            }
            PROGRESS_ORDER => {
                if right {
                    self.progress = (self.progress + PROGRESS_STEP).min(100);
                } else {
                    self.progress = self.progress.saturating_sub(PROGRESS_STEP);
                }
            }
            _ => {}
        }
    }

    /// Currently selected priority.
    pub fn selected_priority(&self) -> Priority {
        self.priorities[self.priority]
    }

    /// Build a creation draft from the form. Fails on a blank title or an
    /// unparseable date/time, with a message for the status line.
    pub fn to_draft(&self) -> Result<TaskDraft, String> {
        let (due_date, due_time) = self.parse_deadline()?;
        if self.title.value.trim().is_empty() {
            return Err("Task title cannot be empty".to_string());
        }
        Ok(TaskDraft {
            title: self.title.value.clone(),
            description: self.description.value.clone(),
            priority: self.selected_priority(),
            due_date,
            due_time,
            progress: self.progress,
        })
    }

    /// Build an update patch from the form. Priority is included only when
    /// the selector moved off the loaded value: that is the human decision
    /// that resets the escalation baseline, and a save that never touched
    /// priority must not trigger it.
    pub fn to_patch(&self) -> Result<TaskPatch, String> {
        let (due_date, due_time) = self.parse_deadline()?;
        let selected = self.selected_priority();
        let priority = match self.loaded_priority {
            Some(loaded) if loaded == selected => None,
            _ => Some(selected),
        };
        Ok(TaskPatch {
            title: Some(self.title.value.clone()),
            description: Some(self.description.value.clone()),
            priority,
            due_date: Some(due_date),
            due_time: Some(due_time),
            progress: Some(self.progress),
        })
    }

    fn parse_deadline(
        &self,
    ) -> Result<(Option<chrono::NaiveDate>, Option<chrono::NaiveTime>), String> {
        let due_date = if self.due_date.value.trim().is_empty() {
            None
        } else {
            Some(
                parse_due_input(&self.due_date.value)
                    .ok_or_else(|| format!("Could not parse due date '{}'", self.due_date.value))?,
            )
        };
        let due_time = if self.due_time.value.trim().is_empty() {
            None
        } else {
            Some(
                parse_time_input(&self.due_time.value)
                    .ok_or_else(|| format!("Could not parse due time '{}'", self.due_time.value))?,
            )
        };
        Ok((due_date, due_time))
    }
}

impl Default for TaskForm {
    fn default() -> Self {
        Self::new()
    }
}

fn cursor_move(field: &mut InputField, right: bool) {
    if right {
        field.move_cursor_right()
    } else {
        field.move_cursor_left()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Archive, TaskStore};
    use pretty_assertions::assert_eq;

    // Medium-baseline task already escalated to High by the engine.
    fn escalated_task(store: &mut TaskStore) -> u64 {
        let archive = Archive::default();
        let id = store
            .create(TaskDraft::new("Quarterly report"), &archive)
            .unwrap();
        let task = store.get_mut(id).unwrap();
        task.priority = Priority::High;
        task.auto_escalated = true;
        id
    }

    #[test]
    fn description_only_edit_keeps_escalation_baseline() {
        let mut store = TaskStore::default();
        let id = escalated_task(&mut store);

        let mut form = TaskForm::from_task(store.get(id).unwrap());
        form.description = InputField::with_value("Now with the Q3 numbers");
        let patch = form.to_patch().unwrap();
        assert_eq!(patch.priority, None);

        store.update(id, patch).unwrap();
        let task = store.get(id).unwrap();
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.original_priority, Priority::Medium);
        assert!(task.auto_escalated);
        assert_eq!(task.description, "Now with the Q3 numbers");
    }

    #[test]
    fn moving_the_priority_selector_resets_baseline() {
        let mut store = TaskStore::default();
        let id = escalated_task(&mut store);

        let mut form = TaskForm::from_task(store.get(id).unwrap());
        form.current_field = PRIORITY_ORDER;
        form.handle_left_right(true); // High -> Medium
        let patch = form.to_patch().unwrap();
        assert_eq!(patch.priority, Some(Priority::Medium));

        store.update(id, patch).unwrap();
        let task = store.get(id).unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.original_priority, Priority::Medium);
        assert!(!task.auto_escalated);
    }

    #[test]
    fn cycling_back_to_the_loaded_priority_is_not_an_edit() {
        let mut store = TaskStore::default();
        let id = escalated_task(&mut store);

        let mut form = TaskForm::from_task(store.get(id).unwrap());
        form.current_field = PRIORITY_ORDER;
        form.handle_left_right(true);
        form.handle_left_right(false);
        let patch = form.to_patch().unwrap();
        assert_eq!(patch.priority, None);
    }
}
