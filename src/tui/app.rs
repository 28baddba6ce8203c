//! Priority board interface.
//!
//! This module implements the board view where tasks are organized into
//! High / Medium / Low columns for the selected day tab. The event loop also
//! drives the two time-based subsystems: the escalation timer (periodic
//! priority recomputation with status-line notifications) and the completion
//! workflow (celebration and fly-to-achievements stages with timeout
//! fallbacks).

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Datelike, Duration, Local};
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::complete::{recover_interrupted, CompletionWorkflow};
use crate::escalate::{run_tick, EscalationConfig, EscalationTimer};
use crate::fields::Priority;
use crate::notify::BufferSink;
use crate::store::{
    deadline_order, format_due_relative, format_priority, visible_on_day, Archive, TaskStore,
    COMPLETED_FILE, TASKS_FILE,
};
use crate::task::{Task, TaskPatch};
use crate::tui::{
    colors::priority_color,
    enums::{AppState, InputMode},
    input::InputField,
    task_form::{
        TaskForm, DESCRIPTION_ORDER, DUE_DATE_ORDER, DUE_TIME_ORDER, PRIORITY_ORDER,
        PROGRESS_ORDER, TITLE_ORDER,
    },
    utils::centered_rect,
};

/// Number of day tabs: Today plus the next six days.
const DAY_TABS: u32 = 7;

/// Messages shown in the celebration overlay. Picked by task id so the
/// choice is stable across redraws.
const APPRECIATION_MESSAGES: [&str; 10] = [
    "Great job! Task completed!",
    "Achievement unlocked!",
    "Well done! One less thing to worry about!",
    "Awesome work! Keep it up!",
    "That's the spirit! Progress feels good!",
    "Another one bites the dust!",
    "You're on fire today!",
    "Success tastes sweet!",
    "Productivity level: Hero!",
    "Mission accomplished!",
];

/// Main board application state.
pub struct App {
    store: TaskStore,
    archive: Archive,
    data_dir: PathBuf,
    state: AppState,
    input_mode: InputMode,

    workflow: CompletionWorkflow,
    timer: EscalationTimer,
    escalation: EscalationConfig,
    sink: BufferSink,

    // Task ids per priority column for the selected day.
    columns: [Vec<u64>; 3],
    selected_column: usize,
    selected_card: usize,
    column_scroll_offsets: [usize; 3],
    day_offset: u32,

    task_form: TaskForm,
    editing_task: Option<u64>,
    confirm_delete: Option<u64>,
    achievements_selected: usize,
    status_message: String,
    should_quit: bool,
}

impl App {
    /// Create a new App instance, loading both collections from the data
    /// directory and arming the escalation timer (first tick fires on the
    /// first pass through the event loop).
    pub fn new(data_dir: &Path) -> io::Result<Self> {
        let mut store = TaskStore::load(&data_dir.join(TASKS_FILE));
        let mut archive = Archive::load(&data_dir.join(COMPLETED_FILE));
        let now = Local::now();
        if recover_interrupted(&mut store, &mut archive, now) {
            let _ = store.save(&data_dir.join(TASKS_FILE));
            let _ = archive.save(&data_dir.join(COMPLETED_FILE));
        }

        let mut timer = EscalationTimer::new();
        timer.start(now);

        let mut app = App {
            store,
            archive,
            data_dir: data_dir.to_path_buf(),
            state: AppState::Board,
            input_mode: InputMode::None,
            workflow: CompletionWorkflow::new(),
            timer,
            escalation: EscalationConfig::default(),
            sink: BufferSink::default(),
            columns: Default::default(),
            selected_column: 0,
            selected_card: 0,
            column_scroll_offsets: [0; 3],
            day_offset: 0,
            task_form: TaskForm::new(),
            editing_task: None,
            confirm_delete: None,
            achievements_selected: 0,
            status_message: String::new(),
            should_quit: false,
        };
        app.update_columns();
        Ok(app)
    }

    /// Main event loop. Drives rendering, input, the escalation timer, and
    /// the completion workflow until quit, then cancels both time-based
    /// subsystems so nothing fires against a torn-down UI.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;
            self.handle_input()?;
            self.on_tick(Local::now());
            if self.should_quit {
                break;
            }
        }
        self.timer.stop();
        self.workflow.abort_all();
        Ok(())
    }

    /// Advance the time-based subsystems. Persistence happens only when a
    /// collection actually changed.
    fn on_tick(&mut self, now: DateTime<Local>) {
        if self.timer.due(now) {
            let changed = run_tick(&mut self.store.tasks, now, &self.escalation, &mut self.sink);
            if changed {
                self.save_store();
                self.update_columns();
            }
            for (title, body) in self.sink.drain() {
                self.set_status_message(format!("{title} {body}"));
            }
        }

        if self.workflow.has_pending() && self.workflow.drive(&mut self.store, &mut self.archive, now) {
            self.save_store();
            self.save_archive();
            self.update_columns();
        }
    }

    /// Rebuild the per-priority columns for the selected day tab. Within a
    /// column, earliest deadline first, undated tasks last.
    fn update_columns(&mut self) {
        let today = Local::now().date_naive();
        let mut visible = visible_on_day(&self.store.tasks, self.day_offset, today);
        visible.sort_by(|a, b| deadline_order(a, b));

        for (i, &priority) in Priority::ALL.iter().enumerate() {
            self.columns[i] = visible
                .iter()
                .filter(|t| t.priority == priority)
                .map(|t| t.id)
                .collect();
        }
        self.clamp_selection();
    }

    /// Ensure selected column and card indices are valid.
    fn clamp_selection(&mut self) {
        if self.selected_column >= self.columns.len() {
            self.selected_column = 0;
        }
        let column_len = self.columns[self.selected_column].len();
        if column_len == 0 {
            self.selected_card = 0;
            self.column_scroll_offsets[self.selected_column] = 0;
        } else if self.selected_card >= column_len {
            self.selected_card = column_len - 1;
        }
    }

    fn selected_task_id(&self) -> Option<u64> {
        self.columns[self.selected_column]
            .get(self.selected_card)
            .copied()
    }

    fn set_status_message(&mut self, msg: String) {
        self.status_message = msg;
    }

    fn save_store(&mut self) {
        if let Err(e) = self.store.save(&self.data_dir.join(TASKS_FILE)) {
            self.set_status_message(format!("Error saving tasks: {e}"));
        }
    }

    fn save_archive(&mut self) {
        if let Err(e) = self.archive.save(&self.data_dir.join(COMPLETED_FILE)) {
            self.set_status_message(format!("Error saving completed tasks: {e}"));
        }
    }

    /// Handle keyboard input for the current state.
    fn handle_input(&mut self) -> io::Result<()> {
        if !event::poll(StdDuration::from_millis(50))? {
            return Ok(());
        }
        let Event::Key(key) = event::read()? else {
            return Ok(());
        };

        // Any key skips a running celebration.
        if let Some(task) = self.workflow.celebrating_task() {
            let id = task.id;
            self.workflow.effect_finished(id);
            return Ok(());
        }

        match self.state {
            AppState::Board => self.handle_board_key(key.code, key.modifiers),
            AppState::TaskDetail => match key.code {
                KeyCode::Enter | KeyCode::Esc => self.state = AppState::Board,
                _ => {}
            },
            AppState::AddTask | AppState::EditTask if self.input_mode == InputMode::Text => {
                self.handle_form_key(key.code, key.modifiers)
            }
            AppState::AddTask | AppState::EditTask => {}
            AppState::Achievements => self.handle_achievements_key(key.code),
            AppState::ConfirmDelete => self.handle_confirm_key(key.code),
        }
        Ok(())
    }

    fn handle_board_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        self.status_message.clear();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }

            // Reprioritize: move the selected card one lane left/right. This
            // is a human decision, routed through the manual-override path.
            KeyCode::Left if modifiers.contains(KeyModifiers::CONTROL) => self.move_card(false),
            KeyCode::Right if modifiers.contains(KeyModifiers::CONTROL) => self.move_card(true),

            // Column and card navigation.
            KeyCode::Left => {
                if self.selected_column > 0 {
                    self.selected_column -= 1;
                    self.clamp_selection();
                }
            }
            KeyCode::Right => {
                if self.selected_column < self.columns.len() - 1 {
                    self.selected_column += 1;
                    self.clamp_selection();
                }
            }
            KeyCode::Up => {
                if self.selected_card > 0 {
                    self.selected_card -= 1;
                }
            }
            KeyCode::Down => {
                let column_len = self.columns[self.selected_column].len();
                if column_len > 0 && self.selected_card < column_len - 1 {
                    self.selected_card += 1;
                }
            }

            // Day tabs.
            KeyCode::Tab => {
                self.day_offset = (self.day_offset + 1) % DAY_TABS;
                self.update_columns();
            }
            KeyCode::BackTab => {
                self.day_offset = if self.day_offset == 0 {
                    DAY_TABS - 1
                } else {
                    self.day_offset - 1
                };
                self.update_columns();
            }

            KeyCode::Enter => {
                if self.selected_task_id().is_some() {
                    self.state = AppState::TaskDetail;
                }
            }

            KeyCode::Char('a') => {
                self.task_form = TaskForm::new();
                // New tasks default to the day being viewed.
                if self.day_offset > 0 {
                    let date =
                        Local::now().date_naive() + Duration::days(self.day_offset as i64);
                    self.task_form.due_date = InputField::with_value(&date.to_string());
                }
                self.editing_task = None;
                self.state = AppState::AddTask;
                self.input_mode = InputMode::Text;
            }
            KeyCode::Char('e') => {
                if let Some(id) = self.selected_task_id() {
                    if let Some(task) = self.store.get(id) {
                        self.task_form = TaskForm::from_task(task);
                        self.editing_task = Some(id);
                        self.state = AppState::EditTask;
                        self.input_mode = InputMode::Text;
                    }
                }
            }

            KeyCode::Char('c') => self.complete_selected(),
            KeyCode::Char('u') => self.undo_selected(),
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_task_id() {
                    self.confirm_delete = Some(id);
                    self.state = AppState::ConfirmDelete;
                }
            }

            // Progress nudges without opening the form.
            KeyCode::Char('+') | KeyCode::Char('=') => self.adjust_progress(5),
            KeyCode::Char('-') => self.adjust_progress(-5),

            KeyCode::Char('v') => {
                self.achievements_selected = 0;
                self.state = AppState::Achievements;
            }
            KeyCode::Char('h') => {
                self.set_status_message(
                    "Help: Enter: Details | a: Add | e: Edit | c: Complete | u: Undo | d: Delete | Ctrl+←/→: Move lane | Tab: Day | +/-: Progress | v: Achievements | q: Quit"
                        .to_string(),
                );
            }
            _ => {}
        }
    }

    fn handle_form_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        match code {
            KeyCode::Esc => {
                self.state = AppState::Board;
                self.input_mode = InputMode::None;
            }
            KeyCode::Tab | KeyCode::Down => self.task_form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.task_form.prev_field(),
            KeyCode::Left => self.task_form.handle_left_right(false),
            KeyCode::Right => self.task_form.handle_left_right(true),
            KeyCode::Backspace => self.task_form.handle_backspace(),
            KeyCode::Delete => self.task_form.handle_delete(),
            KeyCode::Enter => self.submit_form(),
            KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.task_form.clear_active()
            }
            KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
                self.task_form.handle_char(c)
            }
            _ => {}
        }
    }

    fn submit_form(&mut self) {
        let result = match self.editing_task {
            None => self.task_form.to_draft().and_then(|draft| {
                self.store
                    .create(draft, &self.archive)
                    .map(|id| format!("Added task #{id}"))
            }),
            Some(id) => self.task_form.to_patch().and_then(|patch| {
                self.store
                    .update(id, patch)
                    .map(|()| format!("Updated task #{id}"))
            }),
        };
        match result {
            Ok(msg) => {
                self.save_store();
                self.update_columns();
                self.set_status_message(msg);
                self.state = AppState::Board;
                self.input_mode = InputMode::None;
            }
            Err(e) => self.set_status_message(e),
        }
    }

    fn handle_achievements_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc | KeyCode::Char('v') | KeyCode::Char('q') => {
                self.state = AppState::Board
            }
            KeyCode::Up => {
                if self.achievements_selected > 0 {
                    self.achievements_selected -= 1;
                }
            }
            KeyCode::Down => {
                if !self.archive.tasks.is_empty()
                    && self.achievements_selected < self.archive.tasks.len() - 1
                {
                    self.achievements_selected += 1;
                }
            }
            KeyCode::Char('d') => {
                if let Some(task) = self.archive.tasks.get(self.achievements_selected) {
                    let id = task.id;
                    self.archive.delete(id);
                    self.save_archive();
                    if self.achievements_selected >= self.archive.tasks.len()
                        && self.achievements_selected > 0
                    {
                        self.achievements_selected -= 1;
                    }
                    self.set_status_message(format!("Removed #{id} from achievements"));
                }
            }
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                if let Some(id) = self.confirm_delete.take() {
                    if self.store.delete(id) {
                        self.save_store();
                        self.update_columns();
                        self.set_status_message(format!("Deleted task #{id}"));
                    }
                }
                self.state = AppState::Board;
            }
            _ => {
                self.confirm_delete = None;
                self.state = AppState::Board;
            }
        }
    }

    /// Move the selected card to the adjacent priority lane.
    fn move_card(&mut self, right: bool) {
        let Some(id) = self.selected_task_id() else {
            return;
        };
        let target_column = if right {
            if self.selected_column >= self.columns.len() - 1 {
                return;
            }
            self.selected_column + 1
        } else {
            if self.selected_column == 0 {
                return;
            }
            self.selected_column - 1
        };
        let new_priority = Priority::ALL[target_column];

        let patch = TaskPatch {
            priority: Some(new_priority),
            ..TaskPatch::default()
        };
        if let Err(e) = self.store.update(id, patch) {
            self.set_status_message(e);
            return;
        }
        self.save_store();
        self.update_columns();
        self.selected_column = target_column;
        if let Some(pos) = self.columns[target_column].iter().position(|&t| t == id) {
            self.selected_card = pos;
        } else {
            self.clamp_selection();
        }
        self.set_status_message(format!(
            "Moved task to {} priority",
            format_priority(new_priority)
        ));
    }

    /// Begin the completion workflow for the selected task.
    fn complete_selected(&mut self) {
        let Some(id) = self.selected_task_id() else {
            return;
        };
        let now = Local::now();
        if self.workflow.begin(&mut self.store, &self.archive, id, now) {
            self.save_store();
            self.update_columns();
        } else {
            self.set_status_message("Task is already completing".to_string());
        }
    }

    /// Undo completion of the selected task. Refused once the celebration
    /// has started.
    fn undo_selected(&mut self) {
        let Some(id) = self.selected_task_id() else {
            return;
        };
        let is_completed = self.store.get(id).map(|t| t.completed).unwrap_or(false);
        if !is_completed {
            return;
        }
        if self.workflow.undo(&mut self.store, id) {
            self.save_store();
            self.update_columns();
            self.set_status_message(format!("Reopened task #{id}"));
        } else {
            self.set_status_message("Too late to undo: task is on its way to achievements".to_string());
        }
    }

    fn adjust_progress(&mut self, delta: i16) {
        let Some(id) = self.selected_task_id() else {
            return;
        };
        let Some(task) = self.store.get(id) else {
            return;
        };
        let progress = (task.progress as i16 + delta).clamp(0, 100) as u8;
        let patch = TaskPatch {
            progress: Some(progress),
            ..TaskPatch::default()
        };
        if self.store.update(id, patch).is_ok() {
            self.save_store();
            self.set_status_message(format!("Progress: {progress}%"));
        }
    }

    /// Label for a day tab offset.
    fn day_label(offset: u32) -> String {
        let date = Local::now().date_naive() + Duration::days(offset as i64);
        match offset {
            0 => "Today".to_string(),
            1 => "Tomorrow".to_string(),
            _ => format!("{} {}", date.format("%a"), date.day()),
        }
    }

    // ---- Rendering ----

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header with day tabs
                Constraint::Min(0),    // Board
                Constraint::Length(1), // Status bar
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_board(f, chunks[1]);
        self.render_status_bar(f, chunks[2]);

        match self.state {
            AppState::TaskDetail => self.render_task_detail_popup(f),
            AppState::AddTask | AppState::EditTask => self.render_form(f),
            AppState::Achievements => self.render_achievements(f),
            AppState::ConfirmDelete => self.render_confirm(f),
            AppState::Board => {}
        }

        // Celebration and flight overlays sit on top of everything.
        if let Some(task) = self.workflow.celebrating_task() {
            let task = task.clone();
            self.render_celebration(f, &task);
        } else if let Some(task) = self.workflow.flying_task() {
            let title = task.title.clone();
            self.render_flight_banner(f, &title);
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled("TASK BOARD", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
        ];
        for offset in 0..DAY_TABS {
            let label = Self::day_label(offset);
            if offset == self.day_offset {
                spans.push(Span::styled(
                    format!("[{label}]"),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ));
            } else {
                spans.push(Span::styled(
                    format!(" {label} "),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            spans.push(Span::raw(" "));
        }
        let done = self.archive.tasks.len();
        spans.push(Span::styled(
            format!("  {done} done"),
            Style::default().fg(Color::Green),
        ));

        let header = Paragraph::new(vec![Line::from(spans)])
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header, area);
    }

    fn render_board(&mut self, f: &mut Frame, area: Rect) {
        let columns_layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(34),
                Constraint::Percentage(33),
                Constraint::Percentage(33),
            ])
            .split(area);

        for (i, &column_area) in columns_layout.iter().enumerate() {
            self.render_column(f, column_area, i);
        }
    }

    fn render_column(&mut self, f: &mut Frame, area: Rect, column_index: usize) {
        let priority = Priority::ALL[column_index];
        let is_selected = column_index == self.selected_column;
        let accent = priority_color(priority);

        let border_style = if is_selected {
            Style::default().fg(accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let title = format!(
            "{} Priority ({})",
            format_priority(priority),
            self.columns[column_index].len()
        );
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(border_style);
        let inner = block.inner(area);
        f.render_widget(block, area);

        let cards = self.columns[column_index].clone();
        if cards.is_empty() {
            return;
        }

        let card_height = 5;
        let available_height = inner.height as usize;
        let visible_cards = (available_height / card_height).max(1);

        // Keep the selected card visible in its column.
        let scroll_offset = if is_selected {
            let start = self.column_scroll_offsets[column_index];
            if self.selected_card < start {
                self.column_scroll_offsets[column_index] = self.selected_card;
            } else if self.selected_card >= start + visible_cards {
                self.column_scroll_offsets[column_index] =
                    self.selected_card + 1 - visible_cards;
            }
            self.column_scroll_offsets[column_index]
        } else {
            self.column_scroll_offsets[column_index]
        };

        let mut current_y = 0;
        let mut rendered = 0;
        for (card_index, &task_id) in cards.iter().enumerate().skip(scroll_offset) {
            if current_y + card_height > available_height {
                break;
            }
            if let Some(task) = self.store.get(task_id).cloned() {
                let card_selected = is_selected && card_index == self.selected_card;
                let card_area = Rect {
                    x: inner.x,
                    y: inner.y + current_y as u16,
                    width: inner.width,
                    height: card_height as u16,
                };
                self.render_card(f, card_area, &task, card_selected);
                current_y += card_height;
                rendered += 1;
            }
        }

        if scroll_offset > 0 {
            let indicator = Paragraph::new(format!("▲ +{scroll_offset} above"))
                .style(Style::default().fg(Color::Cyan));
            f.render_widget(
                indicator,
                Rect { x: inner.x, y: inner.y, width: inner.width, height: 1 },
            );
        }
        let remaining = cards.len().saturating_sub(scroll_offset + rendered);
        if remaining > 0 && inner.height > 0 {
            let indicator = Paragraph::new(format!("▼ +{remaining} below"))
                .style(Style::default().fg(Color::Cyan));
            f.render_widget(
                indicator,
                Rect {
                    x: inner.x,
                    y: inner.y + inner.height - 1,
                    width: inner.width,
                    height: 1,
                },
            );
        }
    }

    fn render_card(&self, f: &mut Frame, area: Rect, task: &Task, is_selected: bool) {
        let accent = priority_color(task.priority);
        let style = if is_selected {
            Style::default().bg(accent).fg(Color::Black).add_modifier(Modifier::BOLD)
        } else {
            Style::default().bg(Color::DarkGray)
        };

        let mut card_text = vec![];
        let mut id_line = format!("#{}", task.id);
        if task.completed {
            id_line.push_str(" ✓");
        }
        if task.auto_escalated {
            id_line.push_str(" ↑auto");
        }
        card_text.push(Line::from(id_line));

        // Word-wrap the title to at most 2 lines.
        let available_width = area.width.saturating_sub(2) as usize;
        let mut current_line = String::new();
        let mut lines = Vec::new();
        for word in task.title.split_whitespace() {
            if current_line.is_empty() {
                current_line = word.to_string();
            } else if current_line.len() + 1 + word.len() <= available_width {
                current_line.push(' ');
                current_line.push_str(word);
            } else {
                lines.push(current_line.clone());
                current_line = word.to_string();
                if lines.len() >= 2 {
                    break;
                }
            }
        }
        if !current_line.is_empty() && lines.len() < 2 {
            lines.push(current_line);
        }
        for line in lines {
            card_text.push(Line::from(line));
        }

        let now = Local::now();
        let overdue = if task.is_overdue(now) { " !" } else { "" };
        card_text.push(Line::from(format!(
            "{}% | {}{}",
            task.progress,
            format_due_relative(task.due_date, now.date_naive()),
            overdue
        )));

        let card = Paragraph::new(card_text)
            .block(Block::default().borders(Borders::ALL))
            .style(style)
            .wrap(Wrap { trim: true });
        f.render_widget(card, area);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            let total: usize = self.columns.iter().map(|c| c.len()).sum();
            format!(
                "{} tasks on {} | a: Add | c: Complete | Ctrl+←/→: Move lane | Tab: Day | v: Achievements | h: Help",
                total,
                Self::day_label(self.day_offset)
            )
        };
        let status = Paragraph::new(status_text)
            .style(Style::default().bg(Color::Blue).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    fn render_task_detail_popup(&self, f: &mut Frame) {
        let Some(id) = self.selected_task_id() else {
            return;
        };
        let Some(task) = self.store.get(id) else {
            return;
        };

        let popup_area = centered_rect(70, 70, f.area());
        f.render_widget(Clear, popup_area);

        let today = Local::now().date_naive();
        let due_time = task
            .due_time
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_else(|| "23:59 (default)".to_string());
        let detail_lines = vec![
            Line::from(vec![Span::styled(
                format!("Task #{}: {}", task.id, task.title),
                Style::default().add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            Line::from(format!("Priority:   {}", format_priority(task.priority))),
            Line::from(format!(
                "Baseline:   {}{}",
                format_priority(task.original_priority),
                if task.auto_escalated { "  (auto-escalated)" } else { "" }
            )),
            Line::from(format!(
                "Due:        {}",
                format_due_relative(task.due_date, today)
            )),
            Line::from(format!("Due time:   {due_time}")),
            Line::from(format!("Progress:   {}%", task.progress)),
            Line::from(""),
            Line::from("Description:"),
            Line::from(if task.description.is_empty() {
                "-".to_string()
            } else {
                task.description.clone()
            }),
        ];

        let accent = priority_color(task.priority);
        let popup = Paragraph::new(detail_lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Task Details (Press Enter to close)")
                    .title_alignment(Alignment::Center)
                    .border_style(Style::default().fg(accent).add_modifier(Modifier::BOLD)),
            )
            .wrap(Wrap { trim: true })
            .style(Style::default().bg(Color::Black));
        f.render_widget(popup, popup_area);
    }

    fn render_form(&self, f: &mut Frame) {
        let editing = self.state == AppState::EditTask;
        let popup_area = centered_rect(60, 60, f.area());
        f.render_widget(Clear, popup_area);

        let title = if editing { "Edit Task" } else { "Add New Task" };
        let field_line = |label: &str, value: &str, order: usize| {
            let style = if self.task_form.current_field == order {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!("{label:<13}"), style),
                Span::raw(value.to_string()),
            ])
        };

        let priority = self.task_form.selected_priority();
        let lines = vec![
            field_line("Title:", &self.task_form.title.value, TITLE_ORDER),
            field_line(
                "Description:",
                &self.task_form.description.value,
                DESCRIPTION_ORDER,
            ),
            field_line(
                "Priority:",
                &format!("< {} >", format_priority(priority)),
                PRIORITY_ORDER,
            ),
            field_line(
                "Due date:",
                &self.task_form.due_date.value,
                DUE_DATE_ORDER,
            ),
            field_line(
                "Due time:",
                &self.task_form.due_time.value,
                DUE_TIME_ORDER,
            ),
            field_line(
                "Progress:",
                &format!("< {}% >", self.task_form.progress),
                PROGRESS_ORDER,
            ),
            Line::from(""),
            Line::from(Span::styled(
                "Tab: Next field | ←/→: Edit / cycle | Enter: Save | Esc: Cancel",
                Style::default().fg(Color::DarkGray),
            )),
        ];

        let accent = priority_color(priority);
        let popup = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .title_alignment(Alignment::Center)
                    .border_style(Style::default().fg(accent)),
            )
            .style(Style::default().bg(Color::Black));
        f.render_widget(popup, popup_area);

        // Hardware cursor sits in the active text field.
        let active_field = match self.task_form.current_field {
            TITLE_ORDER => Some((&self.task_form.title, 0u16)),
            DESCRIPTION_ORDER => Some((&self.task_form.description, 1)),
            DUE_DATE_ORDER => Some((&self.task_form.due_date, 3)),
            DUE_TIME_ORDER => Some((&self.task_form.due_time, 4)),
            _ => None,
        };
        if let Some((field, row)) = active_field {
            if field.active {
                let col = field.value[..field.cursor].chars().count() as u16;
                f.set_cursor_position((popup_area.x + 14 + col, popup_area.y + 1 + row));
            }
        }
    }

    fn render_achievements(&self, f: &mut Frame) {
        let area = f.area();
        let width = (area.width * 40) / 100;
        let panel = Rect {
            x: area.width.saturating_sub(width),
            y: area.y,
            width,
            height: area.height,
        };
        f.render_widget(Clear, panel);

        let mut lines = vec![];
        if self.archive.tasks.is_empty() {
            lines.push(Line::from("Nothing here yet."));
            lines.push(Line::from("Complete a task to earn its place."));
        }
        for (i, task) in self.archive.tasks.iter().enumerate() {
            let when = task
                .completed_at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".into());
            let style = if i == self.achievements_selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(priority_color(task.priority))
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(
                format!("#{} {} ({})", task.id, task.title, when),
                style,
            )));
        }

        let panel_widget = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Achievements ({})", self.archive.tasks.len()))
                    .border_style(Style::default().fg(Color::Green)),
            )
            .wrap(Wrap { trim: true })
            .style(Style::default().bg(Color::Black));
        f.render_widget(panel_widget, panel);
    }

    fn render_confirm(&self, f: &mut Frame) {
        let Some(id) = self.confirm_delete else {
            return;
        };
        let popup_area = centered_rect(40, 20, f.area());
        f.render_widget(Clear, popup_area);
        let popup = Paragraph::new(vec![
            Line::from(format!("Delete task #{id}?")),
            Line::from(""),
            Line::from("y: Delete | any other key: Cancel"),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Confirm")
                .border_style(Style::default().fg(Color::Red)),
        )
        .alignment(Alignment::Center)
        .style(Style::default().bg(Color::Black));
        f.render_widget(popup, popup_area);
    }

    fn render_celebration(&self, f: &mut Frame, task: &Task) {
        let popup_area = centered_rect(50, 30, f.area());
        f.render_widget(Clear, popup_area);
        let message =
            APPRECIATION_MESSAGES[task.id as usize % APPRECIATION_MESSAGES.len()];
        let popup = Paragraph::new(vec![
            Line::from(Span::styled(
                message,
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(task.title.clone()),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("* * *")
                .title_alignment(Alignment::Center)
                .border_style(
                    Style::default()
                        .fg(priority_color(task.priority))
                        .add_modifier(Modifier::BOLD),
                ),
        )
        .alignment(Alignment::Center)
        .style(Style::default().bg(Color::Black));
        f.render_widget(popup, popup_area);
    }

    fn render_flight_banner(&self, f: &mut Frame, title: &str) {
        let area = f.area();
        let banner = Rect {
            x: area.x,
            y: area.y + 3,
            width: area.width,
            height: 1,
        };
        let widget = Paragraph::new(format!("\"{title}\" flies to the achievements..."))
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Right);
        f.render_widget(widget, banner);
    }
}
