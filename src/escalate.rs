//! Automatic priority escalation based on deadlines.
//!
//! A periodic tick walks the active tasks and raises any task whose deadline
//! is inside the escalation window (or already passed) to high priority,
//! notifying once per transition. The human-chosen baseline is kept in
//! `original_priority` so an escalation never loses what the user asked for.
//!
//! The evaluator is a pure function of (task, now, config): re-running it
//! without the clock moving is a no-op, which is what makes the tick safe to
//! fire from anywhere in the event loop.

use chrono::{DateTime, Duration, Local};

use crate::fields::Priority;
use crate::notify::NotificationSink;
use crate::task::Task;

/// Single escalation threshold, used by the startup tick and every periodic
/// tick alike: a task due within this many minutes goes high priority.
pub const ESCALATION_WINDOW_MINUTES: i64 = 25;

/// Wall-clock seconds between periodic escalation ticks.
pub const TICK_INTERVAL_SECS: i64 = 60;

/// Tuning for the escalation engine.
#[derive(Debug, Clone, Copy)]
pub struct EscalationConfig {
    /// Tasks due within this window escalate to high.
    pub window: Duration,
    /// When true, an escalated priority stays high even after the deadline
    /// moves back out of the window; only a manual edit reverts it. When
    /// false, the task drops back to its baseline (silently).
    pub sticky: bool,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        EscalationConfig {
            window: Duration::minutes(ESCALATION_WINDOW_MINUTES),
            sticky: false,
        }
    }
}

/// Evaluate one task against the clock, applying any priority change in
/// place. Returns true when the task was mutated.
///
/// Completed tasks and tasks without a resolvable deadline are skipped, so a
/// bad date on one task can never poison the tick for the rest. A change to
/// high priority emits exactly one notification; the equality short-circuit
/// makes a repeat evaluation at the same instant a no-op.
pub fn evaluate_task(
    task: &mut Task,
    now: DateTime<Local>,
    config: &EscalationConfig,
    sink: &mut dyn NotificationSink,
) -> bool {
    if task.completed {
        return false;
    }
    let Some(deadline) = task.deadline() else {
        return false;
    };

    let base = task.original_priority;
    let remaining = deadline - now;
    let urgent = now > deadline || remaining <= config.window;

    let target = if urgent {
        Priority::High
    } else if config.sticky {
        task.priority
    } else {
        base
    };

    if target == task.priority {
        return false;
    }

    task.priority = target;
    if urgent {
        task.auto_escalated = true;
        if now > deadline {
            sink.notify(&format!("Overdue: {}", task.title), "This task is now overdue!");
        } else {
            let minutes_left = ((remaining.num_seconds() as f64) / 60.0).round() as i64;
            let plural = if minutes_left == 1 { "" } else { "s" };
            sink.notify(
                &format!("Urgent: {}", task.title),
                &format!("Task due in {minutes_left} minute{plural}!"),
            );
        }
    }
    // De-escalation back to baseline is silent and leaves `auto_escalated`
    // set; only a human edit clears it.
    true
}

/// Run one escalation tick over the whole collection. Tasks are independent;
/// order does not matter. Returns whether anything changed, so callers only
/// persist and re-render on actual transitions.
pub fn run_tick(
    tasks: &mut [Task],
    now: DateTime<Local>,
    config: &EscalationConfig,
    sink: &mut dyn NotificationSink,
) -> bool {
    let mut changed = false;
    for task in tasks.iter_mut() {
        changed |= evaluate_task(task, now, config, sink);
    }
    changed
}

/// Owned tick scheduler with an explicit start/stop lifecycle.
///
/// After `start` the first `due` call fires immediately (the startup tick);
/// subsequent fires are spaced `TICK_INTERVAL_SECS` apart. The owner polls
/// `due` from its event loop and calls `stop` on teardown so no tick can
/// outlive the UI. Tests drive it with explicit instants.
#[derive(Debug)]
pub struct EscalationTimer {
    interval: Duration,
    next_tick: Option<DateTime<Local>>,
}

impl EscalationTimer {
    pub fn new() -> Self {
        EscalationTimer {
            interval: Duration::seconds(TICK_INTERVAL_SECS),
            next_tick: None,
        }
    }

    /// Arm the timer; the first tick is due immediately.
    pub fn start(&mut self, now: DateTime<Local>) {
        self.next_tick = Some(now);
    }

    /// Disarm the timer. `due` never fires again until restarted.
    pub fn stop(&mut self) {
        self.next_tick = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_tick.is_some()
    }

    /// Whether a tick is due at `now`; arms the next one when it is.
    pub fn due(&mut self, now: DateTime<Local>) -> bool {
        match self.next_tick {
            Some(at) if now >= at => {
                self.next_tick = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }
}

impl Default for EscalationTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::BufferSink;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn task_due_in(minutes: i64, priority: Priority, now: DateTime<Local>) -> Task {
        let deadline = now + Duration::minutes(minutes);
        Task {
            id: 1,
            title: "Ship release notes".into(),
            description: String::new(),
            priority,
            original_priority: priority,
            auto_escalated: false,
            due_date: Some(deadline.date_naive()),
            due_time: Some(deadline.time()),
            progress: 0,
            completed: false,
            completed_at: None,
        }
    }

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 8, 29, 12, 0, 0).unwrap()
    }

    #[test]
    fn escalates_task_inside_window() {
        let now = now();
        let mut task = task_due_in(10, Priority::Low, now);
        let mut sink = BufferSink::default();

        assert!(evaluate_task(&mut task, now, &EscalationConfig::default(), &mut sink));
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.original_priority, Priority::Low);
        assert!(task.auto_escalated);

        let messages = sink.drain();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, "Urgent: Ship release notes");
        assert_eq!(messages[0].1, "Task due in 10 minutes!");
    }

    #[test]
    fn escalates_overdue_task() {
        let now = now();
        let mut task = task_due_in(-60, Priority::Medium, now);
        let mut sink = BufferSink::default();

        assert!(evaluate_task(&mut task, now, &EscalationConfig::default(), &mut sink));
        assert_eq!(task.priority, Priority::High);

        let messages = sink.drain();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, "Overdue: Ship release notes");
        assert_eq!(messages[0].1, "This task is now overdue!");
    }

    #[test]
    fn evaluator_is_idempotent_without_clock_advance() {
        let now = now();
        let mut tasks = vec![task_due_in(10, Priority::Low, now), task_due_in(-5, Priority::Medium, now)];
        let config = EscalationConfig::default();
        let mut sink = BufferSink::default();

        assert!(run_tick(&mut tasks, now, &config, &mut sink));
        assert_eq!(sink.drain().len(), 2);

        let snapshot = tasks.clone();
        assert!(!run_tick(&mut tasks, now, &config, &mut sink));
        assert_eq!(tasks, snapshot);
        assert!(sink.drain().is_empty());
    }

    #[test]
    fn distant_deadline_never_escalates() {
        let now = now();
        let mut task = task_due_in(5 * 24 * 60, Priority::Low, now);
        let config = EscalationConfig::default();
        let mut sink = BufferSink::default();

        for minute in 0..10 {
            let tick_at = now + Duration::minutes(minute);
            assert!(!evaluate_task(&mut task, tick_at, &config, &mut sink));
        }
        assert_eq!(task.priority, Priority::Low);
        assert!(!task.auto_escalated);
        assert!(sink.drain().is_empty());
    }

    #[test]
    fn skips_completed_and_undated_tasks() {
        let now = now();
        let config = EscalationConfig::default();
        let mut sink = BufferSink::default();

        let mut done = task_due_in(-10, Priority::Low, now);
        done.completed = true;
        assert!(!evaluate_task(&mut done, now, &config, &mut sink));
        assert_eq!(done.priority, Priority::Low);

        let mut undated = task_due_in(-10, Priority::Low, now);
        undated.due_date = None;
        assert!(!evaluate_task(&mut undated, now, &config, &mut sink));
        assert_eq!(undated.priority, Priority::Low);
        assert!(sink.drain().is_empty());
    }

    #[test]
    fn reversible_mode_returns_to_baseline_silently() {
        let now = now();
        let config = EscalationConfig::default();
        let mut sink = BufferSink::default();

        let mut task = task_due_in(10, Priority::Low, now);
        evaluate_task(&mut task, now, &config, &mut sink);
        assert_eq!(task.priority, Priority::High);
        sink.drain();

        // Deadline pushed back out of the window.
        let deadline = now + Duration::hours(8);
        task.due_date = Some(deadline.date_naive());
        task.due_time = Some(deadline.time());

        assert!(evaluate_task(&mut task, now, &config, &mut sink));
        assert_eq!(task.priority, Priority::Low);
        assert!(sink.drain().is_empty());
    }

    #[test]
    fn sticky_mode_keeps_escalation_until_human_edit() {
        let now = now();
        let config = EscalationConfig {
            sticky: true,
            ..EscalationConfig::default()
        };
        let mut sink = BufferSink::default();

        let mut task = task_due_in(10, Priority::Low, now);
        evaluate_task(&mut task, now, &config, &mut sink);
        sink.drain();

        let deadline = now + Duration::hours(8);
        task.due_date = Some(deadline.date_naive());
        task.due_time = Some(deadline.time());

        assert!(!evaluate_task(&mut task, now, &config, &mut sink));
        assert_eq!(task.priority, Priority::High);
        assert!(task.auto_escalated);
        assert!(sink.drain().is_empty());
    }

    #[test]
    fn tick_reports_no_change_for_stable_collection() {
        let now = now();
        let mut tasks = vec![
            task_due_in(5 * 24 * 60, Priority::Medium, now),
            task_due_in(3 * 24 * 60, Priority::Low, now),
        ];
        let mut sink = BufferSink::default();
        assert!(!run_tick(&mut tasks, now, &EscalationConfig::default(), &mut sink));
    }

    #[test]
    fn singular_minute_message() {
        let now = now();
        let mut task = task_due_in(1, Priority::Low, now);
        let mut sink = BufferSink::default();
        evaluate_task(&mut task, now, &EscalationConfig::default(), &mut sink);
        assert_eq!(sink.drain()[0].1, "Task due in 1 minute!");
    }

    #[test]
    fn timer_fires_immediately_then_on_interval() {
        let now = now();
        let mut timer = EscalationTimer::new();
        assert!(!timer.due(now)); // not started yet

        timer.start(now);
        assert!(timer.due(now)); // startup tick
        assert!(!timer.due(now + Duration::seconds(30)));
        assert!(timer.due(now + Duration::seconds(60)));
        assert!(!timer.due(now + Duration::seconds(61)));
    }

    #[test]
    fn stopped_timer_never_fires() {
        let now = now();
        let mut timer = EscalationTimer::new();
        timer.start(now);
        timer.stop();
        assert!(!timer.is_running());
        assert!(!timer.due(now + Duration::hours(1)));
    }
}
