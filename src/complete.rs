//! Completion workflow: explicit state machine from "mark done" to archive.
//!
//! A completing task goes through `Celebrating` (confetti/spotlight on the
//! board) and `Flying` (card flies to the achievements panel) before it is
//! settled: archived with a `completed_at` stamp and removed from the active
//! store. While a run is in flight the task transiently sits in the store
//! with `completed = true`; that window is bounded by per-stage timeouts so
//! a lost animation callback can never wedge a task.
//!
//! Effect-finished signals and timeout fallbacks both funnel into the single
//! `drive` transition function, and the archive refuses duplicate ids, so a
//! task settles exactly once no matter how many times either path fires.

use chrono::{DateTime, Duration, Local};

use crate::store::{Archive, TaskStore};
use crate::task::Task;

/// Fallback timeout for the celebration stage.
pub const CELEBRATION_MILLIS: i64 = 3000;
/// Fallback timeout for the fly-to-archive stage.
pub const FLIGHT_MILLIS: i64 = 1000;

/// Stage of an in-flight completion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStage {
    Celebrating,
    Flying,
}

/// One task's trip from the board to the archive.
#[derive(Debug)]
struct CompletionRun {
    task: Task,
    stage: CompletionStage,
    stage_deadline: DateTime<Local>,
    effect_done: bool,
}

/// Driver for all in-flight completion runs.
#[derive(Debug)]
pub struct CompletionWorkflow {
    runs: Vec<CompletionRun>,
    celebration: Duration,
    flight: Duration,
}

impl CompletionWorkflow {
    pub fn new() -> Self {
        CompletionWorkflow {
            runs: Vec::new(),
            celebration: Duration::milliseconds(CELEBRATION_MILLIS),
            flight: Duration::milliseconds(FLIGHT_MILLIS),
        }
    }

    /// Start completing a task. Marks it completed in the store (progress
    /// 100) and opens a celebration run. Re-entrant calls for a task already
    /// in flight or already archived are no-ops.
    pub fn begin(
        &mut self,
        store: &mut TaskStore,
        archive: &Archive,
        id: u64,
        now: DateTime<Local>,
    ) -> bool {
        if self.stage_of(id).is_some() || archive.get(id).is_some() {
            return false;
        }
        match store.get(id) {
            Some(task) if !task.completed => {}
            _ => return false,
        }
        let Some(snapshot) = store.set_completed(id) else {
            return false;
        };
        self.runs.push(CompletionRun {
            task: snapshot,
            stage: CompletionStage::Celebrating,
            stage_deadline: now + self.celebration,
            effect_done: false,
        });
        true
    }

    /// External "effect finished" signal for the task's current stage.
    /// Harmless when the id has no run; the transition itself happens in
    /// `drive`.
    pub fn effect_finished(&mut self, id: u64) {
        if let Some(run) = self.runs.iter_mut().find(|r| r.task.id == id) {
            run.effect_done = true;
        }
    }

    /// Advance every run whose stage is ready, either because its effect
    /// signalled or because its fallback timeout expired. Settling archives
    /// the snapshot and removes the task from the store. Returns whether any
    /// collection changed.
    pub fn drive(
        &mut self,
        store: &mut TaskStore,
        archive: &mut Archive,
        now: DateTime<Local>,
    ) -> bool {
        let mut changed = false;
        let mut i = 0;
        while i < self.runs.len() {
            let run = &mut self.runs[i];
            let ready = run.effect_done || now >= run.stage_deadline;
            if !ready {
                i += 1;
                continue;
            }
            match run.stage {
                CompletionStage::Celebrating => {
                    run.stage = CompletionStage::Flying;
                    run.stage_deadline = now + self.flight;
                    run.effect_done = false;
                    i += 1;
                }
                CompletionStage::Flying => {
                    let run = self.runs.remove(i);
                    archive.push_completed(run.task.clone(), now);
                    store.delete(run.task.id);
                    changed = true;
                }
            }
        }
        changed
    }

    /// Settle every pending run immediately, skipping remaining stages. Used
    /// by non-interactive paths where there is nothing to animate.
    pub fn force_settle(
        &mut self,
        store: &mut TaskStore,
        archive: &mut Archive,
        now: DateTime<Local>,
    ) -> bool {
        let mut changed = false;
        for run in self.runs.drain(..) {
            archive.push_completed(run.task.clone(), now);
            store.delete(run.task.id);
            changed = true;
        }
        changed
    }

    /// Drop all pending runs without touching the store or archive. Called
    /// on TUI teardown so no stale timeout mutates state after unmount.
    pub fn abort_all(&mut self) {
        self.runs.clear();
    }

    /// Undo completion. Only honored for a task still in ACTIVE state; once
    /// a celebration run exists the completion is committed.
    pub fn undo(&self, store: &mut TaskStore, id: u64) -> bool {
        if self.stage_of(id).is_some() {
            return false;
        }
        store.set_uncompleted(id)
    }

    /// Current stage of a task's run, if one is in flight. The board uses
    /// this to pick the overlay to draw.
    pub fn stage_of(&self, id: u64) -> Option<CompletionStage> {
        self.runs.iter().find(|r| r.task.id == id).map(|r| r.stage)
    }

    /// Snapshot of the task currently celebrating, for the overlay card.
    pub fn celebrating_task(&self) -> Option<&Task> {
        self.runs
            .iter()
            .find(|r| r.stage == CompletionStage::Celebrating)
            .map(|r| &r.task)
    }

    /// Snapshot of the task currently flying to the archive, if any.
    pub fn flying_task(&self) -> Option<&Task> {
        self.runs
            .iter()
            .find(|r| r.stage == CompletionStage::Flying)
            .map(|r| &r.task)
    }

    pub fn has_pending(&self) -> bool {
        !self.runs.is_empty()
    }
}

impl Default for CompletionWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

/// Settle tasks left completed in the store by an interrupted session
/// (teardown mid-animation). Runs once at startup.
pub fn recover_interrupted(
    store: &mut TaskStore,
    archive: &mut Archive,
    now: DateTime<Local>,
) -> bool {
    let stuck: Vec<Task> = store
        .tasks
        .iter()
        .filter(|t| t.completed)
        .cloned()
        .collect();
    let mut changed = false;
    for task in stuck {
        let id = task.id;
        archive.push_completed(task, now);
        store.delete(id);
        changed = true;
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::seed_tasks;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn fixtures() -> (TaskStore, Archive, CompletionWorkflow, DateTime<Local>) {
        let store = TaskStore { tasks: seed_tasks() };
        let archive = Archive::default();
        let workflow = CompletionWorkflow::new();
        let now = Local.with_ymd_and_hms(2026, 8, 29, 12, 0, 0).unwrap();
        (store, archive, workflow, now)
    }

    #[test]
    fn full_run_settles_exactly_once() {
        let (mut store, mut archive, mut workflow, now) = fixtures();

        assert!(workflow.begin(&mut store, &archive, 1, now));
        assert_eq!(workflow.stage_of(1), Some(CompletionStage::Celebrating));
        let in_store = store.get(1).unwrap();
        assert!(in_store.completed);
        assert_eq!(in_store.progress, 100);

        // Effect signals fire repeatedly; extra ones must be harmless.
        workflow.effect_finished(1);
        workflow.effect_finished(1);
        assert!(!workflow.drive(&mut store, &mut archive, now)); // -> Flying
        assert_eq!(workflow.stage_of(1), Some(CompletionStage::Flying));

        workflow.effect_finished(1);
        assert!(workflow.drive(&mut store, &mut archive, now)); // settle
        assert!(!workflow.drive(&mut store, &mut archive, now));

        assert!(store.get(1).is_none());
        assert_eq!(archive.tasks.iter().filter(|t| t.id == 1).count(), 1);
        assert!(archive.get(1).unwrap().completed_at.is_some());
    }

    #[test]
    fn timeout_fallback_settles_without_signals() {
        let (mut store, mut archive, mut workflow, now) = fixtures();
        workflow.begin(&mut store, &archive, 2, now);

        // No effect callbacks at all; the stage deadlines carry the run.
        let after_celebration = now + Duration::milliseconds(CELEBRATION_MILLIS);
        assert!(!workflow.drive(&mut store, &mut archive, after_celebration));
        assert_eq!(workflow.stage_of(2), Some(CompletionStage::Flying));

        let after_flight = after_celebration + Duration::milliseconds(FLIGHT_MILLIS);
        assert!(workflow.drive(&mut store, &mut archive, after_flight));
        assert!(store.get(2).is_none());
        assert!(archive.get(2).is_some());
    }

    #[test]
    fn reentrant_begin_is_a_noop() {
        let (mut store, mut archive, mut workflow, now) = fixtures();
        assert!(workflow.begin(&mut store, &archive, 1, now));
        assert!(!workflow.begin(&mut store, &archive, 1, now));

        workflow.effect_finished(1);
        workflow.drive(&mut store, &mut archive, now);
        workflow.effect_finished(1);
        workflow.drive(&mut store, &mut archive, now);

        // Settled and archived; beginning again must still refuse.
        assert!(!workflow.begin(&mut store, &archive, 1, now));
        assert_eq!(archive.tasks.len(), 1);
    }

    #[test]
    fn undo_only_before_celebration_starts() {
        let (mut store, archive, mut workflow, now) = fixtures();

        // Active task: undo (of a hypothetical completed flag) is allowed.
        store.set_completed(3);
        assert!(workflow.undo(&mut store, 3));
        let task = store.get(3).unwrap();
        assert!(!task.completed);
        assert_eq!(task.progress, 0);

        // Once celebrating, undo is refused.
        workflow.begin(&mut store, &archive, 3, now);
        assert!(!workflow.undo(&mut store, 3));
        assert!(store.get(3).unwrap().completed);
    }

    #[test]
    fn abort_drops_runs_without_mutating_collections() {
        let (mut store, mut archive, mut workflow, now) = fixtures();
        workflow.begin(&mut store, &archive, 1, now);
        workflow.abort_all();
        assert!(!workflow.has_pending());

        let later = now + Duration::seconds(30);
        assert!(!workflow.drive(&mut store, &mut archive, later));
        // Still in the store, flagged completed, nothing archived.
        assert!(store.get(1).unwrap().completed);
        assert!(archive.tasks.is_empty());
    }

    #[test]
    fn force_settle_skips_stages() {
        let (mut store, mut archive, mut workflow, now) = fixtures();
        workflow.begin(&mut store, &archive, 1, now);
        assert!(workflow.force_settle(&mut store, &mut archive, now));
        assert!(store.get(1).is_none());
        assert!(archive.get(1).is_some());
        assert!(!workflow.has_pending());
    }

    #[test]
    fn recover_adopts_interrupted_completions() {
        let (mut store, mut archive, _workflow, now) = fixtures();
        store.set_completed(2);

        assert!(recover_interrupted(&mut store, &mut archive, now));
        assert!(store.get(2).is_none());
        assert!(archive.get(2).is_some());
        assert_eq!(store.tasks.len(), 2);
        assert!(!recover_interrupted(&mut store, &mut archive, now));
    }

    #[test]
    fn begin_refuses_archived_id() {
        let (mut store, mut archive, mut workflow, now) = fixtures();
        let snapshot = store.set_completed(1).unwrap();
        archive.push_completed(snapshot, now);
        store.delete(1);

        assert!(!workflow.begin(&mut store, &archive, 1, now));
        assert_eq!(archive.tasks.len(), 1);
    }

    #[test]
    fn begin_refuses_unknown_id() {
        let (mut store, archive, mut workflow, now) = fixtures();
        assert!(!workflow.begin(&mut store, &archive, 99, now));
        assert!(!workflow.has_pending());
    }
}
