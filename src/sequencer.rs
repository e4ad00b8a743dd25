//! Hover and idle animation state for the project table.
//!
//! All transitions go through [`Sequencer::handle`] (input events) and
//! [`Sequencer::advance`] (timers). Both take the current `Instant`, so the
//! state machine runs the same under a real event loop and in tests.
//!
//! States:
//! - `Waiting`: no active row, idle timer possibly armed
//! - `Active(i)`: row `i` is hovered, idle sweep suppressed
//! - `Idle`: no active row and the quiet period elapsed, sweep running

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::effects::{Crossfade, Scramble, Sweep};
use crate::rows::{Row, COLUMN_COUNT};

/// Delay before a left row is settled
pub const DEBOUNCE: Duration = Duration::from_millis(50);
/// Quiet period before the idle sweep starts
pub const IDLE_AFTER: Duration = Duration::from_secs(3);

/// Pointer events the sequencer reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    HoverEnter(usize),
    HoverLeave(usize),
    LeaveContainer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Debounce,
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    /// Restore a left row, and release it if it is still active
    Settle(usize),
    StartIdle,
}

impl Task {
    fn kind(self) -> TimerKind {
        match self {
            Task::Settle(_) => TimerKind::Debounce,
            Task::StartIdle => TimerKind::Idle,
        }
    }
}

/// One-shot timers, at most one armed per kind. Arming replaces.
#[derive(Debug, Default)]
struct Timers {
    armed: HashMap<TimerKind, (Instant, Task)>,
}

impl Timers {
    fn arm(&mut self, due: Instant, task: Task) {
        self.armed.insert(task.kind(), (due, task));
    }

    fn cancel(&mut self, kind: TimerKind) {
        self.armed.remove(&kind);
    }

    #[allow(dead_code)] // Used in tests
    fn is_armed(&self, kind: TimerKind) -> bool {
        self.armed.contains_key(&kind)
    }

    /// Remove and return every timer due at `now`, earliest first
    fn take_due(&mut self, now: Instant) -> Vec<(Instant, Task)> {
        let mut due: Vec<(Instant, Task)> = self
            .armed
            .values()
            .filter(|(at, _)| *at <= now)
            .copied()
            .collect();
        due.sort_by_key(|(at, _)| *at);
        for (_, task) in &due {
            self.armed.remove(&task.kind());
        }
        due
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Waiting,
    Active(usize),
    Idle(Sweep),
}

/// Per-row animation state
#[derive(Debug, Clone)]
struct RowState {
    original: [String; COLUMN_COUNT],
    preview: Option<String>,
    /// One effect per cell while a scramble is in flight
    scrambles: Vec<Scramble>,
}

impl RowState {
    fn restore(&mut self) {
        self.scrambles.clear();
    }

    fn is_scrambling(&self, now: Instant) -> bool {
        self.scrambles.iter().any(|s| !s.is_done(now))
    }
}

/// Owns every row's animation state plus the shared preview crossfade
#[derive(Debug)]
pub struct Sequencer {
    rows: Vec<RowState>,
    phase: Phase,
    timers: Timers,
    backdrop: Crossfade,
    generation: u64,
}

impl Sequencer {
    /// Attach to rendered rows. Returns `None` when there is nothing to animate.
    pub fn attach(rows: &[Row], now: Instant) -> Option<Self> {
        if rows.is_empty() {
            debug!("No rows to animate, sequencer not attached");
            return None;
        }

        let rows = rows
            .iter()
            .map(|row| RowState {
                original: row.cells.clone(),
                preview: row.preview.clone(),
                scrambles: Vec::new(),
            })
            .collect();

        let mut sequencer = Sequencer {
            rows,
            phase: Phase::Waiting,
            timers: Timers::default(),
            backdrop: Crossfade::hidden(now),
            generation: 0,
        };
        sequencer.timers.arm(now + IDLE_AFTER, Task::StartIdle);
        Some(sequencer)
    }

    pub fn active(&self) -> Option<usize> {
        match self.phase {
            Phase::Active(idx) => Some(idx),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle(_))
    }

    #[allow(dead_code)] // Used in tests
    pub fn is_timer_armed(&self, kind: TimerKind) -> bool {
        self.timers.is_armed(kind)
    }

    pub fn backdrop(&self) -> &Crossfade {
        &self.backdrop
    }

    /// Preview references of every row, for warming up ahead of the first hover
    pub fn preview_targets(&self) -> Vec<String> {
        self.rows.iter().filter_map(|r| r.preview.clone()).collect()
    }

    /// Apply one input event
    pub fn handle(&mut self, input: Input, now: Instant) {
        match input {
            Input::HoverEnter(idx) if idx < self.rows.len() => self.hover_enter(idx, now),
            Input::HoverLeave(idx) if idx < self.rows.len() => {
                self.timers.arm(now + DEBOUNCE, Task::Settle(idx));
            }
            Input::LeaveContainer => self.leave_container(now),
            _ => debug!(?input, "Ignoring input for unknown row"),
        }
    }

    /// Fire every timer due at `now` and drop finished effects
    pub fn advance(&mut self, now: Instant) {
        for (due, task) in self.timers.take_due(now) {
            match task {
                Task::Settle(idx) => self.settle(idx, due),
                Task::StartIdle => {
                    if matches!(self.phase, Phase::Waiting) {
                        debug!("Quiet period elapsed, starting idle sweep");
                        self.phase = Phase::Idle(Sweep::new(due, self.rows.len()));
                    }
                }
            }
        }

        for row in &mut self.rows {
            if !row.scrambles.is_empty() && !row.is_scrambling(now) {
                row.restore();
            }
        }
    }

    fn hover_enter(&mut self, idx: usize, now: Instant) {
        if self.is_idle() {
            debug!("Hover interrupted idle sweep");
            self.phase = Phase::Waiting;
        }
        self.timers.cancel(TimerKind::Idle);
        self.timers.cancel(TimerKind::Debounce);

        if self.active() == Some(idx) {
            return;
        }

        for (i, row) in self.rows.iter_mut().enumerate() {
            if i != idx {
                row.restore();
            }
        }

        self.phase = Phase::Active(idx);
        self.generation = self.generation.wrapping_add(1);
        let base = self.generation << 16 | (idx as u64) << 4;
        let row = &mut self.rows[idx];
        row.scrambles = (0..COLUMN_COUNT)
            .map(|col| Scramble::new(now, base | col as u64))
            .collect();

        match row.preview.as_deref() {
            Some(preview) => self.backdrop.show(preview, now),
            None => self.backdrop.hide(now),
        }
        debug!(row = idx, "Row activated");
    }

    fn settle(&mut self, idx: usize, now: Instant) {
        self.rows[idx].restore();
        if self.active() == Some(idx) {
            self.release(now);
        }
    }

    fn leave_container(&mut self, now: Instant) {
        self.timers.cancel(TimerKind::Debounce);
        for row in &mut self.rows {
            row.restore();
        }
        if !self.is_idle() {
            self.release(now);
        }
    }

    /// Clear the active row, fade the backdrop and arm the idle timer
    fn release(&mut self, now: Instant) {
        if let Some(idx) = self.active() {
            debug!(row = idx, "Row released");
        }
        self.phase = Phase::Waiting;
        self.backdrop.hide(now);
        self.timers.arm(now + IDLE_AFTER, Task::StartIdle);
    }

    /// Text shown for a cell at `now`
    pub fn cell_text(&self, row: usize, col: usize, now: Instant) -> String {
        let Some(state) = self.rows.get(row) else {
            return String::new();
        };
        let original = &state.original[col];
        match state.scrambles.get(col) {
            Some(scramble) => scramble.frame(original, now),
            None => original.clone(),
        }
    }

    /// Opacity of a cell at `now`; below 1 only while the idle sweep runs
    pub fn cell_opacity(&self, row: usize, col: usize, now: Instant) -> f32 {
        match self.phase {
            Phase::Idle(sweep) => sweep.opacity(row, col, now),
            _ => 1.0,
        }
    }

    /// Whether any cell currently differs from its original text
    #[allow(dead_code)] // Used in tests
    pub fn has_effects(&self, now: Instant) -> bool {
        self.rows.iter().any(|r| r.is_scrambling(now))
    }
}
