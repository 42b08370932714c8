//! Task selection: single, toggle, range, select-all and drag selection.
//!
//! [`SelectionState`] holds the pure transitions. [`SelectionEngine`] layers
//! the pointer protocol on top: a pointer-down starts a pending drag, which
//! turns into a rubber-band selection once the pointer travels past the
//! threshold, or falls back to click semantics when released early.

use std::collections::HashSet;
use std::time::Duration;

use uuid::Uuid;

use super::layout::RowLayout;
use super::timer::Timer;
use crate::error::{Result, TimelineError};

pub const DRAG_THRESHOLD: f32 = 10.0;
pub const POST_DRAG_GUARD: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SelectionMode {
    #[default]
    Single,
    Multiple,
    Range,
    Drag,
}

/// Keyboard modifiers held during a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    /// Ctrl on Linux/Windows, Cmd on macOS.
    pub ctrl: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
    };
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        shift: false,
    };
    pub const SHIFT: Modifiers = Modifiers {
        ctrl: false,
        shift: true,
    };
}

/// Selected task ids. An empty set is the idle state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    selected_ids: HashSet<Uuid>,
    last_selected_id: Option<Uuid>,
    mode: SelectionMode,
}

impl SelectionState {
    pub fn selected_ids(&self) -> &HashSet<Uuid> {
        &self.selected_ids
    }

    pub fn last_selected_id(&self) -> Option<Uuid> {
        self.last_selected_id
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        !self.selected_ids.is_empty()
    }

    pub fn is_selected(&self, id: Uuid) -> bool {
        self.selected_ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.selected_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected_ids.is_empty()
    }

    /// `Single` replaces the selection, every other mode adds to it.
    pub fn select_task(&mut self, id: Uuid, mode: SelectionMode) {
        if mode == SelectionMode::Single {
            self.selected_ids.clear();
        }
        self.selected_ids.insert(id);
        self.last_selected_id = Some(id);
        self.mode = mode;
    }

    pub fn toggle_task(&mut self, id: Uuid, mode: SelectionMode) {
        if !self.selected_ids.contains(&id) {
            self.select_task(id, mode);
            return;
        }
        if mode == SelectionMode::Single {
            self.clear();
        } else {
            self.selected_ids.remove(&id);
            self.mode = mode;
            self.settle();
        }
    }

    /// Select every id between `from` and `to` (inclusive) in `ordered`.
    /// Returns the number of selected tasks. Unknown ids leave the selection
    /// untouched.
    pub fn select_range(&mut self, from: Uuid, to: Uuid, ordered: &[Uuid]) -> Result<usize> {
        let position = |id: Uuid| {
            ordered
                .iter()
                .position(|&candidate| candidate == id)
                .ok_or(TimelineError::UnknownTask(id))
        };
        let a = position(from)?;
        let b = position(to)?;
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        self.selected_ids = ordered[lo..=hi].iter().copied().collect();
        self.last_selected_id = Some(to);
        self.mode = SelectionMode::Range;
        Ok(self.selected_ids.len())
    }

    pub fn select_all(&mut self, ordered: &[Uuid]) {
        self.selected_ids = ordered.iter().copied().collect();
        self.last_selected_id = ordered.last().copied();
        self.mode = SelectionMode::Multiple;
        self.settle();
    }

    pub fn deselect_task(&mut self, id: Uuid) -> bool {
        let removed = self.selected_ids.remove(&id);
        if removed {
            if self.last_selected_id == Some(id) {
                self.last_selected_id = None;
            }
            self.settle();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.selected_ids.clear();
        self.settle();
    }

    /// Drop ids that are not in `ordered`. Returns how many were dropped.
    pub fn retain_existing(&mut self, ordered: &[Uuid]) -> usize {
        let existing: HashSet<&Uuid> = ordered.iter().collect();
        let before = self.selected_ids.len();
        self.selected_ids.retain(|id| existing.contains(id));
        if self
            .last_selected_id
            .is_some_and(|id| !existing.contains(&id))
        {
            self.last_selected_id = None;
        }
        self.settle();
        before - self.selected_ids.len()
    }

    /// Replace the whole selection, as a committed drag does.
    fn replace(&mut self, ids: HashSet<Uuid>, last: Option<Uuid>, mode: SelectionMode) {
        self.selected_ids = ids;
        self.last_selected_id = last;
        self.mode = mode;
        self.settle();
    }

    fn settle(&mut self) {
        if self.selected_ids.is_empty() {
            self.last_selected_id = None;
            self.mode = SelectionMode::Single;
        }
    }
}

/// Rubber-band selection in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSelectionState {
    /// False until the pointer has moved past the threshold.
    pub is_dragging: bool,
    pub anchor_y: f32,
    pub current_y: f32,
    pub anchor_task_id: Uuid,
    /// Task rows under the band, in display order.
    pub preview_ids: Vec<Uuid>,
    /// Add to the existing selection instead of replacing it.
    pub additive: bool,
}

impl DragSelectionState {
    pub fn band(&self) -> (f32, f32) {
        (
            self.anchor_y.min(self.current_y),
            self.anchor_y.max(self.current_y),
        )
    }
}

#[derive(Debug, Clone)]
pub struct SelectionEngine {
    state: SelectionState,
    drag: Option<DragSelectionState>,
    editing_task: Option<Uuid>,
    drag_threshold: f32,
    guard: Timer,
    guard_delay: Duration,
}

impl Default for SelectionEngine {
    fn default() -> Self {
        Self::new(DRAG_THRESHOLD, POST_DRAG_GUARD)
    }
}

impl SelectionEngine {
    pub fn new(drag_threshold: f32, guard_delay: Duration) -> Self {
        Self {
            state: SelectionState::default(),
            drag: None,
            editing_task: None,
            drag_threshold,
            guard: Timer::new(),
            guard_delay,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SelectionState {
        &mut self.state
    }

    pub fn drag(&self) -> Option<&DragSelectionState> {
        self.drag.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.as_ref().is_some_and(|drag| drag.is_dragging)
    }

    /// Reports `Drag` while a rubber band is active.
    pub fn mode(&self) -> SelectionMode {
        if self.is_dragging() {
            SelectionMode::Drag
        } else {
            self.state.mode()
        }
    }

    /// A task whose name is being edited does not start drags.
    pub fn set_editing_task(&mut self, task: Option<Uuid>) {
        self.editing_task = task;
    }

    pub fn editing_task(&self) -> Option<Uuid> {
        self.editing_task
    }

    /// Whether clicks are currently swallowed after a drag.
    pub fn is_guarded(&self) -> bool {
        self.guard.is_pending()
    }

    pub fn pointer_down(&mut self, task: Uuid, y: f32, modifiers: Modifiers) -> bool {
        if self.editing_task == Some(task) {
            return false;
        }
        self.drag = Some(DragSelectionState {
            is_dragging: false,
            anchor_y: y,
            current_y: y,
            anchor_task_id: task,
            preview_ids: Vec::new(),
            additive: modifiers.ctrl,
        });
        true
    }

    /// Returns whether the preview changed.
    pub fn pointer_move(&mut self, y: f32, rows: &RowLayout) -> bool {
        let threshold = self.drag_threshold;
        let Some(drag) = self.drag.as_mut() else {
            return false;
        };
        drag.current_y = y;
        if !drag.is_dragging {
            if (y - drag.anchor_y).abs() <= threshold {
                return false;
            }
            drag.is_dragging = true;
            tracing::debug!(anchor = %drag.anchor_task_id, "drag selection started");
        }
        let (lo, hi) = drag.band();
        let preview = rows.tasks_in_band(lo, hi);
        if preview == drag.preview_ids {
            return false;
        }
        drag.preview_ids = preview;
        true
    }

    /// Finish the pointer gesture. `target` is the task row under the pointer.
    ///
    /// A gesture that never passed the threshold is treated as a click on the
    /// row where it started.
    pub fn pointer_up(
        &mut self,
        target: Option<Uuid>,
        modifiers: Modifiers,
        ordered: &[Uuid],
        now: Duration,
    ) -> Result<bool> {
        let Some(drag) = self.drag.take() else {
            return Ok(false);
        };
        if !drag.is_dragging {
            self.apply_click(drag.anchor_task_id, modifiers, ordered)?;
            return Ok(true);
        }

        let mut ids: HashSet<Uuid> = drag.preview_ids.iter().copied().collect();
        if drag.additive {
            ids.extend(self.state.selected_ids.iter().copied());
        }
        let last = target
            .filter(|id| ids.contains(id))
            .or_else(|| drag.preview_ids.last().copied());
        let count = ids.len();
        self.state.replace(ids, last, SelectionMode::Multiple);
        self.guard.arm(now, self.guard_delay);
        tracing::debug!(count, additive = drag.additive, "drag selection committed");
        Ok(true)
    }

    /// Click on a task row. Swallowed right after a drag.
    pub fn click(
        &mut self,
        task: Uuid,
        modifiers: Modifiers,
        ordered: &[Uuid],
        now: Duration,
    ) -> Result<bool> {
        self.guard.fire_if_due(now);
        if self.guard.is_pending() {
            tracing::debug!(%task, "click suppressed after drag");
            return Ok(false);
        }
        self.apply_click(task, modifiers, ordered)?;
        Ok(true)
    }

    fn apply_click(&mut self, task: Uuid, modifiers: Modifiers, ordered: &[Uuid]) -> Result<()> {
        if modifiers.ctrl {
            self.state.toggle_task(task, SelectionMode::Multiple);
        } else if let (true, Some(last)) = (modifiers.shift, self.state.last_selected_id()) {
            self.state.select_range(last, task, ordered)?;
        } else {
            self.state.toggle_task(task, SelectionMode::Single);
        }
        Ok(())
    }

    pub fn cancel_drag(&mut self) -> bool {
        self.drag.take().is_some()
    }

    /// Cancel an active drag, or clear the selection if there is none.
    pub fn escape(&mut self) -> bool {
        if self.cancel_drag() {
            return true;
        }
        let had = self.state.is_active();
        self.state.clear();
        had
    }

    pub fn tick(&mut self, now: Duration) -> bool {
        self.guard.fire_if_due(now)
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.guard.deadline()
    }

    pub fn dispose(&mut self) {
        self.guard.cancel();
        self.drag = None;
    }
}
