//! Keeps the task list, header and body panes scrolled together.
//!
//! A native scroll on one pane is debounced; when the debounce fires the
//! source offset is copied to every other pane along the axes they share.
//! Writing an offset makes the written pane report a scroll of its own, so
//! for a short settle window after a write incoming scroll notifications are
//! ignored.

use std::time::Duration;

use super::timer::{earliest, Timer};
use crate::error::{Result, TimelineError};

pub const SCROLL_DEBOUNCE: Duration = Duration::from_millis(16);
pub const SCROLL_SETTLE: Duration = Duration::from_millis(32);
pub const SYNC_THRESHOLD: f32 = 1.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollOffset {
    pub left: f32,
    pub top: f32,
}

impl ScrollOffset {
    pub fn new(left: f32, top: f32) -> Self {
        Self { left, top }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PaneSize {
    pub width: f32,
    pub height: f32,
}

/// What the synchronizer needs from a platform scroll container.
pub trait ScrollPane {
    fn scroll_offset(&self) -> ScrollOffset;
    fn set_scroll_offset(&mut self, offset: ScrollOffset);
    fn viewport_size(&self) -> PaneSize;
}

/// Handle returned by [`ScrollSynchronizer::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PaneId(usize);

impl PaneId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Axes along which a pane follows the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAxis {
    Horizontal,
    Vertical,
    Both,
}

impl SyncAxis {
    fn horizontal(self) -> bool {
        matches!(self, SyncAxis::Horizontal | SyncAxis::Both)
    }

    fn vertical(self) -> bool {
        matches!(self, SyncAxis::Vertical | SyncAxis::Both)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollState {
    pub scroll_left: f32,
    pub scroll_top: f32,
    /// Set while our own writes are settling.
    pub is_syncing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncConfig {
    pub debounce: Duration,
    pub settle: Duration,
    pub threshold: f32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce: SCROLL_DEBOUNCE,
            settle: SCROLL_SETTLE,
            threshold: SYNC_THRESHOLD,
        }
    }
}

struct Slot {
    pane: Box<dyn ScrollPane>,
    axis: SyncAxis,
}

pub struct ScrollSynchronizer {
    panes: Vec<Option<Slot>>,
    state: ScrollState,
    config: SyncConfig,
    debounce: Timer,
    settle: Timer,
    pending: Option<PaneId>,
}

impl std::fmt::Debug for ScrollSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollSynchronizer")
            .field("panes", &self.panes.iter().flatten().count())
            .field("state", &self.state)
            .field("pending", &self.pending)
            .finish()
    }
}

impl Default for ScrollSynchronizer {
    fn default() -> Self {
        Self::new(SyncConfig::default())
    }
}

impl ScrollSynchronizer {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            panes: Vec::new(),
            state: ScrollState::default(),
            config,
            debounce: Timer::new(),
            settle: Timer::new(),
            pending: None,
        }
    }

    pub fn register(&mut self, pane: Box<dyn ScrollPane>, axis: SyncAxis) -> PaneId {
        self.panes.push(Some(Slot { pane, axis }));
        PaneId(self.panes.len() - 1)
    }

    pub fn unregister(&mut self, id: PaneId) -> Result<()> {
        match self.panes.get_mut(id.0) {
            Some(slot @ Some(_)) => {
                *slot = None;
                if self.pending == Some(id) {
                    self.pending = None;
                    self.debounce.cancel();
                }
                Ok(())
            }
            _ => Err(TimelineError::UnknownPane(id.0)),
        }
    }

    pub fn state(&self) -> ScrollState {
        self.state
    }

    pub fn is_syncing(&self) -> bool {
        self.state.is_syncing
    }

    pub fn pane(&self, id: PaneId) -> Option<&dyn ScrollPane> {
        self.slot(id).map(|slot| slot.pane.as_ref())
    }

    fn slot(&self, id: PaneId) -> Option<&Slot> {
        self.panes.get(id.0).and_then(Option::as_ref)
    }

    /// A pane reported a native scroll. Ignored while our own writes settle.
    pub fn on_scroll(&mut self, source: PaneId, now: Duration) -> Result<()> {
        if self.slot(source).is_none() {
            return Err(TimelineError::UnknownPane(source.0));
        }
        if self.state.is_syncing {
            tracing::trace!(pane = source.0, "scroll ignored while syncing");
            return Ok(());
        }
        self.pending = Some(source);
        self.debounce.arm(now, self.config.debounce);
        Ok(())
    }

    /// Fire due timers. Returns the number of pane writes performed.
    pub fn tick(&mut self, now: Duration) -> usize {
        if self.settle.fire_if_due(now) {
            self.state.is_syncing = false;
        }
        if !self.debounce.fire_if_due(now) {
            return 0;
        }
        let Some(source) = self.pending.take() else {
            return 0;
        };
        let writes = self.sync_from(source);
        if writes > 0 {
            self.engage(now);
        }
        writes
    }

    fn sync_from(&mut self, source: PaneId) -> usize {
        let Some(slot) = self.slot(source) else {
            return 0;
        };
        let axis = slot.axis;
        let target = slot.pane.scroll_offset();
        if axis.horizontal() {
            self.state.scroll_left = target.left;
        }
        if axis.vertical() {
            self.state.scroll_top = target.top;
        }

        let threshold = self.config.threshold;
        let mut writes = 0;
        for (index, slot) in self.panes.iter_mut().enumerate() {
            let Some(slot) = slot else { continue };
            if index == source.0 {
                continue;
            }
            let current = slot.pane.scroll_offset();
            let mut next = current;
            if axis.horizontal()
                && slot.axis.horizontal()
                && (current.left - target.left).abs() > threshold
            {
                next.left = target.left;
            }
            if axis.vertical()
                && slot.axis.vertical()
                && (current.top - target.top).abs() > threshold
            {
                next.top = target.top;
            }
            if next != current {
                slot.pane.set_scroll_offset(next);
                writes += 1;
            }
        }
        if writes > 0 {
            tracing::trace!(source = source.0, writes, "scroll synced");
        }
        writes
    }

    /// Move every pane to `offset` right away, skipping the debounce.
    pub fn scroll_to(&mut self, offset: ScrollOffset, now: Duration) -> usize {
        self.debounce.cancel();
        self.pending = None;
        self.state.scroll_left = offset.left;
        self.state.scroll_top = offset.top;

        let mut writes = 0;
        for slot in self.panes.iter_mut().flatten() {
            let mut next = slot.pane.scroll_offset();
            if slot.axis.horizontal() {
                next.left = offset.left;
            }
            if slot.axis.vertical() {
                next.top = offset.top;
            }
            slot.pane.set_scroll_offset(next);
            writes += 1;
        }
        if writes > 0 {
            self.engage(now);
        }
        writes
    }

    fn engage(&mut self, now: Duration) {
        self.state.is_syncing = true;
        self.settle.arm(now, self.config.settle);
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        earliest([self.debounce.deadline(), self.settle.deadline()])
    }

    pub fn dispose(&mut self) {
        self.debounce.cancel();
        self.settle.cancel();
        self.pending = None;
        self.state.is_syncing = false;
    }
}
