//! One timeline view: owns every controller and the derived geometry.
//!
//! The renderer reads the geometry accessors every frame and forwards pointer,
//! keyboard and scroll input to the `handle_*` methods. Timers advance only in
//! [`TimelineEngine::tick`]; the renderer should call it every frame and
//! schedule a repaint for [`TimelineEngine::repaint_after`].

use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveDate;
use uuid::Uuid;

use super::grid::{self, GridCell, HolidayCalendar, MonthGroup, TodayIndicator};
use super::layout::{self, BarDrag, BarHandle, Connector, RowLayout, TaskPosition};
use super::mapper::{self, CalendarDay, ViewUnit};
use super::scroll_sync::{PaneId, PaneSize, ScrollOffset, ScrollPane, ScrollSynchronizer, SyncAxis};
use super::selection::{DragSelectionState, Modifiers, SelectionEngine, SelectionMode, SelectionState};
use super::timer::{earliest, Clock, SystemClock};
use super::virtualizer::{self, VisibleRange};
use super::zoom::{self, Dimensions, ZoomController, ZoomLevel};
use crate::config::TimelineSettings;
use crate::error::TimelineError;
use crate::model::{Project, Task};

/// Width of the grab zone at either end of a bar.
pub const HANDLE_WIDTH: f32 = 8.0;

/// Called with `(task, new_start, new_due)` when a bar drag is committed.
pub type DatesChangedFn = Box<dyn FnMut(Uuid, NaiveDate, NaiveDate)>;

/// Pointer position in body content coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerEvent {
    pub x: f32,
    pub y: f32,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// What the pointer is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Bar { task: Uuid, handle: BarHandle },
    Row(Uuid),
    Empty,
}

/// Scroll containers of a timeline view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneRole {
    /// Task names on the left; follows vertically.
    TaskList,
    /// Date header; follows horizontally.
    Header,
    /// The grid itself; scrolls both ways and defines the viewport.
    Body,
}

impl PaneRole {
    pub fn axis(self) -> SyncAxis {
        match self {
            PaneRole::TaskList => SyncAxis::Vertical,
            PaneRole::Header => SyncAxis::Horizontal,
            PaneRole::Body => SyncAxis::Both,
        }
    }
}

pub struct TimelineEngine<C: Clock = SystemClock> {
    clock: C,
    settings: TimelineSettings,
    unit: ViewUnit,
    zoom: ZoomController,
    dims: Dimensions,
    today: NaiveDate,
    range_start: NaiveDate,
    range_end: NaiveDate,
    origin: NaiveDate,
    dates: Vec<NaiveDate>,
    holidays: HolidayCalendar,
    cells: Vec<GridCell>,
    projects: Vec<Project>,
    tasks: Vec<Task>,
    task_index: HashMap<Uuid, usize>,
    rows: RowLayout,
    selection: SelectionEngine,
    scroll: ScrollSynchronizer,
    body_pane: Option<PaneId>,
    bar_drag: Option<BarDrag>,
    bar_preview: Option<(NaiveDate, NaiveDate)>,
    pointer_captured: bool,
    on_dates_changed: Option<DatesChangedFn>,
    mounted: bool,
}

impl TimelineEngine<SystemClock> {
    pub fn with_system_clock(settings: TimelineSettings) -> Self {
        Self::new(settings, SystemClock::new())
    }
}

impl<C: Clock> TimelineEngine<C> {
    pub fn new(settings: TimelineSettings, clock: C) -> Self {
        let today = clock.today();
        let unit = settings.default_view_unit;
        let zoom = ZoomController::new(settings.default_zoom, settings.zoom_transition());
        let mut engine = Self {
            dims: zoom::dimensions_for(zoom.level(), unit),
            zoom,
            unit,
            today,
            range_start: today,
            range_end: today,
            origin: today,
            dates: Vec::new(),
            holidays: settings.holiday_calendar(),
            cells: Vec::new(),
            projects: Vec::new(),
            tasks: Vec::new(),
            task_index: HashMap::new(),
            rows: RowLayout::default(),
            selection: SelectionEngine::new(settings.drag_threshold, settings.post_drag_guard()),
            scroll: ScrollSynchronizer::new(settings.sync_config()),
            body_pane: None,
            bar_drag: None,
            bar_preview: None,
            pointer_captured: false,
            on_dates_changed: None,
            mounted: true,
            settings,
            clock,
        };
        engine.rebuild_range();
        engine
    }

    // ── Collaborator data ───────────────────────────────────────

    /// Replace the projects and tasks shown. Selected ids that no longer
    /// exist are dropped.
    pub fn set_data(&mut self, projects: Vec<Project>, tasks: Vec<Task>) {
        self.task_index = tasks.iter().enumerate().map(|(i, t)| (t.id, i)).collect();
        self.projects = projects;
        self.tasks = tasks;
        self.rebuild_layout();

        let ids: Vec<Uuid> = self.tasks.iter().map(|t| t.id).collect();
        let pruned = self.selection.state_mut().retain_existing(&ids);
        if pruned > 0 {
            let err = TimelineError::StaleSelection { count: pruned };
            tracing::warn!(%err, "selection pruned");
        }
        if let Some(drag) = self.bar_drag {
            if !self.task_index.contains_key(&drag.task_id) {
                self.bar_drag = None;
                self.bar_preview = None;
                self.pointer_captured = false;
            }
        }
    }

    pub fn set_on_task_dates_changed(
        &mut self,
        callback: impl FnMut(Uuid, NaiveDate, NaiveDate) + 'static,
    ) {
        self.on_dates_changed = Some(Box::new(callback));
    }

    pub fn set_holidays(&mut self, holidays: HolidayCalendar) {
        self.holidays = holidays;
        self.rebuild_layout();
    }

    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.task_index.get(&id).map(|&i| &self.tasks[i])
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, id: Uuid) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    // ── Rendering surface ───────────────────────────────────────

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn rows(&self) -> &RowLayout {
        &self.rows
    }

    /// Rows to build for the current viewport.
    pub fn visible_rows(&self) -> VisibleRange {
        let offset = self.scroll_offset();
        let viewport = self.viewport();
        virtualizer::visible_rows_in(
            self.rows.rows(),
            offset.top,
            viewport.height,
            self.settings.row_buffer,
        )
    }

    /// Grid columns to build for the current viewport.
    pub fn visible_columns(&self) -> VisibleRange {
        let offset = self.scroll_offset();
        let viewport = self.viewport();
        virtualizer::visible_columns(
            offset.left,
            viewport.width,
            self.column_width(),
            self.cells.len(),
            self.settings.column_buffer,
        )
    }

    /// Bar rectangle of a visible task, reflecting an in-flight bar drag.
    pub fn task_position(&self, id: Uuid) -> Option<TaskPosition> {
        let row = self.rows.row_for(id).filter(|row| row.is_task())?;
        let task = self.task(id)?;
        let (start, due) = match (self.bar_drag, self.bar_preview) {
            (Some(drag), Some(dates)) if drag.task_id == id => dates,
            _ => (task.start_date, task.due_date),
        };
        let mut position = layout::task_position(
            start,
            due,
            self.origin,
            self.dims.cell_width,
            self.unit,
            0,
            row.height,
        );
        position.top = row.y;
        Some(position)
    }

    /// Parent-to-subtask connectors for task rows inside the row window.
    /// Parents scrolled out of the window still anchor their lines.
    pub fn connectors(&self) -> Vec<Connector> {
        let rows = self.rows.rows();
        self.visible_rows()
            .enumerate(rows)
            .filter(|(_, row)| row.is_task())
            .filter_map(|(_, row)| {
                let parent_id = self.task(row.id)?.parent_id?;
                let parent = self.task_position(parent_id)?;
                let child = self.task_position(row.id)?;
                Some(Connector::between(
                    parent_id,
                    &parent,
                    row.id,
                    &child,
                    self.dims.zoom_ratio,
                ))
            })
            .collect()
    }

    pub fn selection(&self) -> &SelectionState {
        self.selection.state()
    }

    pub fn selection_mode(&self) -> SelectionMode {
        self.selection.mode()
    }

    pub fn drag_selection(&self) -> Option<&DragSelectionState> {
        self.selection.drag()
    }

    /// The bar being dragged and its previewed dates.
    pub fn bar_drag(&self) -> Option<(&BarDrag, Option<(NaiveDate, NaiveDate)>)> {
        self.bar_drag.as_ref().map(|drag| (drag, self.bar_preview))
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    pub fn column_width(&self) -> f32 {
        self.dims.column_width(self.unit)
    }

    pub fn month_groups(&self) -> Vec<MonthGroup> {
        grid::month_groups(&self.dates, self.column_width())
    }

    pub fn today_indicator(&self) -> TodayIndicator {
        grid::today_indicator(
            self.today,
            self.origin,
            self.dims.cell_width,
            self.unit,
            self.dims.zoom_ratio,
        )
    }

    pub fn is_zooming(&self) -> bool {
        self.zoom.is_zooming()
    }

    pub fn zoom(&self) -> ZoomLevel {
        self.zoom.level()
    }

    pub fn unit(&self) -> ViewUnit {
        self.unit
    }

    pub fn origin(&self) -> NaiveDate {
        self.origin
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        (self.range_start, self.range_end)
    }

    pub fn holidays(&self) -> &HolidayCalendar {
        &self.holidays
    }

    /// Full scrollable size of the body.
    pub fn content_size(&self) -> PaneSize {
        PaneSize {
            width: self.cells.len() as f32 * self.column_width(),
            height: self.rows.total_height(),
        }
    }

    pub fn viewport(&self) -> PaneSize {
        self.body().map(|pane| pane.viewport_size()).unwrap_or_default()
    }

    pub fn scroll_offset(&self) -> ScrollOffset {
        match self.body() {
            Some(pane) => pane.scroll_offset(),
            None => {
                let state = self.scroll.state();
                ScrollOffset::new(state.scroll_left, state.scroll_top)
            }
        }
    }

    fn body(&self) -> Option<&dyn ScrollPane> {
        self.body_pane.and_then(|id| self.scroll.pane(id))
    }

    /// What lies under a point in body content coordinates.
    pub fn hit_test(&self, x: f32, y: f32) -> PointerTarget {
        let Some(task) = self.rows.task_at_y(y) else {
            return PointerTarget::Empty;
        };
        let handle = self
            .task_position(task)
            .filter(|pos| y >= pos.top && y <= pos.bottom())
            .and_then(|pos| pos.handle_at(x, HANDLE_WIDTH));
        match handle {
            Some(handle) => PointerTarget::Bar { task, handle },
            None => PointerTarget::Row(task),
        }
    }

    // ── Input surface ───────────────────────────────────────────

    pub fn register_pane(&mut self, pane: Box<dyn ScrollPane>, role: PaneRole) -> PaneId {
        let id = self.scroll.register(pane, role.axis());
        if role == PaneRole::Body {
            self.body_pane = Some(id);
        }
        id
    }

    pub fn handle_pointer_down(&mut self, event: PointerEvent, target: PointerTarget) -> bool {
        if !self.mounted {
            return false;
        }
        match target {
            PointerTarget::Bar { task, handle } => {
                if self.selection.editing_task() == Some(task) {
                    return false;
                }
                let Some(found) = self.task(task) else {
                    tracing::warn!(err = %TimelineError::UnknownTask(task), "bar drag ignored");
                    return false;
                };
                self.bar_drag = Some(BarDrag::new(found, handle, event.x));
                self.bar_preview = None;
                self.pointer_captured = true;
                true
            }
            PointerTarget::Row(task) => {
                if !self.task_index.contains_key(&task) {
                    tracing::warn!(err = %TimelineError::UnknownTask(task), "pointer down ignored");
                    return false;
                }
                let started = self.selection.pointer_down(task, event.y, event.modifiers);
                self.pointer_captured = started;
                started
            }
            PointerTarget::Empty => false,
        }
    }

    /// Returns whether anything visible changed.
    pub fn handle_pointer_move(&mut self, event: PointerEvent) -> bool {
        if !self.pointer_captured {
            return false;
        }
        if let Some(drag) = self.bar_drag {
            let dates = drag.dates_at(event.x, self.dims.cell_width, self.unit);
            let changed = self.bar_preview != Some(dates);
            self.bar_preview = Some(dates);
            return changed;
        }
        self.selection.pointer_move(event.y, &self.rows)
    }

    pub fn handle_pointer_up(&mut self, event: PointerEvent, target: PointerTarget) -> bool {
        if !self.pointer_captured {
            return false;
        }
        self.pointer_captured = false;

        if let Some(drag) = self.bar_drag.take() {
            self.bar_preview = None;
            if drag.is_noop(event.x, self.dims.cell_width, self.unit) {
                return self.handle_click(drag.task_id, event.modifiers);
            }
            let (start, due) = drag.dates_at(event.x, self.dims.cell_width, self.unit);
            self.commit_dates(drag.task_id, start, due);
            return true;
        }

        let under = match target {
            PointerTarget::Bar { task, .. } | PointerTarget::Row(task) => Some(task),
            PointerTarget::Empty => self.rows.task_at_y(event.y),
        };
        let now = self.clock.now();
        match self
            .selection
            .pointer_up(under, event.modifiers, self.rows.task_ids(), now)
        {
            Ok(changed) => changed,
            Err(err) => {
                tracing::warn!(%err, "selection unchanged");
                false
            }
        }
    }

    /// Click on a task outside the pointer-drag protocol (e.g. the task list).
    pub fn handle_click(&mut self, task: Uuid, modifiers: Modifiers) -> bool {
        if !self.mounted {
            return false;
        }
        if !self.task_index.contains_key(&task) {
            tracing::warn!(err = %TimelineError::UnknownTask(task), "click ignored");
            return false;
        }
        let now = self.clock.now();
        match self
            .selection
            .click(task, modifiers, self.rows.task_ids(), now)
        {
            Ok(changed) => changed,
            Err(err) => {
                tracing::warn!(%err, "selection unchanged");
                false
            }
        }
    }

    /// Cancel a drag in progress, otherwise clear the selection.
    pub fn handle_escape(&mut self) -> bool {
        if !self.mounted {
            return false;
        }
        self.pointer_captured = false;
        if self.bar_drag.take().is_some() {
            self.bar_preview = None;
            return true;
        }
        self.selection.escape()
    }

    pub fn handle_scroll(&mut self, pane: PaneId) -> bool {
        if !self.mounted {
            return false;
        }
        let now = self.clock.now();
        match self.scroll.on_scroll(pane, now) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(%err, "scroll notification ignored");
                false
            }
        }
    }

    pub fn select_all(&mut self) {
        if !self.mounted {
            return;
        }
        self.selection
            .state_mut()
            .select_all(self.rows.task_ids());
    }

    pub fn clear_selection(&mut self) {
        if !self.mounted {
            return;
        }
        self.selection.state_mut().clear();
    }

    pub fn set_editing_task(&mut self, task: Option<Uuid>) {
        self.selection.set_editing_task(task);
    }

    pub fn set_zoom(&mut self, zoom: i32) -> bool {
        if !self.mounted {
            return false;
        }
        let anchor = self.center_date();
        let changed = self.zoom.set(zoom, self.clock.now());
        self.after_zoom(changed, anchor)
    }

    pub fn zoom_in(&mut self) -> bool {
        if !self.mounted {
            return false;
        }
        let anchor = self.center_date();
        let changed = self.zoom.zoom_in(self.clock.now());
        self.after_zoom(changed, anchor)
    }

    pub fn zoom_out(&mut self) -> bool {
        if !self.mounted {
            return false;
        }
        let anchor = self.center_date();
        let changed = self.zoom.zoom_out(self.clock.now());
        self.after_zoom(changed, anchor)
    }

    pub fn reset_zoom(&mut self) -> bool {
        if !self.mounted {
            return false;
        }
        let anchor = self.center_date();
        let changed = self.zoom.reset(self.clock.now());
        self.after_zoom(changed, anchor)
    }

    /// Zoom so the whole date range fits the body viewport.
    pub fn fit_to_screen(&mut self) -> bool {
        if !self.mounted {
            return false;
        }
        let width = self.viewport().width;
        let now = self.clock.now();
        match self
            .zoom
            .fit_to_screen(width, self.dates.len(), self.unit, now)
        {
            Ok(changed) => {
                if changed {
                    self.rebuild_layout();
                }
                let top = self.scroll_offset().top;
                self.scroll.scroll_to(ScrollOffset::new(0.0, top), now);
                changed
            }
            Err(err) => {
                tracing::warn!(%err, "fit to screen skipped");
                false
            }
        }
    }

    pub fn set_view_unit(&mut self, unit: ViewUnit) -> bool {
        if !self.mounted {
            return false;
        }
        if unit == self.unit {
            return false;
        }
        let anchor = self.center_date();
        self.unit = unit;
        self.rebuild_range();
        tracing::debug!(unit = unit.label(), "view unit changed");
        if let Some(date) = anchor {
            self.scroll_to_date(date);
        }
        true
    }

    /// Center `date` horizontally in the body viewport.
    pub fn scroll_to_date(&mut self, date: impl CalendarDay) -> bool {
        if !self.mounted {
            return false;
        }
        let date = date.calendar_day();
        if date < self.range_start || date > self.range_end {
            tracing::debug!(%date, "scroll target outside the date range, clamping");
        }
        let viewport = self.viewport();
        let cell_width = self.dims.cell_width;
        let x = mapper::to_pixel(date, self.origin, cell_width, self.unit) + cell_width / 2.0
            - viewport.width / 2.0;
        let max_left = (self.content_size().width - viewport.width).max(0.0);
        let left = if x.is_finite() { x.clamp(0.0, max_left) } else { 0.0 };
        let top = self.scroll_offset().top;
        self.scroll
            .scroll_to(ScrollOffset::new(left, top), self.clock.now())
            > 0
    }

    pub fn scroll_to_today(&mut self) -> bool {
        if !self.mounted {
            return false;
        }
        self.scroll_to_date(self.today)
    }

    /// Fire due timers and pick up a calendar day change. Returns whether a
    /// repaint is needed.
    pub fn tick(&mut self) -> bool {
        if !self.mounted {
            return false;
        }
        let now = self.clock.now();
        let mut repaint = self.zoom.tick(now);
        repaint |= self.selection.tick(now);
        repaint |= self.scroll.tick(now) > 0;

        let today = self.clock.today();
        if today != self.today {
            tracing::info!(%today, "calendar day changed");
            self.today = today;
            self.rebuild_layout();
            repaint = true;
        }
        repaint
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        earliest([
            self.zoom.next_deadline(),
            self.selection.next_deadline(),
            self.scroll.next_deadline(),
        ])
    }

    /// Time until the next timer fires.
    pub fn repaint_after(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.next_deadline()
            .map(|deadline| deadline.saturating_sub(now))
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Cancel every timer and drop transient pointer state.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.zoom.dispose();
        self.selection.dispose();
        self.scroll.dispose();
        self.bar_drag = None;
        self.bar_preview = None;
        self.pointer_captured = false;
        self.mounted = false;
        tracing::debug!("timeline unmounted");
    }

    // ── Internals ───────────────────────────────────────────────

    fn commit_dates(&mut self, id: Uuid, start: NaiveDate, due: NaiveDate) {
        if let Some(&i) = self.task_index.get(&id) {
            let task = &mut self.tasks[i];
            task.start_date = start;
            task.due_date = due;
        }
        tracing::debug!(task = %id, %start, %due, "task dates changed");
        if let Some(callback) = self.on_dates_changed.as_mut() {
            callback(id, start, due);
        }
    }

    fn center_date(&self) -> Option<NaiveDate> {
        let viewport = self.viewport();
        if !(viewport.width > 0.0) {
            return None;
        }
        let x = self.scroll_offset().left + viewport.width / 2.0;
        Some(mapper::to_date(x, self.origin, self.dims.cell_width, self.unit))
    }

    fn after_zoom(&mut self, changed: bool, anchor: Option<NaiveDate>) -> bool {
        if changed {
            self.rebuild_layout();
            if let Some(date) = anchor {
                self.scroll_to_date(date);
            }
        }
        changed
    }

    fn rebuild_range(&mut self) {
        let past = self.settings.past_days();
        let days = i64::from(self.settings.date_range_days.max(1));
        self.range_start = mapper::shift_days(self.today, -past);
        self.range_end = mapper::shift_days(self.range_start, days - 1);
        self.origin = mapper::snap_to_unit(self.range_start, self.unit);
        self.dates = grid::visible_dates(self.range_start, self.range_end, self.unit);
        self.rebuild_layout();
    }

    fn rebuild_layout(&mut self) {
        self.dims = zoom::dimensions_for(self.zoom.level(), self.unit);
        self.rows = RowLayout::build(&self.projects, &self.tasks, self.dims.row_heights);
        self.cells = grid::generate_cells(
            &self.dates,
            self.origin,
            self.dims.cell_width,
            self.rows.total_height(),
            self.unit,
            self.today,
            &self.holidays,
        );
        tracing::trace!(
            cells = self.cells.len(),
            rows = self.rows.len(),
            zoom = self.zoom.level().get(),
            "layout rebuilt"
        );
    }
}

impl<C: Clock> Drop for TimelineEngine<C> {
    fn drop(&mut self) {
        self.unmount();
    }
}
