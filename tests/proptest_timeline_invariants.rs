//! Property-based invariant tests for the timeline engine pieces.
//!
//! 1. Date to pixel mapping is monotonic in both view units.
//! 2. Pixel to date recovers every day-aligned date.
//! 3. Zoom clamping lands in range and is idempotent.
//! 4. Selection is active exactly when the set is non-empty.
//! 5. Range selection covers the inclusive span between two rows.
//! 6. Windowing covers every visible item and stays bounded.
//! 7. One sync pass converges every pane with at most one write each.
//! 8. Worked scenarios from the design notes.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use chrono::NaiveDate;
use proptest::prelude::*;
use uuid::Uuid;

use todo_timeline::model::{Project, Task};
use todo_timeline::timeline::layout::RowLayout;
use todo_timeline::timeline::mapper::{self, ViewUnit};
use todo_timeline::timeline::scroll_sync::{ScrollSynchronizer, SyncAxis, SyncConfig};
use todo_timeline::timeline::selection::{SelectionEngine, DRAG_THRESHOLD, POST_DRAG_GUARD};
use todo_timeline::timeline::virtualizer;
use todo_timeline::timeline::zoom::{self, ZoomLevel};
use todo_timeline::timeline::{Modifiers, ScrollOffset, ScrollPane, SelectionMode, SelectionState};
use todo_timeline::timeline::PaneSize;

// ── Helpers ─────────────────────────────────────────────────────────────

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn base() -> NaiveDate {
    d(2024, 1, 1)
}

fn date_at(offset: i64) -> NaiveDate {
    mapper::shift_days(base(), offset)
}

fn any_unit() -> impl Strategy<Value = ViewUnit> {
    prop_oneof![Just(ViewUnit::Day), Just(ViewUnit::Week)]
}

fn ids(n: usize) -> Vec<Uuid> {
    (0..n).map(|_| Uuid::new_v4()).collect()
}

#[derive(Debug, Clone)]
enum SelectionOp {
    Select(usize, bool),
    Toggle(usize, bool),
    Range(usize, usize),
    All,
    Deselect(usize),
    Clear,
}

fn selection_op(n: usize) -> impl Strategy<Value = SelectionOp> {
    prop_oneof![
        (0..n, any::<bool>()).prop_map(|(i, multi)| SelectionOp::Select(i, multi)),
        (0..n, any::<bool>()).prop_map(|(i, multi)| SelectionOp::Toggle(i, multi)),
        (0..n, 0..n).prop_map(|(a, b)| SelectionOp::Range(a, b)),
        Just(SelectionOp::All),
        (0..n).prop_map(SelectionOp::Deselect),
        Just(SelectionOp::Clear),
    ]
}

fn mode(multi: bool) -> SelectionMode {
    if multi {
        SelectionMode::Multiple
    } else {
        SelectionMode::Single
    }
}

#[derive(Default)]
struct PaneInner {
    offset: ScrollOffset,
    writes: usize,
}

#[derive(Clone, Default)]
struct RecordingPane(Rc<RefCell<PaneInner>>);

impl RecordingPane {
    fn at(offset: ScrollOffset) -> Self {
        let pane = RecordingPane::default();
        pane.0.borrow_mut().offset = offset;
        pane
    }

    fn user_scroll(&self, offset: ScrollOffset) {
        self.0.borrow_mut().offset = offset;
    }

    fn offset(&self) -> ScrollOffset {
        self.0.borrow().offset
    }

    fn writes(&self) -> usize {
        self.0.borrow().writes
    }
}

impl ScrollPane for RecordingPane {
    fn scroll_offset(&self) -> ScrollOffset {
        self.offset()
    }

    fn set_scroll_offset(&mut self, offset: ScrollOffset) {
        let mut inner = self.0.borrow_mut();
        inner.offset = offset;
        inner.writes += 1;
    }

    fn viewport_size(&self) -> PaneSize {
        PaneSize {
            width: 800.0,
            height: 600.0,
        }
    }
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Date to pixel is monotonic
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn to_pixel_is_monotonic(
        a in -2000i64..2000,
        b in -2000i64..2000,
        origin in -400i64..400,
        cell_width in 1.0f32..100.0,
        unit in any_unit(),
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let origin = date_at(origin);
        let x_lo = mapper::to_pixel(date_at(lo), origin, cell_width, unit);
        let x_hi = mapper::to_pixel(date_at(hi), origin, cell_width, unit);
        prop_assert!(x_lo <= x_hi, "{} -> {} but {} -> {}", lo, x_lo, hi, x_hi);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Pixel to date recovers aligned dates
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn to_date_inverts_to_pixel(
        offset in -2000i64..2000,
        origin in -400i64..400,
        cell_width in 1.0f32..100.0,
        unit in any_unit(),
    ) {
        let origin = date_at(origin);
        let date = date_at(offset);
        let x = mapper::to_pixel(date, origin, cell_width, unit);
        prop_assert_eq!(mapper::to_date(x, origin, cell_width, unit), date);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Zoom clamp
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn zoom_clamp_is_in_range_and_idempotent(z in any::<i32>()) {
        let level = zoom::clamp(z);
        prop_assert!((zoom::MIN_ZOOM..=zoom::MAX_ZOOM).contains(&level.get()));
        prop_assert_eq!(zoom::clamp(level.get()), level);
        if (zoom::MIN_ZOOM..=zoom::MAX_ZOOM).contains(&z) {
            prop_assert_eq!(level.get(), z);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Selection activity follows the set
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn selection_active_iff_non_empty(ops in proptest::collection::vec(selection_op(6), 0..40)) {
        let ordered = ids(6);
        let mut state = SelectionState::default();
        for op in ops {
            match op {
                SelectionOp::Select(i, multi) => state.select_task(ordered[i], mode(multi)),
                SelectionOp::Toggle(i, multi) => state.toggle_task(ordered[i], mode(multi)),
                SelectionOp::Range(a, b) => {
                    state.select_range(ordered[a], ordered[b], &ordered).unwrap();
                }
                SelectionOp::All => state.select_all(&ordered),
                SelectionOp::Deselect(i) => {
                    state.deselect_task(ordered[i]);
                }
                SelectionOp::Clear => state.clear(),
            }
            prop_assert_eq!(state.is_active(), !state.selected_ids().is_empty());
            prop_assert_eq!(state.is_empty(), state.len() == 0);
            if state.is_empty() {
                prop_assert_eq!(state.mode(), SelectionMode::Single);
                prop_assert_eq!(state.last_selected_id(), None);
            }
            prop_assert!(state.selected_ids().iter().all(|id| ordered.contains(id)));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Range selection size
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn range_selection_is_inclusive_span(n in 1usize..30, a in 0usize..30, b in 0usize..30) {
        let ordered = ids(n);
        let (a, b) = (a % n, b % n);
        let mut state = SelectionState::default();
        let count = state.select_range(ordered[a], ordered[b], &ordered).unwrap();
        prop_assert_eq!(count, a.abs_diff(b) + 1);
        prop_assert_eq!(state.len(), count);
        prop_assert_eq!(state.last_selected_id(), Some(ordered[b]));
        prop_assert_eq!(state.mode(), SelectionMode::Range);
        let (lo, hi) = (a.min(b), a.max(b));
        for (i, id) in ordered.iter().enumerate() {
            prop_assert_eq!(state.is_selected(*id), (lo..=hi).contains(&i));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Windowing coverage and bound
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn visible_range_covers_viewport(
        scroll in 0u32..20_000,
        viewport in 1u32..2_000,
        size in 1u32..100,
        total in 1usize..500,
        buffer in 0usize..20,
    ) {
        let range = virtualizer::visible_range(
            scroll as f32,
            viewport as f32,
            size as f32,
            total,
            buffer,
        );
        for i in 0..total {
            let top = i as u32 * size;
            let intersects = top < scroll + viewport && top + size > scroll;
            if intersects {
                prop_assert!(range.contains(i), "item {} visible but outside {:?}", i, range);
            }
        }
        prop_assert!(range.end_index < total);
        prop_assert!(range.len() <= range.visible_count + 2 * buffer.max(1));
    }

    #[test]
    fn visible_rows_cover_viewport(
        heights in proptest::collection::vec(1u32..80, 1..200),
        scroll in 0u32..8_000,
        viewport in 1u32..1_500,
        buffer in 0usize..10,
    ) {
        let mut rows = Vec::with_capacity(heights.len());
        let mut y = 0u32;
        for h in &heights {
            rows.push((y as f32, *h as f32));
            y += h;
        }
        let range = virtualizer::visible_rows_in(&rows, scroll as f32, viewport as f32, buffer);
        let mut top = 0u32;
        for (i, h) in heights.iter().enumerate() {
            if top < scroll + viewport && top + h > scroll {
                prop_assert!(range.contains(i), "row {} visible but outside {:?}", i, range);
            }
            top += h;
        }
        prop_assert!(range.end_index < rows.len());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 7. Scroll sync convergence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn one_sync_pass_converges(
        starts in proptest::collection::vec((0u32..5_000, 0u32..5_000), 2..6),
        source in 0usize..6,
        target in (0u32..5_000, 0u32..5_000),
    ) {
        let source = source % starts.len();
        let config = SyncConfig::default();
        let mut sync = ScrollSynchronizer::new(config);
        let panes: Vec<RecordingPane> = starts
            .iter()
            .map(|&(l, t)| RecordingPane::at(ScrollOffset::new(l as f32, t as f32)))
            .collect();
        let handles: Vec<_> = panes
            .iter()
            .map(|pane| sync.register(Box::new(pane.clone()), SyncAxis::Both))
            .collect();

        let target = ScrollOffset::new(target.0 as f32, target.1 as f32);
        panes[source].user_scroll(target);
        sync.on_scroll(handles[source], ms(0)).unwrap();
        sync.tick(config.debounce);

        for (i, pane) in panes.iter().enumerate() {
            let offset = pane.offset();
            prop_assert!((offset.left - target.left).abs() <= config.threshold);
            prop_assert!((offset.top - target.top).abs() <= config.threshold);
            prop_assert!(pane.writes() <= 1, "pane {} written {} times", i, pane.writes());
        }
        prop_assert_eq!(panes[source].writes(), 0);

        sync.tick(config.debounce + config.settle);
        prop_assert!(!sync.is_syncing());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 8. Worked scenarios
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn week_pixel_counts_whole_weeks_from_monday() {
    // 2024-01-01 is a Monday; two weeks later is 2024-01-15.
    let x = mapper::to_pixel(d(2024, 1, 15), d(2024, 1, 1), 20.0, ViewUnit::Week);
    assert_eq!(x, 280.0);
}

#[test]
fn zoom_outside_range_is_clamped() {
    assert_eq!(zoom::clamp(5), ZoomLevel::from(10));
    assert_eq!(zoom::clamp(5).get(), 10);
    assert_eq!(zoom::clamp(250).get(), 200);
}

#[test]
fn single_select_replaces_previous() {
    let (t1, t2) = (Uuid::new_v4(), Uuid::new_v4());
    let mut state = SelectionState::default();
    state.select_task(t1, SelectionMode::Single);
    state.select_task(t2, SelectionMode::Single);
    assert_eq!(state.len(), 1);
    assert!(state.is_selected(t2));
    assert!(!state.is_selected(t1));
}

#[test]
fn small_movement_stays_a_click() {
    let project = Project::new("P", "#336699");
    let tasks: Vec<Task> = (0..6)
        .map(|i| Task::new(format!("t{i}"), project.id, d(2024, 1, 1), d(2024, 1, 5)))
        .collect();
    let heights = zoom::dimensions_for(ZoomLevel::default(), ViewUnit::Day).row_heights;
    let rows = RowLayout::build(std::slice::from_ref(&project), &tasks, heights);
    let ordered = rows.task_ids().to_vec();

    let from = rows.row_for(tasks[2].id).unwrap();
    let y = from.y + from.height / 2.0;

    let mut engine = SelectionEngine::new(DRAG_THRESHOLD, POST_DRAG_GUARD);
    assert!(engine.pointer_down(tasks[2].id, y, Modifiers::NONE));
    assert!(!engine.pointer_move(y + 4.0, &rows));
    assert!(!engine.is_dragging());

    let committed = engine
        .pointer_up(Some(tasks[2].id), Modifiers::NONE, &ordered, ms(0))
        .unwrap();
    assert!(committed);
    let state = engine.state();
    assert_eq!(state.len(), 1);
    assert!(state.is_selected(tasks[2].id));
    assert_eq!(state.mode(), SelectionMode::Single);
    assert!(!engine.is_guarded());
}

#[test]
fn offsets_within_threshold_are_not_written() {
    let config = SyncConfig {
        threshold: 2.0,
        ..SyncConfig::default()
    };
    let mut sync = ScrollSynchronizer::new(config);
    let a = RecordingPane::at(ScrollOffset::new(0.0, 0.0));
    let b = RecordingPane::at(ScrollOffset::new(498.0, 0.0));
    let a_id = sync.register(Box::new(a.clone()), SyncAxis::Horizontal);
    sync.register(Box::new(b.clone()), SyncAxis::Horizontal);

    a.user_scroll(ScrollOffset::new(500.0, 0.0));
    sync.on_scroll(a_id, ms(0)).unwrap();
    assert_eq!(sync.tick(config.debounce), 0);
    assert_eq!(b.writes(), 0);
    assert_eq!(b.offset().left, 498.0);
    assert!(!sync.is_syncing());
}
