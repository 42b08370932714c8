//! Row layout and task-bar geometry.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use uuid::Uuid;

use super::mapper::{days_for_drag, shift_days, to_pixel, CalendarDay, ViewUnit};
use super::virtualizer::Span;
use super::zoom::RowHeights;
use crate::error::TimelineError;
use crate::model::{Project, Task};

/// Pixel rectangle of one task bar, relative to the timeline origin.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TaskPosition {
    pub left: f32,
    pub width: f32,
    pub top: f32,
    pub height: f32,
}

impl TaskPosition {
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x <= self.right() && y >= self.top && y <= self.bottom()
    }

    /// Which part of the bar is under `x`. Edges win over the body within
    /// `handle_width` of either end.
    pub fn handle_at(&self, x: f32, handle_width: f32) -> Option<BarHandle> {
        if x < self.left - handle_width / 2.0 || x > self.right() + handle_width / 2.0 {
            return None;
        }
        let edge = handle_width.min(self.width / 3.0);
        if (x - self.left).abs() <= edge {
            Some(BarHandle::Start)
        } else if (self.right() - x).abs() <= edge {
            Some(BarHandle::End)
        } else {
            Some(BarHandle::Move)
        }
    }
}

/// Bar rectangle for a task spanning `start..=due`.
///
/// Inverted dates are swapped. A bar is never narrower than one cell.
pub fn task_position(
    start: impl CalendarDay,
    due: impl CalendarDay,
    origin: impl CalendarDay,
    cell_width: f32,
    unit: ViewUnit,
    row_index: usize,
    row_height: f32,
) -> TaskPosition {
    if !(cell_width > 0.0) {
        tracing::debug!(
            err = %TimelineError::InvalidCellWidth(cell_width),
            "task position skipped"
        );
        return TaskPosition::default();
    }
    let (mut start, mut due) = (start.calendar_day(), due.calendar_day());
    if start > due {
        tracing::warn!(%start, %due, "task dates inverted, swapping");
        std::mem::swap(&mut start, &mut due);
    }
    let origin = origin.calendar_day();
    let left = to_pixel(start, origin, cell_width, unit);
    let end = to_pixel(due, origin, cell_width, unit);
    TaskPosition {
        left,
        width: cell_width.max(end - left + cell_width),
        top: row_index as f32 * row_height,
        height: row_height,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKind {
    Project,
    Task,
    Subtask,
}

/// One visible row of the timeline body.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub kind: RowKind,
    /// Project id for header rows, task id otherwise.
    pub id: Uuid,
    pub project_id: Option<Uuid>,
    pub level: u32,
    pub y: f32,
    pub height: f32,
}

impl Row {
    pub fn is_task(&self) -> bool {
        self.kind != RowKind::Project
    }
}

impl Span for Row {
    fn top(&self) -> f32 {
        self.y
    }

    fn extent(&self) -> f32 {
        self.height
    }
}

/// Ordered visible rows: each project header followed by its expanded tasks.
#[derive(Debug, Clone, Default)]
pub struct RowLayout {
    rows: Vec<Row>,
    index: HashMap<Uuid, usize>,
    task_order: Vec<Uuid>,
    total_height: f32,
}

impl RowLayout {
    pub fn build(projects: &[Project], tasks: &[Task], heights: RowHeights) -> Self {
        let known: HashSet<Uuid> = projects.iter().map(|p| p.id).collect();
        let mut layout = RowLayout::default();

        for project in projects {
            layout.push(Row {
                kind: RowKind::Project,
                id: project.id,
                project_id: Some(project.id),
                level: 0,
                y: 0.0,
                height: heights.project,
            });
            if project.collapsed {
                continue;
            }
            let group: Vec<&Task> = tasks.iter().filter(|t| t.project_id == project.id).collect();
            for task in hierarchical_order(&group) {
                layout.push_task(task, heights);
            }
        }

        let orphans: Vec<&Task> = tasks.iter().filter(|t| !known.contains(&t.project_id)).collect();
        if !orphans.is_empty() {
            let unknown: HashSet<Uuid> = orphans.iter().map(|t| t.project_id).collect();
            for project_id in unknown {
                tracing::warn!(
                    err = %TimelineError::UnknownProject(project_id),
                    "tasks listed without header"
                );
            }
            for task in hierarchical_order(&orphans) {
                layout.push_task(task, heights);
            }
        }
        layout
    }

    fn push_task(&mut self, task: &Task, heights: RowHeights) {
        let (kind, height) = if task.level == 0 {
            (RowKind::Task, heights.task)
        } else {
            (RowKind::Subtask, heights.subtask)
        };
        self.task_order.push(task.id);
        self.push(Row {
            kind,
            id: task.id,
            project_id: Some(task.project_id),
            level: task.level,
            y: 0.0,
            height,
        });
    }

    fn push(&mut self, mut row: Row) {
        row.y = self.total_height;
        self.total_height += row.height;
        self.index.insert(row.id, self.rows.len());
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total_height(&self) -> f32 {
        self.total_height
    }

    /// Visible task ids in display order.
    pub fn task_ids(&self) -> &[Uuid] {
        &self.task_order
    }

    pub fn task_rows(&self) -> impl Iterator<Item = &Row> + '_ {
        self.rows.iter().filter(|row| row.is_task())
    }

    pub fn index_of(&self, id: Uuid) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn row_for(&self, id: Uuid) -> Option<&Row> {
        self.index_of(id).map(|i| &self.rows[i])
    }

    /// Task row under `y`; project headers yield `None`.
    pub fn task_at_y(&self, y: f32) -> Option<Uuid> {
        if y < 0.0 {
            return None;
        }
        let i = self.rows.partition_point(|row| row.bottom() <= y);
        self.rows
            .get(i)
            .filter(|row| row.is_task() && y >= row.y)
            .map(|row| row.id)
    }

    /// Task rows whose vertical span intersects `[y0, y1]`, in either order.
    pub fn tasks_in_band(&self, y0: f32, y1: f32) -> Vec<Uuid> {
        let (lo, hi) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
        let first = self.rows.partition_point(|row| row.bottom() < lo);
        self.rows[first..]
            .iter()
            .take_while(|row| row.y <= hi)
            .filter(|row| row.is_task())
            .map(|row| row.id)
            .collect()
    }
}

/// Visible tasks of one group, depth-first: every root is followed by its
/// descendants, siblings ordered by due date and then by input order.
/// A task whose parent is outside the group counts as a root. Descendants of
/// collapsed tasks are walked but not returned.
fn hierarchical_order<'a>(group: &[&'a Task]) -> Vec<&'a Task> {
    let ids: HashSet<Uuid> = group.iter().map(|t| t.id).collect();
    let mut children: HashMap<Uuid, Vec<&'a Task>> = HashMap::new();
    let mut roots = Vec::new();
    for &task in group {
        match task.parent_id.filter(|p| *p != task.id && ids.contains(p)) {
            Some(parent) => children.entry(parent).or_default().push(task),
            None => roots.push(task),
        }
    }
    roots.sort_by_key(|t| t.due_date);
    for siblings in children.values_mut() {
        siblings.sort_by_key(|t| t.due_date);
    }

    let mut ordered = Vec::with_capacity(group.len());
    let mut visited = HashSet::with_capacity(group.len());
    for root in roots {
        walk(root, &children, false, &mut visited, &mut ordered);
    }

    // Tasks on a parent cycle are unreachable from any root.
    for &task in group {
        if !visited.contains(&task.id) {
            tracing::warn!(task = %task.id, "cyclic parent chain");
            walk(task, &children, false, &mut visited, &mut ordered);
        }
    }
    ordered
}

fn walk<'a>(
    task: &'a Task,
    children: &HashMap<Uuid, Vec<&'a Task>>,
    hidden: bool,
    visited: &mut HashSet<Uuid>,
    ordered: &mut Vec<&'a Task>,
) {
    let mut stack = vec![(task, hidden)];
    while let Some((task, hidden)) = stack.pop() {
        if !visited.insert(task.id) {
            continue;
        }
        if !hidden {
            ordered.push(task);
        }
        if let Some(kids) = children.get(&task.id) {
            let hide = hidden || task.collapsed;
            stack.extend(kids.iter().rev().map(|&kid| (kid, hide)));
        }
    }
}

/// Horizontal distance from a parent bar's left edge to its connector.
pub const CONNECTOR_INSET: f32 = 20.0;

/// Elbow line tying a subtask bar to its parent: a vertical segment at `x`
/// from the parent's row down to the middle of the child's row, then a
/// horizontal segment over to the child's left edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connector {
    pub parent_id: Uuid,
    pub child_id: Uuid,
    pub x: f32,
    pub top: f32,
    pub bottom: f32,
    pub child_x: f32,
    pub thickness: f32,
}

impl Connector {
    pub fn between(
        parent_id: Uuid,
        parent: &TaskPosition,
        child_id: Uuid,
        child: &TaskPosition,
        zoom_ratio: f32,
    ) -> Self {
        Connector {
            parent_id,
            child_id,
            x: parent.left + CONNECTOR_INSET.min(parent.width / 2.0),
            top: parent.bottom(),
            bottom: child.top + child.height / 2.0,
            child_x: child.left,
            thickness: (2.0 * zoom_ratio).round().max(1.0),
        }
    }

    /// Leftmost and rightmost x covered by the horizontal segment.
    pub fn horizontal_span(&self) -> (f32, f32) {
        (self.x.min(self.child_x), self.x.max(self.child_x))
    }
}

/// Part of a bar grabbed by the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarHandle {
    Move,
    Start,
    End,
}

/// In-flight move or resize of one task bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarDrag {
    pub task_id: Uuid,
    pub handle: BarHandle,
    pub anchor_x: f32,
    pub original_start: NaiveDate,
    pub original_due: NaiveDate,
}

impl BarDrag {
    pub fn new(task: &Task, handle: BarHandle, anchor_x: f32) -> Self {
        let (start, due) = if task.start_date <= task.due_date {
            (task.start_date, task.due_date)
        } else {
            (task.due_date, task.start_date)
        };
        Self {
            task_id: task.id,
            handle,
            anchor_x,
            original_start: start,
            original_due: due,
        }
    }

    /// New `(start, due)` for the pointer at `x`. Resizing never crosses
    /// the opposite edge.
    pub fn dates_at(&self, x: f32, cell_width: f32, unit: ViewUnit) -> (NaiveDate, NaiveDate) {
        let days = days_for_drag(x - self.anchor_x, cell_width, unit);
        let (start, due) = (self.original_start, self.original_due);
        match self.handle {
            BarHandle::Move => (shift_days(start, days), shift_days(due, days)),
            BarHandle::Start => (shift_days(start, days).min(due), due),
            BarHandle::End => (start, shift_days(due, days).max(start)),
        }
    }

    pub fn is_noop(&self, x: f32, cell_width: f32, unit: ViewUnit) -> bool {
        self.dates_at(x, cell_width, unit) == (self.original_start, self.original_due)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    const HEIGHTS: RowHeights = RowHeights {
        project: 48.0,
        task: 40.0,
        subtask: 32.0,
    };

    #[test]
    fn bar_covers_inclusive_due_date() {
        let pos = task_position(d(2024, 1, 3), d(2024, 1, 5), d(2024, 1, 1), 30.0, ViewUnit::Day, 2, 40.0);
        assert_eq!(pos.left, 60.0);
        assert_eq!(pos.width, 90.0);
        assert_eq!(pos.top, 80.0);
        assert_eq!(pos.height, 40.0);
    }

    #[test]
    fn single_day_bar_is_one_cell_wide() {
        let pos = task_position(d(2024, 1, 3), d(2024, 1, 3), d(2024, 1, 1), 20.0, ViewUnit::Week, 0, 40.0);
        assert_eq!(pos.width, 20.0);
    }

    #[test]
    fn inverted_dates_are_swapped() {
        let straight = task_position(d(2024, 1, 3), d(2024, 1, 9), d(2024, 1, 1), 30.0, ViewUnit::Day, 0, 40.0);
        let inverted = task_position(d(2024, 1, 9), d(2024, 1, 3), d(2024, 1, 1), 30.0, ViewUnit::Day, 0, 40.0);
        assert_eq!(straight, inverted);
    }

    #[test]
    fn zero_cell_width_gives_empty_rect() {
        let pos = task_position(d(2024, 1, 3), d(2024, 1, 9), d(2024, 1, 1), 0.0, ViewUnit::Day, 3, 40.0);
        assert_eq!(pos, TaskPosition::default());
    }

    #[test]
    fn handle_hit_testing() {
        let pos = TaskPosition { left: 100.0, width: 120.0, top: 0.0, height: 40.0 };
        assert_eq!(pos.handle_at(102.0, 8.0), Some(BarHandle::Start));
        assert_eq!(pos.handle_at(160.0, 8.0), Some(BarHandle::Move));
        assert_eq!(pos.handle_at(219.0, 8.0), Some(BarHandle::End));
        assert_eq!(pos.handle_at(300.0, 8.0), None);
    }

    fn board() -> (Vec<Project>, Vec<Task>) {
        let start = d(2024, 1, 1);
        let a = Project::new("A", "#112233");
        let b = Project::new("B", "#445566");
        let t1 = Task::new("t1", a.id, start, start);
        let s1 = Task::subtask_of(&t1, "s1", start, start);
        let t2 = Task::new("t2", b.id, start, start);
        (vec![a, b], vec![t1, s1, t2])
    }

    #[test]
    fn rows_stack_projects_and_tasks() {
        let (projects, tasks) = board();
        let layout = RowLayout::build(&projects, &tasks, HEIGHTS);
        let kinds: Vec<RowKind> = layout.rows().iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            [RowKind::Project, RowKind::Task, RowKind::Subtask, RowKind::Project, RowKind::Task]
        );
        assert_eq!(layout.total_height(), 48.0 + 40.0 + 32.0 + 48.0 + 40.0);
        assert_eq!(layout.row_for(tasks[1].id).unwrap().y, 88.0);
        assert_eq!(layout.task_ids(), [tasks[0].id, tasks[1].id, tasks[2].id]);
    }

    #[test]
    fn collapse_hides_descendants() {
        let (mut projects, mut tasks) = board();
        tasks[0].collapsed = true;
        let layout = RowLayout::build(&projects, &tasks, HEIGHTS);
        assert!(layout.row_for(tasks[1].id).is_none());
        assert_eq!(layout.len(), 4);

        projects[1].collapsed = true;
        let layout = RowLayout::build(&projects, &tasks, HEIGHTS);
        assert!(layout.row_for(tasks[2].id).is_none());
        assert!(layout.row_for(projects[1].id).is_some());
    }

    #[test]
    fn orphan_tasks_are_appended() {
        let (projects, mut tasks) = board();
        let start = d(2024, 1, 1);
        let orphan = Task::new("lost", Uuid::new_v4(), start, start);
        tasks.push(orphan.clone());
        let layout = RowLayout::build(&projects, &tasks, HEIGHTS);
        assert_eq!(layout.rows().last().unwrap().id, orphan.id);
    }

    #[test]
    fn subtasks_follow_their_parent_regardless_of_input_order() {
        let project = Project::new("A", "#112233");
        let t1 = Task::new("t1", project.id, d(2024, 1, 1), d(2024, 1, 5));
        let s1 = Task::subtask_of(&t1, "s1", d(2024, 1, 2), d(2024, 1, 3));
        let t2 = Task::new("t2", project.id, d(2024, 1, 1), d(2024, 1, 9));
        let tasks = vec![s1.clone(), t2.clone(), t1.clone()];

        let layout = RowLayout::build(std::slice::from_ref(&project), &tasks, HEIGHTS);
        assert_eq!(layout.task_ids(), [t1.id, s1.id, t2.id]);
        assert_eq!(layout.row_for(s1.id).unwrap().kind, RowKind::Subtask);
        assert_eq!(layout.row_for(s1.id).unwrap().y, 48.0 + 40.0);
    }

    #[test]
    fn siblings_are_ordered_by_due_date() {
        let project = Project::new("A", "#112233");
        let parent = Task::new("parent", project.id, d(2024, 1, 1), d(2024, 1, 31));
        let late = Task::subtask_of(&parent, "late", d(2024, 1, 1), d(2024, 1, 20));
        let early = Task::subtask_of(&parent, "early", d(2024, 1, 1), d(2024, 1, 4));
        let tie = Task::subtask_of(&parent, "tie", d(2024, 1, 1), d(2024, 1, 4));
        let tasks = vec![late.clone(), parent.clone(), early.clone(), tie.clone()];

        let layout = RowLayout::build(std::slice::from_ref(&project), &tasks, HEIGHTS);
        assert_eq!(layout.task_ids(), [parent.id, early.id, tie.id, late.id]);
    }

    #[test]
    fn parent_cycles_still_list_every_task() {
        let project = Project::new("A", "#112233");
        let start = d(2024, 1, 1);
        let mut a = Task::new("a", project.id, start, start);
        let mut b = Task::new("b", project.id, start, start);
        a.parent_id = Some(b.id);
        b.parent_id = Some(a.id);
        let tasks = vec![a.clone(), b.clone()];

        let layout = RowLayout::build(std::slice::from_ref(&project), &tasks, HEIGHTS);
        assert_eq!(layout.task_ids(), [a.id, b.id]);
    }

    #[test]
    fn hit_testing_rows() {
        let (projects, tasks) = board();
        let layout = RowLayout::build(&projects, &tasks, HEIGHTS);
        assert_eq!(layout.task_at_y(10.0), None);
        assert_eq!(layout.task_at_y(50.0), Some(tasks[0].id));
        assert_eq!(layout.task_at_y(100.0), Some(tasks[1].id));
        assert_eq!(layout.task_at_y(10_000.0), None);

        // 60..100 touches t1 (48..88) and s1 (88..120).
        assert_eq!(layout.tasks_in_band(100.0, 60.0), vec![tasks[0].id, tasks[1].id]);
    }

    #[test]
    fn connector_runs_from_parent_row_to_child_middle() {
        let (parent_id, child_id) = (Uuid::new_v4(), Uuid::new_v4());
        let parent = TaskPosition { left: 100.0, width: 300.0, top: 48.0, height: 40.0 };
        let child = TaskPosition { left: 160.0, width: 60.0, top: 88.0, height: 32.0 };
        let line = Connector::between(parent_id, &parent, child_id, &child, 1.0);
        assert_eq!(line.x, 120.0);
        assert_eq!(line.top, 88.0);
        assert_eq!(line.bottom, 104.0);
        assert_eq!(line.horizontal_span(), (120.0, 160.0));
        assert_eq!(line.thickness, 2.0);

        // Narrow parent keeps the elbow on its bar; a child starting earlier
        // flips the horizontal segment.
        let parent = TaskPosition { left: 100.0, width: 10.0, ..parent };
        let child = TaskPosition { left: 40.0, ..child };
        let line = Connector::between(parent_id, &parent, child_id, &child, 0.2);
        assert_eq!(line.x, 105.0);
        assert_eq!(line.horizontal_span(), (40.0, 105.0));
        assert_eq!(line.thickness, 1.0);
    }

    #[test]
    fn bar_drag_moves_and_resizes() {
        let start = d(2024, 1, 10);
        let mut task = Task::new("t", Uuid::new_v4(), start, d(2024, 1, 12));

        let drag = BarDrag::new(&task, BarHandle::Move, 100.0);
        assert_eq!(drag.dates_at(160.0, 30.0, ViewUnit::Day), (d(2024, 1, 12), d(2024, 1, 14)));
        assert!(drag.is_noop(110.0, 30.0, ViewUnit::Day));

        let drag = BarDrag::new(&task, BarHandle::Start, 0.0);
        assert_eq!(drag.dates_at(300.0, 30.0, ViewUnit::Day), (d(2024, 1, 12), d(2024, 1, 12)));

        let drag = BarDrag::new(&task, BarHandle::End, 0.0);
        assert_eq!(drag.dates_at(-300.0, 30.0, ViewUnit::Day), (start, start));
        assert_eq!(drag.dates_at(140.0, 20.0, ViewUnit::Week), (start, d(2024, 1, 19)));

        task.due_date = d(2024, 1, 1);
        let drag = BarDrag::new(&task, BarHandle::Move, 0.0);
        assert!(drag.original_start <= drag.original_due);
    }
}
