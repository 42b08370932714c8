use egui::{Align2, Pos2, Rect, RichText, Sense, Stroke, Ui, Vec2};
use uuid::Uuid;

use crate::ui::pane::SharedPane;
use crate::ui::theme;
use todo_timeline::timeline::virtualizer;
use todo_timeline::timeline::{Modifiers, RowKind, TimelineEngine};

const INDENT: f32 = 14.0;
const CARET_WIDTH: f32 = 16.0;
const ROW_BUFFER: usize = 5;

/// Actions that the task list can request.
pub enum TaskTableAction {
    None,
    Click(Uuid, Modifiers),
    ToggleCollapse(Uuid),
}

/// Render the left-hand task list. Rows line up with the timeline body.
pub fn show_task_table(
    engine: &TimelineEngine,
    pane: &SharedPane,
    ui: &mut Ui,
) -> (TaskTableAction, bool) {
    let mut action = TaskTableAction::None;

    // Header area, same height as the date header
    let (header, _) = ui.allocate_exact_size(
        Vec2::new(ui.available_width(), theme::HEADER_HEIGHT),
        Sense::hover(),
    );
    ui.painter().rect_filled(header, 0.0, theme::BG_HEADER);
    ui.painter().text(
        Pos2::new(header.left() + 10.0, header.center().y),
        Align2::LEFT_CENTER,
        format!("Tasks ({})", engine.tasks().len()),
        theme::font_header(),
        theme::TEXT_PRIMARY,
    );

    let mut area = egui::ScrollArea::vertical()
        .id_salt("task_list")
        .auto_shrink([false, false])
        .drag_to_scroll(false)
        .scroll_bar_visibility(egui::scroll_area::ScrollBarVisibility::AlwaysHidden);
    if let Some(offset) = pane.take_request() {
        area = area.vertical_scroll_offset(offset.y);
    }

    let scrolled = area
        .show_viewport(ui, |ui, viewport| {
            let scrolled = pane.observe(viewport.min.to_vec2(), viewport.size());
            let layout = engine.rows();
            let (rect, _) = ui.allocate_exact_size(
                Vec2::new(viewport.width(), layout.total_height().max(viewport.height())),
                Sense::hover(),
            );
            let window = virtualizer::visible_rows_in(
                layout.rows(),
                viewport.top(),
                viewport.height(),
                ROW_BUFFER,
            );
            let dims = engine.dimensions();
            let modifiers = ui.input(|i| Modifiers {
                ctrl: i.modifiers.command,
                shift: i.modifiers.shift,
            });

            for row in &layout.rows()[window.indices()] {
                let row_rect = Rect::from_min_size(
                    Pos2::new(rect.left(), rect.top() + row.y),
                    Vec2::new(rect.width(), row.height),
                );
                let response = ui.interact(row_rect, ui.id().with(("row", row.id)), Sense::click());
                let selected = engine.selection().is_selected(row.id);
                let painter = ui.painter();

                let fill = if row.kind == RowKind::Project {
                    theme::BG_PROJECT_ROW
                } else if selected {
                    theme::BG_SELECTED
                } else if response.hovered() {
                    theme::BG_ROW_ODD
                } else {
                    theme::BG_PANEL
                };
                painter.rect_filled(row_rect, 0.0, fill);
                painter.line_segment(
                    [row_rect.left_bottom(), row_rect.right_bottom()],
                    Stroke::new(0.5, theme::BORDER_SUBTLE),
                );

                let indent = 8.0 + row.level as f32 * INDENT;
                let caret_x = row_rect.left() + indent;
                let (name, collapsed, collapsible, color) = match row.kind {
                    RowKind::Project => {
                        let project = engine.project(row.id);
                        (
                            project.map(|p| p.name.clone()).unwrap_or_default(),
                            project.is_some_and(|p| p.collapsed),
                            true,
                            theme::project_color(project),
                        )
                    }
                    RowKind::Task | RowKind::Subtask => {
                        let task = engine.task(row.id);
                        let has_children = engine.tasks().iter().any(|t| t.parent_id == Some(row.id));
                        let project = task.and_then(|t| engine.project(t.project_id));
                        let color = theme::project_color(project);
                        (
                            task.map(|t| t.name.clone()).unwrap_or_default(),
                            task.is_some_and(|t| t.collapsed),
                            has_children,
                            if task.is_some_and(|t| t.completed) {
                                theme::completed(color)
                            } else {
                                color
                            },
                        )
                    }
                };

                if collapsible {
                    let icon = if collapsed {
                        egui_phosphor::regular::CARET_RIGHT
                    } else {
                        egui_phosphor::regular::CARET_DOWN
                    };
                    painter.text(
                        Pos2::new(caret_x + CARET_WIDTH / 2.0, row_rect.center().y),
                        Align2::CENTER_CENTER,
                        icon,
                        theme::font_sized(dims.font_sizes.base),
                        theme::TEXT_SECONDARY,
                    );
                }
                let text_x = caret_x + CARET_WIDTH + 4.0;
                painter.circle_filled(Pos2::new(text_x, row_rect.center().y), 3.0, color);
                let (size, text_color) = match row.kind {
                    RowKind::Project => (dims.font_sizes.large, theme::TEXT_PRIMARY),
                    RowKind::Task => (dims.font_sizes.base, theme::TEXT_PRIMARY),
                    RowKind::Subtask => (dims.font_sizes.small, theme::TEXT_SECONDARY),
                };
                painter.with_clip_rect(row_rect.shrink(2.0)).text(
                    Pos2::new(text_x + 8.0, row_rect.center().y),
                    Align2::LEFT_CENTER,
                    name,
                    theme::font_sized(size),
                    text_color,
                );

                if response.clicked() {
                    let on_caret = response
                        .interact_pointer_pos()
                        .is_some_and(|p| p.x < caret_x + CARET_WIDTH);
                    action = if row.kind == RowKind::Project || (collapsible && on_caret) {
                        TaskTableAction::ToggleCollapse(row.id)
                    } else {
                        TaskTableAction::Click(row.id, modifiers)
                    };
                }
            }
            scrolled
        })
        .inner;

    if engine.tasks().is_empty() {
        ui.label(RichText::new("No tasks").color(theme::TEXT_DIM));
    }
    (action, scrolled)
}
