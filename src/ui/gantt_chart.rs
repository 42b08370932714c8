use chrono::Datelike;
use egui::{Align2, CursorIcon, Id, Pos2, Rect, Rounding, Sense, Stroke, Ui, Vec2};

use crate::ui::pane::SharedPane;
use crate::ui::theme;
use todo_timeline::timeline::grid::{self, Boundary};
use todo_timeline::timeline::{
    BarHandle, DisplayLevel, Modifiers, PointerEvent, PointerTarget, TimelineEngine, ViewUnit,
};

/// Render the date header. Returns `true` when the user scrolled it.
pub fn show_header(engine: &TimelineEngine, pane: &SharedPane, ui: &mut Ui) -> bool {
    let content = engine.content_size();
    let mut area = egui::ScrollArea::horizontal()
        .id_salt("timeline_header")
        .auto_shrink([false, false])
        .drag_to_scroll(false)
        .scroll_bar_visibility(egui::scroll_area::ScrollBarVisibility::AlwaysHidden);
    if let Some(offset) = pane.take_request() {
        area = area.horizontal_scroll_offset(offset.x);
    }

    area.show_viewport(ui, |ui, viewport| {
        let scrolled = pane.observe(viewport.min.to_vec2(), viewport.size());
        let (rect, _) = ui.allocate_exact_size(
            Vec2::new(content.width.max(viewport.width()), theme::HEADER_HEIGHT),
            Sense::hover(),
        );
        draw_timeline_header(ui.painter(), rect.min, engine, viewport);
        scrolled
    })
    .inner
}

fn draw_timeline_header(painter: &egui::Painter, origin: Pos2, engine: &TimelineEngine, viewport: Rect) {
    let band = theme::HEADER_HEIGHT / 2.0;
    let visible = Rect::from_min_size(
        Pos2::new(origin.x + viewport.left(), origin.y),
        Vec2::new(viewport.width(), theme::HEADER_HEIGHT),
    );
    painter.rect_filled(visible, 0.0, theme::BG_HEADER);
    painter.line_segment(
        [
            Pos2::new(visible.left(), origin.y + theme::HEADER_HEIGHT),
            Pos2::new(visible.right(), origin.y + theme::HEADER_HEIGHT),
        ],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );

    // Month band
    let column_width = engine.column_width();
    for group in engine.month_groups() {
        let left = origin.x + group.start_index as f32 * column_width;
        let right = left + group.width;
        if right < visible.left() || left > visible.right() {
            continue;
        }
        // Keep the label on screen while the month's first column is scrolled away.
        let text_x = left.max(visible.left()) + 4.0;
        if right - text_x > 30.0 {
            painter.text(
                Pos2::new(text_x, origin.y + band / 2.0),
                Align2::LEFT_CENTER,
                &group.label,
                theme::font_header(),
                theme::TEXT_PRIMARY,
            );
        }
        painter.line_segment(
            [Pos2::new(left, origin.y), Pos2::new(left, origin.y + theme::HEADER_HEIGHT)],
            Stroke::new(1.0, theme::BORDER_MONTH),
        );
    }

    // Column labels
    let dims = engine.dimensions();
    let font = theme::font_sized(dims.font_sizes.small);
    let cells = engine.cells();
    for cell in &cells[engine.visible_columns().indices()] {
        let x = origin.x + cell.x;
        let color = if cell.is_today {
            theme::TODAY_LINE
        } else if cell.is_off_day() {
            theme::TEXT_DIM
        } else {
            theme::TEXT_SECONDARY
        };
        let label = match engine.unit() {
            ViewUnit::Day if cell.width >= 14.0 => Some(cell.date.day().to_string()),
            ViewUnit::Day => None,
            ViewUnit::Week if cell.width >= 40.0 => {
                Some(grid::week_label(cell.date, cell.is_first_of_month))
            }
            ViewUnit::Week => Some(format!("{}", cell.date.iso_week().week())),
        };
        if let Some(label) = label {
            painter.text(
                Pos2::new(x + cell.width / 2.0, origin.y + band * 1.5),
                Align2::CENTER_CENTER,
                label,
                font.clone(),
                color,
            );
        }
        if grid::boundary_emphasis(cell) != Boundary::None {
            painter.line_segment(
                [Pos2::new(x, origin.y + band), Pos2::new(x, origin.y + theme::HEADER_HEIGHT)],
                Stroke::new(0.5, theme::GRID_LINE),
            );
        }
    }
}

/// Render the grid and the task bars, feeding pointer input to the engine.
/// Returns `true` when the user scrolled the body.
pub fn show_body(engine: &mut TimelineEngine, pane: &SharedPane, ui: &mut Ui) -> bool {
    let mut area = egui::ScrollArea::both()
        .id_salt("timeline_body")
        .auto_shrink([false, false])
        .drag_to_scroll(false);
    if let Some(offset) = pane.take_request() {
        area = area.scroll_offset(offset);
    }

    area.show_viewport(ui, |ui, viewport| {
        let scrolled = pane.observe(viewport.min.to_vec2(), viewport.size());
        let content = engine.content_size();
        let (rect, response) = ui.allocate_exact_size(
            Vec2::new(
                content.width.max(viewport.width()),
                content.height.max(viewport.height()),
            ),
            Sense::click_and_drag(),
        );
        let origin = rect.min;

        handle_pointer(engine, ui, &response, origin);

        let painter = ui.painter();
        paint_grid(engine, painter, origin, viewport);
        paint_bars(engine, painter, origin, viewport);
        paint_overlays(engine, painter, origin, viewport);

        if let Some(pos) = response.hover_pos() {
            let local = pos - origin;
            hover_feedback(engine, ui, local.x, local.y);
        }
        scrolled
    })
    .inner
}

fn handle_pointer(engine: &mut TimelineEngine, ui: &Ui, response: &egui::Response, origin: Pos2) {
    let (pressed, released, moved, pos, modifiers) = ui.input(|i| {
        (
            i.pointer.primary_pressed(),
            i.pointer.primary_released(),
            i.pointer.delta() != Vec2::ZERO,
            i.pointer.interact_pos(),
            Modifiers {
                ctrl: i.modifiers.command,
                shift: i.modifiers.shift,
            },
        )
    });
    let Some(pos) = pos else {
        return;
    };
    let local = pos - origin;
    let event = PointerEvent {
        x: local.x,
        y: local.y,
        modifiers,
    };

    if pressed && response.hovered() {
        let target = engine.hit_test(event.x, event.y);
        engine.handle_pointer_down(event, target);
    }
    if moved && engine.handle_pointer_move(event) {
        ui.ctx().request_repaint();
    }
    if released {
        let target = engine.hit_test(event.x, event.y);
        engine.handle_pointer_up(event, target);
    }
}

fn paint_grid(engine: &TimelineEngine, painter: &egui::Painter, origin: Pos2, viewport: Rect) {
    let screen = viewport.translate(origin.to_vec2());
    painter.rect_filled(screen, 0.0, theme::BG_DARK);

    let rows = engine.rows().rows();
    let selection = engine.selection();
    let preview = engine.drag_selection().filter(|drag| drag.is_dragging);
    for (index, row) in engine.visible_rows().enumerate(rows) {
        let row_rect = Rect::from_min_size(
            Pos2::new(screen.left(), origin.y + row.y),
            Vec2::new(screen.width(), row.height),
        );
        let fill = if !row.is_task() {
            Some(theme::BG_PROJECT_ROW)
        } else if selection.is_selected(row.id) {
            Some(theme::BG_SELECTED)
        } else if preview.is_some_and(|drag| drag.preview_ids.contains(&row.id)) {
            Some(theme::BG_PREVIEW)
        } else if index % 2 == 1 {
            Some(theme::BG_ROW_ODD)
        } else {
            None
        };
        if let Some(fill) = fill {
            painter.rect_filled(row_rect, 0.0, fill);
        }
        painter.line_segment(
            [row_rect.left_bottom(), row_rect.right_bottom()],
            Stroke::new(0.5, theme::BORDER_SUBTLE),
        );
    }

    for cell in &engine.cells()[engine.visible_columns().indices()] {
        let x = origin.x + cell.x;
        let column = Rect::from_min_max(
            Pos2::new(x, screen.top()),
            Pos2::new(x + cell.width, screen.bottom()),
        );
        if cell.is_holiday {
            painter.rect_filled(column, 0.0, theme::BG_HOLIDAY);
        } else if cell.is_weekend {
            painter.rect_filled(column, 0.0, theme::BG_OFF_DAY);
        }
        if cell.is_today {
            painter.rect_filled(column, 0.0, theme::BG_TODAY_CELL);
        }
        let stroke = match grid::boundary_emphasis(cell) {
            Boundary::Month => Stroke::new(1.0, theme::BORDER_MONTH),
            Boundary::Week => Stroke::new(0.8, theme::GRID_LINE),
            Boundary::None => Stroke::new(0.4, theme::GRID_LINE),
        };
        painter.line_segment([column.left_top(), column.left_bottom()], stroke);
    }
}

fn paint_bars(engine: &TimelineEngine, painter: &egui::Painter, origin: Pos2, viewport: Rect) {
    let dims = engine.dimensions();
    let font = theme::font_sized(dims.font_sizes.base);
    let dragged = engine.bar_drag().map(|(drag, _)| drag.task_id);
    let rows = engine.rows().rows();

    for line in engine.connectors() {
        let (lo, hi) = line.horizontal_span();
        if hi < viewport.left() || lo > viewport.right() {
            continue;
        }
        let stroke = Stroke::new(line.thickness, theme::CONNECTOR);
        let elbow = origin + Vec2::new(line.x, line.bottom);
        painter.line_segment([origin + Vec2::new(line.x, line.top), elbow], stroke);
        painter.line_segment([elbow, origin + Vec2::new(line.child_x, line.bottom)], stroke);
    }

    for (_, row) in engine.visible_rows().enumerate(rows).filter(|(_, r)| r.is_task()) {
        let (Some(pos), Some(task)) = (engine.task_position(row.id), engine.task(row.id)) else {
            continue;
        };
        if pos.right() < viewport.left() || pos.left > viewport.right() {
            continue;
        }
        let inset = pos.height * theme::BAR_INSET_RATIO;
        let bar = Rect::from_min_size(
            origin + Vec2::new(pos.left, pos.top + inset),
            Vec2::new(pos.width, pos.height - inset * 2.0),
        );
        let base = theme::project_color(engine.project(task.project_id));
        let fill = if task.completed { theme::completed(base) } else { base };
        let rounding = Rounding::same(theme::BAR_ROUNDING * dims.zoom_ratio.min(1.0));
        painter.rect_filled(bar, rounding, fill);

        let selected = engine.selection().is_selected(task.id);
        if selected || dragged == Some(task.id) {
            painter.rect_stroke(bar, rounding, Stroke::new(2.0, theme::ACCENT));
            let handle_h = bar.height() * 0.55;
            for x in [bar.left() + 1.0, bar.right() - 3.0] {
                painter.rect_filled(
                    Rect::from_min_size(
                        Pos2::new(x, bar.center().y - handle_h / 2.0),
                        Vec2::new(2.0, handle_h),
                    ),
                    Rounding::same(1.0),
                    theme::HANDLE_COLOR,
                );
            }
        }

        let show_label = match dims.display_level {
            DisplayLevel::Minimal => false,
            DisplayLevel::Compact => bar.width() > 60.0,
            DisplayLevel::Reduced | DisplayLevel::Full => bar.width() > 24.0,
        };
        if show_label {
            let label = if dims.display_level == DisplayLevel::Full && bar.width() > 180.0 {
                format!(
                    "{}  {} – {}",
                    task.name,
                    task.start_date.format("%d/%m"),
                    task.due_date.format("%d/%m")
                )
            } else {
                task.name.clone()
            };
            painter.with_clip_rect(bar.shrink(4.0)).text(
                Pos2::new(bar.left() + 6.0, bar.center().y),
                Align2::LEFT_CENTER,
                label,
                font.clone(),
                theme::TEXT_ON_BAR,
            );
        }
    }
}

fn paint_overlays(engine: &TimelineEngine, painter: &egui::Painter, origin: Pos2, viewport: Rect) {
    let screen = viewport.translate(origin.to_vec2());

    let today = engine.today_indicator();
    let x = origin.x + today.x;
    if x >= screen.left() - today.width && x <= screen.right() {
        painter.rect_filled(
            Rect::from_min_max(
                Pos2::new(x - today.width / 2.0, screen.top()),
                Pos2::new(x + today.width / 2.0, screen.bottom()),
            ),
            0.0,
            theme::TODAY_LINE,
        );
    }

    if let Some(drag) = engine.drag_selection().filter(|drag| drag.is_dragging) {
        let (lo, hi) = drag.band();
        let band = Rect::from_min_max(
            Pos2::new(screen.left(), origin.y + lo),
            Pos2::new(screen.right(), origin.y + hi),
        );
        painter.rect_filled(band, 0.0, theme::DRAG_BAND);
        painter.rect_stroke(band, 0.0, Stroke::new(1.0, theme::ACCENT));
    }
}

fn hover_feedback(engine: &TimelineEngine, ui: &Ui, x: f32, y: f32) {
    if engine.bar_drag().is_some() {
        ui.ctx().set_cursor_icon(CursorIcon::Grabbing);
        return;
    }
    let PointerTarget::Bar { task, handle } = engine.hit_test(x, y) else {
        return;
    };
    ui.ctx().set_cursor_icon(match handle {
        BarHandle::Move => CursorIcon::Grab,
        BarHandle::Start | BarHandle::End => CursorIcon::ResizeHorizontal,
    });
    let Some(task) = engine.task(task) else {
        return;
    };
    egui::show_tooltip_at_pointer(ui.ctx(), ui.layer_id(), Id::new(("task-tip", task.id)), |ui| {
        ui.strong(&task.name);
        ui.label(format!(
            "{} → {}",
            task.start_date.format("%d/%m/%Y"),
            task.due_date.format("%d/%m/%Y"),
        ));
        if let Some(project) = engine.project(task.project_id) {
            ui.label(&project.name);
        }
    });
}
