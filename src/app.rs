use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::ui;
use crate::ui::pane::SharedPane;
use crate::ui::task_table::TaskTableAction;
use todo_timeline::config::{self, TimelineSettings};
use todo_timeline::io;
use todo_timeline::model::TaskBoard;
use todo_timeline::timeline::timer::Timer;
use todo_timeline::timeline::{Clock, PaneId, PaneRole, SystemClock, TimelineEngine, ViewUnit};

type DateChanges = Rc<RefCell<Vec<(Uuid, NaiveDate, NaiveDate)>>>;

/// Quiet period after the last zoom or unit change before settings are written.
const VIEW_SAVE_DELAY: Duration = Duration::from_millis(800);

/// Coalesces bursts of view changes into one settings write.
#[derive(Debug, Default)]
struct ViewSaveDebounce {
    timer: Timer,
}

impl ViewSaveDebounce {
    fn touch(&mut self, now: Duration) {
        self.timer.arm(now, VIEW_SAVE_DELAY);
    }

    /// `true` once the quiet period has passed since the last touch.
    fn due(&mut self, now: Duration) -> bool {
        self.timer.fire_if_due(now)
    }

    /// `true` when a write is still owed; clears it.
    fn take_pending(&mut self) -> bool {
        let pending = self.timer.is_pending();
        self.timer.cancel();
        pending
    }

    fn remaining(&self, now: Duration) -> Option<Duration> {
        self.timer.remaining(now)
    }
}

/// Main application state.
pub struct TimelineApp {
    board: TaskBoard,
    engine: TimelineEngine,
    settings: TimelineSettings,

    // Edits reported by the engine, applied to the board after each frame
    date_changes: DateChanges,

    list_pane: SharedPane,
    header_pane: SharedPane,
    body_pane: SharedPane,
    list_id: PaneId,
    header_id: PaneId,
    body_id: PaneId,

    status_message: String,
    scrolled_to_today: bool,

    clock: SystemClock,
    view_save: ViewSaveDebounce,
}

impl TimelineApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        // Register Phosphor icon font as a fallback so icons render inline with text
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);
        ui::theme::apply_theme(&cc.egui_ctx);
        // Ctrl +/- drive the timeline zoom, not the UI scale
        cc.egui_ctx.options_mut(|o| o.zoom_with_keyboard = false);

        let settings = TimelineSettings::load();
        let mut engine = TimelineEngine::with_system_clock(settings.clone());
        let today = engine.today();
        let board = io::load_board_or(&config::tasks_path(), || TaskBoard::sample(today));
        engine.set_data(board.projects.clone(), board.tasks.clone());

        let date_changes = DateChanges::default();
        let sink = Rc::clone(&date_changes);
        engine.set_on_task_dates_changed(move |id, start, due| {
            sink.borrow_mut().push((id, start, due));
        });

        let list_pane = SharedPane::new();
        let header_pane = SharedPane::new();
        let body_pane = SharedPane::new();
        let list_id = engine.register_pane(Box::new(list_pane.clone()), PaneRole::TaskList);
        let header_id = engine.register_pane(Box::new(header_pane.clone()), PaneRole::Header);
        let body_id = engine.register_pane(Box::new(body_pane.clone()), PaneRole::Body);

        Self {
            board,
            engine,
            settings,
            date_changes,
            list_pane,
            header_pane,
            body_pane,
            list_id,
            header_id,
            body_id,
            status_message: "Ready".to_string(),
            scrolled_to_today: false,
            clock: SystemClock::new(),
            view_save: ViewSaveDebounce::default(),
        }
    }

    // --- View operations ---

    pub fn zoom_in(&mut self) {
        if self.engine.zoom_in() {
            self.remember_view();
        }
    }

    pub fn zoom_out(&mut self) {
        if self.engine.zoom_out() {
            self.remember_view();
        }
    }

    pub fn reset_zoom(&mut self) {
        if self.engine.reset_zoom() {
            self.remember_view();
        }
    }

    pub fn fit_to_screen(&mut self) {
        if self.engine.fit_to_screen() {
            self.remember_view();
        }
        self.status_message = format!("Zoom fitted to {}%", self.zoom_percent());
    }

    pub fn set_view_unit(&mut self, unit: ViewUnit) {
        if self.engine.set_view_unit(unit) {
            self.remember_view();
            self.status_message = format!("{} view", unit.label());
        }
    }

    pub fn scroll_to_today(&mut self) {
        self.engine.scroll_to_today();
    }

    pub fn select_all(&mut self) {
        self.engine.select_all();
    }

    pub fn clear_selection(&mut self) {
        self.engine.clear_selection();
    }

    pub fn unit(&self) -> ViewUnit {
        self.engine.unit()
    }

    pub fn zoom_percent(&self) -> i32 {
        self.engine.zoom().get()
    }

    pub fn range_label(&self) -> String {
        let (start, end) = self.engine.date_range();
        format!("{} – {}", start.format("%b %d, %Y"), end.format("%b %d, %Y"))
    }

    /// Record zoom and unit so the next launch opens the same view. The
    /// write to disk waits until zooming has settled.
    fn remember_view(&mut self) {
        self.settings.default_zoom = self.engine.zoom();
        self.settings.default_view_unit = self.engine.unit();
        self.view_save.touch(self.clock.now());
    }

    // --- Board operations ---

    fn toggle_collapsed(&mut self, id: Uuid) {
        if self.board.toggle_collapsed(id) {
            self.engine
                .set_data(self.board.projects.clone(), self.board.tasks.clone());
        }
    }

    /// Apply date edits committed by bar drags since the last frame. Edits
    /// live in memory only; `tasks.json` is never written.
    fn apply_date_changes(&mut self) {
        let changes: Vec<_> = self.date_changes.borrow_mut().drain(..).collect();
        if changes.is_empty() {
            return;
        }
        for &(id, start, due) in &changes {
            if !self.board.set_task_dates(id, start, due) {
                tracing::warn!(task = %id, "date change for unknown task");
            }
        }
        if let [(id, start, due)] = changes[..] {
            let name = self
                .board
                .task(id)
                .map(|t| t.name.clone())
                .unwrap_or_default();
            self.status_message = format!(
                "Updated '{}' ({} → {})",
                name,
                start.format("%Y-%m-%d"),
                due.format("%Y-%m-%d")
            );
        } else {
            self.status_message = format!("Updated {} tasks", changes.len());
        }
        self.engine
            .set_data(self.board.projects.clone(), self.board.tasks.clone());
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let (escape, select_all, zoom_in, zoom_out, reset, today, wheel) = ctx.input(|i| {
            let cmd = i.modifiers.command;
            (
                i.key_pressed(egui::Key::Escape),
                cmd && i.key_pressed(egui::Key::A),
                cmd && (i.key_pressed(egui::Key::Equals) || i.key_pressed(egui::Key::Plus)),
                cmd && i.key_pressed(egui::Key::Minus),
                cmd && i.key_pressed(egui::Key::Num0),
                !cmd && i.key_pressed(egui::Key::T),
                i.zoom_delta(),
            )
        });
        if escape {
            self.engine.handle_escape();
        }
        if select_all {
            self.select_all();
        }
        if zoom_in || wheel > 1.0 {
            self.zoom_in();
        } else if zoom_out || wheel < 1.0 {
            self.zoom_out();
        }
        if reset {
            self.reset_zoom();
        }
        if today {
            self.scroll_to_today();
        }
    }
}

impl eframe::App for TimelineApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.engine.tick() {
            ctx.request_repaint();
        }
        self.handle_shortcuts(ctx);

        // Top panel: toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });

        // Bottom panel: status bar
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(ui::theme::STATUS_BAR_HEIGHT)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_HEADER)
                    .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(
                        egui::RichText::new(&self.status_message)
                            .font(ui::theme::font_status())
                            .color(ui::theme::TEXT_SECONDARY),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let selected = self.engine.selection().len();
                        for text in [
                            format!("{} view", self.engine.unit().label()),
                            format!("Zoom: {}%", self.zoom_percent()),
                            format!("Selected: {}", selected),
                            format!("Tasks: {}", self.engine.tasks().len()),
                        ] {
                            ui.label(
                                egui::RichText::new(text)
                                    .font(ui::theme::font_status())
                                    .color(ui::theme::TEXT_DIM),
                            );
                            ui.label(
                                egui::RichText::new(" · ")
                                    .font(ui::theme::font_status())
                                    .color(ui::theme::TEXT_DIM),
                            );
                        }
                    });
                });
            });

        // Left panel: task list
        let mut list_action = TaskTableAction::None;
        let mut list_scrolled = false;
        egui::SidePanel::left("task_panel")
            .default_width(ui::theme::LIST_WIDTH)
            .min_width(ui::theme::LIST_WIDTH * 0.6)
            .max_width(ui::theme::LIST_WIDTH * 2.0)
            .resizable(true)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_PANEL)
                    .stroke(egui::Stroke::new(1.0, ui::theme::BORDER_SUBTLE)),
            )
            .show(ctx, |ui| {
                (list_action, list_scrolled) =
                    ui::task_table::show_task_table(&self.engine, &self.list_pane, ui);
            });

        // Central panel: date header above the timeline body
        let mut header_scrolled = false;
        let mut body_scrolled = false;
        let chart_frame = egui::Frame::default()
            .fill(ui::theme::BG_DARK)
            .inner_margin(egui::Margin::ZERO);
        egui::CentralPanel::default().frame(chart_frame).show(ctx, |ui| {
            ui.spacing_mut().item_spacing = egui::Vec2::ZERO;
            header_scrolled = ui::gantt_chart::show_header(&self.engine, &self.header_pane, ui);
            body_scrolled = ui::gantt_chart::show_body(&mut self.engine, &self.body_pane, ui);
        });

        match list_action {
            TaskTableAction::Click(id, modifiers) => {
                self.engine.handle_click(id, modifiers);
            }
            TaskTableAction::ToggleCollapse(id) => self.toggle_collapsed(id),
            TaskTableAction::None => {}
        }

        for (scrolled, pane) in [
            (list_scrolled, self.list_id),
            (header_scrolled, self.header_id),
            (body_scrolled, self.body_id),
        ] {
            if scrolled {
                self.engine.handle_scroll(pane);
            }
        }

        self.apply_date_changes();

        // The body viewport is only known after its first frame
        if !self.scrolled_to_today && self.engine.viewport().width > 0.0 {
            self.engine.scroll_to_today();
            self.scrolled_to_today = true;
            ctx.request_repaint();
        }

        if let Some(delay) = self.engine.repaint_after() {
            ctx.request_repaint_after(delay);
        }

        let now = self.clock.now();
        if self.view_save.due(now) {
            self.settings.save();
        } else if let Some(delay) = self.view_save.remaining(now) {
            ctx.request_repaint_after(delay);
        }
    }
}

impl Drop for TimelineApp {
    fn drop(&mut self) {
        if self.view_save.take_pending() {
            self.settings.save();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn zoom_burst_saves_once_after_quiet_period() {
        let mut debounce = ViewSaveDebounce::default();
        for step in 0..10 {
            debounce.touch(ms(step * 50));
            assert!(!debounce.due(ms(step * 50 + 10)));
        }
        assert!(!debounce.due(ms(450 + 799)));
        assert!(debounce.due(ms(450 + 800)));
        assert!(!debounce.due(ms(5000)));
        assert!(!debounce.take_pending());
    }

    #[test]
    fn pending_save_is_flushed_once() {
        let mut debounce = ViewSaveDebounce::default();
        assert!(!debounce.take_pending());
        debounce.touch(ms(0));
        assert_eq!(debounce.remaining(ms(300)), Some(ms(500)));
        assert!(debounce.take_pending());
        assert!(!debounce.take_pending());
        assert!(!debounce.due(ms(10_000)));
    }
}
