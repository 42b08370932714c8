use egui::{Color32, FontId, Rounding, Stroke, Visuals};

use todo_timeline::model::Project;

// ── Palette ──────────────────────────────────────────────────────────────────

pub const BG_DARK: Color32 = Color32::from_rgb(24, 24, 32);
pub const BG_PANEL: Color32 = Color32::from_rgb(30, 30, 40);
pub const BG_HEADER: Color32 = Color32::from_rgb(34, 37, 48);
pub const BG_PROJECT_ROW: Color32 = Color32::from_rgb(36, 38, 50);
pub const BG_ROW_ODD: Color32 = Color32::from_rgba_premultiplied(255, 255, 255, 6);
pub const BG_SELECTED: Color32 = Color32::from_rgba_premultiplied(80, 140, 220, 45);
pub const BG_PREVIEW: Color32 = Color32::from_rgba_premultiplied(80, 140, 220, 25);
pub const BG_OFF_DAY: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 40);
pub const BG_HOLIDAY: Color32 = Color32::from_rgba_premultiplied(60, 20, 20, 50);
pub const BG_TODAY_CELL: Color32 = Color32::from_rgba_premultiplied(240, 75, 75, 18);
pub const DRAG_BAND: Color32 = Color32::from_rgba_premultiplied(80, 140, 220, 30);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgb(50, 52, 64);
pub const BORDER_MONTH: Color32 = Color32::from_rgb(82, 86, 104);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(230, 232, 240);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(155, 160, 178);
pub const TEXT_DIM: Color32 = Color32::from_rgb(100, 105, 120);
pub const TEXT_ON_BAR: Color32 = Color32::from_rgb(255, 255, 255);

pub const ACCENT: Color32 = Color32::from_rgb(80, 140, 220);
pub const TODAY_LINE: Color32 = Color32::from_rgb(240, 75, 75);
pub const GRID_LINE: Color32 = Color32::from_rgb(44, 46, 58);
pub const HANDLE_COLOR: Color32 = Color32::from_rgb(255, 255, 255);
pub const CONNECTOR: Color32 = Color32::from_rgb(120, 126, 146);

// ── Sizes ────────────────────────────────────────────────────────────────────

pub const HEADER_HEIGHT: f32 = 44.0;
pub const LIST_WIDTH: f32 = 260.0;
pub const STATUS_BAR_HEIGHT: f32 = 22.0;
pub const BAR_ROUNDING: f32 = 5.0;
/// Vertical inset so bars don't touch row edges.
pub const BAR_INSET_RATIO: f32 = 0.15;

// ── Fonts ────────────────────────────────────────────────────────────────────

pub fn font_header() -> FontId {
    FontId::proportional(12.0)
}

pub fn font_status() -> FontId {
    FontId::proportional(10.5)
}

/// Font at one of the zoom-dependent sizes.
pub fn font_sized(size: f32) -> FontId {
    FontId::proportional(size)
}

// ── Project colors ───────────────────────────────────────────────────────────

pub fn project_color(project: Option<&Project>) -> Color32 {
    project
        .and_then(Project::rgb)
        .map(|[r, g, b]| Color32::from_rgb(r, g, b))
        .unwrap_or(ACCENT)
}

/// Faded variant for completed tasks.
pub fn completed(color: Color32) -> Color32 {
    color.gamma_multiply(0.45)
}

// ── Apply custom visuals ─────────────────────────────────────────────────────

pub fn apply_theme(ctx: &egui::Context) {
    let mut visuals = Visuals::dark();

    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.panel_fill = BG_PANEL;
    visuals.window_fill = BG_PANEL;
    visuals.extreme_bg_color = Color32::from_rgb(20, 20, 28);
    visuals.faint_bg_color = BG_PANEL;
    visuals.striped = false;

    let widgets = &mut visuals.widgets;
    widgets.noninteractive.bg_fill = BG_PANEL;
    widgets.noninteractive.bg_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    widgets.noninteractive.fg_stroke = Stroke::new(1.0, TEXT_SECONDARY);
    widgets.inactive.bg_fill = Color32::from_rgb(42, 44, 56);
    widgets.inactive.bg_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    widgets.hovered.bg_fill = Color32::from_rgb(52, 54, 68);
    widgets.active.bg_fill = Color32::from_rgb(60, 62, 76);
    widgets.open.bg_fill = Color32::from_rgb(50, 52, 66);
    for state in [&mut widgets.hovered, &mut widgets.active, &mut widgets.open] {
        state.bg_stroke = Stroke::new(1.0, ACCENT);
    }
    for state in [
        &mut widgets.noninteractive,
        &mut widgets.inactive,
        &mut widgets.hovered,
        &mut widgets.active,
        &mut widgets.open,
    ] {
        state.rounding = Rounding::same(4.0);
    }

    visuals.selection.bg_fill = BG_SELECTED;
    visuals.selection.stroke = Stroke::new(1.0, ACCENT);
    visuals.window_rounding = Rounding::same(8.0);
    visuals.window_stroke = Stroke::new(1.0, BORDER_SUBTLE);

    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();
    style.spacing.item_spacing = egui::vec2(8.0, 4.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);
    ctx.set_style(style);
}
