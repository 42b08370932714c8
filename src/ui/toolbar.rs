use egui::{menu, RichText, Ui};
use egui_phosphor::regular as icons;

use crate::app::TimelineApp;
use crate::ui::theme;
use todo_timeline::timeline::ViewUnit;

/// Render the top toolbar / menu bar.
pub fn show_toolbar(app: &mut TimelineApp, ui: &mut Ui) {
    menu::bar(ui, |ui| {
        ui.menu_button(RichText::new("  View  ").font(theme::font_header()), |ui| {
            if ui.button("  Zoom In        Ctrl+=").clicked() {
                app.zoom_in();
                ui.close_menu();
            }
            if ui.button("  Zoom Out      Ctrl+-").clicked() {
                app.zoom_out();
                ui.close_menu();
            }
            if ui.button("  Reset Zoom    Ctrl+0").clicked() {
                app.reset_zoom();
                ui.close_menu();
            }
            if ui.button("  Fit to Screen").clicked() {
                app.fit_to_screen();
                ui.close_menu();
            }
            ui.separator();
            ui.label(RichText::new("Timeline Scale").small().weak());
            for unit in [ViewUnit::Day, ViewUnit::Week] {
                if ui.radio(app.unit() == unit, unit.label()).clicked() {
                    app.set_view_unit(unit);
                    ui.close_menu();
                }
            }
            ui.separator();
            if ui.button("  Go to Today   T").clicked() {
                app.scroll_to_today();
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  Select  ").font(theme::font_header()), |ui| {
            if ui.button("  Select All    Ctrl+A").clicked() {
                app.select_all();
                ui.close_menu();
            }
            if ui.button("  Clear            Esc").clicked() {
                app.clear_selection();
                ui.close_menu();
            }
        });

        ui.separator();

        if ui
            .button(icons::MAGNIFYING_GLASS_MINUS)
            .on_hover_text("Zoom out")
            .clicked()
        {
            app.zoom_out();
        }
        ui.label(
            RichText::new(format!("{}%", app.zoom_percent()))
                .size(11.0)
                .color(theme::TEXT_SECONDARY),
        );
        if ui
            .button(icons::MAGNIFYING_GLASS_PLUS)
            .on_hover_text("Zoom in")
            .clicked()
        {
            app.zoom_in();
        }
        if ui
            .button(icons::ARROWS_IN_SIMPLE)
            .on_hover_text("Fit to screen")
            .clicked()
        {
            app.fit_to_screen();
        }
        if ui
            .button(format!("{} Today", icons::CROSSHAIR))
            .on_hover_text("Scroll to today")
            .clicked()
        {
            app.scroll_to_today();
        }

        ui.separator();
        for unit in [ViewUnit::Day, ViewUnit::Week] {
            if ui.selectable_label(app.unit() == unit, unit.label()).clicked() {
                app.set_view_unit(unit);
            }
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(
                RichText::new(format!("{} {}", icons::CALENDAR_BLANK, app.range_label()))
                    .size(11.0)
                    .weak(),
            );
        });
    });
}
