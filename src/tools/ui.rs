use bevy::prelude::*;
use bevy_egui::{
    egui::{self, Color32, RichText},
    EguiContexts,
};

use crate::layers::VectorLayer;

use super::{ActiveTool, Draft};

const TOOLS: [(ActiveTool, &str); 5] = [
    (ActiveTool::Select, "Select"),
    (ActiveTool::Point, "Point"),
    (ActiveTool::Line, "Line"),
    (ActiveTool::Polygon, "Polygon"),
    (ActiveTool::Circle, "Circle"),
];

pub fn toolbar_ui(
    mut tool: ResMut<ActiveTool>,
    mut draft: ResMut<Draft>,
    mut layer: ResMut<VectorLayer>,
    mut contexts: EguiContexts,
) {
    let ctx = contexts.ctx_mut();

    let toolbar_width = 450.0;
    let toolbar_height = 40.0;

    let screen_rect = ctx.screen_rect();
    let toolbar_pos = egui::pos2(
        (screen_rect.width() - toolbar_width) / 2.0,
        screen_rect.height() - toolbar_height - 10.0,
    );

    egui::Area::new("toolbar".into())
        .fixed_pos(toolbar_pos)
        .show(ctx, |ui| {
            egui::Frame::new()
                .fill(egui::Color32::from_rgba_premultiplied(30, 30, 30, 220))
                .corner_radius(10.0)
                .shadow(egui::epaint::Shadow {
                    color: egui::Color32::from_black_alpha(60),
                    offset: [5, 5],
                    blur: 10,
                    spread: 5,
                })
                .show(ui, |ui| {
                    ui.set_width(toolbar_width);
                    ui.set_height(toolbar_height);

                    ui.horizontal_centered(|ui| {
                        ui.spacing_mut().item_spacing = egui::vec2(8.0, 0.0);
                        let button_selected = |selected: bool, text: &str| {
                            if selected {
                                egui::Button::new(RichText::new(text).color(Color32::WHITE))
                                    .fill(Color32::from_rgb(70, 130, 180))
                                    .corner_radius(8.0)
                            } else {
                                egui::Button::new(RichText::new(text).color(Color32::WHITE))
                                    .fill(Color32::from_rgb(40, 40, 40))
                                    .corner_radius(8.0)
                            }
                        };

                        ui.add(egui::Label::new(""));

                        for (kind, name) in TOOLS {
                            if ui
                                .add_sized([64.0, 30.0], button_selected(*tool == kind, name))
                                .clicked()
                                && *tool != kind
                            {
                                *tool = kind;
                            }
                        }

                        if ui
                            .add_sized(
                                [72.0, 30.0],
                                egui::Button::new(RichText::new("Clear All").color(Color32::WHITE))
                                    .fill(Color32::from_rgb(150, 40, 40))
                                    .corner_radius(8.0),
                            )
                            .clicked()
                        {
                            draft.discard();
                            layer.clear();
                        }
                    });
                });
        });
}

/// Accumulated point coordinates, six decimal places, shown only while at
/// least one record exists.
pub fn results_ui(layer: Res<VectorLayer>, mut contexts: EguiContexts) {
    if layer.coordinate_records.is_empty() {
        return;
    }
    let ctx = contexts.ctx_mut();

    let panel_width = 200.0;
    let panel_height = 250.0;

    let screen_rect = ctx.screen_rect();
    let panel_pos = egui::pos2(
        screen_rect.width() - panel_width - 10.0,
        screen_rect.height() - panel_height - 60.0,
    );

    egui::Area::new("results".into())
        .fixed_pos(panel_pos)
        .show(ctx, |ui| {
            egui::Frame::new()
                .fill(egui::Color32::from_rgba_premultiplied(30, 30, 30, 255))
                .corner_radius(10.0)
                .shadow(egui::epaint::Shadow {
                    color: egui::Color32::from_black_alpha(60),
                    offset: [5, 5],
                    blur: 10,
                    spread: 5,
                })
                .show(ui, |ui| {
                    ui.set_min_width(panel_width);
                    ui.set_max_width(panel_width);
                    ui.set_max_height(panel_height);
                    ui.spacing_mut().item_spacing = egui::vec2(8.0, 4.0);

                    ui.label(
                        RichText::new("Points")
                            .color(Color32::WHITE)
                            .strong(),
                    );
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        for (index, coord) in layer.coordinate_records.iter().enumerate() {
                            ui.label(
                                RichText::new(format!("Point {}:", index + 1))
                                    .color(Color32::from_rgb(221, 221, 221)),
                            );
                            ui.label(
                                RichText::new(format!("  Latitude: {:.6}\u{b0}", coord.lat))
                                    .color(Color32::from_rgb(180, 180, 180)),
                            );
                            ui.label(
                                RichText::new(format!("  Longitude: {:.6}\u{b0}", coord.long))
                                    .color(Color32::from_rgb(180, 180, 180)),
                            );
                        }
                    });
                });
        });
}
