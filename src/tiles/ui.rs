//! Basemap picker: one checkbox per provider, top-right corner.

use bevy::prelude::*;
use bevy_egui::{
    egui::{self, RichText},
    EguiContexts, EguiPreUpdateSet,
};

use crate::settings::AppSettings;

use super::TileMapResources;

pub struct TilesUiPlugin;

impl Plugin for TilesUiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, tile_ui.after(EguiPreUpdateSet::InitContexts));
    }
}

fn tile_ui(
    mut res_manager: ResMut<TileMapResources>,
    mut settings: ResMut<AppSettings>,
    mut contexts: EguiContexts,
) {
    let ctx = contexts.ctx_mut();

    let tilebox_width = 250.0;
    let tilebox_height = 75.0;

    let screen_rect = ctx.screen_rect();
    let tilebox_pos = egui::pos2((screen_rect.width() - tilebox_width) - 10.0, 10.0);

    egui::Area::new("tilebox".into())
        .fixed_pos(tilebox_pos)
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
                    ui.set_width(tilebox_width);
                    ui.set_height(tilebox_height);
                    ui.spacing_mut().item_spacing = egui::vec2(8.0, 10.0);

                    ui.vertical_centered(|ui| {
                        egui::ScrollArea::vertical().show(ui, |ui| {
                            ui.spacing_mut().item_spacing = egui::vec2(8.0, 10.0);
                            ui.set_max_width(tilebox_width);
                            for provider in res_manager.chunk_manager.providers.clone() {
                                let mut enabled = provider.enabled;
                                ui.horizontal_wrapped(|ui| {
                                    ui.set_max_width(tilebox_width);
                                    if ui
                                        .checkbox(&mut enabled, RichText::new(&provider.name))
                                        .clicked()
                                    {
                                        res_manager
                                            .chunk_manager
                                            .enable_only_provider(&provider.url);
                                        settings.tile_providers =
                                            res_manager.chunk_manager.providers.clone();
                                        if let Err(e) = settings.save() {
                                            warn!("could not persist settings: {e:#}");
                                        }
                                    }
                                });
                            }
                        });
                    });
                });
        });
}
