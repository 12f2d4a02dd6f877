use bevy::{
    prelude::*,
    winit::{UpdateMode, WinitSettings},
};

use bevy_egui::EguiPlugin;
use camera::CameraSystemPlugin;
use debug::DebugPlugin;
use layers::VectorLayerPlugin;
use settings::AppSettings;
use tiles::TileMapPlugin;
use tools::ToolsPlugin;
use types::Coord;

pub mod camera;
pub mod debug;
pub mod layers;
pub mod settings;
pub mod tiles;
pub mod tools;
pub mod types;

/// Anchor for the tile-pixel world mapping; halves or doubles as the zoom
/// steps.
pub const STARTING_REFERENCE: Coord = Coord::new(0.011, 0.011);
// This can be changed, it changes the size of each tile too.
pub const TILE_PIXELS: i32 = 256;

fn main() {
    let settings = AppSettings::load();

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "GeoSketch".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }))
        .add_plugins(DebugPlugin)
        .add_plugins(EguiPlugin {
            enable_multipass_for_primary_context: false,
        })
        .add_plugins(TileMapPlugin {
            starting_location: settings.starting_location,
            starting_zoom: settings.starting_zoom,
            tile_pixels: TILE_PIXELS as f32,
            providers: settings.tile_providers.clone(),
        })
        .insert_resource(settings)
        .insert_resource(EguiBlockInputState::default())
        .add_plugins((CameraSystemPlugin, VectorLayerPlugin, ToolsPlugin))
        .insert_resource(WinitSettings {
            unfocused_mode: UpdateMode::Reactive {
                wait: std::time::Duration::from_secs(1),
                react_to_device_events: true,
                react_to_user_events: true,
                react_to_window_events: true,
            },
            ..Default::default()
        })
        .insert_resource(ClearColor(Color::from(Srgba {
            red: 0.9,
            green: 0.9,
            blue: 0.8,
            alpha: 1.0,
        })))
        .add_systems(Update, absorb_egui_inputs)
        .run();
}

/// Pointer-over-egui flag sampled once per frame; map interactions bail out
/// while it is set so UI clicks never reach the map.
#[derive(Resource, Default)]
pub struct EguiBlockInputState {
    pub block_input: bool,
}

fn absorb_egui_inputs(
    mut contexts: bevy_egui::EguiContexts,
    mut state: ResMut<EguiBlockInputState>,
) {
    let ctx = contexts.ctx_mut();
    state.block_input = ctx.wants_pointer_input() || ctx.is_pointer_over_area();
}
