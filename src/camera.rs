use bevy::{prelude::*, render::view::RenderLayers};
use bevy_pancam::{DirectionKeys, PanCam, PanCamPlugin};

use crate::tiles::TileMapResources;
use crate::EguiBlockInputState;

pub struct CameraSystemPlugin;

impl Plugin for CameraSystemPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(PanCamPlugin)
            .add_systems(Startup, setup_camera)
            .add_systems(Update, (handle_pancam, track_camera));
    }
}

/// Viewport size in world units at the given projection scale.
pub fn camera_rect(window: &Window, scale: f32) -> (f32, f32) {
    (window.width() * scale, window.height() * scale)
}

fn setup_camera(mut commands: Commands, res_manager: Res<TileMapResources>) {
    let starting = res_manager.coord_to_world(res_manager.location_manager.location);

    commands.spawn((
        Camera2d,
        RenderLayers::from_layers(&[0, 1]),
        Camera { ..default() },
        Transform {
            translation: Vec3::new(starting.x, starting.y, 1.0),
            ..Default::default()
        },
        PanCam {
            grab_buttons: vec![MouseButton::Middle],
            move_keys: DirectionKeys {
                up: vec![KeyCode::ArrowUp],
                down: vec![KeyCode::ArrowDown],
                left: vec![KeyCode::ArrowLeft],
                right: vec![KeyCode::ArrowRight],
            },
            speed: 400.,
            enabled: true,
            zoom_to_cursor: true,
            min_scale: 0.01,
            max_scale: f32::INFINITY,
            min_x: f32::NEG_INFINITY,
            max_x: f32::INFINITY,
            min_y: f32::NEG_INFINITY,
            max_y: f32::INFINITY,
        },
    ));
}

fn handle_pancam(mut query: Query<&mut PanCam>, state: Res<EguiBlockInputState>) {
    if state.is_changed() {
        for mut pancam in &mut query {
            pancam.enabled = !state.block_input;
        }
    }
}

/// Follows the camera so the tracked geographic location survives zoom
/// re-anchoring, and keeps new chunks loading while panning.
fn track_camera(
    camera_query: Query<&Transform, (With<Camera2d>, Changed<Transform>)>,
    mut res_manager: ResMut<TileMapResources>,
) {
    let Ok(transform) = camera_query.single() else {
        return;
    };
    let location = res_manager.world_to_coord(transform.translation.xy());
    res_manager.location_manager.location = location;
    res_manager.chunk_manager.update = true;
}
