use bevy::{prelude::*, window::PrimaryWindow};
use uuid::Uuid;

use crate::layers::VectorLayer;
use crate::tiles::TileMapResources;
use crate::types::Coord;
use crate::EguiBlockInputState;

use super::{label_for, Draft};

/// On-screen grab distance for picking up a vertex, in logical pixels.
const GRAB_TOLERANCE: f32 = 12.0;

/// World-space grab radius: the on-screen tolerance widens with the
/// orthographic scale so the affordance stays constant between zoom steps.
fn grab_radius(projection: &Projection) -> f32 {
    match projection {
        Projection::Orthographic(ortho) => GRAB_TOLERANCE * ortho.scale,
        _ => GRAB_TOLERANCE,
    }
}

#[derive(Debug, Clone, Copy)]
struct DragHandle {
    feature: Uuid,
    index: usize,
}

/// The always-on modify interaction: whichever vertex is being dragged, if
/// any. Installed once and never torn down, independent of the active tool.
#[derive(Resource, Default)]
pub struct ModifyState {
    drag: Option<DragHandle>,
}

impl ModifyState {
    pub fn dragging(&self) -> bool {
        self.drag.is_some()
    }
}

pub fn handle_modify(
    mut modify: ResMut<ModifyState>,
    mut layer: ResMut<VectorLayer>,
    draft: Res<Draft>,
    camera: Query<(&Camera, &GlobalTransform, &Projection), With<Camera2d>>,
    q_windows: Query<&Window, With<PrimaryWindow>>,
    buttons: Res<ButtonInput<MouseButton>>,
    tiles: Res<TileMapResources>,
    state: Res<EguiBlockInputState>,
) {
    if state.block_input {
        return;
    }
    let Ok((camera, camera_transform, projection)) = camera.single() else {
        return;
    };
    let Ok(window) = q_windows.single() else {
        return;
    };
    let Some(position) = window.cursor_position() else {
        return;
    };
    let Ok(world_pos) = camera.viewport_to_world_2d(camera_transform, position) else {
        return;
    };
    let pos = tiles.world_to_coord(world_pos);

    // A press only becomes a drag when it lands on a vertex and no drawing
    // gesture is open; otherwise the draw system gets the click.
    if buttons.just_pressed(MouseButton::Left) && modify.drag.is_none() && *draft == Draft::Idle {
        if let Some(handle) = layer.nearest_vertex(pos) {
            let vertex = Coord::new(handle.position[1] as f32, handle.position[0] as f32);
            if tiles.coord_to_world(vertex).distance(world_pos) <= grab_radius(projection) {
                modify.drag = Some(DragHandle {
                    feature: handle.feature,
                    index: handle.index,
                });
            }
        }
    }

    if let Some(drag) = modify.drag {
        if buttons.pressed(MouseButton::Left) {
            layer.set_vertex(drag.feature, drag.index, pos);
            if let Some(feature) = layer.feature_mut(drag.feature) {
                feature.label = label_for(&feature.geometry);
            }
        }
        if buttons.just_released(MouseButton::Left) {
            layer.rebuild_vertex_index();
            layer.respawn = true;
            modify.drag = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grab_radius_tracks_projection_scale() {
        let mut ortho = OrthographicProjection::default_2d();
        ortho.scale = 1.0;
        assert_eq!(grab_radius(&Projection::Orthographic(ortho.clone())), GRAB_TOLERANCE);
        // Zoomed out to twice the world per pixel, the world-space radius
        // doubles so the on-screen affordance stays put.
        ortho.scale = 2.0;
        assert_eq!(
            grab_radius(&Projection::Orthographic(ortho)),
            GRAB_TOLERANCE * 2.0
        );
    }
}
