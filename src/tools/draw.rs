use bevy::{prelude::*, window::PrimaryWindow};

use crate::layers::VectorLayer;
use crate::tiles::TileMapResources;
use crate::types::{Coord, DrawnFeature, FeatureGeometry};
use crate::EguiBlockInputState;

use super::{label_for, ActiveTool, ModifyState};

/// The one in-progress drawing gesture. At most one exists; switching tools
/// discards it before the new tool takes effect.
#[derive(Resource, Default, Debug, Clone, PartialEq)]
pub enum Draft {
    #[default]
    Idle,
    /// Click-to-append path for lines and polygons, with the rubber-band
    /// cursor position.
    Path {
        polygon: bool,
        vertices: Vec<Coord>,
        cursor: Option<Coord>,
    },
    /// Press-drag-release circle.
    Circle { center: Coord, edge: Coord },
}

impl Draft {
    /// What the renderer shows while the gesture is still open. Polygon
    /// drafts preview as an open path until they are finished.
    pub fn preview_geometry(&self) -> Option<FeatureGeometry> {
        match self {
            Draft::Idle => None,
            Draft::Path {
                vertices, cursor, ..
            } => {
                let mut points = vertices.clone();
                if let Some(cursor) = cursor {
                    points.push(*cursor);
                }
                (points.len() >= 2).then_some(FeatureGeometry::Line(points))
            }
            Draft::Circle { center, edge } => Some(FeatureGeometry::Circle {
                center: *center,
                edge: *edge,
            }),
        }
    }

    /// Completes the gesture. Under-specified drafts (a one-vertex line, a
    /// two-vertex polygon, a zero-radius circle) are discarded.
    pub fn finish(&mut self) -> Option<FeatureGeometry> {
        match std::mem::take(self) {
            Draft::Idle => None,
            Draft::Path {
                polygon: false,
                vertices,
                ..
            } => (vertices.len() >= 2).then_some(FeatureGeometry::Line(vertices)),
            Draft::Path {
                polygon: true,
                vertices,
                ..
            } => (vertices.len() >= 3).then_some(FeatureGeometry::Polygon(vertices)),
            Draft::Circle { center, edge } => {
                (center != edge).then_some(FeatureGeometry::Circle { center, edge })
            }
        }
    }

    pub fn discard(&mut self) {
        *self = Draft::Idle;
    }
}

/// Tearing down the previous drawing interaction when the tool changes:
/// whatever was half-drawn is dropped, never committed.
pub fn handle_tool_change(
    tool: Res<ActiveTool>,
    mut draft: ResMut<Draft>,
    mut layer: ResMut<VectorLayer>,
) {
    if tool.is_changed() && !tool.is_added() && *draft != Draft::Idle {
        draft.discard();
        layer.respawn = true;
    }
}

pub fn handle_draw(
    tool: Res<ActiveTool>,
    mut draft: ResMut<Draft>,
    mut layer: ResMut<VectorLayer>,
    modify: Res<ModifyState>,
    camera: Query<(&Camera, &GlobalTransform), With<Camera2d>>,
    q_windows: Query<&Window, With<PrimaryWindow>>,
    buttons: Res<ButtonInput<MouseButton>>,
    tiles: Res<TileMapResources>,
    state: Res<EguiBlockInputState>,
) {
    if *tool == ActiveTool::Select || state.block_input || modify.dragging() {
        return;
    }
    let Ok((camera, camera_transform)) = camera.single() else {
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

    match *tool {
        ActiveTool::Select => {}
        ActiveTool::Point => {
            if buttons.just_pressed(MouseButton::Left) {
                commit(&mut layer, FeatureGeometry::Point(pos));
            }
        }
        ActiveTool::Line | ActiveTool::Polygon => {
            let polygon = *tool == ActiveTool::Polygon;
            if buttons.just_pressed(MouseButton::Left) {
                if let Draft::Path { vertices, .. } = &mut *draft {
                    vertices.push(pos);
                } else {
                    *draft = Draft::Path {
                        polygon,
                        vertices: vec![pos],
                        cursor: Some(pos),
                    };
                }
                layer.respawn = true;
            }
            if let Draft::Path { cursor, .. } = &mut *draft {
                if *cursor != Some(pos) {
                    *cursor = Some(pos);
                    layer.respawn = true;
                }
            }
            if buttons.just_pressed(MouseButton::Right) && *draft != Draft::Idle {
                match draft.finish() {
                    Some(geometry) => commit(&mut layer, geometry),
                    None => layer.respawn = true,
                }
            }
        }
        ActiveTool::Circle => {
            if buttons.just_pressed(MouseButton::Left) {
                *draft = Draft::Circle {
                    center: pos,
                    edge: pos,
                };
                layer.respawn = true;
            }
            if buttons.pressed(MouseButton::Left) {
                if let Draft::Circle { edge, .. } = &mut *draft {
                    if *edge != pos {
                        *edge = pos;
                        layer.respawn = true;
                    }
                }
            }
            if buttons.just_released(MouseButton::Left) && matches!(*draft, Draft::Circle { .. }) {
                match draft.finish() {
                    Some(geometry) => commit(&mut layer, geometry),
                    None => layer.respawn = true,
                }
            }
        }
    }
}

/// Gesture completion: measure, label, and append to the vector layer.
fn commit(layer: &mut VectorLayer, geometry: FeatureGeometry) {
    let mut feature = DrawnFeature::new(geometry);
    feature.label = label_for(&feature.geometry);
    match &feature.geometry {
        FeatureGeometry::Point(coord) => {
            info!("point at {:.6}, {:.6}", coord.lat, coord.long);
        }
        _ => {
            if let Some(label) = &feature.label {
                info!("measured {label}");
            }
        }
    }
    layer.add_feature(feature);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_needs_two_vertices() {
        let mut draft = Draft::Path {
            polygon: false,
            vertices: vec![Coord::new(0.0, 0.0)],
            cursor: Some(Coord::new(1.0, 1.0)),
        };
        assert_eq!(draft.finish(), None);
        assert_eq!(draft, Draft::Idle);

        let mut draft = Draft::Path {
            polygon: false,
            vertices: vec![Coord::new(0.0, 0.0), Coord::new(1.0, 1.0)],
            cursor: None,
        };
        let Some(FeatureGeometry::Line(points)) = draft.finish() else {
            panic!("expected a line");
        };
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn polygon_needs_three_vertices() {
        let mut draft = Draft::Path {
            polygon: true,
            vertices: vec![Coord::new(0.0, 0.0), Coord::new(0.0, 1.0)],
            cursor: None,
        };
        assert_eq!(draft.finish(), None);

        let mut draft = Draft::Path {
            polygon: true,
            vertices: vec![
                Coord::new(0.0, 0.0),
                Coord::new(0.0, 1.0),
                Coord::new(1.0, 1.0),
            ],
            cursor: Some(Coord::new(5.0, 5.0)),
        };
        let Some(FeatureGeometry::Polygon(points)) = draft.finish() else {
            panic!("expected a polygon");
        };
        // The rubber-band cursor is never part of the committed ring.
        assert_eq!(points.len(), 3);
    }

    #[test]
    fn zero_radius_circle_is_discarded() {
        let center = Coord::new(12.0, 34.0);
        let mut draft = Draft::Circle {
            center,
            edge: center,
        };
        assert_eq!(draft.finish(), None);

        let mut draft = Draft::Circle {
            center,
            edge: Coord::new(12.0, 34.5),
        };
        assert!(matches!(
            draft.finish(),
            Some(FeatureGeometry::Circle { .. })
        ));
    }

    #[test]
    fn finishing_always_resets_to_idle() {
        let mut draft = Draft::Circle {
            center: Coord::new(0.0, 0.0),
            edge: Coord::new(0.0, 1.0),
        };
        draft.finish();
        assert_eq!(draft, Draft::Idle);
        // A second finish on the idle draft yields nothing: no way to end
        // up with two drawing interactions' worth of output from one
        // gesture.
        assert_eq!(draft.finish(), None);
    }

    #[test]
    fn tool_change_discards_open_draft() {
        let mut app = App::new();
        app.insert_resource(ActiveTool::Line)
            .insert_resource(Draft::default())
            .insert_resource(VectorLayer::default())
            .add_systems(Update, handle_tool_change);
        // First update consumes the insertion tick so the change detection
        // below sees only the tool switch.
        app.update();

        *app.world_mut().resource_mut::<Draft>() = Draft::Path {
            polygon: false,
            vertices: vec![Coord::new(0.0, 0.0)],
            cursor: Some(Coord::new(1.0, 1.0)),
        };
        *app.world_mut().resource_mut::<ActiveTool>() = ActiveTool::Circle;
        app.update();

        assert_eq!(*app.world().resource::<Draft>(), Draft::Idle);
        let layer = app.world().resource::<VectorLayer>();
        assert!(layer.features.is_empty());
        assert!(layer.respawn);
    }

    #[test]
    fn preview_includes_rubber_band() {
        let draft = Draft::Path {
            polygon: true,
            vertices: vec![Coord::new(0.0, 0.0)],
            cursor: Some(Coord::new(1.0, 1.0)),
        };
        let Some(FeatureGeometry::Line(points)) = draft.preview_geometry() else {
            panic!("expected an open preview path");
        };
        assert_eq!(points.len(), 2);
        assert_eq!(Draft::Idle.preview_geometry(), None);
    }
}
