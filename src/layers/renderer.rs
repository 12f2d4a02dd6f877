use bevy::prelude::*;
use bevy::render::view::RenderLayers;

use crate::tiles::{TileMapResources, ZoomChangedEvent};
use crate::tools::Draft;
use crate::types::FeatureGeometry;

use super::{buffers_to_mesh, fill_polygon, stroke_polyline, VectorLayer};

#[derive(Component)]
pub struct FeatureMarker;

const FEATURE_Z: f32 = 10.0;
const LABEL_Z: f32 = 30.0;
const LINE_WIDTH: f32 = 3.0;
const POINT_RADIUS: f32 = 7.0;
const HANDLE_RADIUS: f32 = 4.0;

fn stroke_color(draft: bool) -> Color {
    Color::srgba(1.0, 0.8, 0.2, if draft { 0.6 } else { 1.0 })
}

fn fill_color(draft: bool) -> Color {
    Color::srgba(1.0, 1.0, 1.0, if draft { 0.1 } else { 0.2 })
}

/// Despawns and respawns every feature entity whenever the layer is dirty.
/// Zoom steps rescale the whole world, so they dirty the layer too.
pub fn respawn_features(
    mut commands: Commands,
    spawned: Query<Entity, With<FeatureMarker>>,
    mut layer: ResMut<VectorLayer>,
    draft: Res<Draft>,
    tiles: Res<TileMapResources>,
    mut zoom_events: EventReader<ZoomChangedEvent>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    if !zoom_events.is_empty() {
        zoom_events.clear();
        layer.respawn = true;
    }
    if !layer.respawn {
        return;
    }
    layer.respawn = false;

    for entity in spawned.iter() {
        commands.entity(entity).despawn();
    }

    for feature in &layer.features {
        spawn_geometry(
            &mut commands,
            &mut meshes,
            &mut materials,
            &tiles,
            &feature.geometry,
            false,
        );
        if let Some(label) = &feature.label {
            let anchor = tiles.coord_to_world(feature.geometry.label_anchor());
            commands.spawn((
                Text2d::new(label.clone()),
                TextFont {
                    font_size: 14.0,
                    ..default()
                },
                TextColor(Color::BLACK),
                Transform::from_translation(Vec3::new(anchor.x, anchor.y, LABEL_Z)),
                FeatureMarker,
                RenderLayers::layer(1),
            ));
        }
    }

    if let Some(preview) = draft.preview_geometry() {
        spawn_geometry(
            &mut commands,
            &mut meshes,
            &mut materials,
            &tiles,
            &preview,
            true,
        );
    }
}

fn spawn_geometry(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<ColorMaterial>,
    tiles: &TileMapResources,
    geometry: &FeatureGeometry,
    draft: bool,
) {
    let stroke = materials.add(stroke_color(draft));
    let fill = materials.add(fill_color(draft));
    let points: Vec<Vec2> = geometry
        .vertices()
        .iter()
        .map(|c| tiles.coord_to_world(*c))
        .collect();

    match geometry {
        FeatureGeometry::Point(_) => {
            commands.spawn((
                Mesh2d(meshes.add(Circle::new(POINT_RADIUS))),
                MeshMaterial2d(stroke),
                Transform::from_translation(points[0].extend(FEATURE_Z)),
                FeatureMarker,
                RenderLayers::layer(1),
            ));
        }
        FeatureGeometry::Line(_) => {
            if let Some(buffers) = stroke_polyline(&points, LINE_WIDTH, false) {
                commands.spawn((
                    Mesh2d(meshes.add(buffers_to_mesh(buffers))),
                    MeshMaterial2d(stroke.clone()),
                    Transform::from_xyz(0.0, 0.0, FEATURE_Z),
                    FeatureMarker,
                    RenderLayers::layer(1),
                ));
            }
            spawn_handles(commands, meshes, stroke, &points);
        }
        FeatureGeometry::Polygon(_) => {
            if !draft {
                if let Some(buffers) = fill_polygon(&points) {
                    commands.spawn((
                        Mesh2d(meshes.add(buffers_to_mesh(buffers))),
                        MeshMaterial2d(fill),
                        Transform::from_xyz(0.0, 0.0, FEATURE_Z),
                        FeatureMarker,
                        RenderLayers::layer(1),
                    ));
                }
            }
            if let Some(buffers) = stroke_polyline(&points, LINE_WIDTH, !draft) {
                commands.spawn((
                    Mesh2d(meshes.add(buffers_to_mesh(buffers))),
                    MeshMaterial2d(stroke.clone()),
                    Transform::from_xyz(0.0, 0.0, FEATURE_Z + 0.1),
                    FeatureMarker,
                    RenderLayers::layer(1),
                ));
            }
            spawn_handles(commands, meshes, stroke, &points);
        }
        FeatureGeometry::Circle { .. } => {
            let radius = (points[0] - points[1]).length();
            if radius <= f32::EPSILON {
                return;
            }
            commands.spawn((
                Mesh2d(meshes.add(Circle::new(radius))),
                MeshMaterial2d(fill),
                Transform::from_translation(points[0].extend(FEATURE_Z)),
                FeatureMarker,
                RenderLayers::layer(1),
            ));
            commands.spawn((
                Mesh2d(meshes.add(Annulus::new(
                    (radius - LINE_WIDTH / 2.0).max(0.0),
                    radius + LINE_WIDTH / 2.0,
                ))),
                MeshMaterial2d(stroke.clone()),
                Transform::from_translation(points[0].extend(FEATURE_Z + 0.1)),
                FeatureMarker,
                RenderLayers::layer(1),
            ));
            spawn_handles(commands, meshes, stroke, &points);
        }
    }
}

/// Small dots on every editable vertex, the grab affordance for the modify
/// interaction.
fn spawn_handles(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    material: Handle<ColorMaterial>,
    points: &[Vec2],
) {
    for p in points {
        commands.spawn((
            Mesh2d(meshes.add(Circle::new(HANDLE_RADIUS))),
            MeshMaterial2d(material.clone()),
            Transform::from_translation(p.extend(FEATURE_Z + 0.2)),
            FeatureMarker,
            RenderLayers::layer(1),
        ));
    }
}
