use std::thread;

use bevy::{
    image::Image,
    input::mouse::MouseWheel,
    prelude::*,
    render::render_resource::{Extent3d, TextureDimension, TextureFormat},
    sprite::Anchor,
    window::PrimaryWindow,
};

use crate::camera::camera_rect;
use crate::types::{world_to_lat_long, Tile};
use crate::EguiBlockInputState;

use super::{
    fetch_raster_tile, Clean, FetchedTile, FetchedTileData, TileCacheDir, TileMapResources,
    TileReceiver, TileSender, ZoomChangedEvent,
};

/// How many chunks out from the camera's chunk get fetched.
const SPAWN_RANGE: i32 = 4;

#[derive(Component)]
pub struct TileMarker;

fn camera_pos_to_chunk_pos(camera_pos: Vec2, tile_pixels: f32) -> IVec2 {
    (camera_pos / tile_pixels).floor().as_ivec2()
}

fn chunk_pos_to_world_pos(chunk_pos: IVec2, tile_pixels: f32) -> Vec2 {
    chunk_pos.as_vec2() * tile_pixels
}

/// World position of a tile's south-west corner, the sprite anchor. Snapped
/// to the slippy grid rather than the chunk grid so neighbors never seam.
fn tile_origin(tile: Tile, reference: crate::types::Coord, tile_pixels: f32) -> Vec2 {
    Tile::new(tile.x, tile.y + 1, tile.zoom)
        .to_lat_long()
        .to_world_coords(reference, tile.zoom, tile_pixels.into())
}

/// Steps the integer tile zoom when the projection scale drifts far enough
/// that tiles are too coarse or too dense for the viewport. Stepping
/// re-anchors the reference coordinate so world units keep matching tile
/// pixels, then rebuilds the basemap from scratch.
pub fn detect_zoom_level(
    mut res_manager: ResMut<TileMapResources>,
    mut camera_query: Query<(&mut Projection, &mut Transform), With<Camera2d>>,
    state: Res<EguiBlockInputState>,
    q_windows: Query<&Window, With<PrimaryWindow>>,
    evr_scroll: EventReader<MouseWheel>,
    mut clean: ResMut<Clean>,
    mut zoom_event: EventWriter<ZoomChangedEvent>,
) {
    let Ok((mut projection, mut camera)) = camera_query.single_mut() else {
        return;
    };
    let Projection::Orthographic(ortho) = &mut *projection else {
        return;
    };
    let Ok(window) = q_windows.single() else {
        return;
    };

    if ortho.scale != res_manager.zoom_manager.last_projection_scale
        && !state.block_input
        && !evr_scroll.is_empty()
    {
        res_manager.zoom_manager.last_projection_scale = ortho.scale;
        let width =
            camera_rect(window, ortho.scale).0 / res_manager.zoom_manager.tile_pixels;
        let stepped = if width > 6.5 && res_manager.zoom_manager.zoom_level > 3 {
            res_manager.zoom_manager.zoom_level -= 1;
            res_manager.chunk_manager.reference_long_lat *= crate::types::Coord::new(2., 2.);
            true
        } else if width < 3.5 && res_manager.zoom_manager.zoom_level < 20 {
            res_manager.zoom_manager.zoom_level += 1;
            res_manager.chunk_manager.reference_long_lat /= crate::types::Coord::new(2., 2.);
            true
        } else {
            false
        };

        if stepped {
            // Keep the camera over the same geographic spot under the new
            // world-space mapping.
            let location = res_manager.location_manager.location;
            camera.translation = res_manager.coord_to_world(location).extend(1.0);
            ortho.scale = 1.0;
            res_manager.zoom_manager.last_projection_scale = 1.0;
            res_manager.chunk_manager.update = true;
            clean.clean = true;
            zoom_event.write(ZoomChangedEvent);
        }
    }

    if res_manager.chunk_manager.provider_changed {
        res_manager.chunk_manager.provider_changed = false;
        res_manager.chunk_manager.update = true;
        clean.clean = true;
        zoom_event.write(ZoomChangedEvent);
    }
}

pub fn spawn_tiles_around_camera(
    camera_query: Query<&Transform, With<Camera2d>>,
    tile_sender: Res<TileSender>,
    cache_dir: Res<TileCacheDir>,
    mut res_manager: ResMut<TileMapResources>,
) {
    if !res_manager.chunk_manager.update {
        return;
    }
    res_manager.chunk_manager.update = false;

    let Some(provider) = res_manager.chunk_manager.enabled_provider().cloned() else {
        return;
    };
    let Ok(transform) = camera_query.single() else {
        return;
    };

    let tile_pixels = res_manager.zoom_manager.tile_pixels;
    let camera_chunk_pos = camera_pos_to_chunk_pos(transform.translation.xy(), tile_pixels);

    for y in (camera_chunk_pos.y - SPAWN_RANGE)..=(camera_chunk_pos.y + SPAWN_RANGE) {
        for x in (camera_chunk_pos.x - SPAWN_RANGE)..=(camera_chunk_pos.x + SPAWN_RANGE) {
            let chunk_pos = IVec2::new(x, y);
            if res_manager.chunk_manager.spawned_chunks.contains(&chunk_pos) {
                continue;
            }
            res_manager.chunk_manager.spawned_chunks.insert(chunk_pos);

            let tx = tile_sender.0.clone();
            let zoom = res_manager.zoom_manager.zoom_level;
            let reference = res_manager.chunk_manager.reference_long_lat;
            let world_pos = chunk_pos_to_world_pos(chunk_pos, tile_pixels);
            let position = world_to_lat_long(
                world_pos.x.into(),
                world_pos.y.into(),
                reference,
                zoom,
                tile_pixels,
            );
            let tile = position.to_tile_coords(zoom);
            let origin = tile_origin(tile, reference, tile_pixels);
            let url = provider.url.clone();
            let cache = cache_dir.0.clone();
            thread::spawn(move || {
                match fetch_raster_tile(tile, &url, &cache) {
                    Ok(image) => {
                        let fetched = FetchedTile {
                            chunk: chunk_pos,
                            origin,
                            width: image.width(),
                            height: image.height(),
                            rgba: image.into_raw(),
                        };
                        if let Err(e) = tx.send(fetched) {
                            warn!("dropping fetched tile: {e}");
                        }
                    }
                    Err(e) => warn!("tile {}/{}/{} failed: {e:#}", tile.zoom, tile.x, tile.y),
                }
            });
        }
    }
}

pub fn read_tile_receiver(
    receiver: Res<TileReceiver>,
    mut res_manager: ResMut<TileMapResources>,
) {
    while let Ok(fetched) = receiver.try_recv() {
        res_manager
            .chunk_manager
            .to_spawn_chunks
            .entry(fetched.chunk)
            .or_insert(FetchedTileData {
                origin: fetched.origin,
                width: fetched.width,
                height: fetched.height,
                rgba: fetched.rgba,
            });
    }
}

pub fn spawn_ready_tiles(
    mut commands: Commands,
    mut images: ResMut<Assets<Image>>,
    mut res_manager: ResMut<TileMapResources>,
) {
    let tile_pixels = res_manager.zoom_manager.tile_pixels;
    let ready: Vec<(IVec2, FetchedTileData)> = res_manager
        .chunk_manager
        .to_spawn_chunks
        .drain()
        .collect();
    for (chunk_pos, data) in ready {
        let image = Image::new(
            Extent3d {
                width: data.width,
                height: data.height,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            data.rgba,
            TextureFormat::Rgba8UnormSrgb,
            Default::default(),
        );
        let handle = images.add(image);
        commands.spawn((
            Sprite {
                image: handle,
                custom_size: Some(Vec2::splat(tile_pixels)),
                anchor: Anchor::BottomLeft,
                ..default()
            },
            Transform::from_translation(data.origin.extend(0.0)),
            TileMarker,
        ));
        res_manager.chunk_manager.spawned_chunks.insert(chunk_pos);
    }
}

pub fn despawn_outofrange_tiles(
    mut commands: Commands,
    camera_query: Query<&Transform, With<Camera2d>>,
    chunks_query: Query<(Entity, &Transform), With<TileMarker>>,
    mut res_manager: ResMut<TileMapResources>,
) {
    let Ok(camera_transform) = camera_query.single() else {
        return;
    };
    let tile_pixels = res_manager.zoom_manager.tile_pixels;
    for (entity, chunk_transform) in chunks_query.iter() {
        let chunk_pos = chunk_transform.translation.xy();
        let distance = camera_transform.translation.xy().distance(chunk_pos);
        if distance > tile_pixels * 10. {
            let chunk = camera_pos_to_chunk_pos(chunk_pos, tile_pixels);
            res_manager.chunk_manager.spawned_chunks.remove(&chunk);
            commands.entity(entity).despawn();
        }
    }
}

/// Drops every spawned tile after a zoom step or provider switch so the
/// basemap rebuilds against the new mapping.
pub fn clean_tile_map(
    mut res_manager: ResMut<TileMapResources>,
    mut commands: Commands,
    chunk_query: Query<Entity, With<TileMarker>>,
    mut clean: ResMut<Clean>,
) {
    if clean.clean {
        clean.clean = false;
        for entity in chunk_query.iter() {
            commands.entity(entity).despawn();
        }
        res_manager.chunk_manager.spawned_chunks.clear();
        res_manager.chunk_manager.to_spawn_chunks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Coord;

    #[test]
    fn tile_sprites_snap_to_the_slippy_grid() {
        let reference = Coord::new(0.011, 0.011);
        let tile_pixels = 256.0;
        let zoom = 4;
        for chunk in [IVec2::new(0, 0), IVec2::new(2, -1), IVec2::new(-3, 2)] {
            let corner = chunk_pos_to_world_pos(chunk, tile_pixels);
            let position =
                world_to_lat_long(corner.x.into(), corner.y.into(), reference, zoom, tile_pixels);
            let tile = position.to_tile_coords(zoom);
            let origin = tile_origin(tile, reference, tile_pixels);
            // The fetched tile spans one tile of world units and contains
            // the chunk corner it was requested for.
            assert!(origin.x <= corner.x + 0.5, "{chunk} x low: {origin} {corner}");
            assert!(corner.x < origin.x + tile_pixels + 0.5, "{chunk} x high");
            assert!(origin.y <= corner.y + 0.5, "{chunk} y low: {origin} {corner}");
            assert!(corner.y < origin.y + tile_pixels + 0.5, "{chunk} y high");
        }
    }

    #[test]
    fn chunk_positions_round_trip() {
        let tile_pixels = 256.0;
        for chunk in [IVec2::new(0, 0), IVec2::new(-3, 7), IVec2::new(12, -5)] {
            let world = chunk_pos_to_world_pos(chunk, tile_pixels);
            assert_eq!(camera_pos_to_chunk_pos(world, tile_pixels), chunk);
            // Anywhere inside the chunk maps back to the same chunk index.
            let inside = world + Vec2::splat(tile_pixels * 0.5);
            assert_eq!(camera_pos_to_chunk_pos(inside, tile_pixels), chunk);
        }
    }
}
