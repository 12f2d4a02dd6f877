//! The raster basemap: chunked tile sprites around the camera, fetched off
//! the main thread and cached on disk.

mod fetch;
mod tile_map;
mod ui;

pub use fetch::*;
pub use tile_map::*;
pub use ui::*;

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use bevy::prelude::*;
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use crate::types::{world_to_lat_long, Coord};
use crate::STARTING_REFERENCE;

pub struct TileMapPlugin {
    pub starting_location: Coord,
    pub starting_zoom: u32,
    pub tile_pixels: f32,
    pub providers: Vec<TileProvider>,
}

impl Plugin for TileMapPlugin {
    fn build(&self, app: &mut App) {
        let (tx, rx): (Sender<FetchedTile>, Receiver<FetchedTile>) = bounded(32);
        app.insert_resource(TileReceiver(rx))
            .insert_resource(TileSender(tx))
            .insert_resource(TileCacheDir(tile_cache_dir()))
            .insert_resource(TileMapResources {
                zoom_manager: ZoomManager {
                    zoom_level: self.starting_zoom,
                    last_projection_scale: 1.0,
                    tile_pixels: self.tile_pixels,
                },
                chunk_manager: ChunkManager {
                    providers: self.providers.clone(),
                    ..default()
                },
                location_manager: Location {
                    location: self.starting_location,
                },
            })
            .insert_resource(Clean::default())
            .add_event::<ZoomChangedEvent>()
            .add_systems(FixedUpdate, (spawn_tiles_around_camera, spawn_ready_tiles))
            .add_systems(Update, detect_zoom_level)
            .add_systems(
                FixedUpdate,
                (despawn_outofrange_tiles, read_tile_receiver, clean_tile_map).chain(),
            )
            .add_plugins(TilesUiPlugin);
    }
}

/// Fired whenever the integer tile zoom steps, which rescales the whole
/// world-space mapping. Overlays listening for it must respawn.
#[derive(Event)]
pub struct ZoomChangedEvent;

/// One decoded raster tile on its way from a fetch thread to the ECS.
/// `origin` is the world position of the tile's south-west corner, snapped
/// to the slippy grid rather than the chunk grid.
pub struct FetchedTile {
    pub chunk: IVec2,
    pub origin: Vec2,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[derive(Resource, Deref)]
pub struct TileReceiver(pub Receiver<FetchedTile>);

#[derive(Resource, Deref)]
pub struct TileSender(pub Sender<FetchedTile>);

#[derive(Resource, Deref, Clone)]
pub struct TileCacheDir(pub PathBuf);

fn tile_cache_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "geosketch")
        .map(|dirs| dirs.cache_dir().join("tiles"))
        .unwrap_or_else(|| PathBuf::from("cache/tiles"))
}

#[derive(Debug, Resource, Clone)]
pub struct TileMapResources {
    pub zoom_manager: ZoomManager,
    pub chunk_manager: ChunkManager,
    pub location_manager: Location,
}

impl TileMapResources {
    /// Geographic degrees to world space under the current zoom/reference.
    pub fn coord_to_world(&self, coord: Coord) -> Vec2 {
        coord.to_world_coords(
            self.chunk_manager.reference_long_lat,
            self.zoom_manager.zoom_level,
            self.zoom_manager.tile_pixels as f64,
        )
    }

    /// World space back to geographic degrees (EPSG:4326).
    pub fn world_to_coord(&self, world: Vec2) -> Coord {
        world_to_lat_long(
            world.x as f64,
            world.y as f64,
            self.chunk_manager.reference_long_lat,
            self.zoom_manager.zoom_level,
            self.zoom_manager.tile_pixels,
        )
    }
}

#[derive(Debug, Clone)]
pub struct ZoomManager {
    pub zoom_level: u32,
    pub last_projection_scale: f32,
    pub tile_pixels: f32,
}

impl Default for ZoomManager {
    fn default() -> Self {
        Self {
            zoom_level: 4,
            last_projection_scale: 1.0,
            tile_pixels: crate::TILE_PIXELS as f32,
        }
    }
}

/// One XYZ raster source. Exactly one is enabled at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileProvider {
    pub name: String,
    pub url: String,
    pub enabled: bool,
}

pub fn default_providers() -> Vec<TileProvider> {
    vec![
        TileProvider {
            name: "OpenStreetMap".to_string(),
            url: "https://tile.openstreetmap.org".to_string(),
            enabled: true,
        },
        TileProvider {
            name: "Google Hybrid".to_string(),
            url: "https://mt1.google.com/vt/lyrs=y".to_string(),
            enabled: false,
        },
        TileProvider {
            name: "Google Roads".to_string(),
            url: "https://mt1.google.com/vt/lyrs=m".to_string(),
            enabled: false,
        },
    ]
}

#[derive(Debug, Clone)]
pub struct ChunkManager {
    pub spawned_chunks: HashSet<IVec2>,
    /// Decoded tiles waiting to become sprites.
    pub to_spawn_chunks: HashMap<IVec2, FetchedTileData>,
    pub update: bool,
    pub reference_long_lat: Coord,
    pub providers: Vec<TileProvider>,
    pub provider_changed: bool,
}

#[derive(Debug, Clone)]
pub struct FetchedTileData {
    pub origin: Vec2,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl ChunkManager {
    pub fn enabled_provider(&self) -> Option<&TileProvider> {
        self.providers.iter().find(|p| p.enabled)
    }

    /// Enables exactly one provider and flags the basemap for a rebuild.
    pub fn enable_only_provider(&mut self, url: &str) {
        for provider in &mut self.providers {
            provider.enabled = provider.url == url;
        }
        self.provider_changed = true;
    }
}

impl Default for ChunkManager {
    fn default() -> Self {
        Self {
            spawned_chunks: HashSet::default(),
            to_spawn_chunks: HashMap::default(),
            update: true,
            reference_long_lat: STARTING_REFERENCE,
            providers: default_providers(),
            provider_changed: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Location {
    pub location: Coord,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            location: Coord::new(0.0, 0.0),
        }
    }
}

#[derive(Resource, Clone, Default)]
pub struct Clean {
    pub clean: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_provider_enabled_after_switch() {
        let mut manager = ChunkManager::default();
        let url = manager.providers[2].url.clone();
        manager.enable_only_provider(&url);
        assert!(manager.provider_changed);
        assert_eq!(
            manager.providers.iter().filter(|p| p.enabled).count(),
            1
        );
        assert_eq!(manager.enabled_provider().unwrap().url, url);
    }

    #[test]
    fn world_conversions_are_inverse() {
        let resources = TileMapResources {
            zoom_manager: ZoomManager::default(),
            chunk_manager: ChunkManager::default(),
            location_manager: Location::default(),
        };
        let world = resources.coord_to_world(Coord::new(48.85, 2.35));
        let back = resources.world_to_coord(world);
        assert!((back.lat - 48.85).abs() < 1e-2);
        assert!((back.long - 2.35).abs() < 1e-2);
    }
}
