use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use std::{
    f64::consts::PI,
    ops::{DivAssign, MulAssign},
};

/// Half the circumference of the web-mercator world, in meters.
const MERCATOR_EXTENT: f64 = 20_037_508.34;

/// A geographic coordinate in degrees.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize, Copy)]
#[serde(rename_all = "camelCase")]
pub struct Coord {
    pub lat: f32,
    #[serde(rename = "lon")]
    pub long: f32,
}

impl Coord {
    pub const fn new(lat: f32, long: f32) -> Self {
        Self { lat, long }
    }

    /// The slippy tile containing this coordinate at the given zoom level.
    pub fn to_tile_coords(&self, zoom: u32) -> Tile {
        let n = 2_i32.pow(zoom) as f32;
        let x = ((self.long + 180.0) / 360.0 * n).floor() as i32;
        let y = ((1.0
            - (self.lat.to_radians().tan() + 1.0 / self.lat.to_radians().cos()).ln()
                / std::f32::consts::PI)
            / 2.0
            * n)
            .floor() as i32;
        Tile { x, y, zoom }
    }

    /// Web-mercator (EPSG:3857) position in meters.
    pub fn to_mercator(&self) -> Vec2 {
        let lon_rad = self.long.to_radians() as f64;
        let lat_rad = self.lat.to_radians() as f64;
        let x = lon_rad * MERCATOR_EXTENT / PI;
        let y = lat_rad.tan().asinh() * MERCATOR_EXTENT / PI;

        Vec2::new(x as f32, y as f32)
    }

    /// World-space position, anchored to `reference` and scaled so one tile
    /// at `zoom` spans `tile_pixels` world units.
    pub fn to_world_coords(&self, reference: Coord, zoom: u32, tile_pixels: f64) -> Vec2 {
        let ref_coords = reference.to_mercator();
        let scale = (meters_per_tile(zoom) / tile_pixels) as f32;

        let x = self.long * MERCATOR_EXTENT as f32 / 180.0;
        let y = (self.lat.to_radians().tan() + 1.0 / self.lat.to_radians().cos()).ln()
            * MERCATOR_EXTENT as f32
            / std::f32::consts::PI;

        Vec2 {
            x: (x - ref_coords.x) / scale,
            y: (y - ref_coords.y) / scale,
        }
    }
}

impl MulAssign for Coord {
    fn mul_assign(&mut self, rhs: Self) {
        self.lat *= rhs.lat;
        self.long *= rhs.long;
    }
}

impl DivAssign for Coord {
    fn div_assign(&mut self, rhs: Self) {
        self.lat /= rhs.lat;
        self.long /= rhs.long;
    }
}

/// An XYZ raster tile address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    pub x: i32,
    pub y: i32,
    pub zoom: u32,
}

impl Tile {
    pub const fn new(x: i32, y: i32, zoom: u32) -> Self {
        Self { x, y, zoom }
    }

    /// Geographic coordinate of this tile's north-west corner.
    pub fn to_lat_long(&self) -> Coord {
        let n = 2.0f64.powi(self.zoom as i32);
        let lon_deg = self.x as f64 / n * 360.0 - 180.0;
        let lat_deg = (PI * (1.0 - 2.0 * self.y as f64 / n))
            .sinh()
            .atan()
            .to_degrees();
        Coord::new(lat_deg as f32, normalize_longitude(lon_deg) as f32)
    }
}

/// Width of one tile in mercator meters at the given zoom level.
pub fn meters_per_tile(zoom: u32) -> f64 {
    MERCATOR_EXTENT * 2.0 / 2.0_f64.powi(zoom as i32)
}

/// Inverse of [`Coord::to_world_coords`]: world-space offsets back to
/// geographic degrees.
pub fn world_to_lat_long(
    x_offset: f64,
    y_offset: f64,
    reference: Coord,
    zoom: u32,
    tile_pixels: f32,
) -> Coord {
    let reference = reference.to_mercator();
    let scale = meters_per_tile(zoom) / tile_pixels as f64;

    let global_x = reference.x as f64 + (x_offset * scale);
    let global_y = reference.y as f64 + (y_offset * scale);

    let lon = (global_x / MERCATOR_EXTENT) * 180.0;
    let lat = (global_y / MERCATOR_EXTENT * 180.0).to_radians();
    let lat = 2.0 * lat.exp().atan() - std::f64::consts::FRAC_PI_2;
    let lat = lat.to_degrees();

    Coord::new(lat as f32, normalize_longitude(lon) as f32)
}

pub fn normalize_longitude(lon: f64) -> f64 {
    let mut lon = lon;
    while lon > 180.0 {
        lon -= 360.0;
    }
    while lon < -180.0 {
        lon += 360.0;
    }
    lon
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: Coord = Coord::new(0.011, 0.011);
    const TILE_PIXELS: f32 = 256.0;

    #[test]
    fn world_origin_maps_to_reference() {
        let coord = world_to_lat_long(0.0, 0.0, REFERENCE, 4, TILE_PIXELS);
        assert!((coord.lat - REFERENCE.lat).abs() < 1e-4);
        assert!((coord.long - REFERENCE.long).abs() < 1e-4);
    }

    #[test]
    fn world_round_trip() {
        let original = Coord::new(52.1951, 0.1313);
        let world = original.to_world_coords(REFERENCE, 14, TILE_PIXELS as f64);
        let back = world_to_lat_long(world.x as f64, world.y as f64, REFERENCE, 14, TILE_PIXELS);
        assert!((back.lat - original.lat).abs() < 1e-3);
        assert!((back.long - original.long).abs() < 1e-3);
    }

    #[test]
    fn origin_point_reports_near_zero_zero() {
        // Drawing at the projected origin with a near-zero reference must
        // report a coordinate near lat 0, lng 0.
        let coord = world_to_lat_long(0.0, 0.0, REFERENCE, 2, TILE_PIXELS);
        assert!(coord.lat.abs() < 0.1);
        assert!(coord.long.abs() < 0.1);
    }

    #[test]
    fn tile_address_of_greenwich() {
        // Just east and south of (0, 0) at zoom 1 lands in tile (1, 1).
        let tile = Coord::new(-0.1, 0.1).to_tile_coords(1);
        assert_eq!(tile, Tile::new(1, 1, 1));
    }

    #[test]
    fn tile_corner_round_trip() {
        let tile = Coord::new(51.5, -0.12).to_tile_coords(10);
        let corner = tile.to_lat_long();
        // The containing tile's NW corner is north and west of the point.
        assert!(corner.lat >= 51.5);
        assert!(corner.long <= -0.12);
    }

    #[test]
    fn longitude_normalization() {
        assert_eq!(normalize_longitude(190.0), -170.0);
        assert_eq!(normalize_longitude(-190.0), 170.0);
        assert_eq!(normalize_longitude(45.0), 45.0);
    }

    #[test]
    fn mercator_extent_matches_tile_math() {
        // One tile at zoom 0 spans the whole mercator world.
        assert!((meters_per_tile(0) - 2.0 * 20_037_508.34).abs() < 1.0);
        assert!((meters_per_tile(1) - 20_037_508.34).abs() < 1.0);
    }
}
