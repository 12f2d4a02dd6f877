use std::{fs, io::Read, path::Path, thread, time::Duration};

use anyhow::{bail, Context, Result};
use image::RgbaImage;

use crate::types::Tile;

const USER_AGENT: &str = concat!("geosketch/", env!("CARGO_PKG_VERSION"));
const MAX_ATTEMPTS: u64 = 4;

/// Fetches one raster tile, decoded to RGBA. Hits the on-disk cache first;
/// network fetches are written back to it.
pub fn fetch_raster_tile(tile: Tile, url: &str, cache_root: &Path) -> Result<RgbaImage> {
    let bytes = fetch_tile_bytes(tile, url, cache_root)?;
    let decoded = image::load_from_memory(&bytes)
        .with_context(|| format!("decoding tile {}/{}/{}", tile.zoom, tile.x, tile.y))?;
    Ok(decoded.to_rgba8())
}

/// Tiles cache per provider host so switching providers never mixes imagery.
fn provider_dir(url: &str) -> String {
    url.trim_start_matches("https://")
        .trim_start_matches("http://")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' })
        .collect()
}

fn request_url(tile: Tile, url: &str) -> String {
    if url.contains("google") {
        // Google's layer endpoints take x/y/z as query parameters.
        format!("{}&x={}&y={}&z={}", url, tile.x, tile.y, tile.zoom)
    } else {
        format!("{}/{}/{}/{}.png", url, tile.zoom, tile.x, tile.y)
    }
}

fn fetch_tile_bytes(tile: Tile, url: &str, cache_root: &Path) -> Result<Vec<u8>> {
    let cache_dir = cache_root.join(provider_dir(url));
    let cache_file = cache_dir.join(format!("{}_{}_{}.png", tile.zoom, tile.x, tile.y));

    if cache_file.exists() {
        return fs::read(&cache_file)
            .with_context(|| format!("reading cached tile {}", cache_file.display()));
    }

    let request = request_url(tile, url);
    for attempt in 0..MAX_ATTEMPTS {
        let mut response = ureq::get(&request)
            .header("User-Agent", USER_AGENT)
            .call()
            .with_context(|| format!("requesting {request}"))?;
        match response.status().as_u16() {
            200 => {
                let mut bytes = Vec::new();
                response
                    .body_mut()
                    .as_reader()
                    .read_to_end(&mut bytes)
                    .context("reading tile body")?;
                fs::create_dir_all(&cache_dir).context("creating tile cache directory")?;
                fs::write(&cache_file, &bytes)
                    .with_context(|| format!("writing {}", cache_file.display()))?;
                return Ok(bytes);
            }
            429 => thread::sleep(Duration::from_secs(2 * (attempt + 1))),
            status => bail!("tile server returned {status} for {request}"),
        }
    }
    bail!("tile server kept rate limiting {request}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_dirs_are_filesystem_safe() {
        assert_eq!(
            provider_dir("https://tile.openstreetmap.org"),
            "tile.openstreetmap.org"
        );
        assert_eq!(
            provider_dir("https://mt1.google.com/vt/lyrs=y"),
            "mt1.google.com_vt_lyrs_y"
        );
    }

    #[test]
    fn request_urls_by_provider_shape() {
        let tile = Tile::new(8, 5, 4);
        assert_eq!(
            request_url(tile, "https://tile.openstreetmap.org"),
            "https://tile.openstreetmap.org/4/8/5.png"
        );
        assert_eq!(
            request_url(tile, "https://mt1.google.com/vt/lyrs=y"),
            "https://mt1.google.com/vt/lyrs=y&x=8&y=5&z=4"
        );
    }

    #[test]
    fn cache_hit_skips_the_network() {
        let root = std::env::temp_dir().join("geosketch-test-cache");
        let tile = Tile::new(1, 2, 3);
        let dir = root.join(provider_dir("https://tile.openstreetmap.org"));
        fs::create_dir_all(&dir).unwrap();
        let mut png = Vec::new();
        image::RgbaImage::new(1, 1)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        fs::write(dir.join("3_1_2.png"), &png).unwrap();

        let image = fetch_raster_tile(tile, "https://tile.openstreetmap.org", &root).unwrap();
        assert_eq!((image.width(), image.height()), (1, 1));

        fs::remove_dir_all(&root).ok();
    }
}
