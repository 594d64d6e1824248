//! Texture loading for the window viewer

use ripple_core::render::{CubeFaces, EnvironmentTextures, TextureImage};
use ripple_core::{AssetBarrier, RippleError, RippleResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Tile texture file
const TILES: &str = "tiles.jpg";

/// Sky faces; there is no floor image, the top face is reused for it
const SKY_FACES: [&str; 5] = ["xpos.jpg", "xneg.jpg", "ypos.jpg", "zpos.jpg", "zneg.jpg"];

fn decode(path: &Path, name: &str) -> Result<TextureImage, String> {
    let image = image::open(path)
        .map_err(|e| format!("{}: {e}", path.display()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    TextureImage::from_rgba8(name, width, height, image.into_raw()).map_err(|e| e.to_string())
}

/// Load the environment textures
///
/// Without a directory the procedural stand-ins are used.
///
/// # Errors
///
/// Returns `RippleError::AssetLoad` or `RippleError::AssetTimeout` for the
/// first image that cannot be read in time.
pub fn load_environment(
    dir: Option<PathBuf>,
    timeout: Option<Duration>,
) -> RippleResult<EnvironmentTextures> {
    let Some(dir) = dir else {
        return Ok(EnvironmentTextures::procedural());
    };

    let mut barrier = AssetBarrier::new().with_timeout(timeout);
    for name in std::iter::once(TILES).chain(SKY_FACES) {
        let path = dir.join(name);
        barrier.add(name, move || decode(&path, name));
    }
    let mut loaded = barrier.join()?;

    let mut take = |name: &str| {
        loaded.remove(name).ok_or_else(|| RippleError::AssetLoad {
            name: name.to_string(),
            reason: "missing from loader results".to_string(),
        })
    };

    let tiles = take(TILES)?;
    let sky = CubeFaces {
        xpos: take("xpos.jpg")?,
        xneg: take("xneg.jpg")?,
        ypos: take("ypos.jpg")?,
        zpos: take("zpos.jpg")?,
        zneg: take("zneg.jpg")?,
    };
    sky.edge()?;

    Ok(EnvironmentTextures::new(tiles, sky))
}
