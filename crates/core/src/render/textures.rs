//! Texture images for the pool tiles and the sky cubemap
//!
//! Images are plain RGBA8 pixel data. Decoding from files happens in the
//! binaries; the procedural constructors give a scene that renders without any
//! asset directory.

use crate::error::{RippleError, RippleResult};

/// RGBA8 image, rows top to bottom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl TextureImage {
    /// Wrap decoded pixels
    ///
    /// # Errors
    ///
    /// Returns `RippleError::AssetLoad` when `pixels` is not `width * height * 4`
    /// bytes or the image is empty.
    pub fn from_rgba8(name: &str, width: u32, height: u32, pixels: Vec<u8>) -> RippleResult<Self> {
        let expected = width as usize * height as usize * 4;
        if expected == 0 || pixels.len() != expected {
            return Err(RippleError::AssetLoad {
                name: name.to_string(),
                reason: format!(
                    "{width}x{height} RGBA image needs {expected} bytes, got {}",
                    pixels.len()
                ),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Single-colour 1×1 image
    #[must_use]
    pub fn solid(color: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: color.to_vec(),
        }
    }

    /// Square tile pattern with grout lines
    #[must_use]
    pub fn tiles(size: u32, tiles_per_edge: u32) -> Self {
        let size = size.max(1);
        let cell = (size / tiles_per_edge.max(1)).max(2);
        let mut pixels = Vec::with_capacity(size as usize * size as usize * 4);
        for y in 0..size {
            for x in 0..size {
                let grout = x % cell == 0 || y % cell == 0;
                let shade = if (x / cell + y / cell) % 2 == 0 { 0 } else { 12 };
                let rgba = if grout {
                    [190, 196, 200, 255]
                } else {
                    [120 - shade, 180 - shade, 210 - shade, 255]
                };
                pixels.extend_from_slice(&rgba);
            }
        }
        Self {
            width: size,
            height: size,
            pixels,
        }
    }

    /// Vertical sky gradient from `top` to `bottom`
    #[must_use]
    pub fn gradient(size: u32, top: [u8; 3], bottom: [u8; 3]) -> Self {
        let size = size.max(1);
        let mut pixels = Vec::with_capacity(size as usize * size as usize * 4);
        for y in 0..size {
            let t = y as f32 / (size.max(2) - 1) as f32;
            let mix = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
            let rgba = [mix(top[0], bottom[0]), mix(top[1], bottom[1]), mix(top[2], bottom[2]), 255];
            for _ in 0..size {
                pixels.extend_from_slice(&rgba);
            }
        }
        Self {
            width: size,
            height: size,
            pixels,
        }
    }

    /// Width in pixels
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA bytes
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Sky cubemap sources
///
/// There is no separate floor image: the `-y` face reuses `ypos`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubeFaces {
    /// +X face
    pub xpos: TextureImage,
    /// -X face
    pub xneg: TextureImage,
    /// +Y face, also used for -Y
    pub ypos: TextureImage,
    /// +Z face
    pub zpos: TextureImage,
    /// -Z face
    pub zneg: TextureImage,
}

impl CubeFaces {
    /// Faces in cubemap layer order: +x, -x, +y, -y, +z, -z
    #[must_use]
    pub fn layers(&self) -> [&TextureImage; 6] {
        [
            &self.xpos,
            &self.xneg,
            &self.ypos,
            &self.ypos,
            &self.zpos,
            &self.zneg,
        ]
    }

    /// Edge length shared by all faces
    ///
    /// # Errors
    ///
    /// Returns `RippleError::InvalidConfig` when a face is not square or the
    /// faces differ in size.
    pub fn edge(&self) -> RippleResult<u32> {
        let edge = self.xpos.width;
        let uniform = self
            .layers()
            .iter()
            .all(|face| face.width == edge && face.height == edge);
        if uniform {
            Ok(edge)
        } else {
            Err(RippleError::InvalidConfig(
                "sky faces must be square and share one size".to_string(),
            ))
        }
    }
}

/// Everything the shaders sample besides the height field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentTextures {
    /// Pool wall and floor tiles
    pub tiles: TextureImage,
    /// Sky cubemap
    pub sky: CubeFaces,
    /// Caustics light map, a flat placeholder
    pub caustics: TextureImage,
}

impl EnvironmentTextures {
    /// Textures from decoded tile and sky images
    #[must_use]
    pub fn new(tiles: TextureImage, sky: CubeFaces) -> Self {
        Self {
            tiles,
            sky,
            caustics: TextureImage::solid([255, 255, 255, 255]),
        }
    }

    /// Generated stand-ins for the asset set
    #[must_use]
    pub fn procedural() -> Self {
        const SKY_EDGE: u32 = 64;
        let horizon = TextureImage::gradient(SKY_EDGE, [110, 160, 220], [225, 235, 245]);
        Self::new(
            TextureImage::tiles(256, 8),
            CubeFaces {
                xpos: horizon.clone(),
                xneg: horizon.clone(),
                ypos: TextureImage::gradient(SKY_EDGE, [90, 140, 210], [110, 160, 220]),
                zpos: horizon.clone(),
                zneg: horizon,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgba8_checks_length() {
        assert!(TextureImage::from_rgba8("ok", 2, 2, vec![0; 16]).is_ok());
        let err = TextureImage::from_rgba8("tiles.jpg", 2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, RippleError::AssetLoad { ref name, .. } if name == "tiles.jpg"));
        assert!(TextureImage::from_rgba8("empty", 0, 0, Vec::new()).is_err());
    }

    #[test]
    fn test_generated_sizes() {
        let tiles = TextureImage::tiles(64, 4);
        assert_eq!(tiles.pixels().len(), 64 * 64 * 4);

        let sky = TextureImage::gradient(16, [0, 0, 0], [255, 255, 255]);
        assert_eq!(sky.pixels().len(), 16 * 16 * 4);
        assert_eq!(&sky.pixels()[..3], &[0, 0, 0]);
        assert_eq!(&sky.pixels()[sky.pixels().len() - 4..], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_floor_face_reuses_top() {
        let env = EnvironmentTextures::procedural();
        let layers = env.sky.layers();
        assert_eq!(layers[2], layers[3]);
        assert_eq!(env.sky.edge().unwrap(), 64);
        assert_eq!(env.caustics.width(), 1);
    }

    #[test]
    fn test_mismatched_faces_rejected() {
        let mut env = EnvironmentTextures::procedural();
        env.sky.zneg = TextureImage::solid([0, 0, 0, 255]);
        assert!(env.sky.edge().is_err());
    }
}
