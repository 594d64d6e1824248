//! Height-field storage for the CPU backend
//!
//! A field is a square grid of [`Texel`]s stored in row-major order. Row `j`
//! runs along world Z and column `i` along world X, so the texel at `(i, j)`
//! covers the texture coordinate `((i + 0.5) / N, (j + 0.5) / N)`.

use crate::error::{RippleError, RippleResult};

/// One grid cell: height, last height change and the surface normal
///
/// The normal is stored as its X and Z components only; Y is recovered as
/// `sqrt(1 - x² - z²)` because the surface normal always points up.
/// The layout matches the `vec4<f32>` used by the GPU backend.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "gpu", derive(bytemuck::Pod, bytemuck::Zeroable))]
pub struct Texel {
    /// Surface displacement from rest
    pub height: f32,
    /// Height change produced by the last step
    pub velocity: f32,
    /// X component of the surface normal
    pub normal_x: f32,
    /// Z component of the surface normal
    pub normal_z: f32,
}

impl Texel {
    /// Texel at rest with the given height and a flat normal
    #[must_use]
    pub const fn with_height(height: f32) -> Self {
        Self {
            height,
            velocity: 0.0,
            normal_x: 0.0,
            normal_z: 0.0,
        }
    }

    /// Full normal vector reconstructed from the stored components
    #[must_use]
    pub fn normal(&self) -> [f32; 3] {
        let y = (1.0 - self.normal_x * self.normal_x - self.normal_z * self.normal_z)
            .max(0.0)
            .sqrt();
        [self.normal_x, y, self.normal_z]
    }
}

/// Square height field in row-major order
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    data: Vec<Texel>,
    resolution: usize,
}

impl HeightField {
    /// Create a flat field at rest
    ///
    /// # Arguments
    ///
    /// * `resolution` - Grid edge length in texels
    #[must_use]
    pub fn new(resolution: usize) -> Self {
        Self {
            data: vec![Texel::default(); resolution * resolution],
            resolution,
        }
    }

    /// Wrap existing texels
    ///
    /// # Errors
    ///
    /// Returns `RippleError::FieldSize` when `texels` does not hold exactly
    /// `resolution²` entries.
    pub fn from_texels(resolution: usize, texels: Vec<Texel>) -> RippleResult<Self> {
        let expected = resolution * resolution;
        if texels.len() != expected {
            return Err(RippleError::FieldSize {
                expected,
                actual: texels.len(),
            });
        }
        Ok(Self {
            data: texels,
            resolution,
        })
    }

    /// Grid edge length in texels
    #[must_use]
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// All texels in row-major order
    #[must_use]
    pub fn as_slice(&self) -> &[Texel] {
        &self.data
    }

    /// Mutable texels in row-major order
    pub fn as_mut_slice(&mut self) -> &mut [Texel] {
        &mut self.data
    }

    /// Get texel at grid position
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> Texel {
        assert!(
            i < self.resolution && j < self.resolution,
            "Coordinates out of bounds"
        );
        self.data[j * self.resolution + i]
    }

    /// Set texel at grid position
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    pub fn set(&mut self, i: usize, j: usize, texel: Texel) {
        assert!(
            i < self.resolution && j < self.resolution,
            "Coordinates out of bounds"
        );
        self.data[j * self.resolution + i] = texel;
    }

    /// Copy the contents of another field of the same size
    ///
    /// # Errors
    ///
    /// Returns `RippleError::FieldSize` on a size mismatch.
    pub fn copy_from(&mut self, texels: &[Texel]) -> RippleResult<()> {
        if texels.len() != self.data.len() {
            return Err(RippleError::FieldSize {
                expected: self.data.len(),
                actual: texels.len(),
            });
        }
        self.data.copy_from_slice(texels);
        Ok(())
    }

    /// Height at a point of the `[-1, 1]²` pool domain (nearest texel)
    #[must_use]
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        height_at(&self.data, self.resolution, x, z)
    }

    /// Sum of squared heights
    #[must_use]
    pub fn energy(&self) -> f64 {
        height_energy(&self.data)
    }
}

/// Grid index of the texel nearest to a point of the `[-1, 1]²` domain
///
/// The point `(0, 0)` maps to texel `(N / 2, N / 2)`.
#[must_use]
pub fn texel_index_at(resolution: usize, x: f32, z: f32) -> (usize, usize) {
    let to_cell = |v: f32| {
        let t = (v * 0.5 + 0.5) * resolution as f32;
        (t.floor().max(0.0) as usize).min(resolution.saturating_sub(1))
    };
    (to_cell(x), to_cell(z))
}

/// Height of the texel nearest to `(x, z)` in a row-major texel slice
///
/// # Panics
///
/// Panics if `resolution` is 0 or `texels` does not hold `resolution²` texels
#[must_use]
pub fn height_at(texels: &[Texel], resolution: usize, x: f32, z: f32) -> f32 {
    assert!(
        resolution > 0 && texels.len() == resolution * resolution,
        "Field size does not match resolution"
    );
    let (i, j) = texel_index_at(resolution, x, z);
    texels[j * resolution + i].height
}

/// Sum of squared heights, accumulated in double precision
#[must_use]
pub fn height_energy(texels: &[Texel]) -> f64 {
    texels
        .iter()
        .map(|t| f64::from(t.height) * f64::from(t.height))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_creation() {
        let field = HeightField::new(8);
        assert_eq!(field.resolution(), 8);
        assert_eq!(field.as_slice().len(), 64);
        assert!(field.as_slice().iter().all(|t| *t == Texel::default()));
    }

    #[test]
    fn test_field_get_set() {
        let mut field = HeightField::new(10);
        field.set(3, 4, Texel::with_height(0.25));
        assert_eq!(field.get(3, 4).height, 0.25);

        // Row-major: row 4, column 3
        assert_eq!(field.as_slice()[4 * 10 + 3].height, 0.25);
    }

    #[test]
    #[should_panic(expected = "Coordinates out of bounds")]
    fn test_field_bounds_check() {
        let field = HeightField::new(10);
        let _ = field.get(10, 5);
    }

    #[test]
    fn test_from_texels_checks_size() {
        let err = HeightField::from_texels(4, vec![Texel::default(); 15]).unwrap_err();
        assert!(matches!(
            err,
            RippleError::FieldSize {
                expected: 16,
                actual: 15
            }
        ));
    }

    #[test]
    fn test_domain_mapping() {
        assert_eq!(texel_index_at(256, 0.0, 0.0), (128, 128));
        assert_eq!(texel_index_at(256, -1.0, -1.0), (0, 0));
        assert_eq!(texel_index_at(256, 1.0, 1.0), (255, 255));
        assert_eq!(texel_index_at(4, -0.1, 0.6), (1, 3));
    }

    #[test]
    fn test_height_at_reads_nearest_texel() {
        let mut texels = vec![Texel::default(); 16];
        texels[3 * 4 + 1] = Texel::with_height(0.5);
        assert_eq!(height_at(&texels, 4, -0.1, 0.6), 0.5);
        assert_eq!(height_at(&texels, 4, 0.0, 0.0), 0.0);
    }

    #[test]
    #[should_panic(expected = "Field size does not match resolution")]
    fn test_height_at_rejects_empty_field() {
        let _ = height_at(&[], 0, 0.0, 0.0);
    }

    #[test]
    #[should_panic(expected = "Field size does not match resolution")]
    fn test_height_at_rejects_short_slice() {
        let _ = height_at(&[Texel::default(); 3], 2, 0.0, 0.0);
    }

    #[test]
    fn test_energy() {
        let mut field = HeightField::new(2);
        field.set(0, 0, Texel::with_height(3.0));
        field.set(1, 1, Texel::with_height(-4.0));
        assert_eq!(field.energy(), 25.0);
    }

    #[test]
    fn test_flat_normal_points_up() {
        assert_eq!(Texel::default().normal(), [0.0, 1.0, 0.0]);
    }
}
