//! Full-field passes for the CPU backend
//!
//! Each pass reads a complete source field and writes a complete target field.
//! The GPU shaders in `shaders/` implement the same arithmetic per texel.
//!
//! # Drop
//!
//! Raised-cosine bump centred on the drop:
//! ```text
//! t = max(0, 1 - |c - p| / radius)
//! h += (0.5 - 0.5·cos(π·t)) · strength
//! ```
//!
//! # Step
//!
//! Damped relaxation towards the 4-neighbour average with clamp-to-edge
//! boundaries:
//! ```text
//! h' = damping · ((1 - relaxation)·h + relaxation·avg)
//! ```
//!
//! # Normals
//!
//! Forward differences over one cell of spacing `δ = 1/N`:
//! ```text
//! n = normalize((0, h[j+1] - h, δ) × (δ, h[i+1] - h, 0))
//! ```

use crate::config::WaveParams;
use crate::field::Texel;
use crate::interaction::Disturbance;
use nalgebra::Vector3;
use rayon::prelude::*;
use std::f32::consts::PI;

/// Texture coordinate of the centre of texel `index`
#[inline]
#[must_use]
pub fn texel_coord(index: usize, resolution: usize) -> f32 {
    (index as f32 + 0.5) / resolution as f32
}

/// Texture-space distance from a drop centre (in `[-1, 1]²`) to texel `(i, j)`
#[inline]
#[must_use]
pub fn drop_distance(center: [f32; 2], i: usize, j: usize, resolution: usize) -> f32 {
    let dx = center[0] * 0.5 + 0.5 - texel_coord(i, resolution);
    let dz = center[1] * 0.5 + 0.5 - texel_coord(j, resolution);
    (dx * dx + dz * dz).sqrt()
}

/// Raised-cosine profile: 1 at the centre, 0 at `radius` and beyond
#[inline]
#[must_use]
pub fn drop_falloff(distance: f32, radius: f32) -> f32 {
    let t = (1.0 - distance / radius).max(0.0);
    0.5 - (t * PI).cos() * 0.5
}

/// Add a drop to `src`, writing the result to `dst`
///
/// Texels at or beyond the radius, and every texel when the strength is
/// zero, are copied unchanged.
pub fn add_drop_cpu(src: &[Texel], dst: &mut [Texel], resolution: usize, drop: &Disturbance) {
    if drop.strength == 0.0 {
        dst.copy_from_slice(src);
        return;
    }

    dst.par_chunks_mut(resolution)
        .enumerate()
        .for_each(|(j, row)| {
            for (i, out) in row.iter_mut().enumerate() {
                let texel = src[j * resolution + i];
                let distance = drop_distance(drop.center, i, j, resolution);
                *out = if distance < drop.radius {
                    Texel {
                        height: texel.height
                            + drop_falloff(distance, drop.radius) * drop.strength,
                        ..texel
                    }
                } else {
                    texel
                };
            }
        });
}

/// Advance the field by one relaxation step
pub fn step_simulation_cpu(src: &[Texel], dst: &mut [Texel], resolution: usize, wave: WaveParams) {
    let last = resolution - 1;

    dst.par_chunks_mut(resolution)
        .enumerate()
        .for_each(|(j, row)| {
            for (i, out) in row.iter_mut().enumerate() {
                let texel = src[j * resolution + i];

                // Clamp-to-edge neighbours
                let left = src[j * resolution + i.saturating_sub(1)].height;
                let right = src[j * resolution + (i + 1).min(last)].height;
                let below = src[j.saturating_sub(1) * resolution + i].height;
                let above = src[(j + 1).min(last) * resolution + i].height;
                let average = (left + right + below + above) * 0.25;

                let height = wave.damping
                    * ((1.0 - wave.relaxation) * texel.height + wave.relaxation * average);

                *out = Texel {
                    height,
                    velocity: height - texel.height,
                    ..texel
                };
            }
        });
}

/// Recompute the normal channels from the heights
pub fn update_normals_cpu(src: &[Texel], dst: &mut [Texel], resolution: usize) {
    let last = resolution - 1;
    let delta = 1.0 / resolution as f32;

    dst.par_chunks_mut(resolution)
        .enumerate()
        .for_each(|(j, row)| {
            for (i, out) in row.iter_mut().enumerate() {
                let texel = src[j * resolution + i];
                let h = texel.height;
                let next_x = src[j * resolution + (i + 1).min(last)].height;
                let next_z = src[(j + 1).min(last) * resolution + i].height;

                let dx = Vector3::new(delta, next_x - h, 0.0);
                let dz = Vector3::new(0.0, next_z - h, delta);
                let normal = dz.cross(&dx).normalize();

                *out = Texel {
                    normal_x: normal.x,
                    normal_z: normal.z,
                    ..texel
                };
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn flat(resolution: usize) -> Vec<Texel> {
        vec![Texel::default(); resolution * resolution]
    }

    #[test]
    fn test_falloff_profile() {
        assert_relative_eq!(drop_falloff(0.0, 0.1), 1.0);
        assert_relative_eq!(drop_falloff(0.05, 0.1), 0.5, epsilon = 1e-6);
        assert_eq!(drop_falloff(0.1, 0.1), 0.0);
        assert_eq!(drop_falloff(0.3, 0.1), 0.0);
    }

    #[test]
    fn test_texel_coord_centres() {
        assert_eq!(texel_coord(0, 4), 0.125);
        assert_eq!(texel_coord(3, 4), 0.875);
    }

    #[test]
    fn test_drop_raises_centre() {
        let n = 32;
        let src = flat(n);
        let mut dst = flat(n);
        let drop = Disturbance::new([0.0, 0.0], 0.2, 0.5);
        add_drop_cpu(&src, &mut dst, n, &drop);

        let centre = dst[16 * n + 16].height;
        assert!(centre > 0.45 && centre <= 0.5, "centre height {centre}");
        // Corner is far outside the radius
        assert_eq!(dst[0].height, 0.0);
    }

    #[test]
    fn test_negative_strength_lowers() {
        let n = 16;
        let src = flat(n);
        let mut dst = flat(n);
        add_drop_cpu(&src, &mut dst, n, &Disturbance::new([0.0, 0.0], 0.3, -1.0));
        assert!(dst[8 * n + 8].height < 0.0);
    }

    #[test]
    fn test_step_spreads_single_peak() {
        let n = 5;
        let mut src = flat(n);
        src[2 * n + 2].height = 1.0;
        let mut dst = flat(n);
        let wave = WaveParams {
            damping: 0.9,
            relaxation: 0.5,
        };
        step_simulation_cpu(&src, &mut dst, n, wave);

        assert_relative_eq!(dst[2 * n + 2].height, 0.45, epsilon = 1e-6);
        assert_relative_eq!(dst[2 * n + 3].height, 0.9 * 0.5 * 0.25, epsilon = 1e-6);
        assert_relative_eq!(dst[2 * n + 2].velocity, -0.55, epsilon = 1e-6);
        assert_eq!(dst[0].height, 0.0);
    }

    #[test]
    fn test_step_single_texel_grid() {
        let src = vec![Texel::with_height(2.0)];
        let mut dst = flat(1);
        step_simulation_cpu(&src, &mut dst, 1, WaveParams::default());
        assert_relative_eq!(dst[0].height, 2.0 * 0.97, epsilon = 1e-6);
    }

    #[test]
    fn test_flat_normals_point_up() {
        let n = 8;
        let src = vec![Texel::with_height(0.3); n * n];
        let mut dst = flat(n);
        update_normals_cpu(&src, &mut dst, n);
        for texel in &dst {
            assert_eq!(texel.normal_x, 0.0);
            assert_eq!(texel.normal_z, 0.0);
            assert_eq!(texel.height, 0.3);
        }
    }

    #[test]
    fn test_slope_tilts_normal() {
        let n = 4;
        // Height rising along +x
        let src: Vec<Texel> = (0..n * n)
            .map(|idx| Texel::with_height((idx % n) as f32 * 0.25))
            .collect();
        let mut dst = flat(n);
        update_normals_cpu(&src, &mut dst, n);

        let normal = dst[n + 1];
        assert!(normal.normal_x < 0.0, "normal leans away from the rise");
        assert_relative_eq!(normal.normal_z, 0.0);
    }
}
