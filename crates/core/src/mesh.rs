//! Static geometry for the water surface and the basin
//!
//! Both meshes use counter-clockwise winding for front faces. The surface is
//! a grid in the y = 0 plane facing +Y; the basin is the `[-1, 1]³` box
//! without its top, with every face wound to face outward.

use nalgebra::{Point3, Vector3};

/// Indexed triangle mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Vertex positions
    pub positions: Vec<[f32; 3]>,
    /// Triangle list indices
    pub indices: Vec<u32>,
}

/// Box corners, indexed by bits: x = bit 0, y = bit 1, z = bit 2
const BASIN_CORNERS: [[f32; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [-1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0],
];

/// Floor then the four walls, two triangles each
const BASIN_INDICES: [u32; 30] = [
    0, 1, 5, 0, 5, 4, // floor (y = -1)
    0, 4, 6, 0, 6, 2, // x = -1
    1, 3, 7, 1, 7, 5, // x = +1
    0, 2, 3, 0, 3, 1, // z = -1
    4, 5, 7, 4, 7, 6, // z = +1
];

impl Mesh {
    /// Water surface: a 2×2 grid over `[-1, 1]²` at y = 0
    ///
    /// # Arguments
    ///
    /// * `subdivisions` - Quads along each edge; produces `(s + 1)²` vertices
    #[must_use]
    pub fn surface_grid(subdivisions: u32) -> Self {
        let s = subdivisions.max(1);
        let row = s + 1;

        let mut positions = Vec::with_capacity((row * row) as usize);
        for j in 0..row {
            let z = j as f32 / s as f32 * 2.0 - 1.0;
            for i in 0..row {
                let x = i as f32 / s as f32 * 2.0 - 1.0;
                positions.push([x, 0.0, z]);
            }
        }

        let mut indices = Vec::with_capacity((s * s * 6) as usize);
        for j in 0..s {
            for i in 0..s {
                let a = j * row + i;
                let b = a + 1;
                let c = a + row;
                let d = c + 1;
                // Counter-clockwise seen from +Y
                indices.extend_from_slice(&[a, c, b, b, c, d]);
            }
        }

        Self { positions, indices }
    }

    /// Basin: 8 shared corners, 10 triangles, open at the top
    #[must_use]
    pub fn basin() -> Self {
        Self {
            positions: BASIN_CORNERS.to_vec(),
            indices: BASIN_INDICES.to_vec(),
        }
    }

    /// Number of triangles
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Corners of triangle `t`
    #[must_use]
    pub fn triangle(&self, t: usize) -> [Point3<f32>; 3] {
        let corner = |k: usize| Point3::from(self.positions[self.indices[t * 3 + k] as usize]);
        [corner(0), corner(1), corner(2)]
    }

    /// Unnormalized face normal of triangle `t`, following the winding
    #[must_use]
    pub fn face_normal(&self, t: usize) -> Vector3<f32> {
        let [a, b, c] = self.triangle(t);
        (b - a).cross(&(c - a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_counts() {
        let mesh = Mesh::surface_grid(200);
        assert_eq!(mesh.positions.len(), 201 * 201);
        assert_eq!(mesh.triangle_count(), 2 * 200 * 200);
    }

    #[test]
    fn test_surface_faces_up() {
        let mesh = Mesh::surface_grid(4);
        for t in 0..mesh.triangle_count() {
            let n = mesh.face_normal(t);
            assert!(n.y > 0.0, "triangle {t} faces {n:?}");
        }
    }

    #[test]
    fn test_surface_spans_domain() {
        let mesh = Mesh::surface_grid(3);
        assert_eq!(mesh.positions[0], [-1.0, 0.0, -1.0]);
        assert_eq!(*mesh.positions.last().unwrap(), [1.0, 0.0, 1.0]);
        assert!(mesh.positions.iter().all(|p| p[1] == 0.0));
    }

    #[test]
    fn test_basin_counts() {
        let mesh = Mesh::basin();
        assert_eq!(mesh.positions.len(), 8);
        assert_eq!(mesh.triangle_count(), 10);
    }

    #[test]
    fn test_basin_faces_outward() {
        let mesh = Mesh::basin();
        for t in 0..mesh.triangle_count() {
            let [a, b, c] = mesh.triangle(t);
            let centroid = (a.coords + b.coords + c.coords) / 3.0;
            assert!(
                mesh.face_normal(t).dot(&centroid) > 0.0,
                "triangle {t} faces inward"
            );
        }
    }

    #[test]
    fn test_basin_is_open_at_top() {
        let mesh = Mesh::basin();
        for t in 0..mesh.triangle_count() {
            let n = mesh.face_normal(t);
            assert!(n.y <= 0.0, "triangle {t} would close the top");
        }
    }
}
