//! Pointer picking and disturbance requests
//!
//! A pointer position is turned into normalized device coordinates, then
//! into a ray from the camera, then intersected with the target plane: the
//! 2×2 square at the water's rest level. The hit point's `(x, z)` becomes the
//! centre of a drop.

use crate::camera::{OrbitCamera, Ray};
use crate::config::DropSettings;
use nalgebra::{Point3, Vector2};
use thiserror::Error;
use tracing::trace;

/// Request to add one drop to the height field
///
/// Consumed exactly once by the simulation stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Disturbance {
    /// Centre in the `[-1, 1]²` pool domain, `(x, z)`
    pub center: [f32; 2],
    /// Radius in texture space
    pub radius: f32,
    /// Signed height added at the centre
    pub strength: f32,
}

impl Disturbance {
    /// Create a disturbance
    #[must_use]
    pub const fn new(center: [f32; 2], radius: f32, strength: f32) -> Self {
        Self {
            center,
            radius,
            strength,
        }
    }

    /// Disturbance at `center` using configured radius and strength
    #[must_use]
    pub const fn from_settings(center: [f32; 2], settings: DropSettings) -> Self {
        Self::new(center, settings.radius, settings.strength)
    }
}

/// Pointer input in client pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Button pressed at `(x, y)`
    Press {
        /// Client x
        x: f32,
        /// Client y
        y: f32,
    },
    /// Pointer moved to `(x, y)`
    Move {
        /// Client x
        x: f32,
        /// Client y
        y: f32,
    },
}

/// Rectangle of the drawing surface in client pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Left edge
    pub left: f32,
    /// Top edge
    pub top: f32,
    /// Width in pixels
    pub width: f32,
    /// Height in pixels
    pub height: f32,
}

impl Viewport {
    /// Viewport anchored at the client origin
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width,
            height,
        }
    }

    /// Width over height
    #[must_use]
    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// Normalized device coordinates of a client pixel
    ///
    /// The top-left corner maps to `(-1, 1)` and the bottom-right to `(1, -1)`.
    #[must_use]
    pub fn ndc(&self, x: f32, y: f32) -> Vector2<f32> {
        Vector2::new(
            (x - self.left) * 2.0 / self.width - 1.0,
            -(y - self.top) * 2.0 / self.height + 1.0,
        )
    }
}

/// Why a pointer ray produced no hit
///
/// Misses are expected and never fatal: the event yields no disturbance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PickMiss {
    /// Camera matrices could not be inverted
    #[error("camera cannot be unprojected")]
    Unprojectable,
    /// Ray runs parallel to the plane
    #[error("ray is parallel to the target plane")]
    Parallel,
    /// Ray would hit the underside of the plane
    #[error("ray approaches the target plane from below")]
    BackFace,
    /// Plane lies behind the ray origin
    #[error("target plane is behind the camera")]
    BehindOrigin,
    /// Ray hits the plane outside the square
    #[error("ray hits outside the target square")]
    OutsideTarget,
}

/// Horizontal square at y = 0, visible from above only
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetPlane {
    half_extent: f32,
}

impl Default for TargetPlane {
    fn default() -> Self {
        Self { half_extent: 1.0 }
    }
}

impl TargetPlane {
    /// Intersect a ray with the square
    ///
    /// # Errors
    ///
    /// Returns the [`PickMiss`] reason when there is no front-face hit.
    pub fn intersect(&self, ray: &Ray) -> Result<Point3<f32>, PickMiss> {
        let dy = ray.direction.y;
        if dy.abs() < f32::EPSILON {
            return Err(PickMiss::Parallel);
        }
        if dy > 0.0 {
            return Err(PickMiss::BackFace);
        }
        let t = -ray.origin.y / dy;
        if t <= 0.0 {
            return Err(PickMiss::BehindOrigin);
        }
        let hit = ray.at(t);
        if hit.x.abs() > self.half_extent || hit.z.abs() > self.half_extent {
            return Err(PickMiss::OutsideTarget);
        }
        Ok(Point3::new(hit.x, 0.0, hit.z))
    }
}

/// Turns pointer events into disturbances
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    plane: TargetPlane,
    press: DropSettings,
    stir: DropSettings,
    stirring: bool,
}

impl Interaction {
    /// Create with stirring disabled
    ///
    /// # Arguments
    ///
    /// * `press` - Drop used for pointer presses
    /// * `stir` - Drop used for pointer moves once stirring is enabled
    #[must_use]
    pub fn new(press: DropSettings, stir: DropSettings) -> Self {
        Self {
            plane: TargetPlane::default(),
            press,
            stir,
            stirring: false,
        }
    }

    /// Let pointer moves create drops
    pub fn enable_stirring(&mut self) {
        self.stirring = true;
    }

    /// Whether pointer moves create drops
    #[must_use]
    pub fn stirring_enabled(&self) -> bool {
        self.stirring
    }

    /// Point on the target plane under a client pixel
    ///
    /// # Errors
    ///
    /// Returns a [`PickMiss`] when the pointer ray misses the square.
    pub fn pick(
        &self,
        x: f32,
        y: f32,
        camera: &OrbitCamera,
        viewport: &Viewport,
    ) -> Result<Point3<f32>, PickMiss> {
        let ray = camera
            .ray_through(viewport.ndc(x, y))
            .ok_or(PickMiss::Unprojectable)?;
        self.plane.intersect(&ray)
    }

    /// Disturbance for a pointer event, if any
    ///
    /// Moves are ignored until stirring is enabled. A miss yields `None`.
    #[must_use]
    pub fn disturbance_for(
        &self,
        event: PointerEvent,
        camera: &OrbitCamera,
        viewport: &Viewport,
    ) -> Option<Disturbance> {
        let (x, y, settings) = match event {
            PointerEvent::Press { x, y } => (x, y, self.press),
            PointerEvent::Move { x, y } if self.stirring => (x, y, self.stir),
            PointerEvent::Move { .. } => return None,
        };

        match self.pick(x, y, camera, viewport) {
            Ok(hit) => Some(Disturbance::from_settings([hit.x, hit.z], settings)),
            Err(miss) => {
                trace!(%miss, x, y, "pointer missed the water");
                None
            }
        }
    }
}
