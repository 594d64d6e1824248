//! Orbit camera and picking rays
//!
//! The camera orbits a target on a sphere described by a radius, an azimuth
//! around +Y (measured from +Z) and a polar angle from +Y. Pointer drags and
//! wheel steps accumulate between frames and are applied once per frame by
//! [`OrbitCamera::update`].

use crate::config::CameraSettings;
use nalgebra::{Matrix4, Point3, Vector2, Vector3, Vector4};
use std::f32::consts::PI;

/// Smallest polar angle, keeps the view matrix away from the pole
pub const MIN_POLAR: f32 = 1e-6;

/// Radius scale per wheel line
const ZOOM_STEP: f32 = 0.95;

/// Maps OpenGL clip depth `[-1, 1]` onto the `[0, 1]` range wgpu expects
#[rustfmt::skip]
#[must_use]
pub fn opengl_to_wgpu() -> Matrix4<f32> {
    Matrix4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 0.5, 0.5,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Half-line in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start point
    pub origin: Point3<f32>,
    /// Unit direction
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Point at parameter `t`
    #[must_use]
    pub fn at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }
}

/// Perspective camera orbiting a fixed target
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    target: Point3<f32>,
    radius: f32,
    azimuth: f32,
    polar: f32,
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
    max_polar: f32,
    min_distance: f32,
    max_distance: f32,

    // Input accumulated since the last update
    pending_azimuth: f32,
    pending_polar: f32,
    pending_scale: f32,
}

impl OrbitCamera {
    /// Camera at the configured pose
    ///
    /// # Arguments
    ///
    /// * `settings` - Eye, target and projection
    /// * `aspect` - Viewport width over height; 1.0 is used if it is not
    ///   finite and positive
    #[must_use]
    pub fn new(settings: &CameraSettings, aspect: f32) -> Self {
        let target = Point3::from(settings.target);
        let offset = Point3::from(settings.eye) - target;
        let radius = offset.norm();
        let polar = if radius > 0.0 {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            PI / 2.0
        };
        let azimuth = offset.x.atan2(offset.z);
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };

        Self {
            target,
            radius,
            azimuth,
            polar: polar.max(MIN_POLAR).min(settings.max_polar_angle),
            fov_y: settings.fov_degrees.to_radians(),
            aspect,
            near: settings.near,
            far: settings.far,
            max_polar: settings.max_polar_angle,
            min_distance: settings.min_distance(),
            max_distance: settings.max_distance(),
            pending_azimuth: 0.0,
            pending_polar: 0.0,
            pending_scale: 1.0,
        }
    }

    /// Eye position
    #[must_use]
    pub fn eye(&self) -> Point3<f32> {
        let (sin_polar, cos_polar) = self.polar.sin_cos();
        let (sin_azimuth, cos_azimuth) = self.azimuth.sin_cos();
        self.target
            + Vector3::new(
                sin_polar * sin_azimuth,
                cos_polar,
                sin_polar * cos_azimuth,
            ) * self.radius
    }

    /// Orbit target
    #[must_use]
    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    /// Unit vector from the eye to the target
    #[must_use]
    pub fn forward(&self) -> Vector3<f32> {
        (self.target - self.eye()).normalize()
    }

    /// Polar angle from +Y in radians
    #[must_use]
    pub fn polar_angle(&self) -> f32 {
        self.polar
    }

    /// Distance from the eye to the target
    #[must_use]
    pub fn distance(&self) -> f32 {
        self.radius
    }

    /// Update the projection for a new viewport size
    pub fn set_aspect(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width / height;
        }
    }

    /// View matrix
    #[must_use]
    pub fn view(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.eye(), &self.target, &Vector3::y())
    }

    /// Projection with OpenGL clip depth
    #[must_use]
    pub fn projection(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fov_y, self.near, self.far)
    }

    /// Projection times view, OpenGL clip depth
    #[must_use]
    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection() * self.view()
    }

    /// Projection times view, wgpu clip depth
    #[must_use]
    pub fn gpu_view_projection(&self) -> Matrix4<f32> {
        opengl_to_wgpu() * self.view_projection()
    }

    /// World point at normalized device coordinates `(x, y, z)`
    ///
    /// Returns `None` if the camera matrices are singular.
    #[must_use]
    pub fn unproject(&self, ndc: Vector2<f32>, z: f32) -> Option<Point3<f32>> {
        self.unproject_f64(ndc, z).map(|p| p.cast::<f32>())
    }

    // Points near the near plane lose most of their f32 precision after the
    // inverse, so the ray math runs in double precision.
    fn unproject_f64(&self, ndc: Vector2<f32>, z: f32) -> Option<Point3<f64>> {
        let inverse = self.view_projection().cast::<f64>().try_inverse()?;
        let clip = inverse
            * Vector4::new(
                f64::from(ndc.x),
                f64::from(ndc.y),
                f64::from(z),
                1.0,
            );
        if clip.w.abs() < f64::EPSILON {
            return None;
        }
        Some(Point3::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w))
    }

    /// Ray from the eye through a point in normalized device coordinates
    #[must_use]
    pub fn ray_through(&self, ndc: Vector2<f32>) -> Option<Ray> {
        let eye = self.eye();
        let direction = (self.unproject_f64(ndc, 0.5)? - eye.cast::<f64>())
            .try_normalize(f64::EPSILON)?
            .cast::<f32>();
        Some(Ray {
            origin: eye,
            direction,
        })
    }

    /// Queue an orbit from a pointer drag
    ///
    /// A drag across the full viewport height turns the camera once around.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        if viewport_height <= 0.0 {
            return;
        }
        self.pending_azimuth -= 2.0 * PI * dx / viewport_height;
        self.pending_polar -= 2.0 * PI * dy / viewport_height;
    }

    /// Queue a zoom; positive `lines` move the eye closer
    pub fn zoom(&mut self, lines: f32) {
        self.pending_scale *= ZOOM_STEP.powf(lines);
    }

    /// Apply accumulated input
    ///
    /// Returns `true` if the pose changed.
    pub fn update(&mut self) -> bool {
        let before = (self.azimuth, self.polar, self.radius);

        self.azimuth += self.pending_azimuth;
        // Bounds may be inverted in unvalidated settings
        self.polar = (self.polar + self.pending_polar)
            .max(MIN_POLAR)
            .min(self.max_polar);
        self.radius = (self.radius * self.pending_scale)
            .max(self.min_distance)
            .min(self.max_distance);

        self.pending_azimuth = 0.0;
        self.pending_polar = 0.0;
        self.pending_scale = 1.0;

        before != (self.azimuth, self.polar, self.radius)
    }
}
