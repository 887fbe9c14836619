//! Pose and distance helpers shared by the catalog, the player store and the
//! collision engine.
//!
//! Clients send raw 4×4 world matrices. Hand matrices may carry a display
//! scale baked in by the renderer, so every matrix is decomposed into a rigid
//! pose (translation + closest rotation) before it is used for collision.

use nalgebra::{Isometry3, Matrix3, Matrix4, Point3, Rotation3, Translation3, UnitQuaternion};

/// Compose a world position and orientation into a rigid world transform.
pub fn compose(position: &Point3<f32>, rotation: &UnitQuaternion<f32>) -> Isometry3<f32> {
    Isometry3::from_parts(Translation3::from(position.coords), *rotation)
}

/// Convergence threshold for rotation extraction.
const ROTATION_EPS: f32 = 1.0e-6;

/// Iteration cap for rotation extraction. Reflections and degenerate scales
/// do not converge.
const ROTATION_MAX_ITER: usize = 32;

/// Decompose a world matrix into a rigid pose.
///
/// The rotation is the closest proper rotation to the upper 3×3 block, which
/// discards any uniform or non-uniform scale. Blocks with no meaningful
/// closest rotation yield whatever the bounded search reached.
pub fn pose_from_matrix(m: &Matrix4<f32>) -> Isometry3<f32> {
    let linear: Matrix3<f32> = m.fixed_view::<3, 3>(0, 0).into_owned();
    let rotation = Rotation3::from_matrix_eps(
        &linear,
        ROTATION_EPS,
        ROTATION_MAX_ITER,
        Rotation3::identity(),
    );
    compose(&origin_of(m), &UnitQuaternion::from_rotation_matrix(&rotation))
}

/// World-space position of a transform's local origin.
///
/// This is the translation column as-is; the bottom row is never used.
pub fn origin_of(m: &Matrix4<f32>) -> Point3<f32> {
    Point3::from(m.fixed_view::<3, 1>(0, 3).into_owned())
}

/// A sphere in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Point3<f32>,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Point3<f32>, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sum-of-radii overlap test. Touching spheres do not overlap.
    pub fn overlaps(&self, other: &Sphere) -> bool {
        nalgebra::distance(&self.center, &other.center) < self.radius + other.radius
    }
}

/// Smallest distance from `target` to any of `points`.
///
/// Returns `f32::INFINITY` for an empty slice.
pub fn closest_distance(points: &[Point3<f32>], target: &Point3<f32>) -> f32 {
    points
        .iter()
        .map(|p| nalgebra::distance(p, target))
        .fold(f32::INFINITY, f32::min)
}
