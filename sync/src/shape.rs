/*!
Shape classification.

Every collider lands in exactly one of two places:
- an instanced bucket, when its geometry is a (non-uniform) scale of one of the shared unit
  shapes described in [`crate::constants`];
- the standalone mesh table, when its vertex data varies per collider (triangle meshes,
  height fields, convex hulls).

The scale derived here is computed once at insertion. Shapes are assumed not to change
dimensions afterwards.
*/

use crate::constants::{
    UNIT_BALL_RADIUS, UNIT_CAPSULE_HALF_LENGTH, UNIT_CAPSULE_RADIUS, UNIT_CONE_HEIGHT,
    UNIT_CONE_RADIUS, UNIT_CUBOID_SIZE, UNIT_CYLINDER_HEIGHT, UNIT_CYLINDER_RADIUS,
};
use crate::error::{Result, SyncError};
use crate::handle::ColliderId;
use crate::physics::{HeightFieldDesc, MeshGeometry, ShapeDesc};
use crate::types::{Bucket, Iso, Vec3};

/// Outcome of classifying a collider's shape.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeClass {
    Instanced {
        bucket: Bucket,
        /// Scale applied to the bucket's unit geometry.
        scale: Vec3,
        /// Shape-local offset composed with the collider pose every frame.
        local: Iso,
    },
    Standalone(MeshGeometry),
}

impl ShapeClass {
    fn instanced(bucket: Bucket, scale: Vec3) -> Self {
        ShapeClass::Instanced {
            bucket,
            scale,
            local: Iso::identity(),
        }
    }

    pub fn bucket(&self) -> Option<Bucket> {
        match self {
            ShapeClass::Instanced { bucket, .. } => Some(*bucket),
            ShapeClass::Standalone(_) => None,
        }
    }
}

/// Classifies `shape`, deriving the per-instance scale or building standalone geometry.
///
/// Returns [`SyncError::UnknownShape`] for shapes with no renderable representation.
pub fn classify(collider: ColliderId, shape: ShapeDesc) -> Result<ShapeClass> {
    let class = match shape {
        ShapeDesc::Cuboid { half_extents } => {
            ShapeClass::instanced(Bucket::Cuboid, cuboid_scale(half_extents))
        }
        // The border inflates the inner box on every axis.
        ShapeDesc::RoundCuboid {
            half_extents,
            border_radius,
        } => ShapeClass::instanced(
            Bucket::Cuboid,
            cuboid_scale(half_extents.add_scalar(border_radius)),
        ),
        ShapeDesc::Ball { radius } => {
            ShapeClass::instanced(Bucket::Ball, Vec3::repeat(radius / UNIT_BALL_RADIUS))
        }
        ShapeDesc::Cylinder {
            radius,
            half_height,
        } => ShapeClass::instanced(
            Bucket::Cylinder,
            axial_scale(radius, half_height, UNIT_CYLINDER_RADIUS, UNIT_CYLINDER_HEIGHT),
        ),
        ShapeDesc::RoundCylinder {
            radius,
            half_height,
            border_radius,
        } => ShapeClass::instanced(
            Bucket::Cylinder,
            axial_scale(
                radius + border_radius,
                half_height + border_radius,
                UNIT_CYLINDER_RADIUS,
                UNIT_CYLINDER_HEIGHT,
            ),
        ),
        ShapeDesc::Cone {
            radius,
            half_height,
        } => ShapeClass::instanced(
            Bucket::Cone,
            axial_scale(radius, half_height, UNIT_CONE_RADIUS, UNIT_CONE_HEIGHT),
        ),
        ShapeDesc::RoundCone {
            radius,
            half_height,
            border_radius,
        } => ShapeClass::instanced(
            Bucket::Cone,
            axial_scale(
                radius + border_radius,
                half_height + border_radius,
                UNIT_CONE_RADIUS,
                UNIT_CONE_HEIGHT,
            ),
        ),
        ShapeDesc::Capsule {
            radius,
            half_height,
            local,
        } => ShapeClass::Instanced {
            bucket: Bucket::Capsule,
            scale: capsule_scale(radius, half_height),
            local,
        },
        ShapeDesc::TriMesh(geometry) | ShapeDesc::ConvexHull(geometry) => {
            ShapeClass::Standalone(geometry)
        }
        // Rendered without the rounding; the hull alone is a close enough silhouette.
        ShapeDesc::RoundConvexHull { hull, .. } => ShapeClass::Standalone(hull),
        ShapeDesc::HeightField(field) => ShapeClass::Standalone(heightfield_geometry(&field)),
        ShapeDesc::Unsupported(shape) => {
            return Err(SyncError::UnknownShape { collider, shape });
        }
    };

    Ok(class)
}

#[inline]
fn cuboid_scale(half_extents: Vec3) -> Vec3 {
    half_extents * (2.0 / UNIT_CUBOID_SIZE)
}

/// Scale for Y-aligned shapes defined by a radius and a half-height.
#[inline]
fn axial_scale(radius: f32, half_height: f32, unit_radius: f32, unit_height: f32) -> Vec3 {
    let radial = radius / unit_radius;
    Vec3::new(radial, 2.0 * half_height / unit_height, radial)
}

/// The unit capsule's total height includes both hemispheres, so the vertical scale maps
/// `half_height + radius` onto `UNIT_CAPSULE_HALF_LENGTH + UNIT_CAPSULE_RADIUS`.
#[inline]
pub fn capsule_scale(radius: f32, half_height: f32) -> Vec3 {
    let radial = radius / UNIT_CAPSULE_RADIUS;
    let vertical = (half_height + radius) / (UNIT_CAPSULE_HALF_LENGTH + UNIT_CAPSULE_RADIUS);
    Vec3::new(radial, vertical, radial)
}

/// Triangulates a height field as a regular grid: two triangles per cell, wound
/// counter-clockwise when seen from +Y.
pub fn heightfield_geometry(field: &HeightFieldDesc) -> MeshGeometry {
    let (rows, cols) = (field.rows, field.cols);

    if field.heights.len() < rows * cols {
        log::warn!(
            "height field has {} samples, expected {}x{}; rendering nothing",
            field.heights.len(),
            rows,
            cols
        );
        return MeshGeometry::default();
    }

    let step = |n: usize, k: usize| {
        if n > 1 {
            k as f32 / (n - 1) as f32 - 0.5
        } else {
            0.0
        }
    };

    let mut vertices = Vec::with_capacity(rows * cols);
    for i in 0..rows {
        for j in 0..cols {
            vertices.push([
                step(cols, j) * field.scale.x,
                field.height(i, j) * field.scale.y,
                step(rows, i) * field.scale.z,
            ]);
        }
    }

    let cells = rows.saturating_sub(1) * cols.saturating_sub(1);
    let mut indices = Vec::with_capacity(cells * 2);
    for i in 0..rows.saturating_sub(1) {
        for j in 0..cols.saturating_sub(1) {
            let a = (i * cols + j) as u32;
            let b = a + 1;
            let c = a + cols as u32;
            let d = c + 1;
            indices.push([a, c, b]);
            indices.push([b, c, d]);
        }
    }

    MeshGeometry { vertices, indices }
}
