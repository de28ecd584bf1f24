/*!
Physics-side collaborator interface.

The synchronizer never owns physics state. It reads colliders through [`PhysicsView`], which
the engine adapter implements (see [`crate::rapier`]). The engine stays the only source of
truth for whether a handle is live.
*/

use crate::handle::{BodyId, ColliderId};
use crate::types::{Iso, Vec3};

/// Kind of the collider's parent body.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum BodyKind {
    Fixed,
    Kinematic,
    Dynamic,
    /// No parent body, or a body the adapter could not classify.
    #[default]
    Unknown,
}

/// Mutable body/collider state the display color depends on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct BodyState {
    pub kind: BodyKind,
    pub enabled: bool,
    pub sleeping: bool,
    pub ccd_enabled: bool,
    pub sensor: bool,
}

/// Regular height grid.
///
/// `heights` holds `rows * cols` samples in row-major order: sample `(i, j)` is at
/// `heights[i * cols + j]`. Rows run along local Z and columns along local X; the grid spans
/// `[-0.5, 0.5]` on both axes before `scale` is applied.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightFieldDesc {
    pub rows: usize,
    pub cols: usize,
    pub heights: Vec<f32>,
    pub scale: Vec3,
}

impl HeightFieldDesc {
    #[inline]
    pub fn height(&self, row: usize, col: usize) -> f32 {
        self.heights[row * self.cols + col]
    }
}

/// Indexed triangle soup in shape-local space.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct MeshGeometry {
    pub vertices: Vec<[f32; 3]>,
    pub indices: Vec<[u32; 3]>,
}

impl MeshGeometry {
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }
}

/// Engine-neutral shape parameters.
///
/// Y-aligned shapes (cylinder, cone, capsule) follow the usual physics-engine convention of
/// a half-height along local +Y.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeDesc {
    Cuboid {
        half_extents: Vec3,
    },
    RoundCuboid {
        half_extents: Vec3,
        border_radius: f32,
    },
    Ball {
        radius: f32,
    },
    Cylinder {
        radius: f32,
        half_height: f32,
    },
    RoundCylinder {
        radius: f32,
        half_height: f32,
        border_radius: f32,
    },
    Cone {
        radius: f32,
        half_height: f32,
    },
    RoundCone {
        radius: f32,
        half_height: f32,
        border_radius: f32,
    },
    /// Capsule whose segment may be arbitrary; `local` maps the unit Y-aligned capsule onto the
    /// segment (midpoint translation + rotation from +Y to the segment direction).
    Capsule {
        radius: f32,
        half_height: f32,
        local: Iso,
    },
    TriMesh(MeshGeometry),
    HeightField(HeightFieldDesc),
    /// Convex hull already triangulated by the engine.
    ConvexHull(MeshGeometry),
    RoundConvexHull {
        hull: MeshGeometry,
        border_radius: f32,
    },
    /// Anything the renderer has no representation for (half-spaces, compounds, ...).
    Unsupported(String),
}

/// One live collider, as seen by the synchronizer.
pub trait ColliderView {
    fn id(&self) -> ColliderId;

    /// Parent body, if attached.
    fn body(&self) -> Option<BodyId>;

    /// Shape parameters. Only read the first time a handle is seen.
    fn shape(&self) -> ShapeDesc;

    /// Current world pose.
    fn pose(&self) -> Iso;

    fn state(&self) -> BodyState;
}

/// Read access to the physics world's live colliders.
pub trait PhysicsView {
    type Collider<'a>: ColliderView
    where
        Self: 'a;

    fn collider(&self, id: ColliderId) -> Option<Self::Collider<'_>>;

    fn colliders(&self) -> impl Iterator<Item = Self::Collider<'_>>;

    fn is_live(&self, id: ColliderId) -> bool {
        self.collider(id).is_some()
    }
}
