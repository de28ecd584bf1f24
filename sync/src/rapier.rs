//! Rapier adapter: exposes `RigidBodySet`/`ColliderSet` through [`PhysicsView`].
//!
//! Re-exports Rapier so downstream crates can build worlds without depending on `rapier3d`
//! directly.

pub use rapier3d;

use nalgebra as na;
use rapier3d::parry::shape::{Capsule, HeightField, Shape, TypedShape};
use rapier3d::prelude::{
    Collider, ColliderHandle, ColliderSet, RigidBody, RigidBodyHandle, RigidBodySet,
};

use crate::handle::{BodyId, ColliderId};
use crate::physics::{
    BodyKind, BodyState, ColliderView, HeightFieldDesc, MeshGeometry, PhysicsView, ShapeDesc,
};
use crate::types::{Iso, Quat, Vec3};

#[inline]
pub fn collider_id(handle: ColliderHandle) -> ColliderId {
    let (index, generation) = handle.into_raw_parts();
    ColliderId::from_raw_parts(index, generation)
}

#[inline]
pub fn collider_handle(id: ColliderId) -> ColliderHandle {
    ColliderHandle::from_raw_parts(id.index(), id.generation())
}

#[inline]
pub fn body_id(handle: RigidBodyHandle) -> BodyId {
    let (index, generation) = handle.into_raw_parts();
    BodyId::from_raw_parts(index, generation)
}

#[inline]
pub fn body_handle(id: BodyId) -> RigidBodyHandle {
    RigidBodyHandle::from_raw_parts(id.index(), id.generation())
}

/// Borrowed view over a Rapier world.
#[derive(Clone, Copy)]
pub struct RapierView<'a> {
    pub bodies: &'a RigidBodySet,
    pub colliders: &'a ColliderSet,
}

impl<'a> RapierView<'a> {
    pub fn new(bodies: &'a RigidBodySet, colliders: &'a ColliderSet) -> Self {
        Self { bodies, colliders }
    }
}

fn wrap<'b>(
    bodies: &'b RigidBodySet,
    handle: ColliderHandle,
    collider: &'b Collider,
) -> RapierCollider<'b> {
    RapierCollider {
        handle,
        collider,
        body: collider.parent().and_then(|parent| bodies.get(parent)),
    }
}

impl<'a> PhysicsView for RapierView<'a> {
    type Collider<'b>
        = RapierCollider<'b>
    where
        Self: 'b;

    fn collider(&self, id: ColliderId) -> Option<RapierCollider<'_>> {
        let handle = collider_handle(id);
        self.colliders
            .get(handle)
            .map(|collider| wrap(self.bodies, handle, collider))
    }

    fn colliders(&self) -> impl Iterator<Item = RapierCollider<'_>> {
        let bodies = self.bodies;
        self.colliders
            .iter()
            .map(move |(handle, collider)| wrap(bodies, handle, collider))
    }
}

/// A single Rapier collider with its (optional) parent body.
pub struct RapierCollider<'a> {
    handle: ColliderHandle,
    collider: &'a Collider,
    body: Option<&'a RigidBody>,
}

impl ColliderView for RapierCollider<'_> {
    fn id(&self) -> ColliderId {
        collider_id(self.handle)
    }

    fn body(&self) -> Option<BodyId> {
        self.collider.parent().map(body_id)
    }

    fn shape(&self) -> ShapeDesc {
        shape_desc(self.collider.shape())
    }

    fn pose(&self) -> Iso {
        // Copy through components so the adapter does not depend on Rapier's nalgebra version.
        let t = self.collider.translation();
        let q = self.collider.rotation();
        Iso::from_parts(
            na::Translation3::new(t.x, t.y, t.z),
            Quat::new_normalize(na::Quaternion::new(q.w, q.i, q.j, q.k)),
        )
    }

    fn state(&self) -> BodyState {
        let kind = match self.body {
            None => BodyKind::Unknown,
            Some(body) if body.is_fixed() => BodyKind::Fixed,
            Some(body) if body.is_kinematic() => BodyKind::Kinematic,
            Some(body) if body.is_dynamic() => BodyKind::Dynamic,
            Some(_) => BodyKind::Unknown,
        };

        BodyState {
            kind,
            enabled: self.collider.is_enabled() && self.body.is_none_or(|b| b.is_enabled()),
            sleeping: self.body.is_some_and(|b| b.is_sleeping()),
            ccd_enabled: self.body.is_some_and(|b| b.is_ccd_enabled()),
            sensor: self.collider.is_sensor(),
        }
    }
}

/// Maps a Rapier shape onto the engine-neutral [`ShapeDesc`].
pub fn shape_desc(shape: &dyn Shape) -> ShapeDesc {
    match shape.as_typed_shape() {
        TypedShape::Cuboid(c) => ShapeDesc::Cuboid {
            half_extents: Vec3::new(c.half_extents.x, c.half_extents.y, c.half_extents.z),
        },
        TypedShape::RoundCuboid(c) => {
            let he = &c.inner_shape.half_extents;
            ShapeDesc::RoundCuboid {
                half_extents: Vec3::new(he.x, he.y, he.z),
                border_radius: c.border_radius,
            }
        }
        TypedShape::Ball(b) => ShapeDesc::Ball { radius: b.radius },
        TypedShape::Cylinder(c) => ShapeDesc::Cylinder {
            radius: c.radius,
            half_height: c.half_height,
        },
        TypedShape::RoundCylinder(c) => ShapeDesc::RoundCylinder {
            radius: c.inner_shape.radius,
            half_height: c.inner_shape.half_height,
            border_radius: c.border_radius,
        },
        TypedShape::Cone(c) => ShapeDesc::Cone {
            radius: c.radius,
            half_height: c.half_height,
        },
        TypedShape::RoundCone(c) => ShapeDesc::RoundCone {
            radius: c.inner_shape.radius,
            half_height: c.inner_shape.half_height,
            border_radius: c.border_radius,
        },
        TypedShape::Capsule(c) => capsule_desc(c),
        TypedShape::TriMesh(mesh) => ShapeDesc::TriMesh(MeshGeometry {
            vertices: mesh.vertices().iter().map(|p| [p.x, p.y, p.z]).collect(),
            indices: mesh.indices().to_vec(),
        }),
        TypedShape::HeightField(hf) => ShapeDesc::HeightField(heightfield_desc(hf)),
        TypedShape::ConvexPolyhedron(poly) => {
            let (vertices, indices) = poly.to_trimesh();
            ShapeDesc::ConvexHull(MeshGeometry {
                vertices: vertices.iter().map(|p| [p.x, p.y, p.z]).collect(),
                indices,
            })
        }
        TypedShape::RoundConvexPolyhedron(poly) => {
            let (vertices, indices) = poly.inner_shape.to_trimesh();
            ShapeDesc::RoundConvexHull {
                hull: MeshGeometry {
                    vertices: vertices.iter().map(|p| [p.x, p.y, p.z]).collect(),
                    indices,
                },
                border_radius: poly.border_radius,
            }
        }
        _ => ShapeDesc::Unsupported(format!("{:?}", shape.shape_type())),
    }
}

/// Rapier capsules are defined by an arbitrary segment; the unit capsule is Y-aligned and
/// centered, so record the segment's midpoint and direction as a shape-local pose.
fn capsule_desc(capsule: &Capsule) -> ShapeDesc {
    let a = Vec3::new(capsule.segment.a.x, capsule.segment.a.y, capsule.segment.a.z);
    let b = Vec3::new(capsule.segment.b.x, capsule.segment.b.y, capsule.segment.b.z);
    let axis = b - a;
    let half_height = axis.norm() * 0.5;

    let rotation = if half_height <= f32::EPSILON {
        Quat::identity()
    } else {
        Quat::rotation_between(&Vec3::y(), &axis).unwrap_or_else(|| {
            // Antiparallel to +Y.
            Quat::from_axis_angle(&Vec3::x_axis(), std::f32::consts::PI)
        })
    };

    ShapeDesc::Capsule {
        radius: capsule.radius,
        half_height,
        local: Iso::from_parts(na::Translation3::from((a + b) * 0.5), rotation),
    }
}

fn heightfield_desc(hf: &HeightField) -> HeightFieldDesc {
    let samples = hf.heights();
    let (rows, cols) = (samples.nrows(), samples.ncols());

    let mut heights = Vec::with_capacity(rows * cols);
    for i in 0..rows {
        for j in 0..cols {
            heights.push(samples[(i, j)]);
        }
    }

    let scale = hf.scale();
    HeightFieldDesc {
        rows,
        cols,
        heights,
        scale: Vec3::new(scale.x, scale.y, scale.z),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapier3d::prelude::*;

    struct World {
        bodies: RigidBodySet,
        colliders: ColliderSet,
    }

    impl World {
        fn new() -> Self {
            Self {
                bodies: RigidBodySet::new(),
                colliders: ColliderSet::new(),
            }
        }

        fn view(&self) -> RapierView<'_> {
            RapierView::new(&self.bodies, &self.colliders)
        }
    }

    #[test]
    fn handles_convert_both_ways() {
        let handle = ColliderHandle::from_raw_parts(12, 3);
        assert_eq!(collider_handle(collider_id(handle)), handle);

        let body = RigidBodyHandle::from_raw_parts(7, 1);
        assert_eq!(body_handle(body_id(body)), body);
    }

    #[test]
    fn maps_primitive_shapes() {
        let mut world = World::new();
        let cuboid = world.colliders.insert(ColliderBuilder::cuboid(1.0, 2.0, 3.0).build());
        let ball = world.colliders.insert(ColliderBuilder::ball(0.5).build());
        let cone = world.colliders.insert(ColliderBuilder::cone(1.5, 0.25).build());

        let view = world.view();
        assert_eq!(
            view.collider(collider_id(cuboid)).map(|c| c.shape()),
            Some(ShapeDesc::Cuboid {
                half_extents: Vec3::new(1.0, 2.0, 3.0)
            })
        );
        assert_eq!(
            view.collider(collider_id(ball)).map(|c| c.shape()),
            Some(ShapeDesc::Ball { radius: 0.5 })
        );
        assert_eq!(
            view.collider(collider_id(cone)).map(|c| c.shape()),
            Some(ShapeDesc::Cone {
                radius: 0.25,
                half_height: 1.5
            })
        );
    }

    #[test]
    fn y_capsule_has_identity_local_pose() {
        let mut world = World::new();
        let handle = world
            .colliders
            .insert(ColliderBuilder::capsule_y(0.75, 0.25).build());

        let Some(ShapeDesc::Capsule {
            radius,
            half_height,
            local,
        }) = world.view().collider(collider_id(handle)).map(|c| c.shape())
        else {
            panic!("expected a capsule");
        };

        assert!((radius - 0.25).abs() < 1.0e-6);
        assert!((half_height - 0.75).abs() < 1.0e-6);
        assert!(local.translation.vector.norm() < 1.0e-6);
        assert!(local.rotation.angle() < 1.0e-5);
    }

    #[test]
    fn x_capsule_rotates_y_onto_x() {
        let mut world = World::new();
        let handle = world
            .colliders
            .insert(ColliderBuilder::capsule_x(1.0, 0.5).build());

        let Some(ShapeDesc::Capsule { local, .. }) =
            world.view().collider(collider_id(handle)).map(|c| c.shape())
        else {
            panic!("expected a capsule");
        };

        let mapped = local.rotation * Vec3::y();
        assert!((mapped.x.abs() - 1.0).abs() < 1.0e-5);
    }

    #[test]
    fn half_space_is_unsupported() {
        let mut world = World::new();
        let handle = world
            .colliders
            .insert(ColliderBuilder::halfspace(Vector::y_axis()).build());

        let shape = world.view().collider(collider_id(handle)).map(|c| c.shape());
        assert!(matches!(shape, Some(ShapeDesc::Unsupported(_))));
    }

    #[test]
    fn reports_body_state() {
        let mut world = World::new();
        let fixed = world.bodies.insert(RigidBodyBuilder::fixed().build());
        let dynamic = world
            .bodies
            .insert(RigidBodyBuilder::dynamic().ccd_enabled(true).build());

        let ground = world.colliders.insert_with_parent(
            ColliderBuilder::cuboid(5.0, 0.1, 5.0).build(),
            fixed,
            &mut world.bodies,
        );
        let sensor = world.colliders.insert_with_parent(
            ColliderBuilder::ball(0.5).sensor(true).build(),
            dynamic,
            &mut world.bodies,
        );
        let loose = world.colliders.insert(ColliderBuilder::ball(0.5).build());

        let view = world.view();
        let ground = view.collider(collider_id(ground)).map(|c| c.state()).unwrap();
        let sensor = view.collider(collider_id(sensor)).map(|c| c.state()).unwrap();
        let loose = view.collider(collider_id(loose)).map(|c| c.state()).unwrap();

        assert_eq!(ground.kind, BodyKind::Fixed);
        assert!(ground.enabled);
        assert!(!ground.sensor);

        assert_eq!(sensor.kind, BodyKind::Dynamic);
        assert!(sensor.sensor);
        assert!(sensor.ccd_enabled);

        assert_eq!(loose.kind, BodyKind::Unknown);
    }

    #[test]
    fn parent_is_reported_as_body_id() {
        let mut world = World::new();
        let body = world.bodies.insert(RigidBodyBuilder::dynamic().build());
        let handle = world.colliders.insert_with_parent(
            ColliderBuilder::ball(1.0).build(),
            body,
            &mut world.bodies,
        );

        let view = world.view();
        assert_eq!(
            view.collider(collider_id(handle)).and_then(|c| c.body()),
            Some(body_id(body))
        );
    }

    #[test]
    fn pose_follows_collider_translation() {
        let mut world = World::new();
        let handle = world.colliders.insert(
            ColliderBuilder::ball(1.0)
                .translation(vector![1.0, 2.0, 3.0])
                .build(),
        );

        let pose = world
            .view()
            .collider(collider_id(handle))
            .map(|c| c.pose())
            .unwrap();
        assert_eq!(pose.translation.vector, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn iterates_every_live_collider() {
        let mut world = World::new();
        for _ in 0..4 {
            world.colliders.insert(ColliderBuilder::ball(1.0).build());
        }
        assert_eq!(world.view().colliders().count(), 4);
    }

    fn shape_of(world: &World, handle: ColliderHandle) -> ShapeDesc {
        match world.view().collider(collider_id(handle)) {
            Some(collider) => collider.shape(),
            None => panic!("collider {handle:?} is not in the world"),
        }
    }

    /// Sorted, deduplicated vertex positions rounded to a millimeter.
    fn vertex_set(vertices: impl IntoIterator<Item = [f32; 3]>) -> Vec<[i32; 3]> {
        let mut set: Vec<_> = vertices
            .into_iter()
            .map(|v| v.map(|c| (c * 1000.0).round() as i32))
            .collect();
        set.sort_unstable();
        set.dedup();
        set
    }

    fn cube_points() -> Vec<Point<Real>> {
        let mut points = Vec::new();
        for x in [-1.0, 1.0] {
            for y in [-1.0, 1.0] {
                for z in [-1.0, 1.0] {
                    points.push(Point::new(x, y, z));
                }
            }
        }
        points
    }

    #[test]
    fn maps_rounded_primitives() {
        let mut world = World::new();
        let cuboid = world
            .colliders
            .insert(ColliderBuilder::round_cuboid(1.0, 2.0, 3.0, 0.1).build());
        let cylinder = world
            .colliders
            .insert(ColliderBuilder::round_cylinder(1.0, 0.5, 0.1).build());
        let cone = world
            .colliders
            .insert(ColliderBuilder::round_cone(1.5, 0.25, 0.05).build());

        assert_eq!(
            shape_of(&world, cuboid),
            ShapeDesc::RoundCuboid {
                half_extents: Vec3::new(1.0, 2.0, 3.0),
                border_radius: 0.1,
            }
        );
        assert_eq!(
            shape_of(&world, cylinder),
            ShapeDesc::RoundCylinder {
                radius: 0.5,
                half_height: 1.0,
                border_radius: 0.1,
            }
        );
        assert_eq!(
            shape_of(&world, cone),
            ShapeDesc::RoundCone {
                radius: 0.25,
                half_height: 1.5,
                border_radius: 0.05,
            }
        );
    }

    #[test]
    fn trimesh_keeps_its_buffers() {
        let vertices = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(0.0, 0.0, 1.0),
            Point::new(1.0, 0.5, 1.0),
        ];
        let indices = vec![[0, 2, 1], [1, 2, 3]];
        let Ok(builder) = ColliderBuilder::trimesh(vertices, indices.clone()) else {
            panic!("valid mesh rejected");
        };

        let mut world = World::new();
        let handle = world.colliders.insert(builder.build());

        let ShapeDesc::TriMesh(geometry) = shape_of(&world, handle) else {
            panic!("expected a triangle mesh");
        };
        assert_eq!(geometry.indices, indices);
        assert_eq!(geometry.vertices[3], [1.0, 0.5, 1.0]);
    }

    #[test]
    fn convex_hulls_map_to_hull_geometry() {
        let points = cube_points();
        let expected = vertex_set(points.iter().map(|p| [p.x, p.y, p.z]));

        let mut world = World::new();
        let (Some(hull), Some(round)) = (
            ColliderBuilder::convex_hull(&points),
            ColliderBuilder::round_convex_hull(&points, 0.05),
        ) else {
            panic!("cube hull rejected");
        };
        let hull = world.colliders.insert(hull.build());
        let round = world.colliders.insert(round.build());

        let ShapeDesc::ConvexHull(geometry) = shape_of(&world, hull) else {
            panic!("expected a convex hull");
        };
        assert_eq!(vertex_set(geometry.vertices.iter().copied()), expected);
        assert!(geometry.triangle_count() >= 12);
        assert!(
            geometry
                .indices
                .iter()
                .flatten()
                .all(|i| (*i as usize) < geometry.vertices.len())
        );

        let ShapeDesc::RoundConvexHull {
            hull: inner,
            border_radius,
        } = shape_of(&world, round)
        else {
            panic!("expected a round convex hull");
        };
        assert_eq!(border_radius, 0.05);
        assert_eq!(vertex_set(inner.vertices.iter().copied()), expected);
    }

    #[test]
    fn heightfield_matches_parry_triangulation() {
        use crate::shape::{ShapeClass, classify};

        let heights = DMatrix::from_fn(3, 4, |i, j| (i * 4 + j) as f32 * 0.1);
        let scale = Vector::new(8.0, 2.0, 6.0);
        let field = HeightField::new(heights.clone(), scale);

        let mut world = World::new();
        let handle = world
            .colliders
            .insert(ColliderBuilder::heightfield(heights, scale).build());

        let shape = shape_of(&world, handle);
        let ShapeDesc::HeightField(desc) = &shape else {
            panic!("expected a height field");
        };
        assert_eq!((desc.rows, desc.cols), (3, 4));
        assert_eq!(desc.scale, Vec3::new(8.0, 2.0, 6.0));
        assert_eq!(shape, shape_desc(&field));

        let Ok(ShapeClass::Standalone(geometry)) = classify(collider_id(handle), shape) else {
            panic!("height field must be standalone");
        };
        let (parry_vertices, parry_indices) = field.to_trimesh();

        assert_eq!(geometry.vertices.len(), 12);
        assert_eq!(geometry.triangle_count(), parry_indices.len());
        assert_eq!(
            vertex_set(geometry.vertices.iter().copied()),
            vertex_set(parry_vertices.iter().map(|p| [p.x, p.y, p.z]))
        );
    }
}
