//! Rapier world owned by the viewer.
//!
//! The synchronizer only reads this world through [`RapierView`]; bodies are created and
//! destroyed by scenario code.

use bevy::prelude::*;
use collider_sync::RapierView;
use collider_sync::rapier::rapier3d::prelude::{
    BroadPhaseBvh, CCDSolver, Collider, ColliderHandle, ColliderSet, ImpulseJointSet,
    IntegrationParameters, IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline, Point,
    QueryFilter, Ray, Real, RigidBody, RigidBodyHandle, RigidBodySet, Vector,
};

use crate::{FrameSet, ViewerSettings};

/// Fixed simulation step, independent of the render frame time.
pub const PHYSICS_DT: f32 = 1.0 / 60.0;
const GRAVITY: f32 = -9.81;

#[derive(Resource)]
pub struct PhysicsWorld {
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    islands: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    pipeline: PhysicsPipeline,
    ccd_solver: CCDSolver,
    integration_parameters: IntegrationParameters,
    gravity: Vector<Real>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            pipeline: PhysicsPipeline::new(),
            ccd_solver: CCDSolver::new(),
            integration_parameters: IntegrationParameters {
                dt: PHYSICS_DT,
                ..Default::default()
            },
            gravity: Vector::new(0.0, GRAVITY, 0.0),
        }
    }

    pub fn view(&self) -> RapierView<'_> {
        RapierView::new(&self.bodies, &self.colliders)
    }

    pub fn step(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }

    /// Inserts `body` with `colliders` attached to it.
    pub fn spawn(
        &mut self,
        body: RigidBody,
        colliders: impl IntoIterator<Item = Collider>,
    ) -> RigidBodyHandle {
        let handle = self.bodies.insert(body);
        for collider in colliders {
            self.colliders
                .insert_with_parent(collider, handle, &mut self.bodies);
        }
        handle
    }

    /// Removes `handle` and every collider attached to it.
    pub fn despawn(&mut self, handle: RigidBodyHandle) -> bool {
        self.bodies
            .remove(
                handle,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    /// Colliders attached to `handle`.
    pub fn colliders_of(&self, handle: RigidBodyHandle) -> Vec<ColliderHandle> {
        self.bodies
            .get(handle)
            .map(|body| body.colliders().to_vec())
            .unwrap_or_default()
    }

    /// Closest collider hit by the ray, with the hit distance.
    pub fn cast_ray(
        &self,
        origin: [f32; 3],
        direction: [f32; 3],
        max_distance: f32,
    ) -> Option<(ColliderHandle, f32)> {
        let ray = Ray::new(
            Point::new(origin[0], origin[1], origin[2]),
            Vector::new(direction[0], direction[1], direction[2]),
        );
        let query = self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            QueryFilter::default(),
        );
        query.cast_ray(&ray, max_distance, true)
    }

    /// Drops every body, collider and cached contact.
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<PhysicsWorld>();
    app.add_systems(Update, step_physics.in_set(FrameSet::Physics));
}

fn step_physics(mut world: ResMut<PhysicsWorld>, settings: Res<ViewerSettings>) {
    if settings.paused {
        return;
    }
    world.step();
}

#[cfg(test)]
mod tests {
    use super::*;
    use collider_sync::rapier::rapier3d::prelude::{ColliderBuilder, RigidBodyBuilder};

    #[test]
    fn dynamic_body_falls() {
        let mut world = PhysicsWorld::new();
        let handle = world.spawn(
            RigidBodyBuilder::dynamic()
                .translation(Vector::new(0.0, 10.0, 0.0))
                .build(),
            [ColliderBuilder::ball(0.5).build()],
        );

        for _ in 0..30 {
            world.step();
        }

        let y = world.bodies.get(handle).map(|b| b.translation().y);
        assert!(y.is_some_and(|y| y < 10.0));
    }

    #[test]
    fn despawn_removes_attached_colliders() {
        let mut world = PhysicsWorld::new();
        let handle = world.spawn(
            RigidBodyBuilder::dynamic().build(),
            [
                ColliderBuilder::ball(0.5).build(),
                ColliderBuilder::cuboid(0.5, 0.5, 0.5).build(),
            ],
        );
        assert_eq!(world.colliders_of(handle).len(), 2);

        assert!(world.despawn(handle));
        assert_eq!(world.colliders.len(), 0);
        assert!(!world.despawn(handle));
    }

    #[test]
    fn ray_hits_the_nearest_collider() {
        let mut world = PhysicsWorld::new();
        let near = world.spawn(
            RigidBodyBuilder::fixed()
                .translation(Vector::new(0.0, 0.0, -5.0))
                .build(),
            [ColliderBuilder::ball(1.0).build()],
        );
        world.spawn(
            RigidBodyBuilder::fixed()
                .translation(Vector::new(0.0, 0.0, -10.0))
                .build(),
            [ColliderBuilder::ball(1.0).build()],
        );
        world.step();

        let hit = world.cast_ray([0.0, 0.0, 0.0], [0.0, 0.0, -1.0], 100.0);
        let expected = world.colliders_of(near)[0];
        assert_eq!(hit.map(|(handle, _)| handle), Some(expected));
        assert!(hit.is_some_and(|(_, toi)| (toi - 4.0).abs() < 1.0e-3));
    }
}
