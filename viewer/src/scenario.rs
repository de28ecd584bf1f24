//! Demo scenarios and the key bindings that edit the world.
//!
//! Every scenario is rebuilt from the viewer seed, so loading the same scenario twice gives the
//! same bodies in the same insertion order, and the synchronizer reseeds its palette on reset.

use std::collections::VecDeque;
use std::f32::consts::FRAC_PI_4;

use bevy::prelude::*;
use clap::ValueEnum;
use collider_sync::rapier::body_id;
use collider_sync::rapier::rapier3d::prelude::{
    ColliderBuilder, DMatrix, Point, RigidBodyBuilder, RigidBodyHandle, Vector,
};
use leafwing_input_manager::prelude::ActionState;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::input::InputAction;
use crate::physics::PhysicsWorld;
use crate::render::SyncState;
use crate::{FrameSet, ViewerSettings};

const PROJECTILE_RADIUS: f32 = 0.35;
const PROJECTILE_SPEED: f32 = 40.0;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Scenario {
    /// Stacked cubes.
    #[default]
    Pyramid,
    /// Every instanced shape, a kinematic platform, a sensor and a CCD projectile.
    Mixed,
    /// Height field with balls rolling on it.
    Terrain,
    /// Triangle mesh ground with convex hulls.
    Meshes,
}

impl Scenario {
    pub fn name(self) -> &'static str {
        match self {
            Scenario::Pyramid => "pyramid",
            Scenario::Mixed => "mixed",
            Scenario::Terrain => "terrain",
            Scenario::Meshes => "meshes",
        }
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Dynamic bodies spawned by the scenario or by the player, oldest first.
#[derive(Resource, Default, Deref, DerefMut)]
pub struct DynamicBodies(VecDeque<RigidBodyHandle>);

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<DynamicBodies>();
    app.add_systems(Startup, load_initial);
    app.add_systems(Update, handle_actions.in_set(FrameSet::Input));
}

fn load_initial(
    mut world: ResMut<PhysicsWorld>,
    mut sync: ResMut<SyncState>,
    mut bodies: ResMut<DynamicBodies>,
    mut settings: ResMut<ViewerSettings>,
) {
    let scenario = settings.scenario;
    load(scenario, &mut world, &mut sync, &mut bodies, &mut settings);
}

fn handle_actions(
    actions: Res<ActionState<InputAction>>,
    camera: Query<&Transform, With<Camera3d>>,
    mut world: ResMut<PhysicsWorld>,
    mut sync: ResMut<SyncState>,
    mut bodies: ResMut<DynamicBodies>,
    mut settings: ResMut<ViewerSettings>,
) {
    let requested = [
        (InputAction::LoadPyramid, Scenario::Pyramid),
        (InputAction::LoadMixed, Scenario::Mixed),
        (InputAction::LoadTerrain, Scenario::Terrain),
        (InputAction::LoadMeshes, Scenario::Meshes),
    ]
    .into_iter()
    .find(|(action, _)| actions.just_pressed(action))
    .map(|(_, scenario)| scenario);

    if let Some(scenario) = requested {
        load(scenario, &mut world, &mut sync, &mut bodies, &mut settings);
    }

    if actions.just_pressed(&InputAction::TogglePause) {
        settings.paused = !settings.paused;
        info!("simulation {}", if settings.paused { "paused" } else { "resumed" });
    }

    if actions.just_pressed(&InputAction::Fire) {
        if let Ok(eye) = camera.single() {
            let origin = eye.translation;
            let direction = eye.forward().as_vec3();
            let handle = fire(&mut world, origin.to_array(), direction.to_array());
            bodies.push_back(handle);

            for collider in world.colliders_of(handle) {
                let id = collider_sync::rapier::collider_id(collider);
                if let Err(err) = sync.add_collider(&world.view(), id) {
                    warn!("projectile not drawn: {err}");
                }
            }
        }
    }

    if actions.just_pressed(&InputAction::RemoveOldest) {
        match bodies.pop_front() {
            Some(handle) => {
                if let Err(err) = sync.remove_rigid_body(body_id(handle)) {
                    warn!("{err}");
                }
                world.despawn(handle);
            }
            None => info!("no dynamic body left to remove"),
        }
    }
}

/// Tears the world down and builds `scenario`.
fn load(
    scenario: Scenario,
    world: &mut PhysicsWorld,
    sync: &mut SyncState,
    bodies: &mut DynamicBodies,
    settings: &mut ViewerSettings,
) {
    sync.reset();
    world.clear();
    bodies.clear();

    let mut rng = StdRng::seed_from_u64(settings.seed);
    bodies.extend(build(scenario, world, &mut rng));

    settings.scenario = scenario;
    settings.fault = None;
    info!(
        "loaded {scenario} scenario: {} bodies, {} colliders",
        world.bodies.len(),
        world.colliders.len()
    );
}

/// Populates `world` and returns the dynamic bodies in creation order.
pub fn build(scenario: Scenario, world: &mut PhysicsWorld, rng: &mut StdRng) -> Vec<RigidBodyHandle> {
    match scenario {
        Scenario::Pyramid => pyramid(world),
        Scenario::Mixed => mixed(world, rng),
        Scenario::Terrain => terrain(world, rng),
        Scenario::Meshes => meshes(world, rng),
    }
}

fn ground(world: &mut PhysicsWorld) {
    world.spawn(
        RigidBodyBuilder::fixed()
            .translation(Vector::new(0.0, -0.5, 0.0))
            .build(),
        [ColliderBuilder::cuboid(20.0, 0.5, 20.0).build()],
    );
}

fn pyramid(world: &mut PhysicsWorld) -> Vec<RigidBodyHandle> {
    const LEVELS: usize = 10;
    const SPACING: f32 = 1.02;

    ground(world);

    let mut dynamic = Vec::new();
    for level in 0..LEVELS {
        let side = LEVELS - level;
        let offset = (side - 1) as f32 * SPACING * 0.5;
        for i in 0..side {
            for k in 0..side {
                let handle = world.spawn(
                    RigidBodyBuilder::dynamic()
                        .translation(Vector::new(
                            i as f32 * SPACING - offset,
                            0.5 + level as f32,
                            k as f32 * SPACING - offset,
                        ))
                        .build(),
                    [ColliderBuilder::cuboid(0.5, 0.5, 0.5).build()],
                );
                dynamic.push(handle);
            }
        }
    }
    dynamic
}

fn mixed(world: &mut PhysicsWorld, rng: &mut StdRng) -> Vec<RigidBodyHandle> {
    const SIDE: usize = 6;

    ground(world);

    // Rendered by nothing; shows up as a skipped collider.
    world.spawn(
        RigidBodyBuilder::fixed()
            .translation(Vector::new(0.0, -5.0, 0.0))
            .build(),
        [ColliderBuilder::halfspace(Vector::y_axis()).build()],
    );

    world.spawn(
        RigidBodyBuilder::kinematic_velocity_based()
            .translation(Vector::new(0.0, 0.4, 0.0))
            .angvel(Vector::new(0.0, 0.8, 0.0))
            .build(),
        [ColliderBuilder::cuboid(6.0, 0.2, 0.5).build()],
    );

    world.spawn(
        RigidBodyBuilder::fixed()
            .translation(Vector::new(8.0, 1.5, 8.0))
            .build(),
        [ColliderBuilder::ball(1.5).sensor(true).build()],
    );

    let mut dynamic = Vec::new();
    for i in 0..SIDE {
        for k in 0..SIDE {
            let size = rng.random_range(0.3..0.6);
            let collider = match (i * SIDE + k) % 8 {
                0 => ColliderBuilder::cuboid(size, size * 0.8, size * 1.2),
                1 => ColliderBuilder::ball(size),
                2 => ColliderBuilder::cylinder(size, size * 0.7),
                3 => ColliderBuilder::cone(size, size),
                4 => ColliderBuilder::capsule_y(size, size * 0.6),
                5 => ColliderBuilder::capsule_x(size, size * 0.5),
                6 => ColliderBuilder::round_cuboid(size, size, size, 0.05),
                _ => ColliderBuilder::round_cylinder(size, size, 0.05),
            };
            let handle = world.spawn(
                RigidBodyBuilder::dynamic()
                    .translation(Vector::new(
                        (i as f32 - SIDE as f32 * 0.5) * 1.6,
                        3.0 + rng.random_range(0.0..4.0),
                        (k as f32 - SIDE as f32 * 0.5) * 1.6,
                    ))
                    .rotation(Vector::new(0.0, 0.0, rng.random_range(-FRAC_PI_4..FRAC_PI_4)))
                    .build(),
                [collider.build()],
            );
            dynamic.push(handle);
        }
    }

    // A body with two colliders, removed together.
    dynamic.push(world.spawn(
        RigidBodyBuilder::dynamic()
            .translation(Vector::new(-8.0, 2.0, -8.0))
            .build(),
        [
            ColliderBuilder::cuboid(0.6, 0.2, 0.6).build(),
            ColliderBuilder::ball(0.4)
                .translation(Vector::new(0.0, 0.6, 0.0))
                .build(),
        ],
    ));

    dynamic.push(fire(world, [-15.0, 2.0, 0.0], [1.0, 0.05, 0.0]));
    dynamic
}

fn terrain(world: &mut PhysicsWorld, rng: &mut StdRng) -> Vec<RigidBodyHandle> {
    const SAMPLES: usize = 33;
    const SIDE: usize = 8;

    let heights = DMatrix::from_fn(SAMPLES, SAMPLES, |i, j| {
        (i as f32 * 0.35).sin() * (j as f32 * 0.25).cos()
    });
    world.spawn(
        RigidBodyBuilder::fixed().build(),
        [ColliderBuilder::heightfield(heights, Vector::new(40.0, 1.5, 40.0)).build()],
    );

    let mut dynamic = Vec::new();
    for i in 0..SIDE {
        for k in 0..SIDE {
            let handle = world.spawn(
                RigidBodyBuilder::dynamic()
                    .translation(Vector::new(
                        (i as f32 - SIDE as f32 * 0.5) * 3.0,
                        6.0 + rng.random_range(0.0..3.0),
                        (k as f32 - SIDE as f32 * 0.5) * 3.0,
                    ))
                    .build(),
                [ColliderBuilder::ball(rng.random_range(0.3..0.8)).build()],
            );
            dynamic.push(handle);
        }
    }
    dynamic
}

fn meshes(world: &mut PhysicsWorld, rng: &mut StdRng) -> Vec<RigidBodyHandle> {
    const HULLS: usize = 24;

    // Shallow bowl as a raw triangle mesh.
    let (vertices, indices) = bowl(12, 16.0, 2.5);
    match ColliderBuilder::trimesh(vertices, indices) {
        Ok(ground) => {
            world.spawn(RigidBodyBuilder::fixed().build(), [ground.build()]);
        }
        Err(err) => error!("bowl mesh rejected: {err:?}"),
    }

    let mut dynamic = Vec::new();
    for n in 0..HULLS {
        let points: Vec<_> = (0..12)
            .map(|_| {
                Point::new(
                    rng.random_range(-0.6..0.6),
                    rng.random_range(-0.6..0.6),
                    rng.random_range(-0.6..0.6),
                )
            })
            .collect();
        let collider = if n % 3 == 0 {
            ColliderBuilder::round_convex_hull(&points, 0.05)
        } else {
            ColliderBuilder::convex_hull(&points)
        };
        let Some(collider) = collider else {
            warn!("degenerate hull skipped");
            continue;
        };

        let angle = n as f32 / HULLS as f32 * std::f32::consts::TAU;
        let handle = world.spawn(
            RigidBodyBuilder::dynamic()
                .translation(Vector::new(
                    angle.cos() * 6.0,
                    4.0 + (n % 4) as f32 * 1.5,
                    angle.sin() * 6.0,
                ))
                .build(),
            [collider.build()],
        );
        dynamic.push(handle);
    }
    dynamic
}

/// Square grid curving up towards its rim.
fn bowl(cells: u32, size: f32, depth: f32) -> (Vec<Point<f32>>, Vec<[u32; 3]>) {
    let side = cells + 1;
    let half = size * 0.5;

    let mut vertices = Vec::with_capacity((side * side) as usize);
    for i in 0..side {
        for j in 0..side {
            let x = j as f32 / cells as f32 * size - half;
            let z = i as f32 / cells as f32 * size - half;
            let r = (x * x + z * z).sqrt() / half;
            vertices.push(Point::new(x, depth * r * r, z));
        }
    }

    let mut indices = Vec::with_capacity((cells * cells * 2) as usize);
    for i in 0..cells {
        for j in 0..cells {
            let a = i * side + j;
            let (b, c) = (a + 1, a + side);
            indices.push([a, c, b]);
            indices.push([b, c, c + 1]);
        }
    }
    (vertices, indices)
}

/// Launches a CCD ball from `origin` along `direction`.
fn fire(world: &mut PhysicsWorld, origin: [f32; 3], direction: [f32; 3]) -> RigidBodyHandle {
    let velocity = Vector::new(direction[0], direction[1], direction[2]).normalize() * PROJECTILE_SPEED;
    world.spawn(
        RigidBodyBuilder::dynamic()
            .translation(Vector::new(origin[0], origin[1], origin[2]))
            .linvel(velocity)
            .ccd_enabled(true)
            .build(),
        [ColliderBuilder::ball(PROJECTILE_RADIUS).density(4.0).build()],
    )
}
