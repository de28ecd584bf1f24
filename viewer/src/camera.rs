use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;
use leafwing_input_manager::prelude::*;

use crate::FrameSet;
use crate::input::InputAction;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, add_camera);
    app.add_systems(
        Update,
        (orbit, zoom, follow_orbit).chain().in_set(FrameSet::Input),
    );
}

const ORBIT_SENSITIVITY: f32 = 0.005;
const ZOOM_STEP: f32 = 0.1;
const MIN_DISTANCE: f32 = 4.0;
const MAX_DISTANCE: f32 = 120.0;
const MAX_PITCH: f32 = 1.4;
const CAMERA_DECAY_RATE: f32 = 24.0;

/// Orbit parameters around a fixed target.
#[derive(Component, Debug, Clone)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::new(0.0, 2.0, 0.0),
            distance: 30.0,
            yaw: std::f32::consts::FRAC_PI_4,
            pitch: std::f32::consts::FRAC_PI_6,
        }
    }
}

impl OrbitCamera {
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position()).looking_at(self.target, Vec3::Y)
    }
}

fn add_camera(mut commands: Commands) {
    let orbit = OrbitCamera::default();
    commands.spawn((
        bevy::core_pipeline::tonemapping::Tonemapping::AcesFitted,
        Camera3d::default(),
        orbit.transform(),
        orbit,
    ));
}

fn orbit(
    action_state: Res<ActionState<InputAction>>,
    mut motion: MessageReader<MouseMotion>,
    mut cameras: Query<&mut OrbitCamera>,
) {
    if !action_state.pressed(&InputAction::Orbit) {
        motion.clear();
        return;
    }

    let delta: Vec2 = motion.read().map(|event| event.delta).sum();
    if delta.length_squared() < 0.001 {
        return;
    }

    for mut orbit in &mut cameras {
        orbit.yaw -= delta.x * ORBIT_SENSITIVITY;
        orbit.pitch = (orbit.pitch + delta.y * ORBIT_SENSITIVITY).clamp(-MAX_PITCH, MAX_PITCH);
    }
}

fn zoom(mut wheel: MessageReader<MouseWheel>, mut cameras: Query<&mut OrbitCamera>) {
    let scroll: f32 = wheel.read().map(|event| event.y).sum();
    if scroll.abs() < 0.01 {
        return;
    }

    for mut orbit in &mut cameras {
        orbit.distance = (orbit.distance * (1.0 - scroll * ZOOM_STEP)).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }
}

fn follow_orbit(mut cameras: Query<(&OrbitCamera, &mut Transform)>, time: Res<Time>) {
    for (orbit, mut transform) in &mut cameras {
        transform
            .translation
            .smooth_nudge(&orbit.position(), CAMERA_DECAY_RATE, time.delta_secs());
        transform.look_at(orbit.target, Vec3::Y);
    }
}
