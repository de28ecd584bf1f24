use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use collider_sync::rapier::collider_id;

use crate::FrameSet;
use crate::physics::PhysicsWorld;
use crate::render::SyncState;

const PICK_DISTANCE: f32 = 500.0;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Update, pick_hovered.in_set(FrameSet::Pick));
}

/// Highlights the collider under the cursor.
fn pick_hovered(
    window: Query<&Window, With<PrimaryWindow>>,
    camera: Query<(&Camera, &GlobalTransform)>,
    world: Res<PhysicsWorld>,
    mut sync: ResMut<SyncState>,
) {
    let hovered = window
        .single()
        .ok()
        .and_then(Window::cursor_position)
        .zip(camera.single().ok())
        .and_then(|(cursor, (camera, transform))| {
            camera.viewport_to_world(transform, cursor).ok()
        })
        .and_then(|ray| {
            world.cast_ray(
                ray.origin.to_array(),
                ray.direction.as_vec3().to_array(),
                PICK_DISTANCE,
            )
        })
        .map(|(handle, _)| collider_id(handle));

    if hovered != sync.highlighted() {
        sync.set_highlight(hovered);
    }
}
