use bevy::prelude::*;
use leafwing_input_manager::prelude::*;

#[derive(Reflect, Actionlike, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputAction {
    LoadPyramid,
    LoadMixed,
    LoadTerrain,
    LoadMeshes,
    Fire,
    RemoveOldest,
    TogglePause,
    ToggleBrighten,
    ToggleSleepShading,
    ToggleCcdTint,
    ToggleSensorTint,
    Orbit,
}

pub(super) fn plugin(app: &mut App) {
    app.add_plugins(InputManagerPlugin::<InputAction>::default());

    app.register_type::<InputAction>();

    let mut input_map = InputMap::<InputAction>::default();
    input_map.insert(InputAction::LoadPyramid, KeyCode::Digit1);
    input_map.insert(InputAction::LoadMixed, KeyCode::Digit2);
    input_map.insert(InputAction::LoadTerrain, KeyCode::Digit3);
    input_map.insert(InputAction::LoadMeshes, KeyCode::Digit4);
    input_map.insert(InputAction::Fire, KeyCode::Space);
    input_map.insert(InputAction::RemoveOldest, KeyCode::Backspace);
    input_map.insert(InputAction::TogglePause, KeyCode::KeyP);
    input_map.insert(InputAction::ToggleBrighten, KeyCode::KeyB);
    input_map.insert(InputAction::ToggleSleepShading, KeyCode::KeyZ);
    input_map.insert(InputAction::ToggleCcdTint, KeyCode::KeyC);
    input_map.insert(InputAction::ToggleSensorTint, KeyCode::KeyV);
    input_map.insert(InputAction::Orbit, MouseButton::Right);
    app.insert_resource(input_map);
    app.insert_resource(ActionState::<InputAction>::default());
}
