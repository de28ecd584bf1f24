/*!
Sizing, calibration and palette constants.

Notes
- Distances are in meters.
- The unit geometry dimensions are a contract with the renderer: it must build its shared
  meshes with exactly these sizes, otherwise the per-instance scales derived by the shape
  classifier render at the wrong size.
*/

use crate::types::Rgb;

/// Default number of instances per bucket.
/// Must cover the peak collider count of the largest scenario; overflowing is a hard error.
pub const DEFAULT_BUCKET_CAPACITY: usize = 4096;

/// Seed used for color draws when none is configured.
pub const DEFAULT_SEED: u64 = 0x5EED_C010;

/// Edge length of the shared unit cube.
pub const UNIT_CUBOID_SIZE: f32 = 1.0;

/// Radius of the shared unit sphere.
pub const UNIT_BALL_RADIUS: f32 = 0.5;

/// Radius and full height of the shared unit cylinder (Y-aligned).
pub const UNIT_CYLINDER_RADIUS: f32 = 0.5;
pub const UNIT_CYLINDER_HEIGHT: f32 = 1.0;

/// Base radius and full height of the shared unit cone (apex at +Y).
pub const UNIT_CONE_RADIUS: f32 = 0.5;
pub const UNIT_CONE_HEIGHT: f32 = 1.0;

/// Radius and cylindrical half-length of the shared unit capsule (Y-aligned).
/// Total height of the unit capsule is `2 * (half_length + radius)`.
pub const UNIT_CAPSULE_RADIUS: f32 = 0.5;
pub const UNIT_CAPSULE_HALF_LENGTH: f32 = 0.5;

/// Palette for fixed bodies.
pub const FIXED_PALETTE: [Rgb; 2] = [Rgb::from_hex(0xf3d9b1), Rgb::from_hex(0xd8c3a5)];

/// Palette for kinematic bodies.
pub const KINEMATIC_PALETTE: [Rgb; 2] = [Rgb::from_hex(0x8e9aaf), Rgb::from_hex(0x6c7a96)];

/// Wider palette for dynamic bodies.
pub const DYNAMIC_PALETTE: [Rgb; 6] = [
    Rgb::from_hex(0x98c1d9),
    Rgb::from_hex(0x1f7a8c),
    Rgb::from_hex(0xee6c4d),
    Rgb::from_hex(0x90be6d),
    Rgb::from_hex(0xf9c74f),
    Rgb::from_hex(0x577590),
];

/// Fallback for colliders without a parent body.
pub const UNKNOWN_COLOR: Rgb = Rgb::from_hex(0xcc33cc);

/// Maximum random hue rotation applied per collider, in turns (1.0 = full circle).
pub const HUE_JITTER: f32 = 0.04;

/// Multiplier applied to enabled colliders; disabled ones keep the raw base.
pub const ENABLED_BRIGHTEN: f32 = 1.15;

/// Multiplier applied to sleeping bodies.
pub const SLEEPING_DARKEN: f32 = 0.55;

/// Tint blended into CCD-enabled bodies.
pub const CCD_TINT: Rgb = Rgb::from_hex(0xff2244);
pub const CCD_TINT_AMOUNT: f32 = 0.35;

/// Tint blended into sensors.
pub const SENSOR_TINT: Rgb = Rgb::from_hex(0x33ff66);
pub const SENSOR_TINT_AMOUNT: f32 = 0.5;

/// Color used for the highlight instance.
pub const HIGHLIGHT_COLOR: Rgb = Rgb::from_hex(0xffff00);

/// Scale applied on top of the highlighted collider so it encloses the regular instance.
pub const HIGHLIGHT_INFLATE: f32 = 1.02;
