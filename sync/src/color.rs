/*!
Display color assignment.

A collider's color has two parts:
- a [`ColorSeed`] drawn once, at insertion, from a seeded generator. It picks the palette
  entry and a small hue rotation, so neighbouring bodies do not look identical;
- state-dependent adjustments (enabled, sleeping, CCD, sensor) recomputed every frame.

Re-running a scenario with the same seed draws the same seeds in the same insertion order,
which gives an identical-looking world.
*/

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::constants::{
    CCD_TINT, CCD_TINT_AMOUNT, DYNAMIC_PALETTE, ENABLED_BRIGHTEN, FIXED_PALETTE, HUE_JITTER,
    KINEMATIC_PALETTE, SENSOR_TINT, SENSOR_TINT_AMOUNT, SLEEPING_DARKEN, UNKNOWN_COLOR,
};
use crate::physics::{BodyKind, BodyState};
use crate::settings::ColorSettings;
use crate::types::Rgb;

/// Per-collider random component of its color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorSeed {
    pub palette_index: u32,
    /// Hue rotation in turns, within `[-HUE_JITTER, HUE_JITTER]`.
    pub hue_offset: f32,
}

pub struct ColorAssigner {
    seed: u64,
    rng: StdRng,
    settings: ColorSettings,
}

impl ColorAssigner {
    pub fn new(seed: u64, settings: ColorSettings) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
            settings,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn set_settings(&mut self, settings: ColorSettings) {
        self.settings = settings;
    }

    /// Restarts the generator from its seed.
    pub fn reseed(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }

    /// Draws the random component for a newly inserted collider.
    pub fn draw(&mut self) -> ColorSeed {
        ColorSeed {
            palette_index: self.rng.random(),
            hue_offset: self.rng.random_range(-HUE_JITTER..=HUE_JITTER),
        }
    }

    /// Final display color for the collider's current state.
    pub fn color_for(&self, seed: ColorSeed, state: &BodyState) -> Rgb {
        let base = match state.kind {
            BodyKind::Fixed => pick(&FIXED_PALETTE, seed.palette_index),
            BodyKind::Kinematic => pick(&KINEMATIC_PALETTE, seed.palette_index),
            BodyKind::Dynamic => pick(&DYNAMIC_PALETTE, seed.palette_index),
            BodyKind::Unknown => UNKNOWN_COLOR,
        };

        let mut color = rotate_hue(base, seed.hue_offset);

        if self.settings.brighten_enabled && state.enabled {
            color = color.scale(ENABLED_BRIGHTEN);
        }
        if self.settings.darken_sleeping && state.sleeping {
            color = color.scale(SLEEPING_DARKEN);
        }
        if self.settings.tint_ccd && state.ccd_enabled {
            color = color.lerp(CCD_TINT, CCD_TINT_AMOUNT);
        }
        if self.settings.tint_sensors && state.sensor {
            color = color.lerp(SENSOR_TINT, SENSOR_TINT_AMOUNT);
        }

        color.clamped()
    }
}

#[inline]
fn pick(palette: &[Rgb], index: u32) -> Rgb {
    palette[index as usize % palette.len()]
}

/// Rotates the hue of `color` by `turns` (1.0 = full circle), keeping saturation and value.
pub fn rotate_hue(color: Rgb, turns: f32) -> Rgb {
    let max = color.r.max(color.g).max(color.b);
    let min = color.r.min(color.g).min(color.b);
    let chroma = max - min;

    if chroma <= f32::EPSILON {
        return color;
    }

    let hue = if max == color.r {
        ((color.g - color.b) / chroma).rem_euclid(6.0)
    } else if max == color.g {
        (color.b - color.r) / chroma + 2.0
    } else {
        (color.r - color.g) / chroma + 4.0
    };

    let hue = (hue + turns * 6.0).rem_euclid(6.0);
    let x = chroma * (1.0 - ((hue % 2.0) - 1.0).abs());

    let (r, g, b) = match hue as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };

    Rgb::new(r + min, g + min, b + min)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dynamic() -> BodyState {
        BodyState {
            kind: BodyKind::Dynamic,
            enabled: true,
            ..Default::default()
        }
    }

    fn close(a: Rgb, b: Rgb) -> bool {
        (a.r - b.r).abs() < 1.0e-4 && (a.g - b.g).abs() < 1.0e-4 && (a.b - b.b).abs() < 1.0e-4
    }

    #[test]
    fn same_seed_draws_same_sequence() {
        let mut a = ColorAssigner::new(7, ColorSettings::default());
        let mut b = ColorAssigner::new(7, ColorSettings::default());

        for _ in 0..32 {
            assert_eq!(a.draw(), b.draw());
        }
    }

    #[test]
    fn reseed_replays_the_sequence() {
        let mut assigner = ColorAssigner::new(99, ColorSettings::default());
        let first: Vec<_> = (0..8).map(|_| assigner.draw()).collect();

        assigner.reseed();
        let second: Vec<_> = (0..8).map(|_| assigner.draw()).collect();

        assert_eq!(first, second);
    }

    #[test]
    fn hue_offset_stays_within_jitter() {
        let mut assigner = ColorAssigner::new(1, ColorSettings::default());
        for _ in 0..256 {
            let seed = assigner.draw();
            assert!(seed.hue_offset.abs() <= HUE_JITTER);
        }
    }

    #[test]
    fn color_does_not_depend_on_call_count() {
        let mut assigner = ColorAssigner::new(3, ColorSettings::default());
        let seed = assigner.draw();

        let first = assigner.color_for(seed, &dynamic());
        for _ in 0..10 {
            assigner.draw();
        }
        assert_eq!(assigner.color_for(seed, &dynamic()), first);
    }

    #[test]
    fn unknown_kind_uses_fallback() {
        let assigner = ColorAssigner::new(0, ColorSettings {
            brighten_enabled: false,
            ..Default::default()
        });
        let seed = ColorSeed {
            palette_index: 0,
            hue_offset: 0.0,
        };
        let state = BodyState {
            kind: BodyKind::Unknown,
            enabled: true,
            ..Default::default()
        };
        assert!(close(assigner.color_for(seed, &state), UNKNOWN_COLOR));
    }

    #[test]
    fn sleeping_darkens_only_when_enabled_in_settings() {
        let seed = ColorSeed {
            palette_index: 2,
            hue_offset: 0.0,
        };
        let awake = dynamic();
        let asleep = BodyState {
            sleeping: true,
            ..dynamic()
        };

        let on = ColorAssigner::new(0, ColorSettings::default());
        let awake_color = on.color_for(seed, &awake);
        let asleep_color = on.color_for(seed, &asleep);
        let sum = |c: Rgb| c.r + c.g + c.b;
        assert!(sum(asleep_color) < sum(awake_color));

        let off = ColorAssigner::new(0, ColorSettings {
            darken_sleeping: false,
            ..Default::default()
        });
        assert_eq!(off.color_for(seed, &asleep), off.color_for(seed, &awake));
    }

    #[test]
    fn sensor_tint_pulls_toward_green() {
        let assigner = ColorAssigner::new(0, ColorSettings::default());
        let seed = ColorSeed {
            palette_index: 2,
            hue_offset: 0.0,
        };
        let plain = assigner.color_for(seed, &dynamic());
        let sensor = assigner.color_for(seed, &BodyState {
            sensor: true,
            ..dynamic()
        });
        assert!(sensor.g > plain.g);
    }

    #[test]
    fn ccd_tint_can_be_disabled() {
        let seed = ColorSeed {
            palette_index: 1,
            hue_offset: 0.0,
        };
        let ccd = BodyState {
            ccd_enabled: true,
            ..dynamic()
        };
        let off = ColorAssigner::new(0, ColorSettings {
            tint_ccd: false,
            ..Default::default()
        });
        assert_eq!(off.color_for(seed, &ccd), off.color_for(seed, &dynamic()));
    }

    #[test]
    fn hue_rotation_by_full_turn_is_identity() {
        let c = Rgb::from_hex(0x1f7a8c);
        assert!(close(rotate_hue(c, 1.0), c));
        assert!(close(rotate_hue(c, 0.0), c));
    }

    #[test]
    fn hue_rotation_by_a_third_cycles_primaries() {
        let red = Rgb::new(1.0, 0.0, 0.0);
        assert!(close(rotate_hue(red, 1.0 / 3.0), Rgb::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn grays_are_unaffected_by_hue() {
        let gray = Rgb::new(0.4, 0.4, 0.4);
        assert_eq!(rotate_hue(gray, 0.25), gray);
    }
}
