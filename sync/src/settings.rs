/*!
Runtime configuration for the synchronizer.

Defaults come from [`crate::constants`]. Harnesses override them per scenario, e.g. from
command-line arguments.
*/

use crate::constants::{DEFAULT_BUCKET_CAPACITY, DEFAULT_SEED};
use crate::types::BucketMap;

/// Independent toggles for the state-dependent color adjustments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorSettings {
    /// Brighten colliders whose body and collider are both enabled.
    pub brighten_enabled: bool,
    /// Darken colliders attached to sleeping bodies.
    pub darken_sleeping: bool,
    /// Tint colliders attached to CCD-enabled bodies.
    pub tint_ccd: bool,
    /// Tint sensor colliders.
    pub tint_sensors: bool,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            brighten_enabled: true,
            darken_sleeping: true,
            tint_ccd: true,
            tint_sensors: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncSettings {
    /// Maximum instance count per bucket.
    pub capacities: BucketMap<usize>,
    /// Seed for the color generator. The same seed reproduces the same palette.
    pub seed: u64,
    pub colors: ColorSettings,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            capacities: BucketMap::splat(DEFAULT_BUCKET_CAPACITY),
            seed: DEFAULT_SEED,
            colors: ColorSettings::default(),
        }
    }
}

impl SyncSettings {
    /// Sets the same capacity for every bucket.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacities = BucketMap::splat(capacity);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_colors(mut self, colors: ColorSettings) -> Self {
        self.colors = colors;
        self
    }
}
