use std::fmt::Write;

use bevy::prelude::*;
use collider_sync::{Bucket, BucketMap, SyncStats};

use crate::ViewerSettings;
use crate::render::SyncState;

const HELP: &str =
    "1-4 scenario | space fire | backspace remove | P pause | B/Z/C/V colors | RMB orbit";

#[derive(Component)]
struct Hud;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, add_hud);
    app.add_systems(PostUpdate, update_hud);
}

fn add_hud(mut commands: Commands) {
    commands.spawn((
        Hud,
        Text::new(HELP),
        TextFont {
            font_size: 14.0,
            ..default()
        },
        Node {
            position_type: PositionType::Absolute,
            top: px(12.),
            left: px(12.),
            ..default()
        },
    ));
}

fn update_hud(
    mut text: Single<&mut Text, With<Hud>>,
    sync: Res<SyncState>,
    settings: Res<ViewerSettings>,
) {
    let stats = sync.stats();
    let capacities = &sync.settings().capacities;
    text.0 = describe(&stats, capacities, &settings);
}

fn describe(
    stats: &SyncStats,
    capacities: &BucketMap<usize>,
    settings: &ViewerSettings,
) -> String {
    let mut out = format!("scenario: {}  seed: {}", settings.scenario, settings.seed);
    if settings.paused {
        out.push_str("  [paused]");
    }
    out.push('\n');

    for bucket in Bucket::ALL {
        let _ = writeln!(
            out,
            "{:>9}: {}/{}",
            bucket.name(),
            stats.instanced[bucket],
            capacities[bucket]
        );
    }
    let _ = writeln!(
        out,
        "meshes: {}  tracked: {}  bodies: {}  skipped: {}  waiting: {}",
        stats.standalone, stats.tracked, stats.bodies, stats.skipped, stats.overflowed
    );
    if let Some(fault) = &settings.fault {
        let _ = writeln!(out, "error: {fault}");
    }
    out.push_str(HELP);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Scenario;

    #[test]
    fn describes_counts_and_fault() {
        let stats = SyncStats {
            instanced: BucketMap::from_fn(|bucket| bucket.index()),
            standalone: 2,
            tracked: 12,
            bodies: 9,
            skipped: 1,
            overflowed: 3,
        };
        let settings = ViewerSettings {
            scenario: Scenario::Mixed,
            seed: 7,
            paused: true,
            fault: Some("cone batch is full".to_string()),
        };

        let text = describe(&stats, &BucketMap::splat(64), &settings);

        assert!(text.contains("[paused]"));
        assert!(text.contains("ball: 1/64"));
        assert!(text.contains("skipped: 1"));
        assert!(text.contains("waiting: 3"));
        assert!(text.contains("error: cone batch is full"));
        assert!(text.ends_with(HELP));
    }
}
