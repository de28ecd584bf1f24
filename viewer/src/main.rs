// Support configuring Bevy lints within code.
#![cfg_attr(bevy_lint, feature(register_tool), register_tool(bevy))]

mod camera;
mod highlight;
mod hud;
mod input;
mod physics;
mod render;
mod scenario;

use bevy::log::LogPlugin;
use bevy::prelude::*;
use clap::Parser;
use collider_sync::constants::{DEFAULT_BUCKET_CAPACITY, DEFAULT_SEED};
use collider_sync::{ColorSettings, SyncSettings, Synchronizer};

use crate::render::SyncState;
use crate::scenario::Scenario;

/// Interactive viewer mirroring a Rapier world into instanced draw batches.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
struct Args {
    /// Seed for the color palette and scenario jitter.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Maximum instance count per shape bucket.
    #[arg(long, default_value_t = DEFAULT_BUCKET_CAPACITY)]
    capacity: usize,

    /// Scenario loaded at startup.
    #[arg(long, value_enum, default_value_t = Scenario::Pyramid)]
    scenario: Scenario,

    /// Start with the simulation paused.
    #[arg(long)]
    paused: bool,

    /// Draw every collider in its base color, without state shading or tints.
    #[arg(long)]
    plain_colors: bool,
}

/// Viewer-wide state, changed by key bindings.
#[derive(Resource, Debug, Clone)]
pub struct ViewerSettings {
    pub scenario: Scenario,
    pub seed: u64,
    pub paused: bool,
    /// Last fatal synchronizer error, shown until the next scenario load.
    pub fault: Option<String>,
}

/// Per-frame ordering: scenario edits land before the physics step, and the synchronizer
/// runs after it so a collider spawned this frame is drawn this frame. Picking runs before the
/// uploads so a hover change shows the same frame.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameSet {
    Input,
    Physics,
    Sync,
    Pick,
    Upload,
    Highlight,
}

fn main() -> AppExit {
    let args = Args::parse();
    App::new().add_plugins(AppPlugin { args }).run()
}

struct AppPlugin {
    args: Args,
}

impl Plugin for AppPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Window {
                        title: "Collider Sync Viewer".to_string(),
                        fit_canvas_to_parent: true,
                        ..default()
                    }
                    .into(),
                    ..default()
                })
                .set(LogPlugin {
                    filter: "wgpu=error,naga=warn,collider_sync=debug".to_string(),
                    ..default()
                }),
        );

        let mut settings = SyncSettings::default()
            .with_capacity(self.args.capacity)
            .with_seed(self.args.seed);
        if self.args.plain_colors {
            settings = settings.with_colors(ColorSettings {
                brighten_enabled: false,
                darken_sleeping: false,
                tint_ccd: false,
                tint_sensors: false,
            });
        }
        app.insert_resource(SyncState(Synchronizer::new(settings)));
        app.insert_resource(ViewerSettings {
            scenario: self.args.scenario,
            seed: self.args.seed,
            paused: self.args.paused,
            fault: None,
        });

        configure_frame_sets(app);

        app.add_plugins((
            input::plugin,
            physics::plugin,
            scenario::plugin,
            render::plugin,
            highlight::plugin,
            camera::plugin,
            hud::plugin,
        ));
    }
}

fn configure_frame_sets(app: &mut App) {
    app.configure_sets(
        Update,
        (
            FrameSet::Input,
            FrameSet::Physics,
            FrameSet::Sync,
            FrameSet::Pick,
            FrameSet::Upload,
            FrameSet::Highlight,
        )
            .chain(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Resource, Default)]
    struct Ran(Vec<FrameSet>);

    #[test]
    fn frame_sets_run_in_order() {
        let order = [
            FrameSet::Input,
            FrameSet::Physics,
            FrameSet::Sync,
            FrameSet::Pick,
            FrameSet::Upload,
            FrameSet::Highlight,
        ];

        let mut app = App::new();
        app.init_resource::<Ran>();
        configure_frame_sets(&mut app);
        for set in order.into_iter().rev() {
            app.add_systems(
                Update,
                (move |mut ran: ResMut<Ran>| ran.0.push(set)).in_set(set),
            );
        }
        app.update();

        assert_eq!(app.world().resource::<Ran>().0, order);
    }
}
