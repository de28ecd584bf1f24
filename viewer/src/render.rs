//! Presents the synchronizer's batches through Bevy.
//!
//! Every bucket shares one unit mesh. Each live slot is drawn by a pooled entity carrying that
//! mesh; entities past the batch `count` are hidden, never despawned. Colors are quantized and
//! each quantized color owns one material, so slots of the same bucket and color share both
//! handles and Bevy batches them into a single draw.
//! Standalone meshes get one entity each, created and destroyed from [`MeshEvent`]s.

use std::collections::HashMap;

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use collider_sync::constants::{
    HIGHLIGHT_COLOR, UNIT_BALL_RADIUS, UNIT_CAPSULE_HALF_LENGTH, UNIT_CAPSULE_RADIUS,
    UNIT_CONE_HEIGHT, UNIT_CONE_RADIUS, UNIT_CUBOID_SIZE, UNIT_CYLINDER_HEIGHT,
    UNIT_CYLINDER_RADIUS,
};
use collider_sync::{
    Bucket, BucketMap, ColliderId, ColorSettings, InstanceTransform, MeshEvent, MeshGeometry, Rgb,
    Synchronizer,
};
use leafwing_input_manager::prelude::ActionState;

use crate::input::InputAction;
use crate::physics::PhysicsWorld;
use crate::{FrameSet, ViewerSettings};

#[derive(Resource, Deref, DerefMut)]
pub struct SyncState(pub Synchronizer);

#[derive(Resource)]
struct UnitMeshes(BucketMap<Handle<Mesh>>);

/// Quantization steps per color channel.
const COLOR_LEVELS: f32 = 16.0;

/// Quantized color a material is shared by.
type MaterialKey = [u8; 3];

fn material_key(color: Rgb) -> MaterialKey {
    color
        .clamped()
        .to_array()
        .map(|c| (c * (COLOR_LEVELS - 1.0)).round() as u8)
}

/// One material per quantized color.
#[derive(Resource, Default)]
struct MaterialCache(HashMap<MaterialKey, Handle<StandardMaterial>>);

impl MaterialCache {
    fn get(
        &mut self,
        materials: &mut Assets<StandardMaterial>,
        key: MaterialKey,
    ) -> Handle<StandardMaterial> {
        self.0
            .entry(key)
            .or_insert_with(|| {
                let [r, g, b] = key.map(|c| f32::from(c) / (COLOR_LEVELS - 1.0));
                materials.add(material_for(Rgb::new(r, g, b)))
            })
            .clone()
    }
}

struct Drawn {
    entity: Entity,
    key: MaterialKey,
}

#[derive(Resource, Default)]
struct SlotEntities(BucketMap<Vec<Drawn>>);

#[derive(Resource, Default)]
struct HighlightEntities(BucketMap<Option<Entity>>);

#[derive(Resource, Default)]
struct StandaloneEntities(HashMap<ColliderId, Drawn>);

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<SlotEntities>();
    app.init_resource::<HighlightEntities>();
    app.init_resource::<StandaloneEntities>();
    app.init_resource::<MaterialCache>();
    app.add_systems(Startup, setup);
    app.add_systems(Update, toggle_colors.in_set(FrameSet::Input));
    app.add_systems(Update, sync_colliders.in_set(FrameSet::Sync));
    app.add_systems(
        Update,
        (upload_batches, upload_meshes).in_set(FrameSet::Upload),
    );
    app.add_systems(Update, upload_highlight.in_set(FrameSet::Highlight));
}

/// Shared unit geometry each bucket's scale is calibrated against.
pub fn unit_mesh(bucket: Bucket) -> Mesh {
    match bucket {
        Bucket::Cuboid => Cuboid::from_length(UNIT_CUBOID_SIZE).into(),
        Bucket::Ball => Sphere::new(UNIT_BALL_RADIUS).mesh().uv(32, 18),
        Bucket::Cylinder => Cylinder::new(UNIT_CYLINDER_RADIUS, UNIT_CYLINDER_HEIGHT).into(),
        Bucket::Cone => Cone::new(UNIT_CONE_RADIUS, UNIT_CONE_HEIGHT).into(),
        Bucket::Capsule => {
            Capsule3d::new(UNIT_CAPSULE_RADIUS, UNIT_CAPSULE_HALF_LENGTH * 2.0).into()
        }
    }
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut highlights: ResMut<HighlightEntities>,
) {
    let units = BucketMap::from_fn(|bucket| meshes.add(unit_mesh(bucket)));

    let highlight_material = materials.add(StandardMaterial {
        base_color: to_color(HIGHLIGHT_COLOR).with_alpha(0.45),
        emissive: to_color(HIGHLIGHT_COLOR).to_linear() * 0.6,
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    });
    for (bucket, slot) in highlights.0.iter_mut() {
        let entity = commands
            .spawn((
                Name::new(format!("{bucket} highlight")),
                Mesh3d(units[bucket].clone()),
                MeshMaterial3d(highlight_material.clone()),
                Transform::default(),
                Visibility::Hidden,
            ))
            .id();
        *slot = Some(entity);
    }

    commands.insert_resource(UnitMeshes(units));

    commands.spawn((
        DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(10.0, 20.0, 6.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

fn toggle_colors(actions: Res<ActionState<InputAction>>, mut sync: ResMut<SyncState>) {
    let current = sync.settings().colors;
    let next = toggled(current, |action| actions.just_pressed(&action));
    if next != current {
        info!("color settings: {next:?}");
        sync.set_color_settings(next);
    }
}

/// Flips each color adjustment whose toggle action fired.
fn toggled(mut colors: ColorSettings, fired: impl Fn(InputAction) -> bool) -> ColorSettings {
    colors.brighten_enabled ^= fired(InputAction::ToggleBrighten);
    colors.darken_sleeping ^= fired(InputAction::ToggleSleepShading);
    colors.tint_ccd ^= fired(InputAction::ToggleCcdTint);
    colors.tint_sensors ^= fired(InputAction::ToggleSensorTint);
    colors
}

fn sync_colliders(
    mut sync: ResMut<SyncState>,
    world: Res<PhysicsWorld>,
    mut settings: ResMut<ViewerSettings>,
) {
    if let Err(err) = sync.sync_frame(&world.view()) {
        // Only fatal errors come back from a frame; stop before the views diverge further.
        let fault = err.to_string();
        if settings.fault.as_ref() != Some(&fault) {
            error!("{fault}");
            settings.fault = Some(fault);
        }
        settings.paused = true;
    }
}

fn upload_batches(
    mut commands: Commands,
    mut sync: ResMut<SyncState>,
    units: Res<UnitMeshes>,
    mut slots: ResMut<SlotEntities>,
    mut cache: ResMut<MaterialCache>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut drawn: Query<(
        &mut Transform,
        &mut Visibility,
        &mut MeshMaterial3d<StandardMaterial>,
    )>,
) {
    for bucket in Bucket::ALL {
        let batch = sync.pool_mut().batch_mut(bucket);
        if !batch.take_dirty() {
            continue;
        }

        let pool = &mut slots.0[bucket];
        for (slot, (transform, color)) in batch.instances().enumerate() {
            let transform = to_transform(transform);
            let key = material_key(*color);

            if slot == pool.len() {
                let entity = commands
                    .spawn((
                        Mesh3d(units.0[bucket].clone()),
                        MeshMaterial3d(cache.get(&mut materials, key)),
                        transform,
                        Visibility::Visible,
                    ))
                    .id();
                pool.push(Drawn { entity, key });
                continue;
            }

            let entry = &mut pool[slot];
            if let Ok((mut current, mut visibility, mut material)) = drawn.get_mut(entry.entity) {
                *current = transform;
                *visibility = Visibility::Visible;
                if entry.key != key {
                    material.0 = cache.get(&mut materials, key);
                    entry.key = key;
                }
            }
        }

        for entry in pool.iter().skip(batch.count()) {
            if let Ok((_, mut visibility, _)) = drawn.get_mut(entry.entity) {
                *visibility = Visibility::Hidden;
            }
        }
    }
}

fn upload_meshes(
    mut commands: Commands,
    mut sync: ResMut<SyncState>,
    mut standalone: ResMut<StandaloneEntities>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut cache: ResMut<MaterialCache>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut drawn: Query<(&mut Transform, &mut MeshMaterial3d<StandardMaterial>)>,
) {
    let events: Vec<_> = sync.meshes_mut().drain_events().collect();
    for event in events {
        match event {
            MeshEvent::Added(id) => {
                let Some(entry) = sync.meshes().get(id) else {
                    continue;
                };
                let key = material_key(entry.color);
                let entity = commands
                    .spawn((
                        Name::new(format!("collider {id}")),
                        Mesh3d(meshes.add(build_mesh(&entry.geometry))),
                        MeshMaterial3d(cache.get(&mut materials, key)),
                        to_transform(&entry.transform),
                    ))
                    .id();
                standalone.0.insert(id, Drawn { entity, key });
            }
            MeshEvent::Removed(id) => {
                if let Some(entry) = standalone.0.remove(&id) {
                    commands.entity(entry.entity).despawn();
                }
            }
        }
    }

    let highlighted = sync.highlighted();
    for (id, mesh) in sync.meshes().iter() {
        let Some(entry) = standalone.0.get_mut(&id) else {
            continue;
        };
        let Ok((mut transform, mut material)) = drawn.get_mut(entry.entity) else {
            continue;
        };
        *transform = to_transform(&mesh.transform);

        let color = if highlighted == Some(id) {
            HIGHLIGHT_COLOR
        } else {
            mesh.color
        };
        let key = material_key(color);
        if entry.key != key {
            material.0 = cache.get(&mut materials, key);
            entry.key = key;
        }
    }
}

fn upload_highlight(
    mut sync: ResMut<SyncState>,
    highlights: Res<HighlightEntities>,
    mut drawn: Query<(&mut Transform, &mut Visibility)>,
) {
    for bucket in Bucket::ALL {
        let highlight = sync.pool_mut().highlight_mut(bucket);
        if !highlight.take_dirty() {
            continue;
        }
        let Some(entity) = highlights.0[bucket] else {
            continue;
        };
        let Ok((mut transform, mut visibility)) = drawn.get_mut(entity) else {
            continue;
        };

        match highlight.instance() {
            Some((instance, _)) => {
                *transform = to_transform(instance);
                *visibility = Visibility::Visible;
            }
            None => *visibility = Visibility::Hidden,
        }
    }
}

fn material_for(color: Rgb) -> StandardMaterial {
    StandardMaterial {
        base_color: to_color(color),
        perceptual_roughness: 0.8,
        metallic: 0.0,
        ..default()
    }
}

fn to_color(color: Rgb) -> Color {
    Color::linear_rgb(color.r, color.g, color.b)
}

fn to_transform(instance: &InstanceTransform) -> Transform {
    let t = &instance.translation;
    let q = &instance.rotation;
    let s = &instance.scale;
    Transform {
        translation: Vec3::new(t.x, t.y, t.z),
        rotation: Quat::from_xyzw(q.i, q.j, q.k, q.w),
        scale: Vec3::new(s.x, s.y, s.z),
    }
}

/// Flat-shaded mesh for a standalone collider.
fn build_mesh(geometry: &MeshGeometry) -> Mesh {
    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, geometry.vertices.clone());
    mesh.insert_indices(Indices::U32(
        geometry.indices.iter().flatten().copied().collect(),
    ));
    mesh.duplicate_vertices();
    mesh.compute_flat_normals();
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use collider_sync::shape::{ShapeClass, classify};
    use collider_sync::{Iso, ShapeDesc, Vec3 as SyncVec3};

    fn extent(mesh: &Mesh) -> Vec3 {
        let Some(positions) = mesh
            .attribute(Mesh::ATTRIBUTE_POSITION)
            .and_then(|values| values.as_float3())
        else {
            panic!("mesh has no float3 positions");
        };
        let (min, max) = positions.iter().fold(
            (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
            |(min, max), p| (min.min(Vec3::from(*p)), max.max(Vec3::from(*p))),
        );
        max - min
    }

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1.0e-3
    }

    fn scale_of(shape: ShapeDesc) -> Vec3 {
        match classify(ColliderId::from_raw_parts(0, 0), shape) {
            Ok(ShapeClass::Instanced { scale, .. }) => Vec3::new(scale.x, scale.y, scale.z),
            other => panic!("expected an instanced shape, got {other:?}"),
        }
    }

    #[test]
    fn scaled_unit_meshes_match_collider_size() {
        let cases = [
            (
                Bucket::Cuboid,
                ShapeDesc::Cuboid {
                    half_extents: SyncVec3::new(1.0, 2.0, 0.5),
                },
                Vec3::new(2.0, 4.0, 1.0),
            ),
            (
                Bucket::Ball,
                ShapeDesc::Ball { radius: 1.5 },
                Vec3::splat(3.0),
            ),
            (
                Bucket::Cylinder,
                ShapeDesc::Cylinder {
                    radius: 0.25,
                    half_height: 2.0,
                },
                Vec3::new(0.5, 4.0, 0.5),
            ),
            (
                Bucket::Cone,
                ShapeDesc::Cone {
                    radius: 1.0,
                    half_height: 0.5,
                },
                Vec3::new(2.0, 1.0, 2.0),
            ),
            (
                Bucket::Capsule,
                ShapeDesc::Capsule {
                    radius: 0.5,
                    half_height: 1.5,
                    local: Iso::identity(),
                },
                Vec3::new(1.0, 4.0, 1.0),
            ),
        ];

        for (bucket, shape, expected) in cases {
            let size = extent(&unit_mesh(bucket)) * scale_of(shape);
            assert!(close(size, expected), "{bucket}: {size} != {expected}");
        }
    }

    #[test]
    fn standalone_mesh_is_flat_shaded() {
        let geometry = MeshGeometry {
            vertices: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0],
                [1.0, 0.0, 1.0],
            ],
            indices: vec![[0, 2, 1], [1, 2, 3]],
        };
        let mesh = build_mesh(&geometry);

        assert_eq!(mesh.count_vertices(), 6);
        assert!(mesh.attribute(Mesh::ATTRIBUTE_NORMAL).is_some());
    }

    #[test]
    fn close_colors_share_a_material() {
        let mut materials = Assets::<StandardMaterial>::default();
        let mut cache = MaterialCache::default();

        let base = Rgb::new(0.8, 0.4, 0.2);
        let jittered = Rgb::new(0.81, 0.39, 0.2);
        let other = Rgb::new(0.2, 0.4, 0.8);
        assert_eq!(material_key(base), material_key(jittered));
        assert_ne!(material_key(base), material_key(other));

        let a = cache.get(&mut materials, material_key(base));
        let b = cache.get(&mut materials, material_key(jittered));
        let c = cache.get(&mut materials, material_key(other));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(materials.len(), 2);
    }

    #[test]
    fn toggles_flip_only_their_adjustment() {
        let colors = toggled(ColorSettings::default(), |action| {
            matches!(
                action,
                InputAction::ToggleSleepShading | InputAction::ToggleSensorTint
            )
        });
        assert!(colors.brighten_enabled);
        assert!(!colors.darken_sleeping);
        assert!(colors.tint_ccd);
        assert!(!colors.tint_sensors);

        assert_eq!(toggled(colors, |_| false), colors);
    }

    #[test]
    fn material_key_clamps_out_of_range_colors() {
        assert_eq!(material_key(Rgb::new(1.4, -0.2, 0.5)), [15, 0, 8]);
    }

    #[test]
    fn instance_transform_converts_componentwise() {
        let instance = InstanceTransform {
            translation: SyncVec3::new(1.0, 2.0, 3.0),
            scale: SyncVec3::new(0.5, 1.0, 2.0),
            ..Default::default()
        };
        let transform = to_transform(&instance);
        assert_eq!(transform.translation, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(transform.scale, Vec3::new(0.5, 1.0, 2.0));
        assert_eq!(transform.rotation, Quat::IDENTITY);
    }
}
