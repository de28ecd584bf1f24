/*!
Per-frame synchronizer.

[`Synchronizer`] owns the registry, the batch pool, the standalone mesh table and the color
generator. It follows the physics world; it never creates or destroys physics objects.

Frame contract:
1. scenario code applies its insertions/removals ([`Synchronizer::add_collider`],
   [`Synchronizer::remove_collider`], [`Synchronizer::remove_rigid_body`]);
2. the physics world steps;
3. [`Synchronizer::sync_frame`] inserts colliders seen for the first time and writes the
   current transform and color of every tracked collider;
4. the renderer uploads dirty batches and drains mesh events.

Removal is event-driven. `sync_frame` does not diff the live set against the registry, so a
collider destroyed without a removal call keeps its slot until
[`Synchronizer::remove_missing`] or [`Synchronizer::reset`] runs.

Colliders that are live but not drawn are remembered with their body, so removing the body
forgets them too:
- skipped: the shape cannot be rendered. Never retried.
- overflowed: the bucket was full. Retried every frame, logged once.
*/

use std::collections::HashMap;

use crate::batch::BatchPool;
use crate::color::ColorAssigner;
use crate::constants::{HIGHLIGHT_COLOR, HIGHLIGHT_INFLATE};
use crate::error::{Result, SyncError};
use crate::handle::{BodyId, ColliderId};
use crate::mesh_table::MeshTable;
use crate::physics::{ColliderView, PhysicsView};
use crate::registry::{ColliderRegistry, Descriptor, Placement};
use crate::settings::{ColorSettings, SyncSettings};
use crate::shape::{ShapeClass, classify};
use crate::types::{BucketMap, InstanceTransform, Iso, Rgb, Vec3};

/// Snapshot of what the synchronizer currently tracks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Live instances per bucket.
    pub instanced: BucketMap<usize>,
    pub standalone: usize,
    /// Descriptors in the registry.
    pub tracked: usize,
    /// Bodies with at least one tracked collider.
    pub bodies: usize,
    /// Colliders skipped for having an unrenderable shape.
    pub skipped: usize,
    /// Colliders waiting for a free slot.
    pub overflowed: usize,
}

impl SyncStats {
    pub fn total_instances(&self) -> usize {
        self.instanced.values().sum()
    }
}

pub struct Synchronizer {
    settings: SyncSettings,
    registry: ColliderRegistry,
    pool: BatchPool,
    meshes: MeshTable,
    colors: ColorAssigner,
    skipped: HashMap<ColliderId, Option<BodyId>>,
    overflowed: HashMap<ColliderId, Option<BodyId>>,
    highlighted: Option<ColliderId>,
}

impl Default for Synchronizer {
    fn default() -> Self {
        Self::new(SyncSettings::default())
    }
}

impl Synchronizer {
    pub fn new(settings: SyncSettings) -> Self {
        Self {
            registry: ColliderRegistry::new(),
            pool: BatchPool::new(&settings.capacities),
            meshes: MeshTable::new(),
            colors: ColorAssigner::new(settings.seed, settings.colors),
            skipped: HashMap::new(),
            overflowed: HashMap::new(),
            highlighted: None,
            settings,
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Changes the color toggles. Takes effect on the next [`Self::sync_frame`].
    pub fn set_color_settings(&mut self, colors: ColorSettings) {
        self.settings.colors = colors;
        self.colors.set_settings(colors);
    }

    pub fn pool(&self) -> &BatchPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut BatchPool {
        &mut self.pool
    }

    pub fn meshes(&self) -> &MeshTable {
        &self.meshes
    }

    pub fn meshes_mut(&mut self) -> &mut MeshTable {
        &mut self.meshes
    }

    pub fn registry(&self) -> &ColliderRegistry {
        &self.registry
    }

    pub fn descriptor(&self, id: ColliderId) -> Option<&Descriptor> {
        self.registry.get(id)
    }

    pub fn highlighted(&self) -> Option<ColliderId> {
        self.highlighted
    }

    /// Starts tracking the live collider `id`.
    ///
    /// Already tracked colliders are left untouched and their current placement returned.
    pub fn add_collider<P: PhysicsView>(&mut self, physics: &P, id: ColliderId) -> Result<Placement> {
        if let Some(descriptor) = self.registry.get(id) {
            return Ok(descriptor.placement);
        }
        let collider = physics
            .collider(id)
            .ok_or(SyncError::MissingCollider(id))?;
        self.insert(&collider)
    }

    fn insert<C: ColliderView>(&mut self, collider: &C) -> Result<Placement> {
        let id = collider.id();

        let class = match classify(id, collider.shape()) {
            Ok(class) => class,
            Err(err) => {
                if self.skipped.insert(id, collider.body()).is_none() {
                    log::warn!("{err}; not rendering it");
                }
                return Err(err);
            }
        };

        let (placement, scale, local) = match class {
            ShapeClass::Instanced {
                bucket,
                scale,
                local,
            } => {
                let slot = match self.pool.acquire_slot(bucket, id) {
                    Ok(slot) => slot,
                    Err(err) => {
                        if self.overflowed.insert(id, collider.body()).is_none() {
                            log::error!("cannot insert collider {id}: {err}");
                        }
                        return Err(err);
                    }
                };
                if self.overflowed.remove(&id).is_some() {
                    log::info!("collider {id} got a {bucket} slot after waiting");
                }
                (Placement::Instanced { bucket, slot }, scale, local)
            }
            ShapeClass::Standalone(geometry) => {
                self.meshes.insert(id, geometry);
                (Placement::Standalone, Vec3::repeat(1.0), Iso::identity())
            }
        };

        let color_seed = self.colors.draw();
        let color = self.colors.color_for(color_seed, &collider.state());
        let transform = InstanceTransform::new(&(collider.pose() * local), scale);
        self.write(id, placement, transform, color);

        let previous = self.registry.insert(Descriptor {
            id,
            body: collider.body(),
            placement,
            scale,
            local,
            color_seed,
            color,
        });
        if previous.is_some() {
            log::error!("collider {id} was inserted twice");
        }

        log::debug!("tracking collider {id} as {placement:?}");
        Ok(placement)
    }

    fn write(
        &mut self,
        id: ColliderId,
        placement: Placement,
        transform: InstanceTransform,
        color: Rgb,
    ) {
        match placement {
            Placement::Instanced { bucket, slot } => {
                self.pool.write_transform(bucket, slot, transform);
                self.pool.write_color(bucket, slot, color);
            }
            Placement::Standalone => {
                if let Some(mesh) = self.meshes.get_mut(id) {
                    mesh.transform = transform;
                    mesh.color = color;
                }
            }
        }
    }

    /// Stops tracking `id` and frees its slot or mesh.
    ///
    /// An instanced removal moves the bucket's tail instance into the freed slot and repoints
    /// the moved collider's descriptor.
    pub fn remove_collider(&mut self, id: ColliderId) -> Result<()> {
        let Some(descriptor) = self.registry.remove(id) else {
            if self.skipped.remove(&id).is_some() || self.overflowed.remove(&id).is_some() {
                return Ok(());
            }
            log::warn!("removal requested for untracked collider {id}");
            return Err(SyncError::UntrackedCollider(id));
        };

        match descriptor.placement {
            Placement::Instanced { bucket, slot } => {
                if let Some(moved) = self.pool.release_slot(bucket, slot) {
                    self.registry.retarget(moved.owner, moved.to);
                }
            }
            Placement::Standalone => {
                self.meshes.remove(id);
            }
        }

        if self.highlighted == Some(id) {
            self.highlighted = None;
            self.pool.clear_highlight();
        }

        debug_assert!(self.registry.check_consistency(&self.pool));
        log::debug!("released collider {id}");
        Ok(())
    }

    /// Removes every collider attached to `body`.
    ///
    /// Returns how many drawn colliders were released. Undrawn ones are forgotten without being
    /// counted; the body is unknown only if it has neither.
    pub fn remove_rigid_body(&mut self, body: BodyId) -> Result<usize> {
        let colliders = self.registry.colliders_of(body).to_vec();
        let forgotten = self.forget_undrawn(|_, owner| owner == Some(body));
        if colliders.is_empty() && forgotten == 0 {
            log::warn!("removal requested for rigid body {body} with no tracked colliders");
            return Err(SyncError::UntrackedBody(body));
        }

        for id in &colliders {
            self.remove_collider(*id)?;
        }
        Ok(colliders.len())
    }

    /// Drops skipped and overflowed colliders matching `pred`. Returns how many were dropped.
    fn forget_undrawn(&mut self, mut pred: impl FnMut(ColliderId, Option<BodyId>) -> bool) -> usize {
        let before = self.skipped.len() + self.overflowed.len();
        self.skipped.retain(|id, body| !pred(*id, *body));
        self.overflowed.retain(|id, body| !pred(*id, *body));
        before - self.skipped.len() - self.overflowed.len()
    }

    /// Mirrors the live colliders into the batches and meshes.
    ///
    /// Colliders seen for the first time are inserted. Every insertion failure is contained to
    /// its collider; the first fatal one ([`SyncError::is_fatal`]) is returned after the whole
    /// frame has been written.
    pub fn sync_frame<P: PhysicsView>(&mut self, physics: &P) -> Result<()> {
        let mut fatal = None;

        for collider in physics.colliders() {
            let id = collider.id();
            if self.skipped.contains_key(&id) {
                continue;
            }

            if !self.registry.contains(id) {
                if let Err(err) = self.insert(&collider) {
                    if err.is_fatal() && fatal.is_none() {
                        fatal = Some(err);
                    }
                }
                continue;
            }

            let state = collider.state();
            let pose = collider.pose();
            let Some(descriptor) = self.registry.get_mut(id) else {
                continue;
            };
            descriptor.color = self.colors.color_for(descriptor.color_seed, &state);
            let transform = InstanceTransform::new(&(pose * descriptor.local), descriptor.scale);

            let (placement, color) = (descriptor.placement, descriptor.color);
            self.write(id, placement, transform, color);
        }

        self.refresh_highlight();

        match fatal {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Highlights `id`, or clears the highlight with `None`.
    ///
    /// Only instanced colliders get a highlight instance; a standalone collider is remembered
    /// in [`Self::highlighted`] for the renderer to tint. Returns `false` if `id` is not tracked.
    pub fn set_highlight(&mut self, id: Option<ColliderId>) -> bool {
        let tracked = id.is_none_or(|id| self.registry.contains(id));
        self.highlighted = if tracked { id } else { None };
        self.refresh_highlight();
        tracked
    }

    fn refresh_highlight(&mut self) {
        let placement = self
            .highlighted
            .and_then(|id| self.registry.get(id))
            .map(|descriptor| descriptor.placement);

        let Some(Placement::Instanced { bucket, slot }) = placement else {
            self.pool.clear_highlight();
            return;
        };

        match self.pool.batch(bucket).transforms().get(slot).copied() {
            Some(transform) => {
                let inflated = InstanceTransform {
                    scale: transform.scale * HIGHLIGHT_INFLATE,
                    ..transform
                };
                self.pool.set_highlight(bucket, inflated, HIGHLIGHT_COLOR);
            }
            None => self.pool.clear_highlight(),
        }
    }

    /// Removes descriptors whose collider no longer exists in `physics`.
    ///
    /// Returns how many colliders were released.
    pub fn remove_missing<P: PhysicsView>(&mut self, physics: &P) -> usize {
        let missing: Vec<_> = self
            .registry
            .ids()
            .filter(|id| !physics.is_live(*id))
            .collect();

        let mut removed = 0;
        for id in missing {
            if self.remove_collider(id).is_ok() {
                removed += 1;
            }
        }
        self.forget_undrawn(|id, _| !physics.is_live(id));

        if removed > 0 {
            log::info!("released {removed} colliders missing from the physics world");
        }
        removed
    }

    /// Forgets every collider and restarts the color generator from its seed.
    pub fn reset(&mut self) {
        self.pool.clear();
        self.meshes.clear();
        self.registry.clear();
        self.skipped.clear();
        self.overflowed.clear();
        self.highlighted = None;
        self.colors.reseed();
        log::info!("synchronizer reset (seed {:#x})", self.colors.seed());
    }

    pub fn stats(&self) -> SyncStats {
        SyncStats {
            instanced: BucketMap::from_fn(|bucket| self.pool.batch(bucket).count()),
            standalone: self.meshes.len(),
            tracked: self.registry.len(),
            bodies: self.registry.body_count(),
            skipped: self.skipped.len(),
            overflowed: self.overflowed.len(),
        }
    }
}
