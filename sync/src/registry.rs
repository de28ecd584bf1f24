/*!
Collider registry.

Single owner of the per-collider [`Descriptor`]s and of the body → colliders map used for
cascade removal. The registry does not touch the batch pool itself; the synchronizer keeps
the two in step and [`ColliderRegistry::check_consistency`] verifies they agree.
*/

use std::collections::HashMap;

use crate::batch::BatchPool;
use crate::color::ColorSeed;
use crate::handle::{BodyId, ColliderId};
use crate::types::{Bucket, BucketMap, Iso, Rgb, Vec3};

/// Where a collider is drawn.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Placement {
    Instanced { bucket: Bucket, slot: usize },
    Standalone,
}

impl Placement {
    pub fn bucket(&self) -> Option<Bucket> {
        match self {
            Placement::Instanced { bucket, .. } => Some(*bucket),
            Placement::Standalone => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Descriptor {
    pub id: ColliderId,
    pub body: Option<BodyId>,
    pub placement: Placement,
    /// Scale of the unit geometry, fixed at insertion.
    pub scale: Vec3,
    /// Shape-local offset composed with the collider pose.
    pub local: Iso,
    pub color_seed: ColorSeed,
    /// Last computed display color.
    pub color: Rgb,
}

#[derive(Default)]
pub struct ColliderRegistry {
    descriptors: HashMap<ColliderId, Descriptor>,
    bodies: HashMap<BodyId, Vec<ColliderId>>,
}

impl ColliderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `descriptor` and appends it to its body's collider list.
    ///
    /// Returns the previous descriptor for the same handle, which indicates the caller missed
    /// a removal.
    pub fn insert(&mut self, descriptor: Descriptor) -> Option<Descriptor> {
        let id = descriptor.id;
        let body = descriptor.body;

        let previous = self.descriptors.insert(id, descriptor);
        if let Some(previous) = &previous {
            self.unlink(id, previous.body);
        }
        if let Some(body) = body {
            self.bodies.entry(body).or_default().push(id);
        }
        previous
    }

    pub fn remove(&mut self, id: ColliderId) -> Option<Descriptor> {
        let descriptor = self.descriptors.remove(&id)?;
        self.unlink(id, descriptor.body);
        Some(descriptor)
    }

    fn unlink(&mut self, id: ColliderId, body: Option<BodyId>) {
        let Some(body) = body else {
            return;
        };
        if let Some(list) = self.bodies.get_mut(&body) {
            list.retain(|c| *c != id);
            if list.is_empty() {
                self.bodies.remove(&body);
            }
        }
    }

    pub fn get(&self, id: ColliderId) -> Option<&Descriptor> {
        self.descriptors.get(&id)
    }

    pub fn get_mut(&mut self, id: ColliderId) -> Option<&mut Descriptor> {
        self.descriptors.get_mut(&id)
    }

    pub fn contains(&self, id: ColliderId) -> bool {
        self.descriptors.contains_key(&id)
    }

    /// Colliders attached to `body`, in insertion order.
    pub fn colliders_of(&self, body: BodyId) -> &[ColliderId] {
        self.bodies.get(&body).map(Vec::as_slice).unwrap_or_default()
    }

    /// Repoints an instanced descriptor after its instance moved to `slot`.
    pub fn retarget(&mut self, id: ColliderId, slot: usize) {
        match self.descriptors.get_mut(&id) {
            Some(Descriptor {
                placement: Placement::Instanced { slot: current, .. },
                ..
            }) => *current = slot,
            _ => log::error!("relocated instance owner {id} has no instanced descriptor"),
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = ColliderId> + '_ {
        self.descriptors.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Descriptor> {
        self.descriptors.values()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn clear(&mut self) {
        self.descriptors.clear();
        self.bodies.clear();
    }

    /// Checks that every instanced descriptor owns a live slot and that every live slot is
    /// owned by exactly one descriptor. Logs the first violation.
    pub fn check_consistency(&self, pool: &BatchPool) -> bool {
        let mut per_bucket = BucketMap::splat(0usize);

        for descriptor in self.descriptors.values() {
            let Placement::Instanced { bucket, slot } = descriptor.placement else {
                continue;
            };
            let batch = pool.batch(bucket);
            if slot >= batch.count() {
                log::error!(
                    "collider {} points at slot {slot} past the {bucket} tail ({})",
                    descriptor.id,
                    batch.count()
                );
                return false;
            }
            if batch.owner(slot) != Some(descriptor.id) {
                log::error!(
                    "collider {} points at {bucket} slot {slot} owned by {:?}",
                    descriptor.id,
                    batch.owner(slot)
                );
                return false;
            }
            per_bucket[bucket] += 1;
        }

        for batch in pool.batches() {
            if per_bucket[batch.bucket()] != batch.count() {
                log::error!(
                    "{} batch has {} live slots but {} descriptors",
                    batch.bucket(),
                    batch.count(),
                    per_bucket[batch.bucket()]
                );
                return false;
            }
        }

        true
    }
}
