/*!
Instanced batch pool.

One fixed-capacity batch per [`Bucket`]. A batch stores, for every live slot, the instance
transform, its color and the collider that owns it. Slots `[0, count)` are live and packed:
releasing a slot moves the tail instance into the hole (swap-with-tail) so `count - 1` is
always the authoritative tail.

Slot indices are therefore not stable across removals. [`BatchPool::release_slot`] reports
the collider that moved so the registry can repoint its descriptor.

Each bucket also owns a single-instance highlight batch, drawn on top of the regular one and
never used for normal allocation.
*/

use crate::error::{Result, SyncError};
use crate::handle::ColliderId;
use crate::types::{Bucket, BucketMap, InstanceTransform, Rgb};

/// Collider whose instance moved into a freed slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Relocation {
    pub owner: ColliderId,
    pub from: usize,
    pub to: usize,
}

#[derive(Debug)]
pub struct InstanceBatch {
    bucket: Bucket,
    capacity: usize,
    transforms: Vec<InstanceTransform>,
    colors: Vec<Rgb>,
    owners: Vec<ColliderId>,
    dirty: bool,
}

impl InstanceBatch {
    pub fn new(bucket: Bucket, capacity: usize) -> Self {
        Self {
            bucket,
            capacity,
            transforms: Vec::new(),
            colors: Vec::new(),
            owners: Vec::new(),
            dirty: false,
        }
    }

    pub fn bucket(&self) -> Bucket {
        self.bucket
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live leading slots.
    pub fn count(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.count() >= self.capacity
    }

    pub fn transforms(&self) -> &[InstanceTransform] {
        &self.transforms
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// Transform and color of every live slot, in slot order.
    pub fn instances(&self) -> impl Iterator<Item = (&InstanceTransform, &Rgb)> {
        self.transforms.iter().zip(&self.colors)
    }

    pub fn owner(&self, slot: usize) -> Option<ColliderId> {
        self.owners.get(slot).copied()
    }

    pub fn owners(&self) -> &[ColliderId] {
        &self.owners
    }

    /// Whether anything changed since the renderer last uploaded this batch.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the dirty flag and clears it.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Takes the tail slot for `owner`.
    pub fn acquire(&mut self, owner: ColliderId) -> Result<usize> {
        if self.is_full() {
            return Err(SyncError::CapacityExhausted {
                bucket: self.bucket,
                capacity: self.capacity,
            });
        }

        let slot = self.count();
        self.transforms.push(InstanceTransform::default());
        self.colors.push(Rgb::WHITE);
        self.owners.push(owner);
        self.dirty = true;
        Ok(slot)
    }

    /// Frees `slot`, moving the tail instance into it.
    ///
    /// Returns the relocated tail, if the freed slot was not already the tail.
    pub fn release(&mut self, slot: usize) -> Option<Relocation> {
        if slot >= self.count() {
            log::error!(
                "release of slot {slot} in {} batch with {} live instances",
                self.bucket,
                self.count()
            );
            return None;
        }

        let tail = self.count() - 1;
        self.transforms.swap_remove(slot);
        self.colors.swap_remove(slot);
        self.owners.swap_remove(slot);
        self.dirty = true;

        (slot != tail).then(|| Relocation {
            owner: self.owners[slot],
            from: tail,
            to: slot,
        })
    }

    pub fn write_transform(&mut self, slot: usize, transform: InstanceTransform) {
        if let Some(current) = self.transforms.get_mut(slot) {
            if *current != transform {
                *current = transform;
                self.dirty = true;
            }
        }
    }

    pub fn write_color(&mut self, slot: usize, color: Rgb) {
        if let Some(current) = self.colors.get_mut(slot) {
            if *current != color {
                *current = color;
                self.dirty = true;
            }
        }
    }

    pub fn clear(&mut self) {
        self.transforms.clear();
        self.colors.clear();
        self.owners.clear();
        self.dirty = true;
    }
}

/// Single-instance batch used to draw the highlighted collider. `count` is 0 or 1.
#[derive(Debug, Default)]
pub struct HighlightBatch {
    instance: Option<(InstanceTransform, Rgb)>,
    dirty: bool,
}

impl HighlightBatch {
    pub fn count(&self) -> usize {
        usize::from(self.instance.is_some())
    }

    pub fn instance(&self) -> Option<&(InstanceTransform, Rgb)> {
        self.instance.as_ref()
    }

    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn set(&mut self, instance: Option<(InstanceTransform, Rgb)>) {
        if self.instance != instance {
            self.instance = instance;
            self.dirty = true;
        }
    }
}

pub struct BatchPool {
    batches: BucketMap<InstanceBatch>,
    highlights: BucketMap<HighlightBatch>,
}

impl BatchPool {
    pub fn new(capacities: &BucketMap<usize>) -> Self {
        Self {
            batches: BucketMap::from_fn(|bucket| InstanceBatch::new(bucket, capacities[bucket])),
            highlights: BucketMap::from_fn(|_| HighlightBatch::default()),
        }
    }

    pub fn batch(&self, bucket: Bucket) -> &InstanceBatch {
        &self.batches[bucket]
    }

    pub fn batch_mut(&mut self, bucket: Bucket) -> &mut InstanceBatch {
        &mut self.batches[bucket]
    }

    pub fn batches(&self) -> impl Iterator<Item = &InstanceBatch> {
        self.batches.values()
    }

    pub fn acquire_slot(&mut self, bucket: Bucket, owner: ColliderId) -> Result<usize> {
        self.batches[bucket].acquire(owner)
    }

    pub fn release_slot(&mut self, bucket: Bucket, slot: usize) -> Option<Relocation> {
        self.batches[bucket].release(slot)
    }

    pub fn write_transform(&mut self, bucket: Bucket, slot: usize, transform: InstanceTransform) {
        self.batches[bucket].write_transform(slot, transform);
    }

    pub fn write_color(&mut self, bucket: Bucket, slot: usize, color: Rgb) {
        self.batches[bucket].write_color(slot, color);
    }

    pub fn highlight(&self, bucket: Bucket) -> &HighlightBatch {
        &self.highlights[bucket]
    }

    pub fn highlight_mut(&mut self, bucket: Bucket) -> &mut HighlightBatch {
        &mut self.highlights[bucket]
    }

    /// Shows a single highlighted instance in `bucket` and hides every other highlight.
    pub fn set_highlight(&mut self, bucket: Bucket, transform: InstanceTransform, color: Rgb) {
        for (b, highlight) in self.highlights.iter_mut() {
            highlight.set((b == bucket).then_some((transform, color)));
        }
    }

    pub fn clear_highlight(&mut self) {
        for (_, highlight) in self.highlights.iter_mut() {
            highlight.set(None);
        }
    }

    /// Live instances across all buckets.
    pub fn total_instances(&self) -> usize {
        self.batches.values().map(InstanceBatch::count).sum()
    }

    /// Empties every batch and hides the highlight.
    pub fn clear(&mut self) {
        for (_, batch) in self.batches.iter_mut() {
            batch.clear();
        }
        self.clear_highlight();
    }
}
