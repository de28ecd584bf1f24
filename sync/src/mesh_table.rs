//! Standalone meshes: colliders whose geometry cannot be expressed as a scaled unit shape.
//!
//! Each entry owns its own geometry. The renderer builds a GPU mesh when it sees
//! [`MeshEvent::Added`] and drops it on [`MeshEvent::Removed`]; transforms and colors are
//! read from the table every frame.

use std::collections::HashMap;

use crate::handle::ColliderId;
use crate::physics::MeshGeometry;
use crate::types::{InstanceTransform, Rgb};

#[derive(Clone, Debug, PartialEq)]
pub struct StandaloneMesh {
    pub geometry: MeshGeometry,
    pub transform: InstanceTransform,
    pub color: Rgb,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MeshEvent {
    Added(ColliderId),
    Removed(ColliderId),
}

#[derive(Default)]
pub struct MeshTable {
    meshes: HashMap<ColliderId, StandaloneMesh>,
    events: Vec<MeshEvent>,
}

impl MeshTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: ColliderId, geometry: MeshGeometry) {
        let mesh = StandaloneMesh {
            geometry,
            transform: InstanceTransform::default(),
            color: Rgb::WHITE,
        };
        if self.meshes.insert(id, mesh).is_some() {
            log::warn!("standalone mesh for collider {id} replaced");
            self.events.push(MeshEvent::Removed(id));
        }
        self.events.push(MeshEvent::Added(id));
    }

    pub fn remove(&mut self, id: ColliderId) -> Option<StandaloneMesh> {
        let removed = self.meshes.remove(&id)?;
        self.events.push(MeshEvent::Removed(id));
        Some(removed)
    }

    pub fn get(&self, id: ColliderId) -> Option<&StandaloneMesh> {
        self.meshes.get(&id)
    }

    pub fn get_mut(&mut self, id: ColliderId) -> Option<&mut StandaloneMesh> {
        self.meshes.get_mut(&id)
    }

    pub fn contains(&self, id: ColliderId) -> bool {
        self.meshes.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ColliderId, &StandaloneMesh)> {
        self.meshes.iter().map(|(id, mesh)| (*id, mesh))
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Events since the last drain, in the order they happened.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, MeshEvent> {
        self.events.drain(..)
    }

    /// Removes every mesh, emitting a removal event for each.
    pub fn clear(&mut self) {
        self.events
            .extend(self.meshes.drain().map(|(id, _)| MeshEvent::Removed(id)));
    }
}
