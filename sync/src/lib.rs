pub mod batch;
pub mod color;
pub mod constants;
pub mod error;
pub mod handle;
pub mod mesh_table;
pub mod physics;
pub mod rapier;
pub mod registry;
pub mod settings;
pub mod shape;
pub mod synchronizer;
pub mod types;

pub use batch::{BatchPool, HighlightBatch, InstanceBatch, Relocation};
pub use color::{ColorAssigner, ColorSeed};
pub use error::{Result, SyncError};
pub use handle::{BodyId, ColliderId};
pub use mesh_table::{MeshEvent, MeshTable, StandaloneMesh};
pub use physics::{
    BodyKind, BodyState, ColliderView, HeightFieldDesc, MeshGeometry, PhysicsView, ShapeDesc,
};
pub use rapier::RapierView;
pub use registry::{ColliderRegistry, Descriptor, Placement};
pub use settings::{ColorSettings, SyncSettings};
pub use shape::{ShapeClass, classify};
pub use synchronizer::{SyncStats, Synchronizer};
pub use types::{Bucket, BucketMap, InstanceTransform, Iso, Quat, Rgb, Vec3};
