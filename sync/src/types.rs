/*!
Math aliases and the small value types exchanged between the registry, the batch pool and
the renderer.

This module intentionally contains no algorithms.
*/

use nalgebra as na;
use std::ops::{Index, IndexMut};

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// Linear RGB color, each channel in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Decodes a `0xRRGGBB` literal.
    #[inline]
    pub const fn from_hex(hex: u32) -> Self {
        Self::new(
            ((hex >> 16) & 0xff) as f32 / 255.0,
            ((hex >> 8) & 0xff) as f32 / 255.0,
            (hex & 0xff) as f32 / 255.0,
        )
    }

    #[inline]
    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.r * factor, self.g * factor, self.b * factor)
    }

    /// Linear interpolation toward `other`; `t = 0` keeps `self`.
    #[inline]
    pub fn lerp(self, other: Rgb, t: f32) -> Self {
        Self::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }

    #[inline]
    pub fn clamped(self) -> Self {
        Self::new(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
        )
    }

    #[inline]
    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// World transform of one rendered instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InstanceTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl InstanceTransform {
    #[inline]
    pub fn new(pose: &Iso, scale: Vec3) -> Self {
        Self {
            translation: pose.translation.vector,
            rotation: pose.rotation,
            scale,
        }
    }
}

impl Default for InstanceTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::repeat(1.0),
        }
    }
}

/// Instanceable shape category. Each bucket owns exactly one batch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Bucket {
    Cuboid,
    Ball,
    Cylinder,
    Cone,
    Capsule,
}

impl Bucket {
    pub const COUNT: usize = 5;
    pub const ALL: [Bucket; Bucket::COUNT] = [
        Bucket::Cuboid,
        Bucket::Ball,
        Bucket::Cylinder,
        Bucket::Cone,
        Bucket::Capsule,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Bucket::Cuboid => "cuboid",
            Bucket::Ball => "ball",
            Bucket::Cylinder => "cylinder",
            Bucket::Cone => "cone",
            Bucket::Capsule => "capsule",
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed-size table with one value per [`Bucket`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct BucketMap<T>([T; Bucket::COUNT]);

impl<T> BucketMap<T> {
    pub fn from_fn(mut f: impl FnMut(Bucket) -> T) -> Self {
        Self(Bucket::ALL.map(&mut f))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Bucket, &T)> {
        Bucket::ALL.into_iter().zip(self.0.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Bucket, &mut T)> {
        Bucket::ALL.into_iter().zip(self.0.iter_mut())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }
}

impl<T: Clone> BucketMap<T> {
    pub fn splat(value: T) -> Self {
        Self::from_fn(|_| value.clone())
    }
}

impl<T> Index<Bucket> for BucketMap<T> {
    type Output = T;

    #[inline]
    fn index(&self, bucket: Bucket) -> &T {
        &self.0[bucket.index()]
    }
}

impl<T> IndexMut<Bucket> for BucketMap<T> {
    #[inline]
    fn index_mut(&mut self, bucket: Bucket) -> &mut T {
        &mut self.0[bucket.index()]
    }
}
