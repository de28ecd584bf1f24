/// Identity of a physics collider, as tracked by the registry.
///
/// # Bit layout
/// Physics engines hand out generational handles. Both halves are packed into a single `u64`
/// (least-significant bit = bit 0):
///
/// - bits 0..=31  : slot `index` (u32)
/// - bits 32..=63 : `generation` (u32)
///
/// # Invariants
/// - A handle is unique only while its collider is live. Engines recycle the index after
///   removal but bump the generation, so a recycled handle never equals a stale one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColliderId(u64);

/// Identity of a physics rigid body. Same layout as [`ColliderId`], distinct type so the two
/// can never be mixed up.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(u64);

#[inline]
const fn pack(index: u32, generation: u32) -> u64 {
    (index as u64) | ((generation as u64) << u32::BITS)
}

macro_rules! impl_packed_handle {
    ($name:ident) => {
        impl $name {
            /// Packs an engine `(index, generation)` pair.
            #[inline]
            pub const fn from_raw_parts(index: u32, generation: u32) -> Self {
                Self(pack(index, generation))
            }

            /// Builds a handle from an already-packed value.
            #[inline]
            pub const fn from_bits(bits: u64) -> Self {
                Self(bits)
            }

            #[inline]
            pub const fn to_bits(self) -> u64 {
                self.0
            }

            #[inline]
            pub const fn index(self) -> u32 {
                (self.0 & u32::MAX as u64) as u32
            }

            #[inline]
            pub const fn generation(self) -> u32 {
                (self.0 >> u32::BITS) as u32
            }

            /// Splits the handle back into `(index, generation)`.
            #[inline]
            pub const fn into_raw_parts(self) -> (u32, u32) {
                (self.index(), self.generation())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}v{}", self.index(), self.generation())
            }
        }
    };
}

impl_packed_handle!(ColliderId);
impl_packed_handle!(BodyId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_parts_survive_packing() {
        let indices = [0u32, 1, 42, u32::MAX];
        let generations = [0u32, 7, u32::MAX];

        for &index in &indices {
            for &generation in &generations {
                let id = ColliderId::from_raw_parts(index, generation);
                assert_eq!(id.into_raw_parts(), (index, generation));
                assert_eq!(ColliderId::from_bits(id.to_bits()), id);
            }
        }
    }

    #[test]
    fn index_lives_in_low_32_bits() {
        let id = BodyId::from_raw_parts(0x89AB_CDEF, 0x0123_4567);
        assert_eq!(id.to_bits(), 0x0123_4567_89AB_CDEF);
    }

    #[test]
    fn recycled_index_is_a_different_handle() {
        let first = ColliderId::from_raw_parts(3, 0);
        let recycled = ColliderId::from_raw_parts(3, 1);
        assert_ne!(first, recycled);
        assert_eq!(first.index(), recycled.index());
    }

    #[test]
    fn display_shows_index_and_generation() {
        assert_eq!(ColliderId::from_raw_parts(5, 2).to_string(), "5v2");
    }
}
