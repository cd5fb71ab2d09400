//! Identity: the three ID roles and the allocator that hands them out.
//!
//! All IDs are drawn from a single monotonic `u64` sequence (§3.1); the
//! newtypes below exist so the three roles can never be confused at
//! compile time, even though they share one counter underneath.

use alloc::collections::BTreeSet;
use core::fmt;

macro_rules! id_newtype {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u64);

        impl $name {
            /// Wraps a raw `u64`. Callers outside this crate get one of
            /// these only from [`IdAllocator`] or from decoding a foreign
            /// record; the constructor itself does not allocate.
            pub const fn from_raw(raw: u64) -> Self {
                $name(raw)
            }

            /// The underlying integer.
            pub const fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(ObjectId, "Stable identity of an object across all its versions.");
id_newtype!(SnapshotId, "Identity of one version of one object, unique across the whole memory.");
id_newtype!(FrameId, "Identity of a frame, unique across the memory.");

/// Draws IDs from a single monotonic sequence shared by all three roles
/// (§3.1: "roles do not share values" is enforced by the newtypes above,
/// not by partitioning the counter).
///
/// Supports pre-reserving a specific raw value (§4.1, §6.3: loaders
/// resolve cross-references before the referenced objects exist) as well
/// as plain sequential allocation.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u64,
    reserved: BTreeSet<u64>,
}

impl IdAllocator {
    /// A fresh allocator starting at 0.
    pub fn new() -> Self {
        IdAllocator {
            next: 0,
            reserved: BTreeSet::new(),
        }
    }

    /// Allocates the next unused raw ID, skipping any that have been
    /// reserved.
    pub fn allocate_raw(&mut self) -> u64 {
        loop {
            let candidate = self.next;
            self.next += 1;
            if !self.reserved.contains(&candidate) {
                return candidate;
            }
        }
    }

    /// Reserves a specific raw ID so it will never be handed out by
    /// [`IdAllocator::allocate_raw`]. Panics if the ID was already
    /// reserved or already fell out of the counter as allocated — callers
    /// must reserve before the sequence passes the requested value, or
    /// reserve an ID that is otherwise known free (a programming error
    /// otherwise, per §7 family 1).
    pub fn reserve_raw(&mut self, raw: u64) {
        assert!(raw >= self.next, "id {raw} already allocated");
        let newly_reserved = self.reserved.insert(raw);
        assert!(newly_reserved, "id {raw} already reserved");
    }

    /// Releases a reserved or allocated ID back for potential reuse is
    /// *not* supported — raw `u64` values are never recycled (§4.1
    /// garbage collection only frees the snapshot/frame table entries,
    /// not the numeric ID itself). This only removes it from the
    /// reservation set: unused reservations become inert bookkeeping,
    /// matching §4.1 ("reserved IDs that ended up unused are released").
    pub fn release_reservation(&mut self, raw: u64) {
        self.reserved.remove(&raw);
    }

    /// Allocates a fresh [`ObjectId`].
    pub fn allocate_object(&mut self) -> ObjectId {
        ObjectId(self.allocate_raw())
    }

    /// Allocates a fresh [`SnapshotId`].
    pub fn allocate_snapshot(&mut self) -> SnapshotId {
        SnapshotId(self.allocate_raw())
    }

    /// Allocates a fresh [`FrameId`].
    pub fn allocate_frame(&mut self) -> FrameId {
        FrameId(self.allocate_raw())
    }
}
