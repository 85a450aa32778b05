//! Resource handles and the slot table they index into.

use std::fmt;

/// Index of a [`ResourceSlot`], stable for the whole frame.
pub(crate) type SlotIndex = u32;
/// Index of a virtual resource inside the frame graph.
pub(crate) type ResourceIndex = u32;
/// Index of a resource node (one per resource version).
pub(crate) type ResourceNodeIndex = u32;
pub(crate) type Version = u32;

/// Slot version of a handle that has been forwarded. No handle ever carries it.
pub(crate) const FORWARDED_VERSION: Version = Version::MAX;

/// Opaque reference to a frame graph resource at one point of its write history.
///
/// A handle stays valid until another write to the same resource produces a
/// newer handle, until the resource is forwarded, or until the frame graph is
/// reset.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    pub(crate) index: SlotIndex,
    pub(crate) version: Version,
    pub(crate) epoch: u32,
}

impl ResourceHandle {
    /// Handle that never refers to anything. Returned by failed operations.
    pub const INVALID: Self = Self {
        index: SlotIndex::MAX,
        version: 0,
        epoch: 0,
    };

    #[inline]
    pub(crate) fn new(index: SlotIndex, epoch: u32) -> Self {
        Self {
            index,
            version: 0,
            epoch,
        }
    }

    #[inline]
    pub(crate) fn with_version(self, version: Version) -> Self {
        Self { version, ..self }
    }

    /// Stable slot index of the logical resource.
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Write epoch of the resource this handle refers to.
    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Whether this handle came out of a successful frame graph operation.
    ///
    /// This says nothing about staleness, use `FrameGraph::is_valid` for that.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.index != SlotIndex::MAX
    }
}

impl Default for ResourceHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_initialized() {
            write!(f, "Resource({}.v{})", self.index, self.version)
        } else {
            write!(f, "Resource(invalid)")
        }
    }
}

/// Indirection from a handle index to the current state of its resource.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResourceSlot {
    /// Virtual resource the slot resolves to. Rebound by forwarding.
    pub(crate) rid: ResourceIndex,
    /// Current resource node, the one new reads and writes attach to.
    pub(crate) nid: ResourceNodeIndex,
    /// Node reads must still resolve to while a subresource write is pending.
    pub(crate) pending_read_nid: Option<ResourceNodeIndex>,
    pub(crate) version: Version,
}

impl ResourceSlot {
    pub(crate) fn new(rid: ResourceIndex, nid: ResourceNodeIndex) -> Self {
        Self {
            rid,
            nid,
            pending_read_nid: None,
            version: 0,
        }
    }

    #[inline]
    pub(crate) fn is_forwarded(&self) -> bool {
        self.version == FORWARDED_VERSION
    }

    /// Bump the version and return it.
    pub(crate) fn next_version(&mut self) -> Version {
        debug_assert!(!self.is_forwarded(), "Forwarded resource slot can not be versioned!");
        debug_assert!(self.version + 1 < FORWARDED_VERSION, "Resource version overflow!");
        self.version += 1;
        self.version
    }
}
