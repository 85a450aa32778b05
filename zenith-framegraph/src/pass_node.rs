use bitflags::Flags;
use zenith_core::collections::{HashMap, SmallVec};
use crate::dependency_graph::{DependencyGraph, NodeId};
use crate::graph::NodeOwner;
use crate::handle::{ResourceHandle, ResourceIndex, SlotIndex};

pub(crate) type PassIndex = u32;

/// What one pass does with one resource, resolved at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassAccess<U> {
    pub read: U,
    pub write: U,
}

impl<U: Flags + Copy> PassAccess<U> {
    /// The pass both reads and writes the resource.
    pub fn is_read_write(&self) -> bool {
        self.is_read() && self.is_write()
    }

    pub fn is_read(&self) -> bool {
        !self.read.is_empty()
    }

    pub fn is_write(&self) -> bool {
        !self.write.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AccessKind {
    Read,
    Write,
}

pub(crate) struct PassNode<U> {
    pub(crate) name: String,
    pub(crate) node: NodeId,
    declared: SmallVec<[SlotIndex; 8]>,
    pending: SmallVec<[(SlotIndex, AccessKind, U); 8]>,
    accesses: HashMap<SlotIndex, PassAccess<U>>,
    /// Resources to create before the pass runs.
    pub(crate) devirtualize: SmallVec<[ResourceIndex; 4]>,
    /// Resources to release once the pass has run.
    pub(crate) destroy: SmallVec<[ResourceIndex; 4]>,
}

impl<U: Flags + Copy> PassNode<U> {
    pub(crate) fn new(name: &str, node: NodeId) -> Self {
        Self {
            name: name.to_owned(),
            node,
            declared: SmallVec::new(),
            pending: SmallVec::new(),
            accesses: HashMap::default(),
            devirtualize: SmallVec::new(),
            destroy: SmallVec::new(),
        }
    }

    #[inline]
    pub(crate) fn is_culled(&self, graph: &DependencyGraph<NodeOwner>) -> bool {
        graph.is_culled(self.node)
    }

    #[inline]
    pub(crate) fn is_target(&self, graph: &DependencyGraph<NodeOwner>) -> bool {
        graph.is_target(self.node)
    }

    pub(crate) fn make_target(&self, graph: &mut DependencyGraph<NodeOwner>) {
        graph.make_target(self.node);
    }

    /// Record that this pass touches `handle` through one of its edges.
    pub(crate) fn register_resource(&mut self, handle: ResourceHandle, access: AccessKind, usage: U) {
        if !self.declared.contains(&handle.index) {
            self.declared.push(handle.index);
        }
        self.pending.push((handle.index, access, usage));
    }

    /// Fold registered edges into per-resource read and write usage.
    pub(crate) fn resolve(&mut self) {
        for (index, access, usage) in self.pending.drain(..) {
            let entry = self.accesses.entry(index).or_insert(PassAccess {
                read: U::empty(),
                write: U::empty(),
            });

            match access {
                AccessKind::Read => entry.read = entry.read.union(usage),
                AccessKind::Write => entry.write = entry.write.union(usage),
            }
        }
    }

    #[inline]
    pub(crate) fn declares(&self, index: SlotIndex) -> bool {
        self.declared.contains(&index)
    }

    pub(crate) fn access(&self, index: SlotIndex) -> Option<PassAccess<U>> {
        self.accesses.get(&index).copied()
    }
}
