use bitflags::Flags;
use zenith_core::collections::SmallVec;
use crate::dependency_graph::{DependencyGraph, EdgeId, NodeId};
use crate::graph::NodeOwner;
use crate::handle::ResourceHandle;
use crate::pass_node::PassIndex;

/// An edge between a pass and a resource version, with the usage it declares.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResourceEdge<U> {
    pub(crate) edge: EdgeId,
    pub(crate) pass: PassIndex,
    pub(crate) usage: U,
}

/// Graph node of one version of a resource.
pub(crate) struct ResourceNode<U> {
    pub(crate) handle: ResourceHandle,
    /// Handle of the parent resource when this is a subresource.
    pub(crate) parent: Option<ResourceHandle>,
    pub(crate) node: NodeId,
    writer: Option<ResourceEdge<U>>,
    readers: SmallVec<[ResourceEdge<U>; 4]>,
    parent_read_edge: Option<EdgeId>,
    parent_write_edge: Option<EdgeId>,
    forwarded_edge: Option<EdgeId>,
}

impl<U: Flags + Copy> ResourceNode<U> {
    pub(crate) fn new(handle: ResourceHandle, parent: Option<ResourceHandle>, node: NodeId) -> Self {
        Self {
            handle,
            parent,
            node,
            writer: None,
            readers: SmallVec::new(),
            parent_read_edge: None,
            parent_write_edge: None,
            forwarded_edge: None,
        }
    }

    #[inline]
    pub(crate) fn has_writer_pass(&self) -> bool {
        self.writer.is_some()
    }

    #[inline]
    pub(crate) fn has_readers(&self) -> bool {
        !self.readers.is_empty()
    }

    /// Whether `pass` already has a write edge into this exact version.
    #[inline]
    pub(crate) fn has_write_from(&self, pass: PassIndex) -> bool {
        self.writer.is_some_and(|writer| writer.pass == pass)
    }

    pub(crate) fn writer(&self) -> Option<&ResourceEdge<U>> {
        self.writer.as_ref()
    }

    pub(crate) fn reader_for(&self, pass: PassIndex) -> Option<&ResourceEdge<U>> {
        self.readers.iter().find(|reader| reader.pass == pass)
    }

    /// Whether content flows into this version from a writer pass, a written
    /// subresource or a forwarded resource.
    pub(crate) fn is_produced(&self, graph: &DependencyGraph<NodeOwner>) -> bool {
        graph
            .incoming_edges(self.node)
            .any(|edge| Some(edge) != self.parent_read_edge)
    }

    /// Add the `pass -> self` edge, or widen its usage if it already exists.
    pub(crate) fn connect_writer(
        &mut self,
        graph: &mut DependencyGraph<NodeOwner>,
        pass: PassIndex,
        pass_node: NodeId,
        usage: U,
    ) {
        if let Some(writer) = self.writer.as_mut().filter(|writer| writer.pass == pass) {
            writer.usage = writer.usage.union(usage);
            return;
        }

        debug_assert!(self.writer.is_none(), "Resource version already has a writer pass!");
        let edge = graph.add_edge(pass_node, self.node);
        self.writer = Some(ResourceEdge { edge, pass, usage });
    }

    /// Add the `self -> pass` edge, or widen its usage if it already exists.
    pub(crate) fn connect_reader(
        &mut self,
        graph: &mut DependencyGraph<NodeOwner>,
        pass: PassIndex,
        pass_node: NodeId,
        usage: U,
    ) {
        if let Some(reader) = self.readers.iter_mut().find(|reader| reader.pass == pass) {
            reader.usage = reader.usage.union(usage);
        } else {
            let edge = graph.add_edge(self.node, pass_node);
            self.readers.push(ResourceEdge { edge, pass, usage });
        }
    }

    /// Keep the parent version alive while this subresource is read.
    pub(crate) fn set_parent_read_dependency(&mut self, graph: &mut DependencyGraph<NodeOwner>, parent: NodeId) {
        if self.parent_read_edge.is_none() {
            self.parent_read_edge = Some(graph.add_edge(parent, self.node));
        }
    }

    /// Make the parent version depend on what is written into this subresource.
    pub(crate) fn set_parent_write_dependency(&mut self, graph: &mut DependencyGraph<NodeOwner>, parent: NodeId) {
        if self.parent_write_edge.is_none() {
            self.parent_write_edge = Some(graph.add_edge(self.node, parent));
        }
    }

    /// Route everything written to this version into `source`.
    pub(crate) fn set_forward_resource_dependency(&mut self, graph: &mut DependencyGraph<NodeOwner>, source: NodeId) {
        debug_assert!(self.forwarded_edge.is_none(), "Resource version is already forwarded!");
        self.forwarded_edge = Some(graph.add_edge(self.node, source));
    }

    /// Union of the usage of surviving readers and of the writer.
    ///
    /// The writer counts even when culled: the content it would produce still
    /// has to be representable by the resource.
    pub(crate) fn resolve_usage(&self, graph: &DependencyGraph<NodeOwner>) -> U {
        let usage = self
            .readers
            .iter()
            .filter(|reader| graph.is_edge_valid(reader.edge))
            .fold(U::empty(), |usage, reader| usage.union(reader.usage));

        match &self.writer {
            Some(writer) => usage.union(writer.usage),
            None => usage,
        }
    }
}
