use crate::graph::FrameGraph;
use crate::handle::ResourceHandle;
use crate::interface::DriverSink;
use crate::pass_node::PassIndex;
use crate::resource::GraphResource;

/// Declares the resources of one pass. Handed to the setup closure of
/// [`FrameGraph::add_pass`].
pub struct PassBuilder<'a, R: GraphResource, S: DriverSink> {
    graph: &'a mut FrameGraph<R, S>,
    pass: PassIndex,
}

impl<'a, R: GraphResource, S: DriverSink> PassBuilder<'a, R, S> {
    pub(crate) fn new(graph: &'a mut FrameGraph<R, S>, pass: PassIndex) -> Self {
        Self { graph, pass }
    }

    /// Declare a transient resource, created on first use and destroyed after last use.
    ///
    /// Nothing is connected to the pass yet; write to it to produce its content.
    #[must_use]
    pub fn create(&mut self, name: &str, descriptor: R::Descriptor) -> ResourceHandle {
        if !self.graph.check_building() {
            return ResourceHandle::INVALID;
        }
        self.graph.create_resource(name, descriptor)
    }

    /// Declare a view into `parent` that shares its concrete object.
    #[must_use]
    pub fn create_subresource(
        &mut self,
        parent: ResourceHandle,
        name: &str,
        descriptor: R::SubResourceDescriptor,
    ) -> ResourceHandle {
        if !self.graph.check_building() {
            return ResourceHandle::INVALID;
        }
        self.graph.create_sub_resource(parent, name, descriptor)
    }

    /// Declare that this pass reads `handle` with `usage`.
    ///
    /// Returns the same handle, or [`ResourceHandle::INVALID`] on failure.
    #[must_use]
    pub fn read(&mut self, handle: ResourceHandle, usage: R::Usage) -> ResourceHandle {
        self.graph.read(self.pass, handle, usage)
    }

    /// Declare that this pass writes `handle` with `usage`.
    ///
    /// Returns the handle of the version this pass produces. Every handle of
    /// the resource obtained before becomes stale if a new version was needed.
    #[must_use]
    pub fn write(&mut self, handle: ResourceHandle, usage: R::Usage) -> ResourceHandle {
        self.graph.write(self.pass, handle, usage)
    }

    /// Never cull this pass.
    pub fn side_effect(&mut self) {
        self.graph.side_effect(self.pass);
    }

    pub fn descriptor(&self, handle: ResourceHandle) -> Option<&R::Descriptor> {
        self.graph.descriptor(handle)
    }

    pub fn name(&self, handle: ResourceHandle) -> Option<&str> {
        self.graph.name(handle)
    }

    pub fn is_valid(&self, handle: ResourceHandle) -> bool {
        self.graph.is_valid(handle)
    }

    pub fn pass_name(&self) -> &str {
        &self.graph.passes[self.pass as usize].name
    }
}
