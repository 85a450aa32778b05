//! Collaborators the frame graph drives but does not implement.

use crate::resource::GraphResource;

/// Turns resource descriptors into concrete GPU objects and releases them.
///
/// The frame graph calls `devirtualize` right before the first pass that uses
/// a resource and `destroy` right after the last one. Imported resources and
/// subresources never reach the allocator.
pub trait ResourceAllocator<R: GraphResource> {
    fn devirtualize(
        &mut self,
        name: &str,
        descriptor: &R::Descriptor,
        usage: R::Usage,
    ) -> Result<R::Concrete, anyhow::Error>;

    fn destroy(&mut self, name: &str, resource: R::Concrete);
}

/// Ordered command stream the passes record into.
///
/// The frame graph only emits markers around passes and a flush at the end of
/// the frame; everything else is issued by the pass bodies themselves.
pub trait DriverSink {
    fn push_group_marker(&mut self, name: &str);

    fn pop_group_marker(&mut self);

    fn flush(&mut self);
}
