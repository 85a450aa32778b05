use std::fmt::Debug;
use bitflags::Flags;
use crate::handle::ResourceIndex;
use crate::interface::ResourceAllocator;
use crate::pass_node::PassIndex;

/// A family of resources the frame graph can schedule (textures, buffers...).
///
/// Implement it on a marker type; the frame graph is generic over it.
pub trait GraphResource: 'static {
    /// Everything the allocator needs to create the concrete resource.
    type Descriptor: Clone + Debug;
    /// Selects a view into a parent resource (mip level, array layer...).
    type SubResourceDescriptor: Clone + Debug + Default;
    /// How a pass uses the resource. Combined across the frame before creation.
    type Usage: Flags + Copy + Debug;
    /// The backing object handed to passes at execution.
    type Concrete: Clone;

    /// Full descriptor of a subresource created from `parent`.
    fn sub_resource_descriptor(
        parent: &Self::Descriptor,
        _sub: &Self::SubResourceDescriptor,
    ) -> Self::Descriptor {
        parent.clone()
    }
}

pub(crate) enum ResourceOrigin<R: GraphResource> {
    /// Created and destroyed by the frame graph.
    Owned,
    /// Owned outside the frame graph, only usable with the declared usage.
    Imported { declared_usage: R::Usage },
    /// A view into another resource; shares its concrete object.
    SubResource {
        parent: ResourceIndex,
        descriptor: R::SubResourceDescriptor,
    },
}

/// Descriptor and lifetime bookkeeping of one logical resource.
pub(crate) struct VirtualResource<R: GraphResource> {
    pub(crate) name: String,
    pub(crate) descriptor: R::Descriptor,
    pub(crate) origin: ResourceOrigin<R>,
    /// Combined usage of every surviving edge, resolved by compile.
    pub(crate) usage: R::Usage,
    pub(crate) ref_count: u32,
    pub(crate) first: Option<PassIndex>,
    pub(crate) last: Option<PassIndex>,
    pub(crate) concrete: Option<R::Concrete>,
}

impl<R: GraphResource> VirtualResource<R> {
    pub(crate) fn owned(name: &str, descriptor: R::Descriptor) -> Self {
        Self::with_origin(name, descriptor, ResourceOrigin::Owned, None)
    }

    pub(crate) fn imported(
        name: &str,
        descriptor: R::Descriptor,
        declared_usage: R::Usage,
        resource: R::Concrete,
    ) -> Self {
        Self::with_origin(
            name,
            descriptor,
            ResourceOrigin::Imported { declared_usage },
            Some(resource),
        )
    }

    pub(crate) fn sub_resource(
        name: &str,
        parent: ResourceIndex,
        parent_descriptor: &R::Descriptor,
        sub_descriptor: R::SubResourceDescriptor,
    ) -> Self {
        let descriptor = R::sub_resource_descriptor(parent_descriptor, &sub_descriptor);
        Self::with_origin(
            name,
            descriptor,
            ResourceOrigin::SubResource {
                parent,
                descriptor: sub_descriptor,
            },
            None,
        )
    }

    fn with_origin(
        name: &str,
        descriptor: R::Descriptor,
        origin: ResourceOrigin<R>,
        concrete: Option<R::Concrete>,
    ) -> Self {
        Self {
            name: name.to_owned(),
            descriptor,
            origin,
            usage: R::Usage::empty(),
            ref_count: 0,
            first: None,
            last: None,
            concrete,
        }
    }

    #[inline]
    pub(crate) fn is_imported(&self) -> bool {
        matches!(self.origin, ResourceOrigin::Imported { .. })
    }

    #[inline]
    pub(crate) fn is_sub_resource(&self) -> bool {
        matches!(self.origin, ResourceOrigin::SubResource { .. })
    }

    #[inline]
    pub(crate) fn parent(&self) -> Option<ResourceIndex> {
        match self.origin {
            ResourceOrigin::SubResource { parent, .. } => Some(parent),
            _ => None,
        }
    }

    pub(crate) fn sub_resource_descriptor(&self) -> Option<&R::SubResourceDescriptor> {
        match &self.origin {
            ResourceOrigin::SubResource { descriptor, .. } => Some(descriptor),
            _ => None,
        }
    }

    /// Whether an edge with `usage` may be connected to this resource.
    pub(crate) fn accepts_usage(&self, usage: R::Usage) -> bool {
        match &self.origin {
            ResourceOrigin::Imported { declared_usage } => declared_usage.contains(usage),
            _ => true,
        }
    }

    /// Account for one edge of `pass` touching this resource.
    pub(crate) fn needed_by_pass(&mut self, pass: PassIndex) {
        self.ref_count += 1;
        self.first.get_or_insert(pass);
        self.last = Some(pass);
    }

    /// Create the concrete resource. Subresources receive their parent's object.
    pub(crate) fn devirtualize<A: ResourceAllocator<R>>(
        &mut self,
        allocator: &mut A,
        parent: Option<&R::Concrete>,
    ) -> Result<(), anyhow::Error> {
        match &self.origin {
            ResourceOrigin::Owned => {
                let concrete = allocator.devirtualize(&self.name, &self.descriptor, self.usage)?;
                self.concrete = Some(concrete);
            }
            ResourceOrigin::Imported { .. } => {}
            ResourceOrigin::SubResource { .. } => {
                let parent = parent.ok_or_else(|| {
                    anyhow::anyhow!("Parent of subresource [{}] is not devirtualized!", self.name)
                })?;
                self.concrete = Some(parent.clone());
            }
        }

        Ok(())
    }

    /// Release the concrete resource. Imported resources are left untouched.
    pub(crate) fn destroy<A: ResourceAllocator<R>>(&mut self, allocator: &mut A) {
        match self.origin {
            ResourceOrigin::Owned => {
                if let Some(concrete) = self.concrete.take() {
                    allocator.destroy(&self.name, concrete);
                }
            }
            ResourceOrigin::Imported { .. } => {}
            ResourceOrigin::SubResource { .. } => {
                self.concrete = None;
            }
        }
    }

    /// Owned resource currently holding an allocator object.
    #[inline]
    pub(crate) fn is_live(&self) -> bool {
        matches!(self.origin, ResourceOrigin::Owned) && self.concrete.is_some()
    }
}
