use crate::error::FrameGraphError;
use crate::handle::{ResourceHandle, ResourceSlot};
use crate::pass_node::{PassAccess, PassNode};
use crate::resource::{GraphResource, VirtualResource};

/// Resources of the executing pass, handed to its execute closure.
///
/// Only handles the pass declared during setup resolve. Versions are ignored,
/// so any handle of a declared resource from this frame works, including
/// forwarded ones.
pub struct ResourceView<'a, R: GraphResource> {
    slots: &'a [ResourceSlot],
    resources: &'a [VirtualResource<R>],
    pass: &'a PassNode<R::Usage>,
    epoch: u32,
}

impl<'a, R: GraphResource> ResourceView<'a, R> {
    pub(crate) fn new(
        slots: &'a [ResourceSlot],
        resources: &'a [VirtualResource<R>],
        pass: &'a PassNode<R::Usage>,
        epoch: u32,
    ) -> Self {
        Self {
            slots,
            resources,
            pass,
            epoch,
        }
    }

    fn resource(&self, handle: ResourceHandle) -> Result<&'a VirtualResource<R>, FrameGraphError> {
        if !handle.is_initialized() || handle.epoch != self.epoch {
            return Err(FrameGraphError::InvalidHandle { handle });
        }
        let slot = self
            .slots
            .get(handle.index as usize)
            .ok_or(FrameGraphError::InvalidHandle { handle })?;
        let resource = &self.resources[slot.rid as usize];

        if !self.pass.declares(handle.index) {
            return Err(FrameGraphError::UndeclaredResource {
                pass: self.pass.name.clone(),
                resource: resource.name.clone(),
            });
        }

        Ok(resource)
    }

    /// Concrete object backing `handle` during this pass.
    pub fn get(&self, handle: ResourceHandle) -> Result<&'a R::Concrete, anyhow::Error> {
        let resource = self.resource(handle)?;
        let concrete = resource.concrete.as_ref().ok_or_else(|| FrameGraphError::NotDevirtualized {
            resource: resource.name.clone(),
        })?;

        Ok(concrete)
    }

    pub fn descriptor(&self, handle: ResourceHandle) -> Result<&'a R::Descriptor, anyhow::Error> {
        Ok(&self.resource(handle)?.descriptor)
    }

    /// `None` when `handle` is not a subresource.
    pub fn sub_resource_descriptor(
        &self,
        handle: ResourceHandle,
    ) -> Result<Option<&'a R::SubResourceDescriptor>, anyhow::Error> {
        Ok(self.resource(handle)?.sub_resource_descriptor())
    }

    /// Usage of the resource combined over every surviving pass of the frame.
    pub fn usage(&self, handle: ResourceHandle) -> Result<R::Usage, anyhow::Error> {
        Ok(self.resource(handle)?.usage)
    }

    /// How this pass alone reads and writes the resource.
    pub fn access(&self, handle: ResourceHandle) -> Result<PassAccess<R::Usage>, anyhow::Error> {
        self.resource(handle)?;
        let access = self.pass.access(handle.index).ok_or_else(|| FrameGraphError::UndeclaredResource {
            pass: self.pass.name.clone(),
            resource: self.resources[self.slots[handle.index as usize].rid as usize].name.clone(),
        })?;

        Ok(access)
    }

    pub fn name(&self, handle: ResourceHandle) -> Result<&'a str, anyhow::Error> {
        Ok(&self.resource(handle)?.name)
    }

    pub fn pass_name(&self) -> &'a str {
        &self.pass.name
    }
}
