//! Headless texture backend: a recycling allocator and a driver that logs.

use std::fmt;
use log::{debug, info, trace};
use zenith_core::collections::HashMap;
use zenith_framegraph::bitflags::bitflags;
use zenith_framegraph::{DriverSink, GraphResource, ResourceAllocator};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        const SAMPLED = 1 << 0;
        const COLOR_ATTACHMENT = 1 << 1;
        const DEPTH_ATTACHMENT = 1 << 2;
        const STORAGE = 1 << 3;
        const PRESENT = 1 << 4;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba8,
    Rgba16Float,
    R8,
    D32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub levels: u32,
    pub format: TextureFormat,
}

impl TextureDesc {
    pub fn new_2d(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            levels: 1,
            format,
        }
    }

    pub fn with_levels(self, levels: u32) -> Self {
        Self { levels, ..self }
    }
}

/// One mip level of a texture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MipLevel(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuTexture {
    pub id: u32,
    pub desc: TextureDesc,
    pub usage: TextureUsage,
}

impl fmt::Display for GpuTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tex#{} {}x{} {:?}", self.id, self.desc.width, self.desc.height, self.desc.format)
    }
}

pub struct Texture;

impl GraphResource for Texture {
    type Descriptor = TextureDesc;
    type SubResourceDescriptor = MipLevel;
    type Usage = TextureUsage;
    type Concrete = GpuTexture;

    fn sub_resource_descriptor(parent: &TextureDesc, mip: &MipLevel) -> TextureDesc {
        TextureDesc {
            width: parent.width.checked_shr(mip.0).unwrap_or(0).max(1),
            height: parent.height.checked_shr(mip.0).unwrap_or(0).max(1),
            levels: 1,
            format: parent.format,
        }
    }
}

/// Recycles textures released by earlier frames when descriptor and usage match.
#[derive(Default)]
pub struct TexturePool {
    free: HashMap<(TextureDesc, TextureUsage), Vec<GpuTexture>>,
    next_id: u32,
    created: u32,
    reused: u32,
}

impl TexturePool {
    /// Ids starting at `first_id` are left to the caller, e.g. for swapchain images.
    pub fn with_reserved_ids(first_id: u32) -> Self {
        Self {
            next_id: first_id,
            ..Self::default()
        }
    }

    pub fn created(&self) -> u32 {
        self.created
    }

    pub fn reused(&self) -> u32 {
        self.reused
    }
}

impl ResourceAllocator<Texture> for TexturePool {
    fn devirtualize(
        &mut self,
        name: &str,
        desc: &TextureDesc,
        usage: TextureUsage,
    ) -> Result<GpuTexture, anyhow::Error> {
        anyhow::ensure!(desc.width > 0 && desc.height > 0, "Texture [{name}] has an empty extent: {desc:?}");

        if let Some(texture) = self.free.get_mut(&(*desc, usage)).and_then(Vec::pop) {
            trace!("Reuse {texture} for [{name}]");
            self.reused += 1;
            return Ok(texture);
        }

        self.next_id += 1;
        self.created += 1;
        let texture = GpuTexture {
            id: self.next_id,
            desc: *desc,
            usage,
        };
        debug!("Create {texture} ({usage:?}) for [{name}]");

        Ok(texture)
    }

    fn destroy(&mut self, name: &str, texture: GpuTexture) {
        trace!("Release {texture} of [{name}]");
        self.free
            .entry((texture.desc, texture.usage))
            .or_default()
            .push(texture);
    }
}

/// Command stream that only logs what it receives.
#[derive(Default)]
pub struct LoggingDriver {
    markers: Vec<String>,
    commands: u32,
}

impl LoggingDriver {
    pub fn draw(&mut self, what: &str, targets: &[String]) {
        self.commands += 1;
        debug!("[{}] {what} -> {}", self.markers.join("/"), targets.join(", "));
    }
}

impl DriverSink for LoggingDriver {
    fn push_group_marker(&mut self, name: &str) {
        self.markers.push(name.to_owned());
    }

    fn pop_group_marker(&mut self) {
        self.markers.pop();
    }

    fn flush(&mut self) {
        info!("Flushed {} commands", self.commands);
        self.commands = 0;
    }
}
