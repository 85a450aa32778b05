#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use zenith_framegraph::bitflags::bitflags;
use zenith_framegraph::{DriverSink, FrameGraph, FrameGraphConfig, GraphResource, ResourceAllocator};

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

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub levels: u32,
}

impl TextureDesc {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, levels: 1 }
    }

    pub fn with_levels(self, levels: u32) -> Self {
        Self { levels, ..self }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureSubDesc {
    pub level: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuTexture {
    pub id: u32,
    pub name: String,
}

/// Texture resource family of the mock backend.
pub struct Texture;

impl GraphResource for Texture {
    type Descriptor = TextureDesc;
    type SubResourceDescriptor = TextureSubDesc;
    type Usage = TextureUsage;
    type Concrete = GpuTexture;

    fn sub_resource_descriptor(parent: &TextureDesc, sub: &TextureSubDesc) -> TextureDesc {
        TextureDesc {
            width: parent.width.checked_shr(sub.level).unwrap_or(0).max(1),
            height: parent.height.checked_shr(sub.level).unwrap_or(0).max(1),
            levels: 1,
        }
    }
}

/// Everything the allocator, the driver and the pass bodies did, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Create { name: String, usage: TextureUsage },
    Destroy(String),
    Push(String),
    Pop,
    Flush,
    Record(String),
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::Create { name, .. } => write!(f, "create {name}"),
            Event::Destroy(name) => write!(f, "destroy {name}"),
            Event::Push(name) => write!(f, "push {name}"),
            Event::Pop => write!(f, "pop"),
            Event::Flush => write!(f, "flush"),
            Event::Record(what) => write!(f, "{what}"),
        }
    }
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

pub struct MockAllocator {
    log: EventLog,
    next_id: u32,
    fail_on: Option<String>,
    live: usize,
}

impl MockAllocator {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            next_id: 0,
            fail_on: None,
            live: 0,
        }
    }

    /// Allocator that refuses to create the resource named `name`.
    pub fn failing_on(log: EventLog, name: &str) -> Self {
        Self {
            fail_on: Some(name.to_owned()),
            ..Self::new(log)
        }
    }

    pub fn live(&self) -> usize {
        self.live
    }
}

impl ResourceAllocator<Texture> for MockAllocator {
    fn devirtualize(
        &mut self,
        name: &str,
        _descriptor: &TextureDesc,
        usage: TextureUsage,
    ) -> Result<GpuTexture, anyhow::Error> {
        if self.fail_on.as_deref() == Some(name) {
            anyhow::bail!("out of memory while creating {name}");
        }

        self.next_id += 1;
        self.live += 1;
        self.log.borrow_mut().push(Event::Create {
            name: name.to_owned(),
            usage,
        });

        Ok(GpuTexture {
            id: self.next_id,
            name: name.to_owned(),
        })
    }

    fn destroy(&mut self, name: &str, resource: GpuTexture) {
        assert_eq!(resource.name, name);
        self.live -= 1;
        self.log.borrow_mut().push(Event::Destroy(name.to_owned()));
    }
}

pub struct RecordingDriver {
    log: EventLog,
}

impl RecordingDriver {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }

    pub fn record(&mut self, what: impl Into<String>) {
        self.log.borrow_mut().push(Event::Record(what.into()));
    }
}

impl DriverSink for RecordingDriver {
    fn push_group_marker(&mut self, name: &str) {
        self.log.borrow_mut().push(Event::Push(name.to_owned()));
    }

    fn pop_group_marker(&mut self) {
        self.log.borrow_mut().push(Event::Pop);
    }

    fn flush(&mut self) {
        self.log.borrow_mut().push(Event::Flush);
    }
}

pub type TestGraph = FrameGraph<Texture, RecordingDriver>;

/// A frame graph wired to the mock allocator and driver.
pub struct Harness {
    pub graph: TestGraph,
    pub allocator: MockAllocator,
    pub driver: RecordingDriver,
    pub log: EventLog,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(FrameGraphConfig::default())
    }

    pub fn with_config(config: FrameGraphConfig) -> Self {
        init_logger();

        let log = EventLog::default();
        Self {
            graph: TestGraph::with_config(config),
            allocator: MockAllocator::new(log.clone()),
            driver: RecordingDriver::new(log.clone()),
            log,
        }
    }

    pub fn run(&mut self) -> Result<(), anyhow::Error> {
        self.graph.compile()?;
        self.graph.execute(&mut self.allocator, &mut self.driver)
    }

    pub fn events(&self) -> Vec<Event> {
        self.log.borrow().clone()
    }

    /// The whole log in a compact form, e.g. `push Gbuffer` or `create Depth`.
    pub fn trace(&self) -> Vec<String> {
        self.log.borrow().iter().map(Event::to_string).collect()
    }

    /// Only what the allocator did.
    pub fn allocations(&self) -> Vec<String> {
        self.log
            .borrow()
            .iter()
            .filter(|event| matches!(event, Event::Create { .. } | Event::Destroy(_)))
            .map(Event::to_string)
            .collect()
    }

    /// Only what the pass bodies recorded.
    pub fn records(&self) -> Vec<String> {
        self.log
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Record(what) => Some(what.clone()),
                _ => None,
            })
            .collect()
    }

    /// Usage the allocator was asked to create `name` with.
    pub fn created_usage(&self, name: &str) -> Option<TextureUsage> {
        self.log.borrow().iter().find_map(|event| match event {
            Event::Create { name: created, usage } if created == name => Some(*usage),
            _ => None,
        })
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn imported_texture(name: &str) -> GpuTexture {
    GpuTexture {
        id: 1000,
        name: name.to_owned(),
    }
}
