#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

mod backend;
mod frame;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use anyhow::Context;
use clap::{Parser, ValueEnum};
use zenith_core::cli::CommonArgs;
use zenith_core::log::info;
use zenith_core::profile;
use zenith_framegraph::{FrameGraphConfigBuilder, UninitializedReadPolicy};
use crate::backend::{GpuTexture, LoggingDriver, TextureDesc, TextureFormat, TexturePool, TextureUsage};
use crate::frame::SandboxGraph;

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
enum ReadPolicy {
    Allow,
    #[default]
    Warn,
    Reject,
}

impl From<ReadPolicy> for UninitializedReadPolicy {
    fn from(policy: ReadPolicy) -> Self {
        match policy {
            ReadPolicy::Allow => UninitializedReadPolicy::Allow,
            ReadPolicy::Warn => UninitializedReadPolicy::Warn,
            ReadPolicy::Reject => UninitializedReadPolicy::Reject,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Runs a deferred frame through the Zenith frame graph", long_about = None)]
struct SandboxArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// What to do when a pass reads a resource nothing wrote
    #[arg(long, value_enum, default_value_t = ReadPolicy::Warn)]
    uninitialized_reads: ReadPolicy,

    /// Do not emit driver group markers
    #[arg(long)]
    no_markers: bool,

    /// Number of frames to build and execute
    #[arg(long, default_value_t = 3)]
    frames: u32,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Write the compiled graph of the first frame in Graphviz format
    #[arg(long)]
    graphviz: Option<PathBuf>,
}

fn write_graphviz(graph: &SandboxGraph, path: &Path) -> Result<(), anyhow::Error> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    graph.export_graphviz(&mut out)?;
    info!("Frame graph written to {}", path.display());
    Ok(())
}

fn main() -> Result<(), anyhow::Error> {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    let args = SandboxArgs::parse();
    zenith_core::log::initialize(args.common.log_level.into())?;
    let _profiler_server = if args.common.profile {
        Some(profile::initialize()?)
    } else {
        None
    };

    let config = FrameGraphConfigBuilder::default()
        .uninitialized_reads(args.uninitialized_reads)
        .debug_markers(!args.no_markers)
        .build()?;

    let mut graph = SandboxGraph::with_config(config);
    let mut allocator = TexturePool::with_reserved_ids(1);
    let mut driver = LoggingDriver::default();

    let swapchain_image = GpuTexture {
        id: 1,
        desc: TextureDesc::new_2d(args.width, args.height, TextureFormat::Rgba8),
        usage: TextureUsage::COLOR_ATTACHMENT | TextureUsage::PRESENT,
    };

    for index in 0..args.frames {
        profiling::scope!("sandbox::frame");

        frame::build(&mut graph, args.width, args.height, swapchain_image.clone());
        graph.compile()?;

        if index == 0 {
            if let Some(path) = &args.graphviz {
                write_graphviz(&graph, path)?;
            }
        }

        graph
            .execute(&mut allocator, &mut driver)
            .with_context(|| format!("Failed to execute frame {index}"))?;
        info!("Frame {index}: {}", graph.stats());

        graph.reset();
        profile::finish_frame();
    }

    info!("Texture pool: {} created, {} reused", allocator.created(), allocator.reused());
    Ok(())
}
