//! A deferred frame: depth prepass, gbuffer, ssao, lighting, bloom and tonemap.

use log::error;
use zenith_framegraph::{FrameGraph, ResourceHandle, ResourceView};
use crate::backend::{GpuTexture, LoggingDriver, MipLevel, Texture, TextureDesc, TextureFormat, TextureUsage};

pub type SandboxGraph = FrameGraph<Texture, LoggingDriver>;

const BLOOM_LEVELS: u32 = 4;

#[derive(Clone, Default)]
struct Gbuffer {
    depth: ResourceHandle,
    albedo: ResourceHandle,
    normal: ResourceHandle,
}

#[derive(Clone, Default)]
struct Output {
    target: ResourceHandle,
}

#[derive(Clone, Default)]
struct BloomLevel {
    source: ResourceHandle,
    target: ResourceHandle,
}

/// Resolve `targets` and hand them to the driver as one command.
fn record(view: &ResourceView<'_, Texture>, driver: &mut LoggingDriver, what: &str, targets: &[ResourceHandle]) {
    let textures: Result<Vec<String>, _> = targets
        .iter()
        .map(|handle| view.get(*handle).map(GpuTexture::to_string))
        .collect();

    match textures {
        Ok(textures) => driver.draw(what, &textures),
        Err(err) => error!("Pass [{}] can not record {what}: {err:#}", view.pass_name()),
    }
}

/// Declare one frame rendering into `backbuffer`.
pub fn build(graph: &mut SandboxGraph, width: u32, height: u32, backbuffer: GpuTexture) {
    let backbuffer = graph.import_with_usage(
        "Backbuffer",
        backbuffer.desc,
        TextureUsage::COLOR_ATTACHMENT | TextureUsage::PRESENT,
        backbuffer,
    );

    let prepass = graph.add_pass(
        "DepthPrepass",
        |builder, data: &mut Output| {
            let depth = builder.create("Depth", TextureDesc::new_2d(width, height, TextureFormat::D32));
            data.target = builder.write(depth, TextureUsage::DEPTH_ATTACHMENT);
        },
        |view, data, driver| record(view, driver, "draw opaque depth", &[data.target]),
    );

    let gbuffer = graph.add_pass(
        "Gbuffer",
        |builder, data: &mut Gbuffer| {
            let depth = builder.read(prepass.target, TextureUsage::DEPTH_ATTACHMENT);
            data.depth = builder.write(depth, TextureUsage::DEPTH_ATTACHMENT);

            let albedo = builder.create("Albedo", TextureDesc::new_2d(width, height, TextureFormat::Rgba8));
            let normal = builder.create("Normal", TextureDesc::new_2d(width, height, TextureFormat::Rgba16Float));
            data.albedo = builder.write(albedo, TextureUsage::COLOR_ATTACHMENT);
            data.normal = builder.write(normal, TextureUsage::COLOR_ATTACHMENT);
        },
        |view, data, driver| {
            record(view, driver, "draw opaque", &[data.albedo, data.normal, data.depth]);
        },
    );
    graph.blackboard_mut().put("depth", gbuffer.depth);

    let ssao = graph.add_pass(
        "Ssao",
        |builder, data: &mut Output| {
            let _ = builder.read(gbuffer.depth, TextureUsage::SAMPLED);
            let _ = builder.read(gbuffer.normal, TextureUsage::SAMPLED);
            let ao = builder.create("AmbientOcclusion", TextureDesc::new_2d(width / 2, height / 2, TextureFormat::R8));
            data.target = builder.write(ao, TextureUsage::STORAGE);
        },
        |view, data, driver| record(view, driver, "dispatch ssao", &[data.target]),
    );

    let lighting = graph.add_pass(
        "Lighting",
        |builder, data: &mut Output| {
            for input in [gbuffer.albedo, gbuffer.normal, gbuffer.depth, ssao.target] {
                let _ = builder.read(input, TextureUsage::SAMPLED);
            }
            let hdr = builder.create("Hdr", TextureDesc::new_2d(width, height, TextureFormat::Rgba16Float));
            data.target = builder.write(hdr, TextureUsage::COLOR_ATTACHMENT);
        },
        |view, data, driver| record(view, driver, "fullscreen lighting", &[data.target]),
    );

    let bloom = build_bloom(graph, lighting.target, width / 2, height / 2);

    // Debug visualisation nobody consumes, culled every frame.
    if let Some(depth) = graph.blackboard().get("depth") {
        graph.add_pass(
            "DepthDebug",
            |builder, data: &mut Output| {
                let _ = builder.read(depth, TextureUsage::SAMPLED);
                let overlay = builder.create("DepthOverlay", TextureDesc::new_2d(width, height, TextureFormat::Rgba8));
                data.target = builder.write(overlay, TextureUsage::COLOR_ATTACHMENT);
            },
            |view, data, driver| record(view, driver, "visualize depth", &[data.target]),
        );
    }

    let tonemap = graph.add_pass(
        "Tonemap",
        |builder, data: &mut Output| {
            let _ = builder.read(lighting.target, TextureUsage::SAMPLED);
            let _ = builder.read(bloom, TextureUsage::SAMPLED);
            data.target = builder.write(backbuffer, TextureUsage::COLOR_ATTACHMENT);
        },
        |view, data, driver| record(view, driver, "tonemap", &[data.target]),
    );

    graph.present(tonemap.target);
}

/// Downsample `hdr` into a mip chain, one subresource per level.
fn build_bloom(graph: &mut SandboxGraph, hdr: ResourceHandle, width: u32, height: u32) -> ResourceHandle {
    let chain = graph.add_pass(
        "BloomPrefilter",
        |builder, data: &mut BloomLevel| {
            data.source = builder.read(hdr, TextureUsage::SAMPLED);
            let chain = builder.create(
                "BloomChain",
                TextureDesc::new_2d(width, height, TextureFormat::Rgba16Float).with_levels(BLOOM_LEVELS),
            );
            data.target = builder.write(chain, TextureUsage::COLOR_ATTACHMENT);
        },
        |view, data, driver| record(view, driver, "prefilter", &[data.source, data.target]),
    );

    let mut source = chain.target;
    for level in 1..BLOOM_LEVELS {
        let name = format!("BloomDownsample{level}");
        let mip = graph.add_pass(
            &name,
            |builder, data: &mut BloomLevel| {
                data.source = builder.read(source, TextureUsage::SAMPLED);
                let mip = builder.create_subresource(chain.target, &format!("BloomChain.{level}"), MipLevel(level));
                data.target = builder.write(mip, TextureUsage::COLOR_ATTACHMENT);
            },
            |view, data, driver| record(view, driver, "downsample", &[data.target]),
        );
        source = mip.target;
    }

    chain.target
}
