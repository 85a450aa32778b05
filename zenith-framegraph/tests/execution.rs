mod common;

use common::{imported_texture, Harness, MockAllocator, TextureDesc, TextureUsage};
use zenith_framegraph::{
    FrameGraphConfigBuilder, FrameGraphError, FrameGraphState, ResourceHandle,
};

#[derive(Clone, Default)]
struct Targets {
    color: ResourceHandle,
    depth: ResourceHandle,
}

fn build_deferred(harness: &mut Harness) -> Targets {
    let graph = &mut harness.graph;

    let gbuffer = graph.add_pass(
        "Gbuffer",
        |builder, data: &mut Targets| {
            let color = builder.create("Albedo", TextureDesc::new(128, 128));
            let depth = builder.create("Depth", TextureDesc::new(128, 128));
            data.color = builder.write(color, TextureUsage::COLOR_ATTACHMENT);
            data.depth = builder.write(depth, TextureUsage::DEPTH_ATTACHMENT);
        },
        |view, data, driver| {
            let albedo = view.get(data.color).expect("albedo is created");
            let depth = view.get(data.depth).expect("depth is created");
            driver.record(format!("gbuffer {} {}", albedo.name, depth.name));
        },
    );

    let lighting = graph.add_pass(
        "Lighting",
        |builder, data: &mut Targets| {
            let _ = builder.read(gbuffer.color, TextureUsage::SAMPLED);
            let _ = builder.read(gbuffer.depth, TextureUsage::SAMPLED);
            let hdr = builder.create("Hdr", TextureDesc::new(128, 128));
            data.color = builder.write(hdr, TextureUsage::COLOR_ATTACHMENT);
        },
        |view, data, driver| {
            let hdr = view.get(data.color).expect("hdr is created");
            driver.record(format!("lighting {}", hdr.name));
        },
    );

    graph.present(lighting.color);
    lighting
}

#[test]
fn resources_are_created_and_destroyed_around_their_passes() {
    let mut harness = Harness::new();
    build_deferred(&mut harness);

    harness.run().expect("frame executes");

    assert_eq!(
        harness.trace(),
        [
            "push FrameGraph",
            "push Gbuffer",
            "create Albedo",
            "create Depth",
            "gbuffer Albedo Depth",
            "pop",
            "push Lighting",
            "create Hdr",
            "lighting Hdr",
            "destroy Albedo",
            "destroy Depth",
            "pop",
            "push Present",
            "destroy Hdr",
            "pop",
            "pop",
            "flush",
        ]
    );
    assert_eq!(harness.allocator.live(), 0);
    assert_eq!(harness.graph.state(), FrameGraphState::Executed);
}

#[test]
fn allocator_receives_the_usage_of_the_whole_frame() {
    let mut harness = Harness::new();
    build_deferred(&mut harness);

    harness.run().expect("frame executes");

    assert_eq!(
        harness.created_usage("Albedo"),
        Some(TextureUsage::COLOR_ATTACHMENT | TextureUsage::SAMPLED)
    );
    assert_eq!(
        harness.created_usage("Depth"),
        Some(TextureUsage::DEPTH_ATTACHMENT | TextureUsage::SAMPLED)
    );
    assert_eq!(harness.created_usage("Hdr"), Some(TextureUsage::COLOR_ATTACHMENT));
}

#[test]
fn markers_can_be_disabled() {
    let config = FrameGraphConfigBuilder::default()
        .debug_markers(false)
        .build()
        .expect("valid config");
    let mut harness = Harness::with_config(config);
    build_deferred(&mut harness);

    harness.run().expect("frame executes");

    let trace = harness.trace();
    assert!(trace.iter().all(|event| !event.starts_with("push") && event != "pop"));
    assert_eq!(trace.last().map(String::as_str), Some("flush"));
}

#[test]
fn frame_marker_is_configurable() {
    let config = FrameGraphConfigBuilder::default()
        .frame_marker("Shadows")
        .build()
        .expect("valid config");
    let mut harness = Harness::with_config(config);
    harness.graph.add_trivial_side_effect_pass("Clear", |_, _| {});

    harness.run().expect("frame executes");

    assert_eq!(harness.trace(), ["push Shadows", "push Clear", "pop", "pop", "flush"]);
}

#[test]
fn view_reports_pass_local_access() {
    let mut harness = Harness::new();
    let graph = &mut harness.graph;

    let color = graph.import("Color", TextureDesc::new(64, 64), imported_texture("Color"));
    graph.add_pass(
        "Blend",
        |builder, data: &mut Targets| {
            let _ = builder.read(color, TextureUsage::SAMPLED);
            data.color = builder.write(color, TextureUsage::COLOR_ATTACHMENT);
        },
        |view, data, driver| {
            let access = view.access(data.color).expect("declared");
            assert!(access.is_read_write());
            assert_eq!(access.read, TextureUsage::SAMPLED);
            assert_eq!(access.write, TextureUsage::COLOR_ATTACHMENT);

            let usage = view.usage(data.color).expect("declared");
            assert_eq!(usage, TextureUsage::SAMPLED | TextureUsage::COLOR_ATTACHMENT);
            assert_eq!(view.descriptor(data.color).expect("declared"), &TextureDesc::new(64, 64));
            assert_eq!(view.name(data.color).expect("declared"), "Color");
            assert_eq!(view.sub_resource_descriptor(data.color).expect("declared"), None);

            driver.record(view.pass_name());
        },
    );

    harness.run().expect("frame executes");
    assert_eq!(harness.records(), ["Blend"]);
}

#[test]
fn view_rejects_undeclared_resources() {
    let mut harness = Harness::new();
    let graph = &mut harness.graph;

    let other = graph.import("Other", TextureDesc::new(8, 8), imported_texture("Other"));
    graph.add_trivial_side_effect_pass("Probe", move |view, driver| {
        let error = view.get(other).expect_err("Other is not declared by Probe");
        let error = error.downcast::<FrameGraphError>().expect("frame graph error");
        assert_eq!(
            error,
            FrameGraphError::UndeclaredResource {
                pass: "Probe".into(),
                resource: "Other".into(),
            }
        );
        driver.record("probed");
    });

    harness.run().expect("frame executes");
    assert_eq!(harness.records(), ["probed"]);
}

#[test]
fn execute_before_compile_fails() {
    let mut harness = Harness::new();
    build_deferred(&mut harness);

    let error = harness
        .graph
        .execute(&mut harness.allocator, &mut harness.driver)
        .expect_err("graph is not compiled");
    assert_eq!(
        error.downcast_ref::<FrameGraphError>(),
        Some(&FrameGraphError::InvalidState {
            expected: FrameGraphState::Compiled,
            found: FrameGraphState::Building,
        })
    );
    assert!(harness.trace().is_empty());
}

#[test]
fn compiled_graph_rejects_declarations() {
    let mut harness = Harness::new();
    build_deferred(&mut harness);
    harness.graph.compile().expect("compiles");

    assert!(harness.graph.compile().is_err());

    let late = harness.graph.add_pass(
        "Late",
        |builder, data: &mut Targets| {
            data.color = builder.create("Late", TextureDesc::new(8, 8));
        },
        |_, _, driver| driver.record("late"),
    );
    assert!(!late.color.is_initialized());
    assert!(harness.graph.pass("Late").is_none());
    assert!(matches!(
        harness.graph.errors().last(),
        Some(FrameGraphError::InvalidState { found: FrameGraphState::Compiled, .. })
    ));

    harness
        .graph
        .execute(&mut harness.allocator, &mut harness.driver)
        .expect("executes");
    assert!(harness.graph.execute(&mut harness.allocator, &mut harness.driver).is_err());
    assert!(!harness.records().contains(&"late".to_owned()));
}

#[test]
fn reset_allows_a_new_frame() {
    let mut harness = Harness::new();
    build_deferred(&mut harness);
    harness.run().expect("first frame executes");

    harness.graph.reset();
    assert_eq!(harness.graph.state(), FrameGraphState::Building);
    assert_eq!(harness.graph.stats().passes, 0);

    harness.log.borrow_mut().clear();
    build_deferred(&mut harness);
    harness.run().expect("second frame executes");

    assert_eq!(harness.records(), ["gbuffer Albedo Depth", "lighting Hdr"]);
}

#[test]
fn allocation_failure_releases_live_resources() {
    let mut harness = Harness::new();
    harness.allocator = MockAllocator::failing_on(harness.log.clone(), "Hdr");
    build_deferred(&mut harness);

    let error = harness.run().expect_err("Hdr can not be created");
    let message = format!("{error:#}");
    assert!(message.contains("Hdr"), "{message}");
    assert!(message.contains("Lighting"), "{message}");

    assert_eq!(harness.allocator.live(), 0);
    assert_eq!(
        harness.trace(),
        [
            "push FrameGraph",
            "push Gbuffer",
            "create Albedo",
            "create Depth",
            "gbuffer Albedo Depth",
            "pop",
            "push Lighting",
            "pop",
            "destroy Albedo",
            "destroy Depth",
            "pop",
            "flush",
        ]
    );
}
