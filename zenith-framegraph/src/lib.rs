//! Frame graph: per-frame scheduling of render passes and transient resources.
//!
//! Passes declare what they read and write; [`FrameGraph::compile`] culls the
//! passes whose output nobody consumes and computes when each resource has to
//! exist, and [`FrameGraph::execute`] runs the survivors in declaration order
//! while creating and destroying resources through a [`ResourceAllocator`].

mod blackboard;
mod builder;
mod config;
mod dependency_graph;
mod error;
mod graph;
mod graphviz;
mod handle;
mod interface;
mod pass_node;
mod resource;
mod resource_node;
mod view;

pub use bitflags;

pub use blackboard::Blackboard;
pub use builder::PassBuilder;
pub use config::{
    FrameGraphConfig, FrameGraphConfigBuilder, FrameGraphConfigBuilderError,
    UninitializedReadPolicy,
};
pub use error::FrameGraphError;
pub use graph::{
    FrameGraph, FrameGraphState, FrameGraphStats,
    PassInfo, UninitializedRead,
};
pub use handle::ResourceHandle;
pub use interface::{DriverSink, ResourceAllocator};
pub use pass_node::PassAccess;
pub use resource::GraphResource;
pub use view::ResourceView;
