//! Frame graph orchestration: declaration, culling, lifetimes and execution.

use anyhow::Context;
use bitflags::Flags;
use derive_more::Display;
use log::{debug, error, trace, warn};
use zenith_core::collections::SmallVec;
use crate::blackboard::Blackboard;
use crate::builder::PassBuilder;
use crate::config::{FrameGraphConfig, UninitializedReadPolicy};
use crate::dependency_graph::{DependencyGraph, NodeId};
use crate::error::FrameGraphError;
use crate::handle::{ResourceHandle, ResourceIndex, ResourceNodeIndex, ResourceSlot, FORWARDED_VERSION};
use crate::interface::{DriverSink, ResourceAllocator};
use crate::pass_node::{AccessKind, PassIndex, PassNode};
use crate::resource::{GraphResource, VirtualResource};
use crate::resource_node::ResourceNode;
use crate::view::ResourceView;

/// What a dependency graph node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeOwner {
    Pass(PassIndex),
    Resource(ResourceNodeIndex),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameGraphState {
    /// Passes and resources are being declared.
    #[default]
    Building,
    /// Culled, with resource lifetimes assigned to passes.
    Compiled,
    /// Every surviving pass has run. Only `reset` is allowed now.
    Executed,
}

/// A read that sees content no pass wrote and that was not imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UninitializedRead {
    pub pass: String,
    pub resource: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[display("{passes} passes ({culled_passes} culled), {resources} resources ({live_resources} used), {resource_nodes} versions, {edges} edges")]
pub struct FrameGraphStats {
    pub passes: usize,
    pub culled_passes: usize,
    pub resources: usize,
    pub live_resources: usize,
    pub resource_nodes: usize,
    pub edges: usize,
}

/// Compile results of one pass.
#[derive(Debug, Clone)]
pub struct PassInfo<'a> {
    pub name: &'a str,
    pub culled: bool,
    pub target: bool,
    /// Resources created right before this pass runs.
    pub devirtualize: SmallVec<[&'a str; 4]>,
    /// Resources released right after this pass runs.
    pub destroy: SmallVec<[&'a str; 4]>,
}

pub(crate) type PassExecutor<R, S> = Box<dyn FnOnce(&ResourceView<'_, R>, &mut S)>;

/// Per-frame scheduler of passes and the resources they read and write.
///
/// Lifecycle of one frame: declare passes with [`add_pass`](Self::add_pass),
/// [`compile`](Self::compile), [`execute`](Self::execute), then
/// [`reset`](Self::reset) before declaring the next frame. `R` is the resource
/// family being scheduled, `S` the driver the pass bodies record into.
pub struct FrameGraph<R: GraphResource, S: DriverSink> {
    config: FrameGraphConfig,
    state: FrameGraphState,
    /// Advanced on reset so handles from earlier frames never validate.
    epoch: u32,

    pub(crate) graph: DependencyGraph<NodeOwner>,
    pub(crate) slots: Vec<ResourceSlot>,
    pub(crate) resources: Vec<VirtualResource<R>>,
    pub(crate) resource_nodes: Vec<ResourceNode<R::Usage>>,
    pub(crate) passes: Vec<PassNode<R::Usage>>,
    executors: Vec<Option<PassExecutor<R, S>>>,
    active_passes: Vec<PassIndex>,

    blackboard: Blackboard,
    errors: Vec<FrameGraphError>,
    uninitialized_reads: Vec<UninitializedRead>,
}

impl<R: GraphResource, S: DriverSink> Default for FrameGraph<R, S> {
    fn default() -> Self {
        Self::with_config(FrameGraphConfig::default())
    }
}

impl<R: GraphResource, S: DriverSink> FrameGraph<R, S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FrameGraphConfig) -> Self {
        Self {
            config,
            state: FrameGraphState::Building,
            epoch: 0,
            graph: DependencyGraph::new(),
            slots: Vec::new(),
            resources: Vec::new(),
            resource_nodes: Vec::new(),
            passes: Vec::new(),
            executors: Vec::new(),
            active_passes: Vec::new(),
            blackboard: Blackboard::new(),
            errors: Vec::new(),
            uninitialized_reads: Vec::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &FrameGraphConfig {
        &self.config
    }

    #[inline]
    pub fn state(&self) -> FrameGraphState {
        self.state
    }

    #[inline]
    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    #[inline]
    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }

    /// Non-fatal failures recorded since the last reset.
    #[inline]
    pub fn errors(&self) -> &[FrameGraphError] {
        &self.errors
    }

    /// Reads of never-written, non-imported resources since the last reset.
    #[inline]
    pub fn uninitialized_reads(&self) -> &[UninitializedRead] {
        &self.uninitialized_reads
    }

    /// Whether `handle` is the current version of a resource of this frame.
    pub fn is_valid(&self, handle: ResourceHandle) -> bool {
        handle.is_initialized()
            && handle.epoch == self.epoch
            && self
                .slots
                .get(handle.index as usize)
                .is_some_and(|slot| !slot.is_forwarded() && slot.version == handle.version)
    }

    /// Descriptor of the resource `handle` resolves to, stale or not.
    pub fn descriptor(&self, handle: ResourceHandle) -> Option<&R::Descriptor> {
        self.lookup(handle).map(|rid| &self.resources[rid as usize].descriptor)
    }

    /// Name of the resource `handle` resolves to, stale or not.
    pub fn name(&self, handle: ResourceHandle) -> Option<&str> {
        self.lookup(handle).map(|rid| self.resources[rid as usize].name.as_str())
    }

    /// Bring an externally owned resource into the graph, usable in any way.
    #[must_use]
    pub fn import(&mut self, name: &str, descriptor: R::Descriptor, resource: R::Concrete) -> ResourceHandle {
        self.import_with_usage(name, descriptor, R::Usage::all(), resource)
    }

    /// Bring an externally owned resource into the graph.
    ///
    /// Reads and writes must stay within `usage`. Writing it makes the writer
    /// a target, since the result is visible outside the frame graph.
    #[must_use]
    pub fn import_with_usage(
        &mut self,
        name: &str,
        descriptor: R::Descriptor,
        usage: R::Usage,
        resource: R::Concrete,
    ) -> ResourceHandle {
        if !self.check_building() {
            return ResourceHandle::INVALID;
        }

        self.add_resource(VirtualResource::imported(name, descriptor, usage, resource), None)
    }

    /// Declare a pass.
    ///
    /// `setup` runs immediately and declares the pass's resources through the
    /// builder, storing whatever handles it publishes in the pass data. The
    /// data is returned to the caller and handed to `execute`, which runs
    /// during [`execute`](Self::execute) unless the pass gets culled.
    pub fn add_pass<D, Setup, Exec>(&mut self, name: &str, setup: Setup, execute: Exec) -> D
    where
        D: Clone + Default + 'static,
        Setup: FnOnce(&mut PassBuilder<'_, R, S>, &mut D),
        Exec: FnOnce(&ResourceView<'_, R>, &D, &mut S) + 'static,
    {
        if !self.check_building() {
            return D::default();
        }

        let pass = self.passes.len() as PassIndex;
        let node = self.graph.add_node(NodeOwner::Pass(pass));
        self.passes.push(PassNode::new(name, node));
        self.executors.push(None);

        let mut data = D::default();
        {
            let mut builder = PassBuilder::new(self, pass);
            setup(&mut builder, &mut data);
        }

        let captured = data.clone();
        self.executors[pass as usize] = Some(Box::new(
            move |view: &ResourceView<'_, R>, driver: &mut S| execute(view, &captured, driver),
        ));

        data
    }

    /// Declare a pass that always runs, declares nothing and keeps no data.
    pub fn add_trivial_side_effect_pass<Exec>(&mut self, name: &str, execute: Exec)
    where
        Exec: FnOnce(&ResourceView<'_, R>, &mut S) + 'static,
    {
        self.add_pass::<(), _, _>(
            name,
            |builder, _| builder.side_effect(),
            move |view, _, driver| execute(view, driver),
        );
    }

    /// Keep `handle` alive to the end of the frame, e.g. a swapchain image.
    pub fn present(&mut self, handle: ResourceHandle) {
        self.add_pass::<(), _, _>(
            "Present",
            |builder, _| {
                let _ = builder.read(handle, R::Usage::empty());
                builder.side_effect();
            },
            |_, _, _| {},
        );
    }

    /// Make `replaced` an alias of `resource`.
    ///
    /// Every pass that used `replaced` ends up using the concrete object of
    /// `resource`, and the passes writing `replaced` survive whenever
    /// `resource` does. `replaced` is invalid from now on, forever.
    pub fn forward_resource(&mut self, resource: ResourceHandle, replaced: ResourceHandle) -> ResourceHandle {
        if !self.check_building() || !self.assert_valid(resource) || !self.assert_valid(replaced) {
            return ResourceHandle::INVALID;
        }

        if resource.index == replaced.index {
            let resource = self.resource_name(resource).to_owned();
            self.report(FrameGraphError::ForwardToSelf { resource });
            return ResourceHandle::INVALID;
        }

        let source = self.resource_nodes[self.active_node_index(resource) as usize].node;
        let replaced_nid = self.active_node_index(replaced) as usize;
        self.resource_nodes[replaced_nid].set_forward_resource_dependency(&mut self.graph, source);

        let rid = self.slots[resource.index as usize].rid;
        let slot = &mut self.slots[replaced.index as usize];
        slot.rid = rid;
        slot.version = FORWARDED_VERSION;

        trace!("Forwarded {:?} to resource [{}]", replaced, self.resources[rid as usize].name);
        resource
    }

    /// Cull passes that contribute to no target and assign resource lifetimes.
    #[profiling::function]
    pub fn compile(&mut self) -> Result<(), anyhow::Error> {
        self.check_state(FrameGraphState::Building)?;

        if self.config.check_acyclic {
            if let Some(node) = self.graph.find_cycle() {
                anyhow::bail!("Frame graph dependencies contain a cycle through [{}]!", self.node_name(node));
            }
        }

        debug_assert_eq!(self.graph.node_count(), self.passes.len() + self.resource_nodes.len());
        self.graph.cull();

        self.active_passes = self
            .passes
            .iter()
            .enumerate()
            .filter(|(_, pass)| !pass.is_culled(&self.graph))
            .map(|(index, _)| index as PassIndex)
            .collect();

        // Reference counts come from edges of surviving passes only.
        for i in 0..self.active_passes.len() {
            let pass = self.active_passes[i];
            let pass_node = self.passes[pass as usize].node;

            let reads: SmallVec<[NodeId; 8]> = self
                .graph
                .incoming_edges(pass_node)
                .inspect(|edge| debug_assert!(self.graph.is_edge_valid(*edge)))
                .map(|edge| self.graph.edge(edge).from)
                .collect();

            // A write edge may lead to a culled version, the pass still touches it.
            let writes: SmallVec<[NodeId; 8]> = self
                .graph
                .outgoing_edges(pass_node)
                .map(|edge| self.graph.edge(edge).to)
                .collect();

            for node in reads {
                self.register_resource(pass, node, AccessKind::Read);
            }
            for node in writes {
                self.register_resource(pass, node, AccessKind::Write);
            }

            self.passes[pass as usize].resolve();
        }

        for (rid, resource) in self.resources.iter().enumerate() {
            if resource.ref_count == 0 {
                continue;
            }

            debug_assert_eq!(resource.first.is_some(), resource.last.is_some());
            if let (Some(first), Some(last)) = (resource.first, resource.last) {
                debug_assert!(!self.passes[first as usize].is_culled(&self.graph));
                debug_assert!(!self.passes[last as usize].is_culled(&self.graph));

                self.passes[first as usize].devirtualize.push(rid as ResourceIndex);
                self.passes[last as usize].destroy.push(rid as ResourceIndex);
            }
        }

        for nid in 0..self.resource_nodes.len() {
            let rid = self.resource_index(self.resource_nodes[nid].handle);
            if self.resources[rid as usize].ref_count == 0 {
                continue;
            }

            let usage = self.resource_nodes[nid].resolve_usage(&self.graph);
            let mut rid = Some(rid);
            while let Some(index) = rid {
                let resource = &mut self.resources[index as usize];
                resource.usage = resource.usage.union(usage);
                rid = resource.parent();
            }
        }

        self.state = FrameGraphState::Compiled;
        debug!("Frame graph compiled: {}", self.stats());

        Ok(())
    }

    /// Run every surviving pass in declaration order.
    ///
    /// Resources are devirtualized right before their first pass and
    /// destroyed right after their last one. If the allocator fails, every
    /// resource still alive is destroyed before the error is returned.
    #[profiling::function]
    pub fn execute<A: ResourceAllocator<R>>(&mut self, allocator: &mut A, driver: &mut S) -> Result<(), anyhow::Error> {
        self.check_state(FrameGraphState::Compiled)?;
        self.state = FrameGraphState::Executed;

        let markers = self.config.debug_markers;
        if markers {
            driver.push_group_marker(&self.config.frame_marker);
        }

        let result = self.execute_passes(allocator, driver);
        if result.is_err() {
            self.release_live_resources(allocator);
        }

        if markers {
            driver.pop_group_marker();
        }
        driver.flush();

        result
    }

    fn execute_passes<A: ResourceAllocator<R>>(&mut self, allocator: &mut A, driver: &mut S) -> Result<(), anyhow::Error> {
        let markers = self.config.debug_markers;

        for i in 0..self.active_passes.len() {
            let pass = self.active_passes[i] as usize;
            debug_assert!(!self.passes[pass].is_culled(&self.graph));

            profiling::scope!("framegraph::pass", &self.passes[pass].name);
            if markers {
                driver.push_group_marker(&self.passes[pass].name);
            }

            let devirtualized = self.devirtualize_pass_resources(pass, allocator);
            if let Err(err) = devirtualized {
                if markers {
                    driver.pop_group_marker();
                }
                return Err(err);
            }

            if let Some(job) = self.executors[pass].take() {
                let view = ResourceView::new(&self.slots, &self.resources, &self.passes[pass], self.epoch);
                job(&view, driver);
            } else {
                warn!("Missing execute job of pass {}!", self.passes[pass].name);
            }

            for j in 0..self.passes[pass].destroy.len() {
                let rid = self.passes[pass].destroy[j] as usize;
                debug_assert_eq!(self.resources[rid].last, Some(pass as PassIndex));
                trace!("Destroy [{}] after pass [{}]", self.resources[rid].name, self.passes[pass].name);
                self.resources[rid].destroy(allocator);
            }

            if markers {
                driver.pop_group_marker();
            }
        }

        Ok(())
    }

    fn devirtualize_pass_resources<A: ResourceAllocator<R>>(&mut self, pass: usize, allocator: &mut A) -> Result<(), anyhow::Error> {
        for j in 0..self.passes[pass].devirtualize.len() {
            let rid = self.passes[pass].devirtualize[j] as usize;
            debug_assert_eq!(self.resources[rid].first, Some(pass as PassIndex));

            let parent = self.resources[rid]
                .parent()
                .and_then(|parent| self.resources[parent as usize].concrete.clone());

            let resource = &mut self.resources[rid];
            trace!("Devirtualize [{}] before pass [{}]", resource.name, self.passes[pass].name);
            resource
                .devirtualize(allocator, parent.as_ref())
                .with_context(|| format!("Failed to devirtualize [{}] for pass [{}]", resource.name, self.passes[pass].name))?;
        }

        Ok(())
    }

    fn release_live_resources<A: ResourceAllocator<R>>(&mut self, allocator: &mut A) {
        for resource in &mut self.resources {
            if resource.is_live() {
                warn!("Releasing [{}] after a failed frame", resource.name);
            }
            resource.destroy(allocator);
        }
    }

    /// Drop everything declared this frame. Every outstanding handle becomes invalid.
    pub fn reset(&mut self) {
        debug_assert!(
            self.resources.iter().all(|resource| !resource.is_live()),
            "Frame graph reset with live resources!"
        );

        self.graph.clear();
        self.slots.clear();
        self.resources.clear();
        self.resource_nodes.clear();
        self.passes.clear();
        self.executors.clear();
        self.active_passes.clear();
        self.blackboard.clear();
        self.errors.clear();
        self.uninitialized_reads.clear();

        self.epoch = self.epoch.wrapping_add(1);
        self.state = FrameGraphState::Building;
    }

    pub fn stats(&self) -> FrameGraphStats {
        FrameGraphStats {
            passes: self.passes.len(),
            culled_passes: self.passes.iter().filter(|pass| pass.is_culled(&self.graph)).count(),
            resources: self.resources.len(),
            live_resources: self.resources.iter().filter(|resource| resource.ref_count > 0).count(),
            resource_nodes: self.resource_nodes.len(),
            edges: self.graph.edge_count(),
        }
    }

    /// First pass declared with `name`.
    pub fn pass(&self, name: &str) -> Option<PassInfo<'_>> {
        self.passes
            .iter()
            .position(|pass| pass.name == name)
            .map(|index| self.pass_info(index))
    }

    /// All passes in declaration order.
    pub fn passes(&self) -> impl Iterator<Item = PassInfo<'_>> {
        (0..self.passes.len()).map(|index| self.pass_info(index))
    }

    fn pass_info(&self, index: usize) -> PassInfo<'_> {
        let pass = &self.passes[index];

        PassInfo {
            name: &pass.name,
            culled: pass.is_culled(&self.graph),
            target: pass.is_target(&self.graph),
            devirtualize: self.resource_names(&pass.devirtualize),
            destroy: self.resource_names(&pass.destroy),
        }
    }

    fn resource_names(&self, list: &[ResourceIndex]) -> SmallVec<[&str; 4]> {
        list.iter()
            .map(|rid| self.resources[*rid as usize].name.as_str())
            .collect()
    }
}

// Declaration internals used by the pass builder.
impl<R: GraphResource, S: DriverSink> FrameGraph<R, S> {
    pub(crate) fn report(&mut self, error: FrameGraphError) {
        error!("{error}");
        self.errors.push(error);
    }

    fn check_state(&self, expected: FrameGraphState) -> Result<(), FrameGraphError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(FrameGraphError::InvalidState {
                expected,
                found: self.state,
            })
        }
    }

    pub(crate) fn check_building(&mut self) -> bool {
        match self.check_state(FrameGraphState::Building) {
            Ok(()) => true,
            Err(err) => {
                self.report(err);
                false
            }
        }
    }

    /// Non-fatal validity check for public entry points.
    pub(crate) fn assert_valid(&mut self, handle: ResourceHandle) -> bool {
        if self.is_valid(handle) {
            true
        } else {
            self.report(FrameGraphError::InvalidHandle { handle });
            false
        }
    }

    /// Slot lookup that ignores versions, so forwarded handles still resolve.
    pub(crate) fn lookup(&self, handle: ResourceHandle) -> Option<ResourceIndex> {
        if !handle.is_initialized() || handle.epoch != self.epoch {
            return None;
        }
        self.slots.get(handle.index as usize).map(|slot| slot.rid)
    }

    #[inline]
    pub(crate) fn resource_index(&self, handle: ResourceHandle) -> ResourceIndex {
        self.slots[handle.index as usize].rid
    }

    #[inline]
    pub(crate) fn active_node_index(&self, handle: ResourceHandle) -> ResourceNodeIndex {
        let slot = &self.slots[handle.index as usize];
        debug_assert!((slot.nid as usize) < self.resource_nodes.len());
        slot.nid
    }

    #[inline]
    pub(crate) fn resource_name(&self, handle: ResourceHandle) -> &str {
        &self.resources[self.resource_index(handle) as usize].name
    }

    /// Pass name or resource name behind a dependency graph node.
    pub(crate) fn node_name(&self, node: NodeId) -> &str {
        match *self.graph.node(node) {
            NodeOwner::Pass(pass) => &self.passes[pass as usize].name,
            NodeOwner::Resource(nid) => self.resource_name(self.resource_nodes[nid as usize].handle),
        }
    }

    /// Current node of the parent resource of a subresource node.
    fn parent_node_index(&self, nid: ResourceNodeIndex) -> Option<ResourceNodeIndex> {
        self.resource_nodes[nid as usize]
            .parent
            .map(|parent| self.active_node_index(parent))
    }

    fn add_resource(&mut self, resource: VirtualResource<R>, parent: Option<ResourceHandle>) -> ResourceHandle {
        let handle = ResourceHandle::new(self.slots.len() as u32, self.epoch);
        let rid = self.resources.len() as ResourceIndex;
        let nid = self.resource_nodes.len() as ResourceNodeIndex;

        let node = self.graph.add_node(NodeOwner::Resource(nid));
        self.resources.push(resource);
        self.resource_nodes.push(ResourceNode::new(handle, parent, node));
        self.slots.push(ResourceSlot::new(rid, nid));

        handle
    }

    pub(crate) fn create_resource(&mut self, name: &str, descriptor: R::Descriptor) -> ResourceHandle {
        self.add_resource(VirtualResource::owned(name, descriptor), None)
    }

    pub(crate) fn create_sub_resource(
        &mut self,
        parent: ResourceHandle,
        name: &str,
        descriptor: R::SubResourceDescriptor,
    ) -> ResourceHandle {
        if !self.assert_valid(parent) {
            return ResourceHandle::INVALID;
        }

        let parent_rid = self.resource_index(parent);
        let resource = VirtualResource::sub_resource(
            name,
            parent_rid,
            &self.resources[parent_rid as usize].descriptor,
            descriptor,
        );

        self.add_resource(resource, Some(parent))
    }

    /// Switch the slot of `handle` to a fresh node one version higher.
    fn create_new_version(&mut self, handle: ResourceHandle) -> ResourceHandle {
        let nid = self.active_node_index(handle);
        let parent = self.resource_nodes[nid as usize].parent;

        let new_nid = self.resource_nodes.len() as ResourceNodeIndex;
        let slot = &mut self.slots[handle.index as usize];
        let new_handle = handle.with_version(slot.next_version());
        slot.nid = new_nid;

        let node = self.graph.add_node(NodeOwner::Resource(new_nid));
        self.resource_nodes.push(ResourceNode::new(new_handle, parent, node));

        new_handle
    }

    /// Give the parent of a written subresource a node for the pending write.
    ///
    /// Only the first subresource write of a batch creates one. The previous
    /// node is parked in the slot and reads resolve to it until one consumes it.
    /// The parent's handle version does not change, so its handles stay usable.
    fn create_new_version_for_sub_resource_if_needed(&mut self, parent_nid: ResourceNodeIndex) -> ResourceNodeIndex {
        let parent_node = &self.resource_nodes[parent_nid as usize];
        let (handle, grand_parent) = (parent_node.handle, parent_node.parent);

        let new_nid = self.resource_nodes.len() as ResourceNodeIndex;
        let slot = &mut self.slots[handle.index as usize];
        if slot.pending_read_nid.is_some() {
            return parent_nid;
        }

        slot.pending_read_nid = Some(slot.nid);
        slot.nid = new_nid;
        let current = handle.with_version(slot.version);

        let node = self.graph.add_node(NodeOwner::Resource(new_nid));
        self.resource_nodes.push(ResourceNode::new(current, grand_parent, node));

        new_nid
    }

    /// Whether the content seen through `nid` was produced by someone.
    fn has_initialized_content(&self, mut nid: ResourceNodeIndex) -> bool {
        loop {
            let node = &self.resource_nodes[nid as usize];
            if node.is_produced(&self.graph) || self.resources[self.resource_index(node.handle) as usize].is_imported() {
                return true;
            }

            match self.parent_node_index(nid) {
                Some(parent) => nid = parent,
                None => return false,
            }
        }
    }

    pub(crate) fn read(&mut self, pass: PassIndex, handle: ResourceHandle, usage: R::Usage) -> ResourceHandle {
        if !self.check_building() || !self.assert_valid(handle) {
            return ResourceHandle::INVALID;
        }

        let rid = self.resource_index(handle) as usize;
        let nid = self.active_node_index(handle);

        if self.resource_nodes[nid as usize].has_write_from(pass) {
            let pass = self.passes[pass as usize].name.clone();
            let resource = self.resources[rid].name.clone();
            self.report(FrameGraphError::PassAlreadyWrites { pass, resource });
            return ResourceHandle::INVALID;
        }

        // A repeated read by the same pass was already reported.
        let repeated = self.resource_nodes[nid as usize].reader_for(pass).is_some();
        if !repeated && !self.has_initialized_content(nid) {
            let read = UninitializedRead {
                pass: self.passes[pass as usize].name.clone(),
                resource: self.resources[rid].name.clone(),
            };

            match self.config.uninitialized_reads {
                UninitializedReadPolicy::Allow => {}
                UninitializedReadPolicy::Warn => {
                    warn!("Pass [{}] reads [{}] before anything writes it!", read.pass, read.resource);
                }
                UninitializedReadPolicy::Reject => {
                    self.uninitialized_reads.push(read.clone());
                    self.report(FrameGraphError::UninitializedRead {
                        pass: read.pass,
                        resource: read.resource,
                    });
                    return ResourceHandle::INVALID;
                }
            }
            self.uninitialized_reads.push(read);
        }

        if !self.resources[rid].accepts_usage(usage) {
            let resource = self.resources[rid].name.clone();
            self.report(FrameGraphError::UsageNotDeclared {
                resource,
                usage: format!("{usage:?}"),
            });
            return ResourceHandle::INVALID;
        }

        let pass_node = self.passes[pass as usize].node;
        self.resource_nodes[nid as usize].connect_reader(&mut self.graph, pass, pass_node, usage);

        if self.resources[rid].is_sub_resource() {
            // Reads of the subresource need the parent content from before any
            // pending subresource write.
            if let Some(parent_nid) = self.parent_node_index(nid) {
                let parent_handle = self.resource_nodes[parent_nid as usize].handle;
                let parent_nid = self.slots[parent_handle.index as usize]
                    .pending_read_nid
                    .unwrap_or(parent_nid);
                let parent_node = self.resource_nodes[parent_nid as usize].node;
                self.resource_nodes[nid as usize].set_parent_read_dependency(&mut self.graph, parent_node);
            }
        } else if let Some(pending) = self.slots[handle.index as usize].pending_read_nid {
            // The current version of a parent also carries what it held before
            // its subresources were written.
            let pending_node = self.resource_nodes[pending as usize].node;
            self.resource_nodes[nid as usize].set_parent_read_dependency(&mut self.graph, pending_node);
        }

        self.slots[handle.index as usize].pending_read_nid = None;

        handle
    }

    pub(crate) fn write(&mut self, pass: PassIndex, handle: ResourceHandle, usage: R::Usage) -> ResourceHandle {
        if !self.check_building() || !self.assert_valid(handle) {
            return ResourceHandle::INVALID;
        }

        let rid = self.resource_index(handle) as usize;
        let mut handle = handle;
        let mut nid = self.active_node_index(handle);

        let mut parent_nid = self.parent_node_index(nid);
        if self.resources[rid].is_sub_resource() {
            debug_assert!(parent_nid.is_some(), "Subresource node without parent!");
            parent_nid = parent_nid.map(|parent| self.create_new_version_for_sub_resource_if_needed(parent));
        }

        let node = &self.resource_nodes[nid as usize];
        if !node.has_write_from(pass) && (node.has_writer_pass() || node.has_readers()) {
            handle = self.create_new_version(handle);
            nid = self.active_node_index(handle);
        }

        // TODO: undo the version bump above when the usage is rejected.
        if !self.resources[rid].accepts_usage(usage) {
            let resource = self.resources[rid].name.clone();
            self.report(FrameGraphError::UsageNotDeclared {
                resource,
                usage: format!("{usage:?}"),
            });
            return ResourceHandle::INVALID;
        }

        let pass_node = self.passes[pass as usize].node;
        self.resource_nodes[nid as usize].connect_writer(&mut self.graph, pass, pass_node, usage);

        if let (true, Some(parent_nid)) = (self.resources[rid].is_sub_resource(), parent_nid) {
            let parent_node = self.resource_nodes[parent_nid as usize].node;
            self.resource_nodes[nid as usize].set_parent_write_dependency(&mut self.graph, parent_node);
        }

        if self.resources[rid].is_imported() {
            self.passes[pass as usize].make_target(&mut self.graph);
        }

        handle
    }

    pub(crate) fn side_effect(&mut self, pass: PassIndex) {
        self.passes[pass as usize].make_target(&mut self.graph);
    }

    fn register_resource(&mut self, pass: PassIndex, node: NodeId, access: AccessKind) {
        let NodeOwner::Resource(nid) = *self.graph.node(node) else {
            debug_assert!(false, "Pass edge does not lead to a resource node!");
            return;
        };

        let resource_node = &self.resource_nodes[nid as usize];
        let handle = resource_node.handle;
        let usage = match access {
            AccessKind::Read => resource_node.reader_for(pass).map(|edge| edge.usage),
            AccessKind::Write => resource_node.writer().map(|edge| edge.usage),
        }
        .unwrap_or_else(R::Usage::empty);

        let mut rid = Some(self.resource_index(handle));
        while let Some(index) = rid {
            let resource = &mut self.resources[index as usize];
            resource.needed_by_pass(pass);
            rid = resource.parent();
        }

        self.passes[pass as usize].register_resource(handle, access, usage);
    }
}
