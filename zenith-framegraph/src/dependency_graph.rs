//! Directed graph of passes and resource versions, with reachability culling.
//!
//! Edges point the way data flows: a pass writing a resource version is an
//! edge `pass -> resource`, a pass reading it is `resource -> pass`.

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::dot::{Config, Dot};
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;

pub type NodeId = NodeIndex<u32>;
pub type EdgeId = EdgeIndex<u32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
}

struct NodeEntry<N> {
    payload: N,
    target: bool,
    culled: bool,
}

/// Nodes are never removed during a frame, so ids stay dense and stable
/// until [`clear`](Self::clear).
pub struct DependencyGraph<N> {
    graph: StableDiGraph<NodeEntry<N>, Edge>,
}

impl<N> Default for DependencyGraph<N> {
    fn default() -> Self {
        Self {
            graph: StableDiGraph::default(),
        }
    }
}

impl<N> DependencyGraph<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, payload: N) -> NodeId {
        self.graph.add_node(NodeEntry {
            payload,
            target: false,
            culled: false,
        })
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> EdgeId {
        debug_assert!(self.graph.contains_node(from), "Edge source {from:?} does not exist!");
        debug_assert!(self.graph.contains_node(to), "Edge destination {to:?} does not exist!");

        self.graph.add_edge(from, to, Edge { from, to })
    }

    /// Mark `node` as a culling root.
    pub fn make_target(&mut self, node: NodeId) {
        self.graph[node].target = true;
    }

    #[inline]
    pub fn is_target(&self, node: NodeId) -> bool {
        self.graph[node].target
    }

    /// Whether the last [`cull`](Self::cull) removed `node`. False before any cull.
    #[inline]
    pub fn is_culled(&self, node: NodeId) -> bool {
        self.graph[node].culled
    }

    #[inline]
    pub fn node(&self, node: NodeId) -> &N {
        &self.graph[node].payload
    }

    #[inline]
    pub fn edge(&self, edge: EdgeId) -> Edge {
        self.graph[edge]
    }

    pub fn incoming_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.graph
            .edges_directed(node, Direction::Incoming)
            .map(|edge| edge.id())
    }

    pub fn outgoing_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .map(|edge| edge.id())
    }

    /// An edge is valid when neither of its endpoints has been culled.
    pub fn is_edge_valid(&self, edge: EdgeId) -> bool {
        let Edge { from, to } = self.edge(edge);
        !self.is_culled(from) && !self.is_culled(to)
    }

    /// Cull every node from which no target can be reached.
    ///
    /// Walks edges backwards from the targets; whatever is not visited is culled.
    #[profiling::function]
    pub fn cull(&mut self) {
        let mut stack: Vec<NodeId> = Vec::with_capacity(self.graph.node_count());

        for node in self.graph.node_indices().collect::<Vec<_>>() {
            let entry = &mut self.graph[node];
            entry.culled = !entry.target;
            if entry.target {
                stack.push(node);
            }
        }

        while let Some(node) = stack.pop() {
            let sources: Vec<NodeId> = self
                .graph
                .neighbors_directed(node, Direction::Incoming)
                .collect();

            for from in sources {
                let entry = &mut self.graph[from];
                if entry.culled {
                    entry.culled = false;
                    stack.push(from);
                }
            }
        }
    }

    /// A node that lies on a cycle, if there is any.
    pub fn find_cycle(&self) -> Option<NodeId> {
        toposort(&self.graph, None).err().map(|cycle| cycle.node_id())
    }

    /// Graphviz statements for every node and edge, without the enclosing
    /// `digraph` block. The closures return the attribute list of each
    /// statement.
    pub fn dot_statements(
        &self,
        node_attributes: impl Fn(NodeId, &N) -> String,
        edge_attributes: impl Fn(EdgeId, Edge) -> String,
    ) -> String {
        let styled = self.graph.map(
            |node, entry| node_attributes(node, &entry.payload),
            |edge, weight| edge_attributes(edge, *weight),
        );

        Dot::with_attr_getters(
            &styled,
            &[Config::NodeNoLabel, Config::EdgeNoLabel, Config::GraphContentOnly],
            &|_, edge| edge.weight().clone(),
            &|_, (_, attributes)| attributes.clone(),
        )
        .to_string()
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn clear(&mut self) {
        self.graph.clear();
    }
}
