use std::io;
use crate::dependency_graph::{Edge, NodeId};
use crate::graph::{FrameGraph, NodeOwner};
use crate::interface::DriverSink;
use crate::resource::GraphResource;

impl<R: GraphResource, S: DriverSink> FrameGraph<R, S> {
    /// Write the dependency graph in Graphviz dot format.
    ///
    /// Passes are boxes, resource versions are ellipses. Write edges are red,
    /// read edges green and edges between resource versions dashed. Culled
    /// nodes are drawn grey. Call after `compile` to see the culling result.
    pub fn export_graphviz<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "digraph framegraph {{")?;
        writeln!(out, "    rankdir = LR")?;
        writeln!(out, "    bgcolor = white")?;
        writeln!(out, "    node [fontname=\"helvetica\", fontsize=10]")?;

        let statements = self.graph.dot_statements(
            |node, owner| self.node_attributes(node, *owner),
            |edge, endpoints| self.edge_attributes(self.graph.is_edge_valid(edge), endpoints),
        );
        out.write_all(statements.as_bytes())?;

        writeln!(out, "}}")
    }

    fn node_attributes(&self, node: NodeId, owner: NodeOwner) -> String {
        let culled = self.graph.is_culled(node);
        match owner {
            NodeOwner::Pass(pass) => {
                let style = match (culled, self.graph.is_target(node)) {
                    (true, _) => "filled, dashed",
                    (false, true) => "filled, bold",
                    (false, false) => "filled",
                };
                format!(
                    "label=\"{}\", shape=box, style=\"{style}\", fillcolor={}",
                    escape(&self.passes[pass as usize].name),
                    if culled { "lightgrey" } else { "darkorange" },
                )
            }
            NodeOwner::Resource(nid) => {
                let handle = self.resource_nodes[nid as usize].handle;
                let resource = &self.resources[self.resource_index(handle) as usize];
                let kind = if resource.is_imported() {
                    ", imported"
                } else if resource.is_sub_resource() {
                    ", sub"
                } else {
                    ""
                };
                format!(
                    "label=\"{}\\nv{}{kind}\\nrefs: {}\", shape=ellipse, style=filled, fillcolor={}",
                    escape(&resource.name),
                    handle.version,
                    resource.ref_count,
                    if culled { "lightgrey" } else { "skyblue" },
                )
            }
        }
    }

    fn edge_attributes(&self, valid: bool, edge: Edge) -> String {
        let from_pass = matches!(self.graph.node(edge.from), NodeOwner::Pass(_));
        let to_pass = matches!(self.graph.node(edge.to), NodeOwner::Pass(_));

        let (color, style) = match (from_pass, to_pass) {
            (true, _) => ("red", "solid"),
            (_, true) => ("darkgreen", "solid"),
            _ => ("black", "dashed"),
        };
        let color = if valid { color } else { "grey" };

        format!("color={color}, style={style}")
    }
}

fn escape(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}
