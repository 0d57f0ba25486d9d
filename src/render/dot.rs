use std::collections::HashSet;

use crate::config::{RenderOptions, is_shape_name};
use crate::constants::{DOT_GRAPH_NAME, colors};
use crate::graph::{DependencyGraph, ServiceRole};

/// Quote a name for use as a DOT identifier.
fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Attribute values from settings stay bare when they are plain identifiers.
fn attribute(value: &str) -> String {
    if is_shape_name(value) {
        value.to_string()
    } else {
        quote(value)
    }
}

/// Render `graph` as a Graphviz digraph.
///
/// Edges point from a dependency to the service that uses it. Services on a
/// cycle are drawn in red with a warning label, and the edges of each cycle
/// are drawn thick and red. A legend is added only when there are cycles.
pub fn dot_graph(graph: &DependencyGraph, options: &RenderOptions) -> String {
    let cycles = graph.all_cycles();

    let mut cycle_nodes: HashSet<&str> = HashSet::new();
    // (service, dependency) pairs, in recorded direction
    let mut cycle_edges: HashSet<(&str, &str)> = HashSet::new();
    for cycle in &cycles {
        for pair in cycle.windows(2) {
            cycle_nodes.insert(pair[0].as_str());
            cycle_edges.insert((pair[0].as_str(), pair[1].as_str()));
        }
    }

    let mut result = String::new();
    result.push_str(&format!("digraph {DOT_GRAPH_NAME} {{\n"));
    result.push_str(&format!("  rankdir={};\n", attribute(&options.rankdir)));
    result.push_str(&format!("  node [shape={}, style=filled];\n", attribute(&options.node_shape)));

    result.push_str("\n  // services\n");
    for service in graph.services() {
        let id = quote(service);
        if cycle_nodes.contains(service) {
            result.push_str(&format!(
                "  {id} [fillcolor={}, label={}];\n",
                colors::CYCLE,
                quote(&format!("⚠️ {service}"))
            ));
            continue;
        }
        match graph.role(service) {
            ServiceRole::Root => result.push_str(&format!(
                "  {id} [fillcolor={}, label={}];\n",
                colors::ROOT,
                quote(&format!("🌱 {service}"))
            )),
            ServiceRole::Leaf => result.push_str(&format!(
                "  {id} [fillcolor={}, label={}];\n",
                colors::LEAF,
                quote(&format!("🍃 {service}"))
            )),
            ServiceRole::Intermediate => {
                result.push_str(&format!("  {id} [fillcolor={}];\n", colors::MIDDLE));
            }
        }
    }

    result.push_str("\n  // dependencies\n");
    for service in graph.services() {
        for dep in graph.dependencies_of(service) {
            if cycle_edges.contains(&(service, dep.as_str())) {
                result.push_str(&format!(
                    "  {} -> {} [color=red, penwidth=2.0, label=\"⚠️\"];\n",
                    quote(dep),
                    quote(service)
                ));
            } else {
                result.push_str(&format!("  {} -> {};\n", quote(dep), quote(service)));
            }
        }
    }

    if !cycles.is_empty() {
        result.push_str("\n  // legend\n");
        result.push_str(&format!(
            "  legend [shape=box, style=filled, fillcolor={}, label=\"",
            colors::LEAF
        ));
        result.push_str("Legend:\\n");
        result.push_str("🌱 = root service (no dependencies)\\n");
        result.push_str("🍃 = leaf service (no dependents)\\n");
        result.push_str("⚠️ = service on a cycle\\n");
        result.push_str("red edge = cyclic dependency");
        result.push_str("\"];\n");
    }

    result.push_str("}\n");
    result
}
