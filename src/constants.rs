//! Constants shared across weave.
//!
//! Rendering defaults live here so the config layer and the DOT renderer
//! agree on them without depending on each other.

/// Default Graphviz layout direction.
pub const DEFAULT_RANKDIR: &str = "TB";

/// Default Graphviz node shape.
pub const DEFAULT_NODE_SHAPE: &str = "box";

/// Name of the digraph emitted by the DOT renderer.
pub const DOT_GRAPH_NAME: &str = "DependencyGraph";

/// Separator used when a cycle or path is printed on one line.
pub const PATH_SEPARATOR: &str = " -> ";

/// Fill colors for DOT nodes, by category.
pub mod colors {
    /// Nodes that take part in a cycle.
    pub const CYCLE: &str = "lightcoral";
    /// Services with dependents but no dependencies.
    pub const ROOT: &str = "lightgreen";
    /// Services with dependencies but no dependents.
    pub const LEAF: &str = "lightyellow";
    /// Everything else.
    pub const MIDDLE: &str = "lightblue";
}
