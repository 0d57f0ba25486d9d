//! Human-readable views of a [`DependencyGraph`](crate::graph::DependencyGraph).
//!
//! - [`text_report`]: a plain-text summary grouped by service role
//! - [`dot_graph`]: a Graphviz digraph with cycles highlighted
//!
//! Neither format is meant to be parsed back.

mod dot;
mod text;

pub use dot::dot_graph;
pub use text::text_report;
