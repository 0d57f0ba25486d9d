//! Dependency graph analysis.
//!
//! The container records an edge `service -> dependency` every time a provider
//! requests another service. [`DependencyGraph`] is the snapshot of those edges
//! in both directions. It offers cycle detection and enumeration
//! (see [`cycles`]), plus topological ordering and transitive closure built on
//! `petgraph`.
//!
//! Adjacency lists are sorted but keep duplicates: a provider that asks for
//! the same dependency twice shows it twice, unless the container was
//! configured with `dedupe_edges`.

pub mod cycles;

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

pub use cycles::{deduplicate_cycles, normalize_cycle};

use crate::core::WeaveError;

/// Position of a service in the graph, used for grouping in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceRole {
    /// No dependencies of its own, but other services depend on it.
    Root,
    /// Depends on other services, but nothing depends on it.
    Leaf,
    /// Everything else, including isolated services.
    Intermediate,
}

impl fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => write!(f, "root"),
            Self::Leaf => write!(f, "leaf"),
            Self::Intermediate => write!(f, "intermediate"),
        }
    }
}

/// Forward and reverse adjacency of the recorded dependency edges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyGraph {
    /// For each registered service, the services it requested while building.
    pub dependencies: BTreeMap<String, Vec<String>>,
    /// For each service, the services that requested it.
    pub dependents: BTreeMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Build a graph from `(service, dependencies)` pairs.
    ///
    /// Every service passed in gets an entry in both maps, even with no edges.
    pub fn from_edges<'a, I, D>(edges: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, D)>,
        D: IntoIterator<Item = &'a str>,
    {
        let mut dependencies: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (service, deps) in edges {
            dependencies
                .entry(service.to_string())
                .or_default()
                .extend(deps.into_iter().map(str::to_string));
        }

        let mut dependents: BTreeMap<String, Vec<String>> =
            dependencies.keys().map(|name| (name.clone(), Vec::new())).collect();
        for (service, deps) in &dependencies {
            for dep in deps {
                dependents.entry(dep.clone()).or_default().push(service.clone());
            }
        }

        for list in dependencies.values_mut().chain(dependents.values_mut()) {
            list.sort();
        }

        Self {
            dependencies,
            dependents,
        }
    }

    /// Whether the graph has no services.
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Number of services with an entry in the forward map.
    pub fn service_count(&self) -> usize {
        self.dependencies.len()
    }

    /// Total number of recorded edges, duplicates included.
    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(Vec::len).sum()
    }

    /// Services in sorted order.
    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.dependencies.keys().map(String::as_str)
    }

    /// Direct dependencies of `service` (empty if unknown).
    pub fn dependencies_of(&self, service: &str) -> &[String] {
        self.dependencies.get(service).map_or(&[], Vec::as_slice)
    }

    /// Direct dependents of `service` (empty if unknown).
    pub fn dependents_of(&self, service: &str) -> &[String] {
        self.dependents.get(service).map_or(&[], Vec::as_slice)
    }

    /// Classify `service` by how many edges point in and out of it.
    pub fn role(&self, service: &str) -> ServiceRole {
        let deps = self.dependencies_of(service).len();
        let dependents = self.dependents_of(service).len();
        match (deps, dependents) {
            (0, n) if n > 0 => ServiceRole::Root,
            (n, 0) if n > 0 => ServiceRole::Leaf,
            _ => ServiceRole::Intermediate,
        }
    }

    /// First cycle found by a three-color depth-first search.
    ///
    /// The path follows dependency direction and is closed:
    /// `["a", "b", "a"]` for `a -> b -> a`.
    pub fn detect_cycle(&self) -> Option<Vec<String>> {
        cycles::detect_cycle(&self.dependencies)
    }

    /// Whether any cycle exists.
    pub fn has_cycle(&self) -> bool {
        self.detect_cycle().is_some()
    }

    /// Every distinct cycle, normalized and deduplicated.
    pub fn all_cycles(&self) -> Vec<Vec<String>> {
        cycles::all_cycles(&self.dependencies)
    }

    /// Services that appear in at least one cycle.
    pub fn cyclic_services(&self) -> BTreeSet<String> {
        self.strongly_connected_components().into_iter().flatten().collect()
    }

    /// Groups of services that can all reach each other.
    ///
    /// Only groups that actually form a cycle are returned: components with
    /// more than one service, or a single service that depends on itself.
    /// Each group is sorted, and groups are ordered by their first member.
    pub fn strongly_connected_components(&self) -> Vec<Vec<String>> {
        let graph = self.to_petgraph();
        let mut components: Vec<Vec<String>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component.first().is_some_and(|&idx| graph.contains_edge(idx, idx))
            })
            .map(|component| {
                let mut names: Vec<String> =
                    component.into_iter().map(|idx| graph[idx].to_string()).collect();
                names.sort();
                names
            })
            .collect();
        components.sort();
        components
    }

    /// Services ordered so that every dependency comes before its dependents.
    ///
    /// # Errors
    ///
    /// Returns [`WeaveError::CircularDependency`] with the first detected cycle
    /// when the graph is cyclic.
    pub fn topological_order(&self) -> Result<Vec<String>, WeaveError> {
        if let Some(cycle) = self.detect_cycle() {
            return Err(WeaveError::CircularDependency {
                cycle,
            });
        }

        let graph = self.to_petgraph();
        match toposort(&graph, None) {
            // Edges point at dependencies, so reverse to put them first
            Ok(indices) => Ok(indices.into_iter().rev().map(|idx| graph[idx].to_string()).collect()),
            Err(cycle) => Err(WeaveError::CircularDependency {
                cycle: vec![graph[cycle.node_id()].to_string()],
            }),
        }
    }

    /// All services reachable from `service`, not including `service` itself
    /// unless it sits on a cycle.
    pub fn transitive_dependencies(&self, service: &str) -> BTreeSet<String> {
        let mut deps = BTreeSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(service);

        while let Some(current) = queue.pop_front() {
            for dep in self.dependencies_of(current) {
                if deps.insert(dep.clone()) {
                    queue.push_back(dep);
                }
            }
        }

        deps
    }

    /// Convert to a `petgraph` graph with one edge per distinct pair.
    fn to_petgraph(&self) -> DiGraph<&str, ()> {
        let mut graph = DiGraph::new();
        let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();

        let names = self.dependencies.keys().chain(self.dependents.keys());
        for name in names {
            nodes.entry(name.as_str()).or_insert_with(|| graph.add_node(name.as_str()));
        }

        for (service, deps) in &self.dependencies {
            let from = nodes[service.as_str()];
            for dep in deps {
                let to = nodes[dep.as_str()];
                if !graph.contains_edge(from, to) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&'static str, &[&'static str])]) -> DependencyGraph {
        DependencyGraph::from_edges(edges.iter().map(|(name, deps)| (*name, deps.iter().copied())))
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_from_edges_builds_both_directions() {
        let g = graph(&[("a", &[]), ("b", &["a"]), ("c", &["b", "a"])]);

        assert_eq!(g.dependencies_of("c"), strings(&["a", "b"]).as_slice());
        assert_eq!(g.dependents_of("a"), strings(&["b", "c"]).as_slice());
        assert_eq!(g.dependents_of("c"), &[] as &[String]);
        assert_eq!(g.service_count(), 3);
        assert_eq!(g.edge_count(), 3);
    }

    #[test]
    fn test_reverse_edges_mirror_forward_edges() {
        let g = graph(&[("a", &["b", "c"]), ("b", &["c"]), ("c", &["a"])]);

        for (service, deps) in &g.dependencies {
            for dep in deps {
                assert!(g.dependents_of(dep).contains(service), "{dep} should list {service}");
            }
        }
        for (service, dependents) in &g.dependents {
            for dependent in dependents {
                assert!(g.dependencies_of(dependent).contains(service));
            }
        }
    }

    #[test]
    fn test_duplicate_edges_are_kept() {
        let g = graph(&[("a", &[]), ("b", &["a", "a"])]);
        assert_eq!(g.dependencies_of("b"), strings(&["a", "a"]).as_slice());
        assert_eq!(g.dependents_of("a"), strings(&["b", "b"]).as_slice());
        assert!(!g.has_cycle());
    }

    #[test]
    fn test_roles() {
        let g = graph(&[("db", &[]), ("repo", &["db"]), ("api", &["repo"]), ("lonely", &[])]);

        assert_eq!(g.role("db"), ServiceRole::Root);
        assert_eq!(g.role("api"), ServiceRole::Leaf);
        assert_eq!(g.role("repo"), ServiceRole::Intermediate);
        assert_eq!(g.role("lonely"), ServiceRole::Intermediate);
    }

    #[test]
    fn test_detect_cycle_two_nodes() {
        let g = graph(&[("a", &["b"]), ("b", &["a"])]);

        let cycle = g.detect_cycle().unwrap();
        assert_eq!(cycle, strings(&["a", "b", "a"]));
        assert!(g.has_cycle());
    }

    #[test]
    fn test_no_cycle_in_diamond() {
        let g = graph(&[("a", &[]), ("b", &["a"]), ("c", &["a"]), ("d", &["b", "c"])]);
        assert!(g.detect_cycle().is_none());
        assert!(g.all_cycles().is_empty());
    }

    #[test]
    fn test_self_dependency() {
        let g = graph(&[("a", &["a"])]);
        assert_eq!(g.detect_cycle().unwrap(), strings(&["a", "a"]));
        assert_eq!(g.all_cycles(), vec![strings(&["a", "a"])]);
        assert_eq!(g.strongly_connected_components(), vec![strings(&["a"])]);
    }

    #[test]
    fn test_strongly_connected_components() {
        let g = graph(&[
            ("a", &["b"]),
            ("b", &["c", "d"]),
            ("c", &["a"]),
            ("d", &["b"]),
            ("e", &["a"]),
        ]);

        assert_eq!(g.strongly_connected_components(), vec![strings(&["a", "b", "c", "d"])]);
        assert!(!g.cyclic_services().contains("e"));
    }

    #[test]
    fn test_topological_order() {
        let g = graph(&[("a", &[]), ("b", &["a"]), ("c", &["a", "b"])]);

        let order = g.topological_order().unwrap();
        let pos = |name: &str| order.iter().position(|n| n == name).unwrap();
        assert!(pos("a") < pos("b"));
        assert!(pos("b") < pos("c"));
    }

    #[test]
    fn test_topological_order_rejects_cycles() {
        let g = graph(&[("a", &["b"]), ("b", &["a"])]);

        match g.topological_order() {
            Err(WeaveError::CircularDependency {
                cycle,
            }) => assert_eq!(cycle, strings(&["a", "b", "a"])),
            other => panic!("expected CircularDependency, got {other:?}"),
        }
    }

    #[test]
    fn test_transitive_dependencies() {
        let g = graph(&[("a", &[]), ("b", &["a"]), ("c", &["b"]), ("d", &[])]);

        let deps = g.transitive_dependencies("c");
        assert_eq!(deps.into_iter().collect::<Vec<_>>(), strings(&["a", "b"]));
        assert!(g.transitive_dependencies("d").is_empty());
        assert!(g.transitive_dependencies("unknown").is_empty());
    }

    #[test]
    fn test_serializes_to_json() {
        let g = graph(&[("a", &[]), ("b", &["a"])]);
        let json = serde_json::to_value(&g).unwrap();
        assert_eq!(json["dependencies"]["b"][0], "a");
        assert_eq!(json["dependents"]["a"][0], "b");
    }

    #[test]
    fn test_empty_graph() {
        let g = DependencyGraph::default();
        assert!(g.is_empty());
        assert!(!g.has_cycle());
        assert!(g.topological_order().unwrap().is_empty());
    }
}
