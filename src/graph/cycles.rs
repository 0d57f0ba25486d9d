//! Cycle detection, enumeration and normalization.
//!
//! All functions take the forward adjacency (`service -> dependencies`) and
//! report cycles as closed paths in dependency direction, so `a -> b -> a`
//! comes back as `["a", "b", "a"]`.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::constants::PATH_SEPARATOR;

type Adjacency = BTreeMap<String, Vec<String>>;

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Node has not been visited.
    White,
    /// Node is on the current DFS path.
    Gray,
    /// Node and everything reachable from it has been explored.
    Black,
}

fn neighbors<'g>(dependencies: &'g Adjacency, node: &str) -> &'g [String] {
    dependencies.get(node).map_or(&[], Vec::as_slice)
}

/// Close the cycle that starts where `target` sits on `path`.
fn close_cycle(path: &[&str], target: &str) -> Option<Vec<String>> {
    let start = path.iter().position(|n| *n == target)?;
    let mut cycle: Vec<String> = path[start..].iter().map(|n| (*n).to_string()).collect();
    cycle.push(target.to_string());
    Some(cycle)
}

/// Return the first cycle reachable from any service, in map order.
pub fn detect_cycle(dependencies: &Adjacency) -> Option<Vec<String>> {
    let mut colors: HashMap<&str, Color> =
        dependencies.keys().map(|name| (name.as_str(), Color::White)).collect();
    let mut path: Vec<&str> = Vec::new();

    for node in dependencies.keys() {
        if matches!(colors.get(node.as_str()), Some(Color::White))
            && let Some(cycle) = dfs_visit(dependencies, node, &mut colors, &mut path)
        {
            return Some(cycle);
        }
    }

    None
}

fn dfs_visit<'g>(
    dependencies: &'g Adjacency,
    node: &'g str,
    colors: &mut HashMap<&'g str, Color>,
    path: &mut Vec<&'g str>,
) -> Option<Vec<String>> {
    colors.insert(node, Color::Gray);
    path.push(node);

    for neighbor in neighbors(dependencies, node) {
        match colors.get(neighbor.as_str()).copied().unwrap_or(Color::White) {
            Color::Gray => return close_cycle(path, neighbor),
            Color::White => {
                if let Some(cycle) = dfs_visit(dependencies, neighbor, colors, path) {
                    return Some(cycle);
                }
            }
            Color::Black => {}
        }
    }

    path.pop();
    colors.insert(node, Color::Black);
    None
}

/// Enumerate distinct cycles.
///
/// Every service is used as a DFS root with fresh visit state, and a cycle is
/// recorded each time the search reaches a node already on its path. Roots on
/// the same cycle rediscover it in rotated form, so the results go through
/// [`deduplicate_cycles`].
///
/// This finds every cycle in graphs where cycles share at most one node. In
/// denser graphs a cycle can be hidden behind a node the current root has
/// already finished, so callers that need membership should use
/// [`DependencyGraph::strongly_connected_components`](super::DependencyGraph::strongly_connected_components).
pub fn all_cycles(dependencies: &Adjacency) -> Vec<Vec<String>> {
    let mut found = Vec::new();

    for node in dependencies.keys() {
        let mut colors: HashMap<&str, Color> = HashMap::new();
        let mut path: Vec<&str> = Vec::new();
        collect_cycles(dependencies, node, &mut colors, &mut path, &mut found);
    }

    deduplicate_cycles(found)
}

fn collect_cycles<'g>(
    dependencies: &'g Adjacency,
    node: &'g str,
    colors: &mut HashMap<&'g str, Color>,
    path: &mut Vec<&'g str>,
    found: &mut Vec<Vec<String>>,
) {
    match colors.get(node).copied().unwrap_or(Color::White) {
        Color::Gray => {
            found.extend(close_cycle(path, node));
            return;
        }
        Color::Black => return,
        Color::White => {}
    }

    colors.insert(node, Color::Gray);
    path.push(node);

    for neighbor in neighbors(dependencies, node) {
        collect_cycles(dependencies, neighbor, colors, path, found);
    }

    path.pop();
    colors.insert(node, Color::Black);
}

/// Drop rotations of cycles already seen, keeping first-seen order.
///
/// Sequences of one element or fewer are discarded.
pub fn deduplicate_cycles<I>(cycles: I) -> Vec<Vec<String>>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut result = Vec::new();

    for cycle in cycles {
        if cycle.len() <= 1 {
            continue;
        }

        let normalized = normalize_cycle(&cycle);
        if seen.insert(normalized.join(PATH_SEPARATOR)) {
            result.push(normalized);
        }
    }

    result
}

/// Rotate a cycle so it starts at its lexicographically smallest name.
///
/// A closed path (first name repeated at the end) is rotated without its
/// closing element and closed again afterwards, so `["b", "a", "b"]` becomes
/// `["a", "b", "a"]`. Open sequences are rotated as they are.
pub fn normalize_cycle<S: AsRef<str>>(cycle: &[S]) -> Vec<String> {
    let names: Vec<&str> = cycle.iter().map(AsRef::as_ref).collect();
    if names.len() <= 1 {
        return names.iter().map(|n| (*n).to_string()).collect();
    }

    let closed = names.first() == names.last();
    let ring = if closed {
        &names[..names.len() - 1]
    } else {
        &names[..]
    };

    // min_by_key keeps the first of equal minimums
    let min_idx = ring.iter().enumerate().min_by_key(|&(_, name)| *name).map_or(0, |(idx, _)| idx);

    let mut normalized: Vec<String> =
        ring.iter().cycle().skip(min_idx).take(ring.len()).map(|n| (*n).to_string()).collect();
    if closed && let Some(first) = normalized.first().cloned() {
        normalized.push(first);
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjacency(edges: &[(&str, &[&str])]) -> Adjacency {
        edges
            .iter()
            .map(|(name, deps)| {
                ((*name).to_string(), deps.iter().map(|d| (*d).to_string()).collect())
            })
            .collect()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_normalize_open_rotations() {
        assert_eq!(normalize_cycle(&["B", "C", "A"]), strings(&["A", "B", "C"]));
        assert_eq!(normalize_cycle(&["C", "A", "B"]), strings(&["A", "B", "C"]));
        assert_eq!(normalize_cycle(&["A", "B", "C"]), strings(&["A", "B", "C"]));
    }

    #[test]
    fn test_normalize_closed_cycle() {
        assert_eq!(normalize_cycle(&["b", "c", "a", "b"]), strings(&["a", "b", "c", "a"]));
        assert_eq!(normalize_cycle(&["a", "b", "a"]), strings(&["a", "b", "a"]));
    }

    #[test]
    fn test_normalize_short_sequences() {
        assert!(normalize_cycle::<&str>(&[]).is_empty());
        assert_eq!(normalize_cycle(&["x"]), strings(&["x"]));
    }

    #[test]
    fn test_detect_cycle_path_is_closed_and_forward() {
        let deps = adjacency(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"])]);
        assert_eq!(detect_cycle(&deps).unwrap(), strings(&["a", "b", "c", "a"]));
    }

    #[test]
    fn test_detect_cycle_skips_acyclic_prefix() {
        let deps = adjacency(&[("a", &["b"]), ("b", &["c"]), ("c", &["b"])]);
        assert_eq!(detect_cycle(&deps).unwrap(), strings(&["b", "c", "b"]));
    }

    #[test]
    fn test_detect_cycle_with_unregistered_target() {
        let deps = adjacency(&[("a", &["ghost"])]);
        assert!(detect_cycle(&deps).is_none());
    }

    #[test]
    fn test_all_cycles_finds_both_loops() {
        // a -> b -> c -> a and b -> d -> b
        let deps = adjacency(&[("a", &["b"]), ("b", &["c", "d"]), ("c", &["a"]), ("d", &["b"])]);

        let cycles = all_cycles(&deps);
        assert!(cycles.len() >= 2, "expected at least two cycles, got {cycles:?}");
        assert!(cycles.contains(&strings(&["a", "b", "c", "a"])));
        assert!(cycles.contains(&strings(&["b", "d", "b"])));

        let keys: HashSet<String> = cycles.iter().map(|c| c.join("->")).collect();
        assert_eq!(keys.len(), cycles.len());
    }

    #[test]
    fn test_all_cycles_reports_each_rotation_once() {
        let deps = adjacency(&[("x", &["y"]), ("y", &["z"]), ("z", &["x"])]);
        assert_eq!(all_cycles(&deps), vec![strings(&["x", "y", "z", "x"])]);
    }

    #[test]
    fn test_deduplicate_drops_trivial_sequences() {
        let cycles = vec![strings(&["a"]), strings(&["b", "a", "b"]), strings(&["a", "b", "a"])];
        assert_eq!(deduplicate_cycles(cycles), vec![strings(&["a", "b", "a"])]);
    }
}
