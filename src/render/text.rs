use crate::constants::PATH_SEPARATOR;
use crate::graph::{DependencyGraph, ServiceRole};

const RULE: &str = "================";

fn list_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    }
}

/// Render a plain-text report of `graph`.
///
/// The report starts with the cycle status, then groups services into root,
/// leaf and intermediate sections, and ends with one detail block per service.
pub fn text_report(graph: &DependencyGraph) -> String {
    let mut result = String::new();
    result.push_str("Dependency graph:\n");
    result.push_str(RULE);
    result.push_str("\n\n");

    if let Some(first) = graph.detect_cycle() {
        result.push_str("WARNING: circular dependency detected!\n");
        result.push_str(&format!("First cycle: {}\n\n", first.join(PATH_SEPARATOR)));

        let cycles = graph.all_cycles();
        if cycles.len() > 1 {
            result.push_str("All cycles:\n");
            for (i, cycle) in cycles.iter().enumerate() {
                result.push_str(&format!("  cycle {}: {}\n", i + 1, cycle.join(PATH_SEPARATOR)));
            }
            result.push('\n');
        }
    } else {
        result.push_str("No circular dependencies\n\n");
    }

    let mut roots = Vec::new();
    let mut leaves = Vec::new();
    let mut intermediates = Vec::new();
    for service in graph.services() {
        match graph.role(service) {
            ServiceRole::Root => roots.push(service),
            ServiceRole::Leaf => leaves.push(service),
            ServiceRole::Intermediate => intermediates.push(service),
        }
    }

    if !roots.is_empty() {
        result.push_str("Root services (no dependencies):\n");
        for service in &roots {
            result.push_str(&format!(
                "  - {} <- depended on by: {}\n",
                service,
                graph.dependents_of(service).join(", ")
            ));
        }
        result.push('\n');
    }

    if !leaves.is_empty() {
        result.push_str("Leaf services (no dependents):\n");
        for service in &leaves {
            result.push_str(&format!(
                "  - {} -> depends on: {}\n",
                service,
                graph.dependencies_of(service).join(", ")
            ));
        }
        result.push('\n');
    }

    if !intermediates.is_empty() {
        result.push_str("Intermediate services:\n");
        for service in &intermediates {
            result.push_str(&format!("  - {service}\n"));
            let deps = graph.dependencies_of(service);
            if !deps.is_empty() {
                result.push_str(&format!("      depends on: {}\n", deps.join(", ")));
            }
            let dependents = graph.dependents_of(service);
            if !dependents.is_empty() {
                result.push_str(&format!("      depended on by: {}\n", dependents.join(", ")));
            }
        }
        result.push('\n');
    }

    result.push_str("Details:\n");
    result.push_str(RULE);
    result.push('\n');
    for service in graph.services() {
        result.push_str(&format!("Service: {service}\n"));
        result.push_str(&format!("  depends on: {}\n", list_or_none(graph.dependencies_of(service))));
        result.push_str(&format!(
            "  depended on by: {}\n\n",
            list_or_none(graph.dependents_of(service))
        ));
    }

    result
}
