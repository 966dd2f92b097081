//! Dependency resolution
//!
//! Reachability, closure and build order over the package graph.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::core::node::{root_of, PackageNode, SpecMetadata};
use crate::error::ResolverError;

/// Dependency graph for packages
///
/// Adjacency list keyed by package name. Iteration follows insertion order so
/// results are stable across runs.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Adjacency list: package -> direct dependencies
    edges: HashMap<String, Vec<String>>,
    /// All known packages, in insertion order
    nodes: Vec<String>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph of direct dependencies declared by raw specs
    pub fn from_specs(specs: &[SpecMetadata]) -> Self {
        let mut graph = Self::new();
        for spec in specs {
            if let Some(name) = spec.name.as_deref() {
                graph.add_package(name.trim(), spec.dependencies.clone());
            }
        }
        graph
    }

    /// Graph of direct dependencies between nodes
    pub fn from_nodes(nodes: &[PackageNode]) -> Self {
        let mut graph = Self::new();
        for node in nodes {
            graph.add_package(&node.name, node.direct_dependency_names.clone());
        }
        graph
    }

    /// Like [`Self::from_nodes`] but drops edges between nodes of the same root
    pub fn cross_root(nodes: &[PackageNode]) -> Self {
        let mut graph = Self::new();
        for node in nodes {
            let deps = node
                .direct_dependency_names
                .iter()
                .filter(|d| !node.has_common_spec(d))
                .cloned()
                .collect();
            graph.add_package(&node.name, deps);
        }
        graph
    }

    /// Add a package to the graph
    ///
    /// Adding the same package twice merges its dependency lists.
    pub fn add_package(&mut self, name: &str, dependencies: Vec<String>) {
        self.touch(name);
        for dep in &dependencies {
            self.touch(dep);
        }
        let entry = self.edges.entry(name.to_string()).or_default();
        for dep in dependencies {
            if !entry.contains(&dep) {
                entry.push(dep);
            }
        }
    }

    fn touch(&mut self, name: &str) {
        if !self.edges.contains_key(name) {
            self.edges.insert(name.to_string(), Vec::new());
            self.nodes.push(name.to_string());
        }
    }

    /// Direct dependencies of a package
    pub fn dependencies(&self, name: &str) -> &[String] {
        self.edges.get(name).map_or(&[], Vec::as_slice)
    }

    /// Every name reachable from `start`, `start` included, in discovery order
    ///
    /// Names without an entry in the graph are kept but not expanded.
    pub fn reachable_from(&self, start: &[String]) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut result = Vec::new();
        let mut queue: VecDeque<&str> = VecDeque::new();

        for name in start {
            if seen.insert(name.as_str()) {
                result.push(name.clone());
                queue.push_back(name.as_str());
            }
        }

        while let Some(current) = queue.pop_front() {
            for dep in self.dependencies(current) {
                if seen.insert(dep.as_str()) {
                    result.push(dep.clone());
                    queue.push_back(dep.as_str());
                }
            }
        }

        result
    }

    /// Compute topological sort (build order)
    ///
    /// Returns packages in order such that dependencies come before dependents.
    pub fn topological_sort(&self) -> Result<Vec<String>, ResolverError> {
        let mut visited = HashSet::new();
        let mut temp_visited = HashSet::new();
        let mut result = Vec::new();
        let mut cycle_path = Vec::new();

        for node in &self.nodes {
            if !visited.contains(node) {
                self.visit(
                    node,
                    &mut visited,
                    &mut temp_visited,
                    &mut result,
                    &mut cycle_path,
                )?;
            }
        }

        Ok(result)
    }

    fn visit(
        &self,
        node: &str,
        visited: &mut HashSet<String>,
        temp_visited: &mut HashSet<String>,
        result: &mut Vec<String>,
        cycle_path: &mut Vec<String>,
    ) -> Result<(), ResolverError> {
        if temp_visited.contains(node) {
            // Found a cycle
            cycle_path.push(node.to_string());
            return Err(ResolverError::CircularDependency {
                cycle: cycle_path.clone(),
            });
        }

        if visited.contains(node) {
            return Ok(());
        }

        temp_visited.insert(node.to_string());
        cycle_path.push(node.to_string());

        for dep in self.dependencies(node) {
            self.visit(dep, visited, temp_visited, result, cycle_path)?;
        }

        cycle_path.pop();
        temp_visited.remove(node);
        visited.insert(node.to_string());
        result.push(node.to_string());

        Ok(())
    }

    /// Check if the graph has any cycles
    pub fn has_cycle(&self) -> bool {
        self.topological_sort().is_err()
    }
}

/// Smallest superset of `subset` that contains every dependency of its members
///
/// A dependency is not added when a member already shares its root: subspecs
/// of a root are built from the same checkout.
pub fn closure(
    all_nodes: &[PackageNode],
    subset: &[PackageNode],
) -> Result<Vec<PackageNode>, ResolverError> {
    let mut members: Vec<PackageNode> = Vec::with_capacity(subset.len());
    for node in subset {
        if !members.iter().any(|m| m.name == node.name) {
            members.push(node.clone());
        }
    }

    let mut index = 0;
    while index < members.len() {
        let requester = members[index].clone();
        for dependency in &requester.dependency_names {
            let satisfied = members
                .iter()
                .any(|m| &m.name == dependency || m.has_common_spec(dependency));
            if satisfied {
                continue;
            }

            let node = all_nodes
                .iter()
                .find(|n| &n.name == dependency)
                .ok_or_else(|| ResolverError::MissingDependency {
                    package: requester.name.clone(),
                    dependency: dependency.clone(),
                })?;
            members.push(node.clone());
        }
        index += 1;
    }

    Ok(members)
}

/// Sort `nodes` so that every node comes after the nodes it depends on
///
/// Edges between nodes of the same root are ignored.
pub fn dependency_order(nodes: &[PackageNode]) -> Result<Vec<PackageNode>, ResolverError> {
    let mut graph = DependencyGraph::new();
    for node in nodes {
        let deps = node
            .dependency_names
            .iter()
            .filter(|d| root_of(d) != node.root_name && nodes.iter().any(|n| &n.name == *d))
            .cloned()
            .collect();
        graph.add_package(&node.name, deps);
    }

    let order = graph.topological_sort()?;
    Ok(order
        .iter()
        .filter_map(|name| nodes.iter().find(|n| &n.name == name).cloned())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::node::test_support::nodes;
    use proptest::prelude::*;

    #[test]
    fn test_simple_dependency_order() {
        let mut graph = DependencyGraph::new();
        graph.add_package("app", vec!["lib".to_string()]);
        graph.add_package("lib", vec![]);

        let order = graph.topological_sort().unwrap();
        let lib_pos = order.iter().position(|x| x == "lib").unwrap();
        let app_pos = order.iter().position(|x| x == "app").unwrap();

        assert!(lib_pos < app_pos, "lib should be built before app");
    }

    #[test]
    fn test_circular_dependency_detection() {
        let mut graph = DependencyGraph::new();
        graph.add_package("a", vec!["b".to_string()]);
        graph.add_package("b", vec!["c".to_string()]);
        graph.add_package("c", vec!["a".to_string()]);

        assert!(graph.has_cycle());
        assert!(matches!(
            graph.topological_sort(),
            Err(ResolverError::CircularDependency { .. })
        ));
    }

    #[test]
    fn test_reachable_keeps_unknown_names() {
        let mut graph = DependencyGraph::new();
        graph.add_package("a", vec!["b".to_string(), "x".to_string()]);
        graph.add_package("b", vec!["c".to_string()]);

        let reached = graph.reachable_from(&["a".to_string()]);
        assert_eq!(reached, vec!["a", "b", "x", "c"]);
    }

    #[test]
    fn test_reachable_terminates_on_cycle() {
        let mut graph = DependencyGraph::new();
        graph.add_package("a", vec!["b".to_string()]);
        graph.add_package("b", vec!["a".to_string()]);

        let reached = graph.reachable_from(&["a".to_string()]);
        assert_eq!(reached.len(), 2);
    }

    #[test]
    fn test_closure_adds_transitive_dependencies() {
        let all = nodes(&[("A", &["B"]), ("B", &["C"]), ("C", &[]), ("D", &[])]);
        let closed = closure(&all, &all[..1]).unwrap();
        let names: Vec<&str> = closed.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_closure_skips_common_root() {
        let all = nodes(&[
            ("Firebase/Core", &["Firebase/CoreOnly", "FirebaseAnalytics"]),
            ("Firebase/CoreOnly", &[]),
            ("FirebaseAnalytics", &[]),
        ]);
        let closed = closure(&all, &all[..1]).unwrap();
        let names: Vec<&str> = closed.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Firebase/Core", "FirebaseAnalytics"]);
    }

    #[test]
    fn test_closure_missing_dependency() {
        let all = nodes(&[("A", &["Ghost"])]);
        let err = closure(&all, &all).unwrap_err();
        assert_eq!(
            err,
            ResolverError::MissingDependency {
                package: "A".to_string(),
                dependency: "Ghost".to_string()
            }
        );
    }

    #[test]
    fn test_dependency_order_puts_dependencies_first() {
        let all = nodes(&[("App", &["Net"]), ("Net", &["Log"]), ("Log", &[])]);
        let ordered = dependency_order(&all).unwrap();
        let names: Vec<&str> = ordered.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Log", "Net", "App"]);
    }

    /// Random DAG: node `i` may depend on any node `j < i`
    fn dag_strategy() -> impl Strategy<Value = Vec<PackageNode>> {
        prop::collection::vec(prop::collection::vec(any::<bool>(), 10), 1..10).prop_map(|rows| {
            let names: Vec<String> = (0..rows.len()).map(|i| format!("P{i}")).collect();
            let deps: Vec<Vec<&str>> = rows
                .iter()
                .enumerate()
                .map(|(i, row)| {
                    (0..i)
                        .filter(|j| row[*j])
                        .map(|j| names[j].as_str())
                        .collect()
                })
                .collect();
            let entries: Vec<(&str, &[&str])> = names
                .iter()
                .zip(deps.iter())
                .map(|(n, d)| (n.as_str(), d.as_slice()))
                .collect();
            nodes(&entries)
        })
    }

    proptest! {
        #[test]
        fn prop_closure_is_idempotent(all in dag_strategy(), pick in any::<prop::sample::Index>()) {
            let start = &all[pick.index(all.len())..=pick.index(all.len())];
            let once = closure(&all, start).unwrap();
            let twice = closure(&all, &once).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_recursive_names_reach_fixed_point(all in dag_strategy()) {
            let graph = DependencyGraph::from_nodes(&all);
            for node in &all {
                let names = node.recursive_dependency_names(&all);
                let again = graph.reachable_from(&names);
                prop_assert_eq!(&names, &again);
            }
        }

        #[test]
        fn prop_dependency_order_respects_edges(all in dag_strategy()) {
            let ordered = dependency_order(&all).unwrap();
            prop_assert_eq!(ordered.len(), all.len());
            for (pos, node) in ordered.iter().enumerate() {
                for dep in &node.dependency_names {
                    let dep_pos = ordered.iter().position(|n| &n.name == dep).unwrap();
                    prop_assert!(dep_pos < pos);
                }
            }
        }
    }
}
