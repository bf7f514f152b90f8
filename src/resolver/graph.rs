// src/resolver/graph.rs

//! Dependency graph over a batch of root packages
//!
//! Orders the roots of a multi-package install so that every package comes
//! after the batch members it depends on.

use crate::package::{Package, normalize_id};
use crate::platform::PlatformCompatibility;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Dependency graph between the members of a batch, by input position
#[derive(Debug)]
pub struct BatchGraph<'a> {
    nodes: &'a [Package],
    /// Map from node to the batch members it depends on
    edges: Vec<Vec<usize>>,
    /// Map from node to the batch members depending on it (reverse edges)
    reverse_edges: Vec<Vec<usize>>,
}

impl<'a> BatchGraph<'a> {
    /// Build the graph; an edge A -> B exists when A has a compatible dependency on B's id
    pub fn build(packages: &'a [Package], compatibility: &dyn PlatformCompatibility) -> Self {
        let mut by_id: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, package) in packages.iter().enumerate() {
            by_id.entry(normalize_id(&package.id)).or_default().push(index);
        }

        let mut edges = vec![Vec::new(); packages.len()];
        let mut reverse_edges = vec![Vec::new(); packages.len()];

        for (from, package) in packages.iter().enumerate() {
            for dependency in package.compatible_dependencies(compatibility) {
                let Some(targets) = by_id.get(&normalize_id(&dependency.id)) else {
                    continue;
                };
                for &to in targets {
                    if to != from && !edges[from].contains(&to) {
                        edges[from].push(to);
                        reverse_edges[to].push(from);
                    }
                }
            }
        }

        Self {
            nodes: packages,
            edges,
            reverse_edges,
        }
    }

    /// Batch members the node at `index` depends on
    pub fn dependencies(&self, index: usize) -> &[usize] {
        self.edges.get(index).map(Vec::as_slice).unwrap_or_default()
    }

    /// Batch members depending on the node at `index`
    pub fn dependents(&self, index: usize) -> &[usize] {
        self.reverse_edges
            .get(index)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Perform topological sort using Kahn's algorithm
    ///
    /// Returns node positions in installation order (dependencies before
    /// dependents). Among ready nodes the earliest input position goes first.
    /// Nodes caught in a cycle are appended in input order.
    pub fn topological_sort(&self) -> Vec<usize> {
        let mut in_degree: Vec<usize> = self.edges.iter().map(Vec::len).collect();
        let mut ready: BTreeSet<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(index, _)| index)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        let mut placed = vec![false; self.nodes.len()];

        while let Some(index) = ready.pop_first() {
            order.push(index);
            placed[index] = true;

            for &dependent in &self.reverse_edges[index] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() != self.nodes.len() {
            let cyclic: Vec<usize> = (0..self.nodes.len()).filter(|&i| !placed[i]).collect();
            debug!(
                "Circular dependency among batch members: {}",
                cyclic
                    .iter()
                    .map(|&i| self.nodes[i].to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            order.extend(cyclic);
        }

        order
    }
}

/// Batch packages in dependency order
pub fn dependency_order(
    packages: &[Package],
    compatibility: &dyn PlatformCompatibility,
) -> Vec<Package> {
    let graph = BatchGraph::build(packages, compatibility);
    graph
        .topological_sort()
        .into_iter()
        .map(|index| packages[index].clone())
        .collect()
}
