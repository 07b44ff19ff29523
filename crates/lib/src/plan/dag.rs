//! Execution order for the nodes of a resolved closure.
//!
//! Edges run from a dependency to its dependents. Ties are broken by package
//! name so the order never depends on traversal details.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use super::types::CompileError;
use crate::spec::Spec;

pub struct ClosureDag<'s> {
  graph: DiGraph<&'s Spec, ()>,
}

impl<'s> ClosureDag<'s> {
  pub fn from_spec(root: &'s Spec) -> Result<Self, CompileError> {
    let mut graph = DiGraph::new();
    let mut nodes = BTreeMap::new();

    let specs = root.traverse();
    for spec in &specs {
      nodes.insert(spec.name(), graph.add_node(*spec));
    }

    for spec in &specs {
      let dependent = nodes[spec.name()];
      for dep in spec.dependencies().keys() {
        if let Some(&dependency) = nodes.get(dep.as_str()) {
          graph.add_edge(dependency, dependent, ());
        }
      }
    }

    let dag = Self { graph };
    toposort(&dag.graph, None).map_err(|_| CompileError::CycleDetected)?;
    Ok(dag)
  }

  /// All nodes, dependencies first; among ready nodes, by name.
  pub fn topological(&self) -> Result<Vec<&'s Spec>, CompileError> {
    let mut in_degree: BTreeMap<NodeIndex, usize> = self
      .graph
      .node_indices()
      .map(|idx| (idx, self.graph.neighbors_directed(idx, Direction::Incoming).count()))
      .collect();

    let mut ready: BTreeSet<(&str, NodeIndex)> = in_degree
      .iter()
      .filter(|(_, deg)| **deg == 0)
      .map(|(&idx, _)| (self.graph[idx].name(), idx))
      .collect();

    let mut order = Vec::with_capacity(self.graph.node_count());
    while let Some((_, idx)) = ready.pop_first() {
      order.push(self.graph[idx]);
      for next in self.graph.neighbors_directed(idx, Direction::Outgoing) {
        if let Some(deg) = in_degree.get_mut(&next) {
          *deg = deg.saturating_sub(1);
          if *deg == 0 {
            ready.insert((self.graph[next].name(), next));
          }
        }
      }
    }

    if order.len() != self.graph.node_count() {
      return Err(CompileError::CycleDetected);
    }
    Ok(order)
  }

  /// Groups of nodes whose dependencies all lie in earlier groups.
  /// Nodes within one wave can be built in parallel.
  pub fn waves(&self) -> Result<Vec<Vec<&'s Spec>>, CompileError> {
    let mut in_degree: BTreeMap<NodeIndex, usize> = BTreeMap::new();
    for idx in self.graph.node_indices() {
      in_degree.insert(idx, self.graph.neighbors_directed(idx, Direction::Incoming).count());
    }

    let mut remaining: BTreeSet<NodeIndex> = self.graph.node_indices().collect();
    let mut waves = Vec::new();

    while !remaining.is_empty() {
      let ready: Vec<NodeIndex> = remaining.iter().filter(|idx| in_degree[idx] == 0).copied().collect();
      if ready.is_empty() {
        return Err(CompileError::CycleDetected);
      }

      for idx in &ready {
        remaining.remove(idx);
        for next in self.graph.neighbors_directed(*idx, Direction::Outgoing) {
          if let Some(deg) = in_degree.get_mut(&next) {
            *deg = deg.saturating_sub(1);
          }
        }
      }

      let mut wave: Vec<&'s Spec> = ready.into_iter().map(|idx| self.graph[idx]).collect();
      wave.sort_by(|a, b| a.name().cmp(b.name()));
      waves.push(wave);
    }

    Ok(waves)
  }
}
