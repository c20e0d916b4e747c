//! Publish-order degrees
//!
//! Builds a directed graph of product dependencies (dependent → dependency)
//! and assigns each package the longest-path rank that says how late it
//! must be pushed. Partner packages go first, lineup packages last.

use crate::core::error::{CoherenceResult, IntegrityError};
use crate::model::Universe;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};

/// Degree of every partner package
pub const PARTNER_DEGREE: u32 = 1;
/// Degree of a package with no product dependencies
pub const LEAF_DEGREE: u32 = 2;
/// Degree of every lineup package
pub const LINEUP_DEGREE: u32 = u32::MAX;

/// Degrees for every package in a universe, indexed like the universe
#[derive(Debug, Clone)]
pub struct PublishOrder {
  degrees: Vec<u32>,
}

impl PublishOrder {
  /// Compute degrees from the verifier's product dependencies
  ///
  /// Fails with `DependencyCycle` before any degree is assigned if the
  /// product dependencies are circular.
  pub fn compute(universe: &Universe) -> CoherenceResult<Self> {
    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(universe.len(), 0);
    for idx in 0..universe.len() {
      graph.add_node(idx);
    }
    for (idx, record) in universe.records().iter().enumerate() {
      for &dependency in record.product_dependencies() {
        graph.add_edge(NodeIndex::new(idx), NodeIndex::new(dependency), ());
      }
    }

    let sorted = match toposort(&graph, None) {
      Ok(sorted) => sorted,
      Err(cycle) => return Err(cycle_error(universe, &graph, cycle.node_id()).into()),
    };

    // Edges point dependent → dependency, so walk the sort backwards
    let mut degrees = vec![0u32; universe.len()];
    for node in sorted.into_iter().rev() {
      let idx = graph[node];
      let record = universe.record(idx);

      degrees[idx] = if record.is_partner() {
        PARTNER_DEGREE
      } else if record.is_lineup() {
        LINEUP_DEGREE
      } else {
        record
          .product_dependencies()
          .iter()
          .map(|&d| degrees[d].max(LEAF_DEGREE))
          .max()
          .map(|deepest| deepest.saturating_add(1).min(LINEUP_DEGREE - 1))
          .unwrap_or(LEAF_DEGREE)
      };
    }

    Ok(Self { degrees })
  }

  pub fn degree(&self, idx: usize) -> u32 {
    self.degrees[idx]
  }

  #[cfg(test)]
  pub fn degrees(&self) -> &[u32] {
    &self.degrees
  }
}

fn cycle_error(universe: &Universe, graph: &DiGraph<usize, ()>, at: NodeIndex) -> IntegrityError {
  let component = tarjan_scc(graph)
    .into_iter()
    .find(|scc| scc.contains(&at))
    .unwrap_or_else(|| vec![at]);

  let mut packages: Vec<String> = component
    .iter()
    .map(|&node| universe.record(graph[node]).id().to_string())
    .collect();
  packages.sort_by_key(|id| id.to_lowercase());
  if let Some(first) = packages.first().cloned() {
    packages.push(first);
  }

  IntegrityError::DependencyCycle { packages }
}
