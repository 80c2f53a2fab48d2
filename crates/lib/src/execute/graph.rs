//! Graphviz rendering of a resolved plan.

use std::collections::HashMap;

use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::target::TargetRegistry;

use super::types::ExecutionPlan;

/// Weight of every edge in a plan graph.
pub const EDGE_LABEL: &str = "required by";

/// Build the dependency graph of the targets in `plan`.
///
/// Edges point from a dependency to its dependent. Dependencies outside the
/// plan cannot occur for a plan resolved against the same registry and are
/// ignored.
pub fn plan_graph(plan: &ExecutionPlan, registry: &TargetRegistry) -> DiGraph<String, &'static str> {
  let mut graph = DiGraph::new();
  let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();

  for name in plan.iter() {
    nodes.insert(name, graph.add_node(name.to_string()));
  }

  for name in plan.iter() {
    let Ok(target) = registry.lookup(name) else {
      continue;
    };
    let dependent = nodes[name];
    for dependency in target.dependencies() {
      if let Some(&dep_idx) = nodes.get(dependency.as_str()) {
        graph.add_edge(dep_idx, dependent, EDGE_LABEL);
      }
    }
  }

  graph
}

/// Render the plan's dependency graph in Graphviz DOT format.
pub fn to_dot(plan: &ExecutionPlan, registry: &TargetRegistry) -> String {
  let graph = plan_graph(plan, registry);
  format!("{}", Dot::with_config(&graph, &[Config::EdgeNoLabel]))
}
