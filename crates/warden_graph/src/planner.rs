//! The dependency planner (§4.6): per-node prerequisite lists and the
//! global deploy/undeploy sequence derived from them.

use hashbrown::{HashMap, HashSet};

use crate::node::Node;
use crate::template::NodeId;

/// Errors raised while building a [`Plan`] from a node set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlannerError {
    /// A node's `requires` edge names a node template that does not exist.
    #[error("node {node} requires unknown node {target}")]
    UnknownRequirementTarget {
        /// The node declaring the dangling requirement.
        node: String,
        /// The missing target name.
        target: String,
    },
    /// Following `requires` edges from `node` revisits a node already on
    /// the current path — the template graph is not a DAG.
    #[error("dependency cycle detected at node {node}")]
    CyclicGraph {
        /// The node where the cycle was detected.
        node: String,
    },
}

/// The resolved deployment plan: a prerequisite list per node (ending with
/// the node itself) and a global sequence ordering nodes by ascending
/// prerequisite-list length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    order: Vec<NodeId>,
    prerequisites: HashMap<NodeId, Vec<NodeId>>,
}

impl Plan {
    /// The global sequence: nodes ordered by ascending prerequisite-list
    /// length, ties broken by declaration order.
    #[must_use]
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// The prerequisite list for `node`: every node that must be reached
    /// before it, in dependency-first order, ending with `node` itself.
    ///
    /// Panics if `node` was not part of the node set this plan was built
    /// from — callers always hold a [`NodeId`] obtained from that set.
    #[must_use]
    pub fn prerequisites_for(&self, node: NodeId) -> &[NodeId] {
        &self.prerequisites[&node]
    }

    /// The single global sequence for one lifecycle event: every node's
    /// prerequisite list, flattened in [`Self::order`] order and deduped
    /// keeping each node's first occurrence.
    ///
    /// This is what the lifecycle driver walks to run one event (e.g.
    /// `create`) across the whole deployment in dependency order (§4.6).
    #[must_use]
    pub fn global_sequence(&self) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut sequence = Vec::new();
        for node_id in &self.order {
            for prerequisite in &self.prerequisites[node_id] {
                if seen.insert(*prerequisite) {
                    sequence.push(*prerequisite);
                }
            }
        }
        sequence
    }
}

/// Builds a [`Plan`] from `nodes`, in declaration order.
///
/// # Errors
///
/// Returns [`PlannerError::UnknownRequirementTarget`] if a `requires` edge
/// names a node not present in `nodes`, or [`PlannerError::CyclicGraph`] if
/// the requirement graph is not acyclic.
pub fn build_plan(nodes: &[Node]) -> Result<Plan, PlannerError> {
    let name_to_id: HashMap<&str, NodeId> = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.name(), NodeId::new(index)))
        .collect();

    let mut prerequisites = HashMap::new();
    for (index, _node) in nodes.iter().enumerate() {
        let node_id = NodeId::new(index);
        let mut deps = Vec::new();
        let mut visiting = HashSet::new();
        collect(node_id, nodes, &name_to_id, &mut deps, &mut visiting)?;
        deps.reverse();
        let filtered = dedupe_by_name(deps, nodes);
        prerequisites.insert(node_id, filtered);
    }

    let mut order: Vec<NodeId> = (0..nodes.len()).map(NodeId::new).collect();
    order.sort_by_key(|node_id| prerequisites[node_id].len());

    Ok(Plan { order, prerequisites })
}

fn collect(
    node_id: NodeId,
    nodes: &[Node],
    name_to_id: &HashMap<&str, NodeId>,
    deps: &mut Vec<NodeId>,
    visiting: &mut HashSet<NodeId>,
) -> Result<(), PlannerError> {
    if !visiting.insert(node_id) {
        return Err(PlannerError::CyclicGraph {
            node: nodes[node_id.index()].name().to_string(),
        });
    }

    let node = &nodes[node_id.index()];
    if node.requirements().is_empty() {
        deps.push(node_id);
    } else {
        if !deps.contains(&node_id) {
            deps.push(node_id);
        }
        let mut targets: Vec<&str> = node.requirements().iter().map(|r| r.target_name()).collect();
        targets.sort_unstable();
        for target_name in targets {
            let target_id =
                *name_to_id
                    .get(target_name)
                    .ok_or_else(|| PlannerError::UnknownRequirementTarget {
                        node: node.name().to_string(),
                        target: target_name.to_string(),
                    })?;
            collect(target_id, nodes, name_to_id, deps, visiting)?;
        }
    }

    visiting.remove(&node_id);
    Ok(())
}

fn dedupe_by_name(deps: Vec<NodeId>, nodes: &[Node]) -> Vec<NodeId> {
    let mut seen = HashSet::new();
    let mut filtered = Vec::with_capacity(deps.len());
    for node_id in deps {
        let name = nodes[node_id.index()].name();
        if seen.insert(name) {
            filtered.push(node_id);
        }
    }
    filtered
}
