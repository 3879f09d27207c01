//! Dominance-frontier computation, Cytron et al.'s algorithm (spec.md
//! §4.4). Requires `immediate_dominator` to already be populated, i.e.
//! [`ControlFlowGraph::compute_dominators`] must run first.

use super::{ControlFlowGraph, NodeId};

impl ControlFlowGraph {
    /// Populate `dominance_frontier` on every node. A node with fewer
    /// than two predecessors can't be a join point and keeps an empty
    /// frontier.
    pub fn compute_dominance_frontiers(&mut self) {
        for node in self.nodes_mut_slice() {
            node.dominance_frontier.clear();
        }

        let join_points: Vec<NodeId> = self
            .nodes()
            .filter(|n| n.predecessors.len() >= 2)
            .map(|n| n.id)
            .collect();

        for node_id in join_points {
            let predecessors: Vec<NodeId> = self.node(node_id).predecessors.iter().copied().collect();
            for pred in predecessors {
                if self.node(pred).immediate_dominator.is_none() && pred != self.entry() {
                    // Unreachable predecessor; it dominates nothing.
                    continue;
                }
                let mut runner = pred;
                while runner != self.idom_or_self(node_id) {
                    self.node_mut(runner).dominance_frontier.insert(node_id);
                    match self.node(runner).immediate_dominator {
                        Some(idom) => runner = idom,
                        None => break,
                    }
                }
            }
        }
    }

    /// `immediate_dominator(n)`, or `n` itself for Entry (which has none).
    fn idom_or_self(&self, id: NodeId) -> NodeId {
        self.node(id).immediate_dominator.unwrap_or(id)
    }
}
