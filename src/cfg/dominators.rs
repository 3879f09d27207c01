//! Immediate-dominator computation via the Cooper-Harvey-Kennedy
//! iterative algorithm (spec.md §4.3), plus dominator-tree materialisation.
//!
//! CHK operates over the forward reverse-post-order numbering, so
//! [`ControlFlowGraph::forward_order`] is computed as a side effect if it
//! hasn't been already.

use super::{ControlFlowGraph, NodeId};

impl ControlFlowGraph {
    /// Compute `immediate_dominator` for every node reachable from Entry.
    /// Entry has no immediate dominator. Nodes unreachable from Entry are
    /// left with `immediate_dominator == None`. Call
    /// [`ControlFlowGraph::compute_dominator_tree`] afterward to
    /// materialise `children`.
    pub fn compute_dominators(&mut self) {
        self.forward_order();
        let entry = self.entry();

        // Reset from any previous run so re-running on a mutated graph
        // doesn't leave stale edges in `children`.
        for node in self.nodes_mut_slice() {
            node.immediate_dominator = None;
            node.children.clear();
        }
        self.node_mut(entry).immediate_dominator = Some(entry);

        let order = self.forward_order().to_vec();
        let reverse_postorder: Vec<NodeId> = order.iter().copied().filter(|&id| id != entry).collect();

        let mut changed = true;
        let mut pass = 0u32;
        while changed {
            changed = false;
            pass += 1;
            for &node_id in &reverse_postorder {
                let predecessors: Vec<NodeId> = self
                    .node(node_id)
                    .predecessors
                    .iter()
                    .copied()
                    .filter(|&p| self.node(p).forward_index >= 0)
                    .collect();

                let mut new_idom = None;
                for &pred in &predecessors {
                    if self.node(pred).immediate_dominator.is_some() {
                        new_idom = Some(pred);
                        break;
                    }
                }
                let Some(mut new_idom) = new_idom else {
                    continue;
                };

                for &pred in &predecessors {
                    if pred == new_idom {
                        continue;
                    }
                    if self.node(pred).immediate_dominator.is_some() {
                        new_idom = self.intersect(pred, new_idom);
                    }
                }

                if self.node(node_id).immediate_dominator != Some(new_idom) {
                    self.node_mut(node_id).immediate_dominator = Some(new_idom);
                    changed = true;
                }
            }
            tracing::trace!(pass, changed, "dominator fixed-point pass");
        }
        tracing::debug!(passes = pass, "dominators converged");

        self.node_mut(entry).immediate_dominator = None;
    }

    /// Populate `children` from the `immediate_dominator` already set by
    /// [`ControlFlowGraph::compute_dominators`]. Idempotent: clears
    /// existing children first, so safe to re-run after a fresh
    /// `compute_dominators` pass.
    pub fn compute_dominator_tree(&mut self) {
        for node in self.nodes_mut_slice() {
            node.children.clear();
        }
        let edges: Vec<(NodeId, NodeId)> = self
            .nodes()
            .filter_map(|n| n.immediate_dominator.map(|idom| (idom, n.id)))
            .filter(|&(idom, id)| idom != id)
            .collect();
        for (idom, id) in edges {
            self.node_mut(idom).children.insert(id);
        }
    }

    /// Walk up the `immediate_dominator` chains of `a` and `b` until they
    /// meet, using `forward_index` to decide which chain to advance
    /// (CHK's "finger" comparison).
    fn intersect(&self, a: NodeId, b: NodeId) -> NodeId {
        let mut finger1 = a;
        let mut finger2 = b;
        while finger1 != finger2 {
            while self.node(finger1).forward_index > self.node(finger2).forward_index {
                finger1 = self
                    .node(finger1)
                    .immediate_dominator
                    .expect("processed node must have an idom during intersect");
            }
            while self.node(finger2).forward_index > self.node(finger1).forward_index {
                finger2 = self
                    .node(finger2)
                    .immediate_dominator
                    .expect("processed node must have an idom during intersect");
            }
        }
        finger1
    }
}
