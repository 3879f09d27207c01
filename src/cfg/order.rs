//! Reverse-post-order numbering, forward and backward (spec.md §4.2).
//!
//! Both orders are computed with an explicit-stack iterative DFS rather
//! than recursion, since a method body's CFG can be deep enough to blow
//! the native stack on pathological input. The forward order walks
//! `successors` from Entry; the backward order walks `predecessors` from
//! Exit, as if traversing the graph with edges reversed.

use super::{ControlFlowGraph, NodeId};

impl ControlFlowGraph {
    /// Reverse post-order over `successors`, starting at Entry. Computed
    /// once and cached; invalidated by [`ControlFlowGraph::add_edge`].
    /// Nodes unreachable from Entry are omitted and keep
    /// `forward_index == -1`.
    pub fn forward_order(&mut self) -> &[NodeId] {
        if self.forward_order.is_none() {
            let order = dfs_post_order(&self.nodes, self.entry(), true);
            for (index, &id) in order.iter().rev().enumerate() {
                self.nodes[id as usize].forward_index = index as i32;
            }
            self.forward_order = Some(order.into_iter().rev().collect());
        }
        self.forward_order.as_deref().unwrap()
    }

    /// Reverse post-order over `predecessors`, starting at Exit. Nodes
    /// that cannot reach Exit are omitted and keep `backward_index == -1`.
    pub fn backward_order(&mut self) -> &[NodeId] {
        if self.backward_order.is_none() {
            let order = dfs_post_order(&self.nodes, self.exit(), false);
            for (index, &id) in order.iter().rev().enumerate() {
                self.nodes[id as usize].backward_index = index as i32;
            }
            self.backward_order = Some(order.into_iter().rev().collect());
        }
        self.backward_order.as_deref().unwrap()
    }
}

/// Post-order traversal via an explicit stack, following `successors`
/// when `forward` is set and `predecessors` otherwise. Reversing the
/// result yields reverse post-order.
fn dfs_post_order(nodes: &[super::CFGNode], start: NodeId, forward: bool) -> Vec<NodeId> {
    enum Frame {
        Enter(NodeId),
        Leave(NodeId),
    }

    let mut visited = vec![false; nodes.len()];
    let mut stack = vec![Frame::Enter(start)];
    let mut post_order = Vec::new();

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Enter(id) => {
                if visited[id as usize] {
                    continue;
                }
                visited[id as usize] = true;
                stack.push(Frame::Leave(id));
                let neighbors = if forward {
                    &nodes[id as usize].successors
                } else {
                    &nodes[id as usize].predecessors
                };
                for &next in neighbors.iter().rev() {
                    if !visited[next as usize] {
                        stack.push(Frame::Enter(next));
                    }
                }
            }
            Frame::Leave(id) => post_order.push(id),
        }
    }

    post_order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::ControlFlowGraph;

    #[test]
    fn straight_line_forward_order_is_entry_first() {
        let mut cfg = ControlFlowGraph::empty();
        let bb = cfg.add_basic_block();
        cfg.add_edge(cfg.entry(), bb);
        cfg.add_edge(bb, cfg.exit());

        let order = cfg.forward_order().to_vec();
        assert_eq!(order, vec![cfg.entry(), bb, cfg.exit()]);
        assert_eq!(cfg.node(cfg.entry()).forward_index, 0);
        assert_eq!(cfg.node(bb).forward_index, 1);
        assert_eq!(cfg.node(cfg.exit()).forward_index, 2);
    }

    #[test]
    fn unreachable_node_has_no_forward_index() {
        let mut cfg = ControlFlowGraph::empty();
        let reachable = cfg.add_basic_block();
        let unreachable = cfg.add_basic_block();
        cfg.add_edge(cfg.entry(), reachable);
        cfg.add_edge(reachable, cfg.exit());
        // `unreachable` has no incoming edge from Entry.
        cfg.add_edge(unreachable, cfg.exit());

        cfg.forward_order();
        assert_eq!(cfg.node(unreachable).forward_index, -1);
    }

    #[test]
    fn backward_order_starts_at_exit_over_predecessors() {
        let mut cfg = ControlFlowGraph::empty();
        let bb = cfg.add_basic_block();
        cfg.add_edge(cfg.entry(), bb);
        cfg.add_edge(bb, cfg.exit());

        let order = cfg.backward_order().to_vec();
        assert_eq!(order, vec![cfg.exit(), bb, cfg.entry()]);
    }

    #[test]
    fn diamond_forward_order_visits_both_branches_before_join() {
        let mut cfg = ControlFlowGraph::empty();
        let left = cfg.add_basic_block();
        let right = cfg.add_basic_block();
        let join = cfg.add_basic_block();
        cfg.add_edge(cfg.entry(), left);
        cfg.add_edge(cfg.entry(), right);
        cfg.add_edge(left, join);
        cfg.add_edge(right, join);
        cfg.add_edge(join, cfg.exit());

        let order = cfg.forward_order().to_vec();
        let pos = |id: NodeId| order.iter().position(|&x| x == id).unwrap();
        assert!(pos(cfg.entry()) < pos(left));
        assert!(pos(cfg.entry()) < pos(right));
        assert!(pos(left) < pos(join));
        assert!(pos(right) < pos(join));
        assert!(pos(join) < pos(cfg.exit()));
    }

    #[test]
    fn recomputing_after_invalidation_reflects_new_edges() {
        let mut cfg = ControlFlowGraph::empty();
        let bb = cfg.add_basic_block();
        cfg.add_edge(cfg.entry(), bb);
        cfg.forward_order();
        assert_eq!(cfg.node(bb).forward_index, 1);

        let extra = cfg.add_basic_block();
        cfg.add_edge(bb, extra);
        let order = cfg.forward_order().to_vec();
        assert!(order.contains(&extra));
    }
}
