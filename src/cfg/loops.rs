//! Natural-loop identification via back-edge detection (spec.md §4.5).
//!
//! Requires `immediate_dominator` to be populated first. A back edge is
//! an edge `u -> v` where `v` dominates `u`; each back edge roots one
//! natural loop, built by a predecessor worklist starting from `u`.

use super::{ControlFlowGraph, NodeId};
use std::collections::BTreeSet;

/// A natural loop: `header` is the dominating target of the back edge,
/// `body` is every node (including `header`) that reaches the back
/// edge's source without leaving the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CFGLoop {
    pub header: NodeId,
    pub body: BTreeSet<NodeId>,
}

impl CFGLoop {
    pub fn contains(&self, id: NodeId) -> bool {
        self.body.contains(&id)
    }

    /// How many of `loops` contain `id`, treating containment as the
    /// proxy for nesting depth since loops don't form an explicit tree
    /// in this model.
    pub fn nesting_depth(loops: &[CFGLoop], id: NodeId) -> usize {
        loops.iter().filter(|l| l.contains(id)).count()
    }
}

impl ControlFlowGraph {
    /// All back edges `(source, target)` in the graph: edges where the
    /// target dominates the source. Requires dominators to be computed.
    pub fn back_edges(&self) -> Vec<(NodeId, NodeId)> {
        self.edges()
            .into_iter()
            .filter(|e| self.dominates(e.target, e.source))
            .map(|e| (e.source, e.target))
            .collect()
    }

    /// Is `source -> target` a back edge?
    pub fn is_back_edge(&self, source: NodeId, target: NodeId) -> bool {
        self.node(source).successors.contains(&target) && self.dominates(target, source)
    }

    /// Identify every natural loop in the graph and cache it. Distinct
    /// back edges sharing a header produce distinct loops here; merging
    /// same-header loops into one is left to callers (spec.md §4.5's
    /// note that this is a deliberate simplification).
    pub fn identify_loops(&mut self) {
        let loops: Vec<CFGLoop> = self
            .back_edges()
            .into_iter()
            .map(|(source, header)| CFGLoop {
                header,
                body: natural_loop_body(self, header, source),
            })
            .collect();
        self.set_loops(loops);
    }
}

/// Worklist construction of a natural loop's body, per spec.md §4.5:
/// start with `{header, source}`, then repeatedly add any unvisited
/// predecessor of a node already in the body, without crossing past
/// `header` (since `header` has no predecessor added for it).
fn natural_loop_body(cfg: &ControlFlowGraph, header: NodeId, source: NodeId) -> BTreeSet<NodeId> {
    let mut body = BTreeSet::new();
    body.insert(header);
    body.insert(source);

    let mut worklist = vec![source];
    while let Some(node) = worklist.pop() {
        if node == header {
            continue;
        }
        for &pred in &cfg.node(node).predecessors {
            if body.insert(pred) {
                worklist.push(pred);
            }
        }
    }
    body
}
