//! Generic iterative dataflow engine (spec.md §4.5): forward and backward
//! fixed-point analyses parameterised by a caller-supplied [`Lattice`].
//!
//! The engine makes no assumptions about `T` beyond the contract on
//! [`Lattice`] itself; it's the same dependency-injection shape the
//! original source's analysis base class used virtual hooks for, made
//! concrete here as a trait rather than an inheritance axis (spec.md §6).

use crate::cfg::{ControlFlowGraph, NodeId};

/// The lattice contract a caller must supply to run an analysis.
///
/// `merge` must be commutative, associative, and monotonic (its result
/// must be `>=` each operand in the lattice order); `flow` must be
/// monotonic in its `input`. The engine does not verify either — a
/// non-monotonic lattice causes non-termination, which is a contract
/// violation on the caller's part, not a bug in the engine (spec.md §7).
pub trait Lattice {
    type Value: Clone;

    /// The boundary value: applied at Entry for a forward analysis, at
    /// Exit for a backward one.
    fn initial_value(&self, node: &CFGNodeRef<'_>) -> Self::Value;

    /// Starting value for every non-boundary node.
    fn default_value(&self, node: &CFGNodeRef<'_>) -> Self::Value;

    /// Join of two lattice points at a control-flow merge.
    fn merge(&self, a: &Self::Value, b: &Self::Value) -> Self::Value;

    /// The transfer function.
    fn flow(&self, node: &CFGNodeRef<'_>, input: &Self::Value) -> Self::Value;

    /// Fixed-point equality test.
    fn compare(&self, a: &Self::Value, b: &Self::Value) -> bool;
}

/// A read-only view of the node an analysis is running over, handed to
/// `Lattice` callbacks instead of the whole graph so they can't reach
/// into unrelated nodes or mutate the graph mid-analysis.
pub struct CFGNodeRef<'a> {
    pub id: NodeId,
    pub instructions: &'a [crate::instruction::Instruction],
}

/// Per-node result of a dataflow analysis: the merged value flowing in,
/// and the transfer function's output (spec.md §3's
/// `DataFlowAnalysisResult<T>`).
#[derive(Debug, Clone)]
pub struct DataFlowAnalysisResult<T> {
    pub input: T,
    pub output: T,
}

/// Run a forward analysis to a fixed point: `input` at each node is the
/// merge of predecessors' `output`; `output` is `flow(node, input)`.
/// Entry's `output` is seeded from `initial_value`; every other node
/// starts at `default_value`. Requires `cfg.forward_order()` to be
/// computable (i.e. the graph must have Entry).
pub fn forward_analysis<L: Lattice>(
    cfg: &mut ControlFlowGraph,
    lattice: &L,
) -> Vec<DataFlowAnalysisResult<L::Value>> {
    let order = cfg.forward_order().to_vec();
    let entry = cfg.entry();

    let mut results: Vec<Option<DataFlowAnalysisResult<L::Value>>> = (0..cfg.len()).map(|_| None).collect();
    for &id in &order {
        let node_ref = node_ref(cfg, id);
        let output = if id == entry {
            lattice.initial_value(&node_ref)
        } else {
            lattice.default_value(&node_ref)
        };
        results[id as usize] = Some(DataFlowAnalysisResult {
            input: output.clone(),
            output,
        });
    }

    let reachable: Vec<NodeId> = order.iter().copied().filter(|&id| id != entry).collect();

    let mut changed = true;
    let mut iterations = 0u32;
    while changed {
        changed = false;
        iterations += 1;
        for &id in &reachable {
            let predecessors: Vec<NodeId> = cfg
                .node(id)
                .predecessors
                .iter()
                .copied()
                .filter(|&p| cfg.node(p).forward_index >= 0)
                .collect();

            let node_input = merge_predecessor_outputs(&predecessors, &results, lattice);
            let node_ref = node_ref(cfg, id);
            let new_output = lattice.flow(&node_ref, &node_input);

            let entry = results[id as usize].as_mut().unwrap();
            entry.input = node_input;
            if !lattice.compare(&new_output, &entry.output) {
                entry.output = new_output;
                changed = true;
            }
        }
    }
    tracing::debug!(iterations, "forward dataflow converged");

    results.into_iter().map(|r| r.expect("every node seeded above")).collect()
}

/// Run a backward analysis to a fixed point: `output` at each node is
/// the merge of successors' `input`; `input` is `flow(node, output)`.
/// Exit's `input` is seeded from `initial_value`; every other node
/// starts at `default_value`.
pub fn backward_analysis<L: Lattice>(
    cfg: &mut ControlFlowGraph,
    lattice: &L,
) -> Vec<DataFlowAnalysisResult<L::Value>> {
    let order = cfg.backward_order().to_vec();
    let exit = cfg.exit();

    let mut results: Vec<Option<DataFlowAnalysisResult<L::Value>>> = (0..cfg.len()).map(|_| None).collect();
    for &id in &order {
        let node_ref = node_ref(cfg, id);
        let input = if id == exit {
            lattice.initial_value(&node_ref)
        } else {
            lattice.default_value(&node_ref)
        };
        results[id as usize] = Some(DataFlowAnalysisResult {
            input: input.clone(),
            output: input,
        });
    }

    let reachable: Vec<NodeId> = order.iter().copied().filter(|&id| id != exit).collect();

    let mut changed = true;
    let mut iterations = 0u32;
    while changed {
        changed = false;
        iterations += 1;
        for &id in &reachable {
            let successors: Vec<NodeId> = cfg
                .node(id)
                .successors
                .iter()
                .copied()
                .filter(|&s| cfg.node(s).backward_index >= 0)
                .collect();

            let node_output = merge_successor_inputs(&successors, &results, lattice);
            let node_ref = node_ref(cfg, id);
            let new_input = lattice.flow(&node_ref, &node_output);

            let entry = results[id as usize].as_mut().unwrap();
            entry.output = node_output;
            if !lattice.compare(&new_input, &entry.input) {
                entry.input = new_input;
                changed = true;
            }
        }
    }
    tracing::debug!(iterations, "backward dataflow converged");

    results.into_iter().map(|r| r.expect("every node seeded above")).collect()
}

fn node_ref(cfg: &ControlFlowGraph, id: NodeId) -> CFGNodeRef<'_> {
    CFGNodeRef {
        id,
        instructions: &cfg.node(id).instructions,
    }
}

fn merge_predecessor_outputs<L: Lattice>(
    predecessors: &[NodeId],
    results: &[Option<DataFlowAnalysisResult<L::Value>>],
    lattice: &L,
) -> L::Value {
    let mut iter = predecessors.iter().map(|&p| &results[p as usize].as_ref().unwrap().output);
    let first = iter.next().expect("Entry-reachable node must have a predecessor");
    let mut acc = first.clone();
    for value in iter {
        acc = lattice.merge(&acc, value);
    }
    acc
}

fn merge_successor_inputs<L: Lattice>(
    successors: &[NodeId],
    results: &[Option<DataFlowAnalysisResult<L::Value>>],
    lattice: &L,
) -> L::Value {
    let mut iter = successors.iter().map(|&s| &results[s as usize].as_ref().unwrap().input);
    match iter.next() {
        Some(first) => {
            let mut acc = first.clone();
            for value in iter {
                acc = lattice.merge(&acc, value);
            }
            acc
        }
        // A node with no successor in backward order (e.g. unreachable
        // to Exit) never actually gets iterated since its backward_index
        // is -1 and it's filtered out of `reachable` upstream; this arm
        // exists only for completeness of the match.
        None => unreachable!("node with no reachable successors is never iterated"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::ControlFlowGraph;
    use std::collections::BTreeSet;

    /// Reachable-definitions: `T = set<definition-site>`, `merge = union`,
    /// `flow(n, in) = (in \ kill(n)) ∪ gen(n)`.
    struct ReachingDefs {
        gen: Vec<BTreeSet<u32>>,
        kill: Vec<BTreeSet<u32>>,
    }

    impl Lattice for ReachingDefs {
        type Value = BTreeSet<u32>;

        fn initial_value(&self, _node: &CFGNodeRef<'_>) -> Self::Value {
            BTreeSet::new()
        }

        fn default_value(&self, _node: &CFGNodeRef<'_>) -> Self::Value {
            BTreeSet::new()
        }

        fn merge(&self, a: &Self::Value, b: &Self::Value) -> Self::Value {
            a.union(b).copied().collect()
        }

        fn flow(&self, node: &CFGNodeRef<'_>, input: &Self::Value) -> Self::Value {
            let mut out: Self::Value = input.difference(&self.kill[node.id as usize]).copied().collect();
            out.extend(&self.gen[node.id as usize]);
            out
        }

        fn compare(&self, a: &Self::Value, b: &Self::Value) -> bool {
            a == b
        }
    }

    fn diamond() -> (ControlFlowGraph, NodeId, NodeId, NodeId) {
        let mut cfg = ControlFlowGraph::empty();
        let a = cfg.add_basic_block();
        let b = cfg.add_basic_block();
        let c = cfg.add_basic_block();
        cfg.add_edge(cfg.entry(), a);
        cfg.add_edge(a, b);
        cfg.add_edge(a, c);
        cfg.add_edge(b, c);
        cfg.add_edge(c, cfg.exit());
        (cfg, a, b, c)
    }

    #[test]
    fn reaching_definitions_merge_at_join_point() {
        let (mut cfg, a, _b, c) = diamond();
        let mut gen = vec![BTreeSet::new(); cfg.len()];
        gen[a as usize].insert(1);
        let kill = vec![BTreeSet::new(); cfg.len()];
        let lattice = ReachingDefs { gen, kill };

        let results = forward_analysis(&mut cfg, &lattice);
        assert!(results[c as usize].input.contains(&1));
        assert!(results[c as usize].output.contains(&1));
    }

    #[test]
    fn kill_removes_definition_downstream() {
        let (mut cfg, a, b, c) = diamond();
        let mut gen = vec![BTreeSet::new(); cfg.len()];
        gen[a as usize].insert(1);
        let mut kill = vec![BTreeSet::new(); cfg.len()];
        kill[b as usize].insert(1);
        let lattice = ReachingDefs { gen, kill };

        let results = forward_analysis(&mut cfg, &lattice);
        assert!(!results[b as usize].output.contains(&1));
        // c is reached from both branches; b's path no longer carries 1,
        // but the other branch (through no intermediate) still does, so
        // the merged input at c still contains it.
        assert!(results[c as usize].input.contains(&1));
    }

    #[test]
    fn straight_line_converges_in_one_pass() {
        let mut cfg = ControlFlowGraph::empty();
        let bb = cfg.add_basic_block();
        cfg.add_edge(cfg.entry(), bb);
        cfg.add_edge(bb, cfg.exit());
        let gen = vec![BTreeSet::new(); cfg.len()];
        let kill = vec![BTreeSet::new(); cfg.len()];
        let lattice = ReachingDefs { gen, kill };

        let results = forward_analysis(&mut cfg, &lattice);
        assert!(results[bb as usize].output.is_empty());
    }

    #[test]
    fn unreachable_node_stays_at_default() {
        let mut cfg = ControlFlowGraph::empty();
        let reachable = cfg.add_basic_block();
        let unreachable = cfg.add_basic_block();
        cfg.add_edge(cfg.entry(), reachable);
        cfg.add_edge(reachable, cfg.exit());
        cfg.add_edge(unreachable, cfg.exit());

        let mut gen = vec![BTreeSet::new(); cfg.len()];
        gen[unreachable as usize].insert(9);
        let kill = vec![BTreeSet::new(); cfg.len()];
        let lattice = ReachingDefs { gen, kill };

        let results = forward_analysis(&mut cfg, &lattice);
        assert!(results[unreachable as usize].output.is_empty());
    }

    /// `T = bool` under OR, used as a minimal backward liveness-style
    /// check: a single definition at `a` is "live out" of every node
    /// that can still reach a use seeded at Exit's boundary.
    struct AlwaysLive;

    impl Lattice for AlwaysLive {
        type Value = bool;

        fn initial_value(&self, _node: &CFGNodeRef<'_>) -> Self::Value {
            true
        }

        fn default_value(&self, _node: &CFGNodeRef<'_>) -> Self::Value {
            false
        }

        fn merge(&self, a: &Self::Value, b: &Self::Value) -> Self::Value {
            *a || *b
        }

        fn flow(&self, _node: &CFGNodeRef<'_>, input: &Self::Value) -> Self::Value {
            *input
        }

        fn compare(&self, a: &Self::Value, b: &Self::Value) -> bool {
            a == b
        }
    }

    #[test]
    fn backward_analysis_propagates_from_exit() {
        let mut cfg = ControlFlowGraph::empty();
        let bb = cfg.add_basic_block();
        cfg.add_edge(cfg.entry(), bb);
        cfg.add_edge(bb, cfg.exit());

        let results = backward_analysis(&mut cfg, &AlwaysLive);
        assert!(results[bb as usize].input);
        assert!(results[cfg.entry() as usize].output);
    }
}
