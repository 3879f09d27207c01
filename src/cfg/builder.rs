//! Two-pass CFG construction from a linear instruction stream (spec.md
//! §4.1): leader identification, then node connection.

use crate::cfg::{ControlFlowGraph, NodeId};
use crate::error::{CfgError, Result};
use crate::instruction::{Instruction, InstructionKind};
use std::collections::{HashMap, HashSet};

/// Build a [`ControlFlowGraph`] from an ordered instruction stream.
///
/// Fails with [`CfgError::UnknownBranchTarget`] or
/// [`CfgError::DuplicateLabel`] on malformed input; no partial graph is
/// ever returned in that case (spec.md §7).
pub fn build_cfg(instructions: &[Instruction]) -> Result<ControlFlowGraph> {
    let real_labels = collect_labels(instructions)?;
    let leaders = identify_leaders(instructions, &real_labels)?;

    let mut cfg = ControlFlowGraph::empty();
    for _ in 0..leaders.len() {
        cfg.add_basic_block();
    }
    connect_nodes(&mut cfg, instructions, &leaders);
    Ok(cfg)
}

/// The set of labels actually present in the instruction stream, used to
/// validate branch targets before any node is created. Also rejects
/// duplicate labels, which would otherwise corrupt leader lookups.
fn collect_labels(instructions: &[Instruction]) -> Result<HashSet<String>> {
    let mut labels = HashSet::with_capacity(instructions.len());
    for instr in instructions {
        if !labels.insert(instr.label.clone()) {
            return Err(CfgError::DuplicateLabel {
                label: instr.label.clone(),
            });
        }
    }
    Ok(labels)
}

/// Pass 1: scan for leader labels, in creation order, assigning each a
/// fresh `NodeId` starting at `2` (Entry/Exit occupy `0`/`1`).
fn identify_leaders(
    instructions: &[Instruction],
    real_labels: &HashSet<String>,
) -> Result<HashMap<String, NodeId>> {
    let mut leaders: HashMap<String, NodeId> = HashMap::new();
    let mut next_id: NodeId = 2;
    let mut next_is_leader = true;

    let mut mark_leader = |label: &str, leaders: &mut HashMap<String, NodeId>| {
        if !leaders.contains_key(label) {
            tracing::trace!(label, id = next_id, "leader discovered");
            leaders.insert(label.to_string(), next_id);
            next_id += 1;
        }
    };

    for instr in instructions {
        let is_leader = next_is_leader
            || matches!(
                instr.kind,
                InstructionKind::Try | InstructionKind::Catch | InstructionKind::Finally
            );
        next_is_leader = false;

        if is_leader {
            mark_leader(&instr.label, &mut leaders);
        }

        match &instr.kind {
            InstructionKind::UnconditionalBranch { target }
            | InstructionKind::ConditionalBranch { target }
            | InstructionKind::ExceptionalBranch { target } => {
                if !real_labels.contains(target) {
                    return Err(CfgError::UnknownBranchTarget {
                        label: instr.label.clone(),
                        target: target.clone(),
                    });
                }
                mark_leader(target, &mut leaders);
                next_is_leader = true;
            }
            InstructionKind::Return => {
                next_is_leader = true;
            }
            _ => {}
        }
    }

    tracing::debug!(count = leaders.len(), "leader identification complete");
    Ok(leaders)
}

/// Pass 2: walk the instruction stream again, appending each instruction
/// to the current block and wiring edges per spec.md §4.1.
fn connect_nodes(cfg: &mut ControlFlowGraph, instructions: &[Instruction], leaders: &HashMap<String, NodeId>) {
    let mut current = cfg.entry();
    let mut connect_with_previous = true;

    for instr in instructions {
        if let Some(&leader_id) = leaders.get(&instr.label) {
            let previous = current;
            current = leader_id;
            if connect_with_previous {
                cfg.add_edge(previous, current);
            }
            connect_with_previous = true;
        }

        cfg.node_mut(current).instructions.push(instr.clone());

        match &instr.kind {
            InstructionKind::UnconditionalBranch { target } => {
                cfg.add_edge(current, leaders[target]);
                connect_with_previous = false;
            }
            InstructionKind::ConditionalBranch { target } | InstructionKind::ExceptionalBranch { target } => {
                cfg.add_edge(current, leaders[target]);
                connect_with_previous = true;
            }
            InstructionKind::Return => {
                cfg.add_edge(current, cfg.exit());
            }
            _ => {}
        }
    }

    cfg.add_edge(current, cfg.exit());
}
