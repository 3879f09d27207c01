//! ctrlflow-core: CFG construction, dominance analysis, natural-loop
//! identification, and a generic iterative dataflow engine.
//!
//! This crate is the analytical core only — it consumes an already-lifted
//! three-address instruction stream and a type model built elsewhere;
//! see [`instruction`] and [`types`] for the shapes it expects at that
//! boundary.

pub mod cfg;
pub mod dataflow;
pub mod error;
pub mod instruction;
pub mod types;

pub use cfg::{CFGEdge, CFGLoop, CFGNode, CFGNodeKind, ControlFlowGraph, NodeId};
pub use dataflow::{backward_analysis, forward_analysis, CFGNodeRef, DataFlowAnalysisResult, Lattice};
pub use error::{CfgError, Result};
pub use instruction::{Instruction, InstructionKind};
