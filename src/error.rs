//! Error taxonomy for CFG construction.
//!
//! Only malformed-input cases are represented here. Internal invariant
//! violations (a missing immediate dominator during `intersect`, an
//! out-of-range `NodeId`) are bugs in the core and surface as panics via
//! `debug_assert!`/`unreachable!`, not as `CfgError` values — see spec.md
//! §7's propagation policy.

use thiserror::Error;

/// Errors raised while building a [`crate::cfg::ControlFlowGraph`] from an
/// instruction stream.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CfgError {
    /// A branch instruction's `target` label does not match any
    /// instruction in the same body.
    #[error("branch instruction {label:?} targets unknown label {target:?}")]
    UnknownBranchTarget { label: String, target: String },

    /// Two instructions in the same body share a label. Labels must be
    /// unique within a method body (data model invariant in spec.md §3);
    /// violating it would otherwise silently corrupt leader lookups.
    #[error("duplicate instruction label {label:?}")]
    DuplicateLabel { label: String },
}

pub type Result<T> = std::result::Result<T, CfgError>;
