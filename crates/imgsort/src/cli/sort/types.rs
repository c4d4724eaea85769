//! CLI enum types for the sort command.

use clap::ValueEnum;
use imgsort_core::config::{SizeRule, TransferMode};

/// How files reach the destination tree.
#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum Transfer {
    /// Rename when possible, else copy, verify and delete the source
    Move,
    /// Copy and verify, leaving the source in place
    Copy,
}

impl From<Transfer> for TransferMode {
    fn from(value: Transfer) -> Self {
        match value {
            Transfer::Move => TransferMode::Move,
            Transfer::Copy => TransferMode::Copy,
        }
    }
}

/// Dimension the size thresholds are compared against.
#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum SizeRuleArg {
    /// The longer side decides the tier
    MaxDimension,
    /// Both sides must reach a threshold
    BothDimensions,
}

impl From<SizeRuleArg> for SizeRule {
    fn from(value: SizeRuleArg) -> Self {
        match value {
            SizeRuleArg::MaxDimension => SizeRule::MaxDimension,
            SizeRuleArg::BothDimensions => SizeRule::BothDimensions,
        }
    }
}

impl std::fmt::Display for SizeRuleArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizeRuleArg::MaxDimension => write!(f, "max-dimension"),
            SizeRuleArg::BothDimensions => write!(f, "both-dimensions"),
        }
    }
}
