//! Condition table for the `if_*` branch family.

use crate::ir::node::{ComparisonOp, Condition, NodeKind};

/// What a condition turns into once canonicalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Canonical {
    /// An explicit source-level comparison.
    Operator(ComparisonOp),
    /// `if_true` / `if_false`: no operator of their own, the node is spliced
    /// into its parent.
    Pseudo,
}

impl Canonical {
    pub fn kind(self) -> NodeKind {
        match self {
            Canonical::Operator(op) => NodeKind::Compare(op),
            Canonical::Pseudo => NodeKind::Expand,
        }
    }

    pub fn is_operator(self) -> bool {
        matches!(self, Canonical::Operator(_))
    }
}

/// Table entry: whether the enclosing flag is inverted, and the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub reversed: bool,
    pub canonical: Canonical,
}

const fn entry(reversed: bool, canonical: Canonical) -> Mapping {
    Mapping { reversed, canonical }
}

/// Looks up the canonical form of a branch condition.
///
/// `strict_ne` is reversed `===` rather than `!==`: lookup-switch lowering
/// expects strict inequality expressed this way.
pub const fn mapping(cond: Condition) -> Mapping {
    use Canonical::{Operator, Pseudo};
    use ComparisonOp as Op;

    match cond {
        Condition::Eq => entry(false, Operator(Op::Eq)),
        Condition::Ne => entry(false, Operator(Op::Ne)),
        Condition::Ge => entry(false, Operator(Op::Ge)),
        Condition::Nge => entry(true, Operator(Op::Ge)),
        Condition::Gt => entry(false, Operator(Op::Gt)),
        Condition::Ngt => entry(true, Operator(Op::Gt)),
        Condition::Le => entry(false, Operator(Op::Le)),
        Condition::Nle => entry(true, Operator(Op::Le)),
        Condition::Lt => entry(false, Operator(Op::Lt)),
        Condition::Nlt => entry(true, Operator(Op::Lt)),
        Condition::StrictEq => entry(false, Operator(Op::StrictEq)),
        Condition::StrictNe => entry(true, Operator(Op::StrictEq)),
        Condition::True => entry(false, Pseudo),
        Condition::False => entry(true, Pseudo),
    }
}
