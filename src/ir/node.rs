//! Node vocabulary for the decompiled AVM2 expression tree.
//!
//! A node is a kind tag plus an ordered list of heterogeneous children. Children
//! are either nested nodes (addressed by [`NodeId`] inside an [`super::ast::Ast`])
//! or opaque leaf values. Some shapes deliberately mix the two, e.g. the boolean
//! flag stored in slot 0 of `jump_if` and `ternary_if`.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

/// Extensible metadata attached to a node.
///
/// Upstream stages store things like the originating method (`"method"`) or a
/// source-offset label (`"label"`). Rewrites never inspect entries they do not
/// own; retagging a node keeps its metadata.
pub type Metadata = HashMap<String, Arc<dyn Any + Send + Sync>>;

/// Stable handle to a node slot in an [`super::ast::Ast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Comparison conditions encoded by the AVM2 `if*` branch family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    Eq,
    Ne,
    Ge,
    Nge,
    Gt,
    Ngt,
    Le,
    Nle,
    Lt,
    Nlt,
    StrictEq,
    StrictNe,
    True,
    False,
}

impl Condition {
    pub const ALL: [Condition; 14] = [
        Condition::Eq,
        Condition::Ne,
        Condition::Ge,
        Condition::Nge,
        Condition::Gt,
        Condition::Ngt,
        Condition::Le,
        Condition::Nle,
        Condition::Lt,
        Condition::Nlt,
        Condition::StrictEq,
        Condition::StrictNe,
        Condition::True,
        Condition::False,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Condition::Eq => "eq",
            Condition::Ne => "ne",
            Condition::Ge => "ge",
            Condition::Nge => "nge",
            Condition::Gt => "gt",
            Condition::Ngt => "ngt",
            Condition::Le => "le",
            Condition::Nle => "nle",
            Condition::Lt => "lt",
            Condition::Nlt => "nlt",
            Condition::StrictEq => "strict_eq",
            Condition::StrictNe => "strict_ne",
            Condition::True => "true",
            Condition::False => "false",
        }
    }

    fn from_suffix(s: &str) -> Option<Self> {
        Condition::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

/// Source-level comparison operators produced by conditional canonicalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Ge,
    Gt,
    Le,
    Lt,
    StrictEq,
}

impl ComparisonOp {
    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonOp::Eq => "==",
            ComparisonOp::Ne => "!=",
            ComparisonOp::Ge => ">=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Le => "<=",
            ComparisonOp::Lt => "<",
            ComparisonOp::StrictEq => "===",
        }
    }
}

/// The node type tag.
///
/// The vocabulary is open-ended: tags the normalizer has no rule for are kept
/// verbatim in [`NodeKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Pop,
    Nop,
    /// Pseudo-kind: the owning parent replaces this node by its children.
    Expand,
    CallPropertyVoid,
    CallProperty,
    CallSuperVoid,
    CallSuper,
    If(Condition),
    JumpIf,
    TernaryIf,
    TernaryIfBoolean,
    Ternary,
    And,
    Or,
    CoerceB,
    Kill,
    Debug,
    DebugFile,
    DebugLine,
    Compare(ComparisonOp),
    Other(String),
}

impl NodeKind {
    pub fn other(tag: impl Into<String>) -> Self {
        NodeKind::Other(tag.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Pop => "pop",
            NodeKind::Nop => "nop",
            NodeKind::Expand => "expand",
            NodeKind::CallPropertyVoid => "call_property_void",
            NodeKind::CallProperty => "call_property",
            NodeKind::CallSuperVoid => "call_super_void",
            NodeKind::CallSuper => "call_super",
            NodeKind::If(cond) => IF_TAGS[*cond as usize],
            NodeKind::JumpIf => "jump_if",
            NodeKind::TernaryIf => "ternary_if",
            NodeKind::TernaryIfBoolean => "ternary_if_boolean",
            NodeKind::Ternary => "ternary",
            NodeKind::And => "and",
            NodeKind::Or => "or",
            NodeKind::CoerceB => "coerce_b",
            NodeKind::Kill => "kill",
            NodeKind::Debug => "debug",
            NodeKind::DebugFile => "debug_file",
            NodeKind::DebugLine => "debug_line",
            NodeKind::Compare(op) => op.as_str(),
            NodeKind::Other(tag) => tag,
        }
    }

    /// Kinds that must not survive normalization.
    pub fn is_eliminated(&self) -> bool {
        matches!(
            self,
            NodeKind::Pop
                | NodeKind::CallPropertyVoid
                | NodeKind::CallSuperVoid
                | NodeKind::If(_)
                | NodeKind::TernaryIf
                | NodeKind::TernaryIfBoolean
                | NodeKind::Kill
                | NodeKind::Debug
                | NodeKind::DebugFile
                | NodeKind::DebugLine
        )
    }

    /// Kinds under which a `coerce_b` wrapper is redundant.
    pub fn consumes_boolean(&self) -> bool {
        matches!(self, NodeKind::And | NodeKind::Or | NodeKind::JumpIf)
    }
}

// Indexed by `Condition as usize`; order matches the enum declaration.
const IF_TAGS: [&str; 14] = [
    "if_eq",
    "if_ne",
    "if_ge",
    "if_nge",
    "if_gt",
    "if_ngt",
    "if_le",
    "if_nle",
    "if_lt",
    "if_nlt",
    "if_strict_eq",
    "if_strict_ne",
    "if_true",
    "if_false",
];

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "pop" => NodeKind::Pop,
            "nop" => NodeKind::Nop,
            "expand" => NodeKind::Expand,
            "call_property_void" => NodeKind::CallPropertyVoid,
            "call_property" => NodeKind::CallProperty,
            "call_super_void" => NodeKind::CallSuperVoid,
            "call_super" => NodeKind::CallSuper,
            "jump_if" => NodeKind::JumpIf,
            "ternary_if" => NodeKind::TernaryIf,
            "ternary_if_boolean" => NodeKind::TernaryIfBoolean,
            "ternary" => NodeKind::Ternary,
            "and" => NodeKind::And,
            "or" => NodeKind::Or,
            "coerce_b" => NodeKind::CoerceB,
            "kill" => NodeKind::Kill,
            "debug" => NodeKind::Debug,
            "debug_file" => NodeKind::DebugFile,
            "debug_line" => NodeKind::DebugLine,
            "==" => NodeKind::Compare(ComparisonOp::Eq),
            "!=" => NodeKind::Compare(ComparisonOp::Ne),
            ">=" => NodeKind::Compare(ComparisonOp::Ge),
            ">" => NodeKind::Compare(ComparisonOp::Gt),
            "<=" => NodeKind::Compare(ComparisonOp::Le),
            "<" => NodeKind::Compare(ComparisonOp::Lt),
            "===" => NodeKind::Compare(ComparisonOp::StrictEq),
            other => match other.strip_prefix("if_").and_then(Condition::from_suffix) {
                Some(cond) => NodeKind::If(cond),
                None => NodeKind::Other(other.to_string()),
            },
        };
        Ok(kind)
    }
}

/// Opaque leaf value stored among a node's children.
///
/// Serializes as the bare JSON scalar (`nil` as `null`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Leaf {
    Nil,
    Bool(bool),
    Int(i64),
    Number(f64),
    Str(String),
}

impl Leaf {
    pub fn str(s: impl Into<String>) -> Self {
        Leaf::Str(s.into())
    }
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leaf::Nil => f.write_str("nil"),
            Leaf::Bool(b) => write!(f, "{}", b),
            Leaf::Int(i) => write!(f, "{}", i),
            Leaf::Number(n) => write!(f, "{:?}", n),
            Leaf::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// One element of a node's children list.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Node(NodeId),
    Leaf(Leaf),
}

impl Child {
    pub fn bool(value: bool) -> Self {
        Child::Leaf(Leaf::Bool(value))
    }

    pub fn nil() -> Self {
        Child::Leaf(Leaf::Nil)
    }

    pub fn str(s: impl Into<String>) -> Self {
        Child::Leaf(Leaf::Str(s.into()))
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Child::Node(id) => Some(*id),
            Child::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Child::Leaf(leaf) => Some(leaf),
            Child::Node(_) => None,
        }
    }

    /// Dynamic-language truthiness: only `nil` and `false` are falsy.
    pub fn truthy(&self) -> bool {
        !matches!(self, Child::Leaf(Leaf::Nil) | Child::Leaf(Leaf::Bool(false)))
    }
}

impl From<NodeId> for Child {
    fn from(id: NodeId) -> Self {
        Child::Node(id)
    }
}

impl From<Leaf> for Child {
    fn from(leaf: Leaf) -> Self {
        Child::Leaf(leaf)
    }
}

impl From<bool> for Child {
    fn from(value: bool) -> Self {
        Child::Leaf(Leaf::Bool(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_round_trip() {
        for cond in Condition::ALL {
            let kind = NodeKind::If(cond);
            assert_eq!(kind.as_str().parse::<NodeKind>().unwrap(), kind);
            assert_eq!(kind.as_str(), format!("if_{}", cond.as_str()));
        }
        assert_eq!("===".parse::<NodeKind>().unwrap(), NodeKind::Compare(ComparisonOp::StrictEq));
        assert_eq!("get_local".parse::<NodeKind>().unwrap(), NodeKind::other("get_local"));
        assert_eq!("if_maybe".parse::<NodeKind>().unwrap(), NodeKind::other("if_maybe"));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Child::nil().truthy());
        assert!(!Child::bool(false).truthy());
        assert!(Child::bool(true).truthy());
        assert!(Child::Leaf(Leaf::Int(0)).truthy());
        assert!(Child::str("").truthy());
        assert!(Child::Node(NodeId(3)).truthy());
    }
}
