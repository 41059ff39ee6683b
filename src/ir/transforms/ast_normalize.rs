//! Normalizes a stack-machine-shaped AVM2 expression tree.
//!
//! Removes evaluation-stack artifacts (`pop`, `*_void` calls, `coerce_b`
//! under boolean consumers, `kill`/`debug*` hints) and folds the `if_*`
//! branch family into comparison operators and `ternary` expressions.
//!
//! ```text
//! (pop x)                              -> (expand x (nop))
//! (call_property_void *)               -> (call_property *)
//! (jump_if true L (if_nge a b))        -> (jump_if false L (>= a b))
//! (ternary_if true (if_eq a b x y))    -> (ternary (== a b) x y)
//! (ternary_if_boolean false c x y)     -> (ternary c y x)
//! (and (coerce_b a) b)                 -> (and a b)
//! (debug_line 12)                      -> (nop)
//! ```

use tracing::{debug, trace};

use crate::ir::ast::Ast;
use crate::ir::node::{Child, Condition, NodeId, NodeKind};
use crate::ir::pipeline::Pass;
use crate::ir::visitor::Visitor;

use super::conditional::{mapping, Canonical};

#[derive(Debug, Default, Clone, Copy)]
pub struct AstNormalize;

impl AstNormalize {
    pub fn new() -> Self {
        AstNormalize
    }

    /// Normalizes `ast` in place and hands it back with `payload` untouched,
    /// so the stage composes with others that thread extra state through.
    pub fn transform<P>(&self, mut ast: Ast, payload: P) -> (Ast, P) {
        self.normalize(&mut ast);
        (ast, payload)
    }

    pub fn normalize(&self, ast: &mut Ast) {
        let root = ast.root();
        debug!("normalizing tree rooted at {} ({} slots)", root, ast.len());
        self.visit_node(ast, root);
    }

    /// Sets the node's kind and, for reversed conditions, negates the flag
    /// held in slot 0 of the parent.
    ///
    /// A reversed condition that itself sits in slot 0 is negated like any
    /// other node there: it is truthy, so it gets replaced by `false`.
    fn transform_conditional(&self, ast: &mut Ast, id: NodeId, canonical: Canonical, reversed: bool) {
        ast.retag(id, canonical.kind());
        if reversed {
            let parent = expect_parent(ast, id);
            ast.negate_flag(parent);
        }
    }

    /// Replaces each direct `coerce_b` child by the expression it wraps,
    /// unwrapping stacked coercions down to the first non-`coerce_b` operand.
    fn fix_boolean(&self, ast: &mut Ast, id: NodeId) {
        for index in 0..ast.children(id).len() {
            loop {
                let Child::Node(child) = ast.children(id)[index] else {
                    break;
                };
                if ast.kind(child) != &NodeKind::CoerceB {
                    break;
                }
                let inner = ast
                    .child(child, 0)
                    .cloned()
                    .unwrap_or_else(|| panic!("coerce_b {} has no operand", child));
                trace!("stripping coerce_b {} under {} {}", child, ast.kind(id), id);
                ast.replace_child(id, index, inner);
            }
        }
    }

    fn replace_with_nop(&self, ast: &mut Ast, id: NodeId) {
        ast.update(id, NodeKind::Nop, Some(Vec::new()));
    }
}

fn expect_parent(ast: &Ast, id: NodeId) -> NodeId {
    ast.parent(id)
        .unwrap_or_else(|| panic!("{} {} requires a parent", ast.kind(id), id))
}

impl Visitor for AstNormalize {
    // (pop x) -> (expand x (nop))
    fn visit_pop(&self, ast: &mut Ast, id: NodeId) {
        let child = ast
            .child(id, 0)
            .cloned()
            .unwrap_or_else(|| panic!("pop {} has no operand", id));
        let metadata = ast.metadata(id).cloned();
        let nop = ast.add_node(NodeKind::Nop, Vec::new(), metadata);
        ast.update(id, NodeKind::Expand, Some(vec![child, Child::Node(nop)]));
    }

    fn visit_call_property_void(&self, ast: &mut Ast, id: NodeId) {
        ast.retag(id, NodeKind::CallProperty);
    }

    fn visit_call_super_void(&self, ast: &mut Ast, id: NodeId) {
        ast.retag(id, NodeKind::CallSuper);
    }

    // Case order matters: the jump_if/explicit-operator case wins over the
    // ternary condition slot, which wins over the self-contained two-way test.
    fn visit_if(&self, ast: &mut Ast, id: NodeId, cond: Condition) {
        let entry = mapping(cond);
        let parent = expect_parent(ast, id);
        let parent_kind = ast.kind(parent).clone();

        if parent_kind == NodeKind::JumpIf || entry.canonical.is_operator() {
            trace!("if_{} {} -> {}", cond.as_str(), id, entry.canonical.kind());
            self.transform_conditional(ast, id, entry.canonical, entry.reversed);
        } else if parent_kind == NodeKind::TernaryIf && ast.index(id) == 1 {
            // Comparison-less ternary with this node in the condition slot.
            // The parent is dispatched after us and picks up the new kind.
            trace!("if_{} {} in condition slot of {}", cond.as_str(), id, parent);
            self.transform_conditional(ast, id, entry.canonical, entry.reversed);
            ast.retag(parent, NodeKind::TernaryIfBoolean);
        } else if ast.children(id).len() == 2 {
            // Implicit comparison outside any condition position: becomes a
            // ternary on its own.
            trace!("if_{} {} folded into a ternary", cond.as_str(), id);
            let mut children = vec![Child::bool(entry.reversed)];
            children.extend(ast.split_off_children(id, 0));
            ast.update(id, NodeKind::TernaryIfBoolean, Some(children));
            self.visit_ternary_if_boolean(ast, id);
        } else {
            self.transform_conditional(ast, id, entry.canonical, entry.reversed);
        }
    }

    // (ternary_if * (op a b x y)) -> (ternary_if_boolean * (op a b) x y)
    fn visit_ternary_if(&self, ast: &mut Ast, id: NodeId) {
        let op = match ast.child(id, 1) {
            Some(Child::Node(op)) => *op,
            other => panic!("ternary_if {} expects an operator node in slot 1, found {:?}", id, other),
        };
        let count = ast.children(op).len();
        assert!(count >= 2, "ternary_if {} operator {} carries no branch values", id, op);
        let branches = ast.split_off_children(op, count - 2);
        ast.push_children(id, branches);
        ast.retag(id, NodeKind::TernaryIfBoolean);
        self.visit_ternary_if_boolean(ast, id);
    }

    // (ternary_if_boolean true  c x y) -> (ternary c x y)
    // (ternary_if_boolean false c x y) -> (ternary c y x)
    fn visit_ternary_if_boolean(&self, ast: &mut Ast, id: NodeId) {
        let mut children = ast.split_off_children(id, 0);
        assert!(
            children.len() >= 3,
            "ternary_if_boolean {} needs a flag, a condition and branches, found {} children",
            id,
            children.len()
        );
        // A self-contained two-way test carries a single branch value.
        if children.len() == 3 {
            children.push(Child::nil());
        }
        let mut children = children.into_iter();
        let (Some(flag), Some(condition), Some(if_true), Some(if_false)) =
            (children.next(), children.next(), children.next(), children.next())
        else {
            unreachable!("length checked above");
        };

        let ordered = if flag.truthy() {
            vec![condition, if_true, if_false]
        } else {
            vec![condition, if_false, if_true]
        };
        ast.update(id, NodeKind::Ternary, Some(ordered));
    }

    fn visit_and(&self, ast: &mut Ast, id: NodeId) {
        self.fix_boolean(ast, id);
    }

    fn visit_or(&self, ast: &mut Ast, id: NodeId) {
        self.fix_boolean(ast, id);
    }

    fn visit_jump_if(&self, ast: &mut Ast, id: NodeId) {
        self.fix_boolean(ast, id);
    }

    fn visit_kill(&self, ast: &mut Ast, id: NodeId) {
        self.replace_with_nop(ast, id);
    }

    fn visit_debug(&self, ast: &mut Ast, id: NodeId) {
        self.replace_with_nop(ast, id);
    }

    fn visit_debug_file(&self, ast: &mut Ast, id: NodeId) {
        self.replace_with_nop(ast, id);
    }

    fn visit_debug_line(&self, ast: &mut Ast, id: NodeId) {
        self.replace_with_nop(ast, id);
    }
}

impl Pass for AstNormalize {
    fn name(&self) -> &str {
        "ast-normalize"
    }

    fn run(&self, ast: &mut Ast) {
        self.normalize(ast);
    }
}
