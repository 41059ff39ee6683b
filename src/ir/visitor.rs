//! Dispatch-by-kind visitor over the [`Ast`] arena.
//!
//! Implementors override the `visit_*` methods for the kinds they handle. The
//! defaults do nothing, so a node whose kind has no override is left as is
//! while its children are still walked.
//!
//! # Order
//!
//! [`Visitor::visit_node`] walks a node's children first, then splices any of
//! them that were marked [`NodeKind::Expand`], and only then dispatches on the
//! node's *current* kind. A handler may therefore retag its parent (the parent
//! has not been dispatched yet) and rely on the parent's handler being chosen
//! from the new kind.

use super::ast::Ast;
use super::node::{Condition, NodeId, NodeKind};

pub trait Visitor {
    /// Entry point: visits the subtree rooted at `id`.
    fn visit_node(&self, ast: &mut Ast, id: NodeId) {
        for child in ast.child_nodes(id) {
            // A sibling's handler may have moved this child elsewhere.
            if ast.parent(child) == Some(id) {
                self.visit_node(ast, child);
            }
        }
        ast.splice_expanded(id);
        self.dispatch(ast, id);
    }

    /// Invokes the handler registered for the node's current kind.
    fn dispatch(&self, ast: &mut Ast, id: NodeId) {
        match ast.kind(id).clone() {
            NodeKind::Pop => self.visit_pop(ast, id),
            NodeKind::CallPropertyVoid => self.visit_call_property_void(ast, id),
            NodeKind::CallSuperVoid => self.visit_call_super_void(ast, id),
            NodeKind::If(cond) => self.visit_if(ast, id, cond),
            NodeKind::TernaryIf => self.visit_ternary_if(ast, id),
            NodeKind::TernaryIfBoolean => self.visit_ternary_if_boolean(ast, id),
            NodeKind::And => self.visit_and(ast, id),
            NodeKind::Or => self.visit_or(ast, id),
            NodeKind::JumpIf => self.visit_jump_if(ast, id),
            NodeKind::Kill => self.visit_kill(ast, id),
            NodeKind::Debug => self.visit_debug(ast, id),
            NodeKind::DebugFile => self.visit_debug_file(ast, id),
            NodeKind::DebugLine => self.visit_debug_line(ast, id),
            _ => self.visit_other(ast, id),
        }
    }

    fn visit_pop(&self, _ast: &mut Ast, _id: NodeId) {}

    fn visit_call_property_void(&self, _ast: &mut Ast, _id: NodeId) {}

    fn visit_call_super_void(&self, _ast: &mut Ast, _id: NodeId) {}

    /// Visits a conditional branch node `if_<cond>`.
    fn visit_if(&self, _ast: &mut Ast, _id: NodeId, _cond: Condition) {}

    fn visit_ternary_if(&self, _ast: &mut Ast, _id: NodeId) {}

    fn visit_ternary_if_boolean(&self, _ast: &mut Ast, _id: NodeId) {}

    fn visit_and(&self, _ast: &mut Ast, _id: NodeId) {}

    fn visit_or(&self, _ast: &mut Ast, _id: NodeId) {}

    fn visit_jump_if(&self, _ast: &mut Ast, _id: NodeId) {}

    fn visit_kill(&self, _ast: &mut Ast, _id: NodeId) {}

    fn visit_debug(&self, _ast: &mut Ast, _id: NodeId) {}

    fn visit_debug_file(&self, _ast: &mut Ast, _id: NodeId) {}

    fn visit_debug_line(&self, _ast: &mut Ast, _id: NodeId) {}

    /// Every kind without a dedicated method, including [`NodeKind::Other`].
    fn visit_other(&self, _ast: &mut Ast, _id: NodeId) {}
}
