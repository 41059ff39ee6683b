//! Observer that reports node shapes the normalizer should have removed.

use tracing::{debug, warn};

use crate::ir::ast::Ast;
use crate::ir::node::{NodeId, NodeKind};
use crate::ir::pipeline::Observer;

/// Collects every reachable node whose kind must not survive normalization:
/// the eliminated kinds, non-root `expand` nodes, and `coerce_b` directly
/// under a boolean consumer.
#[derive(Debug, Default, Clone)]
pub struct CanonicalCheck {
    remaining: Vec<(NodeId, NodeKind)>,
}

impl CanonicalCheck {
    pub fn new() -> Self {
        CanonicalCheck::default()
    }

    /// Offending nodes from the last observed tree, in pre-order.
    pub fn remaining(&self) -> &[(NodeId, NodeKind)] {
        &self.remaining
    }

    pub fn is_canonical(&self) -> bool {
        self.remaining.is_empty()
    }

    pub fn check(&mut self, ast: &Ast) {
        self.remaining.clear();
        let root = ast.root();
        for id in ast.descendants() {
            let kind = ast.kind(id);
            if kind.is_eliminated() || (*kind == NodeKind::Expand && id != root) {
                self.remaining.push((id, kind.clone()));
            }
            if kind.consumes_boolean() {
                for child in ast.child_nodes(id) {
                    if *ast.kind(child) == NodeKind::CoerceB {
                        self.remaining.push((child, NodeKind::CoerceB));
                    }
                }
            }
        }

        if self.remaining.is_empty() {
            debug!("tree is canonical");
        } else {
            for (id, kind) in &self.remaining {
                warn!("non-canonical {} node {} remains", kind, id);
            }
        }
    }
}

impl Observer for CanonicalCheck {
    fn observe(&mut self, ast: &Ast) {
        self.check(ast);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::sexpr::parse;
    use crate::ir::transforms::ast_normalize::AstNormalize;

    #[test]
    fn test_reports_leftovers() {
        let ast = parse("(block (pop x) (and (coerce_b a) (not (coerce_b b))) (expand y))").unwrap();
        let mut check = CanonicalCheck::new();
        check.check(&ast);
        let kinds: Vec<_> = check.remaining().iter().map(|(_, k)| k.as_str()).collect();
        assert_eq!(kinds, vec!["pop", "coerce_b", "expand"]);
        assert!(!check.is_canonical());
    }

    #[test]
    fn test_root_expand_is_tolerated() {
        let ast = parse("(expand (nop))").unwrap();
        let mut check = CanonicalCheck::new();
        check.check(&ast);
        assert!(check.is_canonical());
    }

    #[test]
    fn test_normalized_tree_is_canonical() {
        let ast = parse("(block (pop (call_property_void o m)) (jump_if true L (if_nlt (coerce_b a) b)) (kill 2))")
            .unwrap();
        let (ast, ()) = AstNormalize::new().transform(ast, ());
        let mut check = CanonicalCheck::new();
        check.observe(&ast);
        assert!(check.is_canonical(), "left: {:?}", check.remaining());
    }
}
