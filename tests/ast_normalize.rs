use std::any::Any;
use std::sync::Arc;

use indoc::indoc;

use avm2_ast_normalizer::ir::ast::Ast;
use avm2_ast_normalizer::ir::node::{Child, ComparisonOp, Condition, Leaf, Metadata, NodeId, NodeKind};
use avm2_ast_normalizer::ir::printer::to_sexpr;
use avm2_ast_normalizer::ir::sexpr::parse;
use avm2_ast_normalizer::ir::transforms::ast_normalize::AstNormalize;
use avm2_ast_normalizer::ir::transforms::canonical_check::CanonicalCheck;

fn labelled(label: usize) -> Option<Arc<Metadata>> {
    let mut data = Metadata::new();
    data.insert("label".to_string(), Arc::new(label) as Arc<dyn Any + Send + Sync>);
    Some(Arc::new(data))
}

fn label(ast: &Ast, id: NodeId) -> Option<usize> {
    ast.metadata(id)?.get("label")?.downcast_ref::<usize>().copied()
}

fn normalize_text(src: &str) -> String {
    let ast = parse(src).expect("fixture parses");
    let (ast, ()) = AstNormalize::new().transform(ast, ());
    to_sexpr(&ast, ast.root())
}

/// `(block <node>)` with the block as root.
fn in_block(ast: &mut Ast, node: NodeId) {
    let root = ast.root();
    ast.set_children(root, vec![node.into()]);
}

#[test]
fn test_pop_keeps_metadata_on_trailing_nop() {
    let _ = avm2_ast_normalizer::logging::init_logger(false, Some("warn"), false);

    let mut ast = Ast::new(NodeKind::other("block"), None);
    let value = ast.leaf_node(NodeKind::other("get_local"), vec![Leaf::Int(1)]);
    let pop = ast.add_node(NodeKind::Pop, vec![value.into()], labelled(12));
    in_block(&mut ast, pop);

    AstNormalize::new().normalize(&mut ast);

    let root = ast.root();
    let children = ast.children(root).to_vec();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0], Child::Node(value));
    let nop = children[1].as_node().unwrap();
    assert_eq!(ast.kind(nop), &NodeKind::Nop);
    assert!(ast.children(nop).is_empty());
    assert_eq!(label(&ast, nop), Some(12));
    assert_eq!(ast.parent(value), Some(root));
    assert_eq!(ast.index(nop), 1);
}

#[test]
fn test_void_call_keeps_identity_children_and_metadata() {
    let mut ast = Ast::new(NodeKind::other("block"), None);
    let call = ast.add_node(
        NodeKind::CallPropertyVoid,
        vec![Child::str("this"), Child::str("trace"), Child::Leaf(Leaf::Int(1))],
        labelled(3),
    );
    in_block(&mut ast, call);

    AstNormalize::new().normalize(&mut ast);

    assert_eq!(ast.children(ast.root()), &[Child::Node(call)]);
    assert_eq!(ast.kind(call), &NodeKind::CallProperty);
    assert_eq!(ast.children(call).len(), 3);
    assert_eq!(label(&ast, call), Some(3));
}

#[test]
fn test_conditional_under_jump_if_keeps_node_identity() {
    let mut ast = Ast::new(NodeKind::other("block"), None);
    let a = ast.leaf_node(NodeKind::other("get_local"), vec![Leaf::Int(1)]);
    let b = ast.leaf_node(NodeKind::other("get_local"), vec![Leaf::Int(2)]);
    let cond = ast.add_node(NodeKind::If(Condition::Nge), vec![a.into(), b.into()], labelled(40));
    let jump = ast.add_node(NodeKind::JumpIf, vec![Child::bool(true), Child::str("L7"), cond.into()], None);
    in_block(&mut ast, jump);

    AstNormalize::new().normalize(&mut ast);

    assert_eq!(ast.kind(cond), &NodeKind::Compare(ComparisonOp::Ge));
    assert_eq!(ast.children(cond), &[Child::Node(a), Child::Node(b)]);
    assert_eq!(label(&ast, cond), Some(40));
    assert_eq!(ast.children(jump)[0], Child::bool(false));
    assert_eq!(ast.parent(cond), Some(jump));
}

#[test]
fn test_every_condition_under_jump_if() {
    let cases = [
        ("eq", "==", true),
        ("ne", "!=", true),
        ("ge", ">=", true),
        ("nge", ">=", false),
        ("gt", ">", true),
        ("ngt", ">", false),
        ("le", "<=", true),
        ("nle", "<=", false),
        ("lt", "<", true),
        ("nlt", "<", false),
        ("strict_eq", "===", true),
        ("strict_ne", "===", false),
    ];
    for (cond, op, flag) in cases {
        let src = format!("(block (jump_if true L1 (if_{} a b)))", cond);
        let expected = format!("(block (jump_if {} L1 ({} a b)))", flag, op);
        assert_eq!(normalize_text(&src), expected, "if_{}", cond);
    }
}

#[test]
fn test_strict_conditions_are_asymmetric() {
    // strict_eq never flips, strict_ne always does, whatever the parent.
    assert_eq!(
        normalize_text("(block (jump_if false L1 (if_strict_eq a b)))"),
        "(block (jump_if false L1 (=== a b)))"
    );
    assert_eq!(
        normalize_text("(block (jump_if false L1 (if_strict_ne a b)))"),
        "(block (jump_if true L1 (=== a b)))"
    );
    assert_eq!(
        normalize_text("(block (ternary_if true (if_strict_ne a b x y)))"),
        "(block (ternary (=== a b) y x))"
    );
    assert_eq!(
        normalize_text("(block (ternary_if true (if_strict_eq a b x y)))"),
        "(block (ternary (=== a b) x y))"
    );
}

#[test]
fn test_ternary_if_moves_branches_out_of_operator() {
    let mut ast = Ast::new(NodeKind::other("block"), None);
    let a = ast.leaf_node(NodeKind::other("a"), vec![]);
    let b = ast.leaf_node(NodeKind::other("b"), vec![]);
    let t = ast.leaf_node(NodeKind::other("t"), vec![]);
    let f = ast.leaf_node(NodeKind::other("f"), vec![]);
    let op = ast.add_node(NodeKind::If(Condition::Gt), vec![a.into(), b.into(), t.into(), f.into()], None);
    let ternary = ast.add_node(NodeKind::TernaryIf, vec![Child::bool(true), op.into()], labelled(9));
    in_block(&mut ast, ternary);

    AstNormalize::new().normalize(&mut ast);

    assert_eq!(ast.kind(ternary), &NodeKind::Ternary);
    assert_eq!(ast.children(ternary), &[Child::Node(op), Child::Node(t), Child::Node(f)]);
    assert_eq!(ast.children(op), &[Child::Node(a), Child::Node(b)]);
    assert_eq!(ast.kind(op), &NodeKind::Compare(ComparisonOp::Gt));
    assert_eq!(ast.parent(t), Some(ternary));
    assert_eq!(ast.index(f), 2);
    assert_eq!(label(&ast, ternary), Some(9));
}

#[test]
fn test_ternary_if_boolean_orders_branches_by_flag() {
    assert_eq!(
        normalize_text("(block (ternary_if_boolean true c t f))"),
        "(block (ternary c t f))"
    );
    assert_eq!(
        normalize_text("(block (ternary_if_boolean false c t f))"),
        "(block (ternary c f t))"
    );
    assert_eq!(
        normalize_text("(block (ternary_if_boolean nil c t f))"),
        "(block (ternary c f t))"
    );
}

/// Normalizes `(block (ternary_if (get_local 0) (if_<cond> a b t f)))` and
/// returns the printed result with the node that held the flag slot.
fn normalize_node_flagged_ternary(cond: &str) -> (String, Ast, NodeId) {
    let src = format!("(block (ternary_if (get_local 0) (if_{} a b t f)))", cond);
    let mut ast = parse(&src).unwrap();
    let ternary = ast.children(ast.root())[0].as_node().unwrap();
    let flag = ast.children(ternary)[0].as_node().unwrap();

    AstNormalize::new().normalize(&mut ast);

    (to_sexpr(&ast, ast.root()), ast, flag)
}

#[test]
fn test_node_in_ternary_flag_slot_is_truthy() {
    let _ = avm2_ast_normalizer::logging::init_logger(false, Some("warn"), false);

    // Reversed: the node is negated to false, which swaps the branches.
    let (out, ast, flag) = normalize_node_flagged_ternary("nlt");
    assert_eq!(out, "(block (ternary (< a b) f t))");
    assert_eq!(ast.parent(flag), None);

    // Not reversed: the node counts as true and the branches keep their order.
    let (out, ast, flag) = normalize_node_flagged_ternary("lt");
    assert_eq!(out, "(block (ternary (< a b) t f))");
    assert_eq!(ast.parent(flag), None);
}

#[test]
fn test_stacked_coercions_normalize_idempotently() {
    let once = normalize_text("(block (and (coerce_b (coerce_b z)) y) (or x (coerce_b (coerce_b (if_true w)))))");
    assert_eq!(once, "(block (and z y) (or x w))");
    assert_eq!(normalize_text(&once), once);
}

#[test]
fn test_nested_ternaries() {
    let src = indoc! {r#"
        (block
          (set_local 1
            (ternary_if true
              (if_nle (get_local 2) 0
                (ternary_if true (if_false (coerce_b (get_local 3)) (push_int 1) (push_int 2)))
                (push_int 3)))))
    "#};
    assert_eq!(
        normalize_text(src),
        "(block (set_local 1 (ternary (<= (get_local 2) 0) (push_int 3) \
         (ternary (coerce_b (get_local 3)) (push_int 2) (push_int 1)))))"
    );
}

#[test]
fn test_coercions_stripped_under_boolean_consumers() {
    assert_eq!(normalize_text("(block (and (coerce_b x) y))"), "(block (and x y))");
    assert_eq!(
        normalize_text("(block (jump_if true L2 (coerce_b z)))"),
        "(block (jump_if true L2 z))"
    );
    assert_eq!(
        normalize_text("(block (set_local 0 (coerce_b z)))"),
        "(block (set_local 0 (coerce_b z)))"
    );
}

#[test]
fn test_hints_become_childless_nops_in_place() {
    let mut ast = Ast::new(NodeKind::other("block"), None);
    let file = ast.leaf_node(NodeKind::DebugFile, vec![Leaf::str("Main.as")]);
    let line = ast.leaf_node(NodeKind::DebugLine, vec![Leaf::Int(14)]);
    let kill = ast.leaf_node(NodeKind::Kill, vec![Leaf::Int(2)]);
    let root = ast.root();
    ast.set_children(root, vec![file.into(), line.into(), kill.into()]);

    AstNormalize::new().normalize(&mut ast);

    assert_eq!(ast.children(root), &[Child::Node(file), Child::Node(line), Child::Node(kill)]);
    for id in [file, line, kill] {
        assert_eq!(ast.kind(id), &NodeKind::Nop);
        assert!(ast.children(id).is_empty());
    }
}

#[test]
fn test_expand_at_root_survives() {
    assert_eq!(normalize_text("(pop (push_int 1))"), "(expand (push_int 1) (nop))");
}

#[test]
fn test_unknown_kinds_are_walked_but_untouched() {
    let src = "(method_body (with_scope (pop (call_super_void this m))) (label \"L1\" 2.5))";
    assert_eq!(
        normalize_text(src),
        "(method_body (with_scope (call_super this m) (nop)) (label L1 2.5))"
    );
}

#[test]
fn test_idempotent_on_realistic_body() {
    let src = indoc! {r#"
        ; for (i = 0; i < n; i++) trace(i > 2 ? "big" : "small");
        (block
          (debug_file "Main.as")
          (debug_line 3)
          (set_local 1 (push_byte 0))
          (jump_if true L12 (if_nlt (get_local 1) (get_local 2)))
          (pop (call_property_void (find_property_strict trace) trace
            (ternary_if true (if_gt (get_local 1) 2 (push_string "big") (push_string "small")))))
          (set_local 1 (increment_i (get_local 1)))
          (jump_if true L4 (if_true (and (coerce_b (get_local 3)) (if_false c x))))
          (kill 1)
          (return_void))
    "#};
    let once = normalize_text(src);
    let twice = normalize_text(&once);
    assert_eq!(once, twice);

    let ast = parse(&once).unwrap();
    let mut check = CanonicalCheck::new();
    check.check(&ast);
    assert!(check.is_canonical(), "{:?}", check.remaining());
}
