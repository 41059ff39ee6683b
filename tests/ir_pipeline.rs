use std::sync::{Arc, Mutex};

use quickcheck::{QuickCheck, TestResult};
use tracing::info;

use avm2_ast_normalizer::config::{PassConfig, AST_NORMALIZE, CANONICAL_CHECK};
use avm2_ast_normalizer::ir::ast::Ast;
use avm2_ast_normalizer::ir::node::{Child, NodeKind};
use avm2_ast_normalizer::ir::pipeline::{Pass, Pipeline, Transform};
use avm2_ast_normalizer::ir::printer::to_sexpr;
use avm2_ast_normalizer::ir::sexpr::parse;
use avm2_ast_normalizer::ir::transforms::ast_normalize::AstNormalize;
use avm2_ast_normalizer::ir::transforms::canonical_check::CanonicalCheck;
use avm2_ast_normalizer::NormalizeError;
use test_utils::ir::generator::Body;

fn run_standard(src: &str, config: &PassConfig) -> (String, CanonicalCheck) {
    let check = Arc::new(Mutex::new(CanonicalCheck::new()));
    let pipeline = Pipeline::from_config(config, check.clone()).unwrap();
    let (ast, ()) = pipeline.apply(parse(src).unwrap(), ()).unwrap();
    let check = check.lock().unwrap().clone();
    (to_sexpr(&ast, ast.root()), check)
}

/// Drops `nop` statements left directly under the root.
struct DropNops;

impl Pass for DropNops {
    fn name(&self) -> &str {
        "drop-nops"
    }

    fn run(&self, ast: &mut Ast) {
        let root = ast.root();
        let kept: Vec<Child> = ast
            .children(root)
            .iter()
            .filter(|c| !matches!(c, Child::Node(n) if *ast.kind(*n) == NodeKind::Nop))
            .cloned()
            .collect();
        ast.set_children(root, kept);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_pipeline_normalizes_and_checks() {
        let _ = avm2_ast_normalizer::logging::init_logger(false, Some("warn"), false);

        let (out, check) = run_standard("(block (pop (call_property_void o m)) (kill 0))", &PassConfig::default());
        assert_eq!(out, "(block (call_property o m) (nop) (nop))");
        assert!(check.is_canonical());
    }

    #[test]
    fn test_skipping_normalization_leaves_findings() {
        let config = PassConfig::from_skip_list(&[AST_NORMALIZE]);
        let (out, check) = run_standard("(block (pop x) (jump_if true L (if_eq a b)))", &config);
        assert_eq!(out, "(block (pop x) (jump_if true L (if_eq a b)))");
        let kinds: Vec<String> = check.remaining().iter().map(|(_, k)| k.to_string()).collect();
        assert_eq!(kinds, vec!["pop", "if_eq"]);
    }

    #[test]
    fn test_custom_pass_runs_after_normalization() {
        let mut pipeline = Pipeline::new();
        pipeline
            .add_transform(Transform::rewrite(AST_NORMALIZE, Arc::new(AstNormalize::new())))
            .unwrap();
        pipeline
            .add_transform(Transform::rewrite("drop-nops", Arc::new(DropNops)).after(AST_NORMALIZE))
            .unwrap();

        let ast = parse("(block (debug_line 1) (pop (get_local 0)) (return_void))").unwrap();
        let (ast, count) = pipeline.apply(ast, 7_u32).unwrap();
        assert_eq!(count, 7);
        assert_eq!(to_sexpr(&ast, ast.root()), "(block (get_local 0) (return_void))");
    }

    #[test]
    fn test_unknown_dependency_is_an_error() {
        let mut pipeline = Pipeline::new();
        let err = pipeline
            .add_transform(Transform::rewrite("drop-nops", Arc::new(DropNops)).after(CANONICAL_CHECK))
            .unwrap_err();
        assert!(matches!(err, NormalizeError::UnknownDependency { .. }));
        assert_eq!(
            err.to_string(),
            "transform 'drop-nops' depends on unknown transform 'canonical-check'"
        );
    }

    #[test]
    fn test_property_normalization_is_idempotent() {
        fn prop(body: Body) -> TestResult {
            let code = body.to_string();
            info!("Testing tree: {}", code);
            let ast = match parse(&code) {
                Ok(ast) => ast,
                Err(_) => return TestResult::failed(),
            };
            let normalize = AstNormalize::new();
            let (once, ()) = normalize.transform(ast, ());
            let first = to_sexpr(&once, once.root());
            let (twice, ()) = normalize.transform(once, ());
            let second = to_sexpr(&twice, twice.root());
            TestResult::from_bool(first == second)
        }

        QuickCheck::new()
            .tests(500)
            .max_tests(5000)
            .quickcheck(prop as fn(Body) -> TestResult);
    }

    #[test]
    fn test_property_output_is_canonical() {
        fn prop(body: Body) -> TestResult {
            let code = body.to_string();
            let (out, check) = run_standard(&code, &PassConfig::default());
            if !check.is_canonical() {
                info!("Non-canonical output {} from {}", out, code);
                return TestResult::failed();
            }
            // Every pop, kill and debug hint leaves exactly one nop behind.
            TestResult::from_bool(out.matches("(nop)").count() == body.nop_count())
        }

        QuickCheck::new()
            .tests(500)
            .max_tests(5000)
            .quickcheck(prop as fn(Body) -> TestResult);
    }

    #[test]
    fn test_property_output_reads_back() {
        fn prop(body: Body) -> TestResult {
            let (out, _) = run_standard(&body.to_string(), &PassConfig::default());
            match parse(&out) {
                Ok(ast) => TestResult::from_bool(to_sexpr(&ast, ast.root()) == out),
                Err(_) => TestResult::failed(),
            }
        }

        QuickCheck::new()
            .tests(200)
            .quickcheck(prop as fn(Body) -> TestResult);
    }
}
