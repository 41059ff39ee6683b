//! Random bytecode-shaped trees for property-based testing.
//!
//! The shapes mirror what a stack-machine decompiler hands to the normalizer:
//! `pop`-wrapped expression statements, void calls, conditional branches with
//! their `if_*` conditions, `ternary_if` wrappers, `coerce_b` under boolean
//! operators and debug hints. Every generated tree is well-formed, so the
//! normalizer never hits one of its malformed-shape panics.
//!
//! Trees render to the S-expression text form via `Display`.

use quickcheck::{Arbitrary, Gen};
use std::fmt;

/// Maximum expression nesting.
const MAX_DEPTH: usize = 4;

/// Comparison conditions (everything but `true`/`false`).
const COMPARISONS: &[&str] = &[
    "eq", "ne", "ge", "nge", "gt", "ngt", "le", "nle", "lt", "nlt", "strict_eq", "strict_ne",
];

const NAMES: &[&str] = &["x", "y", "length", "push", "trace", "value", "flash.events:Event"];

#[derive(Clone, Debug)]
pub enum Expr {
    Local(u32),
    Int(i32),
    Name(String),
    Str(String),
    CoerceB(Box<Expr>),
    Binary { op: &'static str, lhs: Box<Expr>, rhs: Box<Expr> },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Call { receiver: Box<Expr>, name: String, args: Vec<Expr> },
    /// `(ternary_if <flag> (if_<cond> a b x y))`
    TernaryCompare { flag: bool, cond: &'static str, lhs: Box<Expr>, rhs: Box<Expr>, if_true: Box<Expr>, if_false: Box<Expr> },
    /// `(ternary_if <flag> (if_true c x y))` / `if_false`
    TernaryTest { flag: bool, positive: bool, test: Box<Expr>, if_true: Box<Expr>, if_false: Box<Expr> },
    /// A two-operand `if_true`/`if_false` outside any condition slot.
    SelfContainedTest { positive: bool, test: Box<Expr>, value: Box<Expr> },
    /// A single-operand `if_true`/`if_false` outside any condition slot.
    BareTest { positive: bool, test: Box<Expr> },
}

#[derive(Clone, Debug)]
pub enum Stmt {
    Pop(Expr),
    CallVoid { receiver: Expr, name: String, args: Vec<Expr> },
    CallSuperVoid { name: String, args: Vec<Expr> },
    JumpIfCompare { label: u32, cond: &'static str, lhs: Expr, rhs: Expr },
    JumpIfTest { label: u32, positive: bool, test: Expr },
    SetLocal(u32, Expr),
    ReturnValue(Expr),
    Kill(u32),
    DebugLine(u32),
    DebugFile(String),
    Debug(String),
}

/// A method body: `(block stmt*)`.
#[derive(Clone, Debug)]
pub struct Body {
    pub stmts: Vec<Stmt>,
}

/// Generates a random number in the range [min, max] inclusive.
fn gen_range(g: &mut Gen, min: u32, max: u32) -> u32 {
    min + (u32::arbitrary(g) % (max - min + 1))
}

fn gen_name(g: &mut Gen) -> String {
    g.choose(NAMES).unwrap().to_string()
}

fn gen_string(g: &mut Gen) -> String {
    let chars: Vec<char> = "ab \"\\;()".chars().collect();
    (0..gen_range(g, 0, 6)).map(|_| *g.choose(&chars).unwrap()).collect()
}

fn gen_cond(g: &mut Gen) -> &'static str {
    *g.choose(COMPARISONS).unwrap()
}

fn gen_args(g: &mut Gen, depth: usize) -> Vec<Expr> {
    (0..gen_range(g, 0, 2)).map(|_| gen_expr(g, depth)).collect()
}

fn gen_leaf_expr(g: &mut Gen) -> Expr {
    match gen_range(g, 0, 3) {
        0 => Expr::Local(gen_range(g, 0, 5)),
        1 => Expr::Int(i32::arbitrary(g)),
        2 => Expr::Name(gen_name(g)),
        _ => Expr::Str(gen_string(g)),
    }
}

fn gen_expr(g: &mut Gen, depth: usize) -> Expr {
    if depth == 0 {
        return gen_leaf_expr(g);
    }
    let d = depth - 1;
    let sub = |g: &mut Gen| Box::new(gen_expr(g, d));
    match gen_range(g, 0, 10) {
        0 => Expr::CoerceB(sub(g)),
        1 => Expr::Binary { op: *g.choose(&["add", "subtract", "multiply"]).unwrap(), lhs: sub(g), rhs: sub(g) },
        2 => Expr::And(sub(g), sub(g)),
        3 => Expr::Or(sub(g), sub(g)),
        4 => Expr::Call { receiver: sub(g), name: gen_name(g), args: gen_args(g, d) },
        5 => Expr::TernaryCompare {
            flag: bool::arbitrary(g),
            cond: gen_cond(g),
            lhs: sub(g),
            rhs: sub(g),
            if_true: sub(g),
            if_false: sub(g),
        },
        6 => Expr::TernaryTest {
            flag: bool::arbitrary(g),
            positive: bool::arbitrary(g),
            test: sub(g),
            if_true: sub(g),
            if_false: sub(g),
        },
        7 => Expr::SelfContainedTest { positive: bool::arbitrary(g), test: sub(g), value: sub(g) },
        8 => Expr::BareTest { positive: bool::arbitrary(g), test: sub(g) },
        _ => gen_leaf_expr(g),
    }
}

fn gen_stmt(g: &mut Gen, depth: usize) -> Stmt {
    match gen_range(g, 0, 10) {
        0 => Stmt::Pop(gen_expr(g, depth)),
        1 => Stmt::CallVoid { receiver: gen_expr(g, depth), name: gen_name(g), args: gen_args(g, depth) },
        2 => Stmt::CallSuperVoid { name: gen_name(g), args: gen_args(g, depth) },
        3 => Stmt::JumpIfCompare {
            label: gen_range(g, 0, 99),
            cond: gen_cond(g),
            lhs: gen_expr(g, depth),
            rhs: gen_expr(g, depth),
        },
        4 => Stmt::JumpIfTest { label: gen_range(g, 0, 99), positive: bool::arbitrary(g), test: gen_expr(g, depth) },
        5 => Stmt::SetLocal(gen_range(g, 0, 5), gen_expr(g, depth)),
        6 => Stmt::ReturnValue(gen_expr(g, depth)),
        7 => Stmt::Kill(gen_range(g, 0, 5)),
        8 => Stmt::DebugLine(gen_range(g, 1, 500)),
        9 => Stmt::DebugFile(format!("{}.as", gen_name(g))),
        _ => Stmt::Debug(gen_name(g)),
    }
}

impl Arbitrary for Expr {
    fn arbitrary(g: &mut Gen) -> Self {
        gen_expr(g, g.size().min(MAX_DEPTH))
    }
}

impl Arbitrary for Stmt {
    fn arbitrary(g: &mut Gen) -> Self {
        gen_stmt(g, g.size().min(MAX_DEPTH))
    }
}

impl Arbitrary for Body {
    fn arbitrary(g: &mut Gen) -> Self {
        let count = gen_range(g, 0, 8);
        Body { stmts: (0..count).map(|_| Stmt::arbitrary(g)).collect() }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let stmts = self.stmts.clone();
        Box::new((0..stmts.len()).map(move |skip| {
            let mut fewer = stmts.clone();
            fewer.remove(skip);
            Body { stmts: fewer }
        }))
    }
}

impl Body {
    /// Counts statements that become a `nop`: pops, kills and debug hints.
    pub fn nop_count(&self) -> usize {
        self.stmts
            .iter()
            .filter(|s| {
                matches!(s, Stmt::Pop(_) | Stmt::Kill(_) | Stmt::DebugLine(_) | Stmt::DebugFile(_) | Stmt::Debug(_))
            })
            .count()
    }
}

/// Escapes special characters for a quoted S-expression string.
fn escape_string(s: &str) -> String {
    let mut escaped = String::new();
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn test_tag(positive: bool) -> &'static str {
    if positive { "if_true" } else { "if_false" }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Expr]) -> fmt::Result {
    for arg in args {
        write!(f, " {}", arg)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Local(n) => write!(f, "(get_local {})", n),
            Expr::Int(i) => write!(f, "(push_int {})", i),
            Expr::Name(name) => write!(f, "(get_lex {})", name),
            Expr::Str(s) => write!(f, "(push_string \"{}\")", escape_string(s)),
            Expr::CoerceB(e) => write!(f, "(coerce_b {})", e),
            Expr::Binary { op, lhs, rhs } => write!(f, "({} {} {})", op, lhs, rhs),
            Expr::And(a, b) => write!(f, "(and {} {})", a, b),
            Expr::Or(a, b) => write!(f, "(or {} {})", a, b),
            Expr::Call { receiver, name, args } => {
                write!(f, "(call_property {} {}", receiver, name)?;
                write_args(f, args)?;
                f.write_str(")")
            }
            Expr::TernaryCompare { flag, cond, lhs, rhs, if_true, if_false } => write!(
                f,
                "(ternary_if {} (if_{} {} {} {} {}))",
                flag, cond, lhs, rhs, if_true, if_false
            ),
            Expr::TernaryTest { flag, positive, test, if_true, if_false } => write!(
                f,
                "(ternary_if {} ({} {} {} {}))",
                flag,
                test_tag(*positive),
                test,
                if_true,
                if_false
            ),
            Expr::SelfContainedTest { positive, test, value } => {
                write!(f, "({} {} {})", test_tag(*positive), test, value)
            }
            Expr::BareTest { positive, test } => write!(f, "({} {})", test_tag(*positive), test),
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Pop(e) => write!(f, "(pop {})", e),
            Stmt::CallVoid { receiver, name, args } => {
                write!(f, "(call_property_void {} {}", receiver, name)?;
                write_args(f, args)?;
                f.write_str(")")
            }
            Stmt::CallSuperVoid { name, args } => {
                write!(f, "(call_super_void (get_local 0) {}", name)?;
                write_args(f, args)?;
                f.write_str(")")
            }
            Stmt::JumpIfCompare { label, cond, lhs, rhs } => {
                write!(f, "(jump_if true L{} (if_{} {} {}))", label, cond, lhs, rhs)
            }
            Stmt::JumpIfTest { label, positive, test } => {
                write!(f, "(jump_if true L{} ({} {}))", label, test_tag(*positive), test)
            }
            Stmt::SetLocal(n, e) => write!(f, "(set_local {} {})", n, e),
            Stmt::ReturnValue(e) => write!(f, "(return_value {})", e),
            Stmt::Kill(n) => write!(f, "(kill {})", n),
            Stmt::DebugLine(n) => write!(f, "(debug_line {})", n),
            Stmt::DebugFile(file) => write!(f, "(debug_file \"{}\")", escape_string(file)),
            Stmt::Debug(name) => write!(f, "(debug 1 \"{}\" 0 0)", escape_string(name)),
        }
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(block")?;
        for stmt in &self.stmts {
            write!(f, " {}", stmt)?;
        }
        f.write_str(")")
    }
}
