//! Reader for the S-expression form of a tree.
//!
//! ```text
//! (jump_if true "L1" (if_nge (get_local 1) 10))
//! ```
//!
//! A list is a node: its head symbol is the kind, the rest are children.
//! Atoms are leaves: `true`, `false`, `nil`, integers, floats, quoted strings,
//! and bare symbols (read as strings). `;` comments run to end of line.
//!
//! Reading happens in two stages: winnow combinators produce a borrowed
//! [`RawExpr`] tree, which is then allocated into an [`Ast`].

use std::fs;
use std::path::Path;

use winnow::ascii::{digit0, digit1};
use winnow::combinator::{alt, cut_err, delimited, opt, preceded, repeat};
use winnow::error::{ContextError, ErrMode, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, one_of, take_till, take_while};

use crate::error::NormalizeError;

use super::ast::Ast;
use super::node::{Child, Leaf, NodeKind};

/// Parses a single tree. Trailing input other than whitespace and comments is
/// rejected.
pub fn parse(src: &str) -> Result<Ast, NormalizeError> {
    let raw = document.parse(src).map_err(|e| {
        let message = e.inner().to_string();
        let message = if message.is_empty() { "unexpected input".to_string() } else { message };
        NormalizeError::parse(e.offset(), message)
    })?;

    // Build into a placeholder root, then promote the parsed node.
    let mut ast = Ast::new(NodeKind::other("<document>"), None);
    match build(&mut ast, raw) {
        Child::Node(root) => ast.set_root(root),
        Child::Leaf(_) => unreachable!("document is always a list"),
    }
    Ok(ast)
}

/// Reads and parses the tree stored at `path`.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Ast, NormalizeError> {
    let src = fs::read_to_string(path)?;
    parse(&src)
}

#[derive(Debug, Clone, PartialEq)]
enum RawExpr<'a> {
    List { head: &'a str, items: Vec<RawExpr<'a>> },
    Str(String),
    Atom(&'a str),
}

fn build(ast: &mut Ast, raw: RawExpr<'_>) -> Child {
    match raw {
        RawExpr::List { head, items } => {
            let kind: NodeKind = match head.parse() {
                Ok(kind) => kind,
                Err(never) => match never {},
            };
            let children = items.into_iter().map(|item| build(ast, item)).collect();
            Child::Node(ast.add_node(kind, children, None))
        }
        RawExpr::Str(s) => Child::Leaf(Leaf::Str(s)),
        RawExpr::Atom(atom) => Child::Leaf(atom_to_leaf(atom)),
    }
}

// ============================================================================
// Winnow parsers
// ============================================================================

fn document<'a>(input: &mut &'a str) -> ModalResult<RawExpr<'a>> {
    delimited(trivia, list, trivia).parse_next(input)
}

/// Skips whitespace and `;` comments.
fn trivia(input: &mut &str) -> ModalResult<()> {
    repeat(
        0..,
        alt((
            take_while(1.., char::is_whitespace).void(),
            (';', take_till(0.., '\n')).void(),
        )),
    )
    .parse_next(input)
}

fn expr<'a>(input: &mut &'a str) -> ModalResult<RawExpr<'a>> {
    alt((list, quoted.map(RawExpr::Str), symbol.map(RawExpr::Atom))).parse_next(input)
}

fn list<'a>(input: &mut &'a str) -> ModalResult<RawExpr<'a>> {
    '('.parse_next(input)?;
    trivia.parse_next(input)?;
    let head = cut_err(symbol)
        .context(StrContext::Label("node kind"))
        .parse_next(input)?;
    let items: Vec<RawExpr<'a>> = repeat(0.., preceded(trivia, expr)).parse_next(input)?;
    trivia.parse_next(input)?;
    cut_err(')')
        .context(StrContext::Expected(StrContextValue::CharLiteral(')')))
        .parse_next(input)?;
    Ok(RawExpr::List { head, items })
}

fn symbol<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| !c.is_whitespace() && !matches!(c, '(' | ')' | '"' | ';')).parse_next(input)
}

/// Parses a string literal: `"content"` with `\n`, `\t`, `\"` and `\\`
/// escapes. Anything after the opening quote that fails is fatal.
fn quoted(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    cut_err(string_body)
        .context(StrContext::Label("string literal"))
        .parse_next(input)
}

fn string_body(input: &mut &str) -> ModalResult<String> {
    let mut out = String::new();
    loop {
        match any.parse_next(input)? {
            '"' => return Ok(out),
            '\\' => match any.parse_next(input)? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                c @ ('"' | '\\') => out.push(c),
                _ => return Err(ErrMode::Backtrack(ContextError::new())),
            },
            c => out.push(c),
        }
    }
}

/// Decimal float with optional fraction and exponent: `2.5`, `-1e20`, `3.`.
fn decimal(input: &mut &str) -> ModalResult<f64> {
    let s = (
        opt(one_of(['-', '+'])),
        digit1,
        opt(('.', digit0)),
        opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)),
    )
        .take()
        .parse_next(input)?;
    s.parse::<f64>()
        .map_err(|_| ErrMode::Backtrack(ContextError::new()))
}

fn atom_to_leaf(atom: &str) -> Leaf {
    match atom {
        "true" => Leaf::Bool(true),
        "false" => Leaf::Bool(false),
        "nil" => Leaf::Nil,
        _ => {
            if let Ok(i) = atom.parse::<i64>() {
                Leaf::Int(i)
            } else if let Ok(n) = decimal.parse(atom) {
                Leaf::Number(n)
            } else {
                // Symbols such as `inf`, `NaN` or `L12` stay strings.
                Leaf::Str(atom.to_string())
            }
        }
    }
}
