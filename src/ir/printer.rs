//! Renders trees back to S-expressions or JSON.

use serde::Serialize;

use crate::error::NormalizeError;

use super::ast::Ast;
use super::node::{Child, Leaf, NodeId};

/// Renders the subtree at `id` on a single line, in the form
/// [`super::sexpr::parse`] reads.
pub fn to_sexpr(ast: &Ast, id: NodeId) -> String {
    let mut out = String::new();
    write_node(ast, id, &mut out);
    out
}

/// Renders the subtree at `id` with one node per line, children indented by
/// two spaces. Leaf-only nodes stay on one line.
pub fn to_sexpr_pretty(ast: &Ast, id: NodeId) -> String {
    let mut out = String::new();
    write_node_pretty(ast, id, 0, &mut out);
    out
}

fn write_node(ast: &Ast, id: NodeId, out: &mut String) {
    out.push('(');
    out.push_str(ast.kind(id).as_str());
    for child in ast.children(id) {
        out.push(' ');
        match child {
            Child::Node(n) => write_node(ast, *n, out),
            Child::Leaf(leaf) => write_leaf(leaf, out),
        }
    }
    out.push(')');
}

fn write_node_pretty(ast: &Ast, id: NodeId, depth: usize, out: &mut String) {
    if ast.children(id).iter().all(|c| c.as_leaf().is_some()) {
        write_node(ast, id, out);
        return;
    }
    out.push('(');
    out.push_str(ast.kind(id).as_str());
    for child in ast.children(id) {
        out.push('\n');
        out.push_str(&"  ".repeat(depth + 1));
        match child {
            Child::Node(n) => write_node_pretty(ast, *n, depth + 1, out),
            Child::Leaf(leaf) => write_leaf(leaf, out),
        }
    }
    out.push(')');
}

fn write_leaf(leaf: &Leaf, out: &mut String) {
    match leaf {
        Leaf::Str(s) if is_bare_symbol(s) => out.push_str(s),
        Leaf::Str(s) => {
            out.push('"');
            for c in s.chars() {
                match c {
                    '"' => out.push_str("\\\""),
                    '\\' => out.push_str("\\\\"),
                    '\n' => out.push_str("\\n"),
                    '\t' => out.push_str("\\t"),
                    c => out.push(c),
                }
            }
            out.push('"');
        }
        other => out.push_str(&other.to_string()),
    }
}

// A string can be printed unquoted when reading it back yields the same string.
fn is_bare_symbol(s: &str) -> bool {
    !s.is_empty()
        && !matches!(s, "true" | "false" | "nil")
        && !s.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
        && !s.chars().any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '"' | ';' | '\\'))
}

/// Serializable view of a subtree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSnapshot {
    pub kind: String,
    pub children: Vec<ChildSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChildSnapshot {
    Node(NodeSnapshot),
    Leaf(Leaf),
}

pub fn snapshot(ast: &Ast, id: NodeId) -> NodeSnapshot {
    NodeSnapshot {
        kind: ast.kind(id).to_string(),
        children: ast
            .children(id)
            .iter()
            .map(|child| match child {
                Child::Node(n) => ChildSnapshot::Node(snapshot(ast, *n)),
                Child::Leaf(leaf) => ChildSnapshot::Leaf(leaf.clone()),
            })
            .collect(),
    }
}

pub fn to_json(ast: &Ast, id: NodeId) -> serde_json::Value {
    // Snapshots only hold strings and finite-or-null scalars.
    serde_json::to_value(snapshot(ast, id)).unwrap_or(serde_json::Value::Null)
}

/// Pretty-printed JSON text of the subtree at `id`.
pub fn to_json_string(ast: &Ast, id: NodeId) -> Result<String, NormalizeError> {
    Ok(serde_json::to_string_pretty(&snapshot(ast, id))?)
}
