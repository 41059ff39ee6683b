//! Type references as they appear in method signatures.

use std::fmt;

use crate::ir::ast::Ast;
use crate::ir::node::{Child, NodeId, NodeKind};

/// A possibly generic type name, e.g. `int` or `Vector.<String>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeName {
    pub name: String,
    pub params: Vec<TypeName>,
}

impl TypeName {
    pub fn new(name: impl Into<String>) -> Self {
        TypeName { name: name.into(), params: Vec::new() }
    }

    pub fn generic(name: impl Into<String>, params: Vec<TypeName>) -> Self {
        TypeName { name: name.into(), params }
    }

    pub fn is_generic(&self) -> bool {
        !self.params.is_empty()
    }

    /// `(type "int")`, or for generics
    /// `(generic_type (type "Vector") (type "int"))`.
    pub fn to_astlet(&self, ast: &mut Ast) -> NodeId {
        let base = ast.add_node(NodeKind::other("type"), vec![Child::str(&self.name)], None);
        if !self.is_generic() {
            return base;
        }
        let mut children = vec![Child::Node(base)];
        for param in &self.params {
            children.push(Child::Node(param.to_astlet(ast)));
        }
        ast.add_node(NodeKind::other("generic_type"), children, None)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.is_generic() {
            f.write_str(".<")?;
            for (i, param) in self.params.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", param)?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}
