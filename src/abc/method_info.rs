//! Method signatures and their tree form.

use std::sync::Arc;

use crate::ir::ast::Ast;
use crate::ir::node::{Child, Leaf, Metadata, NodeId, NodeKind};

use super::multiname::TypeName;

pub const NEED_ARGUMENTS: u8 = 0x01;
pub const NEED_ACTIVATION: u8 = 0x02;
pub const NEED_REST: u8 = 0x04;
pub const HAS_OPTIONAL: u8 = 0x08;
pub const SET_DXNS: u8 = 0x40;
pub const HAS_PARAM_NAMES: u8 = 0x80;

/// A method signature record.
///
/// `param_types` entries are `None` for untyped (`*`) parameters; likewise
/// `return_type`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodInfo {
    pub name: Option<String>,
    pub return_type: Option<TypeName>,
    pub param_types: Vec<Option<TypeName>>,
    /// Only meaningful when [`HAS_PARAM_NAMES`] is set.
    pub param_names: Vec<String>,
    pub flags: u8,
    /// Default values of the trailing optional parameters, present when
    /// [`HAS_OPTIONAL`] is set.
    pub options: Vec<Leaf>,
}

impl MethodInfo {
    pub fn param_count(&self) -> usize {
        self.param_types.len()
    }

    pub fn needs_arguments(&self) -> bool {
        self.flags & NEED_ARGUMENTS != 0
    }

    pub fn needs_activation(&self) -> bool {
        self.flags & NEED_ACTIVATION != 0
    }

    pub fn needs_rest(&self) -> bool {
        self.flags & NEED_REST != 0
    }

    pub fn has_optional(&self) -> bool {
        self.flags & HAS_OPTIONAL != 0
    }

    pub fn set_dxns(&self) -> bool {
        self.flags & SET_DXNS != 0
    }

    pub fn has_param_names(&self) -> bool {
        self.flags & HAS_PARAM_NAMES != 0
    }

    /// Declared parameter names, or `a0`, `a1`, ... when the record carries
    /// none. Missing trailing names fall back to the positional form.
    pub fn effective_param_names(&self) -> Vec<String> {
        (0..self.param_count())
            .map(|n| {
                self.has_param_names()
                    .then(|| self.param_names.get(n).cloned())
                    .flatten()
                    .unwrap_or_else(|| format!("a{}", n))
            })
            .collect()
    }

    /// Builds the signature subtree
    ///
    /// ```text
    /// (method name return_type (params (param a0 (type int)) (param a1 nil)))
    /// ```
    ///
    /// `name_override` replaces the record's own name. The root carries
    /// `method` (this record) and `label` (`index`) metadata.
    pub fn to_astlet(&self, ast: &mut Ast, index: usize, name_override: Option<&str>) -> NodeId {
        let name = match name_override.or(self.name.as_deref()) {
            Some(name) => Child::str(name),
            None => Child::nil(),
        };
        let return_type = match &self.return_type {
            Some(ty) => Child::Node(ty.to_astlet(ast)),
            None => Child::nil(),
        };

        let mut params = Vec::with_capacity(self.param_count());
        for (param_name, param_type) in self.effective_param_names().into_iter().zip(&self.param_types) {
            let ty = match param_type {
                Some(ty) => Child::Node(ty.to_astlet(ast)),
                None => Child::nil(),
            };
            let param = ast.add_node(NodeKind::other("param"), vec![Child::str(param_name), ty], None);
            params.push(Child::Node(param));
        }
        let params = ast.add_node(NodeKind::other("params"), params, None);

        let mut metadata = Metadata::new();
        metadata.insert("method".to_string(), Arc::new(self.clone()));
        metadata.insert("label".to_string(), Arc::new(index));

        ast.add_node(
            NodeKind::other("method"),
            vec![name, return_type, Child::Node(params)],
            Some(Arc::new(metadata)),
        )
    }
}

/// Reads the label metadata attached by [`MethodInfo::to_astlet`].
pub fn label_of(ast: &Ast, id: NodeId) -> Option<usize> {
    ast.metadata(id)?.get("label")?.downcast_ref::<usize>().copied()
}

/// Reads the method record attached by [`MethodInfo::to_astlet`].
pub fn method_of(ast: &Ast, id: NodeId) -> Option<&MethodInfo> {
    ast.metadata(id)?.get("method")?.downcast_ref::<MethodInfo>()
}
