pub mod abc;
pub mod config;
pub mod error;
pub mod ir;
pub mod logging;

pub use error::NormalizeError;
pub use ir::ast::Ast;
pub use ir::transforms::ast_normalize::AstNormalize;
