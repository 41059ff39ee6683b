pub mod ast_normalize;
pub mod canonical_check;
pub mod conditional;
