pub mod ast;
pub mod node;
pub mod pipeline;
pub mod printer;
pub mod sexpr;
pub mod transforms;
pub mod visitor;
