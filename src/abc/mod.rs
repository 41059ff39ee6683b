//! Pieces of the ABC (ActionScript Byte Code) file model that feed the tree.

pub mod method_info;
pub mod multiname;
pub mod opcodes;
