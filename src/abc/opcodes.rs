//! Opcode numbers of the conditional branch family.

use crate::ir::node::Condition;

/// Maps a branch opcode to the condition it tests.
pub fn branch_condition(opcode: u8) -> Option<Condition> {
    let cond = match opcode {
        0x0c => Condition::Nlt,
        0x0d => Condition::Nle,
        0x0e => Condition::Ngt,
        0x0f => Condition::Nge,
        0x11 => Condition::True,
        0x12 => Condition::False,
        0x13 => Condition::Eq,
        0x14 => Condition::Ne,
        0x15 => Condition::Lt,
        0x16 => Condition::Le,
        0x17 => Condition::Gt,
        0x18 => Condition::Ge,
        0x19 => Condition::StrictEq,
        0x1a => Condition::StrictNe,
        _ => return None,
    };
    Some(cond)
}

/// Inverse of [`branch_condition`].
pub fn branch_opcode(cond: Condition) -> u8 {
    match cond {
        Condition::Nlt => 0x0c,
        Condition::Nle => 0x0d,
        Condition::Ngt => 0x0e,
        Condition::Nge => 0x0f,
        Condition::True => 0x11,
        Condition::False => 0x12,
        Condition::Eq => 0x13,
        Condition::Ne => 0x14,
        Condition::Lt => 0x15,
        Condition::Le => 0x16,
        Condition::Gt => 0x17,
        Condition::Ge => 0x18,
        Condition::StrictEq => 0x19,
        Condition::StrictNe => 0x1a,
    }
}

/// Stack operands a branch consumes: two for comparisons, one for
/// `iftrue`/`iffalse`.
pub fn operand_count(cond: Condition) -> usize {
    match cond {
        Condition::True | Condition::False => 1,
        _ => 2,
    }
}
