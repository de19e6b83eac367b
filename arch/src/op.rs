use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Instruction word in the assembled code stream.
pub type Opcode = u32;

/// Hand-coded instructions. The discriminant is the opcode, so the order of
/// the variants is the order of the lowest opcodes in every table.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    IntoPrimitive,
    TryFromPrimitive,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Display,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[repr(u32)]
pub enum HandOp {
    Stop = 0,
    Push,
    Pop,
    Add,
    Sub,
    Mul,
    Div,
    Swap,
    Invert,
    Call,
    Ret,
    Jmp,
    Noop,
    Quit,
}

impl HandOp {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.parse::<Self>() {
            Ok(a) => Ok(a),
            Err(_) => Err(format!("Undefined Op: {s}")),
        }
    }

    pub fn mnemonic(self) -> &'static str {
        self.into()
    }

    pub fn opcode(self) -> Opcode {
        self.into()
    }

    /// `push`, `call` and `jmp` consume the next code cell as their operand.
    pub fn has_operand(self) -> bool {
        matches!(self, HandOp::Push | HandOp::Call | HandOp::Jmp)
    }
}

pub const STOP: Opcode = HandOp::Stop as Opcode;

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test() {
        println!("{}", HandOp::Add);
        println!("{:?}", HandOp::parse("add"));
        println!("{:?}", HandOp::parse("hoge"));
        assert_eq!(HandOp::parse("invert"), Ok(HandOp::Invert));
        assert!(HandOp::parse("ADD").is_err());
    }

    #[test]
    fn opcodes_are_dense_from_stop() {
        for (idx, op) in HandOp::iter().enumerate() {
            assert_eq!(op.opcode(), idx as Opcode);
            assert_eq!(HandOp::try_from(idx as Opcode).ok(), Some(op));
        }
        assert_eq!(STOP, 0);
        assert_eq!(HandOp::Push.opcode(), 1);
        assert_eq!(HandOp::Quit.opcode(), 13);
    }

    #[test]
    fn operand_slots() {
        let with: Vec<_> = HandOp::iter().filter(|op| op.has_operand()).collect();
        assert_eq!(with, vec![HandOp::Push, HandOp::Call, HandOp::Jmp]);
    }
}
