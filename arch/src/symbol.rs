use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoPrimitive, TryFromPrimitive,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Arity {
    Const = 0,
    Unary = 1,
    Binary = 2,
}

/// A constant or scalar function found in external declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// Name registered in the opcode table.
    pub mnemonic: String,
    /// Identifier the generated body refers to.
    pub target: String,
    pub arity: Arity,
    /// Literal text of a constant, as written in the declaration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Symbol {
    pub fn constant(name: &str, value: &str) -> Self {
        Symbol {
            mnemonic: name.to_string(),
            target: name.to_string(),
            arity: Arity::Const,
            value: Some(value.to_string()),
        }
    }

    pub fn unary(name: &str) -> Self {
        Symbol {
            mnemonic: name.to_string(),
            target: name.to_string(),
            arity: Arity::Unary,
            value: None,
        }
    }

    /// With `clip`, the trailing `f` of a single precision name is dropped
    /// from the mnemonic (`atan2f` is written `atan2`).
    pub fn binary(name: &str, clip: bool) -> Self {
        let mnemonic = match clip {
            true => name.strip_suffix('f').unwrap_or(name),
            false => name,
        };
        Symbol {
            mnemonic: mnemonic.to_string(),
            target: name.to_string(),
            arity: Arity::Binary,
            value: None,
        }
    }

    /// Literal of a constant as an `f32`, ignoring a C float suffix.
    pub fn literal(&self) -> Option<f32> {
        let value = self.value.as_deref()?;
        let value = value.trim_end_matches(['f', 'F']);
        value.parse().ok()
    }
}
