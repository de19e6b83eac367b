use bimap::BiMap;
use strum::IntoEnumIterator;

use crate::error::Error;
use crate::op::{HandOp, Opcode};
use crate::symbol::Symbol;

/// What an opcode does once dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    Hand(HandOp),
    Found(Symbol),
}

/// Bidirectional mnemonic <-> opcode map.
///
/// Opcodes are handed out densely in registration order: `stop` is always 0,
/// the hand-coded instructions follow, then every registered symbol. Entries
/// are never removed or renumbered.
#[derive(Debug, Clone)]
pub struct OpTable {
    names: BiMap<String, Opcode>,
    kinds: Vec<Kind>,
}

impl OpTable {
    pub fn new() -> Self {
        let mut table = OpTable {
            names: BiMap::new(),
            kinds: Vec::new(),
        };
        for op in HandOp::iter() {
            table.names.insert(op.mnemonic().to_string(), op.opcode());
            table.kinds.push(Kind::Hand(op));
        }
        table
    }

    pub fn with_symbols<'a>(
        symbols: impl IntoIterator<Item = &'a Symbol>,
    ) -> Result<Self, Error> {
        let mut table = OpTable::new();
        for sym in symbols {
            table.register(&sym.mnemonic, Kind::Found(sym.clone()))?;
        }
        Ok(table)
    }

    /// Assign the next free opcode to `mnemonic`.
    pub fn register(&mut self, mnemonic: &str, kind: Kind) -> Result<Opcode, Error> {
        if self.names.contains_left(mnemonic) {
            return Err(Error::RedefinedMnemonic(mnemonic.to_string()));
        }
        let opcode = self.kinds.len() as Opcode;
        self.names.insert(mnemonic.to_string(), opcode);
        self.kinds.push(kind);
        Ok(opcode)
    }

    pub fn lookup(&self, mnemonic: &str) -> Option<Opcode> {
        self.names.get_by_left(mnemonic).copied()
    }

    pub fn name_of(&self, opcode: Opcode) -> Option<&str> {
        self.names.get_by_right(&opcode).map(|s| s.as_str())
    }

    pub fn kind(&self, opcode: Opcode) -> Option<&Kind> {
        self.kinds.get(opcode as usize)
    }

    pub fn has_operand(&self, opcode: Opcode) -> bool {
        matches!(self.kind(opcode), Some(Kind::Hand(op)) if op.has_operand())
    }

    /// Next free opcode.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Opcode, &str, &Kind)> + '_ {
        self.kinds.iter().enumerate().map(|(idx, kind)| {
            let opcode = idx as Opcode;
            let name = self.name_of(opcode).unwrap_or_default();
            (opcode, name, kind)
        })
    }
}

impl Default for OpTable {
    fn default() -> Self {
        OpTable::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::STOP;

    fn table() -> OpTable {
        OpTable::with_symbols(&[
            Symbol::constant("CUDART_PI_F", "3.141592654f"),
            Symbol::unary("sinf"),
            Symbol::binary("atan2f", true),
        ])
        .unwrap()
    }

    #[test]
    fn seeded_with_hand_ops() {
        let table = OpTable::new();
        assert_eq!(table.len(), 14);
        assert_eq!(table.lookup("stop"), Some(STOP));
        assert_eq!(table.lookup("push"), Some(1));
        assert_eq!(table.lookup("quit"), Some(13));
        assert_eq!(table.name_of(0), Some("stop"));
        assert_eq!(table.lookup("sinf"), None);
    }

    #[test]
    fn symbols_follow_hand_ops_in_order() {
        let table = table();
        assert_eq!(table.lookup("CUDART_PI_F"), Some(14));
        assert_eq!(table.lookup("sinf"), Some(15));
        assert_eq!(table.lookup("atan2"), Some(16));
        assert_eq!(table.lookup("atan2f"), None);
    }

    #[test]
    fn name_of_is_total_and_inverse() {
        let table = table();
        for op in 0..table.len() as Opcode {
            let name = table.name_of(op).unwrap();
            assert_eq!(table.lookup(name), Some(op));
        }
        assert_eq!(table.name_of(table.len() as Opcode), None);
    }

    #[test]
    fn register_rejects_duplicate() {
        let mut table = OpTable::new();
        let err = table.register("add", Kind::Found(Symbol::unary("add")));
        assert_eq!(err, Err(Error::RedefinedMnemonic("add".to_string())));
        assert_eq!(table.len(), 14);
        assert_eq!(table.register("expf", Kind::Found(Symbol::unary("expf"))), Ok(14));
    }

    #[test]
    fn operand_slots() {
        let table = table();
        assert!(table.has_operand(HandOp::Push.opcode()));
        assert!(table.has_operand(HandOp::Jmp.opcode()));
        assert!(!table.has_operand(HandOp::Ret.opcode()));
        assert!(!table.has_operand(15));
        assert!(!table.has_operand(99));
    }
}
