use indexmap::IndexMap;
use rpnarch::{HandOp, OpTable, Opcode, STOP};

use crate::error::Error;
use crate::label::Labels;
use crate::program::{Fixup, Program};
use crate::source::{Line, Pos, Sections};

/// Element of the code stream before label resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Op(Opcode),
    Imm(u32),
    Ref(String, Target),
}

/// Which label table a reference is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Code,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Immediates `#0` .. `#(bss - 1)` are accepted.
    pub bss: u32,
    /// Unresolved references and unknown mnemonics are errors. Otherwise an
    /// unresolved reference assembles to `stop` and is reported in
    /// `Program::unresolved`.
    pub strict: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bss: 64,
            strict: true,
        }
    }
}

pub struct Assembler<'a> {
    table: &'a OpTable,
    config: Config,
}

impl<'a> Assembler<'a> {
    pub fn new(table: &'a OpTable, config: Config) -> Self {
        Assembler { table, config }
    }

    pub fn assemble(&self, sections: &Sections) -> Result<Program, Error> {
        let mut program = Program::default();
        program.data = self.data_pass(&sections.data, &mut program.dlabels)?;
        let cells = self.code_pass(&sections.code, &mut program.clabels)?;
        self.resolve(cells, &mut program)?;
        Ok(program)
    }

    fn data_pass(&self, lines: &[Line], dlabels: &mut Labels) -> Result<Vec<f32>, Error> {
        let mut data = vec![];
        for line in lines {
            if let Some(label) = &line.label {
                define(dlabels, label, data.len(), &line.pos)?;
            }
            for word in &line.words {
                let value = word.parse::<f32>().map_err(|_| {
                    Error::ParseArgument(line.pos.clone(), word.clone(), "data".to_string())
                })?;
                data.push(value);
            }
        }
        Ok(data)
    }

    fn code_pass(&self, lines: &[Line], clabels: &mut Labels) -> Result<Vec<(Cell, Pos)>, Error> {
        let mut cells: Vec<(Cell, Pos)> = vec![];
        // Operand slot still open after `push` / `call` / `jmp`.
        let mut pending: Option<(Target, &str, &Pos)> = None;

        for line in lines {
            if let Some(label) = &line.label {
                define(clabels, label, cells.len(), &line.pos)?;
            }
            // One instruction per line, plus the operand it opens.
            let mut closed = false;
            for word in &line.words {
                if closed {
                    return Err(Error::SyntaxError(line.pos.clone(), word.clone()));
                }
                let cell = match pending.take() {
                    Some((target, _, _)) => self.operand(word, target, &line.pos)?,
                    None => match self.table.lookup(word) {
                        Some(op) => {
                            if self.table.has_operand(op) {
                                let target = match op == HandOp::Push.opcode() {
                                    true => Target::Data,
                                    false => Target::Code,
                                };
                                pending = Some((target, word.as_str(), &line.pos));
                            }
                            Cell::Op(op)
                        }
                        None if word.starts_with('#') => self.immediate(word, &line.pos)?,
                        None if self.config.strict => {
                            return Err(Error::UnknownOperation(line.pos.clone(), word.clone()))
                        }
                        None => Cell::Ref(word.clone(), Target::Code),
                    },
                };
                cells.push((cell, line.pos.clone()));
                closed = pending.is_none();
            }
        }

        match pending {
            Some((_, mnemonic, pos)) => Err(Error::MissingArgument(pos.clone(), mnemonic.to_string())),
            None => Ok(cells),
        }
    }

    fn operand(&self, word: &str, target: Target, pos: &Pos) -> Result<Cell, Error> {
        match word.starts_with('#') {
            true => self.immediate(word, pos),
            false => Ok(Cell::Ref(word.to_string(), target)),
        }
    }

    fn immediate(&self, word: &str, pos: &Pos) -> Result<Cell, Error> {
        let digits = &word[1..];
        let n = digits.parse::<u32>().map_err(|_| {
            Error::ParseArgument(pos.clone(), word.to_string(), "immediate".to_string())
        })?;
        if n >= self.config.bss {
            return Err(Error::ImmediateOutOfRange(pos.clone(), word.to_string(), self.config.bss));
        }
        Ok(Cell::Imm(n))
    }

    fn resolve(&self, cells: Vec<(Cell, Pos)>, program: &mut Program) -> Result<(), Error> {
        let mut fixups: IndexMap<(String, Target), (Pos, Vec<u32>)> = IndexMap::new();
        let ends_with_stop = matches!(cells.last(), Some((Cell::Op(STOP), _)));

        for (offset, (cell, pos)) in cells.into_iter().enumerate() {
            let word = match cell {
                Cell::Op(op) => op,
                Cell::Imm(n) => n,
                Cell::Ref(name, target) => {
                    fixups
                        .entry((name, target))
                        .or_insert_with(|| (pos, vec![]))
                        .1
                        .push(offset as u32);
                    STOP
                }
            };
            program.code.push(word);
        }

        for ((name, target), (pos, offsets)) in fixups {
            let labels = match target {
                Target::Code => &program.clabels,
                Target::Data => &program.dlabels,
            };
            match labels.get(&name) {
                Some(value) => {
                    for offset in offsets {
                        program.code[offset as usize] = value;
                    }
                }
                None if self.config.strict => return Err(Error::UndefinedLabel(pos, name)),
                None => program.unresolved.push(Fixup { pos, name, offsets }),
            }
        }

        if !ends_with_stop {
            program.code.push(STOP);
        }
        Ok(())
    }
}

fn define(labels: &mut Labels, name: &str, offset: usize, pos: &Pos) -> Result<(), Error> {
    match labels.insert(name, offset as u32) {
        Some(_) => Err(Error::RedefinedLabel(pos.clone(), name.to_string())),
        None => Ok(()),
    }
}

/// Section, assemble and return `text` against `table`.
pub fn assemble(path: &str, text: &str, table: &OpTable, config: Config) -> Result<Program, Error> {
    let sections = Sections::parse(path, text)?;
    Assembler::new(table, config).assemble(&sections)
}
