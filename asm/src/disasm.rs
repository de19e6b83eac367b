use color_print::cformat;
use rpnarch::{HandOp, OpTable, Opcode};

use crate::label::Labels;
use crate::program::Program;
use crate::source::{CODE, DATA, END};

const GUTTER: usize = 12;

/// Left column for the element at `offset`. Extra labels sharing the offset
/// get a line of their own, in definition order.
fn prefix(labels: &Labels, offset: usize) -> String {
    let names: Vec<&str> = labels.names_at(offset as u32).collect();
    match names.split_last() {
        Some((last, rest)) => {
            let mut out: String = rest.iter().map(|name| format!("{name}:\n")).collect();
            out += &format!("{:<w$} ", format!("{last}:"), w = GUTTER - 1);
            out
        }
        None => " ".repeat(GUTTER),
    }
}

/// Labels just past the last element.
fn trailing(labels: &Labels, len: usize) -> String {
    labels
        .names_at(len as u32)
        .map(|name| format!("{name}:\n"))
        .collect()
}

fn operand(labels: &Labels, word: Opcode) -> String {
    match labels.name_at(word) {
        Some(label) => label.to_string(),
        None => format!("#{word}"),
    }
}

/// Render `program` back into source text the assembler accepts.
///
/// Re-assembling the result reproduces the same code and data arrays.
pub fn disassemble(program: &Program, table: &OpTable) -> String {
    let mut out = String::new();

    out += &format!("{DATA}\n");
    for (offset, datum) in program.data.iter().enumerate() {
        out += &format!("{}{:?}\n", prefix(&program.dlabels, offset), datum);
    }
    out += &trailing(&program.dlabels, program.data.len());

    out += &format!("{CODE}\n");
    let mut words = program.code.iter().enumerate();
    while let Some((offset, &word)) = words.next() {
        let name = match table.name_of(word) {
            Some(name) => name.to_string(),
            None => format!("#{word}"),
        };
        out += &prefix(&program.clabels, offset);
        out += &name;

        if table.has_operand(word) {
            let labels = match word == HandOp::Push.opcode() {
                true => &program.dlabels,
                false => &program.clabels,
            };
            if let Some((slot, &arg)) = words.next() {
                // A label on the operand slot puts the operand on its own line.
                match program.clabels.names_at(slot as u32).next() {
                    Some(_) => {
                        out += "\n";
                        out += &prefix(&program.clabels, slot);
                        out += &operand(labels, arg);
                    }
                    None => out += &format!(" {}", operand(labels, arg)),
                }
            }
        }
        out += "\n";
    }
    out += &trailing(&program.clabels, program.code.len());
    out += &format!("{END}\n");
    out
}

/// Coloured listing: offset, raw word, label and instruction per line.
pub fn listing(program: &Program, table: &OpTable) -> String {
    let mut lines = vec![];
    lines.push("+-[Data]-+------------------------------------------------".to_string());
    for (offset, datum) in program.data.iter().enumerate() {
        let label = program.dlabels.name_at(offset as u32).unwrap_or_default();
        lines.push(cformat!(
            "| 0x{:04X} | <cyan>{:<12}</> <yellow>{:+.9}</>",
            offset,
            label,
            datum
        ));
    }

    lines.push("+-[Code]-+------------------------------------------------".to_string());
    let mut words = program.code.iter().enumerate();
    while let Some((offset, &word)) = words.next() {
        let label = program.clabels.name_at(offset as u32).unwrap_or_default();
        let name = table.name_of(word).unwrap_or("?");
        let arg = match table.has_operand(word) {
            true => match words.next() {
                Some((_, &arg)) => {
                    let labels = match word == HandOp::Push.opcode() {
                        true => &program.dlabels,
                        false => &program.clabels,
                    };
                    match labels.name_at(arg) {
                        Some(name) => cformat!("<g>0x{:04X}({})</>", arg, name),
                        None => cformat!("<y>0x{:04X}</>", arg),
                    }
                }
                None => cformat!("<r,s>!!</>"),
            },
            false => String::new(),
        };
        lines.push(cformat!(
            "| 0x{:04X} | {:>3} | <m>{:<12}</> <r>{:<8}</>{}",
            offset,
            word,
            label,
            name,
            arg
        ));
    }
    lines.push("+--------+------------------------------------------------".to_string());
    lines.join("\n")
}
