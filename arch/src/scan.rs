//! Discovery of constants and scalar functions in native header text.
//!
//! Discovery is split in two: `constants` / `functions` read text and return
//! descriptors, and a `Registry` admits them once per build. Reading the
//! headers themselves is left to the caller.

use indexmap::IndexMap;

use crate::op::HandOp;
use crate::symbol::{Arity, Symbol};

const DEFINE: &str = "#define";
const SCALAR: &str = "float";
const THROW: &str = "__THROW";

/// `#define NAME VALUE` lines whose value has a decimal point.
pub fn constants(text: &str) -> Vec<Symbol> {
    text.lines().filter_map(constant).collect()
}

fn constant(line: &str) -> Option<Symbol> {
    if !line.starts_with(DEFINE) {
        return None;
    }
    match line.split_whitespace().collect::<Vec<_>>().as_slice() {
        [DEFINE, name, value] if value.contains('.') && is_ident(name) => {
            Some(Symbol::constant(name, value))
        }
        _ => None,
    }
}

/// Lines starting with `signature` that declare a function of one or two
/// `float` parameters.
pub fn functions(text: &str, signature: &str, clip: bool) -> Vec<Symbol> {
    text.lines()
        .filter(|line| line.starts_with(signature))
        .filter_map(|line| function(line, clip))
        .collect()
}

fn function(line: &str, clip: bool) -> Option<Symbol> {
    let (_, decl) = line.split_once(SCALAR)?;
    let decl = decl.trim().trim_end_matches(';').trim_end();
    let decl = decl.strip_suffix(THROW).unwrap_or(decl).trim_end();

    let (name, args) = decl.split_once('(')?;
    let name = name.trim();
    let args = args.strip_suffix(')')?;
    if !is_ident(name) {
        return None;
    }

    let params: Vec<&str> = args.split(',').map(str::trim).collect();
    if !params.iter().all(|param| is_scalar_param(param)) {
        return None;
    }
    match params.len() {
        1 => Some(Symbol::unary(name)),
        2 => Some(Symbol::binary(name, clip)),
        _ => None,
    }
}

fn is_scalar_param(param: &str) -> bool {
    match param.split_whitespace().collect::<Vec<_>>().as_slice() {
        [SCALAR, ident] => is_ident(ident),
        _ => false,
    }
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(head) if head.is_ascii_alphabetic() || head == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// A hand-coded mnemonic, or nothing left after clipping, cannot name a
/// discovered symbol.
fn assignable(mnemonic: &str) -> bool {
    !mnemonic.is_empty() && HandOp::parse(mnemonic).is_err()
}

/// Symbols admitted for one build, in first-found order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    found: IndexMap<String, Symbol>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Admit symbols whose name (and mnemonic) has not been seen yet.
    /// Returns how many were new.
    pub fn admit(&mut self, symbols: impl IntoIterator<Item = Symbol>) -> usize {
        let mut count = 0;
        for sym in symbols {
            if !assignable(&sym.mnemonic)
                || self.found.contains_key(&sym.target)
                || self.has_mnemonic(&sym.mnemonic)
            {
                continue;
            }
            self.found.insert(sym.target.clone(), sym);
            count += 1;
        }
        count
    }

    pub fn scan_constants(&mut self, text: &str) -> usize {
        self.admit(constants(text))
    }

    pub fn scan_functions(&mut self, text: &str, signature: &str, clip: bool) -> usize {
        self.admit(functions(text, signature, clip))
    }

    fn has_mnemonic(&self, mnemonic: &str) -> bool {
        self.found.values().any(|sym| sym.mnemonic == mnemonic)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.found.values()
    }

    pub fn len(&self) -> usize {
        self.found.len()
    }

    pub fn is_empty(&self) -> bool {
        self.found.is_empty()
    }

    /// Plain-text reference of everything admitted.
    pub fn manual(&self) -> String {
        let hrule = format!("#{}\n", "_".repeat(78));
        let mut text = String::new();

        text += "# RPN constants\n";
        text += &hrule;
        text += "# push constant onto RPN stack\n";
        text += &hrule;
        for sym in self.of(Arity::Const) {
            let value = sym.value.as_deref().unwrap_or_default();
            text += &format!("{:>24}: {}\n", sym.mnemonic, value);
        }
        text += &hrule;

        text += "# functions of one float parameter\n";
        text += "# pop A and push fun(A).\n";
        text += &hrule;
        for sym in self.of(Arity::Unary) {
            text += &format!("float {}(float) // {}\n", sym.mnemonic, sym.target);
        }
        text += &hrule;

        text += "# functions of two float parameters\n";
        text += "# pop A, pop B and push fun(A, B)\n";
        text += &hrule;
        for sym in self.of(Arity::Binary) {
            text += &format!("float {}(float, float) // {}\n", sym.mnemonic, sym.target);
        }
        text += &hrule;
        text
    }

    fn of(&self, arity: Arity) -> impl Iterator<Item = &Symbol> + '_ {
        self.symbols().filter(move |sym| sym.arity == arity)
    }
}
