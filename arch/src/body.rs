//! Kernel-language text of every instruction.
//!
//! A body is a brace block run with `the` bound to the machine state of one
//! work item. It returns 0 on success; anything else becomes the error status
//! of that machine.

use crate::op::HandOp;
use crate::symbol::{Arity, Symbol};
use crate::table::Kind;

/// Definitions the bodies rely on.
pub const MACROS: &str = "\
typedef struct _RPNState {
    const int *code;
    const float *data;
    float *dstack;
    int *cstack;
    int ip;
    int sp;
    int stop;
} RPNState, *RPNp;

#define POP (*--the->dstack)
#define PUSH(v) (*the->dstack++ = (v))
";

/// Pop A then B, push `expr`.
fn ab(expr: &str) -> String {
    format!("{{ float a = POP; float b = POP; PUSH({expr}); return 0; }}")
}

/// Pop A, push `expr`.
fn a_(expr: &str) -> String {
    format!("{{ float a = POP; PUSH({expr}); return 0; }}")
}

pub fn hand(op: HandOp) -> String {
    match op {
        HandOp::Stop => "{ the->stop = 1; return 0; }".to_string(),
        HandOp::Push => "{ PUSH(the->data[the->code[the->ip++]]); return 0; }".to_string(),
        HandOp::Pop => "{ --the->dstack; return 0; }".to_string(),
        HandOp::Add => ab("a + b"),
        HandOp::Sub => ab("a - b"),
        HandOp::Mul => ab("a * b"),
        HandOp::Div => ab("a / b"),
        HandOp::Swap => "{ float a = POP; float b = POP; PUSH(a); PUSH(b); return 0; }".to_string(),
        HandOp::Invert => a_("1.0f - a"),
        HandOp::Call => "{ int to = the->code[the->ip++]; the->cstack[the->sp++] = the->ip; the->ip = to; return 0; }".to_string(),
        // Returning with an empty call stack ends the program.
        HandOp::Ret => "{ if (the->sp == 0) { the->stop = 1; } else { the->ip = the->cstack[--the->sp]; } return 0; }".to_string(),
        HandOp::Jmp => "{ the->ip = the->code[the->ip]; return 0; }".to_string(),
        HandOp::Noop => "{ return 0; }".to_string(),
        HandOp::Quit => "{ the->stop = 1; return 0; }".to_string(),
    }
}

pub fn found(sym: &Symbol) -> String {
    match sym.arity {
        Arity::Const => format!("{{ PUSH({}); return 0; }}", sym.target),
        Arity::Unary => a_(&format!("{}(a)", sym.target)),
        Arity::Binary => ab(&format!("{}(a, b)", sym.target)),
    }
}

pub fn body(kind: &Kind) -> String {
    match kind {
        Kind::Hand(op) => hand(*op),
        Kind::Found(sym) => found(sym),
    }
}
