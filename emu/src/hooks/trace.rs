use color_print::cprintln;

use super::Hook;
use crate::model::{State, Step};

/// Print every step with the data stack after it.
#[derive(Debug, Default)]
pub struct Trace;

impl Trace {
    pub fn new() -> Self {
        Trace
    }
}

impl Hook for Trace {
    fn init<'a>(&mut self, state: State<'a>) -> State<'a> {
        cprintln!(" * Trace: <cyan>{:?}</>", state.stack());
        state
    }

    fn exec<'a>(&mut self, time: u64, step: Step, state: State<'a>) -> State<'a> {
        let name = state.table().name_of(step.opcode).unwrap_or("?");
        let status = match state.error() {
            0 => String::new(),
            error => format!(" !{error}"),
        };
        cprintln!(
            "[{:0>4}] 0x{:04X} <r>{:<12}</> <cyan>{:?}</><r,s>{}</>",
            time,
            step.addr,
            name,
            state.stack(),
            status
        );
        state
    }
}
