pub mod dump;
pub mod trace;

use crate::model::{State, Step};

/// Side effects run around the fetch-execute loop.
pub trait Hook {
    fn init<'a>(&mut self, state: State<'a>) -> State<'a> {
        state
    }
    fn exec<'a>(&mut self, time: u64, step: Step, state: State<'a>) -> State<'a>;
}
