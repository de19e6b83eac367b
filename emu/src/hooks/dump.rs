use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::Error;
use crate::model::{State, Step};

use super::Hook;

/// Dump machine state when chosen code addresses execute.
#[derive(Debug)]
pub struct Dump {
    file: Option<String>,
    all: bool,
    list: List,
}

/// Code address -> what to show there.
#[derive(Debug, Default, Serialize, Deserialize)]
struct List(HashMap<u32, Config>);

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Config {
    stack: bool,
    calls: bool,
}

impl Dump {
    pub fn arg(file: Option<String>, all: bool) -> Result<Self, Error> {
        match file {
            Some(fname) => {
                let text = std::fs::read_to_string(&fname)
                    .map_err(|e| Error::FileOpen(fname.clone(), e))?;
                let list: List = serde_yaml::from_str(&text)?;
                Ok(Self {
                    file: Some(fname),
                    list,
                    all,
                })
            }
            None => Ok(Self {
                file,
                list: List::default(),
                all,
            }),
        }
    }

    fn get(&self, addr: u32) -> Option<&Config> {
        self.list.0.get(&addr)
    }
}

impl Hook for Dump {
    fn init<'a>(&mut self, state: State<'a>) -> State<'a> {
        if self.all {
            println!(" * Dump all");
        }
        if let Some(fname) = &self.file {
            println!(" * Dump[{}] {:?}", self.list.0.len(), fname);
        }
        state
    }

    fn exec<'a>(&mut self, _time: u64, step: Step, state: State<'a>) -> State<'a> {
        if let Some(cfg) = self.get(step.addr) {
            self.print_reg(&state);
            if cfg.stack {
                self.print_stack(&state);
            }
            if cfg.calls {
                self.print_calls(&state);
            }
        } else if self.all {
            self.print_reg(&state);
        }
        state
    }
}

impl Dump {
    fn print_reg(&self, state: &State) {
        println!(" +------------+------------+------------+");
        println!(
            " | ip: {:0>4X}   | sp: {:<6} | cs: {:<6} |",
            state.ip(),
            state.stack().len(),
            state.calls().len()
        );
        println!(" +------------+------------+------------+");
    }

    fn print_stack(&self, state: &State) {
        for (idx, value) in state.stack().iter().enumerate().rev() {
            println!(" | {:>4} : {:<+29.9} |", idx, value);
        }
        println!(" +--------------------------------------+");
    }

    fn print_calls(&self, state: &State) {
        for (idx, ret) in state.calls().iter().enumerate().rev() {
            println!(" | {:>4} : 0x{:04X}                        |", idx, ret);
        }
        println!(" +--------------------------------------+");
    }
}
