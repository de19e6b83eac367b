use rpnarch::{Arity, HandOp, Kind, OpTable, Opcode, Symbol, STOP};

use crate::error::Error;
use crate::hooks::Hook;
use crate::libm;

/// One executed step: where it was fetched and what.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub addr: u32,
    pub opcode: Opcode,
}

/// Machine state of one work item.
#[derive(Debug, Clone)]
pub struct State<'a> {
    table: &'a OpTable,
    code: &'a [Opcode],
    data: &'a [f32],
    dstack: Vec<f32>,
    cstack: Vec<u32>,
    capacity: usize,
    ip: u32,
    stop: bool,
    error: u32,
}

// Stack access
impl<'a> State<'a> {
    pub fn push(&mut self, value: f32) -> Result<(), Error> {
        if self.dstack.len() >= self.capacity {
            return Err(Error::Overflow(self.ip));
        }
        self.dstack.push(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<f32, Error> {
        self.dstack.pop().ok_or(Error::Underflow(self.ip))
    }

    pub fn stack(&self) -> &[f32] {
        &self.dstack
    }

    pub fn calls(&self) -> &[u32] {
        &self.cstack
    }
}

impl<'a> State<'a> {
    pub fn new(table: &'a OpTable, code: &'a [Opcode], data: &'a [f32], capacity: usize) -> Self {
        State {
            table,
            code,
            data,
            dstack: Vec::with_capacity(capacity),
            cstack: Vec::with_capacity(capacity),
            capacity,
            ip: 0,
            stop: false,
            error: 0,
        }
    }

    pub fn table(&self) -> &'a OpTable {
        self.table
    }

    pub fn ip(&self) -> u32 {
        self.ip
    }

    /// Status of the last instruction; nonzero poisons the output.
    pub fn error(&self) -> u32 {
        self.error
    }

    pub fn is_terminated(&self) -> bool {
        self.stop
    }

    fn fetch(&mut self) -> Result<u32, Error> {
        let word = *self
            .code
            .get(self.ip as usize)
            .ok_or(Error::IpOutOfRange(self.ip))?;
        self.ip += 1;
        Ok(word)
    }

    /// Fetch, advance and dispatch one instruction.
    pub fn exec(&mut self) -> Result<Step, Error> {
        let addr = self.ip;
        let opcode = self.fetch()?;
        if opcode == STOP {
            self.stop = true;
            return Ok(Step { addr, opcode });
        }

        let table = self.table;
        let status = match table.kind(opcode) {
            Some(Kind::Hand(op)) => self.hand(*op)?,
            Some(Kind::Found(sym)) => self.found(opcode, sym)?,
            None => opcode,
        };
        if status != 0 {
            self.error = status;
            self.stop = true;
        }
        Ok(Step { addr, opcode })
    }

    fn hand(&mut self, op: HandOp) -> Result<u32, Error> {
        match op {
            HandOp::Stop | HandOp::Quit => self.stop = true,
            HandOp::Push => {
                let index = self.fetch()?;
                let value = *self
                    .data
                    .get(index as usize)
                    .ok_or(Error::DataOutOfRange(self.ip - 2, index))?;
                self.push(value)?;
            }
            HandOp::Pop => {
                self.pop()?;
            }
            HandOp::Add => self.ab(|a, b| a + b)?,
            HandOp::Sub => self.ab(|a, b| a - b)?,
            HandOp::Mul => self.ab(|a, b| a * b)?,
            HandOp::Div => self.ab(|a, b| a / b)?,
            HandOp::Swap => {
                let a = self.pop()?;
                let b = self.pop()?;
                self.push(a)?;
                self.push(b)?;
            }
            HandOp::Invert => self.a_(|a| 1.0 - a)?,
            HandOp::Call => {
                let to = self.fetch()?;
                if self.cstack.len() >= self.capacity {
                    return Err(Error::CallOverflow(self.ip - 2));
                }
                self.cstack.push(self.ip);
                self.ip = to;
            }
            HandOp::Ret => match self.cstack.pop() {
                Some(ip) => self.ip = ip,
                None => self.stop = true,
            },
            HandOp::Jmp => self.ip = self.fetch()?,
            HandOp::Noop => {}
        }
        Ok(0)
    }

    /// Discovered symbols without a stand-in report their opcode as status.
    fn found(&mut self, opcode: Opcode, sym: &Symbol) -> Result<u32, Error> {
        match sym.arity {
            Arity::Const => match sym.literal() {
                Some(value) => self.push(value)?,
                None => return Ok(opcode),
            },
            Arity::Unary => match libm::unary(&sym.target) {
                Some(f) => self.a_(f)?,
                None => return Ok(opcode),
            },
            Arity::Binary => match libm::binary(&sym.target) {
                Some(f) => self.ab(f)?,
                None => return Ok(opcode),
            },
        }
        Ok(0)
    }

    /// Pop A then B, push `f(a, b)`.
    fn ab(&mut self, f: impl Fn(f32, f32) -> f32) -> Result<(), Error> {
        let a = self.pop()?;
        let b = self.pop()?;
        self.push(f(a, b))
    }

    fn a_(&mut self, f: impl Fn(f32) -> f32) -> Result<(), Error> {
        let a = self.pop()?;
        self.push(f(a))
    }
}

/// Result of running one work item.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Nonzero when an instruction failed.
    pub status: u32,
    /// Scaled top of stack, or the status itself when it is nonzero.
    pub output: f32,
    /// Data stack at termination.
    pub stack: Vec<f32>,
    pub steps: u64,
}

/// Reference interpreter of the fetch-execute loop of generated kernels.
#[derive(Debug, Clone)]
pub struct Machine<'a> {
    table: &'a OpTable,
    code: &'a [Opcode],
    data: &'a [f32],
    stack_size: usize,
    domain_max: f32,
    max_steps: Option<u64>,
}

impl<'a> Machine<'a> {
    pub fn new(table: &'a OpTable, code: &'a [Opcode], data: &'a [f32]) -> Self {
        Machine {
            table,
            code,
            data,
            stack_size: 64,
            domain_max: 255.0,
            max_steps: None,
        }
    }

    pub fn stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = stack_size;
        self
    }

    pub fn domain_max(mut self, domain_max: f32) -> Self {
        self.domain_max = domain_max;
        self
    }

    pub fn max_steps(mut self, max_steps: Option<u64>) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn run(&self, value: f32) -> Result<Outcome, Error> {
        self.run_with(value, &mut [])
    }

    /// Run one work item on the raw input `value`.
    pub fn run_with(&self, value: f32, hooks: &mut [Box<dyn Hook>]) -> Result<Outcome, Error> {
        let mut state = State::new(self.table, self.code, self.data, self.stack_size);
        state.push(value / self.domain_max)?;
        state = hooks.iter_mut().fold(state, |state, hook| hook.init(state));

        let mut steps = 0_u64;
        while !state.is_terminated() {
            if let Some(max) = self.max_steps {
                if steps >= max {
                    return Err(Error::StepLimit(max));
                }
            }
            let step = state.exec()?;
            state = hooks
                .iter_mut()
                .fold(state, |state, hook| hook.exec(steps, step, state));
            steps += 1;
        }

        let stack = state.stack().to_vec();
        let status = state.error();
        let output = match status {
            0 => state.pop()? * self.domain_max,
            error => error as f32,
        };
        Ok(Outcome {
            status,
            output,
            stack,
            steps,
        })
    }
}
