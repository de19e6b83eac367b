//! Kernel host contract and an in-process implementation of it.
//!
//! A host takes generated kernel source, the assembled arrays and an input
//! buffer, runs one machine per scalar channel and hands back a buffer of the
//! same shape. `CpuHost` does so with the reference interpreter, mirroring
//! the launch geometry of the generated entry point.

use rpnarch::{OpTable, Opcode, STOP};
use rpnasm::Program;
use rpnkgen::KernelParams;
use std::cell::Cell;
use std::rc::Rc;

use crate::error::Error;
use crate::model::Machine;

/// Everything a host needs for one launch.
#[derive(Debug, Clone, Copy)]
pub struct Launch<'a> {
    pub source: &'a str,
    pub code: &'a [Opcode],
    pub data: &'a [f32],
    pub input: &'a [f32],
    /// One per scalar channel: pixels times `pixel_width`.
    pub work_items: usize,
    pub pixel_width: usize,
}

impl<'a> Launch<'a> {
    pub fn new(source: &'a str, program: &'a Program, input: &'a [f32], pixel_width: usize) -> Self {
        Launch {
            source,
            code: &program.code,
            data: &program.data,
            input,
            work_items: input.len(),
            pixel_width,
        }
    }

    /// Pixel count handed to the entry point as `check`.
    pub fn pixels(&self) -> usize {
        self.work_items / self.pixel_width.max(1)
    }
}

pub trait KernelHost {
    /// Run the kernel over `launch.input`; the result has the same length.
    fn launch(&mut self, launch: &Launch) -> Result<Vec<f32>, Error>;
}

/// Scoped buffer on the host's "device". Released on drop.
#[derive(Debug)]
pub struct DeviceBuffer<T: Copy> {
    data: Vec<T>,
    live: Rc<Cell<usize>>,
}

impl<T: Copy> DeviceBuffer<T> {
    fn upload(host: &[T], live: &Rc<Cell<usize>>) -> Self {
        live.set(live.get() + 1);
        DeviceBuffer {
            data: host.to_vec(),
            live: Rc::clone(live),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn download(&self) -> Vec<T> {
        self.data.clone()
    }
}

impl<T: Copy> Drop for DeviceBuffer<T> {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

#[derive(Debug)]
pub struct CpuHost<'t> {
    table: &'t OpTable,
    params: KernelParams,
    block_size: usize,
    max_steps: Option<u64>,
    live: Rc<Cell<usize>>,
}

impl<'t> CpuHost<'t> {
    pub fn new(table: &'t OpTable, params: KernelParams) -> Self {
        CpuHost {
            table,
            params,
            block_size: 1024,
            max_steps: None,
            live: Rc::new(Cell::new(0)),
        }
    }

    pub fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    pub fn max_steps(mut self, max_steps: Option<u64>) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Buffers currently allocated.
    pub fn live_buffers(&self) -> usize {
        self.live.get()
    }

    fn validate(&self, launch: &Launch) -> Result<(), Error> {
        let entry = format!("__global__ void {}(", self.params.kernel_name);
        if !launch.source.contains(&entry) {
            return Err(Error::Source(self.params.kernel_name.clone()));
        }
        if self.params.pixel_width == 0 || launch.pixel_width == 0 {
            return Err(Error::Shape("pixel width must be positive".to_string()));
        }
        if launch.pixel_width != self.params.pixel_width {
            return Err(Error::Shape(format!(
                "pixel width {} but the kernel was generated for {}",
                launch.pixel_width, self.params.pixel_width
            )));
        }
        if launch.work_items != launch.input.len() {
            return Err(Error::Shape(format!(
                "{} work items for {} input scalars",
                launch.work_items,
                launch.input.len()
            )));
        }
        if launch.input.len() % launch.pixel_width != 0 {
            return Err(Error::Shape(format!(
                "{} input scalars is not a whole number of {}-channel pixels",
                launch.input.len(),
                launch.pixel_width
            )));
        }
        if launch.code.last() != Some(&STOP) {
            return Err(Error::Shape("code must end with stop".to_string()));
        }
        Ok(())
    }
}

impl<'t> KernelHost for CpuHost<'t> {
    fn launch(&mut self, launch: &Launch) -> Result<Vec<f32>, Error> {
        self.validate(launch)?;

        let d_px = DeviceBuffer::upload(launch.input, &self.live);
        let d_cx = DeviceBuffer::upload(launch.code, &self.live);
        let d_dx = DeviceBuffer::upload(launch.data, &self.live);
        let mut out = DeviceBuffer::upload(launch.input, &self.live);

        let machine = Machine::new(self.table, &d_cx.data, &d_dx.data)
            .stack_size(self.params.stack_size)
            .domain_max(self.params.domain_max)
            .max_steps(self.max_steps);

        let pw = self.params.pixel_width;
        let check = launch.pixels();
        let grid = check / self.block_size + 1;
        for idx in 0..grid * self.block_size {
            if idx >= check {
                break;
            }
            for c in 0..pw {
                let at = idx * pw + c;
                out.data[at] = machine.run(d_px.data[at])?.output;
            }
        }
        Ok(out.download())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpnasm::{assemble, Config};
    use rpnkgen::generate;

    fn setup(text: &str) -> (OpTable, Program, String) {
        let table = OpTable::new();
        let program = assemble("t.rpn", text, &table, Config::default()).unwrap();
        let source = generate(&table, &KernelParams::default());
        (table, program, source)
    }

    #[test]
    fn invert_every_channel() {
        let (table, program, source) = setup(".data\n0.0 1.0\n.code\npush #1\nsub\n");
        let input = [0.0, 102.0, 255.0, 51.0, 204.0, 153.0];
        let mut host = CpuHost::new(&table, KernelParams::default()).block_size(2);
        let out = host.launch(&Launch::new(&source, &program, &input, 3)).unwrap();
        let expect = [255.0, 153.0, 0.0, 204.0, 51.0, 102.0];
        for (got, want) in out.iter().zip(expect) {
            assert!((got - want).abs() < 1e-3, "{got} != {want}");
        }
        assert_eq!(host.live_buffers(), 0);
    }

    #[test]
    fn poison_stays_in_its_channel() {
        let table = OpTable::new();
        let program = Program {
            code: vec![99, STOP],
            ..Program::default()
        };
        let source = generate(&table, &KernelParams::default());
        let input = [10.0, 20.0, 30.0];
        let mut host = CpuHost::new(&table, KernelParams::default());
        let out = host.launch(&Launch::new(&source, &program, &input, 3)).unwrap();
        assert_eq!(out, vec![99.0, 99.0, 99.0]);
    }

    #[test]
    fn shape_is_checked() {
        let (table, program, source) = setup(".data\n.code\n");
        let mut host = CpuHost::new(&table, KernelParams::default());

        let input = [1.0, 2.0];
        let err = host.launch(&Launch::new(&source, &program, &input, 3)).unwrap_err();
        assert!(matches!(err, Error::Shape(_)));

        let input = [1.0, 2.0, 3.0];
        let err = host.launch(&Launch::new(&source, &program, &input, 4)).unwrap_err();
        assert!(matches!(err, Error::Shape(_)));

        let mut launch = Launch::new(&source, &program, &input, 3);
        launch.work_items = 1;
        assert!(matches!(host.launch(&launch), Err(Error::Shape(_))));

        let launch = Launch::new("int main() {}", &program, &input, 3);
        assert!(matches!(host.launch(&launch), Err(Error::Source(_))));
        assert_eq!(host.live_buffers(), 0);
    }

    #[test]
    fn zero_pixel_width_is_a_shape_error() {
        let params = KernelParams {
            pixel_width: 0,
            ..KernelParams::default()
        };
        let table = OpTable::new();
        let program = assemble("t.rpn", ".data\n.code\n", &table, Config::default()).unwrap();
        let source = generate(&table, &params);
        let mut host = CpuHost::new(&table, params);
        let input = [1.0, 2.0, 3.0];
        let err = host.launch(&Launch::new(&source, &program, &input, 0)).unwrap_err();
        assert!(matches!(err, Error::Shape(_)));
        assert_eq!(host.live_buffers(), 0);
    }

    #[test]
    fn buffers_released_on_failure() {
        let (table, program, source) = setup(".data\n.code\npush #9\n");
        let input = [1.0, 2.0, 3.0];
        let mut host = CpuHost::new(&table, KernelParams::default());
        let err = host.launch(&Launch::new(&source, &program, &input, 3)).unwrap_err();
        assert!(matches!(err, Error::DataOutOfRange(0, 9)));
        assert_eq!(host.live_buffers(), 0);
    }

    #[test]
    fn buffers_count_while_alive() {
        let live = Rc::new(Cell::new(0));
        {
            let a = DeviceBuffer::upload(&[1.0_f32, 2.0], &live);
            let _b = DeviceBuffer::upload(&[3_u32], &live);
            assert_eq!(live.get(), 2);
            assert_eq!(a.download(), vec![1.0, 2.0]);
        }
        assert_eq!(live.get(), 0);
    }
}
