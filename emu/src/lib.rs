pub mod error;
pub mod hooks;
pub mod host;
pub mod libm;
pub mod model;

pub use error::Error;
pub use host::{CpuHost, DeviceBuffer, KernelHost, Launch};
pub use model::{Machine, Outcome, State, Step};
