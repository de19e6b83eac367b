pub mod codegen;
pub mod config;
pub mod error;
pub mod pipeline;

pub use codegen::{generate, CodeGen, KernelParams};
pub use config::{Config, HeaderConfig};
pub use error::Error;
pub use pipeline::{build, discover, read_headers, Build, Header};
