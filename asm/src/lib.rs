pub mod assembler;
pub mod disasm;
pub mod error;
pub mod label;
pub mod msg;
pub mod program;
pub mod source;

pub use assembler::{assemble, Assembler, Config};
pub use disasm::{disassemble, listing};
pub use error::Error;
pub use program::Program;
pub use source::Sections;
