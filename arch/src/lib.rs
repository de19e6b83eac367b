pub mod body;
pub mod error;
pub mod op;
pub mod scan;
pub mod symbol;
pub mod table;

pub use error::Error;
pub use op::{HandOp, Opcode, STOP};
pub use scan::Registry;
pub use symbol::{Arity, Symbol};
pub use table::{Kind, OpTable};
