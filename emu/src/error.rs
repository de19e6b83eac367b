use thiserror::Error;

/// Failures of the reference interpreter and the CPU host.
///
/// Instruction status codes are not errors: a nonzero status poisons the
/// output of that work item only. These are the conditions a device leaves
/// undefined, plus host-side misuse.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Data stack overflow at 0x{0:04X}")]
    Overflow(u32),

    #[error("Data stack underflow at 0x{0:04X}")]
    Underflow(u32),

    #[error("Call stack overflow at 0x{0:04X}")]
    CallOverflow(u32),

    #[error("Instruction pointer 0x{0:04X} is past the end of the code")]
    IpOutOfRange(u32),

    #[error("Data index {1} out of range at 0x{0:04X}")]
    DataOutOfRange(u32, u32),

    #[error("Step limit {0} reached")]
    StepLimit(u64),

    #[error("Bad launch shape: {0}")]
    Shape(String),

    #[error("Kernel source has no entry `{0}`")]
    Source(String),

    #[error(transparent)]
    Build(#[from] rpnkgen::Error),

    #[error("Invalid hook configuration: {0}")]
    HookConfig(#[from] serde_yaml::Error),

    #[error("Failed to read file: {0}")]
    FileOpen(String, #[source] std::io::Error),

    #[error("Failed to write file: {0}")]
    FileCreate(String, #[source] std::io::Error),
}
