use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Asm(#[from] rpnasm::Error),

    #[error(transparent)]
    Table(#[from] rpnarch::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("Invalid kernel parameter: {0}")]
    Param(String),

    #[error("Failed to read file: {0}")]
    FileOpen(String, #[source] std::io::Error),

    #[error("Failed to write file: {0}")]
    FileCreate(String, #[source] std::io::Error),
}
