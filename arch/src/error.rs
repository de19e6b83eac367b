use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Re-defined mnemonic: `{0}`")]
    RedefinedMnemonic(String),
}
