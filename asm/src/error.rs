use thiserror::Error;

use crate::msg::Msg;
use crate::source::Pos;

#[derive(Error, Debug)]
pub enum Error {
    #[error("`.data` section must come first")]
    MissingDataSection(Pos),

    #[error("Syntax Error: Cannot parse `{1}`")]
    SyntaxError(Pos, String),

    #[error("Unknown operation: `{1}`")]
    UnknownOperation(Pos, String),

    #[error("More argument required for `{1}`")]
    MissingArgument(Pos, String),

    #[error("Cannot parse `{1}` as {2}")]
    ParseArgument(Pos, String, String),

    #[error("Immediate `{1}` is outside #0..#{2}")]
    ImmediateOutOfRange(Pos, String, u32),

    #[error("Undefined label: `{1}`")]
    UndefinedLabel(Pos, String),

    #[error("Re-defined label: `{1}`")]
    RedefinedLabel(Pos, String),

    #[error("Failed to open file: {0}")]
    FileOpen(String, #[source] std::io::Error),

    #[error("Failed to create file: {0}")]
    FileCreate(String, #[source] std::io::Error),
}

impl Error {
    pub fn pos(&self) -> Option<&Pos> {
        match self {
            Error::MissingDataSection(pos)
            | Error::SyntaxError(pos, _)
            | Error::UnknownOperation(pos, _)
            | Error::MissingArgument(pos, _)
            | Error::ParseArgument(pos, _, _)
            | Error::ImmediateOutOfRange(pos, _, _)
            | Error::UndefinedLabel(pos, _)
            | Error::RedefinedLabel(pos, _) => Some(pos),
            Error::FileOpen(..) | Error::FileCreate(..) => None,
        }
    }

    /// Print error with diagnostic information showing file location and line content
    pub fn print_diag(&self, text: &str) {
        let msg = Msg::Error(self.to_string());
        match self.pos() {
            Some(pos) => msg.diag(pos, text),
            None => msg.print(),
        }
    }
}
