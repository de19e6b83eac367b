use color_print::cprintln;

use crate::source::Pos;

#[derive(Debug)]
pub enum Msg {
    Error(String),
    Warn(String),
    Note(String),
}

impl Msg {
    pub fn print(&self) {
        match self {
            Msg::Error(msg) => cprintln!("<red,bold>error</>: {}", msg),
            Msg::Warn(msg) => cprintln!("<yellow,bold>warn</>: {}", msg),
            Msg::Note(msg) => cprintln!("<green,bold>note</>: {}", msg),
        }
    }

    /// Print with the location and the offending line of `text`.
    pub fn diag(&self, pos: &Pos, text: &str) {
        self.print();
        let raw = text.lines().nth(pos.idx).unwrap_or("");
        cprintln!("     <blue>--></> <underline>{}</>", pos);
        cprintln!("      <blue>|</>");
        cprintln!(" <blue>{:>4} |</> {}", pos.line_no(), raw);
        cprintln!("      <blue>|</>");
    }
}
