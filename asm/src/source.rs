use std::fmt;

use crate::error::Error;

pub const COMMENT: char = '#';
pub const DATA: &str = ".data";
pub const CODE: &str = ".code";
pub const END: &str = ".end";

// ----------------------------------------------------------------------------
// Position

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pos {
    pub file: String,
    pub idx: usize,
}

impl Pos {
    pub fn new(file: &str, idx: usize) -> Self {
        Pos {
            file: file.to_string(),
            idx,
        }
    }

    pub fn line_no(&self) -> usize {
        self.idx + 1
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line_no())
    }
}

// ----------------------------------------------------------------------------
// Line

/// One non-comment source line: an optional `label:` and its words.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub pos: Pos,
    pub label: Option<String>,
    pub words: Vec<String>,
}

impl Line {
    pub fn parse(pos: Pos, code: &str) -> Result<Line, Error> {
        let (label, rest) = match code.split_once(':') {
            Some((label, rest)) => {
                let label = label.trim();
                if label.is_empty() || label.contains(char::is_whitespace) {
                    return Err(Error::SyntaxError(pos, code.to_string()));
                }
                (Some(label.to_string()), rest)
            }
            None => (None, code),
        };
        let words = rest.split_whitespace().map(str::to_string).collect();
        Ok(Line { pos, label, words })
    }
}

// ----------------------------------------------------------------------------
// Sections

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ExpectData,
    InData,
    InCode,
    Done,
}

/// A program split into its data and code lines, data first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sections {
    pub data: Vec<Line>,
    pub code: Vec<Line>,
}

impl Sections {
    pub fn parse(path: &str, text: &str) -> Result<Sections, Error> {
        let mut sections = Sections::default();
        let mut state = State::ExpectData;

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(COMMENT) {
                continue;
            }
            let pos = Pos::new(path, idx);
            let marker = line.split_whitespace().next();

            state = match state {
                State::ExpectData => match marker {
                    Some(DATA) => State::InData,
                    _ => return Err(Error::MissingDataSection(pos)),
                },
                State::InData => match marker {
                    Some(CODE) => State::InCode,
                    _ => {
                        sections.data.push(Line::parse(pos, line)?);
                        State::InData
                    }
                },
                State::InCode => match marker {
                    Some(END) => State::Done,
                    _ => {
                        sections.code.push(Line::parse(pos, line)?);
                        State::InCode
                    }
                },
                State::Done => break,
            };
        }
        Ok(sections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_split() {
        let line = Line::parse(Pos::new("t", 0), "here:  ret").unwrap();
        assert_eq!(line.label.as_deref(), Some("here"));
        assert_eq!(line.words, vec!["ret"]);

        let line = Line::parse(Pos::new("t", 0), "one:1.0 2.0").unwrap();
        assert_eq!(line.label.as_deref(), Some("one"));
        assert_eq!(line.words, vec!["1.0", "2.0"]);

        let line = Line::parse(Pos::new("t", 0), "push #0").unwrap();
        assert_eq!(line.label, None);
        assert_eq!(line.words, vec!["push", "#0"]);

        let line = Line::parse(Pos::new("t", 0), "alone:").unwrap();
        assert!(line.words.is_empty());
    }

    #[test]
    fn bad_label() {
        assert!(matches!(
            Line::parse(Pos::new("t", 3), ": ret"),
            Err(Error::SyntaxError(pos, _)) if pos.line_no() == 4
        ));
        assert!(Line::parse(Pos::new("t", 0), "push x: ret").is_err());
    }

    #[test]
    fn sections_in_order() {
        let text = "\
# header comment

.data
  0.0 1.0
# inside data
.code
  push #1
  sub
.end
  ignored after end
";
        let sections = Sections::parse("t.rpn", text).unwrap();
        assert_eq!(sections.data.len(), 1);
        assert_eq!(sections.code.len(), 2);
        assert_eq!(sections.code[0].pos, Pos::new("t.rpn", 6));
    }

    #[test]
    fn data_must_come_first() {
        let err = Sections::parse("t.rpn", "# c\n.code\npush #0\n").unwrap_err();
        assert!(matches!(err, Error::MissingDataSection(ref pos) if pos.idx == 1));
    }

    #[test]
    fn empty_source() {
        assert_eq!(Sections::parse("t", "").unwrap(), Sections::default());
        let sections = Sections::parse("t", ".data\n.code\n").unwrap();
        assert!(sections.data.is_empty() && sections.code.is_empty());
    }
}
