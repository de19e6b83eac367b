use indexmap::IndexMap;
use rpnarch::Opcode;
use serde::Serialize;

use crate::label::Labels;
use crate::source::Pos;

/// A reference left unresolved by a lenient build. Every listed offset holds
/// `stop`.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixup {
    pub pos: Pos,
    pub name: String,
    pub offsets: Vec<u32>,
}

/// Output of the assembler: flat code and data plus both label tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub code: Vec<Opcode>,
    pub data: Vec<f32>,
    pub clabels: Labels,
    pub dlabels: Labels,
    pub unresolved: Vec<Fixup>,
}

#[derive(Serialize)]
struct LabelMap<'a> {
    code: IndexMap<&'a str, u32>,
    data: IndexMap<&'a str, u32>,
}

#[derive(Serialize)]
struct Image<'a> {
    code: &'a [Opcode],
    data: &'a [f32],
}

impl Program {
    /// Code and data labels as YAML.
    pub fn label_map(&self) -> String {
        let map = LabelMap {
            code: self.clabels.iter().collect(),
            data: self.dlabels.iter().collect(),
        };
        serde_yaml::to_string(&map).unwrap_or_else(|e| format!("# Error generating YAML: {}", e))
    }

    /// The two arrays handed to a kernel host, as YAML.
    pub fn image(&self) -> String {
        let image = Image {
            code: &self.code,
            data: &self.data,
        };
        serde_yaml::to_string(&image).unwrap_or_else(|e| format!("# Error generating YAML: {}", e))
    }
}
