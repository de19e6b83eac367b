//! Kernel source text for one opcode table.
//!
//! The output is, in order: includes, definitions, one `rpn_op_<n>` body per
//! opcode, the `machine` fetch-execute function and the `__global__` entry.
//! Every work item owns its stacks and state; nothing is shared between
//! instances and no bound is checked.

use rpnarch::body::{self, MACROS};
use rpnarch::{Kind, OpTable, Opcode};

#[derive(Debug, Clone, PartialEq)]
pub struct KernelParams {
    /// Capacity of both the data stack and the call stack.
    pub stack_size: usize,
    /// Scalar channels per work item.
    pub pixel_width: usize,
    /// Input and output scale; inputs are divided by it before the run.
    pub domain_max: f32,
    pub kernel_name: String,
    pub includes: Vec<String>,
}

impl Default for KernelParams {
    fn default() -> Self {
        KernelParams {
            stack_size: 64,
            pixel_width: 3,
            domain_max: 255.0,
            kernel_name: "RPN".to_string(),
            includes: vec!["math.h".to_string()],
        }
    }
}

const RULE: &str = "/*****************************************************************************/";

/// C literal for a float, always with a decimal point.
fn float_literal(value: f32) -> String {
    format!("{:?}f", value)
}

pub fn body_name(opcode: Opcode) -> String {
    format!("rpn_op_{opcode}")
}

/// Identifiers the generated source defines besides the entry point.
const RESERVED: [&str; 10] = [
    "_RPNState",
    "RPNState",
    "RPNp",
    "POP",
    "PUSH",
    "RPN_STACK_SIZE",
    "RPN_PIXEL_WIDTH",
    "RPN_DOMAIN_MAX",
    "machine",
    "main",
];

/// Whether `name` can be the `__global__` entry without clashing with
/// anything else in the generated source.
pub fn valid_entry_name(name: &str) -> bool {
    let mut chars = name.chars();
    let ident = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    ident && !RESERVED.contains(&name) && !name.starts_with("rpn_op_")
}

#[derive(Debug)]
pub struct CodeGen<'a> {
    table: &'a OpTable,
    params: &'a KernelParams,
    output: Vec<String>,
}

impl<'a> CodeGen<'a> {
    pub fn new(table: &'a OpTable, params: &'a KernelParams) -> Self {
        CodeGen {
            table,
            params,
            output: Vec::new(),
        }
    }

    pub fn generate(table: &OpTable, params: &KernelParams) -> String {
        let mut codegen = CodeGen::new(table, params);
        codegen.gen_includes();
        codegen.gen_definitions();
        codegen.gen_bodies();
        codegen.gen_machine();
        codegen.gen_entry();
        codegen.output.join("\n")
    }

    fn emit(&mut self, line: impl Into<String>) {
        self.output.push(line.into());
    }

    fn section(&mut self, title: &str) {
        self.emit("");
        self.emit(RULE);
        self.emit(format!("/* {:<73} */", title));
        self.emit(RULE);
    }

    fn gen_includes(&mut self) {
        self.emit("// RPN kernel source");
        self.emit("// GENERATED KERNEL IMPLEMENTING RPN, DO NOT EDIT");
        self.emit("");
        let params = self.params;
        for include in &params.includes {
            self.emit(format!("#include <{include}>"));
        }
    }

    fn gen_definitions(&mut self) {
        self.section("DEFINITIONS");
        self.emit(format!("#define RPN_STACK_SIZE {}", self.params.stack_size));
        self.emit(format!("#define RPN_PIXEL_WIDTH {}", self.params.pixel_width));
        self.emit(format!(
            "#define RPN_DOMAIN_MAX {}",
            float_literal(self.params.domain_max)
        ));
        self.emit("");
        for line in MACROS.lines() {
            self.emit(line);
        }
    }

    fn gen_bodies(&mut self) {
        self.section("INSTRUCTIONS");
        let table = self.table;
        for (opcode, name, kind) in table.iter() {
            let origin = match kind {
                Kind::Hand(_) => "hand",
                Kind::Found(_) => "found",
            };
            self.emit(format!("/* {opcode}: {name} ({origin}) */"));
            self.emit(format!(
                "__device__ int {}(RPNp the) {}",
                body_name(opcode),
                body::body(kind)
            ));
        }
    }

    fn gen_machine(&mut self) {
        self.section("FETCH EXECUTE");
        self.emit("__device__ int machine(const int *code, const float *data, float *value)");
        self.emit("{");
        self.emit("    float DSTACK[RPN_STACK_SIZE];");
        self.emit("    int CSTACK[RPN_STACK_SIZE];");
        self.emit("    RPNState rpn = { code, data, &DSTACK[0], &CSTACK[0], 0, 0, 0 };");
        self.emit("    RPNp the = &rpn;");
        self.emit("    int opcode;");
        self.emit("    int error = 0;");
        self.emit("");
        self.emit("    PUSH(*value / RPN_DOMAIN_MAX);");
        self.emit("    while (!the->stop && (opcode = code[the->ip++]) != 0) {");
        self.emit("        switch (opcode) {");
        let cases: Vec<String> = self
            .table
            .iter()
            .map(|(opcode, name, _)| {
                format!(
                    "            case {:>3}: error = {}(the); break; /* {} */",
                    opcode,
                    body_name(opcode),
                    name
                )
            })
            .collect();
        for case in cases {
            self.emit(case);
        }
        self.emit("            default: error = opcode; break;");
        self.emit("        }");
        self.emit("        the->stop |= !!error;");
        self.emit("    }");
        self.emit("    if (error) {");
        self.emit("        *value = (float)error;");
        self.emit("    } else {");
        self.emit("        *value = POP * RPN_DOMAIN_MAX;");
        self.emit("    }");
        self.emit("    return error;");
        self.emit("}");
    }

    fn gen_entry(&mut self) {
        self.section("ENTRY");
        self.emit(format!(
            "__global__ void {}(float *inIm, const int *code, const float *data, int check)",
            self.params.kernel_name
        ));
        self.emit("{");
        self.emit("    const int idx = threadIdx.x + blockDim.x * blockIdx.x;");
        self.emit("");
        self.emit("    if (idx < check) {");
        self.emit("        float *pixel = inIm + idx * RPN_PIXEL_WIDTH;");
        self.emit("        for (int c = 0; c < RPN_PIXEL_WIDTH; ++c) {");
        self.emit("            machine(code, data, pixel + c);");
        self.emit("        }");
        self.emit("    }");
        self.emit("}");
        self.emit("");
    }
}

/// Kernel source for `table` with `params`.
pub fn generate(table: &OpTable, params: &KernelParams) -> String {
    CodeGen::generate(table, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpnarch::{HandOp, Symbol};

    fn position(source: &str, needle: &str) -> usize {
        source
            .find(needle)
            .unwrap_or_else(|| panic!("missing `{needle}` in\n{source}"))
    }

    #[test]
    fn blocks_in_order() {
        let source = generate(&OpTable::new(), &KernelParams::default());
        let include = position(&source, "#include <math.h>");
        let define = position(&source, "#define RPN_STACK_SIZE 64");
        let first = position(&source, "__device__ int rpn_op_0(RPNp the)");
        let machine = position(&source, "__device__ int machine(");
        let entry = position(&source, "__global__ void RPN(");
        assert!(include < define && define < first && first < machine && machine < entry);
    }

    #[test]
    fn default_entry_is_not_a_type() {
        let params = KernelParams::default();
        let source = generate(&OpTable::new(), &params);
        let entry = format!("__global__ void {}(", params.kernel_name);
        assert!(source.contains(&entry));
        assert!(source.contains("} RPNState, *RPNp;"));
        assert!(source.contains("RPNState rpn = {"));
        // The entry name is declared exactly once and never as a type.
        let declared = |word: &str| {
            source
                .lines()
                .filter(|line| !line.trim_start().starts_with("//") && !line.trim_start().starts_with("/*"))
                .flat_map(|line| line.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_')))
                .filter(|w| *w == word)
                .count()
        };
        assert_eq!(declared(&params.kernel_name), 1);
        assert!(!source.contains(&format!("struct _{} ", params.kernel_name)));
        assert!(valid_entry_name(&params.kernel_name));
    }

    #[test]
    fn entry_names() {
        assert!(valid_entry_name("RPN"));
        assert!(valid_entry_name("_rpn2"));
        assert!(!valid_entry_name("RPNState"));
        assert!(!valid_entry_name("machine"));
        assert!(!valid_entry_name("rpn_op_3"));
        assert!(!valid_entry_name("2fast"));
        assert!(!valid_entry_name("my kernel"));
        assert!(!valid_entry_name(""));
    }

    #[test]
    fn parameters_land_in_definitions() {
        let params = KernelParams {
            stack_size: 16,
            pixel_width: 4,
            domain_max: 65535.0,
            kernel_name: "Rpn16".to_string(),
            includes: vec!["math.h".to_string(), "math_constants.h".to_string()],
        };
        let source = generate(&OpTable::new(), &params);
        assert!(source.contains("#define RPN_STACK_SIZE 16\n"));
        assert!(source.contains("#define RPN_PIXEL_WIDTH 4\n"));
        assert!(source.contains("#define RPN_DOMAIN_MAX 65535.0f\n"));
        assert!(source.contains("#include <math_constants.h>\n"));
        assert!(source.contains("__global__ void Rpn16("));
    }

    #[test]
    fn every_opcode_has_body_and_case() {
        let symbols = [
            Symbol::constant("CUDART_PI_F", "3.141592654f"),
            Symbol::unary("sinf"),
            Symbol::binary("atan2f", true),
        ];
        let table = OpTable::with_symbols(&symbols).unwrap();
        let source = generate(&table, &KernelParams::default());
        for (opcode, name, _) in table.iter() {
            assert!(source.contains(&format!("__device__ int rpn_op_{opcode}(RPNp the)")));
            assert!(source.contains(&format!("error = rpn_op_{opcode}(the); break; /* {name} */")));
        }
        assert!(source.contains("default: error = opcode; break;"));
        assert!(source.contains("rpn_op_14(RPNp the) { PUSH(CUDART_PI_F); return 0; }"));
        assert!(source.contains("PUSH(sinf(a));"));
        // Clipped mnemonic, unclipped C function.
        assert!(source.contains("/* 16: atan2 (found) */"));
        assert!(source.contains("PUSH(atan2f(a, b));"));
    }

    #[test]
    fn machine_contract() {
        let source = generate(&OpTable::new(), &KernelParams::default());
        assert!(source.contains("PUSH(*value / RPN_DOMAIN_MAX);"));
        assert!(source.contains("(opcode = code[the->ip++]) != 0"));
        assert!(source.contains("*value = (float)error;"));
        assert!(source.contains("*value = POP * RPN_DOMAIN_MAX;"));
        assert!(source.contains(&body::hand(HandOp::Sub)));
    }

    #[test]
    fn channels_run_independently() {
        let source = generate(&OpTable::new(), &KernelParams::default());
        assert!(source.contains("for (int c = 0; c < RPN_PIXEL_WIDTH; ++c) {"));
        assert!(source.contains("if (idx < check)"));
    }
}
