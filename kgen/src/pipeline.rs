use rpnarch::{OpTable, Registry};
use rpnasm::Program;

use crate::codegen::{self, KernelParams};
use crate::config::{Config, HeaderConfig};
use crate::error::Error;

/// Header text handed in by the caller, with how to scan it.
#[derive(Debug, Clone)]
pub struct Header {
    pub config: HeaderConfig,
    pub text: String,
}

impl Header {
    pub fn new(config: HeaderConfig, text: &str) -> Self {
        Header {
            config,
            text: text.to_string(),
        }
    }
}

/// Everything one build produced.
#[derive(Debug, Clone)]
pub struct Build {
    pub registry: Registry,
    pub table: OpTable,
    pub program: Program,
    pub params: KernelParams,
    pub kernel: String,
}

/// Discovery stage. Constants of every header come first, then functions,
/// each in header order.
pub fn discover(headers: &[Header]) -> Registry {
    let mut registry = Registry::new();
    for header in headers.iter().filter(|h| h.config.constants) {
        registry.scan_constants(&header.text);
    }
    for header in headers {
        for signature in &header.config.signatures {
            registry.scan_functions(&header.text, signature, header.config.clip);
        }
    }
    registry
}

/// Read every configured header. Missing files are returned separately so
/// the caller can decide whether that is fatal.
pub fn read_headers(config: &Config) -> (Vec<Header>, Vec<Error>) {
    let mut headers = vec![];
    let mut missing = vec![];
    for header in &config.headers {
        match std::fs::read_to_string(&header.path) {
            Ok(text) => headers.push(Header { config: header.clone(), text }),
            Err(e) => missing.push(Error::FileOpen(header.path.clone(), e)),
        }
    }
    (headers, missing)
}

/// Headers -> registry -> opcode table -> assembled program -> kernel source.
pub fn build(path: &str, source: &str, headers: &[Header], config: &Config) -> Result<Build, Error> {
    let params = config.kernel()?;
    let registry = discover(headers);
    let table = OpTable::with_symbols(registry.symbols())?;
    let program = rpnasm::assemble(path, source, &table, config.assembler())?;
    let kernel = codegen::generate(&table, &params);
    Ok(Build {
        registry,
        table,
        program,
        params,
        kernel,
    })
}
