use rpnarch::{OpTable, Registry};
use rpnasm::msg::Msg;
use rpnasm::{assemble, disassemble, listing, Config, Error};

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {author}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

const SIGNATURE: &str = "extern __host__ __device__ __device_builtin__ float";

#[derive(Debug, clap::Parser)]
#[clap(author, version, about, help_template = HELP_TEMPLATE)]
struct Args {
    /// Input file
    #[clap(default_value = "main.rpn")]
    input: String,

    /// Output file (code and data arrays as YAML)
    #[clap(short, long, default_value = "main.rpn.yaml")]
    output: String,

    /// Label map output file
    #[clap(short, long)]
    map: Option<String>,

    /// Disassembly output file
    #[clap(short, long)]
    disasm: Option<String>,

    /// Header to scan for constants and functions (repeatable)
    #[clap(long)]
    header: Vec<String>,

    /// Declaration prefix of scanned functions (repeatable)
    #[clap(long, default_values_t = [SIGNATURE.to_string()])]
    signature: Vec<String>,

    /// Keep the trailing `f` of binary function mnemonics
    #[clap(long)]
    no_clip: bool,

    /// Number of `#n` immediates
    #[clap(long, default_value_t = 64)]
    bss: u32,

    /// Unresolved references assemble to `stop` instead of failing
    #[clap(long)]
    lenient: bool,

    /// Dump assembled program
    #[clap(long)]
    dump: bool,
}

fn read(path: &str) -> Result<String, Error> {
    std::fs::read_to_string(path).map_err(|e| Error::FileOpen(path.to_string(), e))
}

fn write(path: &str, text: &str) -> Result<(), Error> {
    std::fs::write(path, text).map_err(|e| Error::FileCreate(path.to_string(), e))
}

fn main() {
    use clap::Parser;

    let args: Args = Args::parse();
    println!("RPN Assembler");

    println!("1. Scan Headers");
    let mut registry = Registry::new();
    for path in &args.header {
        let text = match read(path) {
            Ok(text) => text,
            Err(e) => {
                Msg::Warn(e.to_string()).print();
                continue;
            }
        };
        let mut count = registry.scan_constants(&text);
        for signature in &args.signature {
            count += registry.scan_functions(&text, signature, !args.no_clip);
        }
        println!("  < {} ({} symbols)", path, count);
    }
    let table = match OpTable::with_symbols(registry.symbols()) {
        Ok(table) => table,
        Err(e) => {
            Msg::Error(e.to_string()).print();
            std::process::exit(1);
        }
    };

    println!("2. Assemble");
    println!("  < {}", args.input);
    let text = match read(&args.input) {
        Ok(text) => text,
        Err(e) => {
            e.print_diag("");
            std::process::exit(1);
        }
    };
    let config = Config {
        bss: args.bss,
        strict: !args.lenient,
    };
    let program = match assemble(&args.input, &text, &table, config) {
        Ok(program) => program,
        Err(e) => {
            e.print_diag(&text);
            std::process::exit(1);
        }
    };
    for fixup in &program.unresolved {
        Msg::Warn(format!(
            "Undefined label `{}`, {} reference(s) left as `stop`",
            fixup.name,
            fixup.offsets.len()
        ))
        .diag(&fixup.pos, &text);
    }

    println!("3. Write Outputs");
    let mut outputs = vec![(args.output.clone(), program.image())];
    if let Some(path) = &args.map {
        outputs.push((path.clone(), program.label_map()));
    }
    if let Some(path) = &args.disasm {
        outputs.push((path.clone(), disassemble(&program, &table)));
    }
    for (path, body) in &outputs {
        println!("  > {}", path);
        if let Err(e) = write(path, body) {
            e.print_diag("");
            std::process::exit(1);
        }
    }

    if args.dump {
        println!("{}", listing(&program, &table));
    }
}
