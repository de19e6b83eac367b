use color_print::cprintln;
use rpnkgen::{build, read_headers, Config, Error};

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {author}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(author, version, about, help_template = HELP_TEMPLATE)]
struct Args {
    /// Input file
    #[clap(default_value = "main.rpn")]
    input: String,

    /// Kernel source output file
    #[clap(short, long, default_value = "RPN_sourceCode.cu")]
    output: String,

    /// Configuration file (YAML)
    #[clap(short, long)]
    config: Option<String>,

    /// Write the manual of discovered constants and functions
    #[clap(short, long)]
    manual: Option<String>,

    /// Print the effective configuration and exit
    #[clap(long)]
    print_config: bool,

    /// Unresolved references assemble to `stop` instead of failing
    #[clap(long)]
    lenient: bool,

    /// Print the assembled program
    #[clap(short, long)]
    verbose: bool,
}

fn fail(e: &Error, text: &str) -> ! {
    match e {
        Error::Asm(e) => e.print_diag(text),
        e => cprintln!("<red,bold>error</>: {}", e),
    }
    std::process::exit(1);
}

fn write(path: &str, text: &str) -> Result<(), Error> {
    std::fs::write(path, text).map_err(|e| Error::FileCreate(path.to_string(), e))
}

fn main() {
    use clap::Parser;

    let args: Args = Args::parse();
    println!("RPN Kernel Generator");

    let mut config = match &args.config {
        Some(path) => Config::load(path).unwrap_or_else(|e| fail(&e, "")),
        None => Config::default(),
    };
    if args.lenient {
        config.strict = false;
    }
    if args.print_config {
        print!("{}", config.to_yaml());
        return;
    }

    println!("1. Read Headers");
    let (headers, missing) = read_headers(&config);
    for header in &headers {
        println!("  < {}", header.config.path);
    }
    for e in &missing {
        cprintln!("<yellow,bold>warn</>: {}", e);
    }

    println!("2. Assemble and Generate");
    println!("  < {}", args.input);
    let text = std::fs::read_to_string(&args.input)
        .map_err(|e| Error::FileOpen(args.input.clone(), e))
        .unwrap_or_else(|e| fail(&e, ""));
    let built = build(&args.input, &text, &headers, &config).unwrap_or_else(|e| fail(&e, &text));
    println!(
        "  {} opcodes ({} discovered), {} code words, {} data words",
        built.table.len(),
        built.registry.len(),
        built.program.code.len(),
        built.program.data.len()
    );
    for fixup in &built.program.unresolved {
        cprintln!(
            "<yellow,bold>warn</>: {}: undefined label `{}` left as `stop`",
            fixup.pos,
            fixup.name
        );
    }
    if args.verbose {
        println!("{}", rpnasm::listing(&built.program, &built.table));
    }

    println!("3. Write Outputs");
    let mut outputs = vec![(args.output.clone(), built.kernel.clone())];
    if let Some(path) = &args.manual {
        outputs.push((path.clone(), built.registry.manual()));
    }
    for (path, body) in &outputs {
        println!("  > {}", path);
        if let Err(e) = write(path, body) {
            fail(&e, "");
        }
    }
}
