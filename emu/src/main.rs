use clap::Parser;
use color_print::cprintln;

use rpnemu::hooks::{dump::Dump, trace::Trace, Hook};
use rpnemu::{CpuHost, Error, KernelHost, Launch, Machine};
use rpnkgen::{build, read_headers, Config};

#[derive(Parser, Debug)]
#[clap(
    name = "RPN Emulator",
    version = "v1.0.0",
    about = "Run RPN programs over raw 8-bit channel data"
)]
struct Args {
    #[arg(default_value = "main.rpn")]
    input_file: String,

    /// Raw 8-bit input buffer
    #[arg(short, long)]
    image: Option<String>,

    /// Raw 8-bit output buffer
    #[arg(short, long, default_value = "out.raw")]
    output: String,

    /// Run a single scalar instead of a buffer
    #[arg(short, long)]
    value: Option<f32>,

    /// Configuration file (YAML)
    #[arg(short, long)]
    config: Option<String>,

    /// Step limit per work item
    #[arg(short = 't', long)]
    tmax: Option<u64>,

    /// Trace every step (single value only)
    #[arg(long)]
    trace: bool,

    #[arg(short, long)]
    dump_cfg: Option<String>,

    #[arg(short = 'a', long)]
    dump_all: bool,
}

fn read(path: &str) -> Result<Vec<u8>, Error> {
    std::fs::read(path).map_err(|e| Error::FileOpen(path.to_string(), e))
}

fn run(args: Args) -> Result<(), Error> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let (headers, missing) = read_headers(&config);
    for e in &missing {
        cprintln!("<yellow,bold>warn</>: {}", e);
    }

    let text = std::fs::read_to_string(&args.input_file)
        .map_err(|e| Error::FileOpen(args.input_file.clone(), e))?;
    let built = match build(&args.input_file, &text, &headers, &config) {
        Ok(built) => built,
        Err(rpnkgen::Error::Asm(e)) => {
            e.print_diag(&text);
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    println!("+-----------------------------------------------+");
    println!("| {:<45} |", args.input_file);
    println!("+-----------------------------------------------+");

    if let Some(value) = args.value {
        println!("[INIT]");
        let mut hooks: Vec<Box<dyn Hook>> =
            vec![Box::new(Dump::arg(args.dump_cfg.clone(), args.dump_all)?)];
        if args.trace {
            hooks.push(Box::new(Trace::new()));
        }
        let machine = Machine::new(&built.table, &built.program.code, &built.program.data)
            .stack_size(config.stack_size)
            .domain_max(config.domain_max)
            .max_steps(args.tmax);
        let outcome = machine.run_with(value, &mut hooks)?;
        match outcome.status {
            0 => cprintln!("<green,bold>{}</> ({} steps)", outcome.output, outcome.steps),
            status => cprintln!("<red,bold>poison {}</> ({} steps)", status, outcome.steps),
        }
        println!("=================================================");
        return Ok(());
    }

    let image = args
        .image
        .as_deref()
        .ok_or_else(|| Error::Shape("an input buffer (--image) or --value is required".to_string()))?;
    let input: Vec<f32> = read(image)?.into_iter().map(f32::from).collect();
    println!("[LAUNCH] {} scalars", input.len());

    let mut host = CpuHost::new(&built.table, built.params.clone())
        .block_size(config.block_size)
        .max_steps(args.tmax);
    let launch = Launch::new(&built.kernel, &built.program, &input, config.pixel_width);
    let out = host.launch(&launch)?;

    let bytes: Vec<u8> = out.iter().map(|v| v.clamp(0.0, 255.0) as u8).collect();
    std::fs::write(&args.output, bytes).map_err(|e| Error::FileCreate(args.output.clone(), e))?;
    println!("  > {}", args.output);
    println!("=================================================");
    Ok(())
}

fn main() {
    let args = Args::parse();
    println!("RPN Emulator");
    if let Err(e) = run(args) {
        cprintln!("<red,bold>error</>: {}", e);
        std::process::exit(1);
    }
}
