use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use voxelfunge::engine::Engine;
use voxelfunge::program;
use voxelfunge::trace::Tracer;

#[derive(Parser)]
#[command(name = "voxelfunge", about = "Interpreter for a three-dimensional stack language")]
struct Cli {
    /// Program file to execute.
    file: PathBuf,

    /// Pre-seed the stack, bottom first (e.g. "3,-1,12").
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    stack: Vec<i32>,

    /// Read program input from a file instead of stdin.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Write program output to a file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write a per-step execution trace to a file ("-" for stderr).
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Random seed for reproducibility.
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many steps (0 = run until the program ends).
    #[arg(long, default_value_t = 0)]
    max_steps: u64,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let program = program::load(&cli.file)?;

    let input: Box<dyn BufRead> = match &cli.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };
    let output: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout()),
    };

    let mut engine = Engine::new(program, input, output);
    engine.seed_stack(&cli.stack);
    if let Some(seed) = cli.seed {
        engine.set_seed(seed);
    }
    if let Some(path) = &cli.trace {
        let sink: Box<dyn Write> = if path.as_os_str() == "-" {
            Box::new(io::stderr())
        } else {
            Box::new(BufWriter::new(File::create(path)?))
        };
        engine.set_tracer(Tracer::new(sink));
    }

    if cli.max_steps == 0 {
        engine.run()?;
    } else {
        engine.run_limited(cli.max_steps)?;
        if engine.running() {
            eprintln!("stopped after {} steps", cli.max_steps);
        }
    }
    Ok(())
}
