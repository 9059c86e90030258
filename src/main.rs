//! `lexp`: command-line driver for the lambda calculus engine.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use lexp_rs::*;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, IsTerminal, Write};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lexp")]
#[command(about = "Pool-backed lambda calculus reducer", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print pool statistics to stderr on exit
    #[arg(long, global = true)]
    pool_info: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct ReductionArgs {
    /// Maximum reduction steps (0 = unbounded)
    #[arg(long, default_value_t = 1000)]
    max_steps: usize,

    /// Maximum term size in cells (0 = unbounded)
    #[arg(long, default_value_t = 1000)]
    max_cells: usize,

    /// Redex selection strategy
    #[arg(long, default_value = "canonical")]
    strategy: Strategy,
}

impl ReductionArgs {
    fn config(&self) -> ReductionConfig {
        ReductionConfig {
            strategy: self.strategy,
            max_steps: self.max_steps,
            max_cells: self.max_cells,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Reduce terms given as arguments, or one per line from stdin
    Reduce {
        terms: Vec<String>,

        #[command(flatten)]
        reduction: ReductionArgs,
    },

    /// Print the distance between two terms
    Distance { a: String, b: String },

    /// Check two terms for alpha-equivalence
    Equiv { a: String, b: String },

    /// Print a Church numeral
    Church {
        n: usize,

        /// Reduce the numeral through the doubling function
        #[arg(long)]
        double: bool,
    },

    /// Reduce a file of terms in parallel, writing JSONL records
    Batch {
        /// Input file, one term per line
        #[arg(short, long)]
        input: String,

        /// Output file (JSONL format); stdout when omitted
        #[arg(short, long)]
        output: Option<String>,

        /// Number of parallel workers (default: number of CPUs)
        #[arg(short, long)]
        workers: Option<usize>,

        #[command(flatten)]
        reduction: ReductionArgs,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            let fatal = err
                .downcast_ref::<LexpError>()
                .is_some_and(LexpError::is_fatal);
            error!("{:#}", err);
            eprintln!("lexp: {:#}", err);
            if fatal {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let pool_info = cli.pool_info;
    match cli.command {
        Commands::Reduce { terms, reduction } => {
            let mut engine = Engine::with_config(PoolConfig::default(), reduction.config());
            let code = run_reduce(&mut engine, &terms)?;
            report_pool(&engine, pool_info);
            Ok(code)
        }
        Commands::Distance { a, b } => {
            let mut engine = Engine::new();
            let a = engine.parse(&a).context("first term")?;
            let b = engine.parse(&b).context("second term")?;
            println!("{}", engine.distance(a, b));
            report_pool(&engine, pool_info);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Equiv { a, b } => {
            let mut engine = Engine::new();
            let a = engine.parse(&a).context("first term")?;
            let b = engine.parse(&b).context("second term")?;
            println!("{}", engine.alpha_equivalent(a, b));
            report_pool(&engine, pool_info);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Church { n, double } => {
            let mut engine = Engine::new();
            let numeral = church::church_numeral(engine.pool_mut(), n)?;
            let term = if double {
                let doubler = church::doubler(engine.pool_mut())?;
                let term = engine.application(doubler, numeral)?;
                let config = ReductionConfig {
                    max_steps: 0,
                    max_cells: 0,
                    ..ReductionConfig::default()
                };
                let done = engine.reduce_with(term, config)?;
                debug!(steps = done.steps, "doubled numeral");
                if !engine.canonicalize(term) {
                    warn!("doubled numeral keeps the names produced by reduction");
                }
                term
            } else {
                numeral
            };
            println!("{}", engine.render(term));
            report_pool(&engine, pool_info);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Batch {
            input,
            output,
            workers,
            reduction,
        } => run_batch_command(&input, output.as_deref(), workers, &reduction),
    }
}

/// Reduce each term and print `INPUT =(STEPS)=> RESULT`.
///
/// With no terms, reads one per line from stdin until an empty line.
fn run_reduce(engine: &mut Engine, terms: &[String]) -> Result<ExitCode> {
    let config = engine.config();
    debug!(
        strategy = %config.strategy,
        max_steps = config.max_steps,
        max_cells = config.max_cells,
        "reducing terms"
    );

    let mut failed = false;
    let mut reduce_one = |engine: &mut Engine, text: &str| -> Result<()> {
        match engine.reduce_text(text) {
            Ok(out) => println!("{} =({})=> {}", text, out.reduction.steps, out.result),
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                eprintln!("lexp: {}: {}", text, err);
                failed = true;
            }
        }
        Ok(())
    };

    if !terms.is_empty() {
        for text in terms {
            reduce_one(engine, text)?;
        }
    } else {
        let stdin = io::stdin();
        let interactive = stdin.is_terminal();
        let mut lines = stdin.lock().lines();
        loop {
            if interactive {
                eprint!("lexp> ");
                io::stderr().flush()?;
            }
            let line = match lines.next() {
                Some(line) => line.context("reading stdin")?,
                None => break,
            };
            let text = line.trim();
            if text.is_empty() {
                break;
            }
            reduce_one(engine, text)?;
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn run_batch_command(
    input: &str,
    output: Option<&str>,
    workers: Option<usize>,
    reduction: &ReductionArgs,
) -> Result<ExitCode> {
    let config = BatchConfig {
        workers: workers.unwrap_or_else(num_cpus::get),
        reduction: reduction.config(),
        ..BatchConfig::default()
    };

    eprintln!("Configuration:");
    eprintln!("  Workers: {}", config.workers);
    eprintln!("  Strategy: {}", config.reduction.strategy);
    eprintln!("  Max steps: {}", config.reduction.max_steps);
    eprintln!("  Max cells: {}", config.reduction.max_cells);
    eprintln!("  Output: {}", output.unwrap_or("<stdout>"));
    eprintln!();

    let file = File::open(input).with_context(|| format!("opening {}", input))?;
    let lines = BufReader::new(file)
        .lines()
        .collect::<io::Result<Vec<String>>>()
        .with_context(|| format!("reading {}", input))?;

    let start = Instant::now();
    let records = run_batch(&lines, &config).context("starting worker pool")?;
    let elapsed = start.elapsed().as_secs_f64();

    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    for record in &records {
        serde_json::to_writer(&mut writer, record)?;
        writeln!(writer)?;
    }
    writer.flush()?;

    let stats = BatchStats::of(&records);
    eprintln!("Results:");
    eprintln!("  Terms: {}", stats.terms);
    eprintln!("  Normal forms: {}", stats.normal_forms);
    eprintln!("  Errors: {}", stats.errors);
    eprintln!("  Time: {:.2}s", elapsed);

    Ok(if stats.fatal > 0 {
        ExitCode::from(2)
    } else if stats.errors > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn report_pool(engine: &Engine, enabled: bool) {
    if enabled {
        eprintln!("{}", engine.pool_info());
    }
}
