//! Parameter sweep
//!
//! Runs a plan of experiments (the classic 40-iteration sweep unless a plan
//! file is given) and exports one CSV row per scoring round.

use clap::Parser;
use overlay_reduce::config::SweepPlan;
use overlay_reduce::experiment::{run_sweep, write_csv, write_json};
use overlay_reduce::logging::{init_logging, LogFormat};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sweep")]
#[command(about = "Run a parameter sweep over service overlay reductions")]
#[command(version)]
struct Args {
    /// JSON sweep plan; defaults to the classic sweep
    #[arg(short, long)]
    plan: Option<PathBuf>,

    /// Seed of the classic sweep
    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[arg(short, long, default_value = "sweep_results.csv")]
    output: PathBuf,

    /// Also write the full results as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Save the plan that was run
    #[arg(long)]
    save_plan: Option<PathBuf>,

    /// Run iterations one after another instead of on the thread pool
    #[arg(long)]
    sequential: bool,

    /// Worker threads (0 = one per core)
    #[arg(short = 'j', long, default_value_t = 0)]
    threads: usize,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Directory for rotated JSON log files
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let _guard = init_logging(args.log_format, args.log_dir.as_deref())?;

    if args.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .build_global()?;
    }

    let plan = match &args.plan {
        Some(path) => SweepPlan::from_json_file(path)?,
        None => SweepPlan::classic(args.seed),
    };
    if let Some(path) = &args.save_plan {
        plan.save_json(path)?;
    }

    info!(
        iterations = plan.experiments.len(),
        parallel = !args.sequential,
        "starting sweep"
    );
    let results = run_sweep(&plan, !args.sequential);

    println!("=== Sweep Results ===");
    for entry in &results.entries {
        match (&entry.report, &entry.error) {
            (Some(report), _) => println!("[{:>2}] {}", entry.index, report),
            (None, Some(error)) => println!("[{:>2}] FAILED: {}", entry.index, error),
            (None, None) => {}
        }
    }
    println!(
        "{} iterations, {} failed",
        results.entries.len(),
        results.failures()
    );

    let mut csv = BufWriter::new(File::create(&args.output)?);
    write_csv(&results, &mut csv)?;
    csv.flush()?;
    println!("Results written to {}", args.output.display());

    if let Some(path) = &args.json {
        write_json(&results, BufWriter::new(File::create(path)?))?;
        println!("JSON written to {}", path.display());
    }

    Ok(())
}
