// File: src/main.rs
//
// Main entry point for Frame Duel.
// Handles command-line argument parsing and dispatches to the appropriate
// subcommand (run, generate, or list).

use clap::{Args, Parser as ClapParser, Subcommand};
use colored::*;
use frame_duel::benchmarks::{suite, BenchmarkRunner};
use frame_duel::config::BenchConfig;
use frame_duel::data;
use frame_duel::errors::{BenchError, ErrorKind, Result};
use std::path::PathBuf;
use std::process;

const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(ClapParser)]
#[command(
    name = "frame-duel",
    about = "Frame Duel: row-oriented vs columnar dataframe micro-benchmarks",
    version = env!("CARGO_PKG_VERSION"),
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
#[command(arg_required_else_help = true)]
enum Commands {
    /// Run the benchmark suite and write one chart per test case
    Run(RunArgs),

    /// Write a synthetic price CSV for the suite to read
    Generate {
        /// Output CSV path
        #[arg(long, default_value = "data.csv")]
        out: PathBuf,

        #[arg(long, default_value_t = data::DEFAULT_SEED)]
        seed: u64,

        /// First day (YYYY-MM-DD)
        #[arg(long, default_value = data::DEFAULT_START)]
        start: String,

        /// Day after the last one (YYYY-MM-DD)
        #[arg(long, default_value = data::DEFAULT_END)]
        end: String,

        /// Comma-separated ticker symbols
        #[arg(long, value_delimiter = ',')]
        tickers: Vec<String>,
    },

    /// List the test cases and their variants
    List {
        #[arg(long)]
        only: Option<String>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Samples per variant
    #[arg(short, long)]
    repeats: Option<usize>,

    /// Statement executions per sample
    #[arg(short = 'n', long)]
    iterations: Option<usize>,

    /// Input CSV path
    #[arg(long)]
    data: Option<PathBuf>,

    /// Directory for chart images
    #[arg(long)]
    out: Option<PathBuf>,

    /// Only run test cases whose name matches this regex
    #[arg(long)]
    only: Option<String>,

    /// Open each chart in the system image viewer
    #[arg(long)]
    show: bool,

    /// Skip the bars printed in the terminal
    #[arg(long)]
    no_terminal_chart: bool,

    /// Write all reports as JSON to this path
    #[arg(long)]
    json: Option<PathBuf>,

    /// TOML file with defaults; flags override it
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = execute(cli.command) {
        eprintln!("{}", e);
        process::exit(1);
    }
}

/// Diagnostics go to stderr so stdout stays the report.
/// Filter comes from FRAME_DUEL_LOG, then RUST_LOG.
fn init_tracing() {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter_expr = std::env::var("FRAME_DUEL_LOG").ok().or_else(|| std::env::var("RUST_LOG").ok());
    let builder = fmt().with_writer(std::io::stderr);

    let builder = match filter_expr.and_then(|expr| EnvFilter::try_new(expr).ok()) {
        Some(filter) => builder.with_env_filter(filter),
        None => builder.with_env_filter(DEFAULT_LOG_FILTER),
    };

    let _ = builder.try_init();
}

fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::Run(args) => {
            let config = resolve_config(args)?;
            if !config.data_path.exists() {
                return Err(BenchError::new(
                    ErrorKind::Io,
                    format!("Data file not found: {}", config.data_path.display()),
                )
                .with_help("run `frame-duel generate` to create it"));
            }

            let suite = suite::default_suite(&config.data_path);
            let reports = BenchmarkRunner::new(config).run(&suite)?;
            println!("{} test cases completed", reports.len().to_string().bright_green().bold());
        }

        Commands::Generate { out, seed, start, end, tickers } => {
            let start = data::parse_date(&start)?;
            let end = data::parse_date(&end)?;
            let tickers: Vec<&str> = if tickers.is_empty() {
                data::DEFAULT_TICKERS.to_vec()
            } else {
                tickers.iter().map(String::as_str).collect()
            };

            let rows = data::generate_prices(&tickers, start, end, seed);
            data::write_csv(&rows, &out)?;
            println!("Wrote {} rows to {}", rows.len(), out.display().to_string().bright_white());
        }

        Commands::List { only } => {
            let config = BenchConfig { only, ..Default::default() };
            let selector = config.selector()?;

            for case in suite::default_suite(&config.data_path) {
                if selector.as_ref().map_or(false, |re| !re.is_match(case.name())) {
                    continue;
                }
                println!("{} {}", format!("{:02}", case.index()).bright_white().bold(), case.name());
                for label in case.labels() {
                    println!("     {}", label.cyan());
                }
            }
        }
    }

    Ok(())
}

fn resolve_config(args: RunArgs) -> Result<BenchConfig> {
    let mut config = match &args.config {
        Some(path) => BenchConfig::load(path)?,
        None => BenchConfig::default(),
    };

    if let Some(repeats) = args.repeats {
        config.repeats = repeats;
    }
    if let Some(iterations) = args.iterations {
        config.iterations = iterations;
    }
    if let Some(data) = args.data {
        config.data_path = data;
    }
    if let Some(out) = args.out {
        config.output_dir = out;
    }
    if args.only.is_some() {
        config.only = args.only;
    }
    if args.json.is_some() {
        config.json_output = args.json;
    }
    if args.show {
        config.show = true;
    }
    if args.no_terminal_chart {
        config.terminal_chart = false;
    }

    config.validate()?;
    Ok(config)
}
