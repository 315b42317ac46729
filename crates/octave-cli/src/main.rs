mod config;

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;

use octave_core::{multiply, Allocator, Matrix, Strategy};
use octave_dispatch::{Format, Session, SessionOptions};

#[derive(Parser)]
#[command(
    name = "octave",
    version,
    about = "In-memory matrix store over Z/10007, driven by single-letter commands"
)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format for dims, print and error notices
    #[arg(long, global = true)]
    format: Option<CliFormat>,

    /// Immediate retries before an allocation failure is fatal
    #[arg(long, global = true)]
    alloc_retries: Option<u32>,

    /// Matrix slots reserved up front
    #[arg(long, global = true)]
    initial_capacity: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command session (default)
    Run {
        /// Read commands from this file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Show the resolved configuration
    Config,

    /// Compare naive and Strassen multiplication on random square matrices
    Bench {
        /// Side length, rounded up to a power of two
        #[arg(short, long, default_value = "64")]
        size: usize,

        /// Products per strategy
        #[arg(short, long, default_value = "3")]
        rounds: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CliFormat {
    Text,
    Json,
}

impl From<CliFormat> for Format {
    fn from(val: CliFormat) -> Self {
        match val {
            CliFormat::Text => Format::Text,
            CliFormat::Json => Format::Json,
        }
    }
}

fn init_tracing(filter: Option<&str>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(filter.unwrap_or("warn"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
}

/// CLI flags win over the config file.
fn session_options(cli: &Cli, cfg: &config::Config) -> Result<SessionOptions> {
    let format = match cli.format {
        Some(f) => f.into(),
        None => cfg.output.format.parse::<Format>().map_err(|e| anyhow!(e))?,
    };
    Ok(SessionOptions {
        initial_capacity: cli.initial_capacity.unwrap_or(cfg.store.initial_capacity),
        alloc_retries: cli.alloc_retries.unwrap_or(cfg.alloc.retries),
        format,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(cli.config.as_deref())?;
    init_tracing(cfg.log.filter.as_deref());

    let options = session_options(&cli, &cfg)?;
    debug!(?options, "starting");

    match cli.command {
        None => cmd_run(options, None),
        Some(Commands::Run { ref input }) => cmd_run(options, input.as_deref()),
        Some(Commands::Config) => cmd_config(cli.config.as_deref(), &options),
        Some(Commands::Bench { size, rounds }) => cmd_bench(options, size, rounds),
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_run(options: SessionOptions, input: Option<&Path>) -> Result<()> {
    let session = Session::open(options).context("failed to create matrix store")?;
    let stdout = io::stdout().lock();

    let result = match input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
            session.run(BufReader::new(file), stdout)
        }
        None => session.run(io::stdin().lock(), stdout),
    };

    let exit = result.context("session aborted")?;
    debug!(?exit, "session finished");
    Ok(())
}

fn cmd_config(explicit: Option<&Path>, options: &SessionOptions) -> Result<()> {
    println!("Config: {}", config::show_config_path(explicit));
    println!();
    println!("[store]");
    println!("  initial_capacity = {}", options.initial_capacity);
    println!();
    println!("[alloc]");
    println!("  retries = {}", options.alloc_retries);
    println!();
    println!("[output]");
    println!("  format = {}", options.format);
    Ok(())
}

fn cmd_bench(options: SessionOptions, size: usize, rounds: usize) -> Result<()> {
    if size == 0 || rounds == 0 {
        bail!("size and rounds must be positive");
    }
    let side = size.next_power_of_two();
    let alloc = Allocator::new(options.alloc_retries);

    let a = bench_matrix(side, 1, alloc)?;
    let b = bench_matrix(side, 2, alloc)?;

    let mut results = Vec::new();
    for strategy in [Strategy::Naive, Strategy::Strassen] {
        let t0 = Instant::now();
        let mut product = None;
        for _ in 0..rounds {
            product = Some(multiply(strategy, &a, &b, alloc)?);
        }
        let ms = t0.elapsed().as_secs_f64() * 1000.0 / rounds as f64;
        results.push((strategy, ms, product));
    }

    if results[0].2 != results[1].2 {
        bail!("naive and Strassen products disagree for {side}x{side}");
    }

    println!("Matrix product {side}x{side}, {rounds} rounds");
    println!("{}", "-".repeat(40));
    for (strategy, ms, _) in &results {
        println!("{:<12} {ms:>10.3} ms/op", format!("{strategy:?}"));
    }
    if let Some(sum) = results[0].2.as_ref().map(Matrix::sum) {
        println!("{:<12} {sum:>10}", "Sum");
    }
    Ok(())
}

/// Deterministic pseudo-random `side x side` matrix.
fn bench_matrix(side: usize, seed: u64, alloc: Allocator) -> Result<Matrix> {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    let values = std::iter::repeat_with(move || {
        // xorshift64
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state >> 33) as i64
    });
    Ok(Matrix::load(side, side, values, alloc)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_command_is_run() {
        let cli = Cli::try_parse_from(["octave"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "octave",
            "--format",
            "json",
            "--initial-capacity",
            "16",
            "run",
        ])
        .unwrap();
        let options = session_options(&cli, &config::Config::default()).unwrap();
        assert_eq!(options.format, Format::Json);
        assert_eq!(options.initial_capacity, 16);
        assert_eq!(options.alloc_retries, 1);
    }

    #[test]
    fn test_bad_config_format() {
        let cli = Cli::try_parse_from(["octave"]).unwrap();
        let mut cfg = config::Config::default();
        cfg.output.format = "xml".into();
        assert!(session_options(&cli, &cfg).is_err());
    }

    #[test]
    fn test_run_reads_input_file() {
        let mut script = tempfile::NamedTempFile::new().unwrap();
        writeln!(script, "L 2 2\n1 2\n3 4\nT 0\nD 0\nQ").unwrap();
        cmd_run(SessionOptions::default(), Some(script.path())).unwrap();
    }

    #[test]
    fn test_run_missing_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("commands.txt");
        let err = cmd_run(SessionOptions::default(), Some(&missing)).unwrap_err();
        assert!(format!("{err:#}").contains("cannot open"));
    }

    #[test]
    fn test_run_fatal_protocol_error() {
        let mut script = tempfile::NamedTempFile::new().unwrap();
        writeln!(script, "L 1 1 5\nD five\nQ").unwrap();
        let err = cmd_run(SessionOptions::default(), Some(script.path())).unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.starts_with("session aborted"));
        assert!(err.root_cause().downcast_ref::<octave_core::OctaveError>().is_some());
    }

    #[test]
    fn test_run_subcommand_input_flag() {
        let cli = Cli::try_parse_from(["octave", "run", "--input", "cmds.txt"]).unwrap();
        match cli.command {
            Some(Commands::Run { input }) => assert_eq!(input, Some(PathBuf::from("cmds.txt"))),
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_bench_matrix_is_deterministic() {
        let alloc = Allocator::default();
        let a = bench_matrix(4, 7, alloc).unwrap();
        let b = bench_matrix(4, 7, alloc).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, bench_matrix(4, 8, alloc).unwrap());
    }

    #[test]
    fn test_bench_runs() {
        cmd_bench(SessionOptions::default(), 5, 1).unwrap();
    }
}
