//! Command-line entry point for the archive password brute-force utility.

use archive_pwbf::{
    Alphabet, Charset, ConfigError, Coordinator, DEFAULT_CONCURRENCY, DEFAULT_PROGRESS_INTERVAL,
    ProgressReporter, SearchConfig, SearchError, SearchOutcome, SevenZipVerifier, Verifier,
    ZipVerifier,
};
use clap::{ArgAction, Parser, ValueEnum};
use tracing::Level;

use std::path::PathBuf;
use std::process::exit;
use std::time::Instant;

/// Exit status for configuration problems, reported before any attempt runs.
const EXIT_CONFIG: i32 = 1;

/// Exit status when the verifier itself failed and the search was aborted.
const EXIT_VERIFIER: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum VerifierKind {
    /// Decrypt ZIP entries in-process
    Zip,
    /// Shell out to a 7-Zip compatible binary
    #[value(name = "7z")]
    SevenZip,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
/// CLI arguments supported by archive-pwbf.
struct Cli {
    /// Path to the password-protected archive
    #[arg(short = 'i', long = "input", value_name = "ARCHIVE", required = true)]
    input: PathBuf,

    /// Character sets to draw candidates from, in order
    #[arg(short = 'c', long = "charset", value_enum, value_delimiter = ',')]
    charsets: Vec<Charset>,

    /// Extra literal characters appended to the alphabet
    #[arg(long = "chars", value_name = "CHARS")]
    chars: Option<String>,

    /// Candidate lengths, searched in the order given (overrides --min/--max)
    #[arg(short = 'l', long = "lengths", value_delimiter = ',')]
    lengths: Vec<usize>,

    /// Minimum password length to brute-force
    #[arg(long = "min", default_value_t = 1)]
    min: usize,

    /// Maximum password length to brute-force
    #[arg(long = "max", default_value_t = 6)]
    max: usize,

    /// Number of verification attempts run concurrently
    #[arg(short = 't', long = "threads", default_value_t = DEFAULT_CONCURRENCY)]
    threads: usize,

    /// Print a progress sample every this many attempts
    #[arg(long = "every", default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    every: u64,

    /// How candidate passwords are checked
    #[arg(long = "verifier", value_enum, default_value_t = VerifierKind::Zip)]
    verifier: VerifierKind,

    /// 7-Zip binary used by `--verifier 7z`
    #[arg(long = "seven-zip", value_name = "PROGRAM", default_value = "7z")]
    seven_zip: PathBuf,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

/// Entrypoint that validates flags, builds the verifier and runs the search.
fn main() {
    let args = Cli::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if args.charsets.is_empty() && args.chars.is_none() {
        eprintln!("Error: provide at least one candidate set via --charset and/or --chars.");
        exit(EXIT_CONFIG);
    }

    let config = build_config(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        exit(EXIT_CONFIG);
    });

    let verifier: Box<dyn Verifier> = match args.verifier {
        VerifierKind::Zip => match ZipVerifier::open(&config.archive_path) {
            Ok(verifier) => Box::new(verifier),
            Err(e) => {
                eprintln!("Error: {}", e);
                exit(EXIT_CONFIG);
            }
        },
        VerifierKind::SevenZip => Box::new(SevenZipVerifier::new(
            &args.seven_zip,
            &config.archive_path,
        )),
    };

    let start = Instant::now();

    println!("Archive: {}", config.archive_path.display());
    println!("Lengths: {:?}", config.lengths);
    println!("Charset size: {}", config.alphabet.len());
    match config.search_space() {
        Some(total) => println!("Search space: {}", total),
        None => println!("Search space: too large to count"),
    }

    let progress = ProgressReporter::new(config.search_space());

    let mut coordinator = Coordinator::new(config, verifier).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        exit(EXIT_CONFIG);
    });

    let result = coordinator.run(&progress);

    progress.finish();

    let elapsed = start.elapsed();

    match result {
        Ok(report) => {
            match report.outcome {
                SearchOutcome::Found(password) => println!("Password found: {}", password),
                SearchOutcome::Exhausted => {
                    println!("Password not found in provided search space.")
                }
            }
            println!("Attempts: {}", report.attempts);
            println!("Elapsed: {:.2?}", elapsed);
        }
        Err(SearchError::Config(e)) => {
            eprintln!("Error: {}", e);
            exit(EXIT_CONFIG);
        }
        Err(e) => {
            eprintln!("Search aborted: {}", e);
            println!("Attempts: {}", coordinator.attempts());
            println!("Elapsed: {:.2?}", elapsed);
            exit(EXIT_VERIFIER);
        }
    }
}

/// Turns CLI flags into a validated search configuration.
fn build_config(args: &Cli) -> Result<SearchConfig, ConfigError> {
    let alphabet = Alphabet::from_sets(&args.charsets, args.chars.as_deref().unwrap_or(""))?;

    let lengths = if args.lengths.is_empty() {
        SearchConfig::length_range(args.min, args.max)?
    } else {
        args.lengths.clone()
    };

    let config = SearchConfig::new(&args.input, alphabet, lengths)
        .with_concurrency(args.threads)
        .with_progress_interval(args.every);
    config.validate()?;
    Ok(config)
}
