use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use rox::lox::{self, Lox, RunStatus};
use rox::{Diagnostics, Reporter, StderrReporter};

/// Exit code for lexical, syntax and resolution errors.
const EXIT_STATIC_ERROR: i32 = 65;

/// Exit code for runtime errors.
const EXIT_RUNTIME_ERROR: i32 = 70;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize { filename: Option<PathBuf> },

    /// Parses a program from a file and prints its syntax tree as JSON
    Parse { filename: Option<PathBuf> },

    /// Runs input from a file as a Lox program
    Run { filename: Option<PathBuf> },

    /// Starts an interactive session reading one program per line
    Repl,
}

/// Maps a source file read-only.
fn map_file(filename: &Path) -> Result<Mmap> {
    info!("Mapping file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;

    // SAFETY: the map is only read, and only for the lifetime of this process.
    // Concurrent truncation of the file by another process is not supported.
    let map = unsafe { Mmap::map(&file) }
        .context(format!("Failed to map file {:?}", filename))?;

    info!("Mapped {} bytes from {:?}", map.len(), filename);

    Ok(map)
}

fn as_source<'m>(map: &'m Mmap, filename: &Path) -> Result<&'m str> {
    std::str::from_utf8(map).context(format!("File {:?} is not valid UTF-8", filename))
}

fn init_logger() -> Result<()> {
    // Create or open the log file
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // Configure env_logger to write to file with module and source line
    Builder::new()
        .format(|buf, record| {
            // Strip 'rox::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn no_input() -> ! {
    println!("No input filepath was provided. Exiting...");
    std::process::exit(0);
}

fn tokenize(filename: &Path) -> Result<()> {
    info!("Running Tokenize subcommand");
    let map = map_file(filename)?;
    let source = as_source(&map, filename)?;

    let mut reporter = StderrReporter::new();
    let tokens = lox::scan(source, &mut reporter);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for token in &tokens {
        debug!("Scanned token: {}", token);
        writeln!(out, "{}", token)?;
    }

    if reporter.has_errors() {
        debug!("Tokenization failed, exiting with code {}", EXIT_STATIC_ERROR);
        std::process::exit(EXIT_STATIC_ERROR);
    }

    info!("Tokenization completed successfully");
    Ok(())
}

fn parse(filename: &Path) -> Result<()> {
    info!("Running Parse subcommand");
    let map = map_file(filename)?;
    let source = as_source(&map, filename)?;

    let mut reporter = StderrReporter::new();
    let tokens = lox::scan(source, &mut reporter);
    let statements = lox::parse(&tokens, &mut reporter);

    if reporter.has_errors() {
        std::process::exit(EXIT_STATIC_ERROR);
    }

    let json = serde_json::to_string_pretty(&statements).context("Failed to serialize AST")?;
    println!("{}", json);

    info!("Parse subcommand completed");
    Ok(())
}

fn run(filename: &Path) -> Result<()> {
    info!("Running Run subcommand");
    let map = map_file(filename)?;
    let source = as_source(&map, filename)?;
    info!("Provided input:\n {}", source);

    let mut session = Lox::new();
    let mut reporter = StderrReporter::new();

    match session.run(source, &mut reporter) {
        RunStatus::Ok => {
            info!("Program executed successfully");
            Ok(())
        }
        RunStatus::StaticError => std::process::exit(EXIT_STATIC_ERROR),
        RunStatus::RuntimeError => std::process::exit(EXIT_RUNTIME_ERROR),
    }
}

fn repl() -> Result<()> {
    info!("Starting REPL");

    let mut session: Lox<'static> = Lox::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line.context("Failed to read from stdin")?;

        // Closures defined on this line may be called from later ones.
        let source: &'static str = Box::leak(line.into_boxed_str());

        let mut diagnostics = Diagnostics::new();
        let status = session.run(source, &mut diagnostics);
        debug!("REPL entry finished: {:?}", status);

        for e in diagnostics.errors() {
            eprintln!("{}", e);
        }
    }

    info!("REPL finished");
    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename } => tokenize(&filename.unwrap_or_else(|| no_input())),
        Commands::Parse { filename } => parse(&filename.unwrap_or_else(|| no_input())),
        Commands::Run { filename } => run(&filename.unwrap_or_else(|| no_input())),
        Commands::Repl => repl(),
    }
}
