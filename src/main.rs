use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use dectest_runner::{Runner, SimpleEngine};

/// Run a decTest conformance script against the built-in decimal engine.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Top-level script file.
    script: PathBuf,

    /// Additional test-case id to skip (repeatable).
    #[arg(long = "skip-id", value_name = "ID")]
    skip_ids: Vec<String>,

    /// Start from an empty skip list instead of the built-in defaults.
    #[arg(long)]
    no_default_skips: bool,

    /// Trace control flow on stderr (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let mut runner = Runner::new(SimpleEngine::new());
    if args.no_default_skips {
        runner.clear_skip_ids();
    }
    for id in args.skip_ids {
        runner.add_skip_id(id);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match runner.run_file(&args.script, &mut out) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("dectest: {err}");
            ExitCode::FAILURE
        }
    }
}
