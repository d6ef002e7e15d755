mod devices;
mod reading;

use clap::Parser;
use devices::{Endpoint, ExchangeSettings, Mw100};
use reading::Reading;
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::fmt;

const LOG_DIR: &str = "logs";

/// Query an MW100 once and print `DD/MM/YY,HH:MM:SS,<value>`.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Hostname or IP address of the MW100
    hostname: String,

    /// TCP port of the MW100
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,
}

fn main() -> ExitCode {
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(usage_status(&err));
        }
    };

    let _guard = setup_logging(Path::new(LOG_DIR));
    info!("Starting mw100-probe");

    let mut mw100 = Mw100::new(
        Endpoint::new(&args.hostname, args.port),
        ExchangeSettings::default(),
    );

    let status = report(mw100.fetch_reading(), io::stdout().lock());

    info!("mw100-probe shutting down");
    ExitCode::from(status)
}

/// `--help` and `--version` succeed; anything else clap rejects is a usage error.
fn usage_status(err: &clap::Error) -> u8 {
    if err.use_stderr() { 1 } else { 0 }
}

/// Emits the outcome of one exchange and returns the process exit status.
fn report<W: Write>(outcome: devices::mw100::Result<Option<Reading>>, out: W) -> u8 {
    match outcome {
        Ok(Some(reading)) => match reading.write_line(out) {
            Ok(()) => 0,
            Err(e) => {
                error!("Failed to write reading: {}", e);
                eprintln!("Failed to write reading: {}", e);
                1
            }
        },
        // The handshake miss is already logged by the client
        Ok(None) => 0,
        Err(e) if e.is_parse_failure() => {
            error!("Could not parse MW100 response: {}", e);
            eprintln!("Could not parse MW100 response: {}", e);
            1
        }
        Err(e) => {
            error!("Measurement failed: {}", e);
            eprintln!("Measurement failed: {}", e);
            1
        }
    }
}

fn log_appender(dir: &Path) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("mw100-probe.log")
        .build(dir)
}

fn setup_logging(dir: &Path) -> WorkerGuard {
    // Stdout carries the reading, so logs go to a daily rotated file, or to stderr
    // when the log directory cannot be used
    let (non_blocking, guard) = match log_appender(dir) {
        Ok(appender) => tracing_appender::non_blocking(appender),
        Err(e) => {
            eprintln!("File logging unavailable in {}: {}", dir.display(), e);
            tracing_appender::non_blocking(io::stderr())
        }
    };

    let _ = fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_level(true)
        .try_init();

    guard
}
