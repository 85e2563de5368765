use crate::error::{CliError, Result};
use std::env;
use std::fs::File;
use std::path::Path;
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    fmt::{self, format::FmtSpan},
    prelude::*,
};

/// Environment variable with `target=level` directives that replace the `-v` levels.
pub const LOG_ENV: &str = "TRAJKIT_LOG";

const CRATE_TARGET: &str = "trajkit";

fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::OFF
    } else {
        match verbosity {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

/// `-v` raises trajkit's own targets only; dependencies stay at warnings.
fn log_filter(verbosity: u8, quiet: bool, directives: Option<&str>) -> Result<Targets> {
    if quiet {
        return Ok(Targets::new().with_default(LevelFilter::OFF));
    }
    if let Some(directives) = directives {
        return directives.parse::<Targets>().map_err(|e| {
            CliError::Argument(format!("Invalid {} value '{}': {}", LOG_ENV, directives, e))
        });
    }
    Ok(Targets::new()
        .with_default(LevelFilter::WARN)
        .with_target(CRATE_TARGET, level_filter(verbosity, quiet)))
}

pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let directives = env::var(LOG_ENV).ok();
    let filter = log_filter(verbosity, quiet, directives.as_deref())?;

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact();

    let subscriber = tracing_subscriber::registry().with(filter).with(stderr_layer);

    if let Some(path) = log_file {
        let file = File::create(path).map_err(|e| CliError::Output {
            path: path.to_path_buf(),
            source: e,
        })?;

        // Closing spans carry the time spent indexing and decoding.
        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_thread_ids(true)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE);

        subscriber.with(file_layer).init();
    } else {
        subscriber.init();
    }

    Ok(())
}
