use crate::cli::ValidateArgs;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use std::io::Write;
use tracing::info;
use trajkit::trajectory::ReaderConfig;
use trajkit::workflows::progress::ProgressReporter;
use trajkit::workflows::read;

pub fn run(args: &ValidateArgs, config: ReaderConfig, quiet: bool, out: &mut impl Write) -> Result<()> {
    let handler = CliProgressHandler::new(quiet);
    let reporter = ProgressReporter::with_callback(handler.get_callback());

    info!("Validating {:?}", args.input);
    let report = read::validate(&args.input, config, &reporter)?;

    writeln!(
        out,
        "{}: {} frames of {} particles decoded without errors",
        args.input.display(),
        report.frames,
        report.header.num_particles
    )?;
    match report.volume_range {
        Some((min, max)) => writeln!(out, "Box volume ranges from {:.4} to {:.4}", min, max)?,
        None => writeln!(out, "No frames, so no box volumes to report")?,
    }
    Ok(())
}
