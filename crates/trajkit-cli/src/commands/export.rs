use crate::cli::ExportArgs;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use std::fs::File;
use std::io::{BufWriter, Write};
use tracing::info;
use trajkit::core::models::frame::Frame;
use trajkit::core::models::simbox::SimBox;
use trajkit::trajectory::ReaderConfig;
use trajkit::workflows::progress::ProgressReporter;
use trajkit::workflows::read;

const UNTYPED: &str = "X";
/// Frames decoded per worker thread before the batch is written out.
const FRAMES_PER_THREAD: usize = 16;

pub fn run(args: &ExportArgs, config: ReaderConfig, quiet: bool) -> Result<()> {
    let handler = CliProgressHandler::new(quiet);
    let reporter = ProgressReporter::with_callback(handler.get_callback());

    let file = File::create(&args.output).map_err(|e| CliError::Output {
        path: args.output.clone(),
        source: e,
    })?;
    let mut out = BufWriter::new(file);

    let batch_len = rayon::current_num_threads() * FRAMES_PER_THREAD;
    let written = read::stream_frames_parallel(
        &args.input,
        &config,
        &reporter,
        batch_len,
        |index, frame| xyz_block(&frame, index),
        |block: String| -> Result<()> {
            out.write_all(block.as_bytes())?;
            Ok(())
        },
    )?;
    out.flush()?;

    info!(frames = written, "Exported trajectory to {:?}", args.output);
    Ok(())
}

/// One frame as an extended XYZ block.
fn xyz_block(frame: &Frame, index: usize) -> String {
    let types = frame.types().ok();
    let mut block = format!("{}\n{}\n", frame.len(), extended_xyz_comment(frame.simbox(), index));
    for (i, p) in frame.positions().iter().enumerate() {
        let name = types.map_or(UNTYPED, |t| t[i].as_str());
        block.push_str(&format!("{} {:.6} {:.6} {:.6}\n", name, p.x, p.y, p.z));
    }
    block
}

fn extended_xyz_comment(simbox: &SimBox, frame: usize) -> String {
    let m = simbox.matrix();
    let lattice = (0..3)
        .flat_map(|col| (0..3).map(move |row| (row, col)))
        .map(|(row, col)| format!("{:.6}", m[(row, col)]))
        .collect::<Vec<_>>()
        .join(" ");
    format!("Lattice=\"{}\" Properties=species:S:1:pos:R:3 frame={}", lattice, frame)
}
