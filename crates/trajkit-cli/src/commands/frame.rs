use crate::cli::FrameArgs;
use crate::error::Result;
use std::io::Write;
use trajkit::trajectory::ReaderConfig;
use trajkit::workflows::read::open_path;

pub fn run(args: &FrameArgs, config: ReaderConfig, out: &mut impl Write) -> Result<()> {
    let trajectory = open_path(&args.input, config)?;
    let frame = trajectory.get(args.index)?;
    trajectory.close();

    writeln!(out, "{}", frame.simbox())?;
    let types = frame.types().ok();
    let orientations = frame.orientations().ok();

    for (i, p) in frame.positions().iter().enumerate().take(args.limit) {
        write!(out, "{:>8}", i)?;
        if let Some(types) = types {
            write!(out, " {:>6}", types[i])?;
        }
        write!(out, " {:>12.5} {:>12.5} {:>12.5}", p.x, p.y, p.z)?;
        if let Some(orientations) = orientations {
            let q = &orientations[i];
            write!(out, "  q=({:.5}, {:.5}, {:.5}, {:.5})", q.w, q.i, q.j, q.k)?;
        }
        writeln!(out)?;
    }
    if frame.len() > args.limit {
        writeln!(out, "... {} more particles", frame.len() - args.limit)?;
    }
    Ok(())
}
