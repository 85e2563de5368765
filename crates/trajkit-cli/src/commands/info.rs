use crate::cli::InfoArgs;
use crate::error::Result;
use std::io::Write;
use tracing::info;
use trajkit::trajectory::ReaderConfig;
use trajkit::workflows::read::open_path;

pub fn run(args: &InfoArgs, config: ReaderConfig, out: &mut impl Write) -> Result<()> {
    info!("Reading header of {:?}", args.input);
    let trajectory = open_path(&args.input, config)?;
    let header = trajectory.header();

    writeln!(out, "File:            {}", args.input.display())?;
    writeln!(out, "Frames:          {}", trajectory.len())?;
    writeln!(out, "Particles:       {}", header.num_particles)?;
    writeln!(out, "Byte order:      {:?}", header.byte_order)?;
    writeln!(
        out,
        "Variant marker:  {} ({:?} angles)",
        header.variant_marker, header.convention
    )?;
    writeln!(out, "Unit cell:       {}", if header.include_unitcell { "yes" } else { "no" })?;
    writeln!(
        out,
        "Timesteps:       start {}, every {}, dt {}",
        header.start_timestep,
        header.period,
        header.timestep_f32()
    )?;
    for title in &header.titles {
        writeln!(out, "Title:           {}", title)?;
    }

    if args.offsets {
        for entry in trajectory.entries() {
            writeln!(out, "  frame {:>8}  offset {:>12}", entry.frame, entry.offset)?;
        }
    }
    Ok(())
}
