use std::{env, path::PathBuf, process};

use col::prelude::*;
use glam::Vec3;

const USAGE: &str = "usage: col-readout <input.col> [--config <col.ini>] [<output.col>]";

struct Args {
    input: PathBuf,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
}

fn parse_args() -> Option<Args> {
    let mut input = None;
    let mut config = None;
    let mut output = None;

    let mut args = env::args_os().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            config = Some(PathBuf::from(args.next()?));
        } else if input.is_none() {
            input = Some(PathBuf::from(arg));
        } else if output.is_none() {
            output = Some(PathBuf::from(arg));
        } else {
            return None;
        }
    }

    Some(Args {
        input: input?,
        config,
        output,
    })
}

fn summarize(index: usize, model: &ColModel) {
    let extent: Vec3 = model.bounds.max - model.bounds.min;
    log::info!(
        "#{index} {:?} id {} ({:?}): radius {:.2}, extent {extent}",
        model.model_name,
        model.model_id,
        model.version(),
        model.bounds.radius,
    );
    log::info!(
        "    {} spheres, {} boxes, {} verts, {} faces, {} face groups, flags {:#x}",
        model.spheres.len(),
        model.boxes.len(),
        model.mesh_verts.len(),
        model.mesh_faces.len(),
        model.face_groups.len(),
        model.flags,
    );
    if model.has_shadow_mesh() {
        log::info!(
            "    shadow mesh: {} verts, {} faces",
            model.shadow_verts.len(),
            model.shadow_faces.len()
        );
    }
    if let Err(e) = model.validate() {
        log::warn!("    {e}");
    }
}

pub fn main() -> Result<()> {
    env_logger::init();

    let Some(args) = parse_args() else {
        eprintln!("{USAGE}");
        process::exit(2);
    };

    let config = match &args.config {
        Some(path) => ColConfig::load(path)?,
        None => ColConfig::default(),
    };

    let file = ColFile::load_file_with(&args.input, &config)?;
    for (i, model) in file.models.iter().enumerate() {
        summarize(i, model);
    }

    if let Some(output) = &args.output {
        file.write_file_with(output, &config)?;
        log::info!("wrote {} models to {}", file.models.len(), output.display());
    }

    Ok(())
}
