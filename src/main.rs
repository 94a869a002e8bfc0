use std::error::Error;
use std::path::PathBuf;

use cavern_model::{build_and_save, logging, CavernConfig, Criterion, ModelDimension, ReferenceKernel};
use tracing::info;

const USAGE: &str = "usage: cavern-model [hoek-brown|mohr-coulomb] [2d|3d] [--config FILE] [--out DIR]";

struct Args {
    criterion: Criterion,
    dimension: ModelDimension,
    config: Option<PathBuf>,
    out: PathBuf,
}

fn parse_args() -> Result<Args, Box<dyn Error>> {
    let mut args = Args {
        criterion: Criterion::MohrCoulomb,
        dimension: ModelDimension::Three,
        config: None,
        out: PathBuf::from("."),
    };
    let mut positional = 0;
    let mut raw = std::env::args().skip(1);
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--config" => args.config = Some(raw.next().ok_or(USAGE)?.into()),
            "--out" => args.out = raw.next().ok_or(USAGE)?.into(),
            "-h" | "--help" => return Err(USAGE.into()),
            value => {
                match positional {
                    0 => args.criterion = value.parse()?,
                    1 => args.dimension = value.parse()?,
                    _ => return Err(format!("unexpected argument '{value}'\n{USAGE}").into()),
                }
                positional += 1;
            }
        }
    }
    Ok(args)
}

fn main() -> Result<(), Box<dyn Error>> {
    logging::init();
    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => CavernConfig::from_path(path)?,
        None => CavernConfig::default(),
    };

    let mut kernel = ReferenceKernel::new(args.dimension, args.criterion);
    let (model, path) = build_and_save(&mut kernel, &config, args.criterion, args.dimension, &args.out)?;
    info!(
        path = %path.display(),
        boundary_conditions = model.physics.boundary_conditions(),
        phases = model.study.steps.len(),
        "done"
    );
    println!("{}", path.display());
    Ok(())
}
