use crate::cli::{DimensionsArg, ReaderArgs};
use crate::error::Result;
use tracing::debug;
use trajkit::core::models::simbox::Dimensions;
use trajkit::trajectory::ReaderConfig;

impl From<DimensionsArg> for Dimensions {
    fn from(arg: DimensionsArg) -> Self {
        match arg {
            DimensionsArg::Two => Dimensions::Two,
            DimensionsArg::Three => Dimensions::Three,
        }
    }
}

/// Loads the config file, if any, and applies command-line overrides on top.
pub fn resolve(args: &ReaderArgs) -> Result<ReaderConfig> {
    let mut config = match &args.config {
        Some(path) => {
            debug!("Loading reader configuration from {:?}", path);
            ReaderConfig::load(path)?
        }
        None => ReaderConfig::default(),
    };

    if let Some(dimensions) = args.dimensions {
        config.dimensions = dimensions.into();
    }
    if let Some(name) = &args.default_type {
        config.types = None;
        config.default_type = Some(name.clone());
    }

    config.validate()?;
    debug!("Resolved reader configuration: {:?}", config);
    Ok(config)
}
