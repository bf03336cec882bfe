//! Layered loading of the clearing parameters.

use crate::CliError;
use lem_core::models::MechanismParams;
use std::path::Path;

/// Load the clearing parameters with precedence:
/// 1. Environment variables (highest priority)
/// 2. The TOML file given by `--config`
/// 3. Default values (lowest priority)
///
/// Environment variables are named after the fields with a `LEM_` prefix,
/// e.g. `LEM_TOU=0.3` or `LEM_NUM_SAMPLES=1000`.
pub fn load_params(path: Option<&Path>) -> anyhow::Result<MechanismParams> {
    let mut config = config::Config::builder();

    config = config.add_source(config::Config::try_from(&MechanismParams::default())?);

    if let Some(path) = path {
        if !path.exists() {
            return Err(CliError::MissingConfig(path.to_owned()))?;
        }
        config = config.add_source(config::File::from(path));
    }

    config = config.add_source(
        config::Environment::with_prefix("LEM")
            .prefix_separator("_")
            .try_parsing(true),
    );

    let params = config.build()?.try_deserialize::<MechanismParams>()?;
    params.validate()?;
    Ok(params)
}
