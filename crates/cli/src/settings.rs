use anyhow::{Context, Result};
use certchain_types::GradeScale;
use config::{Config, Environment, File as ConfigFile};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_DATA_DIR: &str = "./certchain-data";

/// Settings layered from defaults, an optional config file, then
/// `CERTCHAIN_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub data_dir: PathBuf,
    /// Scale applied by `init`; existing registries keep their stored scale.
    pub grade_scale: GradeScale,
}

impl Settings {
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("data_dir", DEFAULT_DATA_DIR)?
            .set_default("grade_scale", GradeScale::default().as_str())?;

        if let Some(path) = config_path {
            if !path.exists() {
                anyhow::bail!(
                    "Configuration file {} not found (specified via --config)",
                    path.display()
                );
            }
            builder = builder.add_source(ConfigFile::from(path));
        }

        builder = builder.add_source(Environment::with_prefix("CERTCHAIN"));

        builder
            .build()?
            .try_deserialize()
            .context("invalid certchain configuration")
    }
}
