//! CLI command implementations

pub mod live;
pub mod plan;
pub mod show;

use anyhow::Context;
use std::path::Path;

use director::DirectorConfig;

/// Loads the config file if one was given, otherwise the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<DirectorConfig> {
    match path {
        Some(path) => DirectorConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(DirectorConfig::default()),
    }
}
