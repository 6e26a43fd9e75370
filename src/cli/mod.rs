//! Command-line interface module.

mod args;

pub use args::{BundleArgs, Cli};

use anyhow::Result;
use nocd_bundle::config::{BundleOptions, CONFIG_FILE_NAME, ConfigError, find_config_file};
use nocd_bundle::debug;
use std::path::Path;

/// Layer options: defaults → config file → CLI flags.
///
/// An explicit `--config` must exist; the default file is optional.
pub fn load_options(cli: &Cli, cwd: &Path) -> Result<BundleOptions> {
    let mut options = match &cli.config {
        Some(path) => {
            let path = cwd.join(path);
            if !path.is_file() {
                return Err(ConfigError::Io(
                    path,
                    std::io::Error::from(std::io::ErrorKind::NotFound),
                )
                .into());
            }
            debug!("config"; "using {}", path.display());
            BundleOptions::from_path(&path)?
        }
        None => match find_config_file(Path::new(CONFIG_FILE_NAME), cwd) {
            Some(path) => {
                debug!("config"; "using {}", path.display());
                BundleOptions::from_path(&path)?
            }
            None => BundleOptions::default(),
        },
    };

    cli.bundle.apply(&mut options);
    Ok(options)
}
