mod controller;
mod error;
mod log;

use std::path::{Path, PathBuf};

use resolve_path::PathResolveExt;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

pub use self::{controller::ControllerConfig, error::Error, log::LogConfig};

/// Configuration of the operator, read from a YAML file.
///
/// Every section is optional, and an empty document yields
/// [`Config::default`].
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Settings of the controller loop started by `run`.
    #[serde(default = "ControllerConfig::default")]
    pub controller: ControllerConfig,

    /// Log outputs and level.
    #[serde(default = "LogConfig::default")]
    pub log: LogConfig,
}

impl Config {
    /// Returns the first configuration file that exists.
    ///
    /// The candidates are, in order:
    ///
    /// 1. [`Config::default_path`], the platform configuration directory.
    /// 2. `~/.config/staticsite/config.yaml`.
    /// 3. `~/.staticsite/config.yaml`.
    ///
    /// If none of them exists, [`Config::default_path`] is returned, which
    /// [`Config::load`] then treats as an empty configuration.
    pub fn search_config_file_path() -> PathBuf {
        let paths = vec![Self::default_path()]
            .into_iter()
            .chain(staticsite_base::fallback_project_config_directories().into_iter().map(
                |mut path| {
                    path.push(staticsite_base::CLI_CONFIG_NAME);
                    path
                },
            ))
            .collect::<Vec<_>>();
        for path in paths {
            let Ok(exists) = path.try_exists() else {
                continue;
            };
            if exists {
                return path;
            }
        }
        Self::default_path()
    }

    /// Returns `config.yaml` inside the platform configuration directory of
    /// the project, e.g. `~/.config/staticsite/config.yaml` on Linux.
    #[inline]
    pub fn default_path() -> PathBuf {
        [
            staticsite_base::PROJECT_CONFIG_DIR.to_path_buf(),
            PathBuf::from(staticsite_base::CLI_CONFIG_NAME),
        ]
        .into_iter()
        .collect()
    }

    /// Loads the configuration from `path`.
    ///
    /// A missing file is not an error: the defaults are used instead, so the
    /// controller can run in a cluster without any configuration mounted.
    /// `~` in `path` and in `log.filePath` is expanded.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `path` or `log.filePath` cannot be resolved.
    /// - The file exists but cannot be read.
    /// - The file is not a valid configuration document.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path =
            path.as_ref().try_resolve().map(|path| path.to_path_buf()).with_context(|_| {
                error::ResolveFilePathSnafu { file_path: path.as_ref().to_path_buf() }
            })?;

        if !path.try_exists().unwrap_or(false) {
            tracing::debug!("Config file {} does not exist, using defaults", path.display());
            return Ok(Self::default());
        }

        let data =
            std::fs::read(&path).context(error::OpenConfigSnafu { filename: path.clone() })?;
        Self::from_yaml(&data, path)
    }

    /// Parses a configuration document. `filename` is only used in errors.
    fn from_yaml(data: &[u8], filename: PathBuf) -> Result<Self, Error> {
        let mut config: Self =
            serde_yaml::from_slice(data).context(error::ParseConfigSnafu { filename })?;

        config.log.file_path = match config.log.file_path.map(|path| {
            path.try_resolve()
                .map(|path| path.to_path_buf())
                .with_context(|_| error::ResolveFilePathSnafu { file_path: path.clone() })
        }) {
            Some(Ok(path)) => Some(path),
            Some(Err(err)) => return Err(err),
            None => None,
        };

        Ok(config)
    }

    /// Renders the configuration as the YAML document `load` accepts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializeConfig`] if serialization fails, which does
    /// not happen for configurations built from [`Config::default`].
    pub fn to_yaml(&self) -> Result<String, Error> {
        serde_yaml::to_string(self).context(error::SerializeConfigSnafu)
    }
}
