//! Logging setup for the controller and the CLI.
//!
//! `LogConfig` selects the outputs and the minimum level, and installs the
//! global `tracing` subscriber. Inside a pod only stdout or stderr is useful,
//! since the kubelet collects container output. Journald and file output
//! exist for running `staticsite run` on a host, for example as a systemd
//! unit pointed at a remote cluster.
use std::{fs::OpenOptions, path::PathBuf};

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use tracing_subscriber::{
    Layer, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt,
};

/// Where log records go and which ones are kept.
///
/// # Examples
///
/// ```yaml
/// log:
///   level: DEBUG
///   emitStdout: true
///   filePath: ~/.local/state/staticsite/controller.log
/// ```
#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    /// Append records to this file as well. `~` is expanded when the
    /// configuration is loaded.
    #[serde(default = "LogConfig::default_file_path")]
    pub file_path: Option<PathBuf>,

    /// Send records to the systemd journal.
    #[serde(default = "LogConfig::default_emit_journald")]
    pub emit_journald: bool,

    #[serde(default = "LogConfig::default_emit_stdout")]
    pub emit_stdout: bool,

    #[serde(default = "LogConfig::default_emit_stderr")]
    pub emit_stderr: bool,

    /// Records below this level are dropped.
    #[serde(default = "LogConfig::default_log_level")]
    #[serde_as(as = "DisplayFromStr")]
    pub level: tracing::Level,
}

impl Default for LogConfig {
    /// `INFO` to stdout only, which is what a controller in a pod needs.
    fn default() -> Self {
        Self {
            file_path: Self::default_file_path(),
            emit_journald: Self::default_emit_journald(),
            emit_stdout: Self::default_emit_stdout(),
            emit_stderr: Self::default_emit_stderr(),
            level: Self::default_log_level(),
        }
    }
}

impl LogConfig {
    #[inline]
    #[must_use]
    pub const fn default_log_level() -> tracing::Level { tracing::Level::INFO }

    #[inline]
    #[must_use]
    pub const fn default_file_path() -> Option<PathBuf> { None }

    #[inline]
    #[must_use]
    pub const fn default_emit_journald() -> bool { false }

    #[inline]
    #[must_use]
    pub const fn default_emit_stdout() -> bool { true }

    #[inline]
    #[must_use]
    pub const fn default_emit_stderr() -> bool { false }

    /// Lists the outputs this configuration enables, console outputs first.
    fn targets(&self) -> Vec<LogTarget> {
        let Self { file_path, emit_journald, emit_stdout, emit_stderr, .. } = self;
        [
            emit_stdout.then_some(LogTarget::Stdout),
            emit_stderr.then_some(LogTarget::Stderr),
            emit_journald.then_some(LogTarget::Journald),
            file_path.clone().map(LogTarget::File),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Installs the global subscriber built from this configuration.
    ///
    /// Outputs that cannot be opened, such as an unreachable journal or an
    /// unwritable log file, are skipped and reported on the remaining ones.
    ///
    /// # Panics
    ///
    /// Panics when a global subscriber has already been installed.
    pub fn registry(&self) {
        let mut skipped = Vec::new();
        let layers = self
            .targets()
            .into_iter()
            .filter_map(|target| {
                let description = target.to_string();
                let layer = target.layer();
                if layer.is_none() {
                    skipped.push(description);
                }
                layer
            })
            .collect::<Vec<_>>();

        tracing_subscriber::registry()
            .with(tracing_subscriber::filter::LevelFilter::from_level(self.level))
            .with(layers)
            .init();

        for target in skipped {
            tracing::warn!("Log output {target} is unavailable, skipping it");
        }
    }
}

/// A single log output.
#[derive(Clone, Debug, Eq, PartialEq)]
enum LogTarget {
    Stdout,
    Stderr,
    Journald,
    File(PathBuf),
}

impl std::fmt::Display for LogTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
            Self::Journald => f.write_str("journald"),
            Self::File(path) => write!(f, "file {}", path.display()),
        }
    }
}

impl LogTarget {
    /// Builds the layer writing to this output, or `None` when the output
    /// cannot be opened.
    #[allow(clippy::type_repetition_in_bounds)]
    fn layer<S>(self) -> Option<Box<dyn Layer<S> + Send + Sync + 'static>>
    where
        S: tracing::Subscriber,
        for<'a> S: LookupSpan<'a>,
    {
        // Records carry the site key in the message, so spans and thread ids
        // add nothing.
        let fmt = tracing_subscriber::fmt::layer().with_target(false);

        match self {
            Self::Stdout => Some(fmt.with_writer(std::io::stdout).boxed()),
            Self::Stderr => Some(fmt.with_writer(std::io::stderr).boxed()),
            Self::Journald => tracing_journald::layer().ok().map(Layer::boxed),
            Self::File(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path).ok()?;
                Some(fmt.with_ansi(false).with_writer(file).boxed())
            }
        }
    }
}
