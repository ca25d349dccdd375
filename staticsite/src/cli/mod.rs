//! Command line interface of the `staticsite` operator.
//!
//! # Examples
//!
//! ```bash
//! # Install the custom resource definition
//! staticsite crd | kubectl apply -f -
//!
//! # Run the controller against every namespace
//! staticsite run
//!
//! # Converge a single site once
//! staticsite reconcile --namespace web blog
//!
//! # List the sites of the current namespace
//! staticsite list
//! ```

pub mod error;
mod list;
mod reconcile;
mod run;

use std::{io::Write, path::PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use kube::CustomResourceExt;
use snafu::ResultExt;
use staticsite_base::CLI_PROGRAM_NAME;
use tokio::runtime::Runtime;

pub use self::error::Error;
use self::{list::ListCommand, reconcile::ReconcileCommand, run::RunCommand};
use crate::{config::Config, shadow, site::StaticSite};

/// `Cli` is the entry point of the `staticsite` binary.
///
/// It parses the command line, loads the configuration and dispatches to
/// the selected subcommand.
#[derive(Parser)]
#[command(
    name = CLI_PROGRAM_NAME,
    author,
    version,
    long_version = shadow::CLAP_LONG_VERSION,
    about = "Kubernetes operator serving static sites with nginx.",
    long_about = "staticsite watches StaticSite resources and keeps an nginx ConfigMap, a \
                  Deployment with a Prometheus exporter sidecar, and a Service in line with \
                  each site's spec.",
    color = clap::ColorChoice::Always
)]
pub struct Cli {
    /// The subcommand to execute. Help is printed when it is missing.
    #[clap(subcommand)]
    commands: Option<Commands>,

    /// Path to the configuration file.
    ///
    /// Defaults to the first existing file among the search paths of
    /// [`Config::search_config_file_path`].
    #[clap(
        long = "config",
        short = 'c',
        env = "STATICSITE_CONFIG_FILE_PATH",
        help = "Specify a configuration file. Defaults to ~/.config/staticsite/config.yaml or \
                STATICSITE_CONFIG_FILE_PATH env var."
    )]
    config_file: Option<PathBuf>,

    /// Overrides `log.level` from the configuration file.
    #[clap(
        long = "log-level",
        env = "STATICSITE_LOG_LEVEL",
        help = "Set the logging level (e.g., info, debug, trace)."
    )]
    log_level: Option<tracing::Level>,
}

/// `Commands` enumerates the subcommands of the `staticsite` binary.
///
/// `Version --client`, `Completions`, `DefaultConfig` and `Crd` work without
/// a cluster; every other subcommand needs a reachable API server.
#[derive(Clone, Subcommand)]
pub enum Commands {
    /// Displays client and server version information.
    #[command(about = "Display client and server version information")]
    Version {
        #[clap(long = "client", help = "If true, shows client version only (no server required).")]
        client: bool,
    },

    /// Generates a shell completion script for the specified shell.
    #[command(
        about = "Generate shell completion script for the specified shell (bash, zsh, fish)"
    )]
    Completions { shell: clap_complete::Shell },

    /// Outputs the default configuration in YAML format to stdout.
    #[command(about = "Output the default configuration in YAML format")]
    DefaultConfig,

    /// Outputs the `StaticSite` custom resource definition, ready to be
    /// piped into `kubectl apply -f -`.
    #[command(about = "Output the StaticSite custom resource definition in YAML format")]
    Crd,

    /// Runs the controller until interrupted.
    #[command(about = "Run the StaticSite controller")]
    Run(RunCommand),

    /// Runs a single reconcile pass for one site.
    #[command(alias = "r", about = "Reconcile a single StaticSite once")]
    Reconcile(ReconcileCommand),

    /// Lists sites with their image, port and service exposure.
    #[command(alias = "l", about = "List StaticSites")]
    List(ListCommand),
}

impl Default for Cli {
    /// Parses the process arguments, exiting with usage on error.
    fn default() -> Self { Self::parse() }
}

impl Cli {
    /// Loads the configuration file and applies the overrides given on the
    /// command line.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or parsed.
    fn load_config(&self) -> Result<Config, Error> {
        let mut config =
            Config::load(self.config_file.clone().unwrap_or_else(Config::search_config_file_path))?;

        if let Some(log_level) = self.log_level {
            config.log.level = log_level;
        }

        Ok(config)
    }

    /// Writes `data` to stdout, mapping I/O failures to
    /// [`Error::WriteStdout`].
    fn write_stdout(data: &[u8]) -> Result<(), Error> {
        std::io::stdout().write_all(data).context(error::WriteStdoutSnafu)
    }

    /// Dispatches to the selected subcommand and returns the process exit
    /// code.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration cannot be loaded, the
    /// Kubernetes client cannot be created, or the subcommand fails.
    pub fn run(self) -> Result<i32, Error> {
        let client_version = Self::command().get_version().unwrap_or_default().to_string();
        match self.commands {
            Some(Commands::Version { client }) if client => {
                Self::write_stdout(Self::command().render_long_version().as_bytes())?;
                Self::write_stdout(format!("Client Version: {client_version}\n").as_bytes())?;
                return Ok(0);
            }
            Some(Commands::Completions { shell }) => {
                let mut app = Self::command();
                let bin_name = app.get_name().to_string();
                clap_complete::generate(shell, &mut app, bin_name, &mut std::io::stdout());
                return Ok(0);
            }
            Some(Commands::DefaultConfig) => {
                Self::write_stdout(Config::default().to_yaml()?.as_bytes())?;
                return Ok(0);
            }
            Some(Commands::Crd) => {
                let crd = serde_yaml::to_string(&StaticSite::crd())
                    .context(error::SerializeCrdSnafu)?;
                Self::write_stdout(crd.as_bytes())?;
                return Ok(0);
            }
            None => {
                let help = Self::command().render_long_help().ansi().to_string();
                std::io::stderr().write_all(help.as_bytes()).context(error::WriteStdoutSnafu)?;
                return Ok(-1);
            }
            _ => {}
        }

        let config = self.load_config()?;
        config.log.registry();

        let fut = async move {
            let kube_client = kube::Client::try_default().await.context(error::KubeConfigSnafu)?;
            match self.commands {
                Some(Commands::Version { .. }) => {
                    let server_version = kube_client.apiserver_version().await.map_or_else(
                        |_| "unknown".to_string(),
                        |info| format!("{}.{}", info.major, info.minor),
                    );
                    Self::write_stdout(Self::command().render_long_version().as_bytes())?;
                    Self::write_stdout(
                        format!(
                            "Client Version: {client_version}\nServer Version: {server_version}\n"
                        )
                        .as_bytes(),
                    )?;
                }
                Some(Commands::Run(cmd)) => cmd.run(kube_client, config).await?,
                Some(Commands::Reconcile(cmd)) => cmd.run(kube_client).await?,
                Some(Commands::List(cmd)) => cmd.run(kube_client).await?,
                Some(
                    Commands::Completions { .. } | Commands::DefaultConfig | Commands::Crd,
                )
                | None => {}
            }

            Ok(0)
        };

        Runtime::new().context(error::InitializeTokioRuntimeSnafu)?.block_on(fut)
    }
}
