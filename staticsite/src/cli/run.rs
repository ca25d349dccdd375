use clap::Args;
use sigfinn::{ExitStatus, LifecycleManager};
use staticsite_base::CONTROLLER_NAME;

use crate::{cli::error::Error, config::Config, controller};

/// Arguments of the `run` subcommand, which starts the long-running
/// controller.
#[derive(Args, Clone)]
pub struct RunCommand {
    #[arg(
        short,
        long,
        help = "Only watch StaticSites in this namespace. Defaults to `controller.namespace` \
                from the configuration, or every namespace when unset."
    )]
    pub namespace: Option<String>,
}

impl RunCommand {
    /// Runs the controller until Ctrl+C or a termination signal.
    ///
    /// The namespace is taken from `--namespace`, then from
    /// `controller.namespace` in the configuration. An empty value from
    /// either source means every namespace.
    ///
    /// # Arguments
    ///
    /// * `kube_client` - The Kubernetes client the controller watches and
    ///   writes through.
    /// * `config` - The loaded configuration. Only its `controller` section
    ///   is used here.
    ///
    /// # Errors
    ///
    /// Returns an error if the lifecycle manager reports a failed worker.
    pub async fn run(self, kube_client: kube::Client, config: Config) -> Result<(), Error> {
        let Config { controller: controller_config, .. } = config;
        let namespace = self
            .namespace
            .or_else(|| controller_config.namespace.clone())
            .filter(|namespace| !namespace.is_empty());

        let lifecycle_manager = LifecycleManager::<Error>::new();
        let _handle = lifecycle_manager.spawn(CONTROLLER_NAME, move |shutdown_signal| async move {
            controller::run(kube_client, namespace, controller_config, shutdown_signal).await;
            ExitStatus::Success
        });

        if let Ok(Err(err)) = lifecycle_manager.serve().await {
            tracing::error!("{err}");
            Err(err)
        } else {
            Ok(())
        }
    }
}
