use clap::Args;
use snafu::ResultExt;
use tokio::io::AsyncWriteExt;

use crate::{
    cli::error::{self, Error},
    reconciler::{KubeStore, SiteKey, reconcile_site},
};

/// Arguments of the `reconcile` subcommand.
///
/// Runs exactly the pass the controller would run for one site, which is
/// useful to check RBAC permissions or to force a repair without restarting
/// the controller.
#[derive(Args, Clone)]
pub struct ReconcileCommand {
    #[arg(
        short,
        long,
        help = "Namespace of the StaticSite. Defaults to the current Kubernetes context's \
                namespace."
    )]
    pub namespace: Option<String>,

    #[arg(help = "Name of the StaticSite to reconcile")]
    pub name: String,
}

impl ReconcileCommand {
    /// Reconciles the site once and prints what was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the pass fails or the outcome cannot be written
    /// to stdout. A site that does not exist is reported, not treated as an
    /// error.
    pub async fn run(self, kube_client: kube::Client) -> Result<(), Error> {
        let Self { namespace, name } = self;
        let namespace = namespace
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| kube_client.default_namespace().to_string());

        let key = SiteKey::new(namespace, name);
        let outcome = reconcile_site(&KubeStore::new(kube_client), &key).await?;

        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(format!("StaticSite {key}: {outcome}\n").as_bytes())
            .await
            .context(error::WriteStdoutSnafu)
    }
}
