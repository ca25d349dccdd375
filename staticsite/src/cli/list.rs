use clap::Args;
use kube::{Api, api::ListParams};
use snafu::ResultExt;
use tokio::io::AsyncWriteExt;

use crate::{
    cli::error::{self, Error},
    site::StaticSite,
    ui::table::SiteListExt,
};

/// Arguments of the `list` subcommand.
#[derive(Args, Clone)]
pub struct ListCommand {
    #[arg(
        short,
        long,
        help = "Kubernetes namespace to list StaticSites from. Defaults to the current \
                Kubernetes context's namespace."
    )]
    pub namespace: Option<String>,

    #[arg(short = 'A', long, help = "List StaticSites across all Kubernetes namespaces.")]
    pub all_namespaces: bool,
}

impl ListCommand {
    /// Lists sites and prints them as a table.
    ///
    /// Ports are shown after the default substitution, i.e. as the workload
    /// actually uses them.
    ///
    /// # Errors
    ///
    /// Returns an error if the sites cannot be listed or the table cannot be
    /// written to stdout.
    pub async fn run(self, kube_client: kube::Client) -> Result<(), Error> {
        let Self { namespace, all_namespaces } = self;
        let list_params = ListParams::default();

        let sites = if all_namespaces {
            Api::<StaticSite>::all(kube_client)
                .list(&list_params)
                .await
                .context(error::ListSitesSnafu)?
        } else {
            let namespace = namespace
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| kube_client.default_namespace().to_string());
            Api::<StaticSite>::namespaced(kube_client, &namespace)
                .list(&list_params)
                .await
                .context(error::ListSitesWithNamespaceSnafu { namespace })?
        };

        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(sites.items.render_table().as_bytes())
            .await
            .context(error::WriteStdoutSnafu)?;
        stdout.write_u8(b'\n').await.context(error::WriteStdoutSnafu)
    }
}
