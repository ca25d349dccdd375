//! Runs [`reconcile_site`] under `kube::runtime::Controller`.
//!
//! The controller watches `StaticSite` objects and the `ConfigMap`s,
//! `Deployment`s and `Service`s they own, queues the owning site whenever
//! any of them changes, and never runs two passes for the same site at once.

use std::{sync::Arc, time::Duration};

use futures::StreamExt;
use k8s_openapi::api::{
    apps::v1::Deployment,
    core::v1::{ConfigMap, Service},
};
use kube::{
    Api, Resource, ResourceExt,
    core::NamespaceResourceScope,
    runtime::{
        Controller,
        controller::{self, Action},
        watcher,
    },
};
use staticsite_base::{CONTROLLER_NAME, consts::k8s::labels};

use crate::{
    config::ControllerConfig,
    reconciler::{self, KubeStore, ObjectStore, SiteKey, reconcile_site},
    site::StaticSite,
};

/// State shared by every reconcile pass of the controller.
struct Context<S> {
    /// Store the owned objects are converged against.
    store: S,

    /// Delay before a site whose pass failed is queued again.
    error_requeue_interval: Duration,
}

fn site_key(site: &StaticSite) -> SiteKey {
    SiteKey::new(site.namespace().unwrap_or_default(), site.name_any())
}

/// Runs one reconcile pass for `site`.
///
/// A successful pass waits for the next watch event instead of scheduling a
/// timed requeue: every change to the site or to an owned object queues the
/// site again.
///
/// # Errors
///
/// Returns the error of the failed pass. The controller hands it to
/// [`error_policy`].
async fn reconcile<S>(
    site: Arc<StaticSite>,
    ctx: Arc<Context<S>>,
) -> Result<Action, reconciler::Error>
where
    S: ObjectStore,
{
    let key = site_key(&site);
    let outcome = reconcile_site(&ctx.store, &key).await?;
    tracing::info!("StaticSite {key} reconciled: {outcome}");
    Ok(Action::await_change())
}

/// Requeues a site whose pass failed after the configured fixed interval.
#[allow(clippy::needless_pass_by_value)]
fn error_policy<S>(
    site: Arc<StaticSite>,
    err: &reconciler::Error,
    ctx: Arc<Context<S>>,
) -> Action {
    tracing::warn!("Failed to reconcile StaticSite {}, error: {err}", site_key(&site));
    Action::requeue(ctx.error_requeue_interval)
}

/// Returns an [`Api`] over `namespace`, or over every namespace if it is
/// `None`.
fn api<K>(client: &kube::Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<Scope = NamespaceResourceScope>,
    K::DynamicType: Default,
{
    namespace.map_or_else(
        || Api::all(client.clone()),
        |namespace| Api::namespaced(client.clone(), namespace),
    )
}

/// Runs the controller until `shutdown_signal` resolves.
///
/// The controller watches `StaticSite` objects together with the
/// `ConfigMap`s, `Deployment`s and `Service`s labelled as owned by a site.
/// Events on an owned object are mapped back to the owning site through its
/// controller reference, so drifted or deleted objects are repaired.
///
/// # Arguments
///
/// * `client` - The Kubernetes client used for watches and writes.
/// * `namespace` - The namespace to watch, or `None` to watch every
///   namespace.
/// * `config` - Concurrency and error requeue settings.
/// * `shutdown_signal` - A future resolving when the controller should stop.
///   Passes still in flight are dropped.
pub async fn run<F>(
    client: kube::Client,
    namespace: Option<String>,
    config: ControllerConfig,
    shutdown_signal: F,
) where
    F: Future + Send,
{
    let namespace = namespace.as_deref();
    let owned =
        watcher::Config::default().labels(&format!("{}={}", labels::APP, labels::APP_VALUE));
    let context = Arc::new(Context {
        store: KubeStore::new(client.clone()),
        error_requeue_interval: config.error_requeue_interval(),
    });

    let sites = api::<StaticSite>(&client, namespace);
    let controller = Controller::new(sites, watcher::Config::default())
        .owns(api::<ConfigMap>(&client, namespace), owned.clone())
        .owns(api::<Deployment>(&client, namespace), owned.clone())
        .owns(api::<Service>(&client, namespace), owned)
        .with_config(controller::Config::default().concurrency(config.concurrency))
        .run(reconcile, error_policy, context)
        .for_each(|result| async move {
            match result {
                Ok((object, _action)) => tracing::debug!("Reconciled {object}"),
                Err(err) => tracing::warn!("{CONTROLLER_NAME} reported an error: {err}"),
            }
        });

    tracing::info!(
        "{CONTROLLER_NAME} watching StaticSites in {}",
        namespace.map_or_else(|| "all namespaces".to_string(), |ns| format!("namespace {ns}"))
    );

    tokio::select! {
        () = controller => tracing::info!("{CONTROLLER_NAME} stopped"),
        _ = shutdown_signal => tracing::info!("{CONTROLLER_NAME} shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use k8s_openapi::api::core::v1::ConfigMap;
    use kube::runtime::controller::Action;

    use super::{Context, error_policy, reconcile};
    use crate::{
        reconciler::{MemoryStore, Operation},
        site::{SiteServiceSpec, StaticSite, StaticSiteSpec},
    };

    fn context(store: MemoryStore) -> Arc<Context<MemoryStore>> {
        Arc::new(Context { store, error_requeue_interval: Duration::from_secs(30) })
    }

    fn site(store: &MemoryStore) -> Arc<StaticSite> {
        let mut site = StaticSite::new("blog", StaticSiteSpec {
            image: "myorg/site:v1".to_string(),
            port: 0,
            service: SiteServiceSpec::default(),
        });
        site.metadata.namespace = Some("web".to_string());
        Arc::new(store.seed(site))
    }

    #[tokio::test]
    async fn test_successful_pass_waits_for_changes() {
        let store = MemoryStore::default();
        let site = site(&store);
        let ctx = context(store);

        let action = reconcile(site, Arc::clone(&ctx)).await.unwrap();

        assert_eq!(action, Action::await_change());
        assert!(ctx.store.object::<ConfigMap>("web", "blog-nginx-config").is_some());
    }

    #[tokio::test]
    async fn test_failed_pass_is_requeued_after_interval() {
        let store = MemoryStore::default();
        let site = site(&store);
        store.fail::<ConfigMap>(Operation::Create);
        let ctx = context(store);

        let err = reconcile(Arc::clone(&site), Arc::clone(&ctx)).await.unwrap_err();
        let action = error_policy(site, &err, ctx);

        assert_eq!(action, Action::requeue(Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn test_deleted_site_waits_for_changes() {
        let store = MemoryStore::default();
        let site = site(&MemoryStore::default());
        let ctx = context(store);

        let action = reconcile(site, Arc::clone(&ctx)).await.unwrap();

        assert_eq!(action, Action::await_change());
        assert!(ctx.store.mutations().is_empty());
    }
}
