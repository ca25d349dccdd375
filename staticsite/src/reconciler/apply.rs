//! Create-or-update of owned objects.

use std::fmt;

use k8s_openapi::api::{
    apps::v1::Deployment,
    core::v1::{ConfigMap, Service, ServiceSpec},
};
use snafu::ResultExt;

use super::{
    Error, error,
    store::{ObjectStore, StoreObject},
};

/// The write [`create_or_update`] issued.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Applied {
    /// The object did not exist and was created.
    Created,

    /// The object existed and was written back with the owned fields merged.
    Updated,
}

impl fmt::Display for Applied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Updated => f.write_str("updated"),
        }
    }
}

/// Converges the object named by `desired` toward `desired`.
///
/// A missing object is created verbatim. An existing object is kept as the
/// base of the write, so server-assigned fields survive; `merge` copies the
/// fields the reconciler owns from `desired` onto it before the update is
/// issued. Exactly one write happens per call, even when nothing changed.
///
/// # Arguments
///
/// * `store` - The store holding the object.
/// * `desired` - The object as the builders produced it. Its metadata must
///   carry the namespace and name to look up.
/// * `merge` - Copies the owned fields of `desired` (second argument) onto
///   the stored object (first argument).
///
/// # Returns
///
/// [`Applied::Created`] if the object did not exist, otherwise
/// [`Applied::Updated`].
///
/// # Errors
///
/// Returns an error if fetching, creating or updating the object fails. A
/// missing object is not an error.
pub async fn create_or_update<S, K, M>(store: &S, desired: K, merge: M) -> Result<Applied, Error>
where
    S: ObjectStore,
    K: StoreObject,
    M: FnOnce(&mut K, K) + Send,
{
    let kind = K::kind(&()).to_string();
    let namespace = desired.meta().namespace.clone().unwrap_or_default();
    let name = desired.meta().name.clone().unwrap_or_default();

    let existing = store
        .get::<K>(&namespace, &name)
        .await
        .boxed()
        .context(error::GetObjectSnafu { kind: &kind, namespace: &namespace, name: &name })?;

    if let Some(mut existing) = existing {
        merge(&mut existing, desired);
        let _updated = store
            .update(&existing)
            .await
            .boxed()
            .context(error::UpdateObjectSnafu { kind: &kind, namespace: &namespace, name: &name })?;
        tracing::debug!("{kind} {namespace}/{name} updated");
        Ok(Applied::Updated)
    } else {
        let _created = store
            .create(&desired)
            .await
            .boxed()
            .context(error::CreateObjectSnafu { kind: &kind, namespace: &namespace, name: &name })?;
        tracing::info!("{kind} {namespace}/{name} created");
        Ok(Applied::Created)
    }
}

/// Copies the labels and the nginx configuration data.
pub fn merge_config_map(existing: &mut ConfigMap, desired: ConfigMap) {
    existing.metadata.labels = desired.metadata.labels;
    existing.data = desired.data;
}

/// Copies the labels and the whole spec.
///
/// The spec is owned as a unit: replicas, strategy and any container changed
/// by hand are reset to the desired state.
pub fn merge_deployment(existing: &mut Deployment, desired: Deployment) {
    existing.metadata.labels = desired.metadata.labels;
    existing.spec = desired.spec;
}

/// Only type, selector and ports are owned; the rest of the spec carries
/// values the API server allocated, such as the cluster IP.
pub fn merge_service(existing: &mut Service, desired: Service) {
    existing.metadata.labels = desired.metadata.labels;
    let desired = desired.spec.unwrap_or_default();
    let spec = existing.spec.get_or_insert_with(ServiceSpec::default);
    spec.type_ = desired.type_;
    spec.selector = desired.selector;
    spec.ports = desired.ports;
}
