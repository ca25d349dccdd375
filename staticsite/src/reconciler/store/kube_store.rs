use kube::{Api, api::PostParams};
use snafu::{OptionExt, ResultExt};
use staticsite_base::CONTROLLER_NAME;

use super::{Error, ObjectStore, StoreObject, error};

/// [`ObjectStore`] backed by the Kubernetes API server.
///
/// Every call goes straight to the API server through a namespaced
/// [`Api`]. Writes are tagged with the controller name as field manager, so
/// `kubectl get -o yaml --show-managed-fields` attributes them to the
/// operator.
#[derive(Clone)]
pub struct KubeStore {
    client: kube::Client,
}

impl KubeStore {
    /// Creates a store issuing requests through `client`.
    pub const fn new(client: kube::Client) -> Self { Self { client } }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: StoreObject,
    {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn post_params() -> PostParams {
        PostParams { field_manager: Some(CONTROLLER_NAME.to_string()), ..PostParams::default() }
    }
}

/// Extracts the namespace and name a write is addressed to.
fn object_key<K>(object: &K) -> Result<(&str, &str), Error>
where
    K: StoreObject,
{
    let meta = object.meta();
    let namespace = meta
        .namespace
        .as_deref()
        .context(error::MissingMetadataSnafu { field: "namespace" })?;
    let name = meta.name.as_deref().context(error::MissingMetadataSnafu { field: "name" })?;
    Ok((namespace, name))
}

impl ObjectStore for KubeStore {
    type Error = Error;

    async fn get<K>(&self, namespace: &str, name: &str) -> Result<Option<K>, Self::Error>
    where
        K: StoreObject,
    {
        self.api::<K>(namespace).get_opt(name).await.context(error::ApiSnafu)
    }

    async fn create<K>(&self, object: &K) -> Result<K, Self::Error>
    where
        K: StoreObject,
    {
        let (namespace, _name) = object_key(object)?;
        self.api::<K>(namespace).create(&Self::post_params(), object).await.context(error::ApiSnafu)
    }

    async fn update<K>(&self, object: &K) -> Result<K, Self::Error>
    where
        K: StoreObject,
    {
        let (namespace, name) = object_key(object)?;
        self.api::<K>(namespace)
            .replace(name, &Self::post_params(), object)
            .await
            .context(error::ApiSnafu)
    }
}
