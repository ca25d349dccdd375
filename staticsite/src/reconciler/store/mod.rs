//! The object store the reconciler converges against.
//!
//! The reconciler only needs three capabilities: fetch an object by
//! namespaced name, create an object and update an object. [`KubeStore`]
//! provides them on top of the Kubernetes API; tests plug in an in-memory
//! store.

mod error;
mod kube_store;
#[cfg(test)]
mod memory;

use std::fmt;

use kube::{Resource, core::NamespaceResourceScope};
use serde::{Serialize, de::DeserializeOwned};

pub use self::{error::Error, kube_store::KubeStore};
#[cfg(test)]
pub use self::memory::{MemoryStore, Mutation, ObjectId, Operation};

/// A namespaced object with a static type that the store can persist.
pub trait StoreObject:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + fmt::Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
}

impl<K> StoreObject for K where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + fmt::Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static
{
}

/// Reads and writes namespaced objects by name.
///
/// Implementations talk to the API server directly; there is no cache in
/// between, so every read observes the latest stored state. Writes must
/// behave like the API server: `create` fails if the object already exists
/// and `update` fails if the resource version carried by the object is
/// stale.
pub trait ObjectStore: Send + Sync {
    /// Error returned by every operation of the store.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetches the object at `namespace`/`name`.
    ///
    /// # Arguments
    ///
    /// * `namespace` - The namespace of the object.
    /// * `name` - The name of the object.
    ///
    /// # Returns
    ///
    /// `Ok(None)` if the object does not exist. A missing object is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself fails.
    fn get<K>(
        &self,
        namespace: &str,
        name: &str,
    ) -> impl Future<Output = Result<Option<K>, Self::Error>> + Send
    where
        K: StoreObject;

    /// Creates `object` at the namespaced name recorded in its metadata.
    ///
    /// # Arguments
    ///
    /// * `object` - The object to create, without a resource version.
    ///
    /// # Returns
    ///
    /// The object as stored, with its uid and resource version assigned.
    ///
    /// # Errors
    ///
    /// Returns an error if the object already exists, lacks a namespace or
    /// name, or cannot be written.
    fn create<K>(&self, object: &K) -> impl Future<Output = Result<K, Self::Error>> + Send
    where
        K: StoreObject;

    /// Replaces the stored object with `object`.
    ///
    /// # Arguments
    ///
    /// * `object` - The new state of the object. The resource version it
    ///   carries guards against concurrent writers.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not exist, was modified since
    /// `object` was read, or cannot be written.
    fn update<K>(&self, object: &K) -> impl Future<Output = Result<K, Self::Error>> + Send
    where
        K: StoreObject;
}
