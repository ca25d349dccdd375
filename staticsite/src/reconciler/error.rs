use snafu::Snafu;

/// Error raised by an [`ObjectStore`](super::ObjectStore) implementation.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that abort a reconcile pass.
///
/// None of them is retried inside the pass. The controller requeues the
/// site instead, and the next pass starts over from reading the site.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// The site itself could not be read. A missing site is not an error.
    #[snafu(display("Failed to get StaticSite {namespace}/{name}, error: {source}"))]
    GetSite { namespace: String, name: String, source: StoreError },

    /// The site lacks the name or uid a controller reference needs.
    #[snafu(display(
        "Failed to set owner reference on {kind} {name}, StaticSite {site} has no name or uid"
    ))]
    OwnerReference { kind: String, name: String, site: String },

    #[snafu(display("Failed to get {kind} {namespace}/{name}, error: {source}"))]
    GetObject { kind: String, namespace: String, name: String, source: StoreError },

    #[snafu(display("Failed to create {kind} {namespace}/{name}, error: {source}"))]
    CreateObject { kind: String, namespace: String, name: String, source: StoreError },

    #[snafu(display("Failed to update {kind} {namespace}/{name}, error: {source}"))]
    UpdateObject { kind: String, namespace: String, name: String, source: StoreError },
}
