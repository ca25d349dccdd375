use snafu::Snafu;

/// Errors raised by [`KubeStore`](super::KubeStore).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// The object to write has no namespace or no name, so the request
    /// cannot be addressed.
    #[snafu(display("Object has no {field} in its metadata"))]
    MissingMetadata { field: &'static str },

    /// The API server rejected the request or could not be reached.
    #[snafu(display("{source}"))]
    Api {
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },
}
