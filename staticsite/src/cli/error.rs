use snafu::Snafu;

/// Errors reported by the CLI before exiting with a non-zero status.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{source}"))]
    Configuration { source: crate::config::Error },

    #[snafu(display("{source}"))]
    Reconcile {
        #[snafu(source(from(crate::reconciler::Error, Box::new)))]
        source: Box<crate::reconciler::Error>,
    },

    #[snafu(display("Failed to write to stdout, error: {source}"))]
    WriteStdout { source: std::io::Error },

    #[snafu(display("Failed to initialize Kubernetes client configuration, error: {source}"))]
    KubeConfig {
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to create tokio runtime, error: {source}"))]
    InitializeTokioRuntime { source: std::io::Error },

    #[snafu(display("Failed to serialize custom resource definition, error: {source}"))]
    SerializeCrd { source: serde_yaml::Error },

    #[snafu(display("Failed to list StaticSites, error: {source}"))]
    ListSites {
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to list StaticSites in namespace {namespace}, error: {source}"))]
    ListSitesWithNamespace {
        namespace: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },
}

impl From<crate::config::Error> for Error {
    fn from(source: crate::config::Error) -> Self { Self::Configuration { source } }
}

impl From<crate::reconciler::Error> for Error {
    fn from(source: crate::reconciler::Error) -> Self {
        Self::Reconcile { source: Box::new(source) }
    }
}
