use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Exposure policy of a site's `Service`.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub enum ServiceType {
    /// Reachable only from inside the cluster.
    #[default]
    ClusterIP,

    /// Reachable through a port on every node.
    NodePort,

    /// Reachable through an external load balancer.
    LoadBalancer,
}

impl ServiceType {
    /// Returns the name Kubernetes uses for this type in `spec.type`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClusterIP => "ClusterIP",
            Self::NodePort => "NodePort",
            Self::LoadBalancer => "LoadBalancer",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_uses_kubernetes_names() {
        for (service_type, name) in [
            (ServiceType::ClusterIP, "\"ClusterIP\""),
            (ServiceType::NodePort, "\"NodePort\""),
            (ServiceType::LoadBalancer, "\"LoadBalancer\""),
        ] {
            assert_eq!(serde_json::to_string(&service_type).unwrap(), name);
            assert_eq!(serde_json::from_str::<ServiceType>(name).unwrap(), service_type);
        }
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(serde_json::from_str::<ServiceType>("\"ExternalName\"").is_err());
    }
}
