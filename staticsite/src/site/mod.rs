//! The `StaticSite` custom resource.
//!
//! A `StaticSite` declares which image serves the content, on which port the
//! nginx process listens, and how the site is exposed inside or outside the
//! cluster. The operator owns a `ConfigMap`, a `Deployment` and a `Service`
//! for every site.

mod names;
mod service_type;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use self::{names::SiteNames, service_type::ServiceType};
use crate::consts;

/// Specification of a static site.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[kube(
    group = "static.static.com",
    version = "v1",
    kind = "StaticSite",
    plural = "staticsites",
    shortname = "ss",
    namespaced,
    printcolumn = r#"{"name":"Image","type":"string","jsonPath":".spec.image"}"#,
    printcolumn = r#"{"name":"Service","type":"string","jsonPath":".spec.service.type"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct StaticSiteSpec {
    /// Container image serving the site content.
    pub image: String,

    /// Port the content-serving container listens on. `0` selects the
    /// default port.
    #[serde(default)]
    pub port: i32,

    /// How the site is exposed.
    #[serde(default)]
    pub service: SiteServiceSpec,
}

/// Exposure settings of a static site.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SiteServiceSpec {
    #[serde(default, rename = "type")]
    pub type_: ServiceType,

    /// Port the service exposes for HTTP traffic. `0` selects the default
    /// port.
    #[serde(default)]
    pub port: i32,
}

impl StaticSiteSpec {
    /// Port of the content-serving container.
    #[inline]
    #[must_use]
    pub const fn container_port(&self) -> i32 {
        if self.port == 0 { consts::DEFAULT_HTTP_PORT } else { self.port }
    }
}

impl SiteServiceSpec {
    /// Port of the HTTP service port.
    #[inline]
    #[must_use]
    pub const fn http_port(&self) -> i32 {
        if self.port == 0 { consts::DEFAULT_HTTP_PORT } else { self.port }
    }
}
