use std::collections::BTreeMap;

use staticsite_base::consts::{k8s::labels, suffixes};

/// Names of the objects owned by a site, derived from the site name alone.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SiteNames {
    /// Name of the `ConfigMap` holding the nginx configuration.
    pub config_map: String,

    /// Name of the `Deployment` running nginx and the exporter.
    pub deployment: String,

    /// Name of the `Service` exposing the site.
    pub service: String,
}

impl SiteNames {
    /// Derives the owned object names of the site called `site_name`.
    ///
    /// The names are a pure function of the site name, which is how the
    /// reconciler finds the objects again on every pass: the site never
    /// records what it owns.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let names = SiteNames::new("blog");
    /// assert_eq!(names.config_map, "blog-nginx-config");
    /// assert_eq!(names.deployment, "blog-web");
    /// assert_eq!(names.service, "blog-svc");
    /// ```
    pub fn new(site_name: &str) -> Self {
        Self {
            config_map: format!("{site_name}{}", suffixes::CONFIG_MAP),
            deployment: format!("{site_name}{}", suffixes::DEPLOYMENT),
            service: format!("{site_name}{}", suffixes::SERVICE),
        }
    }

    /// Labels stamped on every owned object.
    ///
    /// The same map is used as the `Deployment` selector, the pod template
    /// labels and the `Service` selector.
    pub fn labels(site_name: &str) -> BTreeMap<String, String> {
        BTreeMap::from([
            (labels::APP.to_string(), labels::APP_VALUE.to_string()),
            (labels::SITE.to_string(), site_name.to_string()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_derived_from_site_name() {
        let names = SiteNames::new("blog");
        assert_eq!(names.config_map, "blog-nginx-config");
        assert_eq!(names.deployment, "blog-web");
        assert_eq!(names.service, "blog-svc");
    }

    #[test]
    fn test_distinct_sites_do_not_collide() {
        let a = SiteNames::new("a");
        let b = SiteNames::new("b");
        assert_ne!(a.config_map, b.config_map);
        assert_ne!(a.deployment, b.deployment);
        assert_ne!(a.service, b.service);
    }

    #[test]
    fn test_labels() {
        let labels = SiteNames::labels("blog");
        assert_eq!(labels.len(), 2);
        assert_eq!(labels.get("app").map(String::as_str), Some("staticsite"));
        assert_eq!(labels.get("staticsite").map(String::as_str), Some("blog"));
    }
}
