//! Convergence of the objects owned by a [`StaticSite`].
//!
//! [`reconcile_site`] reads the site, derives the desired `ConfigMap`,
//! `Deployment` and `Service`, links each to the site and creates or updates
//! it. Every step is idempotent, so a failed pass is repaired by running the
//! whole pass again.

mod apply;
mod builder;
mod error;
mod owner;
mod store;

use std::fmt;

use snafu::ResultExt;

pub use self::{
    error::Error,
    store::{KubeStore, ObjectStore},
};
#[cfg(test)]
pub use self::store::{MemoryStore, Operation};
use self::{
    apply::{Applied, create_or_update, merge_config_map, merge_deployment, merge_service},
    builder::{build_config_map, build_deployment, build_service},
    owner::attach_owner,
};
use crate::site::{SiteNames, StaticSite};

/// Identity of a site: its namespace and name.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SiteKey {
    /// The namespace of the site, which is also the namespace of every
    /// object it owns.
    pub namespace: String,

    /// The name of the site.
    pub name: String,
}

impl SiteKey {
    /// Creates the key of the site `name` in `namespace`.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self { namespace: namespace.into(), name: name.into() }
    }
}

impl fmt::Display for SiteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Result of a successful reconcile pass.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// The site no longer exists; its objects are left to garbage collection.
    SiteMissing,

    /// Every owned object was written.
    Converged { config_map: Applied, deployment: Applied, service: Applied },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SiteMissing => f.write_str("site not found, nothing to do"),
            Self::Converged { config_map, deployment, service } => write!(
                f,
                "configmap {config_map}, deployment {deployment}, service {service}"
            ),
        }
    }
}

/// Converges the objects owned by the site identified by `key`.
///
/// Objects are handled in a fixed order: `ConfigMap`, `Deployment`,
/// `Service`. The first failure aborts the pass.
///
/// # Errors
///
/// Returns an error if the site cannot be read, if an owner reference cannot
/// be attached, or if any store write fails. A missing site is not an error.
pub async fn reconcile_site<S>(store: &S, key: &SiteKey) -> Result<Outcome, Error>
where
    S: ObjectStore,
{
    let Some(site) = store
        .get::<StaticSite>(&key.namespace, &key.name)
        .await
        .boxed()
        .context(error::GetSiteSnafu { namespace: &key.namespace, name: &key.name })?
    else {
        tracing::debug!("StaticSite {key} not found, skipping");
        return Ok(Outcome::SiteMissing);
    };

    let names = SiteNames::new(&key.name);
    let labels = SiteNames::labels(&key.name);

    let mut config_map = build_config_map(&site, &names.config_map, &labels);
    attach_owner(&site, &mut config_map)?;
    let config_map = create_or_update(store, config_map, merge_config_map).await?;

    let mut deployment = build_deployment(&site, &names.deployment, &labels);
    attach_owner(&site, &mut deployment)?;
    let deployment = create_or_update(store, deployment, merge_deployment).await?;

    let mut service = build_service(&site, &names.service, &labels);
    attach_owner(&site, &mut service)?;
    let service = create_or_update(store, service, merge_service).await?;

    Ok(Outcome::Converged { config_map, deployment, service })
}

#[cfg(test)]
mod tests {
    use k8s_openapi::{
        api::{
            apps::v1::Deployment,
            core::v1::{ConfigMap, Service},
        },
        apimachinery::pkg::util::intstr::IntOrString,
    };
    use kube::{Resource, api::ObjectMeta};

    use super::{
        store::{MemoryStore, Mutation, ObjectId, Operation},
        *,
    };
    use crate::site::{ServiceType, SiteServiceSpec, StaticSiteSpec};

    fn new_site(name: &str, port: i32, service_type: ServiceType) -> StaticSite {
        let mut site = StaticSite::new(name, StaticSiteSpec {
            image: "myorg/site:v1".to_string(),
            port,
            service: SiteServiceSpec { type_: service_type, port },
        });
        site.metadata.namespace = Some("web".to_string());
        site
    }

    fn key(name: &str) -> SiteKey { SiteKey::new("web", name) }

    /// Strips the resource version, which every write bumps.
    fn without_version<K>(mut object: K) -> K
    where
        K: Resource,
    {
        object.meta_mut().resource_version = None;
        object
    }

    fn owned_by(meta: &ObjectMeta, site: &StaticSite) -> bool {
        meta.owner_references.iter().flatten().any(|reference| {
            reference.controller == Some(true)
                && reference.kind == "StaticSite"
                && Some(&reference.uid) == site.metadata.uid.as_ref()
                && Some(&reference.name) == site.metadata.name.as_ref()
        })
    }

    #[tokio::test]
    async fn test_create_scenario() {
        let store = MemoryStore::default();
        let site = store.seed(new_site("blog", 0, ServiceType::ClusterIP));

        let outcome = reconcile_site(&store, &key("blog")).await.unwrap();

        assert_eq!(outcome, Outcome::Converged {
            config_map: Applied::Created,
            deployment: Applied::Created,
            service: Applied::Created,
        });
        assert_eq!(store.mutations(), vec![
            Mutation::Created(ObjectId::new::<ConfigMap>("web", "blog-nginx-config")),
            Mutation::Created(ObjectId::new::<Deployment>("web", "blog-web")),
            Mutation::Created(ObjectId::new::<Service>("web", "blog-svc")),
        ]);

        let config_map = store.object::<ConfigMap>("web", "blog-nginx-config").unwrap();
        assert_eq!(
            config_map.data.as_ref().unwrap()["default.conf"],
            crate::consts::NGINX_DEFAULT_CONF
        );
        assert!(owned_by(&config_map.metadata, &site));

        let deployment = store.object::<Deployment>("web", "blog-web").unwrap();
        let pod_spec = deployment.spec.as_ref().unwrap().template.spec.as_ref().unwrap();
        let containers = &pod_spec.containers;
        assert_eq!(containers[0].ports.as_ref().unwrap()[0].container_port, 80);
        assert_eq!(containers[1].ports.as_ref().unwrap()[0].container_port, 9113);
        assert!(owned_by(&deployment.metadata, &site));

        let service = store.object::<Service>("web", "blog-svc").unwrap();
        let spec = service.spec.as_ref().unwrap();
        assert_eq!(spec.type_.as_deref(), Some("ClusterIP"));
        let ports = spec.ports.as_ref().unwrap();
        assert_eq!((ports[0].port, ports[0].target_port.clone()), (80, Some(IntOrString::Int(80))));
        assert_eq!(
            (ports[1].port, ports[1].target_port.clone()),
            (9113, Some(IntOrString::Int(9113)))
        );
        assert!(owned_by(&service.metadata, &site));
    }

    #[tokio::test]
    async fn test_second_pass_only_issues_noop_updates() {
        let store = MemoryStore::default();
        let _site = store.seed(new_site("blog", 8080, ServiceType::NodePort));

        let _first = reconcile_site(&store, &key("blog")).await.unwrap();
        let config_map = store.object::<ConfigMap>("web", "blog-nginx-config").unwrap();
        let deployment = store.object::<Deployment>("web", "blog-web").unwrap();
        let service = store.object::<Service>("web", "blog-svc").unwrap();

        let second = reconcile_site(&store, &key("blog")).await.unwrap();

        assert_eq!(second, Outcome::Converged {
            config_map: Applied::Updated,
            deployment: Applied::Updated,
            service: Applied::Updated,
        });
        assert_eq!(store.mutations().len(), 6);
        assert!(store.mutations()[3..].iter().all(|m| matches!(m, Mutation::Updated(_))));
        assert_eq!(
            without_version(store.object::<ConfigMap>("web", "blog-nginx-config").unwrap()),
            without_version(config_map)
        );
        assert_eq!(
            without_version(store.object::<Deployment>("web", "blog-web").unwrap()),
            without_version(deployment)
        );
        assert_eq!(
            without_version(store.object::<Service>("web", "blog-svc").unwrap()),
            without_version(service)
        );
    }

    #[tokio::test]
    async fn test_deleted_site_is_a_noop() {
        let store = MemoryStore::default();

        let outcome = reconcile_site(&store, &key("gone")).await.unwrap();

        assert_eq!(outcome, Outcome::SiteMissing);
        assert!(store.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_site_port_flows_into_workload_and_service() {
        let store = MemoryStore::default();
        let _site = store.seed(new_site("blog", 8080, ServiceType::ClusterIP));

        let _outcome = reconcile_site(&store, &key("blog")).await.unwrap();

        let deployment = store.object::<Deployment>("web", "blog-web").unwrap();
        let web = &deployment.spec.unwrap().template.spec.unwrap().containers[0];
        assert_eq!(web.ports.as_ref().unwrap()[0].container_port, 8080);
        let service = store.object::<Service>("web", "blog-svc").unwrap();
        assert_eq!(service.spec.unwrap().ports.unwrap()[0].port, 8080);
    }

    #[tokio::test]
    async fn test_update_preserves_cluster_ip() {
        let store = MemoryStore::default();
        let _site = store.seed(new_site("blog", 0, ServiceType::ClusterIP));
        let _first = reconcile_site(&store, &key("blog")).await.unwrap();

        // The API server allocates an address after creation.
        let mut allocated = store.object::<Service>("web", "blog-svc").unwrap();
        allocated.spec.as_mut().unwrap().cluster_ip = Some("10.96.0.12".to_string());
        let _allocated = store.seed(allocated);

        let mut changed = store.object::<StaticSite>("web", "blog").unwrap();
        changed.spec.service = SiteServiceSpec { type_: ServiceType::NodePort, port: 8080 };
        let _changed = store.seed(changed);

        let _second = reconcile_site(&store, &key("blog")).await.unwrap();

        let spec = store.object::<Service>("web", "blog-svc").unwrap().spec.unwrap();
        assert_eq!(spec.cluster_ip.as_deref(), Some("10.96.0.12"));
        assert_eq!(spec.type_.as_deref(), Some("NodePort"));
        let ports = spec.ports.unwrap();
        assert_eq!(ports[0].port, 8080);
        assert_eq!(ports[0].node_port, Some(30080));
        assert_eq!(ports[1].node_port, Some(30913));
    }

    #[tokio::test]
    async fn test_failure_aborts_remaining_steps() {
        let store = MemoryStore::default();
        let _site = store.seed(new_site("blog", 0, ServiceType::ClusterIP));
        store.fail::<Deployment>(Operation::Create);

        let err = reconcile_site(&store, &key("blog")).await.unwrap_err();

        assert!(matches!(err, Error::CreateObject { ref kind, .. } if kind == "Deployment"));
        assert_eq!(store.mutations(), vec![Mutation::Created(ObjectId::new::<ConfigMap>(
            "web",
            "blog-nginx-config"
        ))]);
        assert!(store.object::<Service>("web", "blog-svc").is_none());
    }

    #[tokio::test]
    async fn test_site_read_failure_is_propagated() {
        let store = MemoryStore::default();
        store.fail::<StaticSite>(Operation::Get);

        let err = reconcile_site(&store, &key("blog")).await.unwrap_err();

        assert!(matches!(err, Error::GetSite { .. }));
        assert!(store.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_sites_do_not_share_objects() {
        let store = MemoryStore::default();
        let _a = store.seed(new_site("a", 0, ServiceType::ClusterIP));
        let _b = store.seed(new_site("b", 0, ServiceType::ClusterIP));

        let _a = reconcile_site(&store, &key("a")).await.unwrap();
        let _b = reconcile_site(&store, &key("b")).await.unwrap();

        assert_eq!(store.mutations().len(), 6);
        assert!(store.mutations().iter().all(|m| matches!(m, Mutation::Created(_))));
    }
}
