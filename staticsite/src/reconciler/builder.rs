//! Builders mapping a [`StaticSite`] to the desired state of the objects it
//! owns.
//!
//! Builders are pure: the same site, name and labels always produce the same
//! object. Ports of `0` fall back to the default port; any other value,
//! including invalid ones, is passed through for the API server to judge.

use std::collections::BTreeMap;

use k8s_openapi::{
    api::{
        apps::v1::{Deployment, DeploymentSpec},
        core::v1::{
            ConfigMap, ConfigMapVolumeSource, Container, ContainerPort, PodSpec, PodTemplateSpec,
            Service, ServicePort, ServiceSpec, Volume, VolumeMount,
        },
    },
    apimachinery::pkg::{apis::meta::v1::LabelSelector, util::intstr::IntOrString},
};
use kube::{ResourceExt, api::ObjectMeta};

use crate::{
    consts,
    site::{ServiceType, SiteNames, StaticSite},
};

/// Metadata shared by every owned object: name, the site's namespace and
/// `labels`. The owner reference is attached separately.
fn object_meta(site: &StaticSite, name: &str, labels: &BTreeMap<String, String>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: site.metadata.namespace.clone(),
        labels: Some(labels.clone()),
        ..ObjectMeta::default()
    }
}

/// Builds the `ConfigMap` holding the nginx server configuration.
///
/// The configuration text is the same for every site; only the metadata
/// depends on the site.
///
/// # Arguments
///
/// * `site` - The owning site. Only its namespace is used.
/// * `name` - The name of the `ConfigMap`, see [`SiteNames`].
/// * `labels` - The labels stamped on the object.
pub fn build_config_map(
    site: &StaticSite,
    name: &str,
    labels: &BTreeMap<String, String>,
) -> ConfigMap {
    ConfigMap {
        metadata: object_meta(site, name, labels),
        data: Some(BTreeMap::from([(
            consts::NGINX_CONFIG_KEY.to_string(),
            consts::NGINX_DEFAULT_CONF.to_string(),
        )])),
        ..ConfigMap::default()
    }
}

/// Builds the `Deployment` running nginx and the metrics exporter sidecar.
///
/// The pod has two containers:
///
/// - `web` runs the site image on the site port, with the nginx
///   configuration mounted over `/etc/nginx/conf.d/default.conf`.
/// - `metrics` runs the Prometheus exporter on port 9113, scraping the
///   `stub_status` endpoint over loopback.
///
/// `labels` serves as the object labels, the selector and the pod template
/// labels alike, so the selector always matches the pods it creates.
pub fn build_deployment(
    site: &StaticSite,
    name: &str,
    labels: &BTreeMap<String, String>,
) -> Deployment {
    let config_map_name = SiteNames::new(&site.name_any()).config_map;

    let web = Container {
        name: consts::WEB_CONTAINER_NAME.to_string(),
        image: Some(site.spec.image.clone()),
        ports: Some(vec![ContainerPort {
            container_port: site.spec.container_port(),
            ..ContainerPort::default()
        }]),
        volume_mounts: Some(vec![VolumeMount {
            name: consts::NGINX_CONFIG_VOLUME.to_string(),
            mount_path: consts::NGINX_CONFIG_MOUNT_PATH.to_string(),
            sub_path: Some(consts::NGINX_CONFIG_KEY.to_string()),
            ..VolumeMount::default()
        }]),
        ..Container::default()
    };

    let metrics = Container {
        name: consts::METRICS_CONTAINER_NAME.to_string(),
        image: Some(consts::METRICS_EXPORTER_IMAGE.to_string()),
        args: Some(vec![consts::METRICS_EXPORTER_SCRAPE_ARG.to_string()]),
        ports: Some(vec![ContainerPort {
            container_port: consts::METRICS_PORT,
            ..ContainerPort::default()
        }]),
        ..Container::default()
    };

    Deployment {
        metadata: object_meta(site, name, labels),
        spec: Some(DeploymentSpec {
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..LabelSelector::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels.clone()),
                    ..ObjectMeta::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![web, metrics],
                    volumes: Some(vec![Volume {
                        name: consts::NGINX_CONFIG_VOLUME.to_string(),
                        config_map: Some(ConfigMapVolumeSource {
                            name: config_map_name,
                            ..ConfigMapVolumeSource::default()
                        }),
                        ..Volume::default()
                    }]),
                    ..PodSpec::default()
                }),
            },
            ..DeploymentSpec::default()
        }),
        ..Deployment::default()
    }
}

/// Builds the `Service` exposing the HTTP and metrics ports.
///
/// `NodePort` services get fixed node ports, so at most one such site can
/// exist per cluster.
pub fn build_service(site: &StaticSite, name: &str, labels: &BTreeMap<String, String>) -> Service {
    let service_type = site.spec.service.type_;
    let node_port = |port: i32| (service_type == ServiceType::NodePort).then_some(port);
    let http_port = site.spec.service.http_port();

    Service {
        metadata: object_meta(site, name, labels),
        spec: Some(ServiceSpec {
            type_: Some(service_type.to_string()),
            selector: Some(labels.clone()),
            ports: Some(vec![
                ServicePort {
                    name: Some(consts::HTTP_PORT_NAME.to_string()),
                    port: http_port,
                    target_port: Some(IntOrString::Int(http_port)),
                    node_port: node_port(consts::HTTP_NODE_PORT),
                    ..ServicePort::default()
                },
                ServicePort {
                    name: Some(consts::METRICS_PORT_NAME.to_string()),
                    port: consts::METRICS_PORT,
                    target_port: Some(IntOrString::Int(consts::METRICS_PORT)),
                    node_port: node_port(consts::METRICS_NODE_PORT),
                    ..ServicePort::default()
                },
            ]),
            ..ServiceSpec::default()
        }),
        ..Service::default()
    }
}
