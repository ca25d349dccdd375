//! Fixed values of the workload every site runs.

/// Port used when a site leaves its listening or service port unset.
pub const DEFAULT_HTTP_PORT: i32 = 80;

/// Port the metrics exporter listens on.
pub const METRICS_PORT: i32 = 9113;

/// Node ports assigned when a site asks for a `NodePort` service.
pub const HTTP_NODE_PORT: i32 = 30080;
pub const METRICS_NODE_PORT: i32 = 30913;

pub const WEB_CONTAINER_NAME: &str = "web";
pub const METRICS_CONTAINER_NAME: &str = "metrics";

pub const HTTP_PORT_NAME: &str = "http";
pub const METRICS_PORT_NAME: &str = "metrics";

/// Sidecar exporting nginx `stub_status` counters as Prometheus metrics.
pub const METRICS_EXPORTER_IMAGE: &str = "nginx/nginx-prometheus-exporter:latest";
pub const METRICS_EXPORTER_SCRAPE_ARG: &str =
    "-nginx.scrape-uri=http://127.0.0.1:8081/stub_status";

/// The configuration `ConfigMap` is mounted as a single file through
/// `subPath`, leaving the rest of `/etc/nginx/conf.d` from the image intact.
pub const NGINX_CONFIG_VOLUME: &str = "nginx-config";
pub const NGINX_CONFIG_KEY: &str = "default.conf";
pub const NGINX_CONFIG_MOUNT_PATH: &str = "/etc/nginx/conf.d/default.conf";

/// Server configuration mounted into the content-serving container.
///
/// Content is served on port 80 and `stub_status` is exposed on port 8081 to
/// loopback only, where the exporter sidecar scrapes it.
pub const NGINX_DEFAULT_CONF: &str = r"server {
  listen 80;
  location / {
    root   /usr/share/nginx/html;
    index  index.html index.htm;
  }
}

server {
  listen 8081;
  location /stub_status {
    stub_status;
    allow 127.0.0.1;
    deny all;
  }
}
";
