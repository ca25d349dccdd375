use comfy_table::{Cell, ContentArrangement};
use kube::ResourceExt;

use crate::site::StaticSite;

/// Renders a list of sites the way `kubectl get` prints resources.
pub trait SiteListExt {
    /// Renders one row per site with the columns "NAME", "NAMESPACE",
    /// "IMAGE", "PORT" and "SERVICE".
    fn render_table(&self) -> String;
}

impl SiteListExt for [StaticSite] {
    fn render_table(&self) -> String {
        let rows = self.iter().map(site_row).collect::<Vec<_>>();

        comfy_table::Table::new()
            .load_preset(comfy_table::presets::NOTHING)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["NAME", "NAMESPACE", "IMAGE", "PORT", "SERVICE"])
            .add_rows(rows)
            .to_string()
    }
}

fn site_row(site: &StaticSite) -> [Cell; 5] {
    [
        Cell::new(site.name_any()),
        Cell::new(site.namespace().unwrap_or_default()),
        Cell::new(&site.spec.image),
        Cell::new(site.spec.container_port()),
        Cell::new(format!("{}:{}", site.spec.service.type_, site.spec.service.http_port())),
    ]
}
