pub mod k8s {
    pub mod labels {
        /// Label carrying the static category of every owned object.
        pub const APP: &str = "app";

        /// Value of [`APP`] on every owned object.
        pub const APP_VALUE: &str = "staticsite";

        /// Label carrying the name of the owning site.
        pub const SITE: &str = "staticsite";
    }
}

/// Suffixes appended to the site name to derive owned object names.
pub mod suffixes {
    pub const CONFIG_MAP: &str = "-nginx-config";
    pub const DEPLOYMENT: &str = "-web";
    pub const SERVICE: &str = "-svc";
}
