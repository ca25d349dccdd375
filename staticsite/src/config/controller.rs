use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings of the controller loop, read from the `controller` section of
/// the configuration file.
///
/// # Examples
///
/// ```yaml
/// controller:
///   namespace: web
///   concurrency: 4
///   errorRequeueSeconds: 10
/// ```
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerConfig {
    /// Namespace to watch. Every namespace is watched when unset.
    ///
    /// The `--namespace` flag of `run` takes precedence over this value.
    #[serde(default)]
    pub namespace: Option<String>,

    /// Maximum number of sites reconciled at the same time, `0` for no
    /// limit. Two passes for the same site never overlap regardless of this
    /// value.
    #[serde(default = "ControllerConfig::default_concurrency")]
    pub concurrency: u16,

    /// Delay in seconds before a site whose reconcile failed is retried.
    ///
    /// The delay is fixed: every failed pass of a site is retried after the
    /// same interval, with no exponential back-off. A pass only ever issues
    /// one read and at most one write per owned object, so a site that keeps
    /// failing costs a bounded number of API calls per interval. Raise the
    /// value to lower the retry pressure on a struggling API server.
    #[serde(default = "ControllerConfig::default_error_requeue_seconds")]
    pub error_requeue_seconds: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            concurrency: Self::default_concurrency(),
            error_requeue_seconds: Self::default_error_requeue_seconds(),
        }
    }
}

impl ControllerConfig {
    /// Returns the default concurrency, `0`, which leaves it unbounded.
    #[inline]
    #[must_use]
    pub const fn default_concurrency() -> u16 { 0 }

    /// Returns the default error requeue delay, 5 seconds.
    #[inline]
    #[must_use]
    pub const fn default_error_requeue_seconds() -> u64 { 5 }

    /// Returns [`Self::error_requeue_seconds`] as a [`Duration`].
    #[inline]
    #[must_use]
    pub const fn error_requeue_interval(&self) -> Duration {
        Duration::from_secs(self.error_requeue_seconds)
    }
}
