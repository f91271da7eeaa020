//! [`VersionInfo`] metrics

use metrics::gauge;

/// Version information for the indexer, exposed as a prometheus metric.
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// The version of the application.
    pub version: &'static str,
    /// The build profile, `debug` or `release`.
    pub build_profile: &'static str,
}

impl VersionInfo {
    /// Creates a new instance of [`VersionInfo`] from compile-time constants.
    pub const fn from_build() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            build_profile: if cfg!(debug_assertions) { "debug" } else { "release" },
        }
    }

    /// Exposes the version information over prometheus.
    pub fn register_version_metrics(&self) {
        let labels: [(&str, &str); 2] =
            [("version", self.version), ("build_profile", self.build_profile)];
        gauge!("kakarot_indexer_info", &labels).set(1);
    }
}
