//! Host-supplied build and version metadata.
//!
//! Recorded into the session preferences on first launch; the core
//! never derives this itself.

use analytics_types::StoreType;

#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Application version string (e.g. "2.4.1").
    pub version: String,
    /// Platform build number, when the host exposes one.
    pub build_number: Option<String>,
    /// Storefront this build ships through.
    pub store: StoreType,
}

impl BuildInfo {
    pub fn new(version: impl Into<String>, store: StoreType) -> Self {
        Self {
            version: version.into(),
            build_number: None,
            store,
        }
    }

    pub fn with_build_number(mut self, build_number: impl Into<String>) -> Self {
        self.build_number = Some(build_number.into());
        self
    }
}
