//! Consent resolution engine.
//!
//! Maps a region-dependent legal snapshot (does the region require
//! consent, is the vendor authorized, per-category flags) onto the
//! shared consent categories. The decision is derived fresh on every
//! pass; the legal source of truth lives in the external privacy
//! platform, never here.
//!
//! When the legal source cannot be read, the engine falls back to
//! granting all categories (fail-open), not denying them. This is an
//! intentional product policy carried over from the source design;
//! confirm with legal stakeholders before changing it in either
//! direction.

use std::collections::HashMap;
use std::fmt;

use analytics_types::{ConsentCategory, ConsentDecision, ConsentStatus};

/// A point-in-time view of the legal consent state.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ConsentSnapshot {
    /// Whether the user's region requires consent (e.g. GDPR applies).
    pub region_requires_consent: bool,
    /// Whether the vendor itself is authorized by the user.
    pub vendor_authorized: bool,
    /// Per-category grants, meaningful only when the vendor is
    /// authorized. Missing categories read as denied.
    pub category_flags: HashMap<ConsentCategory, bool>,
}

impl ConsentSnapshot {
    pub fn with_flag(mut self, category: ConsentCategory, granted: bool) -> Self {
        self.category_flags.insert(category, granted);
        self
    }
}

/// The legal source of truth could not be read.
#[derive(Debug, Clone)]
pub enum ConsentError {
    SourceUnavailable(String),
}

impl fmt::Display for ConsentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsentError::SourceUnavailable(reason) => {
                write!(f, "consent source unavailable: {}", reason)
            }
        }
    }
}

impl std::error::Error for ConsentError {}

/// External privacy-platform boundary.
pub trait ConsentSource: Send + Sync {
    fn snapshot(&self) -> Result<ConsentSnapshot, ConsentError>;
}

/// Compute a per-category decision from a legal snapshot.
///
/// Policy: a region that does not require consent grants everything;
/// an unauthorized vendor denies everything; an authorized vendor is
/// granted category by category.
pub fn resolve(snapshot: &ConsentSnapshot) -> ConsentDecision {
    if !snapshot.region_requires_consent {
        return ConsentDecision::all_granted();
    }

    if !snapshot.vendor_authorized {
        log::info!("[CONSENT] vendor not authorized, denying all categories");
        return ConsentDecision::all_denied();
    }

    let mut decision = ConsentDecision::all_denied();
    for category in ConsentCategory::ALL {
        let granted = snapshot.category_flags.get(&category).copied().unwrap_or(false);
        if granted {
            decision.set(category, ConsentStatus::Granted);
        }
    }
    log::info!(
        "[CONSENT] resolved: {}",
        ConsentCategory::ALL
            .iter()
            .map(|c| format!("{}={:?}", c.as_str(), decision.status_of(*c)))
            .collect::<Vec<_>>()
            .join(" ")
    );
    decision
}

/// Read the legal source and resolve a decision. On read failure the
/// fallback is the all-granted default (fail-open).
pub fn resolve_from(source: &dyn ConsentSource) -> ConsentDecision {
    match source.snapshot() {
        Ok(snapshot) => resolve(&snapshot),
        Err(e) => {
            log::warn!("[CONSENT] {}; falling back to default-granted consents", e);
            ConsentDecision::all_granted()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_without_consent_requirement_grants_everything() {
        for vendor_authorized in [true, false] {
            let snapshot = ConsentSnapshot {
                region_requires_consent: false,
                vendor_authorized,
                category_flags: HashMap::new(),
            };
            assert_eq!(resolve(&snapshot), ConsentDecision::all_granted());
        }
    }

    #[test]
    fn unauthorized_vendor_denies_everything() {
        let snapshot = ConsentSnapshot {
            region_requires_consent: true,
            vendor_authorized: false,
            category_flags: HashMap::new(),
        }
        .with_flag(ConsentCategory::AnalyticsStorage, true)
        .with_flag(ConsentCategory::AdStorage, true);

        assert_eq!(resolve(&snapshot), ConsentDecision::all_denied());
    }

    #[test]
    fn authorized_vendor_is_granted_per_category() {
        let snapshot = ConsentSnapshot {
            region_requires_consent: true,
            vendor_authorized: true,
            category_flags: HashMap::new(),
        }
        .with_flag(ConsentCategory::AnalyticsStorage, true)
        .with_flag(ConsentCategory::AdUserData, false);

        let decision = resolve(&snapshot);
        assert!(decision.is_granted(ConsentCategory::AnalyticsStorage));
        assert!(!decision.is_granted(ConsentCategory::AdUserData));
        // Categories the snapshot never mentions stay denied.
        assert!(!decision.is_granted(ConsentCategory::AdPersonalization));
    }

    #[test]
    fn unreadable_source_falls_open() {
        struct BrokenSource;
        impl ConsentSource for BrokenSource {
            fn snapshot(&self) -> Result<ConsentSnapshot, ConsentError> {
                Err(ConsentError::SourceUnavailable("ump timeout".to_string()))
            }
        }

        assert_eq!(resolve_from(&BrokenSource), ConsentDecision::all_granted());
    }

    #[test]
    fn readable_source_resolves_normally() {
        struct FixedSource(ConsentSnapshot);
        impl ConsentSource for FixedSource {
            fn snapshot(&self) -> Result<ConsentSnapshot, ConsentError> {
                Ok(self.0.clone())
            }
        }

        let source = FixedSource(ConsentSnapshot {
            region_requires_consent: true,
            vendor_authorized: false,
            category_flags: HashMap::new(),
        });
        assert_eq!(resolve_from(&source), ConsentDecision::all_denied());
    }
}
