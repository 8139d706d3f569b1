//! Console sink - writes every event to the log instead of a backend.
//!
//! Useful during bring-up and as the reference sink implementation:
//! it shows the expected readiness handshake (flip the status cell
//! from a background init task) without any SDK wiring.

use async_trait::async_trait;

use analytics_types::{AnalyticsEvent, Capability, ConsentCategory, ConsentDecision};

use crate::dispatcher::SessionSnapshot;
use crate::sinks::{AnalyticsSink, SinkStatus, StatusCell};

/// Sink that logs events through the `log` crate.
pub struct ConsoleSink {
    status: StatusCell,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            status: StatusCell::new(),
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalyticsSink for ConsoleSink {
    fn id(&self) -> &str {
        "console"
    }

    fn capability(&self) -> Capability {
        Capability::unbounded("_")
    }

    fn status(&self) -> SinkStatus {
        self.status.get()
    }

    async fn initialize(&self, session: SessionSnapshot) {
        self.status.set(SinkStatus::Initializing);
        log::info!(
            "[ANALYTICS] console sink initializing (session {}, first: {})",
            session.session_count,
            session.first_session
        );
        if let Some(user_id) = &session.user_id {
            self.set_user_identifier(user_id);
        }
        self.status.set(SinkStatus::Ready);
    }

    fn handle(&self, event: &AnalyticsEvent, composed_name: Option<&str>) {
        if !self.is_ready() {
            return;
        }
        match composed_name {
            Some(name) => log::info!(
                "[ANALYTICS] {} event '{}' value={:?}",
                event.kind(),
                name,
                event.value()
            ),
            None => log::info!("[ANALYTICS] {} event {:?}", event.kind(), event),
        }
        if let Some(fields) = event.custom_fields() {
            let rendered = serde_json::to_string(fields).unwrap_or_default();
            log::debug!("[ANALYTICS] custom fields: {}", rendered);
        }
    }

    fn set_consent(&self, decision: &ConsentDecision) {
        if !self.is_ready() {
            return;
        }
        for category in ConsentCategory::ALL {
            log::info!(
                "[ANALYTICS] consent {} = {:?}",
                category.as_str(),
                decision.status_of(category)
            );
        }
    }

    fn set_user_identifier(&self, user_id: &str) {
        log::info!("[ANALYTICS] console sink user id set to {}", user_id);
    }
}
