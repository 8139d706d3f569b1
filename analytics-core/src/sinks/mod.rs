//! Sink capability contract.
//!
//! Every backend adapter implements [`AnalyticsSink`]. The dispatcher
//! only ever talks to this trait; concrete SDK wiring lives outside
//! the core.

pub mod console;

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use async_trait::async_trait;

use analytics_types::{AnalyticsEvent, Capability, ConsentDecision};

use crate::dispatcher::SessionSnapshot;

pub use console::ConsoleSink;

/// Per-sink initialization state. `Failed` is terminal for that sink
/// only; it never affects siblings or the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkStatus {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

impl SinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkStatus::Uninitialized => "uninitialized",
            SinkStatus::Initializing => "initializing",
            SinkStatus::Ready => "ready",
            SinkStatus::Failed => "failed",
        }
    }
}

/// The contract every backend sink implements.
///
/// `initialize` is fire-and-forget: the dispatcher spawns it and never
/// awaits completion. All other calls arriving before the sink is
/// `Ready` must be silently dropped by the sink, not queued.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    /// Stable identifier, used as the registry key and in diagnostics.
    fn id(&self) -> &str;

    /// Naming limits this backend imposes on composed event names.
    fn capability(&self) -> Capability;

    /// Current initialization state, observable at any time.
    fn status(&self) -> SinkStatus;

    /// Sink-local initialization. May perform network activation or
    /// dependency resolution; flips the readiness state on completion.
    /// The snapshot carries the session state at spawn time; session
    /// state that changes while this runs is re-sent by the dispatcher
    /// once the sink is ready.
    async fn initialize(&self, session: SessionSnapshot);

    /// Deliver one event. `composed_name` is the sink-legal name built
    /// from the event's segments under this sink's capability, when the
    /// event carries segments. Must never propagate failure.
    fn handle(&self, event: &AnalyticsEvent, composed_name: Option<&str>);

    /// Translate the shared consent categories into the backend's
    /// native consent model and apply them.
    fn set_consent(&self, decision: &ConsentDecision);

    fn set_user_identifier(&self, user_id: &str);

    fn is_ready(&self) -> bool {
        self.status() == SinkStatus::Ready
    }
}

pub type BoxedSink = Arc<dyn AnalyticsSink>;

/// Atomically-observed initialization state, shared between a sink and
/// its background init task.
#[derive(Debug)]
pub struct StatusCell(AtomicU8);

impl StatusCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(SinkStatus::Uninitialized as u8))
    }

    pub fn ready() -> Self {
        let cell = Self::new();
        cell.set(SinkStatus::Ready);
        cell
    }

    pub fn get(&self) -> SinkStatus {
        match self.0.load(Ordering::SeqCst) {
            0 => SinkStatus::Uninitialized,
            1 => SinkStatus::Initializing,
            2 => SinkStatus::Ready,
            _ => SinkStatus::Failed,
        }
    }

    pub fn set(&self, status: SinkStatus) {
        self.0.store(status as u8, Ordering::SeqCst);
    }
}

impl Default for StatusCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_cell_roundtrips_every_state() {
        let cell = StatusCell::new();
        assert_eq!(cell.get(), SinkStatus::Uninitialized);

        for status in [
            SinkStatus::Initializing,
            SinkStatus::Ready,
            SinkStatus::Failed,
        ] {
            cell.set(status);
            assert_eq!(cell.get(), status);
        }
    }
}
