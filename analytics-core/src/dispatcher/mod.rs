//! Fan-out dispatcher.
//!
//! Owns the fixed sink registry, the one-shot initialization latch,
//! and the persisted session state. One `emit` call reaches every
//! registered sink in registration order; a failing sink is isolated
//! and never blocks delivery to its siblings.


use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use parking_lot::Mutex;

use analytics_types::{AnalyticsEvent, ConsentDecision, DesignEvent, StoreType};

use crate::build::BuildInfo;
use crate::naming;
use crate::prefs::{KeyValueStore, SessionPrefs};
use crate::sinks::BoxedSink;

/// `initialize` was called more than once in this process lifetime.
/// Logged and ignored, never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlreadyInitializedError;

impl fmt::Display for AlreadyInitializedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "analytics dispatcher is already initialized")
    }
}

impl std::error::Error for AlreadyInitializedError {}

/// A point-in-time copy of the session state, handed to sinks when
/// their background initialization starts. A sink that becomes ready
/// late reads the user identifier from here; an identifier set after
/// the snapshot was taken is re-sent by the dispatcher once the sink's
/// initialization completes.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionSnapshot {
    pub session_count: u64,
    pub install_version: Option<String>,
    pub user_id: Option<String>,
    pub debug_mode: bool,
    /// Storefront this build ships through.
    pub store: StoreType,
    /// True when this process started the very first session of the
    /// install.
    pub first_session: bool,
}

/// Fan-out dispatcher over the registered sink set.
///
/// Sinks are registered at construction and never added or removed
/// afterward. Sinks never reference each other; the dispatcher is the
/// only mutator of the session state.
pub struct AnalyticsDispatcher {
    sinks: Vec<BoxedSink>,
    /// Shared with spawned sink-init tasks so they can read session
    /// state that changed after their snapshot was taken.
    session: Arc<Mutex<SessionPrefs>>,
    build: BuildInfo,
    init_latch: AtomicBool,
    /// Set inside the latch once the first-session branch has run.
    first_session: AtomicBool,
}

impl AnalyticsDispatcher {
    pub fn new(sinks: Vec<BoxedSink>, store: Box<dyn KeyValueStore>, build: BuildInfo) -> Self {
        Self {
            sinks,
            session: Arc::new(Mutex::new(SessionPrefs::new(store))),
            build,
            init_latch: AtomicBool::new(false),
            first_session: AtomicBool::new(false),
        }
    }

    /// One-shot initialization.
    ///
    /// Increments the session counter, records install metadata and
    /// emits the synthetic first-session event when the counter
    /// transitions from zero, emits the session-start event, and then
    /// spawns each sink's own initialization without awaiting it.
    ///
    /// Must be called from within a Tokio runtime; sink initialization
    /// runs as background tasks.
    pub fn initialize(&self) -> Result<(), AlreadyInitializedError> {
        if self.init_latch.swap(true, Ordering::SeqCst) {
            log::warn!("[DISPATCH] initialize already called, ignoring");
            return Err(AlreadyInitializedError);
        }

        let (first_session, session_count) = {
            let session = self.session.lock();
            let previous = session.session_count();
            let first_session = previous == 0;
            if first_session {
                session.set_install_version(&self.build.version);
                if let Some(build_number) = &self.build.build_number {
                    session.set_install_build(build_number);
                }
                session.set_installed_at(Utc::now());
                log::info!(
                    "[DISPATCH] first launch recorded (version {})",
                    self.build.version
                );
            }
            let session_count = previous + 1;
            session.set_session_count(session_count);
            (first_session, session_count)
        };
        self.first_session.store(first_session, Ordering::SeqCst);

        if first_session {
            self.fan_out(&AnalyticsEvent::Design(DesignEvent::new([
                "session", "first",
            ])));
        }
        self.fan_out(&AnalyticsEvent::Design(
            DesignEvent::new(["session", "start"]).with_value(session_count as f64),
        ));

        let snapshot = self.session_snapshot();
        for sink in &self.sinks {
            let sink = Arc::clone(sink);
            let session = Arc::clone(&self.session);
            let snapshot = snapshot.clone();
            log::debug!("[DISPATCH] spawning initialization for sink {}", sink.id());
            tokio::spawn(async move {
                let known_user = snapshot.user_id.clone();
                sink.initialize(snapshot).await;

                // An identifier set while this sink was initializing
                // predates its snapshot and missed the ready-only
                // broadcast. Re-send the current one.
                let current = session.lock().user_id();
                if sink.is_ready() && current != known_user {
                    if let Some(user_id) = current {
                        let outcome = catch_unwind(AssertUnwindSafe(|| {
                            sink.set_user_identifier(&user_id);
                        }));
                        if outcome.is_err() {
                            log::error!(
                                "[DISPATCH] sink {} panicked setting user identifier",
                                sink.id()
                            );
                        }
                    }
                }
            });
        }

        log::info!(
            "[DISPATCH] initialized with {} sinks, session {}",
            self.sinks.len(),
            session_count
        );
        Ok(())
    }

    /// Deliver one event to every registered sink, in registration
    /// order. Fire-and-forget: per-sink failures are logged and
    /// swallowed, and nothing is aggregated back to the caller.
    pub fn emit(&self, event: &AnalyticsEvent) {
        if let Err(e) = event.validate() {
            log::warn!("[DISPATCH] dropping invalid {} event: {}", event.kind(), e);
            return;
        }
        self.fan_out(event);
    }

    fn fan_out(&self, event: &AnalyticsEvent) {
        let segments = event.name_segments();
        for sink in &self.sinks {
            let composed = match &segments {
                Some(segments) => match naming::compose(segments, &sink.capability()) {
                    Ok(name) => Some(name),
                    Err(e) => {
                        log::warn!("[DISPATCH] sink {}: {}", sink.id(), e);
                        continue;
                    }
                },
                None => None,
            };

            let delivery = catch_unwind(AssertUnwindSafe(|| {
                sink.handle(event, composed.as_deref());
            }));
            if delivery.is_err() {
                log::error!(
                    "[DISPATCH] sink {} panicked handling a {} event, continuing with remaining sinks",
                    sink.id(),
                    event.kind()
                );
            }
        }
    }

    /// Persist the user identifier and re-broadcast it to every ready
    /// sink. A sink that is still initializing receives it when its
    /// initialization completes.
    pub fn set_user_identifier(&self, user_id: &str) {
        log::info!("[DISPATCH] saving user identifier");
        self.session.lock().set_user_id(user_id);

        for sink in self.sinks.iter().filter(|s| s.is_ready()) {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                sink.set_user_identifier(user_id);
            }));
            if outcome.is_err() {
                log::error!("[DISPATCH] sink {} panicked setting user identifier", sink.id());
            }
        }
    }

    /// Persist the debug flag. Sinks read it from their session
    /// snapshot on initialization.
    pub fn set_debug_mode(&self, debug: bool) {
        log::info!("[DISPATCH] debug mode set to {}", debug);
        self.session.lock().set_debug_mode(debug);
    }

    /// Broadcast a consent decision to every ready sink.
    pub fn apply_consent(&self, decision: &ConsentDecision) {
        let ready: Vec<&BoxedSink> = self.sinks.iter().filter(|s| s.is_ready()).collect();
        log::info!("[CONSENT] applying decision to {} ready sinks", ready.len());

        for sink in ready {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                sink.set_consent(decision);
            }));
            if outcome.is_err() {
                log::error!("[CONSENT] sink {} panicked applying consent", sink.id());
            }
        }
    }

    /// Host lifecycle: backgrounded or foregrounded. No-op until the
    /// dispatcher has been initialized.
    pub fn on_pause(&self, paused: bool) {
        if !self.is_initialized() {
            return;
        }
        let step = if paused { "pause" } else { "unpause" };
        self.fan_out(&AnalyticsEvent::Design(DesignEvent::new(["session", step])));
    }

    /// Host lifecycle: process teardown. No-op until initialized.
    pub fn on_shutdown(&self) {
        if !self.is_initialized() {
            return;
        }
        self.fan_out(&AnalyticsEvent::Design(DesignEvent::new([
            "session", "end",
        ])));
    }

    pub fn is_initialized(&self) -> bool {
        self.init_latch.load(Ordering::SeqCst)
    }

    pub fn session_count(&self) -> u64 {
        self.session.lock().session_count()
    }

    pub fn user_id(&self) -> Option<String> {
        self.session.lock().user_id()
    }

    pub fn debug_mode(&self) -> bool {
        self.session.lock().debug_mode()
    }

    pub fn build(&self) -> &BuildInfo {
        &self.build
    }

    pub fn sinks(&self) -> &[BoxedSink] {
        &self.sinks
    }

    fn session_snapshot(&self) -> SessionSnapshot {
        let session = self.session.lock();
        SessionSnapshot {
            session_count: session.session_count(),
            install_version: session.install_version(),
            user_id: session.user_id(),
            debug_mode: session.debug_mode(),
            store: self.build.store,
            first_session: self.first_session.load(Ordering::SeqCst),
        }
    }
}
