//! End-to-end test of the process-wide facade.
//!
//! The facade is backed by a one-shot global, so the whole lifecycle
//! is exercised in a single test body: calls before initialize are
//! safe no-ops, initialize runs exactly once, and taxonomy calls fan
//! out to the registered sinks.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use analytics_core::build::BuildInfo;
use analytics_core::consent::{ConsentError, ConsentSnapshot, ConsentSource};
use analytics_core::dispatcher::SessionSnapshot;
use analytics_core::facade;
use analytics_core::prefs::MemoryStore;
use analytics_core::sinks::{AnalyticsSink, SinkStatus, StatusCell};
use analytics_types::{
    AnalyticsEvent, Capability, ConsentDecision, ErrorSeverity, ProgressionStatus, ResourceFlow,
    StoreType,
};

struct RecordingSink {
    status: StatusCell,
    names: Mutex<Vec<String>>,
    kinds: Mutex<Vec<String>>,
    consents: Mutex<Vec<ConsentDecision>>,
    user_ids: Mutex<Vec<String>>,
}

impl RecordingSink {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            status: StatusCell::ready(),
            names: Mutex::new(Vec::new()),
            kinds: Mutex::new(Vec::new()),
            consents: Mutex::new(Vec::new()),
            user_ids: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl AnalyticsSink for RecordingSink {
    fn id(&self) -> &str {
        "recording"
    }

    fn capability(&self) -> Capability {
        Capability::new(40, -1, "_")
    }

    fn status(&self) -> SinkStatus {
        self.status.get()
    }

    async fn initialize(&self, _session: SessionSnapshot) {
        self.status.set(SinkStatus::Ready);
    }

    fn handle(&self, event: &AnalyticsEvent, composed_name: Option<&str>) {
        if !self.is_ready() {
            return;
        }
        self.kinds.lock().push(event.kind().to_string());
        if let Some(name) = composed_name {
            self.names.lock().push(name.to_string());
        }
    }

    fn set_consent(&self, decision: &ConsentDecision) {
        self.consents.lock().push(decision.clone());
    }

    fn set_user_identifier(&self, user_id: &str) {
        self.user_ids.lock().push(user_id.to_string());
    }
}

struct PermissiveRegion;

impl ConsentSource for PermissiveRegion {
    fn snapshot(&self) -> Result<ConsentSnapshot, ConsentError> {
        Ok(ConsentSnapshot {
            region_requires_consent: false,
            vendor_authorized: false,
            category_flags: Default::default(),
        })
    }
}

#[tokio::test]
async fn facade_lifecycle_end_to_end() {
    let _ = env_logger::builder().is_test(true).try_init();

    // Everything before initialize is a diagnostic no-op.
    assert!(!facade::is_initialized());
    assert_eq!(facade::session_count(), 0);
    facade::design_event(["too", "early"]);
    facade::set_user_identifier("nobody");
    facade::on_pause(true);
    facade::on_shutdown();

    let sink = RecordingSink::new();
    facade::initialize(
        vec![sink.clone()],
        Box::new(MemoryStore::new()),
        BuildInfo::new("0.9.0", StoreType::AppStore).with_build_number("412"),
    );
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(facade::is_initialized());
    assert_eq!(facade::session_count(), 1);
    assert_eq!(
        sink.names.lock().clone(),
        vec!["session_first".to_string(), "session_start".to_string()]
    );

    // A second initialize is ignored: no extra session increment.
    facade::initialize(
        Vec::new(),
        Box::new(MemoryStore::new()),
        BuildInfo::new("0.9.0", StoreType::AppStore),
    );
    assert_eq!(facade::session_count(), 1);

    // One call per taxonomy variant fans out to the sink.
    facade::design_event(["shop", "open"]);
    facade::progression_event(ProgressionStatus::Complete, "campaign", Some("3".into()), Some(120));
    facade::resource_event(ResourceFlow::Sink, "gems", 25.0, "booster", "speedup");
    facade::error_event(ErrorSeverity::Warning, "texture cache miss");
    facade::user_segmentation("cohort", "b", 1);
    facade::sign_up_event("email");

    let kinds = sink.kinds.lock().clone();
    for kind in [
        "design",
        "progression",
        "resource",
        "error",
        "segmentation",
        "sign_up",
    ] {
        assert!(kinds.contains(&kind.to_string()), "missing {}", kind);
    }
    assert!(sink.names.lock().contains(&"campaign_complete_3".to_string()));

    facade::set_user_identifier("player-7");
    assert_eq!(sink.user_ids.lock().clone(), vec!["player-7".to_string()]);

    // Region does not require consent: resolution grants everything.
    facade::resolve_and_apply_consent(&PermissiveRegion);
    assert_eq!(sink.consents.lock().clone(), vec![ConsentDecision::all_granted()]);

    facade::on_pause(true);
    facade::on_pause(false);
    facade::on_shutdown();
    let names = sink.names.lock().clone();
    assert!(names.contains(&"session_pause".to_string()));
    assert!(names.contains(&"session_unpause".to_string()));
    assert!(names.contains(&"session_end".to_string()));
}
