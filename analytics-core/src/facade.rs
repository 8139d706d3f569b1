//! Process-wide analytics facade.
//!
//! A static API surface callable from anywhere in the host application
//! after process start. Backed by a single dispatcher created exactly
//! once per process lifetime; every call made before `initialize` is a
//! safe no-op with a diagnostic.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use analytics_types::{
    AnalyticsEvent, BusinessEvent, ConsentDecision, CustomFields, DesignEvent, ErrorEvent,
    ErrorSeverity, ProgressionEvent, ProgressionStatus, ResourceEvent, ResourceFlow,
    SegmentationEvent, SignUpEvent,
};

use crate::build::BuildInfo;
use crate::consent::{self, ConsentSource};
use crate::dispatcher::AnalyticsDispatcher;
use crate::prefs::KeyValueStore;
use crate::sinks::BoxedSink;

static DISPATCHER: OnceCell<Arc<AnalyticsDispatcher>> = OnceCell::new();

/// Create and initialize the process-wide dispatcher. Repeated calls
/// are no-ops that surface a warning.
///
/// Must be called from within a Tokio runtime; sink initialization is
/// spawned fire-and-forget.
pub fn initialize(sinks: Vec<BoxedSink>, store: Box<dyn KeyValueStore>, build: BuildInfo) {
    let dispatcher = Arc::new(AnalyticsDispatcher::new(sinks, store, build));
    if DISPATCHER.set(dispatcher.clone()).is_err() {
        log::warn!("[ANALYTICS] initialize already called, ignoring");
        return;
    }
    // The dispatcher keeps its own latch, so a failure here can only
    // be a repeat call racing the OnceCell above.
    let _ = dispatcher.initialize();
}

pub fn is_initialized() -> bool {
    DISPATCHER.get().is_some()
}

fn with_dispatcher(operation: &str, f: impl FnOnce(&AnalyticsDispatcher)) {
    match DISPATCHER.get() {
        Some(dispatcher) => f(dispatcher),
        None => log::warn!(
            "[ANALYTICS] {} called before initialize, dropping",
            operation
        ),
    }
}

/// Emit any taxonomy event to every registered sink.
pub fn emit(event: AnalyticsEvent) {
    with_dispatcher(event.kind(), |d| d.emit(&event));
}

pub fn design_event<I, S>(segments: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    emit(AnalyticsEvent::Design(DesignEvent::new(segments)));
}

pub fn design_event_with_value<I, S>(value: f64, segments: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    emit(AnalyticsEvent::Design(
        DesignEvent::new(segments).with_value(value),
    ));
}

pub fn design_event_with_fields<I, S>(fields: CustomFields, segments: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    emit(AnalyticsEvent::Design(
        DesignEvent::new(segments).with_fields(fields),
    ));
}

pub fn business_event(event: BusinessEvent) {
    emit(AnalyticsEvent::Business(event));
}

pub fn progression_event(
    status: ProgressionStatus,
    level_type: impl Into<String>,
    level_number: Option<String>,
    score: Option<i64>,
) {
    emit(AnalyticsEvent::Progression(ProgressionEvent {
        status,
        level_type: level_type.into(),
        level_number,
        score,
        custom_fields: None,
    }));
}

pub fn resource_event(
    flow: ResourceFlow,
    currency: impl Into<String>,
    amount: f64,
    item_type: impl Into<String>,
    item_id: impl Into<String>,
) {
    emit(AnalyticsEvent::Resource(ResourceEvent {
        flow,
        currency: currency.into(),
        amount,
        item_type: item_type.into(),
        item_id: item_id.into(),
    }));
}

pub fn error_event(severity: ErrorSeverity, message: impl Into<String>) {
    emit(AnalyticsEvent::Error(ErrorEvent {
        severity,
        message: message.into(),
    }));
}

pub fn user_segmentation(name: impl Into<String>, value: impl Into<String>, dimension: i32) {
    emit(AnalyticsEvent::Segmentation(SegmentationEvent {
        name: name.into(),
        value: value.into(),
        dimension,
    }));
}

pub fn sign_up_event(method: impl Into<String>) {
    emit(AnalyticsEvent::SignUp(SignUpEvent {
        method: method.into(),
        custom_fields: None,
    }));
}

pub fn set_user_identifier(user_id: &str) {
    with_dispatcher("set_user_identifier", |d| d.set_user_identifier(user_id));
}

pub fn set_debug_mode(debug: bool) {
    with_dispatcher("set_debug_mode", |d| d.set_debug_mode(debug));
}

/// Broadcast an already-resolved consent decision to every ready sink.
pub fn apply_consent(decision: &ConsentDecision) {
    with_dispatcher("apply_consent", |d| d.apply_consent(decision));
}

/// Read the legal source, resolve a decision (fail-open on read
/// failure), and broadcast it.
pub fn resolve_and_apply_consent(source: &dyn ConsentSource) {
    let decision = consent::resolve_from(source);
    apply_consent(&decision);
}

pub fn on_pause(paused: bool) {
    with_dispatcher("on_pause", |d| d.on_pause(paused));
}

pub fn on_shutdown() {
    with_dispatcher("on_shutdown", |d| d.on_shutdown());
}

/// Current session count, zero before initialization.
pub fn session_count() -> u64 {
    DISPATCHER.get().map(|d| d.session_count()).unwrap_or(0)
}
