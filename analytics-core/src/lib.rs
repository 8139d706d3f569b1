//! Analytics fan-out core.
//!
//! Application code emits one uniform taxonomy of telemetry events;
//! this crate multiplexes each call across every registered backend
//! sink, composing sink-legal event names, tracking the session
//! lifecycle, and translating a region/vendor consent snapshot into
//! each sink's native consent model.
//!
//! Philosophy: sinks own delivery; the core owns fan-out, naming, and
//! isolation. One broken sink never takes the others down.

pub mod build;
pub mod consent;
pub mod dispatcher;
pub mod facade;
pub mod naming;
pub mod prefs;
pub mod sinks;

// Re-export key types for convenience
pub use analytics_types as types;
pub use build::BuildInfo;
pub use consent::{ConsentError, ConsentSnapshot, ConsentSource, resolve, resolve_from};
pub use dispatcher::{AlreadyInitializedError, AnalyticsDispatcher, SessionSnapshot};
pub use naming::{EmptyNameError, compose};
pub use prefs::{KeyValueStore, MemoryStore, SessionPrefs};
pub use sinks::{AnalyticsSink, BoxedSink, SinkStatus, StatusCell};
