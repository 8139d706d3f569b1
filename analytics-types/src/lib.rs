//! Shared types for the analytics fan-out core and its sink adapters.
//!
//! Everything here is a plain value object: the event taxonomy, the
//! shared enumerations, the per-sink capability descriptor, and the
//! consent model. No I/O, no sink SDK types.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =====================================================
// Sink capability descriptor
// =====================================================

/// Naming limits a backend imposes on composed event names.
///
/// A limit of `-1` means unbounded. Fixed per sink type, read-only
/// after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability {
    /// Maximum length of the fully composed event name.
    pub max_total_len: i32,
    /// Maximum length of each individual name segment.
    pub max_segment_len: i32,
    /// Separator placed between name segments.
    pub separator: &'static str,
}

impl Capability {
    pub const fn new(max_total_len: i32, max_segment_len: i32, separator: &'static str) -> Self {
        Self {
            max_total_len,
            max_segment_len,
            separator,
        }
    }

    /// A capability with no length limits.
    pub const fn unbounded(separator: &'static str) -> Self {
        Self::new(-1, -1, separator)
    }
}

// =====================================================
// Shared enumerations
// =====================================================

/// Severity attached to error reports. Ordered so sinks can apply a
/// minimum-severity threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    Undefined,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl ErrorSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Undefined => "undefined",
            ErrorSeverity::Debug => "debug",
            ErrorSeverity::Info => "info",
            ErrorSeverity::Warning => "warning",
            ErrorSeverity::Error => "error",
            ErrorSeverity::Critical => "critical",
        }
    }
}

/// Status of a level or flow progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressionStatus {
    Undefined,
    Start,
    Complete,
    Fail,
}

impl ProgressionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressionStatus::Undefined => "undefined",
            ProgressionStatus::Start => "start",
            ProgressionStatus::Complete => "complete",
            ProgressionStatus::Fail => "fail",
        }
    }
}

/// Direction of a virtual-resource flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceFlow {
    Undefined,
    /// Resources credited to the user (earned).
    Source,
    /// Resources debited from the user (spent).
    Sink,
}

impl ResourceFlow {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceFlow::Undefined => "undefined",
            ResourceFlow::Source => "source",
            ResourceFlow::Sink => "sink",
        }
    }
}

/// Storefront a purchase went through. Some backends route store
/// purchases differently from direct ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    Unknown,
    AppStore,
    GooglePlay,
    Direct,
}

impl StoreType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreType::Unknown => "unknown",
            StoreType::AppStore => "app_store",
            StoreType::GooglePlay => "google_play",
            StoreType::Direct => "direct",
        }
    }
}

// =====================================================
// Custom fields
// =====================================================

/// Free-form event metadata. Values are expected to be JSON scalars
/// (string, number, bool); sinks stringify anything else.
pub type CustomFields = HashMap<String, Value>;

// =====================================================
// Event taxonomy
// =====================================================

/// A free-form design event named by ordered segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignEvent {
    pub segments: Vec<String>,
    pub value: Option<f64>,
    pub custom_fields: Option<CustomFields>,
}

impl DesignEvent {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            value: None,
            custom_fields: None,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_fields(mut self, fields: CustomFields) -> Self {
        self.custom_fields = Some(fields);
        self
    }
}

/// A real-money purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessEvent {
    /// ISO 4217 currency code.
    pub currency: String,
    /// Purchase amount in major currency units. Must be positive.
    pub amount: f64,
    pub item_type: String,
    pub item_id: String,
    pub cart_type: String,
    pub store: StoreType,
    /// Store receipt, when the platform provides one.
    pub receipt: Option<String>,
    pub custom_fields: Option<CustomFields>,
}

/// A level (or non-level) progression step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionEvent {
    pub status: ProgressionStatus,
    pub level_type: String,
    /// `None` marks a non-level progression (tutorial, quest chain).
    pub level_number: Option<String>,
    pub score: Option<i64>,
    pub custom_fields: Option<CustomFields>,
}

/// A virtual-currency flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceEvent {
    pub flow: ResourceFlow,
    pub currency: String,
    pub amount: f64,
    pub item_type: String,
    pub item_id: String,
}

/// An error report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub severity: ErrorSeverity,
    pub message: String,
}

/// A user-segmentation property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationEvent {
    pub name: String,
    pub value: String,
    /// Backend dimension slot; `-1` when the backend has no slots.
    pub dimension: i32,
}

/// A sign-up through a named auth method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignUpEvent {
    pub method: String,
    pub custom_fields: Option<CustomFields>,
}

/// The uniform event taxonomy every sink receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalyticsEvent {
    Design(DesignEvent),
    Business(BusinessEvent),
    Progression(ProgressionEvent),
    Resource(ResourceEvent),
    Error(ErrorEvent),
    Segmentation(SegmentationEvent),
    SignUp(SignUpEvent),
}

impl AnalyticsEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            AnalyticsEvent::Design(_) => "design",
            AnalyticsEvent::Business(_) => "business",
            AnalyticsEvent::Progression(_) => "progression",
            AnalyticsEvent::Resource(_) => "resource",
            AnalyticsEvent::Error(_) => "error",
            AnalyticsEvent::Segmentation(_) => "segmentation",
            AnalyticsEvent::SignUp(_) => "sign_up",
        }
    }

    /// Ordered name segments for events that compose a sink-legal name.
    ///
    /// Business, error, and segmentation events return `None`: backends
    /// report those through native APIs rather than a composed name.
    pub fn name_segments(&self) -> Option<Vec<String>> {
        match self {
            AnalyticsEvent::Design(e) => Some(e.segments.clone()),
            AnalyticsEvent::Progression(e) => {
                let mut segments = vec![e.level_type.clone(), e.status.as_str().to_string()];
                if let Some(number) = &e.level_number {
                    segments.push(number.clone());
                }
                Some(segments)
            }
            AnalyticsEvent::Resource(e) => Some(vec![
                e.flow.as_str().to_string(),
                e.item_type.clone(),
                e.item_id.clone(),
            ]),
            AnalyticsEvent::SignUp(e) => Some(vec!["sign_up".to_string(), e.method.clone()]),
            AnalyticsEvent::Business(_)
            | AnalyticsEvent::Error(_)
            | AnalyticsEvent::Segmentation(_) => None,
        }
    }

    /// The numeric value attached to this event, if any.
    pub fn value(&self) -> Option<f64> {
        match self {
            AnalyticsEvent::Design(e) => e.value,
            AnalyticsEvent::Business(e) => Some(e.amount),
            AnalyticsEvent::Progression(e) => e.score.map(|s| s as f64),
            AnalyticsEvent::Resource(e) => Some(e.amount),
            _ => None,
        }
    }

    pub fn custom_fields(&self) -> Option<&CustomFields> {
        match self {
            AnalyticsEvent::Design(e) => e.custom_fields.as_ref(),
            AnalyticsEvent::Business(e) => e.custom_fields.as_ref(),
            AnalyticsEvent::Progression(e) => e.custom_fields.as_ref(),
            AnalyticsEvent::SignUp(e) => e.custom_fields.as_ref(),
            _ => None,
        }
    }

    /// Taxonomy-boundary validation. Invalid events are rejected before
    /// any sink sees them.
    pub fn validate(&self) -> Result<(), EventValidationError> {
        match self {
            AnalyticsEvent::Design(e) => {
                if e.segments.is_empty() || e.segments.iter().any(|s| s.is_empty()) {
                    return Err(EventValidationError::EmptyName);
                }
            }
            AnalyticsEvent::Business(e) => {
                if e.amount <= 0.0 {
                    return Err(EventValidationError::AmountNotPositive);
                }
                if e.currency.is_empty() {
                    return Err(EventValidationError::MissingField("currency"));
                }
                if e.item_id.is_empty() {
                    return Err(EventValidationError::MissingField("item_id"));
                }
            }
            AnalyticsEvent::Progression(e) => {
                if e.level_type.is_empty() {
                    return Err(EventValidationError::MissingField("level_type"));
                }
            }
            AnalyticsEvent::Segmentation(e) => {
                if e.name.is_empty() {
                    return Err(EventValidationError::MissingField("name"));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Validation failure raised at the taxonomy boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventValidationError {
    /// Business amount was zero or negative.
    AmountNotPositive,
    /// A required field was empty.
    MissingField(&'static str),
    /// Event carried no usable name segments.
    EmptyName,
}

impl fmt::Display for EventValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventValidationError::AmountNotPositive => {
                write!(f, "business amount must be positive")
            }
            EventValidationError::MissingField(field) => {
                write!(f, "required field '{}' is empty", field)
            }
            EventValidationError::EmptyName => write!(f, "event has no name segments"),
        }
    }
}

impl std::error::Error for EventValidationError {}

// =====================================================
// Consent model
// =====================================================

/// The shared consent categories every sink translates into its native
/// model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentCategory {
    AnalyticsStorage,
    AdStorage,
    AdPersonalization,
    AdUserData,
}

impl ConsentCategory {
    pub const ALL: [ConsentCategory; 4] = [
        ConsentCategory::AnalyticsStorage,
        ConsentCategory::AdStorage,
        ConsentCategory::AdPersonalization,
        ConsentCategory::AdUserData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentCategory::AnalyticsStorage => "analytics_storage",
            ConsentCategory::AdStorage => "ad_storage",
            ConsentCategory::AdPersonalization => "ad_personalization",
            ConsentCategory::AdUserData => "ad_user_data",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentStatus {
    Granted,
    Denied,
}

/// Per-category consent decision broadcast to every sink. Derived
/// fresh on each resolution pass, never persisted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentDecision {
    categories: HashMap<ConsentCategory, ConsentStatus>,
}

impl ConsentDecision {
    pub fn all_granted() -> Self {
        Self::uniform(ConsentStatus::Granted)
    }

    pub fn all_denied() -> Self {
        Self::uniform(ConsentStatus::Denied)
    }

    fn uniform(status: ConsentStatus) -> Self {
        Self {
            categories: ConsentCategory::ALL.iter().map(|c| (*c, status)).collect(),
        }
    }

    pub fn set(&mut self, category: ConsentCategory, status: ConsentStatus) {
        self.categories.insert(category, status);
    }

    /// Missing categories read as denied.
    pub fn status_of(&self, category: ConsentCategory) -> ConsentStatus {
        self.categories
            .get(&category)
            .copied()
            .unwrap_or(ConsentStatus::Denied)
    }

    pub fn is_granted(&self, category: ConsentCategory) -> bool {
        self.status_of(category) == ConsentStatus::Granted
    }

    /// True when any category is granted. Some backends use this to
    /// toggle collection as a whole.
    pub fn any_granted(&self) -> bool {
        ConsentCategory::ALL.iter().any(|c| self.is_granted(*c))
    }
}
