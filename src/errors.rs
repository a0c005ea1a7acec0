//! # Error Taxonomy and Tracking
//!
//! This module provides the application-wide error taxonomy and the tracker
//! that records every handled failure for later inspection.
//!
//! ## Architecture
//!
//! Failures are classified into a closed set of [`ErrorKind`]s, each with a
//! fixed user-facing message, retryability flag, and ordered recovery
//! actions. [`ErrorTracker::handle_error`] converts a raw failure into an
//! immutable [`AppError`], stores it in a process-wide map keyed by id,
//! writes a log line at the severity-derived level, and notifies
//! subscribers.
//!
//! The tracker itself is a pure in-memory component: no operation on it can
//! fail, and nothing here performs I/O beyond logging.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/////////////////////////////////////////////// ErrorKind //////////////////////////////////////////////

/// Closed set of failure categories handled by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The backend could not be reached over the network.
    Network,
    /// Caller-supplied data failed validation.
    Validation,
    /// The caller is not authenticated.
    Authentication,
    /// The caller is authenticated but not permitted.
    Authorization,
    /// The backend rejected the call due to rate limiting.
    RateLimit,
    /// The backend reported an internal error.
    ServerError,
    /// The requested record does not exist.
    NotFound,
    /// The operation conflicts with existing state.
    Conflict,
    /// A database read or write failed.
    Database,
    /// Automated plan generation failed.
    AiGeneration,
    /// A file upload failed.
    FileUpload,
    /// Anything that does not fit another category.
    Unknown,
}

impl ErrorKind {
    /// Short human-readable title for errors of this kind.
    pub fn title(&self) -> &'static str {
        match self {
            ErrorKind::Network => "Network Error",
            ErrorKind::Validation => "Validation Error",
            ErrorKind::Authentication => "Authentication Error",
            ErrorKind::Authorization => "Authorization Error",
            ErrorKind::RateLimit => "Rate Limit Exceeded",
            ErrorKind::ServerError => "Server Error",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::Database => "Database Error",
            ErrorKind::AiGeneration => "Generation Error",
            ErrorKind::FileUpload => "Upload Error",
            ErrorKind::Unknown => "Unknown Error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

/////////////////////////////////////////////// Severity ///////////////////////////////////////////////

/// Ordered severity levels; determines the log level of a handled error but
/// never alters control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational; surfaced at info level.
    Low,
    /// Degraded but recoverable; surfaced at warn level.
    Medium,
    /// A user-visible failure; surfaced at error level.
    High,
    /// A failure requiring operator attention; surfaced at error level.
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/////////////////////////////////////////////// Guidance ///////////////////////////////////////////////

/// Fixed per-kind guidance: what to tell the user and what they can do next.
#[derive(Debug, Clone, Copy)]
pub struct Guidance {
    /// The message shown to the user.
    pub user_message: &'static str,
    /// Whether retrying the operation can succeed.
    pub retryable: bool,
    /// Ordered recovery suggestions; never empty.
    pub recovery_actions: &'static [&'static str],
}

/// Returns the fixed guidance for a kind.
///
/// This table is the single source of truth for user messages,
/// retryability, and recovery actions; it is deterministic by construction.
pub fn guidance(kind: ErrorKind) -> Guidance {
    match kind {
        ErrorKind::Network => Guidance {
            user_message: "Connection problem. Please check your internet connection and try again.",
            retryable: true,
            recovery_actions: &["Check your internet connection", "Try again"],
        },
        ErrorKind::Validation => Guidance {
            user_message: "Some of the information provided is invalid. Please check your input and try again.",
            retryable: true,
            recovery_actions: &["Review the highlighted fields", "Try again"],
        },
        ErrorKind::Authentication => Guidance {
            user_message: "Your session has expired. Please log in again.",
            retryable: false,
            recovery_actions: &["Log in again"],
        },
        ErrorKind::Authorization => Guidance {
            user_message: "You don't have permission to perform this action.",
            retryable: false,
            recovery_actions: &["Contact an administrator for access"],
        },
        ErrorKind::RateLimit => Guidance {
            user_message: "Too many requests. Please wait a moment and try again.",
            retryable: true,
            recovery_actions: &["Wait a moment", "Try again"],
        },
        ErrorKind::ServerError => Guidance {
            user_message: "Something went wrong on our end. The team has been notified.",
            retryable: true,
            recovery_actions: &["Try again in a few minutes"],
        },
        ErrorKind::NotFound => Guidance {
            user_message: "The requested item could not be found.",
            retryable: false,
            recovery_actions: &["Refresh the list", "Go back and try another item"],
        },
        ErrorKind::AiGeneration => Guidance {
            user_message: "Plan generation failed. You can retry or create the plan manually.",
            retryable: true,
            recovery_actions: &["Try generating again", "Create the plan manually"],
        },
        ErrorKind::Database => Guidance {
            user_message: "We couldn't save your changes. Please try again.",
            retryable: true,
            recovery_actions: &["Try again", "Check your input"],
        },
        ErrorKind::Conflict | ErrorKind::FileUpload | ErrorKind::Unknown => Guidance {
            user_message: "Something went wrong. Please try again.",
            retryable: true,
            recovery_actions: &["Try again", "Contact support if the problem persists"],
        },
    }
}

/////////////////////////////////////////////// Context ////////////////////////////////////////////////

/// Free-form context attached to an error at creation time.
///
/// The `timestamp` is always stamped by the tracker; all other fields are
/// supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// When the error was created.
    pub timestamp: DateTime<Utc>,
    /// The acting user, when known.
    pub actor_id: Option<String>,
    /// The record the operation targeted, when known.
    pub entity_id: Option<String>,
    /// The operation being performed, e.g. "meal_plan.create".
    pub action: Option<String>,
    /// The component reporting the error.
    pub component: Option<String>,
    /// Arbitrary extra detail.
    pub metadata: Option<Value>,
}

impl ErrorContext {
    /// Creates an empty context stamped with the current time.
    pub fn now() -> Self {
        ErrorContext {
            timestamp: Utc::now(),
            actor_id: None,
            entity_id: None,
            action: None,
            component: None,
            metadata: None,
        }
    }

    /// Sets the action, consuming and returning the context.
    pub fn action(mut self, action: &str) -> Self {
        self.action = Some(action.to_string());
        self
    }

    /// Sets the target record id, consuming and returning the context.
    pub fn entity_id(mut self, entity_id: &str) -> Self {
        self.entity_id = Some(entity_id.to_string());
        self
    }

    /// Sets the acting user, consuming and returning the context.
    pub fn actor_id(mut self, actor_id: &str) -> Self {
        self.actor_id = Some(actor_id.to_string());
        self
    }

    /// Sets the reporting component, consuming and returning the context.
    pub fn component(mut self, component: &str) -> Self {
        self.component = Some(component.to_string());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::now()
    }
}

/////////////////////////////////////////////// AppError ///////////////////////////////////////////////

/// An immutable classified error.
///
/// Created once per failure by [`ErrorTracker::create_error`] and never
/// modified afterwards. The `user_message`, `retryable`, and
/// `recovery_actions` fields come from the fixed [`guidance`] table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppError {
    /// Unique id; key into the tracker's map.
    pub id: String,
    /// The failure category.
    pub kind: ErrorKind,
    /// Severity; determines log level only.
    pub severity: Severity,
    /// Short title derived from the kind.
    pub title: String,
    /// The raw failure message as reported by the source.
    pub raw_message: String,
    /// The message suitable for display to a user.
    pub user_message: String,
    /// Context captured at creation time.
    pub context: ErrorContext,
    /// Whether retrying can succeed.
    pub retryable: bool,
    /// Ordered recovery suggestions; never empty.
    pub recovery_actions: Vec<String>,
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.raw_message)
    }
}

impl std::error::Error for AppError {}

/////////////////////////////////////////////// Tracker ////////////////////////////////////////////////

/// Handle returned by [`ErrorTracker::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

type Listener = Box<dyn Fn(&AppError) + Send + Sync>;

/// Process-wide registry of handled errors.
///
/// The tracker stores every error passed through [`ErrorTracker::handle_error`]
/// until it is explicitly cleared, and synchronously notifies subscribers in
/// registration order. A panicking subscriber is caught and logged; it never
/// affects other subscribers or the caller.
pub struct ErrorTracker {
    errors: Mutex<HashMap<String, AppError>>,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_listener: Mutex<u64>,
}

impl ErrorTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        ErrorTracker {
            errors: Mutex::new(HashMap::new()),
            listeners: Mutex::new(Vec::new()),
            next_listener: Mutex::new(0),
        }
    }

    /// Classifies a raw failure into an [`AppError`] without storing it.
    ///
    /// Never fails. The id and timestamp are fresh; everything else is a
    /// deterministic function of the inputs. An empty raw message falls back
    /// to a fixed literal.
    pub fn create_error(
        &self,
        raw: &dyn std::fmt::Display,
        kind: ErrorKind,
        mut context: ErrorContext,
        severity: Severity,
    ) -> AppError {
        let mut raw_message = raw.to_string();
        if raw_message.is_empty() {
            raw_message = "An unknown error occurred".to_string();
        }
        context.timestamp = Utc::now();
        let guide = guidance(kind);
        AppError {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            severity,
            title: kind.title().to_string(),
            raw_message,
            user_message: guide.user_message.to_string(),
            context,
            retryable: guide.retryable,
            recovery_actions: guide
                .recovery_actions
                .iter()
                .map(|a| a.to_string())
                .collect(),
        }
    }

    /// Classifies, stores, logs, and broadcasts a failure.
    ///
    /// Returns the stored [`AppError`]; `get_error(&returned.id)` will find
    /// it until cleared.
    pub fn handle_error(
        &self,
        raw: &dyn std::fmt::Display,
        kind: ErrorKind,
        context: ErrorContext,
        severity: Severity,
    ) -> AppError {
        let error = self.create_error(raw, kind, context, severity);
        self.errors
            .lock()
            .unwrap()
            .insert(error.id.clone(), error.clone());
        self.log(&error);
        self.notify(&error);
        error
    }

    fn log(&self, error: &AppError) {
        match error.severity {
            Severity::Low => {
                tracing::info!(id = %error.id, kind = %error.kind, "{}", error.raw_message);
            }
            Severity::Medium => {
                tracing::warn!(id = %error.id, kind = %error.kind, "{}", error.raw_message);
            }
            Severity::High | Severity::Critical => {
                tracing::error!(id = %error.id, kind = %error.kind, "{}", error.raw_message);
            }
        }
    }

    fn notify(&self, error: &AppError) {
        let listeners = self.listeners.lock().unwrap();
        for (id, listener) in listeners.iter() {
            if catch_unwind(AssertUnwindSafe(|| listener(error))).is_err() {
                tracing::warn!(listener = id.0, "error listener panicked");
            }
        }
    }

    /// Registers a callback invoked on every future [`ErrorTracker::handle_error`].
    ///
    /// Listeners are notified in registration order.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&AppError) + Send + Sync + 'static,
    {
        let mut next = self.next_listener.lock().unwrap();
        let id = ListenerId(*next);
        *next += 1;
        self.listeners
            .lock()
            .unwrap()
            .push((id, Box::new(listener)));
        id
    }

    /// Deregisters a listener.
    ///
    /// Returns whether the listener was registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Looks up a stored error by id.
    pub fn get_error(&self, id: &str) -> Option<AppError> {
        self.errors.lock().unwrap().get(id).cloned()
    }

    /// Removes a stored error; returns whether it existed.
    pub fn clear_error(&self, id: &str) -> bool {
        self.errors.lock().unwrap().remove(id).is_some()
    }

    /// Removes all stored errors; returns how many were removed.
    pub fn clear_all_errors(&self) -> u32 {
        let mut errors = self.errors.lock().unwrap();
        let count = errors.len() as u32;
        errors.clear();
        count
    }

    /// Returns all stored errors of the given severity, in no particular order.
    pub fn errors_by_severity(&self, severity: Severity) -> Vec<AppError> {
        self.errors
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.severity == severity)
            .cloned()
            .collect()
    }

    /// Returns at most `n` stored errors, newest first.
    pub fn recent_errors(&self, n: usize) -> Vec<AppError> {
        let mut errors: Vec<AppError> = self.errors.lock().unwrap().values().cloned().collect();
        errors.sort_by(|a, b| b.context.timestamp.cmp(&a.context.timestamp));
        errors.truncate(n);
        errors
    }
}

impl Default for ErrorTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ALL_KINDS: [ErrorKind; 12] = [
        ErrorKind::Network,
        ErrorKind::Validation,
        ErrorKind::Authentication,
        ErrorKind::Authorization,
        ErrorKind::RateLimit,
        ErrorKind::ServerError,
        ErrorKind::NotFound,
        ErrorKind::Conflict,
        ErrorKind::Database,
        ErrorKind::AiGeneration,
        ErrorKind::FileUpload,
        ErrorKind::Unknown,
    ];

    #[test]
    fn guidance_is_complete_and_deterministic() {
        for kind in ALL_KINDS {
            let first = guidance(kind);
            let second = guidance(kind);
            assert!(!first.recovery_actions.is_empty());
            assert!(!first.user_message.is_empty());
            assert_eq!(first.user_message, second.user_message);
            assert_eq!(first.retryable, second.retryable);
            assert_eq!(first.recovery_actions, second.recovery_actions);
        }
    }

    #[test]
    fn retryability_matches_fixed_table() {
        assert!(guidance(ErrorKind::Network).retryable);
        assert!(guidance(ErrorKind::Validation).retryable);
        assert!(!guidance(ErrorKind::Authentication).retryable);
        assert!(!guidance(ErrorKind::Authorization).retryable);
        assert!(guidance(ErrorKind::RateLimit).retryable);
        assert!(guidance(ErrorKind::ServerError).retryable);
        assert!(!guidance(ErrorKind::NotFound).retryable);
        assert!(guidance(ErrorKind::AiGeneration).retryable);
        assert!(guidance(ErrorKind::Database).retryable);
        assert!(guidance(ErrorKind::Conflict).retryable);
        assert!(guidance(ErrorKind::FileUpload).retryable);
        assert!(guidance(ErrorKind::Unknown).retryable);
    }

    #[test]
    fn create_error_uses_raw_message() {
        let tracker = ErrorTracker::new();
        let error = tracker.create_error(
            &"connection refused",
            ErrorKind::Network,
            ErrorContext::now(),
            Severity::Medium,
        );
        assert_eq!(error.raw_message, "connection refused");
        assert_eq!(error.title, "Network Error");
        assert!(error.retryable);
    }

    #[test]
    fn create_error_empty_message_falls_back() {
        let tracker = ErrorTracker::new();
        let error =
            tracker.create_error(&"", ErrorKind::Unknown, ErrorContext::now(), Severity::Low);
        assert_eq!(error.raw_message, "An unknown error occurred");
        assert_eq!(error.title, "Unknown Error");
    }

    #[test]
    fn handle_error_stores_by_id() {
        let tracker = ErrorTracker::new();
        let error = tracker.handle_error(
            &"boom",
            ErrorKind::ServerError,
            ErrorContext::now(),
            Severity::High,
        );
        let stored = tracker.get_error(&error.id).unwrap();
        assert_eq!(stored.id, error.id);
        assert_eq!(stored.raw_message, "boom");
    }

    #[test]
    fn clear_error_removes_only_target() {
        let tracker = ErrorTracker::new();
        let first =
            tracker.handle_error(&"a", ErrorKind::Unknown, ErrorContext::now(), Severity::Low);
        let second =
            tracker.handle_error(&"b", ErrorKind::Unknown, ErrorContext::now(), Severity::Low);

        assert!(tracker.clear_error(&first.id));
        assert!(!tracker.clear_error(&first.id));
        assert!(tracker.get_error(&second.id).is_some());
    }

    #[test]
    fn clear_all_errors_reports_count() {
        let tracker = ErrorTracker::new();
        tracker.handle_error(&"a", ErrorKind::Unknown, ErrorContext::now(), Severity::Low);
        tracker.handle_error(&"b", ErrorKind::Unknown, ErrorContext::now(), Severity::Low);
        assert_eq!(tracker.clear_all_errors(), 2);
        assert_eq!(tracker.clear_all_errors(), 0);
    }

    #[test]
    fn errors_by_severity_filters() {
        let tracker = ErrorTracker::new();
        tracker.handle_error(&"a", ErrorKind::Unknown, ErrorContext::now(), Severity::Low);
        tracker.handle_error(&"b", ErrorKind::Unknown, ErrorContext::now(), Severity::High);
        tracker.handle_error(&"c", ErrorKind::Unknown, ErrorContext::now(), Severity::High);

        assert_eq!(tracker.errors_by_severity(Severity::Low).len(), 1);
        assert_eq!(tracker.errors_by_severity(Severity::High).len(), 2);
        assert_eq!(tracker.errors_by_severity(Severity::Critical).len(), 0);
    }

    #[test]
    fn recent_errors_sorted_and_truncated() {
        let tracker = ErrorTracker::new();
        for i in 0..5 {
            tracker.handle_error(
                &format!("error {}", i),
                ErrorKind::Unknown,
                ErrorContext::now(),
                Severity::Low,
            );
        }

        let recent = tracker.recent_errors(3);
        assert_eq!(recent.len(), 3);
        for pair in recent.windows(2) {
            assert!(pair[0].context.timestamp >= pair[1].context.timestamp);
        }
    }

    #[test]
    fn subscribers_notified_in_order() {
        let tracker = ErrorTracker::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let calls_a = calls.clone();
        tracker.subscribe(move |_| calls_a.lock().unwrap().push("a"));
        let calls_b = calls.clone();
        tracker.subscribe(move |_| calls_b.lock().unwrap().push("b"));

        tracker.handle_error(&"x", ErrorKind::Unknown, ErrorContext::now(), Severity::Low);
        assert_eq!(*calls.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let tracker = ErrorTracker::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count_inner = count.clone();
        let id = tracker.subscribe(move |_| {
            count_inner.fetch_add(1, Ordering::SeqCst);
        });

        tracker.handle_error(&"x", ErrorKind::Unknown, ErrorContext::now(), Severity::Low);
        assert!(tracker.unsubscribe(id));
        assert!(!tracker.unsubscribe(id));
        tracker.handle_error(&"y", ErrorKind::Unknown, ErrorContext::now(), Severity::Low);

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_listener_does_not_propagate() {
        let tracker = ErrorTracker::new();
        let count = Arc::new(AtomicUsize::new(0));

        tracker.subscribe(|_| panic!("listener bug"));
        let count_inner = count.clone();
        tracker.subscribe(move |_| {
            count_inner.fetch_add(1, Ordering::SeqCst);
        });

        let error =
            tracker.handle_error(&"x", ErrorKind::Unknown, ErrorContext::now(), Severity::Low);
        assert!(tracker.get_error(&error.id).is_some());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn context_builder_sets_fields() {
        let context = ErrorContext::now()
            .action("meal_plan.create")
            .entity_id("mp-1")
            .actor_id("coach-1")
            .component("service");
        assert_eq!(context.action.as_deref(), Some("meal_plan.create"));
        assert_eq!(context.entity_id.as_deref(), Some("mp-1"));
        assert_eq!(context.actor_id.as_deref(), Some("coach-1"));
        assert_eq!(context.component.as_deref(), Some("service"));
    }
}
