//! # Result Envelope
//!
//! Every data-access operation in this crate resolves to an [`Envelope`]:
//! a uniform success/failure wrapper that callers can branch on without
//! touching exceptions or error types. HTTP handlers serialize envelopes
//! directly, so the wire shape and the in-process shape are the same.
//!
//! Invariants upheld by the constructors:
//!
//! - `success == true` exactly when `error` is `None`
//! - `data` is present only on success
//! - `count` is set only by list operations

use serde::{Deserialize, Serialize};

/// Uniform success/failure wrapper for data operations.
///
/// # Examples
///
/// ```rust
/// use nutriplan::Envelope;
///
/// let ok = Envelope::success(42);
/// assert!(ok.success);
/// assert_eq!(ok.data, Some(42));
///
/// let failed: Envelope<u32> = Envelope::failure("not found");
/// assert!(!failed.success);
/// assert_eq!(failed.error.as_deref(), Some("not found"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Whether the operation completed successfully.
    pub success: bool,
    /// The result payload; present only on success.
    pub data: Option<T>,
    /// The failure message; present only on failure.
    pub error: Option<String>,
    /// Total matching rows for list operations, when known.
    pub count: Option<u64>,
}

impl<T> Envelope<T> {
    /// Creates a successful envelope carrying `data`.
    pub fn success(data: T) -> Self {
        Envelope {
            success: true,
            data: Some(data),
            error: None,
            count: None,
        }
    }

    /// Creates a successful list envelope carrying `data` and a total count.
    pub fn success_with_count(data: T, count: u64) -> Self {
        Envelope {
            success: true,
            data: Some(data),
            error: None,
            count: Some(count),
        }
    }

    /// Creates a failed envelope carrying a human-readable message.
    pub fn failure(error: impl Into<String>) -> Self {
        Envelope {
            success: false,
            data: None,
            error: Some(error.into()),
            count: None,
        }
    }

    /// Consumes the envelope, returning the payload if successful.
    pub fn into_data(self) -> Option<T> {
        self.data
    }

    /// Maps the payload type, preserving success/error/count.
    pub fn map<U, F>(self, f: F) -> Envelope<U>
    where
        F: FnOnce(T) -> U,
    {
        Envelope {
            success: self.success,
            data: self.data.map(f),
            error: self.error,
            count: self.count,
        }
    }
}
