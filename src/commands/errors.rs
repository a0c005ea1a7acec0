//! # Command Error Handling
//!
//! Error handling utilities for nutrictl CLI commands, using the handled
//! crate for consistent extraction of user-facing messages and hints.

use handled::Handle;

/// User-friendly error information extractable from command error types.
#[derive(Debug, Clone)]
pub struct UserError {
    /// The main error message to display to the user.
    pub message: String,
    /// Optional hint to help the user correct the error.
    pub usage_hint: Option<String>,
}

impl std::fmt::Display for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Handle<UserError> for UserError {
    fn handle(&self) -> Option<UserError> {
        Some(self.clone())
    }
}

/// A JSON payload argument that failed to parse.
#[derive(Debug)]
pub struct PayloadError {
    /// What the payload was for, e.g. "meal plan".
    pub context: String,
    /// The parser's reason.
    pub reason: String,
}

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid {} payload: {}", self.context, self.reason)
    }
}

impl std::error::Error for PayloadError {}

impl Handle<UserError> for PayloadError {
    fn handle(&self) -> Option<UserError> {
        Some(UserError {
            message: format!("Invalid {} payload: {}", self.context, self.reason),
            usage_hint: Some(
                "Payloads are JSON objects, e.g. '{\"title\": \"Recovery dinner\"}'".to_string(),
            ),
        })
    }
}

/// A failed envelope returned by the daemon.
#[derive(Debug)]
pub struct EnvelopeFailure {
    /// The operation that failed, e.g. "mealplan create".
    pub operation: String,
    /// The envelope's error message.
    pub message: String,
}

impl std::fmt::Display for EnvelopeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.operation, self.message)
    }
}

impl std::error::Error for EnvelopeFailure {}

impl Handle<UserError> for EnvelopeFailure {
    fn handle(&self) -> Option<UserError> {
        let usage_hint = if self.message.contains("not authenticated") {
            Some("The daemon has no configured actor; start it with --actor".to_string())
        } else if self.message.contains("not found") {
            Some("Check the id and try again".to_string())
        } else if self.message.starts_with("invalid") {
            Some("Check the payload fields and try again".to_string())
        } else if self.message.contains("permission denied") {
            Some("You may not have permission for this operation".to_string())
        } else {
            None
        };
        Some(UserError {
            message: format!("{} failed: {}", self.operation, self.message),
            usage_hint,
        })
    }
}

/// Formats an error for CLI output, appending the hint when one exists.
pub fn format_cli_error<E>(error: &E) -> String
where
    E: Handle<UserError> + std::fmt::Display,
{
    if let Some(user_error) = error.handle() {
        let mut output = format!("Error: {}", user_error.message);
        if let Some(hint) = user_error.usage_hint {
            output.push_str(&format!("\nHint: {}", hint));
        }
        output
    } else {
        format!("Error: {}", error)
    }
}
