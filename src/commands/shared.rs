//! # Shared Command Utilities
//!
//! Validation, payload parsing, and envelope unwrapping shared by the
//! nutrictl command handlers.

use serde::de::DeserializeOwned;

use crate::Envelope;
use crate::cli_utils;
use crate::commands::errors::{EnvelopeFailure, PayloadError, format_cli_error};

/// Validates the argument count and exits with a usage error when it is
/// outside `[min_count, max_count]` (both counts include the subcommand).
pub fn validate_args_count_or_exit(
    args: &[String],
    min_count: usize,
    max_count: usize,
    command: &str,
    usage: &str,
) {
    if args.len() < min_count {
        cli_utils::exit_with_usage_error(
            &format!("{} command requires more arguments", command),
            usage,
        );
    }
    if args.len() > max_count {
        cli_utils::exit_with_usage_error(
            &format!("{} command has too many arguments", command),
            usage,
        );
    }
}

/// Parses a JSON payload argument, exiting with a formatted error on
/// failure.
pub fn parse_payload_or_exit<T>(payload: &str, context: &str) -> T
where
    T: DeserializeOwned,
{
    serde_json::from_str(payload).unwrap_or_else(|e| {
        let error = PayloadError {
            context: context.to_string(),
            reason: e.to_string(),
        };
        cli_utils::exit_with_error(&format_cli_error(&error));
    })
}

/// Unwraps a successful envelope's data, exiting with a formatted error on
/// a failed envelope.
pub fn unwrap_envelope_or_exit<T>(envelope: Envelope<T>, operation: &str) -> T {
    if envelope.success {
        match envelope.data {
            Some(data) => data,
            None => cli_utils::exit_with_error(&format!(
                "{} succeeded but returned no data",
                operation
            )),
        }
    } else {
        let failure = EnvelopeFailure {
            operation: operation.to_string(),
            message: envelope
                .error
                .unwrap_or_else(|| "no error details".to_string()),
        };
        cli_utils::exit_with_error(&format_cli_error(&failure));
    }
}

/// Generates command dispatcher boilerplate: maps the first free argument
/// to a handler, with a usage error listing the alternatives.
macro_rules! dispatch_command {
    ($command_name:expr, $usage:expr, $args:expr, $client:expr, $output_format:expr, {
        $($subcommand:expr => $handler:expr),* $(,)?
    }) => {
        if $args.is_empty() {
            crate::cli_utils::exit_with_usage_error(
                &format!("{} command requires a subcommand", $command_name),
                $usage,
            );
        }

        match $args[0].as_str() {
            $(
                $subcommand => $handler($args, $client, $output_format).await,
            )*
            _ => {
                let available: Vec<&str> = vec![$($subcommand),*];
                crate::cli_utils::exit_with_error(&format!(
                    "Unknown {} subcommand '{}'. Available subcommands: {}",
                    $command_name,
                    $args[0],
                    available.join(", ")
                ));
            }
        }
    };
}

pub(crate) use dispatch_command;
