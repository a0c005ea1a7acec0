//! # Mode Command Handler
//!
//! Inspects and controls the daemon's serving mode, and lists recently
//! recorded errors.

use crate::router::ModeStatus;
use crate::{
    AppError, Envelope, cli_utils,
    commands::shared::{dispatch_command, unwrap_envelope_or_exit, validate_args_count_or_exit},
    http_utils,
};

const MODE_USAGE: &str = "Usage: nutrictl mode <show|mock|database|errors> [args...]";

/// Handles all mode-related commands.
///
/// # Arguments
/// * `args` - Command arguments (first element is the subcommand)
/// * `client` - HTTP client for API communication
/// * `output_format` - Output format for the errors listing
pub async fn handle_mode_command(
    args: &[String],
    client: &http_utils::NutriClient,
    output_format: cli_utils::OutputFormat,
) {
    dispatch_command!("mode", MODE_USAGE, args, client, output_format, {
        "show" => handle_mode_show,
        "mock" => handle_mode_mock,
        "database" => handle_mode_database,
        "errors" => handle_mode_errors,
    });
}

fn print_mode(status: &ModeStatus) {
    if status.using_mock_data {
        println!("Mock Mode - results are served from in-memory data and are not durable");
    } else {
        println!("Database Mode");
    }
}

async fn handle_mode_show(
    args: &[String],
    client: &http_utils::NutriClient,
    _output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 1, 1, "show", "Usage: nutrictl mode show");
    let status = http_utils::execute_or_exit(
        || client.get::<ModeStatus>("mode"),
        "Failed to get mode",
    )
    .await;
    print_mode(&status);
}

async fn handle_mode_mock(
    args: &[String],
    client: &http_utils::NutriClient,
    _output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 1, 1, "mock", "Usage: nutrictl mode mock");
    let status = http_utils::execute_or_exit(
        || client.post_empty::<ModeStatus>("mode/mock"),
        "Failed to force mock mode",
    )
    .await;
    print_mode(&status);
}

async fn handle_mode_database(
    args: &[String],
    client: &http_utils::NutriClient,
    _output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 1, 1, "database", "Usage: nutrictl mode database");
    let status = http_utils::execute_or_exit(
        || client.post_empty::<ModeStatus>("mode/database"),
        "Failed to reset to database mode",
    )
    .await;
    print_mode(&status);
}

async fn handle_mode_errors(
    args: &[String],
    client: &http_utils::NutriClient,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 1, 2, "errors", "Usage: nutrictl mode errors [limit]");
    let path = if args.len() == 2 {
        format!("errors?limit={}", args[1])
    } else {
        "errors".to_string()
    };
    let envelope = http_utils::execute_or_exit(
        || client.get::<Envelope<Vec<AppError>>>(&path),
        "Failed to list errors",
    )
    .await;
    let errors = unwrap_envelope_or_exit(envelope, "mode errors");

    if errors.is_empty() {
        println!("No errors recorded");
    } else {
        cli_utils::print_formatted_or_exit(&errors, output_format, "errors");
    }
}
