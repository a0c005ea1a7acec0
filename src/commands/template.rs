//! # Template Command Handler
//!
//! Handles template CLI commands: list, get, create, update, delete, and
//! stats.

use crate::{
    Envelope, MealTemplate, MealTemplatePatch, NewMealTemplate, TemplateStats, cli_utils,
    commands::shared::{dispatch_command, parse_payload_or_exit, unwrap_envelope_or_exit, validate_args_count_or_exit},
    http_utils,
};

const TEMPLATE_USAGE: &str =
    "Usage: nutrictl template <list|get|create|update|delete|stats> [args...]";

/// Handles all template-related commands.
///
/// # Arguments
/// * `args` - Command arguments (first element is the subcommand)
/// * `client` - HTTP client for API communication
/// * `output_format` - Output format for get/list commands
pub async fn handle_template_command(
    args: &[String],
    client: &http_utils::NutriClient,
    output_format: cli_utils::OutputFormat,
) {
    dispatch_command!("template", TEMPLATE_USAGE, args, client, output_format, {
        "list" => handle_template_list,
        "get" => handle_template_get,
        "create" => handle_template_create,
        "update" => handle_template_update,
        "delete" => handle_template_delete,
        "stats" => handle_template_stats,
    });
}

async fn handle_template_list(
    args: &[String],
    client: &http_utils::NutriClient,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 1, 1, "list", "Usage: nutrictl template list");
    let envelope = http_utils::execute_or_exit(
        || client.get::<Envelope<Vec<MealTemplate>>>("template"),
        "Failed to list templates",
    )
    .await;
    let templates = unwrap_envelope_or_exit(envelope, "template list");

    if templates.is_empty() {
        println!("No templates found");
    } else {
        cli_utils::print_formatted_or_exit(&templates, output_format, "templates");
    }
}

async fn handle_template_get(
    args: &[String],
    client: &http_utils::NutriClient,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(
        args,
        2,
        2,
        "get",
        "Usage: nutrictl template get <template-id>",
    );
    let path = format!("template/{}", args[1]);
    let envelope = http_utils::execute_or_exit(
        || client.get::<Envelope<MealTemplate>>(&path),
        "Failed to get template",
    )
    .await;
    let template = unwrap_envelope_or_exit(envelope, "template get");
    cli_utils::print_formatted_or_exit(&template, output_format, "template");
}

async fn handle_template_create(
    args: &[String],
    client: &http_utils::NutriClient,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(
        args,
        2,
        2,
        "create",
        "Usage: nutrictl template create <template-json>",
    );
    let new: NewMealTemplate = parse_payload_or_exit(&args[1], "template");
    let envelope = http_utils::execute_or_exit(
        || client.post::<NewMealTemplate, Envelope<MealTemplate>>("template", &new),
        "Failed to create template",
    )
    .await;
    let template = unwrap_envelope_or_exit(envelope, "template create");
    cli_utils::print_formatted_or_exit(&template, output_format, "template");
}

async fn handle_template_update(
    args: &[String],
    client: &http_utils::NutriClient,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(
        args,
        3,
        3,
        "update",
        "Usage: nutrictl template update <template-id> <patch-json>",
    );
    let patch: MealTemplatePatch = parse_payload_or_exit(&args[2], "template patch");
    let path = format!("template/{}", args[1]);
    let envelope = http_utils::execute_or_exit(
        || client.put::<MealTemplatePatch, Envelope<MealTemplate>>(&path, &patch),
        "Failed to update template",
    )
    .await;
    let template = unwrap_envelope_or_exit(envelope, "template update");
    cli_utils::print_formatted_or_exit(&template, output_format, "template");
}

async fn handle_template_delete(
    args: &[String],
    client: &http_utils::NutriClient,
    _output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(
        args,
        2,
        2,
        "delete",
        "Usage: nutrictl template delete <template-id>",
    );
    let path = format!("template/{}", args[1]);
    let envelope = http_utils::execute_or_exit(
        || client.delete::<Envelope<bool>>(&path),
        "Failed to delete template",
    )
    .await;
    let existed = unwrap_envelope_or_exit(envelope, "template delete");
    if existed {
        println!("Deleted template: {}", args[1]);
    } else {
        println!("Template not found: {}", args[1]);
    }
}

async fn handle_template_stats(
    args: &[String],
    client: &http_utils::NutriClient,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 1, 1, "stats", "Usage: nutrictl template stats");
    let envelope = http_utils::execute_or_exit(
        || client.get::<Envelope<TemplateStats>>("template/stats"),
        "Failed to get template stats",
    )
    .await;
    let stats = unwrap_envelope_or_exit(envelope, "template stats");
    cli_utils::print_formatted_or_exit(&stats, output_format, "template stats");
}
