//! # Meal-Plan Command Handler
//!
//! Handles meal-plan CLI commands: list, get, create, from-template,
//! update, delete, and stats.

use crate::meal_plan::FromTemplateRequest;
use crate::{
    Envelope, MealPlan, MealPlanPatch, MealPlanStats, NewMealPlan, cli_utils,
    commands::shared::{dispatch_command, parse_payload_or_exit, unwrap_envelope_or_exit, validate_args_count_or_exit},
    http_utils,
};

const MEALPLAN_USAGE: &str =
    "Usage: nutrictl mealplan <list|get|create|from-template|update|delete|stats> [args...]";

/// Handles all meal-plan-related commands.
///
/// # Arguments
/// * `args` - Command arguments (first element is the subcommand)
/// * `client` - HTTP client for API communication
/// * `output_format` - Output format for get/list commands
pub async fn handle_mealplan_command(
    args: &[String],
    client: &http_utils::NutriClient,
    output_format: cli_utils::OutputFormat,
) {
    dispatch_command!("mealplan", MEALPLAN_USAGE, args, client, output_format, {
        "list" => handle_mealplan_list,
        "get" => handle_mealplan_get,
        "create" => handle_mealplan_create,
        "from-template" => handle_mealplan_from_template,
        "update" => handle_mealplan_update,
        "delete" => handle_mealplan_delete,
        "stats" => handle_mealplan_stats,
    });
}

async fn handle_mealplan_list(
    args: &[String],
    client: &http_utils::NutriClient,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(
        args,
        1,
        2,
        "list",
        "Usage: nutrictl mealplan list [player-id]",
    );
    let path = if args.len() == 2 {
        format!("mealplan?player_id={}", args[1])
    } else {
        "mealplan".to_string()
    };
    let envelope = http_utils::execute_or_exit(
        || client.get::<Envelope<Vec<MealPlan>>>(&path),
        "Failed to list meal plans",
    )
    .await;
    let plans = unwrap_envelope_or_exit(envelope, "mealplan list");

    if plans.is_empty() {
        println!("No meal plans found");
    } else {
        cli_utils::print_formatted_or_exit(&plans, output_format, "meal plans");
    }
}

async fn handle_mealplan_get(
    args: &[String],
    client: &http_utils::NutriClient,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 2, 2, "get", "Usage: nutrictl mealplan get <plan-id>");
    let path = format!("mealplan/{}", args[1]);
    let envelope = http_utils::execute_or_exit(
        || client.get::<Envelope<MealPlan>>(&path),
        "Failed to get meal plan",
    )
    .await;
    let plan = unwrap_envelope_or_exit(envelope, "mealplan get");
    cli_utils::print_formatted_or_exit(&plan, output_format, "meal plan");
}

async fn handle_mealplan_create(
    args: &[String],
    client: &http_utils::NutriClient,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(
        args,
        2,
        2,
        "create",
        "Usage: nutrictl mealplan create <plan-json>",
    );
    let new: NewMealPlan = parse_payload_or_exit(&args[1], "meal plan");
    let envelope = http_utils::execute_or_exit(
        || client.post::<NewMealPlan, Envelope<MealPlan>>("mealplan", &new),
        "Failed to create meal plan",
    )
    .await;
    let plan = unwrap_envelope_or_exit(envelope, "mealplan create");
    cli_utils::print_formatted_or_exit(&plan, output_format, "meal plan");
}

async fn handle_mealplan_from_template(
    args: &[String],
    client: &http_utils::NutriClient,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(
        args,
        3,
        3,
        "from-template",
        "Usage: nutrictl mealplan from-template <template-id> <player-id>",
    );
    let request = FromTemplateRequest {
        template_id: args[1].clone(),
        player_id: args[2].clone(),
    };
    let envelope = http_utils::execute_or_exit(
        || client.post::<FromTemplateRequest, Envelope<MealPlan>>("mealplan/from-template", &request),
        "Failed to instantiate template",
    )
    .await;
    let plan = unwrap_envelope_or_exit(envelope, "mealplan from-template");
    cli_utils::print_formatted_or_exit(&plan, output_format, "meal plan");
}

async fn handle_mealplan_update(
    args: &[String],
    client: &http_utils::NutriClient,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(
        args,
        3,
        3,
        "update",
        "Usage: nutrictl mealplan update <plan-id> <patch-json>",
    );
    let patch: MealPlanPatch = parse_payload_or_exit(&args[2], "meal plan patch");
    let path = format!("mealplan/{}", args[1]);
    let envelope = http_utils::execute_or_exit(
        || client.put::<MealPlanPatch, Envelope<MealPlan>>(&path, &patch),
        "Failed to update meal plan",
    )
    .await;
    let plan = unwrap_envelope_or_exit(envelope, "mealplan update");
    cli_utils::print_formatted_or_exit(&plan, output_format, "meal plan");
}

async fn handle_mealplan_delete(
    args: &[String],
    client: &http_utils::NutriClient,
    _output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(
        args,
        2,
        2,
        "delete",
        "Usage: nutrictl mealplan delete <plan-id>",
    );
    let path = format!("mealplan/{}", args[1]);
    let envelope = http_utils::execute_or_exit(
        || client.delete::<Envelope<bool>>(&path),
        "Failed to delete meal plan",
    )
    .await;
    let existed = unwrap_envelope_or_exit(envelope, "mealplan delete");
    if existed {
        println!("Deleted meal plan: {}", args[1]);
    } else {
        println!("Meal plan not found: {}", args[1]);
    }
}

async fn handle_mealplan_stats(
    args: &[String],
    client: &http_utils::NutriClient,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 1, 1, "stats", "Usage: nutrictl mealplan stats");
    let envelope = http_utils::execute_or_exit(
        || client.get::<Envelope<MealPlanStats>>("mealplan/stats"),
        "Failed to get meal plan stats",
    )
    .await;
    let stats = unwrap_envelope_or_exit(envelope, "mealplan stats");
    cli_utils::print_formatted_or_exit(&stats, output_format, "meal plan stats");
}
