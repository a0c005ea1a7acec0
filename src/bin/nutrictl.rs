use arrrg::CommandLine;
use arrrg_derive::CommandLine;

use nutriplan::{
    cli_utils::{self, OutputFormat},
    commands::{
        handle_mealplan_command, handle_mode_command, handle_player_command,
        handle_template_command,
    },
    http_utils,
};

#[derive(CommandLine, Default, PartialEq, Eq)]
struct Options {
    #[arrrg(optional, "Base URL of the Nutriplan API server")]
    base_url: String,
    #[arrrg(
        optional,
        "Output format for get/list commands: json or yaml (default: json)"
    )]
    output: OutputFormat,
}

const USAGE: &str = r#"Usage: nutrictl [options] <command> [args...]

Options:
  --base-url <url>     Base URL of the Nutriplan API server (default: http://localhost:8080)
  --output <format>    Output format for get/list commands: json or yaml (default: json)

Commands:
  player list                                  List all players
  player get <player-id>                       Get a player by id
  player create <player-json>                  Create a player from JSON
  player update <player-id> <patch-json>       Update a player
  player delete <player-id>                    Delete a player
  player stats                                 Aggregate player statistics
  mealplan list [player-id]                    List meal plans, optionally for one player
  mealplan get <plan-id>                       Get a meal plan by id
  mealplan create <plan-json>                  Create a meal plan from JSON
  mealplan from-template <template-id> <player-id>  Instantiate a template
  mealplan update <plan-id> <patch-json>       Update a meal plan
  mealplan delete <plan-id>                    Delete a meal plan
  mealplan stats                               Aggregate meal-plan statistics
  template list                                List all templates
  template get <template-id>                   Get a template by id
  template create <template-json>              Create a template from JSON
  template update <template-id> <patch-json>   Update a template
  template delete <template-id>                Delete a template
  template stats                               Aggregate template statistics
  mode show                                    Show the current serving mode
  mode mock                                    Force mock mode
  mode database                                Reset to database mode
  mode errors [limit]                          List recently recorded errors"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (options, free) = Options::from_command_line_relaxed("USAGE: nutrictl <command> [args...]");

    if free.is_empty() {
        cli_utils::exit_with_usage_error("No command specified", USAGE);
    }

    let base_url = if options.base_url.is_empty() {
        "http://localhost:8080".to_string()
    } else {
        options.base_url
    };

    let client = http_utils::NutriClient::new(base_url);

    match free[0].as_str() {
        "player" => {
            handle_player_command(&free[1..], &client, options.output).await;
        }
        "mealplan" => {
            handle_mealplan_command(&free[1..], &client, options.output).await;
        }
        "template" => {
            handle_template_command(&free[1..], &client, options.output).await;
        }
        "mode" => {
            handle_mode_command(&free[1..], &client, options.output).await;
        }
        _ => {
            cli_utils::exit_with_error(&format!(
                "Unknown command '{}'. Available commands: player, mealplan, template, mode",
                free[0]
            ));
        }
    }

    Ok(())
}
