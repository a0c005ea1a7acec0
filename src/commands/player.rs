//! # Player Command Handler
//!
//! Handles player-related CLI commands: list, get, create, update, delete,
//! and stats.

use crate::{
    Envelope, NewPlayer, Player, PlayerPatch, PlayerStats, cli_utils,
    commands::shared::{dispatch_command, parse_payload_or_exit, unwrap_envelope_or_exit, validate_args_count_or_exit},
    http_utils,
};

const PLAYER_USAGE: &str = "Usage: nutrictl player <list|get|create|update|delete|stats> [args...]";

/// Handles all player-related commands.
///
/// # Arguments
/// * `args` - Command arguments (first element is the subcommand)
/// * `client` - HTTP client for API communication
/// * `output_format` - Output format for get/list commands
pub async fn handle_player_command(
    args: &[String],
    client: &http_utils::NutriClient,
    output_format: cli_utils::OutputFormat,
) {
    dispatch_command!("player", PLAYER_USAGE, args, client, output_format, {
        "list" => handle_player_list,
        "get" => handle_player_get,
        "create" => handle_player_create,
        "update" => handle_player_update,
        "delete" => handle_player_delete,
        "stats" => handle_player_stats,
    });
}

async fn handle_player_list(
    args: &[String],
    client: &http_utils::NutriClient,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 1, 1, "list", "Usage: nutrictl player list");
    let envelope = http_utils::execute_or_exit(
        || client.get::<Envelope<Vec<Player>>>("player"),
        "Failed to list players",
    )
    .await;
    let players = unwrap_envelope_or_exit(envelope, "player list");

    if players.is_empty() {
        println!("No players found");
    } else {
        cli_utils::print_formatted_or_exit(&players, output_format, "players");
    }
}

async fn handle_player_get(
    args: &[String],
    client: &http_utils::NutriClient,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 2, 2, "get", "Usage: nutrictl player get <player-id>");
    let path = format!("player/{}", args[1]);
    let envelope = http_utils::execute_or_exit(
        || client.get::<Envelope<Player>>(&path),
        "Failed to get player",
    )
    .await;
    let player = unwrap_envelope_or_exit(envelope, "player get");
    cli_utils::print_formatted_or_exit(&player, output_format, "player");
}

async fn handle_player_create(
    args: &[String],
    client: &http_utils::NutriClient,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(
        args,
        2,
        2,
        "create",
        "Usage: nutrictl player create <player-json>",
    );
    let new: NewPlayer = parse_payload_or_exit(&args[1], "player");
    let envelope = http_utils::execute_or_exit(
        || client.post::<NewPlayer, Envelope<Player>>("player", &new),
        "Failed to create player",
    )
    .await;
    let player = unwrap_envelope_or_exit(envelope, "player create");
    cli_utils::print_formatted_or_exit(&player, output_format, "player");
}

async fn handle_player_update(
    args: &[String],
    client: &http_utils::NutriClient,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(
        args,
        3,
        3,
        "update",
        "Usage: nutrictl player update <player-id> <patch-json>",
    );
    let patch: PlayerPatch = parse_payload_or_exit(&args[2], "player patch");
    let path = format!("player/{}", args[1]);
    let envelope = http_utils::execute_or_exit(
        || client.put::<PlayerPatch, Envelope<Player>>(&path, &patch),
        "Failed to update player",
    )
    .await;
    let player = unwrap_envelope_or_exit(envelope, "player update");
    cli_utils::print_formatted_or_exit(&player, output_format, "player");
}

async fn handle_player_delete(
    args: &[String],
    client: &http_utils::NutriClient,
    _output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(
        args,
        2,
        2,
        "delete",
        "Usage: nutrictl player delete <player-id>",
    );
    let path = format!("player/{}", args[1]);
    let envelope = http_utils::execute_or_exit(
        || client.delete::<Envelope<bool>>(&path),
        "Failed to delete player",
    )
    .await;
    let existed = unwrap_envelope_or_exit(envelope, "player delete");
    if existed {
        println!("Deleted player: {}", args[1]);
    } else {
        println!("Player not found: {}", args[1]);
    }
}

async fn handle_player_stats(
    args: &[String],
    client: &http_utils::NutriClient,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 1, 1, "stats", "Usage: nutrictl player stats");
    let envelope = http_utils::execute_or_exit(
        || client.get::<Envelope<PlayerStats>>("player/stats"),
        "Failed to get player stats",
    )
    .await;
    let stats = unwrap_envelope_or_exit(envelope, "player stats");
    cli_utils::print_formatted_or_exit(&stats, output_format, "player stats");
}
