use std::sync::Arc;

use arrrg::CommandLine;
use arrrg_derive::CommandLine;
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use nutriplan::sql::PgBackend;
use nutriplan::{ActorContext, DataService, ErrorTracker, MockStore, create_api_router};

#[derive(CommandLine, Default, PartialEq, Eq)]
struct Args {
    #[arrrg(optional, "PostgreSQL database URL (default: $DATABASE_URL)")]
    database_url: Option<String>,
    #[arrrg(optional, "Host to bind the HTTP server")]
    host: Option<String>,
    #[arrrg(optional, "Port to bind the HTTP server")]
    port: Option<u16>,
    #[arrrg(optional, "Actor id stamped onto created records")]
    actor: Option<String>,
    #[arrrg(optional, "Path to a YAML seed file for the mock dataset")]
    seed: Option<String>,
    #[arrrg(flag, "Serve from the mock dataset only, never touching the database")]
    mock_only: bool,
    #[arrrg(flag, "Enable verbose logging")]
    verbose: bool,
}

const HELP_TEXT: &str = r#"nutripland - Nutriplan daemon

USAGE:
    nutripland [OPTIONS]

OPTIONS:
    --database-url <URL>  PostgreSQL database URL [default: $DATABASE_URL]
    --host <HOST>         Host to bind the HTTP server [default: 127.0.0.1]
    --port <PORT>         Port to bind the HTTP server [default: 8080]
    --actor <ID>          Actor id stamped onto created records
    --seed <PATH>         YAML seed file for the mock dataset
    --mock-only           Serve from the mock dataset only
    --verbose             Enable verbose logging

DESCRIPTION:
    Serves the nutrition-program API under /api/v1/. Operations run against
    PostgreSQL; if the database is unreachable or its schema is missing, the
    daemon transparently falls back to an in-memory mock dataset and stays
    there until reset via POST /api/v1/mode/database.

API ENDPOINTS:
    Players:
      GET    /api/v1/player              List players (filters, sort, pagination)
      POST   /api/v1/player              Create a player
      GET    /api/v1/player/stats        Aggregate player statistics
      GET    /api/v1/player/{id}         Get a player
      PUT    /api/v1/player/{id}         Update a player
      DELETE /api/v1/player/{id}         Delete a player

    Meal plans:
      GET    /api/v1/mealplan            List meal plans
      POST   /api/v1/mealplan            Create a meal plan
      POST   /api/v1/mealplan/from-template  Instantiate a template
      GET    /api/v1/mealplan/stats      Aggregate meal-plan statistics
      GET    /api/v1/mealplan/{id}       Get a meal plan
      PUT    /api/v1/mealplan/{id}       Update a meal plan
      DELETE /api/v1/mealplan/{id}       Delete a meal plan

    Templates:
      GET    /api/v1/template            List templates
      POST   /api/v1/template            Create a template
      GET    /api/v1/template/stats      Aggregate template statistics
      GET    /api/v1/template/{id}       Get a template
      PUT    /api/v1/template/{id}       Update a template
      DELETE /api/v1/template/{id}       Delete a template

    Mode and errors:
      GET    /api/v1/mode                Current serving mode
      POST   /api/v1/mode/mock           Force mock mode
      POST   /api/v1/mode/database       Reset to database mode
      GET    /api/v1/errors              Recently recorded errors"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, free) = Args::from_command_line("USAGE: nutripland [OPTIONS]");

    if !free.is_empty() && free[0] == "help" {
        println!("{}", HELP_TEXT);
        return Ok(());
    }

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let database_url = args
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "postgres://localhost/nutriplan".to_string());
    let host = args.host.unwrap_or_else(|| "127.0.0.1".to_string());
    let port = args.port.unwrap_or(8080);

    // Composition root: every dependency is constructed here and injected.
    let mock = match &args.seed {
        Some(path) => {
            let document = std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read seed file {}: {}", path, e))?;
            Arc::new(MockStore::from_yaml(&document)?)
        }
        None => Arc::new(MockStore::seeded()),
    };
    let live = Arc::new(
        PgBackend::connect_lazy(&database_url)
            .map_err(|e| format!("Invalid database URL: {}", e))?,
    );
    let tracker = Arc::new(ErrorTracker::new());
    let actors = match &args.actor {
        Some(actor) => Arc::new(ActorContext::with_actor(actor)),
        None => Arc::new(ActorContext::anonymous()),
    };
    let service = Arc::new(DataService::new(live, mock, tracker, actors));

    if args.mock_only {
        service.force_mock_mode();
        tracing::info!("serving mock data only (--mock-only)");
    }

    let app = Router::new().nest("/api/v1", create_api_router(service.clone()));

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    println!("🥗 Nutriplan daemon started");
    println!("📡 Server listening on: http://{}", addr);
    if service.is_using_mock_data() {
        println!("⚠️  Mock Mode - results are not durable");
    } else {
        println!("💾 Database: {}", database_url);
    }
    println!("💡 Use Ctrl+C or send SIGTERM for graceful shutdown");
    println!();

    let shutdown_signal = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                eprintln!("❌ Server error: {}", e);
                std::process::exit(1);
            }
        }
        () = shutdown_signal => {
            println!();
            println!("🛑 Shutdown signal received, stopping server gracefully...");
            println!("👋 Nutriplan daemon stopped");
        }
    }

    Ok(())
}
