//! HTTP API assembly.
//!
//! Builds the axum router exposing every entity's operations plus the
//! mode-control and error-inspection endpoints. All handlers answer with
//! the uniform [`Envelope`] shape, so clients branch on `success` rather
//! than on status codes.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::response::Json;
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::meal_plan::{
    create_meal_plan, create_meal_plan_from_template, delete_meal_plan_by_id, get_meal_plan_by_id,
    get_meal_plan_stats, get_meal_plans, update_meal_plan_by_id,
};
use crate::player::{
    create_player, delete_player_by_id, get_player_by_id, get_player_stats, get_players,
    update_player_by_id,
};
use crate::template::{
    create_template, delete_template_by_id, get_template_by_id, get_template_stats, get_templates,
    update_template_by_id,
};
use crate::{DataService, Envelope};

/// Current serving mode, as reported by `GET /mode`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModeStatus {
    /// Whether results come from the in-memory mock store.
    pub using_mock_data: bool,
    /// Human-readable mode name: "database" or "mock".
    pub mode: String,
}

async fn get_mode(State(service): State<Arc<DataService>>) -> Json<ModeStatus> {
    Json(ModeStatus {
        using_mock_data: service.is_using_mock_data(),
        mode: service.mode().to_string(),
    })
}

async fn force_mock(State(service): State<Arc<DataService>>) -> Json<ModeStatus> {
    service.force_mock_mode();
    Json(ModeStatus {
        using_mock_data: service.is_using_mock_data(),
        mode: service.mode().to_string(),
    })
}

async fn reset_database(State(service): State<Arc<DataService>>) -> Json<ModeStatus> {
    service.reset_to_database();
    Json(ModeStatus {
        using_mock_data: service.is_using_mock_data(),
        mode: service.mode().to_string(),
    })
}

/// Query-string parameters for the error-inspection endpoint.
#[derive(Debug, Deserialize)]
pub struct RecentErrorsParams {
    /// Maximum errors to return; defaults to 20.
    pub limit: Option<usize>,
}

async fn recent_errors(
    State(service): State<Arc<DataService>>,
    Query(params): Query<RecentErrorsParams>,
) -> Json<Envelope<Vec<AppError>>> {
    let errors = service.tracker().recent_errors(params.limit.unwrap_or(20));
    let count = errors.len() as u64;
    Json(Envelope::success_with_count(errors, count))
}

/// Creates the API router with all entity, mode, and error endpoints.
///
/// Mount it under a prefix of your choosing, conventionally `/api/v1`.
pub fn create_api_router(service: Arc<DataService>) -> Router {
    Router::new()
        .route("/player", get(get_players).post(create_player))
        .route("/player/stats", get(get_player_stats))
        .route(
            "/player/:id",
            get(get_player_by_id)
                .put(update_player_by_id)
                .delete(delete_player_by_id),
        )
        .route("/mealplan", get(get_meal_plans).post(create_meal_plan))
        .route("/mealplan/from-template", post(create_meal_plan_from_template))
        .route("/mealplan/stats", get(get_meal_plan_stats))
        .route(
            "/mealplan/:id",
            get(get_meal_plan_by_id)
                .put(update_meal_plan_by_id)
                .delete(delete_meal_plan_by_id),
        )
        .route("/template", get(get_templates).post(create_template))
        .route("/template/stats", get(get_template_stats))
        .route(
            "/template/:id",
            get(get_template_by_id)
                .put(update_template_by_id)
                .delete(delete_template_by_id),
        )
        .route("/mode", get(get_mode))
        .route("/mode/mock", post(force_mock))
        .route("/mode/database", post(reset_database))
        .route("/errors", get(recent_errors))
        .with_state(service)
}
