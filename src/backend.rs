//! # Backend Boundary
//!
//! This module defines the contract between the resilient data service and
//! whatever actually stores records: the [`Backend`] trait and the
//! [`BackendError`] it speaks.
//!
//! ## Failure classification
//!
//! [`BackendError::is_infrastructure`] is the single predicate deciding
//! whether a failure means "the backend itself is unavailable" (missing
//! relation, unreachable server) as opposed to a normal business rejection
//! (not found, validation, conflict). The predicate is deliberately
//! conservative: ambiguous failures are treated as business failures so the
//! service never switches to the fallback store on a mere bad request.

use axum::async_trait;
use regex::Regex;

use crate::errors::ErrorKind;
use crate::meal_plan::{MealPlan, MealPlanFilter, MealPlanPatch, MealPlanStats};
use crate::player::{Player, PlayerFilter, PlayerPatch, PlayerStats};
use crate::query::{ListQuery, Listing};
use crate::template::{MealTemplate, MealTemplatePatch, TemplateFilter, TemplateStats};

/////////////////////////////////////////////// Errors /////////////////////////////////////////////////

/// Failures a backend can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// A relation/table the operation needs does not exist.
    TableMissing(String),
    /// The backend could not be reached.
    Unreachable(String),
    /// The requested record does not exist.
    NotFound,
    /// The operation conflicts with existing state.
    Conflict(String),
    /// The payload was rejected by the backend.
    Validation(String),
    /// No actor is authenticated.
    Unauthenticated,
    /// The actor is not permitted to perform the operation.
    Forbidden(String),
    /// Any other backend-internal failure.
    Internal(String),
}

impl BackendError {
    /// Whether this failure means the backend itself is unavailable.
    ///
    /// Only unambiguous signals qualify; everything else is a business
    /// failure and must surface to the caller unchanged.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            BackendError::TableMissing(_) | BackendError::Unreachable(_)
        )
    }

    /// The taxonomy kind this failure classifies as.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BackendError::TableMissing(_) => ErrorKind::Database,
            BackendError::Unreachable(_) => ErrorKind::Network,
            BackendError::NotFound => ErrorKind::NotFound,
            BackendError::Conflict(_) => ErrorKind::Conflict,
            BackendError::Validation(_) => ErrorKind::Validation,
            BackendError::Unauthenticated => ErrorKind::Authentication,
            BackendError::Forbidden(_) => ErrorKind::Authorization,
            BackendError::Internal(_) => ErrorKind::ServerError,
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::TableMissing(relation) => write!(f, "relation missing: {}", relation),
            BackendError::Unreachable(msg) => write!(f, "backend unreachable: {}", msg),
            BackendError::NotFound => write!(f, "not found"),
            BackendError::Conflict(msg) => write!(f, "conflict: {}", msg),
            BackendError::Validation(msg) => write!(f, "invalid: {}", msg),
            BackendError::Unauthenticated => write!(f, "not authenticated"),
            BackendError::Forbidden(msg) => write!(f, "permission denied: {}", msg),
            BackendError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

/// Recognizes PostgreSQL "relation ... does not exist" text.
///
/// Used when a driver reports the failure as a bare message with no
/// SQLSTATE attached.
pub fn is_undefined_relation_message(message: &str) -> bool {
    Regex::new(r#"relation "[^"]*" does not exist"#)
        .map(|re| re.is_match(message))
        .unwrap_or(false)
}

impl From<sqlx::Error> for BackendError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => BackendError::NotFound,
            sqlx::Error::Database(db_err) => {
                if db_err.code().as_deref() == Some("42P01")
                    || is_undefined_relation_message(db_err.message())
                {
                    BackendError::TableMissing(db_err.message().to_string())
                } else if db_err.is_unique_violation() {
                    BackendError::Conflict(db_err.message().to_string())
                } else if db_err.is_foreign_key_violation() || db_err.is_check_violation() {
                    BackendError::Validation(db_err.message().to_string())
                } else {
                    BackendError::Internal(db_err.message().to_string())
                }
            }
            sqlx::Error::Io(io_err) => BackendError::Unreachable(io_err.to_string()),
            sqlx::Error::Tls(tls_err) => BackendError::Unreachable(tls_err.to_string()),
            sqlx::Error::PoolTimedOut => {
                BackendError::Unreachable("connection pool timed out".to_string())
            }
            sqlx::Error::PoolClosed => {
                BackendError::Unreachable("connection pool closed".to_string())
            }
            other => BackendError::Internal(other.to_string()),
        }
    }
}

/////////////////////////////////////////////// Backend ////////////////////////////////////////////////

/// Entity storage contract.
///
/// Implemented by the live PostgreSQL backend and by the in-memory fallback
/// store, so the resilient service can serve any operation from either.
/// List operations return a [`Listing`] carrying the total matching rows
/// when the implementation knows it. `get`/`update`/`delete` report a
/// missing record as [`BackendError::NotFound`] / `Ok(false)` respectively,
/// never as an infrastructure failure.
#[async_trait]
pub trait Backend: Send + Sync {
    // Player operations

    /// Lists players matching the query.
    async fn list_players(
        &self,
        query: &ListQuery<PlayerFilter>,
    ) -> Result<Listing<Player>, BackendError>;

    /// Fetches one player by id.
    async fn get_player(&self, id: &str) -> Result<Player, BackendError>;

    /// Stores a new player record.
    async fn insert_player(&self, player: &Player) -> Result<Player, BackendError>;

    /// Applies a patch to a player.
    async fn update_player(&self, id: &str, patch: &PlayerPatch) -> Result<Player, BackendError>;

    /// Deletes a player; returns whether it existed.
    async fn delete_player(&self, id: &str) -> Result<bool, BackendError>;

    /// Aggregate statistics over all players.
    async fn player_stats(&self) -> Result<PlayerStats, BackendError>;

    // Meal-plan operations

    /// Lists meal plans matching the query.
    async fn list_meal_plans(
        &self,
        query: &ListQuery<MealPlanFilter>,
    ) -> Result<Listing<MealPlan>, BackendError>;

    /// Fetches one meal plan by id.
    async fn get_meal_plan(&self, id: &str) -> Result<MealPlan, BackendError>;

    /// Stores a new meal-plan record.
    async fn insert_meal_plan(&self, plan: &MealPlan) -> Result<MealPlan, BackendError>;

    /// Applies a patch to a meal plan.
    async fn update_meal_plan(
        &self,
        id: &str,
        patch: &MealPlanPatch,
    ) -> Result<MealPlan, BackendError>;

    /// Deletes a meal plan; returns whether it existed.
    async fn delete_meal_plan(&self, id: &str) -> Result<bool, BackendError>;

    /// Aggregate statistics over all meal plans.
    async fn meal_plan_stats(&self) -> Result<MealPlanStats, BackendError>;

    // Template operations

    /// Lists templates matching the query.
    async fn list_templates(
        &self,
        query: &ListQuery<TemplateFilter>,
    ) -> Result<Listing<MealTemplate>, BackendError>;

    /// Fetches one template by id.
    async fn get_template(&self, id: &str) -> Result<MealTemplate, BackendError>;

    /// Stores a new template record.
    async fn insert_template(&self, template: &MealTemplate) -> Result<MealTemplate, BackendError>;

    /// Applies a patch to a template.
    async fn update_template(
        &self,
        id: &str,
        patch: &MealTemplatePatch,
    ) -> Result<MealTemplate, BackendError>;

    /// Deletes a template; returns whether it existed.
    async fn delete_template(&self, id: &str) -> Result<bool, BackendError>;

    /// Aggregate statistics over all templates.
    async fn template_stats(&self) -> Result<TemplateStats, BackendError>;
}
