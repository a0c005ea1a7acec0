//! PostgreSQL live backend.
//!
//! This module implements the [`Backend`] trait over an `sqlx::PgPool`,
//! organized by entity. Queries are built at runtime with bound parameters;
//! sort columns go through per-entity whitelists, never through
//! interpolation of caller input.
//!
//! Failures are narrowed into [`BackendError`]
//! (see `From<sqlx::Error>`): an undefined relation or an unreachable
//! server classifies as infrastructure, everything else as a business
//! failure.

use axum::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::backend::{Backend, BackendError};
use crate::meal_plan::{MealPlan, MealPlanFilter, MealPlanPatch, MealPlanStats};
use crate::player::{Player, PlayerFilter, PlayerPatch, PlayerStats};
use crate::query::{ListQuery, Listing};
use crate::template::{
    MealTemplate, MealTemplatePatch, TemplateFilter, TemplateStats,
};

/// Meal-plan table operations.
pub mod meal_plan;

/// Player table operations.
pub mod player;

/// Template table operations.
pub mod template;

/// Result type for database operations.
pub type SqlResult<T> = Result<T, BackendError>;

/// [`Backend`] implementation backed by PostgreSQL.
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    /// Wraps an existing pool.
    pub fn new(pool: PgPool) -> Self {
        PgBackend { pool }
    }

    /// Creates a backend over a lazily-connecting pool.
    ///
    /// No connection is attempted here; an unreachable server surfaces on
    /// the first operation as [`BackendError::Unreachable`], which is
    /// exactly what the resilient service needs to fall back.
    pub fn connect_lazy(database_url: &str) -> SqlResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect_lazy(database_url)
            .map_err(BackendError::from)?;
        Ok(PgBackend { pool })
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Backend for PgBackend {
    async fn list_players(
        &self,
        query: &ListQuery<PlayerFilter>,
    ) -> Result<Listing<Player>, BackendError> {
        player::list(&self.pool, query).await
    }

    async fn get_player(&self, id: &str) -> Result<Player, BackendError> {
        player::get(&self.pool, id).await
    }

    async fn insert_player(&self, record: &Player) -> Result<Player, BackendError> {
        player::insert(&self.pool, record).await
    }

    async fn update_player(&self, id: &str, patch: &PlayerPatch) -> Result<Player, BackendError> {
        player::update(&self.pool, id, patch).await
    }

    async fn delete_player(&self, id: &str) -> Result<bool, BackendError> {
        player::delete(&self.pool, id).await
    }

    async fn player_stats(&self) -> Result<PlayerStats, BackendError> {
        player::stats(&self.pool).await
    }

    async fn list_meal_plans(
        &self,
        query: &ListQuery<MealPlanFilter>,
    ) -> Result<Listing<MealPlan>, BackendError> {
        meal_plan::list(&self.pool, query).await
    }

    async fn get_meal_plan(&self, id: &str) -> Result<MealPlan, BackendError> {
        meal_plan::get(&self.pool, id).await
    }

    async fn insert_meal_plan(&self, record: &MealPlan) -> Result<MealPlan, BackendError> {
        meal_plan::insert(&self.pool, record).await
    }

    async fn update_meal_plan(
        &self,
        id: &str,
        patch: &MealPlanPatch,
    ) -> Result<MealPlan, BackendError> {
        meal_plan::update(&self.pool, id, patch).await
    }

    async fn delete_meal_plan(&self, id: &str) -> Result<bool, BackendError> {
        meal_plan::delete(&self.pool, id).await
    }

    async fn meal_plan_stats(&self) -> Result<MealPlanStats, BackendError> {
        meal_plan::stats(&self.pool).await
    }

    async fn list_templates(
        &self,
        query: &ListQuery<TemplateFilter>,
    ) -> Result<Listing<MealTemplate>, BackendError> {
        template::list(&self.pool, query).await
    }

    async fn get_template(&self, id: &str) -> Result<MealTemplate, BackendError> {
        template::get(&self.pool, id).await
    }

    async fn insert_template(&self, record: &MealTemplate) -> Result<MealTemplate, BackendError> {
        template::insert(&self.pool, record).await
    }

    async fn update_template(
        &self,
        id: &str,
        patch: &MealTemplatePatch,
    ) -> Result<MealTemplate, BackendError> {
        template::update(&self.pool, id, patch).await
    }

    async fn delete_template(&self, id: &str) -> Result<bool, BackendError> {
        template::delete(&self.pool, id).await
    }

    async fn template_stats(&self) -> Result<TemplateStats, BackendError> {
        template::stats(&self.pool).await
    }
}
