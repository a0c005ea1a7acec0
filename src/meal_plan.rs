//! Meal plans: a single planned meal for a player, with macro totals.
//!
//! Plans may be created from scratch or instantiated from a template; the
//! `template_id` field records the lineage. The meal type is a closed
//! vocabulary validated at the service boundary.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::query::{ListQuery, Pagination, SortSpec};
use crate::{DataService, Envelope};

/// The closed vocabulary of meal slots.
pub const MEAL_TYPES: &[&str] = &["breakfast", "lunch", "dinner", "snack"];

/// Whether `meal_type` is one of the accepted slots.
pub fn is_valid_meal_type(meal_type: &str) -> bool {
    MEAL_TYPES.contains(&meal_type)
}

fn default_meal_type() -> String {
    "dinner".to_string()
}

/////////////////////////////////////////////// MealPlan ///////////////////////////////////////////////

/// A planned meal for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    /// Opaque unique id.
    pub id: String,
    /// The player the plan belongs to.
    pub player_id: String,
    /// Short title, e.g. "Matchday breakfast".
    pub title: String,
    /// Longer free-form description.
    pub description: Option<String>,
    /// One of [`MEAL_TYPES`].
    pub meal_type: String,
    /// Total calories.
    pub calories: u32,
    /// Protein in grams.
    pub protein_g: u32,
    /// Carbohydrates in grams.
    pub carbs_g: u32,
    /// Fat in grams.
    pub fat_g: u32,
    /// The template this plan was instantiated from, if any.
    pub template_id: Option<String>,
    /// The actor who created the record.
    pub created_by: String,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl MealPlan {
    /// Builds a full record from a validated payload, generating a fresh id
    /// and stamping both timestamps.
    pub fn create(new: NewMealPlan, created_by: &str) -> MealPlan {
        let now = Utc::now();
        MealPlan {
            id: uuid::Uuid::new_v4().to_string(),
            player_id: new.player_id,
            title: new.title,
            description: new.description,
            meal_type: new.meal_type,
            calories: new.calories,
            protein_g: new.protein_g,
            carbs_g: new.carbs_g,
            fat_g: new.fat_g,
            template_id: new.template_id,
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Payload for creating a meal plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMealPlan {
    /// The player the plan is for; must not be empty.
    pub player_id: String,
    /// Short title; must not be empty.
    pub title: String,
    /// Longer free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// One of [`MEAL_TYPES`]; defaults to "dinner".
    #[serde(default = "default_meal_type")]
    pub meal_type: String,
    /// Total calories.
    #[serde(default)]
    pub calories: u32,
    /// Protein in grams.
    #[serde(default)]
    pub protein_g: u32,
    /// Carbohydrates in grams.
    #[serde(default)]
    pub carbs_g: u32,
    /// Fat in grams.
    #[serde(default)]
    pub fat_g: u32,
    /// The template this plan is instantiated from, if any.
    #[serde(default)]
    pub template_id: Option<String>,
}

impl NewMealPlan {
    /// Validates the payload; returns the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.player_id.trim().is_empty() {
            return Err("player_id must not be empty".to_string());
        }
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        if !is_valid_meal_type(&self.meal_type) {
            return Err(format!(
                "meal_type must be one of: {}",
                MEAL_TYPES.join(", ")
            ));
        }
        if self.calories > 20_000 {
            return Err("calories is out of range".to_string());
        }
        Ok(())
    }
}

/// Partial update for a meal plan; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealPlanPatch {
    /// New title.
    pub title: Option<String>,
    /// New description; `Some(None)` is not expressible, so updates replace.
    pub description: Option<String>,
    /// New meal type.
    pub meal_type: Option<String>,
    /// New calorie total.
    pub calories: Option<u32>,
    /// New protein total.
    pub protein_g: Option<u32>,
    /// New carbohydrate total.
    pub carbs_g: Option<u32>,
    /// New fat total.
    pub fat_g: Option<u32>,
}

impl MealPlanPatch {
    /// Validates the patch; returns the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(title) = &self.title
            && title.trim().is_empty()
        {
            return Err("title must not be empty".to_string());
        }
        if let Some(meal_type) = &self.meal_type
            && !is_valid_meal_type(meal_type)
        {
            return Err(format!(
                "meal_type must be one of: {}",
                MEAL_TYPES.join(", ")
            ));
        }
        Ok(())
    }

    /// Applies the patch in place, bumping `updated_at`.
    pub fn apply_to(&self, plan: &mut MealPlan) {
        if let Some(title) = &self.title {
            plan.title = title.clone();
        }
        if let Some(description) = &self.description {
            plan.description = Some(description.clone());
        }
        if let Some(meal_type) = &self.meal_type {
            plan.meal_type = meal_type.clone();
        }
        if let Some(calories) = self.calories {
            plan.calories = calories;
        }
        if let Some(protein) = self.protein_g {
            plan.protein_g = protein;
        }
        if let Some(carbs) = self.carbs_g {
            plan.carbs_g = carbs;
        }
        if let Some(fat) = self.fat_g {
            plan.fat_g = fat;
        }
        plan.updated_at = Utc::now();
    }
}

/////////////////////////////////////////////// Filter /////////////////////////////////////////////////

/// Equality/range constraints for meal-plan list operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealPlanFilter {
    /// Plans for one player.
    pub player_id: Option<String>,
    /// Plans for one meal slot.
    pub meal_type: Option<String>,
    /// Plans instantiated from one template.
    pub template_id: Option<String>,
    /// Minimum calorie total, inclusive.
    pub min_calories: Option<u32>,
    /// Maximum calorie total, inclusive.
    pub max_calories: Option<u32>,
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
}

impl MealPlanFilter {
    /// Whether a plan satisfies every present constraint.
    pub fn matches(&self, plan: &MealPlan) -> bool {
        if let Some(player_id) = &self.player_id
            && &plan.player_id != player_id
        {
            return false;
        }
        if let Some(meal_type) = &self.meal_type
            && &plan.meal_type != meal_type
        {
            return false;
        }
        if let Some(template_id) = &self.template_id
            && plan.template_id.as_ref() != Some(template_id)
        {
            return false;
        }
        if let Some(min) = self.min_calories
            && plan.calories < min
        {
            return false;
        }
        if let Some(max) = self.max_calories
            && plan.calories > max
        {
            return false;
        }
        if let Some(search) = &self.search
            && !plan.title.to_lowercase().contains(&search.to_lowercase())
        {
            return false;
        }
        true
    }
}

/// Orders two plans by a whitelisted sort column.
///
/// Unknown columns fall back to `created_at`.
pub fn compare_meal_plans(a: &MealPlan, b: &MealPlan, sort: &SortSpec) -> std::cmp::Ordering {
    let ordering = match sort.column.as_str() {
        "title" => a.title.cmp(&b.title),
        "calories" => a.calories.cmp(&b.calories),
        "meal_type" => a.meal_type.cmp(&b.meal_type),
        _ => a.created_at.cmp(&b.created_at),
    };
    if sort.ascending {
        ordering
    } else {
        ordering.reverse()
    }
}

/////////////////////////////////////////////// Stats //////////////////////////////////////////////////

/// Aggregate statistics over all meal plans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlanStats {
    /// Total number of plans.
    pub total: u64,
    /// Mean calorie total, 0.0 when there are no plans.
    pub avg_calories: f64,
    /// Plan count per meal slot.
    pub by_meal_type: HashMap<String, u64>,
}

impl MealPlanStats {
    /// Computes statistics from a set of plans.
    pub fn compute<'a>(plans: impl Iterator<Item = &'a MealPlan>) -> MealPlanStats {
        let mut total = 0u64;
        let mut calorie_sum = 0u64;
        let mut by_meal_type = HashMap::new();
        for plan in plans {
            total += 1;
            calorie_sum += plan.calories as u64;
            *by_meal_type.entry(plan.meal_type.clone()).or_insert(0) += 1;
        }
        let avg_calories = if total == 0 {
            0.0
        } else {
            calorie_sum as f64 / total as f64
        };
        MealPlanStats {
            total,
            avg_calories,
            by_meal_type,
        }
    }
}

/////////////////////////////////////////////// Routes /////////////////////////////////////////////////

/// Query-string parameters accepted by the meal-plan list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct MealPlanListParams {
    /// 1-indexed page number.
    pub page: Option<u64>,
    /// Raw row offset; ignored when `page` is present.
    pub offset: Option<u64>,
    /// Rows per page.
    pub limit: Option<u64>,
    /// Sort column.
    pub sort_by: Option<String>,
    /// Sort direction; defaults to ascending.
    pub ascending: Option<bool>,
    /// Plans for one player.
    pub player_id: Option<String>,
    /// Plans for one meal slot.
    pub meal_type: Option<String>,
    /// Plans instantiated from one template.
    pub template_id: Option<String>,
    /// Minimum calorie total.
    pub min_calories: Option<u32>,
    /// Maximum calorie total.
    pub max_calories: Option<u32>,
    /// Title substring match.
    pub search: Option<String>,
}

impl MealPlanListParams {
    /// Converts the wire parameters into a list query.
    pub fn into_query(self) -> ListQuery<MealPlanFilter> {
        let pagination = match (self.page, self.offset, self.limit) {
            (Some(page), _, Some(limit)) => Some(Pagination::Page { page, limit }),
            (None, Some(offset), Some(limit)) => Some(Pagination::Offset { offset, limit }),
            (None, None, Some(limit)) => Some(Pagination::Offset { offset: 0, limit }),
            _ => None,
        };
        let sort = self.sort_by.map(|column| SortSpec {
            column,
            ascending: self.ascending.unwrap_or(true),
        });
        ListQuery {
            pagination,
            sort,
            filter: MealPlanFilter {
                player_id: self.player_id,
                meal_type: self.meal_type,
                template_id: self.template_id,
                min_calories: self.min_calories,
                max_calories: self.max_calories,
                search: self.search,
            },
        }
    }
}

/// `GET /mealplan` - list meal plans.
pub async fn get_meal_plans(
    State(service): State<Arc<DataService>>,
    Query(params): Query<MealPlanListParams>,
) -> Json<Envelope<Vec<MealPlan>>> {
    Json(service.meal_plans(&params.into_query()).await)
}

/// `POST /mealplan` - create a meal plan.
pub async fn create_meal_plan(
    State(service): State<Arc<DataService>>,
    Json(new): Json<NewMealPlan>,
) -> Json<Envelope<MealPlan>> {
    Json(service.create_meal_plan(new).await)
}

/// Request body for instantiating a template into a plan.
#[derive(Debug, Serialize, Deserialize)]
pub struct FromTemplateRequest {
    /// The template to instantiate.
    pub template_id: String,
    /// The player the plan is for.
    pub player_id: String,
}

/// `POST /mealplan/from-template` - instantiate a template into a plan.
pub async fn create_meal_plan_from_template(
    State(service): State<Arc<DataService>>,
    Json(request): Json<FromTemplateRequest>,
) -> Json<Envelope<MealPlan>> {
    Json(
        service
            .create_meal_plan_from_template(&request.template_id, &request.player_id)
            .await,
    )
}

/// `GET /mealplan/stats` - aggregate meal-plan statistics.
pub async fn get_meal_plan_stats(
    State(service): State<Arc<DataService>>,
) -> Json<Envelope<MealPlanStats>> {
    Json(service.meal_plan_stats().await)
}

/// `GET /mealplan/:id` - fetch one meal plan.
pub async fn get_meal_plan_by_id(
    State(service): State<Arc<DataService>>,
    Path(id): Path<String>,
) -> Json<Envelope<MealPlan>> {
    Json(service.meal_plan(&id).await)
}

/// `PUT /mealplan/:id` - update a meal plan.
pub async fn update_meal_plan_by_id(
    State(service): State<Arc<DataService>>,
    Path(id): Path<String>,
    Json(patch): Json<MealPlanPatch>,
) -> Json<Envelope<MealPlan>> {
    Json(service.update_meal_plan(&id, patch).await)
}

/// `DELETE /mealplan/:id` - delete a meal plan.
pub async fn delete_meal_plan_by_id(
    State(service): State<Arc<DataService>>,
    Path(id): Path<String>,
) -> Json<Envelope<bool>> {
    Json(service.delete_meal_plan(&id).await)
}
