//! Meal templates: reusable meal definitions that plans are stamped from.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::meal_plan::{MEAL_TYPES, NewMealPlan, is_valid_meal_type};
use crate::query::{ListQuery, Pagination, SortSpec};
use crate::{DataService, Envelope};

/////////////////////////////////////////////// Template ///////////////////////////////////////////////

/// A reusable meal definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealTemplate {
    /// Opaque unique id.
    pub id: String,
    /// Short title, e.g. "High-protein recovery dinner".
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
    /// Free-form labels, e.g. "vegetarian" or "pre-match".
    pub tags: Vec<String>,
    /// The actor who created the record.
    pub created_by: String,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl MealTemplate {
    /// Builds a full record from a validated payload, generating a fresh id
    /// and stamping both timestamps.
    pub fn create(new: NewMealTemplate, created_by: &str) -> MealTemplate {
        let now = Utc::now();
        MealTemplate {
            id: uuid::Uuid::new_v4().to_string(),
            title: new.title,
            description: new.description,
            meal_type: new.meal_type,
            calories: new.calories,
            protein_g: new.protein_g,
            carbs_g: new.carbs_g,
            fat_g: new.fat_g,
            tags: new.tags,
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Stamps a meal-plan payload for `player_id` out of this template.
    pub fn instantiate_for(&self, player_id: &str) -> NewMealPlan {
        NewMealPlan {
            player_id: player_id.to_string(),
            title: self.title.clone(),
            description: self.description.clone(),
            meal_type: self.meal_type.clone(),
            calories: self.calories,
            protein_g: self.protein_g,
            carbs_g: self.carbs_g,
            fat_g: self.fat_g,
            template_id: Some(self.id.clone()),
        }
    }
}

/// Payload for creating a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMealTemplate {
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
    /// Free-form labels.
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_meal_type() -> String {
    "dinner".to_string()
}

impl NewMealTemplate {
    /// Validates the payload; returns the first problem found.
    pub fn validate(&self) -> Result<(), String> {
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

/// Partial update for a template; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealTemplatePatch {
    /// New title.
    pub title: Option<String>,
    /// New description.
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
    /// Replacement tag list.
    pub tags: Option<Vec<String>>,
}

impl MealTemplatePatch {
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
    pub fn apply_to(&self, template: &mut MealTemplate) {
        if let Some(title) = &self.title {
            template.title = title.clone();
        }
        if let Some(description) = &self.description {
            template.description = Some(description.clone());
        }
        if let Some(meal_type) = &self.meal_type {
            template.meal_type = meal_type.clone();
        }
        if let Some(calories) = self.calories {
            template.calories = calories;
        }
        if let Some(protein) = self.protein_g {
            template.protein_g = protein;
        }
        if let Some(carbs) = self.carbs_g {
            template.carbs_g = carbs;
        }
        if let Some(fat) = self.fat_g {
            template.fat_g = fat;
        }
        if let Some(tags) = &self.tags {
            template.tags = tags.clone();
        }
        template.updated_at = Utc::now();
    }
}

/////////////////////////////////////////////// Filter /////////////////////////////////////////////////

/// Constraints for template list operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateFilter {
    /// Templates for one meal slot.
    pub meal_type: Option<String>,
    /// Templates carrying a tag.
    pub tag: Option<String>,
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
}

impl TemplateFilter {
    /// Whether a template satisfies every present constraint.
    pub fn matches(&self, template: &MealTemplate) -> bool {
        if let Some(meal_type) = &self.meal_type
            && &template.meal_type != meal_type
        {
            return false;
        }
        if let Some(tag) = &self.tag
            && !template.tags.iter().any(|t| t == tag)
        {
            return false;
        }
        if let Some(search) = &self.search
            && !template
                .title
                .to_lowercase()
                .contains(&search.to_lowercase())
        {
            return false;
        }
        true
    }
}

/// Orders two templates by a whitelisted sort column.
///
/// Unknown columns fall back to `created_at`.
pub fn compare_templates(a: &MealTemplate, b: &MealTemplate, sort: &SortSpec) -> std::cmp::Ordering {
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

/// Aggregate statistics over all templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateStats {
    /// Total number of templates.
    pub total: u64,
    /// Template count per meal slot.
    pub by_meal_type: HashMap<String, u64>,
}

impl TemplateStats {
    /// Computes statistics from a set of templates.
    pub fn compute<'a>(templates: impl Iterator<Item = &'a MealTemplate>) -> TemplateStats {
        let mut total = 0u64;
        let mut by_meal_type = HashMap::new();
        for template in templates {
            total += 1;
            *by_meal_type.entry(template.meal_type.clone()).or_insert(0) += 1;
        }
        TemplateStats { total, by_meal_type }
    }
}

/////////////////////////////////////////////// Routes /////////////////////////////////////////////////

/// Query-string parameters accepted by the template list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct TemplateListParams {
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
    /// Templates for one meal slot.
    pub meal_type: Option<String>,
    /// Templates carrying a tag.
    pub tag: Option<String>,
    /// Title substring match.
    pub search: Option<String>,
}

impl TemplateListParams {
    /// Converts the wire parameters into a list query.
    pub fn into_query(self) -> ListQuery<TemplateFilter> {
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
            filter: TemplateFilter {
                meal_type: self.meal_type,
                tag: self.tag,
                search: self.search,
            },
        }
    }
}

/// `GET /template` - list templates.
pub async fn get_templates(
    State(service): State<Arc<DataService>>,
    Query(params): Query<TemplateListParams>,
) -> Json<Envelope<Vec<MealTemplate>>> {
    Json(service.templates(&params.into_query()).await)
}

/// `POST /template` - create a template.
pub async fn create_template(
    State(service): State<Arc<DataService>>,
    Json(new): Json<NewMealTemplate>,
) -> Json<Envelope<MealTemplate>> {
    Json(service.create_template(new).await)
}

/// `GET /template/stats` - aggregate template statistics.
pub async fn get_template_stats(
    State(service): State<Arc<DataService>>,
) -> Json<Envelope<TemplateStats>> {
    Json(service.template_stats().await)
}

/// `GET /template/:id` - fetch one template.
pub async fn get_template_by_id(
    State(service): State<Arc<DataService>>,
    Path(id): Path<String>,
) -> Json<Envelope<MealTemplate>> {
    Json(service.template(&id).await)
}

/// `PUT /template/:id` - update a template.
pub async fn update_template_by_id(
    State(service): State<Arc<DataService>>,
    Path(id): Path<String>,
    Json(patch): Json<MealTemplatePatch>,
) -> Json<Envelope<MealTemplate>> {
    Json(service.update_template(&id, patch).await)
}

/// `DELETE /template/:id` - delete a template.
pub async fn delete_template_by_id(
    State(service): State<Arc<DataService>>,
    Path(id): Path<String>,
) -> Json<Envelope<bool>> {
    Json(service.delete_template(&id).await)
}
