//! Player records: athletes enrolled in a nutrition program.
//!
//! A player carries identity, squad/position, body metrics, and daily
//! macro targets. Create/update payloads are validated at the service
//! boundary before any backend is touched.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::query::{ListQuery, Pagination, SortSpec};
use crate::{DataService, Envelope};

/////////////////////////////////////////////// Player /////////////////////////////////////////////////

/// An athlete enrolled in a nutrition program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Opaque unique id.
    pub id: String,
    /// Full name.
    pub name: String,
    /// The squad or team the player belongs to.
    pub squad: String,
    /// Playing position.
    pub position: String,
    /// Height in centimeters.
    pub height_cm: f64,
    /// Weight in kilograms.
    pub weight_kg: f64,
    /// Daily calorie target.
    pub target_calories: u32,
    /// Daily protein target in grams.
    pub target_protein_g: u32,
    /// Daily carbohydrate target in grams.
    pub target_carbs_g: u32,
    /// Daily fat target in grams.
    pub target_fat_g: u32,
    /// Dietary restrictions, e.g. "vegetarian" or "lactose-free".
    pub dietary_restrictions: Vec<String>,
    /// The actor who created the record.
    pub created_by: String,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Player {
    /// Builds a full record from a validated payload, generating a fresh id
    /// and stamping both timestamps.
    pub fn create(new: NewPlayer, created_by: &str) -> Player {
        let now = Utc::now();
        Player {
            id: uuid::Uuid::new_v4().to_string(),
            name: new.name,
            squad: new.squad,
            position: new.position,
            height_cm: new.height_cm,
            weight_kg: new.weight_kg,
            target_calories: new.target_calories,
            target_protein_g: new.target_protein_g,
            target_carbs_g: new.target_carbs_g,
            target_fat_g: new.target_fat_g,
            dietary_restrictions: new.dietary_restrictions,
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Payload for creating a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPlayer {
    /// Full name; must not be empty.
    pub name: String,
    /// Squad or team.
    #[serde(default)]
    pub squad: String,
    /// Playing position.
    #[serde(default)]
    pub position: String,
    /// Height in centimeters; must be positive.
    pub height_cm: f64,
    /// Weight in kilograms; must be positive.
    pub weight_kg: f64,
    /// Daily calorie target.
    #[serde(default)]
    pub target_calories: u32,
    /// Daily protein target in grams.
    #[serde(default)]
    pub target_protein_g: u32,
    /// Daily carbohydrate target in grams.
    #[serde(default)]
    pub target_carbs_g: u32,
    /// Daily fat target in grams.
    #[serde(default)]
    pub target_fat_g: u32,
    /// Dietary restrictions.
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
}

impl NewPlayer {
    /// Validates the payload; returns the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("player name must not be empty".to_string());
        }
        if !self.height_cm.is_finite() || self.height_cm <= 0.0 {
            return Err("height_cm must be a positive number".to_string());
        }
        if !self.weight_kg.is_finite() || self.weight_kg <= 0.0 {
            return Err("weight_kg must be a positive number".to_string());
        }
        if self.target_calories > 20_000 {
            return Err("target_calories is out of range".to_string());
        }
        Ok(())
    }
}

/// Partial update for a player; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerPatch {
    /// New name.
    pub name: Option<String>,
    /// New squad.
    pub squad: Option<String>,
    /// New position.
    pub position: Option<String>,
    /// New height in centimeters.
    pub height_cm: Option<f64>,
    /// New weight in kilograms.
    pub weight_kg: Option<f64>,
    /// New calorie target.
    pub target_calories: Option<u32>,
    /// New protein target.
    pub target_protein_g: Option<u32>,
    /// New carbohydrate target.
    pub target_carbs_g: Option<u32>,
    /// New fat target.
    pub target_fat_g: Option<u32>,
    /// Replacement restriction list.
    pub dietary_restrictions: Option<Vec<String>>,
}

impl PlayerPatch {
    /// Validates the patch; returns the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name
            && name.trim().is_empty()
        {
            return Err("player name must not be empty".to_string());
        }
        if let Some(height) = self.height_cm
            && (!height.is_finite() || height <= 0.0)
        {
            return Err("height_cm must be a positive number".to_string());
        }
        if let Some(weight) = self.weight_kg
            && (!weight.is_finite() || weight <= 0.0)
        {
            return Err("weight_kg must be a positive number".to_string());
        }
        Ok(())
    }

    /// Applies the patch in place, bumping `updated_at`.
    pub fn apply_to(&self, player: &mut Player) {
        if let Some(name) = &self.name {
            player.name = name.clone();
        }
        if let Some(squad) = &self.squad {
            player.squad = squad.clone();
        }
        if let Some(position) = &self.position {
            player.position = position.clone();
        }
        if let Some(height) = self.height_cm {
            player.height_cm = height;
        }
        if let Some(weight) = self.weight_kg {
            player.weight_kg = weight;
        }
        if let Some(calories) = self.target_calories {
            player.target_calories = calories;
        }
        if let Some(protein) = self.target_protein_g {
            player.target_protein_g = protein;
        }
        if let Some(carbs) = self.target_carbs_g {
            player.target_carbs_g = carbs;
        }
        if let Some(fat) = self.target_fat_g {
            player.target_fat_g = fat;
        }
        if let Some(restrictions) = &self.dietary_restrictions {
            player.dietary_restrictions = restrictions.clone();
        }
        player.updated_at = Utc::now();
    }

    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self == &PlayerPatch::default()
    }
}

/////////////////////////////////////////////// Filter /////////////////////////////////////////////////

/// Equality/substring constraints for player list operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerFilter {
    /// Exact squad match.
    pub squad: Option<String>,
    /// Exact position match.
    pub position: Option<String>,
    /// Case-insensitive substring match on the name.
    pub search: Option<String>,
}

impl PlayerFilter {
    /// Whether a player satisfies every present constraint.
    pub fn matches(&self, player: &Player) -> bool {
        if let Some(squad) = &self.squad
            && &player.squad != squad
        {
            return false;
        }
        if let Some(position) = &self.position
            && &player.position != position
        {
            return false;
        }
        if let Some(search) = &self.search
            && !player.name.to_lowercase().contains(&search.to_lowercase())
        {
            return false;
        }
        true
    }
}

/// Orders two players by a whitelisted sort column.
///
/// Unknown columns fall back to `created_at`.
pub fn compare_players(a: &Player, b: &Player, sort: &SortSpec) -> std::cmp::Ordering {
    let ordering = match sort.column.as_str() {
        "name" => a.name.cmp(&b.name),
        "squad" => a.squad.cmp(&b.squad),
        "weight_kg" => a.weight_kg.partial_cmp(&b.weight_kg).unwrap_or(std::cmp::Ordering::Equal),
        "target_calories" => a.target_calories.cmp(&b.target_calories),
        _ => a.created_at.cmp(&b.created_at),
    };
    if sort.ascending {
        ordering
    } else {
        ordering.reverse()
    }
}

/////////////////////////////////////////////// Stats //////////////////////////////////////////////////

/// Aggregate statistics over all players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Total number of players.
    pub total: u64,
    /// Mean daily calorie target, 0.0 when there are no players.
    pub avg_target_calories: f64,
    /// Player count per squad.
    pub by_squad: HashMap<String, u64>,
}

impl PlayerStats {
    /// Computes statistics from a set of players.
    pub fn compute<'a>(players: impl Iterator<Item = &'a Player>) -> PlayerStats {
        let mut total = 0u64;
        let mut calorie_sum = 0u64;
        let mut by_squad = HashMap::new();
        for player in players {
            total += 1;
            calorie_sum += player.target_calories as u64;
            *by_squad.entry(player.squad.clone()).or_insert(0) += 1;
        }
        let avg_target_calories = if total == 0 {
            0.0
        } else {
            calorie_sum as f64 / total as f64
        };
        PlayerStats {
            total,
            avg_target_calories,
            by_squad,
        }
    }
}

/////////////////////////////////////////////// Routes /////////////////////////////////////////////////

/// Query-string parameters accepted by the player list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct PlayerListParams {
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
    /// Exact squad match.
    pub squad: Option<String>,
    /// Exact position match.
    pub position: Option<String>,
    /// Name substring match.
    pub search: Option<String>,
}

impl PlayerListParams {
    /// Converts the wire parameters into a list query.
    pub fn into_query(self) -> ListQuery<PlayerFilter> {
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
            filter: PlayerFilter {
                squad: self.squad,
                position: self.position,
                search: self.search,
            },
        }
    }
}

/// `GET /player` - list players.
pub async fn get_players(
    State(service): State<Arc<DataService>>,
    Query(params): Query<PlayerListParams>,
) -> Json<Envelope<Vec<Player>>> {
    Json(service.players(&params.into_query()).await)
}

/// `POST /player` - create a player.
pub async fn create_player(
    State(service): State<Arc<DataService>>,
    Json(new): Json<NewPlayer>,
) -> Json<Envelope<Player>> {
    Json(service.create_player(new).await)
}

/// `GET /player/stats` - aggregate player statistics.
pub async fn get_player_stats(
    State(service): State<Arc<DataService>>,
) -> Json<Envelope<PlayerStats>> {
    Json(service.player_stats().await)
}

/// `GET /player/:id` - fetch one player.
pub async fn get_player_by_id(
    State(service): State<Arc<DataService>>,
    Path(id): Path<String>,
) -> Json<Envelope<Player>> {
    Json(service.player(&id).await)
}

/// `PUT /player/:id` - update a player.
pub async fn update_player_by_id(
    State(service): State<Arc<DataService>>,
    Path(id): Path<String>,
    Json(patch): Json<PlayerPatch>,
) -> Json<Envelope<Player>> {
    Json(service.update_player(&id, patch).await)
}

/// `DELETE /player/:id` - delete a player.
pub async fn delete_player_by_id(
    State(service): State<Arc<DataService>>,
    Path(id): Path<String>,
) -> Json<Envelope<bool>> {
    Json(service.delete_player(&id).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_new() -> NewPlayer {
        NewPlayer {
            name: "Jo Keller".to_string(),
            squad: "first-team".to_string(),
            position: "midfield".to_string(),
            height_cm: 181.0,
            weight_kg: 74.5,
            target_calories: 2800,
            target_protein_g: 160,
            target_carbs_g: 330,
            target_fat_g: 90,
            dietary_restrictions: vec!["lactose-free".to_string()],
        }
    }

    #[test]
    fn create_generates_id_and_timestamps() {
        let player = Player::create(sample_new(), "coach-1");
        assert!(!player.id.is_empty());
        assert_eq!(player.created_by, "coach-1");
        assert_eq!(player.created_at, player.updated_at);
    }

    #[test]
    fn validate_rejects_empty_name() {
        let mut new = sample_new();
        new.name = "  ".to_string();
        assert!(new.validate().is_err());
    }

    #[test]
    fn validate_rejects_nonpositive_metrics() {
        let mut new = sample_new();
        new.height_cm = 0.0;
        assert!(new.validate().is_err());

        let mut new = sample_new();
        new.weight_kg = -3.0;
        assert!(new.validate().is_err());
    }

    #[test]
    fn patch_applies_only_present_fields() {
        let mut player = Player::create(sample_new(), "coach-1");
        let before_update = player.updated_at;

        let patch = PlayerPatch {
            squad: Some("reserves".to_string()),
            target_calories: Some(2500),
            ..PlayerPatch::default()
        };
        patch.apply_to(&mut player);

        assert_eq!(player.squad, "reserves");
        assert_eq!(player.target_calories, 2500);
        assert_eq!(player.name, "Jo Keller");
        assert!(player.updated_at >= before_update);
    }

    #[test]
    fn filter_matches_squad_and_search() {
        let player = Player::create(sample_new(), "coach-1");

        let mut filter = PlayerFilter::default();
        assert!(filter.matches(&player));

        filter.squad = Some("first-team".to_string());
        filter.search = Some("keller".to_string());
        assert!(filter.matches(&player));

        filter.squad = Some("reserves".to_string());
        assert!(!filter.matches(&player));
    }

    #[test]
    fn stats_average_and_squads() {
        let mut a = Player::create(sample_new(), "coach-1");
        a.target_calories = 2000;
        let mut b = Player::create(sample_new(), "coach-1");
        b.target_calories = 3000;
        b.squad = "reserves".to_string();

        let stats = PlayerStats::compute([&a, &b].into_iter());
        assert_eq!(stats.total, 2);
        assert_eq!(stats.avg_target_calories, 2500.0);
        assert_eq!(stats.by_squad.get("first-team"), Some(&1));
        assert_eq!(stats.by_squad.get("reserves"), Some(&1));
    }

    #[test]
    fn stats_empty_set() {
        let stats = PlayerStats::compute([].into_iter());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.avg_target_calories, 0.0);
    }

    #[test]
    fn list_params_prefer_page_over_offset() {
        let params = PlayerListParams {
            page: Some(2),
            offset: Some(50),
            limit: Some(10),
            ..PlayerListParams::default()
        };
        let query = params.into_query();
        assert_eq!(
            query.pagination,
            Some(Pagination::Page { page: 2, limit: 10 })
        );
    }
}
