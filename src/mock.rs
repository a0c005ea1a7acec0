//! # Mock Data Store
//!
//! A fixed, in-memory dataset served when the live backend is unreachable
//! or misconfigured. The store is seeded at construction with a small,
//! realistic roster (players, meal plans, templates) whose ids are short
//! readable strings so demos and tests can reference them directly.
//!
//! Writes against the store persist for the lifetime of the store instance
//! and are never written anywhere durable. Read operations never mutate.
//!
//! ## Thread Safety
//!
//! Collections live behind `Mutex<HashMap>` locks with short critical
//! sections; no lock is held across an await point.

use std::collections::HashMap;
use std::sync::Mutex;

use axum::async_trait;
use serde::Deserialize;

use crate::backend::{Backend, BackendError};
use crate::meal_plan::{
    MealPlan, MealPlanFilter, MealPlanPatch, MealPlanStats, NewMealPlan, compare_meal_plans,
};
use crate::player::{NewPlayer, Player, PlayerFilter, PlayerPatch, PlayerStats, compare_players};
use crate::query::{ListQuery, Listing, SortSpec};
use crate::template::{
    MealTemplate, MealTemplatePatch, NewMealTemplate, TemplateFilter, TemplateStats,
    compare_templates,
};

/////////////////////////////////////////////// MockStore //////////////////////////////////////////////

/// In-memory fallback store, seeded with a fixed demo dataset.
pub struct MockStore {
    players: Mutex<HashMap<String, Player>>,
    meal_plans: Mutex<HashMap<String, MealPlan>>,
    templates: Mutex<HashMap<String, MealTemplate>>,
}

const SEED_ACTOR: &str = "system";

impl MockStore {
    /// Creates a store seeded with the fixed demo dataset.
    pub fn seeded() -> Self {
        let store = MockStore::empty();
        for (id, new) in seed_players() {
            let mut player = Player::create(new, SEED_ACTOR);
            player.id = id.to_string();
            store.players.lock().unwrap().insert(player.id.clone(), player);
        }
        for (id, new) in seed_templates() {
            let mut template = MealTemplate::create(new, SEED_ACTOR);
            template.id = id.to_string();
            store
                .templates
                .lock()
                .unwrap()
                .insert(template.id.clone(), template);
        }
        for (id, new) in seed_meal_plans() {
            let mut plan = MealPlan::create(new, SEED_ACTOR);
            plan.id = id.to_string();
            store
                .meal_plans
                .lock()
                .unwrap()
                .insert(plan.id.clone(), plan);
        }
        store
    }

    /// Creates a store with no records at all.
    pub fn empty() -> Self {
        MockStore {
            players: Mutex::new(HashMap::new()),
            meal_plans: Mutex::new(HashMap::new()),
            templates: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a store seeded from a YAML document instead of the built-in
    /// dataset.
    ///
    /// The document lists create payloads per collection, each with an
    /// optional fixed `id`:
    ///
    /// ```yaml
    /// players:
    ///   - id: p1
    ///     name: Amara Okafor
    ///     height_cm: 178.0
    ///     weight_kg: 72.0
    /// templates: []
    /// meal_plans: []
    /// ```
    pub fn from_yaml(document: &str) -> Result<Self, String> {
        let seed: SeedFile =
            serde_yml::from_str(document).map_err(|e| format!("invalid seed file: {}", e))?;
        let store = MockStore::empty();
        for entry in seed.players {
            let mut player = Player::create(entry.payload, SEED_ACTOR);
            if let Some(id) = entry.id {
                player.id = id;
            }
            store
                .players
                .lock()
                .unwrap()
                .insert(player.id.clone(), player);
        }
        for entry in seed.templates {
            let mut template = MealTemplate::create(entry.payload, SEED_ACTOR);
            if let Some(id) = entry.id {
                template.id = id;
            }
            store
                .templates
                .lock()
                .unwrap()
                .insert(template.id.clone(), template);
        }
        for entry in seed.meal_plans {
            let mut plan = MealPlan::create(entry.payload, SEED_ACTOR);
            if let Some(id) = entry.id {
                plan.id = id;
            }
            store
                .meal_plans
                .lock()
                .unwrap()
                .insert(plan.id.clone(), plan);
        }
        Ok(store)
    }
}

fn paginate<T>(mut rows: Vec<T>, query_pagination: Option<&crate::query::Pagination>) -> (Vec<T>, u64) {
    let total = rows.len() as u64;
    if let Some(window) = query_pagination {
        let offset = window.offset().min(total) as usize;
        let limit = window.limit() as usize;
        rows = rows.into_iter().skip(offset).take(limit).collect();
    }
    (rows, total)
}

fn default_sort() -> SortSpec {
    SortSpec::ascending("created_at")
}

#[async_trait]
impl Backend for MockStore {
    async fn list_players(
        &self,
        query: &ListQuery<PlayerFilter>,
    ) -> Result<Listing<Player>, BackendError> {
        let players = self.players.lock().unwrap();
        let mut rows: Vec<Player> = players
            .values()
            .filter(|p| query.filter.matches(p))
            .cloned()
            .collect();
        drop(players);
        let sort = query.sort.clone().unwrap_or_else(default_sort);
        rows.sort_by(|a, b| compare_players(a, b, &sort).then_with(|| a.id.cmp(&b.id)));
        let (rows, total) = paginate(rows, query.pagination.as_ref());
        Ok(Listing::with_total(rows, total))
    }

    async fn get_player(&self, id: &str) -> Result<Player, BackendError> {
        self.players
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or(BackendError::NotFound)
    }

    async fn insert_player(&self, player: &Player) -> Result<Player, BackendError> {
        let mut players = self.players.lock().unwrap();
        if players.contains_key(&player.id) {
            return Err(BackendError::Conflict(format!(
                "player {} already exists",
                player.id
            )));
        }
        players.insert(player.id.clone(), player.clone());
        Ok(player.clone())
    }

    async fn update_player(&self, id: &str, patch: &PlayerPatch) -> Result<Player, BackendError> {
        let mut players = self.players.lock().unwrap();
        let player = players.get_mut(id).ok_or(BackendError::NotFound)?;
        patch.apply_to(player);
        Ok(player.clone())
    }

    async fn delete_player(&self, id: &str) -> Result<bool, BackendError> {
        let existed = self.players.lock().unwrap().remove(id).is_some();
        if existed {
            // Cascade: a player's plans go with the player.
            self.meal_plans
                .lock()
                .unwrap()
                .retain(|_, plan| plan.player_id != id);
        }
        Ok(existed)
    }

    async fn player_stats(&self) -> Result<PlayerStats, BackendError> {
        let players = self.players.lock().unwrap();
        Ok(PlayerStats::compute(players.values()))
    }

    async fn list_meal_plans(
        &self,
        query: &ListQuery<MealPlanFilter>,
    ) -> Result<Listing<MealPlan>, BackendError> {
        let plans = self.meal_plans.lock().unwrap();
        let mut rows: Vec<MealPlan> = plans
            .values()
            .filter(|p| query.filter.matches(p))
            .cloned()
            .collect();
        drop(plans);
        let sort = query.sort.clone().unwrap_or_else(default_sort);
        rows.sort_by(|a, b| compare_meal_plans(a, b, &sort).then_with(|| a.id.cmp(&b.id)));
        let (rows, total) = paginate(rows, query.pagination.as_ref());
        Ok(Listing::with_total(rows, total))
    }

    async fn get_meal_plan(&self, id: &str) -> Result<MealPlan, BackendError> {
        self.meal_plans
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or(BackendError::NotFound)
    }

    async fn insert_meal_plan(&self, plan: &MealPlan) -> Result<MealPlan, BackendError> {
        let mut plans = self.meal_plans.lock().unwrap();
        if plans.contains_key(&plan.id) {
            return Err(BackendError::Conflict(format!(
                "meal plan {} already exists",
                plan.id
            )));
        }
        plans.insert(plan.id.clone(), plan.clone());
        Ok(plan.clone())
    }

    async fn update_meal_plan(
        &self,
        id: &str,
        patch: &MealPlanPatch,
    ) -> Result<MealPlan, BackendError> {
        let mut plans = self.meal_plans.lock().unwrap();
        let plan = plans.get_mut(id).ok_or(BackendError::NotFound)?;
        patch.apply_to(plan);
        Ok(plan.clone())
    }

    async fn delete_meal_plan(&self, id: &str) -> Result<bool, BackendError> {
        Ok(self.meal_plans.lock().unwrap().remove(id).is_some())
    }

    async fn meal_plan_stats(&self) -> Result<MealPlanStats, BackendError> {
        let plans = self.meal_plans.lock().unwrap();
        Ok(MealPlanStats::compute(plans.values()))
    }

    async fn list_templates(
        &self,
        query: &ListQuery<TemplateFilter>,
    ) -> Result<Listing<MealTemplate>, BackendError> {
        let templates = self.templates.lock().unwrap();
        let mut rows: Vec<MealTemplate> = templates
            .values()
            .filter(|t| query.filter.matches(t))
            .cloned()
            .collect();
        drop(templates);
        let sort = query.sort.clone().unwrap_or_else(default_sort);
        rows.sort_by(|a, b| compare_templates(a, b, &sort).then_with(|| a.id.cmp(&b.id)));
        let (rows, total) = paginate(rows, query.pagination.as_ref());
        Ok(Listing::with_total(rows, total))
    }

    async fn get_template(&self, id: &str) -> Result<MealTemplate, BackendError> {
        self.templates
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or(BackendError::NotFound)
    }

    async fn insert_template(&self, template: &MealTemplate) -> Result<MealTemplate, BackendError> {
        let mut templates = self.templates.lock().unwrap();
        if templates.contains_key(&template.id) {
            return Err(BackendError::Conflict(format!(
                "template {} already exists",
                template.id
            )));
        }
        templates.insert(template.id.clone(), template.clone());
        Ok(template.clone())
    }

    async fn update_template(
        &self,
        id: &str,
        patch: &MealTemplatePatch,
    ) -> Result<MealTemplate, BackendError> {
        let mut templates = self.templates.lock().unwrap();
        let template = templates.get_mut(id).ok_or(BackendError::NotFound)?;
        patch.apply_to(template);
        Ok(template.clone())
    }

    async fn delete_template(&self, id: &str) -> Result<bool, BackendError> {
        Ok(self.templates.lock().unwrap().remove(id).is_some())
    }

    async fn template_stats(&self) -> Result<TemplateStats, BackendError> {
        let templates = self.templates.lock().unwrap();
        Ok(TemplateStats::compute(templates.values()))
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::seeded()
    }
}

/////////////////////////////////////////////// Seed ///////////////////////////////////////////////////

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    players: Vec<SeedEntry<NewPlayer>>,
    #[serde(default)]
    meal_plans: Vec<SeedEntry<NewMealPlan>>,
    #[serde(default)]
    templates: Vec<SeedEntry<NewMealTemplate>>,
}

#[derive(Debug, Deserialize)]
struct SeedEntry<T> {
    #[serde(default)]
    id: Option<String>,
    #[serde(flatten)]
    payload: T,
}

fn seed_players() -> Vec<(&'static str, NewPlayer)> {
    vec![
        (
            "p1",
            NewPlayer {
                name: "Amara Okafor".to_string(),
                squad: "first-team".to_string(),
                position: "forward".to_string(),
                height_cm: 178.0,
                weight_kg: 72.0,
                target_calories: 2900,
                target_protein_g: 165,
                target_carbs_g: 360,
                target_fat_g: 85,
                dietary_restrictions: vec![],
            },
        ),
        (
            "p2",
            NewPlayer {
                name: "Liv Sandberg".to_string(),
                squad: "first-team".to_string(),
                position: "keeper".to_string(),
                height_cm: 183.0,
                weight_kg: 79.0,
                target_calories: 2600,
                target_protein_g: 150,
                target_carbs_g: 300,
                target_fat_g: 80,
                dietary_restrictions: vec!["vegetarian".to_string()],
            },
        ),
        (
            "p3",
            NewPlayer {
                name: "Dario Mancini".to_string(),
                squad: "reserves".to_string(),
                position: "defense".to_string(),
                height_cm: 189.0,
                weight_kg: 88.0,
                target_calories: 3100,
                target_protein_g: 180,
                target_carbs_g: 380,
                target_fat_g: 95,
                dietary_restrictions: vec![],
            },
        ),
        (
            "p4",
            NewPlayer {
                name: "Noa Visser".to_string(),
                squad: "academy".to_string(),
                position: "midfield".to_string(),
                height_cm: 171.0,
                weight_kg: 64.0,
                target_calories: 2400,
                target_protein_g: 140,
                target_carbs_g: 280,
                target_fat_g: 75,
                dietary_restrictions: vec!["gluten-free".to_string()],
            },
        ),
    ]
}

fn seed_templates() -> Vec<(&'static str, NewMealTemplate)> {
    vec![
        (
            "t1",
            NewMealTemplate {
                title: "Pre-match pasta bowl".to_string(),
                description: Some("Wholegrain pasta, chicken, tomato sauce".to_string()),
                meal_type: "lunch".to_string(),
                calories: 850,
                protein_g: 45,
                carbs_g: 130,
                fat_g: 20,
                tags: vec!["pre-match".to_string(), "high-carb".to_string()],
            },
        ),
        (
            "t2",
            NewMealTemplate {
                title: "Recovery shake".to_string(),
                description: Some("Whey, banana, oat milk".to_string()),
                meal_type: "snack".to_string(),
                calories: 320,
                protein_g: 38,
                carbs_g: 30,
                fat_g: 6,
                tags: vec!["recovery".to_string(), "high-protein".to_string()],
            },
        ),
        (
            "t3",
            NewMealTemplate {
                title: "Training-day breakfast".to_string(),
                description: Some("Oats, eggs, berries".to_string()),
                meal_type: "breakfast".to_string(),
                calories: 620,
                protein_g: 35,
                carbs_g: 75,
                fat_g: 18,
                tags: vec!["training".to_string()],
            },
        ),
        (
            "t4",
            NewMealTemplate {
                title: "Light matchday dinner".to_string(),
                description: Some("White fish, potatoes, steamed vegetables".to_string()),
                meal_type: "dinner".to_string(),
                calories: 700,
                protein_g: 48,
                carbs_g: 70,
                fat_g: 22,
                tags: vec!["matchday".to_string()],
            },
        ),
    ]
}

fn seed_meal_plans() -> Vec<(&'static str, NewMealPlan)> {
    vec![
        (
            "mp1",
            NewMealPlan {
                player_id: "p1".to_string(),
                title: "Matchday fuel".to_string(),
                description: Some("Stamped from the pre-match bowl".to_string()),
                meal_type: "lunch".to_string(),
                calories: 850,
                protein_g: 45,
                carbs_g: 130,
                fat_g: 20,
                template_id: Some("t1".to_string()),
            },
        ),
        (
            "mp2",
            NewMealPlan {
                player_id: "p1".to_string(),
                title: "Post-session shake".to_string(),
                description: None,
                meal_type: "snack".to_string(),
                calories: 320,
                protein_g: 38,
                carbs_g: 30,
                fat_g: 6,
                template_id: Some("t2".to_string()),
            },
        ),
        (
            "mp3",
            NewMealPlan {
                player_id: "p2".to_string(),
                title: "Veggie training breakfast".to_string(),
                description: Some("Tofu scramble, toast, fruit".to_string()),
                meal_type: "breakfast".to_string(),
                calories: 580,
                protein_g: 30,
                carbs_g: 70,
                fat_g: 16,
                template_id: None,
            },
        ),
        (
            "mp4",
            NewMealPlan {
                player_id: "p3".to_string(),
                title: "Bulk dinner".to_string(),
                description: Some("Beef, rice, avocado".to_string()),
                meal_type: "dinner".to_string(),
                calories: 1100,
                protein_g: 65,
                carbs_g: 110,
                fat_g: 35,
                template_id: None,
            },
        ),
        (
            "mp5",
            NewMealPlan {
                player_id: "p4".to_string(),
                title: "Academy lunch".to_string(),
                description: None,
                meal_type: "lunch".to_string(),
                calories: 750,
                protein_g: 40,
                carbs_g: 95,
                fat_g: 20,
                template_id: None,
            },
        ),
        (
            "mp6",
            NewMealPlan {
                player_id: "p2".to_string(),
                title: "Evening recovery".to_string(),
                description: None,
                meal_type: "dinner".to_string(),
                calories: 720,
                protein_g: 50,
                carbs_g: 68,
                fat_g: 24,
                template_id: None,
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Pagination;

    #[tokio::test]
    async fn seeded_dataset_counts() {
        let store = MockStore::seeded();
        let players = store.list_players(&ListQuery::all()).await.unwrap();
        let plans = store.list_meal_plans(&ListQuery::all()).await.unwrap();
        let templates = store.list_templates(&ListQuery::all()).await.unwrap();
        assert_eq!(players.rows.len(), 4);
        assert_eq!(plans.rows.len(), 6);
        assert_eq!(templates.rows.len(), 4);
    }

    #[tokio::test]
    async fn seed_ids_are_stable() {
        let store = MockStore::seeded();
        assert!(store.get_player("p1").await.is_ok());
        assert!(store.get_meal_plan("mp1").await.is_ok());
        assert!(store.get_template("t1").await.is_ok());
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = MockStore::seeded();
        assert_eq!(
            store.get_player("missing").await.unwrap_err(),
            BackendError::NotFound
        );
    }

    #[tokio::test]
    async fn insert_persists_for_store_lifetime() {
        let store = MockStore::seeded();
        let plan = MealPlan::create(
            NewMealPlan {
                player_id: "p1".to_string(),
                title: "Extra snack".to_string(),
                description: None,
                meal_type: "snack".to_string(),
                calories: 200,
                protein_g: 15,
                carbs_g: 20,
                fat_g: 5,
                template_id: None,
            },
            "coach-1",
        );
        store.insert_meal_plan(&plan).await.unwrap();

        let listing = store.list_meal_plans(&ListQuery::all()).await.unwrap();
        assert!(listing.rows.iter().any(|p| p.id == plan.id));
    }

    #[tokio::test]
    async fn insert_duplicate_id_conflicts() {
        let store = MockStore::seeded();
        let existing = store.get_meal_plan("mp1").await.unwrap();
        let result = store.insert_meal_plan(&existing).await;
        assert!(matches!(result, Err(BackendError::Conflict(_))));
    }

    #[tokio::test]
    async fn filter_by_player() {
        let store = MockStore::seeded();
        let query = ListQuery::filtered(MealPlanFilter {
            player_id: Some("p1".to_string()),
            ..MealPlanFilter::default()
        });
        let listing = store.list_meal_plans(&query).await.unwrap();
        assert_eq!(listing.rows.len(), 2);
        assert!(listing.rows.iter().all(|p| p.player_id == "p1"));
    }

    #[tokio::test]
    async fn sort_and_paginate() {
        let store = MockStore::seeded();
        let query = ListQuery {
            pagination: Some(Pagination::Page { page: 1, limit: 3 }),
            sort: Some(SortSpec::descending("calories")),
            filter: MealPlanFilter::default(),
        };
        let listing = store.list_meal_plans(&query).await.unwrap();
        assert_eq!(listing.rows.len(), 3);
        assert_eq!(listing.total, Some(6));
        assert!(listing.rows[0].calories >= listing.rows[1].calories);
        assert!(listing.rows[1].calories >= listing.rows[2].calories);
    }

    #[tokio::test]
    async fn pagination_windows_are_disjoint_and_cover() {
        let store = MockStore::seeded();
        let mut seen = Vec::new();
        for page in 1..=3 {
            let query = ListQuery {
                pagination: Some(Pagination::Page { page, limit: 2 }),
                sort: None,
                filter: MealPlanFilter::default(),
            };
            let listing = store.list_meal_plans(&query).await.unwrap();
            for row in listing.rows {
                assert!(!seen.contains(&row.id));
                seen.push(row.id);
            }
        }
        assert_eq!(seen.len(), 6);
    }

    #[tokio::test]
    async fn delete_player_cascades_plans() {
        let store = MockStore::seeded();
        assert!(store.delete_player("p1").await.unwrap());
        assert!(!store.delete_player("p1").await.unwrap());

        let query = ListQuery::filtered(MealPlanFilter {
            player_id: Some("p1".to_string()),
            ..MealPlanFilter::default()
        });
        let listing = store.list_meal_plans(&query).await.unwrap();
        assert!(listing.rows.is_empty());
    }

    #[tokio::test]
    async fn update_bumps_updated_at() {
        let store = MockStore::seeded();
        let before = store.get_meal_plan("mp1").await.unwrap();
        let patch = MealPlanPatch {
            calories: Some(900),
            ..MealPlanPatch::default()
        };
        let after = store.update_meal_plan("mp1", &patch).await.unwrap();
        assert_eq!(after.calories, 900);
        assert!(after.updated_at >= before.updated_at);
    }

    #[tokio::test]
    async fn stats_reflect_seed() {
        let store = MockStore::seeded();
        let stats = store.meal_plan_stats().await.unwrap();
        assert_eq!(stats.total, 6);
        assert_eq!(stats.by_meal_type.get("lunch"), Some(&2));
        assert_eq!(stats.by_meal_type.get("dinner"), Some(&2));

        let player_stats = store.player_stats().await.unwrap();
        assert_eq!(player_stats.total, 4);
        assert_eq!(player_stats.by_squad.get("first-team"), Some(&2));
    }

    #[tokio::test]
    async fn yaml_seed_round_trip() {
        let document = r#"
players:
  - id: p1
    name: Test Player
    squad: demo
    position: forward
    height_cm: 180.0
    weight_kg: 75.0
    target_calories: 2500
templates:
  - id: t1
    title: Demo template
    meal_type: lunch
    calories: 600
meal_plans:
  - player_id: p1
    title: Demo plan
    meal_type: lunch
    calories: 600
"#;
        let store = MockStore::from_yaml(document).unwrap();
        let player = store.get_player("p1").await.unwrap();
        assert_eq!(player.name, "Test Player");
        assert_eq!(store.get_template("t1").await.unwrap().calories, 600);

        let plans = store.list_meal_plans(&ListQuery::all()).await.unwrap();
        assert_eq!(plans.rows.len(), 1);
        assert!(!plans.rows[0].id.is_empty());
    }

    #[tokio::test]
    async fn yaml_seed_rejects_garbage() {
        assert!(MockStore::from_yaml(": not yaml [").is_err());
    }

    proptest::proptest! {
        #[test]
        fn pagination_covers_all_rows_once(limit in 1u64..10) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let store = MockStore::seeded();
                let mut seen = Vec::new();
                let mut page = 1;
                loop {
                    let query = ListQuery {
                        pagination: Some(Pagination::Page { page, limit }),
                        sort: None,
                        filter: MealPlanFilter::default(),
                    };
                    let listing = store.list_meal_plans(&query).await.unwrap();
                    proptest::prop_assert_eq!(listing.total, Some(6));
                    if listing.rows.is_empty() {
                        break;
                    }
                    for row in listing.rows {
                        proptest::prop_assert!(!seen.contains(&row.id));
                        seen.push(row.id);
                    }
                    page += 1;
                }
                proptest::prop_assert_eq!(seen.len(), 6);
                Ok(())
            })?;
        }
    }
}
