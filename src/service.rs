//! # Resilient Data Service
//!
//! [`DataService`] fronts every entity's CRUD operations with automatic
//! live-to-mock failover:
//!
//! - In `Live` mode each operation is attempted against the injected live
//!   [`Backend`].
//! - If the live call fails with an unambiguous infrastructure failure
//!   ([`BackendError::is_infrastructure`]), the service records the failure,
//!   flips to `Mock` mode, and re-serves the same operation from the
//!   in-memory [`MockStore`] within the same call. The caller sees one
//!   successful envelope, not an error.
//! - Business failures (not found, validation, conflict, auth) surface as
//!   failed envelopes and never switch modes.
//! - `Mock` mode persists until [`DataService::reset_to_database`] is
//!   called; a successful mock call never re-probes the live backend.
//!
//! Every operation funnels through one macro so the mode machine and the
//! failure predicate cannot drift between entities.

use std::sync::{Arc, Mutex};

use crate::backend::{Backend, BackendError};
use crate::envelope::Envelope;
use crate::errors::{ErrorContext, ErrorTracker, Severity};
use crate::meal_plan::{MealPlan, MealPlanFilter, MealPlanPatch, MealPlanStats, NewMealPlan};
use crate::mock::MockStore;
use crate::player::{NewPlayer, Player, PlayerFilter, PlayerPatch, PlayerStats};
use crate::query::ListQuery;
use crate::template::{
    MealTemplate, MealTemplatePatch, NewMealTemplate, TemplateFilter, TemplateStats,
};

/////////////////////////////////////////////// Mode ///////////////////////////////////////////////////

/// Which store is serving operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceMode {
    /// Operations go to the live backend.
    Live,
    /// Operations go to the in-memory mock store.
    Mock,
}

impl std::fmt::Display for ServiceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceMode::Live => write!(f, "database"),
            ServiceMode::Mock => write!(f, "mock"),
        }
    }
}

/////////////////////////////////////////////// Actor //////////////////////////////////////////////////

/// Holds the currently authenticated actor, if any.
///
/// Write operations require an actor; the id is stamped onto `created_by`
/// fields. The service treats the id as an opaque string.
pub struct ActorContext {
    actor: Mutex<Option<String>>,
}

impl ActorContext {
    /// Creates a context with no authenticated actor.
    pub fn anonymous() -> Self {
        ActorContext {
            actor: Mutex::new(None),
        }
    }

    /// Creates a context already authenticated as `actor`.
    pub fn with_actor(actor: &str) -> Self {
        ActorContext {
            actor: Mutex::new(Some(actor.to_string())),
        }
    }

    /// Replaces the current actor; `None` signs out.
    pub fn set_actor(&self, actor: Option<String>) {
        *self.actor.lock().unwrap() = actor;
    }

    /// Returns the current actor id, if authenticated.
    pub fn actor(&self) -> Option<String> {
        self.actor.lock().unwrap().clone()
    }
}

impl Default for ActorContext {
    fn default() -> Self {
        Self::anonymous()
    }
}

/////////////////////////////////////////////// Service ////////////////////////////////////////////////

/// Serves one operation from the live backend or, after a qualifying
/// failure, from the mock store - within the same logical call.
macro_rules! with_fallback {
    ($service:expr, $action:expr, $method:ident ( $($arg:expr),* )) => {{
        if $service.is_using_mock_data() {
            $service.mock.$method($($arg),*).await
        } else {
            match $service.live.$method($($arg),*).await {
                Ok(value) => Ok(value),
                Err(err) if err.is_infrastructure() => {
                    $service.record_failover($action, &err);
                    $service.mock.$method($($arg),*).await
                }
                Err(err) => Err(err),
            }
        }
    }};
}

/// Entity CRUD with automatic live-to-mock failover and uniform envelopes.
///
/// Construct one per process (or per test) at the composition root and
/// share it by `Arc`; the mode flag is per-instance state.
pub struct DataService {
    live: Arc<dyn Backend>,
    mock: Arc<MockStore>,
    tracker: Arc<ErrorTracker>,
    actors: Arc<ActorContext>,
    mode: Mutex<ServiceMode>,
}

impl DataService {
    /// Creates a service in `Live` mode.
    pub fn new(
        live: Arc<dyn Backend>,
        mock: Arc<MockStore>,
        tracker: Arc<ErrorTracker>,
        actors: Arc<ActorContext>,
    ) -> Self {
        DataService {
            live,
            mock,
            tracker,
            actors,
            mode: Mutex::new(ServiceMode::Live),
        }
    }

    /// The current mode.
    pub fn mode(&self) -> ServiceMode {
        *self.mode.lock().unwrap()
    }

    /// Whether operations are currently served from the mock store.
    pub fn is_using_mock_data(&self) -> bool {
        self.mode() == ServiceMode::Mock
    }

    /// Switches to the mock store unconditionally.
    pub fn force_mock_mode(&self) {
        *self.mode.lock().unwrap() = ServiceMode::Mock;
        tracing::info!("mock data mode forced");
    }

    /// Returns to the live backend. Mock-mode writes remain in the mock
    /// store but are no longer visible through the service.
    pub fn reset_to_database(&self) {
        *self.mode.lock().unwrap() = ServiceMode::Live;
        tracing::info!("reset to database mode");
    }

    /// The error tracker this service records into.
    pub fn tracker(&self) -> Arc<ErrorTracker> {
        self.tracker.clone()
    }

    fn record_failover(&self, action: &str, err: &BackendError) {
        *self.mode.lock().unwrap() = ServiceMode::Mock;
        tracing::warn!(action, error = %err, "live backend unavailable; switching to mock data");
        self.tracker.handle_error(
            err,
            err.kind(),
            ErrorContext::now().action(action).component("data_service"),
            Severity::High,
        );
    }

    fn fail<T>(&self, action: &str, err: BackendError) -> Envelope<T> {
        self.tracker.handle_error(
            &err,
            err.kind(),
            ErrorContext::now().action(action).component("data_service"),
            Severity::Medium,
        );
        Envelope::failure(err.to_string())
    }

    fn require_actor<T>(&self, action: &str) -> Result<String, Envelope<T>> {
        match self.actors.actor() {
            Some(actor) => Ok(actor),
            None => Err(self.fail(action, BackendError::Unauthenticated)),
        }
    }

    // Player operations

    /// Lists players; the envelope's `count` is the total matching rows.
    pub async fn players(&self, query: &ListQuery<PlayerFilter>) -> Envelope<Vec<Player>> {
        match with_fallback!(self, "player.list", list_players(query)) {
            Ok(listing) => {
                let count = listing.count();
                Envelope::success_with_count(listing.rows, count)
            }
            Err(err) => self.fail("player.list", err),
        }
    }

    /// Fetches one player by id.
    pub async fn player(&self, id: &str) -> Envelope<Player> {
        match with_fallback!(self, "player.get", get_player(id)) {
            Ok(player) => Envelope::success(player),
            Err(err) => self.fail("player.get", err),
        }
    }

    /// Validates and creates a player, stamping the current actor.
    pub async fn create_player(&self, new: NewPlayer) -> Envelope<Player> {
        let actor = match self.require_actor("player.create") {
            Ok(actor) => actor,
            Err(envelope) => return envelope,
        };
        if let Err(message) = new.validate() {
            return self.fail("player.create", BackendError::Validation(message));
        }
        let record = Player::create(new, &actor);
        match with_fallback!(self, "player.create", insert_player(&record)) {
            Ok(player) => Envelope::success(player),
            Err(err) => self.fail("player.create", err),
        }
    }

    /// Validates and applies a patch to a player.
    pub async fn update_player(&self, id: &str, patch: PlayerPatch) -> Envelope<Player> {
        if let Err(envelope) = self.require_actor::<Player>("player.update") {
            return envelope;
        }
        if let Err(message) = patch.validate() {
            return self.fail("player.update", BackendError::Validation(message));
        }
        match with_fallback!(self, "player.update", update_player(id, &patch)) {
            Ok(player) => Envelope::success(player),
            Err(err) => self.fail("player.update", err),
        }
    }

    /// Deletes a player; the envelope's data is whether it existed.
    pub async fn delete_player(&self, id: &str) -> Envelope<bool> {
        if let Err(envelope) = self.require_actor::<bool>("player.delete") {
            return envelope;
        }
        match with_fallback!(self, "player.delete", delete_player(id)) {
            Ok(existed) => Envelope::success(existed),
            Err(err) => self.fail("player.delete", err),
        }
    }

    /// Aggregate statistics over all players.
    pub async fn player_stats(&self) -> Envelope<PlayerStats> {
        match with_fallback!(self, "player.stats", player_stats()) {
            Ok(stats) => Envelope::success(stats),
            Err(err) => self.fail("player.stats", err),
        }
    }

    // Meal-plan operations

    /// Lists meal plans; the envelope's `count` is the total matching rows.
    pub async fn meal_plans(&self, query: &ListQuery<MealPlanFilter>) -> Envelope<Vec<MealPlan>> {
        match with_fallback!(self, "meal_plan.list", list_meal_plans(query)) {
            Ok(listing) => {
                let count = listing.count();
                Envelope::success_with_count(listing.rows, count)
            }
            Err(err) => self.fail("meal_plan.list", err),
        }
    }

    /// Fetches one meal plan by id.
    pub async fn meal_plan(&self, id: &str) -> Envelope<MealPlan> {
        match with_fallback!(self, "meal_plan.get", get_meal_plan(id)) {
            Ok(plan) => Envelope::success(plan),
            Err(err) => self.fail("meal_plan.get", err),
        }
    }

    /// Validates and creates a meal plan, stamping the current actor.
    pub async fn create_meal_plan(&self, new: NewMealPlan) -> Envelope<MealPlan> {
        let actor = match self.require_actor("meal_plan.create") {
            Ok(actor) => actor,
            Err(envelope) => return envelope,
        };
        if let Err(message) = new.validate() {
            return self.fail("meal_plan.create", BackendError::Validation(message));
        }
        let record = MealPlan::create(new, &actor);
        match with_fallback!(self, "meal_plan.create", insert_meal_plan(&record)) {
            Ok(plan) => Envelope::success(plan),
            Err(err) => self.fail("meal_plan.create", err),
        }
    }

    /// Instantiates a template into a plan for `player_id`.
    ///
    /// The template is read through the same failover path as any other
    /// operation, then the stamped plan is created normally.
    pub async fn create_meal_plan_from_template(
        &self,
        template_id: &str,
        player_id: &str,
    ) -> Envelope<MealPlan> {
        let template = match with_fallback!(self, "template.get", get_template(template_id)) {
            Ok(template) => template,
            Err(err) => return self.fail("meal_plan.from_template", err),
        };
        self.create_meal_plan(template.instantiate_for(player_id)).await
    }

    /// Validates and applies a patch to a meal plan.
    pub async fn update_meal_plan(&self, id: &str, patch: MealPlanPatch) -> Envelope<MealPlan> {
        if let Err(envelope) = self.require_actor::<MealPlan>("meal_plan.update") {
            return envelope;
        }
        if let Err(message) = patch.validate() {
            return self.fail("meal_plan.update", BackendError::Validation(message));
        }
        match with_fallback!(self, "meal_plan.update", update_meal_plan(id, &patch)) {
            Ok(plan) => Envelope::success(plan),
            Err(err) => self.fail("meal_plan.update", err),
        }
    }

    /// Deletes a meal plan; the envelope's data is whether it existed.
    pub async fn delete_meal_plan(&self, id: &str) -> Envelope<bool> {
        if let Err(envelope) = self.require_actor::<bool>("meal_plan.delete") {
            return envelope;
        }
        match with_fallback!(self, "meal_plan.delete", delete_meal_plan(id)) {
            Ok(existed) => Envelope::success(existed),
            Err(err) => self.fail("meal_plan.delete", err),
        }
    }

    /// Aggregate statistics over all meal plans.
    pub async fn meal_plan_stats(&self) -> Envelope<MealPlanStats> {
        match with_fallback!(self, "meal_plan.stats", meal_plan_stats()) {
            Ok(stats) => Envelope::success(stats),
            Err(err) => self.fail("meal_plan.stats", err),
        }
    }

    // Template operations

    /// Lists templates; the envelope's `count` is the total matching rows.
    pub async fn templates(
        &self,
        query: &ListQuery<TemplateFilter>,
    ) -> Envelope<Vec<MealTemplate>> {
        match with_fallback!(self, "template.list", list_templates(query)) {
            Ok(listing) => {
                let count = listing.count();
                Envelope::success_with_count(listing.rows, count)
            }
            Err(err) => self.fail("template.list", err),
        }
    }

    /// Fetches one template by id.
    pub async fn template(&self, id: &str) -> Envelope<MealTemplate> {
        match with_fallback!(self, "template.get", get_template(id)) {
            Ok(template) => Envelope::success(template),
            Err(err) => self.fail("template.get", err),
        }
    }

    /// Validates and creates a template, stamping the current actor.
    pub async fn create_template(&self, new: NewMealTemplate) -> Envelope<MealTemplate> {
        let actor = match self.require_actor("template.create") {
            Ok(actor) => actor,
            Err(envelope) => return envelope,
        };
        if let Err(message) = new.validate() {
            return self.fail("template.create", BackendError::Validation(message));
        }
        let record = MealTemplate::create(new, &actor);
        match with_fallback!(self, "template.create", insert_template(&record)) {
            Ok(template) => Envelope::success(template),
            Err(err) => self.fail("template.create", err),
        }
    }

    /// Validates and applies a patch to a template.
    pub async fn update_template(
        &self,
        id: &str,
        patch: MealTemplatePatch,
    ) -> Envelope<MealTemplate> {
        if let Err(envelope) = self.require_actor::<MealTemplate>("template.update") {
            return envelope;
        }
        if let Err(message) = patch.validate() {
            return self.fail("template.update", BackendError::Validation(message));
        }
        match with_fallback!(self, "template.update", update_template(id, &patch)) {
            Ok(template) => Envelope::success(template),
            Err(err) => self.fail("template.update", err),
        }
    }

    /// Deletes a template; the envelope's data is whether it existed.
    pub async fn delete_template(&self, id: &str) -> Envelope<bool> {
        if let Err(envelope) = self.require_actor::<bool>("template.delete") {
            return envelope;
        }
        match with_fallback!(self, "template.delete", delete_template(id)) {
            Ok(existed) => Envelope::success(existed),
            Err(err) => self.fail("template.delete", err),
        }
    }

    /// Aggregate statistics over all templates.
    pub async fn template_stats(&self) -> Envelope<TemplateStats> {
        match with_fallback!(self, "template.stats", template_stats()) {
            Ok(stats) => Envelope::success(stats),
            Err(err) => self.fail("template.stats", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use axum::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::query::Listing;

    /// Test double for the live backend: delegates to an inner in-memory
    /// store until `fail_with` is set, then fails every call with a clone
    /// of that error. Counts calls that reach it.
    struct ScriptedBackend {
        inner: MockStore,
        fail_with: Mutex<Option<BackendError>>,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn healthy() -> Self {
            ScriptedBackend {
                inner: MockStore::empty(),
                fail_with: Mutex::new(None),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(error: BackendError) -> Self {
            let backend = Self::healthy();
            backend.set_failure(Some(error));
            backend
        }

        fn set_failure(&self, error: Option<BackendError>) {
            *self.fail_with.lock().unwrap() = error;
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    macro_rules! scripted {
        ($self:ident, $method:ident ( $($arg:expr),* )) => {{
            if let Some(err) = $self.fail_with.lock().unwrap().clone() {
                return Err(err);
            }
            $self.calls.fetch_add(1, Ordering::SeqCst);
            $self.inner.$method($($arg),*).await
        }};
    }

    #[async_trait]
    impl Backend for ScriptedBackend {
        async fn list_players(
            &self,
            query: &ListQuery<PlayerFilter>,
        ) -> Result<Listing<Player>, BackendError> {
            scripted!(self, list_players(query))
        }
        async fn get_player(&self, id: &str) -> Result<Player, BackendError> {
            scripted!(self, get_player(id))
        }
        async fn insert_player(&self, player: &Player) -> Result<Player, BackendError> {
            scripted!(self, insert_player(player))
        }
        async fn update_player(
            &self,
            id: &str,
            patch: &PlayerPatch,
        ) -> Result<Player, BackendError> {
            scripted!(self, update_player(id, patch))
        }
        async fn delete_player(&self, id: &str) -> Result<bool, BackendError> {
            scripted!(self, delete_player(id))
        }
        async fn player_stats(&self) -> Result<PlayerStats, BackendError> {
            scripted!(self, player_stats())
        }
        async fn list_meal_plans(
            &self,
            query: &ListQuery<MealPlanFilter>,
        ) -> Result<Listing<MealPlan>, BackendError> {
            scripted!(self, list_meal_plans(query))
        }
        async fn get_meal_plan(&self, id: &str) -> Result<MealPlan, BackendError> {
            scripted!(self, get_meal_plan(id))
        }
        async fn insert_meal_plan(&self, plan: &MealPlan) -> Result<MealPlan, BackendError> {
            scripted!(self, insert_meal_plan(plan))
        }
        async fn update_meal_plan(
            &self,
            id: &str,
            patch: &MealPlanPatch,
        ) -> Result<MealPlan, BackendError> {
            scripted!(self, update_meal_plan(id, patch))
        }
        async fn delete_meal_plan(&self, id: &str) -> Result<bool, BackendError> {
            scripted!(self, delete_meal_plan(id))
        }
        async fn meal_plan_stats(&self) -> Result<MealPlanStats, BackendError> {
            scripted!(self, meal_plan_stats())
        }
        async fn list_templates(
            &self,
            query: &ListQuery<TemplateFilter>,
        ) -> Result<Listing<MealTemplate>, BackendError> {
            scripted!(self, list_templates(query))
        }
        async fn get_template(&self, id: &str) -> Result<MealTemplate, BackendError> {
            scripted!(self, get_template(id))
        }
        async fn insert_template(
            &self,
            template: &MealTemplate,
        ) -> Result<MealTemplate, BackendError> {
            scripted!(self, insert_template(template))
        }
        async fn update_template(
            &self,
            id: &str,
            patch: &MealTemplatePatch,
        ) -> Result<MealTemplate, BackendError> {
            scripted!(self, update_template(id, patch))
        }
        async fn delete_template(&self, id: &str) -> Result<bool, BackendError> {
            scripted!(self, delete_template(id))
        }
        async fn template_stats(&self) -> Result<TemplateStats, BackendError> {
            scripted!(self, template_stats())
        }
    }

    fn service_with(live: Arc<ScriptedBackend>) -> DataService {
        DataService::new(
            live,
            Arc::new(MockStore::seeded()),
            Arc::new(ErrorTracker::new()),
            Arc::new(ActorContext::with_actor("coach-1")),
        )
    }

    fn sample_plan() -> NewMealPlan {
        NewMealPlan {
            player_id: "p1".to_string(),
            title: "T".to_string(),
            description: None,
            meal_type: "dinner".to_string(),
            calories: 2000,
            protein_g: 0,
            carbs_g: 0,
            fat_g: 0,
            template_id: None,
        }
    }

    #[tokio::test]
    async fn infrastructure_failure_falls_back_within_one_call() {
        let live = Arc::new(ScriptedBackend::failing(BackendError::TableMissing(
            "meal_plans".to_string(),
        )));
        let service = service_with(live);

        assert!(!service.is_using_mock_data());
        let envelope = service.meal_plans(&ListQuery::all()).await;

        assert!(envelope.success);
        assert_eq!(envelope.data.as_ref().unwrap().len(), 6);
        assert_eq!(envelope.count, Some(6));
        assert!(service.is_using_mock_data());
    }

    #[tokio::test]
    async fn mock_mode_sticks_without_reprobing_live() {
        let live = Arc::new(ScriptedBackend::failing(BackendError::Unreachable(
            "connection refused".to_string(),
        )));
        let service = service_with(live.clone());

        service.meal_plans(&ListQuery::all()).await;
        assert!(service.is_using_mock_data());

        // Live recovers, but the service must not notice on its own.
        live.set_failure(None);
        let envelope = service.meal_plans(&ListQuery::all()).await;
        assert!(envelope.success);
        assert_eq!(envelope.data.unwrap().len(), 6);
        assert_eq!(live.calls(), 0);
    }

    #[tokio::test]
    async fn business_failure_keeps_live_mode() {
        let live = Arc::new(ScriptedBackend::healthy());
        let service = service_with(live);

        let envelope = service.meal_plan("does-not-exist").await;
        assert!(!envelope.success);
        assert_eq!(envelope.error.as_deref(), Some("not found"));
        assert!(!service.is_using_mock_data());
    }

    #[tokio::test]
    async fn force_and_reset_mode_controls() {
        let live = Arc::new(ScriptedBackend::healthy());
        let service = service_with(live.clone());

        service.force_mock_mode();
        let envelope = service.meal_plans(&ListQuery::all()).await;
        assert_eq!(envelope.data.unwrap().len(), 6);
        assert_eq!(live.calls(), 0);

        service.reset_to_database();
        assert!(!service.is_using_mock_data());
        let envelope = service.meal_plans(&ListQuery::all()).await;
        assert_eq!(envelope.data.unwrap().len(), 0);
        assert_eq!(live.calls(), 1);
    }

    #[tokio::test]
    async fn mock_create_persists_until_reset() {
        let live = Arc::new(ScriptedBackend::healthy());
        let service = service_with(live);

        service.force_mock_mode();
        let created = service.create_meal_plan(sample_plan()).await;
        assert!(created.success);
        let created = created.data.unwrap();
        assert!(!created.id.is_empty());
        assert_eq!(created.created_by, "coach-1");

        let listing = service.meal_plans(&ListQuery::all()).await;
        assert!(listing.data.unwrap().iter().any(|p| p.id == created.id));

        service.reset_to_database();
        let listing = service.meal_plans(&ListQuery::all()).await;
        assert!(!listing.data.unwrap().iter().any(|p| p.id == created.id));
    }

    #[tokio::test]
    async fn create_without_actor_is_authentication_failure() {
        let live = Arc::new(ScriptedBackend::healthy());
        let service = DataService::new(
            live.clone(),
            Arc::new(MockStore::seeded()),
            Arc::new(ErrorTracker::new()),
            Arc::new(ActorContext::anonymous()),
        );

        let envelope = service.create_meal_plan(sample_plan()).await;
        assert!(!envelope.success);
        assert_eq!(envelope.error.as_deref(), Some("not authenticated"));
        assert_eq!(live.calls(), 0);
        assert!(!service.is_using_mock_data());

        let recorded = service.tracker().recent_errors(1);
        assert_eq!(recorded[0].kind, ErrorKind::Authentication);
    }

    #[tokio::test]
    async fn validation_failure_never_reaches_backend() {
        let live = Arc::new(ScriptedBackend::healthy());
        let service = service_with(live.clone());

        let mut bad = sample_plan();
        bad.meal_type = "brunch".to_string();
        let envelope = service.create_meal_plan(bad).await;

        assert!(!envelope.success);
        assert!(envelope.error.unwrap().contains("meal_type"));
        assert_eq!(live.calls(), 0);
        assert!(!service.is_using_mock_data());
    }

    #[tokio::test]
    async fn failover_is_recorded_in_tracker() {
        let live = Arc::new(ScriptedBackend::failing(BackendError::TableMissing(
            r#"relation "meal_plans" does not exist"#.to_string(),
        )));
        let service = service_with(live);

        service.meal_plans(&ListQuery::all()).await;

        let recent = service.tracker().recent_errors(5);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].kind, ErrorKind::Database);
        assert_eq!(recent[0].severity, Severity::High);
        assert_eq!(
            recent[0].context.action.as_deref(),
            Some("meal_plan.list")
        );
    }

    #[tokio::test]
    async fn delete_reports_existence() {
        let live = Arc::new(ScriptedBackend::healthy());
        let service = service_with(live);
        service.force_mock_mode();

        let envelope = service.delete_meal_plan("mp1").await;
        assert_eq!(envelope.data, Some(true));
        let envelope = service.delete_meal_plan("mp1").await;
        assert_eq!(envelope.data, Some(false));
    }

    #[tokio::test]
    async fn create_from_template_links_lineage() {
        let live = Arc::new(ScriptedBackend::healthy());
        let service = service_with(live);
        service.force_mock_mode();

        let envelope = service.create_meal_plan_from_template("t2", "p3").await;
        assert!(envelope.success);
        let plan = envelope.data.unwrap();
        assert_eq!(plan.player_id, "p3");
        assert_eq!(plan.template_id.as_deref(), Some("t2"));
        assert_eq!(plan.title, "Recovery shake");
    }

    #[tokio::test]
    async fn stats_follow_mode() {
        let live = Arc::new(ScriptedBackend::failing(BackendError::Unreachable(
            "down".to_string(),
        )));
        let service = service_with(live);

        let envelope = service.player_stats().await;
        assert!(envelope.success);
        assert_eq!(envelope.data.unwrap().total, 4);
        assert!(service.is_using_mock_data());
    }
}
