//! End-to-end behavior of the resilient service: failover, mode stickiness,
//! and mock-only durability.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::async_trait;

use nutriplan::{
    ActorContext, Backend, BackendError, DataService, ErrorKind, ErrorTracker, ListQuery, Listing,
    MealPlan, MealPlanFilter, MealPlanPatch, MealPlanStats, MealPlanView, MealTemplate,
    MealTemplatePatch, MockStore, NewMealPlan, Player, PlayerFilter, PlayerPatch, PlayerStats,
    TemplateFilter, TemplateStats,
};

/// Live-backend double that can be switched between healthy (delegating to
/// an inner in-memory store) and down (failing every call with a
/// missing-relation error).
struct FlakyBackend {
    inner: MockStore,
    healthy: AtomicBool,
}

impl FlakyBackend {
    fn up(inner: MockStore) -> Self {
        FlakyBackend {
            inner,
            healthy: AtomicBool::new(true),
        }
    }

    fn down(inner: MockStore) -> Self {
        FlakyBackend {
            inner,
            healthy: AtomicBool::new(false),
        }
    }

    fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }
}

macro_rules! flaky {
    ($self:ident, $method:ident ( $($arg:expr),* )) => {{
        if !$self.healthy.load(Ordering::SeqCst) {
            return Err(BackendError::TableMissing(
                r#"relation "meal_plans" does not exist"#.to_string(),
            ));
        }
        $self.inner.$method($($arg),*).await
    }};
}

#[async_trait]
impl Backend for FlakyBackend {
    async fn list_players(
        &self,
        query: &ListQuery<PlayerFilter>,
    ) -> Result<Listing<Player>, BackendError> {
        flaky!(self, list_players(query))
    }
    async fn get_player(&self, id: &str) -> Result<Player, BackendError> {
        flaky!(self, get_player(id))
    }
    async fn insert_player(&self, player: &Player) -> Result<Player, BackendError> {
        flaky!(self, insert_player(player))
    }
    async fn update_player(&self, id: &str, patch: &PlayerPatch) -> Result<Player, BackendError> {
        flaky!(self, update_player(id, patch))
    }
    async fn delete_player(&self, id: &str) -> Result<bool, BackendError> {
        flaky!(self, delete_player(id))
    }
    async fn player_stats(&self) -> Result<PlayerStats, BackendError> {
        flaky!(self, player_stats())
    }
    async fn list_meal_plans(
        &self,
        query: &ListQuery<MealPlanFilter>,
    ) -> Result<Listing<MealPlan>, BackendError> {
        flaky!(self, list_meal_plans(query))
    }
    async fn get_meal_plan(&self, id: &str) -> Result<MealPlan, BackendError> {
        flaky!(self, get_meal_plan(id))
    }
    async fn insert_meal_plan(&self, plan: &MealPlan) -> Result<MealPlan, BackendError> {
        flaky!(self, insert_meal_plan(plan))
    }
    async fn update_meal_plan(
        &self,
        id: &str,
        patch: &MealPlanPatch,
    ) -> Result<MealPlan, BackendError> {
        flaky!(self, update_meal_plan(id, patch))
    }
    async fn delete_meal_plan(&self, id: &str) -> Result<bool, BackendError> {
        flaky!(self, delete_meal_plan(id))
    }
    async fn meal_plan_stats(&self) -> Result<MealPlanStats, BackendError> {
        flaky!(self, meal_plan_stats())
    }
    async fn list_templates(
        &self,
        query: &ListQuery<TemplateFilter>,
    ) -> Result<Listing<MealTemplate>, BackendError> {
        flaky!(self, list_templates(query))
    }
    async fn get_template(&self, id: &str) -> Result<MealTemplate, BackendError> {
        flaky!(self, get_template(id))
    }
    async fn insert_template(
        &self,
        template: &MealTemplate,
    ) -> Result<MealTemplate, BackendError> {
        flaky!(self, insert_template(template))
    }
    async fn update_template(
        &self,
        id: &str,
        patch: &MealTemplatePatch,
    ) -> Result<MealTemplate, BackendError> {
        flaky!(self, update_template(id, patch))
    }
    async fn delete_template(&self, id: &str) -> Result<bool, BackendError> {
        flaky!(self, delete_template(id))
    }
    async fn template_stats(&self) -> Result<TemplateStats, BackendError> {
        flaky!(self, template_stats())
    }
}

fn service_over(live: Arc<FlakyBackend>) -> Arc<DataService> {
    Arc::new(DataService::new(
        live,
        Arc::new(MockStore::seeded()),
        Arc::new(ErrorTracker::new()),
        Arc::new(ActorContext::with_actor("coach-1")),
    ))
}

fn minimal_plan() -> NewMealPlan {
    serde_json::from_str(r#"{"player_id":"p1","title":"T","calories":2000}"#).unwrap()
}

#[tokio::test]
async fn infrastructure_failure_serves_mock_data_transparently() {
    let service = service_over(Arc::new(FlakyBackend::down(MockStore::empty())));
    assert!(!service.is_using_mock_data());

    let envelope = service.meal_plans(&ListQuery::all()).await;

    assert!(envelope.success);
    assert_eq!(envelope.data.unwrap().len(), 6);
    assert!(service.is_using_mock_data());
}

#[tokio::test]
async fn business_failure_is_a_failed_envelope_in_live_mode() {
    let service = service_over(Arc::new(FlakyBackend::up(MockStore::empty())));

    let envelope = service.meal_plan("nope").await;

    assert!(!envelope.success);
    assert_eq!(envelope.error.as_deref(), Some("not found"));
    assert!(!service.is_using_mock_data());
}

#[tokio::test]
async fn forced_mock_mode_sticks_until_reset() {
    let live_data = MockStore::empty();
    let service = service_over(Arc::new(FlakyBackend::up(live_data)));

    service.force_mock_mode();
    let envelope = service.meal_plans(&ListQuery::all()).await;
    assert_eq!(envelope.data.unwrap().len(), 6);

    // Still mock, even though the live side would succeed.
    assert!(service.is_using_mock_data());

    service.reset_to_database();
    assert!(!service.is_using_mock_data());
    let envelope = service.meal_plans(&ListQuery::all()).await;
    assert_eq!(envelope.data.unwrap().len(), 0);
}

#[tokio::test]
async fn recovery_is_never_automatic() {
    let live = Arc::new(FlakyBackend::down(MockStore::empty()));
    let service = service_over(live.clone());

    service.meal_plans(&ListQuery::all()).await;
    assert!(service.is_using_mock_data());

    live.set_healthy(true);
    service.meal_plans(&ListQuery::all()).await;
    assert!(service.is_using_mock_data());

    service.reset_to_database();
    let envelope = service.meal_plans(&ListQuery::all()).await;
    assert!(envelope.success);
    assert!(!service.is_using_mock_data());
}

#[tokio::test]
async fn failover_records_error_but_caller_sees_success() {
    let service = service_over(Arc::new(FlakyBackend::down(MockStore::empty())));

    let envelope = service.meal_plans(&ListQuery::all()).await;
    assert!(envelope.success);

    let recorded = service.tracker().recent_errors(10);
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].kind, ErrorKind::Database);
    assert!(recorded[0].raw_message.contains("does not exist"));
}

#[tokio::test]
async fn mock_writes_last_for_the_service_lifetime_only() {
    let service = service_over(Arc::new(FlakyBackend::up(MockStore::empty())));
    service.force_mock_mode();

    let created = service.create_meal_plan(minimal_plan()).await;
    assert!(created.success);
    let created = created.data.unwrap();
    assert!(!created.id.is_empty());

    let listing = service.meal_plans(&ListQuery::all()).await;
    assert!(listing.data.unwrap().iter().any(|p| p.id == created.id));

    service.reset_to_database();
    let listing = service.meal_plans(&ListQuery::all()).await;
    assert!(!listing.data.unwrap().iter().any(|p| p.id == created.id));
}

#[tokio::test]
async fn view_over_failing_service_reports_and_dismisses_error() {
    let service = service_over(Arc::new(FlakyBackend::up(MockStore::empty())));
    let view = MealPlanView::new(service);

    assert!(view.plan("nope").await.is_none());
    assert_eq!(view.error().as_deref(), Some("not found"));
    assert!(!view.is_loading());

    view.clear_error();
    assert!(view.error().is_none());
    assert!(!view.is_loading());
    assert!(!view.using_mock_data());
}

#[tokio::test]
async fn view_surfaces_mode_after_failover() {
    let service = service_over(Arc::new(FlakyBackend::down(MockStore::empty())));
    let view = MealPlanView::new(service);
    assert!(!view.using_mock_data());

    let rows = view.plans(&ListQuery::all()).await;
    assert_eq!(rows.unwrap().len(), 6);
    assert!(view.using_mock_data());
}
