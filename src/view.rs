//! # Views
//!
//! Stateful, UI-facing facades over [`DataService`](crate::DataService).
//! A view holds the observable state a screen renders - `loading`, a
//! dismissable `error` string, the `using_mock_data` badge flag, and the
//! last fetched rows - and exposes imperative async operations that never
//! panic and never return errors: failures come back as `None`/`false` with
//! the error string left in view state.
//!
//! ## Stale-result suppression
//!
//! Every operation takes a ticket from a monotonically increasing sequence
//! counter when it starts. When it completes, its state updates are applied
//! only if no newer operation has started in the meantime; a superseded
//! operation's outcome is silently dropped (its return value still reaches
//! the direct caller). This keeps rapid-fire operations - fast filter
//! changes, double-clicks - from racing each other in the UI, without
//! depending on any particular UI framework's re-render machinery.

use std::sync::{Arc, Mutex};

use crate::envelope::Envelope;
use crate::meal_plan::{MealPlan, MealPlanFilter, MealPlanPatch, MealPlanStats, NewMealPlan};
use crate::player::{NewPlayer, Player, PlayerFilter, PlayerPatch, PlayerStats};
use crate::query::ListQuery;
use crate::service::DataService;
use crate::template::{
    MealTemplate, MealTemplatePatch, NewMealTemplate, TemplateFilter, TemplateStats,
};

/////////////////////////////////////////////// ViewState //////////////////////////////////////////////

/// Ticket identifying one in-flight operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpTicket(u64);

#[derive(Debug)]
struct ViewInner {
    seq: u64,
    loading: bool,
    error: Option<String>,
    using_mock_data: bool,
}

/// Observable state shared by every view: loading/error/mode flags plus the
/// sequence counter implementing stale-result suppression.
#[derive(Debug)]
pub struct ViewState {
    inner: Mutex<ViewInner>,
}

impl ViewState {
    /// Creates idle state with the given initial mode flag.
    pub fn new(using_mock_data: bool) -> Self {
        ViewState {
            inner: Mutex::new(ViewInner {
                seq: 0,
                loading: false,
                error: None,
                using_mock_data,
            }),
        }
    }

    /// Marks an operation started: bumps the sequence, sets `loading`,
    /// clears `error`. Returns the ticket the operation must present on
    /// completion.
    pub fn begin(&self) -> OpTicket {
        let mut inner = self.inner.lock().unwrap();
        inner.seq += 1;
        inner.loading = true;
        inner.error = None;
        OpTicket(inner.seq)
    }

    /// Applies an operation's outcome if it is still the newest.
    ///
    /// Returns whether the update was applied; a stale ticket leaves all
    /// observable state untouched.
    pub fn complete(&self, ticket: OpTicket, error: Option<String>, using_mock_data: bool) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if ticket.0 != inner.seq {
            return false;
        }
        inner.loading = false;
        inner.error = error;
        inner.using_mock_data = using_mock_data;
        true
    }

    /// Whether an operation is in flight.
    pub fn is_loading(&self) -> bool {
        self.inner.lock().unwrap().loading
    }

    /// The current error message, if any.
    pub fn error(&self) -> Option<String> {
        self.inner.lock().unwrap().error.clone()
    }

    /// Whether results are currently served from the mock store.
    pub fn using_mock_data(&self) -> bool {
        self.inner.lock().unwrap().using_mock_data
    }

    /// Dismisses the error message; touches nothing else.
    pub fn clear_error(&self) {
        self.inner.lock().unwrap().error = None;
    }

    /// Resyncs the mode flag; touches nothing else.
    pub fn sync_mode(&self, using_mock_data: bool) {
        self.inner.lock().unwrap().using_mock_data = using_mock_data;
    }
}

macro_rules! view_common {
    () => {
        /// Whether an operation is in flight.
        pub fn is_loading(&self) -> bool {
            self.state.is_loading()
        }

        /// The current error message, if any. Already human-readable; the
        /// structured detail lives in the service's error tracker.
        pub fn error(&self) -> Option<String> {
            self.state.error()
        }

        /// Whether results are currently served from the mock store.
        pub fn using_mock_data(&self) -> bool {
            self.state.using_mock_data()
        }

        /// Dismisses the error message without any other effect.
        pub fn clear_error(&self) {
            self.state.clear_error()
        }

        /// Switches the underlying service to the mock store and resyncs
        /// the mode flag immediately.
        pub fn force_mock_mode(&self) {
            self.service.force_mock_mode();
            self.state.sync_mode(self.service.is_using_mock_data());
        }

        /// Returns the underlying service to the live backend and resyncs
        /// the mode flag immediately.
        pub fn reset_to_database(&self) {
            self.service.reset_to_database();
            self.state.sync_mode(self.service.is_using_mock_data());
        }

        fn finish<T>(&self, ticket: OpTicket, envelope: &Envelope<T>) -> bool {
            self.state.complete(
                ticket,
                envelope.error.clone(),
                self.service.is_using_mock_data(),
            )
        }
    };
}

/////////////////////////////////////////////// MealPlanView ///////////////////////////////////////////

/// View over meal-plan operations.
pub struct MealPlanView {
    service: Arc<DataService>,
    state: ViewState,
    rows: Mutex<Vec<MealPlan>>,
}

impl MealPlanView {
    /// Creates a view over `service`.
    pub fn new(service: Arc<DataService>) -> Self {
        let using_mock = service.is_using_mock_data();
        MealPlanView {
            service,
            state: ViewState::new(using_mock),
            rows: Mutex::new(Vec::new()),
        }
    }

    view_common!();

    /// The rows from the newest completed list operation.
    pub fn rows(&self) -> Vec<MealPlan> {
        self.rows.lock().unwrap().clone()
    }

    /// Fetches meal plans; `None` on failure.
    pub async fn plans(&self, query: &ListQuery<MealPlanFilter>) -> Option<Vec<MealPlan>> {
        let ticket = self.state.begin();
        let envelope = self.service.meal_plans(query).await;
        if self.finish(ticket, &envelope) && envelope.success {
            *self.rows.lock().unwrap() = envelope.data.clone().unwrap_or_default();
        }
        envelope.data
    }

    /// Fetches one meal plan; `None` on failure.
    pub async fn plan(&self, id: &str) -> Option<MealPlan> {
        let ticket = self.state.begin();
        let envelope = self.service.meal_plan(id).await;
        self.finish(ticket, &envelope);
        envelope.data
    }

    /// Creates a meal plan; `None` on failure.
    pub async fn create(&self, new: NewMealPlan) -> Option<MealPlan> {
        let ticket = self.state.begin();
        let envelope = self.service.create_meal_plan(new).await;
        self.finish(ticket, &envelope);
        envelope.data
    }

    /// Instantiates a template into a plan; `None` on failure.
    pub async fn create_from_template(
        &self,
        template_id: &str,
        player_id: &str,
    ) -> Option<MealPlan> {
        let ticket = self.state.begin();
        let envelope = self
            .service
            .create_meal_plan_from_template(template_id, player_id)
            .await;
        self.finish(ticket, &envelope);
        envelope.data
    }

    /// Updates a meal plan; `None` on failure.
    pub async fn update(&self, id: &str, patch: MealPlanPatch) -> Option<MealPlan> {
        let ticket = self.state.begin();
        let envelope = self.service.update_meal_plan(id, patch).await;
        self.finish(ticket, &envelope);
        envelope.data
    }

    /// Deletes a meal plan; `false` on failure or when it did not exist.
    pub async fn remove(&self, id: &str) -> bool {
        let ticket = self.state.begin();
        let envelope = self.service.delete_meal_plan(id).await;
        self.finish(ticket, &envelope);
        envelope.data.unwrap_or(false)
    }

    /// Fetches aggregate statistics; `None` on failure.
    pub async fn stats(&self) -> Option<MealPlanStats> {
        let ticket = self.state.begin();
        let envelope = self.service.meal_plan_stats().await;
        self.finish(ticket, &envelope);
        envelope.data
    }
}

/////////////////////////////////////////////// PlayerView /////////////////////////////////////////////

/// View over player operations.
pub struct PlayerView {
    service: Arc<DataService>,
    state: ViewState,
    rows: Mutex<Vec<Player>>,
}

impl PlayerView {
    /// Creates a view over `service`.
    pub fn new(service: Arc<DataService>) -> Self {
        let using_mock = service.is_using_mock_data();
        PlayerView {
            service,
            state: ViewState::new(using_mock),
            rows: Mutex::new(Vec::new()),
        }
    }

    view_common!();

    /// The rows from the newest completed list operation.
    pub fn rows(&self) -> Vec<Player> {
        self.rows.lock().unwrap().clone()
    }

    /// Fetches players; `None` on failure.
    pub async fn players(&self, query: &ListQuery<PlayerFilter>) -> Option<Vec<Player>> {
        let ticket = self.state.begin();
        let envelope = self.service.players(query).await;
        if self.finish(ticket, &envelope) && envelope.success {
            *self.rows.lock().unwrap() = envelope.data.clone().unwrap_or_default();
        }
        envelope.data
    }

    /// Fetches one player; `None` on failure.
    pub async fn player(&self, id: &str) -> Option<Player> {
        let ticket = self.state.begin();
        let envelope = self.service.player(id).await;
        self.finish(ticket, &envelope);
        envelope.data
    }

    /// Creates a player; `None` on failure.
    pub async fn create(&self, new: NewPlayer) -> Option<Player> {
        let ticket = self.state.begin();
        let envelope = self.service.create_player(new).await;
        self.finish(ticket, &envelope);
        envelope.data
    }

    /// Updates a player; `None` on failure.
    pub async fn update(&self, id: &str, patch: PlayerPatch) -> Option<Player> {
        let ticket = self.state.begin();
        let envelope = self.service.update_player(id, patch).await;
        self.finish(ticket, &envelope);
        envelope.data
    }

    /// Deletes a player; `false` on failure or when it did not exist.
    pub async fn remove(&self, id: &str) -> bool {
        let ticket = self.state.begin();
        let envelope = self.service.delete_player(id).await;
        self.finish(ticket, &envelope);
        envelope.data.unwrap_or(false)
    }

    /// Fetches aggregate statistics; `None` on failure.
    pub async fn stats(&self) -> Option<PlayerStats> {
        let ticket = self.state.begin();
        let envelope = self.service.player_stats().await;
        self.finish(ticket, &envelope);
        envelope.data
    }
}

/////////////////////////////////////////////// TemplateView ///////////////////////////////////////////

/// View over template operations.
pub struct TemplateView {
    service: Arc<DataService>,
    state: ViewState,
    rows: Mutex<Vec<MealTemplate>>,
}

impl TemplateView {
    /// Creates a view over `service`.
    pub fn new(service: Arc<DataService>) -> Self {
        let using_mock = service.is_using_mock_data();
        TemplateView {
            service,
            state: ViewState::new(using_mock),
            rows: Mutex::new(Vec::new()),
        }
    }

    view_common!();

    /// The rows from the newest completed list operation.
    pub fn rows(&self) -> Vec<MealTemplate> {
        self.rows.lock().unwrap().clone()
    }

    /// Fetches templates; `None` on failure.
    pub async fn templates(&self, query: &ListQuery<TemplateFilter>) -> Option<Vec<MealTemplate>> {
        let ticket = self.state.begin();
        let envelope = self.service.templates(query).await;
        if self.finish(ticket, &envelope) && envelope.success {
            *self.rows.lock().unwrap() = envelope.data.clone().unwrap_or_default();
        }
        envelope.data
    }

    /// Fetches one template; `None` on failure.
    pub async fn template(&self, id: &str) -> Option<MealTemplate> {
        let ticket = self.state.begin();
        let envelope = self.service.template(id).await;
        self.finish(ticket, &envelope);
        envelope.data
    }

    /// Creates a template; `None` on failure.
    pub async fn create(&self, new: NewMealTemplate) -> Option<MealTemplate> {
        let ticket = self.state.begin();
        let envelope = self.service.create_template(new).await;
        self.finish(ticket, &envelope);
        envelope.data
    }

    /// Updates a template; `None` on failure.
    pub async fn update(&self, id: &str, patch: MealTemplatePatch) -> Option<MealTemplate> {
        let ticket = self.state.begin();
        let envelope = self.service.update_template(id, patch).await;
        self.finish(ticket, &envelope);
        envelope.data
    }

    /// Deletes a template; `false` on failure or when it did not exist.
    pub async fn remove(&self, id: &str) -> bool {
        let ticket = self.state.begin();
        let envelope = self.service.delete_template(id).await;
        self.finish(ticket, &envelope);
        envelope.data.unwrap_or(false)
    }

    /// Fetches aggregate statistics; `None` on failure.
    pub async fn stats(&self) -> Option<TemplateStats> {
        let ticket = self.state.begin();
        let envelope = self.service.template_stats().await;
        self.finish(ticket, &envelope);
        envelope.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::async_trait;
    use std::collections::VecDeque;
    use std::time::Duration;

    use crate::backend::{Backend, BackendError};
    use crate::errors::ErrorTracker;
    use crate::mock::MockStore;
    use crate::query::Listing;
    use crate::service::ActorContext;

    /// Live-backend double whose meal-plan list calls sleep for scripted
    /// durations before answering from an inner seeded store. Everything
    /// else answers immediately.
    struct SlowListBackend {
        inner: MockStore,
        delays: Mutex<VecDeque<Duration>>,
    }

    impl SlowListBackend {
        fn new(delays: Vec<Duration>) -> Self {
            SlowListBackend {
                inner: MockStore::seeded(),
                delays: Mutex::new(delays.into()),
            }
        }
    }

    macro_rules! delegate {
        ($self:ident, $method:ident ( $($arg:expr),* )) => {
            $self.inner.$method($($arg),*).await
        };
    }

    #[async_trait]
    impl Backend for SlowListBackend {
        async fn list_players(
            &self,
            query: &ListQuery<PlayerFilter>,
        ) -> Result<Listing<Player>, BackendError> {
            delegate!(self, list_players(query))
        }
        async fn get_player(&self, id: &str) -> Result<Player, BackendError> {
            delegate!(self, get_player(id))
        }
        async fn insert_player(&self, player: &Player) -> Result<Player, BackendError> {
            delegate!(self, insert_player(player))
        }
        async fn update_player(
            &self,
            id: &str,
            patch: &PlayerPatch,
        ) -> Result<Player, BackendError> {
            delegate!(self, update_player(id, patch))
        }
        async fn delete_player(&self, id: &str) -> Result<bool, BackendError> {
            delegate!(self, delete_player(id))
        }
        async fn player_stats(&self) -> Result<PlayerStats, BackendError> {
            delegate!(self, player_stats())
        }
        async fn list_meal_plans(
            &self,
            query: &ListQuery<MealPlanFilter>,
        ) -> Result<Listing<MealPlan>, BackendError> {
            let delay = self.delays.lock().unwrap().pop_front();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            delegate!(self, list_meal_plans(query))
        }
        async fn get_meal_plan(&self, id: &str) -> Result<MealPlan, BackendError> {
            delegate!(self, get_meal_plan(id))
        }
        async fn insert_meal_plan(&self, plan: &MealPlan) -> Result<MealPlan, BackendError> {
            delegate!(self, insert_meal_plan(plan))
        }
        async fn update_meal_plan(
            &self,
            id: &str,
            patch: &MealPlanPatch,
        ) -> Result<MealPlan, BackendError> {
            delegate!(self, update_meal_plan(id, patch))
        }
        async fn delete_meal_plan(&self, id: &str) -> Result<bool, BackendError> {
            delegate!(self, delete_meal_plan(id))
        }
        async fn meal_plan_stats(&self) -> Result<MealPlanStats, BackendError> {
            delegate!(self, meal_plan_stats())
        }
        async fn list_templates(
            &self,
            query: &ListQuery<TemplateFilter>,
        ) -> Result<Listing<MealTemplate>, BackendError> {
            delegate!(self, list_templates(query))
        }
        async fn get_template(&self, id: &str) -> Result<MealTemplate, BackendError> {
            delegate!(self, get_template(id))
        }
        async fn insert_template(
            &self,
            template: &MealTemplate,
        ) -> Result<MealTemplate, BackendError> {
            delegate!(self, insert_template(template))
        }
        async fn update_template(
            &self,
            id: &str,
            patch: &MealTemplatePatch,
        ) -> Result<MealTemplate, BackendError> {
            delegate!(self, update_template(id, patch))
        }
        async fn delete_template(&self, id: &str) -> Result<bool, BackendError> {
            delegate!(self, delete_template(id))
        }
        async fn template_stats(&self) -> Result<TemplateStats, BackendError> {
            delegate!(self, template_stats())
        }
    }

    fn service_over(backend: Arc<SlowListBackend>) -> Arc<DataService> {
        Arc::new(DataService::new(
            backend,
            Arc::new(MockStore::seeded()),
            Arc::new(ErrorTracker::new()),
            Arc::new(ActorContext::with_actor("coach-1")),
        ))
    }

    fn quiet_service() -> Arc<DataService> {
        service_over(Arc::new(SlowListBackend::new(Vec::new())))
    }

    #[tokio::test]
    async fn successful_fetch_clears_loading_and_error() {
        let view = MealPlanView::new(quiet_service());

        let rows = view.plans(&ListQuery::all()).await;
        assert_eq!(rows.unwrap().len(), 6);
        assert!(!view.is_loading());
        assert!(view.error().is_none());
        assert_eq!(view.rows().len(), 6);
    }

    #[tokio::test]
    async fn failure_sets_error_and_returns_none() {
        let view = MealPlanView::new(quiet_service());

        let result = view.plan("missing").await;
        assert!(result.is_none());
        assert!(!view.is_loading());
        assert_eq!(view.error().as_deref(), Some("not found"));
    }

    #[tokio::test]
    async fn clear_error_touches_nothing_else() {
        let view = MealPlanView::new(quiet_service());
        view.plan("missing").await;
        assert!(view.error().is_some());

        let loading_before = view.is_loading();
        let mode_before = view.using_mock_data();
        view.clear_error();

        assert!(view.error().is_none());
        assert_eq!(view.is_loading(), loading_before);
        assert_eq!(view.using_mock_data(), mode_before);
    }

    #[tokio::test]
    async fn remove_returns_bool_sentinel() {
        let view = MealPlanView::new(quiet_service());
        assert!(view.remove("mp1").await);
        assert!(!view.remove("mp1").await);
    }

    #[tokio::test]
    async fn mode_passthrough_resyncs_flag() {
        let view = MealPlanView::new(quiet_service());
        assert!(!view.using_mock_data());

        view.force_mock_mode();
        assert!(view.using_mock_data());

        view.reset_to_database();
        assert!(!view.using_mock_data());
    }

    #[tokio::test(start_paused = true)]
    async fn newer_call_wins_regardless_of_completion_order() {
        // First list call stalls long enough for the second to start and
        // finish; the first call's state updates must be dropped.
        let backend = Arc::new(SlowListBackend::new(vec![
            Duration::from_millis(200),
            Duration::from_millis(10),
        ]));
        let view = Arc::new(MealPlanView::new(service_over(backend)));

        let filter_a = ListQuery::filtered(MealPlanFilter {
            search: Some("matchday".to_string()),
            ..MealPlanFilter::default()
        });
        let filter_b = ListQuery::filtered(MealPlanFilter {
            search: Some("academy".to_string()),
            ..MealPlanFilter::default()
        });

        let view_a = view.clone();
        let first = tokio::spawn(async move { view_a.plans(&filter_a).await });
        tokio::task::yield_now().await;

        let view_b = view.clone();
        let second = tokio::spawn(async move { view_b.plans(&filter_b).await });

        let first_rows = first.await.unwrap();
        let second_rows = second.await.unwrap();

        // Both callers still get their own data...
        assert_eq!(first_rows.unwrap()[0].title, "Matchday fuel");
        assert_eq!(second_rows.as_ref().unwrap()[0].title, "Academy lunch");

        // ...but observable state reflects only the newer call.
        let rows = view.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Academy lunch");
        assert!(!view.is_loading());
        assert!(view.error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_failure_does_not_overwrite_newer_success() {
        // A slow list is superseded by a fast failing get: the get's error
        // must stick even though the list completes afterwards with a
        // success.
        let backend = Arc::new(SlowListBackend::new(vec![Duration::from_millis(200)]));
        let view = Arc::new(MealPlanView::new(service_over(backend)));

        let view_list = view.clone();
        let list_call = tokio::spawn(async move { view_list.plans(&ListQuery::all()).await });
        tokio::task::yield_now().await;

        let view_get = view.clone();
        let get_call = tokio::spawn(async move { view_get.plan("missing").await });

        assert!(get_call.await.unwrap().is_none());
        assert!(list_call.await.unwrap().is_some());

        assert_eq!(view.error().as_deref(), Some("not found"));
        assert!(!view.is_loading());
    }

    #[tokio::test]
    async fn player_and_template_views_share_behavior() {
        let service = quiet_service();
        let players = PlayerView::new(service.clone());
        let templates = TemplateView::new(service);

        let listed = players.players(&ListQuery::all()).await.unwrap();
        assert_eq!(listed.len(), 4);
        assert_eq!(players.rows().len(), 4);

        let stats = templates.stats().await.unwrap();
        assert_eq!(stats.total, 4);
        assert!(templates.error().is_none());
    }
}
