//! # Nutriplan: Resilient Data Services for Sports-Nutrition Programs
//!
//! Nutriplan manages the data of a sports-nutrition program - players,
//! meal plans, and reusable meal templates - behind a data-access layer
//! that stays useful when its database is not:
//!
//! - **Uniform envelopes**: every operation resolves to an
//!   [`Envelope`] (`success`/`data`/`error`/`count`), in-process and on the
//!   wire alike.
//! - **Automatic failover**: the [`DataService`] attempts each operation
//!   against the live PostgreSQL backend; on an unambiguous infrastructure
//!   failure (missing relation, unreachable server) it flips to an
//!   in-memory [`MockStore`] and re-serves the same operation within the
//!   same call. Business failures (not found, validation, conflict) surface
//!   normally and never switch modes.
//! - **Explicit mode state**: `Mock` mode persists until
//!   [`DataService::reset_to_database`]; it never reverts on its own, and
//!   [`DataService::is_using_mock_data`] tells the UI when to show its
//!   "Mock Mode" badge.
//! - **Typed error taxonomy**: every failure is classified into an
//!   [`ErrorKind`] with fixed retryability and recovery guidance, and
//!   recorded in a queryable [`ErrorTracker`].
//! - **Race-safe views**: [`MealPlanView`], [`PlayerView`], and
//!   [`TemplateView`] hold the loading/error/mode state a screen renders
//!   and discard the results of superseded in-flight calls.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ HTTP API (axum routers) / CLI (nutrictl)    │
//! ├─────────────────────────────────────────────┤
//! │ Views (loading/error state, stale-call      │
//! │        suppression)                         │
//! ├─────────────────────────────────────────────┤
//! │ DataService (envelopes, validation,         │
//! │              live→mock failover)            │
//! ├─────────────────────────────────────────────┤
//! │ Backend trait                               │
//! │   ├── PgBackend (sqlx / PostgreSQL)         │
//! │   └── MockStore (seeded, in-memory)         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! Wire the service at your composition root and share it by `Arc`:
//!
//! ```rust
//! use std::sync::Arc;
//! use nutriplan::{
//!     ActorContext, DataService, ErrorTracker, ListQuery, MockStore,
//! };
//!
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! // Any Backend works as the live side; here the seeded in-memory store
//! // stands in for PostgreSQL.
//! let live = Arc::new(MockStore::seeded());
//! let service = DataService::new(
//!     live,
//!     Arc::new(MockStore::seeded()),
//!     Arc::new(ErrorTracker::new()),
//!     Arc::new(ActorContext::with_actor("coach-1")),
//! );
//!
//! let envelope = service.players(&ListQuery::all()).await;
//! assert!(envelope.success);
//! assert_eq!(envelope.count, Some(4));
//! assert!(!service.is_using_mock_data());
//! # });
//! ```
//!
//! Classified errors stay available for a "view details" UI:
//!
//! ```rust
//! use nutriplan::{ErrorContext, ErrorKind, ErrorTracker, Severity};
//!
//! let tracker = ErrorTracker::new();
//! let error = tracker.handle_error(
//!     &"connection refused",
//!     ErrorKind::Network,
//!     ErrorContext::now().action("meal_plan.list"),
//!     Severity::High,
//! );
//! assert!(error.retryable);
//! assert_eq!(tracker.get_error(&error.id).unwrap().id, error.id);
//! ```

#![deny(missing_docs)]

mod backend;
mod envelope;
mod errors;
mod meal_plan;
mod mock;
mod player;
mod query;
mod router;
mod service;
mod template;
mod view;

/// Terminal helpers for the nutriplan binaries: program termination and
/// JSON/YAML output formatting.
pub mod cli_utils;

/// Command handlers for the nutrictl CLI application.
pub mod commands;

/// HTTP client for talking to a running nutriplan daemon.
pub mod http_utils;

/// PostgreSQL implementation of the backend boundary.
pub mod sql;

pub use backend::{Backend, BackendError, is_undefined_relation_message};
pub use envelope::Envelope;
pub use errors::{
    AppError, ErrorContext, ErrorKind, ErrorTracker, Guidance, ListenerId, Severity, guidance,
};
pub use meal_plan::{
    FromTemplateRequest, MEAL_TYPES, MealPlan, MealPlanFilter, MealPlanListParams, MealPlanPatch,
    MealPlanStats, NewMealPlan, compare_meal_plans, is_valid_meal_type,
};
pub use mock::MockStore;
pub use player::{
    NewPlayer, Player, PlayerFilter, PlayerListParams, PlayerPatch, PlayerStats, compare_players,
};
pub use query::{ListQuery, Listing, Pagination, SortSpec};
pub use router::{ModeStatus, RecentErrorsParams, create_api_router};
pub use service::{ActorContext, DataService, ServiceMode};
pub use template::{
    MealTemplate, MealTemplatePatch, NewMealTemplate, TemplateFilter, TemplateListParams,
    TemplateStats, compare_templates,
};
pub use view::{MealPlanView, OpTicket, PlayerView, TemplateView, ViewState};
