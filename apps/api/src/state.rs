use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::auth::token::TokenKeys;
use crate::planner::service::ItineraryService;
use crate::trips::store::TripStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub tokens: TokenKeys,
    /// Owner-scoped trip persistence; also held by `planner`.
    pub trips: Arc<dyn TripStore>,
    pub planner: ItineraryService,
}

impl FromRef<AppState> for TokenKeys {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}
