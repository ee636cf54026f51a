pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::state::AppState;
use crate::trips::handlers as trips;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        // Auth API
        .route("/api/auth/signup", post(auth::handle_signup))
        .route("/api/auth/login", post(auth::handle_login))
        .route("/api/auth/google", post(auth::handle_provider_login))
        // Trips API (bearer token required)
        .route(
            "/api/trips",
            get(trips::handle_list_trips).post(trips::handle_create_trip),
        )
        .route(
            "/api/trips/:id",
            get(trips::handle_get_trip)
                .put(trips::handle_update_trip)
                .delete(trips::handle_delete_trip),
        )
        .route("/api/trips/:id/generate", post(trips::handle_generate_plan))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::auth::token::TokenKeys;
    use crate::config::{Config, LlmConfig};
    use crate::llm_client::LlmClient;
    use crate::planner::normalizer::NormalizeMode;
    use crate::planner::service::ItineraryService;
    use crate::trips::store::{PgTripStore, TripStore};

    /// State whose pool never connects; only routes that reject before
    /// touching the database can be exercised with it.
    fn offline_state() -> AppState {
        let config = Config {
            database_url: "postgres://localhost/itinera_test".to_string(),
            jwt_secret: "test-secret".to_string(),
            token_ttl_hours: 24,
            llm: LlmConfig {
                api_url: "http://127.0.0.1:9/v1/chat/completions".to_string(),
                api_key: "sk-test".to_string(),
                model: "gpt-4o-mini".to_string(),
                temperature: None,
                timeout: None,
            },
            normalize_mode: NormalizeMode::Lenient,
            port: 0,
            rust_log: "info".to_string(),
        };
        let db = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        let trips: Arc<dyn TripStore> = Arc::new(PgTripStore::new(db.clone()));
        let llm = Arc::new(LlmClient::new(config.llm.clone()).unwrap());
        AppState {
            tokens: TokenKeys::new(&config.jwt_secret, config.token_ttl_hours),
            planner: ItineraryService::new(trips.clone(), llm, config.normalize_mode),
            trips,
            db,
        }
    }

    async fn status_of(request: Request<Body>) -> StatusCode {
        build_router(offline_state())
            .oneshot(request)
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_health_ok() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        assert_eq!(status_of(request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_generate_without_token_is_unauthorized() {
        let request = Request::post(format!("/api/trips/{}/generate", uuid::Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_list_with_bad_token_is_unauthorized() {
        let request = Request::get("/api/trips")
            .header("authorization", "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_sort_rejected_before_query() {
        let state = offline_state();
        let token = state.tokens.issue(uuid::Uuid::new_v4()).unwrap();
        let request = Request::get("/api/trips?sort=password")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let response = build_router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_title_rejected_before_insert() {
        let state = offline_state();
        let token = state.tokens.issue(uuid::Uuid::new_v4()).unwrap();
        let request = Request::post("/api/trips")
            .header("authorization", format!("Bearer {token}"))
            .header("content-type", "application/json")
            .body(Body::from(r#"{"title":"   "}"#))
            .unwrap();
        let response = build_router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
