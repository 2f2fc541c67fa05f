// Siren API server
//
// Role-gated alert lifecycle over Postgres: producers write alerts, staff
// dashboards subscribe to the live feed, transitions fan back out through
// the same feed. Summarization is optional at startup and the gated alert
// flow fails cleanly when it is not configured.

mod alerts;
mod common;
mod error;
mod feed;
mod medical;
mod notifications;
mod services;
mod users;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use siren_core::Summarizer;
use siren_openai::OpenAiSummarizer;
use siren_storage::Database;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    summarizer: bool,
}

/// State for the health endpoint
#[derive(Clone)]
struct HealthState {
    summarizer_configured: bool,
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        summarizer: state.summarizer_configured,
    })
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        alerts::submit_alert,
        alerts::list_alerts,
        alerts::list_history,
        alerts::get_alert,
        alerts::transition_alert,
        feed::stream_feed,
        feed::list_feed,
        notifications::push_notification,
        notifications::list_notifications,
        notifications::claim_notification,
        medical::get_history,
        medical::replace_history,
        users::create_user,
        users::get_user,
        users::update_user,
    ),
    components(
        schemas(
            siren_core::Alert,
            siren_core::AlertStatus,
            siren_core::AlertEvent,
            siren_core::AlertEventKind,
            siren_core::Role,
            siren_core::MedicalHistory,
            siren_core::Allergy,
            siren_core::AllergySeverity,
            siren_core::Medication,
            siren_core::Condition,
            siren_core::ConditionStatus,
            siren_core::EmergencyContact,
            alerts::SubmitAlertRequest,
            alerts::TransitionRequest,
            alerts::TransitionResponse,
            feed::FeedPage,
            notifications::PushNotificationRequest,
            notifications::Notification,
            users::User,
            users::CreateUserRequest,
            users::UpdateUserRequest,
            error::ErrorBody,
        )
    ),
    tags(
        (name = "alerts", description = "Alert lifecycle endpoints"),
        (name = "feed", description = "Alert feed endpoints (SSE live query)"),
        (name = "notifications", description = "Secondary notification channel"),
        (name = "medical-history", description = "Per-user medical history"),
        (name = "users", description = "User profile endpoints")
    ),
    info(
        title = "Siren API",
        version = "0.3.0",
        description = "Employee emergency alert lifecycle: producers, role-gated live feeds, transitions",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "siren_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("siren-api starting...");

    // Initialize database
    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL environment variable required")?;
    let db = Database::from_url(&database_url)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.context("Failed to run migrations")?;
    tracing::info!("Connected to database");

    let db = Arc::new(db);

    // Summarizer is optional: without it the gated alert flow returns a
    // specific error and the non-gated flow keeps working
    let summarizer: Option<Arc<dyn Summarizer>> = match OpenAiSummarizer::from_env() {
        Ok(s) => {
            tracing::info!("Summarization provider configured");
            Some(Arc::new(s))
        }
        Err(e) => {
            tracing::warn!(
                "Summarization not configured ({}). Gated alert submissions will fail.",
                e
            );
            None
        }
    };
    let summarizer_configured = summarizer.is_some();

    // Create module-specific states
    let alerts_state = alerts::AppState::new(db.clone(), summarizer);
    let feed_state = feed::AppState::new(db.clone());
    let notifications_state = notifications::AppState::new(db.clone());
    let medical_state = medical::AppState::new(db.clone());
    let users_state = users::AppState::new(db.clone());
    let health_state = HealthState {
        summarizer_configured,
    };

    // Load API prefix from environment (default: empty)
    // Example: API_PREFIX="/api" results in routes like /api/v1/alerts
    let api_prefix = std::env::var("API_PREFIX").unwrap_or_default();
    if !api_prefix.is_empty() {
        tracing::info!(prefix = %api_prefix, "API prefix configured");
    }

    // Load CORS allowed origins from environment (optional)
    // Only needed when the UI is served from a different origin than the API
    let cors_origins: Vec<HeaderValue> = std::env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .filter(|s| !s.is_empty())
        .map(|s| s.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();

    if cors_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
    } else {
        tracing::info!(origins = ?cors_origins, "CORS origins configured");
    }

    // Build API routes
    // Note: feed routes must be merged BEFORE alerts because
    // /v1/alerts/feed is more specific than /v1/alerts/{alert_id}
    let api_routes = Router::new()
        .merge(feed::routes(feed_state))
        .merge(alerts::routes(alerts_state))
        .merge(notifications::routes(notifications_state))
        .merge(medical::routes(medical_state))
        .merge(users::routes(users_state));

    let mut app = Router::new().route("/health", get(health).with_state(health_state));

    // Apply API prefix if configured
    app = app.merge(build_router_with_prefix(api_routes, &api_prefix));

    // Add Swagger UI
    let app =
        app.merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    // Add CORS layer only if origins are configured
    let app = if !cors_origins.is_empty() {
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::ORIGIN,
                    header::CACHE_CONTROL,
                ])
                .allow_credentials(true),
        )
    } else {
        app
    };

    // Add tracing
    let app = app.layer(TraceLayer::new_for_http());

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:9000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Build router with optional API prefix (extracted for testing)
fn build_router_with_prefix<S: Clone + Send + Sync + 'static>(
    api_routes: Router<S>,
    api_prefix: &str,
) -> Router<S> {
    if api_prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(api_prefix, api_routes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_routes() -> Router {
        Router::new().route("/v1/test", get(|| async { "ok" }))
    }

    #[tokio::test]
    async fn test_api_prefix_empty() {
        let app = build_router_with_prefix(test_routes(), "");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_api_prefix_set() {
        let app = build_router_with_prefix(test_routes(), "/api");

        // Route should work with prefix
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 200);

        // Route should NOT work without prefix
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 404);
    }
}
