use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api;
use crate::rate_limit::rate_limit_middleware;
use crate::AppState;

const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// TestLab API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "TestLab API",
        version = "1.0.0",
        description = "Code analysis service with an admin panel for AI keys and routing"
    ),
    servers(
        (url = "/", description = "Current server")
    ),
    paths(
        // Health
        api::health::health,
        api::health::status,
        // Setup
        api::setup::handlers::setup_status,
        api::setup::handlers::complete_setup,
        api::setup::handlers::test_database,
        // Auth
        api::auth::handlers::login,
        api::auth::handlers::logout,
        api::auth::handlers::check,
        // Analysis
        api::analyze::handlers::analyze,
        // Admin
        api::admin::handlers::get_config,
        api::admin::handlers::update_config,
        api::admin::handlers::update_settings,
        api::admin::handlers::test_apis,
        api::admin::handlers::get_history,
        // API keys
        api::api_keys::handlers::list_api_keys,
        api::api_keys::handlers::save_api_key,
        // AI routing
        api::ai_routing::handlers::get_routing_config,
        api::ai_routing::handlers::update_routing_config,
        api::ai_routing::handlers::get_routing_stats,
        api::ai_routing::handlers::add_routing_category,
        api::ai_routing::handlers::test_routing,
    ),
    components(schemas(api::common::ErrorResponse, api::common::SuccessResponse)),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and analyzer availability"),
        (name = "Setup", description = "First-run configuration"),
        (name = "Auth", description = "Admin sessions"),
        (name = "Analysis", description = "Run an analyzer over submitted code"),
        (name = "Admin", description = "AI settings and analysis history"),
        (name = "API Keys", description = "AI service keys"),
        (name = "AI Routing", description = "Keyword routing between AI providers"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};

        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_token",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Session-Token"))),
        );
        components.add_security_scheme(
            "cookie_auth",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(
                api::auth::helpers::SESSION_COOKIE,
            ))),
        );
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let analysis = Router::new()
        .route("/analyze/:analyzer", post(api::analyze::analyze))
        .route_layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ));

    let admin = Router::new()
        // Admin panel
        .route(
            "/admin/config",
            get(api::admin::get_config).post(api::admin::update_config),
        )
        .route("/admin/settings", post(api::admin::update_settings))
        .route("/admin/test-apis", post(api::admin::test_apis))
        .route("/admin/history", get(api::admin::get_history))
        .route(
            "/admin/api-keys",
            get(api::api_keys::list_api_keys).post(api::api_keys::save_api_key),
        )
        // AI routing
        .route(
            "/api/ai/keys",
            get(api::api_keys::list_api_keys).post(api::api_keys::save_api_key),
        )
        .route(
            "/api/ai/routing-config",
            get(api::ai_routing::get_routing_config).post(api::ai_routing::update_routing_config),
        )
        .route("/api/ai/routing-stats", get(api::ai_routing::get_routing_stats))
        .route(
            "/api/ai/routing-category",
            post(api::ai_routing::add_routing_category),
        )
        .route("/api/ai/test-routing", post(api::ai_routing::test_routing))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::require_session,
        ));

    Router::new()
        // OpenAPI documentation
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::health))
        .route("/status", get(api::status))
        // Setup endpoints
        .route("/api/setup/status", get(api::setup::setup_status))
        .route("/api/setup/complete", post(api::setup::complete_setup))
        .route("/api/setup/test-database", post(api::setup::test_database))
        // Auth endpoints
        .route("/auth/login", post(api::auth::login))
        .route("/auth/logout", post(api::auth::logout))
        .route("/auth/check", get(api::auth::check))
        .merge(analysis)
        .merge(admin)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(state.settings.frontend_url.as_deref()))
        .with_state(state)
}

fn cors_layer(frontend_url: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-session-token"),
        ])
        .allow_credentials(true);

    let origins: Vec<HeaderValue> = match frontend_url {
        Some(url) => url
            .split(',')
            .filter_map(|origin| origin.trim().parse().ok())
            .collect(),
        None => ["http://localhost:3000", "http://localhost:3001"]
            .into_iter()
            .map(HeaderValue::from_static)
            .collect(),
    };

    cors.allow_origin(AllowOrigin::list(origins))
}
