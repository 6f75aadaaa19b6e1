/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskhive_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config)?;
/// let app = taskhive_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use taskhive_shared::auth::middleware::create_auth_middleware;
use taskhive_shared::email::Mailer;
use taskhive_shared::push::Pusher;

use crate::config::Config;
use crate::routes;

/// Outbound payment-gateway request timeout
const GATEWAY_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; the
/// expensive members are pools and `Arc`s, so clones are cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Transactional email client
    pub mailer: Mailer,

    /// Push notification dispatcher
    pub pusher: Pusher,

    /// Outbound HTTP client for payment gateways
    pub http: reqwest::Client,
}

impl AppState {
    /// Creates application state, building the provider clients from
    /// configuration.
    pub fn new(db: PgPool, config: Config) -> anyhow::Result<Self> {
        let mailer = Mailer::new(&config.email)?;
        let pusher = Pusher::new(&config.push)?;
        let http = reqwest::Client::builder().timeout(GATEWAY_TIMEOUT).build()?;

        Ok(Self {
            db,
            config: Arc::new(config),
            mailer,
            pusher,
            http,
        })
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /                         # Liveness (public)
/// ├── /health                   # Health check with DB ping (public)
/// ├── /v1/
/// │   ├── /auth/                # signup, login, refresh, invite accept (public)
/// │   ├── /companies/           # company CRUD, members, invites (bearer)
/// │   ├── /projects/            # project CRUD (bearer)
/// │   ├── /tasks/               # task lifecycle (bearer)
/// │   ├── /devices/             # device token registration (bearer)
/// │   ├── /notifications/       # direct push send (bearer)
/// │   ├── /orders/              # checkout orders, stats (public)
/// │   └── /payments/            # gateway sessions (public)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Bearer authentication (per-router)
pub fn build_router(state: AppState) -> Router {
    let auth_layer = axum::middleware::from_fn(create_auth_middleware(
        state.db.clone(),
        state.config.jwt.secret.clone(),
    ));

    let health_routes = Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check));

    // Public: identity bootstrap
    let auth_routes = Router::new()
        .route("/signup", post(routes::auth::signup))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/invite/accept", post(routes::auth::accept_invite));

    let company_routes = Router::new()
        .route("/", post(routes::companies::create_company))
        .route("/", get(routes::companies::list_companies))
        .route("/:id", get(routes::companies::get_company))
        .route("/:id", put(routes::companies::update_company))
        .route("/:id", delete(routes::companies::delete_company))
        .route("/:id/members", post(routes::companies::add_member))
        .route("/:id/members", get(routes::companies::list_members))
        .route(
            "/:id/members/:user_id",
            delete(routes::companies::remove_member),
        )
        .route("/:id/invites", post(routes::companies::create_invite))
        .route_layer(auth_layer.clone());

    let project_routes = Router::new()
        .route("/", post(routes::projects::create_project))
        .route("/", get(routes::projects::list_projects))
        .route("/:id", put(routes::projects::update_project))
        .route("/:id", delete(routes::projects::delete_project))
        .route_layer(auth_layer.clone());

    let task_routes = Router::new()
        .route("/", post(routes::tasks::create_task))
        .route("/records", get(routes::tasks::get_records))
        .route("/update-status", put(routes::tasks::update_status))
        .route("/:id", put(routes::tasks::update_task))
        .route("/:id", delete(routes::tasks::delete_task))
        .route_layer(auth_layer.clone());

    let device_routes = Router::new()
        .route("/token", post(routes::devices::save_token))
        .route_layer(auth_layer.clone());

    let notification_routes = Router::new()
        .route("/send", post(routes::notifications::send_notification))
        .route_layer(auth_layer);

    // Public: checkout flow has no account
    let order_routes = Router::new()
        .route("/", post(routes::orders::create_order))
        .route("/", get(routes::orders::list_orders))
        .route("/stats", get(routes::orders::order_stats))
        .route("/abandoned", post(routes::orders::create_abandoned_order))
        .route("/abandoned", get(routes::orders::list_abandoned_orders))
        .route(
            "/abandoned/:id",
            delete(routes::orders::delete_abandoned_order),
        )
        .route(
            "/:id/delivery-status",
            patch(routes::orders::update_delivery_status),
        );

    let payment_routes = Router::new()
        .route("/razorpay/order", post(routes::payments::create_razorpay_order))
        .route(
            "/cashfree/session",
            post(routes::payments::create_cashfree_session),
        )
        .route(
            "/cashfree/:order_id",
            get(routes::payments::cashfree_payment_details),
        );

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/companies", company_routes)
        .nest("/projects", project_routes)
        .nest("/tasks", task_routes)
        .nest("/devices", device_routes)
        .nest("/notifications", notification_routes)
        .nest("/orders", order_routes)
        .nest("/payments", payment_routes);

    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
