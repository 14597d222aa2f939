//! Leadflow API composition root.

#![forbid(unsafe_code)]

mod auth;
mod dto;
mod error;
mod events;
mod handlers;
mod middleware;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use leadflow_application::{
    ActivityRepository, ActivityService, AnalyticsService, ChangeNotifier, LeadRepository,
    LeadService, UserRepository, UserService,
};
use leadflow_core::AppError;
use leadflow_infrastructure::{
    Argon2PasswordHasher, PostgresActivityRepository, PostgresLeadRepository,
    PostgresUserRepository,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::events::EventBroadcaster;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

    let database_url = required_env("DATABASE_URL")?;
    let frontend_url =
        env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001);
    let cookie_secure = env::var("SESSION_COOKIE_SECURE")
        .unwrap_or_else(|_| "false".to_owned())
        .eq_ignore_ascii_case("true");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let session_store = PostgresStore::new(pool.clone())
        .with_table_name("tower_sessions")
        .map_err(|error| {
            AppError::Validation(format!("invalid session table name configuration: {error}"))
        })?;
    session_store.migrate().await.map_err(|error| {
        AppError::Internal(format!("failed to initialize session store: {error}"))
    })?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::hours(8)));

    // Repositories and the change broadcaster.
    let user_repository: Arc<dyn UserRepository> =
        Arc::new(PostgresUserRepository::new(pool.clone()));
    let lead_repository: Arc<dyn LeadRepository> =
        Arc::new(PostgresLeadRepository::new(pool.clone()));
    let activity_repository: Arc<dyn ActivityRepository> =
        Arc::new(PostgresActivityRepository::new(pool.clone()));
    let password_hasher = Arc::new(Argon2PasswordHasher::new());
    let events = EventBroadcaster::new();
    let notifier: Arc<dyn ChangeNotifier> = Arc::new(events.clone());

    // Application services.
    let user_service = UserService::new(user_repository.clone(), password_hasher);
    let lead_service = LeadService::new(
        lead_repository.clone(),
        activity_repository.clone(),
        user_repository.clone(),
        notifier.clone(),
    );
    let activity_service = ActivityService::new(
        activity_repository.clone(),
        lead_repository.clone(),
        user_repository.clone(),
        notifier,
    );
    let analytics_service =
        AnalyticsService::new(lead_repository, activity_repository, user_repository);

    let app_state = AppState {
        user_service,
        lead_service,
        activity_service,
        analytics_service,
        events,
        postgres_pool: pool,
        frontend_url: frontend_url.clone(),
    };

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route("/api/users", get(handlers::users::list_users_handler))
        .route(
            "/api/leads",
            get(handlers::leads::list_leads_handler).post(handlers::leads::create_lead_handler),
        )
        .route(
            "/api/leads/{lead_id}",
            get(handlers::leads::get_lead_handler)
                .put(handlers::leads::update_lead_handler)
                .delete(handlers::leads::delete_lead_handler),
        )
        .route(
            "/api/leads/{lead_id}/activities",
            get(handlers::leads::list_lead_activities_handler),
        )
        .route(
            "/api/activities",
            post(handlers::activities::create_activity_handler),
        )
        .route("/api/stats", get(handlers::insights::stats_handler))
        .route("/api/analytics", get(handlers::insights::analytics_handler))
        .route("/api/events", get(handlers::events::events_handler))
        .route_layer(from_fn(middleware::require_auth));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]);

    let app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state);

    let host = IpAddr::from_str(&api_host)
        .map_err(|error| AppError::Internal(format!("invalid API_HOST '{api_host}': {error}")))?;
    let address = SocketAddr::from((host, api_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "leadflow-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}
