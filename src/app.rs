use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{middleware, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::access::{AccessPolicy, MembershipStore, SessionResolver};
use crate::config::{AppConfig, ConfigError, SecurityConfig};
use crate::database::DatabaseManager;
use crate::handlers::{pages, protected, public};
use crate::middleware::access_policy_middleware;
use crate::services::PgMembershipStore;

/// Session cookie settings used when clearing a session
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub name: String,
    pub secure: bool,
}

/// Shared, immutable request-path state
#[derive(Clone)]
pub struct AppState {
    pub policy: Arc<AccessPolicy>,
    pub sessions: Arc<dyn SessionResolver>,
    pub memberships: Arc<dyn MembershipStore>,
    pub db: DatabaseManager,
    pub cookie: SessionCookie,
}

impl AppState {
    /// Wire up the production collaborators from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, anyhow::Error> {
        config.validate()?;

        let routes = config.access.route_table().map_err(ConfigError::from)?;
        let policy = AccessPolicy::new(routes, config.access.unknown_role);
        let sessions = crate::access::session::resolver_from_config(&config.identity)?;
        let db = DatabaseManager::from_config(&config.database)?;
        let memberships = Arc::new(PgMembershipStore::new(db.admin_pool().clone()));

        Ok(Self {
            policy: Arc::new(policy),
            sessions,
            memberships,
            db,
            cookie: SessionCookie {
                name: config.identity.cookie_name.clone(),
                secure: config.security.secure_cookies,
            },
        })
    }
}

pub fn router(state: AppState, security: &SecurityConfig) -> Router {
    let mut app = Router::new()
        .merge(page_routes())
        .merge(public_routes())
        .merge(api_routes())
        .fallback(public::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), access_policy_middleware))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if security.enable_cors {
        app = app.layer(cors_layer(&security.cors_origins));
    }
    app
}

fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::landing))
        .route("/login", get(pages::login))
        .route("/team-login", get(pages::team_login))
        .route("/dashboard", get(pages::owner_dashboard))
        .route("/team-dashboard", get(pages::team_dashboard))
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(public::health))
        .route("/api/auth/logout", post(public::logout))
}

fn api_routes() -> Router<AppState> {
    use protected::{auth, clients, organization, payments, projects, tasks, team};

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/organization", get(organization::show).patch(organization::update))
        .route("/api/clients", get(clients::list).post(clients::create))
        .route(
            "/api/clients/:id",
            get(clients::show).patch(clients::update).delete(clients::delete),
        )
        .route("/api/projects", get(projects::list).post(projects::create))
        .route(
            "/api/projects/:id",
            get(projects::show).patch(projects::update).delete(projects::delete),
        )
        .route("/api/tasks", get(tasks::list).post(tasks::create))
        .route(
            "/api/tasks/:id",
            get(tasks::show).patch(tasks::update).delete(tasks::delete),
        )
        .route("/api/team", get(team::list).post(team::add))
        .route("/api/team/:user_id", axum::routing::patch(team::update).delete(team::remove))
        .route("/api/payments", get(payments::list).post(payments::create))
        .route(
            "/api/payments/:id",
            get(payments::show).patch(payments::update).delete(payments::delete),
        )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}
