//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build shared state from validated configuration
//! - Create the Axum router with the gatekeeping chain on every route
//! - Wire up cross-cutting middleware (tracing, timeout, body limit, request ID)
//! - Run background sweeps of the rate limit tables
//! - Serve until the shutdown signal fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    middleware,
    routing::{get, post, MethodRouter},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::api::{self, UserDirectory};
use crate::config::{DeploymentMode, GatekeeperConfig, SigningSecret};
use crate::http::middleware::{authenticate, require_role, RoleGuard};
use crate::http::routes::{self, RouteRule};
use crate::input::{validate_body, InputState, Sanitizer};
use crate::lifecycle::Shutdown;
use crate::security::rate_limit::rate_limit_middleware;
use crate::security::{FixedWindowLimiter, PasswordHasher, RoleTable, TokenService};

/// One limiter per policy.
#[derive(Clone)]
pub struct Limiters {
    pub api: Arc<FixedWindowLimiter>,
    pub login: Arc<FixedWindowLimiter>,
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub roles: Arc<RoleTable>,
    pub users: Arc<UserDirectory>,
    pub hasher: PasswordHasher,
    pub input: InputState,
    /// `None` when rate limiting is disabled.
    pub limiters: Option<Limiters>,
    pub mode: DeploymentMode,
}

impl AppState {
    pub fn new(config: &GatekeeperConfig, mode: DeploymentMode, secret: &SigningSecret) -> Self {
        let limiters = config.rate_limit.enabled.then(|| {
            let max_entries = config.rate_limit.eviction.max_entries;
            Limiters {
                api: Arc::new(FixedWindowLimiter::from_policy(
                    "api",
                    &config.rate_limit.api,
                    max_entries,
                )),
                login: Arc::new(FixedWindowLimiter::from_policy(
                    "login",
                    &config.rate_limit.login,
                    max_entries,
                )),
            }
        });

        Self {
            tokens: Arc::new(TokenService::new(
                secret,
                config.auth.issuer.clone(),
                config.auth.token_ttl_secs,
            )),
            roles: Arc::new(RoleTable::from_config(&config.roles)),
            users: Arc::new(UserDirectory::new(config.users.iter().cloned())),
            hasher: PasswordHasher::default(),
            input: InputState::new(
                Sanitizer::from_config(&config.sanitizer),
                config.security.max_body_size,
            ),
            limiters,
            mode,
        }
    }
}

/// HTTP server for the gatekeeper.
pub struct HttpServer {
    router: Router,
    config: GatekeeperConfig,
    limiters: Option<Limiters>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatekeeperConfig, mode: DeploymentMode, secret: &SigningSecret) -> Self {
        let state = AppState::new(&config, mode, secret);
        let limiters = state.limiters.clone();
        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            limiters,
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Per request: rate limit → sanitize/validate body → authenticate →
    /// authorize → handler. Each step ends the request on failure.
    #[allow(deprecated)]
    pub fn build_router(config: &GatekeeperConfig, state: AppState) -> Router {
        let login = Router::new()
            .route(routes::LOGIN, post(api::auth::login))
            .route_layer(middleware::from_fn_with_state(
                state.input.clone(),
                validate_body::<api::auth::LoginRequest>,
            ));

        let reservations = guarded(&state, routes::RESERVATIONS, post(api::reservations::create_reservation))
            .route_layer(middleware::from_fn_with_state(
                state.input.clone(),
                validate_body::<api::reservations::ReservationRequest>,
            ));

        let protected = Router::new()
            .merge(guarded(&state, routes::LOGOUT, post(api::auth::logout)))
            .merge(guarded(&state, routes::ME, get(api::auth::me)))
            .merge(reservations)
            .merge(guarded(&state, routes::REPORT_SUMMARY, get(api::admin::get_report_summary)))
            .merge(guarded(&state, routes::ADMIN_STATUS, get(api::admin::get_status)));

        let (login, protected) = match &state.limiters {
            Some(limiters) => (
                login.layer(middleware::from_fn_with_state(
                    limiters.login.clone(),
                    rate_limit_middleware,
                )),
                protected.layer(middleware::from_fn_with_state(
                    limiters.api.clone(),
                    rate_limit_middleware,
                )),
            ),
            None => (login, protected),
        };

        Router::new()
            .route(routes::HEALTH, get(api::admin::health))
            .merge(login)
            .merge(protected)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        if let (Some(limiters), Some(secs)) =
            (&self.limiters, self.config.rate_limit.eviction.sweep_interval_secs)
        {
            let interval = Duration::from_secs(secs);
            for limiter in [limiters.api.clone(), limiters.login.clone()] {
                tokio::spawn(sweep_loop(limiter, interval, shutdown.clone()));
            }
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let mut stop = shutdown.subscribe();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatekeeperConfig {
        &self.config
    }
}

/// A route behind token verification and its minimum role.
fn guarded(state: &AppState, rule: RouteRule, handler: MethodRouter<AppState>) -> Router<AppState> {
    Router::new()
        .route(rule.path, handler)
        .route_layer(middleware::from_fn_with_state(
            RoleGuard::new(state.roles.clone(), rule),
            require_role,
        ))
        .route_layer(middleware::from_fn_with_state(state.tokens.clone(), authenticate))
}

/// Periodically drop expired limiter entries until shutdown.
async fn sweep_loop(limiter: Arc<FixedWindowLimiter>, interval: Duration, shutdown: Shutdown) {
    let mut stop = shutdown.subscribe();
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = limiter.sweep(Instant::now());
                if removed > 0 {
                    tracing::debug!(policy = limiter.name(), removed, remaining = limiter.len(), "Swept rate limit entries");
                }
            }
            _ = stop.recv() => break,
        }
    }
}
