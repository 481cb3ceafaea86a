//!
//! rollcall HTTP server
//! --------------------
//! Thin Axum request layer and composition root. Owns the roster and activity caches, hands
//! the roster cache to the [`AuthEngine`], and translates outcomes into status codes.
//!
//! Routes:
//! - `POST /login`            -> 200 / 401 / 503 with the [`crate::identity::AuthOutcome`] body
//! - `GET  /roster?group=&q=` -> cached members (credentials never serialized)
//! - `GET  /activity/recent`  -> cached "last seen" projection
//! - `POST /presence`         -> forwards upstream, then invalidates both caches
//! - `GET  /health`           -> cache ages and fetch counters

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::cache::{activity_cache, roster_cache, ActivityCache, RosterCache};
use crate::config::Settings;
use crate::directory::{filter_roster, DirectoryClient, HttpDirectoryClient, UnconfiguredDirectory};
use crate::error::{AppError, ConfigError};
use crate::identity::{AuthEngine, LoginRequest};

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthEngine,
    pub roster: RosterCache,
    pub activity: ActivityCache,
    pub directory: Arc<dyn DirectoryClient>,
}

impl AppState {
    /// Wire caches and the auth engine around an already-built directory client.
    pub fn new(directory: Arc<dyn DirectoryClient>, settings: &Settings) -> Self {
        let roster = roster_cache(Arc::clone(&directory), settings.roster_ttl, settings.fetch_timeout);
        let activity = activity_cache(Arc::clone(&directory), settings.activity_ttl, settings.fetch_timeout);
        let auth = AuthEngine::new(roster.clone(), settings.admin.clone());
        Self { auth, roster, activity, directory }
    }

    /// Build the directory client from settings. A missing or unusable upstream URL disables
    /// upstream access instead of failing startup.
    pub fn from_settings(settings: &Settings) -> Self {
        let directory: Arc<dyn DirectoryClient> = match settings.upstream_url.as_deref() {
            Some(url) => match HttpDirectoryClient::new(url, settings.fetch_timeout) {
                Ok(c) => {
                    info!(target: "startup", "upstream directory: {}", c.base_url());
                    Arc::new(c)
                }
                Err(e) => {
                    error!(target: "startup", "upstream directory disabled, cannot use '{}': {}", url, e);
                    Arc::new(UnconfiguredDirectory)
                }
            },
            None => {
                warn!(target: "startup", "upstream directory disabled: no URL configured");
                Arc::new(UnconfiguredDirectory)
            }
        };
        Self::new(directory, settings)
    }

    /// Call after any write that changes roster-derived facts.
    pub fn invalidate_all(&self) {
        self.roster.invalidate();
        self.activity.invalidate();
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "rollcall ok" }))
        .route("/health", get(health))
        .route("/login", post(login))
        .route("/roster", get(roster))
        .route("/activity/recent", get(recent_activity))
        .route("/presence", post(presence))
        .with_state(state)
}

/// Kick off one roster fetch in the background so the first login is likely a cache hit.
/// Failures are logged and otherwise ignored.
pub fn spawn_warmup(roster: &RosterCache) {
    let roster = roster.clone();
    tokio::spawn(async move {
        match roster.get().await {
            Ok(r) => info!(target: "startup", members = r.len(), "roster warm-up complete"),
            Err(e) => warn!(target: "startup", kind = e.kind(), "roster warm-up failed: {}", e),
        }
    });
}

fn log_config_problems(problems: &[ConfigError]) {
    for p in problems {
        warn!(target: "startup", "configuration: {}", p);
    }
}

/// Start the HTTP server with the given settings. Returns when the listener fails.
pub async fn run_with_settings(settings: Settings, problems: &[ConfigError]) -> anyhow::Result<()> {
    log_config_problems(problems);
    info!(
        target: "startup",
        "rollcall starting: http_port={}, upstream={:?}, admin_bypass={}, roster_ttl={:?}, activity_ttl={:?}, fetch_timeout={:?}",
        settings.http_port,
        settings.upstream_url,
        settings.admin.is_some(),
        settings.roster_ttl,
        settings.activity_ttl,
        settings.fetch_timeout
    );

    let state = AppState::from_settings(&settings);
    spawn_warmup(&state.roster);

    let addr: SocketAddr = format!("0.0.0.0:{}", settings.http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Convenience entry point reading everything from the environment.
pub async fn run() -> anyhow::Result<()> {
    let (settings, problems) = Settings::from_env();
    run_with_settings(settings, &problems).await
}

fn status_of(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn error_response(e: AppError) -> (StatusCode, Json<serde_json::Value>) {
    (status_of(e.http_status()), Json(json!({"status":"error","error": e})))
}

async fn login(State(state): State<AppState>, Json(payload): Json<LoginRequest>) -> impl IntoResponse {
    let outcome = state.auth.login_request(&payload).await;
    (status_of(outcome.http_status()), Json(outcome))
}

#[derive(Debug, Deserialize)]
struct RosterQuery {
    group: Option<String>,
    q: Option<String>,
}

async fn roster(State(state): State<AppState>, Query(params): Query<RosterQuery>) -> impl IntoResponse {
    match state.roster.get().await {
        Ok(r) => {
            let members = filter_roster(&r, params.group.as_deref(), params.q.as_deref());
            (StatusCode::OK, Json(json!({"status":"ok","count": members.len(),"members": members})))
        }
        Err(e) => error_response(e.into()),
    }
}

async fn recent_activity(State(state): State<AppState>) -> impl IntoResponse {
    match state.activity.get().await {
        Ok(a) => (StatusCode::OK, Json(json!({"status":"ok","activity": &*a}))),
        Err(e) => error_response(e.into()),
    }
}

#[derive(Debug, Deserialize)]
struct PresencePayload {
    name: String,
}

async fn presence(State(state): State<AppState>, Json(payload): Json<PresencePayload>) -> impl IntoResponse {
    if payload.name.trim().is_empty() {
        return error_response(AppError::user("missing_name", "name is required"));
    }
    match state.directory.record_presence(payload.name.trim()).await {
        Ok(()) => {
            state.invalidate_all();
            (StatusCode::OK, Json(json!({"status":"ok"})))
        }
        Err(e) => {
            warn!(target: "rollcall::server", kind = e.kind(), "presence not recorded: {}", e);
            error_response(e.into())
        }
    }
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let roster_age = state.roster.age().map(|d| d.as_secs());
    let activity_age = state.activity.age().map(|d| d.as_secs());
    Json(json!({
        "status": "ok",
        "admin_enabled": state.auth.admin_enabled(),
        "roster": {
            "members": state.roster.peek().map(|r| r.len()),
            "age_secs": roster_age,
            "ttl_secs": state.roster.ttl().as_secs(),
            "fetches": state.roster.fetch_count(),
        },
        "activity": {
            "entries": state.activity.peek().map(|a| a.len()),
            "age_secs": activity_age,
            "ttl_secs": state.activity.ttl().as_secs(),
            "fetches": state.activity.fetch_count(),
        },
    }))
}
