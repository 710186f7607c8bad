//! Read-only HTTP relay exposing aggregated locations and effective actions.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Query, Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::app::locations::{LocationManager, Provider};
use crate::app::providers::{LocationFilter, default_actions};
use crate::domain::model::{Action, Location};
use crate::infra::auth::tokens_match;
use crate::infra::config::Config;
use crate::infra::paths::{canonical_path, expand_path};

/// Builds the provider set for a filter.
pub type ProviderFactory = Arc<dyn Fn(LocationFilter) -> Vec<Arc<dyn Provider>> + Send + Sync>;

/// `GET /api/locations` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationsResponse {
    pub locations: Vec<Location>,
}

/// `GET /api/actions` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionsResponse {
    pub actions: Vec<Action>,
    pub is_project: bool,
}

#[derive(Clone)]
pub struct RelayState {
    config: Arc<Config>,
    token: Arc<str>,
    providers: ProviderFactory,
}

impl RelayState {
    /// Serve the local project and zoxide providers.
    pub fn new(config: Arc<Config>, token: impl Into<Arc<str>>) -> Self {
        let providers_config = Arc::clone(&config);
        let providers: ProviderFactory =
            Arc::new(move |filter: LocationFilter| filter.providers(&providers_config));
        Self::with_providers(config, token, providers)
    }

    pub fn with_providers(
        config: Arc<Config>,
        token: impl Into<Arc<str>>,
        providers: ProviderFactory,
    ) -> Self {
        Self {
            config,
            token: token.into(),
            providers,
        }
    }

    async fn aggregate(&self, filter: LocationFilter) -> Result<Vec<Location>, ApiError> {
        let manager = LocationManager::new((self.providers)(filter));
        manager
            .get_all(&CancellationToken::new())
            .await
            .map_err(|err| {
                error!(error = %err, filter = %filter, "aggregation failed");
                ApiError::Internal(error_chain(&err))
            })
    }
}

pub fn router(state: RelayState) -> Router {
    let api = Router::new()
        .route("/api/locations", get(locations))
        .route("/api/actions", get(actions))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .with_state(state)
}

/// Bind `host:port` and serve until `shutdown` is canceled.
pub async fn serve(
    state: RelayState,
    host: &str,
    port: u16,
    shutdown: CancellationToken,
) -> Result<()> {
    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("failed to bind relay on {host}:{port}"))?;
    serve_on(listener, state, shutdown).await
}

pub async fn serve_on(
    listener: TcpListener,
    state: RelayState,
    shutdown: CancellationToken,
) -> Result<()> {
    let addr = listener
        .local_addr()
        .context("failed to read relay address")?;
    info!(%addr, "relay listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("relay server failed")
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
struct LocationsQuery {
    filter: Option<String>,
}

async fn locations(
    State(state): State<RelayState>,
    Query(query): Query<LocationsQuery>,
) -> Result<Json<LocationsResponse>, ApiError> {
    let filter = query
        .filter
        .as_deref()
        .unwrap_or_default()
        .parse::<LocationFilter>()
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;
    let locations = state.aggregate(filter).await?;
    Ok(Json(LocationsResponse { locations }))
}

#[derive(Debug, Deserialize)]
struct ActionsQuery {
    path: Option<String>,
}

async fn actions(
    State(state): State<RelayState>,
    Query(query): Query<ActionsQuery>,
) -> Result<Json<ActionsResponse>, ApiError> {
    let raw = query
        .path
        .filter(|path| !path.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing `path` parameter".into()))?;
    let path: PathBuf = expand_path(&raw)
        .map(|path| canonical_path(&path))
        .map_err(|err| ApiError::BadRequest(format!("cannot expand path `{raw}`: {err}")))?;

    let locations = state.aggregate(LocationFilter::All).await?;
    let response = match locations.into_iter().find(|location| location.path == path) {
        Some(location) => ActionsResponse {
            is_project: location.is_project(),
            actions: location.actions,
        },
        None => ActionsResponse {
            actions: default_actions(&state.config),
            is_project: false,
        },
    };
    Ok(Json(response))
}

async fn require_token(State(state): State<RelayState>, request: Request, next: Next) -> Response {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    let verdict = match presented {
        Some(token) if tokens_match(token, &state.token) => Ok(()),
        Some(_) => Err("invalid token"),
        None => Err("missing or malformed authorization header"),
    };

    match verdict {
        Ok(()) => next.run(request).await,
        Err(reason) => {
            warn!(uri = %request.uri(), reason, "rejected relay request");
            ApiError::Unauthorized(reason).into_response()
        }
    }
}

#[derive(Debug)]
enum ApiError {
    Unauthorized(&'static str),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message.to_string()),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
