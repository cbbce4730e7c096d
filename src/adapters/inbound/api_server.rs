//! HTTP API Server
//!
//! Routes inbound HTTP requests to the lookup and community services and maps
//! their outcomes to status codes and JSON bodies. Every error body has the
//! shape `{"error": "<message>"}`.

use crate::application::{
    CommunityError, CommunityService, LookupError, LookupService, LookupSource,
};
use crate::domain::entities::{Ballot, Post, ProfileUpdate};
use crate::domain::errors::ValidationError;
use crate::domain::ports::{
    CacheStore, LookupClient, PostRepository, ProfileRepository, VoteRepository,
};
use crate::domain::value_objects::{LookupKey, PageRequest};
use crate::infrastructure::ShutdownController;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Body of `POST /findip`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FindIpRequest {
    #[serde(default)]
    pub ip: Option<String>,
}

/// Query string of `GET /posts`. Kept as raw strings so bad numbers get a
/// JSON error instead of axum's plain-text rejection.
#[derive(Debug, Default, Deserialize)]
pub struct PostsQuery {
    pub page: Option<String>,
    pub count: Option<String>,
}

/// Query string or body carrying a user/post id.
#[derive(Debug, Default, Deserialize)]
pub struct IdParam {
    #[serde(default)]
    pub id: String,
}

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: String,
}

/// Request failure, rendered as `{"error": "<message>"}`.
#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationError),
    Lookup(LookupError),
    Community(CommunityError),
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(ValidationError::InvalidJson(rejection.body_text()))
    }
}

impl From<LookupError> for ApiError {
    fn from(e: LookupError) -> Self {
        Self::Lookup(e)
    }
}

impl From<CommunityError> for ApiError {
    fn from(e: CommunityError) -> Self {
        Self::Community(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Lookup(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Community(CommunityError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::Community(CommunityError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Community(CommunityError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Community(CommunityError::Conflict(_)) => StatusCode::CONFLICT,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Lookup(e) => e.to_string(),
            Self::Community(e) => e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Validation(ValidationError::InvalidJson(detail)) => {
                tracing::debug!("rejected request body: {}", detail);
            }
            Self::Lookup(e) => match std::error::Error::source(e) {
                Some(source) => tracing::error!("{}: {}", e, source),
                None => tracing::error!("{}", e),
            },
            Self::Community(CommunityError::Store(e)) => {
                tracing::error!("store error: {}", e);
            }
            _ => {}
        }
        (
            status,
            Json(serde_json::json!({ "error": self.message() })),
        )
            .into_response()
    }
}

/// API Server state.
#[derive(Clone)]
pub struct ApiState {
    pub lookup: Arc<LookupService>,
    pub community: Arc<CommunityService>,
    /// Name of the store backend, reported by `/health`
    pub store: String,
    pub shutdown: ShutdownController,
}

impl ApiState {
    pub fn new(
        lookup: Arc<LookupService>,
        community: Arc<CommunityService>,
        store: impl Into<String>,
    ) -> Self {
        Self {
            lookup,
            community,
            store: store.into(),
            shutdown: ShutdownController::new(),
        }
    }

    /// Wire both services over their stores: `cache` backs the lookup cache
    /// and `data` every feed repository. Keeping them apart stops a looked-up
    /// address such as `posts` from shadowing a feed key.
    pub fn from_stores<C, D>(
        cache: Arc<C>,
        data: Arc<D>,
        client: Arc<dyn LookupClient>,
        ttl: Option<Duration>,
        store: impl Into<String>,
    ) -> Self
    where
        C: CacheStore + 'static,
        D: PostRepository + VoteRepository + ProfileRepository + 'static,
    {
        let lookup = Arc::new(LookupService::new(cache, client).with_ttl(ttl));
        let community = Arc::new(CommunityService::new(data.clone(), data.clone(), data));
        Self::new(lookup, community, store)
    }

    /// Use an existing shutdown controller instead of a private one.
    pub fn with_shutdown(mut self, shutdown: ShutdownController) -> Self {
        self.shutdown = shutdown;
        self
    }
}

/// Build the application router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        // Read-through lookup cache
        .route("/myip", get(my_ip_handler))
        .route("/findip", post(find_ip_handler))
        // List-backed feed
        .route(
            "/posts",
            get(list_posts_handler)
                .post(create_post_handler)
                .delete(delete_post_handler),
        )
        // Set-backed votes
        .route("/votes", get(count_votes_handler).post(cast_vote_handler))
        // Hash-backed likes and profiles
        .route("/like", get(like_count_handler).post(like_handler))
        .route(
            "/users-profile",
            get(get_profile_handler).put(update_profile_handler),
        )
        .with_state(state)
}

/// HTTP API server.
pub struct ApiServer {
    listen_addr: String,
    state: ApiState,
}

impl ApiServer {
    pub fn new(listen_addr: String, state: ApiState) -> Self {
        Self { listen_addr, state }
    }

    /// Get shared state for use by other components.
    #[allow(dead_code)]
    pub fn state(&self) -> ApiState {
        self.state.clone()
    }

    /// Run until the shutdown controller fires, then drain in-flight requests.
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub async fn run(&self) -> anyhow::Result<()> {
        let app = router(self.state.clone()).layer(TraceLayer::new_for_http());

        let listener = TcpListener::bind(&self.listen_addr).await?;
        tracing::info!("API listening on {}", self.listen_addr);

        let shutdown = self.state.shutdown.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!("API server stopped");
        Ok(())
    }
}

// Handler functions

async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let status = if state.shutdown.is_shutdown() {
        "shutting_down"
    } else {
        "ok"
    };
    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: state.store.clone(),
    })
}

/// Run a lookup and render it, passing the upstream status through on a fetch.
async fn lookup_response(state: &ApiState, key: LookupKey) -> Result<Response, ApiError> {
    let outcome = state.lookup.lookup(&key).await?;
    let status = match outcome.source {
        LookupSource::Cached => StatusCode::OK,
        LookupSource::Fetched { status } => StatusCode::from_u16(status).unwrap_or(StatusCode::OK),
    };
    Ok((status, Json(outcome.record)).into_response())
}

async fn my_ip_handler(State(state): State<ApiState>) -> Result<Response, ApiError> {
    lookup_response(&state, LookupKey::Own).await
}

async fn find_ip_handler(
    State(state): State<ApiState>,
    payload: Result<Json<FindIpRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    lookup_response(&state, LookupKey::from_request(req.ip.as_deref())).await
}

async fn list_posts_handler(
    State(state): State<ApiState>,
    Query(query): Query<PostsQuery>,
) -> Result<Response, ApiError> {
    let page = PageRequest::parse(query.page.as_deref(), query.count.as_deref())?;
    let posts = state.community.list_posts(page).await?;
    Ok(Json(posts).into_response())
}

async fn create_post_handler(
    State(state): State<ApiState>,
    payload: Result<Json<Post>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(post) = payload?;
    state.community.create_post(&post).await?;
    Ok(StatusCode::CREATED)
}

async fn delete_post_handler(
    State(state): State<ApiState>,
    payload: Result<Json<Post>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(post) = payload?;
    state.community.delete_post(&post).await?;
    Ok(StatusCode::OK)
}

async fn count_votes_handler(State(state): State<ApiState>) -> Result<Response, ApiError> {
    let count = state.community.count_votes().await?;
    Ok(Json(count).into_response())
}

async fn cast_vote_handler(
    State(state): State<ApiState>,
    payload: Result<Json<Ballot>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(ballot) = payload?;
    state.community.cast_vote(&ballot).await?;
    Ok(StatusCode::CREATED)
}

async fn like_count_handler(
    State(state): State<ApiState>,
    Query(param): Query<IdParam>,
) -> Result<Response, ApiError> {
    let like_count = state.community.like_count(&param.id).await?;
    Ok(Json(like_count).into_response())
}

async fn like_handler(
    State(state): State<ApiState>,
    payload: Result<Json<IdParam>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(param) = payload?;
    let like_count = state.community.like(&param.id).await?;
    Ok(Json(like_count).into_response())
}

async fn update_profile_handler(
    State(state): State<ApiState>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(update) = payload?;
    state.community.update_profile(&update).await?;
    Ok(StatusCode::OK)
}

async fn get_profile_handler(
    State(state): State<ApiState>,
    Query(param): Query<IdParam>,
) -> Result<Response, ApiError> {
    let profile = state.community.profile(&param.id).await?;
    Ok(Json(profile).into_response())
}
