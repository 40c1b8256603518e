// src/server/routes.rs
use super::error::ApiError;
use super::state::AppState;
use crate::aggregate::PreloadSummary;
use crate::cache::{CacheStats, CacheTag, RevalidateAction, RevalidationReport};
use crate::model::{Block, PostStats};
use crate::types::{BearerToken, BlockId};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Rejects the request unless it carries `token` (when one is configured).
fn authorize(token: Option<&BearerToken>, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(token) = token else {
        return Ok(());
    };

    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if token.matches_header(header) {
        Ok(())
    } else {
        log::debug!("Rejected request with missing or wrong bearer token");
        Err(ApiError::Unauthorized)
    }
}

// ---------------------------------------------------------------------------
// Revalidation
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RevalidateRequest {
    action: String,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    tag: Option<String>,
}

impl RevalidateRequest {
    fn into_action(self) -> Result<RevalidateAction, ApiError> {
        let required = |value: Option<String>, name: &str| {
            value
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| {
                    ApiError::BadRequest(format!("{} is required for action {}", name, self.action))
                })
        };

        match self.action.as_str() {
            "posts" => Ok(RevalidateAction::Posts),
            "post" => Ok(RevalidateAction::Post {
                path: required(self.path.clone(), "path")?,
            }),
            "tag" => Ok(RevalidateAction::Tag {
                tag: required(self.tag.clone(), "tag")?,
            }),
            "search" => Ok(RevalidateAction::Search),
            "static" => Ok(RevalidateAction::Static),
            "all" => Ok(RevalidateAction::All),
            other => Err(ApiError::BadRequest(format!(
                "unknown action '{}', expected one of: {}",
                other,
                RevalidateAction::NAMES.join(", ")
            ))),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RevalidateResponse {
    revalidated: bool,
    action: &'static str,
    tags: Vec<CacheTag>,
    paths: Vec<String>,
    entries_removed: usize,
    now: DateTime<Utc>,
}

pub async fn revalidate(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RevalidateRequest>, JsonRejection>,
) -> Result<Json<RevalidateResponse>, ApiError> {
    authorize(state.revalidation_token.as_ref(), &headers)?;

    // Token before body: a bad token answers 401 whatever the payload.
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let action = request.into_action()?;
    let RevalidationReport {
        tags,
        paths,
        entries_removed,
    } = state.revalidator.apply(&action);

    Ok(Json(RevalidateResponse {
        revalidated: true,
        action: action.name(),
        tags,
        paths,
        entries_removed,
        now: Utc::now(),
    }))
}

#[derive(Debug, Serialize)]
pub struct RevalidateStatus {
    status: &'static str,
    actions: [&'static str; 6],
    timestamp: DateTime<Utc>,
}

pub async fn revalidate_status() -> Json<RevalidateStatus> {
    Json(RevalidateStatus {
        status: "Revalidation API is running",
        actions: RevalidateAction::NAMES,
        timestamp: Utc::now(),
    })
}

// ---------------------------------------------------------------------------
// Single block lookup
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct BlockQuery {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BlockResponse {
    block: Block,
}

pub async fn block(
    State(state): State<AppState>,
    Query(query): Query<BlockQuery>,
) -> Result<Json<BlockResponse>, ApiError> {
    let raw = query
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("id is required".to_string()))?;
    let id = BlockId::parse(&raw).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    match state.blocks.get_block(&id).await? {
        Some(block) => Ok(Json(BlockResponse { block })),
        None => Err(ApiError::NotFound(format!("block {}", id))),
    }
}

// ---------------------------------------------------------------------------
// Cache warm-up
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct WarmResponse {
    success: bool,
    duration_ms: u128,
    result: PreloadSummary,
    timestamp: DateTime<Utc>,
}

pub async fn warm_cache(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<WarmResponse>, ApiError> {
    authorize(state.cache_warm_token.as_ref(), &headers)?;

    let started = Instant::now();
    let result = state
        .pages
        .preload_critical_data()
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("cache warm-up failed: {}", e)))?;
    let duration_ms = started.elapsed().as_millis();
    log::info!("Cache warmed in {}ms", duration_ms);

    Ok(Json(WarmResponse {
        success: true,
        duration_ms,
        result,
        timestamp: Utc::now(),
    }))
}

#[derive(Debug, Serialize)]
pub struct WarmDescription {
    message: &'static str,
    usage: &'static str,
    warms: [&'static str; 5],
}

pub async fn warm_cache_info() -> Json<WarmDescription> {
    Json(WarmDescription {
        message: "Cache warming endpoint",
        usage: "POST with an optional 'Authorization: Bearer <token>' header",
        warms: ["all posts", "recent posts", "popular tags", "all tags", "post stats"],
    })
}

// ---------------------------------------------------------------------------
// Health and stats
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: DateTime<Utc>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    })
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    cache: CacheStats,
    posts: PostStats,
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let posts = match state.pages.content().post_stats().await {
        Ok(stats) => stats,
        Err(e) => {
            log::error!("Error fetching post stats: {}", e);
            PostStats::default()
        }
    };

    Json(StatsResponse {
        cache: state.cache.stats(),
        posts,
    })
}
