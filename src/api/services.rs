use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::IntoResponse,
};
use http_body_util::BodyExt;
use tracing::warn;

use super::{
    error::ApiError,
    guard::check_manage_secret,
    models::{
        AddTaskParams, AggregateSearchParams, ComicListResponse, CookieUpdate, CookiesResponse,
        HealthResponse, LatestParams, LatestResponse, SearchParams, SearchResponse,
        TagListParams, TagsResponse, TaskAddedResponse, TaskListParams, TaskListResponse,
    },
    state::AppState,
    utils,
};
use crate::sites::types::ComicSummary;
use crate::tasks::{ChapterSelector, TaskSpec};

/// Comic info endpoint (GET /api/{site}/comic/{comicid})
pub async fn get_comic_info(
    State(state): State<AppState>,
    Path((site, comicid)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let provider = state.sites.resolve(&site)?;
    let info = provider.get_comic_info(&comicid).await?;
    Ok(Json(info))
}

/// Chapter info endpoint (GET /api/{site}/comic/{comicid}/{chapter_number})
pub async fn get_chapter_info(
    State(state): State<AppState>,
    Path((site, comicid, chapter_number)): Path<(String, String, u32)>,
) -> Result<impl IntoResponse, ApiError> {
    let provider = state.sites.resolve(&site)?;
    let chapter = provider.get_chapter_info(&comicid, chapter_number).await?;
    Ok(Json(chapter))
}

/// Search endpoint (GET /api/{site}/search?name=...&page=1)
pub async fn search(
    State(state): State<AppState>,
    Path(site): Path<String>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let name = require_name(params.name)?;
    let provider = state.sites.resolve(&site)?;
    let search_result = provider.search(&name, params.page).await?;
    Ok(Json(SearchResponse { search_result }))
}

/// Tag taxonomy endpoint (GET /api/{site}/tags)
pub async fn tags(
    State(state): State<AppState>,
    Path(site): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let provider = state.sites.resolve(&site)?;
    let tags = provider.tags().await?;
    Ok(Json(TagsResponse { tags }))
}

/// Tag listing endpoint (GET /api/{site}/list?tag=...&page=1)
pub async fn tag_list(
    State(state): State<AppState>,
    Path(site): Path<String>,
    Query(params): Query<TagListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let provider = state.sites.resolve(&site)?;
    let list = provider.list_by_tag(&params.tag, params.page).await?;
    Ok(Json(ComicListResponse { list }))
}

/// Latest updates endpoint (GET /api/{site}/latest?page=1)
pub async fn latest(
    State(state): State<AppState>,
    Path(site): Path<String>,
    Query(params): Query<LatestParams>,
) -> Result<impl IntoResponse, ApiError> {
    let provider = state.sites.resolve(&site)?;
    let latest = provider.list_latest(params.page).await?;
    Ok(Json(LatestResponse { latest }))
}

/// Cross-site search endpoint (GET /aggregate/search?name=...&site=...)
///
/// With `site` this is a plain single-site search. Without it the query
/// fans out to every registered site; a failing site is logged and skipped
/// so one broken upstream cannot empty the whole result.
pub async fn aggregate_search(
    State(state): State<AppState>,
    Query(params): Query<AggregateSearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let name = require_name(params.name)?;

    let mut list: Vec<ComicSummary> = Vec::new();

    match params.site {
        Some(site) => {
            let provider = state.sites.resolve(&site)?;
            list.extend(provider.search(&name, 1).await?);
        }
        None => {
            for provider in state.sites.providers() {
                match provider.search(&name, 1).await {
                    Ok(hits) => list.extend(hits),
                    Err(e) => {
                        warn!(site = provider.name(), error = %e, "Aggregate search: site failed, skipping");
                    }
                }
            }
        }
    }

    Ok(Json(ComicListResponse { list }))
}

/// Credential read endpoint (GET /manage/cookies/{site})
pub async fn get_cookies(
    State(state): State<AppState>,
    Path(site): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    guard(&state, &headers)?;

    let provider = state.sites.resolve(&site)?;
    let cookies = provider.get_credentials().await?;
    Ok(Json(CookiesResponse { cookies }))
}

/// Credential update endpoint (POST /manage/cookies/{site})
///
/// Body: `{"cookies": [...], "cover": bool}`. An empty or missing cookie
/// list is rejected before the provider is touched. `cover` selects full
/// replacement; the default merges into the stored set.
pub async fn update_cookies(
    State(state): State<AppState>,
    Path(site): Path<String>,
    headers: HeaderMap,
    body: axum::body::Body,
) -> Result<impl IntoResponse, ApiError> {
    guard(&state, &headers)?;

    let content_type = headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::InvalidArgument("missing Content-Type header".into()))?;
    utils::parse_content_type(content_type)?;

    let body_bytes = read_body(body).await?;
    let update: CookieUpdate = serde_json::from_slice(&body_bytes)?;

    let cookies = update
        .cookies
        .filter(|cookies| !cookies.is_empty())
        .ok_or_else(|| ApiError::InvalidArgument("cookies must be a non-empty list".into()))?;

    let provider = state.sites.resolve(&site)?;
    let cookies = provider.set_credentials(cookies, update.cover).await?;
    Ok(Json(CookiesResponse { cookies }))
}

/// Task submission endpoint (GET /manage/task/add)
///
/// Guard first, then parameter validation, then an early registry check so
/// an unsupported site never reaches the queue. Submission returns the
/// queued snapshot; execution happens on the worker pool.
pub async fn add_task(
    State(state): State<AppState>,
    Query(params): Query<AddTaskParams>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    guard(&state, &headers)?;

    let site = params
        .site
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::InvalidArgument("site is required".into()))?;
    let comicid = params
        .comicid
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::InvalidArgument("comicid is required".into()))?;

    let is_all = utils::parse_flag(params.is_all.as_deref());
    let chapter = ChapterSelector::parse(&params.chapter, is_all).ok_or_else(|| {
        ApiError::InvalidArgument(format!("invalid chapter: {}", params.chapter))
    })?;

    // Fail SiteNotSupported before enqueuing anything
    state.sites.resolve(&site)?;

    let spec = TaskSpec {
        site,
        comicid,
        chapter,
        send_mail: utils::parse_flag(params.send_mail.as_deref()),
        gen_pdf: utils::parse_flag(params.gen_pdf.as_deref()),
        receivers: utils::split_receivers(params.receivers.as_deref()),
    };

    let task = state.broker.submit(spec).await?;
    state.metrics.task_submitted();

    Ok(Json(TaskAddedResponse { data: task }))
}

/// Task listing endpoint (GET /manage/task/list?page=1)
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<TaskListParams>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    guard(&state, &headers)?;

    let list = state
        .store
        .list(params.page as usize, state.config.tasks.page_size)?;
    Ok(Json(TaskListResponse { list }))
}

/// Health check endpoint (GET /health)
///
/// Reports per-component status; an unhealthy worker pool (all channels
/// closed) degrades the response to 503.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    use std::collections::HashMap;

    let mut components = HashMap::new();

    components.insert("api".to_string(), "healthy".to_string());
    components.insert("task_store".to_string(), "healthy".to_string());
    components.insert(
        "workers".to_string(),
        if state.broker.health_check() {
            "healthy".to_string()
        } else {
            "unhealthy".to_string()
        },
    );

    let all_healthy = components.values().all(|status| status == "healthy");
    let overall_status = if all_healthy { "healthy" } else { "unhealthy" };

    let status_code = if all_healthy {
        axum::http::StatusCode::OK
    } else {
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: overall_status.to_string(),
        components,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (status_code, Json(response))
}

fn guard(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    check_manage_secret(headers, &state.config).map_err(|e| {
        state.metrics.manage_rejected();
        e
    })
}

fn require_name(name: Option<String>) -> Result<String, ApiError> {
    name.filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ApiError::InvalidArgument("name is required".into()))
}

/// Reads the raw request body
async fn read_body(body: axum::body::Body) -> Result<Vec<u8>, ApiError> {
    let data = body
        .collect()
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?
        .to_bytes()
        .to_vec();

    Ok(data)
}
