//! API models for the comicbox gateway.
//!
//! Query/body parameter shapes for the routes in [`super::server`], plus the
//! response wrappers the original surface exposes (`search_result`, `tags`,
//! `list`, `latest`, `cookies`, `data`). Domain payloads themselves live in
//! [`crate::sites::types`] and [`crate::tasks::types`]; this module only
//! wraps them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::sites::types::{ComicSummary, Cookie, TagGroup};
use crate::tasks::Task;

fn default_page() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub name: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
}

#[derive(Debug, Deserialize)]
pub struct TagListParams {
    #[serde(default)]
    pub tag: String,
    #[serde(default = "default_page")]
    pub page: u32,
}

#[derive(Debug, Deserialize)]
pub struct LatestParams {
    #[serde(default = "default_page")]
    pub page: u32,
}

#[derive(Debug, Deserialize)]
pub struct AggregateSearchParams {
    pub site: Option<String>,
    pub name: Option<String>,
}

/// Body of POST /manage/cookies/{site}
#[derive(Debug, Deserialize)]
pub struct CookieUpdate {
    pub cookies: Option<Vec<Cookie>>,
    #[serde(default)]
    pub cover: bool,
}

/// Query of GET /manage/task/add. Flag params arrive as the original's
/// integer-ish strings; parsing rules live in [`super::utils`].
#[derive(Debug, Deserialize)]
pub struct AddTaskParams {
    pub site: Option<String>,
    pub comicid: Option<String>,
    #[serde(default = "default_chapter")]
    pub chapter: String,
    #[serde(default)]
    pub is_all: Option<String>,
    #[serde(default)]
    pub send_mail: Option<String>,
    #[serde(default)]
    pub gen_pdf: Option<String>,
    #[serde(default)]
    pub receivers: Option<String>,
}

fn default_chapter() -> String {
    "-1".to_string()
}

#[derive(Debug, Deserialize)]
pub struct TaskListParams {
    #[serde(default = "default_page")]
    pub page: u32,
}

// Response wrappers

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub search_result: Vec<ComicSummary>,
}

#[derive(Debug, Serialize)]
pub struct TagsResponse {
    pub tags: Vec<TagGroup>,
}

#[derive(Debug, Serialize)]
pub struct ComicListResponse {
    pub list: Vec<ComicSummary>,
}

#[derive(Debug, Serialize)]
pub struct LatestResponse {
    pub latest: Vec<ComicSummary>,
}

#[derive(Debug, Serialize)]
pub struct CookiesResponse {
    pub cookies: Vec<Cookie>,
}

#[derive(Debug, Serialize)]
pub struct TaskAddedResponse {
    pub data: Task,
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub list: Vec<Task>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: HashMap<String, String>,
    pub version: String,
}
