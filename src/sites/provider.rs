use async_trait::async_trait;
use thiserror::Error;

use super::types::{ChapterInfo, ComicInfo, ComicSummary, Cookie, TagGroup};

/// Provider failures, normalized by the API layer into response classes.
///
/// `NotFound` is the only variant with a dedicated status class; everything
/// else surfaces as an internal error without leaking upstream detail shape.
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("{0}")]
    NotFound(String),
    #[error("upstream request failed: {0}")]
    Upstream(String),
    #[error("unexpected upstream response: {0}")]
    Decode(String),
}

impl SiteError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        SiteError::NotFound(what.to_string())
    }
}

impl From<reqwest::Error> for SiteError {
    fn from(err: reqwest::Error) -> Self {
        SiteError::Upstream(err.to_string())
    }
}

/// Capability set every registered site implements.
///
/// Operations are async because most providers talk to their upstream over
/// HTTP. Empty listings are valid results, not errors. Credential storage is
/// owned by the provider; `set_credentials` with `cover` replaces the stored
/// set, without it the update merges (match by cookie name, replace on
/// match, append otherwise) and returns the resulting effective set.
#[async_trait]
pub trait SiteProvider: Send + Sync + std::fmt::Debug {
    /// Site key this provider is registered under.
    fn name(&self) -> &str;

    async fn get_comic_info(&self, comicid: &str) -> Result<ComicInfo, SiteError>;

    async fn get_chapter_info(
        &self,
        comicid: &str,
        chapter_number: u32,
    ) -> Result<ChapterInfo, SiteError>;

    async fn search(&self, name: &str, page: u32) -> Result<Vec<ComicSummary>, SiteError>;

    async fn list_by_tag(&self, tag: &str, page: u32) -> Result<Vec<ComicSummary>, SiteError>;

    async fn list_latest(&self, page: u32) -> Result<Vec<ComicSummary>, SiteError>;

    async fn tags(&self) -> Result<Vec<TagGroup>, SiteError>;

    async fn get_credentials(&self) -> Result<Vec<Cookie>, SiteError>;

    async fn set_credentials(
        &self,
        new: Vec<Cookie>,
        cover: bool,
    ) -> Result<Vec<Cookie>, SiteError>;
}
