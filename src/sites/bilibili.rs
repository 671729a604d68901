//! manga.bilibili.com provider.
//!
//! The upstream is a twirp-style JSON API: every call is a POST with a JSON
//! body and a `{code, msg, data}` envelope. Page image urls are resolved in
//! two steps (image index, then a signed token per path).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::cookies::CookieJar;
use super::provider::{SiteError, SiteProvider};
use super::types::{
    ChapterInfo, ChapterLink, ComicInfo, ComicSummary, Cookie, Tag, TagGroup,
};
use crate::config::SiteConfig;

const SITE: &str = "bilibili";
const DEFAULT_BASE_URL: &str = "https://manga.bilibili.com";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) comicbox/0.1";
const PAGE_SIZE: u32 = 20;

/// Style taxonomy exposed by the upstream class page, keyed by style id.
const STYLES: &[(&str, i64)] = &[
    ("全部", -1),
    ("热血", 999),
    ("冒险", 1013),
    ("搞笑", 994),
    ("恋爱", 995),
    ("科幻", 1016),
    ("悬疑", 1023),
    ("都市", 1002),
    ("历史", 997),
];

#[derive(Debug)]
pub struct Bilibili {
    client: Client,
    base_url: String,
    jar: CookieJar,
}

#[derive(Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

#[derive(Deserialize)]
struct DetailData {
    id: i64,
    title: String,
    #[serde(default)]
    author_name: Vec<String>,
    #[serde(default)]
    evaluate: String,
    #[serde(default)]
    vertical_cover: String,
    #[serde(default)]
    styles: Vec<String>,
    #[serde(default)]
    ep_list: Vec<Episode>,
}

#[derive(Deserialize)]
struct Episode {
    id: i64,
    ord: f64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    short_title: String,
}

#[derive(Deserialize)]
struct ImageIndexData {
    #[serde(default)]
    images: Vec<ImagePath>,
}

#[derive(Deserialize)]
struct ImagePath {
    path: String,
}

#[derive(Deserialize)]
struct ImageToken {
    url: String,
    token: String,
}

#[derive(Deserialize)]
struct SearchData {
    #[serde(default)]
    list: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    id: i64,
    title: String,
    #[serde(default)]
    vertical_cover: String,
}

#[derive(Deserialize)]
struct ClassPageComic {
    season_id: i64,
    title: String,
    #[serde(default)]
    vertical_cover: String,
    #[serde(default)]
    is_finish: Option<i64>,
}

impl Bilibili {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        match config.base_url.as_deref() {
            Some(base) => Self::with_base_url(base),
            None => Self::new(),
        }
    }

    pub fn with_base_url(base_url: &str) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .expect("failed to build bilibili http client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            jar: CookieJar::default(),
        }
    }

    /// Issue one twirp call and unwrap the `{code, msg, data}` envelope.
    /// A non-zero code is how the upstream reports a missing resource.
    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T, SiteError> {
        let url = format!(
            "{}/twirp/comic.v1.{}?device=pc&platform=web",
            self.base_url, method
        );
        debug!(site = SITE, %url, "upstream call");

        let mut request = self.client.post(&url).json(&body);
        if let Some(cookies) = self.jar.header_value() {
            request = request.header(reqwest::header::COOKIE, cookies);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SiteError::Upstream(format!(
                "{method} returned HTTP {}",
                status.as_u16()
            )));
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| SiteError::Decode(e.to_string()))?;

        if envelope.code != 0 {
            return Err(SiteError::not_found(format!(
                "{method} failed upstream: {} (code {})",
                envelope.msg, envelope.code
            )));
        }

        envelope
            .data
            .ok_or_else(|| SiteError::Decode(format!("{method}: envelope without data")))
    }

    fn parse_comicid(comicid: &str) -> Result<i64, SiteError> {
        comicid
            .trim_start_matches("mc")
            .parse::<i64>()
            .map_err(|_| SiteError::not_found(format!("comic {comicid} does not exist")))
    }

    async fn detail(&self, comicid: &str) -> Result<DetailData, SiteError> {
        let id = Self::parse_comicid(comicid)?;
        self.call("Comic/ComicDetail", json!({ "comic_id": id })).await
    }

    /// Resolve page paths into fetchable urls via the token endpoint.
    async fn image_urls(&self, paths: &[String]) -> Result<Vec<String>, SiteError> {
        if paths.is_empty() {
            return Ok(Vec::new());
        }
        let urls_param = serde_json::to_string(paths)
            .map_err(|e| SiteError::Decode(e.to_string()))?;
        let tokens: Vec<ImageToken> = self
            .call("Comic/ImageToken", json!({ "urls": urls_param }))
            .await?;
        Ok(tokens
            .into_iter()
            .map(|t| format!("{}?token={}", t.url, t.token))
            .collect())
    }

    fn source_url(&self, comicid: i64) -> String {
        format!("{}/detail/mc{}", self.base_url, comicid)
    }

    fn strip_highlight(title: &str) -> String {
        title.replace("<em class=\"keyword\">", "").replace("</em>", "")
    }

    fn chapter_title(ep: &Episode) -> String {
        if ep.title.trim().is_empty() {
            ep.short_title.clone()
        } else {
            ep.title.clone()
        }
    }
}

impl Default for Bilibili {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SiteProvider for Bilibili {
    fn name(&self) -> &str {
        SITE
    }

    async fn get_comic_info(&self, comicid: &str) -> Result<ComicInfo, SiteError> {
        let detail = self.detail(comicid).await?;

        let mut chapters: Vec<(f64, ChapterLink)> = detail
            .ep_list
            .iter()
            .map(|ep| {
                (
                    ep.ord,
                    ChapterLink::new(ep.ord as u32, Self::chapter_title(ep)),
                )
            })
            .collect();
        chapters.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(ComicInfo {
            site: SITE.to_string(),
            comicid: detail.id.to_string(),
            name: detail.title,
            desc: detail.evaluate,
            author: detail.author_name.join(","),
            cover_image_url: detail.vertical_cover,
            source_url: self.source_url(detail.id),
            tags: detail.styles,
            chapters: chapters.into_iter().map(|(_, link)| link).collect(),
        })
    }

    async fn get_chapter_info(
        &self,
        comicid: &str,
        chapter_number: u32,
    ) -> Result<ChapterInfo, SiteError> {
        let detail = self.detail(comicid).await?;

        let ep = detail
            .ep_list
            .iter()
            .find(|ep| ep.ord as u32 == chapter_number)
            .ok_or_else(|| {
                SiteError::not_found(format!(
                    "comic {comicid} has no chapter {chapter_number}"
                ))
            })?;

        let index: ImageIndexData = self
            .call("Comic/GetImageIndex", json!({ "ep_id": ep.id }))
            .await?;
        let paths: Vec<String> = index.images.into_iter().map(|i| i.path).collect();
        let image_urls = self.image_urls(&paths).await?;

        Ok(ChapterInfo {
            site: SITE.to_string(),
            comicid: detail.id.to_string(),
            chapter_number,
            title: Self::chapter_title(ep),
            source_url: format!("{}/mc{}/{}", self.base_url, detail.id, ep.id),
            image_urls,
        })
    }

    async fn search(&self, name: &str, page: u32) -> Result<Vec<ComicSummary>, SiteError> {
        let data: SearchData = self
            .call(
                "Search/ComicSearch",
                json!({ "key_word": name, "page_num": page, "page_size": PAGE_SIZE }),
            )
            .await?;

        Ok(data
            .list
            .into_iter()
            .map(|hit| ComicSummary {
                site: SITE.to_string(),
                comicid: hit.id.to_string(),
                name: Self::strip_highlight(&hit.title),
                cover_image_url: hit.vertical_cover,
                source_url: self.source_url(hit.id),
                status: None,
            })
            .collect())
    }

    async fn list_by_tag(&self, tag: &str, page: u32) -> Result<Vec<ComicSummary>, SiteError> {
        let style_id = STYLES
            .iter()
            .find(|(name, _)| *name == tag || tag.is_empty())
            .map(|(_, id)| *id)
            .unwrap_or(-1);

        let comics: Vec<ClassPageComic> = self
            .call(
                "Comic/ClassPage",
                json!({
                    "style_id": style_id,
                    "area_id": -1,
                    "is_free": -1,
                    "is_finish": -1,
                    "order": 0,
                    "page_num": page,
                    "page_size": PAGE_SIZE,
                }),
            )
            .await?;

        Ok(comics
            .into_iter()
            .map(|c| ComicSummary {
                site: SITE.to_string(),
                comicid: c.season_id.to_string(),
                name: c.title,
                cover_image_url: c.vertical_cover,
                source_url: self.source_url(c.season_id),
                status: c.is_finish.map(|f| {
                    if f == 1 { "完结".to_string() } else { "连载".to_string() }
                }),
            })
            .collect())
    }

    async fn list_latest(&self, page: u32) -> Result<Vec<ComicSummary>, SiteError> {
        let comics: Vec<ClassPageComic> = self
            .call(
                "Comic/ClassPage",
                json!({
                    "style_id": -1,
                    "area_id": -1,
                    "is_free": -1,
                    "is_finish": -1,
                    // order 3 = most recently updated
                    "order": 3,
                    "page_num": page,
                    "page_size": PAGE_SIZE,
                }),
            )
            .await?;

        Ok(comics
            .into_iter()
            .map(|c| ComicSummary {
                site: SITE.to_string(),
                comicid: c.season_id.to_string(),
                name: c.title,
                cover_image_url: c.vertical_cover,
                source_url: self.source_url(c.season_id),
                status: None,
            })
            .collect())
    }

    async fn tags(&self) -> Result<Vec<TagGroup>, SiteError> {
        Ok(vec![TagGroup {
            category: "题材".to_string(),
            tags: STYLES
                .iter()
                .map(|(name, id)| Tag {
                    name: name.to_string(),
                    tag: id.to_string(),
                })
                .collect(),
        }])
    }

    async fn get_credentials(&self) -> Result<Vec<Cookie>, SiteError> {
        Ok(self.jar.get())
    }

    async fn set_credentials(
        &self,
        new: Vec<Cookie>,
        cover: bool,
    ) -> Result<Vec<Cookie>, SiteError> {
        Ok(self.jar.update(new, cover))
    }
}
