use async_trait::async_trait;

use super::cookies::CookieJar;
use super::provider::{SiteError, SiteProvider};
use super::types::{
    ChapterInfo, ChapterLink, ComicInfo, ComicSummary, Cookie, Tag, TagGroup,
};

const SITE: &str = "library";
const PAGE_SIZE: usize = 10;

/// In-process fixture site.
///
/// Serves a small static catalog so the gateway and worker pipeline can be
/// exercised without network access. Registered alongside the real sites and
/// used heavily by the integration tests.
#[derive(Debug)]
pub struct Library {
    base_url: String,
    comics: Vec<FixtureComic>,
    jar: CookieJar,
}

#[derive(Clone, Copy, Debug)]
struct FixtureComic {
    comicid: &'static str,
    name: &'static str,
    author: &'static str,
    tags: &'static [&'static str],
    chapters: u32,
}

const CATALOG: &[FixtureComic] = &[
    FixtureComic {
        comicid: "1",
        name: "Steel Harbor",
        author: "M. Ishida",
        tags: &["action"],
        chapters: 3,
    },
    FixtureComic {
        comicid: "2",
        name: "Paper Lanterns",
        author: "R. Calloway",
        tags: &["drama", "slice-of-life"],
        chapters: 2,
    },
    FixtureComic {
        comicid: "3",
        name: "Gale Runners",
        author: "M. Ishida",
        tags: &["action", "adventure"],
        chapters: 5,
    },
];

impl Library {
    pub fn new() -> Self {
        Self::with_base_url("https://library.invalid")
    }

    /// Point the fixture's urls at a different host; the worker tests serve
    /// pages from a local HTTP server through this.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            comics: CATALOG.to_vec(),
            jar: CookieJar::default(),
        }
    }

    fn find(&self, comicid: &str) -> Result<&FixtureComic, SiteError> {
        self.comics
            .iter()
            .find(|c| c.comicid == comicid)
            .ok_or_else(|| SiteError::not_found(format!("comic {comicid} not in library")))
    }

    fn summary(&self, comic: &FixtureComic) -> ComicSummary {
        ComicSummary {
            site: SITE.to_string(),
            comicid: comic.comicid.to_string(),
            name: comic.name.to_string(),
            cover_image_url: format!("{}/covers/{}.png", self.base_url, comic.comicid),
            source_url: format!("{}/comic/{}", self.base_url, comic.comicid),
            status: None,
        }
    }

    fn page<T>(items: Vec<T>, page: u32) -> Vec<T> {
        let start = (page.saturating_sub(1) as usize) * PAGE_SIZE;
        items.into_iter().skip(start).take(PAGE_SIZE).collect()
    }
}

impl Default for Library {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SiteProvider for Library {
    fn name(&self) -> &str {
        SITE
    }

    async fn get_comic_info(&self, comicid: &str) -> Result<ComicInfo, SiteError> {
        let comic = self.find(comicid)?;
        Ok(ComicInfo {
            site: SITE.to_string(),
            comicid: comic.comicid.to_string(),
            name: comic.name.to_string(),
            desc: format!("{} — library fixture", comic.name),
            author: comic.author.to_string(),
            cover_image_url: format!("{}/covers/{comicid}.png", self.base_url),
            source_url: format!("{}/comic/{comicid}", self.base_url),
            tags: comic.tags.iter().map(|t| t.to_string()).collect(),
            chapters: (1..=comic.chapters)
                .map(|n| ChapterLink::new(n, format!("Chapter {n}")))
                .collect(),
        })
    }

    async fn get_chapter_info(
        &self,
        comicid: &str,
        chapter_number: u32,
    ) -> Result<ChapterInfo, SiteError> {
        let comic = self.find(comicid)?;
        if chapter_number == 0 || chapter_number > comic.chapters {
            return Err(SiteError::not_found(format!(
                "comic {comicid} has no chapter {chapter_number}"
            )));
        }
        Ok(ChapterInfo {
            site: SITE.to_string(),
            comicid: comicid.to_string(),
            chapter_number,
            title: format!("Chapter {chapter_number}"),
            source_url: format!(
                "{}/comic/{comicid}/{chapter_number}", self.base_url
            ),
            image_urls: (1..=3)
                .map(|p| {
                    format!(
                        "{}/pages/{comicid}/{chapter_number}/{p}.png", self.base_url
                    )
                })
                .collect(),
        })
    }

    async fn search(&self, name: &str, page: u32) -> Result<Vec<ComicSummary>, SiteError> {
        let needle = name.to_lowercase();
        let hits = self
            .comics
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .map(|c| self.summary(c))
            .collect();
        Ok(Self::page(hits, page))
    }

    async fn list_by_tag(&self, tag: &str, page: u32) -> Result<Vec<ComicSummary>, SiteError> {
        let hits = self
            .comics
            .iter()
            .filter(|c| tag.is_empty() || c.tags.contains(&tag))
            .map(|c| self.summary(c))
            .collect();
        Ok(Self::page(hits, page))
    }

    async fn list_latest(&self, page: u32) -> Result<Vec<ComicSummary>, SiteError> {
        let all = self.comics.iter().map(|c| self.summary(c)).collect();
        Ok(Self::page(all, page))
    }

    async fn tags(&self) -> Result<Vec<TagGroup>, SiteError> {
        let mut tags: Vec<&str> = self.comics.iter().flat_map(|c| c.tags.iter().copied()).collect();
        tags.sort_unstable();
        tags.dedup();
        Ok(vec![TagGroup {
            category: "genre".to_string(),
            tags: tags
                .into_iter()
                .map(|t| Tag {
                    name: t.to_string(),
                    tag: t.to_string(),
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
