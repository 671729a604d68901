//! Wire shapes shared by all site providers.
//!
//! Every provider normalizes its upstream responses into these structures:
//! - [`ComicInfo`] — one work plus its chapter index
//! - [`ChapterInfo`] — one chapter plus its page image urls
//! - [`ComicSummary`] — search / tag / latest listing entry
//! - [`TagGroup`] — tag taxonomy exposed by a site
//! - [`Cookie`] — one stored credential record
//!
//! A `ComicInfo` response (as JSON):
//!
//! ```json
//! {
//!   "site": "bilibili",
//!   "comicid": "24742",
//!   "name": "海贼王",
//!   "desc": "...",
//!   "author": "尾田荣一郎",
//!   "cover_image_url": "https://i0.hdslb.com/...",
//!   "source_url": "https://manga.bilibili.com/detail/mc24742",
//!   "tags": ["冒险", "热血"],
//!   "chapters": [
//!     {"chapter_number": 1, "title": "罗曼斯的黎明"}
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComicInfo {
    pub site: String,
    pub comicid: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub cover_image_url: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub chapters: Vec<ChapterLink>,
}

/// One entry of the chapter index carried by [`ComicInfo`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterLink {
    pub chapter_number: u32,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterInfo {
    pub site: String,
    pub comicid: String,
    pub chapter_number: u32,
    pub title: String,
    #[serde(default)]
    pub source_url: String,
    pub image_urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComicSummary {
    pub site: String,
    pub comicid: String,
    pub name: String,
    #[serde(default)]
    pub cover_image_url: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// One tag category with its site-specific tag handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagGroup {
    pub category: String,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub tag: String,
}

/// One stored credential record.
///
/// `name` is the stable identity used by merge updates; everything beyond
/// `value` is provider-defined and carried opaquely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default, flatten)]
    pub attrs: BTreeMap<String, Value>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            attrs: BTreeMap::new(),
        }
    }
}

impl ChapterLink {
    pub fn new(chapter_number: u32, title: impl Into<String>) -> Self {
        Self {
            chapter_number,
            title: title.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_roundtrips_extra_fields() {
        let raw = serde_json::json!({
            "name": "SESSDATA",
            "value": "abc123",
            "domain": ".bilibili.com",
            "httponly": true
        });

        let cookie: Cookie = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(cookie.name, "SESSDATA");
        assert_eq!(cookie.attrs.len(), 2);

        let back = serde_json::to_value(&cookie).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn comic_summary_omits_missing_status() {
        let summary = ComicSummary {
            site: "library".to_string(),
            comicid: "1".to_string(),
            name: "test".to_string(),
            cover_image_url: String::new(),
            source_url: String::new(),
            status: None,
        };

        let value = serde_json::to_value(&summary).unwrap();
        assert!(value.get("status").is_none());
    }
}
