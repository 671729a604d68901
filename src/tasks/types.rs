//! Task model for the asynchronous fetch/convert/deliver pipeline.
//!
//! A task is created `queued` by the API, handed to a worker through the
//! broker, and mutated only by that worker afterwards. Serialized form (as
//! stored in the ledger and returned by the manage endpoints):
//!
//! ```json
//! {
//!   "id": 7,
//!   "site": "bilibili",
//!   "comicid": "24742",
//!   "kind": "specific",
//!   "chapter": 12,
//!   "send_mail": false,
//!   "gen_pdf": true,
//!   "receivers": [],
//!   "status": "queued",
//!   "created_at": 1722470400,
//!   "updated_at": 1722470400
//! }
//! ```

use serde::{Deserialize, Serialize};

/// Which chapters of a comic a task covers.
///
/// Kept as a tagged variant rather than an overloaded integer: the request
/// surface encodes "unspecified" as chapter `-1` and "every chapter" as
/// `is_all=1`, and collapsing those into one number loses the distinction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "chapter", rename_all = "snake_case")]
pub enum ChapterSelector {
    /// No chapter named; resolves to the latest chapter at execution time.
    Unspecified,
    Specific(u32),
    All,
}

impl ChapterSelector {
    /// Parse the request surface encoding: `is_all=1` wins, chapter `-1`
    /// (or absent) means unspecified, anything else must be a non-negative
    /// ordinal.
    pub fn parse(chapter: &str, is_all: bool) -> Option<Self> {
        if is_all {
            return Some(ChapterSelector::All);
        }
        match chapter.trim() {
            "" | "-1" => Some(ChapterSelector::Unspecified),
            value => value.parse::<u32>().ok().map(ChapterSelector::Specific),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

/// Submission parameters, validated by the API before reaching the broker.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub site: String,
    pub comicid: String,
    pub chapter: ChapterSelector,
    pub send_mail: bool,
    pub gen_pdf: bool,
    pub receivers: Vec<String>,
}

/// One durable task record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub site: String,
    pub comicid: String,
    #[serde(flatten)]
    pub chapter: ChapterSelector,
    pub send_mail: bool,
    pub gen_pdf: bool,
    pub receivers: Vec<String>,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_parsing() {
        assert_eq!(
            ChapterSelector::parse("-1", false),
            Some(ChapterSelector::Unspecified)
        );
        assert_eq!(
            ChapterSelector::parse("", false),
            Some(ChapterSelector::Unspecified)
        );
        assert_eq!(
            ChapterSelector::parse("12", false),
            Some(ChapterSelector::Specific(12))
        );
        // is_all overrides a specific chapter
        assert_eq!(
            ChapterSelector::parse("12", true),
            Some(ChapterSelector::All)
        );
        assert_eq!(ChapterSelector::parse("-2", false), None);
        assert_eq!(ChapterSelector::parse("abc", false), None);
    }

    #[test]
    fn selector_serializes_tagged() {
        let specific = serde_json::to_value(ChapterSelector::Specific(3)).unwrap();
        assert_eq!(specific, serde_json::json!({"kind": "specific", "chapter": 3}));

        let all = serde_json::to_value(ChapterSelector::All).unwrap();
        assert_eq!(all, serde_json::json!({"kind": "all"}));
    }

    #[test]
    fn task_roundtrips_through_json() {
        let task = Task {
            id: 7,
            site: "library".to_string(),
            comicid: "1".to_string(),
            chapter: ChapterSelector::All,
            send_mail: false,
            gen_pdf: true,
            receivers: vec!["a@example.com".to_string()],
            status: TaskStatus::Queued,
            error: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        let bytes = serde_json::to_vec(&task).unwrap();
        let back: Task = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back.id, 7);
        assert_eq!(back.chapter, ChapterSelector::All);
        assert_eq!(back.status, TaskStatus::Queued);
    }
}
