use std::sync::RwLock;

use super::types::Cookie;

/// Per-provider credential store.
///
/// Writes to one site are serialized by the lock; the lock is never held
/// across an await (reads snapshot, writes swap in the merged result).
#[derive(Debug, Default)]
pub struct CookieJar {
    cookies: RwLock<Vec<Cookie>>,
}

impl CookieJar {
    pub fn new(initial: Vec<Cookie>) -> Self {
        Self {
            cookies: RwLock::new(initial),
        }
    }

    /// Snapshot of the stored set.
    pub fn get(&self) -> Vec<Cookie> {
        self.cookies.read().expect("cookie jar poisoned").clone()
    }

    /// Apply an update and return the resulting effective set.
    ///
    /// `cover` replaces the stored set entirely; otherwise the update is
    /// merged via [`merge_cookies`].
    pub fn update(&self, new: Vec<Cookie>, cover: bool) -> Vec<Cookie> {
        let mut stored = self.cookies.write().expect("cookie jar poisoned");
        if cover {
            *stored = new;
        } else {
            *stored = merge_cookies(&stored, new);
        }
        stored.clone()
    }

    /// Stored cookies rendered as a `Cookie` request header value.
    pub fn header_value(&self) -> Option<String> {
        let stored = self.cookies.read().expect("cookie jar poisoned");
        if stored.is_empty() {
            return None;
        }
        Some(
            stored
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Merge `new` into `existing`: a record matching by name replaces the
/// stored record wholesale, unmatched records append in first-seen order.
/// Deterministic and idempotent.
pub fn merge_cookies(existing: &[Cookie], new: Vec<Cookie>) -> Vec<Cookie> {
    let mut merged = existing.to_vec();
    for cookie in new {
        match merged.iter_mut().find(|c| c.name == cookie.name) {
            Some(slot) => *slot = cookie,
            None => merged.push(cookie),
        }
    }
    merged
}
