//! Site providers and dispatch.
//!
//! Each upstream comic source ("site") implements [`SiteProvider`]; the
//! [`SiteRegistry`] maps opaque site keys to provider instances at startup.
//!
//! ## Key Components
//!
//! - [`SiteProvider`] - Capability trait every site implements
//! - [`SiteRegistry`] - site key → provider resolution
//! - [`CookieJar`] - per-site credential storage with merge/cover updates
//! - [`Bilibili`] - manga.bilibili.com provider
//! - [`Library`] - in-process fixture site for development and tests
//!
//! ## Example
//!
//! ```rust,ignore
//! use comicbox::sites::SiteRegistry;
//!
//! let registry = SiteRegistry::with_defaults(&config);
//! let provider = registry.resolve("bilibili")?;
//! let info = provider.get_comic_info("24742").await?;
//! ```

mod bilibili;
mod cookies;
mod library;
mod provider;
mod registry;
pub mod types;

pub use bilibili::Bilibili;
pub use cookies::{CookieJar, merge_cookies};
pub use library::Library;
pub use provider::{SiteError, SiteProvider};
pub use registry::{RegistryError, SiteRegistry};
pub use types::{
    ChapterInfo, ChapterLink, ComicInfo, ComicSummary, Cookie, Tag, TagGroup,
};
