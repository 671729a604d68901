use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use super::bilibili::Bilibili;
use super::library::Library;
use super::provider::SiteProvider;
use crate::config::Config;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("site not supported: {0}")]
    SiteNotSupported(String),
}

/// Registry mapping site keys to provider instances.
///
/// Built once at startup and shared immutably through [`crate::api::state::AppState`];
/// the request path only ever resolves.
#[derive(Clone, Default)]
pub struct SiteRegistry {
    providers: BTreeMap<String, Arc<dyn SiteProvider>>,
}

impl SiteRegistry {
    pub fn new() -> Self {
        Self {
            providers: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, provider: Arc<dyn SiteProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    pub fn resolve(&self, site: &str) -> Result<Arc<dyn SiteProvider>, RegistryError> {
        self.providers
            .get(site)
            .cloned()
            .ok_or_else(|| RegistryError::SiteNotSupported(site.to_string()))
    }

    pub fn has_site(&self, site: &str) -> bool {
        self.providers.contains_key(site)
    }

    /// Registered site keys, in stable order.
    pub fn site_names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    /// All registered providers, for cross-site fan-out.
    pub fn providers(&self) -> impl Iterator<Item = &Arc<dyn SiteProvider>> {
        self.providers.values()
    }

    /// Create the registry with built-in sites, applying per-site
    /// configuration overrides (base url, seed cookies).
    pub fn with_defaults(config: &Config) -> Self {
        let mut registry = Self::new();

        let bilibili = match config.sites.get("bilibili") {
            Some(site) => Bilibili::from_config(site),
            None => Bilibili::new(),
        };
        registry.register(Arc::new(bilibili));
        registry.register(Arc::new(Library::new()));

        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_unknown_site_fails_typed() {
        let registry = SiteRegistry::with_defaults(&Config::default());

        let err = registry.resolve("unknownsite").unwrap_err();
        assert!(matches!(err, RegistryError::SiteNotSupported(_)));
    }

    #[test]
    fn defaults_register_builtin_sites() {
        let registry = SiteRegistry::with_defaults(&Config::default());

        assert!(registry.has_site("bilibili"));
        assert!(registry.has_site("library"));
        assert_eq!(registry.site_names(), vec!["bilibili", "library"]);
    }
}
