use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("tasks.num_workers must be positive")]
    NoWorkersConfigured,

    #[error("tasks.channel_size must be positive")]
    InvalidChannelSize,

    #[error("tasks.page_size must be positive")]
    InvalidPageSize,

    #[error("site '{site}' has an empty base_url override")]
    EmptySiteBaseUrl { site: String },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_tasks(config)?;
    validate_sites(config)?;
    Ok(())
}

fn validate_tasks(config: &Config) -> Result<(), ValidationError> {
    if config.tasks.num_workers == 0 {
        return Err(ValidationError::NoWorkersConfigured);
    }
    if config.tasks.channel_size == 0 {
        return Err(ValidationError::InvalidChannelSize);
    }
    if config.tasks.page_size == 0 {
        return Err(ValidationError::InvalidPageSize);
    }
    Ok(())
}

fn validate_sites(config: &Config) -> Result<(), ValidationError> {
    for (site, site_config) in &config.sites {
        if let Some(base_url) = &site_config.base_url {
            if base_url.trim().is_empty() {
                return Err(ValidationError::EmptySiteBaseUrl { site: site.clone() });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::models::*;
    use super::*;

    #[test]
    fn test_valid_config() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_workers() {
        let mut config = Config::default();
        config.tasks.num_workers = 0;

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::NoWorkersConfigured)));
    }

    #[test]
    fn test_zero_page_size() {
        let mut config = Config::default();
        config.tasks.page_size = 0;

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::InvalidPageSize)));
    }

    #[test]
    fn test_empty_site_base_url() {
        let mut config = Config::default();
        config.sites.insert(
            "bilibili".to_string(),
            SiteConfig {
                base_url: Some("  ".to_string()),
            },
        );

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::EmptySiteBaseUrl { .. })
        ));
    }
}
