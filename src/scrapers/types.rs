use crate::config::Config;
use crate::models::Source;
use std::time::Duration;

/// Static request settings for one site
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Search page to fetch
    pub base_url: String,
    /// Cards kept per run, in page order
    pub max_results: usize,
    /// Pause before each request
    pub request_delay: Duration,
    /// Upper bound for a single request
    pub timeout: Duration,
    pub user_agent: String,
    /// Extra request headers
    pub headers: Vec<(String, String)>,
}

impl SiteConfig {
    pub fn for_source(source: Source, config: &Config) -> Self {
        Self {
            base_url: source.search_url().to_string(),
            max_results: config.max_results,
            request_delay: config.request_delay,
            timeout: config.request_timeout,
            user_agent: config.user_agent.clone(),
            headers: vec![
                ("Accept".to_string(), "text/html,application/xhtml+xml".to_string()),
                ("Accept-Language".to_string(), source.accept_language().to_string()),
            ],
        }
    }
}

