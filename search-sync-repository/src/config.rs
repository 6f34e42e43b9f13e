//! Configuration for the search store client.

use std::time::Duration;

/// The text analyzer applied to language-analyzed fields in index mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LanguageAnalyzer {
    #[default]
    English,
    Japanese,
    Chinese,
}

impl LanguageAnalyzer {
    /// The analyzer name as the search engine knows it.
    pub fn analyzer_name(&self) -> &'static str {
        match self {
            LanguageAnalyzer::English => "english",
            LanguageAnalyzer::Japanese => "kuromoji",
            LanguageAnalyzer::Chinese => "smartcn",
        }
    }

    /// Parse the two-letter language code used in configuration.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "en" => Some(LanguageAnalyzer::English),
            "jp" => Some(LanguageAnalyzer::Japanese),
            "zh" => Some(LanguageAnalyzer::Chinese),
            _ => None,
        }
    }
}

/// Configuration for the search store connection and request behavior.
#[derive(Debug, Clone)]
pub struct SearchStoreConfig {
    /// The search engine URL (e.g. "http://localhost:9200").
    pub url: String,
    /// Optional basic-auth credentials.
    pub username: Option<String>,
    pub password: Option<String>,
    /// Timeout for interactive queries (search, suggest, aggregate).
    pub query_timeout: Duration,
    /// Timeout for batch scans and query-scoped bulk operations.
    pub scan_timeout: Duration,
    /// Upper bound on approximate total-hit counting in interactive search.
    /// Terminating pagination loops never use this cap.
    pub approximate_hit_cap: u64,
}

impl Default for SearchStoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            username: None,
            password: None,
            query_timeout: Duration::from_secs(30),
            scan_timeout: Duration::from_secs(60),
            approximate_hit_cap: 10_000,
        }
    }
}

impl SearchStoreConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyzer_codes() {
        assert_eq!(
            LanguageAnalyzer::from_code("en"),
            Some(LanguageAnalyzer::English)
        );
        assert_eq!(
            LanguageAnalyzer::from_code("JP"),
            Some(LanguageAnalyzer::Japanese)
        );
        assert_eq!(LanguageAnalyzer::from_code("fr"), None);
    }

    #[test]
    fn test_default_timeouts() {
        let config = SearchStoreConfig::default();
        assert_eq!(config.query_timeout, Duration::from_secs(30));
        assert_eq!(config.scan_timeout, Duration::from_secs(60));
        assert_eq!(config.approximate_hit_cap, 10_000);
    }
}
