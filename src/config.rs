use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// How long a disambiguation prompt waits for a reply, in seconds.
    pub selection_timeout_secs: u64,
    /// How many search hits to offer when a query falls back to text search.
    pub search_result_count: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        Ok(Config {
            selection_timeout_secs: env::var("SELECTION_TIMEOUT_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap_or(300),
            search_result_count: env::var("SEARCH_RESULT_COUNT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            selection_timeout_secs: 300,
            search_result_count: 5,
        }
    }
}
