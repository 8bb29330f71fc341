use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LyricsConfig {
    /// Seconds a cached lyrics entry stays valid after insertion.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Seconds between sweeps of expired cache entries.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_true")]
    pub lrclib: bool,
    /// How many search hits a provider inspects before giving up.
    #[serde(default = "default_search_results")]
    pub search_results: usize,
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            lrclib: default_true(),
            search_results: default_search_results(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    600
}

fn default_true() -> bool {
    true
}

fn default_search_results() -> usize {
    3
}
