use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SourcesConfig {
    #[serde(default = "default_true")]
    pub http: bool,
    #[serde(default = "default_true")]
    pub deezer: bool,
    /// Maximum number of tracks a search query may add at once.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            http: default_true(),
            deezer: default_true(),
            search_limit: default_search_limit(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_search_limit() -> usize {
    5
}
