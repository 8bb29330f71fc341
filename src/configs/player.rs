use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PlayerConfig {
    /// Seconds an idle session waits before it disconnects itself.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// Upper bound for a single transport `play` request.
    #[serde(default = "default_transport_timeout_ms")]
    pub transport_timeout_ms: u64,
    #[serde(default = "default_queue_page_size")]
    pub queue_page_size: usize,
}

impl PlayerConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn transport_timeout(&self) -> Duration {
        Duration::from_millis(self.transport_timeout_ms)
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout_secs(),
            transport_timeout_ms: default_transport_timeout_ms(),
            queue_page_size: default_queue_page_size(),
        }
    }
}

fn default_idle_timeout_secs() -> u64 {
    300
}

fn default_transport_timeout_ms() -> u64 {
    5000
}

fn default_queue_page_size() -> usize {
    10
}
