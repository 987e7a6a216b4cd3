#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Worker count for a run; tasks beyond this queue behind the pool.
    pub max_concurrent_tasks: usize,
    pub jitter_min_secs: u64,
    pub jitter_max_secs: u64,
    pub block_backoff_hours: u64,
    /// Cap on fallback offer-text candidates kept per page.
    pub offer_text_limit: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &"[redacted]")
            .field("log_level", &self.log_level)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_concurrent_tasks", &self.max_concurrent_tasks)
            .field("jitter_min_secs", &self.jitter_min_secs)
            .field("jitter_max_secs", &self.jitter_max_secs)
            .field("block_backoff_hours", &self.block_backoff_hours)
            .field("offer_text_limit", &self.offer_text_limit)
            .finish()
    }
}
