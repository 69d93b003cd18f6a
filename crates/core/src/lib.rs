pub mod diff;
pub mod domain;
pub mod edgar;
pub mod export;
pub mod pipeline;

pub mod config {
    use anyhow::Context;

    const DEFAULT_USER_AGENT: &str = "holdings13f admin@example.com";
    const DEFAULT_FEED_BASE_URL: &str = "https://data.sec.gov";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sec_user_agent: String,
        pub edgar_feed_base_url: String,
        pub edgar_timeout_secs: Option<u64>,
        pub edgar_retries: Option<u32>,
        pub edgar_req_delay_ms: Option<u64>,
        pub edgar_feed_count: Option<usize>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                sec_user_agent: std::env::var("SEC_USER_AGENT")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
                edgar_feed_base_url: std::env::var("EDGAR_FEED_BASE_URL")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_FEED_BASE_URL.to_string()),
                edgar_timeout_secs: parse_env("EDGAR_TIMEOUT_SECS")?,
                edgar_retries: parse_env("EDGAR_RETRIES")?,
                edgar_req_delay_ms: parse_env("EDGAR_REQ_DELAY_MS")?,
                edgar_feed_count: parse_env("EDGAR_FEED_COUNT")?,
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        /// SEC rejects anonymous clients; the agent must name a contact.
        pub fn require_user_agent(&self) -> anyhow::Result<&str> {
            let ua = self.sec_user_agent.trim();
            anyhow::ensure!(
                ua.contains('@'),
                "SEC_USER_AGENT must include a contact email (got {ua:?})"
            );
            Ok(ua)
        }
    }

    fn parse_env<T>(key: &str) -> anyhow::Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match std::env::var(key) {
            Ok(s) if !s.trim().is_empty() => s
                .trim()
                .parse::<T>()
                .map(Some)
                .with_context(|| format!("{key} is not a valid number: {s}")),
            _ => Ok(None),
        }
    }
}
