use crate::config::Settings;
use crate::domain::holding::HoldingRecord;
use crate::edgar::types::{Cik, FilingRef};
use crate::edgar::{feed, index, info_table};
use anyhow::{Context, Result};
use reqwest::StatusCode;
use std::time::{Duration, Instant};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRIES: u32 = 3;
const MAX_RETRIES: u32 = 10;
const MAX_BACKOFF_SECS: u64 = 60;
// SEC's fair-access limit is 10 requests per second.
const DEFAULT_REQ_DELAY_MS: u64 = 150;
const DEFAULT_FEED_COUNT: usize = 40;

/// Where filings and their holdings come from.
#[async_trait::async_trait]
pub trait FilingSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// Filings for `cik`, newest first.
    async fn list_filings(&self, cik: &Cik) -> Result<Vec<FilingRef>>;

    /// Raw holding rows of the filing's information table.
    async fn fetch_holdings(&self, filing: &FilingRef) -> Result<Vec<HoldingRecord>>;
}

#[derive(Debug)]
pub struct EdgarClient {
    http: reqwest::Client,
    feed_base_url: String,
    retries: u32,
    req_delay: Duration,
    feed_count: usize,

    // Spaces requests out across the whole run, not per call.
    last_request: tokio::sync::Mutex<Option<Instant>>,
}

impl EdgarClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let user_agent = settings.require_user_agent()?;
        let timeout_secs = settings.edgar_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let retries = settings
            .edgar_retries
            .unwrap_or(DEFAULT_RETRIES)
            .clamp(1, MAX_RETRIES);
        let req_delay_ms = settings.edgar_req_delay_ms.unwrap_or(DEFAULT_REQ_DELAY_MS);
        let feed_count = settings.edgar_feed_count.unwrap_or(DEFAULT_FEED_COUNT);
        anyhow::ensure!(feed_count >= 2, "EDGAR_FEED_COUNT must be >= 2 (got {feed_count})");

        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build EDGAR http client")?;

        Ok(Self {
            http,
            feed_base_url: settings.edgar_feed_base_url.clone(),
            retries,
            req_delay: Duration::from_millis(req_delay_ms),
            feed_count,
            last_request: tokio::sync::Mutex::new(None),
        })
    }

    pub fn with_feed_count(mut self, feed_count: usize) -> Self {
        self.feed_count = feed_count.max(2);
        self
    }

    pub fn feed_count(&self) -> usize {
        self.feed_count
    }

    /// URL of the information-table XML for a filing, read from its index page.
    pub async fn locate_information_table(&self, filing: &FilingRef) -> Result<String> {
        let page = self
            .get_text(&filing.filing_href)
            .await
            .context("failed to fetch filing index page")?;

        let href = index::find_information_table_href(&page)?.with_context(|| {
            format!(
                "no INFORMATION TABLE document listed on {}",
                filing.filing_href
            )
        })?;
        let url = index::information_table_url(filing, &href)?;

        tracing::info!(
            filing_href = %filing.filing_href,
            xml_href = %href,
            xml_url = %url,
            "located information table"
        );
        Ok(url)
    }

    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.req_delay {
                tokio::time::sleep(self.req_delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            self.throttle().await;

            let res = match self.http.get(url).send().await {
                Ok(r) => r,
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err).with_context(|| format!("GET {url} failed"));
                    }
                    let backoff = backoff_for(attempt);
                    tracing::warn!(attempt, ?backoff, %url, error = %err, "EDGAR request failed; retrying");
                    tokio::time::sleep(backoff).await;
                    continue;
                }
            };

            let status = res.status();
            let text = res
                .text()
                .await
                .with_context(|| format!("failed to read response body from {url}"))?;

            if !status.is_success() {
                let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
                if retryable && attempt < self.retries {
                    let backoff = backoff_for(attempt);
                    tracing::warn!(attempt, ?backoff, %url, http_status = %status, "EDGAR HTTP error; retrying");
                    tokio::time::sleep(backoff).await;
                    continue;
                }
                anyhow::bail!("GET {url} returned HTTP {status}");
            }

            return Ok(text);
        }
    }
}

/// 1s, 2s, 4s, ... capped at `MAX_BACKOFF_SECS`.
fn backoff_for(attempt: u32) -> Duration {
    let secs = 1u64
        .checked_shl(attempt.saturating_sub(1))
        .unwrap_or(MAX_BACKOFF_SECS)
        .min(MAX_BACKOFF_SECS);
    Duration::from_secs(secs)
}

#[async_trait::async_trait]
impl FilingSource for EdgarClient {
    fn source_name(&self) -> &'static str {
        "sec_edgar"
    }

    async fn list_filings(&self, cik: &Cik) -> Result<Vec<FilingRef>> {
        let url = feed::feed_url(&self.feed_base_url, cik, self.feed_count);
        tracing::info!(%cik, %url, "fetching filing feed");

        let body = self
            .get_text(&url)
            .await
            .context("failed to fetch filing feed")?;
        feed::parse_feed(&body).with_context(|| format!("failed to parse filing feed for CIK {cik}"))
    }

    async fn fetch_holdings(&self, filing: &FilingRef) -> Result<Vec<HoldingRecord>> {
        let url = self.locate_information_table(filing).await?;
        tracing::info!(
            report_date = ?filing.report_date,
            %url,
            "processing information table"
        );

        let xml = self
            .get_text(&url)
            .await
            .context("failed to fetch information table")?;
        info_table::parse_information_table(&xml)
            .with_context(|| format!("failed to parse information table at {url}"))
    }
}
