use std::time::Duration;

use potency_core::{AppConfig, FetchOutcome};
use potency_extract::extract_from_page;
use reqwest::{Client, StatusCode, Url};

use crate::error::ScraperError;
use crate::page::read_page;
use crate::rate_limit::retry_with_backoff;

/// Seconds to wait after a 429 that carries no usable `Retry-After` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// HTTP client for product detail pages.
///
/// Transient errors (429, network failures) are retried with exponential
/// backoff up to `max_retries` additional attempts.
pub struct PageClient {
    client: Client,
    max_retries: u32,
    /// Base delay in seconds for exponential backoff.
    backoff_base_secs: u64,
}

impl PageClient {
    /// Creates a `PageClient` with the given timeout, `User-Agent`, and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_secs,
        })
    }

    /// Creates a `PageClient` from the fetch settings in `config`.
    ///
    /// # Errors
    ///
    /// See [`PageClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            config.request_timeout_secs,
            &config.user_agent,
            config.max_retries,
            config.retry_backoff_base_secs,
        )
    }

    /// Fetches the HTML of a product page.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidUrl`]: `url` is not an absolute http(s) URL.
    /// - [`ScraperError::RateLimited`]: HTTP 429 after all retries.
    /// - [`ScraperError::NotFound`]: HTTP 404 (not retried).
    /// - [`ScraperError::UnexpectedStatus`]: any other non-2xx status (not retried).
    /// - [`ScraperError::Http`]: network or TLS failure after all retries.
    pub async fn fetch_page(&self, url: &str) -> Result<String, ScraperError> {
        let parsed = parse_page_url(url)?;
        let domain = parsed.host_str().unwrap_or(url).to_owned();

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let parsed = parsed.clone();
            let domain = domain.clone();
            async move {
                let response = self.client.get(parsed.clone()).send().await?;
                let status = response.status();

                if status == StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.trim().parse::<u64>().ok())
                        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                    return Err(ScraperError::RateLimited {
                        domain,
                        retry_after_secs,
                    });
                }

                if status == StatusCode::NOT_FOUND {
                    return Err(ScraperError::NotFound {
                        url: parsed.to_string(),
                    });
                }

                if !status.is_success() {
                    return Err(ScraperError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: parsed.to_string(),
                    });
                }

                Ok(response.text().await?)
            }
        })
        .await
    }

    /// Fetches a product page and extracts a partial insight from it.
    ///
    /// Never fails: a fetch error becomes [`FetchOutcome::Failed`], so the
    /// caller's cached insight is left untouched.
    pub async fn fetch_insight(&self, url: &str) -> FetchOutcome {
        match self.fetch_page(url).await {
            Ok(html) => {
                let page = read_page(&html);
                let insight = extract_from_page(&page, Some(url));
                tracing::info!(
                    url,
                    granularity = ?insight.terpene_granularity(),
                    cannabinoids = insight.has_cannabinoid_info(),
                    "fetched product page"
                );
                FetchOutcome::Fetched(insight)
            }
            Err(err) => {
                tracing::warn!(url, error = %err, "product page fetch failed");
                FetchOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }
}

/// Accepts only absolute `http`/`https` URLs.
pub(crate) fn parse_page_url(url: &str) -> Result<Url, ScraperError> {
    let parsed = Url::parse(url).map_err(|e| ScraperError::InvalidUrl {
        url: url.to_owned(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ScraperError::InvalidUrl {
            url: url.to_owned(),
            reason: format!("unsupported scheme \"{other}\""),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_https_product_url() {
        let url = parse_page_url("https://www.sunnyside.shop/product/blue-dream").unwrap();
        assert_eq!(url.host_str(), Some("www.sunnyside.shop"));
    }

    #[test]
    fn rejects_relative_url() {
        let err = parse_page_url("/product/blue-dream").unwrap_err();
        assert!(matches!(err, ScraperError::InvalidUrl { .. }));
    }

    #[test]
    fn rejects_non_http_scheme() {
        let err = parse_page_url("file:///etc/passwd").unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }
}
