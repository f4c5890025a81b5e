//! CoinGecko REST market source.
//!
//! Wraps the free-tier `/coins/markets` endpoint with:
//! - a minimum interval between requests to stay inside the
//!   requests-per-minute budget
//! - bounded exponential-backoff retry on 429, 5xx and transport errors

use crate::error::{DataError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Source configuration. All knobs are overridable from the environment
/// by the binaries that embed this client.
#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    /// API base URL
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Minimum milliseconds between requests (~10 req/min free tier)
    pub min_request_interval_ms: u64,
    /// Retry attempts per request
    pub max_retries: u32,
    /// First retry delay in seconds
    pub initial_backoff_secs: f64,
    /// Multiplier applied to the delay after each failed attempt
    pub backoff_factor: f64,
    /// Assets requested per page (API caps at 250)
    pub page_size: usize,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coingecko.com/api/v3".to_string(),
            timeout_secs: 30,
            min_request_interval_ms: 6_000,
            max_retries: 3,
            initial_backoff_secs: 5.0,
            backoff_factor: 2.0,
            page_size: 50,
        }
    }
}

/// One asset as returned by `/coins/markets`.
///
/// Every market field is optional: the source omits or nulls fields for
/// thinly traded assets, and a missing field must not sink the page.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketTicker {
    /// Stable source identifier (e.g. "bitcoin")
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image: Option<String>,
    pub market_cap_rank: Option<i32>,
    pub current_price: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    pub total_volume: Option<Decimal>,
    pub price_change_percentage_24h: Option<Decimal>,
    pub circulating_supply: Option<Decimal>,
}

/// Throttled, retrying CoinGecko client.
pub struct CoinGeckoClient {
    http: reqwest::Client,
    config: CoinGeckoConfig,
    last_request: Mutex<Option<Instant>>,
}

impl CoinGeckoClient {
    pub fn new(config: CoinGeckoConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            config,
            last_request: Mutex::new(None),
        })
    }

    /// Block until the minimum request interval has elapsed since the
    /// previous request, then stamp the current request.
    async fn throttle(&self) {
        let interval = Duration::from_millis(self.config.min_request_interval_ms);
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < interval {
                let wait = interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "Rate limit: waiting");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Fetch one page of the markets listing, ordered by market cap.
    pub async fn fetch_markets(&self, per_page: usize, page: usize) -> Result<Vec<MarketTicker>> {
        let url = format!("{}/coins/markets", self.config.base_url);
        let per_page = per_page.to_string();
        let page_str = page.to_string();
        let params = [
            ("vs_currency", "usd"),
            ("order", "market_cap_desc"),
            ("per_page", per_page.as_str()),
            ("page", page_str.as_str()),
            ("sparkline", "false"),
            ("price_change_percentage", "24h"),
        ];

        let mut backoff = self.config.initial_backoff_secs;

        for attempt in 1..=self.config.max_retries {
            self.throttle().await;

            debug!(page, attempt, max = self.config.max_retries, "GET /coins/markets");

            let response = match self.http.get(&url).query(&params).send().await {
                Ok(resp) => resp,
                Err(e) if e.is_timeout() || e.is_connect() => {
                    warn!(attempt, error = %e, backoff_secs = backoff, "Transport error");
                    if attempt < self.config.max_retries {
                        tokio::time::sleep(Duration::from_secs_f64(backoff)).await;
                        backoff *= self.config.backoff_factor;
                    }
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let status = response.status();
            if status.is_success() {
                let tickers: Vec<MarketTicker> = response.json().await?;
                info!(page, count = tickers.len(), "Fetched markets page");
                return Ok(tickers);
            }

            if status.as_u16() == 429 || status.is_server_error() {
                warn!(
                    status = status.as_u16(),
                    backoff_secs = backoff,
                    "Upstream throttled or failing"
                );
                if attempt < self.config.max_retries {
                    tokio::time::sleep(Duration::from_secs_f64(backoff)).await;
                    backoff *= self.config.backoff_factor;
                }
                continue;
            }

            // Non-retryable client error
            return Err(DataError::Source(format!(
                "coins/markets returned {}",
                status
            )));
        }

        Err(DataError::Source(format!(
            "coins/markets page {} failed after {} attempts",
            page, self.config.max_retries
        )))
    }

    /// Fetch the top `count` assets by market cap, paginating as needed.
    ///
    /// Page N covers the rank window `[(N-1)*per_page, N*per_page)` on
    /// the source side, so `per_page` must stay constant across pages;
    /// the overshoot past `count` is truncated at the end.
    ///
    /// A page that exhausts its retries drops that page's assets without
    /// discarding earlier pages; the fetch only errors when nothing at
    /// all could be retrieved.
    pub async fn fetch_top(&self, count: usize) -> Result<Vec<MarketTicker>> {
        let per_page = self.config.page_size;
        let mut collected: Vec<MarketTicker> = Vec::with_capacity(count);
        let mut page = 1;

        while collected.len() < count {
            match self.fetch_markets(per_page, page).await {
                Ok(tickers) => {
                    let short_page = tickers.len() < per_page;
                    collected.extend(tickers);
                    if short_page {
                        // Source has no more assets to offer
                        break;
                    }
                }
                Err(e) if collected.is_empty() => return Err(e),
                Err(e) => {
                    warn!(page, error = %e, "Dropping failed page, keeping earlier pages");
                    break;
                }
            }

            page += 1;
        }

        collected.truncate(count);
        Ok(collected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(base_url: String) -> CoinGeckoConfig {
        CoinGeckoConfig {
            base_url,
            timeout_secs: 5,
            min_request_interval_ms: 0,
            max_retries: 3,
            initial_backoff_secs: 0.01,
            backoff_factor: 1.0,
            page_size: 2,
        }
    }

    fn ticker_json(id: &str, rank: i32) -> String {
        format!(
            r#"{{"id":"{id}","symbol":"{id}","name":"{id}","image":null,
                "market_cap_rank":{rank},"current_price":100.5,"market_cap":1000,
                "total_volume":50,"price_change_percentage_24h":1.2,
                "circulating_supply":21000000}}"#
        )
    }

    #[tokio::test]
    async fn fetch_markets_parses_page() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/coins/markets")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(format!("[{}]", ticker_json("bitcoin", 1)))
            .create_async()
            .await;

        let client = CoinGeckoClient::new(test_config(server.url())).unwrap();
        let tickers = client.fetch_markets(1, 1).await.unwrap();

        mock.assert_async().await;
        assert_eq!(tickers.len(), 1);
        assert_eq!(tickers[0].id, "bitcoin");
        assert_eq!(tickers[0].market_cap_rank, Some(1));
        assert!(tickers[0].current_price.is_some());
    }

    #[tokio::test]
    async fn fetch_markets_retries_on_rate_limit() {
        let mut server = mockito::Server::new_async().await;
        let throttled = server
            .mock("GET", "/coins/markets")
            .match_query(mockito::Matcher::Any)
            .with_status(429)
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/coins/markets")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(format!("[{}]", ticker_json("ethereum", 2)))
            .create_async()
            .await;

        let client = CoinGeckoClient::new(test_config(server.url())).unwrap();
        let tickers = client.fetch_markets(1, 1).await.unwrap();

        throttled.assert_async().await;
        ok.assert_async().await;
        assert_eq!(tickers[0].id, "ethereum");
    }

    #[tokio::test]
    async fn fetch_markets_gives_up_after_bounded_attempts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/coins/markets")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .expect(3)
            .create_async()
            .await;

        let client = CoinGeckoClient::new(test_config(server.url())).unwrap();
        let err = client.fetch_markets(1, 1).await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, DataError::Source(_)));
    }

    /// Mount page N of a rank-windowed universe: with a constant
    /// per_page of 2, page 1 is ranks 1-2 and page 2 is ranks 3-4.
    async fn mount_page(server: &mut mockito::Server, page: &str, body: String) {
        server
            .mock("GET", "/coins/markets")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("page".into(), page.into()),
                mockito::Matcher::UrlEncoded("per_page".into(), "2".into()),
            ]))
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;
    }

    #[tokio::test]
    async fn fetch_top_requests_constant_page_windows() {
        let mut server = mockito::Server::new_async().await;
        mount_page(
            &mut server,
            "1",
            format!(
                "[{},{}]",
                ticker_json("bitcoin", 1),
                ticker_json("ethereum", 2)
            ),
        )
        .await;
        mount_page(
            &mut server,
            "2",
            format!("[{},{}]", ticker_json("tether", 3), ticker_json("xrp", 4)),
        )
        .await;

        let client = CoinGeckoClient::new(test_config(server.url())).unwrap();
        let tickers = client.fetch_top(3).await.unwrap();

        // A shrunken last-page request would re-read the head of the
        // listing and never reach rank 3.
        let ids: Vec<&str> = tickers.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["bitcoin", "ethereum", "tether"]);
    }

    #[tokio::test]
    async fn fetch_top_stops_on_short_page() {
        let mut server = mockito::Server::new_async().await;
        mount_page(
            &mut server,
            "1",
            format!(
                "[{},{}]",
                ticker_json("bitcoin", 1),
                ticker_json("ethereum", 2)
            ),
        )
        .await;
        mount_page(&mut server, "2", format!("[{}]", ticker_json("tether", 3))).await;

        let client = CoinGeckoClient::new(test_config(server.url())).unwrap();
        let tickers = client.fetch_top(10).await.unwrap();

        assert_eq!(tickers.len(), 3);
        assert_eq!(tickers[2].id, "tether");
    }

    #[tokio::test]
    async fn final_failed_attempt_returns_without_sleeping() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/coins/markets")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let mut config = test_config(server.url());
        config.max_retries = 1;
        config.initial_backoff_secs = 5.0;

        let client = CoinGeckoClient::new(config).unwrap();
        let started = Instant::now();
        let err = client.fetch_markets(1, 1).await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, DataError::Source(_)));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn fetch_top_keeps_earlier_pages_on_later_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/coins/markets")
            .match_query(mockito::Matcher::UrlEncoded("page".into(), "1".into()))
            .with_status(200)
            .with_body(format!(
                "[{},{}]",
                ticker_json("bitcoin", 1),
                ticker_json("ethereum", 2)
            ))
            .create_async()
            .await;
        server
            .mock("GET", "/coins/markets")
            .match_query(mockito::Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(500)
            .create_async()
            .await;

        let client = CoinGeckoClient::new(test_config(server.url())).unwrap();
        let tickers = client.fetch_top(4).await.unwrap();

        assert_eq!(tickers.len(), 2);
    }
}
