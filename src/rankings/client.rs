/**
 * ============================================================================
 * HTTP CLIENT MODULE
 * ============================================================================
 *
 * PURPOSE: Perform the POST exchange with the collector
 *
 * PROTOCOL:
 * 1. POST {api_url}{endpoint} with a JSON body (reqwest sets the content type)
 * 2. Status < 400: accepted, body ignored
 * 3. Status >= 400: rejected, error body read fully for logging
 *
 * The dispatcher talks to the collector only through the `Transport` trait,
 * so tests can substitute a recording transport.
 *
 * ============================================================================
 */

use crate::rankings::error::{RankingsError, Result};
use futures_util::future::BoxFuture;
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde_json::Value;

/// User agent sent with every collector request.
const USER_AGENT: &str = concat!("mc-rankings-rs/", env!("CARGO_PKG_VERSION"));

/// Status code and, for rejections, the raw error body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        self.status < 400
    }
}

/**
 * One HTTP POST towards the collector
 * Implementations must not retry; failures surface as `RankingsError::Network`
 */
pub trait Transport: Send + Sync {
    fn post<'a>(&'a self, url: &'a str, body: &'a Value) -> BoxFuture<'a, Result<TransportResponse>>;
}

/**
 * reqwest-backed transport
 * No request timeout is configured beyond reqwest's defaults
 */
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RankingsError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn post<'a>(&'a self, url: &'a str, body: &'a Value) -> BoxFuture<'a, Result<TransportResponse>> {
        Box::pin(async move {
            let response = self
                .client
                .post(url)
                .header(ACCEPT, "*/*")
                .json(body)
                .send()
                .await?;

            let status = response.status().as_u16();
            let body = if status >= 400 {
                response.text().await?
            } else {
                String::new()
            };

            Ok(TransportResponse { status, body })
        })
    }
}

/**
 * Join the configured base URL and an endpoint path
 * Tolerates a base URL edited without its trailing slash
 */
pub fn endpoint_url(api_url: &str, endpoint: &str) -> String {
    if api_url.ends_with('/') {
        format!("{}{}", api_url, endpoint)
    } else {
        format!("{}/{}", api_url, endpoint)
    }
}
