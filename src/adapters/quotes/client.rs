//! Quote HTTP Client - Shared REST Client for Quote Services
//!
//! Wraps reqwest with a request timeout and uniform error mapping
//! for the 0x, Odos and DefiLlama APIs. Failures are surfaced as-is;
//! the quote session re-requests on the next edit instead of retrying.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::types::ApiErrorBody;
use crate::errors::QuoteError;

/// Configuration for the quote HTTP client.
#[derive(Debug, Clone)]
pub struct QuoteClientConfig {
  /// Request timeout.
  pub timeout: Duration,
  /// User agent sent with every request.
  pub user_agent: String,
}

impl Default for QuoteClientConfig {
  fn default() -> Self {
    Self {
      timeout: Duration::from_secs(10),
      user_agent: concat!("baseflow/", env!("CARGO_PKG_VERSION")).to_string(),
    }
  }
}

/// HTTP client shared by all quote adapters.
#[derive(Debug, Clone)]
pub struct QuoteHttpClient {
  http: Client,
}

impl QuoteHttpClient {
  /// Create a new client.
  pub fn new(config: QuoteClientConfig) -> Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .user_agent(config.user_agent)
      .pool_max_idle_per_host(5)
      .build()
      .context("Failed to build HTTP client")?;

    Ok(Self { http })
  }

  /// GET `url` with query parameters and extra headers, decoding JSON.
  ///
  /// `fallback_reason` is reported when an error body carries no reason.
  pub async fn get_json<T: DeserializeOwned>(
    &self,
    url: &str,
    query: &[(&str, String)],
    headers: &[(&'static str, String)],
    fallback_reason: &str,
  ) -> Result<T, QuoteError> {
    let mut request = self.http.get(url).query(query);
    for (name, value) in headers {
      request = request.header(*name, value.as_str());
    }
    self.execute(request, "GET", url, fallback_reason).await
  }

  /// POST a JSON body to `url`, decoding the JSON response.
  pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
    &self,
    url: &str,
    body: &B,
    fallback_reason: &str,
  ) -> Result<T, QuoteError> {
    let request = self.http.post(url).json(body);
    self.execute(request, "POST", url, fallback_reason).await
  }

  async fn execute<T: DeserializeOwned>(
    &self,
    request: RequestBuilder,
    method: &str,
    url: &str,
    fallback_reason: &str,
  ) -> Result<T, QuoteError> {
    let response = request.send().await.map_err(|e| {
      warn!(method, url, error = %e, "Quote request failed");
      QuoteError::Transport(e)
    })?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
      let reason = extract_reason(&body, fallback_reason);
      warn!(method, url, status = status.as_u16(), %reason, "Quote service error");
      return Err(QuoteError::Upstream {
        status: status.as_u16(),
        reason,
      });
    }

    debug!(method, url, bytes = body.len(), "Quote service responded");
    serde_json::from_str(&body).map_err(|e| QuoteError::Malformed(e.to_string()))
  }
}

/// Pull a human-readable reason out of an error body.
///
/// Order: `reason`, first `validationErrors[].reason`, `message`,
/// `detail`, then `fallback`.
pub fn extract_reason(body: &str, fallback: &str) -> String {
  let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) else {
    return fallback.to_string();
  };

  parsed
    .reason
    .or_else(|| {
      parsed
        .validation_errors
        .into_iter()
        .find_map(|v| v.reason)
    })
    .or(parsed.message)
    .or(parsed.detail)
    .filter(|r| !r.is_empty())
    .unwrap_or_else(|| fallback.to_string())
}
