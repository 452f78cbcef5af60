//! Core HTTP operations with rate limiting
//!
//! This module issues the archive GET requests. Requests are paced by a
//! client-side rate limiter; failures are returned to the caller unchanged
//! and never retried here.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;

use crate::constants::laads;
use crate::errors::{TransportError, TransportResult};

/// Decoded response body of a GET
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Body served as `application/json`
    Json(Value),
    /// Any other body
    Text(String),
}

impl Payload {
    /// JSON value, if the response was JSON
    pub fn into_json(self) -> Option<Value> {
        match self {
            Payload::Json(value) => Some(value),
            Payload::Text(_) => None,
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, Payload::Json(_))
    }
}

/// HTTP operations handler
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
    rate_limiter: RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>,
}

impl HttpHandler {
    /// Creates a new HttpHandler with the given client and rate limiting
    ///
    /// # Errors
    ///
    /// Returns `TransportError::InvalidRateLimit` if `rate_limit_rps` is zero
    pub fn new(client: Client, rate_limit_rps: u32) -> TransportResult<Self> {
        let rate_limiter = Self::build_rate_limiter(rate_limit_rps)?;
        Ok(Self {
            client,
            rate_limiter,
        })
    }

    fn build_rate_limiter(
        rate_limit_rps: u32,
    ) -> TransportResult<RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>> {
        let rps = NonZeroU32::new(rate_limit_rps).ok_or(TransportError::InvalidRateLimit)?;
        Ok(RateLimiter::direct(Quota::per_second(rps)))
    }

    /// Sends a GET and returns the response if its status is a success
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to fetch
    /// * `query` - Query parameters appended to the URL
    /// * `token` - Bearer token for the `Authorization` header
    ///
    /// # Errors
    ///
    /// Returns `TransportError` on connection failure or a non-2xx status
    pub async fn get_response(
        &self,
        url: &str,
        query: &[(&str, &str)],
        token: Option<&str>,
    ) -> TransportResult<reqwest::Response> {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
            .await;

        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| TransportError::InvalidHeader)?;
            value.set_sensitive(true);
            request = request.header(AUTHORIZATION, value);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!("GET {} returned HTTP {}", url, status.as_u16());
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        tracing::debug!("Fetched response: {}", url);
        Ok(response)
    }

    /// Fetches a URL, decoding JSON bodies and returning anything else as text
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the request fails or a JSON body is malformed
    pub async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
        token: Option<&str>,
    ) -> TransportResult<Payload> {
        let response = self.get_response(url, query, token).await?;

        if is_json_response(&response) {
            let value = response.json::<Value>().await?;
            Ok(Payload::Json(value))
        } else {
            Ok(Payload::Text(response.text().await?))
        }
    }

    /// Get a reference to the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn is_json_response(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().starts_with(laads::JSON_CONTENT_TYPE))
        .unwrap_or(false)
}
