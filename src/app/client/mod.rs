//! HTTP transport for the LAADS archive
//!
//! This module provides the transport every catalog node talks through:
//! authenticated GETs that decode JSON listings, and streaming downloads.
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `http`: Core GET operations with rate limiting
//! - `download`: Streaming file downloads with atomic writes

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::TransportResult;

pub mod config;
pub mod download;
pub mod http;

pub use config::ClientConfig;
pub use http::Payload;

use download::DownloadHandler;
use http::HttpHandler;

/// Transport handle for the LAADS archive
///
/// Cheap to clone: clones share the underlying connection pool and rate
/// limiter, while each clone owns its copy of the bearer token.
#[derive(Debug, Clone)]
pub struct LaadsClient {
    http_handler: Arc<HttpHandler>,
    base_url: String,
    token: Option<String>,
}

impl LaadsClient {
    /// Creates a transport from configuration
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the HTTP client cannot be built or the
    /// rate limit is zero
    pub fn new(config: &ClientConfig) -> TransportResult<Self> {
        let client = config.build_http_client()?;
        let http_handler = HttpHandler::new(client, config.rate_limit_rps)?;

        Ok(Self {
            http_handler: Arc::new(http_handler),
            base_url: config.base_url.clone(),
            token: config.api_token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Replaces the bearer token carried by this handle
    pub fn set_api_token(&mut self, token: impl Into<String>) {
        let token = token.into();
        self.token = (!token.is_empty()).then_some(token);
    }

    /// Returns a copy of this handle carrying `token`
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        let mut client = self.clone();
        client.set_api_token(token);
        client
    }

    pub fn api_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Root URL of the archive tree
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Performs a GET, returning decoded JSON or raw text by content type
    ///
    /// # Errors
    ///
    /// Returns `TransportError` on connection failure or a non-2xx status
    pub async fn get(&self, url: &str, query: &[(&str, &str)]) -> TransportResult<Payload> {
        self.http_handler
            .get(url, query, self.token.as_deref())
            .await
    }

    /// Streams `url` to `output` and returns the written file path
    ///
    /// See [`DownloadHandler::download_file`] for how `output` is interpreted.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` on HTTP or file system failure
    pub async fn download(&self, url: &str, output: &Path) -> TransportResult<PathBuf> {
        let download_handler = DownloadHandler::new(&self.http_handler, self.token.as_deref());
        download_handler.download_file(url, output).await
    }
}
