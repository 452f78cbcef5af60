//! File download operations with atomic writes and streaming
//!
//! The response body is streamed chunk by chunk into a temporary sibling of
//! the destination, which is renamed into place once the transfer completes.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::app::client::http::HttpHandler;
use crate::app::url::last_segment;
use crate::constants::files;
use crate::errors::{TransportError, TransportResult};

/// File download operations handler
pub struct DownloadHandler<'a> {
    http_handler: &'a HttpHandler,
    token: Option<&'a str>,
}

impl<'a> DownloadHandler<'a> {
    /// Creates a new DownloadHandler with the given HTTP handler and token
    pub fn new(http_handler: &'a HttpHandler, token: Option<&'a str>) -> Self {
        Self {
            http_handler,
            token,
        }
    }

    /// Downloads `url` to `output` and returns the written path
    ///
    /// When `output` is an existing directory, or ends with a path separator,
    /// the file name is taken from the URL's last path segment. Missing parent
    /// directories are created.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if:
    /// - The HTTP request fails or returns a non-2xx status
    /// - The URL has no file name to use inside a directory
    /// - File I/O operations fail
    pub async fn download_file(&self, url: &str, output: &Path) -> TransportResult<PathBuf> {
        let destination = resolve_destination(url, output)?;

        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let temp_path = temp_path_for(&destination);

        match self.stream_to(url, &temp_path).await {
            Ok(bytes) => {
                if let Err(e) = tokio::fs::rename(&temp_path, &destination).await {
                    let _ = tokio::fs::remove_file(&temp_path).await;
                    tracing::error!("Could not move {} into place: {}", temp_path.display(), e);
                    return Err(TransportError::AtomicOperationFailed {
                        temp_path,
                        final_path: destination,
                    });
                }
                tracing::info!(
                    "Downloaded {} ({} bytes) to {}",
                    url,
                    bytes,
                    destination.display()
                );
                Ok(destination)
            }
            Err(e) => {
                if tokio::fs::try_exists(&temp_path).await.unwrap_or(false) {
                    let _ = tokio::fs::remove_file(&temp_path).await;
                }
                tracing::error!("Download of {} failed: {}", url, e);
                Err(e)
            }
        }
    }

    async fn stream_to(&self, url: &str, temp_path: &Path) -> TransportResult<u64> {
        let response = self.http_handler.get_response(url, &[], self.token).await?;

        let mut file = File::create(temp_path).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }
}

/// Works out the final file path for a download
fn resolve_destination(url: &str, output: &Path) -> TransportResult<PathBuf> {
    let names_directory = output.is_dir()
        || output
            .as_os_str()
            .to_str()
            .map(|s| s.ends_with(std::path::MAIN_SEPARATOR) || s.ends_with('/'))
            .unwrap_or(false);

    if !names_directory {
        return Ok(output.to_path_buf());
    }

    let file_name = last_segment(url).ok_or_else(|| TransportError::InvalidUrl {
        url: url.to_string(),
        error: "no file name in URL path".to_string(),
    })?;
    Ok(output.join(file_name))
}

fn temp_path_for(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(files::TEMP_FILE_SUFFIX);
    destination.with_file_name(name)
}
