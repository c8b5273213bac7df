//! Data fetcher: one streaming GET per invocation.
//!
//! The response body is streamed to `<scratch>.partial` and renamed into
//! place once complete. Any failure removes the partial file; nothing is
//! retried.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use jet_common::{JetError, JetResult};
use reqwest::Client;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::config::{Credentials, ProviderConfig};
use crate::resolve::RequestDescriptor;

/// Header carrying the provider API key.
pub const KEY_HEADER: &str = "X-ECMWF-KEY";
/// Header carrying the account email.
pub const EMAIL_HEADER: &str = "X-ECMWF-EMAIL";

/// A completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Issues provider requests.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    credentials: Option<Credentials>,
}

impl Fetcher {
    pub fn new(provider: &ProviderConfig) -> JetResult<Self> {
        let mut builder = Client::builder().user_agent(concat!("jetstream/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = provider.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| JetError::Fetch(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            credentials: provider.credentials.clone(),
        })
    }

    /// Download the dataset for `request` to its scratch path.
    #[instrument(skip(self, request), fields(endpoint = %request.endpoint()))]
    pub async fn fetch(&self, request: &RequestDescriptor) -> JetResult<FetchOutcome> {
        let scratch = request.scratch_path();
        if let Some(parent) = scratch.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let partial = partial_path(scratch);

        info!(
            date = %request.dates().to_mars(),
            level = %request.level(),
            "Requesting data from provider"
        );

        let mut req = self.client.get(request.endpoint()).query(request.query());
        if let Some(creds) = &self.credentials {
            req = req
                .header(KEY_HEADER, &creds.key)
                .header(EMAIL_HEADER, &creds.email);
        }

        let response = req
            .send()
            .await
            .map_err(|e| JetError::Fetch(format!("HTTP request failed: {}", e)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(JetError::Fetch(format!("provider returned HTTP {}", status)));
        }

        let bytes = match stream_to_file(response, &partial).await {
            Ok(0) => Err(JetError::Fetch("provider returned an empty body".to_string())),
            other => other,
        };
        let bytes = match bytes {
            Ok(bytes) => bytes,
            Err(e) => {
                if let Err(rm) = fs::remove_file(&partial).await {
                    warn!(path = %partial.display(), error = %rm, "Failed to remove partial download");
                }
                return Err(e);
            }
        };

        fs::rename(&partial, scratch).await?;
        info!(path = %scratch.display(), bytes, "Download completed");
        Ok(FetchOutcome {
            path: scratch.to_path_buf(),
            bytes,
        })
    }
}

/// `<path>.partial`
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".partial");
    PathBuf::from(name)
}

/// Stream the response body into `path`, returning the byte count.
async fn stream_to_file(response: reqwest::Response, path: &Path) -> JetResult<u64> {
    let mut file = fs::File::create(path).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk =
            chunk.map_err(|e| JetError::Fetch(format!("Error reading response body: {}", e)))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;
    debug!(path = %path.display(), bytes = written, "Response body written");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("/tmp/a/windspeed.nc")),
            PathBuf::from("/tmp/a/windspeed.nc.partial")
        );
    }
}
