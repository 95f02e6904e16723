//! HTTP transport.
//!
//! Uses the curl crate (libcurl). Calls are blocking; async callers go
//! through `run_blocking`, which moves them onto tokio's blocking pool.

use std::sync::Arc;
use std::time::Duration;

use crate::config::HttpConfig;
use crate::error::{Error, Result};

/// Status and full body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u32,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The two requests the download chain needs.
pub trait HttpClient: Send + Sync {
    /// `POST` with a JSON body and the given extra headers.
    fn post_json(&self, url: &str, headers: &[(&str, &str)], body: &[u8]) -> Result<HttpResponse>;

    /// `GET`, following redirects.
    fn get(&self, url: &str) -> Result<HttpResponse>;
}

pub type SharedClient = Arc<dyn HttpClient>;

/// Runs a blocking closure on tokio's blocking pool.
pub async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::TaskJoin(e.to_string()))?
}

/// libcurl-backed client.
#[derive(Debug, Clone, Default)]
pub struct CurlClient {
    config: HttpConfig,
}

impl CurlClient {
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    pub fn shared(config: HttpConfig) -> SharedClient {
        Arc::new(Self::new(config))
    }

    fn easy(&self, url: &str) -> Result<curl::easy::Easy> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.config.connect_timeout())?;
        easy.timeout(non_zero(self.config.timeout()))?;
        if let Some(ua) = &self.config.user_agent {
            easy.useragent(ua)?;
        }
        Ok(easy)
    }
}

fn non_zero(d: Duration) -> Duration {
    if d.is_zero() {
        Duration::from_secs(300)
    } else {
        d
    }
}

/// Performs the transfer and collects the body.
fn perform(mut easy: curl::easy::Easy) -> Result<HttpResponse> {
    let mut body = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }
    let status = easy.response_code()?;
    Ok(HttpResponse { status, body })
}

impl HttpClient for CurlClient {
    fn post_json(&self, url: &str, headers: &[(&str, &str)], body: &[u8]) -> Result<HttpResponse> {
        let mut easy = self.easy(url)?;
        easy.post(true)?;
        easy.post_fields_copy(body)?;

        let mut list = curl::easy::List::new();
        for (k, v) in headers {
            list.append(&format!("{}: {}", k.trim(), v.trim()))?;
        }
        // Body is small; skip the 100-continue round trip.
        list.append("Expect:")?;
        easy.http_headers(list)?;

        tracing::debug!(url, bytes = body.len(), "POST");
        perform(easy)
    }

    fn get(&self, url: &str) -> Result<HttpResponse> {
        let easy = self.easy(url)?;
        tracing::debug!(url, "GET");
        perform(easy)
    }
}
