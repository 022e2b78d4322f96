//! WaniKani subjects fetcher
//!
//! Walks the paginated `/subjects` collection, following each page's
//! `next_url` cursor verbatim until the API stops returning one.
//!
//! Retry policy per page:
//! - `401` fails immediately (bad token, retrying cannot help)
//! - `429` waits twice the retry delay, then retries the same page
//! - any other status, a timeout, a refused or dropped connection or a
//!   body cut off mid-transfer waits the retry delay and retries the page
//! - once `max_retries` attempts are used up the whole fetch fails and
//!   everything gathered so far is dropped

use crate::subject::{RawSubject, SubjectPage};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// API revision this client understands
pub const WANIKANI_REVISION: &str = "20170710";

pub type Result<T> = std::result::Result<T, FetchError>;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("WaniKani API token is required but was not provided")]
    MissingToken,

    #[error("Authentication failed: invalid API token")]
    Unauthorized,

    #[error("Failed to fetch {url} after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Invalid JSON in response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Upstream API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchSettings {
    /// API root, e.g. `https://api.wanikani.com/v2`
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Attempts per page before giving up
    pub max_retries: u32,
    /// Pause between attempts; doubled after a rate-limit response
    pub retry_delay: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: crate::config::DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(crate::config::DEFAULT_API_TIMEOUT_SECS),
            max_retries: crate::config::DEFAULT_API_MAX_RETRIES,
            retry_delay: Duration::from_secs(crate::config::DEFAULT_API_RETRY_DELAY_SECS),
        }
    }
}

impl FetchSettings {
    pub fn subjects_url(&self) -> String {
        format!("{}/subjects", self.base_url.trim_end_matches('/'))
    }
}

/// Outcome of a single page attempt
enum Attempt {
    Page(SubjectPage),
    /// Retry after the given pause
    Retry { reason: String, pause: Duration },
}

/// Fetches every subject the token can see
pub struct SubjectFetcher {
    client: Client,
    settings: FetchSettings,
}

impl SubjectFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("wkdeck/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, settings })
    }

    /// Fetch all pages and return the accumulated subjects
    pub async fn fetch_all(&self, api_token: &str) -> Result<Vec<RawSubject>> {
        if api_token.trim().is_empty() {
            return Err(FetchError::MissingToken);
        }

        info!("Starting WaniKani API data extraction");

        let mut subjects = Vec::new();
        let mut next = Some(self.settings.subjects_url());
        let mut page_count = 0usize;

        while let Some(url) = next {
            let page = self.fetch_page(&url, api_token).await?;
            page_count += 1;
            subjects.extend(page.data);
            next = page.pages.next_url;

            info!(
                page = page_count,
                subjects = subjects.len(),
                total = ?page.total_count,
                "Fetched page"
            );
        }

        info!(
            "Successfully fetched {} subjects from {} pages",
            subjects.len(),
            page_count
        );
        Ok(subjects)
    }

    /// Fetch one page, retrying transient failures
    async fn fetch_page(&self, url: &str, api_token: &str) -> Result<SubjectPage> {
        let max = self.settings.max_retries;
        let mut last_error = String::from("no attempt made");

        for attempt in 1..=max {
            debug!("Requesting {} (attempt {}/{})", url, attempt, max);

            match self.try_page(url, api_token).await? {
                Attempt::Page(page) => return Ok(page),
                Attempt::Retry { reason, pause } => {
                    warn!("Attempt {}/{} for {} failed: {}", attempt, max, url, reason);
                    last_error = reason;

                    if attempt < max {
                        info!("Retrying in {:?}", pause);
                        tokio::time::sleep(pause).await;
                    }
                },
            }
        }

        Err(FetchError::RetriesExhausted {
            url: url.to_string(),
            attempts: max,
            last_error,
        })
    }

    async fn try_page(&self, url: &str, api_token: &str) -> Result<Attempt> {
        let delay = self.settings.retry_delay;

        let response = match self
            .client
            .get(url)
            .bearer_auth(api_token)
            .header("Wanikani-Revision", WANIKANI_REVISION)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if is_transient(&e) => {
                return Ok(Attempt::Retry {
                    reason: describe_transient(&e),
                    pause: delay,
                })
            },
            Err(e) => return Err(e.into()),
        };

        match response.status() {
            StatusCode::OK => {
                let body = match response.bytes().await {
                    Ok(body) => body,
                    Err(e) if is_transient(&e) => {
                        return Ok(Attempt::Retry {
                            reason: format!("reading body: {}", describe_transient(&e)),
                            pause: delay,
                        })
                    },
                    Err(e) => return Err(e.into()),
                };
                let page = serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
                    url: url.to_string(),
                    source,
                })?;
                Ok(Attempt::Page(page))
            },
            StatusCode::UNAUTHORIZED => Err(FetchError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => Ok(Attempt::Retry {
                reason: "rate limited (HTTP 429)".to_string(),
                pause: delay * 2,
            }),
            status => {
                let body = response.text().await.unwrap_or_else(|e| {
                    debug!("Could not read error body from {}: {}", url, e);
                    String::new()
                });
                Ok(Attempt::Retry {
                    reason: format!("HTTP {}: {}", status.as_u16(), truncate(&body, 200)),
                    pause: delay,
                })
            },
        }
    }
}

/// Network-level failures worth another attempt
///
/// Only a request that could never be sent (bad URL, builder or redirect
/// policy errors) is fatal. Timeouts, refused or reset connections and
/// bodies cut off mid-transfer are all retried.
fn is_transient(e: &reqwest::Error) -> bool {
    if e.is_builder() || e.is_redirect() {
        return false;
    }
    e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() || e.is_decode()
}

fn describe_transient(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timed out".to_string()
    } else {
        format!("connection error: {e}")
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
