//! HTTP retry helpers for transient errors.
//!
//! Provider clients call [`send_json`] instead of
//! `reqwest::RequestBuilder::send()` directly, so every request gets
//! automatic retry with exponential backoff on connection failures,
//! timeouts, HTTP 429, and HTTP 5xx.
//!
//! ```ignore
//! let body = retry::send_json(|| client.get(&url).query(&params)).await?;
//! ```

use std::time::Duration;

use crate::ClientError;

/// Maximum number of retry attempts for transient HTTP errors.
///
/// With exponential backoff (1s, 2s, 4s) the total wait before giving up
/// is 7 seconds, on top of the per-request timeout.
const MAX_RETRIES: u32 = 3;

/// Maximum length of a response body kept on [`ClientError::Status`].
const BODY_PREVIEW_LEN: usize = 2_000;

/// Sends an HTTP request and parses the response body as JSON.
///
/// The `build_request` closure is called on each attempt because
/// builders are consumed by `.send()`.
///
/// Does **not** retry HTTP 4xx (except 429). Those come back as
/// [`ClientError::Status`] with the response body attached, since some
/// APIs (OSRM among them) explain the failure in a JSON body.
///
/// # Errors
///
/// Returns [`ClientError`] if the request fails after all retries, the
/// server returns an error status, or the body is not valid JSON.
pub async fn send_json<F>(build_request: F) -> Result<serde_json::Value, ClientError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = send_inner(&build_request, MAX_RETRIES).await?;
    let text = response.text().await?;
    Ok(serde_json::from_str(&text)?)
}

/// Core retry loop. Returns the first 2xx/3xx response.
async fn send_inner<F>(build_request: &F, max_retries: u32) -> Result<reqwest::Response, ClientError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            let delay = backoff(attempt);
            log::warn!("  retry {attempt}/{max_retries} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) => {
                if is_transient(&e) && attempt < max_retries {
                    log::warn!("  transient error: {e}");
                    attempt += 1;
                    continue;
                }
                return Err(ClientError::Http(e));
            }
            Ok(response) => {
                let status = response.status();

                if is_retryable_status(status) && attempt < max_retries {
                    log::warn!("  HTTP {status}");
                    attempt += 1;
                    continue;
                }

                if status.is_client_error() || status.is_server_error() {
                    let body = response.text().await.ok().map(|mut text| {
                        if text.len() > BODY_PREVIEW_LEN {
                            let mut end = BODY_PREVIEW_LEN;
                            while !text.is_char_boundary(end) {
                                end -= 1;
                            }
                            text.truncate(end);
                        }
                        text
                    });
                    return Err(ClientError::Status {
                        status: status.as_u16(),
                        body,
                    });
                }

                return Ok(response);
            }
        }
    }
}

/// Delay before retry number `attempt` (1-based): 1s, 2s, 4s, ...
fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.saturating_sub(1).min(16))
}

/// 429 and 5xx are worth retrying; everything else is final.
fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
}
