//! Long-running operation polling
//!
//! Asynchronous ARM operations answer 201/202 with either an `Azure-AsyncOperation`
//! status URL or a `Location` URL. Polling continues until a terminal state; there is
//! no fixed timeout, the caller's cancellation is the only bound.

use std::time::Duration;

use log::trace;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde::Deserialize;

use super::arm::{ArmClient, retry_after_secs};
use crate::error::{ApiError, Result};

/// Poll interval used when the service does not send `Retry-After`
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How an operation reports its progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// URL returning `{ "status": ... }`
    AsyncOperation(String),
    /// URL returning 202 while running and 200/204 once done
    Location(String),
}

impl Operation {
    /// Pick the tracking URL from response headers, preferring `Azure-AsyncOperation`.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        header("azure-asyncoperation")
            .map(Operation::AsyncOperation)
            .or_else(|| header("location").map(Operation::Location))
    }
}

/// `Retry-After` from a response, or the default interval.
pub fn retry_after(headers: &HeaderMap) -> Duration {
    retry_after_secs(headers)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_POLL_INTERVAL)
}

#[derive(Debug, Deserialize)]
struct OperationStatus {
    status: String,
}

/// Poll an operation until it succeeds or reaches a failed terminal state.
pub async fn poll_until_done(
    client: &ArmClient,
    operation: Operation,
    initial_delay: Duration,
) -> Result<()> {
    let mut delay = initial_delay;
    loop {
        tokio::time::sleep(delay).await;

        match &operation {
            Operation::AsyncOperation(url) => {
                let response = client.send(Method::GET, url, None).await?;
                delay = retry_after(response.headers());
                let body: OperationStatus = response.json().await.map_err(|e| {
                    ApiError::InvalidResponse(format!("Failed to parse operation status: {}", e))
                })?;

                trace!("operation {} status {}", url, body.status);
                match body.status.as_str() {
                    "Succeeded" => return Ok(()),
                    "Failed" | "Canceled" | "Cancelled" => {
                        return Err(ApiError::OperationFailed {
                            status: body.status,
                            url: url.clone(),
                        }
                        .into());
                    }
                    _ => {}
                }
            }
            Operation::Location(url) => {
                let response = client.send(Method::GET, url, None).await?;
                trace!("operation {} returned {}", url, response.status());
                if response.status() != StatusCode::ACCEPTED {
                    return Ok(());
                }
                delay = retry_after(response.headers());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::arm::tests::test_client;
    use mockito::Matcher;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_operation_prefers_async_operation_header() {
        let mut headers = HeaderMap::new();
        headers.insert("location", HeaderValue::from_static("https://loc"));
        headers.insert("azure-asyncoperation", HeaderValue::from_static("https://op"));

        assert_eq!(
            Operation::from_headers(&headers),
            Some(Operation::AsyncOperation("https://op".to_string()))
        );
    }

    #[test]
    fn test_operation_falls_back_to_location() {
        let mut headers = HeaderMap::new();
        headers.insert("location", HeaderValue::from_static("https://loc"));

        assert_eq!(
            Operation::from_headers(&headers),
            Some(Operation::Location("https://loc".to_string()))
        );
        assert_eq!(Operation::from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn test_retry_after_default() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), DEFAULT_POLL_INTERVAL);

        headers.insert("retry-after", HeaderValue::from_static("2"));
        assert_eq!(retry_after(&headers), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_location_polling_stops_on_ok() {
        let mut server = mockito::Server::new_async().await;
        let url = format!("{}/locations/op", server.url());

        let _done = server
            .mock("GET", "/locations/op")
            .match_query(Matcher::Any)
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        let client = test_client(&server.url());
        poll_until_done(&client, Operation::Location(url), Duration::ZERO)
            .await
            .unwrap();
    }
}
