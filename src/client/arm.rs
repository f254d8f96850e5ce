//! Azure Resource Manager REST client

use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::RateLimiter;
use log::{debug, trace};
use reqwest::header::HeaderMap;
use reqwest::{Client as HttpClient, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::pagination::{ArmPager, Pager};
use super::poller::{self, Operation};
use super::{HierarchyApi, ResourceGroupInfo, SubscriptionInfo, TenantInfo};
use crate::azure::auth::TokenCredential;
use crate::error::{ApiError, Error, Result};

/// API version for tenant and subscription listings
const SUBSCRIPTIONS_API_VERSION: &str = "2022-12-01";

/// API version for resource group listings
const RESOURCE_GROUPS_API_VERSION: &str = "2021-04-01";

/// Number of times a throttled (429) request is retried before giving up
const MAX_THROTTLE_RETRIES: usize = 3;

/// Shared client-side limiter type
pub type ArmRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Client for the Azure Resource Manager API.
///
/// Cloning is cheap: the HTTP connection pool, credential and rate limiter are shared.
#[derive(Clone)]
pub struct ArmClient {
    http: HttpClient,
    endpoint: String,
    scope: String,
    credential: Arc<dyn TokenCredential>,
    rate_limiter: Arc<ArmRateLimiter>,
}

impl ArmClient {
    /// Create a client for the given resource manager endpoint and token audience.
    pub fn new(
        http: HttpClient,
        endpoint: &str,
        audience: &str,
        credential: Arc<dyn TokenCredential>,
        rate_limiter: Arc<ArmRateLimiter>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            scope: format!("{}/.default", audience.trim_end_matches('/')),
            credential,
            rate_limiter,
        }
    }

    /// Build an absolute URL for a resource manager path.
    ///
    /// `path` may be a full ARM resource id and may already carry query parameters.
    pub fn url(&self, path: &str, api_version: &str) -> String {
        let separator = if path.contains('?') { '&' } else { '?' };
        format!(
            "{}{}{}api-version={}",
            self.endpoint, path, separator, api_version
        )
    }

    /// Start a paged listing at `url`.
    pub fn pager<T>(&self, url: String) -> Pager<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        Box::new(ArmPager::new(self.clone(), url))
    }

    /// GET a URL and deserialize the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.send(Method::GET, url, None).await?;
        response.json::<T>().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", url, e))
                .into()
        })
    }

    /// DELETE a resource and wait until the remote operation reaches a terminal state.
    ///
    /// A 404 means the resource is already gone and counts as success.
    pub async fn delete(&self, url: &str) -> Result<()> {
        match self.send(Method::DELETE, url, None).await {
            Ok(response) => self.finish(response).await,
            Err(Error::Api(ApiError::NotFound(_))) => {
                debug!("resource already deleted: {}", url);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// POST to an action endpoint, waiting on the operation if it runs asynchronously.
    pub async fn post(&self, url: &str, body: Option<&Value>) -> Result<()> {
        let response = self.send(Method::POST, url, body).await?;
        self.finish(response).await
    }

    /// PUT a resource body, waiting on the operation if it runs asynchronously.
    pub async fn put(&self, url: &str, body: &Value) -> Result<()> {
        let response = self.send(Method::PUT, url, Some(body)).await?;
        self.finish(response).await
    }

    /// Wait for a mutating call to complete.
    async fn finish(&self, response: Response) -> Result<()> {
        let status = response.status();
        if status != StatusCode::ACCEPTED && status != StatusCode::CREATED {
            return Ok(());
        }

        match Operation::from_headers(response.headers()) {
            Some(operation) => {
                let delay = poller::retry_after(response.headers());
                poller::poll_until_done(self, operation, delay).await
            }
            None => Ok(()),
        }
    }

    /// Make an authenticated request, returning the response on any 2xx status.
    pub(crate) async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Response> {
        let mut attempt = 0;
        loop {
            self.rate_limiter.until_ready().await;
            let token = self.credential.get_token(&self.scope).await?;

            trace!("{} {}", method, url);
            let mut request = self
                .http
                .request(method.clone(), url)
                .bearer_auth(&token.token);
            if let Some(body) = body {
                request = request.json(body);
            }
            let response = request.send().await.map_err(ApiError::from)?;

            match check_status(response).await {
                Err(ApiError::RateLimit(wait)) if attempt < MAX_THROTTLE_RETRIES => {
                    attempt += 1;
                    debug!(
                        "throttled on {} {}, retrying in {:?} (attempt {})",
                        method, url, wait, attempt
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(err) => return Err(err.into()),
                Ok(response) => return Ok(response),
            }
        }
    }
}

/// Map non-success statuses to API errors.
async fn check_status(response: Response) -> std::result::Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
        StatusCode::FORBIDDEN => Err(ApiError::Forbidden(error_message(response).await)),
        StatusCode::NOT_FOUND => Err(ApiError::NotFound(error_message(response).await)),
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = retry_after_secs(response.headers()).unwrap_or(60);
            Err(ApiError::RateLimit(Duration::from_secs(retry_after)))
        }
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            Err(ApiError::BadRequest(error_message(response).await))
        }
        status if status.is_server_error() => {
            Err(ApiError::ServerError(error_message(response).await))
        }
        _ => Err(ApiError::InvalidResponse(format!(
            "Unexpected status code: {}",
            status
        ))),
    }
}

/// Extract the ARM error message, falling back to the raw body.
async fn error_message(response: Response) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        code: String,
        message: String,
    }

    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => format!("{}: {}", body.error.code, body.error.message),
        Err(_) if text.is_empty() => status.to_string(),
        Err(_) => text,
    }
}

pub(crate) fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

impl HierarchyApi for ArmClient {
    fn tenants(&self) -> Pager<TenantInfo> {
        self.pager(self.url("/tenants", SUBSCRIPTIONS_API_VERSION))
    }

    fn subscriptions(&self) -> Pager<SubscriptionInfo> {
        self.pager(self.url("/subscriptions", SUBSCRIPTIONS_API_VERSION))
    }

    fn resource_groups(&self, subscription_id: &str) -> Pager<ResourceGroupInfo> {
        let path = format!("/subscriptions/{}/resourcegroups", subscription_id);
        self.pager(self.url(&path, RESOURCE_GROUPS_API_VERSION))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::azure::auth::{AccessToken, StaticTokenCredential};
    use crate::client::pagination::collect_all;
    use chrono::Utc;
    use governor::Quota;
    use mockito::Matcher;
    use std::num::NonZeroU32;

    /// Client pointed at a mock server with a fixed bearer token.
    pub(crate) fn test_client(endpoint: &str) -> ArmClient {
        let credential = StaticTokenCredential::new(AccessToken {
            token: "test-token".to_string(),
            expires_at: Utc::now() + chrono::Duration::hours(1),
        });
        let quota = Quota::per_second(NonZeroU32::new(1000).unwrap());
        ArmClient::new(
            HttpClient::new(),
            endpoint,
            "https://management.azure.com/",
            Arc::new(credential),
            Arc::new(RateLimiter::direct(quota)),
        )
    }

    #[test]
    fn test_url_appends_api_version() {
        let client = test_client("https://management.azure.com/");
        assert_eq!(
            client.url("/subscriptions", "2022-12-01"),
            "https://management.azure.com/subscriptions?api-version=2022-12-01"
        );
        assert_eq!(
            client.url("/x/vm?forceDeletion=true", "2024-03-01"),
            "https://management.azure.com/x/vm?forceDeletion=true&api-version=2024-03-01"
        );
    }

    #[tokio::test]
    async fn test_subscriptions_follow_next_link() {
        let mut server = mockito::Server::new_async().await;
        let next = format!("{}/subscriptions?api-version=2022-12-01&page=2", server.url());

        let _first = server
            .mock("GET", "/subscriptions")
            .match_query(Matcher::Exact("api-version=2022-12-01".into()))
            .match_header("authorization", "Bearer test-token")
            .with_status(200)
            .with_body(format!(
                r#"{{"value": [{{"subscriptionId": "s1"}}], "nextLink": "{}"}}"#,
                next
            ))
            .create_async()
            .await;
        let _second = server
            .mock("GET", "/subscriptions")
            .match_query(Matcher::Exact("api-version=2022-12-01&page=2".into()))
            .with_status(200)
            .with_body(r#"{"value": [{"subscriptionId": "s2"}]}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let subs = collect_all(client.subscriptions()).await.unwrap();
        let ids: Vec<_> = subs.iter().map(|s| s.subscription_id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2"]);
    }

    #[tokio::test]
    async fn test_forbidden_maps_arm_error_message() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/tenants")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(r#"{"error": {"code": "AuthorizationFailed", "message": "nope"}}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = collect_all(client.tenants()).await.unwrap_err();
        match err {
            Error::Api(ApiError::Forbidden(msg)) => {
                assert_eq!(msg, "AuthorizationFailed: nope")
            }
            other => panic!("Expected Forbidden, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_not_found_is_success() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("DELETE", "/subscriptions/s1/resourceGroups/rg/providers/x/y")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let url = client.url("/subscriptions/s1/resourceGroups/rg/providers/x/y", "2024-01-01");
        assert!(client.delete(&url).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_polls_async_operation() {
        let mut server = mockito::Server::new_async().await;
        let op_url = format!("{}/operations/op1?api-version=2024-01-01", server.url());

        let _delete = server
            .mock("DELETE", "/subscriptions/s1/providers/x/y")
            .match_query(Matcher::Any)
            .with_status(202)
            .with_header("azure-asyncoperation", &op_url)
            .with_header("retry-after", "0")
            .create_async()
            .await;
        let poll = server
            .mock("GET", "/operations/op1")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("retry-after", "0")
            .with_body(r#"{"status": "Succeeded"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let url = client.url("/subscriptions/s1/providers/x/y", "2024-01-01");
        client.delete(&url).await.unwrap();
        poll.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_reports_failed_operation() {
        let mut server = mockito::Server::new_async().await;
        let op_url = format!("{}/operations/op2", server.url());

        let _delete = server
            .mock("DELETE", "/subscriptions/s1/providers/x/z")
            .match_query(Matcher::Any)
            .with_status(202)
            .with_header("azure-asyncoperation", &op_url)
            .with_header("retry-after", "0")
            .create_async()
            .await;
        let _poll = server
            .mock("GET", "/operations/op2")
            .with_status(200)
            .with_body(r#"{"status": "Failed"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let url = client.url("/subscriptions/s1/providers/x/z", "2024-01-01");
        match client.delete(&url).await {
            Err(Error::Api(ApiError::OperationFailed { status, .. })) => {
                assert_eq!(status, "Failed")
            }
            other => panic!("Expected OperationFailed, got {:?}", other),
        }
    }
}
