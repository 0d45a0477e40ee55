//! Transport port and the reqwest-backed implementation.
//!
//! The transport owns base URL, bearer auth, timeout, and JSON coding.
//! Handle types above it perform no transport, retry, or auth logic.

use async_trait::async_trait;
use lodestone_core::config::ClientConfig;
use lodestone_core::error::{LodestoneError, Result};
use lodestone_core::models::{Space, TaskStatus};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

/// Response envelope returned by every API route.
///
/// Synchronous routes populate `data`; asynchronous routes populate `status`
/// with a task reference to poll.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiEnvelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,

    /// Transport status the envelope arrived with. Not part of the JSON
    /// payload; the transport fills it in so decode failures can report the
    /// status actually observed.
    #[serde(skip)]
    pub http_status: u16,
}

/// Port for posting JSON requests to the service.
///
/// `space` scopes the request to a logical workspace; `None` means the API
/// key's current workspace.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn post(&self, route: &str, body: Value, space: Option<&Space>) -> Result<ApiEnvelope>;
}

/// Serialize a request, post it, and decode the envelope's data payload.
///
/// A payload that does not match the expected shape surfaces as an API
/// failure carrying the transport status, not as a local error.
pub(crate) async fn post_expect<Req, Resp>(
    transport: &dyn ApiTransport,
    route: &str,
    req: &Req,
    space: Option<&Space>,
) -> Result<Resp>
where
    Req: Serialize + Sync,
    Resp: DeserializeOwned,
{
    let body = serde_json::to_value(req)?;
    let envelope = transport.post(route, body, space).await?;
    let http_status = envelope.http_status;
    let data = envelope.data.unwrap_or(Value::Null);
    serde_json::from_value(data).map_err(|e| LodestoneError::Api {
        status: http_status,
        message: format!("unexpected response shape for {}: {}", route, e),
    })
}

/// HTTP transport over reqwest.
pub struct HttpTransport {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl HttpTransport {
    /// Build a transport from resolved configuration.
    ///
    /// Fails when no API key is configured or the HTTP client cannot be
    /// constructed.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.value))
            .build()?;

        Ok(Self {
            http,
            api_base: config.api_base.value.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Compose the outgoing request: route URL, bearer auth, request id, and
    /// the space header matching the selector variant.
    fn build_request(
        &self,
        route: &str,
        body: &Value,
        space: Option<&Space>,
    ) -> Result<reqwest::Request> {
        let url = format!("{}/{}", self.api_base, route);
        let request_id = Uuid::new_v4();
        tracing::debug!(%request_id, route, "posting request");

        let mut request = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("X-Request-Id", request_id.to_string())
            .json(body);

        match space {
            Some(Space::Id(id)) => request = request.header("X-Space-Id", id),
            Some(Space::Handle(handle)) => request = request.header("X-Space-Handle", handle),
            None => {}
        }

        Ok(request.build()?)
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn post(&self, route: &str, body: Value, space: Option<&Space>) -> Result<ApiEnvelope> {
        let request = self.build_request(route, &body, space)?;

        let response = self.http.execute(request).await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::debug!(route, status = status.as_u16(), "request failed");
            return Err(LodestoneError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let mut envelope =
            response
                .json::<ApiEnvelope>()
                .await
                .map_err(|e| LodestoneError::Api {
                    status: status.as_u16(),
                    message: format!("unexpected response shape for {}: {}", route, e),
                })?;
        envelope.http_status = status.as_u16();

        Ok(envelope)
    }
}
