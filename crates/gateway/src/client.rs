//! HTTP implementation of the verification gateway.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use pingate_core::pin::{
    ExecutionOutcome, GatewayError, PinCode, VerificationGateway, VerifyOutcome,
};
use pingate_shared::types::PendingAction;
use pingate_shared::{AuthContext, EndpointConfig, GatewayConfig};

use crate::auth::{IDEMPOTENCY_KEY, authorize};
use crate::wire::{
    AckResponse, CommitRequest, ErrorBody, ExecuteRequest, ExecuteResponse, VerifyRequest,
};

/// A settled HTTP exchange that was neither a 401 nor a 5xx.
struct Reply {
    status: StatusCode,
    body: String,
}

/// Authorization service client.
///
/// Each call is a single POST. The client never retries; the caller decides
/// what a failure means.
pub struct HttpGateway {
    client: Client,
    base_url: String,
    endpoints: EndpointConfig,
    auth: Arc<AuthContext>,
}

impl HttpGateway {
    /// Builds a client for the configured service.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` if the HTTP client cannot be built.
    pub fn new(config: &GatewayConfig, auth: Arc<AuthContext>) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(format!("pingate/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            endpoints: config.endpoints.clone(),
            auth,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        idempotency_key: Option<String>,
    ) -> Result<Reply, GatewayError> {
        let mut request = authorize(self.client.post(self.url(path)).json(body), &self.auth);
        if let Some(key) = idempotency_key {
            request = request.header(IDEMPOTENCY_KEY, key);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        debug!(path, status = status.as_u16(), "authorization service replied");

        if status == StatusCode::UNAUTHORIZED {
            warn!(path, "authorization service reported an expired session");
            return Err(GatewayError::SessionExpired);
        }
        if status.is_server_error() {
            warn!(path, status = status.as_u16(), "authorization service failed");
            return Err(GatewayError::Server {
                status: status.as_u16(),
                message: ErrorBody::parse(&body).reason(),
            });
        }
        Ok(Reply { status, body })
    }
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Transport(err.to_string())
    }
}

fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, GatewayError> {
    serde_json::from_str(body)
        .map_err(|e| GatewayError::InvalidResponse(format!("Failed to parse response: {e}")))
}

/// Interprets the answer to a verify or commit call.
fn ack_outcome(reply: &Reply) -> Result<VerifyOutcome, GatewayError> {
    if reply.status.is_success() {
        // An empty 2xx body carries no refusal.
        if reply.body.trim().is_empty() {
            return Ok(VerifyOutcome::Accepted);
        }
        let ack: AckResponse = parse_json(&reply.body)?;
        return Ok(if ack.ok {
            VerifyOutcome::Accepted
        } else {
            VerifyOutcome::Rejected {
                reason: ack.failure.reason(),
            }
        });
    }
    if reply.status.is_client_error() {
        return Ok(VerifyOutcome::Rejected {
            reason: ErrorBody::parse(&reply.body).reason(),
        });
    }
    Err(GatewayError::InvalidResponse(format!(
        "unexpected status {}",
        reply.status
    )))
}

/// Interprets the answer to an execute call.
fn execution_outcome(reply: &Reply) -> Result<ExecutionOutcome, GatewayError> {
    if reply.status.is_success() {
        let response: ExecuteResponse = parse_json(&reply.body)?;
        if !response.success {
            return Ok(ExecutionOutcome::Rejected {
                reason: response.failure.reason(),
            });
        }
        return response
            .reference
            .filter(|r| !r.trim().is_empty())
            .map(|reference| ExecutionOutcome::Executed { reference })
            .ok_or_else(|| {
                GatewayError::InvalidResponse("Missing reference in successful response".into())
            });
    }
    if reply.status.is_client_error() {
        return Ok(ExecutionOutcome::Rejected {
            reason: ErrorBody::parse(&reply.body).reason(),
        });
    }
    Err(GatewayError::InvalidResponse(format!(
        "unexpected status {}",
        reply.status
    )))
}

#[async_trait]
impl VerificationGateway for HttpGateway {
    async fn verify_current(&self, pin: &PinCode) -> Result<VerifyOutcome, GatewayError> {
        let body = VerifyRequest { pin: pin.expose() };
        let reply = self
            .post(&self.endpoints.verify_current, &body, None)
            .await?;
        ack_outcome(&reply)
    }

    async fn commit_new(&self, pin: &PinCode) -> Result<VerifyOutcome, GatewayError> {
        let body = CommitRequest {
            new_pin: pin.expose(),
        };
        let reply = self.post(&self.endpoints.commit_new, &body, None).await?;
        ack_outcome(&reply)
    }

    async fn execute_action(
        &self,
        pin: &PinCode,
        action: &PendingAction,
    ) -> Result<ExecutionOutcome, GatewayError> {
        let body = ExecuteRequest {
            pin: pin.expose(),
            action,
        };
        let reply = self
            .post(
                &self.endpoints.execute_action,
                &body,
                Some(action.id.to_string()),
            )
            .await?;
        execution_outcome(&reply)
    }
}
