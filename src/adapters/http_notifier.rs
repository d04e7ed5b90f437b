//! HTTP client for the notification/email gateway.
//!
//! The ledger treats the gateway as fire-and-forget: callers log failures and
//! move on. A consecutive-failures circuit breaker keeps a dead gateway from
//! stalling purchase requests on timeouts.

use std::time::Duration;

use async_trait::async_trait;
use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::Client;
use serde::Serialize;
use uuid::Uuid;

use crate::ports::{DeliveryReceipt, GatewayError, Mailer, Notifier};

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Serialize)]
struct NotificationPayload<'a> {
    user_id: Uuid,
    title: &'a str,
    body: &'a str,
}

#[derive(Serialize)]
struct EmailPayload<'a> {
    to: &'a str,
    subject: &'a str,
    text: &'a str,
    html: &'a str,
}

/// Client for the platform's notification/email gateway.
#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>,
}

impl GatewayClient {
    pub fn new(base_url: String) -> Self {
        Self::with_circuit_breaker(base_url, 3, 60)
    }

    pub fn with_circuit_breaker(
        base_url: String,
        failure_threshold: u32,
        reset_timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        let backoff = backoff::equal_jittered(
            Duration::from_secs(reset_timeout_secs),
            Duration::from_secs(reset_timeout_secs * 2),
        );
        let policy = failure_policy::consecutive_failures(failure_threshold, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        GatewayClient {
            client,
            base_url,
            circuit_breaker,
        }
    }

    pub fn circuit_state(&self) -> &'static str {
        if self.circuit_breaker.is_call_permitted() {
            "closed"
        } else {
            "open"
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn post_json<T: Serialize>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<reqwest::Response, GatewayError> {
        let url = self.endpoint(path);
        let client = self.client.clone();
        let body =
            serde_json::to_value(payload).map_err(|e| GatewayError::Request(e.to_string()))?;

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client
                    .post(&url)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| GatewayError::Request(e.to_string()))?;

                if !response.status().is_success() {
                    return Err(GatewayError::Request(format!(
                        "gateway returned status {}",
                        response.status()
                    )));
                }

                Ok(response)
            })
            .await;

        match result {
            Ok(response) => Ok(response),
            Err(FailsafeError::Rejected) => Err(GatewayError::CircuitOpen),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }
}

#[async_trait]
impl Notifier for GatewayClient {
    async fn notify(&self, user_id: Uuid, title: &str, body: &str) -> Result<(), GatewayError> {
        self.post_json(
            "notifications",
            &NotificationPayload {
                user_id,
                title,
                body,
            },
        )
        .await?;

        Ok(())
    }
}

#[async_trait]
impl Mailer for GatewayClient {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        text: &str,
        html: &str,
    ) -> Result<DeliveryReceipt, GatewayError> {
        let response = self
            .post_json(
                "emails",
                &EmailPayload {
                    to,
                    subject,
                    text,
                    html,
                },
            )
            .await?;

        response
            .json::<DeliveryReceipt>()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }
}
