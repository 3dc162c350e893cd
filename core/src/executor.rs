//! The request executor.
//!
//! # Design
//! `execute` resolves a descriptor against the base location, picks the
//! timeout for the (memoized) device class, composes cancellation, and then
//! drives the transport and the cancellation watcher side by side on the
//! calling task. When the watcher fires first the effective token is
//! cancelled and the executor keeps awaiting the transport, which is expected
//! to return promptly. Whichever source fired before the transport settled
//! decides the classification.
//!
//! The watcher future (and its timer) and the composed token are owned by the
//! `execute` frame, so every exit path releases them.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::cancel::ComposedCancel;
use crate::classify::{classify, RawFailure};
use crate::config::{ClientConfig, ConfigError};
use crate::device::{DeviceClassifier, TimeoutPolicy};
use crate::error::Outcome;
use crate::health::HealthBus;
use crate::http::{HttpRequest, OutgoingRequest};
use crate::origin::BaseLocation;
use crate::transport::{ReqwestTransport, Transport};

#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    base: BaseLocation,
    device: Arc<DeviceClassifier>,
    policy: TimeoutPolicy,
    health: HealthBus,
}

impl RequestExecutor {
    pub fn new(
        transport: Arc<dyn Transport>,
        base: BaseLocation,
        device: Arc<DeviceClassifier>,
        health: HealthBus,
    ) -> Self {
        Self {
            transport,
            base,
            device,
            policy: TimeoutPolicy::default(),
            health,
        }
    }

    /// Executor over `ReqwestTransport`, configured from `config`.
    pub fn from_config(
        config: &ClientConfig,
        device: Arc<DeviceClassifier>,
        health: HealthBus,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(
            Arc::new(ReqwestTransport::default()),
            config.base_location()?,
            device,
            health,
        )
        .with_policy(config.timeouts))
    }

    pub fn with_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Deliver one request and classify its outcome.
    pub async fn execute(&self, request: HttpRequest) -> Outcome {
        let request_id = Uuid::new_v4();
        let HttpRequest {
            method,
            path,
            headers,
            body,
            cancel,
        } = request;

        let url = match self.base.resolve(&path) {
            Ok(url) => url,
            Err(e) => return self.fail(request_id, RawFailure::Unroutable(e)),
        };

        let device = self.device.classify();
        let timeout = self.policy.duration_for(device);
        let composed = ComposedCancel::compose(cancel.as_ref(), timeout);

        if let Some(reason) = composed.reason() {
            debug!(%request_id, ?reason, "cancelled before send");
            return self.fail(request_id, RawFailure::Cancelled(reason));
        }

        debug!(
            %request_id,
            %method,
            %url,
            %device,
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            "sending request"
        );

        let send = self.transport.send(
            OutgoingRequest {
                method,
                url,
                headers,
                body,
            },
            composed.token(),
        );
        let watch = composed.watch();
        tokio::pin!(send, watch);

        let mut fired = false;
        let settled = loop {
            tokio::select! {
                biased;
                result = &mut send => break result,
                reason = &mut watch, if !fired => {
                    fired = true;
                    debug!(%request_id, ?reason, "cancellation fired; awaiting transport");
                }
            }
        };

        let raw = match (composed.reason(), settled) {
            (Some(reason), _) => RawFailure::Cancelled(reason),
            (None, Err(e)) => RawFailure::Transport(e),
            (None, Ok(response)) if !response.is_success() => RawFailure::Status {
                status: response.status,
                body: response.body,
            },
            (None, Ok(response)) => {
                match serde_json::from_str::<serde_json::Value>(&response.body) {
                    Ok(value) => {
                        debug!(%request_id, status = response.status, "request succeeded");
                        return Ok(value);
                    }
                    Err(e) => RawFailure::Malformed {
                        status: response.status,
                        error: e.to_string(),
                    },
                }
            }
        };
        self.fail(request_id, raw)
    }

    /// Classify `raw`, publish its health signal if it has one, and return it.
    fn fail(&self, request_id: Uuid, raw: RawFailure) -> Outcome {
        let error = classify(&raw);
        match error.kind.health_signal() {
            Some(signal) => {
                let reached = self.health.publish(signal);
                warn!(
                    %request_id,
                    kind = %error.kind,
                    status = error.status,
                    %signal,
                    reached,
                    message = %error.message,
                    "request failed; health signal published"
                );
            }
            None => debug!(
                %request_id,
                kind = %error.kind,
                status = error.status,
                message = %error.message,
                "request failed"
            ),
        }
        Err(error)
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("base", &self.base.url().as_str())
            .field("device", &self.device)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
