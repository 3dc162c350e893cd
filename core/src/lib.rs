//! Request layer for the arcade client.
//!
//! # Overview
//! Every lobby and gameplay action goes through `RequestExecutor::execute`,
//! which delivers one request under a device-sized timeout and the caller's
//! optional cancellation token, then classifies the outcome into a small
//! closed taxonomy. Systemic failures (timeouts, 503, other 5xx) are also
//! published on a `HealthBus` for whatever presents service health.
//!
//! # Design
//! - Descriptors carry only a path+query; `BaseLocation` resolves them and
//!   refuses anything that would leave the application's origin.
//! - The device class is computed once by an injectable `DeviceClassifier`.
//! - Cancellation is attributed explicitly (`CancelReason`), so a timeout
//!   and a caller abort classify differently.
//! - `classify` is pure; publishing is the executor's job.
//! - The network sits behind the `Transport` trait; `ReqwestTransport` is the
//!   production implementation.
//! - `ArcadeClient` is the thin facade of named room operations.

pub mod cancel;
pub mod classify;
pub mod client;
pub mod config;
pub mod device;
pub mod error;
pub mod executor;
pub mod health;
pub mod http;
pub mod origin;
pub mod transport;
pub mod types;

pub use cancel::{CancelReason, ComposedCancel};
pub use classify::{classify, RawFailure};
pub use client::ArcadeClient;
pub use config::{ClientConfig, ConfigError};
pub use device::{DeviceClass, DeviceClassifier, DeviceProbe, Dimensions, TimeoutPolicy};
pub use error::{ApiError, ErrorKind, Outcome, RequestError};
pub use executor::RequestExecutor;
pub use health::{HealthBus, HealthSignal, HealthSubscription};
pub use http::{HttpMethod, HttpRequest, HttpResponse, OutgoingRequest};
pub use origin::{BaseLocation, ResolveError};
pub use transport::{ReqwestTransport, Transport, TransportError};
pub use types::{
    CreateRoom, Disbanded, EventAck, GameEvent, Player, PlayerAction, Room, SetLoadout, SetReady,
};
pub use tokio_util::sync::CancellationToken;
