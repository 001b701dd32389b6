use thiserror::Error;

use crate::types::ParseDsnError;

/// A failure of a single delivery mechanism.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DeliveryError(String);

impl DeliveryError {
    /// Creates a new delivery error with the given description.
    pub fn new<S: Into<String>>(message: S) -> Self {
        DeliveryError(message.into())
    }
}

/// Why a payload could not be handed to a delivery mechanism.
///
/// These never reach the host application: [`Transport::send`] logs them
/// and moves on.
///
/// [`Transport::send`]: crate::Transport::send
#[derive(Debug, Error)]
pub enum TransportError {
    /// The report could not be serialized.
    #[error("failed to serialize report")]
    Serialize(#[from] serde_json::Error),
    /// The host exposes neither beacon, fetch nor image requests.
    #[error("no delivery mechanism available")]
    NoMechanism,
    /// The host refused to queue the beacon.
    #[error("beacon was not queued by the host")]
    BeaconRejected,
    /// The selected mechanism failed synchronously.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// Raised by the recording mechanism.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The recorder could not be started.
    #[error("recorder failed to start: {0}")]
    Start(String),
}

/// Raised when an integration fails to initialize.
#[derive(Debug, Error)]
pub enum IntegrationError {
    /// The host lacks a facility the integration depends on.
    #[error("host does not support {0}")]
    Unsupported(&'static str),
    /// The integration panicked during initialization.
    #[error("integration panicked: {0}")]
    Panicked(String),
    /// The recording mechanism failed.
    #[error(transparent)]
    Record(#[from] RecordError),
    /// Any other failure.
    #[error("{0}")]
    Custom(String),
}

/// Raised when building options from a [`MonitorConfig`](crate::MonitorConfig).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The configured DSN could not be parsed.
    #[error("invalid dsn: {0}")]
    InvalidDsn(#[from] ParseDsnError),
}
