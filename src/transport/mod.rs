//! # Transport
//!
//! The message channel the engine emits into. The engine only needs to know
//! whether the channel is open and how to hand it one serialized message;
//! connection management stays behind the [`MessageChannel`] trait.
//!
//! ```text
//! transport/
//! ├── loopback.rs   - in-process channel (dry runs, tests)
//! └── mqtt_link.rs  - MQTT broker link via rumqttc
//! ```
//!
//! Both report their lifecycle as [`LinkEvent`]s so the runtime can send the
//! current mode on open and route inbound feedback to the session.

pub mod loopback;
pub mod mqtt_link;

pub use loopback::LoopbackChannel;
pub use mqtt_link::MqttChannel;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Channel is not open")]
    Closed,

    #[error("Failed to publish message: {0}")]
    PublishError(String),

    #[error("Failed to encode message: {0}")]
    EncodeError(String),
}

/// Ordered, message-oriented outbound link
pub trait MessageChannel: Send {
    fn is_open(&self) -> bool;

    /// Hands one serialized message to the link without waiting for delivery.
    fn transmit(&mut self, payload: String) -> Result<(), TransportError>;

    fn name(&self) -> &str;
}

/// Lifecycle and inbound traffic of a link
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    Opened,
    Closed,
    Inbound(String),
}
