use tracing::{debug, warn};

use super::{ControlAxisPair, ControlEvent};
use crate::transport::{MessageChannel, TransportError};

/// Delivery counters, for logs and diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateStats {
    pub sent: u64,
    /// Dropped because the channel was not open
    pub dropped: u64,
    /// Encoding or transmission failed
    pub failed: u64,
}

/// The single exit for outbound control events.
///
/// Sends immediately when the channel is open and drops otherwise; there is no
/// queue. Failures are logged and counted, never propagated.
pub struct EmissionGate<C: MessageChannel> {
    channel: C,
    stats: GateStats,
}

impl<C: MessageChannel> EmissionGate<C> {
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            stats: GateStats::default(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.channel.is_open()
    }

    pub fn stats(&self) -> GateStats {
        self.stats
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Returns whether the event was handed to the channel.
    pub fn send(&mut self, event: &ControlEvent) -> bool {
        if !self.channel.is_open() {
            self.stats.dropped += 1;
            debug!("Channel closed, dropping {} event", event.kind());
            return false;
        }

        let result = serde_json::to_string(event)
            .map_err(|e| TransportError::EncodeError(e.to_string()))
            .and_then(|payload| self.channel.transmit(payload));

        match result {
            Ok(()) => {
                self.stats.sent += 1;
                true
            }
            Err(e) => {
                self.stats.failed += 1;
                warn!("Failed to send {} event on {}: {}", event.kind(), self.channel.name(), e);
                false
            }
        }
    }

    /// Resets `axes` to neutral and sends it, whatever was sent before.
    pub fn force_neutral(&mut self, axes: &mut ControlAxisPair) -> bool {
        *axes = ControlAxisPair::neutral();
        self.send(&ControlEvent::axes(*axes))
    }
}
