use tokio::sync::mpsc;
use tracing::debug;

use super::{MessageChannel, TransportError};

/// In-process channel: every transmitted message lands on a tokio mpsc receiver.
///
/// Open until closed explicitly or until the receiver is dropped.
#[derive(Debug)]
pub struct LoopbackChannel {
    tx: mpsc::Sender<String>,
    open: bool,
}

impl LoopbackChannel {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx, open: true }, rx)
    }

    pub fn set_open(&mut self, open: bool) {
        debug!("Loopback channel {}", if open { "opened" } else { "closed" });
        self.open = open;
    }
}

impl MessageChannel for LoopbackChannel {
    fn is_open(&self) -> bool {
        self.open && !self.tx.is_closed()
    }

    fn transmit(&mut self, payload: String) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::Closed);
        }
        self.tx
            .try_send(payload)
            .map_err(|e| TransportError::PublishError(e.to_string()))
    }

    fn name(&self) -> &str {
        "loopback"
    }
}
