//! MQTT-backed message channel.
//!
//! Control events are published fire-and-forget (QoS 0) on the outbound
//! topic. A background task drives the rumqttc event loop, tracks whether the
//! broker connection is up and forwards publishes on the inbound topic.

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{LinkEvent, MessageChannel, TransportError};
use crate::config::LinkConfig;

const CLIENT_CAPACITY: usize = 64;
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

pub struct MqttChannel {
    client: AsyncClient,
    topic: String,
    open: watch::Receiver<bool>,
}

impl MqttChannel {
    /// Creates the client and spawns the event-loop task.
    ///
    /// The channel reports closed until the broker acknowledges the connection.
    /// Lifecycle changes and inbound payloads are sent on `link_events`.
    pub fn connect(
        config: &LinkConfig,
        link_events: mpsc::Sender<LinkEvent>,
        cancel: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs.max(1)));

        let (client, mut eventloop) = AsyncClient::new(options, CLIENT_CAPACITY);
        let (open_tx, open_rx) = watch::channel(false);

        info!(
            "Connecting to MQTT broker {}:{} as {}",
            config.host, config.port, config.client_id
        );

        let poll_client = client.clone();
        let inbound_topic = config.inbound_topic.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("MQTT link shutting down");
                        if let Err(e) = poll_client.try_disconnect() {
                            debug!("Disconnect request failed: {}", e);
                        }
                        break;
                    }
                    polled = eventloop.poll() => match polled {
                        Ok(Event::Incoming(Packet::ConnAck(_))) => {
                            info!("MQTT broker connection established");
                            if let Err(e) = poll_client.try_subscribe(&inbound_topic, QoS::AtMostOnce) {
                                warn!("Failed to subscribe to {}: {}", inbound_topic, e);
                            }
                            let _ = open_tx.send(true);
                            if link_events.send(LinkEvent::Opened).await.is_err() {
                                break;
                            }
                        }
                        Ok(Event::Incoming(Packet::Publish(publish))) if publish.topic == inbound_topic => {
                            let payload = String::from_utf8_lossy(&publish.payload).into_owned();
                            if link_events.send(LinkEvent::Inbound(payload)).await.is_err() {
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            if *open_tx.borrow() {
                                error!("MQTT connection lost: {}", e);
                                let _ = open_tx.send(false);
                                if link_events.send(LinkEvent::Closed).await.is_err() {
                                    break;
                                }
                            } else {
                                debug!("MQTT connection attempt failed: {}", e);
                            }
                            tokio::time::sleep(RECONNECT_DELAY).await;
                        }
                    }
                }
            }
        });

        (
            Self {
                client,
                topic: config.outbound_topic.clone(),
                open: open_rx,
            },
            task,
        )
    }
}

impl MessageChannel for MqttChannel {
    fn is_open(&self) -> bool {
        *self.open.borrow()
    }

    fn transmit(&mut self, payload: String) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::Closed);
        }
        self.client
            .try_publish(self.topic.as_str(), QoS::AtMostOnce, false, payload.into_bytes())
            .map_err(|e| TransportError::PublishError(e.to_string()))
    }

    fn name(&self) -> &str {
        "mqtt"
    }
}
