//! Session runtime
//!
//! Drives a [`Session`] inside a tokio task: platform events and link events are
//! handled one at a time, deferred events fire when due, and session signals are
//! acted on (settings are saved, permission requests optionally auto-granted)
//! before being forwarded to the caller.
//!
//! ```text
//! platform events ──┐
//! link events ──────┼──► Session ──► EmissionGate ──► MessageChannel
//! deferred timer ───┘        │
//!                            └──► SessionSignal ──► caller
//! ```

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::controller::PlatformEvent;
use crate::emission::{GateStats, Session, SessionSignal};
use crate::persistence::SettingsFile;
use crate::sensor::PermissionOutcome;
use crate::transport::{LinkEvent, MessageChannel};

const SIGNAL_CAPACITY: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct RuntimeOptions {
    /// Answer every permission request with `Granted`
    pub auto_grant: bool,
    /// Where to store settings after a change; nothing is saved when unset
    pub settings_file: Option<SettingsFile>,
}

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("Session task error: {0}")]
    ThreadError(String),

    #[error("Session already started")]
    AlreadyRunning,
}

/// Owns the task running a session and its shutdown signal
#[derive(Debug, Default)]
pub struct SessionHandle {
    task_handle: Option<JoinHandle<GateStats>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns the session loop.
    ///
    /// The loop ends on shutdown, or once `input` is closed and no deferred
    /// event is left to fire. Returns the receiver for session signals.
    pub fn start<C: MessageChannel + 'static>(
        &mut self,
        session: Session<C>,
        input: mpsc::Receiver<PlatformEvent>,
        link_events: mpsc::Receiver<LinkEvent>,
        options: RuntimeOptions,
    ) -> Result<mpsc::Receiver<SessionSignal>, RuntimeError> {
        if self.task_handle.is_some() {
            return Err(RuntimeError::AlreadyRunning);
        }

        let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);

        let task_handle = tokio::spawn(async move {
            info!("Session task started");
            let stats = run_session(session, input, link_events, shutdown_rx, options, signal_tx).await;
            info!(
                "Session task finished: {} sent, {} dropped, {} failed",
                stats.sent, stats.dropped, stats.failed
            );
            stats
        });
        self.task_handle = Some(task_handle);

        Ok(signal_rx)
    }

    /// Waits for the loop to finish on its own. Safe to abandon midway.
    pub async fn join(&mut self) -> Result<GateStats, RuntimeError> {
        let Some(handle) = self.task_handle.as_mut() else {
            debug!("Session already finished");
            return Ok(GateStats::default());
        };
        let result = handle.await;
        self.task_handle = None;
        result.map_err(|e| {
            error!("Session task panicked: {}", e);
            RuntimeError::ThreadError(format!("Session task panicked: {}", e))
        })
    }

    /// Signals the loop to stop and waits for it.
    pub async fn shutdown(&mut self) -> Result<GateStats, RuntimeError> {
        debug!("Sending shutdown signal to session");
        if let Some(tx) = self.shutdown_tx.take() {
            if tx.send(()).is_err() {
                warn!("Session task already terminated");
            }
        }
        self.join().await
    }
}

async fn run_session<C: MessageChannel>(
    mut session: Session<C>,
    mut input: mpsc::Receiver<PlatformEvent>,
    mut link_events: mpsc::Receiver<LinkEvent>,
    mut shutdown_rx: oneshot::Receiver<()>,
    options: RuntimeOptions,
    signal_tx: mpsc::Sender<SessionSignal>,
) -> GateStats {
    let mut input_open = true;
    let mut link_open = true;

    loop {
        let deadline = session.next_deadline();

        tokio::select! {
            _ = &mut shutdown_rx => {
                info!("Shutdown signal received for session");
                break;
            }
            event = input.recv(), if input_open => match event {
                Some(event) => session.handle(event),
                None => {
                    info!("Platform event stream ended");
                    input_open = false;
                }
            },
            event = link_events.recv(), if link_open => match event {
                Some(LinkEvent::Opened) => session.on_channel_open(),
                Some(LinkEvent::Closed) => session.on_channel_closed(),
                Some(LinkEvent::Inbound(payload)) => session.handle_inbound(&payload),
                None => {
                    debug!("Link event stream ended");
                    link_open = false;
                }
            },
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                let fired = session.fire_due(Instant::now());
                debug!("Fired {} deferred events", fired);
            }
        }

        dispatch_signals(&mut session, &options, &signal_tx).await;

        if !input_open && session.next_deadline().is_none() {
            break;
        }
    }

    session.gate().stats()
}

async fn dispatch_signals<C: MessageChannel>(
    session: &mut Session<C>,
    options: &RuntimeOptions,
    signal_tx: &mpsc::Sender<SessionSignal>,
) {
    loop {
        let signals = session.drain_signals();
        if signals.is_empty() {
            return;
        }

        for signal in signals {
            match &signal {
                SessionSignal::PermissionRequested(sensor) if options.auto_grant => {
                    info!("Auto-granting {} sensor access", sensor);
                    session.handle(PlatformEvent::PermissionResult {
                        sensor: *sensor,
                        outcome: PermissionOutcome::Granted,
                    });
                }
                SessionSignal::SettingsChanged => {
                    if let Some(store) = &options.settings_file {
                        if let Err(e) = store.save(&session.settings_snapshot()).await {
                            warn!("Failed to save settings: {}", e);
                        }
                    }
                }
                SessionSignal::RemoteError(message) => error!("Remote reported: {}", message),
                _ => {}
            }

            if signal_tx.try_send(signal).is_err() {
                debug!("Session signal not delivered, no listener");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InputTuning;
    use crate::controller::{ContactId, SettingsCommand};
    use crate::emission::InputMode;
    use crate::layout::{Point, Viewport};
    use crate::persistence::PersistedSettings;
    use crate::sensor::SensorKind;
    use crate::transport::LoopbackChannel;
    use chrono::{Duration as TimeDelta, Local};
    use std::time::Duration;

    fn session() -> (Session<LoopbackChannel>, mpsc::Receiver<String>) {
        let (channel, rx) = LoopbackChannel::new(64);
        let session = Session::new(
            &PersistedSettings::default(),
            Viewport::default(),
            &InputTuning::default(),
            channel,
        );
        (session, rx)
    }

    #[tokio::test]
    async fn tap_release_fires_before_the_loop_ends() {
        let (session, mut out) = session();
        let (input_tx, input_rx) = mpsc::channel(8);
        let (_link_tx, link_rx) = mpsc::channel(8);

        let mut handle = SessionHandle::new();
        let _signals = handle
            .start(session, input_rx, link_rx, RuntimeOptions::default())
            .unwrap();

        let now = Local::now();
        let p = Point::new(100.0, 100.0);
        input_tx
            .send(PlatformEvent::contact_start(ContactId::Mouse, now, p))
            .await
            .unwrap();
        input_tx
            .send(PlatformEvent::contact_end(ContactId::Mouse, now, p))
            .await
            .unwrap();
        drop(input_tx);

        let stats = handle.join().await.unwrap();
        assert_eq!(stats.sent, 2);
        assert_eq!(out.recv().await.unwrap(), r#"{"type":"mouse_btn","id":"LEFT","val":1}"#);
        assert_eq!(out.recv().await.unwrap(), r#"{"type":"mouse_btn","id":"LEFT","val":0}"#);
    }

    #[tokio::test]
    async fn tap_release_waits_even_for_old_timestamps() {
        let (session, mut out) = session();
        let (input_tx, input_rx) = mpsc::channel(8);
        let (_link_tx, link_rx) = mpsc::channel(8);

        let mut handle = SessionHandle::new();
        let _signals = handle
            .start(session, input_rx, link_rx, RuntimeOptions::default())
            .unwrap();

        // platform clock an hour behind the runtime
        let stamped = Local::now() - TimeDelta::hours(1);
        let p = Point::new(100.0, 100.0);
        input_tx
            .send(PlatformEvent::contact_start(ContactId::Touch(2), stamped, p))
            .await
            .unwrap();
        let sent_at = std::time::Instant::now();
        input_tx
            .send(PlatformEvent::contact_end(
                ContactId::Touch(2),
                stamped + TimeDelta::milliseconds(30),
                p,
            ))
            .await
            .unwrap();

        assert_eq!(out.recv().await.unwrap(), r#"{"type":"mouse_btn","id":"LEFT","val":1}"#);
        assert_eq!(out.recv().await.unwrap(), r#"{"type":"mouse_btn","id":"LEFT","val":0}"#);
        assert!(sent_at.elapsed() >= Duration::from_millis(50));

        drop(input_tx);
        handle.join().await.unwrap();
    }

    #[tokio::test]
    async fn settings_are_saved_and_permissions_auto_granted() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsFile::new(dir.path().join("settings.toml"));
        let (session, _out) = session();
        let (input_tx, input_rx) = mpsc::channel(8);
        let (_link_tx, link_rx) = mpsc::channel(8);

        let mut handle = SessionHandle::new();
        let mut signals = handle
            .start(
                session,
                input_rx,
                link_rx,
                RuntimeOptions {
                    auto_grant: true,
                    settings_file: Some(store.clone()),
                },
            )
            .unwrap();

        input_tx
            .send(PlatformEvent::settings(SettingsCommand::SetMode {
                mode: InputMode::Arrow,
            }))
            .await
            .unwrap();
        input_tx
            .send(PlatformEvent::settings(SettingsCommand::SetLookEnabled { enabled: true }))
            .await
            .unwrap();
        drop(input_tx);
        handle.join().await.unwrap();

        assert_eq!(store.load().await.unwrap().mode, InputMode::Arrow);
        assert_eq!(signals.recv().await, Some(SessionSignal::SettingsChanged));
        assert_eq!(
            signals.recv().await,
            Some(SessionSignal::PermissionRequested(SensorKind::Look))
        );
    }

    #[tokio::test]
    async fn link_open_announces_mode() {
        let (session, mut out) = session();
        let (_input_tx, input_rx) = mpsc::channel::<PlatformEvent>(8);
        let (link_tx, link_rx) = mpsc::channel(8);

        let mut handle = SessionHandle::new();
        handle
            .start(session, input_rx, link_rx, RuntimeOptions::default())
            .unwrap();
        link_tx.send(LinkEvent::Opened).await.unwrap();

        assert_eq!(out.recv().await.unwrap(), r#"{"type":"mode","mode":"GAMEPAD"}"#);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn second_start_is_refused() {
        let (first, _a) = session();
        let (second, _b) = session();
        let (_i1, r1) = mpsc::channel::<PlatformEvent>(1);
        let (_l1, l1) = mpsc::channel(1);
        let (_i2, r2) = mpsc::channel::<PlatformEvent>(1);
        let (_l2, l2) = mpsc::channel(1);

        let mut handle = SessionHandle::new();
        handle.start(first, r1, l1, RuntimeOptions::default()).unwrap();
        assert!(matches!(
            handle.start(second, r2, l2, RuntimeOptions::default()),
            Err(RuntimeError::AlreadyRunning)
        ));
        handle.shutdown().await.unwrap();
    }
}
