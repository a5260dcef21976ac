//! The input engine for one client session.
//!
//! [`Session`] owns every piece of mutable input state and processes platform
//! events one at a time, to completion. Each handler collects its output in an
//! [`Outbox`]; immediate events go straight through the [`EmissionGate`] and
//! deferred ones wait for [`Session::fire_due`].

use chrono::{DateTime, Local};
use std::collections::HashMap;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::gate::EmissionGate;
use super::state::SessionState;
use super::{ControlEvent, InboundMessage, InputMode, Outbox};
use crate::config::InputTuning;
use crate::controller::{
    BackgroundGestures, BackgroundSettings, ButtonPresses, ContactId, DragOutcome,
    EditDragTracker, JoystickEngine, PlatformEvent, SettingsCommand,
};
use crate::layout::{
    ElementKind, Layout, LeftInputStyle, Point, Viewport, JOYSTICK_ELEMENT_ID, JOYSTICK_SIZE_KEY,
};
use crate::mapping::NEUTRAL;
use crate::persistence::PersistedSettings;
use crate::sensor::permission::Pending;
use crate::sensor::{
    gauge, LookPipeline, PermissionOutcome, PermissionRequest, SensorKind, SteeringPipeline,
};
use crate::transport::MessageChannel;

/// Things the platform has to act on, produced while handling events
#[derive(Debug, Clone, PartialEq)]
pub enum SessionSignal {
    /// Ask the user for sensor access and report back with `PermissionResult`
    PermissionRequested(SensorKind),
    PermissionDenied(SensorKind),
    SensorUnsupported(SensorKind),
    /// `error` message from the remote side
    RemoteError(String),
    /// An edit-mode tap landed on this element
    OpenElementEditor(String),
    /// Persisted values changed; store [`Session::settings_snapshot`]
    SettingsChanged,
}

/// Deferred event stamped on the runtime clock
#[derive(Debug)]
struct ScheduledEvent {
    due: Instant,
    event: ControlEvent,
}

pub struct Session<C: MessageChannel> {
    state: SessionState,
    layout: Layout,
    joystick: JoystickEngine,
    buttons: ButtonPresses,
    background: BackgroundGestures,
    edit: EditDragTracker,
    look: LookPipeline,
    steering: SteeringPipeline,
    pending: HashMap<SensorKind, PermissionRequest<Pending>>,
    gate: EmissionGate<C>,
    deferred: Vec<ScheduledEvent>,
    signals: Vec<SessionSignal>,
}

impl<C: MessageChannel> Session<C> {
    pub fn new(
        settings: &PersistedSettings,
        viewport: Viewport,
        tuning: &InputTuning,
        channel: C,
    ) -> Self {
        let state = SessionState::from_settings(settings, viewport);

        let mut layout = Layout::default_for(settings.left_style, &settings.element_sizes, viewport);
        if let Some(right) = &settings.right_zone {
            layout.replace_right_zone(right.clone());
        }

        let mut look = LookPipeline::new(settings.gyro_sensitivity, tuning);
        look.state.invert_x = settings.invert_x;
        look.state.invert_y = settings.invert_y;

        info!(
            "Session created: mode {}, left style {:?}, {} layout elements",
            state.mode,
            state.left_style,
            layout.elements.len()
        );

        Self {
            state,
            layout,
            joystick: JoystickEngine::new(tuning.joystick_radius_ratio),
            buttons: ButtonPresses::default(),
            background: BackgroundGestures::new(BackgroundSettings::from(tuning)),
            edit: EditDragTracker::new(tuning.edit_drag_threshold),
            look,
            steering: SteeringPipeline::new(settings.steer_sensitivity, tuning),
            pending: HashMap::new(),
            gate: EmissionGate::new(channel),
            deferred: Vec::new(),
            signals: Vec::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn gate(&self) -> &EmissionGate<C> {
        &self.gate
    }

    pub fn gate_mut(&mut self) -> &mut EmissionGate<C> {
        &mut self.gate
    }

    pub fn look(&self) -> &LookPipeline {
        &self.look
    }

    pub fn steering(&self) -> &SteeringPipeline {
        &self.steering
    }

    /// Knob offset from the joystick center, for rendering.
    pub fn knob_offset(&self) -> (f64, f64) {
        self.joystick.knob_offset()
    }

    pub fn awaiting_permission(&self, sensor: SensorKind) -> bool {
        self.pending.contains_key(&sensor)
    }

    pub fn handle(&mut self, event: PlatformEvent) {
        let mut outbox = Outbox::default();

        match event {
            PlatformEvent::ContactStart {
                contact,
                at,
                x,
                y,
                chrome,
            } => self.contact_start(contact, at, Point::new(x, y), chrome, &mut outbox),
            PlatformEvent::ContactMove { contact, x, y, .. } => {
                self.contact_move(contact, Point::new(x, y), &mut outbox)
            }
            PlatformEvent::ContactEnd { contact, at, x, y } => {
                self.contact_end(contact, at, Point::new(x, y), &mut outbox)
            }
            PlatformEvent::ContactCancel { contact, .. } => self.contact_cancel(contact, &mut outbox),
            PlatformEvent::Motion(sample) => {
                if self.state.hidden {
                    debug!("Hidden, ignoring motion sample");
                } else if let Some(event) = self.look.process(&sample) {
                    outbox.push(event);
                }
            }
            PlatformEvent::Orientation(sample) => {
                let landscape = self.state.viewport.is_landscape();
                if self.state.hidden {
                    debug!("Hidden, ignoring orientation sample");
                } else if let Some(lx) = self.steering.process(&sample, landscape) {
                    self.state.axes.lx = lx;
                    outbox.push(ControlEvent::axes(self.state.axes));
                }
            }
            PlatformEvent::Visibility { hidden, .. } => self.set_hidden(hidden),
            PlatformEvent::Resize { width, height } => {
                self.resize(Viewport { width, height }, &mut outbox)
            }
            PlatformEvent::PermissionResult { sensor, outcome } => {
                self.permission_result(sensor, outcome)
            }
            PlatformEvent::Settings { command } => self.apply_command(command, &mut outbox),
        }

        self.flush(outbox);
    }

    /// Announces the current mode to a freshly opened channel.
    pub fn on_channel_open(&mut self) {
        info!("Channel {} open", self.gate.channel().name());
        let mode = self.state.mode;
        self.gate.send(&ControlEvent::Mode { mode });
    }

    pub fn on_channel_closed(&mut self) {
        warn!(
            "Channel {} closed, events are dropped until it reopens",
            self.gate.channel().name()
        );
    }

    pub fn handle_inbound(&mut self, payload: &str) {
        match serde_json::from_str::<InboundMessage>(payload) {
            Ok(InboundMessage::Error { message }) => {
                warn!("Remote error: {}", message);
                self.signals.push(SessionSignal::RemoteError(message));
            }
            Ok(InboundMessage::Other) => debug!("Ignoring inbound message"),
            Err(e) => warn!("Malformed inbound message: {}", e),
        }
    }

    /// Sends every deferred event due at `now`, oldest first. Returns how many fired.
    ///
    /// Due times come from the runtime clock at the moment the event was queued,
    /// never from platform timestamps.
    pub fn fire_due(&mut self, now: Instant) -> usize {
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.deferred)
            .into_iter()
            .partition(|d| d.due <= now);
        self.deferred = pending;

        due.sort_by_key(|d| d.due);
        for deferred in &due {
            self.gate.send(&deferred.event);
        }
        due.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deferred.iter().map(|d| d.due).min()
    }

    pub fn drain_signals(&mut self) -> Vec<SessionSignal> {
        std::mem::take(&mut self.signals)
    }

    /// Overlay text for the enabled sensors, when diagnostics are shown.
    pub fn diagnostics(&self) -> Option<String> {
        if !self.state.show_debug {
            return None;
        }
        let look = self
            .look
            .last_reading()
            .filter(|_| self.look.state.is_enabled())
            .map(|reading| {
                gauge::look_text(
                    &reading,
                    self.look.state.sensitivity(),
                    self.look.state.invert_x,
                    self.look.state.invert_y,
                )
            });
        let steer = self
            .steering
            .last_reading()
            .filter(|_| self.steering.state.is_enabled())
            .map(|reading| gauge::steering_text(&reading));
        gauge::compose(&[look, steer])
    }

    pub fn settings_snapshot(&self) -> PersistedSettings {
        PersistedSettings {
            mode: self.state.mode,
            left_style: self.state.left_style,
            gyro_sensitivity: self.look.state.sensitivity(),
            steer_sensitivity: self.steering.state.sensitivity(),
            invert_x: self.look.state.invert_x,
            invert_y: self.look.state.invert_y,
            show_debug: self.state.show_debug,
            element_sizes: self.state.element_sizes.clone(),
            right_zone: Some(self.layout.right_zone()),
        }
    }

    fn flush(&mut self, outbox: Outbox) {
        for event in &outbox.immediate {
            self.gate.send(event);
        }
        if outbox.deferred.is_empty() {
            return;
        }
        let now = Instant::now();
        self.deferred
            .extend(outbox.deferred.into_iter().map(|d| ScheduledEvent {
                due: now + d.delay,
                event: d.event,
            }));
    }

    fn settings_changed(&mut self) {
        if !self.signals.contains(&SessionSignal::SettingsChanged) {
            self.signals.push(SessionSignal::SettingsChanged);
        }
    }

    fn is_tracked(&self, id: ContactId) -> bool {
        self.edit.owns(id)
            || self.joystick.owns(id)
            || self.buttons.owns(id)
            || self.background.owns(id)
    }

    fn contact_start(
        &mut self,
        id: ContactId,
        at: DateTime<Local>,
        p: Point,
        chrome: bool,
        outbox: &mut Outbox,
    ) {
        if chrome {
            debug!("Contact {:?} on menu chrome, ignoring", id);
            return;
        }
        if self.is_tracked(id) {
            warn!("Contact {:?} started twice, ignoring", id);
            return;
        }

        let hit = self
            .layout
            .hit_test(p)
            .map(|e| (e.id.clone(), e.kind, e.binding.clone(), e.rect));

        if self.state.edit_mode {
            if let Some((element, ..)) = hit {
                self.edit.start(id, &element, at, p, &self.layout);
            }
            return;
        }

        match hit {
            Some((_, ElementKind::Joystick, _, rect)) => {
                let steering = self.steering.is_active();
                self.joystick
                    .engage(id, p, &rect, &mut self.state.axes, steering, outbox);
            }
            Some((element, ElementKind::Button, Some(binding), _)) => {
                self.buttons.press(id, &element, &binding, outbox)
            }
            Some((element, ElementKind::Button, None, _)) => {
                debug!("Button {} has no binding", element)
            }
            Some((_, ElementKind::DpadCluster, ..)) => {}
            None => {
                self.background
                    .start(id, at, p, self.state.viewport.width, outbox);
            }
        }
    }

    fn contact_move(&mut self, id: ContactId, p: Point, outbox: &mut Outbox) {
        if self.edit.owns(id) {
            self.edit.track(id, p, &mut self.layout);
            return;
        }
        if self.joystick.owns(id) {
            let steering = self.steering.is_active();
            match self.layout.joystick().map(|e| e.rect) {
                Some(rect) => {
                    self.joystick
                        .track(id, p, &rect, &mut self.state.axes, steering, outbox);
                }
                None => {
                    self.joystick
                        .release(id, &mut self.state.axes, steering, outbox);
                }
            }
            return;
        }
        self.background.track(id, p, outbox);
    }

    fn contact_end(&mut self, id: ContactId, at: DateTime<Local>, p: Point, outbox: &mut Outbox) {
        if let Some(outcome) = self.edit.end(id) {
            match outcome {
                DragOutcome::OpenEditor(element) => {
                    self.signals.push(SessionSignal::OpenElementEditor(element))
                }
                DragOutcome::Moved(_) => self.settings_changed(),
                DragOutcome::Restored(_) => {}
            }
            return;
        }
        let steering = self.steering.is_active();
        if self
            .joystick
            .release(id, &mut self.state.axes, steering, outbox)
        {
            return;
        }
        if self.buttons.release(id, outbox) {
            return;
        }
        self.background.end(id, at, p, outbox);
    }

    fn contact_cancel(&mut self, id: ContactId, outbox: &mut Outbox) {
        if self.edit.cancel(id, &mut self.layout).is_some() {
            return;
        }
        let steering = self.steering.is_active();
        if self
            .joystick
            .release(id, &mut self.state.axes, steering, outbox)
        {
            return;
        }
        if self.buttons.release(id, outbox) {
            return;
        }
        self.background.cancel(id, outbox);
    }

    /// Lets go of every live control contact.
    fn release_contacts(&mut self, outbox: &mut Outbox) {
        let steering = self.steering.is_active();
        self.joystick
            .release_any(&mut self.state.axes, steering, outbox);
        self.buttons.release_all(outbox);
        self.background.release_all(outbox);
    }

    fn set_hidden(&mut self, hidden: bool) {
        self.state.hidden = hidden;
        if hidden {
            info!("Client hidden, forcing neutral axes");
            self.gate.force_neutral(&mut self.state.axes);
        } else {
            info!("Client visible again");
        }
    }

    fn resize(&mut self, viewport: Viewport, outbox: &mut Outbox) {
        if viewport == self.state.viewport {
            return;
        }
        debug!("Viewport resized to {}x{}", viewport.width, viewport.height);
        let steering = self.steering.is_active();
        self.joystick
            .release_any(&mut self.state.axes, steering, outbox);
        self.edit.cancel_all(&mut self.layout);
        self.state.viewport = viewport;
        self.layout
            .rebuild_left_zone(self.state.left_style, &self.state.element_sizes, viewport);
    }

    fn request_permission(&mut self, sensor: SensorKind) {
        self.pending
            .insert(sensor, PermissionRequest::open(sensor, Local::now()));
        self.signals.push(SessionSignal::PermissionRequested(sensor));
    }

    fn permission_result(&mut self, sensor: SensorKind, outcome: PermissionOutcome) {
        let Some(request) = self.pending.remove(&sensor) else {
            warn!(
                "Ignoring {:?} for {} sensor, no request pending",
                outcome, sensor
            );
            return;
        };
        debug!(
            "{} permission answered after {} ms",
            sensor,
            (Local::now() - request.requested_at()).num_milliseconds()
        );
        let resolved = request.resolve(outcome);

        match sensor {
            SensorKind::Look => self.look.state.apply_permission(resolved.outcome()),
            SensorKind::Steering => self.steering.state.apply_permission(resolved.outcome()),
        }
        if resolved.is_granted() {
            return;
        }

        match sensor {
            SensorKind::Look => self.look.disable(),
            SensorKind::Steering => self.steering.disable(),
        }
        self.signals.push(match resolved.outcome() {
            PermissionOutcome::Unsupported => SessionSignal::SensorUnsupported(sensor),
            _ => SessionSignal::PermissionDenied(sensor),
        });
    }

    fn set_mode(&mut self, mode: InputMode, outbox: &mut Outbox) {
        info!("Input mode set to {}", mode);
        self.state.mode = mode;
        outbox.push(ControlEvent::Mode { mode });
        self.state.axes = super::ControlAxisPair::neutral();
        outbox.push(ControlEvent::axes(self.state.axes));
        self.settings_changed();
    }

    fn rebuild_left_zone(&mut self, style: LeftInputStyle, outbox: &mut Outbox) {
        let steering = self.steering.is_active();
        self.joystick
            .release_any(&mut self.state.axes, steering, outbox);
        self.edit.cancel_all(&mut self.layout);
        self.state.left_style = style;
        self.layout
            .rebuild_left_zone(style, &self.state.element_sizes, self.state.viewport);
    }

    fn apply_command(&mut self, command: SettingsCommand, outbox: &mut Outbox) {
        debug!("Settings command {:?}", command);
        match command {
            SettingsCommand::SetMode { mode } => self.set_mode(mode, outbox),
            SettingsCommand::SetEditMode { enabled } => {
                if enabled == self.state.edit_mode {
                    return;
                }
                if enabled {
                    self.release_contacts(outbox);
                } else {
                    self.edit.cancel_all(&mut self.layout);
                }
                self.state.edit_mode = enabled;
                info!("Edit mode {}", if enabled { "on" } else { "off" });
            }
            SettingsCommand::SetLookEnabled { enabled } => {
                if enabled == self.look.state.is_enabled() {
                    return;
                }
                if enabled {
                    self.look.enable();
                    self.request_permission(SensorKind::Look);
                } else {
                    self.look.disable();
                    self.pending.remove(&SensorKind::Look);
                }
            }
            SettingsCommand::SetSteeringEnabled { enabled } => {
                if enabled == self.steering.state.is_enabled() {
                    return;
                }
                if enabled {
                    self.steering.enable();
                    self.request_permission(SensorKind::Steering);
                } else {
                    let owned_lx = self.steering.is_active();
                    self.steering.disable();
                    self.pending.remove(&SensorKind::Steering);
                    // only an active pipeline owns LX
                    if owned_lx {
                        self.state.axes.lx = NEUTRAL;
                        outbox.push(ControlEvent::axes(self.state.axes));
                    }
                }
            }
            SettingsCommand::SetLookSensitivity { value } => {
                self.look.state.set_sensitivity(value);
                self.settings_changed();
            }
            SettingsCommand::SetSteerSensitivity { value } => {
                self.steering.state.set_sensitivity(value);
                self.settings_changed();
            }
            SettingsCommand::SetLookInvert { x, y } => {
                self.look.state.invert_x = x;
                self.look.state.invert_y = y;
                self.settings_changed();
            }
            SettingsCommand::SetShowDebug { enabled } => {
                self.state.show_debug = enabled;
                self.settings_changed();
            }
            SettingsCommand::SetLeftStyle { style } => {
                info!("Left input style set to {:?}", style);
                self.rebuild_left_zone(style, outbox);
                self.settings_changed();
            }
            SettingsCommand::SetJoystickSize { size } => {
                if !(size > 0.0) {
                    warn!("Ignoring joystick size {}", size);
                    return;
                }
                self.state
                    .element_sizes
                    .insert(JOYSTICK_SIZE_KEY.to_string(), size);
                self.layout.resize_joystick(size);
                self.settings_changed();
            }
            SettingsCommand::ConfigureElement { id, config } if id == JOYSTICK_ELEMENT_ID => {
                if let Some(size) = config.size {
                    self.apply_command(SettingsCommand::SetJoystickSize { size }, outbox);
                }
            }
            SettingsCommand::ConfigureElement { id, config } => {
                if self.layout.apply_config(&id, &config) {
                    info!("Element {} reconfigured", id);
                    self.settings_changed();
                } else {
                    warn!("Cannot configure unknown element {}", id);
                }
            }
            SettingsCommand::AddButton => {
                let id = self.layout.add_button(self.state.viewport);
                info!("Added button {}", id);
                self.settings_changed();
            }
            SettingsCommand::RemoveElement { id } => {
                if self.layout.remove_element(&id) {
                    info!("Removed element {}", id);
                    self.settings_changed();
                } else {
                    warn!("Cannot remove unknown element {}", id);
                }
            }
            SettingsCommand::ResetLayout => {
                info!("Resetting layout to defaults");
                self.release_contacts(outbox);
                self.edit.cancel_all(&mut self.layout);
                self.state.left_style = LeftInputStyle::default();
                self.state.element_sizes.clear();
                self.layout = Layout::default_for(
                    self.state.left_style,
                    &self.state.element_sizes,
                    self.state.viewport,
                );
                self.settings_changed();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LoopbackChannel;
    use chrono::Duration;
    use serde_json::Value;
    use std::time::Duration as StdDuration;
    use tokio::sync::mpsc;

    fn session() -> (Session<LoopbackChannel>, mpsc::Receiver<String>) {
        let (channel, rx) = LoopbackChannel::new(256);
        (
            Session::new(
                &PersistedSettings::default(),
                Viewport::default(),
                &InputTuning::default(),
                channel,
            ),
            rx,
        )
    }

    fn sent(rx: &mut mpsc::Receiver<String>) -> Vec<Value> {
        let mut out = Vec::new();
        while let Ok(line) = rx.try_recv() {
            out.push(serde_json::from_str(&line).unwrap());
        }
        out
    }

    fn joystick_center(session: &Session<LoopbackChannel>) -> Point {
        session.layout().get(JOYSTICK_ELEMENT_ID).unwrap().rect.center()
    }

    #[test]
    fn channel_open_announces_mode() {
        let (mut session, mut rx) = session();
        session.on_channel_open();
        assert_eq!(sent(&mut rx), vec![serde_json::json!({"type": "mode", "mode": "GAMEPAD"})]);
    }

    #[test]
    fn chrome_contacts_never_reach_the_engine() {
        let (mut session, mut rx) = session();
        let t = Local::now();
        session.handle(PlatformEvent::ContactStart {
            contact: ContactId::Touch(1),
            at: t,
            x: 700.0,
            y: 10.0,
            chrome: true,
        });
        session.handle(PlatformEvent::contact_end(ContactId::Touch(1), t, Point::new(700.0, 10.0)));
        assert!(sent(&mut rx).is_empty());
    }

    #[test]
    fn button_press_and_release() {
        let (mut session, mut rx) = session();
        let t = Local::now();
        let a = session.layout().get("btn-a").unwrap().rect.center();
        session.handle(PlatformEvent::contact_start(ContactId::Touch(3), t, a));
        session.handle(PlatformEvent::contact_move(ContactId::Touch(3), t, Point::new(a.x + 30.0, a.y)));
        session.handle(PlatformEvent::ContactCancel {
            contact: ContactId::Touch(3),
            at: t,
        });
        assert_eq!(
            sent(&mut rx),
            vec![
                serde_json::json!({"type": "btn", "id": "A", "val": 1}),
                serde_json::json!({"type": "btn", "id": "A", "val": 0}),
            ]
        );
    }

    #[test]
    fn tap_release_is_deferred_until_due() {
        let (mut session, mut rx) = session();
        let queued = Instant::now();
        let t = Local::now();
        session.handle(PlatformEvent::contact_start(ContactId::Touch(1), t, Point::new(100.0, 100.0)));
        session.handle(PlatformEvent::contact_end(
            ContactId::Touch(1),
            t + Duration::milliseconds(80),
            Point::new(102.0, 101.0),
        ));
        assert_eq!(sent(&mut rx).len(), 1);
        let due = session.next_deadline().unwrap();
        assert!(due >= queued + StdDuration::from_millis(50));

        assert_eq!(session.fire_due(due - StdDuration::from_millis(1)), 0);
        assert_eq!(session.fire_due(due), 1);
        assert_eq!(
            sent(&mut rx),
            vec![serde_json::json!({"type": "mouse_btn", "id": "LEFT", "val": 0})]
        );
        assert_eq!(session.next_deadline(), None);
    }

    #[test]
    fn edit_mode_releases_contacts_and_routes_to_drag() {
        let (mut session, mut rx) = session();
        let t = Local::now();
        let center = joystick_center(&session);
        session.handle(PlatformEvent::contact_start(
            ContactId::Touch(1),
            t,
            Point::new(center.x + 40.0, center.y),
        ));
        session.handle(PlatformEvent::settings(SettingsCommand::SetEditMode { enabled: true }));
        let out = sent(&mut rx);
        assert_eq!(
            out.last(),
            Some(&serde_json::json!({"type": "axes", "axes": {"LX": 128, "LY": 128}}))
        );

        // an edit tap opens the editor and emits nothing
        let a = session.layout().get("btn-a").unwrap().rect.center();
        session.handle(PlatformEvent::contact_start(ContactId::Touch(2), t, a));
        session.handle(PlatformEvent::contact_end(ContactId::Touch(2), t, a));
        assert!(sent(&mut rx).is_empty());
        assert_eq!(
            session.drain_signals(),
            vec![SessionSignal::OpenElementEditor("btn-a".into())]
        );
    }

    #[test]
    fn edit_drag_moves_and_requests_save() {
        let (mut session, _rx) = session();
        let t = Local::now();
        session.handle(PlatformEvent::settings(SettingsCommand::SetEditMode { enabled: true }));
        let before = session.layout().get("btn-y").unwrap().rect;
        let c = before.center();
        session.handle(PlatformEvent::contact_start(ContactId::Mouse, t, c));
        session.handle(PlatformEvent::contact_move(ContactId::Mouse, t, Point::new(c.x - 30.0, c.y + 10.0)));
        session.handle(PlatformEvent::contact_end(ContactId::Mouse, t, Point::new(c.x - 30.0, c.y + 10.0)));

        let after = session.layout().get("btn-y").unwrap().rect;
        assert_eq!((after.left, after.top), (before.left - 30.0, before.top + 10.0));
        assert_eq!(session.drain_signals(), vec![SessionSignal::SettingsChanged]);
        let saved = session.settings_snapshot().right_zone.unwrap();
        assert!(saved.iter().any(|e| e.id == "btn-y" && e.rect == after));
    }

    #[test]
    fn permission_flow_for_look() {
        let (mut session, mut rx) = session();
        let t = Local::now();
        session.handle(PlatformEvent::settings(SettingsCommand::SetLookEnabled { enabled: true }));
        assert!(session.awaiting_permission(SensorKind::Look));
        assert_eq!(
            session.drain_signals(),
            vec![SessionSignal::PermissionRequested(SensorKind::Look)]
        );

        // samples before the answer are ignored
        session.handle(PlatformEvent::Motion(crate::controller::MotionSample {
            at: t,
            alpha: Some(20.0),
            beta: None,
        }));
        assert!(sent(&mut rx).is_empty());

        session.handle(PlatformEvent::PermissionResult {
            sensor: SensorKind::Look,
            outcome: PermissionOutcome::Granted,
        });
        session.handle(PlatformEvent::Motion(crate::controller::MotionSample {
            at: t + Duration::milliseconds(20),
            alpha: Some(20.0),
            beta: None,
        }));
        assert_eq!(sent(&mut rx), vec![serde_json::json!({"type": "gyro", "x": -10, "y": 0})]);

        // a second answer has nothing to resolve
        session.handle(PlatformEvent::PermissionResult {
            sensor: SensorKind::Look,
            outcome: PermissionOutcome::Denied,
        });
        assert!(session.look().state.is_active());
    }

    #[test]
    fn denial_turns_the_toggle_off_and_notifies() {
        let (mut session, _rx) = session();
        session.handle(PlatformEvent::settings(SettingsCommand::SetSteeringEnabled { enabled: true }));
        session.drain_signals();
        session.handle(PlatformEvent::PermissionResult {
            sensor: SensorKind::Steering,
            outcome: PermissionOutcome::Denied,
        });
        assert!(!session.steering().state.is_enabled());
        assert_eq!(
            session.drain_signals(),
            vec![SessionSignal::PermissionDenied(SensorKind::Steering)]
        );
    }

    #[test]
    fn steering_toggle_leaves_joystick_lx_alone_unless_it_owned_it() {
        let (mut session, mut rx) = session();
        let t = Local::now();
        let center = joystick_center(&session);
        session.handle(PlatformEvent::contact_start(ContactId::Touch(1), t, center));
        session.handle(PlatformEvent::contact_move(
            ContactId::Touch(1),
            t,
            Point::new(center.x + 200.0, center.y),
        ));
        assert_eq!(session.state().axes.lx, 255);
        sent(&mut rx);

        // never enabled: a repeated off is a no-op
        session.handle(PlatformEvent::settings(SettingsCommand::SetSteeringEnabled { enabled: false }));
        assert!(sent(&mut rx).is_empty());
        assert_eq!(session.state().axes.lx, 255);

        // enabled but still waiting on permission: not active, LX untouched
        session.handle(PlatformEvent::settings(SettingsCommand::SetSteeringEnabled { enabled: true }));
        session.handle(PlatformEvent::settings(SettingsCommand::SetSteeringEnabled { enabled: true }));
        assert_eq!(
            session.drain_signals(),
            vec![SessionSignal::PermissionRequested(SensorKind::Steering)]
        );
        session.handle(PlatformEvent::settings(SettingsCommand::SetSteeringEnabled { enabled: false }));
        assert!(sent(&mut rx).is_empty());
        assert_eq!(session.state().axes.lx, 255);
        assert!(!session.steering().state.is_enabled());
    }

    #[test]
    fn mode_change_sends_mode_then_neutral() {
        let (mut session, mut rx) = session();
        session.handle(PlatformEvent::settings(SettingsCommand::SetMode {
            mode: InputMode::Wasd,
        }));
        assert_eq!(
            sent(&mut rx),
            vec![
                serde_json::json!({"type": "mode", "mode": "WASD"}),
                serde_json::json!({"type": "axes", "axes": {"LX": 128, "LY": 128}}),
            ]
        );
        assert_eq!(session.settings_snapshot().mode, InputMode::Wasd);
    }

    #[test]
    fn inbound_errors_become_signals() {
        let (mut session, _rx) = session();
        session.handle_inbound(r#"{"type":"error","message":"uinput unavailable"}"#);
        session.handle_inbound(r#"{"type":"ack"}"#);
        session.handle_inbound("{not json");
        assert_eq!(
            session.drain_signals(),
            vec![SessionSignal::RemoteError("uinput unavailable".into())]
        );
    }

    #[test]
    fn style_switch_drops_the_joystick_and_rebuilds() {
        let (mut session, mut rx) = session();
        let t = Local::now();
        let center = joystick_center(&session);
        session.handle(PlatformEvent::contact_start(ContactId::Touch(1), t, center));
        session.handle(PlatformEvent::settings(SettingsCommand::SetLeftStyle {
            style: LeftInputStyle::Dpad,
        }));
        assert!(session.layout().joystick().is_none());
        assert!(sent(&mut rx)
            .last()
            .is_some_and(|v| v["axes"] == serde_json::json!({"LX": 128, "LY": 128})));

        // later moves of the old contact go nowhere
        session.handle(PlatformEvent::contact_move(ContactId::Touch(1), t, Point::new(10.0, 10.0)));
        assert!(sent(&mut rx).is_empty());

        let up = session.layout().get("dpad_up").unwrap().rect.center();
        session.handle(PlatformEvent::contact_start(ContactId::Touch(2), t, up));
        assert_eq!(
            sent(&mut rx),
            vec![serde_json::json!({"type": "btn", "id": "DPAD_UP", "val": 1})]
        );
    }

    #[test]
    fn diagnostics_follow_the_debug_flag() {
        let (mut session, _rx) = session();
        assert_eq!(session.diagnostics(), None);
        session.handle(PlatformEvent::settings(SettingsCommand::SetShowDebug { enabled: true }));
        session.handle(PlatformEvent::settings(SettingsCommand::SetSteeringEnabled { enabled: true }));
        session.handle(PlatformEvent::PermissionResult {
            sensor: SensorKind::Steering,
            outcome: PermissionOutcome::Granted,
        });
        session.handle(PlatformEvent::Orientation(crate::controller::OrientationSample {
            at: Local::now(),
            beta: None,
            gamma: Some(3.0),
        }));
        assert_eq!(session.diagnostics().as_deref(), Some("STEER: No Orientation Data"));
    }

    #[test]
    fn right_drag_and_mouse_buttons_serialize_upper_case() {
        let (mut session, mut rx) = session();
        let t = Local::now();
        session.handle(PlatformEvent::contact_start(ContactId::Mouse, t, Point::new(450.0, 380.0)));
        session.handle(PlatformEvent::contact_end(ContactId::Mouse, t, Point::new(450.0, 380.0)));
        let out = sent(&mut rx);
        assert_eq!(out[0]["id"], "RIGHT");
        assert_eq!(out[1]["val"], 0);
    }
}
