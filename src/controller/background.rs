//! Background surface gestures: relative pointer movement, right-drag and tap-to-click.

use chrono::{DateTime, Local};
use std::time::Duration;
use tracing::{debug, info};

use super::contact::{ContactPhase, TrackedContact};
use super::input_event::ContactId;
use crate::config::InputTuning;
use crate::emission::{ControlEvent, MouseButton, Outbox};
use crate::layout::Point;
use crate::mapping::round_half_up;

#[derive(Debug, Clone)]
pub struct BackgroundSettings {
    pub sensitivity: f64,
    pub tap_max_ms: i64,
    pub tap_max_distance: f64,
    pub tap_release_delay: Duration,
}

impl From<&InputTuning> for BackgroundSettings {
    fn from(t: &InputTuning) -> Self {
        Self {
            sensitivity: t.pointer_sensitivity,
            tap_max_ms: t.tap_max_ms as i64,
            tap_max_distance: t.tap_max_distance,
            tap_release_delay: Duration::from_millis(t.tap_release_delay_ms),
        }
    }
}

/// Tracks at most one background contact.
///
/// Left half of the screen moves the pointer (and taps click); right half holds
/// the right button for the whole contact.
#[derive(Debug)]
pub struct BackgroundGestures {
    settings: BackgroundSettings,
    active: Option<TrackedContact>,
}

impl BackgroundGestures {
    pub fn new(settings: BackgroundSettings) -> Self {
        Self {
            settings,
            active: None,
        }
    }

    pub fn owns(&self, id: ContactId) -> bool {
        self.active.as_ref().is_some_and(|c| c.id == id)
    }

    pub fn active_phase(&self) -> Option<ContactPhase> {
        self.active.as_ref().map(|c| c.phase())
    }

    /// Starts tracking unless another background contact is already live.
    pub fn start(
        &mut self,
        id: ContactId,
        at: DateTime<Local>,
        p: Point,
        screen_width: f64,
        outbox: &mut Outbox,
    ) -> bool {
        if self.active.is_some() {
            debug!("Background contact {:?} ignored, another one is active", id);
            return false;
        }

        let phase = if p.x < screen_width / 2.0 {
            ContactPhase::Moving
        } else {
            outbox.push(ControlEvent::mouse_button(MouseButton::Right, true));
            ContactPhase::RightDrag
        };
        debug!("Background contact {:?} started as {:?}", id, phase);
        self.active = Some(TrackedContact::new(id, at, p, phase));
        true
    }

    pub fn track(&mut self, id: ContactId, p: Point, outbox: &mut Outbox) -> bool {
        let Some(contact) = self.active.as_mut().filter(|c| c.id == id) else {
            return false;
        };

        let (dx, dy) = contact.advance(p);
        let dx = dx * self.settings.sensitivity;
        let dy = dy * self.settings.sensitivity;
        if dx != 0.0 || dy != 0.0 {
            outbox.push(ControlEvent::MouseMove {
                x: round_half_up(dx),
                y: round_half_up(dy),
            });
        }
        true
    }

    /// Ends the contact; a short, still contact in move mode becomes a left click.
    pub fn end(&mut self, id: ContactId, at: DateTime<Local>, p: Point, outbox: &mut Outbox) -> bool {
        let Some(contact) = self.take(id) else {
            return false;
        };

        match contact.phase() {
            ContactPhase::RightDrag => {
                outbox.push(ControlEvent::mouse_button(MouseButton::Right, false));
            }
            ContactPhase::Moving => {
                let elapsed = contact.elapsed_ms(at);
                let distance = contact.origin.distance_to(p);
                if elapsed < self.settings.tap_max_ms && distance < self.settings.tap_max_distance
                {
                    info!(
                        "Tap recognised ({}ms, {:.1}px), synthesising left click",
                        elapsed, distance
                    );
                    outbox.push(ControlEvent::mouse_button(MouseButton::Left, true));
                    outbox.defer(
                        self.settings.tap_release_delay,
                        ControlEvent::mouse_button(MouseButton::Left, false),
                    );
                }
            }
            other => debug!("Background contact ended in unexpected phase {:?}", other),
        }
        true
    }

    /// Drops the contact without tap synthesis; a held right button is still released.
    pub fn cancel(&mut self, id: ContactId, outbox: &mut Outbox) -> bool {
        let Some(contact) = self.take(id) else {
            return false;
        };
        if contact.phase() == ContactPhase::RightDrag {
            outbox.push(ControlEvent::mouse_button(MouseButton::Right, false));
        }
        true
    }

    /// Cancels whatever contact is live.
    pub fn release_all(&mut self, outbox: &mut Outbox) {
        if let Some(id) = self.active.as_ref().map(|c| c.id) {
            self.cancel(id, outbox);
        }
    }

    fn take(&mut self, id: ContactId) -> Option<TrackedContact> {
        if self.owns(id) {
            self.active.take()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as TimeDelta;

    fn gestures() -> BackgroundGestures {
        BackgroundGestures::new(BackgroundSettings::from(&InputTuning::default()))
    }

    const WIDTH: f64 = 800.0;

    #[test]
    fn left_half_tap_clicks_with_deferred_release() {
        let mut bg = gestures();
        let mut out = Outbox::default();
        let t0 = Local::now();
        let id = ContactId::Touch(1);

        assert!(bg.start(id, t0, Point::new(100.0, 100.0), WIDTH, &mut out));
        assert!(out.is_empty());
        assert!(bg.end(id, t0 + TimeDelta::milliseconds(80), Point::new(102.0, 101.0), &mut out));

        assert_eq!(
            out.immediate,
            vec![ControlEvent::mouse_button(MouseButton::Left, true)]
        );
        assert_eq!(out.deferred.len(), 1);
        assert_eq!(out.deferred[0].delay, Duration::from_millis(50));
        assert_eq!(
            out.deferred[0].event,
            ControlEvent::mouse_button(MouseButton::Left, false)
        );
        assert!(bg.active_phase().is_none());
    }

    #[test]
    fn slow_or_long_contacts_do_not_click() {
        let t0 = Local::now();
        let id = ContactId::Touch(1);

        // too slow
        let mut bg = gestures();
        let mut out = Outbox::default();
        bg.start(id, t0, Point::new(100.0, 100.0), WIDTH, &mut out);
        bg.end(id, t0 + TimeDelta::milliseconds(200), Point::new(100.0, 100.0), &mut out);
        assert!(out.is_empty());

        // too far
        let mut out = Outbox::default();
        bg.start(id, t0, Point::new(100.0, 100.0), WIDTH, &mut out);
        bg.end(id, t0 + TimeDelta::milliseconds(50), Point::new(110.0, 100.0), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn moves_are_relative_to_last_sample_and_scaled() {
        let mut bg = gestures();
        let mut out = Outbox::default();
        let id = ContactId::Mouse;
        bg.start(id, Local::now(), Point::new(10.0, 10.0), WIDTH, &mut out);

        bg.track(id, Point::new(12.0, 10.0), &mut out);
        bg.track(id, Point::new(12.0, 10.0), &mut out);
        bg.track(id, Point::new(11.0, 13.0), &mut out);

        assert_eq!(
            out.immediate,
            vec![
                ControlEvent::MouseMove { x: 3, y: 0 },
                ControlEvent::MouseMove { x: -1, y: 5 },
            ]
        );
    }

    #[test]
    fn right_half_holds_right_button_until_end_or_cancel() {
        let mut bg = gestures();
        let t0 = Local::now();

        let mut out = Outbox::default();
        bg.start(ContactId::Touch(4), t0, Point::new(600.0, 50.0), WIDTH, &mut out);
        assert_eq!(bg.active_phase(), Some(ContactPhase::RightDrag));
        bg.end(ContactId::Touch(4), t0, Point::new(600.0, 50.0), &mut out);
        assert_eq!(
            out.immediate,
            vec![
                ControlEvent::mouse_button(MouseButton::Right, true),
                ControlEvent::mouse_button(MouseButton::Right, false),
            ]
        );

        let mut out = Outbox::default();
        bg.start(ContactId::Touch(5), t0, Point::new(600.0, 50.0), WIDTH, &mut out);
        assert!(bg.cancel(ContactId::Touch(5), &mut out));
        assert_eq!(out.immediate.len(), 2);
        assert!(bg.active_phase().is_none());
    }

    #[test]
    fn second_contact_and_foreign_ids_are_ignored() {
        let mut bg = gestures();
        let mut out = Outbox::default();
        let t0 = Local::now();
        assert!(bg.start(ContactId::Touch(1), t0, Point::new(10.0, 10.0), WIDTH, &mut out));
        assert!(!bg.start(ContactId::Touch(2), t0, Point::new(700.0, 10.0), WIDTH, &mut out));
        assert!(!bg.track(ContactId::Touch(2), Point::new(20.0, 10.0), &mut out));
        assert!(!bg.end(ContactId::Touch(2), t0, Point::new(20.0, 10.0), &mut out));
        assert!(out.is_empty());
        assert!(bg.owns(ContactId::Touch(1)));
    }

    #[test]
    fn cancel_never_synthesises_a_click() {
        let mut bg = gestures();
        let mut out = Outbox::default();
        bg.start(ContactId::Touch(1), Local::now(), Point::new(10.0, 10.0), WIDTH, &mut out);
        assert!(bg.cancel(ContactId::Touch(1), &mut out));
        assert!(out.is_empty());
    }
}
