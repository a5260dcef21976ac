//! Virtual joystick: contact displacement from the area center to the left stick.

use tracing::debug;

use super::input_event::ContactId;
use crate::emission::{ControlAxisPair, ControlEvent, Outbox};
use crate::layout::{Point, Rect};
use crate::mapping::{quantize, NEUTRAL};

/// Vector from `center` to `p`, projected onto the circle of `radius` when it reaches past it.
pub fn deflect(p: Point, center: Point, radius: f64) -> (f64, f64) {
    let mut dx = p.x - center.x;
    let mut dy = p.y - center.y;
    let dist = (dx * dx + dy * dy).sqrt();
    if dist > radius {
        let angle = dy.atan2(dx);
        dx = angle.cos() * radius;
        dy = angle.sin() * radius;
    }
    (dx, dy)
}

/// Tracks the single contact that drives the joystick area
#[derive(Debug)]
pub struct JoystickEngine {
    radius_ratio: f64,
    contact: Option<ContactId>,
    /// Rendered knob offset from the area center
    knob: (f64, f64),
}

impl JoystickEngine {
    pub fn new(radius_ratio: f64) -> Self {
        Self {
            radius_ratio,
            contact: None,
            knob: (0.0, 0.0),
        }
    }

    /// Maximum knob travel for an area: a ratio of half its side length.
    pub fn radius(&self, area: &Rect) -> f64 {
        (area.width / 2.0) * self.radius_ratio
    }

    pub fn owns(&self, id: ContactId) -> bool {
        self.contact == Some(id)
    }

    pub fn is_engaged(&self) -> bool {
        self.contact.is_some()
    }

    pub fn knob_offset(&self) -> (f64, f64) {
        self.knob
    }

    /// Claims the joystick for `id` unless another contact already holds it.
    pub fn engage(
        &mut self,
        id: ContactId,
        p: Point,
        area: &Rect,
        axes: &mut ControlAxisPair,
        steering_active: bool,
        outbox: &mut Outbox,
    ) -> bool {
        if self.contact.is_some() {
            return false;
        }
        debug!("Joystick engaged by {:?}", id);
        self.contact = Some(id);
        self.update(p, area, axes, steering_active, outbox);
        true
    }

    pub fn track(
        &mut self,
        id: ContactId,
        p: Point,
        area: &Rect,
        axes: &mut ControlAxisPair,
        steering_active: bool,
        outbox: &mut Outbox,
    ) -> bool {
        if !self.owns(id) {
            return false;
        }
        self.update(p, area, axes, steering_active, outbox);
        true
    }

    /// Releases the joystick (end or cancel). Always emits the recentred pair.
    pub fn release(
        &mut self,
        id: ContactId,
        axes: &mut ControlAxisPair,
        steering_active: bool,
        outbox: &mut Outbox,
    ) -> bool {
        if !self.owns(id) {
            return false;
        }
        self.recenter(axes, steering_active, outbox);
        true
    }

    /// Drops the current contact, if any, and recentres.
    pub fn release_any(
        &mut self,
        axes: &mut ControlAxisPair,
        steering_active: bool,
        outbox: &mut Outbox,
    ) {
        if self.contact.is_some() {
            self.recenter(axes, steering_active, outbox);
        }
    }

    fn recenter(&mut self, axes: &mut ControlAxisPair, steering_active: bool, outbox: &mut Outbox) {
        debug!("Joystick released by {:?}", self.contact);
        self.contact = None;
        self.knob = (0.0, 0.0);
        axes.ly = NEUTRAL;
        if !steering_active {
            axes.lx = NEUTRAL;
        }
        outbox.push(ControlEvent::axes(*axes));
    }

    fn update(
        &mut self,
        p: Point,
        area: &Rect,
        axes: &mut ControlAxisPair,
        steering_active: bool,
        outbox: &mut Outbox,
    ) {
        let radius = self.radius(area);
        let (dx, dy) = deflect(p, area.center(), radius);
        self.knob = (dx, dy);

        axes.ly = quantize(dy, -radius, radius);
        if !steering_active {
            axes.lx = quantize(dx, -radius, radius);
        }
        outbox.push(ControlEvent::axes(*axes));
    }
}
