//! Edit-mode repositioning of layout elements.
//!
//! A contact on a draggable element starts as a pending tap. Moving more than
//! the threshold from the start point (either axis) turns it into a drag that
//! moves the element by the accumulated offset. Releasing a pending tap opens
//! the element editor instead.

use chrono::{DateTime, Local};
use std::collections::HashMap;
use tracing::{debug, info};

use super::contact::{ContactPhase, TrackedContact};
use super::input_event::ContactId;
use crate::layout::{Layout, Point};

/// How an edit-mode contact finished
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// Released without moving past the threshold
    OpenEditor(String),
    /// Released after moving; the new position should be persisted
    Moved(String),
    /// Cancelled; the element was put back where it started
    Restored(String),
}

#[derive(Debug)]
struct ElementDrag {
    contact: TrackedContact,
    element: String,
    initial: Point,
}

#[derive(Debug)]
pub struct EditDragTracker {
    threshold: f64,
    drags: HashMap<ContactId, ElementDrag>,
}

impl EditDragTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            drags: HashMap::new(),
        }
    }

    pub fn owns(&self, id: ContactId) -> bool {
        self.drags.contains_key(&id)
    }

    pub fn is_held(&self, element: &str) -> bool {
        self.drags.values().any(|d| d.element == element)
    }

    pub fn phase_of(&self, id: ContactId) -> Option<ContactPhase> {
        self.drags.get(&id).map(|d| d.contact.phase())
    }

    /// Begins a pending tap on `element`; refused while another contact holds it.
    pub fn start(
        &mut self,
        id: ContactId,
        element: &str,
        at: DateTime<Local>,
        p: Point,
        layout: &Layout,
    ) -> bool {
        if self.drags.contains_key(&id) || self.is_held(element) {
            debug!("Element {} already held, ignoring contact {:?}", element, id);
            return false;
        }
        let Some(target) = layout.get(element).filter(|e| e.is_draggable()) else {
            return false;
        };

        self.drags.insert(
            id,
            ElementDrag {
                contact: TrackedContact::new(id, at, p, ContactPhase::PendingTap),
                element: element.to_string(),
                initial: target.rect.origin(),
            },
        );
        true
    }

    pub fn track(&mut self, id: ContactId, p: Point, layout: &mut Layout) -> bool {
        let Some(drag) = self.drags.get_mut(&id) else {
            return false;
        };

        let (dx, dy) = drag.contact.offset_from_origin(p);
        drag.contact.last = p;

        if drag.contact.phase() == ContactPhase::PendingTap {
            if dx.abs() > self.threshold || dy.abs() > self.threshold {
                drag.contact.promote_to_drag();
                debug!("Contact {:?} now dragging {}", id, drag.element);
            } else {
                return true;
            }
        }

        layout.move_element(
            &drag.element,
            Point::new(drag.initial.x + dx, drag.initial.y + dy),
        );
        true
    }

    pub fn end(&mut self, id: ContactId) -> Option<DragOutcome> {
        let drag = self.drags.remove(&id)?;
        match drag.contact.phase() {
            ContactPhase::Dragging => {
                info!("Element {} moved", drag.element);
                Some(DragOutcome::Moved(drag.element))
            }
            _ => Some(DragOutcome::OpenEditor(drag.element)),
        }
    }

    pub fn cancel(&mut self, id: ContactId, layout: &mut Layout) -> Option<DragOutcome> {
        let drag = self.drags.remove(&id)?;
        layout.move_element(&drag.element, drag.initial);
        Some(DragOutcome::Restored(drag.element))
    }

    pub fn cancel_all(&mut self, layout: &mut Layout) {
        let ids: Vec<ContactId> = self.drags.keys().copied().collect();
        for id in ids {
            self.cancel(id, layout);
        }
    }
}
