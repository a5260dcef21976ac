use chrono::{DateTime, Local};

use super::input_event::ContactId;
use crate::layout::Point;

/// Role a tracked contact currently plays.
///
/// Histories are linear: `PendingTap` may become `Dragging` once; `Moving` and
/// `RightDrag` are fixed at contact start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactPhase {
    PendingTap,
    Dragging,
    Moving,
    RightDrag,
}

/// One touch or mouse engagement from start to end/cancel
#[derive(Debug, Clone)]
pub struct TrackedContact {
    pub id: ContactId,
    pub origin: Point,
    pub last: Point,
    pub started_at: DateTime<Local>,
    phase: ContactPhase,
}

impl TrackedContact {
    pub fn new(id: ContactId, at: DateTime<Local>, origin: Point, phase: ContactPhase) -> Self {
        Self {
            id,
            origin,
            last: origin,
            started_at: at,
            phase,
        }
    }

    pub fn phase(&self) -> ContactPhase {
        self.phase
    }

    /// `PendingTap -> Dragging`; any other phase stays as it is.
    pub fn promote_to_drag(&mut self) -> bool {
        if self.phase == ContactPhase::PendingTap {
            self.phase = ContactPhase::Dragging;
            true
        } else {
            false
        }
    }

    /// Offset of `p` from the contact origin.
    pub fn offset_from_origin(&self, p: Point) -> (f64, f64) {
        (p.x - self.origin.x, p.y - self.origin.y)
    }

    /// Offset of `p` from the previous sample; records `p` as the new last sample.
    pub fn advance(&mut self, p: Point) -> (f64, f64) {
        let delta = (p.x - self.last.x, p.y - self.last.y);
        self.last = p;
        delta
    }

    pub fn elapsed_ms(&self, at: DateTime<Local>) -> i64 {
        (at - self.started_at).num_milliseconds()
    }
}
