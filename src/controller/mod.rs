//! Controller subsystem for touch and pointer input
//!
//! Turns raw contact events into control events:
//!
//! 1. [`input_event`] - Platform events as delivered by the client
//! 2. [`contact`] - Per-contact tracking record shared by all gesture kinds
//! 3. [`background`] - Relative pointer movement, right-drag and tap-to-click
//! 4. [`joystick`] - Virtual joystick area driving the left stick
//! 5. [`buttons`] - On-screen button presses
//! 6. [`edit_drag`] - Repositioning elements while edit mode is on
//!
//! # Architecture
//!
//! ```text
//!                    ┌─► JoystickEngine ──► axes
//! ContactStart ─ hit ┼─► ButtonPresses ───► btn / key
//!     test           ├─► BackgroundGestures ► mouse_move / mouse_btn
//!                    └─► EditDragTracker ─► layout geometry (edit mode)
//! ```
//!
//! Each contact is routed once, at start, and every later move/end/cancel for
//! the same id goes to the component that claimed it.

pub mod background;
pub mod buttons;
pub mod contact;
pub mod edit_drag;
pub mod input_event;
pub mod joystick;

pub use background::{BackgroundGestures, BackgroundSettings};
pub use buttons::ButtonPresses;
pub use contact::{ContactPhase, TrackedContact};
pub use edit_drag::{DragOutcome, EditDragTracker};
pub use input_event::{
    ContactId, MotionSample, OrientationSample, PlatformEvent, SettingsCommand,
};
pub use joystick::JoystickEngine;
