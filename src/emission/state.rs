use std::collections::HashMap;

use super::{ControlAxisPair, InputMode};
use crate::layout::{LeftInputStyle, Viewport};
use crate::persistence::PersistedSettings;

/// Session-wide values shared by the gesture and sensor handlers
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub mode: InputMode,
    pub edit_mode: bool,
    pub show_debug: bool,
    /// Application is backgrounded
    pub hidden: bool,
    /// Last left-stick state written by the joystick or steering
    pub axes: ControlAxisPair,
    pub viewport: Viewport,
    pub left_style: LeftInputStyle,
    pub element_sizes: HashMap<String, f64>,
}

impl SessionState {
    pub fn from_settings(settings: &PersistedSettings, viewport: Viewport) -> Self {
        Self {
            mode: settings.mode,
            edit_mode: false,
            show_debug: settings.show_debug,
            hidden: false,
            axes: ControlAxisPair::neutral(),
            viewport,
            left_style: settings.left_style,
            element_sizes: settings.element_sizes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_neutral_outside_edit_mode() {
        let settings = PersistedSettings {
            mode: InputMode::Arrow,
            show_debug: true,
            ..Default::default()
        };
        let state = SessionState::from_settings(&settings, Viewport::default());
        assert_eq!(state.mode, InputMode::Arrow);
        assert!(state.show_debug);
        assert!(!state.edit_mode);
        assert!(state.axes.is_neutral());
    }
}
