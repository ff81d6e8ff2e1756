//! Play mode state.

use serde::{Deserialize, Serialize};

/// When auto-pause stops playback relative to a subtitle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AutoPausePreference {
    AtStart,
    #[default]
    AtEnd,
}

/// Optional playback behaviours layered on top of normal playback.
///
/// Condensed playback and auto-pause exclude each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayModes {
    condensed: bool,
    auto_pause: bool,
}

impl PlayModes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_condensed(&self) -> bool {
        self.condensed
    }

    pub fn is_auto_pause(&self) -> bool {
        self.auto_pause
    }

    pub fn is_normal(&self) -> bool {
        !self.condensed && !self.auto_pause
    }

    pub fn set_condensed(&mut self, enabled: bool) {
        self.condensed = enabled;
        if enabled {
            self.auto_pause = false;
        }
    }

    pub fn set_auto_pause(&mut self, enabled: bool) {
        self.auto_pause = enabled;
        if enabled {
            self.condensed = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modes_are_exclusive() {
        let mut modes = PlayModes::new();
        assert!(modes.is_normal());

        modes.set_condensed(true);
        assert!(modes.is_condensed());

        modes.set_auto_pause(true);
        assert!(modes.is_auto_pause());
        assert!(!modes.is_condensed());

        modes.set_auto_pause(false);
        assert!(modes.is_normal());
    }

    #[test]
    fn test_preference_wire_names() {
        assert_eq!(
            serde_json::to_value(AutoPausePreference::AtStart).unwrap(),
            serde_json::json!("atStart")
        );
        assert_eq!(AutoPausePreference::default(), AutoPausePreference::AtEnd);
    }
}
