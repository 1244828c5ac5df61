//! Point-in-time view of every channel.
//!
//! A channel value is cached before the triggers interested in it run, so a
//! trigger that queries another channel always sees the latest value.

use crate::{
    event::Event,
    modes::{AlarmUiState, CoverState, DisplayState, Submode, SystemState},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipeState {
    pub system_state: SystemState,
    pub device_inactive: bool,
    pub keyboard_slide: CoverState,
    pub display_state: DisplayState,
    /// Last value that went through the level channel.
    pub key_backlight_level: u32,
    pub alarm_ui_state: AlarmUiState,
    pub submode: Submode,
}

impl PipeState {
    /// Caches the value carried by `event`.
    pub fn record(&mut self, event: &Event) {
        match *event {
            Event::SystemStateChanged(state) => self.system_state = state,
            Event::DeviceInactive(inactive) => self.device_inactive = inactive,
            Event::KeyboardSlideChanged(cover) => self.keyboard_slide = cover,
            Event::DisplayStateChanged(state) => self.display_state = state,
            Event::KeyBacklightLevel(level) => {
                if let Ok(level) = u32::try_from(level) {
                    self.key_backlight_level = level;
                }
            }
            Event::AlarmUiStateChanged(state) => self.alarm_ui_state = state,
            Event::SubmodeChanged(submode) => self.submode = submode,
            Event::SystemShutdown => {}
        }
    }

    pub fn slide_open(&self) -> bool {
        self.keyboard_slide == CoverState::Open
    }

    pub fn keypad_locked(&self) -> bool {
        self.submode.contains(Submode::TKLOCK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn record_caches_each_channel() {
        let mut pipes = PipeState::default();

        pipes.record(&Event::SystemStateChanged(SystemState::User));
        pipes.record(&Event::KeyboardSlideChanged(CoverState::Open));
        pipes.record(&Event::AlarmUiStateChanged(AlarmUiState::Ringing));
        pipes.record(&Event::SubmodeChanged(Submode::TKLOCK));
        pipes.record(&Event::KeyBacklightLevel(200));
        pipes.record(&Event::DeviceInactive(true));

        assert_eq!(pipes.system_state, SystemState::User);
        assert!(pipes.slide_open());
        assert_eq!(pipes.alarm_ui_state, AlarmUiState::Ringing);
        assert!(pipes.keypad_locked());
        assert_eq!(pipes.key_backlight_level, 200);
        assert!(pipes.device_inactive);
    }

    #[test]
    fn unset_level_keeps_cached_value() {
        let mut pipes = PipeState::default();
        pipes.record(&Event::KeyBacklightLevel(64));
        pipes.record(&Event::KeyBacklightLevel(-1));
        assert_eq!(pipes.key_backlight_level, 64);
    }
}
