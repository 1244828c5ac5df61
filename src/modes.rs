//! Typed values carried by the event channels.
//!
//! Integer conversions follow the numbering used by the MCE D-Bus API so that
//! values injected over the bus map one to one.

use std::fmt;

/// Overall system state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SystemState {
    #[default]
    Undef,
    Shutdown,
    User,
    ActDead,
    Reboot,
    Boot,
}

impl From<i32> for SystemState {
    fn from(value: i32) -> Self {
        match value {
            0 => Self::Shutdown,
            2 => Self::User,
            5 => Self::ActDead,
            6 => Self::Reboot,
            9 => Self::Boot,
            _ => Self::Undef,
        }
    }
}

/// Display power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayState {
    #[default]
    Undef,
    Off,
    LpmOff,
    LpmOn,
    Dim,
    On,
}

impl DisplayState {
    /// True for every state in which the keypad should go dark.
    pub const fn is_dimmed(self) -> bool {
        matches!(self, Self::Off | Self::LpmOff | Self::LpmOn | Self::Dim)
    }
}

impl From<i32> for DisplayState {
    fn from(value: i32) -> Self {
        match value {
            0 => Self::Off,
            1 => Self::LpmOff,
            2 => Self::LpmOn,
            3 => Self::Dim,
            4 => Self::On,
            _ => Self::Undef,
        }
    }
}

/// Keyboard slide (cover) position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoverState {
    #[default]
    Undef,
    Closed,
    Open,
}

impl From<i32> for CoverState {
    fn from(value: i32) -> Self {
        match value {
            0 => Self::Closed,
            1 => Self::Open,
            _ => Self::Undef,
        }
    }
}

/// Alarm dialog state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlarmUiState {
    #[default]
    Invalid,
    Off,
    Ringing,
    Visible,
}

impl AlarmUiState {
    /// An alarm dialog is on screen, either ringing or snoozed-visible.
    pub const fn is_showing(self) -> bool {
        matches!(self, Self::Ringing | Self::Visible)
    }
}

impl From<i32> for AlarmUiState {
    fn from(value: i32) -> Self {
        match value {
            0 => Self::Off,
            1 => Self::Ringing,
            2 => Self::Visible,
            _ => Self::Invalid,
        }
    }
}

/// Bitmask of device lock and restriction flags.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Submode(u32);

impl Submode {
    pub const NORMAL: Self = Self(0);
    /// Touchscreen/keypad lock.
    pub const TKLOCK: Self = Self(1 << 0);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }
}

impl fmt::Debug for Submode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Submode({:#06x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn system_state_uses_mce_numbering() {
        assert_eq!(SystemState::from(2), SystemState::User);
        assert_eq!(SystemState::from(5), SystemState::ActDead);
        assert_eq!(SystemState::from(42), SystemState::Undef);
        assert_eq!(SystemState::from(-1), SystemState::Undef);
    }

    #[test]
    fn dimmed_display_states() {
        for state in [
            DisplayState::Off,
            DisplayState::LpmOff,
            DisplayState::LpmOn,
            DisplayState::Dim,
        ] {
            assert!(state.is_dimmed(), "{state:?} should count as dimmed");
        }
        assert!(!DisplayState::On.is_dimmed());
        assert!(!DisplayState::Undef.is_dimmed());
        assert_eq!(DisplayState::from(4), DisplayState::On);
        assert_eq!(DisplayState::from(-1), DisplayState::Undef);
    }

    #[test]
    fn cover_and_alarm_conversions() {
        assert_eq!(CoverState::from(1), CoverState::Open);
        assert_eq!(CoverState::from(0), CoverState::Closed);
        assert_eq!(CoverState::from(7), CoverState::Undef);

        assert!(AlarmUiState::from(1).is_showing());
        assert!(AlarmUiState::from(2).is_showing());
        assert!(!AlarmUiState::from(0).is_showing());
        assert!(!AlarmUiState::from(-1).is_showing());
    }

    #[test]
    fn submode_tklock_bit() {
        assert!(Submode::from_bits(0x1).contains(Submode::TKLOCK));
        assert!(Submode::from_bits(0x3).contains(Submode::TKLOCK));
        assert!(!Submode::from_bits(0x2).contains(Submode::TKLOCK));
        assert!(!Submode::NORMAL.contains(Submode::NORMAL));
        assert_eq!(format!("{:?}", Submode::TKLOCK), "Submode(0x0001)");
    }
}
