//! D-Bus objects exported by the daemon.

use std::sync::Arc;

use log::{debug, error};
use tokio::sync::watch;
use zbus::interface;

use crate::{
    event::{Event, EventBus},
    modes::{AlarmUiState, CoverState, DisplayState, Submode, SystemState},
};

pub const MCE_SERVICE: &str = "com.nokia.mce";
pub const MCE_REQUEST_PATH: &str = "/com/nokia/mce/request";
pub const FEED_SERVICE: &str = "io.github.keypad_backlightd";
pub const FEED_PATH: &str = "/io/github/keypad_backlightd";

/// Answers key backlight state queries.
pub struct KeyBacklightRequest {
    enabled: Arc<watch::Sender<bool>>,
}

impl KeyBacklightRequest {
    pub fn new(enabled: Arc<watch::Sender<bool>>) -> Self {
        Self { enabled }
    }
}

#[interface(name = "com.nokia.mce.request")]
impl KeyBacklightRequest {
    #[zbus(name = "get_key_backlight_state")]
    async fn get_key_backlight_state(&self) -> bool {
        debug!("Received key backlight state get request");
        let state = *self.enabled.borrow();
        debug!("Sending key backlight state: {state}");
        state
    }
}

/// Lets the rest of the system push channel values into the daemon.
pub struct DatapipeFeed {
    event_bus: EventBus,
    enabled: Arc<watch::Sender<bool>>,
}

impl DatapipeFeed {
    pub fn new(event_bus: EventBus, enabled: Arc<watch::Sender<bool>>) -> Self {
        Self { event_bus, enabled }
    }

    fn publish(&self, event: Event) -> zbus::fdo::Result<()> {
        self.event_bus.publish(event).map_err(|e| {
            error!("Failed to publish {event:?}: {e}");
            zbus::fdo::Error::Failed(format!("keypad service not listening: {e}"))
        })
    }
}

#[interface(name = "io.github.keypad_backlightd1")]
impl DatapipeFeed {
    #[zbus(name = "set_system_state")]
    async fn set_system_state(&self, state: i32) -> zbus::fdo::Result<()> {
        self.publish(Event::SystemStateChanged(SystemState::from(state)))
    }

    #[zbus(name = "set_device_inactive")]
    async fn set_device_inactive(&self, inactive: bool) -> zbus::fdo::Result<()> {
        self.publish(Event::DeviceInactive(inactive))
    }

    #[zbus(name = "set_keyboard_slide")]
    async fn set_keyboard_slide(&self, cover: i32) -> zbus::fdo::Result<()> {
        self.publish(Event::KeyboardSlideChanged(CoverState::from(cover)))
    }

    #[zbus(name = "set_display_state")]
    async fn set_display_state(&self, state: i32) -> zbus::fdo::Result<()> {
        self.publish(Event::DisplayStateChanged(DisplayState::from(state)))
    }

    #[zbus(name = "req_key_backlight_level")]
    async fn req_key_backlight_level(&self, level: i32) -> zbus::fdo::Result<()> {
        self.publish(Event::KeyBacklightLevel(level))
    }

    #[zbus(name = "set_alarm_ui_state")]
    async fn set_alarm_ui_state(&self, state: i32) -> zbus::fdo::Result<()> {
        self.publish(Event::AlarmUiStateChanged(AlarmUiState::from(state)))
    }

    #[zbus(name = "set_submode")]
    async fn set_submode(&self, submode: u32) -> zbus::fdo::Result<()> {
        self.publish(Event::SubmodeChanged(Submode::from_bits(submode)))
    }

    /// Read on demand; no `PropertiesChanged` is sent for it.
    #[zbus(property(emits_changed_signal = "false"))]
    async fn key_backlight_enabled(&self) -> bool {
        *self.enabled.borrow()
    }
}
