//! Keypad backlight policy.
//!
//! [`KeypadBacklight`] owns everything the policy mutates: the cached level,
//! the last display state, the inactivity timer and the hardware backend.
//! All methods run on the single task that drains the event channels, so no
//! locking is involved.

use std::sync::Arc;

use log::{debug, info};
use tokio::{sync::watch, time::Instant};

use crate::{
    config::KeypadCfg,
    datapipe::PipeState,
    event::{Event, LEVEL_UNSET},
    hardware::{BacklightBackend, SysfsWriter},
    modes::{CoverState, DisplayState, SystemState},
};

pub struct KeypadBacklight {
    settings: KeypadCfg,
    backend: Box<dyn BacklightBackend>,
    io: Box<dyn SysfsWriter>,
    pipes: PipeState,
    enabled: bool,
    cached_level: i32,
    last_display_state: DisplayState,
    /// Expiry of the inactivity timeout; `None` when nothing is scheduled.
    timer: Option<Instant>,
    status: Arc<watch::Sender<bool>>,
}

impl KeypadBacklight {
    pub fn new(
        settings: KeypadCfg,
        backend: Box<dyn BacklightBackend>,
        io: Box<dyn SysfsWriter>,
        status: Arc<watch::Sender<bool>>,
    ) -> Self {
        Self {
            settings,
            backend,
            io,
            pipes: PipeState::default(),
            enabled: false,
            cached_level: LEVEL_UNSET,
            last_display_state: DisplayState::Undef,
            timer: None,
            status,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn cached_level(&self) -> i32 {
        self.cached_level
    }

    pub fn timer_deadline(&self) -> Option<Instant> {
        self.timer
    }

    pub fn pipes(&self) -> &PipeState {
        &self.pipes
    }

    /// Caches the channel value, then runs the trigger listening on it.
    pub fn handle_event(&mut self, event: Event) {
        self.pipes.record(&event);

        match event {
            Event::SystemStateChanged(state) => self.on_system_state(state),
            Event::DeviceInactive(inactive) => self.on_device_inactive(inactive),
            Event::KeyboardSlideChanged(cover) => self.on_keyboard_slide(cover),
            Event::DisplayStateChanged(state) => self.on_display_state(state),
            Event::KeyBacklightLevel(level) => self.on_backlight_level(level),
            Event::AlarmUiStateChanged(_) | Event::SubmodeChanged(_) | Event::SystemShutdown => {}
        }
    }

    fn on_system_state(&mut self, state: SystemState) {
        if state != SystemState::User {
            self.disable();
        }
    }

    fn on_device_inactive(&mut self, inactive: bool) {
        if !inactive {
            self.enable_policy();
        }
    }

    fn on_keyboard_slide(&mut self, cover: CoverState) {
        if cover == CoverState::Open && !self.pipes.keypad_locked() {
            self.enable_policy();
        } else {
            self.disable();
        }
    }

    fn on_display_state(&mut self, state: DisplayState) {
        if state == self.last_display_state {
            return;
        }

        if state.is_dimmed() {
            self.disable();
        } else if state == DisplayState::On && self.last_display_state != DisplayState::On {
            self.enable_policy();
        }

        self.last_display_state = state;
    }

    /// The only place the hardware gets written.
    fn on_backlight_level(&mut self, level: i32) {
        if level == self.cached_level || level < 0 {
            return;
        }
        // Negative values were filtered above.
        let brightness = level.unsigned_abs();

        let fade_time = if brightness == 0 {
            self.settings.fade_out_time
        } else {
            self.settings.fade_in_time
        };

        self.cached_level = level;
        self.enabled = brightness != 0;
        self.status.send_replace(self.enabled);
        debug!(
            "Keypad backlight level {brightness} via '{}'",
            self.backend.name()
        );

        let timer_pending = self.timer.is_some();
        self.backend
            .apply_level(self.io.as_mut(), fade_time, brightness, timer_pending);
    }

    /// Pushes `level` through the level channel.
    fn push_level(&mut self, level: u32) {
        self.pipes.key_backlight_level = level;
        self.on_backlight_level(i32::try_from(level).unwrap_or(i32::MAX));
    }

    pub fn disable(&mut self) {
        self.cancel_timer();
        self.push_level(0);
    }

    fn enable(&mut self) {
        self.cancel_timer();

        if !self.pipes.slide_open() {
            return;
        }

        self.start_timer();

        if self.pipes.key_backlight_level == 0 {
            self.push_level(self.settings.default_level);
        }
    }

    fn enable_policy(&mut self) {
        if !self.pipes.slide_open() {
            return;
        }

        if self.pipes.system_state == SystemState::User || self.pipes.alarm_ui_state.is_showing() {
            if self.timer.is_some() {
                self.start_timer();
            } else {
                self.enable();
            }
        }
    }

    fn start_timer(&mut self) {
        self.timer = Some(Instant::now() + self.settings.timeout());
    }

    fn cancel_timer(&mut self) {
        self.timer = None;
    }

    /// Called when the inactivity timeout expires.
    pub fn on_timeout(&mut self) {
        debug!("Keypad backlight timeout");
        self.timer = None;
        self.disable();
    }

    /// Cancels the timer and releases every hardware handle.
    pub fn shutdown(&mut self) {
        info!("Stopping keypad backlight control");
        self.cancel_timer();
        self.io.close_all();
    }
}
