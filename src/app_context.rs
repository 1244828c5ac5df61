//! Application state shared by the services.

use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    config::{Config, ConfigManager},
    hardware::HardwareProfile,
};

/// State resolved once at startup and shared by every service.
pub struct AppState {
    pub config_manager: Arc<ConfigManager>,
    /// Immutable after startup.
    pub profile: HardwareProfile,
    /// Key backlight enabled flag; written by the keypad service, read by
    /// the D-Bus status query.
    pub backlight_enabled: Arc<watch::Sender<bool>>,
}

impl AppState {
    /// Resolves the hardware profile from the configuration.
    pub fn new(config_manager: ConfigManager) -> Self {
        let profile = HardwareProfile::detect(&config_manager.get().hardware);
        Self::with_profile(config_manager, profile)
    }

    pub fn with_profile(config_manager: ConfigManager, profile: HardwareProfile) -> Self {
        let (backlight_enabled, _) = watch::channel(false);
        Self {
            config_manager: Arc::new(config_manager),
            profile,
            backlight_enabled: Arc::new(backlight_enabled),
        }
    }

    pub fn config(&self) -> &Config {
        self.config_manager.get()
    }
}
