//! Configuration management for keypad_backlightd.
//!
//! Handles loading and sanitising the YAML configuration file that holds the
//! keypad backlight timings, hardware selection and D-Bus settings.

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

/// Main configuration structure for the keypad_backlightd daemon.
///
/// # Example
///
/// ```yaml
/// version: 1
/// keypad:
///   backlight_timeout: 30
///   fade_in_time: 250
///   fade_out_time: 1000
/// hardware:
///   product: RX-51
/// dbus:
///   bus: system
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Configuration version for compatibility checking.
    pub version: u8,

    #[serde(default)]
    pub keypad: KeypadCfg,

    #[serde(default)]
    pub hardware: HardwareCfg,

    #[serde(default)]
    pub dbus: DbusCfg,
}

/// Keypad backlight timings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeypadCfg {
    /// Inactivity timeout in seconds.
    #[serde(default = "defaults::backlight_timeout")]
    pub backlight_timeout: u32,

    /// Fade-in time in milliseconds.
    #[serde(default = "defaults::fade_in_time")]
    pub fade_in_time: u32,

    /// Fade-out time in milliseconds.
    #[serde(default = "defaults::fade_out_time")]
    pub fade_out_time: u32,

    /// Level pushed when the backlight is switched on.
    #[serde(default = "defaults::default_level")]
    pub default_level: u32,
}

/// Hardware selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareCfg {
    /// Product identifier such as `RX-51`; detected when absent.
    #[serde(default)]
    pub product: Option<String>,

    /// File holding the `product` line used for detection.
    #[serde(default = "defaults::product_file")]
    pub product_file: PathBuf,

    /// Root of the sysfs tree all LED paths are resolved against.
    #[serde(default = "defaults::sysfs_root")]
    pub sysfs_root: PathBuf,
}

/// Which message bus the D-Bus objects are exported on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BusKind {
    #[default]
    System,
    Session,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbusCfg {
    #[serde(default = "defaults::dbus_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub bus: BusKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            keypad: KeypadCfg::default(),
            hardware: HardwareCfg::default(),
            dbus: DbusCfg::default(),
        }
    }
}

impl Default for KeypadCfg {
    fn default() -> Self {
        Self {
            backlight_timeout: defaults::backlight_timeout(),
            fade_in_time: defaults::fade_in_time(),
            fade_out_time: defaults::fade_out_time(),
            default_level: defaults::default_level(),
        }
    }
}

impl Default for HardwareCfg {
    fn default() -> Self {
        Self {
            product: None,
            product_file: defaults::product_file(),
            sysfs_root: defaults::sysfs_root(),
        }
    }
}

impl Default for DbusCfg {
    fn default() -> Self {
        Self {
            enabled: defaults::dbus_enabled(),
            bus: BusKind::default(),
        }
    }
}

impl KeypadCfg {
    /// Returns a copy with out-of-range values replaced.
    ///
    /// A fade time is rejected only when it is above one second and not a
    /// multiple of 125 ms. The default level must be a visible brightness
    /// (1..=255).
    pub fn sanitized(&self) -> Self {
        Self {
            fade_in_time: sanitize_fade_time(
                "fade_in_time",
                self.fade_in_time,
                defaults::fade_in_time(),
            ),
            fade_out_time: sanitize_fade_time(
                "fade_out_time",
                self.fade_out_time,
                defaults::fade_out_time(),
            ),
            default_level: sanitize_default_level(self.default_level),
            ..self.clone()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.backlight_timeout))
    }
}

fn sanitize_fade_time(key: &str, value: u32, default: u32) -> u32 {
    if value % 125 != 0 && value > 1000 {
        warn!("Invalid {key} {value} ms, using default {default} ms");
        default
    } else {
        value
    }
}

fn sanitize_default_level(value: u32) -> u32 {
    match value {
        0 => {
            let default = defaults::default_level();
            warn!("Invalid default_level 0, using default {default}");
            default
        }
        1..=MAX_LEVEL => value,
        _ => {
            warn!("default_level {value} above {MAX_LEVEL}, clamping");
            MAX_LEVEL
        }
    }
}

/// Highest brightness the LED controllers accept.
const MAX_LEVEL: u32 = 255;

pub mod defaults {
    use std::path::PathBuf;

    /// Default inactivity timeout in seconds.
    pub fn backlight_timeout() -> u32 {
        30
    }

    /// Default fade-in time in milliseconds.
    pub fn fade_in_time() -> u32 {
        250
    }

    /// Default fade-out time in milliseconds.
    pub fn fade_out_time() -> u32 {
        1000
    }

    pub fn default_level() -> u32 {
        255
    }

    pub fn product_file() -> PathBuf {
        PathBuf::from("/proc/component_version")
    }

    pub fn sysfs_root() -> PathBuf {
        PathBuf::from("/sys")
    }

    pub fn dbus_enabled() -> bool {
        true
    }
}

fn locate_config() -> Option<PathBuf> {
    if let Ok(env_path) = env::var("KEYPAD_BACKLIGHTD_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    if let Some(mut cfg_dir) = env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|h| Path::new(&h).join(".config")))
    {
        cfg_dir.push("keypad_backlightd/config.yml");
        if cfg_dir.exists() {
            return Some(cfg_dir);
        }
    }

    let etc = Path::new("/etc/keypad_backlightd/config.yml");
    etc.exists().then(|| etc.to_path_buf())
}

/// Read-only configuration loaded once at startup.
///
/// # Example
///
/// ```no_run
/// use keypad_backlightd::config::ConfigManager;
/// use std::path::PathBuf;
///
/// // Load from specific path
/// let config_manager = ConfigManager::load(Some(PathBuf::from("config.yml")));
///
/// // Load from standard locations, or defaults
/// let config_manager = ConfigManager::load(None);
///
/// let timeout = config_manager.get().keypad.backlight_timeout;
/// ```
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: Arc<Config>,
    path: Option<PathBuf>,
}

impl ConfigManager {
    /// Wraps an already built configuration, sanitising the keypad timings.
    pub fn new(mut config: Config, path: Option<PathBuf>) -> Self {
        config.keypad = config.keypad.sanitized();
        Self {
            config: Arc::new(config),
            path,
        }
    }

    /// Loads configuration from file or standard locations.
    ///
    /// Searches for configuration in the following order:
    /// 1. Provided path parameter
    /// 2. KEYPAD_BACKLIGHTD_CONFIG environment variable
    /// 3. XDG_CONFIG_HOME/keypad_backlightd/config.yml or ~/.config/keypad_backlightd/config.yml
    /// 4. /etc/keypad_backlightd/config.yml
    ///
    /// Any failure along the way falls back to the built-in defaults.
    pub fn load(path: Option<PathBuf>) -> Self {
        let Some(config_path) = path.or_else(locate_config) else {
            info!("No configuration file found, using defaults");
            return Self::new(Config::default(), None);
        };

        info!("Loading config from: {}", config_path.display());
        match Self::load_config_from_path(&config_path) {
            Ok(config) => Self::new(config, Some(config_path)),
            Err(e) => {
                warn!("{e:#}; using defaults");
                Self::new(Config::default(), Some(config_path))
            }
        }
    }

    pub fn get(&self) -> &Config {
        &self.config
    }

    /// Path the configuration was read from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn load_config_from_path(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML in: {}", path.display()))?;

        if config.version != 1 {
            anyhow::bail!(
                "Unsupported config version {} in file: {}",
                config.version,
                path.display()
            );
        }

        Ok(config)
    }
}
