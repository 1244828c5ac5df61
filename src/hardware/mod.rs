//! Keypad backlight hardware: product detection, per-model path tables and
//! the backends that drive them.

pub mod lysti;
pub mod n810;
pub mod sysfs;

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use log::{debug, info, warn};

use crate::config::HardwareCfg;

pub use lysti::{LystiBackend, LystiProfile};
pub use n810::{N810Backend, N810Profile};
pub use sysfs::{SysfsFiles, SysfsWriter};

const LEDS_CLASS: &str = "class/leds";

/// Strategy used to put a brightness on the keypad LEDs.
///
/// Selected once at startup from the [`HardwareProfile`].
pub trait BacklightBackend: Send + fmt::Debug {
    /// Drives the LEDs to `brightness`, fading over `fade_time` ms.
    ///
    /// `timer_pending` tells whether an inactivity timeout is armed.
    fn apply_level(
        &mut self,
        io: &mut dyn SysfsWriter,
        fade_time: u32,
        brightness: u32,
        timer_pending: bool,
    );

    fn name(&self) -> &'static str;
}

/// Backend for products without a keypad backlight.
#[derive(Debug, Default)]
pub struct NoBacklight;

impl BacklightBackend for NoBacklight {
    fn apply_level(&mut self, _io: &mut dyn SysfsWriter, _fade: u32, _brightness: u32, _timer: bool) {}

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Device models the daemon knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductId {
    /// Nokia N800.
    Rx44,
    /// Nokia N810.
    Rx48,
    /// Nokia N900.
    Rx51,
    /// Nokia N950.
    Rm680,
    /// Nokia N9.
    Rm690,
    Unknown,
}

impl FromStr for ProductId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "RX-44" => Self::Rx44,
            "RX-48" => Self::Rx48,
            "RX-51" => Self::Rx51,
            "RM-680" => Self::Rm680,
            "RM-690" => Self::Rm690,
            _ => Self::Unknown,
        })
    }
}

impl ProductId {
    /// Picks the product from the config, or from the `product` line of the
    /// component version file.
    pub fn resolve(cfg: &HardwareCfg) -> Self {
        if let Some(product) = &cfg.product {
            return product.parse().unwrap_or(Self::Unknown);
        }

        match fs::read_to_string(&cfg.product_file) {
            Ok(content) => Self::from_component_version(&content),
            Err(e) => {
                warn!(
                    "Cannot read product from {}: {e}",
                    cfg.product_file.display()
                );
                Self::Unknown
            }
        }
    }

    fn from_component_version(content: &str) -> Self {
        content
            .lines()
            .filter_map(|line| line.trim().strip_prefix("product"))
            .filter_map(|rest| rest.split_whitespace().last())
            .map(|id| id.parse().unwrap_or(Self::Unknown))
            .next()
            .unwrap_or(Self::Unknown)
    }
}

/// Per-model description of the keypad backlight hardware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HardwareProfile {
    Lysti(LystiProfile),
    N810(N810Profile),
    None,
}

impl HardwareProfile {
    pub fn for_product(product: ProductId, sysfs_root: &Path) -> Self {
        let leds = sysfs_root.join(LEDS_CLASS);
        match product {
            ProductId::Rm680 | ProductId::Rm690 => {
                Self::Lysti(LystiProfile::new(&leds, &[0, 1, 2, 3, 4, 5]))
            }
            ProductId::Rx51 => Self::Lysti(LystiProfile::new(&leds, &[0, 1, 2, 3, 7, 8])),
            ProductId::Rx44 | ProductId::Rx48 => Self::N810(N810Profile::new(sysfs_root)),
            ProductId::Unknown => Self::None,
        }
    }

    /// Resolves the product and builds the matching profile.
    pub fn detect(cfg: &HardwareCfg) -> Self {
        let product = ProductId::resolve(cfg);
        let profile = Self::for_product(product, &cfg.sysfs_root);
        info!(
            "Keypad hardware: product {product:?}, backend '{}'",
            profile.backend_name()
        );
        for path in profile.paths() {
            debug!("Keypad backlight attribute: {}", path.display());
        }
        profile
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Lysti(_) => "lysti",
            Self::N810(_) => "n810",
            Self::None => "none",
        }
    }

    /// Every attribute file the backend may write to.
    pub fn paths(&self) -> Vec<PathBuf> {
        match self {
            Self::Lysti(profile) => profile.paths(),
            Self::N810(profile) => profile.paths(),
            Self::None => Vec::new(),
        }
    }

    pub fn into_backend(self) -> Box<dyn BacklightBackend> {
        match self {
            Self::Lysti(profile) => Box::new(LystiBackend::new(profile)),
            Self::N810(profile) => Box::new(N810Backend::new(profile)),
            Self::None => Box::new(NoBacklight),
        }
    }
}
