//! Application state provider for dependency injection.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::{app_context::AppState, config::ConfigManager, providers::traits::AsyncProvider};

/// Builds the [`AppState`], reading the product file off the async runtime.
pub struct AppStateProvider {
    config_manager: ConfigManager,
}

impl AppStateProvider {
    pub const fn new(config_manager: ConfigManager) -> Self {
        Self { config_manager }
    }
}

#[async_trait]
impl AsyncProvider<Arc<AppState>> for AppStateProvider {
    async fn provide(&self) -> Result<Arc<AppState>> {
        let config_manager = self.config_manager.clone();
        let app_state = tokio::task::spawn_blocking(move || AppState::new(config_manager)).await?;
        Ok(Arc::new(app_state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{Config, HardwareCfg},
        hardware::HardwareProfile,
    };

    #[tokio::test]
    async fn provides_state_for_configured_product() {
        let config = Config {
            hardware: HardwareCfg {
                product: Some("RX-48".into()),
                ..HardwareCfg::default()
            },
            ..Config::default()
        };

        let state = AppStateProvider::new(ConfigManager::new(config, None))
            .provide()
            .await
            .unwrap();

        assert!(matches!(state.profile, HardwareProfile::N810(_)));
        assert!(!*state.backlight_enabled.borrow());
    }

    #[tokio::test]
    async fn unknown_product_has_no_hardware() {
        let config = Config {
            hardware: HardwareCfg {
                product: Some("SU-18".into()),
                ..HardwareCfg::default()
            },
            ..Config::default()
        };

        let state = AppStateProvider::new(ConfigManager::new(config, None))
            .provide()
            .await
            .unwrap();

        assert_eq!(state.profile, HardwareProfile::None);
    }
}
