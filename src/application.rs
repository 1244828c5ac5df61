//! Application entry point and builder.

use crate::{config::ConfigManager, coordinator::SystemCoordinator};
use anyhow::{Result, anyhow};

/// The daemon: initialize, start services, run until told to stop.
///
/// # Example
///
/// ```no_run
/// use keypad_backlightd::application::Application;
/// use keypad_backlightd::config::ConfigManager;
///
/// # async fn example() -> anyhow::Result<()> {
/// let mut app = Application::builder()
///     .with_config_manager(ConfigManager::load(None))
///     .build()?;
///
/// app.run().await?;
/// # Ok(())
/// # }
/// ```
pub struct Application {
    pub coordinator: SystemCoordinator,
    config_manager: ConfigManager,
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    pub async fn run(&mut self) -> Result<()> {
        self.coordinator
            .initialize(self.config_manager.clone())
            .await?;

        self.coordinator.start_all_services().await?;

        self.coordinator.run_main_loop().await
    }
}

pub struct ApplicationBuilder {
    config_manager: Option<ConfigManager>,
}

impl ApplicationBuilder {
    fn new() -> Self {
        Self {
            config_manager: None,
        }
    }

    pub fn with_config_manager(mut self, config_manager: ConfigManager) -> Self {
        self.config_manager = Some(config_manager);
        self
    }

    pub fn build(self) -> Result<Application> {
        let config_manager = self
            .config_manager
            .ok_or_else(|| anyhow!("Configuration manager is required"))?;

        Ok(Application {
            coordinator: SystemCoordinator::new(),
            config_manager,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn build_requires_config_manager() {
        let err = Application::builder().build().err().unwrap();
        assert!(err.to_string().contains("Configuration manager"));
    }

    #[test]
    fn build_with_config_manager() {
        let app = Application::builder()
            .with_config_manager(ConfigManager::new(Config::default(), None))
            .build()
            .unwrap();
        assert!(app.coordinator.running_services().is_empty());
    }
}
