//! System coordinator for service lifecycle and dependency injection.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use log::{info, warn};
use tokio::{
    signal::unix::{SignalKind, signal},
    sync::broadcast::error::RecvError,
};

use crate::{
    app_context::AppState,
    config::ConfigManager,
    event::{Event, EventBus},
    providers::{
        AppStateProvider, AsyncProvider, DBusServiceProvider, KeypadServiceProvider,
        ServiceProvider,
    },
    task_manager::TaskManager,
};

/// Owns the services and drives them from startup to shutdown.
///
/// Critical services must start; the rest degrade to a warning.
pub struct SystemCoordinator {
    task_manager: TaskManager,
    event_bus: EventBus,
    shared_state: Option<Arc<AppState>>,
    service_providers: Vec<Box<dyn ServiceProvider>>,
}

impl Default for SystemCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemCoordinator {
    pub fn new() -> Self {
        Self {
            task_manager: TaskManager::new(),
            event_bus: EventBus::new(),
            shared_state: None,
            service_providers: Vec::new(),
        }
    }

    /// Resolves the application state and registers the service providers.
    pub async fn initialize(&mut self, config_manager: ConfigManager) -> Result<()> {
        info!("Initializing SystemCoordinator...");
        match config_manager.path() {
            Some(path) => info!("Configuration source: {}", path.display()),
            None => info!("Configuration source: built-in defaults"),
        }

        let state = AppStateProvider::new(config_manager)
            .provide()
            .await
            .context("Failed to initialize application state")?;
        self.shared_state = Some(state.clone());

        self.register_service_providers(state).await;

        info!("SystemCoordinator initialization completed");
        Ok(())
    }

    async fn register_service_providers(&mut self, state: Arc<AppState>) {
        let mut providers: Vec<Box<dyn ServiceProvider>> = vec![Box::new(
            KeypadServiceProvider::new(state.clone(), self.event_bus.clone()),
        )];

        if state.config().dbus.enabled {
            match DBusServiceProvider::new(state.clone(), self.event_bus.clone()).await {
                Ok(provider) => providers.push(Box::new(provider)),
                Err(e) => warn!("{e:#}, skipping D-Bus service"),
            }
        } else {
            info!("D-Bus service disabled in configuration");
        }

        providers.sort_by_key(|provider| std::cmp::Reverse(provider.priority()));
        self.service_providers = providers;

        info!(
            "Registered {} service providers in priority order",
            self.service_providers.len()
        );
    }

    /// Starts all registered services in priority order.
    pub async fn start_all_services(&mut self) -> Result<()> {
        if self.shared_state.is_none() {
            bail!("System not properly initialized");
        }

        for provider in &self.service_providers {
            let is_critical = provider.is_critical();

            match provider.start(&mut self.task_manager).await {
                Ok(()) => info!(
                    "Service '{}' started (priority: {}, critical: {is_critical})",
                    provider.name(),
                    provider.priority(),
                ),
                Err(e) if is_critical => {
                    return Err(e).with_context(|| {
                        format!("Critical service '{}' failed to start", provider.name())
                    });
                }
                Err(e) => warn!(
                    "Non-critical service '{}' failed to start: {e:#}",
                    provider.name()
                ),
            }
        }

        info!("All critical services started successfully");
        Ok(())
    }

    /// Waits for SIGINT, SIGTERM or a shutdown event, then stops every service.
    pub async fn run_main_loop(&mut self) -> Result<()> {
        let mut event_rx = self.event_bus.subscribe();
        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
        info!("Starting main event loop");

        loop {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    result.context("Failed to listen for shutdown signal")?;
                    info!("Received Ctrl+C, initiating graceful shutdown...");
                    break;
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, initiating graceful shutdown...");
                    break;
                }
                event = event_rx.recv() => match event {
                    Ok(Event::SystemShutdown) => {
                        info!("Processing SystemShutdown event");
                        break;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(n)) => warn!("Event bus lagged by {n} messages"),
                    Err(RecvError::Closed) => bail!("Event bus channel closed unexpectedly"),
                },
            }
        }

        self.shutdown().await;
        info!("Main event loop terminated");
        Ok(())
    }

    async fn shutdown(&mut self) {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.task_manager.shutdown_all().await {
            log::error!("Error during task shutdown: {e:#}");
        }

        info!("Shutdown complete");
    }

    pub const fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn state(&self) -> Option<&Arc<AppState>> {
        self.shared_state.as_ref()
    }

    pub fn running_services(&self) -> Vec<&'static str> {
        self.service_providers.iter().map(|p| p.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{Config, DbusCfg, HardwareCfg},
        hardware::HardwareProfile,
        modes::{CoverState, SystemState},
    };
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn offline_config() -> ConfigManager {
        let config = Config {
            hardware: HardwareCfg {
                product: Some("SU-18".into()),
                ..HardwareCfg::default()
            },
            dbus: DbusCfg {
                enabled: false,
                ..DbusCfg::default()
            },
            ..Config::default()
        };
        ConfigManager::new(config, None)
    }

    #[tokio::test]
    async fn start_requires_initialization() {
        let mut coordinator = SystemCoordinator::new();
        assert!(coordinator.start_all_services().await.is_err());
    }

    #[tokio::test]
    async fn initialize_registers_keypad_service_only_without_dbus() {
        let mut coordinator = SystemCoordinator::new();
        coordinator.initialize(offline_config()).await.unwrap();

        assert_eq!(coordinator.running_services(), vec!["KeypadService"]);
        assert_eq!(coordinator.state().unwrap().profile, HardwareProfile::None);
    }

    #[tokio::test]
    async fn shutdown_event_ends_main_loop() {
        let mut coordinator = SystemCoordinator::new();
        coordinator.initialize(offline_config()).await.unwrap();
        coordinator.start_all_services().await.unwrap();

        let state = coordinator.state().unwrap().clone();
        let mut status = state.backlight_enabled.subscribe();
        let event_bus = coordinator.event_bus().clone();

        let publisher = async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            event_bus
                .publish(Event::SystemStateChanged(SystemState::User))
                .unwrap();
            event_bus
                .publish(Event::KeyboardSlideChanged(CoverState::Open))
                .unwrap();
            status.wait_for(|enabled| *enabled).await.unwrap();
            event_bus.publish(Event::SystemShutdown).unwrap();
        };

        let (result, ()) = tokio::join!(coordinator.run_main_loop(), publisher);
        result.unwrap();
    }
}
