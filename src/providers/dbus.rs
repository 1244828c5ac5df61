//! D-Bus service provider.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use zbus::Connection;

use crate::{
    app_context::AppState,
    config::BusKind,
    event::EventBus,
    interface::{
        DatapipeFeed, FEED_PATH, FEED_SERVICE, KeyBacklightRequest, MCE_REQUEST_PATH, MCE_SERVICE,
    },
    providers::traits::ServiceProvider,
    task_manager::TaskManager,
};

/// Exports the key backlight state query and the datapipe feed.
///
/// Non-critical: the keypad policy keeps running when no bus is available.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use keypad_backlightd::providers::DBusServiceProvider;
/// use keypad_backlightd::event::EventBus;
/// use keypad_backlightd::app_context::AppState;
///
/// # async fn example(state: Arc<AppState>) -> anyhow::Result<()> {
/// let provider = DBusServiceProvider::new(state, EventBus::new()).await?;
/// # Ok(())
/// # }
/// ```
pub struct DBusServiceProvider {
    state: Arc<AppState>,
    event_bus: EventBus,
    connection: Connection,
}

impl DBusServiceProvider {
    /// Connects to the bus selected in the configuration.
    pub async fn new(state: Arc<AppState>, event_bus: EventBus) -> Result<Self> {
        let bus = state.config().dbus.bus;
        let connection = match bus {
            BusKind::System => Connection::system().await,
            BusKind::Session => Connection::session().await,
        }
        .with_context(|| format!("Failed to connect to the {bus:?} bus"))?;

        Ok(Self {
            state,
            event_bus,
            connection,
        })
    }
}

#[async_trait]
impl ServiceProvider for DBusServiceProvider {
    async fn start(&self, task_manager: &mut TaskManager) -> Result<()> {
        let connection = self.connection.clone();
        let object_server = connection.object_server();

        object_server
            .at(
                MCE_REQUEST_PATH,
                KeyBacklightRequest::new(self.state.backlight_enabled.clone()),
            )
            .await?;
        object_server
            .at(
                FEED_PATH,
                DatapipeFeed::new(
                    self.event_bus.clone(),
                    self.state.backlight_enabled.clone(),
                ),
            )
            .await?;

        for name in [MCE_SERVICE, FEED_SERVICE] {
            if let Err(e) = connection.request_name(name).await {
                warn!("Could not acquire bus name {name}: {e}");
            }
        }
        info!("D-Bus objects exported at {MCE_REQUEST_PATH} and {FEED_PATH}");

        task_manager.spawn_task(self.name(), |cancel_token| {
            run_dbus_service(connection, cancel_token)
        });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "DBusService"
    }

    fn priority(&self) -> i32 {
        8
    }
}

/// Keeps the objects exported until cancelled, then removes them.
async fn run_dbus_service(connection: Connection, cancel_token: CancellationToken) -> Result<()> {
    cancel_token.cancelled().await;
    info!("D-Bus service cancelled");

    let object_server = connection.object_server();
    object_server
        .remove::<KeyBacklightRequest, _>(MCE_REQUEST_PATH)
        .await?;
    object_server.remove::<DatapipeFeed, _>(FEED_PATH).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{Config, ConfigManager, DbusCfg},
        hardware::HardwareProfile,
    };

    fn session_state() -> Arc<AppState> {
        let config = Config {
            dbus: DbusCfg {
                enabled: true,
                bus: BusKind::Session,
            },
            ..Config::default()
        };
        Arc::new(AppState::with_profile(
            ConfigManager::new(config, None),
            HardwareProfile::None,
        ))
    }

    #[tokio::test]
    async fn provider_metadata_when_bus_available() {
        // No session bus in most CI sandboxes; only the error path is checked then.
        match DBusServiceProvider::new(session_state(), EventBus::new()).await {
            Ok(provider) => {
                assert_eq!(provider.name(), "DBusService");
                assert_eq!(provider.priority(), 8);
                assert!(!provider.is_critical());
            }
            Err(e) => assert!(format!("{e:#}").contains("Session")),
        }
    }

    #[tokio::test]
    async fn exported_objects_are_removed_on_shutdown() {
        let Ok(provider) = DBusServiceProvider::new(session_state(), EventBus::new()).await else {
            return;
        };
        let mut task_manager = TaskManager::new();

        provider.start(&mut task_manager).await.unwrap();
        assert!(task_manager.is_running("DBusService"));

        task_manager.shutdown_all().await.unwrap();
        let removed = provider
            .connection
            .object_server()
            .remove::<DatapipeFeed, _>(FEED_PATH)
            .await;
        assert!(removed.is_err());
    }
}
