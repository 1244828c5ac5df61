use anyhow::Result;
use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;
use tokio::{
    sync::broadcast::{Receiver, error::RecvError},
    time::Instant,
};
use tokio_util::sync::CancellationToken;

use crate::{
    app_context::AppState,
    event::{Event, EventBus},
    hardware::SysfsFiles,
    keypad::KeypadBacklight,
    providers::traits::ServiceProvider,
    task_manager::TaskManager,
};

/// Keypad backlight control service.
///
/// Drains the event bus into a [`KeypadBacklight`] and fires its inactivity
/// timeout. Without this service the daemon has nothing to do, so it is
/// critical and starts first.
pub struct KeypadServiceProvider {
    state: Arc<AppState>,
    event_bus: EventBus,
}

impl KeypadServiceProvider {
    pub fn new(state: Arc<AppState>, event_bus: EventBus) -> Self {
        Self { state, event_bus }
    }
}

#[async_trait]
impl ServiceProvider for KeypadServiceProvider {
    async fn start(&self, task_manager: &mut TaskManager) -> Result<()> {
        // Subscribe before returning so nothing published after startup is lost.
        let receiver = self.event_bus.subscribe();
        let controller = KeypadBacklight::new(
            self.state.config().keypad.clone(),
            self.state.profile.clone().into_backend(),
            Box::new(SysfsFiles::new()),
            self.state.backlight_enabled.clone(),
        );
        info!(
            "Keypad backlight control using '{}' backend",
            self.state.profile.backend_name()
        );

        task_manager.spawn_task(self.name(), |cancel_token| {
            run_keypad_service(controller, receiver, cancel_token)
        });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "KeypadService"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn is_critical(&self) -> bool {
        true
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn run_keypad_service(
    mut controller: KeypadBacklight,
    mut receiver: Receiver<Event>,
    cancel_token: CancellationToken,
) -> Result<()> {
    loop {
        let deadline = controller.timer_deadline();

        tokio::select! {
            () = cancel_token.cancelled() => {
                info!("Keypad service cancelled");
                break;
            }
            () = sleep_until_deadline(deadline) => {
                controller.on_timeout();
            }
            received = receiver.recv() => match received {
                Ok(event) => controller.handle_event(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Keypad service missed {skipped} events");
                }
                Err(RecvError::Closed) => {
                    info!("Event bus closed, stopping keypad service");
                    break;
                }
            },
        }
    }

    controller.shutdown();
    Ok(())
}
