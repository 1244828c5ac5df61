//! # keypad_backlightd
//!
//! A Linux daemon that switches the keypad (or slide keyboard) backlight of
//! a handset on and off.
//!
//! ## Behaviour
//!
//! The backlight comes on when the keyboard slide opens in the user state,
//! or while an alarm dialog is showing, and stays on until the inactivity
//! timeout expires, the display dims, the slide closes or the keypad is
//! locked. Levels are written to sysfs LED files through one of the
//! [`hardware`] backends, with hardware fades where the chip supports them.
//!
//! ## Architecture
//!
//! - [`EventBus`](event::EventBus) carries the input channel values.
//! - [`KeypadBacklight`](keypad::KeypadBacklight) holds the policy state.
//! - [`SystemCoordinator`](coordinator::SystemCoordinator) starts the
//!   services built by the [`providers`].
//!
//! ## Example
//!
//! ```no_run
//! use keypad_backlightd::{application::Application, config::ConfigManager};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Application::builder()
//!         .with_config_manager(ConfigManager::load(None))
//!         .build()?
//!         .run()
//!         .await
//! }
//! ```

pub mod app_context;
pub mod application;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod datapipe;
pub mod event;
pub mod hardware;
pub mod interface;
pub mod keypad;
pub mod modes;
pub mod providers;
pub mod task_manager;
