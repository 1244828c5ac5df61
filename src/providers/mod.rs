//! Providers that build the daemon's components and services.

pub mod app_state;
pub mod dbus;
pub mod keypad;
pub mod traits;

pub use app_state::AppStateProvider;
pub use dbus::DBusServiceProvider;
pub use keypad::KeypadServiceProvider;
pub use traits::{AsyncProvider, ServiceProvider};
