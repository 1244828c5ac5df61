//! Event channels feeding the keypad backlight policy.

use anyhow::Result;
use tokio::sync::broadcast;

use crate::modes::{AlarmUiState, CoverState, DisplayState, Submode, SystemState};

/// Sentinel carried on the level channel when no level has been set.
pub const LEVEL_UNSET: i32 = -1;

/// One value delivered on one of the daemon's channels.
///
/// The first five variants are the channels the keypad controller reacts to.
/// Alarm UI and submode changes only refresh the cached values that the
/// enable policy reads synchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    SystemStateChanged(SystemState),
    /// `true` when the device went inactive, `false` on activity.
    DeviceInactive(bool),
    KeyboardSlideChanged(CoverState),
    DisplayStateChanged(DisplayState),
    /// Requested keypad brightness; `0` is off, negative means unset.
    KeyBacklightLevel(i32),
    AlarmUiStateChanged(AlarmUiState),
    SubmodeChanged(Submode),
    SystemShutdown,
}

/// Publish/subscribe bus shared by the event sources and the keypad service.
///
/// Every subscriber sees events in publication order.
///
/// # Example
///
/// ```no_run
/// use keypad_backlightd::event::{Event, EventBus};
/// use keypad_backlightd::modes::CoverState;
///
/// let event_bus = EventBus::new();
/// let mut subscriber = event_bus.subscribe();
///
/// event_bus.publish(Event::KeyboardSlideChanged(CoverState::Open)).unwrap();
///
/// // In async context, receive events:
/// // let event = subscriber.recv().await;
/// ```
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new EventBus with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    /// Creates a new EventBus with custom capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns an error if there are no active subscribers.
    pub fn publish(&self, event: Event) -> Result<()> {
        self.sender.send(event)?;
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::time::{Duration, sleep};

    #[test]
    fn clone_shares_channel() {
        let event_bus1 = EventBus::new();
        let event_bus2 = event_bus1.clone();

        let _receiver1 = event_bus1.subscribe();
        let _receiver2 = event_bus2.subscribe();

        assert_eq!(event_bus1.subscriber_count(), 2);
        assert_eq!(event_bus2.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn publish_without_subscribers_returns_error() {
        let event_bus = EventBus::new();
        let result = event_bus.publish(Event::DeviceInactive(false));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn channel_values_arrive_in_order() {
        let event_bus = EventBus::new();
        let mut receiver = event_bus.subscribe();

        let sent = [
            Event::SystemStateChanged(SystemState::User),
            Event::KeyboardSlideChanged(CoverState::Open),
            Event::DisplayStateChanged(DisplayState::On),
            Event::KeyBacklightLevel(128),
            Event::SubmodeChanged(Submode::TKLOCK),
        ];
        for event in sent {
            event_bus.publish(event).unwrap();
        }

        for expected in sent {
            assert_eq!(receiver.recv().await.unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn late_subscriber_only_sees_new_events() {
        let event_bus = EventBus::new();
        let mut early = event_bus.subscribe();

        event_bus.publish(Event::DeviceInactive(true)).unwrap();
        assert_eq!(early.recv().await.unwrap(), Event::DeviceInactive(true));

        let mut late = event_bus.subscribe();
        event_bus.publish(Event::DeviceInactive(false)).unwrap();

        assert_eq!(late.recv().await.unwrap(), Event::DeviceInactive(false));
    }

    #[tokio::test]
    async fn events_cross_task_boundaries() {
        let event_bus = EventBus::new();
        let mut receiver = event_bus.subscribe();
        let publisher_bus = event_bus.clone();

        let publisher = tokio::spawn(async move {
            sleep(Duration::from_millis(10)).await;
            publisher_bus.publish(Event::SystemShutdown).unwrap();
        });

        publisher.await.unwrap();
        assert_eq!(receiver.recv().await.unwrap(), Event::SystemShutdown);
    }
}
