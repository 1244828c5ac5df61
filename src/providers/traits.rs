use anyhow::Result;
use async_trait::async_trait;

use crate::task_manager::TaskManager;

/// Base trait for providers that build a component asynchronously.
#[async_trait]
pub trait AsyncProvider<T> {
    async fn provide(&self) -> Result<T>;
}

/// A service started through the [`TaskManager`].
///
/// Services start in descending priority order. A critical service that
/// fails to start aborts startup; any other failure is logged and skipped.
///
/// # Example
///
/// ```no_run
/// use keypad_backlightd::providers::traits::ServiceProvider;
/// use keypad_backlightd::task_manager::TaskManager;
/// use anyhow::Result;
///
/// struct ExampleService;
///
/// #[async_trait::async_trait]
/// impl ServiceProvider for ExampleService {
///     async fn start(&self, task_manager: &mut TaskManager) -> Result<()> {
///         task_manager.spawn_task(self.name(), |_token| async { Ok(()) });
///         Ok(())
///     }
///
///     fn name(&self) -> &'static str { "ExampleService" }
/// }
/// ```
#[async_trait]
pub trait ServiceProvider: Send + Sync {
    async fn start(&self, task_manager: &mut TaskManager) -> Result<()>;

    fn name(&self) -> &'static str;

    /// Startup priority (higher numbers start first).
    fn priority(&self) -> i32 {
        0
    }

    fn is_critical(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    };
    use tokio::time::{Duration, sleep};

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AsyncProvider<usize> for CountingProvider {
        async fn provide(&self) -> Result<usize> {
            Ok(self.calls.fetch_add(1, Ordering::SeqCst) + 1)
        }
    }

    struct FlagService {
        ran: Arc<AtomicBool>,
    }

    #[async_trait]
    impl ServiceProvider for FlagService {
        async fn start(&self, task_manager: &mut TaskManager) -> Result<()> {
            let ran = self.ran.clone();
            task_manager.spawn_task(self.name(), move |_token| async move {
                ran.store(true, Ordering::SeqCst);
                Ok(())
            });
            Ok(())
        }

        fn name(&self) -> &'static str {
            "FlagService"
        }
    }

    struct BrokenService;

    #[async_trait]
    impl ServiceProvider for BrokenService {
        async fn start(&self, _task_manager: &mut TaskManager) -> Result<()> {
            Err(anyhow!("{}: no hardware", self.name()))
        }

        fn name(&self) -> &'static str {
            "BrokenService"
        }

        fn priority(&self) -> i32 {
            7
        }

        fn is_critical(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn async_provider_is_called_each_time() {
        let provider = CountingProvider {
            calls: AtomicUsize::new(0),
        };
        assert_eq!(provider.provide().await.unwrap(), 1);
        assert_eq!(provider.provide().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn service_defaults() {
        let service = FlagService {
            ran: Arc::new(AtomicBool::new(false)),
        };
        assert_eq!(service.priority(), 0);
        assert!(!service.is_critical());
    }

    #[tokio::test]
    async fn started_service_runs_its_task() {
        let ran = Arc::new(AtomicBool::new(false));
        let service = FlagService { ran: ran.clone() };
        let mut task_manager = TaskManager::new();

        service.start(&mut task_manager).await.unwrap();
        sleep(Duration::from_millis(10)).await;

        assert!(ran.load(Ordering::SeqCst));
        task_manager.shutdown_all().await.unwrap();
    }

    #[tokio::test]
    async fn failing_start_reports_service_name() {
        let mut task_manager = TaskManager::new();
        let services: Vec<Box<dyn ServiceProvider>> = vec![Box::new(BrokenService)];

        for service in &services {
            let err = service.start(&mut task_manager).await.unwrap_err();
            assert!(err.to_string().contains("BrokenService"));
            assert!(service.is_critical());
            assert_eq!(service.priority(), 7);
        }
        assert_eq!(task_manager.active_count(), 0);
    }
}
