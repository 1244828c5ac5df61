//! Task management for async service lifecycle.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use log::{error, info, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How long a cancelled task may take to wind down.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

struct NamedTask {
    name: &'static str,
    handle: JoinHandle<Result<()>>,
}

/// Owns the daemon's background tasks.
///
/// Every task receives a child of one global [`CancellationToken`]; shutdown
/// cancels the global token and joins tasks in reverse start order.
pub struct TaskManager {
    tasks: Vec<NamedTask>,
    global_token: CancellationToken,
}

impl TaskManager {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            global_token: CancellationToken::new(),
        }
    }

    /// Spawns `task_fn` as a named task.
    pub fn spawn_task<F, Fut>(&mut self, name: &'static str, task_fn: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let token = self.global_token.child_token();

        let handle = tokio::spawn(async move {
            info!("Starting task: {name}");
            let result = task_fn(token).await;
            match &result {
                Ok(()) => info!("Task '{name}' finished"),
                Err(e) => error!("Task '{name}' failed: {e:#}"),
            }
            result
        });

        self.tasks.push(NamedTask { name, handle });
    }

    /// Cancels every task and waits for them to finish.
    ///
    /// Returns the first failure, if any.
    pub async fn shutdown_all(&mut self) -> Result<()> {
        info!("Stopping all {} tasks", self.tasks.len());
        self.global_token.cancel();

        let mut first_error = None;
        while let Some(NamedTask { name, handle }) = self.tasks.pop() {
            let outcome = match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => Err(anyhow!("Task '{name}' panicked: {e}")),
                Err(_) => Err(anyhow!("Task '{name}' did not stop in time")),
            };

            if let Err(e) = outcome {
                warn!("{e:#}");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e).context("One or more tasks failed during shutdown"),
            None => {
                info!("All tasks stopped");
                Ok(())
            }
        }
    }

    pub fn active_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.tasks
            .iter()
            .any(|task| task.name == name && !task.handle.is_finished())
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}
