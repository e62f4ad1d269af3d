use std::future::Future;
use std::time::Duration;

use staffguard_core::AppResult;
use tokio::task::JoinHandle;

/// Launches detached best-effort work bounded by a timeout.
///
/// Failures and timeouts are logged and never reach the request that scheduled the work.
#[derive(Debug, Clone, Copy)]
pub struct BackgroundTasks {
    timeout: Duration,
}

impl BackgroundTasks {
    /// Creates a launcher with the given per-task timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Returns the per-task timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Spawns `task` on the runtime.
    pub fn spawn<F>(&self, task_name: &'static str, task: F) -> JoinHandle<()>
    where
        F: Future<Output = AppResult<()>> + Send + 'static,
    {
        let timeout = self.timeout;
        tokio::spawn(async move {
            match tokio::time::timeout(timeout, task).await {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    tracing::warn!(task = task_name, error = %error, "background task failed");
                }
                Err(_) => {
                    tracing::warn!(
                        task = task_name,
                        timeout_ms = timeout.as_millis() as u64,
                        "background task timed out"
                    );
                }
            }
        })
    }
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}
