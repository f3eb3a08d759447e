//! Tokio-backed tick scheduler.
//!
//! Hooks are async handlers registered by name; scheduling spawns a task
//! that sleeps until due and invokes the handler. Re-registering a hook
//! replaces its pending task, and `clear` aborts it.

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::domain::foundation::Timestamp;
use crate::ports::{ScheduleError, TickScheduler};

/// Future returned by a hook handler.
pub type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// An async callback invoked when its hook fires.
pub type HookHandler = Arc<dyn Fn() -> HookFuture + Send + Sync>;

struct ScheduledTask {
    handle: JoinHandle<()>,
    due: Arc<RwLock<Timestamp>>,
}

/// Runtime scheduler running hooks on tokio tasks.
#[derive(Default)]
pub struct TokioScheduler {
    handlers: Arc<RwLock<HashMap<String, HookHandler>>>,
    tasks: Arc<RwLock<HashMap<String, ScheduledTask>>>,
}

impl TokioScheduler {
    /// Creates a scheduler with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the handler invoked when `hook` fires.
    ///
    /// Registration must happen before the hook is scheduled.
    pub async fn register_handler(&self, hook: &str, handler: HookHandler) {
        self.handlers.write().await.insert(hook.to_string(), handler);
    }

    async fn handler_for(&self, hook: &str) -> Result<HookHandler, ScheduleError> {
        self.handlers
            .read()
            .await
            .get(hook)
            .cloned()
            .ok_or_else(|| ScheduleError::Backend(format!("no handler registered for '{hook}'")))
    }

    async fn replace_task(&self, hook: &str, task: ScheduledTask) {
        let mut tasks = self.tasks.write().await;
        if let Some(old) = tasks.insert(hook.to_string(), task) {
            old.handle.abort();
        }
    }
}

#[async_trait]
impl TickScheduler for TokioScheduler {
    async fn schedule_one_shot(&self, hook: &str, delay_secs: u64) -> Result<(), ScheduleError> {
        let handler = self.handler_for(hook).await?;
        let due = Arc::new(RwLock::new(Timestamp::now().plus_secs(delay_secs)));

        let tasks = Arc::clone(&self.tasks);
        let hook_name = hook.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(delay_secs)).await;
            handler().await;
            tasks.write().await.remove(&hook_name);
        });

        self.replace_task(hook, ScheduledTask { handle, due }).await;
        Ok(())
    }

    async fn schedule_recurring(
        &self,
        hook: &str,
        interval_secs: u64,
    ) -> Result<(), ScheduleError> {
        let handler = self.handler_for(hook).await?;
        let due = Arc::new(RwLock::new(Timestamp::now().plus_secs(interval_secs)));

        let due_for_task = Arc::clone(&due);
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(interval_secs)).await;
                *due_for_task.write().await = Timestamp::now().plus_secs(interval_secs);
                handler().await;
            }
        });

        self.replace_task(hook, ScheduledTask { handle, due }).await;
        Ok(())
    }

    async fn next_scheduled(&self, hook: &str) -> Option<Timestamp> {
        let tasks = self.tasks.read().await;
        let task = tasks.get(hook)?;
        let due = *task.due.read().await;
        Some(due)
    }

    async fn clear(&self, hook: &str) -> Result<(), ScheduleError> {
        if let Some(task) = self.tasks.write().await.remove(hook) {
            task.handle.abort();
        }
        Ok(())
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        // Outstanding tasks must not outlive the scheduler.
        if let Ok(tasks) = self.tasks.try_read() {
            for task in tasks.values() {
                task.handle.abort();
            }
        }
    }
}
