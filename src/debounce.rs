use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// One pending delayed message. Scheduling again cancels the previous task
/// first, which is what gives input debouncing its last-keystroke-wins
/// behavior.
#[derive(Default)]
pub struct DebounceTimer {
    handle: Option<JoinHandle<()>>,
}

impl DebounceTimer {
    pub fn new() -> Self {
        DebounceTimer { handle: None }
    }

    /// Cancels any pending task, then schedules `message` to be sent after
    /// `delay`. Delivery failure (receiver gone) is ignored.
    pub fn schedule<T>(&mut self, delay: Duration, tx: UnboundedSender<T>, message: T)
    where
        T: Send + 'static,
    {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(message);
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for DebounceTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
