use tokio::{task::JoinHandle, time::Duration};

/// Single-shot delayed callback guarded by a generation token.
///
/// Every `arm` and `cancel` bumps the generation. The callback receives the
/// generation it was armed with, and the receiver must check it with
/// [`Timer::take_if_current`] before acting: a firing that raced a cancel
/// then carries a stale token and is ignored. Callers keep the timer behind
/// the same lock as the state it protects.
#[derive(Debug, Default)]
pub struct Timer {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels any pending firing, then schedules `fire` after `delay`.
    /// Returns the generation `fire` will be called with.
    pub fn arm<F>(&mut self, delay: Duration, fire: F) -> u64
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.cancel();
        let generation = self.generation;
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fire(generation);
        }));
        generation
    }

    /// Invalidates the outstanding firing, if any. Returns whether one was armed.
    pub fn cancel(&mut self) -> bool {
        self.generation = self.generation.wrapping_add(1);
        match self.task.take() {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.task.is_some()
    }

    /// Consumes a firing. True only for the generation that is currently armed;
    /// afterwards the timer is disarmed and the same token is never accepted again.
    pub fn take_if_current(&mut self, generation: u64) -> bool {
        if self.task.is_none() || self.generation != generation {
            return false;
        }
        self.task = None;
        self.generation = self.generation.wrapping_add(1);
        true
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
