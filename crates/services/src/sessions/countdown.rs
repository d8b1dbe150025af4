use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// A recurring timer task that calls back once per period.
///
/// The first callback fires one full period after spawning. The task stops
/// when the callback returns `ControlFlow::Break`, or when the `Countdown` is
/// cancelled or dropped.
pub(crate) struct Countdown {
    handle: JoinHandle<()>,
}

impl Countdown {
    /// Must be called from within a tokio runtime.
    pub(crate) fn spawn<F, Fut>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if on_tick().await.is_break() {
                    break;
                }
            }
        });
        Self { handle }
    }

    pub(crate) fn cancel(&self) {
        self.handle.abort();
    }

    #[cfg(test)]
    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
