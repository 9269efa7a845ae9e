use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::oneshot;

/// Wall clock in unix seconds.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
    }
}

/// Handle to the recurring countdown ticker.
///
/// Each start gets a new generation; ticks carrying any other generation are stale
/// and must be ignored by the owner.
#[derive(Debug, Default)]
pub(crate) struct CountdownTimer {
    stop: Option<oneshot::Sender<()>>,
    generation: u64,
}

impl CountdownTimer {
    /// Start ticking every `interval`, stopping any previous ticker first.
    /// `on_tick` receives the generation of this run.
    pub(crate) fn start<F>(&mut self, interval: Duration, on_tick: F) -> u64
    where
        F: Fn(u64) + Send + 'static,
    {
        self.stop();
        let generation = self.generation;
        let (stop_tx, mut stop_rx) = oneshot::channel();
        self.stop = Some(stop_tx);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = tokio::time::sleep(interval) => on_tick(generation),
                    _ = &mut stop_rx => break,
                }
            }
        });
        generation
    }

    pub(crate) fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.generation = self.generation.wrapping_add(1);
    }

    pub(crate) const fn is_running(&self) -> bool {
        self.stop.is_some()
    }

    pub(crate) const fn is_current(&self, generation: u64) -> bool {
        self.stop.is_some() && self.generation == generation
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
