use crate::election::timers::time::Clock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::time::{Duration, Instant};

#[async_trait::async_trait]
pub(crate) trait HeartbeatTarget: Send + Sync + 'static {
    async fn heartbeat(self: Arc<Self>);
}

/// Stops the heartbeat task when dropped.
pub(crate) struct HeartbeatHandle {
    stopped: Arc<AtomicBool>,
}

impl Drop for HeartbeatHandle {
    fn drop(&mut self) {
        self.stopped.store(true, Ordering::Release);
    }
}

/// Calls `target.heartbeat()` every `interval` until the handle or the target is dropped.
/// A heartbeat that overruns the interval pushes the next one back rather than piling them up.
pub(crate) fn spawn_heartbeat<T: HeartbeatTarget, C: Clock>(target: Weak<T>, interval: Duration, clock: C) -> HeartbeatHandle {
    let stopped = Arc::new(AtomicBool::new(false));
    let task = HeartbeatTask {
        target,
        interval,
        next_beat: clock.now() + interval,
        clock,
        stopped: stopped.clone(),
    };
    tokio::spawn(task.run());

    HeartbeatHandle { stopped }
}

struct HeartbeatTask<T, C> {
    target: Weak<T>,
    interval: Duration,
    next_beat: Instant,
    clock: C,
    stopped: Arc<AtomicBool>,
}

impl<T: HeartbeatTarget, C: Clock> HeartbeatTask<T, C> {
    async fn run(mut self) {
        loop {
            self.clock.sleep_until(self.next_beat).await;
            if self.stopped.load(Ordering::Acquire) {
                return;
            }

            match self.target.upgrade() {
                Some(target) => target.heartbeat().await,
                None => return,
            }

            self.next_beat += self.interval;
            let now = self.clock.now();
            if self.next_beat <= now {
                self.next_beat = now + self.interval;
            }
        }
    }
}
