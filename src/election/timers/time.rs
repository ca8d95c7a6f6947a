use tokio::time::Instant;

#[async_trait::async_trait]
pub(crate) trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;

    async fn sleep_until(&mut self, deadline: Instant);
}

#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct SystemClock;

#[async_trait::async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep_until(&mut self, deadline: Instant) {
        tokio::time::sleep_until(deadline).await;
    }
}

/// A clock that only moves when its controller says so.
#[cfg(test)]
pub(crate) fn manual_clock() -> (ManualClock, ManualClockController) {
    let (now_tx, now_rx) = tokio::sync::watch::channel(Instant::now());
    (ManualClock { now: now_rx }, ManualClockController { now: now_tx })
}

#[cfg(test)]
#[derive(Clone)]
pub(crate) struct ManualClock {
    now: tokio::sync::watch::Receiver<Instant>,
}

#[cfg(test)]
#[async_trait::async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.borrow()
    }

    async fn sleep_until(&mut self, deadline: Instant) {
        while *self.now.borrow() < deadline {
            if self.now.changed().await.is_err() {
                // Controller is gone, time stands still forever.
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
pub(crate) struct ManualClockController {
    now: tokio::sync::watch::Sender<Instant>,
}

#[cfg(test)]
impl ManualClockController {
    /// Moves time forward. Sleepers wake once the time passes their deadline, however far past it.
    pub(crate) fn advance(&self, duration: tokio::time::Duration) {
        let next = *self.now.borrow() + duration;
        let _ = self.now.send(next);
    }
}
