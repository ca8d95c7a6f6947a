mod heartbeat;
mod time;

pub(crate) use heartbeat::spawn_heartbeat;
pub(crate) use heartbeat::HeartbeatHandle;
pub(crate) use heartbeat::HeartbeatTarget;
pub(crate) use time::Clock;
pub(crate) use time::SystemClock;

#[cfg(test)]
pub(crate) use time::{manual_clock, ManualClockController};
