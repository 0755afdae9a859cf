//! Background tick driver.
//!
//! One tokio task ticks every registered session at a fixed interval.
//! Sessions are locked one at a time and only for the length of a tick, and
//! a busy session is skipped rather than waited on, so one user's command
//! never holds up another user's tick.

use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::service::PomodoroService;

pub struct TickDriver<C>
where
    C: Clock + Send + Sync + 'static,
{
    service: Arc<PomodoroService<C>>,
    interval: Duration,
}

/// Running driver; dropping it without `shutdown` leaves the task running.
pub struct TickDriverHandle {
    stop: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

impl<C> TickDriver<C>
where
    C: Clock + Send + Sync + 'static,
{
    pub fn new(service: Arc<PomodoroService<C>>, interval: Duration) -> Self {
        Self { service, interval }
    }

    pub fn spawn(self) -> TickDriverHandle {
        let (stop, rx) = oneshot::channel();
        let join = tokio::spawn(self.run(rx));
        TickDriverHandle { stop, join }
    }

    async fn run(self, mut stop: oneshot::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.interval);
        // A late tick already advances at most one phase; bursts add nothing.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::debug!(interval_ms = whole_millis(self.interval), "tick driver running");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let fired = self.service.tick_all().await;
                    if !fired.is_empty() {
                        tracing::debug!(count = fired.len(), "sessions advanced");
                    }
                }
                _ = &mut stop => break,
            }
        }
        tracing::debug!("tick driver stopped");
    }
}

/// Milliseconds in `d`, saturating at `u64::MAX`.
fn whole_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl TickDriverHandle {
    pub async fn shutdown(self) {
        let _ = self.stop.send(());
        if let Err(err) = self.join.await {
            tracing::warn!(error = %err, "tick driver task failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::ids::UserId;
    use crate::notify::{NotificationSink, RecordingSink};
    use crate::timer::{Phase, SessionConfig};
    use chrono::{TimeZone, Utc};

    #[test]
    fn interval_millis_saturate() {
        assert_eq!(whole_millis(Duration::from_millis(250)), 250);
        assert_eq!(whole_millis(Duration::MAX), u64::MAX);
    }

    #[tokio::test]
    async fn driver_advances_expired_sessions() {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 10, 14, 9, 0, 0).unwrap(),
        ));
        let sink = Arc::new(RecordingSink::new());
        let service = Arc::new(PomodoroService::new(
            Arc::clone(&clock),
            Arc::clone(&sink) as Arc<dyn NotificationSink>,
            SessionConfig::default(),
        ));
        let user = UserId::new("u");
        service.start(&user, None).await.unwrap();
        clock.advance(chrono::Duration::minutes(25));

        let driver = TickDriver::new(Arc::clone(&service), Duration::from_millis(5)).spawn();
        let mut advanced = false;
        for _ in 0..200 {
            if service.status(&user).await.unwrap().phase == Phase::ShortBreak {
                advanced = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        driver.shutdown().await;

        assert!(advanced, "driver never ticked the session");
        // Clock is frozen, so the break never expires and only one advance fires.
        assert_eq!(sink.events_for(&user).len(), 2);
    }
}
