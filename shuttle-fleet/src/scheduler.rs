use chrono::{DateTime, FixedOffset, NaiveTime, Utc};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

pub type TaskFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
pub type DailyTask = Arc<dyn Fn() -> TaskFuture + Send + Sync>;

/// Wraps an async closure as a [`DailyTask`].
pub fn daily_task<F, Fut>(f: F) -> DailyTask
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move || -> TaskFuture { Box::pin(f()) })
}

const ONE_DAY: Duration = Duration::from_secs(24 * 60 * 60);

pub trait TaskScheduler: Send + Sync {
    /// Runs `task` every day at `at` in the given civil offset. The returned
    /// handle aborts the schedule.
    fn register_daily_task(&self, name: &str, at: NaiveTime, offset: FixedOffset, task: DailyTask) -> JoinHandle<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

impl TaskScheduler for TokioScheduler {
    fn register_daily_task(&self, name: &str, at: NaiveTime, offset: FixedOffset, task: DailyTask) -> JoinHandle<()> {
        let name = name.to_string();
        tokio::spawn(async move {
            loop {
                let wait = duration_until_next(Utc::now(), at, offset);
                info!(task = %name, wait_secs = wait.as_secs(), "Next scheduled run");
                tokio::time::sleep(wait).await;

                // Each run gets its own task so a panic cannot end the schedule
                if let Err(e) = tokio::spawn(task()).await {
                    error!(task = %name, "Scheduled run aborted: {}", e);
                }
            }
        })
    }
}

/// Time from `now` until the next occurrence of `at` in `offset`. A run that
/// lands exactly on `at` waits for the following day.
pub fn duration_until_next(now: DateTime<Utc>, at: NaiveTime, offset: FixedOffset) -> Duration {
    let local = now.with_timezone(&offset);
    let today = local.date_naive();

    let target_date = if local.time() < at { Some(today) } else { today.succ_opt() };

    target_date
        .and_then(|date| date.and_time(at).and_local_timezone(offset).single())
        .and_then(|target| (target - local).to_std().ok())
        .unwrap_or(ONE_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(330 * 60).unwrap()
    }

    #[test]
    fn test_wait_until_midnight_in_operating_zone() {
        // 2026-10-18 23:30 IST
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 18, 0, 0).unwrap();
        let wait = duration_until_next(now, NaiveTime::MIN, ist());
        assert_eq!(wait, Duration::from_secs(30 * 60));
    }

    #[test]
    fn test_exact_hit_waits_a_full_day() {
        // 2026-10-19 00:00 IST
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 18, 30, 0).unwrap();
        assert_eq!(duration_until_next(now, NaiveTime::MIN, ist()), ONE_DAY);
    }

    #[test]
    fn test_later_today() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 18, 30, 0).unwrap();
        let at = NaiveTime::from_hms_opt(6, 15, 0).unwrap();
        assert_eq!(duration_until_next(now, at, ist()), Duration::from_secs(6 * 3600 + 15 * 60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_run_does_not_stop_schedule() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let task = daily_task(move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    panic!("first run fails");
                }
            }
        });

        let handle = TokioScheduler.register_daily_task("test", NaiveTime::MIN, ist(), task);
        tokio::time::sleep(ONE_DAY * 3).await;
        handle.abort();

        assert!(runs.load(Ordering::SeqCst) >= 2);
    }
}
