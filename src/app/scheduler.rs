//! Daily cadence and retry policy around a blocking ETL job.
//!
//! The job itself knows nothing about scheduling: it runs once per call and reports
//! its outcome. Missed slots are skipped unless catch-up is enabled.

use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 1,
            delay: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug)]
pub struct AttemptReport {
    pub started_at: DateTime<Utc>,
    pub attempts: u32,
    pub result: Result<()>,
}

/// Runs `job` on the blocking pool, retrying failures as the policy allows.
pub async fn run_with_retries<F>(policy: RetryPolicy, job: Arc<F>) -> AttemptReport
where
    F: Fn() -> Result<()> + Send + Sync + 'static,
{
    let started_at = Utc::now();
    let mut attempts = 0;

    loop {
        attempts += 1;
        let attempt_job = job.clone();
        let result = tokio::task::spawn_blocking(move || attempt_job())
            .await
            .unwrap_or_else(|e| {
                Err(EtlError::SchedulerError {
                    message: format!("ETL task aborted: {}", e),
                })
            });

        match result {
            Ok(()) => {
                return AttemptReport {
                    started_at,
                    attempts,
                    result: Ok(()),
                }
            }
            Err(e) if attempts <= policy.retries => {
                tracing::warn!(
                    "⚠️ Attempt {} failed: {}. Retrying in {:?}",
                    attempts,
                    e,
                    policy.delay
                );
                tokio::time::sleep(policy.delay).await;
            }
            Err(e) => {
                return AttemptReport {
                    started_at,
                    attempts,
                    result: Err(e),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    pub start: DateTime<Utc>,
    pub catchup: bool,
    pub policy: RetryPolicy,
}

impl DailySchedule {
    fn one_day() -> TimeDelta {
        TimeDelta::days(1)
    }

    /// First slot to run: `start` itself when catching up, otherwise the earliest slot
    /// not before `now`.
    pub fn first_slot(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        if self.catchup || self.start >= now {
            return self.start;
        }

        let elapsed_days = (now - self.start).num_days();
        let slot = self.start + TimeDelta::days(elapsed_days);
        if slot < now {
            slot + Self::one_day()
        } else {
            slot
        }
    }

    /// Slot after `previous`. Without catch-up, slots already in the past are skipped.
    pub fn following(&self, previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
        let next = previous + Self::one_day();
        if self.catchup || next >= now {
            next
        } else {
            self.first_slot(now)
        }
    }
}

/// Bookkeeping for one scheduled slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledRun {
    pub scheduled_for: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub attempts: u32,
    pub succeeded: bool,
}

/// Runs `job` once per daily slot until `max_runs` slots have been processed.
///
/// A failed slot is logged and the schedule moves on.
pub async fn run_daily<F>(
    schedule: DailySchedule,
    job: Arc<F>,
    max_runs: Option<usize>,
) -> Vec<ScheduledRun>
where
    F: Fn() -> Result<()> + Send + Sync + 'static,
{
    let mut history = Vec::new();
    let mut slot = schedule.first_slot(Utc::now());

    while max_runs.map_or(true, |max| history.len() < max) {
        let wait = (slot - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        if !wait.is_zero() {
            tracing::info!("⏰ Next ETL run scheduled for {}", slot);
            tokio::time::sleep(wait).await;
        }

        let report = run_with_retries(schedule.policy, job.clone()).await;
        match &report.result {
            Ok(()) => tracing::info!(
                "✅ Scheduled run for {} succeeded after {} attempt(s)",
                slot,
                report.attempts
            ),
            Err(e) => tracing::error!(
                "❌ Scheduled run for {} failed after {} attempt(s): {}",
                slot,
                report.attempts,
                e
            ),
        }

        history.push(ScheduledRun {
            scheduled_for: slot,
            started_at: report.started_at,
            attempts: report.attempts,
            succeeded: report.result.is_ok(),
        });
        slot = schedule.following(slot, Utc::now());
    }

    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, day, hour, 0, 0).unwrap()
    }

    fn schedule(catchup: bool) -> DailySchedule {
        DailySchedule {
            start: at(6, 0),
            catchup,
            policy: RetryPolicy {
                retries: 1,
                delay: Duration::ZERO,
            },
        }
    }

    #[test]
    fn test_first_slot_without_catchup() {
        let daily = schedule(false);
        assert_eq!(daily.first_slot(at(1, 12)), at(6, 0));
        assert_eq!(daily.first_slot(at(8, 9)), at(9, 0));
        assert_eq!(daily.first_slot(at(8, 0)), at(8, 0));
    }

    #[test]
    fn test_catchup_replays_missed_days() {
        let daily = schedule(true);
        assert_eq!(daily.first_slot(at(8, 9)), at(6, 0));
        assert_eq!(daily.following(at(6, 0), at(8, 9)), at(7, 0));
    }

    #[test]
    fn test_following_skips_missed_days() {
        let daily = schedule(false);
        assert_eq!(daily.following(at(6, 0), at(6, 1)), at(7, 0));
        assert_eq!(daily.following(at(6, 0), at(9, 3)), at(10, 0));
    }

    #[tokio::test]
    async fn test_retry_recovers_from_one_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let job = Arc::new(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(EtlError::ConnectionError {
                    message: "database is locked".to_string(),
                })
            } else {
                Ok(())
            }
        });

        let report = run_with_retries(schedule(false).policy, job).await;

        assert!(report.result.is_ok());
        assert_eq!(report.attempts, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let job = Arc::new(|| -> Result<()> {
            Err(EtlError::NotFoundError {
                path: "bestseller.csv".to_string(),
            })
        });

        let report = run_with_retries(schedule(false).policy, job).await;

        assert_eq!(report.attempts, 2);
        assert!(matches!(
            report.result,
            Err(EtlError::NotFoundError { .. })
        ));
    }

    #[tokio::test]
    async fn test_run_daily_catches_up_and_stops() {
        let mut daily = schedule(true);
        daily.start = Utc::now() - TimeDelta::days(3);
        let job = Arc::new(|| -> Result<()> { Ok(()) });

        let history = run_daily(daily, job, Some(2)).await;

        assert_eq!(history.len(), 2);
        assert_eq!(
            history[1].scheduled_for - history[0].scheduled_for,
            TimeDelta::days(1)
        );
        assert!(history.iter().all(|run| run.succeeded && run.attempts == 1));
    }
}
