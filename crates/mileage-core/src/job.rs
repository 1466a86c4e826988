//! Background recompute job
//!
//! A job evaluates every statistic of the registry for one vehicle and
//! writes each result to the cache as soon as it is known, so readers see the
//! cache fill up while the job runs.
//!
//! Lifecycle: `Pending -> Running -> {Completed | Cancelled | Failed}`.
//! Cancellation is cooperative: `cancel()` raises a flag that the worker
//! checks before each statistic and nowhere else, so a statistic that has
//! started evaluating always finishes (and is written).

use crate::cache::CacheStore;
use crate::error::{CoreError, Result};
use crate::event::{EventBus, StatsEvent};
use crate::models::{Fillup, Vehicle, VehicleId};
use crate::source::RecordSource;
use crate::statistics::{StatisticDefinition, StatisticRegistry};
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Cancelled | JobStatus::Failed
        )
    }
}

/// Per-job counters, for progress indicators
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobProgress {
    /// Statistics whose evaluation finished
    pub evaluated: usize,
    /// Statistics written to the cache
    pub written: usize,
    /// Not computable or failed statistics
    pub skipped: usize,
    /// Statistics in the registry
    pub total: usize,
}

impl JobProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.evaluated as f64 / self.total as f64
    }
}

/// Collaborators shared by every job
#[derive(Clone)]
pub struct JobContext {
    pub registry: Arc<StatisticRegistry>,
    pub cache: Arc<CacheStore>,
    pub source: Arc<dyn RecordSource>,
    pub events: EventBus,
}

/// One recomputation of one vehicle's statistics
pub struct RecomputeJob {
    vehicle: Arc<Vehicle>,
    ctx: JobContext,
    launched: AtomicBool,
    cancel_requested: AtomicBool,
    status: watch::Sender<JobStatus>,
    progress: Mutex<JobProgress>,
    error: Mutex<Option<String>>,
    /// Job this one is queued behind; cleared once this one runs
    predecessor: Mutex<Option<Arc<RecomputeJob>>>,
    /// Invalidate the vehicle's rows again before evaluating
    invalidate_first: bool,
}

impl RecomputeJob {
    /// A `Pending` job for `vehicle`; nothing runs until `start`
    pub fn new(vehicle: Arc<Vehicle>, ctx: JobContext) -> Arc<Self> {
        Self::build(vehicle, ctx, false)
    }

    /// Like `new`, but the job marks every row of the vehicle invalid when it
    /// starts running
    ///
    /// Values a cancelled predecessor wrote after an earlier invalidation are
    /// then never served unless this job recomputes them.
    pub fn invalidating(vehicle: Arc<Vehicle>, ctx: JobContext) -> Arc<Self> {
        Self::build(vehicle, ctx, true)
    }

    fn build(vehicle: Arc<Vehicle>, ctx: JobContext, invalidate_first: bool) -> Arc<Self> {
        let total = ctx.registry.len();
        let (status, _) = watch::channel(JobStatus::Pending);
        Arc::new(Self {
            vehicle,
            ctx,
            launched: AtomicBool::new(false),
            cancel_requested: AtomicBool::new(false),
            status,
            progress: Mutex::new(JobProgress {
                total,
                ..JobProgress::default()
            }),
            error: Mutex::new(None),
            predecessor: Mutex::new(None),
            invalidate_first,
        })
    }

    pub fn vehicle_id(&self) -> VehicleId {
        self.vehicle.id
    }

    pub fn vehicle(&self) -> &Arc<Vehicle> {
        &self.vehicle
    }

    pub fn status(&self) -> JobStatus {
        *self.status.borrow()
    }

    /// Pending or running
    pub fn is_active(&self) -> bool {
        !self.status().is_terminal()
    }

    pub fn progress(&self) -> JobProgress {
        *self.progress.lock()
    }

    /// Why the job failed, once it has
    pub fn error(&self) -> Option<String> {
        self.error.lock().clone()
    }

    /// Move to `Running` and evaluate on the blocking pool
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        self.launch(None)
    }

    /// Like `start`, but stay `Pending` until `predecessor` has stopped
    ///
    /// Used for cancel-and-replace so that at most one job evaluates at a time.
    /// If `predecessor` was itself still queued, this job also waits for
    /// whatever it was queued behind.
    pub fn start_after(self: &Arc<Self>, predecessor: Arc<RecomputeJob>) -> Result<()> {
        self.launch(Some(predecessor))
    }

    fn launch(self: &Arc<Self>, predecessor: Option<Arc<RecomputeJob>>) -> Result<()> {
        let handle = Handle::try_current().map_err(|_| CoreError::RuntimeUnavailable)?;
        if self.launched.swap(true, Ordering::AcqRel) {
            return Err(CoreError::JobAlreadyStarted {
                vehicle_id: self.vehicle.id,
            });
        }

        let job = Arc::clone(self);
        match predecessor.filter(|previous| !previous.is_settled()) {
            Some(previous) => {
                debug!(
                    vehicle_id = %job.vehicle.id,
                    previous = %previous.vehicle_id(),
                    "Waiting for previous job to stop"
                );
                *job.predecessor.lock() = Some(Arc::clone(&previous));
                handle.spawn(async move {
                    previous.wait_settled().await;
                    if job.enter_running() {
                        let _ = tokio::task::spawn_blocking(move || job.run()).await;
                    }
                });
            }
            _ => {
                if job.enter_running() {
                    handle.spawn_blocking(move || job.run());
                }
            }
        }
        Ok(())
    }

    /// Request a cooperative stop; returns immediately
    pub fn cancel(&self) {
        self.cancel_requested.store(true, Ordering::Release);
        if self.transition(JobStatus::Pending, JobStatus::Cancelled) {
            debug!(vehicle_id = %self.vehicle.id, "Pending job cancelled");
            self.publish_finished(JobStatus::Cancelled);
        }
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::Acquire)
    }

    /// Resolve once the job is `Completed`, `Cancelled` or `Failed`
    pub async fn wait(&self) -> JobStatus {
        let mut rx = self.status.subscribe();
        let reached = rx
            .wait_for(|status| status.is_terminal())
            .await
            .map(|status| *status);
        // Sender lives in self, so the channel can't close while we're borrowed
        reached.unwrap_or_else(|_| self.status())
    }

    /// Neither this job nor any job it is queued behind can still evaluate
    pub fn is_settled(&self) -> bool {
        if self.is_active() {
            return false;
        }
        let mut next = self.predecessor.lock().clone();
        while let Some(job) = next {
            if job.is_active() {
                return false;
            }
            next = job.predecessor.lock().clone();
        }
        true
    }

    /// Resolve once `is_settled` holds
    pub async fn wait_settled(&self) {
        self.wait().await;
        let mut next = self.predecessor.lock().clone();
        while let Some(job) = next {
            job.wait().await;
            next = job.predecessor.lock().clone();
        }
    }

    fn transition(&self, from: JobStatus, to: JobStatus) -> bool {
        self.status.send_if_modified(|current| {
            if *current == from {
                *current = to;
                true
            } else {
                false
            }
        })
    }

    fn enter_running(&self) -> bool {
        let entered = self.transition(JobStatus::Pending, JobStatus::Running);
        if entered {
            self.predecessor.lock().take();
            self.ctx.events.publish(StatsEvent::JobStarted(self.vehicle.id));
        }
        entered
    }

    fn run(&self) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.evaluate_all()));
        let status = match outcome {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => self.record_failure(format!("{:#}", anyhow::Error::from(e))),
            Err(payload) => {
                self.record_failure(format!("internal fault: {}", panic_message(&*payload)))
            }
        };
        self.finish(status);
    }

    /// Worker body; `Err` only for job-level failures
    fn evaluate_all(&self) -> Result<JobStatus> {
        let vehicle_id = self.vehicle.id;
        info!(
            vehicle_id = %vehicle_id,
            statistics = self.ctx.registry.len(),
            "Recomputing statistics"
        );

        if self.invalidate_first {
            let cleared = self.ctx.cache.invalidate_all(vehicle_id)?;
            if cleared > 0 {
                debug!(
                    vehicle_id = %vehicle_id,
                    rows = cleared,
                    "Rows written after invalidation cleared"
                );
                self.ctx.events.publish(StatsEvent::CacheInvalidated(vehicle_id));
            }
        }

        let fillups = self.ctx.source.fillups(vehicle_id).map_err(|e| match e {
            e @ CoreError::SourceUnavailable { .. } => e,
            other => CoreError::SourceUnavailable {
                vehicle_id,
                reason: other.to_string(),
            },
        })?;

        for definition in self.ctx.registry.all() {
            if self.is_cancel_requested() {
                return Ok(JobStatus::Cancelled);
            }

            match evaluate(definition, &self.vehicle, &fillups) {
                Ok(Some(value)) => {
                    self.ctx.cache.upsert(
                        vehicle_id,
                        definition.key(),
                        value,
                        definition.group(),
                        definition.order(),
                    )?;
                    self.ctx.events.publish(StatsEvent::StatisticUpdated {
                        vehicle_id,
                        key: definition.key().to_string(),
                    });
                    let mut progress = self.progress.lock();
                    progress.evaluated += 1;
                    progress.written += 1;
                }
                Ok(None) => {
                    debug!(vehicle_id = %vehicle_id, key = definition.key(), "Not computable");
                    self.mark_skipped();
                }
                Err(e) => {
                    warn!(vehicle_id = %vehicle_id, error = %e, "Skipping statistic");
                    self.mark_skipped();
                }
            }
        }

        Ok(JobStatus::Completed)
    }

    fn mark_skipped(&self) {
        let mut progress = self.progress.lock();
        progress.evaluated += 1;
        progress.skipped += 1;
    }

    fn record_failure(&self, message: String) -> JobStatus {
        warn!(vehicle_id = %self.vehicle.id, error = %message, "Recompute job failed");
        *self.error.lock() = Some(message);
        JobStatus::Failed
    }

    fn finish(&self, status: JobStatus) {
        if !self.transition(JobStatus::Running, status) {
            return;
        }
        let progress = self.progress();
        info!(
            vehicle_id = %self.vehicle.id,
            ?status,
            written = progress.written,
            skipped = progress.skipped,
            "Recompute job finished"
        );
        self.publish_finished(status);
    }

    fn publish_finished(&self, status: JobStatus) {
        self.ctx.events.publish(StatsEvent::JobFinished {
            vehicle_id: self.vehicle.id,
            status,
        });
    }
}

/// Evaluate one statistic, folding errors and panics into `StatisticEvaluation`
fn evaluate(
    definition: &StatisticDefinition,
    vehicle: &Vehicle,
    fillups: &[Fillup],
) -> Result<Option<f64>> {
    let evaluation_error = |message: String| CoreError::StatisticEvaluation {
        key: definition.key().to_string(),
        message,
    };

    match panic::catch_unwind(AssertUnwindSafe(|| definition.compute(vehicle, fillups))) {
        Ok(Ok(Some(value))) if value.is_finite() => Ok(Some(value)),
        Ok(Ok(Some(value))) => Err(evaluation_error(format!("non-finite result {}", value))),
        Ok(Ok(None)) => Ok(None),
        Ok(Err(e)) => Err(evaluation_error(format!("{:#}", e))),
        Err(payload) => Err(evaluation_error(format!(
            "panicked: {}",
            panic_message(&*payload)
        ))),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StatGroup;
    use crate::source::MemoryRecordSource;
    use chrono::NaiveDate;
    use std::sync::mpsc;
    use std::time::Duration;

    const CAR: VehicleId = VehicleId::new(1);

    fn records() -> Arc<MemoryRecordSource> {
        let source = MemoryRecordSource::new();
        source.insert_vehicle(Vehicle::new(CAR, "Car"));
        source.add_fillup(
            CAR,
            Fillup::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 100.0, 10.0, 3.0),
        );
        Arc::new(source)
    }

    fn context(
        definitions: Vec<StatisticDefinition>,
        source: Arc<MemoryRecordSource>,
    ) -> JobContext {
        JobContext {
            registry: Arc::new(StatisticRegistry::new(definitions).unwrap()),
            cache: Arc::new(CacheStore::in_memory().unwrap()),
            source,
            events: EventBus::default_capacity(),
        }
    }

    fn constant(key: &str, group: StatGroup, order: u32, value: f64) -> StatisticDefinition {
        StatisticDefinition::new(key, group, order, move |_, _| Ok(Some(value)))
    }

    fn job_for(ctx: &JobContext) -> Arc<RecomputeJob> {
        RecomputeJob::new(Arc::new(Vehicle::new(CAR, "Car")), ctx.clone())
    }

    fn cached_keys(ctx: &JobContext) -> Vec<String> {
        ctx.cache
            .valid_entries_for(CAR)
            .unwrap()
            .into_iter()
            .map(|e| e.key)
            .collect()
    }

    #[tokio::test]
    async fn test_job_completes_and_writes_in_order() {
        let ctx = context(
            vec![
                constant("cost", StatGroup::Cost, 0, 9.0),
                constant("fuel_1", StatGroup::Fuel, 1, 2.0),
                constant("fuel_0", StatGroup::Fuel, 0, 1.0),
            ],
            records(),
        );
        let job = job_for(&ctx);
        assert_eq!(job.status(), JobStatus::Pending);

        job.start().unwrap();
        assert_eq!(job.wait().await, JobStatus::Completed);

        assert_eq!(cached_keys(&ctx), vec!["fuel_0", "fuel_1", "cost"]);
        assert_eq!(
            job.progress(),
            JobProgress {
                evaluated: 3,
                written: 3,
                skipped: 0,
                total: 3
            }
        );
        assert!(job.error().is_none());
    }

    #[tokio::test]
    async fn test_bad_statistics_are_skipped() {
        let ctx = context(
            vec![
                constant("ok", StatGroup::Fuel, 0, 1.0),
                StatisticDefinition::new("not_computable", StatGroup::Fuel, 1, |_, _| Ok(None)),
                StatisticDefinition::new("errors", StatGroup::Fuel, 2, |_, _| {
                    anyhow::bail!("division by zero")
                }),
                StatisticDefinition::new("panics", StatGroup::Fuel, 3, |_, _| {
                    panic!("boom")
                }),
                StatisticDefinition::new("nan", StatGroup::Fuel, 4, |_, _| Ok(Some(f64::NAN))),
                constant("also_ok", StatGroup::Cost, 0, 2.0),
            ],
            records(),
        );
        let job = job_for(&ctx);
        job.start().unwrap();

        assert_eq!(job.wait().await, JobStatus::Completed);
        assert_eq!(cached_keys(&ctx), vec!["ok", "also_ok"]);

        let progress = job.progress();
        assert_eq!(progress.written, 2);
        assert_eq!(progress.skipped, 4);
        assert_eq!(progress.fraction(), 1.0);
    }

    #[tokio::test]
    async fn test_missing_records_fail_the_job() {
        let ctx = context(
            vec![constant("ok", StatGroup::Fuel, 0, 1.0)],
            Arc::new(MemoryRecordSource::new()),
        );
        ctx.cache.upsert(CAR, "ok", 5.0, StatGroup::Fuel, 0).unwrap();

        let job = job_for(&ctx);
        job.start().unwrap();

        assert_eq!(job.wait().await, JobStatus::Failed);
        assert!(job.error().unwrap().contains("Records unavailable"));
        // Previously valid rows survive a failed job
        let entries = ctx.cache.valid_entries_for(CAR).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].value, 5.0);
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let ctx = context(vec![constant("ok", StatGroup::Fuel, 0, 1.0)], records());
        let job = job_for(&ctx);
        job.start().unwrap();
        assert!(matches!(
            job.start(),
            Err(CoreError::JobAlreadyStarted { .. })
        ));
        job.wait().await;
    }

    #[test]
    fn test_start_outside_runtime_is_an_error() {
        let ctx = context(vec![constant("ok", StatGroup::Fuel, 0, 1.0)], records());
        let job = job_for(&ctx);
        assert!(matches!(job.start(), Err(CoreError::RuntimeUnavailable)));
        assert_eq!(job.status(), JobStatus::Pending);
    }

    #[tokio::test]
    async fn test_cancel_pending_job() {
        let ctx = context(vec![constant("ok", StatGroup::Fuel, 0, 1.0)], records());
        let mut events = ctx.events.subscribe();
        let job = job_for(&ctx);

        job.cancel();
        assert_eq!(job.status(), JobStatus::Cancelled);
        assert_eq!(
            events.recv().await.unwrap(),
            StatsEvent::JobFinished {
                vehicle_id: CAR,
                status: JobStatus::Cancelled
            }
        );

        // Starting a cancelled job runs nothing
        job.start().unwrap();
        assert_eq!(job.wait().await, JobStatus::Cancelled);
        assert!(cached_keys(&ctx).is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_stops_before_next_statistic() {
        let (started_tx, started_rx) = mpsc::channel::<()>();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let started_tx = Mutex::new(started_tx);
        let release_rx = Mutex::new(release_rx);

        let ctx = context(
            vec![
                constant("first", StatGroup::Fuel, 0, 1.0),
                StatisticDefinition::new("slow", StatGroup::Fuel, 1, move |_, _| {
                    let _ = started_tx.lock().send(());
                    let _ = release_rx.lock().recv_timeout(Duration::from_secs(5));
                    Ok(Some(2.0))
                }),
                constant("never", StatGroup::Cost, 0, 3.0),
            ],
            records(),
        );
        let job = job_for(&ctx);
        job.start().unwrap();

        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        job.cancel();
        assert_eq!(job.status(), JobStatus::Running);
        release_tx.send(()).unwrap();

        assert_eq!(job.wait().await, JobStatus::Cancelled);
        // The in-flight statistic finished, nothing after it ran
        assert_eq!(cached_keys(&ctx), vec!["first", "slow"]);
        assert_eq!(job.progress().written, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_start_after_waits_for_predecessor() {
        let (started_tx, started_rx) = mpsc::channel::<()>();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let started_tx = Mutex::new(started_tx);
        let release_rx = Mutex::new(release_rx);

        let ctx = context(
            vec![
                StatisticDefinition::new("slow", StatGroup::Fuel, 0, move |_, _| {
                    let _ = started_tx.lock().send(());
                    let _ = release_rx.lock().recv_timeout(Duration::from_secs(5));
                    Ok(Some(1.0))
                }),
                constant("next", StatGroup::Fuel, 1, 2.0),
            ],
            records(),
        );

        let first = job_for(&ctx);
        first.start().unwrap();
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        first.cancel();
        let second = job_for(&ctx);
        second.start_after(Arc::clone(&first)).unwrap();
        assert_eq!(second.status(), JobStatus::Pending);

        release_tx.send(()).unwrap();
        assert_eq!(first.wait().await, JobStatus::Cancelled);

        // Second job's "slow" statistic gets a fresh release
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        release_tx.send(()).unwrap();
        assert_eq!(second.wait().await, JobStatus::Completed);
        assert_eq!(cached_keys(&ctx), vec!["slow", "next"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_start_after_cancelled_queued_job_waits_for_running_one() {
        let (started_tx, started_rx) = mpsc::channel::<()>();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let started_tx = Mutex::new(started_tx);
        let release_rx = Mutex::new(release_rx);

        let ctx = context(
            vec![
                StatisticDefinition::new("slow", StatGroup::Fuel, 0, move |_, _| {
                    let _ = started_tx.lock().send(());
                    let _ = release_rx.lock().recv_timeout(Duration::from_secs(5));
                    Ok(Some(1.0))
                }),
                constant("next", StatGroup::Fuel, 1, 2.0),
            ],
            records(),
        );

        let running = job_for(&ctx);
        running.start().unwrap();
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        running.cancel();

        // Queued behind the running job, then cancelled before it ever ran
        let queued = job_for(&ctx);
        queued.start_after(Arc::clone(&running)).unwrap();
        queued.cancel();
        assert_eq!(queued.status(), JobStatus::Cancelled);
        assert!(!queued.is_settled());

        let replacement = job_for(&ctx);
        replacement.start_after(Arc::clone(&queued)).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(replacement.status(), JobStatus::Pending);

        release_tx.send(()).unwrap();
        assert_eq!(running.wait().await, JobStatus::Cancelled);

        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        release_tx.send(()).unwrap();
        assert_eq!(replacement.wait().await, JobStatus::Completed);
        assert!(queued.is_settled());
        assert_eq!(queued.progress().evaluated, 0);
    }

    #[tokio::test]
    async fn test_invalidating_job_clears_rows_before_evaluating() {
        let ctx = context(
            vec![
                constant("kept", StatGroup::Fuel, 0, 1.0),
                StatisticDefinition::new("gone", StatGroup::Fuel, 1, |_, _| Ok(None)),
            ],
            records(),
        );
        ctx.cache.upsert(CAR, "gone", 5.0, StatGroup::Fuel, 1).unwrap();

        let job = RecomputeJob::invalidating(Arc::new(Vehicle::new(CAR, "Car")), ctx.clone());
        job.start().unwrap();
        assert_eq!(job.wait().await, JobStatus::Completed);

        assert_eq!(cached_keys(&ctx), vec!["kept"]);
        let gone = ctx
            .cache
            .all_entries_for(CAR)
            .unwrap()
            .into_iter()
            .find(|e| e.key == "gone")
            .unwrap();
        assert!(!gone.valid);
        assert_eq!(gone.value, 5.0);
    }

    #[tokio::test]
    async fn test_events_follow_job() {
        let ctx = context(vec![constant("only", StatGroup::Fuel, 0, 1.0)], records());
        let mut events = ctx.events.subscribe();
        let job = job_for(&ctx);
        job.start().unwrap();
        job.wait().await;

        assert_eq!(events.recv().await.unwrap(), StatsEvent::JobStarted(CAR));
        assert_eq!(
            events.recv().await.unwrap(),
            StatsEvent::StatisticUpdated {
                vehicle_id: CAR,
                key: "only".to_string()
            }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            StatsEvent::JobFinished {
                vehicle_id: CAR,
                status: JobStatus::Completed
            }
        );
    }

    #[test]
    fn test_panic_message() {
        let payload = panic::catch_unwind(|| panic!("static message")).unwrap_err();
        assert_eq!(panic_message(&*payload), "static message");

        let payload = panic::catch_unwind(|| panic!("formatted {}", 42)).unwrap_err();
        assert_eq!(panic_message(&*payload), "formatted 42");
    }
}
