//! Statistics controller
//!
//! Sits between the presentation layer and the cache: tracks the selected
//! vehicle, decides when a recompute is needed, and owns the single job slot.
//! Reads always come straight from the cache, so whatever is valid right now
//! is served even while a job is filling in the rest.

use crate::cache::CacheStore;
use crate::error::{CoreError, Result};
use crate::event::{EventBus, StatsEvent};
use crate::job::{panic_message, JobContext, RecomputeJob};
use crate::models::{CachedValue, StatisticRow, Vehicle, VehicleId};
use crate::source::RecordSource;
use crate::statistics::{DetailView, StatisticRegistry};
use parking_lot::{Mutex, RwLock};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Configuration for the statistics controller
#[derive(Debug, Clone)]
pub struct StatsConfig {
    /// Directory holding the cache database; `None` keeps the cache in memory
    pub cache_dir: Option<PathBuf>,

    /// Capacity of the event channel
    pub event_capacity: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            event_capacity: 256,
        }
    }
}

/// Outcome of `select_entity`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Every statistic has a valid cached value, nothing to do
    CacheComplete,
    /// A new recompute job was started
    JobStarted,
    /// A job for this vehicle is already pending or running
    JobInFlight,
}

/// State handed from a detached controller to its replacement
///
/// Carries the in-flight job so that re-creating the presentation layer
/// neither cancels nor restarts it.
pub struct RetainedState {
    vehicle: Option<Arc<Vehicle>>,
    job: Option<Arc<RecomputeJob>>,
}

impl RetainedState {
    pub fn job(&self) -> Option<&Arc<RecomputeJob>> {
        self.job.as_ref()
    }

    pub fn vehicle_id(&self) -> Option<VehicleId> {
        self.vehicle.as_ref().map(|v| v.id)
    }
}

/// Orchestrates selection, recomputation and cache reads
pub struct StatsController {
    ctx: JobContext,
    vehicle: RwLock<Option<Arc<Vehicle>>>,
    /// At most one job; replacing it always cancels the previous one
    job: Mutex<Option<Arc<RecomputeJob>>>,
}

impl StatsController {
    pub fn new(
        registry: Arc<StatisticRegistry>,
        cache: Arc<CacheStore>,
        source: Arc<dyn RecordSource>,
    ) -> Self {
        Self::from_context(JobContext {
            registry,
            cache,
            source,
            events: EventBus::default_capacity(),
        })
    }

    /// Built-in catalog with a cache opened according to `config`
    pub fn open(config: &StatsConfig, source: Arc<dyn RecordSource>) -> Result<Self> {
        let cache = match &config.cache_dir {
            Some(dir) => CacheStore::open(dir)?,
            None => CacheStore::in_memory()?,
        };
        Ok(Self::from_context(JobContext {
            registry: StatisticRegistry::builtin(),
            cache: Arc::new(cache),
            source,
            events: EventBus::new(config.event_capacity),
        }))
    }

    pub fn from_context(ctx: JobContext) -> Self {
        Self {
            ctx,
            vehicle: RwLock::new(None),
            job: Mutex::new(None),
        }
    }

    /// Rebuild a controller around state retained from a detached one
    pub fn reattach(ctx: JobContext, retained: RetainedState) -> Self {
        if let Some(job) = &retained.job {
            debug!(vehicle_id = %job.vehicle_id(), status = ?job.status(), "Job reattached");
        }
        Self {
            ctx,
            vehicle: RwLock::new(retained.vehicle),
            job: Mutex::new(retained.job),
        }
    }

    /// Give up this controller without touching the in-flight job
    pub fn detach(self) -> RetainedState {
        RetainedState {
            vehicle: self.vehicle.into_inner(),
            job: self.job.into_inner(),
        }
    }

    pub fn context(&self) -> &JobContext {
        &self.ctx
    }

    pub fn registry(&self) -> &Arc<StatisticRegistry> {
        &self.ctx.registry
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.ctx.cache
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatsEvent> {
        self.ctx.events.subscribe()
    }

    pub fn current_vehicle(&self) -> Option<Arc<Vehicle>> {
        self.vehicle.read().clone()
    }

    pub fn current_job(&self) -> Option<Arc<RecomputeJob>> {
        self.job.lock().clone()
    }

    /// Switch to a vehicle, recomputing only if its cache is incomplete
    ///
    /// A job still working on another vehicle is cancelled. Must be called
    /// from within a Tokio runtime when a job may need to start.
    pub fn select_entity(&self, id: VehicleId) -> Result<Selection> {
        let vehicle = Arc::new(self.ctx.source.vehicle(id)?);
        *self.vehicle.write() = Some(Arc::clone(&vehicle));

        let mut slot = self.job.lock();
        if let Some(job) = slot.as_ref().filter(|job| job.is_active()) {
            if job.vehicle_id() == id {
                debug!(vehicle_id = %id, "Job already in flight for selected vehicle");
                return Ok(Selection::JobInFlight);
            }
            info!(
                previous = %job.vehicle_id(),
                vehicle_id = %id,
                "Selection changed, cancelling recompute"
            );
            job.cancel();
        }

        let valid = self.registered(self.ctx.cache.valid_entries_for(id)?).len();
        if valid >= self.ctx.registry.len() {
            debug!(vehicle_id = %id, valid, "Cache complete");
            return Ok(Selection::CacheComplete);
        }

        debug!(
            vehicle_id = %id,
            valid,
            expected = self.ctx.registry.len(),
            "Cache incomplete, recomputing"
        );
        self.replace_job(&mut slot, vehicle, false)?;
        Ok(Selection::JobStarted)
    }

    /// Invalidate the current vehicle and recompute unconditionally
    pub fn refresh(&self) -> Result<Arc<RecomputeJob>> {
        let vehicle = self.current_vehicle().ok_or(CoreError::NoVehicleSelected)?;
        info!(vehicle_id = %vehicle.id, "Refresh requested");

        let mut slot = self.job.lock();
        cancel_active(&slot);
        self.invalidate(vehicle.id)?;
        self.replace_job(&mut slot, vehicle, true)
    }

    /// A vehicle's records changed upstream
    ///
    /// Its cached rows become invalid; if it is the selected vehicle a new
    /// job replaces whatever is running.
    pub fn records_changed(&self, id: VehicleId) -> Result<Option<Arc<RecomputeJob>>> {
        let mut slot = self.job.lock();
        let selected = self.current_vehicle().filter(|vehicle| vehicle.id == id);
        if selected.is_some() {
            cancel_active(&slot);
        }
        self.invalidate(id)?;

        match selected {
            Some(vehicle) => self.replace_job(&mut slot, vehicle, true).map(Some),
            None => Ok(None),
        }
    }

    /// Cancel the in-flight job, if any (e.g. on shutdown)
    pub fn cancel_job(&self) {
        if let Some(job) = self.job.lock().as_ref() {
            job.cancel();
        }
    }

    /// Latest valid rows for the selected vehicle, in display order
    ///
    /// Rows whose key is no longer registered are left out.
    pub fn current_results(&self) -> Result<Vec<CachedValue>> {
        let Some(vehicle) = self.current_vehicle() else {
            return Ok(Vec::new());
        };
        let entries = self.ctx.cache.valid_entries_for(vehicle.id)?;
        Ok(self.registered(entries))
    }

    /// Labelled, formatted rows for the selected vehicle
    pub fn display_rows(&self) -> Result<Vec<StatisticRow>> {
        let Some(vehicle) = self.current_vehicle() else {
            return Ok(Vec::new());
        };

        let rows = self
            .ctx
            .cache
            .valid_entries_for(vehicle.id)?
            .into_iter()
            .filter_map(|entry| {
                let definition = self.ctx.registry.lookup(&entry.key)?;
                let rendered = panic::catch_unwind(AssertUnwindSafe(|| {
                    (
                        definition.label(&vehicle),
                        definition.format(&vehicle, entry.value),
                    )
                }));
                match rendered {
                    Ok((label, value)) => Some(StatisticRow {
                        key: entry.key,
                        label,
                        value,
                        group: entry.group,
                        has_detail: definition.has_detail(),
                    }),
                    Err(payload) => {
                        warn!(
                            key = %entry.key,
                            error = %panic_message(&*payload),
                            "Failed to format statistic"
                        );
                        None
                    }
                }
            })
            .collect();
        Ok(rows)
    }

    /// Detail view linked to a statistic, if it has one
    pub fn detail_view(&self, key: &str) -> Option<DetailView> {
        self.ctx.registry.lookup(key).and_then(|d| d.detail())
    }

    fn registered(&self, entries: Vec<CachedValue>) -> Vec<CachedValue> {
        entries
            .into_iter()
            .filter(|entry| self.ctx.registry.lookup(&entry.key).is_some())
            .collect()
    }

    fn invalidate(&self, id: VehicleId) -> Result<()> {
        self.ctx.cache.invalidate_all(id)?;
        self.ctx.events.publish(StatsEvent::CacheInvalidated(id));
        Ok(())
    }

    /// Cancel-and-replace
    ///
    /// The new job is always queued behind the previous one, which covers a
    /// previous job that was cancelled while itself still queued behind a
    /// running one. With `invalidate` the new job clears the vehicle's rows
    /// again once everything before it has stopped.
    fn replace_job(
        &self,
        slot: &mut Option<Arc<RecomputeJob>>,
        vehicle: Arc<Vehicle>,
        invalidate: bool,
    ) -> Result<Arc<RecomputeJob>> {
        let job = if invalidate {
            RecomputeJob::invalidating(vehicle, self.ctx.clone())
        } else {
            RecomputeJob::new(vehicle, self.ctx.clone())
        };
        cancel_active(slot);
        match slot.as_ref() {
            Some(previous) => job.start_after(Arc::clone(previous))?,
            None => job.start()?,
        }
        *slot = Some(Arc::clone(&job));
        Ok(job)
    }
}

fn cancel_active(slot: &Option<Arc<RecomputeJob>>) {
    if let Some(job) = slot.as_ref().filter(|job| job.is_active()) {
        job.cancel();
    }
}
