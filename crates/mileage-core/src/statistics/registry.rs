//! Statistic definitions and the ordered registry
//!
//! A definition carries its behaviour as data: shared function values for
//! compute, label and format. The registry is built once, sorted by
//! (group, order), and only read afterwards, so it is shared freely across
//! threads without locking.

use crate::error::{CoreError, Result};
use crate::models::{Fillup, StatGroup, Vehicle};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// `Ok(None)` means "not computable" for this vehicle's records
pub type ComputeFn = dyn Fn(&Vehicle, &[Fillup]) -> anyhow::Result<Option<f64>> + Send + Sync;
pub type LabelFn = dyn Fn(&Vehicle) -> String + Send + Sync;
pub type FormatFn = dyn Fn(&Vehicle, f64) -> String + Send + Sync;

/// Richer view a statistic can link to (charts live outside the core)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailView {
    EconomyChart,
    DistanceChart,
    VolumeChart,
    CostChart,
    PriceChart,
}

/// One derivable metric
#[derive(Clone)]
pub struct StatisticDefinition {
    key: String,
    group: StatGroup,
    order: u32,
    compute: Arc<ComputeFn>,
    label: Arc<LabelFn>,
    format: Arc<FormatFn>,
    detail: Option<DetailView>,
}

impl StatisticDefinition {
    /// Definition labelled with its key and formatted with two decimals
    pub fn new<F>(key: impl Into<String>, group: StatGroup, order: u32, compute: F) -> Self
    where
        F: Fn(&Vehicle, &[Fillup]) -> anyhow::Result<Option<f64>> + Send + Sync + 'static,
    {
        let key = key.into();
        let label_text = key.clone();
        Self {
            key,
            group,
            order,
            compute: Arc::new(compute),
            label: Arc::new(move |_: &Vehicle| label_text.clone()),
            format: Arc::new(|_: &Vehicle, value: f64| format!("{:.2}", value)),
            detail: None,
        }
    }

    pub fn with_label<F>(mut self, label: F) -> Self
    where
        F: Fn(&Vehicle) -> String + Send + Sync + 'static,
    {
        self.label = Arc::new(label);
        self
    }

    pub fn with_format<F>(mut self, format: F) -> Self
    where
        F: Fn(&Vehicle, f64) -> String + Send + Sync + 'static,
    {
        self.format = Arc::new(format);
        self
    }

    pub fn with_detail(mut self, detail: DetailView) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn group(&self) -> StatGroup {
        self.group
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn detail(&self) -> Option<DetailView> {
        self.detail
    }

    pub fn has_detail(&self) -> bool {
        self.detail.is_some()
    }

    pub fn compute(&self, vehicle: &Vehicle, fillups: &[Fillup]) -> anyhow::Result<Option<f64>> {
        (self.compute)(vehicle, fillups)
    }

    pub fn label(&self, vehicle: &Vehicle) -> String {
        (self.label)(vehicle)
    }

    pub fn format(&self, vehicle: &Vehicle, value: f64) -> String {
        (self.format)(vehicle, value)
    }
}

impl fmt::Debug for StatisticDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatisticDefinition")
            .field("key", &self.key)
            .field("group", &self.group)
            .field("order", &self.order)
            .field("detail", &self.detail)
            .finish_non_exhaustive()
    }
}

static BUILTIN: Lazy<Arc<StatisticRegistry>> = Lazy::new(|| {
    Arc::new(
        StatisticRegistry::new(super::catalog::definitions())
            .expect("built-in statistic keys are unique"),
    )
});

/// Read-only, ordered catalog of statistic definitions
#[derive(Debug)]
pub struct StatisticRegistry {
    definitions: Vec<StatisticDefinition>,
    index: HashMap<String, usize>,
}

impl StatisticRegistry {
    /// Build a registry, ordering definitions by (group, order)
    ///
    /// Ties keep their insertion order. Duplicate keys are rejected.
    pub fn new(mut definitions: Vec<StatisticDefinition>) -> Result<Self> {
        definitions.sort_by_key(|d| (d.group, d.order));

        let mut index = HashMap::with_capacity(definitions.len());
        for (position, definition) in definitions.iter().enumerate() {
            if index.insert(definition.key.clone(), position).is_some() {
                return Err(CoreError::DuplicateStatistic {
                    key: definition.key.clone(),
                });
            }
        }

        Ok(Self { definitions, index })
    }

    /// The process-wide catalog of vehicle statistics
    pub fn builtin() -> Arc<StatisticRegistry> {
        Arc::clone(&BUILTIN)
    }

    /// Definitions in display and computation order
    pub fn all(&self) -> &[StatisticDefinition] {
        &self.definitions
    }

    pub fn lookup(&self, key: &str) -> Option<&StatisticDefinition> {
        self.index.get(key).map(|&i| &self.definitions[i])
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
