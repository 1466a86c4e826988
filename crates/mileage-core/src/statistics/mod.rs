//! Statistic definitions, the built-in catalog and the registry

pub mod catalog;
pub mod registry;

pub use registry::{DetailView, StatisticDefinition, StatisticRegistry};
