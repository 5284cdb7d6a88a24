//! Allele frequency aggregation over stored coverage and observations.
//!
//! The engine only sees storage through [`FrequencyStore`]; bins computed by
//! [`crate::binning`] scope both of its reads. [`MemoryStore`] is a complete
//! in-memory backend for tests, the CLI and embedders without a database.

mod engine;
mod memory;
mod store;

pub use engine::{calculate_frequency, FrequencyError, FrequencyResult};
pub use memory::{MemorySnapshot, MemoryStore};
pub use store::{
    CoverageRegion, DataSourceId, FrequencyStore, Observation, Sample, SampleId, StoreError,
    ZygosityCounts,
};
