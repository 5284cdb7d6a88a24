use std::fmt;

use thiserror::Error;

use crate::binning::BinningError;
use crate::variant::{GenomicInterval, Variant, Zygosity};

/// Sample identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SampleId(pub u32);

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sample {}", self.0)
    }
}

/// Data source (uploaded file) identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataSourceId(pub u32);

impl fmt::Display for DataSourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data source {}", self.0)
    }
}

/// A sequenced individual or pool of individuals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    /// Identifier.
    pub id: SampleId,
    /// Number of individuals represented, at least 1.
    pub pool_size: u32,
    /// Whether sequenced regions are tracked as coverage regions. Samples
    /// without a profile count as covered everywhere by `pool_size`.
    pub coverage_profile: bool,
}

impl Sample {
    /// Construct a sample. A pool size of 0 is raised to 1.
    pub fn new(id: SampleId, pool_size: u32, coverage_profile: bool) -> Self {
        Self {
            id,
            pool_size: pool_size.max(1),
            coverage_profile,
        }
    }

    /// Single individual with tracked coverage.
    pub fn individual(id: SampleId) -> Self {
        Self::new(id, 1, true)
    }

    /// Pool without tracked coverage.
    pub fn pooled(id: SampleId, pool_size: u32) -> Self {
        Self::new(id, pool_size, false)
    }
}

/// Region sequenced in a sample, as read from one data source.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoverageRegion {
    /// Owning sample.
    pub sample: SampleId,
    /// Source the region was imported from.
    pub data_source: DataSourceId,
    /// Covered positions.
    pub interval: GenomicInterval,
    /// Bin of `interval`.
    pub bin: u32,
}

impl CoverageRegion {
    /// Construct a region, assigning its bin.
    pub fn new(
        sample: SampleId,
        data_source: DataSourceId,
        interval: GenomicInterval,
    ) -> Result<Self, BinningError> {
        let bin = interval.bin()?;
        Ok(Self {
            sample,
            data_source,
            interval,
            bin,
        })
    }
}

/// Variant observed in a sample, as read from one data source.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Observation {
    /// Owning sample.
    pub sample: SampleId,
    /// Source the observation was imported from.
    pub data_source: DataSourceId,
    /// Canonical variant.
    pub variant: Variant,
    /// Bin of the variant.
    pub bin: u32,
    /// Zygosity of the carriers counted in `support`.
    pub zygosity: Zygosity,
    /// Number of individuals carrying the variant.
    pub support: u32,
}

impl Observation {
    /// Construct an observation, assigning its bin.
    pub fn new(
        sample: SampleId,
        data_source: DataSourceId,
        variant: Variant,
        zygosity: Zygosity,
        support: u32,
    ) -> Result<Self, BinningError> {
        let bin = variant.bin()?;
        Ok(Self {
            sample,
            data_source,
            variant,
            bin,
            zygosity,
            support,
        })
    }
}

/// Summed support per zygosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZygosityCounts([u64; 3]);

impl ZygosityCounts {
    /// Support counted for `zygosity`.
    pub fn get(&self, zygosity: Zygosity) -> u64 {
        self.0[zygosity.index()]
    }

    /// Add `support` to `zygosity`.
    pub fn add(&mut self, zygosity: Zygosity, support: u64) {
        self.0[zygosity.index()] += support;
    }

    /// Support over all categories.
    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    /// `(zygosity, support)` for every category.
    pub fn iter(&self) -> impl Iterator<Item = (Zygosity, u64)> + '_ {
        Zygosity::ALL.into_iter().map(|zygosity| (zygosity, self.get(zygosity)))
    }
}

/// Failures reported by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Backing data cannot be read at the moment.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// Backing data exists but is not usable.
    #[error("invalid data source: {0}")]
    InvalidSource(String),

    /// A writer panicked while holding the store lock.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Reads the frequency engine needs from storage.
///
/// Both calls of one frequency calculation must observe the same state, so
/// implementations are expected to be snapshots or read transactions.
pub trait FrequencyStore {
    /// Number of coverage regions on `interval`'s chromosome, stored in one of
    /// `bins`, owned by one of `samples`, that fully contain `interval`.
    fn count_coverage(
        &self,
        interval: &GenomicInterval,
        bins: &[u32],
        samples: &[SampleId],
    ) -> Result<u64, StoreError>;

    /// Support of observations exactly matching `variant`, stored in one of
    /// `bins` and owned by one of `samples`, summed per zygosity.
    fn sum_support_by_zygosity(
        &self,
        variant: &Variant,
        bins: &[u32],
        samples: &[SampleId],
    ) -> Result<ZygosityCounts, StoreError>;
}

impl<T: FrequencyStore + ?Sized> FrequencyStore for &T {
    fn count_coverage(
        &self,
        interval: &GenomicInterval,
        bins: &[u32],
        samples: &[SampleId],
    ) -> Result<u64, StoreError> {
        (**self).count_coverage(interval, bins, samples)
    }

    fn sum_support_by_zygosity(
        &self,
        variant: &Variant,
        bins: &[u32],
        samples: &[SampleId],
    ) -> Result<ZygosityCounts, StoreError> {
        (**self).sum_support_by_zygosity(variant, bins, samples)
    }
}
