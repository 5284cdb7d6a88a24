use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::store::{
    CoverageRegion, DataSourceId, FrequencyStore, Observation, SampleId, StoreError,
    ZygosityCounts,
};
use crate::ingest::ImportTarget;
use crate::variant::{GenomicInterval, Variant};

/// Rows of one kind, bucketed by chromosome and bin.
#[derive(Debug)]
struct Buckets<T> {
    rows: HashMap<Arc<str>, BTreeMap<u32, Vec<T>>>,
}

impl<T> Default for Buckets<T> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }
}

impl<T> Buckets<T> {
    fn insert(&mut self, chromosome: &Arc<str>, bin: u32, row: T) {
        self.rows
            .entry(Arc::clone(chromosome))
            .or_default()
            .entry(bin)
            .or_default()
            .push(row);
    }

    /// Rows on `chromosome` stored in any of `bins`.
    fn scan<'a>(&'a self, chromosome: &str, bins: &'a [u32]) -> impl Iterator<Item = &'a T> + 'a {
        let by_bin = self.rows.get(chromosome);
        bins.iter()
            .filter_map(move |bin| by_bin.and_then(|by_bin| by_bin.get(bin)))
            .flatten()
    }

    fn any(&self, mut predicate: impl FnMut(&T) -> bool) -> bool {
        self.rows
            .values()
            .flat_map(BTreeMap::values)
            .flatten()
            .any(|row| predicate(row))
    }

    fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) -> usize {
        let mut removed = 0;
        for by_bin in self.rows.values_mut() {
            for rows in by_bin.values_mut() {
                let before = rows.len();
                rows.retain(|row| keep(row));
                removed += before - rows.len();
            }
            by_bin.retain(|_, rows| !rows.is_empty());
        }
        self.rows.retain(|_, by_bin| !by_bin.is_empty());
        removed
    }

    fn len(&self) -> usize {
        self.rows.values().flat_map(BTreeMap::values).map(Vec::len).sum()
    }
}

#[derive(Debug, Default)]
struct Tables {
    regions: Buckets<CoverageRegion>,
    observations: Buckets<Observation>,
    imports: HashSet<(SampleId, DataSourceId)>,
}

/// In-memory store of coverage regions and observations.
///
/// Writers take the lock once per row, so imports interleave with readers.
/// Frequency queries go through [`snapshot`](Self::snapshot), which holds
/// the read lock until dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consistent read view. Writers block while it is alive.
    pub fn snapshot(&self) -> Result<MemorySnapshot<'_>, StoreError> {
        Ok(MemorySnapshot {
            tables: self.read()?,
        })
    }

    /// Whether observations from `source` exist for `sample`.
    pub fn has_observations(&self, sample: SampleId, source: DataSourceId) -> Result<bool, StoreError> {
        Ok(self
            .read()?
            .observations
            .any(|row| row.sample == sample && row.data_source == source))
    }

    /// Whether coverage regions from `source` exist for `sample`.
    pub fn has_regions(&self, sample: SampleId, source: DataSourceId) -> Result<bool, StoreError> {
        Ok(self
            .read()?
            .regions
            .any(|row| row.sample == sample && row.data_source == source))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables.write().map_err(|_| StoreError::Poisoned)
    }
}

/// Read guard over a [`MemoryStore`].
#[derive(Debug)]
pub struct MemorySnapshot<'a> {
    tables: RwLockReadGuard<'a, Tables>,
}

impl MemorySnapshot<'_> {
    /// Number of stored coverage regions.
    pub fn region_count(&self) -> usize {
        self.tables.regions.len()
    }

    /// Number of stored observations.
    pub fn observation_count(&self) -> usize {
        self.tables.observations.len()
    }
}

impl FrequencyStore for MemorySnapshot<'_> {
    fn count_coverage(
        &self,
        interval: &GenomicInterval,
        bins: &[u32],
        samples: &[SampleId],
    ) -> Result<u64, StoreError> {
        let count = self
            .tables
            .regions
            .scan(interval.chromosome(), bins)
            .filter(|region| samples.contains(&region.sample) && region.interval.contains(interval))
            .count();
        Ok(count as u64)
    }

    fn sum_support_by_zygosity(
        &self,
        variant: &Variant,
        bins: &[u32],
        samples: &[SampleId],
    ) -> Result<ZygosityCounts, StoreError> {
        let mut counts = ZygosityCounts::default();
        for observation in self
            .tables
            .observations
            .scan(&variant.chromosome, bins)
            .filter(|observation| samples.contains(&observation.sample))
            .filter(|observation| observation.variant == *variant)
        {
            counts.add(observation.zygosity, u64::from(observation.support));
        }
        Ok(counts)
    }
}

impl ImportTarget for MemoryStore {
    fn is_imported(&self, sample: SampleId, source: DataSourceId) -> Result<bool, StoreError> {
        Ok(self.read()?.imports.contains(&(sample, source)))
    }

    fn mark_imported(&self, sample: SampleId, source: DataSourceId) -> Result<bool, StoreError> {
        Ok(self.write()?.imports.insert((sample, source)))
    }

    fn unmark_imported(&self, sample: SampleId, source: DataSourceId) -> Result<(), StoreError> {
        self.write()?.imports.remove(&(sample, source));
        Ok(())
    }

    fn insert_observation(&self, observation: Observation) -> Result<(), StoreError> {
        let chromosome = Arc::clone(&observation.variant.chromosome);
        let bin = observation.bin;
        self.write()?.observations.insert(&chromosome, bin, observation);
        Ok(())
    }

    fn insert_region(&self, region: CoverageRegion) -> Result<(), StoreError> {
        let chromosome = Arc::clone(region.interval.chromosome());
        let bin = region.bin;
        self.write()?.regions.insert(&chromosome, bin, region);
        Ok(())
    }

    fn delete_observations(&self, sample: SampleId, source: DataSourceId) -> Result<usize, StoreError> {
        Ok(self
            .write()?
            .observations
            .retain(|row| !(row.sample == sample && row.data_source == source)))
    }

    fn delete_regions(&self, sample: SampleId, source: DataSourceId) -> Result<usize, StoreError> {
        Ok(self
            .write()?
            .regions
            .retain(|row| !(row.sample == sample && row.data_source == source)))
    }
}
