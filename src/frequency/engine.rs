use std::collections::BTreeMap;

use thiserror::Error;
use tracing::instrument;

use super::store::{FrequencyStore, Sample, SampleId, StoreError};
use crate::binning::BinningError;
use crate::variant::{IntervalError, Variant, Zygosity};

/// Coverage and per-zygosity allele frequency of a variant.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrequencyResult {
    /// Number of individuals covering the variant's region.
    pub coverage: u64,
    /// Carriers over coverage, for every zygosity.
    pub frequency: BTreeMap<Zygosity, f64>,
}

impl FrequencyResult {
    /// Result for a region nobody covers.
    pub fn uncovered() -> Self {
        Self {
            coverage: 0,
            frequency: Zygosity::ALL.into_iter().map(|z| (z, 0.0)).collect(),
        }
    }

    /// Frequency of `zygosity`.
    pub fn ratio(&self, zygosity: Zygosity) -> f64 {
        self.frequency.get(&zygosity).copied().unwrap_or(0.0)
    }

    /// Frequency over all zygosities.
    pub fn total(&self) -> f64 {
        self.frequency.values().sum()
    }
}

/// Errors raised while calculating a frequency.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrequencyError {
    /// Storage read failed.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Variant lies outside the binnable range.
    #[error("binning error: {0}")]
    Binning(#[from] BinningError),

    /// Variant does not describe a valid region.
    #[error("interval error: {0}")]
    Interval(#[from] IntervalError),
}

/// Frequency of `variant` among `samples`.
///
/// Coverage sums the coverage regions of profiled samples that fully contain
/// the variant's region, plus the pool size of every sample without a
/// coverage profile. Zero coverage returns [`FrequencyResult::uncovered`]
/// without reading observations.
///
/// `store` must present one consistent state for both reads.
#[instrument(level = "debug", skip_all, fields(variant = %variant))]
pub fn calculate_frequency<S: FrequencyStore + ?Sized>(
    store: &S,
    variant: &Variant,
    samples: &[Sample],
) -> Result<FrequencyResult, FrequencyError> {
    // [position, end] inclusive is the half-open [position - 1, end).
    let interval = variant.interval()?;
    let bins = interval.all_bins()?;

    let profiled: Vec<SampleId> = samples
        .iter()
        .filter(|sample| sample.coverage_profile)
        .map(|sample| sample.id)
        .collect();
    let pooled: u64 = samples
        .iter()
        .filter(|sample| !sample.coverage_profile)
        .map(|sample| u64::from(sample.pool_size))
        .sum();

    let covered = if profiled.is_empty() {
        0
    } else {
        store.count_coverage(&interval, &bins, &profiled)?
    };
    let coverage = covered + pooled;
    if coverage == 0 {
        return Ok(FrequencyResult::uncovered());
    }

    let ids: Vec<SampleId> = samples.iter().map(|sample| sample.id).collect();
    let support = store.sum_support_by_zygosity(variant, &bins, &ids)?;

    let frequency = support
        .iter()
        .map(|(zygosity, count)| (zygosity, count as f64 / coverage as f64))
        .collect();

    Ok(FrequencyResult {
        coverage,
        frequency,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::ZygosityCounts;
    use crate::variant::GenomicInterval;
    use std::cell::Cell;

    struct Fixed {
        coverage: u64,
        support: ZygosityCounts,
        support_reads: Cell<usize>,
    }

    impl FrequencyStore for Fixed {
        fn count_coverage(
            &self,
            _: &GenomicInterval,
            _: &[u32],
            _: &[SampleId],
        ) -> Result<u64, StoreError> {
            Ok(self.coverage)
        }

        fn sum_support_by_zygosity(
            &self,
            _: &Variant,
            _: &[u32],
            _: &[SampleId],
        ) -> Result<ZygosityCounts, StoreError> {
            self.support_reads.set(self.support_reads.get() + 1);
            Ok(self.support)
        }
    }

    fn fixed(coverage: u64, het: u64) -> Fixed {
        let mut support = ZygosityCounts::default();
        support.add(Zygosity::Heterozygous, het);
        Fixed {
            coverage,
            support,
            support_reads: Cell::new(0),
        }
    }

    #[test]
    fn zero_coverage_skips_observations() {
        let store = fixed(0, 3);
        let samples = [Sample::individual(SampleId(1))];
        let result = calculate_frequency(&store, &Variant::new("1", 10, "A", "G"), &samples).unwrap();
        assert_eq!(result, FrequencyResult::uncovered());
        assert_eq!(store.support_reads.get(), 0);
        assert_eq!(result.frequency.len(), 3);
    }

    #[test]
    fn pooled_samples_add_pool_size() {
        let store = fixed(2, 3);
        let samples = [
            Sample::individual(SampleId(1)),
            Sample::individual(SampleId(2)),
            Sample::pooled(SampleId(3), 4),
        ];
        let result = calculate_frequency(&store, &Variant::new("1", 10, "A", "G"), &samples).unwrap();
        assert_eq!(result.coverage, 6);
        assert_eq!(result.ratio(Zygosity::Heterozygous), 0.5);
        assert_eq!(result.ratio(Zygosity::Homozygous), 0.0);
    }

    #[test]
    fn only_pooled_samples_do_not_count_regions() {
        let store = fixed(100, 1);
        let samples = [Sample::pooled(SampleId(1), 2)];
        let result = calculate_frequency(&store, &Variant::new("1", 10, "", "T"), &samples).unwrap();
        assert_eq!(result.coverage, 2);
    }

    #[test]
    fn position_zero_is_rejected() {
        let store = fixed(1, 0);
        let err = calculate_frequency(&store, &Variant::new("1", 0, "A", "G"), &[]).unwrap_err();
        assert!(matches!(err, FrequencyError::Interval(_)));
    }
}
