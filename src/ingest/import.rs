use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use super::records::{is_symbolic, RegionRecord, VariantRecord};
use crate::binning::BinningError;
use crate::frequency::{
    CoverageRegion, DataSourceId, Observation, SampleId, StoreError, ZygosityCounts,
};
use crate::variant::{
    normalize_region, normalize_variant, read_genotype, GenomicInterval, GenotypeError,
    IntervalError, NormalizationContext, ReferenceMismatch, Zygosity,
};

/// Writes an import needs from storage.
///
/// Duplicate imports are detected through an explicit mark per (sample, data
/// source) pair, set before the first row is written, so an import that wrote
/// no rows still counts. Rows are written one at a time as records are read;
/// on failure the importer deletes every row of the pair and clears the mark.
pub trait ImportTarget {
    /// Whether `source` was imported into `sample`.
    fn is_imported(&self, sample: SampleId, source: DataSourceId) -> Result<bool, StoreError>;

    /// Mark `source` as imported into `sample`. Returns `false`, changing
    /// nothing, when the pair is already marked.
    fn mark_imported(&self, sample: SampleId, source: DataSourceId) -> Result<bool, StoreError>;

    /// Clear the mark of a (sample, data source) pair.
    fn unmark_imported(&self, sample: SampleId, source: DataSourceId) -> Result<(), StoreError>;

    /// Store one observation.
    fn insert_observation(&self, observation: Observation) -> Result<(), StoreError>;

    /// Store one coverage region.
    fn insert_region(&self, region: CoverageRegion) -> Result<(), StoreError>;

    /// Remove the observations of a (sample, data source) pair, returning how
    /// many were removed.
    fn delete_observations(&self, sample: SampleId, source: DataSourceId) -> Result<usize, StoreError>;

    /// Remove the coverage regions of a (sample, data source) pair, returning
    /// how many were removed.
    fn delete_regions(&self, sample: SampleId, source: DataSourceId) -> Result<usize, StoreError>;
}

/// Errors that abort an import.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportError {
    /// The data source was imported into this sample before.
    #[error("{data_source} already imported in {sample}")]
    AlreadyImported {
        /// Target sample.
        sample: SampleId,
        /// Offending data source.
        data_source: DataSourceId,
    },

    /// Record disagrees with the reference genome.
    #[error("reference mismatch: {0}")]
    ReferenceMismatch(#[from] ReferenceMismatch),

    /// Genotype of a call could not be decoded.
    #[error("genotype error: {0}")]
    Genotype(#[from] GenotypeError),

    /// Data source content is unusable.
    #[error("invalid data source: {0}")]
    InvalidSource(String),

    /// Data source content cannot be read.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// Storage failed.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Record lies outside the binnable range.
    #[error("binning error: {0}")]
    Binning(#[from] BinningError),

    /// Record does not describe a valid region.
    #[error("interval error: {0}")]
    Interval(#[from] IntervalError),
}

/// Import behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImportOptions {
    /// Derive support from per-sample genotypes instead of `AC`.
    pub use_genotypes: bool,
    /// Decode genotypes from PL/GL even when GT is present.
    pub prefer_likelihoods: bool,
    /// Abort on a reference mismatch instead of skipping the allele.
    pub reference_mismatch_abort: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            use_genotypes: true,
            prefer_likelihoods: false,
            reference_mismatch_abort: true,
        }
    }
}

/// Counts reported after a successful import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImportSummary {
    /// Records read.
    pub records: usize,
    /// Rows written.
    pub written: usize,
    /// Alleles or regions left out.
    pub skipped: usize,
}

/// Import parsed VCF records as observations of `sample`.
///
/// Records are consumed lazily and each observation is written as soon as it
/// is known. Every alternate allele is normalized on its own; symbolic and
/// empty alleles are skipped. Support is the number of carriers per zygosity
/// when `options.use_genotypes` is set, otherwise the record's `AC` value
/// with unknown zygosity.
///
/// Any error removes the observations written so far and is returned.
#[instrument(skip_all, fields(sample = %sample, source = %source))]
pub fn import_variation<T, I>(
    target: &T,
    ctx: &NormalizationContext<'_>,
    sample: SampleId,
    source: DataSourceId,
    records: I,
    options: &ImportOptions,
) -> Result<ImportSummary, ImportError>
where
    T: ImportTarget + ?Sized,
    I: IntoIterator<Item = Result<VariantRecord, ImportError>>,
{
    if !target.mark_imported(sample, source)? {
        return Err(ImportError::AlreadyImported {
            sample,
            data_source: source,
        });
    }
    info!("importing variation");

    match write_observations(target, ctx, sample, source, records, options) {
        Ok(summary) => {
            info!(
                records = summary.records,
                written = summary.written,
                skipped = summary.skipped,
                "imported variation"
            );
            Ok(summary)
        }
        Err(err) => {
            error!(error = %err, "variation import failed");
            let deleted = target.delete_observations(sample, source);
            roll_back(target, sample, source, deleted, "observations");
            Err(err)
        }
    }
}

fn write_observations<T, I>(
    target: &T,
    ctx: &NormalizationContext<'_>,
    sample: SampleId,
    source: DataSourceId,
    records: I,
    options: &ImportOptions,
) -> Result<ImportSummary, ImportError>
where
    T: ImportTarget + ?Sized,
    I: IntoIterator<Item = Result<VariantRecord, ImportError>>,
{
    let mut summary = ImportSummary::default();

    for record in records {
        let record = record?;
        summary.records += 1;

        for (index, allele) in record.alternates.iter().enumerate() {
            if is_symbolic(allele) {
                debug!(
                    chromosome = %record.chromosome,
                    position = record.position,
                    allele = %allele,
                    "skipping symbolic allele"
                );
                summary.skipped += 1;
                continue;
            }

            let variant = match normalize_variant(
                ctx,
                &record.chromosome,
                record.position,
                &record.reference,
                allele,
            ) {
                Ok(variant) => variant,
                Err(mismatch) if !options.reference_mismatch_abort => {
                    warn!(error = %mismatch, "skipping allele not matching the reference");
                    summary.skipped += 1;
                    continue;
                }
                Err(mismatch) => return Err(mismatch.into()),
            };

            if variant.is_empty() {
                debug!(
                    chromosome = %record.chromosome,
                    position = record.position,
                    "skipping allele equal to the reference"
                );
                summary.skipped += 1;
                continue;
            }

            let support = allele_support(&record, index, options)?;
            for (zygosity, carriers) in support.iter().filter(|&(_, carriers)| carriers > 0) {
                let carriers = u32::try_from(carriers).map_err(|_| {
                    ImportError::InvalidSource(format!("support {carriers} out of range"))
                })?;
                let observation =
                    Observation::new(sample, source, variant.clone(), zygosity, carriers)?;
                target.insert_observation(observation)?;
                summary.written += 1;
            }
        }
    }

    Ok(summary)
}

/// Carriers of alternate `index` (0-based) per zygosity.
fn allele_support(
    record: &VariantRecord,
    index: usize,
    options: &ImportOptions,
) -> Result<ZygosityCounts, ImportError> {
    let mut support = ZygosityCounts::default();

    if options.use_genotypes {
        let allele = u32::try_from(index + 1)
            .map_err(|_| ImportError::InvalidSource("too many alternate alleles".to_string()))?;
        for call in &record.calls {
            let genotype = read_genotype(call, record.alternates.len(), options.prefer_likelihoods)?;
            if let Some(zygosity) = genotype.and_then(|genotype| genotype.zygosity_of(allele)) {
                support.add(zygosity, 1);
            }
        }
        return Ok(support);
    }

    let count = record
        .allele_counts
        .as_ref()
        .and_then(|counts| counts.get(index))
        .ok_or_else(|| {
            ImportError::InvalidSource(format!(
                "cannot read variant support at {}:{}",
                record.chromosome, record.position
            ))
        })?;
    support.add(Zygosity::Unknown, u64::from(*count));
    Ok(support)
}

/// Import parsed BED regions as coverage of `sample`.
///
/// Regions are converted from 0-based half-open to 1-based inclusive and
/// resolved against the reference. Duplicate-import and rollback policy is
/// the same as for [`import_variation`].
#[instrument(skip_all, fields(sample = %sample, source = %source))]
pub fn import_coverage<T, I>(
    target: &T,
    ctx: &NormalizationContext<'_>,
    sample: SampleId,
    source: DataSourceId,
    regions: I,
    options: &ImportOptions,
) -> Result<ImportSummary, ImportError>
where
    T: ImportTarget + ?Sized,
    I: IntoIterator<Item = Result<RegionRecord, ImportError>>,
{
    if !target.mark_imported(sample, source)? {
        return Err(ImportError::AlreadyImported {
            sample,
            data_source: source,
        });
    }
    info!("importing coverage");

    match write_regions(target, ctx, sample, source, regions, options) {
        Ok(summary) => {
            info!(
                records = summary.records,
                written = summary.written,
                skipped = summary.skipped,
                "imported coverage"
            );
            Ok(summary)
        }
        Err(err) => {
            error!(error = %err, "coverage import failed");
            let deleted = target.delete_regions(sample, source);
            roll_back(target, sample, source, deleted, "coverage regions");
            Err(err)
        }
    }
}

/// Clear the import mark once the rows are gone. Rows that could not be
/// deleted keep the pair marked.
fn roll_back<T: ImportTarget + ?Sized>(
    target: &T,
    sample: SampleId,
    source: DataSourceId,
    deleted: Result<usize, StoreError>,
    rows: &str,
) {
    match deleted {
        Ok(removed) => {
            warn!(removed, rows, "rolled back import");
            if let Err(cleanup) = target.unmark_imported(sample, source) {
                error!(error = %cleanup, "clearing import mark failed");
            }
        }
        Err(cleanup) => error!(error = %cleanup, rows, "rolling back import failed"),
    }
}

fn write_regions<T, I>(
    target: &T,
    ctx: &NormalizationContext<'_>,
    sample: SampleId,
    source: DataSourceId,
    regions: I,
    options: &ImportOptions,
) -> Result<ImportSummary, ImportError>
where
    T: ImportTarget + ?Sized,
    I: IntoIterator<Item = Result<RegionRecord, ImportError>>,
{
    let mut summary = ImportSummary::default();

    for region in regions {
        let region = region?;
        summary.records += 1;

        let interval =
            GenomicInterval::from_half_open(region.chromosome.as_str(), region.start, region.end)?;
        let interval = match normalize_region(ctx, &interval) {
            Ok(interval) => interval,
            Err(mismatch) if !options.reference_mismatch_abort => {
                warn!(error = %mismatch, "skipping region not matching the reference");
                summary.skipped += 1;
                continue;
            }
            Err(mismatch) => return Err(mismatch.into()),
        };

        target.insert_region(CoverageRegion::new(sample, source, interval)?)?;
        summary.written += 1;
    }

    Ok(summary)
}
