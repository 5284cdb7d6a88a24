//! # Varda core
//!
//! Variant canonicalization, region binning and allele-frequency
//! aggregation for a database of variant observations across many samples.
//!
//! ## Pipeline
//!
//! 1. **Normalization**: every (chromosome, position, reference, observed)
//!    description is reduced to one minimal, left-aligned [`Variant`]
//! 2. **Binning**: intervals are assigned UCSC bins so overlap queries only
//!    look at a handful of buckets
//! 3. **Ingestion**: parsed VCF/BED records are written one row at a time,
//!    with duplicate-import rejection and rollback
//! 4. **Aggregation**: coverage and carrier counts from one store snapshot
//!    become per-zygosity frequencies
//!
//! All positions are 1-based and inclusive unless a name says otherwise.
//!
//! ## Usage Example
//!
//! ```
//! use varda::frequency::{calculate_frequency, MemoryStore, Sample, SampleId, DataSourceId};
//! use varda::ingest::{import_coverage, import_variation, ImportOptions, RegionRecord, VariantRecord};
//! use varda::variant::{ChromosomeAliases, GenotypeFields, NormalizationContext, Variant, Zygosity};
//!
//! let store = MemoryStore::new();
//! let aliases = ChromosomeAliases::default();
//! let ctx = NormalizationContext::new(&aliases);
//! let options = ImportOptions::default();
//! let (sample, source) = (SampleId(1), DataSourceId(1));
//!
//! import_coverage(&store, &ctx, sample, source, vec![Ok(RegionRecord::new("chr1", 0, 1000))], &options)?;
//! let call = GenotypeFields::default().with_gt(vec![Some(0), Some(1)]);
//! let record = VariantRecord::new("chr1", 100, "A", ["G"]).with_call(call);
//! import_variation(&store, &ctx, sample, DataSourceId(2), vec![Ok(record)], &options)?;
//!
//! let snapshot = store.snapshot()?;
//! let result = calculate_frequency(&snapshot, &Variant::new("1", 100, "A", "G"), &[Sample::individual(sample)])?;
//! assert_eq!(result.coverage, 1);
//! assert_eq!(result.ratio(Zygosity::Heterozygous), 1.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]
#![allow(clippy::new_without_default)]

pub mod annotate;  // Frequency reports
pub mod binning;   // UCSC interval binning
pub mod config;    // Shared settings
pub mod frequency; // Frequency engine and in-memory store
pub mod ingest;    // Record import and data source digests
pub mod variant;   // Variants, normalization and genotypes

// Re-exports for convenience
pub use annotate::{annotate_variants, render_annotation, write_annotation, AnnotatedVariant};
pub use binning::{all_bins, assign_bin, BinningError, BinningScheme};
pub use config::CoreConfig;
pub use frequency::{calculate_frequency, FrequencyResult, FrequencyStore, MemoryStore};
pub use ingest::{import_coverage, import_variation, ImportError, ImportOptions, ImportTarget};
pub use variant::{normalize_variant, read_genotype, GenomicInterval, Variant, Zygosity};
