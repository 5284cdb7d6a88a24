//! Variant representation, canonicalization and genotype decoding.
//!
//! - `types`: intervals, variants and zygosity
//! - `reference`: reference genome access and chromosome aliases
//! - `normalize`: trimming, left-alignment and chromosome resolution
//! - `genotype`: most likely genotype from GT/PL/GL fields

mod genotype;
mod normalize;
mod reference;
mod types;

pub use genotype::{
    genotype_order, parse_gt, read_genotype, Genotype, GenotypeError, GenotypeFields,
    DEFAULT_PLOIDY,
};
pub use normalize::{
    chromosome_sort_key, move_left, normalize_chromosome, normalize_region, normalize_variant,
    trim_common, ChromosomePart, ReferenceMismatch,
};
pub use reference::{
    ChromosomeAliases, GenomeError, InMemoryGenome, NormalizationContext, ReferenceGenome,
};
pub use types::{GenomicInterval, IntervalError, Variant, Zygosity};
