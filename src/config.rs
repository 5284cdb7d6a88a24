//! Core configuration.

use std::path::{Path, PathBuf};

use crate::binning::BinningScheme;
use crate::ingest::ImportOptions;
use crate::variant::{ChromosomeAliases, GenomeError, InMemoryGenome, NormalizationContext};

/// Settings shared by normalization, ingestion and annotation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoreConfig {
    /// Interchangeable chromosome names.
    pub chromosome_aliases: ChromosomeAliases,
    /// FASTA file of the reference genome. Without one, normalization runs
    /// in reduced mode.
    pub reference_genome: Option<PathBuf>,
    /// Abort imports on reference mismatches instead of skipping records.
    pub reference_mismatch_abort: bool,
    /// Derive observation support from genotypes.
    pub use_genotypes: bool,
    /// Decode genotypes from likelihoods even when GT is present.
    pub prefer_likelihoods: bool,
    /// Binning scheme used by the CLI.
    pub binning: BinningScheme,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            chromosome_aliases: ChromosomeAliases::default(),
            reference_genome: None,
            reference_mismatch_abort: true,
            use_genotypes: true,
            prefer_likelihoods: false,
            binning: BinningScheme::UCSC,
        }
    }
}

impl CoreConfig {
    /// Replace the alias table.
    pub fn with_chromosome_aliases(mut self, aliases: ChromosomeAliases) -> Self {
        self.chromosome_aliases = aliases;
        self
    }

    /// Use a FASTA reference genome.
    pub fn with_reference_genome(mut self, path: impl AsRef<Path>) -> Self {
        self.reference_genome = Some(path.as_ref().to_path_buf());
        self
    }

    /// Abort or skip on reference mismatches.
    pub fn with_reference_mismatch_abort(mut self, abort: bool) -> Self {
        self.reference_mismatch_abort = abort;
        self
    }

    /// Derive support from genotypes or from `AC`.
    pub fn with_genotypes(mut self, enabled: bool) -> Self {
        self.use_genotypes = enabled;
        self
    }

    /// Prefer likelihoods over GT.
    pub fn with_prefer_likelihoods(mut self, enabled: bool) -> Self {
        self.prefer_likelihoods = enabled;
        self
    }

    /// Select the binning scheme.
    pub fn with_binning(mut self, scheme: BinningScheme) -> Self {
        self.binning = scheme;
        self
    }

    /// Import switches.
    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            use_genotypes: self.use_genotypes,
            prefer_likelihoods: self.prefer_likelihoods,
            reference_mismatch_abort: self.reference_mismatch_abort,
        }
    }

    /// Load the configured reference genome, if any.
    pub fn load_genome(&self) -> Result<Option<InMemoryGenome>, GenomeError> {
        self.reference_genome
            .as_deref()
            .map(InMemoryGenome::from_path)
            .transpose()
    }

    /// Normalization context over this configuration and `genome`.
    pub fn context<'a>(&'a self, genome: Option<&'a InMemoryGenome>) -> NormalizationContext<'a> {
        let ctx = NormalizationContext::new(&self.chromosome_aliases);
        match genome {
            Some(genome) => ctx.with_genome(genome),
            None => ctx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_abort_and_use_genotypes() {
        let options = CoreConfig::default().import_options();
        assert_eq!(options, ImportOptions::default());
    }

    #[test]
    fn builders_flow_into_import_options() {
        let config = CoreConfig::default()
            .with_reference_mismatch_abort(false)
            .with_genotypes(false)
            .with_prefer_likelihoods(true);
        let options = config.import_options();
        assert!(!options.reference_mismatch_abort);
        assert!(!options.use_genotypes);
        assert!(options.prefer_likelihoods);
    }

    #[test]
    fn no_reference_means_reduced_mode() {
        let config = CoreConfig::default();
        assert!(config.load_genome().unwrap().is_none());
        assert!(!config.context(None).has_genome());
    }

    #[test]
    fn missing_reference_file_is_reported() {
        let config = CoreConfig::default().with_reference_genome("/nonexistent/genome.fa");
        assert!(matches!(config.load_genome(), Err(GenomeError::Io { .. })));
    }
}
