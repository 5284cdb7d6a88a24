use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::Range;
use std::path::{Path, PathBuf};

use noodles::fasta;
use thiserror::Error;

/// Read access to reference chromosome sequences.
///
/// Implementations must be shareable across threads; normalization never
/// mutates the genome.
pub trait ReferenceGenome: Send + Sync {
    /// Full sequence of `chromosome`, if present.
    fn sequence(&self, chromosome: &str) -> Option<&[u8]>;

    /// Whether the genome has a sequence named `chromosome`.
    fn contains(&self, chromosome: &str) -> bool {
        self.sequence(chromosome).is_some()
    }

    /// Length of `chromosome` in bases.
    fn length(&self, chromosome: &str) -> Option<usize> {
        self.sequence(chromosome).map(<[u8]>::len)
    }

    /// Bases in the 0-based half-open `range` of `chromosome`; `None` when the
    /// chromosome is missing or the range runs past its end.
    fn fetch(&self, chromosome: &str, range: Range<usize>) -> Option<&[u8]> {
        self.sequence(chromosome)?.get(range)
    }
}

/// Errors that can occur while loading a FASTA reference.
#[derive(Debug, Error)]
pub enum GenomeError {
    /// Reference file could not be opened or read.
    #[error("failed to read reference genome {}", path.display())]
    Io {
        /// Path of the reference file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Malformed FASTA record or failed read.
    #[error("failed to read reference genome: {0}")]
    Read(#[from] std::io::Error),

    /// Two records with the same name.
    #[error("duplicate sequence name '{name}'")]
    DuplicateChromosome {
        /// Repeated name.
        name: String,
    },
}

/// Reference genome held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGenome {
    sequences: HashMap<String, Vec<u8>>,
    names: Vec<String>,
}

impl InMemoryGenome {
    /// Create an empty genome.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a genome from `(name, sequence)` pairs. Later pairs replace
    /// earlier ones with the same name.
    pub fn from_sequences<I, N, S>(sequences: I) -> Self
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<Vec<u8>>,
    {
        let mut genome = Self::new();
        for (name, sequence) in sequences {
            genome.insert(name, sequence);
        }
        genome
    }

    /// Load every record of a FASTA file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GenomeError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| GenomeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    /// Read every FASTA record of `reader`. The record name is the first word
    /// of its definition line.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, GenomeError> {
        let mut reader = fasta::io::Reader::new(reader);
        let mut genome = Self::new();

        for record in reader.records() {
            let record = record?;
            let name = String::from_utf8_lossy(record.name()).into_owned();
            genome.insert_new(name, record.sequence().as_ref().to_vec())?;
        }

        Ok(genome)
    }

    /// Add or replace a chromosome.
    pub fn insert(&mut self, name: impl Into<String>, sequence: impl Into<Vec<u8>>) {
        let name = name.into();
        if !self.sequences.contains_key(&name) {
            self.names.push(name.clone());
        }
        self.sequences.insert(name, sequence.into());
    }

    fn insert_new(&mut self, name: String, sequence: Vec<u8>) -> Result<(), GenomeError> {
        if self.sequences.contains_key(&name) {
            return Err(GenomeError::DuplicateChromosome { name });
        }
        self.insert(name, sequence);
        Ok(())
    }

    /// Chromosome names in load order.
    pub fn chromosomes(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Number of chromosomes.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no chromosome is loaded.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl ReferenceGenome for InMemoryGenome {
    fn sequence(&self, chromosome: &str) -> Option<&[u8]> {
        self.sequences.get(chromosome).map(Vec::as_slice)
    }
}

/// Groups of interchangeable chromosome names.
///
/// The first name of a group is its preferred spelling when no reference
/// genome is available to pick one.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChromosomeAliases {
    groups: Vec<Vec<String>>,
}

impl ChromosomeAliases {
    /// Alias table without any group.
    pub fn empty() -> Self {
        Self { groups: Vec::new() }
    }

    /// Alias table from explicit groups. Empty groups are dropped.
    pub fn from_groups<G, N>(groups: G) -> Self
    where
        G: IntoIterator,
        G::Item: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let mut aliases = Self::empty();
        for group in groups {
            aliases.push_group(group);
        }
        aliases
    }

    /// Append a group of names.
    pub fn push_group<N: Into<String>>(&mut self, group: impl IntoIterator<Item = N>) {
        let group: Vec<String> = group.into_iter().map(Into::into).collect();
        if !group.is_empty() {
            self.groups.push(group);
        }
    }

    /// Group containing `name` or `chr` + `name`.
    pub fn group_of(&self, name: &str) -> Option<&[String]> {
        let prefixed = format!("chr{name}");
        self.groups
            .iter()
            .find(|group| group.iter().any(|alias| alias == name || *alias == prefixed))
            .map(Vec::as_slice)
    }

    /// All groups.
    pub fn groups(&self) -> &[Vec<String>] {
        &self.groups
    }
}

impl Default for ChromosomeAliases {
    /// Mitochondrial genome spellings.
    fn default() -> Self {
        Self::from_groups([["M", "MT", "NC_012920.1", "NC_012920_1", "NC_012920"]])
    }
}

/// Everything variant normalization needs besides the variant itself.
///
/// Without a genome, normalization runs in reduced mode: chromosome names are
/// resolved through the alias table only, sequences are trimmed but neither
/// validated nor left-aligned.
#[derive(Clone, Copy)]
pub struct NormalizationContext<'a> {
    /// Chromosome alias table.
    pub aliases: &'a ChromosomeAliases,
    /// Reference genome, if one is configured.
    pub genome: Option<&'a dyn ReferenceGenome>,
}

impl<'a> NormalizationContext<'a> {
    /// Context in reduced mode.
    pub fn new(aliases: &'a ChromosomeAliases) -> Self {
        Self {
            aliases,
            genome: None,
        }
    }

    /// Attach a reference genome.
    pub fn with_genome(mut self, genome: &'a dyn ReferenceGenome) -> Self {
        self.genome = Some(genome);
        self
    }

    /// Whether a reference genome is attached.
    pub fn has_genome(&self) -> bool {
        self.genome.is_some()
    }
}

impl fmt::Debug for NormalizationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalizationContext")
            .field("aliases", self.aliases)
            .field("has_genome", &self.has_genome())
            .finish()
    }
}
