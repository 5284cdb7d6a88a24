use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::binning::{self, BinningError};

/// Errors raised when constructing a [`GenomicInterval`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntervalError {
    /// 1-based interval starting at 0 or ending before it begins.
    #[error("invalid interval {chromosome}:{begin}-{end}")]
    Invalid {
        /// Chromosome name.
        chromosome: String,
        /// First position (1-based).
        begin: u32,
        /// Last position (1-based, inclusive).
        end: u32,
    },

    /// 0-based half-open interval that covers no positions.
    #[error("empty half-open interval {chromosome}:[{start}, {stop})")]
    Empty {
        /// Chromosome name.
        chromosome: String,
        /// First position (0-based).
        start: u32,
        /// One past the last position (0-based).
        stop: u32,
    },
}

/// Genomic interval, 1-based and inclusive on both ends.
///
/// This is the single coordinate convention used inside the crate. BED-style
/// 0-based half-open coordinates are converted with
/// [`from_half_open`](Self::from_half_open) and
/// [`to_half_open`](Self::to_half_open) at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenomicInterval {
    chromosome: Arc<str>,
    begin: u32,
    end: u32,
}

impl GenomicInterval {
    /// Construct an interval from 1-based inclusive coordinates.
    pub fn new(chromosome: impl Into<Arc<str>>, begin: u32, end: u32) -> Result<Self, IntervalError> {
        let chromosome = chromosome.into();
        if begin == 0 || begin > end {
            return Err(IntervalError::Invalid {
                chromosome: chromosome.to_string(),
                begin,
                end,
            });
        }
        Ok(Self {
            chromosome,
            begin,
            end,
        })
    }

    /// Construct an interval from 0-based half-open coordinates `[start, stop)`.
    pub fn from_half_open(
        chromosome: impl Into<Arc<str>>,
        start: u32,
        stop: u32,
    ) -> Result<Self, IntervalError> {
        let chromosome = chromosome.into();
        if stop <= start {
            return Err(IntervalError::Empty {
                chromosome: chromosome.to_string(),
                start,
                stop,
            });
        }
        Ok(Self {
            chromosome,
            begin: start + 1,
            end: stop,
        })
    }

    /// Coordinates as 0-based half-open `(start, stop)`.
    pub fn to_half_open(&self) -> (u32, u32) {
        (self.begin - 1, self.end)
    }

    /// Chromosome name.
    pub fn chromosome(&self) -> &Arc<str> {
        &self.chromosome
    }

    /// First position (1-based).
    pub fn begin(&self) -> u32 {
        self.begin
    }

    /// Last position (1-based, inclusive).
    pub fn end(&self) -> u32 {
        self.end
    }

    /// Number of positions covered.
    pub fn len(&self) -> u32 {
        self.end - self.begin + 1
    }

    /// Same interval on another chromosome name (used after alias resolution).
    pub fn with_chromosome(&self, chromosome: impl Into<Arc<str>>) -> Self {
        Self {
            chromosome: chromosome.into(),
            begin: self.begin,
            end: self.end,
        }
    }

    /// Whether `other` lies entirely within this interval.
    pub fn contains(&self, other: &Self) -> bool {
        self.chromosome == other.chromosome && self.begin <= other.begin && self.end >= other.end
    }

    /// Whether the two intervals share at least one position.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.chromosome == other.chromosome && self.begin <= other.end && other.begin <= self.end
    }

    /// Bin assigned to this interval under the UCSC scheme.
    pub fn bin(&self) -> Result<u32, BinningError> {
        binning::assign_bin(self.begin, self.end)
    }

    /// Bins to inspect for stored intervals overlapping this one.
    pub fn all_bins(&self) -> Result<Vec<u32>, BinningError> {
        binning::all_bins(self.begin, self.end)
    }
}

impl fmt::Display for GenomicInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chromosome, self.begin, self.end)
    }
}

/// Observation category of a variant call in a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Zygosity {
    /// Zygosity not reported (e.g. pooled samples).
    Unknown,
    /// Allele present on some but not all copies.
    Heterozygous,
    /// Allele present on every copy.
    Homozygous,
}

impl Zygosity {
    /// Every category, in a fixed order.
    pub const ALL: [Zygosity; 3] = [Zygosity::Unknown, Zygosity::Heterozygous, Zygosity::Homozygous];

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Zygosity::Unknown => "unknown",
            Zygosity::Heterozygous => "heterozygous",
            Zygosity::Homozygous => "homozygous",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Zygosity::Unknown => 0,
            Zygosity::Heterozygous => 1,
            Zygosity::Homozygous => 2,
        }
    }
}

impl fmt::Display for Zygosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sequence change at a 1-based position.
///
/// Produced in canonical form by
/// [`normalize_variant`](crate::variant::normalize_variant); construct
/// directly only for values that already are.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variant {
    /// Chromosome name.
    pub chromosome: Arc<str>,
    /// Position where `reference` and `observed` start (1-based).
    pub position: u32,
    /// Reference sequence, empty for insertions.
    pub reference: String,
    /// Observed sequence, empty for deletions.
    pub observed: String,
}

impl Variant {
    /// Construct a variant.
    pub fn new(
        chromosome: impl Into<Arc<str>>,
        position: u32,
        reference: impl Into<String>,
        observed: impl Into<String>,
    ) -> Self {
        Self {
            chromosome: chromosome.into(),
            position,
            reference: reference.into(),
            observed: observed.into(),
        }
    }

    /// Pure deletion.
    pub fn is_deletion(&self) -> bool {
        self.observed.is_empty() && !self.reference.is_empty()
    }

    /// Pure insertion.
    pub fn is_insertion(&self) -> bool {
        self.reference.is_empty() && !self.observed.is_empty()
    }

    /// Single nucleotide substitution.
    pub fn is_snv(&self) -> bool {
        self.reference.len() == 1 && self.observed.len() == 1
    }

    /// Any other change (multi-base substitution or deletion-insertion).
    pub fn is_indel(&self) -> bool {
        !(self.is_empty() || self.is_deletion() || self.is_insertion() || self.is_snv())
    }

    /// No change left after trimming.
    pub fn is_empty(&self) -> bool {
        self.reference.is_empty() && self.observed.is_empty()
    }

    /// Last reference position touched. An insertion is assigned the
    /// reference base at its position.
    pub fn end(&self) -> u32 {
        let span = self.reference.len().max(1) - 1;
        self.position
            .saturating_add(u32::try_from(span).unwrap_or(u32::MAX))
    }

    /// Reference region touched by the variant.
    pub fn interval(&self) -> Result<GenomicInterval, IntervalError> {
        GenomicInterval::new(Arc::clone(&self.chromosome), self.position, self.end())
    }

    /// Bin stored alongside the variant.
    pub fn bin(&self) -> Result<u32, BinningError> {
        binning::assign_bin(self.position, self.end())
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}{}>{}",
            self.chromosome,
            self.position,
            if self.reference.is_empty() { "-" } else { self.reference.as_str() },
            if self.observed.is_empty() { "-" } else { self.observed.as_str() },
        )
    }
}
