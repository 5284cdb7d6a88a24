//! Canonical variant representation.
//!
//! Different callers describe the same indel in different ways: with or
//! without padding bases, with context on the right, anywhere inside a
//! repeat. Normalization trims shared bases and, when a reference genome is
//! available, shifts indels to their leftmost equivalent position so that all
//! of these descriptions compare equal.
//!
//! All positions are 1-based.

use std::sync::Arc;

use thiserror::Error;

use super::reference::NormalizationContext;
use super::types::{GenomicInterval, Variant};

/// Input that does not agree with the configured reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceMismatch {
    /// Chromosome name could not be resolved to a reference sequence.
    #[error("chromosome \"{chromosome}\" not in reference genome")]
    UnknownChromosome {
        /// Name as given.
        chromosome: String,
    },

    /// Position beyond the end of the chromosome (or 0).
    #[error("position {position} does not exist on chromosome \"{chromosome}\" in reference genome")]
    PositionOutOfBounds {
        /// Resolved chromosome name.
        chromosome: String,
        /// Offending position.
        position: u64,
    },

    /// Declared reference sequence differs from the genome.
    #[error("sequence \"{sequence}\" does not match reference genome on \"{chromosome}\" at position {position}")]
    SequenceMismatch {
        /// Resolved chromosome name.
        chromosome: String,
        /// Position of the declared sequence.
        position: u32,
        /// Declared sequence.
        sequence: String,
    },

    /// Sequence containing characters other than nucleotide letters.
    #[error("sequence \"{sequence}\" is not a nucleotide sequence")]
    InvalidSequence {
        /// Offending sequence.
        sequence: String,
    },
}

/// Remove the longest common suffix, then the longest common prefix, of two
/// sequences.
///
/// Returns `(prefix_len, trimmed_s1, trimmed_s2, suffix_len)`. Trimming the
/// suffix first matches tools that pad indels with context on the right.
///
/// ```
/// use varda::variant::trim_common;
///
/// assert_eq!(trim_common(b"TATATATA", b"TATATA"), (0, &b"TA"[..], &b""[..], 6));
/// assert_eq!(trim_common(b"ACCCCC", b"ACCCCCCCC"), (1, &b""[..], &b"CCC"[..], 5));
/// ```
pub fn trim_common<'a, 'b, T: PartialEq>(s1: &'a [T], s2: &'b [T]) -> (usize, &'a [T], &'b [T], usize) {
    let suffix = s1
        .iter()
        .rev()
        .zip(s2.iter().rev())
        .take_while(|(a, b)| a == b)
        .count();
    let s1 = &s1[..s1.len() - suffix];
    let s2 = &s2[..s2.len() - suffix];

    let prefix = s1.iter().zip(s2).take_while(|(a, b)| a == b).count();

    (prefix, &s1[prefix..], &s2[prefix..], suffix)
}

/// Shift `sequence`, starting at `position` in `context`, as far left as
/// possible while staying a cyclic permutation of itself.
///
/// Each step is allowed when the base leaving the window on the right equals
/// the base entering on the left (compared case-insensitively). Stops at
/// position 1. Returns the new position and the rotated sequence; bases keep
/// the case they had in `context` or `sequence`.
///
/// ```
/// use varda::variant::move_left;
///
/// assert_eq!(move_left(b"abbaabbaabba", 5, b"abba"), (1, b"abba".to_vec()));
/// assert_eq!(move_left(b"abbaabbaabba", 6, b"bba"), (5, b"abb".to_vec()));
/// ```
pub fn move_left(context: &[u8], position: usize, sequence: &[u8]) -> (usize, Vec<u8>) {
    let len = sequence.len();
    if len == 0 {
        return (position, Vec::new());
    }

    let lookup = |p: usize| -> Option<u8> {
        if p >= position && p < position + len {
            Some(sequence[p - position].to_ascii_uppercase())
        } else {
            context.get(p.checked_sub(1)?).map(u8::to_ascii_uppercase)
        }
    };

    let mut shift = 0;
    while position > shift + 1 {
        let entering = lookup(position - shift - 1);
        let leaving = lookup(position + len - shift - 1);
        match (entering, leaving) {
            (Some(a), Some(b)) if a == b => shift += 1,
            _ => break,
        }
    }

    if shift == 0 {
        return (position, sequence.to_vec());
    }

    let new_position = position - shift;
    let context_end = position.min(new_position + len) - 1;
    let mut permuted = context
        .get(new_position - 1..context_end)
        .map(<[u8]>::to_vec)
        .unwrap_or_default();
    permuted.extend_from_slice(&sequence[..len.saturating_sub(shift)]);
    (new_position, permuted)
}

/// Resolve `chromosome` to the name used by the reference (or alias table).
///
/// A leading `chr` is ignored. With a genome, the name itself, then the
/// `chr`-prefixed name, then any alias present in the genome is accepted.
/// Without one, the first name of the matching alias group is returned, or
/// the name itself.
pub fn normalize_chromosome(
    ctx: &NormalizationContext<'_>,
    chromosome: &str,
) -> Result<Arc<str>, ReferenceMismatch> {
    let name = chromosome.strip_prefix("chr").unwrap_or(chromosome);

    let Some(genome) = ctx.genome else {
        return Ok(match ctx.aliases.group_of(name) {
            Some(group) => Arc::from(group[0].as_str()),
            None => Arc::from(name),
        });
    };

    if genome.contains(name) {
        return Ok(Arc::from(name));
    }
    let prefixed = format!("chr{name}");
    if genome.contains(&prefixed) {
        return Ok(Arc::from(prefixed));
    }

    ctx.aliases
        .group_of(name)
        .and_then(|group| group.iter().find(|alias| genome.contains(alias)))
        .map(|alias| Arc::from(alias.as_str()))
        .ok_or_else(|| ReferenceMismatch::UnknownChromosome {
            chromosome: name.to_string(),
        })
}

/// Resolve the chromosome of `interval` and, with a genome, check that it
/// ends within the chromosome.
pub fn normalize_region(
    ctx: &NormalizationContext<'_>,
    interval: &GenomicInterval,
) -> Result<GenomicInterval, ReferenceMismatch> {
    let chromosome = normalize_chromosome(ctx, interval.chromosome())?;

    if let Some(genome) = ctx.genome {
        let length = genome.length(&chromosome).unwrap_or(0);
        if interval.end() as usize > length {
            return Err(ReferenceMismatch::PositionOutOfBounds {
                chromosome: chromosome.to_string(),
                position: u64::from(interval.end()),
            });
        }
    }

    Ok(interval.with_chromosome(chromosome))
}

/// Canonical representation of a variant.
///
/// Sequences are uppercased and trimmed of shared bases, advancing
/// `position` past the removed prefix. With a genome in `ctx`, both sequences
/// must be nucleotide letters, the declared reference is checked against the
/// genome and pure insertions and deletions are moved to their leftmost
/// equivalent position. Without one nothing is validated. Normalizing the
/// result again returns it unchanged.
pub fn normalize_variant(
    ctx: &NormalizationContext<'_>,
    chromosome: &str,
    position: u32,
    reference: &str,
    observed: &str,
) -> Result<Variant, ReferenceMismatch> {
    let reference = reference.to_ascii_uppercase();
    let observed = observed.to_ascii_uppercase();

    let chromosome = normalize_chromosome(ctx, chromosome)?;

    let context = match ctx.genome {
        Some(genome) => {
            check_sequence(&reference)?;
            check_sequence(&observed)?;
            let context = genome.sequence(&chromosome).ok_or_else(|| {
                ReferenceMismatch::UnknownChromosome {
                    chromosome: chromosome.to_string(),
                }
            })?;
            check_reference(context, &chromosome, position, &reference)?;
            Some(context)
        }
        None => None,
    };

    let (prefix, trimmed_reference, trimmed_observed, _) =
        trim_common(reference.as_bytes(), observed.as_bytes());
    let mut position = position as usize + prefix;
    let mut reference = trimmed_reference.to_vec();
    let mut observed = trimmed_observed.to_vec();

    if let Some(context) = context {
        if reference.is_empty() && !observed.is_empty() {
            let (moved, permuted) = move_left(context, position, &observed);
            position = moved;
            observed = permuted.to_ascii_uppercase();
        } else if observed.is_empty() && !reference.is_empty() {
            let (moved, permuted) = move_left(context, position, &reference);
            position = moved;
            reference = permuted.to_ascii_uppercase();
        }
    }

    let position = u32::try_from(position).map_err(|_| ReferenceMismatch::PositionOutOfBounds {
        chromosome: chromosome.to_string(),
        position: position as u64,
    })?;

    Ok(Variant {
        chromosome,
        position,
        reference: ascii_string(&reference),
        observed: ascii_string(&observed),
    })
}

/// Declared reference must match the genome at `position`. A position one
/// past the chromosome end is accepted for an empty reference (insertion
/// after the last base).
fn check_reference(
    context: &[u8],
    chromosome: &str,
    position: u32,
    reference: &str,
) -> Result<(), ReferenceMismatch> {
    let last_valid = if reference.is_empty() {
        context.len() + 1
    } else {
        context.len()
    };
    if position == 0 || position as usize > last_valid {
        return Err(ReferenceMismatch::PositionOutOfBounds {
            chromosome: chromosome.to_string(),
            position: u64::from(position),
        });
    }

    let start = position as usize - 1;
    let matches = context
        .get(start..start + reference.len())
        .map(|bases| bases.eq_ignore_ascii_case(reference.as_bytes()))
        .unwrap_or(false);
    if !matches {
        return Err(ReferenceMismatch::SequenceMismatch {
            chromosome: chromosome.to_string(),
            position,
            sequence: reference.to_string(),
        });
    }
    Ok(())
}

fn check_sequence(sequence: &str) -> Result<(), ReferenceMismatch> {
    if sequence.bytes().all(|base| base.is_ascii_alphabetic()) {
        Ok(())
    } else {
        Err(ReferenceMismatch::InvalidSequence {
            sequence: sequence.to_string(),
        })
    }
}

fn ascii_string(bases: &[u8]) -> String {
    bases.iter().map(|&base| char::from(base)).collect()
}

/// One `_`-separated part of a chromosome name. Numbers sort before text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChromosomePart {
    /// All-digit part, compared numerically.
    Number(u64),
    /// Anything else, compared lexically.
    Text(String),
}

/// Natural ordering key for chromosome names: `chr` is ignored, names with
/// fewer `_`-parts come first, and numeric parts compare as numbers.
///
/// ```
/// use varda::variant::chromosome_sort_key;
///
/// let mut names = vec!["chr10", "X", "2", "1_gl000191_random", "MT"];
/// names.sort_by_key(|name| chromosome_sort_key(name));
/// assert_eq!(names, vec!["2", "chr10", "MT", "X", "1_gl000191_random"]);
/// ```
pub fn chromosome_sort_key(chromosome: &str) -> (usize, Vec<ChromosomePart>) {
    let name = chromosome.strip_prefix("chr").unwrap_or(chromosome);
    let parts: Vec<ChromosomePart> = name
        .split('_')
        .map(|part| {
            if !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) {
                part.parse()
                    .map(ChromosomePart::Number)
                    .unwrap_or_else(|_| ChromosomePart::Text(part.to_string()))
            } else {
                ChromosomePart::Text(part.to_string())
            }
        })
        .collect();
    (parts.len(), parts)
}
