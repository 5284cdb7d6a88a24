//! Frequency annotation of query variants.

use std::io::Write;

use anyhow::{anyhow, Context, Result};
use tracing::debug;

use crate::frequency::{calculate_frequency, FrequencyResult, FrequencyStore, Sample};
use crate::variant::{chromosome_sort_key, normalize_variant, NormalizationContext, Variant, Zygosity};

const HEADER: &str = "#CHROM\tPOS\tREF\tALT\tCOVERAGE\tHOM\tHET\tUNK\n";

/// Canonical variant with its frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedVariant {
    /// Normalized query.
    pub variant: Variant,
    /// Frequency among the queried samples.
    pub frequency: FrequencyResult,
}

/// Normalize every `(chromosome, position, reference, observed)` query and
/// compute its frequency among `samples`.
///
/// Rows come back in natural chromosome order, then by position, reference
/// and observed sequence. Queries normalizing to the same variant appear
/// once.
pub fn annotate_variants<S, Q, C, R, O>(
    store: &S,
    ctx: &NormalizationContext<'_>,
    samples: &[Sample],
    queries: Q,
) -> Result<Vec<AnnotatedVariant>>
where
    S: FrequencyStore + ?Sized,
    Q: IntoIterator<Item = (C, u32, R, O)>,
    C: AsRef<str>,
    R: AsRef<str>,
    O: AsRef<str>,
{
    let mut variants = Vec::new();
    for (chromosome, position, reference, observed) in queries {
        let (chromosome, reference, observed) =
            (chromosome.as_ref(), reference.as_ref(), observed.as_ref());
        let variant = normalize_variant(ctx, chromosome, position, reference, observed)
            .with_context(|| format!("cannot normalize {chromosome}:{position} {reference}>{observed}"))?;
        variants.push(variant);
    }

    variants.sort_by(|a, b| {
        chromosome_sort_key(&a.chromosome)
            .cmp(&chromosome_sort_key(&b.chromosome))
            .then_with(|| a.position.cmp(&b.position))
            .then_with(|| a.reference.cmp(&b.reference))
            .then_with(|| a.observed.cmp(&b.observed))
    });
    variants.dedup();

    variants
        .into_iter()
        .map(|variant| {
            let frequency = calculate_frequency(store, &variant, samples)
                .with_context(|| format!("frequency calculation failed for {variant}"))?;
            debug!(%variant, coverage = frequency.coverage, "annotated");
            Ok(AnnotatedVariant { variant, frequency })
        })
        .collect()
}

fn sequence_or_dash(sequence: &str) -> &str {
    if sequence.is_empty() {
        "-"
    } else {
        sequence
    }
}

/// Write annotated variants as a tab-separated report.
pub fn write_annotation<W: Write>(writer: &mut W, rows: &[AnnotatedVariant]) -> Result<()> {
    writer.write_all(HEADER.as_bytes())?;

    for row in rows {
        let line = format!(
            "{chrom}\t{pos}\t{reference}\t{observed}\t{coverage}\t{hom:.4}\t{het:.4}\t{unk:.4}\n",
            chrom = row.variant.chromosome,
            pos = row.variant.position,
            reference = sequence_or_dash(&row.variant.reference),
            observed = sequence_or_dash(&row.variant.observed),
            coverage = row.frequency.coverage,
            hom = row.frequency.ratio(Zygosity::Homozygous),
            het = row.frequency.ratio(Zygosity::Heterozygous),
            unk = row.frequency.ratio(Zygosity::Unknown),
        );
        writer.write_all(line.as_bytes())?;
    }

    writer.flush()?;
    Ok(())
}

/// Render the report into a string.
pub fn render_annotation(rows: &[AnnotatedVariant]) -> Result<String> {
    let mut buffer = Vec::new();
    write_annotation(&mut buffer, rows)?;
    String::from_utf8(buffer).map_err(|_| anyhow!("rendered annotation is not valid UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn row(chromosome: &str, position: u32, reference: &str, observed: &str, het: f64) -> AnnotatedVariant {
        let mut frequency = BTreeMap::new();
        frequency.insert(Zygosity::Unknown, 0.0);
        frequency.insert(Zygosity::Heterozygous, het);
        frequency.insert(Zygosity::Homozygous, 0.0);
        AnnotatedVariant {
            variant: Variant::new(chromosome, position, reference, observed),
            frequency: FrequencyResult {
                coverage: 3,
                frequency,
            },
        }
    }

    #[test]
    fn renders_header_and_dashes() {
        let text = render_annotation(&[row("X", 8, "", "T", 1.0 / 3.0)]).unwrap();
        assert_eq!(
            text,
            "#CHROM\tPOS\tREF\tALT\tCOVERAGE\tHOM\tHET\tUNK\nX\t8\t-\tT\t3\t0.0000\t0.3333\t0.0000\n"
        );
    }

    #[test]
    fn empty_report_has_header_only() {
        assert_eq!(render_annotation(&[]).unwrap(), HEADER);
    }
}
