use crate::variant::GenotypeFields;

/// One parsed VCF data line.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRecord {
    /// Chromosome as written in the file.
    pub chromosome: String,
    /// 1-based position.
    pub position: u32,
    /// Reference allele.
    pub reference: String,
    /// Alternate alleles in record order.
    pub alternates: Vec<String>,
    /// Per-sample call fields.
    pub calls: Vec<GenotypeFields>,
    /// `AC` INFO values, one per alternate.
    pub allele_counts: Option<Vec<u32>>,
}

impl VariantRecord {
    /// Record without calls or allele counts.
    pub fn new(
        chromosome: impl Into<String>,
        position: u32,
        reference: impl Into<String>,
        alternates: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            chromosome: chromosome.into(),
            position,
            reference: reference.into(),
            alternates: alternates.into_iter().map(Into::into).collect(),
            calls: Vec::new(),
            allele_counts: None,
        }
    }

    /// Append a sample call.
    pub fn with_call(mut self, call: GenotypeFields) -> Self {
        self.calls.push(call);
        self
    }

    /// Set `AC`.
    pub fn with_allele_counts(mut self, counts: Vec<u32>) -> Self {
        self.allele_counts = Some(counts);
        self
    }
}

/// One parsed BED line, 0-based half-open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionRecord {
    /// Chromosome as written in the file.
    pub chromosome: String,
    /// First position (0-based).
    pub start: u32,
    /// One past the last position.
    pub end: u32,
}

impl RegionRecord {
    /// Construct a record.
    pub fn new(chromosome: impl Into<String>, start: u32, end: u32) -> Self {
        Self {
            chromosome: chromosome.into(),
            start,
            end,
        }
    }
}

/// Alleles that do not spell out a sequence: `<DEL>`, `*`, `.` and breakends.
pub(crate) fn is_symbolic(allele: &str) -> bool {
    allele.starts_with('<')
        || allele == "*"
        || allele == "."
        || allele.contains(['[', ']'])
}
