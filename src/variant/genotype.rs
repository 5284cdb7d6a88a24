//! Genotype decoding from VCF call fields.
//!
//! A call may carry a called genotype (`GT`), genotype likelihoods in phred
//! scale (`PL`, lower is better) or log10 scale (`GL`, higher is better).
//! Likelihood arrays list one value per possible genotype in the order
//! produced by [`genotype_order`].

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

use super::types::Zygosity;

/// Ploidy assumed when neither a hint nor `GT` tells otherwise.
pub const DEFAULT_PLOIDY: usize = 2;

/// Errors raised while decoding a genotype.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenotypeError {
    /// The record defines none of `GT`, `GL` or `PL`.
    #[error("the record for the given call has no genotypes defined and nothing to derive them from")]
    NoGenotypesInRecord,

    /// A likelihood array has fewer values than there are genotypes.
    #[error("{field} has {found} values but {expected} genotypes are possible")]
    LikelihoodCount {
        /// Field name (`PL` or `GL`).
        field: &'static str,
        /// Number of possible genotypes.
        expected: usize,
        /// Number of values present.
        found: usize,
    },

    /// Likelihood array without a single usable value.
    #[error("{field} holds no usable likelihood")]
    InvalidLikelihoods {
        /// Field name (`PL` or `GL`).
        field: &'static str,
    },

    /// `GT` value that is not a list of allele indices.
    #[error("malformed GT value '{0}'")]
    MalformedGt(String),
}

/// Allele indices of a call: 0 is the reference, 1.. the alternates in
/// record order. Length equals the ploidy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Genotype(Vec<u32>);

impl Genotype {
    /// Wrap allele indices.
    pub fn new(alleles: Vec<u32>) -> Self {
        Self(alleles)
    }

    /// Allele indices.
    pub fn alleles(&self) -> &[u32] {
        &self.0
    }

    /// Number of allele copies.
    pub fn ploidy(&self) -> usize {
        self.0.len()
    }

    /// Whether any copy carries `allele`.
    pub fn contains(&self, allele: u32) -> bool {
        self.0.contains(&allele)
    }

    /// Zygosity of `allele` in this genotype, `None` when absent.
    pub fn zygosity_of(&self, allele: u32) -> Option<Zygosity> {
        if !self.contains(allele) {
            None
        } else if self.0.iter().all(|&a| a == allele) {
            Some(Zygosity::Homozygous)
        } else {
            Some(Zygosity::Heterozygous)
        }
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, allele) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("/")?;
            }
            write!(f, "{allele}")?;
        }
        Ok(())
    }
}

/// Parsed per-sample call fields of one record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenotypeFields {
    /// Field names declared in the record's FORMAT column.
    pub format: Vec<String>,
    /// `GT` alleles, `None` for a missing allele (`.`).
    pub gt: Option<Vec<Option<u32>>>,
    /// Phred-scaled likelihoods.
    pub pl: Option<Vec<u32>>,
    /// Log10-scaled likelihoods.
    pub gl: Option<Vec<f64>>,
    /// Ploidy hint, used on the likelihood path before `GT` length.
    pub ploidy: Option<usize>,
}

impl GenotypeFields {
    /// Whether `name` is declared in FORMAT.
    pub fn has_field(&self, name: &str) -> bool {
        self.format.iter().any(|field| field == name)
    }

    /// Set `GT` and declare it.
    pub fn with_gt(mut self, alleles: Vec<Option<u32>>) -> Self {
        self.declare("GT");
        self.gt = Some(alleles);
        self
    }

    /// Set `PL` and declare it.
    pub fn with_pl(mut self, values: Vec<u32>) -> Self {
        self.declare("PL");
        self.pl = Some(values);
        self
    }

    /// Set `GL` and declare it.
    pub fn with_gl(mut self, values: Vec<f64>) -> Self {
        self.declare("GL");
        self.gl = Some(values);
        self
    }

    /// Set the ploidy hint.
    pub fn with_ploidy(mut self, ploidy: usize) -> Self {
        self.ploidy = Some(ploidy);
        self
    }

    fn declare(&mut self, name: &str) {
        if !self.has_field(name) {
            self.format.push(name.to_string());
        }
    }

    /// A call counts as called when `GT` is present and no allele is missing.
    pub fn is_called(&self) -> bool {
        self.gt
            .as_ref()
            .map(|alleles| !alleles.is_empty() && alleles.iter().all(Option::is_some))
            .unwrap_or(false)
    }
}

/// Parse a `GT` value such as `0/1`, `1|2` or `./.`.
pub fn parse_gt(value: &str) -> Result<Vec<Option<u32>>, GenotypeError> {
    if value.is_empty() {
        return Err(GenotypeError::MalformedGt(value.to_string()));
    }
    value
        .split(['/', '|'])
        .map(|allele| match allele {
            "." => Ok(None),
            _ => allele
                .parse()
                .map(Some)
                .map_err(|_| GenotypeError::MalformedGt(value.to_string())),
        })
        .collect()
}

/// Every genotype of `ploidy` copies over `alt_count` alternate alleles, in
/// VCF likelihood order: non-decreasing allele tuples sorted by the tuple
/// read back to front.
///
/// Diploid with two alternates gives `0/0, 0/1, 1/1, 0/2, 1/2, 2/2`.
pub fn genotype_order(alt_count: usize, ploidy: usize) -> Vec<Genotype> {
    let mut combinations = Vec::new();
    let mut current = Vec::with_capacity(ploidy);
    push_combinations(alt_count as u32, ploidy, 0, &mut current, &mut combinations);
    combinations.sort_by(|a: &Vec<u32>, b: &Vec<u32>| a.iter().rev().cmp(b.iter().rev()));
    combinations.into_iter().map(Genotype).collect()
}

fn push_combinations(
    max_allele: u32,
    remaining: usize,
    min_allele: u32,
    current: &mut Vec<u32>,
    out: &mut Vec<Vec<u32>>,
) {
    if remaining == 0 {
        out.push(current.clone());
        return;
    }
    for allele in min_allele..=max_allele {
        current.push(allele);
        push_combinations(max_allele, remaining - 1, allele, current, out);
        current.pop();
    }
}

/// Most likely genotype of a call.
///
/// Likelihoods are used when `prefer_likelihoods` is set or `GT` is not
/// declared, provided `PL` or `GL` carries values; `PL` wins over `GL`. Ties
/// go to the genotype listed first. Otherwise a called `GT` is returned as is.
/// Returns `None` for an uncalled genotype with no usable likelihoods.
pub fn read_genotype(
    fields: &GenotypeFields,
    alt_count: usize,
    prefer_likelihoods: bool,
) -> Result<Option<Genotype>, GenotypeError> {
    let has_gt = fields.has_field("GT");
    let has_pl = fields.has_field("PL");
    let has_gl = fields.has_field("GL");

    if !(has_gt || has_pl || has_gl) {
        return Err(GenotypeError::NoGenotypesInRecord);
    }

    if prefer_likelihoods || !has_gt {
        let pl = fields.pl.as_deref().filter(|pl| has_pl && !pl.is_empty());
        let gl = fields.gl.as_deref().filter(|gl| has_gl && !gl.is_empty());

        if pl.is_some() || gl.is_some() {
            let ploidy = fields
                .ploidy
                .or_else(|| fields.gt.as_ref().map(Vec::len))
                .filter(|&ploidy| ploidy > 0)
                .unwrap_or(DEFAULT_PLOIDY);
            let genotypes = genotype_order(alt_count, ploidy);

            let index = match pl {
                Some(pl) => best_by_phred(pl, genotypes.len())?,
                None => best_by_log(gl.unwrap_or_default(), genotypes.len())?,
            };
            return Ok(genotypes.into_iter().nth(index));
        }
    }

    if has_gt && fields.is_called() {
        let alleles = fields
            .gt
            .iter()
            .flatten()
            .flatten()
            .copied()
            .collect();
        return Ok(Some(Genotype(alleles)));
    }

    Ok(None)
}

fn best_by_phred(pl: &[u32], count: usize) -> Result<usize, GenotypeError> {
    let scores = pl.get(..count).ok_or(GenotypeError::LikelihoodCount {
        field: "PL",
        expected: count,
        found: pl.len(),
    })?;
    Ok(scores
        .iter()
        .enumerate()
        .min_by_key(|&(idx, &score)| (score, idx))
        .map(|(idx, _)| idx)
        .unwrap_or(0))
}

fn best_by_log(gl: &[f64], count: usize) -> Result<usize, GenotypeError> {
    let scores = gl.get(..count).ok_or(GenotypeError::LikelihoodCount {
        field: "GL",
        expected: count,
        found: gl.len(),
    })?;
    // NaN never wins.
    scores
        .iter()
        .enumerate()
        .filter(|&(_, value)| !value.is_nan())
        .min_by(|&(a_idx, a), &(b_idx, b)| {
            b.partial_cmp(a)
                .unwrap_or(Ordering::Equal)
                .then(a_idx.cmp(&b_idx))
        })
        .map(|(idx, _)| idx)
        .ok_or(GenotypeError::InvalidLikelihoods { field: "GL" })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alleles(genotypes: &[Genotype]) -> Vec<Vec<u32>> {
        genotypes.iter().map(|g| g.alleles().to_vec()).collect()
    }

    #[test]
    fn diploid_order_matches_vcf() {
        assert_eq!(
            alleles(&genotype_order(2, 2)),
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![1, 1],
                vec![0, 2],
                vec![1, 2],
                vec![2, 2]
            ]
        );
    }

    #[test]
    fn haploid_and_triploid_orders() {
        assert_eq!(alleles(&genotype_order(2, 1)), vec![vec![0], vec![1], vec![2]]);
        assert_eq!(
            alleles(&genotype_order(1, 3)),
            vec![vec![0, 0, 0], vec![0, 0, 1], vec![0, 1, 1], vec![1, 1, 1]]
        );
    }

    #[test]
    fn parses_gt_strings() {
        assert_eq!(parse_gt("0/1").unwrap(), vec![Some(0), Some(1)]);
        assert_eq!(parse_gt("1|2").unwrap(), vec![Some(1), Some(2)]);
        assert_eq!(parse_gt("./.").unwrap(), vec![None, None]);
        assert_eq!(parse_gt("1").unwrap(), vec![Some(1)]);
        assert!(matches!(parse_gt("0/x"), Err(GenotypeError::MalformedGt(_))));
        assert!(parse_gt("").is_err());
    }

    #[test]
    fn zygosity_of_allele() {
        let het = Genotype::new(vec![0, 1]);
        let hom = Genotype::new(vec![2, 2]);
        assert_eq!(het.zygosity_of(1), Some(Zygosity::Heterozygous));
        assert_eq!(hom.zygosity_of(2), Some(Zygosity::Homozygous));
        assert_eq!(hom.zygosity_of(1), None);
        assert_eq!(het.to_string(), "0/1");
    }

    #[test]
    fn called_gt_is_used_without_likelihoods() {
        let fields = GenotypeFields::default().with_gt(vec![Some(0), Some(1)]);
        assert_eq!(
            read_genotype(&fields, 1, false).unwrap(),
            Some(Genotype::new(vec![0, 1]))
        );
    }

    #[test]
    fn uncalled_gt_without_likelihoods_is_none() {
        let fields = GenotypeFields::default().with_gt(vec![None, None]);
        assert_eq!(read_genotype(&fields, 1, true).unwrap(), None);
    }

    #[test]
    fn declared_but_missing_likelihoods_fall_back_to_gt() {
        let mut fields = GenotypeFields::default().with_gt(vec![Some(1), Some(1)]);
        fields.format.push("PL".to_string());
        assert_eq!(
            read_genotype(&fields, 1, true).unwrap(),
            Some(Genotype::new(vec![1, 1]))
        );
    }

    #[test]
    fn gl_highest_wins() {
        let fields = GenotypeFields::default().with_gl(vec![-5.0, -0.1, -3.0]);
        assert_eq!(
            read_genotype(&fields, 1, false).unwrap(),
            Some(Genotype::new(vec![0, 1]))
        );
    }

    #[test]
    fn gl_nan_is_never_selected() {
        let fields = GenotypeFields::default().with_gl(vec![f64::NAN, -2.0, -1.0]);
        assert_eq!(
            read_genotype(&fields, 1, false).unwrap(),
            Some(Genotype::new(vec![1, 1]))
        );
    }

    #[test]
    fn all_nan_gl_is_rejected() {
        let fields = GenotypeFields::default().with_gl(vec![f64::NAN; 3]);
        assert_eq!(
            read_genotype(&fields, 1, false),
            Err(GenotypeError::InvalidLikelihoods { field: "GL" })
        );
    }

    #[test]
    fn pl_wins_over_gl() {
        let fields = GenotypeFields::default()
            .with_gl(vec![0.0, -5.0, -5.0])
            .with_pl(vec![50, 40, 0]);
        assert_eq!(
            read_genotype(&fields, 1, false).unwrap(),
            Some(Genotype::new(vec![1, 1]))
        );
    }

    #[test]
    fn ploidy_follows_gt_length() {
        let fields = GenotypeFields::default()
            .with_gt(vec![Some(0)])
            .with_pl(vec![30, 0]);
        assert_eq!(
            read_genotype(&fields, 1, true).unwrap(),
            Some(Genotype::new(vec![1]))
        );
    }

    #[test]
    fn short_likelihood_array_is_rejected() {
        let fields = GenotypeFields::default().with_pl(vec![0, 10]);
        assert_eq!(
            read_genotype(&fields, 1, false),
            Err(GenotypeError::LikelihoodCount {
                field: "PL",
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn no_genotype_fields_is_an_error() {
        let fields = GenotypeFields {
            format: vec!["DP".to_string()],
            ..Default::default()
        };
        assert_eq!(
            read_genotype(&fields, 1, false),
            Err(GenotypeError::NoGenotypesInRecord)
        );
    }
}
