use std::fs;
use std::path::{Path, PathBuf};

use varda::frequency::{DataSourceId, MemoryStore, Sample, SampleId};
use varda::ingest::{import_coverage, import_variation, ImportOptions, RegionRecord, VariantRecord};
use varda::variant::{parse_gt, ChromosomeAliases, GenotypeFields, InMemoryGenome, NormalizationContext};

/// Golden annotation reports live in `tests/snapshots/annotation/<name>.tsv`.
fn report_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/snapshots/annotation")
        .join(name)
        .with_extension("tsv")
}

/// Compare a rendered annotation report with its golden file, row by row.
/// `VARDA_UPDATE_SNAPSHOTS` rewrites the golden file instead.
#[allow(dead_code)]
pub fn assert_report_matches(name: &str, actual: &str) {
    let path = report_path(name);
    if std::env::var_os("VARDA_UPDATE_SNAPSHOTS").is_some() {
        fs::create_dir_all(path.parent().expect("golden directory")).expect("create golden directory");
        fs::write(&path, actual).expect("write golden report");
        return;
    }

    let expected = fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("golden report {} unreadable: {err}", path.display()));
    let expected: Vec<&str> = expected.lines().collect();
    let actual: Vec<&str> = actual.lines().collect();
    let header: Vec<&str> = expected.first().map(|row| row.split('\t').collect()).unwrap_or_default();

    for (row, (want, got)) in expected.iter().zip(&actual).enumerate() {
        if want == got {
            continue;
        }
        let column = want
            .split('\t')
            .zip(got.split('\t'))
            .position(|(a, b)| a != b)
            .and_then(|idx| header.get(idx).copied())
            .unwrap_or("row");
        panic!(
            "{}: row {row} differs in {column}\n  expected: {want}\n  actual:   {got}",
            path.display()
        );
    }
    assert_eq!(
        expected.len(),
        actual.len(),
        "{}: row count differs",
        path.display()
    );
}

/// 23 bp chromosome with a T homopolymer at 8-13 and a short mitochondrion.
#[allow(dead_code)]
pub fn test_genome() -> InMemoryGenome {
    //                                     1   5    10   15   20
    InMemoryGenome::from_sequences([("1", "CCTAGGATTTTTTGCACGTCAGT"), ("MT", "GATCACAGG")])
}

#[allow(dead_code)]
pub fn call(gt: &str) -> GenotypeFields {
    GenotypeFields::default().with_gt(parse_gt(gt).expect("valid GT"))
}

#[allow(dead_code)]
pub const INDIVIDUAL: SampleId = SampleId(1);
#[allow(dead_code)]
pub const POOL: SampleId = SampleId(2);

/// Store with one individual (coverage over all of chromosome 1, a het
/// deletion and a hom SNV) and one pool of 10 without coverage profile
/// (AC-based deletion and insertion, spelled differently than canonical).
#[allow(dead_code)]
pub fn populated_store(genome: &InMemoryGenome) -> (MemoryStore, Vec<Sample>) {
    let store = MemoryStore::new();
    let aliases = ChromosomeAliases::default();
    let ctx = NormalizationContext::new(&aliases).with_genome(genome);
    let options = ImportOptions::default();

    import_coverage(
        &store,
        &ctx,
        INDIVIDUAL,
        DataSourceId(1),
        vec![Ok(RegionRecord::new("chr1", 0, 23))],
        &options,
    )
    .expect("coverage import");

    let individual = vec![
        Ok(VariantRecord::new("chr1", 12, "TT", ["T"]).with_call(call("0/1"))),
        Ok(VariantRecord::new("1", 16, "A", ["G"]).with_call(call("1/1"))),
    ];
    import_variation(&store, &ctx, INDIVIDUAL, DataSourceId(2), individual, &options)
        .expect("individual import");

    let pooled = vec![
        Ok(VariantRecord::new("1", 7, "AT", ["A"]).with_allele_counts(vec![3])),
        Ok(VariantRecord::new("1", 13, "T", ["TT"]).with_allele_counts(vec![2])),
    ];
    let pooled_options = ImportOptions {
        use_genotypes: false,
        ..options
    };
    import_variation(&store, &ctx, POOL, DataSourceId(3), pooled, &pooled_options)
        .expect("pool import");

    (store, vec![Sample::individual(INDIVIDUAL), Sample::pooled(POOL, 10)])
}
