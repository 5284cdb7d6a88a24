#[path = "common/mod.rs"]
mod common;
use common::{call, populated_store, test_genome, INDIVIDUAL, POOL};

use std::sync::Arc;
use std::thread;

use varda::frequency::{calculate_frequency, DataSourceId, MemoryStore, Sample, SampleId};
use varda::ingest::{
    import_coverage, import_variation, ImportError, ImportOptions, ImportTarget, RegionRecord,
    VariantRecord,
};
use varda::variant::{ChromosomeAliases, NormalizationContext, ReferenceMismatch, Variant, Zygosity};

#[test]
fn frequencies_are_carriers_over_coverage() {
    let genome = test_genome();
    let (store, samples) = populated_store(&genome);
    let snapshot = store.snapshot().unwrap();

    let deletion = Variant::new("1", 8, "T", "");
    let result = calculate_frequency(&snapshot, &deletion, &samples).unwrap();
    assert_eq!(result.coverage, 11);
    assert!((result.ratio(Zygosity::Heterozygous) - 1.0 / 11.0).abs() < 1e-12);
    assert!((result.ratio(Zygosity::Unknown) - 3.0 / 11.0).abs() < 1e-12);
    assert_eq!(result.ratio(Zygosity::Homozygous), 0.0);

    let only_individual = calculate_frequency(&snapshot, &deletion, &samples[..1]).unwrap();
    assert_eq!(only_individual.coverage, 1);
    assert_eq!(only_individual.ratio(Zygosity::Heterozygous), 1.0);
    assert_eq!(only_individual.ratio(Zygosity::Unknown), 0.0);
}

#[test]
fn no_samples_means_zero_coverage() {
    let genome = test_genome();
    let (store, _) = populated_store(&genome);
    let snapshot = store.snapshot().unwrap();

    let result = calculate_frequency(&snapshot, &Variant::new("1", 16, "A", "G"), &[]).unwrap();
    assert_eq!(result.coverage, 0);
    for zygosity in Zygosity::ALL {
        assert_eq!(result.ratio(zygosity), 0.0);
    }
}

#[test]
fn uncovered_chromosome_has_zero_coverage() {
    let genome = test_genome();
    let (store, _) = populated_store(&genome);
    let snapshot = store.snapshot().unwrap();

    let samples = [Sample::individual(INDIVIDUAL)];
    let result = calculate_frequency(&snapshot, &Variant::new("MT", 3, "T", "C"), &samples).unwrap();
    assert_eq!(result.coverage, 0);
    assert_eq!(result.total(), 0.0);
}

#[test]
fn second_import_of_same_source_is_rejected() {
    let genome = test_genome();
    let (store, _) = populated_store(&genome);
    let aliases = ChromosomeAliases::default();
    let ctx = NormalizationContext::new(&aliases).with_genome(&genome);

    let records = vec![Ok(VariantRecord::new("1", 20, "C", ["A"]).with_call(call("0/1")))];
    let err = import_variation(&store, &ctx, INDIVIDUAL, DataSourceId(2), records, &ImportOptions::default())
        .unwrap_err();
    assert_eq!(
        err,
        ImportError::AlreadyImported {
            sample: INDIVIDUAL,
            data_source: DataSourceId(2)
        }
    );

    let regions = vec![Ok(RegionRecord::new("1", 0, 5))];
    let err = import_coverage(&store, &ctx, INDIVIDUAL, DataSourceId(1), regions, &ImportOptions::default())
        .unwrap_err();
    assert!(matches!(err, ImportError::AlreadyImported { .. }));
}

#[test]
fn reference_mismatch_rolls_back_partial_import() {
    let genome = test_genome();
    let store = MemoryStore::new();
    let aliases = ChromosomeAliases::default();
    let ctx = NormalizationContext::new(&aliases).with_genome(&genome);
    let source = DataSourceId(9);

    let records = vec![
        Ok(VariantRecord::new("1", 16, "A", ["G"]).with_call(call("0/1"))),
        Ok(VariantRecord::new("1", 20, "C", ["A"]).with_call(call("1/1"))),
        Ok(VariantRecord::new("1", 21, "G", ["T"]).with_call(call("0/1"))),
    ];
    let err = import_variation(&store, &ctx, INDIVIDUAL, source, records, &ImportOptions::default())
        .unwrap_err();
    assert!(matches!(
        err,
        ImportError::ReferenceMismatch(ReferenceMismatch::SequenceMismatch { position: 21, .. })
    ));
    assert!(!store.has_observations(INDIVIDUAL, source).unwrap());
    assert!(!store.is_imported(INDIVIDUAL, source).unwrap());
    assert_eq!(store.snapshot().unwrap().observation_count(), 0);
}

#[test]
fn reader_failure_rolls_back_and_surfaces_the_error() {
    let genome = test_genome();
    let store = MemoryStore::new();
    let aliases = ChromosomeAliases::default();
    let ctx = NormalizationContext::new(&aliases).with_genome(&genome);

    let records = vec![
        Ok(VariantRecord::new("1", 16, "A", ["G"]).with_call(call("0/1"))),
        Err(ImportError::DataUnavailable("upload vanished".to_string())),
    ];
    let err = import_variation(&store, &ctx, POOL, DataSourceId(4), records, &ImportOptions::default())
        .unwrap_err();
    assert_eq!(err, ImportError::DataUnavailable("upload vanished".to_string()));
    assert_eq!(store.snapshot().unwrap().observation_count(), 0);
}

#[test]
fn records_are_consumed_lazily() {
    let store = MemoryStore::new();
    let aliases = ChromosomeAliases::default();
    let ctx = NormalizationContext::new(&aliases);

    let records = (1..=1000u32).map(|position| {
        Ok(VariantRecord::new("2", position, "A", ["C"]).with_call(call("0/1")))
    });
    let summary =
        import_variation(&store, &ctx, SampleId(5), DataSourceId(5), records, &ImportOptions::default())
            .unwrap();
    assert_eq!(summary.records, 1000);
    assert_eq!(summary.written, 1000);
    assert_eq!(summary.skipped, 0);
}

#[test]
fn snapshots_stay_consistent_under_concurrent_imports() {
    let store = Arc::new(MemoryStore::new());
    let aliases = ChromosomeAliases::default();
    let variant = Variant::new("1", 100, "A", "G");

    let writers: Vec<_> = (1..=8u32)
        .map(|id| {
            let store = Arc::clone(&store);
            let aliases = aliases.clone();
            thread::spawn(move || {
                let ctx = NormalizationContext::new(&aliases);
                let options = ImportOptions::default();
                import_coverage(
                    &*store,
                    &ctx,
                    SampleId(id),
                    DataSourceId(id),
                    vec![Ok(RegionRecord::new("1", 0, 1000))],
                    &options,
                )
                .unwrap();
                let record = VariantRecord::new("1", 100, "A", ["G"]).with_call(call("1/1"));
                import_variation(
                    &*store,
                    &ctx,
                    SampleId(id),
                    DataSourceId(100 + id),
                    vec![Ok(record)],
                    &options,
                )
                .unwrap();
            })
        })
        .collect();

    let samples: Vec<Sample> = (1..=8).map(|id| Sample::individual(SampleId(id))).collect();
    for _ in 0..50 {
        let snapshot = store.snapshot().unwrap();
        let result = calculate_frequency(&snapshot, &variant, &samples).unwrap();
        assert!(result.total() <= 1.0 + 1e-12, "frequency above 1: {result:?}");
    }

    for writer in writers {
        writer.join().unwrap();
    }
    let snapshot = store.snapshot().unwrap();
    let result = calculate_frequency(&snapshot, &variant, &samples).unwrap();
    assert_eq!(result.coverage, 8);
    assert_eq!(result.ratio(Zygosity::Homozygous), 1.0);
}
