use proptest::prelude::*;
use varda::binning::{all_bins, assign_bin, containing_bins, covered_region, BinningScheme};
use varda::variant::GenomicInterval;

const MAX: u32 = 1 << 29;

fn interval() -> impl Strategy<Value = (u32, u32)> {
    (1u32..=MAX).prop_flat_map(|begin| {
        let span = prop_oneof![0u32..16, 0u32..200_000, 0u32..5_000_000];
        span.prop_map(move |len| (begin, begin.saturating_add(len).min(MAX)))
    })
}

#[test]
fn half_open_seam_matches_inclusive_bins() {
    // BED [99, 200) is positions 100..=200.
    let interval = GenomicInterval::from_half_open("1", 99, 200).unwrap();
    assert_eq!(interval.bin().unwrap(), assign_bin(100, 200).unwrap());
    assert_eq!(interval.all_bins().unwrap(), all_bins(100, 200).unwrap());

    let boundary = GenomicInterval::from_half_open("1", 1 << 17, (1 << 17) + 1).unwrap();
    assert_eq!(boundary.bin().unwrap(), 586);
}

proptest! {
    #[test]
    fn assigned_bin_is_among_own_overlap_bins((begin, end) in interval()) {
        let bin = assign_bin(begin, end).unwrap();
        prop_assert!(all_bins(begin, end).unwrap().contains(&bin));
        prop_assert_eq!(containing_bins(begin, end).unwrap()[0], bin);
    }

    #[test]
    fn overlapping_intervals_are_never_pruned(
        (a_begin, a_end) in interval(),
        offset in 0u32..1_000_000,
        len in 0u32..1_000_000,
    ) {
        // B starts inside A, so the two overlap.
        let b_begin = a_begin + offset.min(a_end - a_begin);
        let b_end = b_begin.saturating_add(len).min(MAX);

        let a_bin = assign_bin(a_begin, a_end).unwrap();
        let b_bin = assign_bin(b_begin, b_end).unwrap();
        prop_assert!(all_bins(b_begin, b_end).unwrap().contains(&a_bin));
        prop_assert!(all_bins(a_begin, a_end).unwrap().contains(&b_bin));
    }

    #[test]
    fn covered_region_contains_interval((begin, end) in interval()) {
        let (first, last) = covered_region(assign_bin(begin, end).unwrap()).unwrap();
        prop_assert!(first <= begin && end <= last);
    }

    #[test]
    fn all_bins_ordered_finest_first_without_duplicates((begin, end) in interval()) {
        let bins = all_bins(begin, end).unwrap();
        let mut seen = std::collections::HashSet::new();
        prop_assert!(bins.iter().all(|bin| seen.insert(*bin)));
        prop_assert_eq!(*bins.last().unwrap(), 0);
        let level = |bin: u32| [585, 73, 9, 1, 0].iter().position(|&offset| bin >= offset);
        for pair in bins.windows(2) {
            let (a, b) = (level(pair[0]), level(pair[1]));
            prop_assert!(a < b || (a == b && pair[0] < pair[1]));
        }
    }

    #[test]
    fn extended_scheme_agrees_on_fine_bins((begin, end) in interval()) {
        let ucsc = BinningScheme::UCSC.assign_bin(begin, end).unwrap();
        let extended = BinningScheme::EXTENDED.assign_bin(begin, end).unwrap();
        let (u_first, u_last) = BinningScheme::UCSC.covered_region(ucsc).unwrap();
        let (e_first, e_last) = BinningScheme::EXTENDED.covered_region(extended).unwrap();
        prop_assert_eq!((u_first, u_last), (e_first, e_last));
    }
}
