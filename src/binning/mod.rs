//! Hierarchical interval binning.
//!
//! Regions are assigned the finest bin that fully contains them when they are
//! stored. An overlap query then only needs to inspect rows whose bin is in
//! [`all_bins`] of the query region, instead of scanning the whole chromosome.
//!
//! Positions are 1-based and inclusive throughout this module.

mod scheme;

pub use scheme::{
    all_bins, assign_bin, containing_bins, covered_region, BinningError, BinningScheme,
};
