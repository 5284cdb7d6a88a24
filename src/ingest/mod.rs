//! Incremental import of parsed VCF and BED records.
//!
//! Text parsing happens elsewhere; this module receives field values,
//! canonicalizes and bins them, and writes rows through an [`ImportTarget`]
//! one at a time so large files never have to fit in memory.

mod digest;
mod import;
mod records;

pub use digest::{digest, digest_path, Digest, CHUNK_SIZE};
pub use import::{
    import_coverage, import_variation, ImportError, ImportOptions, ImportSummary, ImportTarget,
};
pub use records::{RegionRecord, VariantRecord};
