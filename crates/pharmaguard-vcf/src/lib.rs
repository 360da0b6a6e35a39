//! pharmaguard-vcf — Variant Call Format reader.
//!
//! Turns raw VCF text into a lazy stream of [`VariantRecord`]s. Reference-only
//! calls and malformed lines never reach the caller; they are tallied in
//! [`ParseStats`] instead.
//!
//! ```ignore
//! let mut reader = VcfReader::from_text(&text)?;
//! for record in reader.by_ref() {
//!     // match record against the catalog ...
//! }
//! let stats = reader.finish();
//! ```

pub mod reader;
pub mod record;
pub mod stats;

pub use reader::{VcfHeader, VcfReader};
pub use record::{Genotype, VariantRecord, Zygosity};
pub use stats::ParseStats;
