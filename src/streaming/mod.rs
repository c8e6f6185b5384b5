//! Low-level streaming utilities.
//!
//! - Allocation-free GFF line splitting
//! - Buffered GFF output formatting

pub mod output;
pub mod parsing;

pub use output::GffWriter;
pub use parsing::{is_comment, parse_u64_fast, split_gff_fields, trim_line_end, GFF_FIELDS};
