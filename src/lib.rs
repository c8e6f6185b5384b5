// Clippy allows for the whole crate
#![allow(clippy::too_many_arguments)]

//! gff-window: score GFF records over genomic windows.
//!
//! Records of a GFF input are aggregated over either fixed-width sliding
//! windows or the loci of an annotation file, and every window with data
//! becomes one GFF record of the output.
//!
//! # Features
//!
//! - **Four scoring schemes**: methylation ratio, sum, mean with variance,
//!   and per-position nucleotide frequency
//! - **Two search modes**: sorted in-memory binary search, or a linear
//!   re-scan of the input for memory-bound runs
//! - **Streaming I/O**: one sequence is held in memory at a time
//!
//! # Example
//!
//! ```rust,no_run
//! use gff_window::{commands::ScoreCommand, config::ScoreConfig, scoring::Scheme};
//!
//! let config = ScoreConfig::new().with_width(100).with_step(50).with_scheme(Scheme::Average);
//! let cmd = ScoreCommand::new(config).unwrap();
//! let stats = cmd.run("reads.gff", std::io::stdout().lock()).unwrap();
//! eprintln!("{} windows", stats.windows);
//! ```

pub mod attribute;
pub mod commands;
pub mod config;
pub mod genome;
pub mod gff;
pub mod index;
pub mod interval;
pub mod scoring;
pub mod search;
pub mod streaming;
pub mod window;

// Re-export commonly used types
pub use gff::{GffError, GffReader, GffRecord};
pub use index::SequenceIndex;
pub use interval::{Strand, SubRange};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::commands::{ScoreCommand, ScoreStats};
    pub use crate::config::ScoreConfig;
    pub use crate::genome::{GenomeTable, ReferenceGenome};
    pub use crate::gff::{GffError, GffReader, GffRecord, GffSource};
    pub use crate::index::SequenceIndex;
    pub use crate::interval::{Strand, SubRange};
    pub use crate::scoring::{Aggregator, Scheme, ScoreResult, WindowScorer};
    pub use crate::search::RangeSearch;
    pub use crate::window::{LocusIndex, SlidingWindows, Window};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_basic_workflow() {
        use crate::prelude::*;

        let content = "chr1\ts\tf\t10\t10\t4\t+\t.\t.\nchr1\ts\tf\t20\t20\t8\t+\t.\t.\n";
        let config = ScoreConfig::new().with_width(50).with_scheme(Scheme::Average);
        let cmd = ScoreCommand::new(config).unwrap();

        let mut out = Vec::new();
        let stats = cmd.run_source(content.as_bytes(), None, &mut out).unwrap();

        assert_eq!(stats.lines, 1);
        let line = String::from_utf8(out).unwrap();
        assert!(line.starts_with("chr1\tdzlab\tw50\t1\t20\t6.0\t"));
    }

    #[test]
    fn test_search_workflow() {
        use crate::prelude::*;

        let content = "chr1\ts\tf\t100\t200\t1\t+\t.\t.\nchr1\ts\tf\t300\t400\t1\t+\t.\t.\n";
        let records = GffReader::new(content.as_bytes()).sequence_records("chr1");
        let index = SequenceIndex::from_records("chr1", records).unwrap();

        let search: RangeSearch<'_> = RangeSearch::Binary(&index);
        let window = Window::single(150, 250);
        assert_eq!(search.window(&window).count(), 1);
    }
}
