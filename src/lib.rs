//! trivar: multi-coordinate variant annotator
//!
//! Translates a variant described in one coordinate space (genomic, transcript,
//! or protein) into a normalized representation in all three spaces, using
//! HGVS-style nomenclature. Ambiguous targets are resolved by evaluating every
//! matching transcript independently, one output line per compatible
//! transcript.
//!
//! # Example
//!
//! ```
//! use trivar::{annotate_query, parse_query, MockProvider, TranscriptDb};
//!
//! let db = TranscriptDb::with_test_data();
//! let provider = MockProvider::with_test_data();
//!
//! let query = parse_query("NM_0001.2:c.49_51AAA>TTT").unwrap();
//! let records = annotate_query(&query, &db, &provider).unwrap();
//!
//! assert_eq!(records[0].taa(), "p.K17F");
//! println!("{}", records[0].format_line(Some(&query.op)));
//! ```

pub mod annotate;
pub mod batch;
pub mod codon;
pub mod error;
pub mod pos;
pub mod query;
pub mod record;
pub mod reference;
pub mod region;
pub mod seq;

// Re-export commonly used types
pub use annotate::annotate_query;
pub use batch::{process_line, process_reader, BatchSummary};
pub use error::TrivarError;
pub use pos::Pos;
pub use query::{parse_query, Query, QueryKind};
pub use record::{Record, HEADER};
pub use reference::{GenomeProvider, MockProvider, TranscriptDb};

/// Result type alias for trivar operations
pub type Result<T> = std::result::Result<T, TrivarError>;
