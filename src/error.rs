//! Error types for trivar.
//!
//! Candidate-transcript evaluation distinguishes errors that skip a single
//! candidate (incompatible transcript, unknown chromosome, sequence
//! retrieval) from errors that abort the whole query. The orchestrator in
//! [`crate::annotate`] routes on these variants; see `is_candidate_skip`.

use thiserror::Error;

/// Main error type for trivar operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrivarError {
    /// The candidate transcript cannot represent the query: name filter,
    /// reference sequence, amino-acid or position mismatch.
    #[error("incompatible transcript: {reason}")]
    IncompatibleTranscript { reason: String },

    /// Chromosome token not present in the reference genome.
    #[error("unknown chromosome: {chrm}")]
    UnknownChromosome { chrm: String },

    /// Reference sequence could not be materialized for a transcript.
    #[error("sequence retrieval failed for {name}: {msg}")]
    SequenceRetrieval { name: String, msg: String },

    /// The codon window over `beg..=end` does not cover whole codons because
    /// the coding sequence is shorter than expected. Downgraded by callers to
    /// an informational tag on the output record.
    #[error("codon window {beg}-{end} extends past coding sequence of length {seq_len}")]
    TruncatedRefSeq { beg: i64, end: i64, seq_len: usize },

    /// Query string could not be parsed.
    #[error("invalid input at position {pos}: {msg}")]
    InvalidInput { pos: usize, msg: String },

    /// The variant kind parses but has no annotation path in this crate.
    #[error("unsupported variant type: {kind}")]
    UnsupportedVariant { kind: String },

    /// File IO error.
    #[error("IO error: {msg}")]
    Io { msg: String },

    /// JSON (de)serialization error.
    #[error("JSON error: {msg}")]
    Json { msg: String },
}

impl TrivarError {
    /// Shorthand for an incompatible-transcript error.
    pub fn incompatible(reason: impl Into<String>) -> Self {
        TrivarError::IncompatibleTranscript {
            reason: reason.into(),
        }
    }

    /// Shorthand for an input parse error.
    pub fn invalid_input(pos: usize, msg: impl Into<String>) -> Self {
        TrivarError::InvalidInput {
            pos,
            msg: msg.into(),
        }
    }

    /// Whether this error skips the current candidate transcript rather than
    /// aborting the query. Unknown chromosomes are skip-level here; the
    /// genomic path fetches before iterating candidates, so the same error
    /// surfaces there as query-fatal.
    pub fn is_candidate_skip(&self) -> bool {
        matches!(
            self,
            TrivarError::IncompatibleTranscript { .. }
                | TrivarError::UnknownChromosome { .. }
                | TrivarError::SequenceRetrieval { .. }
        )
    }
}

impl From<std::io::Error> for TrivarError {
    fn from(err: std::io::Error) -> Self {
        TrivarError::Io {
            msg: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for TrivarError {
    fn from(err: serde_json::Error) -> Self {
        TrivarError::Json {
            msg: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_skip_classification() {
        assert!(TrivarError::incompatible("name unmatched").is_candidate_skip());
        assert!(TrivarError::UnknownChromosome {
            chrm: "chrZ".to_string()
        }
        .is_candidate_skip());
        assert!(TrivarError::SequenceRetrieval {
            name: "NM_1.1".to_string(),
            msg: "short read".to_string()
        }
        .is_candidate_skip());

        assert!(!TrivarError::TruncatedRefSeq {
            beg: 10,
            end: 12,
            seq_len: 9
        }
        .is_candidate_skip());
        assert!(!TrivarError::invalid_input(0, "garbage").is_candidate_skip());
    }

    #[test]
    fn test_display_carries_payload() {
        let err = TrivarError::TruncatedRefSeq {
            beg: 4,
            end: 9,
            seq_len: 7,
        };
        let msg = err.to_string();
        assert!(msg.contains("4-9"));
        assert!(msg.contains('7'));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing db");
        let err: TrivarError = io_err.into();
        assert!(matches!(err, TrivarError::Io { .. }));
        assert!(err.to_string().contains("missing db"));
    }
}
