//! Genome sequence provider trait.

use crate::error::TrivarError;

/// Access to reference genome sequence.
///
/// Implementations might include an in-memory provider for testing or an
/// indexed-FASTA reader for production genomes.
pub trait GenomeProvider {
    /// Fetch genomic sequence for a chromosome span.
    ///
    /// # Arguments
    ///
    /// * `chrm` - chromosome token (e.g., "chr1")
    /// * `beg` - 1-based start position (inclusive)
    /// * `end` - 1-based end position (inclusive)
    ///
    /// Fails with [`TrivarError::UnknownChromosome`] for an unrecognized
    /// chromosome token.
    fn fetch_sequence(&self, chrm: &str, beg: u64, end: u64) -> Result<String, TrivarError>;

    /// Length of a chromosome.
    fn contig_len(&self, chrm: &str) -> Result<u64, TrivarError>;

    /// Check whether a chromosome is known.
    fn has_contig(&self, chrm: &str) -> bool {
        self.contig_len(chrm).is_ok()
    }
}

/// Blanket implementation for boxed trait objects.
impl GenomeProvider for Box<dyn GenomeProvider> {
    fn fetch_sequence(&self, chrm: &str, beg: u64, end: u64) -> Result<String, TrivarError> {
        (**self).fetch_sequence(chrm, beg, end)
    }

    fn contig_len(&self, chrm: &str) -> Result<u64, TrivarError> {
        (**self).contig_len(chrm)
    }

    fn has_contig(&self, chrm: &str) -> bool {
        (**self).has_contig(chrm)
    }
}
