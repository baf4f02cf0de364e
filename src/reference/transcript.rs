//! Transcript and exon models.
//!
//! # Coordinate systems
//!
//! | Field | Basis | Notes |
//! |-------|-------|-------|
//! | `Exon.beg`, `Exon.end` | 1-based genomic | inclusive, ascending order |
//! | `Transcript.cds_beg`, `cds_end` | 1-based genomic | inclusive CDS bounds |
//! | transcript index ("tidx") | 1-based | position along the spliced transcript |
//! | CDS position ([`Pos`]) | 1-based | anchored at the CDS start, see [`crate::pos`] |
//!
//! Structural caches (spliced sequence, position array, CDS bounds) are
//! materialized lazily and reset on clone.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::OnceLock;

use crate::codon::codon2aa;
use crate::error::TrivarError;
use crate::pos::{same_intron, Pos};
use crate::reference::provider::GenomeProvider;
use crate::region::{RegAnno, RegSpanAnno, SpliceSite};
use crate::seq::reverse_complement;

/// Strand orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Strand {
    #[serde(rename = "+")]
    #[default]
    Plus,
    #[serde(rename = "-")]
    Minus,
}

impl Strand {
    /// Direction of transcript-relative offsets in genomic space.
    pub fn sign(&self) -> i64 {
        match self {
            Strand::Plus => 1,
            Strand::Minus => -1,
        }
    }
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strand::Plus => write!(f, "+"),
            Strand::Minus => write!(f, "-"),
        }
    }
}

/// An exon in genomic coordinates (1-based, inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exon {
    pub beg: u64,
    pub end: u64,
}

impl Exon {
    pub fn new(beg: u64, end: u64) -> Self {
        Self { beg, end }
    }

    pub fn len(&self) -> u64 {
        if self.end >= self.beg {
            self.end - self.beg + 1
        } else {
            0
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, gpos: u64) -> bool {
        gpos >= self.beg && gpos <= self.end
    }
}

/// The gene owning a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Gene {
    pub name: String,
    /// Database cross-reference (e.g., an Entrez id), reported in the info
    /// column when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dbxref: Option<String>,
}

/// Tie-break for intronic genomic positions: an intronic base can anchor to
/// either flanking exon; the policy picks the anchor by genomic coordinate.
/// A span's lower boundary anchors toward the genomically-greater exon and
/// the upper boundary toward the smaller, so both resolve into the span's
/// interior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntronicPolicy {
    GreaterGenomic,
    SmallerGenomic,
}

/// Result of re-translating a frameshifted downstream sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameshiftOutcome {
    /// 1-based codon index of the first changed residue.
    pub taa_pos: i64,
    /// Reference residue at that codon.
    pub taa_ref: char,
    /// First altered residue.
    pub taa_alt: char,
    /// Number of residues from the changed position to the new stop codon
    /// (inclusive); `None` when the alternate frame runs off the end of the
    /// known sequence without terminating.
    pub term_len: Option<i64>,
}

/// A transcript with its exon structure and genomic CDS bounds.
#[derive(Debug, Serialize, Deserialize)]
pub struct Transcript {
    /// Accession (e.g., "NM_000088.3").
    pub name: String,
    pub gene: Gene,
    /// Chromosome token (e.g., "chr17").
    pub chrm: String,
    pub strand: Strand,
    /// Exons in ascending genomic order.
    pub exons: Vec<Exon>,
    /// Genomic CDS start (1-based, inclusive; the smaller coordinate).
    pub cds_beg: u64,
    /// Genomic CDS end (1-based, inclusive; the larger coordinate).
    pub cds_end: u64,

    /// Spliced transcript sequence in transcript orientation, fetched on
    /// first use.
    #[serde(skip)]
    seq: OnceLock<String>,
    /// Genomic coordinate of each transcript base, in transcript order.
    #[serde(skip)]
    npos: OnceLock<Vec<u64>>,
    /// Transcript indices of the CDS bounds; `None` when the CDS bounds do
    /// not land on exonic bases.
    #[serde(skip)]
    cds_tx: OnceLock<Option<(u64, u64)>>,
}

impl Clone for Transcript {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            gene: self.gene.clone(),
            chrm: self.chrm.clone(),
            strand: self.strand,
            exons: self.exons.clone(),
            cds_beg: self.cds_beg,
            cds_end: self.cds_end,
            // caches reset on clone, re-materialized lazily
            seq: OnceLock::new(),
            npos: OnceLock::new(),
            cds_tx: OnceLock::new(),
        }
    }
}

impl PartialEq for Transcript {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.gene == other.gene
            && self.chrm == other.chrm
            && self.strand == other.strand
            && self.exons == other.exons
            && self.cds_beg == other.cds_beg
            && self.cds_end == other.cds_end
    }
}

impl Eq for Transcript {}

impl Transcript {
    pub fn new(
        name: impl Into<String>,
        gene: Gene,
        chrm: impl Into<String>,
        strand: Strand,
        exons: Vec<Exon>,
        cds_beg: u64,
        cds_end: u64,
    ) -> Self {
        Self {
            name: name.into(),
            gene,
            chrm: chrm.into(),
            strand,
            exons,
            cds_beg,
            cds_end,
            seq: OnceLock::new(),
            npos: OnceLock::new(),
            cds_tx: OnceLock::new(),
        }
    }

    /// Genomic start of the transcript span.
    pub fn genomic_beg(&self) -> u64 {
        self.exons.first().map(|e| e.beg).unwrap_or(0)
    }

    /// Genomic end of the transcript span.
    pub fn genomic_end(&self) -> u64 {
        self.exons.last().map(|e| e.end).unwrap_or(0)
    }

    /// Whether a genomic position falls within the transcript span
    /// (introns included).
    pub fn contains_gpos(&self, gpos: u64) -> bool {
        gpos >= self.genomic_beg() && gpos <= self.genomic_end()
    }

    /// Whether the transcript span overlaps a genomic interval.
    pub fn overlaps(&self, chrm: &str, beg: u64, end: u64) -> bool {
        self.chrm == chrm && beg <= self.genomic_end() && end >= self.genomic_beg()
    }

    /// Spliced transcript length.
    pub fn tx_len(&self) -> u64 {
        self.exons.iter().map(|e| e.len()).sum()
    }

    pub fn exon_count(&self) -> u32 {
        self.exons.len() as u32
    }

    /// Exons in transcript order (5' to 3').
    fn tx_exons(&self) -> Box<dyn Iterator<Item = &Exon> + '_> {
        match self.strand {
            Strand::Plus => Box::new(self.exons.iter()),
            Strand::Minus => Box::new(self.exons.iter().rev()),
        }
    }

    /// Genomic coordinate of each transcript base, in transcript order.
    pub fn position_array(&self) -> &[u64] {
        self.npos.get_or_init(|| {
            let mut np = Vec::with_capacity(self.tx_len() as usize);
            for exon in self.tx_exons() {
                match self.strand {
                    Strand::Plus => np.extend(exon.beg..=exon.end),
                    Strand::Minus => np.extend((exon.beg..=exon.end).rev()),
                }
            }
            np
        })
    }

    /// Transcript indices (1-based) of the CDS start and end in transcript
    /// orientation. Fails when a CDS bound is not exonic.
    fn cds_tx_bounds(&self) -> Result<(u64, u64), TrivarError> {
        let cached = self.cds_tx.get_or_init(|| {
            let np = self.position_array();
            let (start_g, end_g) = match self.strand {
                Strand::Plus => (self.cds_beg, self.cds_end),
                Strand::Minus => (self.cds_end, self.cds_beg),
            };
            let start = np.iter().position(|&g| g == start_g)?;
            let end = np.iter().position(|&g| g == end_g)?;
            Some((start as u64 + 1, end as u64 + 1))
        });
        (*cached).ok_or_else(|| {
            TrivarError::incompatible(format!("CDS bounds of {} not exonic", self.name))
        })
    }

    /// Length of the coding sequence.
    pub fn cds_len(&self) -> Result<u64, TrivarError> {
        let (start, end) = self.cds_tx_bounds()?;
        Ok(end - start + 1)
    }

    /// Materialize the spliced transcript sequence (transcript orientation).
    /// Idempotent; fetch failures surface as sequence-retrieval errors,
    /// unknown chromosomes pass through unchanged.
    pub fn ensure_seq<P: GenomeProvider>(&self, provider: &P) -> Result<&str, TrivarError> {
        if let Some(seq) = self.seq.get() {
            return Ok(seq);
        }
        let mut genomic = String::with_capacity(self.tx_len() as usize);
        for exon in &self.exons {
            let piece = provider
                .fetch_sequence(&self.chrm, exon.beg, exon.end)
                .map_err(|e| match e {
                    TrivarError::UnknownChromosome { .. } => e,
                    other => TrivarError::SequenceRetrieval {
                        name: self.name.clone(),
                        msg: other.to_string(),
                    },
                })?;
            genomic.push_str(&piece);
        }
        let spliced = match self.strand {
            Strand::Plus => genomic,
            Strand::Minus => reverse_complement(&genomic),
        };
        Ok(self.seq.get_or_init(|| spliced))
    }

    /// The coding portion of the spliced sequence.
    pub fn cds_seq<P: GenomeProvider>(&self, provider: &P) -> Result<&str, TrivarError> {
        let (start, end) = self.cds_tx_bounds()?;
        let seq = self.ensure_seq(provider)?;
        Ok(&seq[(start - 1) as usize..end as usize])
    }

    /// Transcript index of a CDS-anchored position's anchor base.
    fn cds_pos_tidx(&self, pos: &Pos) -> Result<u64, TrivarError> {
        let (start, end) = self.cds_tx_bounds()?;
        let tidx = if pos.utr3 {
            end as i64 + pos.base
        } else if pos.base < 0 {
            start as i64 + pos.base
        } else if pos.base > 0 {
            start as i64 + pos.base - 1
        } else {
            return Err(TrivarError::incompatible("position 0 does not exist"));
        };
        if tidx < 1 || tidx > self.tx_len() as i64 {
            return Err(TrivarError::incompatible(format!(
                "position {} outside transcript {}",
                pos, self.name
            )));
        }
        Ok(tidx as u64)
    }

    /// CDS-anchored position of a transcript index (offset 0).
    fn tidx_to_cds_pos(&self, tidx: u64) -> Result<Pos, TrivarError> {
        let (start, end) = self.cds_tx_bounds()?;
        let tidx = tidx as i64;
        Ok(if tidx < start as i64 {
            Pos::exonic(tidx - start as i64)
        } else if tidx > end as i64 {
            Pos::utr3(tidx - end as i64)
        } else {
            Pos::exonic(tidx - start as i64 + 1)
        })
    }

    /// Map a transcript-space position to its genomic coordinate.
    pub fn tnuc2gnuc(&self, pos: &Pos) -> Result<u64, TrivarError> {
        let tidx = self.cds_pos_tidx(pos)?;
        let anchor = self.position_array()[(tidx - 1) as usize];
        let g = anchor as i64 + self.strand.sign() * pos.offset;
        if g < 1 {
            return Err(TrivarError::incompatible(format!(
                "position {} maps before {} start",
                pos, self.chrm
            )));
        }
        Ok(g as u64)
    }

    /// Map a CDS coordinate range to its genomic range (ascending).
    pub fn tnuc_range2gnuc_range(&self, beg: i64, end: i64) -> Result<(u64, u64), TrivarError> {
        let g1 = self.tnuc2gnuc(&Pos::exonic(beg))?;
        let g2 = self.tnuc2gnuc(&Pos::exonic(end))?;
        Ok((g1.min(g2), g1.max(g2)))
    }

    /// Verify that an intronic position claims a real exon boundary: the
    /// declared intron must actually separate the anchor base from its
    /// transcript neighbor. Exonic positions always pass.
    pub fn check_exon_boundary(&self, pos: &Pos) -> Result<(), TrivarError> {
        if pos.offset == 0 {
            return Ok(());
        }
        let tidx = self.cds_pos_tidx(pos)?;
        let np = self.position_array();
        let i = (tidx - 1) as usize;
        let neighbor = if pos.offset < 0 {
            i.checked_sub(1).and_then(|j| np.get(j))
        } else {
            np.get(i + 1)
        };
        match neighbor {
            Some(&g) if np[i].abs_diff(g) != 1 => Ok(()),
            _ => Err(TrivarError::incompatible(format!(
                "invalid_cDNA_position_{}",
                pos
            ))),
        }
    }

    /// Classify a genomic position into codon index and transcript-space
    /// position. The codon index is present only for positions on a coding
    /// exonic base; intronic positions resolve per the [`IntronicPolicy`].
    pub fn gpos2codon(
        &self,
        gpos: u64,
        policy: IntronicPolicy,
    ) -> Result<(Option<i64>, Pos), TrivarError> {
        let np = self.position_array();
        if let Some(i) = np.iter().position(|&g| g == gpos) {
            let pos = self.tidx_to_cds_pos(i as u64 + 1)?;
            let codon = if !pos.utr3 && pos.base >= 1 {
                Some((pos.base + 2) / 3)
            } else {
                None
            };
            return Ok((codon, pos));
        }

        // Intronic: find the transcript-adjacent pair bracketing gpos.
        let pair = np.windows(2).position(|w| match self.strand {
            Strand::Plus => w[0] < gpos && gpos < w[1] && w[1] - w[0] > 1,
            Strand::Minus => w[0] > gpos && gpos > w[1] && w[0] - w[1] > 1,
        });
        let i = pair.ok_or_else(|| {
            TrivarError::incompatible(format!(
                "genomic position {} outside transcript {}",
                gpos, self.name
            ))
        })?;

        // w[0] is transcript-upstream of the intron, w[1] downstream.
        let anchor_tidx = match (policy, self.strand) {
            (IntronicPolicy::SmallerGenomic, Strand::Plus) => i,
            (IntronicPolicy::GreaterGenomic, Strand::Plus) => i + 1,
            (IntronicPolicy::SmallerGenomic, Strand::Minus) => i + 1,
            (IntronicPolicy::GreaterGenomic, Strand::Minus) => i,
        };
        let anchor_g = np[anchor_tidx] as i64;
        let offset = self.strand.sign() * (gpos as i64 - anchor_g);
        let mut pos = self.tidx_to_cds_pos(anchor_tidx as u64 + 1)?;
        pos.offset = offset;
        Ok((None, pos))
    }

    /// Transcript-order exon index (1-based) containing a transcript index.
    fn exon_index_of_tidx(&self, tidx: u64) -> u32 {
        let mut covered = 0u64;
        for (i, exon) in self.tx_exons().enumerate() {
            covered += exon.len();
            if tidx <= covered {
                return i as u32 + 1;
            }
        }
        self.exon_count()
    }

    /// Transcript-order exon index containing a genomic position, when
    /// exonic.
    pub fn exon_index_at_gpos(&self, gpos: u64) -> Option<u32> {
        for (i, exon) in self.tx_exons().enumerate() {
            if exon.contains(gpos) {
                return Some(i as u32 + 1);
            }
        }
        None
    }

    /// Exon indices covered by a CDS coordinate range.
    pub fn tnuc_range2exon_inds(&self, beg: i64, end: i64) -> Vec<u32> {
        let (Ok(t1), Ok(t2)) = (
            self.cds_pos_tidx(&Pos::exonic(beg)),
            self.cds_pos_tidx(&Pos::exonic(end)),
        ) else {
            return Vec::new();
        };
        let (lo, hi) = (t1.min(t2), t1.max(t2));
        let (e1, e2) = (self.exon_index_of_tidx(lo), self.exon_index_of_tidx(hi));
        (e1.min(e2)..=e1.max(e2)).collect()
    }

    /// Re-translate downstream sequences after a frame-changing edit.
    ///
    /// `old_seq` and `new_seq` start at codon `beg_codon_index` and run to
    /// the end of the known coding sequence. Scans codon-by-codon for the
    /// first changed residue, then continues in the alternate frame until a
    /// stop codon. Returns `None` when translation terminates before any
    /// residue changes.
    pub fn extend_taa_seq(
        &self,
        beg_codon_index: i64,
        old_seq: &str,
        new_seq: &str,
    ) -> Option<FrameshiftOutcome> {
        let ob = old_seq.as_bytes();
        let nb = new_seq.as_bytes();
        let mut diff: Option<(usize, char, char)> = None;

        let mut i = 0usize;
        loop {
            let Some(new_codon) = nb.get(i * 3..i * 3 + 3) else {
                // Alternate frame ran off the known sequence without a stop.
                return diff.map(|(di, taa_ref, taa_alt)| FrameshiftOutcome {
                    taa_pos: beg_codon_index + di as i64,
                    taa_ref,
                    taa_alt,
                    term_len: None,
                });
            };
            let new_aa = codon2aa(std::str::from_utf8(new_codon).ok()?).unwrap_or('X');
            let old_aa = ob
                .get(i * 3..i * 3 + 3)
                .and_then(|c| std::str::from_utf8(c).ok())
                .and_then(codon2aa);

            if diff.is_none() {
                match old_aa {
                    Some(o) if o == new_aa => {}
                    Some(o) => diff = Some((i, o, new_aa)),
                    // Reference frame exhausted with no difference seen: the
                    // edit has no nameable protein-level anchor.
                    None => return None,
                }
            }

            if new_aa == '*' {
                return match diff {
                    // Terminating codon reached before any difference:
                    // nothing happens at the protein level.
                    None => None,
                    Some((di, taa_ref, taa_alt)) => Some(FrameshiftOutcome {
                        taa_pos: beg_codon_index + di as i64,
                        taa_ref,
                        taa_alt,
                        term_len: Some((i + 1 - di) as i64),
                    }),
                };
            }
            i += 1;
        }
    }
}

/// Classify a single genomic point against a transcript.
pub fn describe_point(t: &Arc<Transcript>, gpos: u64) -> RegAnno {
    let mut reg = RegAnno {
        transcript: Some(Arc::clone(t)),
        ..Default::default()
    };

    if !t.contains_gpos(gpos) {
        return reg;
    }

    let in_cds = gpos >= t.cds_beg && gpos <= t.cds_end;
    if !in_cds {
        let before_cds = gpos < t.cds_beg;
        reg.utr = Some(match (before_cds, t.strand) {
            (true, Strand::Plus) | (false, Strand::Minus) => '5',
            _ => '3',
        });
    }

    if let Some(exon) = t.exon_index_at_gpos(gpos) {
        reg.exonic = true;
        reg.exon = Some(exon);
        reg.cds = in_cds;
    } else {
        reg.intronic = true;
        // flanking exons in transcript order
        let (left, right) = match t.strand {
            Strand::Plus => {
                let left = t
                    .exons
                    .iter()
                    .take_while(|e| e.end < gpos)
                    .count() as u32;
                (left, left + 1)
            }
            Strand::Minus => {
                let after = t.exons.iter().filter(|e| e.beg > gpos).count() as u32;
                (after, after + 1)
            }
        };
        reg.intron_exon1 = Some(left);
        reg.intron_exon2 = Some(right);
    }
    reg
}

/// Classify a genomic span against a transcript, collecting the splice
/// sites and CDS termini the span crosses.
pub fn describe_span(t: &Arc<Transcript>, gbeg: u64, gend: u64) -> RegSpanAnno {
    let mut span = RegSpanAnno {
        b1: describe_point(t, gbeg),
        b2: describe_point(t, gend),
        transcript: Some(Arc::clone(t)),
        ..Default::default()
    };

    // Both endpoints inside one intron: no exonic base is touched.
    if let (Ok((_, p1)), Ok((_, p2))) = (
        t.gpos2codon(gbeg, IntronicPolicy::GreaterGenomic),
        t.gpos2codon(gend, IntronicPolicy::SmallerGenomic),
    ) {
        if same_intron(&p1, &p2) {
            return span;
        }
    }

    let n = t.exon_count();
    for (i, exon) in t.tx_exons().enumerate() {
        let idx = i as u32 + 1;
        if exon.beg >= gbeg && exon.end <= gend {
            span.whole_exons.push(idx);
            continue;
        }
        let donor = match t.strand {
            Strand::Plus if idx < n => Some(exon.end + 1),
            Strand::Minus if idx < n => Some(exon.beg - 1),
            _ => None,
        };
        let acceptor = match t.strand {
            Strand::Plus if idx > 1 => Some(exon.beg - 1),
            Strand::Minus if idx > 1 => Some(exon.end + 1),
            _ => None,
        };
        if let Some(pos) = donor {
            if pos >= gbeg && pos <= gend {
                span.splice_donors.push(SpliceSite {
                    exon: idx,
                    chrm: t.chrm.clone(),
                    pos,
                });
            }
        }
        if let Some(pos) = acceptor {
            if pos >= gbeg && pos <= gend {
                span.splice_acceptors.push(SpliceSite {
                    exon: idx,
                    chrm: t.chrm.clone(),
                    pos,
                });
            }
        }
    }

    if gbeg < t.cds_beg && gend >= t.cds_beg {
        span.cds_start_at = Some((t.chrm.clone(), t.cds_beg));
    }
    if gend > t.cds_end && gbeg <= t.cds_end {
        span.cds_end_at = Some((t.chrm.clone(), t.cds_end));
    }

    span
}
