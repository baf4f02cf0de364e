//! Region classification of points and spans against transcript structure.
//!
//! A classified region renders to the canonical strings that appear in the
//! `region` column of the output, e.g. `cds_in_exon_3`,
//! `inside_[intron_between_exon_1_and_2]`, or
//! `from_[5-UTR;noncoding_exon_1]_to_[cds_in_exon_2]`.

use crate::reference::transcript::Transcript;
use std::fmt::Write as _;
use std::sync::Arc;

/// Join region fragments with `;`.
fn append_frag(f: &mut String, frag: &str) {
    if !f.is_empty() {
        f.push(';');
    }
    f.push_str(frag);
}

/// Annotation of a single genomic point relative to one transcript.
#[derive(Debug, Clone, Default)]
pub struct RegAnno {
    pub exonic: bool,
    /// Exon index (1-based, transcript order) when exonic.
    pub exon: Option<u32>,
    /// Whether the point is inside the coding sequence.
    pub cds: bool,
    /// UTR side: `'5'` or `'3'`.
    pub utr: Option<char>,
    pub intronic: bool,
    /// Bounding exon indices when intronic.
    pub intron_exon1: Option<u32>,
    pub intron_exon2: Option<u32>,
    /// Owning transcript, absent for intergenic points.
    pub transcript: Option<Arc<Transcript>>,
}

impl RegAnno {
    pub fn entirely_in_cds(&self) -> bool {
        self.cds
    }

    /// Render the canonical classification fragments, optionally suffixed
    /// with the owning gene name.
    pub fn format(&self, with_name: bool) -> String {
        let mut f = String::new();
        if let Some(side) = self.utr {
            append_frag(&mut f, &format!("{}-UTR", side));
        }
        if self.intronic {
            if let (Some(e1), Some(e2)) = (self.intron_exon1, self.intron_exon2) {
                append_frag(&mut f, &format!("intron_between_exon_{}_and_{}", e1, e2));
            }
        } else if self.exonic {
            if let Some(exon) = self.exon {
                if self.cds {
                    append_frag(&mut f, &format!("cds_in_exon_{}", exon));
                } else {
                    append_frag(&mut f, &format!("noncoding_exon_{}", exon));
                }
            }
        }
        if with_name {
            if let Some(t) = &self.transcript {
                append_frag(&mut f, &t.gene.name);
            }
        }
        f
    }
}

/// Whether two point annotations render identically.
pub fn same_region(r1: &RegAnno, r2: &RegAnno) -> bool {
    r1.format(false) == r2.format(false)
}

/// A splice site touched by a span, with exon index and genomic position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpliceSite {
    pub exon: u32,
    pub chrm: String,
    pub pos: u64,
}

/// Annotation of a two-endpoint genomic span.
#[derive(Debug, Clone, Default)]
pub struct RegSpanAnno {
    pub b1: RegAnno,
    pub b2: RegAnno,
    /// Owning transcript when both boundaries fall in the same transcript.
    pub transcript: Option<Arc<Transcript>>,
    /// Names of genes the span overlaps beyond the boundary transcripts.
    pub spanning: Vec<String>,
    pub long_range: bool,
    /// Donor splice sites crossed by the span.
    pub splice_donors: Vec<SpliceSite>,
    /// Acceptor splice sites crossed by the span.
    pub splice_acceptors: Vec<SpliceSite>,
    /// Exons entirely contained in the span.
    pub whole_exons: Vec<u32>,
    /// CDS start crossed at this genomic position.
    pub cds_start_at: Option<(String, u64)>,
    /// CDS end crossed at this genomic position.
    pub cds_end_at: Option<(String, u64)>,
}

impl RegSpanAnno {
    pub fn in_utr(&self) -> bool {
        self.b1.utr.is_some() && self.b1.utr == self.b2.utr
    }

    pub fn in_exon(&self) -> bool {
        self.b1.exonic && self.b2.exonic && self.b1.exon == self.b2.exon
    }

    /// Both boundaries coding and in the same exon. A span crossing exon
    /// boundaries is never entirely-in-CDS, even when both ends are coding.
    pub fn entirely_in_cds(&self) -> bool {
        self.b1.cds && self.b2.cds && self.b1.exon == self.b2.exon
    }

    pub fn in_intron(&self) -> bool {
        self.b1.intronic
            && self.b2.intronic
            && self.b1.intron_exon1 == self.b2.intron_exon1
            && self.b1.intron_exon2 == self.b2.intron_exon2
    }

    /// Whether the span touches any splice site or CDS terminus.
    pub fn has_splice_effect(&self) -> bool {
        !self.splice_donors.is_empty()
            || !self.splice_acceptors.is_empty()
            || !self.whole_exons.is_empty()
            || self.cds_start_at.is_some()
            || self.cds_end_at.is_some()
    }

    pub fn format(&self) -> String {
        // neither boundary classifiable: a long-range span over the genes in
        // the middle
        if self.b1.format(false).is_empty() && self.b2.format(false).is_empty() {
            let mut s = "long_range".to_string();
            if !self.spanning.is_empty() {
                if self.spanning.len() <= 5 {
                    let _ = write!(s, "_spanning_[{}]", self.spanning.join(","));
                } else {
                    let _ = write!(s, "_spanning_[{}_genes]", self.spanning.len());
                }
            }
            return s;
        }

        if same_region(&self.b1, &self.b2) {
            return format!("inside_[{}]", self.b1.format(false));
        }

        let same_transcript = match (&self.b1.transcript, &self.b2.transcript) {
            (Some(t1), Some(t2)) => t1.name == t2.name,
            _ => false,
        };
        let mut s = if same_transcript {
            format!(
                "from_[{}]_to_[{}]",
                self.b1.format(false),
                self.b2.format(false)
            )
        } else {
            format!(
                "from_[{}]_to_[{}]",
                self.b1.format(true),
                self.b2.format(true)
            )
        };
        if !self.spanning.is_empty() {
            if self.spanning.len() <= 5 {
                let _ = write!(s, "_spanning_[{}]", self.spanning.join(","));
            } else {
                let _ = write!(s, "_spanning_[{}_genes]", self.spanning.len());
            }
        }
        s
    }
}

/// Annotation of a coding-sequence span in exon-index space, used for
/// protein-level queries.
#[derive(Debug, Clone)]
pub struct RegCdsAnno {
    pub transcript: Arc<Transcript>,
    pub exons: Vec<u32>,
}

impl RegCdsAnno {
    /// Classify the CDS span covered by an amino-acid range.
    pub fn from_taa_range(transcript: Arc<Transcript>, taa_beg: i64, taa_end: i64) -> Self {
        let exons = transcript.tnuc_range2exon_inds(taa_beg * 3 - 2, taa_end * 3);
        RegCdsAnno { transcript, exons }
    }

    pub fn format(&self) -> String {
        if self.exons.len() == 1 {
            format!("cds_in_exon_{}", self.exons[0])
        } else {
            let inds: Vec<String> = self.exons.iter().map(|e| e.to_string()).collect();
            format!("cds_in_exons_[{}]", inds.join(","))
        }
    }
}

/// A point or span owned by no gene. The nearest flanking genes are reported
/// with their distances; chromosome ends stand in when there is no flank.
#[derive(Debug, Clone, Default)]
pub struct IntergenicAnno {
    pub chrm: String,
    pub beg: u64,
    pub end: u64,
    /// Nearest gene before the span (name, distance in bp).
    pub upstream: Option<(String, u64)>,
    /// Nearest gene after the span (name, distance in bp).
    pub downstream: Option<(String, u64)>,
}

impl IntergenicAnno {
    pub fn format(&self) -> String {
        let up = match &self.upstream {
            Some((name, dist)) => format!("{}({}_bp)", name, dist),
            None => "chromosome_start".to_string(),
        };
        let down = match &self.downstream {
            Some((name, dist)) => format!("{}({}_bp)", name, dist),
            None => "chromosome_end".to_string(),
        };
        format!("intergenic_between_[{}]_and_[{}]", up, down)
    }
}

/// Closed sum of the region classifications a record can carry.
#[derive(Debug, Clone)]
pub enum Region {
    Point(RegAnno),
    Span(RegSpanAnno),
    Cds(RegCdsAnno),
    Intergenic(IntergenicAnno),
}

impl Region {
    pub fn format(&self) -> String {
        match self {
            Region::Point(r) => r.format(false),
            Region::Span(r) => r.format(),
            Region::Cds(r) => r.format(),
            Region::Intergenic(r) => r.format(),
        }
    }

    pub fn entirely_in_cds(&self) -> bool {
        match self {
            Region::Point(r) => r.entirely_in_cds(),
            Region::Span(r) => r.entirely_in_cds(),
            Region::Cds(_) => true,
            Region::Intergenic(_) => false,
        }
    }

    /// The transcript owning the whole region, when there is exactly one.
    pub fn transcript(&self) -> Option<&Arc<Transcript>> {
        match self {
            Region::Point(r) => r.transcript.as_ref(),
            Region::Span(r) => r.transcript.as_ref(),
            Region::Cds(r) => Some(&r.transcript),
            Region::Intergenic(_) => None,
        }
    }
}
