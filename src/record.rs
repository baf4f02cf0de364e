//! The per-candidate output record.
//!
//! A [`Record`] accumulates whatever coordinates a candidate evaluation
//! managed to compute; rendering never fails, and absent fields render `.`.
//! One record becomes one tab-separated output line.

use crate::pos::Pos;
use crate::region::Region;

/// Column header, available on request (`trivar header`).
pub const HEADER: &str = "input\ttranscript\tgene\tstrand\tcoordinates(gDNA/cDNA/protein)\tregion\tinfo";

/// Deleted residue runs up to this length are spelled out in deletion
/// notation; longer runs render as a count.
pub const DELETED_RUN_MAX: usize = 10;

/// Output accumulator for one (query, candidate transcript) pair.
#[derive(Debug, Clone, Default)]
pub struct Record {
    /// Transcript name.
    pub tname: Option<String>,
    /// Chromosome.
    pub chrm: Option<String>,
    /// Gene name (comma-joined list for multi-transcript spans).
    pub gene: Option<String>,
    /// Strand (comma-joined list for multi-transcript spans).
    pub strand: Option<String>,
    /// Region classification.
    pub reg: Option<Region>,
    /// Info tags, `;`-joined on output, `.` when empty.
    info: Vec<String>,

    pub gnuc_range: Option<String>,
    pub gnuc_pos: Option<u64>,
    pub gnuc_ref: Option<String>,
    pub gnuc_alt: Option<String>,

    pub tnuc_range: Option<String>,
    pub tnuc_pos: Option<Pos>,
    pub tnuc_ref: Option<String>,
    pub tnuc_alt: Option<String>,

    pub taa_range: Option<String>,
    pub taa_pos: Option<i64>,
    pub taa_ref: Option<String>,
    pub taa_alt: Option<String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an info tag.
    pub fn append_info(&mut self, tag: impl Into<String>) {
        self.info.push(tag.into());
    }

    /// The rendered info column.
    pub fn info(&self) -> String {
        if self.info.is_empty() {
            ".".to_string()
        } else {
            self.info.join(";")
        }
    }

    /// Format the genomic notation, e.g. `chr1:g.100_102AAA>TTT`.
    pub fn gnuc(&self) -> String {
        let chrm = self.chrm.as_deref().unwrap_or(".");
        let mut s = format!("{}:g.", chrm);
        if let Some(range) = &self.gnuc_range {
            s.push_str(range);
        } else {
            if let Some(pos) = self.gnuc_pos {
                s.push_str(&pos.to_string());
            }
            if let Some(r) = &self.gnuc_ref {
                s.push_str(r);
            }
            s.push('>');
            if let Some(a) = &self.gnuc_alt {
                s.push_str(a);
            }
        }
        if s == ".:g.>" {
            ".".to_string()
        } else {
            s
        }
    }

    /// Format the transcript notation, e.g. `c.50_52AAA>TTT`.
    pub fn tnuc(&self) -> String {
        let mut s = "c.".to_string();
        if let Some(range) = &self.tnuc_range {
            s.push_str(range);
            if s == "c." {
                return ".".to_string();
            }
        } else {
            if let Some(pos) = &self.tnuc_pos {
                s.push_str(&pos.to_string());
            }
            if let Some(r) = &self.tnuc_ref {
                s.push_str(r);
            }
            s.push('>');
            if let Some(a) = &self.tnuc_alt {
                s.push_str(a);
            }
            if s == "c.>" {
                return ".".to_string();
            }
        }
        s
    }

    /// Format the protein notation, e.g. `p.E545K`.
    pub fn taa(&self) -> String {
        let mut s = "p.".to_string();
        if let Some(range) = &self.taa_range {
            s.push_str(range);
        } else {
            if let Some(r) = &self.taa_ref {
                s.push_str(r);
            }
            if let Some(pos) = self.taa_pos {
                s.push_str(&pos.to_string());
            }
            if let Some(a) = &self.taa_alt {
                s.push_str(a);
            }
        }
        if s == "p." {
            ".".to_string()
        } else {
            s
        }
    }

    /// The `gDNA/cDNA/protein` coordinate column.
    pub fn format_id(&self) -> String {
        format!("{}/{}/{}", self.gnuc(), self.tnuc(), self.taa())
    }

    /// Merge splice-site facts from the region into info tags. Returns true
    /// when the record reports any splice effect, which suppresses
    /// protein-level classification.
    pub fn apply_splice(&mut self) -> bool {
        let Some(Region::Span(span)) = &self.reg else {
            return false;
        };

        let mut tags: Vec<String> = Vec::new();
        for site in &span.splice_donors {
            tags.push(format!(
                "donor_splice_site_on_exon_{}_at_{}:{}",
                site.exon, site.chrm, site.pos
            ));
        }
        for site in &span.splice_acceptors {
            tags.push(format!(
                "acceptor_splice_site_on_exon_{}_at_{}:{}",
                site.exon, site.chrm, site.pos
            ));
        }
        if !span.whole_exons.is_empty() {
            let exons: Vec<String> = span.whole_exons.iter().map(|e| e.to_string()).collect();
            tags.push(format!("whole_exon_[{}]", exons.join(",")));
        }
        if let Some((chrm, pos)) = &span.cds_start_at {
            tags.push(format!("cds_start_at_{}:{}", chrm, pos));
        }
        if let Some((chrm, pos)) = &span.cds_end_at {
            tags.push(format!("cds_end_at_{}:{}", chrm, pos));
        }

        let expt = !tags.is_empty();
        for tag in tags {
            self.append_info(tag);
        }
        expt
    }

    /// Render the final tab-separated annotation line.
    pub fn format_line(&self, op: Option<&str>) -> String {
        let reg = self
            .reg
            .as_ref()
            .map(|r| r.format())
            .unwrap_or_else(|| ".".to_string());
        let mut line = String::new();
        if let Some(op) = op {
            line.push_str(op);
            line.push('\t');
        }
        line.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.tname.as_deref().unwrap_or("."),
            self.gene.as_deref().unwrap_or("."),
            self.strand.as_deref().unwrap_or("."),
            self.format_id(),
            reg,
            self.info()
        ));
        line
    }
}
