//! Transcript database and region search.

use crate::error::TrivarError;
use crate::reference::transcript::{describe_point, describe_span, Exon, Gene, Strand, Transcript};
use crate::region::{IntergenicAnno, RegSpanAnno, Region};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// A searchable collection of transcripts.
#[derive(Debug, Clone, Default)]
pub struct TranscriptDb {
    transcripts: Vec<Arc<Transcript>>,
    by_name: HashMap<String, usize>,
    by_gene: HashMap<String, Vec<usize>>,
}

impl TranscriptDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load transcripts from a JSON array.
    pub fn from_json(path: &Path) -> Result<Self, TrivarError> {
        let content = std::fs::read_to_string(path)?;
        let transcripts: Vec<Transcript> = serde_json::from_str(&content)?;
        let mut db = Self::new();
        for t in transcripts {
            db.add(t);
        }
        Ok(db)
    }

    pub fn add(&mut self, transcript: Transcript) {
        let idx = self.transcripts.len();
        self.by_name.insert(transcript.name.clone(), idx);
        self.by_gene
            .entry(transcript.gene.name.clone())
            .or_default()
            .push(idx);
        self.transcripts.push(Arc::new(transcript));
    }

    pub fn len(&self) -> usize {
        self.transcripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcripts.is_empty()
    }

    /// Look up a transcript by accession; falls back to a versionless match
    /// (`NM_0001` finds `NM_0001.2`).
    pub fn get(&self, name: &str) -> Option<Arc<Transcript>> {
        if let Some(&idx) = self.by_name.get(name) {
            return Some(Arc::clone(&self.transcripts[idx]));
        }
        let base = name.split('.').next().unwrap_or(name);
        self.by_name
            .iter()
            .find(|(key, _)| key.split('.').next() == Some(base))
            .map(|(_, &idx)| Arc::clone(&self.transcripts[idx]))
    }

    /// All transcripts of a gene, in insertion order.
    pub fn gene_transcripts(&self, gene: &str) -> Vec<Arc<Transcript>> {
        self.by_gene
            .get(gene)
            .map(|idxs| idxs.iter().map(|&i| Arc::clone(&self.transcripts[i])).collect())
            .unwrap_or_default()
    }

    /// Transcripts whose genomic span overlaps an interval.
    pub fn overlapping(&self, chrm: &str, beg: u64, end: u64) -> Vec<Arc<Transcript>> {
        self.transcripts
            .iter()
            .filter(|t| t.overlaps(chrm, beg, end))
            .cloned()
            .collect()
    }

    /// Resolve a query target to candidate transcripts. A gene name yields
    /// all its transcripts; a transcript accession yields its gene's
    /// transcripts constrained to that accession.
    pub fn resolve_target(&self, target: &str) -> Option<(Vec<Arc<Transcript>>, Option<String>)> {
        let by_gene = self.gene_transcripts(target);
        if !by_gene.is_empty() {
            return Some((by_gene, None));
        }
        let t = self.get(target)?;
        let siblings = self.gene_transcripts(&t.gene.name);
        let constraint = Some(t.name.clone());
        Some((siblings, constraint))
    }

    /// Region descriptions for a genomic query: one per transcript containing
    /// the whole span, a single combined span when the endpoints fall in
    /// different transcript contexts, or an intergenic description when no
    /// gene overlaps.
    pub fn describe(&self, chrm: &str, beg: u64, end: u64) -> Vec<Region> {
        let overlapping = self.overlapping(chrm, beg, end);
        if overlapping.is_empty() {
            return vec![Region::Intergenic(self.intergenic_anno(chrm, beg, end))];
        }

        if beg == end {
            return overlapping
                .iter()
                .map(|t| Region::Point(describe_point(t, beg)))
                .collect();
        }

        let containing: Vec<_> = overlapping
            .iter()
            .filter(|t| t.contains_gpos(beg) && t.contains_gpos(end))
            .collect();
        if !containing.is_empty() {
            return containing
                .iter()
                .map(|t| Region::Span(describe_span(t, beg, end)))
                .collect();
        }

        // Endpoints fall in different transcript contexts (or outside any):
        // one combined span annotated with the genes it crosses.
        let b1 = overlapping
            .iter()
            .find(|t| t.contains_gpos(beg))
            .map(|t| describe_point(t, beg))
            .unwrap_or_default();
        let b2 = overlapping
            .iter()
            .find(|t| t.contains_gpos(end))
            .map(|t| describe_point(t, end))
            .unwrap_or_default();
        let mut spanning: Vec<String> = Vec::new();
        for t in &overlapping {
            if !spanning.contains(&t.gene.name) {
                spanning.push(t.gene.name.clone());
            }
        }
        vec![Region::Span(RegSpanAnno {
            b1,
            b2,
            transcript: None,
            spanning,
            long_range: true,
            ..Default::default()
        })]
    }

    /// Nearest flanking genes for a span no gene overlaps.
    fn intergenic_anno(&self, chrm: &str, beg: u64, end: u64) -> IntergenicAnno {
        let mut upstream: Option<(String, u64)> = None;
        let mut downstream: Option<(String, u64)> = None;
        for t in &self.transcripts {
            if t.chrm != chrm {
                continue;
            }
            if t.genomic_end() < beg {
                let dist = beg - t.genomic_end();
                if upstream.as_ref().is_none_or(|(_, d)| dist < *d) {
                    upstream = Some((t.gene.name.clone(), dist));
                }
            } else if t.genomic_beg() > end {
                let dist = t.genomic_beg() - end;
                if downstream.as_ref().is_none_or(|(_, d)| dist < *d) {
                    downstream = Some((t.gene.name.clone(), dist));
                }
            }
        }
        IntergenicAnno {
            chrm: chrm.to_string(),
            beg,
            end,
            upstream,
            downstream,
        }
    }

    /// The transcript fixture matching [`crate::MockProvider::with_test_data`].
    ///
    /// chr1 carries three genes: ALPHA (plus strand, one single-exon and one
    /// two-exon transcript, CDS from g.51), GAMMA (plus strand, single exon)
    /// and BETA (minus strand, two exons). DELTA sits on chr2, which the
    /// fixture genome does not carry.
    pub fn with_test_data() -> Self {
        let mut db = Self::new();
        db.add(Transcript::new(
            "NM_0001.2",
            Gene {
                name: "ALPHA".to_string(),
                dbxref: Some("GeneID:100".to_string()),
            },
            "chr1",
            Strand::Plus,
            vec![Exon::new(31, 220)],
            51,
            200,
        ));
        db.add(Transcript::new(
            "NM_0002.1",
            Gene {
                name: "ALPHA".to_string(),
                dbxref: Some("GeneID:100".to_string()),
            },
            "chr1",
            Strand::Plus,
            vec![Exon::new(31, 120), Exon::new(141, 220)],
            51,
            202,
        ));
        db.add(Transcript::new(
            "NM_0003.1",
            Gene {
                name: "BETA".to_string(),
                dbxref: None,
            },
            "chr1",
            Strand::Minus,
            vec![Exon::new(301, 340), Exon::new(361, 400)],
            311,
            390,
        ));
        db.add(Transcript::new(
            "NM_0004.1",
            Gene {
                name: "GAMMA".to_string(),
                dbxref: None,
            },
            "chr1",
            Strand::Plus,
            vec![Exon::new(241, 280)],
            246,
            275,
        ));
        db.add(Transcript::new(
            "NM_0009.1",
            Gene {
                name: "DELTA".to_string(),
                dbxref: None,
            },
            "chr2",
            Strand::Plus,
            vec![Exon::new(11, 100)],
            21,
            80,
        ));
        db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_versioned_and_versionless() {
        let db = TranscriptDb::with_test_data();
        assert!(db.get("NM_0001.2").is_some());
        assert!(db.get("NM_0001").is_some());
        assert!(db.get("NM_9999.9").is_none());
    }

    #[test]
    fn test_gene_transcripts() {
        let db = TranscriptDb::with_test_data();
        assert_eq!(db.gene_transcripts("ALPHA").len(), 2);
        assert_eq!(db.gene_transcripts("BETA").len(), 1);
        assert!(db.gene_transcripts("NOPE").is_empty());
    }

    #[test]
    fn test_resolve_target() {
        let db = TranscriptDb::with_test_data();

        let (tpts, constraint) = db.resolve_target("ALPHA").unwrap();
        assert_eq!(tpts.len(), 2);
        assert!(constraint.is_none());

        let (tpts, constraint) = db.resolve_target("NM_0002.1").unwrap();
        assert_eq!(tpts.len(), 2);
        assert_eq!(constraint.as_deref(), Some("NM_0002.1"));

        assert!(db.resolve_target("UNKNOWN").is_none());
    }

    #[test]
    fn test_describe_point_in_gene() {
        let db = TranscriptDb::with_test_data();
        let regions = db.describe("chr1", 100, 100);
        // both ALPHA transcripts contain g.100
        assert_eq!(regions.len(), 2);
        for region in &regions {
            assert!(matches!(region, Region::Point(_)));
            assert!(region.entirely_in_cds());
        }
    }

    #[test]
    fn test_describe_span_within_transcripts() {
        let db = TranscriptDb::with_test_data();
        let regions = db.describe("chr1", 99, 102);
        assert_eq!(regions.len(), 2);
        assert!(regions.iter().all(|r| matches!(r, Region::Span(_))));
    }

    #[test]
    fn test_describe_intergenic() {
        let db = TranscriptDb::with_test_data();
        let regions = db.describe("chr1", 225, 230);
        assert_eq!(regions.len(), 1);
        let Region::Intergenic(anno) = &regions[0] else {
            panic!("expected intergenic region");
        };
        assert_eq!(anno.upstream, Some(("ALPHA".to_string(), 5)));
        assert_eq!(anno.downstream, Some(("GAMMA".to_string(), 11)));
    }

    #[test]
    fn test_describe_cross_transcript_span() {
        let db = TranscriptDb::with_test_data();
        // from inside ALPHA to inside GAMMA
        let regions = db.describe("chr1", 210, 250);
        assert_eq!(regions.len(), 1);
        let Region::Span(span) = &regions[0] else {
            panic!("expected span region");
        };
        assert!(span.long_range);
        assert!(span.spanning.contains(&"ALPHA".to_string()));
        assert!(span.spanning.contains(&"GAMMA".to_string()));
    }

    #[test]
    fn test_describe_unknown_chromosome_is_intergenic_with_no_flanks() {
        let db = TranscriptDb::with_test_data();
        let regions = db.describe("chrZ", 10, 20);
        assert_eq!(regions.len(), 1);
        let Region::Intergenic(anno) = &regions[0] else {
            panic!("expected intergenic region");
        };
        assert!(anno.upstream.is_none() && anno.downstream.is_none());
    }
}
