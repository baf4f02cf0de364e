//! Candidate-transcript orchestration.
//!
//! Each annotation path evaluates candidate transcripts independently:
//! a candidate that fails a compatibility check is skipped without touching
//! the others, and a query for which no candidate succeeds emits exactly one
//! fallback record reporting the number of candidates considered.
//!
//! Genomic queries differ in one respect: the claimed reference sequence is
//! validated against the genome before any per-transcript work, and a
//! mismatch aborts the whole query with a single warning record.

pub mod coding;
pub mod deletion;
pub mod insertion;

use std::sync::Arc;

use crate::codon::{aa2codon, translate_seq};
use crate::error::TrivarError;
use crate::query::{BlockCdna, BlockGdna, BlockProtein, BlockQuery, Query, QueryKind};
use crate::record::Record;
use crate::reference::db::TranscriptDb;
use crate::reference::provider::GenomeProvider;
use crate::reference::transcript::{describe_point, describe_span, IntronicPolicy, Strand, Transcript};
use crate::region::{RegCdsAnno, Region};
use crate::seq::reverse_complement;
use coding::classify_block;

/// Annotate one parsed query into output records.
pub fn annotate_query<P: GenomeProvider>(
    q: &Query,
    db: &TranscriptDb,
    provider: &P,
) -> Result<Vec<Record>, TrivarError> {
    match &q.kind {
        QueryKind::Region { beg, end } => annotate_region_gdna(&q.target, *beg, *end, db),
        QueryKind::Mnv(BlockQuery::Gdna(block)) => {
            annotate_block_gdna(&q.op, &q.target, block, db, provider)
        }
        QueryKind::Mnv(BlockQuery::Cdna(block)) => {
            let (tpts, tpt) = resolve_candidates(db, &q.target);
            annotate_block_cdna(block, tpt.as_deref(), &tpts, provider)
        }
        QueryKind::Mnv(BlockQuery::Protein(block)) => {
            let (tpts, tpt) = resolve_candidates(db, &q.target);
            annotate_block_protein(block, tpt.as_deref(), &tpts, provider)
        }
        other => Err(TrivarError::UnsupportedVariant {
            kind: other.label().to_string(),
        }),
    }
}

fn resolve_candidates(
    db: &TranscriptDb,
    target: &str,
) -> (Vec<Arc<Transcript>>, Option<String>) {
    db.resolve_target(target).unwrap_or_default()
}

/// One fallback record for a query no candidate transcript could represent.
fn fallback_record(n_candidates: usize) -> Record {
    let mut r = Record::new();
    r.append_info(format!(
        "no_valid_transcript_found_(from_{}_candidates)",
        n_candidates
    ));
    r
}

fn tag_dbxref(r: &mut Record) {
    let dbxref = r
        .reg
        .as_ref()
        .and_then(|reg| reg.transcript())
        .and_then(|t| t.gene.dbxref.clone());
    if let Some(dbxref) = dbxref {
        r.append_info(format!("dbxref={}", dbxref));
    }
}

/// Fill the transcript identity columns.
fn set_transcript_fields(r: &mut Record, t: &Transcript) {
    r.chrm = Some(t.chrm.clone());
    r.tname = Some(t.name.clone());
    r.gene = Some(t.gene.name.clone());
    r.strand = Some(t.strand.to_string());
}

/// Annotate a transcript-space block substitution across candidates.
pub fn annotate_block_cdna<P: GenomeProvider>(
    q: &BlockCdna,
    tpt: Option<&str>,
    tpts: &[Arc<Transcript>],
    provider: &P,
) -> Result<Vec<Record>, TrivarError> {
    let mut records = Vec::new();
    for t in tpts {
        match eval_cdna_candidate(q, tpt, t, provider) {
            Ok(r) => records.push(r),
            Err(e) if e.is_candidate_skip() => continue,
            Err(e) => return Err(e),
        }
    }
    if records.is_empty() {
        records.push(fallback_record(tpts.len()));
    }
    Ok(records)
}

fn eval_cdna_candidate<P: GenomeProvider>(
    q: &BlockCdna,
    tpt: Option<&str>,
    t: &Arc<Transcript>,
    provider: &P,
) -> Result<Record, TrivarError> {
    if let Some(tpt) = tpt {
        if t.name != tpt {
            return Err(TrivarError::incompatible("transcript name unmatched"));
        }
    }
    t.ensure_seq(provider)?;

    let mut r = Record::new();
    set_transcript_fields(&mut r, t);

    // an intronic bound must name a real exon boundary
    t.check_exon_boundary(&q.beg)?;
    t.check_exon_boundary(&q.end)?;

    let g1 = t.tnuc2gnuc(&q.beg)?;
    let g2 = t.tnuc2gnuc(&q.end)?;
    // mapped order may invert relative to transcript order on minus strand
    let (gnuc_beg, gnuc_end) = (g1.min(g2), g1.max(g2));

    let gnuc_refseq = provider.fetch_sequence(&t.chrm, gnuc_beg, gnuc_end)?;
    let (tnuc_refseq, gnuc_altseq) = match t.strand {
        Strand::Plus => (gnuc_refseq.clone(), q.altseq.clone()),
        Strand::Minus => (
            reverse_complement(&gnuc_refseq),
            reverse_complement(&q.altseq),
        ),
    };
    if let Some(refseq) = &q.refseq {
        if tnuc_refseq != *refseq {
            return Err(TrivarError::incompatible("reference sequence unmatched"));
        }
    }

    r.gnuc_range = Some(format!(
        "{}_{}{}>{}",
        gnuc_beg, gnuc_end, gnuc_refseq, gnuc_altseq
    ));
    r.tnuc_range = Some(format!("{}_{}{}>{}", q.beg, q.end, tnuc_refseq, q.altseq));

    r.reg = Some(if gnuc_beg == gnuc_end {
        Region::Point(describe_point(t, gnuc_beg))
    } else {
        Region::Span(describe_span(t, gnuc_beg, gnuc_end))
    });

    let expt = r.apply_splice();
    if !expt && r.reg.as_ref().is_some_and(|reg| reg.entirely_in_cds()) {
        merge_coding_outcome(&mut r, t, provider, q.beg.base, q.end.base, &q.altseq)?;
    }
    tag_dbxref(&mut r);
    Ok(r)
}

/// Run the codon-mutation classifier and merge its outcome, downgrading a
/// truncated-reference failure to an info tag.
fn merge_coding_outcome<P: GenomeProvider>(
    r: &mut Record,
    t: &Arc<Transcript>,
    provider: &P,
    beg: i64,
    end: i64,
    altseq: &str,
) -> Result<(), TrivarError> {
    match classify_block(t, provider, beg, end, altseq) {
        Ok(outcome) => {
            for tag in outcome.info {
                r.append_info(tag);
            }
            r.taa_range = Some(outcome.taa_range);
            Ok(())
        }
        Err(TrivarError::TruncatedRefSeq { beg, end, seq_len }) => {
            r.append_info(format!(
                "mnv_({}-{})_at_truncated_refseq_of_length_{}",
                beg, end, seq_len
            ));
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Annotate a protein-space block substitution across candidates.
pub fn annotate_block_protein<P: GenomeProvider>(
    q: &BlockProtein,
    tpt: Option<&str>,
    tpts: &[Arc<Transcript>],
    provider: &P,
) -> Result<Vec<Record>, TrivarError> {
    // the protein notation is echoed from the query on every record,
    // including the fallback
    let taa_range = format!(
        "{}{}_{}{}del{}ins{}",
        q.beg_aa.map(String::from).unwrap_or_default(),
        q.beg,
        q.end_aa.map(String::from).unwrap_or_default(),
        q.end,
        q.refseq.as_deref().unwrap_or(""),
        q.altseq
    );

    let mut records = Vec::new();
    for t in tpts {
        match eval_protein_candidate(q, tpt, t, provider) {
            Ok(mut r) => {
                r.taa_range = Some(taa_range.clone());
                r.reg = Some(Region::Cds(RegCdsAnno::from_taa_range(
                    Arc::clone(t),
                    q.beg,
                    q.end,
                )));
                r.append_info("imprecise");
                tag_dbxref(&mut r);
                records.push(r);
            }
            Err(e) if e.is_candidate_skip() => continue,
            Err(e) => return Err(e),
        }
    }

    if records.is_empty() {
        let mut r = fallback_record(tpts.len());
        r.taa_range = Some(taa_range);
        records.push(r);
    }
    Ok(records)
}

fn eval_protein_candidate<P: GenomeProvider>(
    q: &BlockProtein,
    tpt: Option<&str>,
    t: &Arc<Transcript>,
    provider: &P,
) -> Result<Record, TrivarError> {
    if let Some(tpt) = tpt {
        if t.name != tpt {
            return Err(TrivarError::incompatible("transcript name unmatched"));
        }
    }
    t.ensure_seq(provider)?;

    let mut r = Record::new();
    set_transcript_fields(&mut r, t);

    let cds_len = t.cds_len()? as i64;
    if q.beg * 3 > cds_len || q.end * 3 > cds_len {
        return Err(TrivarError::incompatible("codon nonexistent"));
    }

    let tnuc_beg = q.beg * 3 - 2;
    let tnuc_end = q.end * 3;
    let (gnuc_beg, gnuc_end) = t.tnuc_range2gnuc_range(tnuc_beg, tnuc_end)?;

    let cds = t.cds_seq(provider)?;
    let tnuc_refseq = &cds[(tnuc_beg - 1) as usize..tnuc_end as usize];
    let gnuc_refseq = match t.strand {
        Strand::Plus => tnuc_refseq.to_string(),
        Strand::Minus => reverse_complement(tnuc_refseq),
    };
    let taa_refseq = translate_seq(tnuc_refseq);

    if let Some(beg_aa) = q.beg_aa {
        if taa_refseq.chars().next() != Some(beg_aa) {
            return Err(TrivarError::incompatible(
                "beginning reference amino acid unmatched",
            ));
        }
    }
    if let Some(end_aa) = q.end_aa {
        if taa_refseq.chars().last() != Some(end_aa) {
            return Err(TrivarError::incompatible(
                "ending reference amino acid unmatched",
            ));
        }
    }
    if let Some(refseq) = &q.refseq {
        if taa_refseq != *refseq {
            return Err(TrivarError::incompatible("reference sequence unmatched"));
        }
    }

    // reverse translation: the first synonymous codon is definitive, the
    // full choice set is reported when short enough to be readable
    let mut tnuc_altseq = String::new();
    let mut cdd_altseq: Vec<String> = Vec::new();
    for aa in q.altseq.chars() {
        let codons = aa2codon(aa);
        if codons.is_empty() {
            return Err(TrivarError::incompatible(format!(
                "unknown amino acid {}",
                aa
            )));
        }
        tnuc_altseq.push_str(codons[0]);
        cdd_altseq.push(codons.join("/"));
    }
    let gnuc_altseq = match t.strand {
        Strand::Plus => tnuc_altseq.clone(),
        Strand::Minus => reverse_complement(&tnuc_altseq),
    };

    r.tnuc_range = Some(format!(
        "{}_{}{}>{}",
        tnuc_beg, tnuc_end, tnuc_refseq, tnuc_altseq
    ));
    r.gnuc_range = Some(format!(
        "{}_{}{}>{}",
        gnuc_beg, gnuc_end, gnuc_refseq, gnuc_altseq
    ));
    if cdd_altseq.len() <= 2 {
        r.append_info(format!(
            "candidate_alternative_sequence={}",
            cdd_altseq.join("+")
        ));
    }
    Ok(r)
}

/// Annotate a genomic-space block substitution. The claimed reference is
/// validated first; a mismatch is fatal to the whole query and produces a
/// single explanatory record.
pub fn annotate_block_gdna<P: GenomeProvider>(
    op: &str,
    chrm: &str,
    q: &BlockGdna,
    db: &TranscriptDb,
    provider: &P,
) -> Result<Vec<Record>, TrivarError> {
    let gnuc_refseq = provider.fetch_sequence(chrm, q.beg, q.end)?;
    if let Some(claimed) = &q.refseq {
        if *claimed != gnuc_refseq {
            log::warn!(
                "{}: invalid reference {} (expect {}), maybe wrong reference genome?",
                op,
                claimed,
                gnuc_refseq
            );
            let mut r = Record::new();
            r.chrm = Some(chrm.to_string());
            r.append_info(format!(
                "invalid_reference_seq_{}_(expect_{})",
                claimed, gnuc_refseq
            ));
            return Ok(vec![r]);
        }
    }
    // the literal genome sequence is authoritative from here on
    let refseq = gnuc_refseq;

    let mut records = Vec::new();
    for reg in db.describe(chrm, q.beg, q.end) {
        let mut r = Record::new();
        r.chrm = Some(chrm.to_string());
        r.gnuc_range = Some(format!("{}_{}{}>{}", q.beg, q.end, refseq, q.altseq));

        if let Some(t) = reg.transcript().cloned() {
            set_transcript_fields(&mut r, &t);

            let Ok((_, p1)) = t.gpos2codon(q.beg, IntronicPolicy::GreaterGenomic) else {
                continue;
            };
            let Ok((_, p2)) = t.gpos2codon(q.end, IntronicPolicy::SmallerGenomic) else {
                continue;
            };

            let (tnuc_beg, tnuc_end, tnuc_refseq, tnuc_altseq) = match t.strand {
                Strand::Plus => (p1, p2, refseq.clone(), q.altseq.clone()),
                Strand::Minus => (
                    p2,
                    p1,
                    reverse_complement(&refseq),
                    reverse_complement(&q.altseq),
                ),
            };
            r.tnuc_range = Some(format!(
                "{}_{}{}>{}",
                tnuc_beg, tnuc_end, tnuc_refseq, tnuc_altseq
            ));

            r.reg = Some(reg);
            let expt = r.apply_splice();
            if !expt && r.reg.as_ref().is_some_and(|reg| reg.entirely_in_cds()) {
                merge_coding_outcome(
                    &mut r,
                    &t,
                    provider,
                    tnuc_beg.base,
                    tnuc_end.base,
                    &tnuc_altseq,
                )?;
            }
        } else {
            if let Region::Span(span) = &reg {
                // span touching two transcript contexts: identity columns
                // become deduplicated comma-joined lists
                let mut tnames = Vec::new();
                let mut strands = Vec::new();
                let mut genes = Vec::new();
                for b in [&span.b1, &span.b2] {
                    if let Some(t) = &b.transcript {
                        if !tnames.contains(&t.name) {
                            tnames.push(t.name.clone());
                            strands.push(t.strand.to_string());
                            genes.push(t.gene.name.clone());
                        }
                    }
                }
                if !tnames.is_empty() {
                    r.tname = Some(tnames.join(","));
                    r.strand = Some(strands.join(","));
                    r.gene = Some(genes.join(","));
                }
            }
            r.reg = Some(reg);
        }

        tag_dbxref(&mut r);
        records.push(r);
    }
    Ok(records)
}

/// Annotate a bare genomic span: region classification only.
pub fn annotate_region_gdna(
    chrm: &str,
    beg: u64,
    end: u64,
    db: &TranscriptDb,
) -> Result<Vec<Record>, TrivarError> {
    let mut records = Vec::new();
    for reg in db.describe(chrm, beg, end) {
        let mut r = Record::new();
        r.chrm = Some(chrm.to_string());
        r.gnuc_range = Some(if beg == end {
            beg.to_string()
        } else {
            format!("{}_{}", beg, end)
        });
        if let Some(t) = reg.transcript() {
            set_transcript_fields(&mut r, t);
        }
        r.reg = Some(reg);
        tag_dbxref(&mut r);
        records.push(r);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pos::Pos;
    use crate::reference::mock::MockProvider;

    fn fixture() -> (TranscriptDb, MockProvider) {
        (TranscriptDb::with_test_data(), MockProvider::with_test_data())
    }

    fn run(line: &str) -> Result<Vec<Record>, TrivarError> {
        let (db, provider) = fixture();
        let q = crate::query::parse_query(line)?;
        annotate_query(&q, &db, &provider)
    }

    #[test]
    fn test_cdna_block_single_codon() {
        let records = run("NM_0001.2:c.49_51AAA>TTT").unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.gnuc(), "chr1:g.99_101AAA>TTT");
        assert_eq!(r.tnuc(), "c.49_51AAA>TTT");
        assert_eq!(r.taa(), "p.K17F");
        assert_eq!(r.reg.as_ref().unwrap().format(), "inside_[cds_in_exon_1]");
        assert!(r.info().contains("codon_cDNA=49-50-51"));
        assert!(r.info().contains("dbxref=GeneID:100"));
    }

    #[test]
    fn test_cdna_gene_target_evaluates_all_candidates() {
        // both ALPHA transcripts carry AAA at c.49-51 (shared exon 1)
        let records = run("ALPHA:c.49_51AAA>TTT").unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_cdna_reference_mismatch_skips_candidate() {
        let records = run("NM_0001.2:c.49_51GGG>TTT").unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0]
            .info()
            .contains("no_valid_transcript_found_(from_2_candidates)"));
        assert_eq!(records[0].gnuc(), ".");
        assert_eq!(records[0].tnuc(), ".");
        assert_eq!(records[0].taa(), ".");
    }

    #[test]
    fn test_unknown_transcript_yields_fallback() {
        let records = run("NM_7777.1:c.10A>T").unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0]
            .info()
            .contains("no_valid_transcript_found_(from_0_candidates)"));
    }

    #[test]
    fn test_candidate_on_unknown_chromosome_is_skipped() {
        let records = run("DELTA:c.10A>T").unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0]
            .info()
            .contains("no_valid_transcript_found_(from_1_candidates)"));
    }

    #[test]
    fn test_cdna_exon_boundary_gate() {
        // NM_0001.2 is single-exon; claiming an intron is incompatible
        let records = run("NM_0001.2:c.49+5_51AAA>TTT").unwrap();
        assert!(records[0].info().contains("no_valid_transcript_found"));
    }

    #[test]
    fn test_cdna_minus_strand_orientation() {
        // BETA c.10 is genomic 381; transcript base C (genome G)
        let (db, provider) = fixture();
        let q = BlockCdna {
            beg: Pos::exonic(10),
            end: Pos::exonic(12),
            refseq: Some("CCC".to_string()),
            altseq: "TTT".to_string(),
        };
        let tpts = db.gene_transcripts("BETA");
        let records = annotate_block_cdna(&q, None, &tpts, &provider).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.gnuc(), "chr1:g.379_381GGG>AAA");
        assert_eq!(r.tnuc(), "c.10_12CCC>TTT");
        assert_eq!(r.strand.as_deref(), Some("-"));
    }

    #[test]
    fn test_gdna_block_in_cds() {
        let records = run("chr1:g.99_101AAA>TTT").unwrap();
        // one record per ALPHA transcript containing the span
        assert_eq!(records.len(), 2);
        let r = records
            .iter()
            .find(|r| r.tname.as_deref() == Some("NM_0001.2"))
            .unwrap();
        assert_eq!(r.gnuc(), "chr1:g.99_101AAA>TTT");
        assert_eq!(r.tnuc(), "c.49_51AAA>TTT");
        assert_eq!(r.taa(), "p.K17F");
    }

    #[test]
    fn test_gdna_reference_mismatch_aborts_query() {
        let records = run("chr1:g.99_101CCC>TTT").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].info(),
            "invalid_reference_seq_CCC_(expect_AAA)"
        );
        assert_eq!(records[0].tnuc(), ".");
        assert_eq!(records[0].taa(), ".");
    }

    #[test]
    fn test_gdna_unknown_chromosome_is_query_fatal() {
        let err = run("chrZ:g.99_101AAA>TTT").unwrap_err();
        assert!(matches!(err, TrivarError::UnknownChromosome { .. }));
    }

    #[test]
    fn test_gdna_intergenic_span() {
        let records = run("chr1:g.225_226GG>TT").unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert!(r.tname.is_none());
        assert!(r
            .reg
            .as_ref()
            .unwrap()
            .format()
            .starts_with("intergenic_between_"));
    }

    #[test]
    fn test_gdna_minus_strand_tnuc_order() {
        // BETA: genomic 379-381 maps to c.10-12 in reverse
        let records = run("chr1:g.379_381GGG>AAA").unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.tnuc(), "c.10_12CCC>TTT");
        assert_eq!(r.strand.as_deref(), Some("-"));
        assert_eq!(r.taa(), "p.P4F");
    }

    #[test]
    fn test_region_query() {
        let records = run("chr1:g.99_101").unwrap();
        assert_eq!(records.len(), 2);
        assert!(records
            .iter()
            .all(|r| r.gnuc() == "chr1:g.99_101" && r.tnuc() == "."));
    }

    #[test]
    fn test_unsupported_kinds_error() {
        let err = run("NM_0001.2:c.10_12del").unwrap_err();
        assert!(matches!(
            err,
            TrivarError::UnsupportedVariant { ref kind } if kind == "deletion"
        ));
        let err = run("ALPHA:p.R97Pfs*23").unwrap_err();
        assert!(matches!(
            err,
            TrivarError::UnsupportedVariant { ref kind } if kind == "frameshift"
        ));
    }

    #[test]
    fn test_protein_block() {
        let records = run("NM_0001.2:p.K17_R18delinsIW").unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.taa(), "p.K17_R18delinsIW");
        assert_eq!(r.tnuc(), "c.49_54AAAAGG>ATATGG");
        assert_eq!(r.gnuc(), "chr1:g.99_104AAAAGG>ATATGG");
        assert!(r.info().contains("imprecise"));
        assert!(r
            .info()
            .contains("candidate_alternative_sequence=ATA/ATC/ATT+TGG"));
        assert_eq!(r.reg.as_ref().unwrap().format(), "cds_in_exon_1");
    }

    #[test]
    fn test_protein_reference_amino_acid_gate() {
        // K17 is correct, E17 is not
        let records = run("NM_0001.2:p.E17_R18delinsIW").unwrap();
        assert!(records[0].info().contains("no_valid_transcript_found"));
        // fallback still echoes the protein notation
        assert_eq!(records[0].taa(), "p.E17_R18delinsIW");
    }

    #[test]
    fn test_protein_out_of_range_codon() {
        let records = run("NM_0001.2:p.K9999E").unwrap();
        assert!(records[0].info().contains("no_valid_transcript_found"));
    }
}
