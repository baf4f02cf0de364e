//! Codon-level classification of coding block substitutions.
//!
//! Given exact CDS nucleotide bounds and an alternate sequence, determines
//! the reading-frame impact and produces the protein-range notation:
//! synonymous, substitution, insertion, deletion, delins, or frameshift.

use std::sync::Arc;

use crate::annotate::deletion::taa_del_notation;
use crate::annotate::insertion::taa_ins_notation;
use crate::codon::translate_seq;
use crate::error::TrivarError;
use crate::reference::provider::GenomeProvider;
use crate::reference::transcript::Transcript;

/// Immutable classification result, merged into the output record by the
/// orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodingOutcome {
    /// Protein-range notation (without the `p.` prefix).
    pub taa_range: String,
    /// Info tags describing the affected codons.
    pub info: Vec<String>,
}

/// Trim equal residues from both ends of two translated windows, isolating
/// the minimal changed region. Returns the trimmed pair plus the number of
/// residues trimmed from head and tail.
pub fn double_trim(seq1: &str, seq2: &str) -> (String, String, i64, i64) {
    let mut s1 = seq1.as_bytes();
    let mut s2 = seq2.as_bytes();
    let mut head = 0i64;
    let mut tail = 0i64;

    while !s1.is_empty() && !s2.is_empty() && s1[0] == s2[0] {
        s1 = &s1[1..];
        s2 = &s2[1..];
        head += 1;
    }
    while !s1.is_empty() && !s2.is_empty() && s1[s1.len() - 1] == s2[s2.len() - 1] {
        s1 = &s1[..s1.len() - 1];
        s2 = &s2[..s2.len() - 1];
        tail += 1;
    }

    (
        String::from_utf8_lossy(s1).into_owned(),
        String::from_utf8_lossy(s2).into_owned(),
        head,
        tail,
    )
}

fn codon_tag(label: &str, codon_beg: i64) -> String {
    format!(
        "{}={}-{}-{}",
        label,
        codon_beg,
        codon_beg + 1,
        codon_beg + 2
    )
}

/// Classify a coding block substitution over CDS positions `beg..=end`
/// (1-based, inclusive) replaced by `altseq` (transcript orientation).
///
/// Fails with [`TrivarError::TruncatedRefSeq`] when the enclosing codon
/// window runs past the end of the coding sequence; callers downgrade that
/// to an info tag.
pub fn classify_block<P: GenomeProvider>(
    t: &Arc<Transcript>,
    provider: &P,
    beg: i64,
    end: i64,
    altseq: &str,
) -> Result<CodingOutcome, TrivarError> {
    let cds = t.cds_seq(provider)?;
    let cds_len = cds.len();
    let ref_len = end - beg + 1;

    if beg < 1 || end < beg || beg as usize > cds_len {
        return Err(TrivarError::TruncatedRefSeq {
            beg,
            end,
            seq_len: cds_len,
        });
    }

    let frame_delta = (altseq.len() as i64 - ref_len).rem_euclid(3);
    let beg_codon_index = (beg + 2) / 3;
    let end_codon_index = (end + 2) / 3;
    let beg_codon_beg = beg_codon_index * 3 - 2;

    if frame_delta == 0 {
        let end_codon_end = end_codon_index * 3; // last base of the last codon

        let mut info = Vec::new();
        if beg_codon_index == end_codon_index {
            info.push(codon_tag("codon_cDNA", beg_codon_beg));
        } else {
            info.push(codon_tag("begin_codon_cDNA", beg_codon_beg));
            info.push(codon_tag("end_codon_cDNA", end_codon_end - 2));
        }

        let window_end = (end_codon_end as usize).min(cds_len);
        let old_seq = &cds[(beg_codon_beg - 1) as usize..window_end];
        if old_seq.len() % 3 != 0 {
            return Err(TrivarError::TruncatedRefSeq {
                beg,
                end,
                seq_len: cds_len,
            });
        }
        let new_seq = format!(
            "{}{}{}",
            &cds[(beg_codon_beg - 1) as usize..(beg - 1) as usize],
            altseq,
            &cds[(end as usize).min(window_end)..window_end]
        );

        let old_taa = translate_seq(old_seq);
        let new_taa = translate_seq(&new_seq);
        if old_taa == new_taa {
            return Ok(CodingOutcome {
                taa_range: "(=)".to_string(),
                info,
            });
        }

        // A nucleotide-level block substitution may reduce to an insertion
        // or deletion at the protein level once equal residues are trimmed.
        let (old_trimmed, new_trimmed, head, tail) = double_trim(&old_taa, &new_taa);

        if old_trimmed.is_empty() {
            let ins_index = beg_codon_index + head - 1;
            return Ok(CodingOutcome {
                taa_range: taa_ins_notation(cds, ins_index, &new_trimmed),
                info,
            });
        }

        if new_trimmed.is_empty() {
            return Ok(CodingOutcome {
                taa_range: taa_del_notation(cds, beg_codon_index + head, end_codon_index - tail),
                info,
            });
        }

        let old_bytes = old_trimmed.as_bytes();
        let taa_range = if old_bytes.len() == 1 {
            if new_trimmed.len() == 1 {
                format!(
                    "{}{}{}",
                    old_bytes[0] as char,
                    beg_codon_index + head,
                    new_trimmed
                )
            } else {
                format!(
                    "{}{}delins{}",
                    old_bytes[0] as char,
                    beg_codon_index + head,
                    new_trimmed
                )
            }
        } else {
            format!(
                "{}{}_{}{}delins{}",
                old_bytes[0] as char,
                beg_codon_index + head,
                old_bytes[old_bytes.len() - 1] as char,
                end_codon_index - tail,
                new_trimmed
            )
        };
        Ok(CodingOutcome { taa_range, info })
    } else {
        // Frameshift: re-translate from the first affected codon through the
        // remaining sequence.
        let old_seq = &cds[(beg_codon_beg - 1) as usize..];
        let new_seq = format!(
            "{}{}{}",
            &cds[(beg_codon_beg - 1) as usize..(beg - 1) as usize],
            altseq,
            &cds[(end as usize).min(cds_len)..]
        );

        let taa_range = match t.extend_taa_seq(beg_codon_index, old_seq, &new_seq) {
            Some(out) => {
                let term = out
                    .term_len
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "?".to_string());
                format!("{}{}{}fs*{}", out.taa_ref, out.taa_pos, out.taa_alt, term)
            }
            None => "(=)".to_string(),
        };
        Ok(CodingOutcome {
            taa_range,
            info: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::db::TranscriptDb;
    use crate::reference::mock::MockProvider;

    fn fixture() -> (Arc<Transcript>, MockProvider) {
        let db = TranscriptDb::with_test_data();
        (db.get("NM_0001.2").unwrap(), MockProvider::with_test_data())
    }

    #[test]
    fn test_double_trim() {
        let (a, b, head, tail) = double_trim("KRG", "KLG");
        assert_eq!((a.as_str(), b.as_str(), head, tail), ("R", "L", 1, 1));

        let (a, b, head, tail) = double_trim("KG", "KRG");
        assert_eq!((a.as_str(), b.as_str(), head, tail), ("", "R", 1, 1));

        let (a, b, head, tail) = double_trim("KRG", "KG");
        assert_eq!((a.as_str(), b.as_str(), head, tail), ("R", "", 1, 1));

        let (a, b, head, tail) = double_trim("ABC", "XYZ");
        assert_eq!((a.as_str(), b.as_str(), head, tail), ("ABC", "XYZ", 0, 0));
    }

    #[test]
    fn test_double_trim_idempotent() {
        let (a1, b1, _, _) = double_trim("MKKRGL", "MKLRGL");
        let (a2, b2, h2, t2) = double_trim(&a1, &b1);
        assert_eq!((a1, b1), (a2, b2));
        assert_eq!((h2, t2), (0, 0));
    }

    #[test]
    fn test_single_codon_substitution() {
        let (t, provider) = fixture();
        // codon 17 of ALPHA is AAA (K); c.49_51 AAA>TTT gives F
        let out = classify_block(&t, &provider, 49, 51, "TTT").unwrap();
        assert_eq!(out.taa_range, "K17F");
        assert_eq!(out.info, vec!["codon_cDNA=49-50-51".to_string()]);
    }

    #[test]
    fn test_synonymous_block() {
        let (t, provider) = fixture();
        // AAA>AAG both encode K
        let out = classify_block(&t, &provider, 49, 51, "AAG").unwrap();
        assert_eq!(out.taa_range, "(=)");
    }

    #[test]
    fn test_cross_codon_delins() {
        let (t, provider) = fixture();
        // c.50_52 spans codons 17 (AAA=K) and 18 (AGG=R); AAA>TTT makes
        // ATT (I) and TGG (W)
        let out = classify_block(&t, &provider, 50, 52, "TTT").unwrap();
        assert_eq!(out.taa_range, "K17_R18delinsIW");
        assert_eq!(
            out.info,
            vec![
                "begin_codon_cDNA=49-50-51".to_string(),
                "end_codon_cDNA=52-53-54".to_string()
            ]
        );
    }

    #[test]
    fn test_single_residue_delins() {
        let (t, provider) = fixture();
        // one codon replaced by two codons' worth of sequence, in frame
        let out = classify_block(&t, &provider, 49, 51, "TTTACT").unwrap();
        assert_eq!(out.taa_range, "K17delinsFT");
    }

    #[test]
    fn test_inframe_deletion_routes_to_deletion_path() {
        let (t, provider) = fixture();
        // delete codon 17 entirely (AAA), splicing in nothing is not a
        // block substitution, so replace codons 17-18 with codon 18 alone
        let out = classify_block(&t, &provider, 49, 54, "AGG").unwrap();
        assert!(out.taa_range.contains("del"));
        assert!(!out.taa_range.contains("delins"));
    }

    #[test]
    fn test_inframe_insertion_routes_to_insertion_path() {
        let (t, provider) = fixture();
        // replace codon 17 with itself plus an extra codon
        let out = classify_block(&t, &provider, 49, 51, "AAATGG").unwrap();
        assert!(out.taa_range.contains("ins"), "got {}", out.taa_range);
        assert!(!out.taa_range.contains("delins"));
    }

    #[test]
    fn test_frameshift_notation() {
        let (t, provider) = fixture();
        // two bases replace three: frame shifts at codon 17
        let out = classify_block(&t, &provider, 49, 51, "TT").unwrap();
        assert!(
            out.taa_range.starts_with("K17"),
            "got {}",
            out.taa_range
        );
        assert!(out.taa_range.contains("fs*"), "got {}", out.taa_range);
    }

    #[test]
    fn test_truncated_reference_window() {
        use crate::reference::transcript::{Exon, Gene, Strand};
        // a transcript whose annotated CDS is not a whole number of codons
        let t = Arc::new(Transcript::new(
            "NM_TRUNC.1",
            Gene {
                name: "ALPHA".to_string(),
                dbxref: None,
            },
            "chr1",
            Strand::Plus,
            vec![Exon::new(31, 220)],
            51,
            202,
        ));
        let provider = MockProvider::with_test_data();
        // CDS is 152 bases; the codon window for c.151_152 runs past it
        let err = classify_block(&t, &provider, 151, 152, "AA").unwrap_err();
        assert!(matches!(
            err,
            TrivarError::TruncatedRefSeq {
                beg: 151,
                end: 152,
                seq_len: 152
            }
        ));
    }
}
