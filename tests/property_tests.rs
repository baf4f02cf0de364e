//! Property-based tests for the codon-mutation classifier
//!
//! Builds random coding transcripts over a synthetic contig and checks the
//! classifier's structural guarantees: trimming is idempotent, synonymous
//! windows never produce edit notation, substitutions have exact shape, and
//! frame-changing edits always render as frameshifts.

use proptest::prelude::*;
use std::sync::Arc;

use trivar::annotate::coding::{classify_block, double_trim};
use trivar::reference::transcript::{Exon, Gene, Strand, Transcript};
use trivar::seq::reverse_complement;
use trivar::{MockProvider, Record};

/// The 61 sense codons.
const SENSE_CODONS: &[&str] = &[
    "AAA", "AAC", "AAG", "AAT", "ACA", "ACC", "ACG", "ACT", "AGA", "AGC", "AGG", "AGT", "ATA",
    "ATC", "ATG", "ATT", "CAA", "CAC", "CAG", "CAT", "CCA", "CCC", "CCG", "CCT", "CGA", "CGC",
    "CGG", "CGT", "CTA", "CTC", "CTG", "CTT", "GAA", "GAC", "GAG", "GAT", "GCA", "GCC", "GCG",
    "GCT", "GGA", "GGC", "GGG", "GGT", "GTA", "GTC", "GTG", "GTT", "TAC", "TAT", "TCA", "TCC",
    "TCG", "TCT", "TGC", "TGG", "TGT", "TTA", "TTC", "TTG", "TTT",
];

fn sense_codon() -> impl Strategy<Value = &'static str> {
    prop::sample::select(SENSE_CODONS)
}

/// A random coding sequence of `n` sense codons followed by a stop.
fn coding_sequence(n: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(sense_codon(), n).prop_map(|codons| {
        let mut cds: String = codons.concat();
        cds.push_str("TAA");
        cds
    })
}

/// Wrap a coding sequence in a single-exon plus-strand transcript and a
/// provider carrying just that contig.
fn make_transcript(cds: &str) -> (Arc<Transcript>, MockProvider) {
    let len = cds.len() as u64;
    let mut provider = MockProvider::new();
    provider.add_contig("chrT", cds.to_string());
    let t = Transcript::new(
        "NM_PROP.1",
        Gene {
            name: "PROP".to_string(),
            dbxref: None,
        },
        "chrT",
        Strand::Plus,
        vec![Exon::new(1, len)],
        1,
        len,
    );
    (Arc::new(t), provider)
}

fn aa_string() -> impl Strategy<Value = String> {
    "[A-Y*]{0,12}"
}

proptest! {
    #[test]
    fn prop_double_trim_is_idempotent(a in aa_string(), b in aa_string()) {
        let (a1, b1, _, _) = double_trim(&a, &b);
        let (a2, b2, h2, t2) = double_trim(&a1, &b1);
        prop_assert_eq!(&a1, &a2);
        prop_assert_eq!(&b1, &b2);
        prop_assert_eq!((h2, t2), (0, 0));
    }

    #[test]
    fn prop_double_trim_removes_all_common_affixes(a in aa_string(), b in aa_string()) {
        let (a1, b1, _, _) = double_trim(&a, &b);
        // trimmed results never share a first or last character
        if !a1.is_empty() && !b1.is_empty() {
            prop_assert!(
                a1.chars().next() != b1.chars().next()
                    || a1.chars().last() != b1.chars().last()
            );
        }
    }

    #[test]
    fn prop_synonymous_window_is_identity(
        cds in coding_sequence(8),
        codon_index in 0usize..8,
        pick in 0usize..6,
    ) {
        let (t, provider) = make_transcript(&cds);
        let beg = (codon_index * 3 + 1) as i64;
        let end = beg + 2;

        // replace the codon with a synonymous one
        let original = &cds[codon_index * 3..codon_index * 3 + 3];
        let aa = trivar::codon::codon2aa(original).unwrap();
        let choices = trivar::codon::aa2codon(aa);
        let alt = choices[pick % choices.len()];

        let outcome = classify_block(&t, &provider, beg, end, alt).unwrap();
        prop_assert_eq!(outcome.taa_range, "(=)");
    }

    #[test]
    fn prop_single_codon_substitution_shape(
        cds in coding_sequence(8),
        codon_index in 0usize..8,
        alt in sense_codon(),
    ) {
        let (t, provider) = make_transcript(&cds);
        let beg = (codon_index * 3 + 1) as i64;
        let end = beg + 2;

        let original = &cds[codon_index * 3..codon_index * 3 + 3];
        let ref_aa = trivar::codon::codon2aa(original).unwrap();
        let alt_aa = trivar::codon::codon2aa(alt).unwrap();
        prop_assume!(ref_aa != alt_aa);

        let outcome = classify_block(&t, &provider, beg, end, alt).unwrap();
        let expected = format!("{}{}{}", ref_aa, codon_index + 1, alt_aa);
        prop_assert_eq!(outcome.taa_range, expected);
    }

    #[test]
    fn prop_frame_change_renders_frameshift_or_identity(
        cds in coding_sequence(8),
        codon_index in 0usize..8,
        alt in "[ACGT]{1,7}",
    ) {
        let (t, provider) = make_transcript(&cds);
        let beg = (codon_index * 3 + 1) as i64;
        let end = beg + 2;
        prop_assume!((alt.len() as i64 - 3).rem_euclid(3) != 0);

        let outcome = classify_block(&t, &provider, beg, end, &alt).unwrap();
        prop_assert!(
            outcome.taa_range == "(=)" || outcome.taa_range.contains("fs*"),
            "unexpected frameshift notation: {}",
            outcome.taa_range
        );
    }

    #[test]
    fn prop_reverse_complement_involution(seq in "[ACGT]{0,40}") {
        prop_assert_eq!(reverse_complement(&reverse_complement(&seq)), seq);
    }

    #[test]
    fn prop_empty_record_always_renders_dots(tag in "[a-z_]{0,12}") {
        let mut r = Record::new();
        prop_assert_eq!(r.format_id(), "././.");
        // info never affects the coordinate columns
        if !tag.is_empty() {
            r.append_info(tag);
        }
        prop_assert_eq!(r.format_id(), "././.");
    }
}
