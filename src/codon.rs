//! Standard genetic code.
//!
//! Amino acids are single-letter codes throughout (`*` for stop) because the
//! protein-range notation this crate emits is single-letter. Codons are
//! upper-case DNA triplets; `U` is accepted and folded to `T` on lookup.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// The standard genetic code, in alphabetical codon order. The per-amino-acid
/// codon lists derived from it inherit this order, which fixes the codon
/// chosen when reverse-translating an amino acid.
const GENETIC_CODE: &[(&str, char)] = &[
    ("AAA", 'K'),
    ("AAC", 'N'),
    ("AAG", 'K'),
    ("AAT", 'N'),
    ("ACA", 'T'),
    ("ACC", 'T'),
    ("ACG", 'T'),
    ("ACT", 'T'),
    ("AGA", 'R'),
    ("AGC", 'S'),
    ("AGG", 'R'),
    ("AGT", 'S'),
    ("ATA", 'I'),
    ("ATC", 'I'),
    ("ATG", 'M'),
    ("ATT", 'I'),
    ("CAA", 'Q'),
    ("CAC", 'H'),
    ("CAG", 'Q'),
    ("CAT", 'H'),
    ("CCA", 'P'),
    ("CCC", 'P'),
    ("CCG", 'P'),
    ("CCT", 'P'),
    ("CGA", 'R'),
    ("CGC", 'R'),
    ("CGG", 'R'),
    ("CGT", 'R'),
    ("CTA", 'L'),
    ("CTC", 'L'),
    ("CTG", 'L'),
    ("CTT", 'L'),
    ("GAA", 'E'),
    ("GAC", 'D'),
    ("GAG", 'E'),
    ("GAT", 'D'),
    ("GCA", 'A'),
    ("GCC", 'A'),
    ("GCG", 'A'),
    ("GCT", 'A'),
    ("GGA", 'G'),
    ("GGC", 'G'),
    ("GGG", 'G'),
    ("GGT", 'G'),
    ("GTA", 'V'),
    ("GTC", 'V'),
    ("GTG", 'V'),
    ("GTT", 'V'),
    ("TAA", '*'),
    ("TAC", 'Y'),
    ("TAG", '*'),
    ("TAT", 'Y'),
    ("TCA", 'S'),
    ("TCC", 'S'),
    ("TCG", 'S'),
    ("TCT", 'S'),
    ("TGA", '*'),
    ("TGC", 'C'),
    ("TGG", 'W'),
    ("TGT", 'C'),
    ("TTA", 'L'),
    ("TTC", 'F'),
    ("TTG", 'L'),
    ("TTT", 'F'),
];

static CODON_TO_AA: Lazy<HashMap<&'static str, char>> =
    Lazy::new(|| GENETIC_CODE.iter().copied().collect());

static AA_TO_CODONS: Lazy<HashMap<char, Vec<&'static str>>> = Lazy::new(|| {
    let mut map: HashMap<char, Vec<&'static str>> = HashMap::new();
    for (codon, aa) in GENETIC_CODE {
        map.entry(*aa).or_default().push(codon);
    }
    map
});

/// Translate a single codon to its amino acid. `U` is treated as `T`; lookup
/// is case-insensitive. Returns `None` for anything that is not a recognized
/// triplet (wrong length, ambiguity codes).
pub fn codon2aa(codon: &str) -> Option<char> {
    if codon.len() != 3 {
        return None;
    }
    let mut key = [0u8; 3];
    for (i, b) in codon.bytes().enumerate() {
        key[i] = match b.to_ascii_uppercase() {
            b'U' => b'T',
            c => c,
        };
    }
    let key = std::str::from_utf8(&key).ok()?;
    CODON_TO_AA.get(key).copied()
}

/// Translate a nucleotide sequence codon-by-codon. Unrecognized codons
/// translate to `X`; a trailing partial codon is ignored.
pub fn translate_seq(seq: &str) -> String {
    let bytes = seq.as_bytes();
    let mut out = String::with_capacity(bytes.len() / 3);
    for chunk in bytes.chunks_exact(3) {
        let codon = std::str::from_utf8(chunk).unwrap_or("NNN");
        out.push(codon2aa(codon).unwrap_or('X'));
    }
    out
}

/// All codons encoding `aa`, in the fixed table order. Empty for unknown
/// amino-acid letters.
pub fn aa2codon(aa: char) -> &'static [&'static str] {
    AA_TO_CODONS
        .get(&aa.to_ascii_uppercase())
        .map(|v| v.as_slice())
        .unwrap_or(&[])
}

/// Whether a codon is one of the three stop codons.
pub fn is_stop_codon(codon: &str) -> bool {
    codon2aa(codon) == Some('*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codon2aa() {
        assert_eq!(codon2aa("ATG"), Some('M'));
        assert_eq!(codon2aa("AAA"), Some('K'));
        assert_eq!(codon2aa("TTT"), Some('F'));
        assert_eq!(codon2aa("TAA"), Some('*'));
        assert_eq!(codon2aa("aug"), Some('M')); // RNA, lower case
        assert_eq!(codon2aa("ATN"), None);
        assert_eq!(codon2aa("AT"), None);
    }

    #[test]
    fn test_translate_seq() {
        assert_eq!(translate_seq("ATGAAATTT"), "MKF");
        assert_eq!(translate_seq("ATGTAA"), "M*");
        // trailing partial codon is dropped
        assert_eq!(translate_seq("ATGAA"), "M");
        assert_eq!(translate_seq(""), "");
    }

    #[test]
    fn test_aa2codon_order_is_stable() {
        assert_eq!(aa2codon('K'), &["AAA", "AAG"]);
        assert_eq!(aa2codon('F'), &["TTC", "TTT"]);
        assert_eq!(aa2codon('M'), &["ATG"]);
        assert_eq!(aa2codon('W'), &["TGG"]);
        assert_eq!(aa2codon('L').len(), 6);
        assert_eq!(aa2codon('*'), &["TAA", "TAG", "TGA"]);
        assert!(aa2codon('?').is_empty());
    }

    #[test]
    fn test_is_stop_codon() {
        assert!(is_stop_codon("TAA"));
        assert!(is_stop_codon("TAG"));
        assert!(is_stop_codon("TGA"));
        assert!(!is_stop_codon("TGG"));
    }

    #[test]
    fn test_code_covers_64_codons() {
        assert_eq!(GENETIC_CODE.len(), 64);
        let sense: usize = GENETIC_CODE.iter().filter(|(_, aa)| *aa != '*').count();
        assert_eq!(sense, 61);
    }
}
