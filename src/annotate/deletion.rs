//! Protein deletion notation.

use crate::codon::translate_seq;
use crate::record::DELETED_RUN_MAX;

/// Build the protein notation for deleting codons `beg..=end` (1-based).
/// The deleted window is rolled to its 3'-most equivalent position; the
/// deleted run is spelled out when short and rendered as a count otherwise.
pub fn taa_del_notation(cds: &str, beg: i64, end: i64) -> String {
    let taa = translate_seq(cds);
    let taa = taa.as_bytes();
    let mut beg = beg.max(1) as usize;
    let mut end = (end.max(beg as i64) as usize).min(taa.len());

    // 3' rule: shift the deleted window right while the residue entering it
    // equals the residue leaving it.
    while end < taa.len() && taa[beg - 1] == taa[end] {
        beg += 1;
        end += 1;
    }

    let deleted = String::from_utf8_lossy(&taa[beg - 1..end]).into_owned();
    let spelled = if deleted.len() <= DELETED_RUN_MAX {
        deleted.clone()
    } else {
        deleted.len().to_string()
    };

    if beg == end {
        format!("{}{}del{}", taa[beg - 1] as char, beg, spelled)
    } else {
        format!(
            "{}{}_{}{}del{}",
            taa[beg - 1] as char,
            beg,
            taa[end - 1] as char,
            end,
            spelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // MKAAAL*
    const CDS: &str = "ATGAAAGCTGCAGCCCTTTAA";

    #[test]
    fn test_single_deletion() {
        assert_eq!(taa_del_notation(CDS, 2, 2), "K2delK");
    }

    #[test]
    fn test_range_deletion() {
        assert_eq!(taa_del_notation(CDS, 2, 4), "K2_A4delKAA");
    }

    #[test]
    fn test_deletion_rolls_right() {
        // deleting one A of the AAA run normalizes to the 3'-most copy
        assert_eq!(taa_del_notation(CDS, 3, 3), "A5delA");
    }

    #[test]
    fn test_long_deletion_renders_count() {
        // 12 residues deleted: spelled as a count, not a run
        let mut cds = String::from("ATG");
        cds.push_str(&"TGG".repeat(12)); // W x 12
        cds.push_str("CTTTAA");
        let notation = taa_del_notation(&cds, 2, 13);
        assert_eq!(notation, "W2_W13del12");
    }
}
