//! Protein insertion notation.

use crate::codon::translate_seq;

/// Build the protein notation for residues inserted after codon `index`
/// (1-based). The inserted run is rolled to its 3'-most equivalent position
/// first; insertions that duplicate the immediately preceding residues
/// render as `dup`.
pub fn taa_ins_notation(cds: &str, index: i64, insseq: &str) -> String {
    let taa = translate_seq(cds);
    let taa = taa.as_bytes();
    let ins = insseq.as_bytes();
    let mut index = index.max(0) as usize;
    let mut rolled: Vec<u8> = ins.to_vec();

    // 3' rule: while the residue after the insertion point equals the first
    // inserted residue, shift the insertion right by one.
    while index < taa.len() && !rolled.is_empty() && taa[index] == rolled[0] {
        rolled.rotate_left(1);
        index += 1;
    }

    let ins_str = String::from_utf8_lossy(&rolled).into_owned();

    // duplication: inserted run equals the residues ending at `index`
    if index >= rolled.len() && !rolled.is_empty() {
        let pre = &taa[index - rolled.len()..index];
        if pre == rolled.as_slice() {
            return if rolled.len() == 1 {
                format!("{}{}dup", rolled[0] as char, index)
            } else {
                format!(
                    "{}{}_{}{}dup",
                    rolled[0] as char,
                    index - rolled.len() + 1,
                    rolled[rolled.len() - 1] as char,
                    index
                )
            };
        }
    }

    let left = taa
        .get(index.wrapping_sub(1))
        .map(|&b| b as char)
        .unwrap_or('?');
    let right = taa.get(index).map(|&b| b as char).unwrap_or('*');
    format!("{}{}_{}{}ins{}", left, index, right, index + 1, ins_str)
}
