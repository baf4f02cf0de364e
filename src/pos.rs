//! Transcript-space positions.
//!
//! A [`Pos`] is anchored to the coding sequence: `base` is the 1-based CDS
//! coordinate of the anchoring exonic base (negative for 5' UTR, `utr3` for
//! 3' UTR), and `offset` is the signed distance into the adjacent intron.
//! `offset == 0` means the position is exactly on the exonic base.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A transcript-space position with intronic offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pos {
    /// 1-based CDS coordinate of the anchor base. Negative values are 5' UTR
    /// (`c.-k`); with `utr3` set, `base = k` means `c.*k`.
    pub base: i64,
    /// Signed intronic offset from the anchor (0 = exonic).
    pub offset: i64,
    /// Anchor lies in the 3' UTR.
    pub utr3: bool,
}

impl Pos {
    /// An exonic position.
    pub fn exonic(base: i64) -> Self {
        Pos {
            base,
            offset: 0,
            utr3: false,
        }
    }

    /// An intronic position relative to the exonic anchor `base`.
    pub fn intronic(base: i64, offset: i64) -> Self {
        Pos {
            base,
            offset,
            utr3: false,
        }
    }

    /// A 3' UTR position (`c.*base`).
    pub fn utr3(base: i64) -> Self {
        Pos {
            base,
            offset: 0,
            utr3: true,
        }
    }

    /// Whether the position sits inside an intron.
    pub fn is_intronic(&self) -> bool {
        self.offset != 0
    }

    /// The anchor adjusted to land just inside the downstream exon when the
    /// position is in the intron 3' of its anchor.
    pub fn included_plus(&self) -> i64 {
        if self.offset > 0 {
            self.base + 1
        } else {
            self.base
        }
    }

    /// The anchor adjusted to land just inside the upstream exon when the
    /// position is in the intron 5' of its anchor.
    pub fn included_minus(&self) -> i64 {
        if self.offset < 0 {
            self.base - 1
        } else {
            self.base
        }
    }
}

/// Whether two positions denote the same intron: both intronic, and their
/// upstream projections coincide.
pub fn same_intron(p1: &Pos, p2: &Pos) -> bool {
    p1.is_intronic()
        && p2.is_intronic()
        && p1.utr3 == p2.utr3
        && p1.included_minus() == p2.included_minus()
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.utr3 {
            write!(f, "*{}", self.base)?;
        } else {
            write!(f, "{}", self.base)?;
        }
        if self.offset > 0 {
            write!(f, "+{}", self.offset)?;
        } else if self.offset < 0 {
            write!(f, "{}", self.offset)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Pos::exonic(100).to_string(), "100");
        assert_eq!(Pos::intronic(100, 5).to_string(), "100+5");
        assert_eq!(Pos::intronic(101, -3).to_string(), "101-3");
        assert_eq!(Pos::exonic(-12).to_string(), "-12");
        assert_eq!(Pos::utr3(7).to_string(), "*7");
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(Pos::exonic(5), Pos::exonic(5));
        assert_ne!(Pos::exonic(5), Pos::intronic(5, 1));
        assert_ne!(Pos::exonic(5), Pos::utr3(5));
    }

    #[test]
    fn test_included_projections() {
        let p = Pos::intronic(100, 5);
        assert_eq!(p.included_plus(), 101);
        assert_eq!(p.included_minus(), 100);

        let q = Pos::intronic(101, -3);
        assert_eq!(q.included_plus(), 101);
        assert_eq!(q.included_minus(), 100);

        let e = Pos::exonic(100);
        assert_eq!(e.included_plus(), 100);
        assert_eq!(e.included_minus(), 100);
    }

    #[test]
    fn test_same_intron() {
        // both sit in the intron between c.100 and c.101
        let a = Pos::intronic(100, 5);
        let b = Pos::intronic(101, -3);
        assert!(same_intron(&a, &b));
        assert!(same_intron(&a, &a));

        // exonic positions never share an intron
        assert!(!same_intron(&Pos::exonic(100), &b));
        // different introns
        let c = Pos::intronic(205, 2);
        assert!(!same_intron(&a, &c));
    }
}
