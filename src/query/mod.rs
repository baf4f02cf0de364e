//! Query model: a typed, parsed variant request.
//!
//! One query is built per input line and consumed read-only by the
//! annotation paths. The variant kind taxonomy mirrors the input grammar;
//! block substitutions (which subsume single-nucleotide variants) carry
//! space-specific payloads because the three coordinate spaces use different
//! position types.

pub mod parser;

pub use parser::parse_query;

use crate::pos::Pos;
use serde::{Deserialize, Serialize};

/// Coordinate space of a query, implied by its `g.`/`c.`/`p.` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordSpace {
    Gdna,
    Cdna,
    Protein,
}

impl std::fmt::Display for CoordSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordSpace::Gdna => write!(f, "g"),
            CoordSpace::Cdna => write!(f, "c"),
            CoordSpace::Protein => write!(f, "p"),
        }
    }
}

/// A position in any of the three coordinate spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnyPos {
    Gdna(u64),
    Cdna(Pos),
    Protein { index: i64, aa: Option<char> },
}

/// Block substitution in genomic space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockGdna {
    pub beg: u64,
    pub end: u64,
    pub refseq: Option<String>,
    pub altseq: String,
}

/// Block substitution in transcript space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockCdna {
    pub beg: Pos,
    pub end: Pos,
    pub refseq: Option<String>,
    pub altseq: String,
}

/// Block substitution in protein space (amino-acid letters).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockProtein {
    pub beg: i64,
    pub end: i64,
    pub beg_aa: Option<char>,
    pub end_aa: Option<char>,
    pub refseq: Option<String>,
    pub altseq: String,
}

/// Block substitution, space-dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockQuery {
    Gdna(BlockGdna),
    Cdna(BlockCdna),
    Protein(BlockProtein),
}

/// Deletion, insertion, or duplication payload. These kinds parse into the
/// model but are annotated by sibling tools; trivar reports them as
/// unsupported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditQuery {
    pub space: CoordSpace,
    pub beg: AnyPos,
    pub end: AnyPos,
    /// Deleted, inserted, or duplicated sequence when spelled out.
    pub seq: Option<String>,
}

/// The variant kind of a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryKind {
    /// Bare genomic span; classification only, no edit.
    Region { beg: u64, end: u64 },
    /// Block substitution (single-base substitutions are length-1 blocks).
    Mnv(BlockQuery),
    Del(EditQuery),
    Ins(EditQuery),
    Dup(EditQuery),
    /// Protein frameshift, e.g. `p.R97Pfs*23`.
    Frameshift {
        pos: i64,
        ref_aa: char,
        alt_aa: Option<char>,
        stop_index: Option<i64>,
    },
}

impl QueryKind {
    /// Short kind label used in error reporting.
    pub fn label(&self) -> &'static str {
        match self {
            QueryKind::Region { .. } => "region",
            QueryKind::Mnv(_) => "mnv",
            QueryKind::Del(_) => "deletion",
            QueryKind::Ins(_) => "insertion",
            QueryKind::Dup(_) => "duplication",
            QueryKind::Frameshift { .. } => "frameshift",
        }
    }
}

/// A parsed input query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Original input token, echoed as the first output column.
    pub op: String,
    /// Chromosome for genomic queries, gene or transcript accession for
    /// cDNA/protein queries.
    pub target: String,
    pub space: CoordSpace,
    pub kind: QueryKind,
}
