//! Query-line parser.
//!
//! Input lines look like `TARGET:g.100_102AAA>TTT`, `ALPHA:c.49_51AAA>TTT`,
//! or `ALPHA:p.K17_R18delinsIW`. The target is a chromosome token for
//! genomic queries and a gene name or transcript accession otherwise.

use nom::character::complete::{char, digit1};
use nom::combinator::opt;
use nom::{IResult, Parser};

use crate::error::TrivarError;
use crate::pos::Pos;
use crate::query::{
    AnyPos, BlockCdna, BlockGdna, BlockProtein, BlockQuery, CoordSpace, EditQuery, Query, QueryKind,
};

fn parse_u64(input: &str) -> IResult<&str, u64> {
    let (rest, s) = digit1.parse(input)?;
    let value: u64 = s.parse().map_err(|_| {
        nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
    })?;
    Ok((rest, value))
}

fn parse_i64(input: &str) -> IResult<&str, i64> {
    let (rest, s) = digit1.parse(input)?;
    let value: i64 = s.parse().map_err(|_| {
        nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
    })?;
    Ok((rest, value))
}

/// Intronic offset: `+5` or `-10`.
fn parse_offset(input: &str) -> IResult<&str, i64> {
    let (rest, sign) = nom::branch::alt((char('+'), char('-'))).parse(input)?;
    let (rest, value) = parse_i64(rest)?;
    Ok((rest, if sign == '-' { -value } else { value }))
}

/// Transcript-space position: `100`, `100+5`, `101-3`, `-12`, `*7`.
pub fn parse_pos(input: &str) -> IResult<&str, Pos> {
    // *k or *k+off (3' UTR)
    if let Some(rest) = input.strip_prefix('*') {
        let (rest, base) = parse_i64(rest)?;
        let (rest, offset) = opt(parse_offset).parse(rest)?;
        return Ok((
            rest,
            Pos {
                base,
                offset: offset.unwrap_or(0),
                utr3: true,
            },
        ));
    }

    // -k or -k+off (5' UTR)
    if let Some(rest) = input.strip_prefix('-') {
        let (rest, base) = parse_i64(rest)?;
        let (rest, offset) = opt(parse_offset).parse(rest)?;
        return Ok((
            rest,
            Pos {
                base: -base,
                offset: offset.unwrap_or(0),
                utr3: false,
            },
        ));
    }

    let (rest, base) = parse_i64(input)?;
    if base == 0 {
        // positions are 1-based; 0 does not exist
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        )));
    }
    let (rest, offset) = opt(parse_offset).parse(rest)?;
    Ok((
        rest,
        Pos {
            base,
            offset: offset.unwrap_or(0),
            utr3: false,
        },
    ))
}

fn is_nuc(c: char) -> bool {
    matches!(
        c,
        'A' | 'C' | 'G' | 'T' | 'U' | 'N' | 'a' | 'c' | 'g' | 't' | 'u' | 'n'
    )
}

/// Non-empty nucleotide run, uppercased.
fn parse_nuc_seq(input: &str) -> IResult<&str, String> {
    let end = input.find(|c| !is_nuc(c)).unwrap_or(input.len());
    if end == 0 {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::TakeWhile1,
        )));
    }
    Ok((&input[end..], input[..end].to_ascii_uppercase()))
}

fn is_aa(c: char) -> bool {
    c.is_ascii_uppercase() || c == '*' || c == 'X'
}

/// Single-letter amino acid.
fn parse_aa(input: &str) -> IResult<&str, char> {
    match input.chars().next() {
        Some(c) if is_aa(c) => Ok((&input[1..], c)),
        _ => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Char,
        ))),
    }
}

/// Non-empty amino-acid run.
fn parse_aa_seq(input: &str) -> IResult<&str, String> {
    let end = input.find(|c| !is_aa(c)).unwrap_or(input.len());
    if end == 0 {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::TakeWhile1,
        )));
    }
    Ok((&input[end..], input[..end].to_string()))
}

/// Position of `rest` within `line`, for error reporting.
fn err_at(line: &str, rest: &str, msg: impl Into<String>) -> TrivarError {
    TrivarError::invalid_input(line.len() - rest.len(), msg)
}

/// Parse one query line.
pub fn parse_query(line: &str) -> Result<Query, TrivarError> {
    let line = line.trim();
    let (target, body) = line
        .split_once(':')
        .ok_or_else(|| TrivarError::invalid_input(0, "expected TARGET:mutation"))?;
    if target.is_empty() {
        return Err(TrivarError::invalid_input(0, "empty target"));
    }

    let (space, rest) = if let Some(rest) = body.strip_prefix("g.") {
        (CoordSpace::Gdna, rest)
    } else if let Some(rest) = body.strip_prefix("c.") {
        (CoordSpace::Cdna, rest)
    } else if let Some(rest) = body.strip_prefix("p.") {
        (CoordSpace::Protein, rest)
    } else {
        return Err(err_at(line, body, "expected g., c., or p. prefix"));
    };

    let kind = match space {
        CoordSpace::Gdna => parse_gdna_body(line, rest)?,
        CoordSpace::Cdna => parse_cdna_body(line, rest)?,
        CoordSpace::Protein => parse_protein_body(line, rest)?,
    };

    Ok(Query {
        op: line.to_string(),
        target: target.to_string(),
        space,
        kind,
    })
}

fn parse_gdna_body(line: &str, input: &str) -> Result<QueryKind, TrivarError> {
    let (rest, beg) =
        parse_u64(input).map_err(|_| err_at(line, input, "expected genomic position"))?;
    let (rest, end) = if let Some(r) = rest.strip_prefix('_') {
        parse_u64(r).map_err(|_| err_at(line, r, "expected genomic end position"))?
    } else {
        (rest, beg)
    };
    if end < beg {
        return Err(err_at(line, rest, "end position before begin position"));
    }

    if rest.is_empty() {
        return Ok(QueryKind::Region { beg, end });
    }

    let mk_pos = |p: u64| AnyPos::Gdna(p);
    parse_nuc_edit(
        line,
        rest,
        mk_pos(beg),
        mk_pos(end),
        CoordSpace::Gdna,
        move |refseq, altseq| {
            BlockQuery::Gdna(BlockGdna {
                beg,
                end,
                refseq,
                altseq,
            })
        },
    )
}

fn parse_cdna_body(line: &str, input: &str) -> Result<QueryKind, TrivarError> {
    let (rest, beg) =
        parse_pos(input).map_err(|_| err_at(line, input, "expected cDNA position"))?;
    let (rest, end) = if let Some(r) = rest.strip_prefix('_') {
        parse_pos(r).map_err(|_| err_at(line, r, "expected cDNA end position"))?
    } else {
        (rest, beg)
    };

    if rest.is_empty() {
        return Err(err_at(line, rest, "cDNA query requires an edit"));
    }

    parse_nuc_edit(
        line,
        rest,
        AnyPos::Cdna(beg),
        AnyPos::Cdna(end),
        CoordSpace::Cdna,
        move |refseq, altseq| {
            BlockQuery::Cdna(BlockCdna {
                beg,
                end,
                refseq,
                altseq,
            })
        },
    )
}

/// Shared nucleotide edit grammar: `REF>ALT`, `delREFinsALT`, `delins ALT`,
/// `del[REF|len]`, `insSEQ`, `dup[SEQ]`.
fn parse_nuc_edit(
    line: &str,
    input: &str,
    beg: AnyPos,
    end: AnyPos,
    space: CoordSpace,
    mk_block: impl Fn(Option<String>, String) -> BlockQuery,
) -> Result<QueryKind, TrivarError> {
    if let Some(rest) = input.strip_prefix("delins") {
        let (rest, altseq) =
            parse_nuc_seq(rest).map_err(|_| err_at(line, rest, "expected inserted sequence"))?;
        expect_end(line, rest)?;
        return Ok(QueryKind::Mnv(mk_block(None, altseq)));
    }

    if let Some(rest) = input.strip_prefix("del") {
        // deleted content: spelled-out sequence, a length, or nothing
        let (rest, delseq) = match parse_nuc_seq(rest) {
            Ok((r, s)) => (r, Some(s)),
            Err(_) => match parse_u64(rest) {
                Ok((r, _len)) => (r, None),
                Err(_) => (rest, None),
            },
        };
        if let Some(rest) = rest.strip_prefix("ins") {
            let (rest, altseq) = parse_nuc_seq(rest)
                .map_err(|_| err_at(line, rest, "expected inserted sequence"))?;
            expect_end(line, rest)?;
            return Ok(QueryKind::Mnv(mk_block(delseq, altseq)));
        }
        expect_end(line, rest)?;
        return Ok(QueryKind::Del(EditQuery {
            space,
            beg,
            end,
            seq: delseq,
        }));
    }

    if let Some(rest) = input.strip_prefix("ins") {
        let (rest, seq) =
            parse_nuc_seq(rest).map_err(|_| err_at(line, rest, "expected inserted sequence"))?;
        expect_end(line, rest)?;
        return Ok(QueryKind::Ins(EditQuery {
            space,
            beg,
            end,
            seq: Some(seq),
        }));
    }

    if let Some(rest) = input.strip_prefix("dup") {
        let (rest, seq) = match parse_nuc_seq(rest) {
            Ok((r, s)) => (r, Some(s)),
            Err(_) => (rest, None),
        };
        expect_end(line, rest)?;
        return Ok(QueryKind::Dup(EditQuery {
            space,
            beg,
            end,
            seq,
        }));
    }

    // REF>ALT or >ALT
    let (rest, refseq) = match parse_nuc_seq(input) {
        Ok((r, s)) => (r, Some(s)),
        Err(_) => (input, None),
    };
    let rest = rest
        .strip_prefix('>')
        .ok_or_else(|| err_at(line, rest, "expected edit (>, del, ins, dup)"))?;
    let (rest, altseq) =
        parse_nuc_seq(rest).map_err(|_| err_at(line, rest, "expected alternate sequence"))?;
    expect_end(line, rest)?;
    Ok(QueryKind::Mnv(mk_block(refseq, altseq)))
}

fn parse_protein_body(line: &str, input: &str) -> Result<QueryKind, TrivarError> {
    let (rest, beg_aa) =
        parse_aa(input).map_err(|_| err_at(line, input, "expected amino acid"))?;
    let (rest, beg) =
        parse_i64(rest).map_err(|_| err_at(line, rest, "expected amino-acid position"))?;

    // range form: p.K17_R18...
    if let Some(r) = rest.strip_prefix('_') {
        let (r, end_aa) = parse_aa(r).map_err(|_| err_at(line, r, "expected amino acid"))?;
        let (r, end) =
            parse_i64(r).map_err(|_| err_at(line, r, "expected amino-acid position"))?;
        if end < beg {
            return Err(err_at(line, r, "end position before begin position"));
        }
        return parse_protein_edit(line, r, beg, end, Some(beg_aa), Some(end_aa));
    }

    // frameshift: p.R97Pfs*23 or p.R97fs
    let fs = match parse_aa(rest) {
        Ok((r2, aa)) if r2.starts_with("fs") => Some((Some(aa), &r2[2..])),
        _ => rest.strip_prefix("fs").map(|r2| (None, r2)),
    };
    if let Some((alt_aa, r)) = fs {
        let (r, stop_index) = match r.strip_prefix('*') {
            Some(r2) => {
                let (r2, n) =
                    parse_i64(r2).map_err(|_| err_at(line, r2, "expected stop distance"))?;
                (r2, Some(n))
            }
            None => (r, None),
        };
        expect_end(line, r)?;
        return Ok(QueryKind::Frameshift {
            pos: beg,
            ref_aa: beg_aa,
            alt_aa,
            stop_index,
        });
    }

    // single-residue edits: p.E545K, p.E545delinsKR, p.K17del, ...
    if rest.is_empty() {
        return Err(err_at(line, rest, "protein query requires an edit"));
    }
    if let Ok((r, alt)) = parse_aa_seq(rest) {
        if r.is_empty() {
            return Ok(QueryKind::Mnv(BlockQuery::Protein(BlockProtein {
                beg,
                end: beg,
                beg_aa: Some(beg_aa),
                end_aa: Some(beg_aa),
                refseq: None,
                altseq: alt,
            })));
        }
    }
    parse_protein_edit(line, rest, beg, beg, Some(beg_aa), Some(beg_aa))
}

/// Protein edit grammar after the position(s): `delins`, `del`, `ins`, `dup`.
fn parse_protein_edit(
    line: &str,
    input: &str,
    beg: i64,
    end: i64,
    beg_aa: Option<char>,
    end_aa: Option<char>,
) -> Result<QueryKind, TrivarError> {
    let mk_pos = |index: i64, aa: Option<char>| AnyPos::Protein { index, aa };

    if let Some(rest) = input.strip_prefix("delins") {
        let (rest, altseq) =
            parse_aa_seq(rest).map_err(|_| err_at(line, rest, "expected replacement residues"))?;
        expect_end(line, rest)?;
        return Ok(QueryKind::Mnv(BlockQuery::Protein(BlockProtein {
            beg,
            end,
            beg_aa,
            end_aa,
            refseq: None,
            altseq,
        })));
    }

    if let Some(rest) = input.strip_prefix("del") {
        let (rest, delseq) = match parse_aa_seq(rest) {
            Ok((r, s)) => (r, Some(s)),
            Err(_) => (rest, None),
        };
        if let Some(rest) = rest.strip_prefix("ins") {
            let (rest, altseq) = parse_aa_seq(rest)
                .map_err(|_| err_at(line, rest, "expected replacement residues"))?;
            expect_end(line, rest)?;
            return Ok(QueryKind::Mnv(BlockQuery::Protein(BlockProtein {
                beg,
                end,
                beg_aa,
                end_aa,
                refseq: delseq,
                altseq,
            })));
        }
        expect_end(line, rest)?;
        return Ok(QueryKind::Del(EditQuery {
            space: CoordSpace::Protein,
            beg: mk_pos(beg, beg_aa),
            end: mk_pos(end, end_aa),
            seq: delseq,
        }));
    }

    if let Some(rest) = input.strip_prefix("ins") {
        let (rest, seq) =
            parse_aa_seq(rest).map_err(|_| err_at(line, rest, "expected inserted residues"))?;
        expect_end(line, rest)?;
        return Ok(QueryKind::Ins(EditQuery {
            space: CoordSpace::Protein,
            beg: mk_pos(beg, beg_aa),
            end: mk_pos(end, end_aa),
            seq: Some(seq),
        }));
    }

    if let Some(rest) = input.strip_prefix("dup") {
        let (rest, seq) = match parse_aa_seq(rest) {
            Ok((r, s)) => (r, Some(s)),
            Err(_) => (rest, None),
        };
        expect_end(line, rest)?;
        return Ok(QueryKind::Dup(EditQuery {
            space: CoordSpace::Protein,
            beg: mk_pos(beg, beg_aa),
            end: mk_pos(end, end_aa),
            seq,
        }));
    }

    Err(err_at(line, input, "expected protein edit (delins, del, ins, dup)"))
}

fn expect_end(line: &str, rest: &str) -> Result<(), TrivarError> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(err_at(line, rest, format!("trailing input: {}", rest)))
    }
}
