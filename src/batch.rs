//! Line-oriented batch processing.
//!
//! Each input line is parsed and annotated independently; a failure on one
//! line never affects the others. Output write failures are the one fatal
//! exception: the driver propagates them so the process can terminate.

use std::io::{self, BufRead, Write};

use crate::annotate::annotate_query;
use crate::error::TrivarError;
use crate::query::parse_query;
use crate::record::HEADER;
use crate::reference::db::TranscriptDb;
use crate::reference::provider::GenomeProvider;

/// Counters for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Query lines processed (blank lines and comments excluded).
    pub lines: usize,
    /// Lines that failed to parse or annotate.
    pub errors: usize,
}

/// Annotate one query line, writing one output line per record.
pub fn process_line<P: GenomeProvider, W: Write>(
    line: &str,
    db: &TranscriptDb,
    provider: &P,
    out: &mut W,
) -> Result<(), TrivarError> {
    let q = parse_query(line)?;
    let records = annotate_query(&q, db, provider)?;
    for record in &records {
        writeln!(out, "{}", record.format_line(Some(&q.op)))?;
    }
    Ok(())
}

/// Report a failed input line with its line number.
pub fn output_error_line<W: Write>(
    w: &mut W,
    line_number: usize,
    input: &str,
    error: &TrivarError,
) -> io::Result<()> {
    writeln!(w, "ERROR (line {}): {} - {}", line_number, input, error)
}

/// Process a stream of query lines. Per-line failures are reported to `errw`
/// and counted; IO failures on either writer terminate the batch.
pub fn process_reader<P, R, W, E>(
    reader: R,
    db: &TranscriptDb,
    provider: &P,
    out: &mut W,
    errw: &mut E,
    header: bool,
) -> Result<BatchSummary, TrivarError>
where
    P: GenomeProvider,
    R: BufRead,
    W: Write,
    E: Write,
{
    if header {
        writeln!(out, "{}", HEADER)?;
    }

    let mut summary = BatchSummary::default();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        summary.lines += 1;
        match process_line(line, db, provider, out) {
            Ok(()) => {}
            Err(e @ TrivarError::Io { .. }) => return Err(e),
            Err(e) => {
                summary.errors += 1;
                output_error_line(errw, i + 1, line, &e)?;
            }
        }
    }
    Ok(summary)
}
