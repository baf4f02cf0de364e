//! trivar CLI
//!
//! Command-line interface for multi-coordinate variant annotation.

use clap::{Parser, Subcommand};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use trivar::batch::{output_error_line, process_line, process_reader};
use trivar::{MockProvider, TranscriptDb, HEADER};

#[derive(Parser)]
#[command(name = "trivar")]
#[command(author, version, about = "Multi-coordinate variant annotator")]
#[command(
    long_about = "Annotate variants across genomic, transcript, and protein coordinates.

Examples:
  trivar annotate --db transcripts.json --genome genome.json 'chr1:g.100_102AAA>TTT'
  trivar annotate --db transcripts.json --genome genome.json -i queries.txt --header
  echo 'ALPHA:p.K17_R18delinsIW' | trivar annotate --db transcripts.json --genome genome.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate variant queries
    Annotate {
        /// Query string, e.g. 'chr1:g.100_102AAA>TTT'; reads --input or
        /// stdin when omitted
        query: Option<String>,

        /// Input file with one query per line (use - for stdin; .gz supported)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Transcript database (JSON array of transcripts)
        #[arg(long)]
        db: PathBuf,

        /// Reference genome (JSON object, contig name to sequence)
        #[arg(long)]
        genome: PathBuf,

        /// Print the column header before results
        #[arg(long)]
        header: bool,
    },

    /// Print the output column header
    Header,
}

fn open_input(path: &Path) -> io::Result<Box<dyn BufRead>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(path)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Header => {
            println!("{}", HEADER);
        }
        Commands::Annotate {
            query,
            input,
            db,
            genome,
            header,
        } => {
            let db = TranscriptDb::from_json(&db)?;
            let provider = MockProvider::from_json(&genome)?;

            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            let mut errw = io::stderr();

            if let Some(query) = query {
                let query = query.trim();
                if header {
                    writeln!(out, "{}", HEADER)?;
                }
                if let Err(e) = process_line(query, &db, &provider, &mut out) {
                    output_error_line(&mut errw, 1, query, &e)?;
                    out.flush()?;
                    std::process::exit(1);
                }
            } else {
                let reader: Box<dyn BufRead> = match &input {
                    Some(path) => open_input(path)?,
                    None => Box::new(BufReader::new(io::stdin())),
                };
                let summary = process_reader(reader, &db, &provider, &mut out, &mut errw, header)?;
                if summary.errors > 0 {
                    out.flush()?;
                    std::process::exit(1);
                }
            }
            out.flush()?;
        }
    }

    Ok(())
}
