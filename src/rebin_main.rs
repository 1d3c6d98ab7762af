
extern crate docopt;

#[macro_use] mod common;
mod quality; mod rebin;

use common::{parse_args, PathArgs};
use quality::{parse_threshold, Rebinner, Illumina8, Threshold, DEFAULT_THRESHOLD};
use rebin::{rebin_illumina8, rebin_threshold, RebinOptions};

const USAGE: &str = "
Usage:
  rebin_fastq [options] <in_fastq> <out_fastq> <mode> [--] [<threshold>]

Rewrites the base qualities of a FASTQ file (Phred+33) into a small number
of discrete levels. Header, sequence and separator lines are copied as is.
Use '-' for standard input or output. Paths ending in .gz are read through
gunzip and written through gzip.

Modes:
  B    Illumina 8-level binning
  T    Binary thresholding: qualities >= threshold become 40, others 6
       (default threshold: 20). Put '--' before a negative threshold.

Options:
  --check      Verify that every record has a '@' header, a '+' separator
               and a quality string as long as the sequence
  -q --quiet   Do not print progress messages
";

fn main() {
	let args = parse_args(USAGE);
	let in_path = args.get_path("<in_fastq>");
	let out_path = args.get_path("<out_fastq>");
	let mode = args.get_str("<mode>");
	let quiet = args.get_bool("--quiet");
	let options = RebinOptions { check: args.get_bool("--check") };

	if mode != "B" && mode != "T" {
		error!("Invalid mode '{}', must be B or T.\n{}", mode, USAGE);
	}
	// The threshold argument is ignored in binning mode
	let threshold = if mode == "T" {
		parse_threshold(args.get_str("<threshold>"))
			.unwrap_or_else(|e| error!("{}\n{}", e, USAGE))
	} else { DEFAULT_THRESHOLD };

	if !quiet {
		let strategy = if mode == "B" { Illumina8.describe() }
			else { Threshold { threshold }.describe() };
		eprintln!("Rebinning {} into {} ({})...", in_path, out_path, strategy);
	}

	let result = if mode == "B" {
		rebin_illumina8(&in_path, &out_path, &options)
	} else {
		rebin_threshold(&in_path, &out_path, threshold, &options)
	};
	let stats = result.unwrap_or_else(|e| error!("{}", e));

	if stats.truncated {
		eprintln!("WARNING: Last record in {} is incomplete ({} lines in total).",
			in_path, stats.lines);
	}
	if !quiet {
		eprintln!("Done. Processed {} records ({} quality lines rewritten).",
			stats.records, stats.quality_lines);
	}
}
