
use crate::common::{FileReader, FileWriter, RebinError};
use crate::quality::{Rebinner, Illumina8, Threshold};
use std::io::{BufRead, Write};

#[derive(Debug, Default, PartialEq)]
pub struct RebinStats {
	pub lines: usize,
	pub records: usize,
	pub quality_lines: usize,
	pub truncated: bool
}

#[derive(Default)]
pub struct RebinOptions {
	pub check: bool
}

// Same set as Python's str.strip(), which also removes vertical tabs
fn is_space(b: u8) -> bool {
	matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0B' | b'\x0C')
}

fn trim_end(line: &[u8]) -> &[u8] {
	let mut end = line.len();
	while end > 0 && is_space(line[end - 1]) { end -= 1; }
	&line[..end]
}

fn check_prefix(line: &[u8], prefix: u8, line_num: usize, expected: &'static str)
	-> Result<(), RebinError> {
	if line.first() == Some(&prefix) { return Ok(()); }
	Err(RebinError::MalformedRecord { line: line_num, expected })
}

/// Copies a FASTQ stream from `input` to `output`, rewriting every fourth
/// line with `rebinner`. Lines are counted modulo 4 without looking at their
/// contents unless `check` is set, so a truncated final record is simply
/// copied as far as it goes.
pub fn rebin_stream<R: BufRead, W: Write>(input: &mut R, output: &mut W,
	rebinner: &dyn Rebinner, check: bool) -> Result<RebinStats, RebinError> {

	let mut stats = RebinStats::default();
	let mut line = Vec::new();
	let mut binned = Vec::new();
	let mut seq_len = 0;
	let mut pos = 0;

	loop {
		line.clear();
		if input.read_until(b'\n', &mut line)? == 0 { break; }
		stats.lines += 1;

		if pos != 3 {
			if check {
				match pos {
					0 => check_prefix(&line, b'@', stats.lines, "header must start with '@'")?,
					1 => seq_len = trim_end(&line).len(),
					_ => check_prefix(&line, b'+', stats.lines, "separator must start with '+'")?
				}
			}
			output.write_all(&line)?;
			pos += 1;
			continue;
		}

		let qual = trim_end(&line);
		if check && qual.len() != seq_len {
			return Err(RebinError::MalformedRecord { line: stats.lines,
				expected: "quality string must be as long as the sequence" });
		}

		binned.clear();
		rebinner.rebin_line(qual, stats.lines, &mut binned)?;
		binned.push(b'\n');
		output.write_all(&binned)?;
		stats.quality_lines += 1;
		pos = 0;
	}

	stats.truncated = pos != 0;
	stats.records = stats.quality_lines + stats.truncated as usize;
	Ok(stats)
}

// Both handles are dropped (and thereby closed) on every return path. On
// error the output is left partially written.
fn rebin_file(in_path: &str, out_path: &str, rebinner: &dyn Rebinner,
	options: &RebinOptions) -> Result<RebinStats, RebinError> {
	let mut input = FileReader::open(in_path)?;
	let mut output = FileWriter::create(out_path)?;
	let stats = rebin_stream(&mut input, &mut output, rebinner, options.check)?;
	input.finish()?;
	output.finish()?;
	Ok(stats)
}

pub fn rebin_illumina8(in_path: &str, out_path: &str, options: &RebinOptions)
	-> Result<RebinStats, RebinError> {
	rebin_file(in_path, out_path, &Illumina8, options)
}

pub fn rebin_threshold(in_path: &str, out_path: &str, threshold: i32,
	options: &RebinOptions) -> Result<RebinStats, RebinError> {
	rebin_file(in_path, out_path, &Threshold { threshold }, options)
}
