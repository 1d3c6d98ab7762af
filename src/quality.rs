
use crate::common::RebinError;

// FIXME: We assume Sanger (Phred+33) format base qualities everywhere.
pub const QUALITY_OFFSET: u8 = 33;
pub const DEFAULT_THRESHOLD: i32 = 20;

// Output scores of threshold binarization
pub const LOW_QUALITY: u8 = 6;
pub const HIGH_QUALITY: u8 = 40;

/// Illumina 8-level binning. Index is the raw score, value is the score
/// written to the output.
pub const ILLUMINA8_TABLE: [u8; 44] = [
	 0,  0,  6,  6,  6,  6,  6,  6,  6,  6,   // 0x
	15, 15, 15, 15, 15, 15, 15, 15, 15, 15,   // 1x
	22, 22, 22, 22, 22, 27, 27, 27, 27, 27,   // 2x
	33, 33, 33, 33, 33, 37, 37, 37, 37, 37,   // 3x
	40, 40, 40, 40                            // 4x
];

/// A strategy for rewriting the base qualities of one FASTQ record.
pub trait Rebinner {
	fn describe(&self) -> String;

	/// Maps one encoded quality character to its replacement. Returns None
	/// if the character decodes to a score the strategy has no mapping for.
	fn rebin_char(&self, qual: u8) -> Option<u8>;

	/// Appends the rebinned version of a quality line (without its line
	/// terminator) to `out`. `line` is the 1-based input line number, used
	/// only for error reporting.
	fn rebin_line(&self, qual: &[u8], line: usize, out: &mut Vec<u8>)
		-> Result<(), RebinError> {
		out.reserve(qual.len());
		for (k, &q) in qual.iter().enumerate() {
			match self.rebin_char(q) {
				Some(binned) => out.push(binned),
				None => return Err(RebinError::OutOfRangeQuality {
					line, column: k + 1, score: decode(q) })
			}
		}
		Ok(())
	}
}

pub fn decode(qual: u8) -> i32 {
	qual as i32 - QUALITY_OFFSET as i32
}

fn encode(score: u8) -> u8 {
	score + QUALITY_OFFSET
}

pub struct Illumina8;

impl Rebinner for Illumina8 {
	fn describe(&self) -> String { "Illumina 8-level binning".into() }

	fn rebin_char(&self, qual: u8) -> Option<u8> {
		let score = decode(qual);
		if score < 0 { return None; }
		ILLUMINA8_TABLE.get(score as usize).map(|&binned| encode(binned))
	}
}

pub struct Threshold {
	pub threshold: i32
}

impl Default for Threshold {
	fn default() -> Threshold { Threshold { threshold: DEFAULT_THRESHOLD } }
}

impl Rebinner for Threshold {
	fn describe(&self) -> String {
		format!("binary thresholding at Q{}", self.threshold)
	}

	// Never fails. Characters below the offset decode to negative scores,
	// which still compare against the threshold.
	fn rebin_char(&self, qual: u8) -> Option<u8> {
		Some(encode(if decode(qual) >= self.threshold { HIGH_QUALITY } else { LOW_QUALITY }))
	}
}

/// Parses the optional threshold argument. An empty string means that the
/// argument was not given.
pub fn parse_threshold(arg: &str) -> Result<i32, RebinError> {
	if arg.is_empty() { return Ok(DEFAULT_THRESHOLD); }
	arg.trim().parse().map_err(|_| RebinError::InvalidArgument(
		format!("Threshold must be an integer, got '{}'.", arg)))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn scores_to_qual(scores: &[u8]) -> Vec<u8> {
		scores.iter().map(|&s| s + QUALITY_OFFSET).collect()
	}

	fn rebin(rebinner: &dyn Rebinner, scores: &[u8]) -> Vec<u8> {
		let mut out = Vec::new();
		rebinner.rebin_line(&scores_to_qual(scores), 4, &mut out).unwrap();
		out.iter().map(|&q| q - QUALITY_OFFSET).collect()
	}

	#[test]
	fn illumina8_table_breakpoints() {
		let expected = [(0, 1, 0), (2, 9, 6), (10, 19, 15), (20, 24, 22),
			(25, 29, 27), (30, 34, 33), (35, 39, 37), (40, 43, 40)];
		for &(lo, hi, binned) in &expected {
			for score in lo..=hi {
				assert_eq!(ILLUMINA8_TABLE[score], binned, "score {}", score);
			}
		}
	}

	#[test]
	fn illumina8_outputs_are_fixed_points() {
		for &binned in &[0u8, 6, 15, 22, 27, 33, 37, 40] {
			assert_eq!(ILLUMINA8_TABLE[binned as usize], binned);
		}
		for score in 0..ILLUMINA8_TABLE.len() {
			let once = ILLUMINA8_TABLE[score];
			assert_eq!(ILLUMINA8_TABLE[once as usize], once);
		}
	}

	#[test]
	fn illumina8_example_record() {
		assert_eq!(rebin(&Illumina8, &[2, 10, 25, 40]), vec![6, 15, 27, 40]);
	}

	#[test]
	fn illumina8_rejects_scores_above_table() {
		let mut out = Vec::new();
		let qual = scores_to_qual(&[30, 30, 44]);
		match Illumina8.rebin_line(&qual, 8, &mut out) {
			Err(RebinError::OutOfRangeQuality { line, column, score }) => {
				assert_eq!((line, column, score), (8, 3, 44));
			},
			other => panic!("expected out of range error, got {:?}", other)
		}
	}

	#[test]
	fn illumina8_rejects_characters_below_offset() {
		let mut out = Vec::new();
		match Illumina8.rebin_line(b"II ", 4, &mut out) {
			Err(RebinError::OutOfRangeQuality { column, score, .. }) => {
				assert_eq!((column, score), (3, -1));
			},
			other => panic!("expected out of range error, got {:?}", other)
		}
	}

	#[test]
	fn threshold_default_example() {
		assert_eq!(rebin(&Threshold::default(), &[5, 19, 20, 43]), vec![6, 6, 40, 40]);
	}

	#[test]
	fn threshold_boundary_is_inclusive() {
		for t in 1..60 {
			let rebinner = Threshold { threshold: t };
			let below = (t - 1) as u8;
			let at = t as u8;
			assert_eq!(rebin(&rebinner, &[below, at]), vec![LOW_QUALITY, HIGH_QUALITY]);
		}
	}

	#[test]
	fn threshold_accepts_scores_outside_table() {
		assert_eq!(rebin(&Threshold { threshold: 44 }, &[44, 60]), vec![40, 40]);
		// Space sits one below '!' and decodes to -1
		let mut out = Vec::new();
		Threshold::default().rebin_line(b" ", 4, &mut out).unwrap();
		assert_eq!(out, vec![LOW_QUALITY + QUALITY_OFFSET]);
	}

	#[test]
	fn raising_threshold_only_grows_low_region() {
		let scores: Vec<u8> = (0..=43).collect();
		let mut prev_low = 0;
		for t in 0..=45 {
			let low = rebin(&Threshold { threshold: t }, &scores).iter()
				.filter(|&&s| s == LOW_QUALITY).count();
			assert!(low >= prev_low);
			prev_low = low;
		}
	}

	#[test]
	fn threshold_argument_parsing() {
		assert_eq!(parse_threshold("").unwrap(), DEFAULT_THRESHOLD);
		assert_eq!(parse_threshold("30").unwrap(), 30);
		assert!(matches!(parse_threshold("high"), Err(RebinError::InvalidArgument(_))));
		assert!(matches!(parse_threshold("2.5"), Err(RebinError::InvalidArgument(_))));
	}
}
