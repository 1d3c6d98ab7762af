
use docopt::{Docopt, ArgvMap};
use std::process::{Command, Stdio, Child};
use std::io::{self, stdin, stdout, BufRead, BufReader, BufWriter, Read, Write};
use std::fs::File;
use thiserror::Error;

macro_rules! error {
	($($arg:tt)+) => ({
		use std::process::exit;
		eprint!("ERROR: "); eprintln!($($arg)+); exit(-1);
	})
}

#[derive(Debug, Error)]
pub enum RebinError {
	#[error("Cannot open file {path} for reading: {source}")]
	Open { path: String, source: io::Error },

	#[error("Cannot open file {path} for writing: {source}")]
	Create { path: String, source: io::Error },

	#[error("Cannot start {program} process: {source}")]
	Spawn { program: &'static str, source: io::Error },

	#[error("{program} process exited with {status}.")]
	ChildFailed { program: &'static str, status: std::process::ExitStatus },

	#[error("I/O error: {0}")]
	Io(#[from] io::Error),

	#[error("Quality score {score} on line {line}, column {column} is outside the binning table range 0-43.")]
	OutOfRangeQuality { line: usize, column: usize, score: i32 },

	#[error("Invalid FASTQ record on line {line}: {expected}.")]
	MalformedRecord { line: usize, expected: &'static str },

	#[error("{0}")]
	InvalidArgument(String),
}

pub fn parse_args(usage: &str) -> ArgvMap {
	Docopt::new(usage).unwrap().parse().unwrap_or_else(|_| {
		error!("Invalid arguments.\n{}", usage);
	})
}

pub trait PathArgs {
	fn get_path(&self, arg: &str) -> String;
}

impl PathArgs for ArgvMap {
	fn get_path(&self, arg: &str) -> String {
		expand_home(self.get_str(arg))
	}
}

fn expand_home(path: &str) -> String {
	if let Some(rest) = path.strip_prefix('~') {
		if let Ok(home) = std::env::var("HOME") {
			return format!("{}{}", home, rest);
		}
	}
	path.into()
}

// Byte-oriented reader. Lines are read with read_until() so that quality
// strings never go through UTF-8 decoding. Call finish() after reading to
// reap the decompressor, a truncated .gz file otherwise looks like EOF.
pub struct FileReader {
	bufread: Box<dyn BufRead>,
	gunzip: Option<Child>
}

impl FileReader {
	pub fn open(path: &str) -> Result<FileReader, RebinError> {
		if path == "-" {
			return Ok(FileReader {
				bufread: Box::new(BufReader::new(stdin())), gunzip: None });
		}

		let file = File::open(path).map_err(
			|source| RebinError::Open { path: path.into(), source })?;
		if path.ends_with(".gz") {
			let mut gunzip = Command::new("gunzip").arg("-c")
				.stdout(Stdio::piped()).stdin(file).spawn()
				.map_err(|source| RebinError::Spawn { program: "gunzip", source })?;
			let stdout = gunzip.stdout.take().ok_or_else(||
				RebinError::Io(io::Error::new(io::ErrorKind::BrokenPipe,
					"gunzip stdout unavailable")))?;
			Ok(FileReader { bufread: Box::new(BufReader::new(stdout)), gunzip: Some(gunzip) })
		} else {
			Ok(FileReader { bufread: Box::new(BufReader::new(file)), gunzip: None })
		}
	}

	pub fn finish(self) -> Result<(), RebinError> {
		let FileReader { bufread, gunzip } = self;
		drop(bufread);
		if let Some(mut child) = gunzip {
			let status = child.wait()?;
			if !status.success() {
				return Err(RebinError::ChildFailed { program: "gunzip", status });
			}
		}
		Ok(())
	}
}

impl Read for FileReader {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		self.bufread.read(buf)
	}
}

impl BufRead for FileReader {
	fn fill_buf(&mut self) -> io::Result<&[u8]> { self.bufread.fill_buf() }
	fn consume(&mut self, amt: usize) { self.bufread.consume(amt) }
}

// Writes to a plain file, standard output, or a gzip child process
// depending on the path. Call finish() to flush and reap the compressor.
pub struct FileWriter {
	out: BufWriter<Box<dyn Write>>,
	gzip: Option<Child>
}

impl FileWriter {
	pub fn create(path: &str) -> Result<FileWriter, RebinError> {
		if path == "-" {
			return Ok(FileWriter {
				out: BufWriter::new(Box::new(stdout())), gzip: None });
		}

		let file = File::create(path).map_err(
			|source| RebinError::Create { path: path.into(), source })?;
		if path.ends_with(".gz") {
			let mut gzip = Command::new("gzip").arg("-c")
				.stdin(Stdio::piped()).stdout(file).spawn()
				.map_err(|source| RebinError::Spawn { program: "gzip", source })?;
			let stdin = gzip.stdin.take().ok_or_else(||
				RebinError::Io(io::Error::new(io::ErrorKind::BrokenPipe,
					"gzip stdin unavailable")))?;
			Ok(FileWriter { out: BufWriter::new(Box::new(stdin)), gzip: Some(gzip) })
		} else {
			Ok(FileWriter { out: BufWriter::new(Box::new(file)), gzip: None })
		}
	}

	pub fn finish(mut self) -> Result<(), RebinError> {
		self.out.flush()?;
		let FileWriter { out, gzip } = self;
		drop(out);   // Closes the pipe so gzip sees end of input
		if let Some(mut child) = gzip {
			let status = child.wait()?;
			if !status.success() {
				return Err(RebinError::ChildFailed { program: "gzip", status });
			}
		}
		Ok(())
	}
}

impl Write for FileWriter {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> { self.out.write(buf) }
	fn flush(&mut self) -> io::Result<()> { self.out.flush() }
}
