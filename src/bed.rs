//! mask fasta sequences using bed intervals
//! Alejandro Gonzales-Irribarren, 2025
//!
//! BED intake on top of `genepred`. Only the first three columns (name,
//! start, stop) are used; any extra BED columns are ignored.

use crate::{
    core::is_compressed_path,
    error::{FaMaskError, Result},
};

use genepred::{
    Bed3, GenePred, Reader,
    reader::{Compression, ReaderError},
};

use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};

/// A raw BED3 record: `name start stop`, 0-based half-open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BedRecord {
    pub name: String,
    pub start: u32,
    pub stop: u32,
}

impl BedRecord {
    pub fn new<N: Into<String>>(name: N, start: u32, stop: u32) -> Self {
        Self {
            name: name.into(),
            start,
            stop,
        }
    }
}

/// BED3 reader that keeps the source path for error messages.
pub struct BedReader {
    inner: Reader<Bed3>,
    path: PathBuf,
}

impl BedReader {
    /// Opens a plain or gzip-compressed BED file.
    ///
    /// Plain files are memory-mapped; compressed ones are streamed.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(FaMaskError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let inner = read_regions(path).map_err(|err| FaMaskError::FileOpen {
            path: path.to_path_buf(),
            source: match err {
                ReaderError::Io(source) | ReaderError::Mmap(source) => source,
                other => io::Error::other(other.to_string()),
            },
        })?;

        Ok(Self {
            inner,
            path: path.to_path_buf(),
        })
    }

    /// Reads BED records from any byte stream. `path` is only used in error
    /// messages.
    pub fn from_reader<T, P>(reader: T, path: P) -> Result<Self>
    where
        T: Read + Send + 'static,
        P: AsRef<Path>,
    {
        let inner = Reader::<Bed3>::from_reader(reader)
            .map_err(|err| io::Error::other(err.to_string()))?;

        Ok(Self {
            inner,
            path: path.as_ref().to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Line number of the last line read (1-based).
    pub fn line(&self) -> usize {
        self.inner.current_line()
    }

    /// Returns an iterator over `(line, record)` pairs starting from the
    /// current stream position.
    pub fn records(&mut self) -> Records<'_> {
        Records { inner: self }
    }

    fn malformed(&self, line: usize, msg: String) -> FaMaskError {
        FaMaskError::MalformedInput {
            path: self.path.clone(),
            line,
            msg,
        }
    }

    fn to_record(&self, record: GenePred, line: usize) -> Result<BedRecord> {
        let GenePred {
            chrom, start, end, ..
        } = record;

        let name =
            String::from_utf8(chrom).map_err(|err| self.malformed(line, err.to_string()))?;

        Ok(BedRecord {
            name,
            start: self.coordinate(start, line)?,
            stop: self.coordinate(end, line)?,
        })
    }

    fn coordinate(&self, value: u64, line: usize) -> Result<u32> {
        u32::try_from(value).map_err(|_| {
            self.malformed(line, format!("coordinate {} does not fit in 32 bits", value))
        })
    }

    fn read_error(&self, err: ReaderError) -> FaMaskError {
        match err {
            ReaderError::InvalidEncoding { line, message } => {
                self.malformed(line, format!("invalid UTF-8: {}", message))
            }
            ReaderError::InvalidField { line, message, .. } => self.malformed(line, message),
            ReaderError::UnexpectedFieldCount {
                line,
                expected,
                actual,
            } => self.malformed(
                line,
                format!(
                    "expected at least {} tab-separated fields (name, start, stop), got {}",
                    expected, actual
                ),
            ),
            // streamed input fails in read_line, before the line is counted
            ReaderError::Io(err) if err.kind() == io::ErrorKind::InvalidData => {
                self.malformed(self.line() + 1, err.to_string())
            }
            ReaderError::Io(err) | ReaderError::Mmap(err) => FaMaskError::Io(err),
            ReaderError::Builder(msg) => FaMaskError::Io(io::Error::other(msg)),
        }
    }
}

/// An iterator over records of a BED reader.
///
/// This is created by calling [`BedReader::records`].
pub struct Records<'a> {
    inner: &'a mut BedReader,
}

impl Iterator for Records<'_> {
    type Item = Result<(usize, BedRecord)>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.inner.inner.next()?;
        let line = self.inner.line();

        Some(match result {
            Ok(record) => self
                .inner
                .to_record(record, line)
                .map(|record| (line, record)),
            Err(err) => Err(self.inner.read_error(err)),
        })
    }
}

fn read_regions(regions: &Path) -> genepred::ReaderResult<Reader<Bed3>> {
    if is_compressed_path(regions) {
        Reader::<Bed3>::builder()
            .from_path(regions)
            .compression(Compression::Gzip)
            .build()
    } else {
        Reader::<Bed3>::from_mmap(regions)
    }
}
