//! mask fasta sequences using bed intervals
//! Alejandro Gonzales-Irribarren, 2025
//!
//! FASTA masking engine and the file plumbing around it.

use crate::{
    bed::BedReader,
    cli::{Args, MaskMode},
    consts::{CARRIAGE_RETURN, GZIP_EXTENSIONS, HEADER_PREFIX, LINE_FEED},
    error::{FaMaskError, Result},
    index::IntervalIndex,
    interval::{IntervalStore, StoreCursor},
};

use flate2::{Compression, read::MultiGzDecoder, write::GzEncoder};
use log::{debug, info, warn};

use std::{
    collections::HashSet,
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

/// Counters collected over one masking run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaskStats {
    /// FASTA records seen
    pub records: usize,
    /// Records that had at least one BED interval
    pub records_with_intervals: usize,
    /// Sequence characters processed
    pub bases: u64,
    /// Sequence characters covered by an interval
    pub masked: u64,
}

/// Main processing function: masks `args.fasta` with the intervals in `args.bed`.
///
/// Both inputs are checked before anything is written. Output goes to
/// `args.output` (gzip-compressed with `args.compress`) or to stdout.
pub fn famask(args: Args) -> Result<MaskStats> {
    let mode = args.mode();
    let Args {
        fasta,
        bed,
        output,
        compress,
        check_sorted,
        ..
    } = args;

    if compress && output.is_none() {
        return Err(FaMaskError::UsageError(
            "--compress requires --output".to_string(),
        ));
    }

    let fasta_reader = open_input(&fasta)?;
    let mut bed_reader = BedReader::from_path(&bed)?;

    info!("Reading intervals from file {}", bed.display());
    let index = IntervalIndex::from_reader(&mut bed_reader, check_sorted)?;

    info!("Masking {} in {} mode", fasta.display(), mode);
    let stats = match output {
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            mask_fasta(fasta_reader, &mut writer, &index, mode, &fasta)?
        }
        Some(output) => {
            let output_path = with_gzip_extension(output, compress);
            let output_file = File::create(&output_path).map_err(|source| {
                FaMaskError::FileOpen {
                    path: output_path.clone(),
                    source,
                }
            })?;

            if compress {
                let mut writer =
                    GzEncoder::new(BufWriter::new(output_file), Compression::default());
                let stats = mask_fasta(fasta_reader, &mut writer, &index, mode, &fasta)?;
                writer.finish()?.flush()?;
                stats
            } else {
                let mut writer = BufWriter::new(output_file);
                mask_fasta(fasta_reader, &mut writer, &index, mode, &fasta)?
            }
        }
    };

    info!(
        "Masked {} of {} bases across {} records ({} with intervals)",
        stats.masked, stats.bases, stats.records, stats.records_with_intervals
    );

    Ok(stats)
}

/// Streams a FASTA file through the masking engine.
///
/// Headers are copied verbatim; every sequence character is rewritten by
/// `mode` according to whether an interval for the current record covers its
/// 0-based offset. Offsets run continuously across wrapped lines and restart
/// at each header. Blank lines are dropped. Every emitted line, header
/// included, ends with a bare `\n`: a `\r\n` terminator is rewritten.
///
/// `path` is only used in error messages.
///
/// # Example
///
/// ```rust
/// use famask::{BedRecord, IntervalIndex, MaskMode, mask_fasta};
///
/// let index = IntervalIndex::from_records(vec![BedRecord::new("chr1", 2, 4)]).unwrap();
/// let mut out = Vec::new();
///
/// mask_fasta(&b">chr1\nacgtac\n"[..], &mut out, &index, MaskMode::Hard, "in.fa").unwrap();
/// assert_eq!(out, b">chr1\nACNNAC\n");
/// ```
pub fn mask_fasta<R, W, P>(
    mut reader: R,
    writer: &mut W,
    index: &IntervalIndex,
    mode: MaskMode,
    path: P,
) -> Result<MaskStats>
where
    R: BufRead,
    W: Write,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let mut stats = MaskStats::default();
    let mut seen: HashSet<String> = HashSet::new();

    let mut line = Vec::new();
    let mut lineno = 0usize;
    let mut record: Option<SequenceCursor<'_>> = None;

    loop {
        line.clear();
        if reader.read_until(LINE_FEED, &mut line)? == 0 {
            break;
        }
        lineno += 1;
        trim_line_end(&mut line);

        if line.is_empty() {
            continue;
        }

        if line[0] == HEADER_PREFIX {
            let name = header_name(&line).ok_or_else(|| FaMaskError::MalformedInput {
                path: path.to_path_buf(),
                line: lineno,
                msg: "header line has no sequence name".to_string(),
            })?;

            let store = index.get(&name);
            stats.records += 1;
            if let Some(store) = store {
                stats.records_with_intervals += 1;
                seen.insert(name.clone());
                debug!("Masking {} with {} intervals", name, store.len());
            } else {
                debug!("No intervals for {}", name);
            }

            if let Some(done) = record.replace(SequenceCursor::new(name, store)) {
                debug!("Finished {} ({} bases)", done.name, done.offset);
            }

            writer.write_all(&line)?;
        } else {
            let cursor = record.as_mut().ok_or_else(|| FaMaskError::MalformedInput {
                path: path.to_path_buf(),
                line: lineno,
                msg: "sequence line found before any '>' header".to_string(),
            })?;

            stats.bases += line.len() as u64;
            stats.masked += cursor.mask_line(&mut line, mode);

            writer.write_all(&line)?;
        }

        writer.write_all(&[LINE_FEED])?;
    }

    writer.flush()?;

    for name in index.names().filter(|name| !seen.contains(*name)) {
        warn!("BED sequence {} not found in {}", name, path.display());
    }

    Ok(stats)
}

/// Per-record masking state: the active name, the 0-based offset of the next
/// base and, if the name has intervals, a forward cursor over them.
#[derive(Debug)]
pub struct SequenceCursor<'a> {
    name: String,
    offset: u64,
    store: Option<StoreCursor<'a>>,
}

impl<'a> SequenceCursor<'a> {
    pub fn new(name: String, store: Option<&'a IntervalStore>) -> Self {
        Self {
            name,
            offset: 0,
            store: store.map(IntervalStore::cursor),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of sequence characters consumed so far for this record.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Rewrites `line` in place and returns how many bases were covered.
    pub fn mask_line(&mut self, line: &mut [u8], mode: MaskMode) -> u64 {
        let mut masked = 0;

        for base in line.iter_mut() {
            let covered = self
                .store
                .as_mut()
                .is_some_and(|cursor| cursor.contains(self.offset));

            *base = mode.apply(*base, covered);
            masked += u64::from(covered);
            self.offset += 1;
        }

        masked
    }
}

/// First whitespace-delimited token after '>'.
fn header_name(line: &[u8]) -> Option<String> {
    let rest = line.strip_prefix(&[HEADER_PREFIX])?;
    let name = rest
        .split(|b| b.is_ascii_whitespace())
        .find(|token| !token.is_empty())?;

    Some(String::from_utf8_lossy(name).into_owned())
}

fn trim_line_end(line: &mut Vec<u8>) {
    if line.ends_with(&[LINE_FEED]) {
        line.pop();
    }

    if line.ends_with(&[CARRIAGE_RETURN]) {
        line.pop();
    }
}

/// Opens a plain or gzip-compressed input file.
pub fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    if !path.exists() {
        return Err(FaMaskError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path).map_err(|source| FaMaskError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;

    let reader: Box<dyn BufRead> = if is_compressed_path(path) {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    Ok(reader)
}

pub(crate) fn is_compressed_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| GZIP_EXTENSIONS.contains(&ext))
}

fn with_gzip_extension(mut path: PathBuf, compress: bool) -> PathBuf {
    if compress && !is_compressed_path(&path) {
        path.as_mut_os_string().push(".gz");
    }

    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bed::BedRecord;

    fn index(records: &[(&str, u32, u32)]) -> IntervalIndex {
        IntervalIndex::from_records(
            records
                .iter()
                .map(|&(name, start, stop)| BedRecord::new(name, start, stop)),
        )
        .unwrap()
    }

    fn run(fasta: &str, idx: &IntervalIndex, mode: MaskMode) -> Result<(String, MaskStats)> {
        let mut out = Vec::new();
        let stats = mask_fasta(fasta.as_bytes(), &mut out, idx, mode, "test.fa")?;
        Ok((String::from_utf8(out).unwrap(), stats))
    }

    #[test]
    fn test_hard_mask_single_interval() {
        let idx = index(&[("chr1", 5, 10)]);
        let (out, stats) = run(">chr1\nACGTACGTACGTACGT\n", &idx, MaskMode::Hard).unwrap();

        assert_eq!(out, ">chr1\nACGTANNNNNGTACGT\n");
        assert_eq!(stats.masked, 5);
        assert_eq!(stats.bases, 16);
    }

    #[test]
    fn test_soft_mask_overlapping_union() {
        let idx = index(&[("chr1", 5, 10), ("chr1", 8, 12)]);
        let (out, _) = run(">chr1\nacgtacgtacgtacgt\n", &idx, MaskMode::Soft).unwrap();

        assert_eq!(out, ">chr1\nACGTAcgtacgtACGT\n");
    }

    #[test]
    fn test_offset_continues_across_wrapped_lines() {
        let idx = index(&[("chr1", 3, 6)]);
        let (out, stats) = run(">chr1 desc\nAAAA\nAAAA\n", &idx, MaskMode::Hard).unwrap();

        assert_eq!(out, ">chr1 desc\nAAAN\nNNAA\n");
        assert_eq!(stats.bases, 8);
    }

    #[test]
    fn test_offset_resets_on_header() {
        let idx = index(&[("chr1", 0, 2), ("chr2", 2, 3)]);
        let (out, stats) = run(
            ">chr1\nAAAA\n>chr3\nAAAA\n>chr2\nAA\nAA\n",
            &idx,
            MaskMode::Soft,
        )
        .unwrap();

        assert_eq!(out, ">chr1\naaAA\n>chr3\nAAAA\n>chr2\nAA\naA\n");
        assert_eq!(stats.records, 3);
        assert_eq!(stats.records_with_intervals, 2);
    }

    #[test]
    fn test_soft_add_keeps_existing_lowercase() {
        let idx = index(&[("chr1", 0, 2)]);

        let (out, _) = run(">chr1\nACgtAC\n", &idx, MaskMode::SoftAdd).unwrap();
        assert_eq!(out, ">chr1\nacgtAC\n");

        let (out, _) = run(">chr1\nACgtAC\n", &idx, MaskMode::Soft).unwrap();
        assert_eq!(out, ">chr1\nacGTAC\n");
    }

    #[test]
    fn test_hard_mask_is_stable() {
        let idx = index(&[("chr1", 1, 3), ("chr1", 6, 7)]);
        let (once, _) = run(">chr1\nacgtacgt\n", &idx, MaskMode::Hard).unwrap();
        let (twice, _) = run(&once, &idx, MaskMode::Hard).unwrap();

        assert_eq!(once, ">chr1\nANNTACNT\n");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_index_only_normalizes_case() {
        let idx = IntervalIndex::default();
        let (out, stats) = run(">x\nacgtn\n>y\nAcG\n", &idx, MaskMode::Soft).unwrap();

        assert_eq!(out, ">x\nACGTN\n>y\nACG\n");
        assert_eq!(stats.masked, 0);
    }

    #[test]
    fn test_crlf_blank_lines_and_missing_final_newline() {
        let idx = index(&[("chr1", 1, 2)]);
        let (out, _) = run(">chr1\r\nAAA\r\n\r\nAAA", &idx, MaskMode::Hard).unwrap();

        assert_eq!(out, ">chr1\nANA\nAAA\n");
    }

    #[test]
    fn test_crlf_header_keeps_description_and_name() {
        let idx = index(&[("chr1", 0, 1)]);
        let fasta = ">chr1 desc\r\nAA\r\n>chr2\r\nAA\r\n";
        let (out, stats) = run(fasta, &idx, MaskMode::Hard).unwrap();

        assert_eq!(out, ">chr1 desc\nNA\n>chr2\nAA\n");
        assert_eq!(stats.records_with_intervals, 1);
    }

    #[test]
    fn test_body_before_header_is_malformed() {
        let err = run("\nACGT\n>chr1\nACGT\n", &IntervalIndex::default(), MaskMode::Soft)
            .unwrap_err();

        match err {
            FaMaskError::MalformedInput { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_header_without_name_is_malformed() {
        let err = run(">\nACGT\n", &IntervalIndex::default(), MaskMode::Soft).unwrap_err();
        assert!(matches!(err, FaMaskError::MalformedInput { line: 1, .. }));

        let err = run(">   \nACGT\n", &IntervalIndex::default(), MaskMode::Soft).unwrap_err();
        assert!(matches!(err, FaMaskError::MalformedInput { line: 1, .. }));
    }

    #[test]
    fn test_header_name() {
        assert_eq!(header_name(b">chr1"), Some("chr1".to_string()));
        assert_eq!(header_name(b">chr1 some description"), Some("chr1".to_string()));
        assert_eq!(header_name(b">chr1\tx"), Some("chr1".to_string()));
        assert_eq!(header_name(b"> chr1"), Some("chr1".to_string()));
        assert_eq!(header_name(b">"), None);
    }

    #[test]
    fn test_sequence_cursor_counts_offset() {
        let store: IntervalStore = [crate::Interval::new(2, 5).unwrap()].into_iter().collect();
        let mut cursor = SequenceCursor::new("chr1".to_string(), Some(&store));

        let mut first = b"AAA".to_vec();
        let mut second = b"AAAA".to_vec();
        assert_eq!(cursor.mask_line(&mut first, MaskMode::Hard), 1);
        assert_eq!(cursor.mask_line(&mut second, MaskMode::Hard), 2);
        assert_eq!(cursor.offset(), 7);
        assert_eq!(cursor.name(), "chr1");
        assert_eq!(&first, b"AAN");
        assert_eq!(&second, b"NNAA");
    }

    #[test]
    fn test_with_gzip_extension() {
        assert_eq!(
            with_gzip_extension(PathBuf::from("out.fa"), true),
            PathBuf::from("out.fa.gz")
        );
        assert_eq!(
            with_gzip_extension(PathBuf::from("out.fa.gz"), true),
            PathBuf::from("out.fa.gz")
        );
        assert_eq!(
            with_gzip_extension(PathBuf::from("out.fa"), false),
            PathBuf::from("out.fa")
        );
    }
}
