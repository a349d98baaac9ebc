//! mask fasta sequences using bed intervals
//! Alejandro Gonzales-Irribarren, 2025
//!
//! Name -> interval store mapping, built once from BED records and only read
//! afterwards.

use crate::{
    bed::{BedReader, BedRecord},
    error::{FaMaskError, Result},
    interval::{Interval, IntervalStore},
};

use log::{debug, info};

use std::{collections::HashMap, path::PathBuf};

/// Interval stores keyed by sequence name (case-sensitive).
#[derive(Debug, Default)]
pub struct IntervalIndex(HashMap<String, IntervalStore>);

impl IntervalIndex {
    /// Builds an index from raw BED records.
    ///
    /// Records may come in any order and may be interleaved between names.
    /// Fails on the first record with `start >= stop`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use famask::{BedRecord, IntervalIndex};
    ///
    /// let index = IntervalIndex::from_records(vec![
    ///     BedRecord::new("chr1", 5, 10),
    ///     BedRecord::new("chr1", 8, 12),
    /// ])
    /// .unwrap();
    ///
    /// assert!(index.get("chr1").unwrap().contains(11));
    /// assert!(index.get("chr2").is_none());
    /// ```
    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = BedRecord>,
    {
        let mut builder = IndexBuilder::new(PathBuf::new(), false);
        for record in records {
            builder.push(record, None)?;
        }

        Ok(builder.finish())
    }

    /// Builds an index from a BED reader.
    ///
    /// With `check_sorted`, a record whose start is smaller than the previous
    /// start for the same name fails with [`FaMaskError::MalformedInput`].
    pub fn from_reader(reader: &mut BedReader, check_sorted: bool) -> Result<Self> {
        let mut builder = IndexBuilder::new(reader.path().to_path_buf(), check_sorted);

        for result in reader.records() {
            let (line, record) = result?;
            builder.push(record, Some(line))?;
        }

        let index = builder.finish();
        info!(
            "Indexed {} intervals covering {} bases across {} sequences",
            index.num_intervals(),
            index.covered_bases(),
            index.len()
        );

        Ok(index)
    }

    /// Store for `name`, if any BED record named it.
    pub fn get(&self, name: &str) -> Option<&IntervalStore> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of intervals over all names.
    pub fn num_intervals(&self) -> usize {
        self.0.values().map(IntervalStore::len).sum()
    }

    /// Bases covered by at least one interval, summed over all names.
    pub fn covered_bases(&self) -> u64 {
        self.0.values().map(IntervalStore::covered_bases).sum()
    }

    /// Sequence names present in the index, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

struct IndexBuilder {
    path: PathBuf,
    intervals: HashMap<String, Vec<Interval>>,
    last_start: Option<HashMap<String, u32>>,
}

impl IndexBuilder {
    fn new(path: PathBuf, check_sorted: bool) -> Self {
        Self {
            path,
            intervals: HashMap::new(),
            last_start: check_sorted.then(HashMap::new),
        }
    }

    fn push(&mut self, record: BedRecord, line: Option<usize>) -> Result<()> {
        let BedRecord { name, start, stop } = record;

        let interval = Interval::new(start, stop).map_err(|_| FaMaskError::InvalidInterval {
            name: name.clone(),
            start,
            stop,
            line,
        })?;

        if let Some(last_start) = &mut self.last_start {
            if let Some(&prev) = last_start.get(&name) {
                if start < prev {
                    return Err(FaMaskError::MalformedInput {
                        path: self.path.clone(),
                        line: line.unwrap_or_default(),
                        msg: format!(
                            "BED is not sorted: {}:{} comes after start {}",
                            name, start, prev
                        ),
                    });
                }
            }
            last_start.insert(name.clone(), start);
        }

        match self.intervals.get_mut(&name) {
            Some(intervals) => intervals.push(interval),
            None => {
                debug!("New sequence in BED: {}", name);
                self.intervals.insert(name, vec![interval]);
            }
        }

        Ok(())
    }

    // one sort per name instead of a sorted insert per record
    fn finish(self) -> IntervalIndex {
        IntervalIndex(
            self.intervals
                .into_iter()
                .map(|(name, intervals)| (name, IntervalStore::from_iter(intervals)))
                .collect(),
        )
    }
}
