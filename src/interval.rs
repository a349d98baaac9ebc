//! mask fasta sequences using bed intervals
//! Alejandro Gonzales-Irribarren, 2025
//!
//! Per-sequence interval storage. Intervals are kept in a sorted vector
//! (by start, then stop) together with a running maximum of their stops,
//! which lets a containment query find the first covering interval with a
//! binary search instead of walking every interval that starts before the
//! queried position.

use crate::error::{FaMaskError, Result};

use std::fmt;

/// A half-open `[start, stop)` interval on a single sequence.
///
/// # Example
///
/// ```rust
/// use famask::Interval;
///
/// let iv = Interval::new(5, 10).unwrap();
/// assert!(iv.contains(5));
/// assert!(!iv.contains(10));
/// assert!(Interval::new(10, 10).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    start: u32,
    stop: u32,
}

impl Interval {
    /// Builds an interval, rejecting empty or inverted ranges.
    pub fn new(start: u32, stop: u32) -> Result<Self> {
        if start >= stop {
            return Err(FaMaskError::InvalidInterval {
                name: String::new(),
                start,
                stop,
                line: None,
            });
        }

        Ok(Self { start, stop })
    }

    /// 0-based inclusive start
    pub fn start(&self) -> u32 {
        self.start
    }

    /// 0-based exclusive stop
    pub fn stop(&self) -> u32 {
        self.stop
    }

    /// Returns true if `position` lies in `[start, stop)`.
    pub fn contains(&self, position: u64) -> bool {
        u64::from(self.start) <= position && position < u64::from(self.stop)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.stop)
    }
}

/// Ordered collection of intervals for one sequence name.
///
/// Intervals stay sorted by (start, stop) at all times, so the store can be
/// queried after any insert. Duplicates are kept.
///
/// # Example
///
/// ```rust
/// use famask::{Interval, IntervalStore};
///
/// let mut store = IntervalStore::new();
/// store.insert(Interval::new(20, 30).unwrap());
/// store.insert(Interval::new(5, 10).unwrap());
///
/// assert!(store.contains(7));
/// assert!(!store.contains(15));
/// ```
#[derive(Debug, Clone, Default)]
pub struct IntervalStore {
    intervals: Vec<Interval>,
    // max_stop[i] = max(intervals[0..=i].stop)
    max_stop: Vec<u32>,
}

impl IntervalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an interval at its sorted position. Duplicates are kept.
    ///
    /// Appending in order is O(1); an out-of-order insert shifts the tail.
    /// Collect into a store to load many unsorted intervals at once.
    pub fn insert(&mut self, interval: Interval) {
        let at = self.intervals.partition_point(|iv| *iv <= interval);
        self.intervals.insert(at, interval);
        self.rebuild_max_stop(at);
    }

    // recomputes max_stop[from..] from intervals[from..]
    fn rebuild_max_stop(&mut self, from: usize) {
        self.max_stop.truncate(from);

        let mut running = from
            .checked_sub(1)
            .map_or(0, |prev| self.max_stop[prev]);
        for iv in &self.intervals[from..] {
            running = running.max(iv.stop);
            self.max_stop.push(running);
        }
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Iterates intervals in (start, stop) order.
    pub fn iter(&self) -> std::slice::Iter<'_, Interval> {
        self.intervals.iter()
    }

    /// Returns the first interval (in start, stop order) covering `position`.
    ///
    /// Equivalent to scanning forward through every interval whose start is
    /// at or before `position` and stopping at the first one whose stop lies
    /// past it.
    pub fn find(&self, position: u64) -> Option<&Interval> {
        // intervals[..upper] all start at or before position
        let upper = self
            .intervals
            .partition_point(|iv| u64::from(iv.start) <= position);

        // max_stop is non-decreasing, so the first index whose running stop
        // passes position is the first interval that covers it
        let first = self.max_stop[..upper].partition_point(|&stop| u64::from(stop) <= position);

        self.intervals[..upper].get(first)
    }

    /// Returns true if any stored interval covers `position`.
    pub fn contains(&self, position: u64) -> bool {
        self.find(position).is_some()
    }

    /// Opens a sequential cursor over this store.
    pub fn cursor(&self) -> StoreCursor<'_> {
        StoreCursor {
            intervals: &self.intervals,
            idx: 0,
            last: None,
        }
    }

    /// Number of distinct bases covered by the union of all intervals.
    pub fn covered_bases(&self) -> u64 {
        let mut covered = 0u64;
        let mut reach = 0u64;

        for iv in self.iter() {
            let start = u64::from(iv.start).max(reach);
            let stop = u64::from(iv.stop);
            if stop > start {
                covered += stop - start;
                reach = stop;
            }
        }

        covered
    }
}

impl FromIterator<Interval> for IntervalStore {
    fn from_iter<I: IntoIterator<Item = Interval>>(iter: I) -> Self {
        let mut intervals: Vec<Interval> = iter.into_iter().collect();
        intervals.sort_unstable();

        let mut store = IntervalStore {
            max_stop: Vec::with_capacity(intervals.len()),
            intervals,
        };
        store.rebuild_max_stop(0);
        store
    }
}

/// Forward cursor over an [`IntervalStore`].
///
/// Built for non-decreasing positions: the masking engine opens a new cursor
/// for every FASTA record, so offsets restart at 0 with a fresh cursor. Each
/// interval is skipped at most once, so a whole record costs O(n + m) for n
/// intervals and m bases. A position below the previous one rewinds the
/// cursor to the first interval.
#[derive(Debug, Clone)]
pub struct StoreCursor<'a> {
    intervals: &'a [Interval],
    idx: usize,
    last: Option<u64>,
}

impl<'a> StoreCursor<'a> {
    /// Returns the first interval covering `position`, advancing past every
    /// interval that ends at or before it.
    pub fn find(&mut self, position: u64) -> Option<&'a Interval> {
        if self.last.is_some_and(|last| position < last) {
            self.idx = 0;
        }
        self.last = Some(position);

        while let Some(iv) = self.intervals.get(self.idx) {
            if u64::from(iv.stop) > position {
                break;
            }
            self.idx += 1;
        }

        // intervals are sorted by start: if the current one starts after
        // position, so does every later one
        self.intervals
            .get(self.idx)
            .filter(|iv| u64::from(iv.start) <= position)
    }

    pub fn contains(&mut self, position: u64) -> bool {
        self.find(position).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(ivs: &[(u32, u32)]) -> IntervalStore {
        ivs.iter()
            .map(|&(s, e)| Interval::new(s, e).unwrap())
            .collect()
    }

    fn brute(ivs: &[(u32, u32)], p: u64) -> bool {
        ivs.iter()
            .any(|&(s, e)| u64::from(s) <= p && p < u64::from(e))
    }

    #[test]
    fn test_interval_rejects_empty_and_inverted() {
        assert!(Interval::new(3, 3).is_err());
        assert!(Interval::new(4, 3).is_err());
        assert!(Interval::new(3, 4).is_ok());
    }

    #[test]
    fn test_contains_matches_bruteforce() {
        let cases: &[&[(u32, u32)]] = &[
            &[],
            &[(5, 10)],
            &[(5, 10), (8, 12)],
            &[(0, 100), (10, 20), (30, 40)],
            &[(10, 20), (20, 30), (30, 31)],
            &[(5, 10), (5, 10), (5, 6)],
            &[(50, 60), (0, 5), (7, 9), (2, 55)],
        ];

        for ivs in cases {
            let st = store(ivs);
            let mut cursor = st.cursor();
            for p in 0..120u64 {
                let expected = brute(ivs, p);
                assert_eq!(st.contains(p), expected, "find {:?} @ {}", ivs, p);
                assert_eq!(cursor.contains(p), expected, "cursor {:?} @ {}", ivs, p);
            }
        }
    }

    #[test]
    fn test_find_returns_first_in_order() {
        let st = store(&[(0, 100), (10, 20), (10, 15)]);

        assert_eq!(st.find(12), Interval::new(0, 100).ok().as_ref());
        assert_eq!(st.find(99), Interval::new(0, 100).ok().as_ref());
        assert_eq!(st.find(100), None);

        let st = store(&[(10, 20), (10, 15), (12, 30)]);
        assert_eq!(st.find(12), Interval::new(10, 15).ok().as_ref());
        assert_eq!(st.find(17), Interval::new(10, 20).ok().as_ref());
        assert_eq!(st.find(25), Interval::new(12, 30).ok().as_ref());
    }

    #[test]
    fn test_cursor_agrees_with_find() {
        let st = store(&[(3, 9), (0, 4), (4, 5), (20, 22), (6, 25)]);
        let mut cursor = st.cursor();

        for p in 0..30u64 {
            assert_eq!(cursor.find(p), st.find(p), "position {}", p);
        }
    }

    #[test]
    fn test_cursor_handles_position_jumps() {
        let st = store(&[(0, 2), (5, 6), (100, 200)]);
        let mut cursor = st.cursor();

        assert!(cursor.contains(1));
        assert!(!cursor.contains(50));
        assert!(cursor.contains(150));
        assert!(!cursor.contains(200));
    }

    #[test]
    fn test_covered_bases_counts_union() {
        assert_eq!(store(&[]).covered_bases(), 0);
        assert_eq!(store(&[(5, 10), (8, 12)]).covered_bases(), 7);
        assert_eq!(store(&[(0, 100), (10, 20)]).covered_bases(), 100);
        assert_eq!(store(&[(0, 5), (5, 10)]).covered_bases(), 10);
        assert_eq!(store(&[(0, 5), (7, 10)]).covered_bases(), 8);
    }

    #[test]
    fn test_insert_is_queryable_without_collect() {
        let ivs = [(50, 60), (0, 5), (7, 9), (2, 55), (7, 9)];
        let mut st = IntervalStore::new();

        for (n, &(s, e)) in ivs.iter().enumerate() {
            st.insert(Interval::new(s, e).unwrap());

            let inserted = &ivs[..=n];
            for p in 0..70u64 {
                assert_eq!(st.contains(p), brute(inserted, p), "{:?} @ {}", inserted, p);
            }
        }

        assert_eq!(st.len(), 5);
        assert_eq!(st.find(56), Interval::new(50, 60).ok().as_ref());
        assert_eq!(st.covered_bases(), 60);
    }

    #[test]
    fn test_cursor_rewinds_on_smaller_position() {
        let st = store(&[(0, 2), (5, 6)]);
        let mut cursor = st.cursor();

        assert!(cursor.contains(5));
        assert!(cursor.contains(1));
        assert!(!cursor.contains(3));
        assert!(cursor.contains(5));
    }

    #[test]
    fn test_insert_keeps_duplicates() {
        let st = store(&[(1, 2), (1, 2), (0, 3)]);

        assert_eq!(st.len(), 3);
        let order: Vec<(u32, u32)> = st.iter().map(|iv| (iv.start(), iv.stop())).collect();
        assert_eq!(order, vec![(0, 3), (1, 2), (1, 2)]);
    }
}
