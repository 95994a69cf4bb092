//! Per-chromosome window indexes over one side of a breakpoint set
//!
//! Every breakpoint pair contributes one window to the left index (around its
//! left breakpoint) and one to the right index (around its right breakpoint).
//! Windows span `[coord - window/2, coord + window/2]`, closed on both ends, and
//! carry the position of the pair they came from so that hits on the two sides
//! can be joined back together.

use crate::breakpoint::{Breakpoint, BreakpointPair};
use crate::seqidx::ChromIndex;
use coitrees::{BasicCOITree, Interval, IntervalTree};
use log::{debug, warn};
use rustc_hash::FxHashMap;

/// Metadata of one indexed window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedBreakpoint {
    /// Position of the originating pair in the indexed sequence
    pub pair_index: usize,
    /// Coordinate the window is centred on
    pub coord: u32,
}

type TreeMap = FxHashMap<u32, BasicCOITree<IndexedBreakpoint, u32>>;

/// Interval trees for one side, keyed by chromosome id
pub struct SideIndex {
    trees: TreeMap,
}

impl SideIndex {
    fn from_intervals(intervals: FxHashMap<u32, Vec<Interval<IndexedBreakpoint>>>) -> Self {
        let trees = intervals
            .into_iter()
            .map(|(chrom_id, nodes)| (chrom_id, BasicCOITree::new(nodes.as_slice())))
            .collect();
        Self { trees }
    }

    pub fn contains_chrom(&self, chrom_id: u32) -> bool {
        self.trees.contains_key(&chrom_id)
    }

    /// Windows on `chrom_id` containing `coord`, ordered by pair index
    pub fn at(&self, chrom_id: u32, coord: u32) -> Vec<IndexedBreakpoint> {
        let mut hits = Vec::new();
        let (Some(tree), Ok(pos)) = (self.trees.get(&chrom_id), i32::try_from(coord)) else {
            return hits;
        };
        tree.query(pos, pos, |interval| hits.push(interval.metadata));
        hits.sort_by_key(|hit| hit.pair_index);
        hits
    }

    /// Every window on `chrom_id`, ordered by pair index
    pub fn entries(&self, chrom_id: u32) -> Vec<IndexedBreakpoint> {
        let mut entries: Vec<IndexedBreakpoint> = self
            .trees
            .get(&chrom_id)
            .map(|tree| tree.iter().map(|interval| *interval.metadata).collect())
            .unwrap_or_default();
        entries.sort_by_key(|entry| entry.pair_index);
        entries
    }

    pub fn chrom_len(&self, chrom_id: u32) -> usize {
        self.trees.get(&chrom_id).map_or(0, |tree| tree.len())
    }

    /// Total number of windows across all chromosomes
    pub fn len(&self) -> usize {
        self.trees.values().map(|tree| tree.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Left and right window indexes built over one breakpoint set
pub struct BreakpointIndexes {
    pub chroms: ChromIndex,
    pub left: SideIndex,
    pub right: SideIndex,
    keys: Vec<String>,
    skipped: usize,
    window: u32,
}

impl BreakpointIndexes {
    /// Original string of the pair at `pair_index`
    pub fn key(&self, pair_index: usize) -> Option<&str> {
        self.keys.get(pair_index).map(String::as_str)
    }

    pub fn window(&self) -> u32 {
        self.window
    }

    /// Number of input pairs that were not indexed
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Number of indexed pairs
    pub fn len(&self) -> usize {
        self.keys.len() - self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Window around a breakpoint in tree coordinates, `None` if it does not fit
fn window_around(
    breakpoint: &Breakpoint,
    half_window: i32,
    pair_index: usize,
) -> Option<Interval<IndexedBreakpoint>> {
    let center = i32::try_from(breakpoint.coord).ok()?;
    Some(Interval {
        first: center.saturating_sub(half_window),
        last: center.saturating_add(half_window),
        metadata: IndexedBreakpoint {
            pair_index,
            coord: breakpoint.coord,
        },
    })
}

/// Build left and right indexes over `pairs` with the given tolerance window.
///
/// Strings that are not `chrom:coord--chrom:coord` are skipped with a warning
/// and take no part in matching. With `window == 0` each window is a single
/// position.
pub fn build_indexes<S: AsRef<str>>(pairs: &[S], window: u32) -> BreakpointIndexes {
    let half_window = i32::try_from(window / 2).unwrap_or(i32::MAX);
    let mut chroms = ChromIndex::new();
    let mut left: FxHashMap<u32, Vec<Interval<IndexedBreakpoint>>> = FxHashMap::default();
    let mut right: FxHashMap<u32, Vec<Interval<IndexedBreakpoint>>> = FxHashMap::default();
    let mut skipped = 0;

    for (pair_index, raw) in pairs.iter().enumerate() {
        let raw = raw.as_ref();
        let pair = match raw.parse::<BreakpointPair>() {
            Ok(pair) => pair,
            Err(e) => {
                warn!("{}. Skipping.", e);
                skipped += 1;
                continue;
            }
        };

        let (Some(left_window), Some(right_window)) = (
            window_around(&pair.left, half_window, pair_index),
            window_around(&pair.right, half_window, pair_index),
        ) else {
            warn!("Breakpoint '{}' exceeds the indexable coordinate range. Skipping.", raw);
            skipped += 1;
            continue;
        };

        let left_id = chroms.get_or_insert_id(&pair.left.chrom);
        let right_id = chroms.get_or_insert_id(&pair.right.chrom);
        left.entry(left_id).or_default().push(left_window);
        right.entry(right_id).or_default().push(right_window);
    }

    let indexes = BreakpointIndexes {
        left: SideIndex::from_intervals(left),
        right: SideIndex::from_intervals(right),
        chroms,
        keys: pairs.iter().map(|p| p.as_ref().to_string()).collect(),
        skipped,
        window,
    };

    debug!(
        "Indexed {} breakpoint pairs on {} chromosomes (window {}, {} skipped)",
        indexes.len(),
        indexes.chroms.len(),
        window,
        skipped
    );

    indexes
}
