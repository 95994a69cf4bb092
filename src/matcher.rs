//! Two-sided breakpoint pair matching against prebuilt window indexes
//!
//! A query pair matches an indexed pair only when the query's left breakpoint
//! falls in that pair's left window and the query's right breakpoint falls in
//! the same pair's right window. Hits on the two sides that belong to different
//! indexed pairs never combine into a match.

use crate::breakpoint::BreakpointPair;
use crate::breakpoint_index::{BreakpointIndexes, IndexedBreakpoint};
use log::{debug, warn};
use rustc_hash::FxHashMap;

/// Coordinate distances between a query pair and one indexed pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Distances {
    pub left: u32,
    pub right: u32,
    pub max: u32,
}

impl Distances {
    pub fn new(left: u32, right: u32) -> Self {
        Self {
            left,
            right,
            max: left.max(right),
        }
    }
}

/// One indexed pair joined on both sides to a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub pair_index: usize,
    pub left_coord: u32,
    pub right_coord: u32,
    pub distances: Distances,
}

impl Candidate {
    fn join(query: &BreakpointPair, left: &IndexedBreakpoint, right_coord: u32) -> Self {
        Self {
            pair_index: left.pair_index,
            left_coord: left.coord,
            right_coord,
            distances: Distances::new(
                query.left.distance_to(left.coord),
                query.right.distance_to(right_coord),
            ),
        }
    }

    /// The candidate expressed on the query's chromosomes
    pub fn to_breakpoint_string(&self, query: &BreakpointPair) -> String {
        format!(
            "{}:{}--{}:{}",
            query.left.chrom, self.left_coord, query.right.chrom, self.right_coord
        )
    }
}

/// Outcome of matching one query pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairMatch {
    /// One or both query chromosomes have no indexed breakpoints on that side
    ChromosomeAbsent,
    /// Both chromosomes are indexed but no pair contains the query on both sides
    NoOverlap,
    /// Candidates in pair-index order, never empty
    Matched(Vec<Candidate>),
}

impl PairMatch {
    pub fn candidates(&self) -> &[Candidate] {
        match self {
            PairMatch::Matched(candidates) => candidates,
            _ => &[],
        }
    }
}

fn chrom_ids(query: &BreakpointPair, indexes: &BreakpointIndexes) -> Option<(u32, u32)> {
    let left_id = indexes.chroms.get_id(&query.left.chrom)?;
    let right_id = indexes.chroms.get_id(&query.right.chrom)?;
    if indexes.left.contains_chrom(left_id) && indexes.right.contains_chrom(right_id) {
        Some((left_id, right_id))
    } else {
        None
    }
}

/// Join left and right entries on their pair index, in left-entry order
fn join_sides(
    query: &BreakpointPair,
    left: &[IndexedBreakpoint],
    right: &[IndexedBreakpoint],
) -> Vec<Candidate> {
    let right_by_pair: FxHashMap<usize, u32> = right
        .iter()
        .map(|entry| (entry.pair_index, entry.coord))
        .collect();

    left.iter()
        .filter_map(|entry| {
            right_by_pair
                .get(&entry.pair_index)
                .map(|&right_coord| Candidate::join(query, entry, right_coord))
        })
        .collect()
}

/// Find every indexed pair whose windows contain the query on both sides.
pub fn match_pair(query: &BreakpointPair, indexes: &BreakpointIndexes) -> PairMatch {
    let Some((left_id, right_id)) = chrom_ids(query, indexes) else {
        warn!(
            "Missing one or both chromosome pairs in the prediction: {}, {}!",
            query.left.chrom, query.right.chrom
        );
        return PairMatch::ChromosomeAbsent;
    };

    let left_hits = indexes.left.at(left_id, query.left.coord);
    let right_hits = indexes.right.at(right_id, query.right.coord);
    if left_hits.is_empty() || right_hits.is_empty() {
        return PairMatch::NoOverlap;
    }

    let candidates = join_sides(query, &left_hits, &right_hits);
    if candidates.is_empty() {
        debug!(
            "{}: {} left and {} right window hits share no pair",
            query,
            left_hits.len(),
            right_hits.len()
        );
        return PairMatch::NoOverlap;
    }

    if candidates.len() > 1 {
        let listed: Vec<String> = candidates
            .iter()
            .map(|c| c.to_breakpoint_string(query))
            .collect();
        warn!(
            "One truth pair {} matches multiple predicted breakpoints after window extension: {}",
            query,
            listed.join(";")
        );
    }

    PairMatch::Matched(candidates)
}

/// Candidate with the smallest max distance, the first one on ties.
pub fn nearest(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates.iter().min_by_key(|c| c.distances.max)
}

/// Closest indexed pair on the query's chromosome pair, regardless of windows.
///
/// Reports how far an unmatched query is from the nearest prediction sharing
/// both chromosomes. `None` when no indexed pair lies on that chromosome pair.
pub fn closest_pair(query: &BreakpointPair, indexes: &BreakpointIndexes) -> Option<Candidate> {
    let (left_id, right_id) = chrom_ids(query, indexes)?;
    let candidates = join_sides(
        query,
        &indexes.left.entries(left_id),
        &indexes.right.entries(right_id),
    );
    if candidates.is_empty() {
        warn!(
            "No chromosome pairs in the prediction: {}, {}!",
            query.left.chrom, query.right.chrom
        );
    }
    nearest(&candidates).cloned()
}
