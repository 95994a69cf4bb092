//! Breakpoints and breakpoint pairs
//!
//! A fusion junction is written as `chrom1:coord1--chrom2:coord2`. Pairs are
//! compared through their lex-sorted form so that `A--B` and `B--A` denote the
//! same event.

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// Separator between the two sides of a breakpoint pair or fusion name
pub const PAIR_SEPARATOR: &str = "--";

static PAIR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(chr[^:]+):(\d+)--(chr[^:]+):(\d+)$").expect("breakpoint pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("'{0}' lacks expected `chrom:coord--chrom:coord` formatting")]
    Format(String),
    #[error("Coordinate '{coord}' of '{pair}' does not fit in 32 bits")]
    CoordinateOutOfRange { pair: String, coord: String },
}

/// One end of a fusion junction
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Breakpoint {
    pub chrom: String,
    pub coord: u32,
}

impl Breakpoint {
    pub fn new(chrom: impl Into<String>, coord: u32) -> Self {
        Self {
            chrom: chrom.into(),
            coord,
        }
    }

    /// Absolute coordinate distance to another position on the same chromosome
    pub fn distance_to(&self, coord: u32) -> u32 {
        self.coord.abs_diff(coord)
    }
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chrom, self.coord)
    }
}

/// A two-sided fusion junction
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BreakpointPair {
    pub left: Breakpoint,
    pub right: Breakpoint,
}

impl BreakpointPair {
    pub fn new(left: Breakpoint, right: Breakpoint) -> Self {
        Self { left, right }
    }

    /// Same pair with its sides ordered by their `chrom:coord` strings
    pub fn lexsorted(&self) -> Self {
        if self.left.to_string() <= self.right.to_string() {
            self.clone()
        } else {
            Self::new(self.right.clone(), self.left.clone())
        }
    }
}

impl fmt::Display for BreakpointPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.left, PAIR_SEPARATOR, self.right)
    }
}

impl FromStr for BreakpointPair {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = PAIR_PATTERN
            .captures(s)
            .ok_or_else(|| ParseError::Format(s.to_string()))?;

        let coord = |idx: usize| -> Result<u32, ParseError> {
            caps[idx]
                .parse::<u32>()
                .map_err(|_| ParseError::CoordinateOutOfRange {
                    pair: s.to_string(),
                    coord: caps[idx].to_string(),
                })
        };

        Ok(Self::new(
            Breakpoint::new(&caps[1], coord(2)?),
            Breakpoint::new(&caps[3], coord(4)?),
        ))
    }
}

/// Canonical key of a `--` separated pair: components sorted byte-wise and rejoined.
///
/// Works on any string, parseable or not, so malformed breakpoints and
/// chained fusion names still get a stable key.
pub fn lexsort(pair: &str) -> String {
    let mut parts: Vec<&str> = pair.split(PAIR_SEPARATOR).collect();
    parts.sort_unstable();
    parts.join(PAIR_SEPARATOR)
}
