use crate::breakpoint::lexsort;
use crate::error::{BenchError, Result};

/// Settings shared by every comparison in one run
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonConfig {
    /// Breakpoint tolerance in bp; 0 disables windowed matching
    pub window: u32,
    /// Compare lex-sorted keys instead of names/breakpoints as written
    pub sorted: bool,
    /// Predictions need strictly more supporting reads than this
    pub lower_threshold: f64,
    /// Predictions with more supporting reads than this are dropped
    pub upper_threshold: Option<f64>,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            window: 0,
            sorted: true,
            lower_threshold: 0.0,
            upper_threshold: None,
        }
    }
}

impl ComparisonConfig {
    pub fn with_window(mut self, window: u32) -> Self {
        self.window = window;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(upper) = self.upper_threshold {
            if self.lower_threshold >= upper {
                return Err(BenchError::InvalidThresholds {
                    lower: self.lower_threshold,
                    upper,
                });
            }
        }
        Ok(())
    }

    /// Comparison key of a breakpoint pair string
    pub fn breakpoint_key(&self, breakpoint: &str) -> String {
        if self.sorted {
            lexsort(breakpoint)
        } else {
            breakpoint.to_string()
        }
    }

    /// Comparison key of a fusion name; gene symbols are compared upper-cased
    pub fn name_key(&self, fusion_name: &str) -> String {
        let upper = fusion_name.to_uppercase();
        if self.sorted {
            lexsort(&upper)
        } else {
            upper
        }
    }

    /// Whether a prediction with this read support is kept
    pub fn passes_support(&self, num_reads: f64) -> bool {
        num_reads > self.lower_threshold && self.upper_threshold.map_or(true, |upper| num_reads <= upper)
    }
}
