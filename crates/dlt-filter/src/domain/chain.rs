//! Ordered, gap-free partition of `[0, LEVEL_MAX]` into filter segments.
//!
//! INVARIANTS (after [`SegmentChain::close`]):
//! - Segments are sorted by ascending `level_max`, which is unique.
//! - The first segment starts at 0 and the last ends at `LEVEL_MAX`.
//! - Each segment starts one past the end of its predecessor.

use dlt_types::{FilterLevel, LEVEL_MAX};
use tracing::warn;

use super::segment::FilterSegment;
use crate::error::FilterError;

/// Name of the segment synthesized for an empty configuration.
pub const FALLBACK_SEGMENT: &str = "Restrictive";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentChain {
    segments: Vec<FilterSegment>,
}

impl SegmentChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a segment by its `level_max`, recomputing the lower bounds of the
    /// inserted segment and its successor.
    ///
    /// Returns the index the segment landed at.
    pub fn insert(&mut self, mut segment: FilterSegment) -> Result<usize, FilterError> {
        let pos = match self
            .segments
            .binary_search_by_key(&segment.level_max, |s| s.level_max)
        {
            Ok(_) => {
                return Err(FilterError::DuplicateLevel {
                    level: segment.level_max,
                })
            }
            Err(pos) => pos,
        };

        segment.level_min = match pos.checked_sub(1) {
            Some(prev) => self.segments[prev].level_max + 1,
            None => 0,
        };
        let next_min = segment.level_max + 1;
        self.segments.insert(pos, segment);

        if let Some(next) = self.segments.get_mut(pos + 1) {
            next.level_min = next_min;
        }
        Ok(pos)
    }

    /// Guarantee coverage of the full level range.
    ///
    /// An empty chain receives a single restrictive segment; a tail that
    /// stops short of `LEVEL_MAX` is extended.
    pub fn close(&mut self) {
        match self.segments.last_mut() {
            None => {
                warn!(
                    segment = FALLBACK_SEGMENT,
                    "No filter configured, using restrictive fallback"
                );
                self.segments.push(FilterSegment::restrictive(FALLBACK_SEGMENT));
            }
            Some(tail) if tail.level_max < LEVEL_MAX => {
                warn!(
                    segment = %tail.name,
                    from = tail.level_max,
                    to = LEVEL_MAX,
                    "Extending last filter to cover the full level range"
                );
                tail.level_max = LEVEL_MAX;
            }
            Some(_) => {}
        }
    }

    /// Index of the segment responsible for `level`: the first one whose
    /// `level_max` is not below it.
    #[must_use]
    pub fn find(&self, level: FilterLevel) -> Option<usize> {
        let idx = self.segments.partition_point(|s| s.level_max < level);
        (idx < self.segments.len()).then_some(idx)
    }

    /// Check the coverage and non-overlap invariants.
    pub fn validate(&self) -> Result<(), FilterError> {
        let mut expected_min: FilterLevel = 0;
        for seg in &self.segments {
            if seg.level_min != expected_min || seg.level_min > seg.level_max {
                return Err(FilterError::Internal(format!(
                    "segment '{}' spans [{}, {}], expected start {}",
                    seg.name, seg.level_min, seg.level_max, expected_min
                )));
            }
            expected_min = seg.level_max + 1;
        }
        if expected_min != LEVEL_MAX + 1 {
            return Err(FilterError::Internal(format!(
                "filter chain ends at {}, not {}",
                expected_min.saturating_sub(1),
                LEVEL_MAX
            )));
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&FilterSegment> {
        self.segments.get(index)
    }

    pub fn as_slice(&self) -> &[FilterSegment] {
        &self.segments
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterSegment> {
        self.segments.iter()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
