/*!
 * Gap-and-overlap decomposition of two interval tiers.
 *
 * The combined timeline of a `source` and a `target` tier, from the earliest
 * start to the latest end, is cut into maximal positive-length regions of
 * equal coverage. Adjacent pieces merge when they are covered the same way
 * and by the same source annotation; touching target annotations do not
 * split a region.
 */

use serde::Serialize;

use crate::document::IntervalAnnotation;
use crate::interval;

/// Which tiers cover a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Coverage {
    /// Neither tier
    Gap,
    /// Only the source tier
    SourceOnly,
    /// Only the target tier
    TargetOnly,
    /// Both tiers
    Overlap,
}

/// One maximal region of the decomposition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    pub start_ms: u64,
    pub end_ms: u64,
    pub coverage: Coverage,
    /// Value of the covering source annotation, if any
    pub source_value: Option<String>,
}

impl Region {
    /// Classification value; `None` is the "neither" sentinel for regions
    /// not covered by both tiers
    pub fn classification(&self) -> Option<&str> {
        match self.coverage {
            Coverage::Overlap => self.source_value.as_deref(),
            _ => None,
        }
    }

    pub fn midpoint(&self) -> u64 {
        interval::midpoint(self.start_ms, self.end_ms)
    }

    /// Length of the region; decomposition never yields zero-length regions
    pub fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }
}

/// Decompose `source` against `target`. Both slices must be sorted and
/// non-overlapping, as independent tiers are.
pub fn decompose(source: &[IntervalAnnotation], target: &[IntervalAnnotation]) -> Vec<Region> {
    let mut points: Vec<u64> = source
        .iter()
        .chain(target)
        .flat_map(|a| [a.start_ms, a.end_ms])
        .collect();
    points.sort_unstable();
    points.dedup();

    let mut regions: Vec<Region> = Vec::new();
    // index of the covering source annotation of the last region
    let mut last_source: Option<usize> = None;
    let mut si = 0;
    let mut ti = 0;

    for window in points.windows(2) {
        let (start, end) = (window[0], window[1]);

        // skip annotations that end at or before this piece, including
        // zero-length ones sitting on its start
        while si < source.len() && source[si].end_ms <= start {
            si += 1;
        }
        while ti < target.len() && target[ti].end_ms <= start {
            ti += 1;
        }

        let source_hit = (si < source.len() && source[si].start_ms <= start).then_some(si);
        let target_hit = ti < target.len() && target[ti].start_ms <= start;

        let coverage = match (source_hit.is_some(), target_hit) {
            (true, true) => Coverage::Overlap,
            (true, false) => Coverage::SourceOnly,
            (false, true) => Coverage::TargetOnly,
            (false, false) => Coverage::Gap,
        };

        if let Some(prev) = regions.last_mut() {
            if prev.coverage == coverage && last_source == source_hit {
                prev.end_ms = end;
                continue;
            }
        }

        regions.push(Region {
            start_ms: start,
            end_ms: end,
            coverage,
            source_value: source_hit.map(|i| source[i].value.clone()),
        });
        last_source = source_hit;
    }

    regions
}
