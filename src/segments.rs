/*!
 * Segment marking.
 *
 * Turns externally produced speech segments (offset and duration in
 * seconds) into an independent tier. A segment whose midpoint falls inside
 * an annotation of the optional overlap tier is marked `"overlap"`.
 */

use log::info;
use serde::{Deserialize, Serialize};

use crate::document::{AnnotationDocument, TierSpec};
use crate::errors::{AlignError, WithDocument};
use crate::interval;

/// Value given to segments whose midpoint lies on the overlap tier
pub const OVERLAP_VALUE: &str = "overlap";

/// Speech segment in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub offset: f64,
    pub duration: f64,
}

impl Segment {
    pub fn new(offset: f64, duration: f64) -> Self {
        Self { offset, duration }
    }

    /// Span in milliseconds, truncating fractional milliseconds
    pub fn span_ms(&self) -> Result<(u64, u64), AlignError> {
        let valid = |x: f64| x.is_finite() && x >= 0.0;
        if !valid(self.offset) || !valid(self.duration) {
            return Err(AlignError::InvalidSegment {
                offset: self.offset,
                duration: self.duration,
            });
        }
        let start_ms = (self.offset * 1000.0) as u64;
        let end_ms = ((self.offset + self.duration) * 1000.0) as u64;
        Ok((start_ms, end_ms))
    }
}

/// Outcome of marking segments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SegmentReport {
    pub marked: usize,
    pub overlapping: usize,
}

/// Add `tier` holding one annotation per segment.
///
/// On error the document is left as it was.
pub fn mark_segments(
    document: &mut AnnotationDocument,
    tier: &str,
    segments: &[Segment],
    overlap_tier: Option<&str>,
) -> Result<SegmentReport, AlignError> {
    let id = document.id().to_string();
    let mut working = document.clone();
    working.add_tier(tier, TierSpec::Independent).in_document(&id)?;

    let mut report = SegmentReport::default();
    for segment in segments {
        let (start_ms, end_ms) = segment.span_ms()?;

        let overlapping = match overlap_tier {
            Some(overlap) => working
                .find_annotation_containing(overlap, interval::midpoint(start_ms, end_ms))
                .in_document(&id)?
                .is_some(),
            None => false,
        };
        let value = if overlapping { OVERLAP_VALUE } else { "" };

        working
            .add_annotation(tier, start_ms, end_ms, value)
            .in_document(&id)?;
        report.marked += 1;
        if overlapping {
            report.overlapping += 1;
        }
    }

    info!(
        "{}: marked {} segments on '{}', {} overlapping",
        working.id(),
        report.marked,
        tier,
        report.overlapping
    );

    *document = working;
    Ok(report)
}
