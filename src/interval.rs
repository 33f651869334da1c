/*!
 * Interval helpers shared by the overlap classifier and the hierarchizer.
 *
 * Containment rule: an interval `[start, end]` contains `t` when
 * `start <= t <= end`. When two touching intervals both contain `t` (t sits
 * on their shared boundary) the later one wins, i.e. the last interval whose
 * start is `<= t`.
 */

/// Anything with a closed millisecond span
pub trait Timed {
    fn start_ms(&self) -> u64;
    fn end_ms(&self) -> u64;
}

impl Timed for (u64, u64) {
    fn start_ms(&self) -> u64 {
        self.0
    }

    fn end_ms(&self) -> u64 {
        self.1
    }
}

/// Midpoint of a span, floor division
pub fn midpoint(start_ms: u64, end_ms: u64) -> u64 {
    start_ms + (end_ms.saturating_sub(start_ms)) / 2
}

/// Index of the interval containing `time_ms` in a sorted, non-overlapping slice
pub fn find_containing<T: Timed>(intervals: &[T], time_ms: u64) -> Option<usize> {
    // sorted by start, so everything before `idx` starts at or before `time_ms`
    let idx = intervals.partition_point(|iv| iv.start_ms() <= time_ms);
    if idx == 0 {
        return None;
    }
    let candidate = &intervals[idx - 1];
    if time_ms <= candidate.end_ms() {
        Some(idx - 1)
    } else {
        None
    }
}

/// Whether two spans share a positive-length stretch of time
pub fn overlaps(a: (u64, u64), b: (u64, u64)) -> bool {
    a.0.max(b.0) < a.1.min(b.1)
}

/// Whether two spans may not coexist on one independent tier.
///
/// Touching endpoints are fine. A zero-length span conflicts with a span that
/// strictly surrounds it and with an identical zero-length span.
pub fn conflicts(a: (u64, u64), b: (u64, u64)) -> bool {
    let a_point = a.0 == a.1;
    let b_point = b.0 == b.1;
    match (a_point, b_point) {
        (true, true) => a.0 == b.0,
        (true, false) => b.0 < a.0 && a.0 < b.1,
        (false, true) => a.0 < b.0 && b.0 < a.1,
        (false, false) => overlaps(a, b),
    }
}

/// Format a millisecond offset as HH:MM:SS.mmm for diagnostics
pub fn format_offset(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}
