//! Time representation for range editing
//!
//! Times are plain `f64` seconds. User-facing positions come from
//! independently rounded input (spoken timestamps, keyboard nudges, probe
//! results), so boundary matching goes through a single shared tolerance.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance, in seconds, for matching a caller time against a boundary.
///
/// Shared by segment splitting, range clamping and coordinate mapping.
pub const TIME_EPSILON: f64 = 0.01;

/// Check whether two times are equal within [`TIME_EPSILON`].
#[inline]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= TIME_EPSILON
}

/// Format seconds as `HH:MM:SS.mmm`.
///
/// Negative inputs are clamped to zero.
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let s = total_secs % 60;
    let m = (total_secs / 60) % 60;
    let h = total_secs / 3600;
    format!("{h:02}:{m:02}:{s:02}.{ms:03}")
}

/// A time range with inclusive start and exclusive end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start time (inclusive)
    pub start: f64,
    /// End time (exclusive)
    pub end: f64,
}

impl TimeRange {
    /// Create a new time range from start and end times.
    #[inline]
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Duration of the range. Inverted ranges report zero.
    #[inline]
    pub fn duration(self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// True when the range is shorter than [`TIME_EPSILON`].
    #[inline]
    pub fn is_empty(self) -> bool {
        self.end - self.start < TIME_EPSILON
    }

    /// Check if a time is within this range.
    #[inline]
    pub fn contains(self, time: f64) -> bool {
        time >= self.start && time < self.end
    }

    /// Like [`contains`](Self::contains) but both ends are widened by
    /// [`TIME_EPSILON`] and the end is inclusive.
    #[inline]
    pub fn contains_approx(self, time: f64) -> bool {
        time >= self.start - TIME_EPSILON && time <= self.end + TIME_EPSILON
    }

    /// Check if two ranges overlap.
    pub fn overlaps(self, other: Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Compute the intersection of two ranges, if any.
    pub fn intersection(self, other: Self) -> Option<Self> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Self::new(
            self.start.max(other.start),
            self.end.min(other.end),
        ))
    }

    /// Shift both ends by `delta` seconds.
    pub fn offset(self, delta: f64) -> Self {
        Self::new(self.start + delta, self.end + delta)
    }

    /// Empty range starting at zero.
    pub const EMPTY: Self = Self {
        start: 0.0,
        end: 0.0,
    };
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            format_timestamp(self.start),
            format_timestamp(self.end)
        )
    }
}
