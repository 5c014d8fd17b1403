//! Export plan: the owned list of ranges handed to the media backend.

use clearcut_core::{approx_eq, TimeRange};
use serde::{Deserialize, Serialize};

use crate::error::{EditError, EditResult};
use crate::timeline::Timeline;

/// One range of one source file to render, in output order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRange {
    pub source_file: String,
    pub start: f64,
    pub end: f64,
}

impl ExportRange {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn source_range(&self) -> TimeRange {
        TimeRange::new(self.start, self.end)
    }
}

/// Immutable copy of a timeline taken at export time.
///
/// Owning its data lets an export run while the timeline keeps changing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPlan {
    pub ranges: Vec<ExportRange>,
}

impl ExportPlan {
    /// Total output duration.
    pub fn total_duration(&self) -> f64 {
        self.ranges.iter().map(ExportRange::duration).sum()
    }

    /// Distinct source files in first-use order.
    pub fn sources(&self) -> Vec<&str> {
        let mut sources: Vec<&str> = Vec::new();
        for range in &self.ranges {
            if !sources.contains(&range.source_file.as_str()) {
                sources.push(&range.source_file);
            }
        }
        sources
    }

    /// True when the plan is the whole of `source_file`, untouched, so the
    /// backend can stream-copy it.
    pub fn is_passthrough(&self, source_file: &str, source_duration: f64) -> bool {
        match self.ranges.as_slice() {
            [only] => {
                only.source_file == source_file
                    && approx_eq(only.start, 0.0)
                    && approx_eq(only.end, source_duration)
            }
            _ => false,
        }
    }
}

impl Timeline {
    /// Snapshot the segment list for export, resolving default sources.
    pub fn export_plan(&self) -> EditResult<ExportPlan> {
        if self.is_empty() {
            return Err(EditError::NothingSelected {
                start: 0.0,
                end: 0.0,
            });
        }
        let ranges = self
            .segments()
            .iter()
            .enumerate()
            .map(|(index, segment)| {
                let source_file = segment
                    .effective_source(self.source_file())
                    .ok_or(EditError::MissingSource { index })?;
                Ok(ExportRange {
                    source_file: source_file.to_string(),
                    start: segment.start,
                    end: segment.end,
                })
            })
            .collect::<EditResult<Vec<_>>>()?;
        Ok(ExportPlan { ranges })
    }
}
