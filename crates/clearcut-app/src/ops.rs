//! Edit operations given on the command line as compact tokens.
//!
//! `cut:10-20`, `copy:10-20`, `paste:42.5`, `delete:0-3`,
//! `insert:12:intro.mp4:0-4.5`, `undo`, `redo`, `use:from`, `use:project`.

use anyhow::{Context, Result};
use clearcut_core::{format_timestamp, ClearCutError};
use clearcut_timeline::{ContextId, ContextRegistry, EditingContext, Segment};
use std::fmt;
use std::str::FromStr;

/// Which open project an operation switches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    /// The project being edited and saved.
    Project,
    /// The read-only project given with `--from`.
    From,
}

/// Registry ids of the projects opened for one `edit` run.
#[derive(Debug, Clone, Copy)]
pub struct Tabs {
    pub project: ContextId,
    pub from: Option<ContextId>,
}

impl Tabs {
    fn resolve(&self, tab: Tab) -> Result<ContextId> {
        match tab {
            Tab::Project => Ok(self.project),
            Tab::From => self.from.context("use:from needs --from <project>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditOp {
    Cut { start: f64, end: f64 },
    Copy { start: f64, end: f64 },
    Paste { at: f64 },
    Delete { start: f64, end: f64 },
    Insert { position: f64, file: String, start: f64, end: f64 },
    Undo,
    Redo,
    Use(Tab),
}

impl EditOp {
    /// Apply this operation to the active project in `registry`.
    ///
    /// Cut and copy publish to the shared clipboard, so a paste after
    /// `use:project` can take material copied from the `--from` project.
    pub fn apply(&self, registry: &mut ContextRegistry, tabs: &Tabs) -> Result<()> {
        if let Self::Use(tab) = self {
            registry.set_active(tabs.resolve(*tab)?)?;
            return Ok(());
        }
        let active = registry.active_id().context("No project is open")?;
        match self {
            Self::Cut { start, end } => registry.cut(active, *start, *end)?,
            Self::Copy { start, end } => registry.copy(active, *start, *end)?,
            Self::Paste { at } => registry.paste(active, *at)?,
            Self::Delete { start, end } => active_context(registry)?.delete_range(*start, *end)?,
            Self::Insert {
                position,
                file,
                start,
                end,
            } => {
                let segment = Segment::with_source(*start, *end, file.clone())?;
                active_context(registry)?.insert_segment_at_position(*position, segment)?;
            }
            Self::Undo => active_context(registry)?.undo()?,
            Self::Redo => active_context(registry)?.redo()?,
            Self::Use(_) => {}
        }
        Ok(())
    }
}

fn active_context(registry: &mut ContextRegistry) -> Result<&mut EditingContext> {
    registry.active_mut().context("No project is open")
}

impl fmt::Display for EditOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let range = |start: f64, end: f64| {
            format!("{} - {}", format_timestamp(start), format_timestamp(end))
        };
        match self {
            Self::Cut { start, end } => write!(f, "cut {}", range(*start, *end)),
            Self::Copy { start, end } => write!(f, "copy {}", range(*start, *end)),
            Self::Paste { at } => write!(f, "paste at {}", format_timestamp(*at)),
            Self::Delete { start, end } => write!(f, "delete {}", range(*start, *end)),
            Self::Insert {
                position,
                file,
                start,
                end,
            } => write!(
                f,
                "insert {} [{}] at {}",
                file,
                range(*start, *end),
                format_timestamp(*position)
            ),
            Self::Undo => f.write_str("undo"),
            Self::Redo => f.write_str("redo"),
            Self::Use(Tab::Project) => f.write_str("switch to project"),
            Self::Use(Tab::From) => f.write_str("switch to --from project"),
        }
    }
}

fn parse_time(token: &str, text: &str) -> Result<f64, ClearCutError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|t| t.is_finite())
        .ok_or_else(|| ClearCutError::Config(format!("Bad time '{}' in '{}'", text, token)))
}

fn parse_range(token: &str, text: &str) -> Result<(f64, f64), ClearCutError> {
    let (start, end) = text
        .split_once('-')
        .ok_or_else(|| ClearCutError::Config(format!("Expected start-end in '{}'", token)))?;
    Ok((parse_time(token, start)?, parse_time(token, end)?))
}

impl FromStr for EditOp {
    type Err = ClearCutError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let (verb, rest) = token.split_once(':').unwrap_or((token, ""));
        match verb {
            "cut" => parse_range(token, rest).map(|(start, end)| Self::Cut { start, end }),
            "copy" => parse_range(token, rest).map(|(start, end)| Self::Copy { start, end }),
            "delete" => parse_range(token, rest).map(|(start, end)| Self::Delete { start, end }),
            "paste" => parse_time(token, rest).map(|at| Self::Paste { at }),
            "insert" => {
                // The file name may itself contain ':'.
                let bad = || {
                    ClearCutError::Config(format!("Expected insert:pos:file:start-end in '{}'", token))
                };
                let (position, rest) = rest.split_once(':').ok_or_else(bad)?;
                let (file, range) = rest.rsplit_once(':').ok_or_else(bad)?;
                if file.is_empty() {
                    return Err(bad());
                }
                let (start, end) = parse_range(token, range)?;
                Ok(Self::Insert {
                    position: parse_time(token, position)?,
                    file: file.to_string(),
                    start,
                    end,
                })
            }
            "undo" if rest.is_empty() => Ok(Self::Undo),
            "redo" if rest.is_empty() => Ok(Self::Redo),
            "use" if rest == "project" => Ok(Self::Use(Tab::Project)),
            "use" if rest == "from" => Ok(Self::Use(Tab::From)),
            _ => Err(ClearCutError::Config(format!(
                "Unknown edit operation '{}'",
                token
            ))),
        }
    }
}
