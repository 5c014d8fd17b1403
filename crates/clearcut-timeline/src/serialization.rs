//! Project serialization with versioning and migration.
//!
//! Uses JSON with a schema version field for forward-compatible persistence.

use clearcut_core::{ClearCutError, Result};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::context::EditingContext;
use crate::segment::Segment;

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Persisted timeline content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineState {
    pub segments: Vec<Segment>,
    pub source_file: Option<String>,
    #[serde(default)]
    pub source_duration: f64,
}

impl TimelineState {
    /// Capture the current timeline of a context.
    pub fn from_context(context: &EditingContext) -> Self {
        let timeline = context.timeline();
        Self {
            segments: timeline.segments().to_vec(),
            source_file: timeline.source_file().map(String::from),
            source_duration: timeline.source_duration(),
        }
    }
}

/// Versioned project file wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    /// Schema version for migration.
    pub version: u32,
    /// Application version that wrote this file.
    pub app_version: String,
    /// Identity of the editing context that was saved.
    pub project_id: Uuid,
    /// The timeline data.
    pub timeline: TimelineState,
}

impl ProjectFile {
    /// Create a project file from an editing context.
    pub fn from_context(context: &EditingContext) -> Self {
        Self {
            version: CURRENT_VERSION,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            project_id: context.id,
            timeline: TimelineState::from_context(context),
        }
    }

    /// Load this file's timeline into `context` (which becomes clean, with
    /// the loaded state as its undo baseline).
    pub fn restore_into(&self, context: &mut EditingContext) -> Result<()> {
        let state = self.timeline.clone();
        context.restore_state(state.segments, state.source_file, state.source_duration)?;
        context.id = self.project_id;
        Ok(())
    }

    /// Build a fresh context named `name` from this file.
    pub fn into_context(self, name: impl Into<String>) -> Result<EditingContext> {
        let mut context = EditingContext::new(name);
        self.restore_into(&mut context)?;
        Ok(context)
    }

    /// Serialize to JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| {
            ClearCutError::Serialization(format!("Failed to serialize project: {}", e))
        })
    }

    /// Deserialize from JSON bytes, applying migrations if needed.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        // First, try to read just the version
        let raw: serde_json::Value = serde_json::from_slice(data)
            .map_err(|e| ClearCutError::Serialization(format!("Invalid JSON: {}", e)))?;

        let version = raw.get("version").and_then(|v| v.as_u64()).unwrap_or(0) as u32;

        if version > CURRENT_VERSION {
            return Err(ClearCutError::Serialization(format!(
                "Project file version {} is newer than supported version {}",
                version, CURRENT_VERSION
            )));
        }

        let migrated = migrate(raw, version)?;

        serde_json::from_value(migrated)
            .map_err(|e| ClearCutError::Serialization(format!("Failed to parse project: {}", e)))
    }

    /// Save project to a file path.
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<()> {
        let data = self.to_json()?;
        std::fs::write(path, data)?;
        info!(path = %path.display(), segments = self.timeline.segments.len(), "Saved project");
        Ok(())
    }

    /// Load project from a file path.
    pub fn load_from_file(path: &std::path::Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let file = Self::from_json(&data)?;
        info!(path = %path.display(), version = file.version, "Loaded project");
        Ok(file)
    }
}

/// Apply sequential migrations from `from_version` to CURRENT_VERSION.
fn migrate(mut data: serde_json::Value, from_version: u32) -> Result<serde_json::Value> {
    let mut version = from_version;

    while version < CURRENT_VERSION {
        match version {
            0 => {
                // v0 → v1: either `{ "timeline": {...} }` or the bare
                // timeline object, without version or project id.
                let timeline = if data.get("timeline").is_some() {
                    data["timeline"].take()
                } else {
                    data
                };
                if timeline.get("segments").is_none() {
                    return Err(ClearCutError::Serialization(
                        "Version 0 project has no timeline segments".into(),
                    ));
                }
                data = serde_json::json!({
                    "version": 1,
                    "appVersion": "0.0.0",
                    "projectId": Uuid::new_v4(),
                    "timeline": timeline,
                });
                version = 1;
            }
            _ => {
                return Err(ClearCutError::Serialization(format!(
                    "No migration path from version {}",
                    version
                )));
            }
        }
    }

    Ok(data)
}
