//! Trellis gesture replay
//!
//! Loads a laid-out diagram and a pointer script from JSON, drives the core
//! editor through it, and collects the edits it emits.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use trellis_core::{
    ContentId, Diagram, DiagramSnapshot, Edit, EditError, Editor, EditorConfig, GestureTarget, PointerEvent,
    SnapLines, SnapshotLayout,
};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Edit(#[from] EditError),
}

/// A diagram together with the layout it was rendered with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    pub diagram: DiagramSnapshot,
    #[serde(default)]
    pub layout: SnapshotLayout,
}

/// One gesture: what the pointer grabs, then the events that follow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureScript {
    #[serde(default)]
    pub target: GestureTarget,
    pub events: Vec<PointerEvent>,
}

/// Selection to apply before replaying the gestures in order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub select: Vec<ContentId>,
    #[serde(default)]
    pub gestures: Vec<GestureScript>,
}

/// An emitted edit, with the guide lines shown at that moment.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayStep {
    pub edit: Edit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snap_lines: Option<SnapLines>,
}

fn read(path: &Path) -> Result<String, ReplayError> {
    std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_scene(path: &Path) -> Result<Scene, ReplayError> {
    Ok(serde_json::from_str(&read(path)?)?)
}

pub fn load_script(path: &Path) -> Result<Script, ReplayError> {
    Ok(serde_json::from_str(&read(path)?)?)
}

/// Editor configuration from `path`, or the defaults.
pub fn load_config(path: Option<&Path>) -> Result<EditorConfig, ReplayError> {
    match path {
        Some(path) => Ok(EditorConfig::from_json(&read(path)?)?),
        None => Ok(EditorConfig::default()),
    }
}

/// Run every gesture of `script` and return the emitted edits in order.
pub fn replay(scene: Scene, script: &Script, config: EditorConfig) -> Result<Vec<ReplayStep>, ReplayError> {
    let diagram = Diagram::from_snapshot(scene.diagram)?;
    let mut editor = Editor::new(diagram, scene.layout, config)?;
    for id in &script.select {
        editor.select(id, true)?;
    }

    let mut steps = Vec::new();
    for (index, gesture) in script.gestures.iter().enumerate() {
        log::info!("replaying gesture {index} ({} events)", gesture.events.len());
        for event in &gesture.events {
            let Some(edit) = editor.handle_pointer_event(event, &gesture.target)? else {
                continue;
            };
            let snap_lines = if edit.committed {
                None
            } else {
                editor.snap_lines().filter(|lines| !lines.is_empty()).cloned()
            };
            steps.push(ReplayStep { edit, snap_lines });
        }
    }
    Ok(steps)
}

/// Write one JSON document per step.
pub fn write_steps(steps: &[ReplayStep], mut out: impl Write) -> Result<(), ReplayError> {
    for step in steps {
        serde_json::to_writer(&mut out, step)?;
        writeln!(out).map_err(|source| ReplayError::Io {
            path: PathBuf::from("<output>"),
            source,
        })?;
    }
    Ok(())
}
