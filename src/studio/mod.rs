//! Transient editor-shell state for the studio page.
//!
//! The studio surface only tracks local UI state: selected draw tool, sheet
//! tabs, layer visibility flags, and workspace settings. There is no geometry
//! model and no persistence; shells live in process memory per signed-in user
//! and reset to defaults on restart.

mod sheets;

pub use sheets::{Sheet, Sheets};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StudioError {
    #[error("Unknown sheet")]
    UnknownSheet,
    #[error("Unknown layer")]
    UnknownLayer,
    #[error("At least one sheet is required")]
    LastSheet,
    #[error("Sheet name cannot be empty")]
    EmptyName,
}

#[derive(ToSchema, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawTool {
    #[default]
    Rectangle,
    Polyline,
    Line,
    Bezier,
    Circle,
    Arc,
    Shape,
    Text,
}

#[derive(ToSchema, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformMode {
    #[default]
    Move,
    Rotate,
    Scale,
}

#[derive(ToSchema, Clone, Debug, Serialize)]
pub struct Layer {
    pub id: String,
    pub name: String,
    pub color: String,
    pub visible: bool,
}

#[derive(ToSchema, Clone, Debug, Serialize, Deserialize)]
pub struct Workspace {
    pub grid_size: u32,
    pub zoom: u32,
    pub grid_enabled: bool,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            grid_size: 200,
            zoom: 100,
            grid_enabled: true,
            width: None,
            height: None,
        }
    }
}

/// Everything the studio page needs to render its chrome.
#[derive(ToSchema, Clone, Debug, Serialize)]
pub struct Shell {
    pub tool: DrawTool,
    pub mode: TransformMode,
    #[schema(value_type = Vec<Sheet>)]
    pub sheets: Sheets,
    pub layers: Vec<Layer>,
    pub workspace: Workspace,
}

impl Default for Shell {
    fn default() -> Self {
        Self {
            tool: DrawTool::default(),
            mode: TransformMode::default(),
            sheets: Sheets::default(),
            layers: default_layers(),
            workspace: Workspace::default(),
        }
    }
}

fn default_layers() -> Vec<Layer> {
    let layer = |id: &str, name: &str, color: &str| Layer {
        id: id.to_string(),
        name: name.to_string(),
        color: color.to_string(),
        visible: true,
    };
    vec![
        layer("dimensions", "Dimensions", "#10b981"),
        layer("offsets", "Offsets", "#3b82f6"),
        layer("walls-sp1", "Walls - SP1", "#f59e0b"),
        layer("walls-sp2", "Walls - SP2", "#f59e0b"),
        layer("walls-sp3", "Walls - SP3", "#f59e0b"),
    ]
}

impl Shell {
    pub fn select_tool(&mut self, tool: DrawTool) {
        self.tool = tool;
    }

    pub fn set_mode(&mut self, mode: TransformMode) {
        self.mode = mode;
    }

    pub fn set_workspace(&mut self, workspace: Workspace) {
        self.workspace = workspace;
    }

    /// Flip a layer's visibility flag.
    pub fn toggle_layer(&mut self, id: &str) -> Result<&Layer, StudioError> {
        let layer = self
            .layers
            .iter_mut()
            .find(|layer| layer.id == id)
            .ok_or(StudioError::UnknownLayer)?;
        layer.visible = !layer.visible;
        Ok(layer)
    }
}

/// Per-user shells, keyed by platform user id.
///
/// Entries live for the process lifetime; the editor shell has no persistence
/// contract, so nothing is evicted or written out.
pub struct StudioStore {
    shells: Mutex<HashMap<Uuid, Shell>>,
}

impl StudioStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            shells: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Shell>> {
        match self.shells.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Run `f` against the caller's shell, creating a default one on first use.
    pub fn with_shell<R>(&self, user_id: Uuid, f: impl FnOnce(&mut Shell) -> R) -> R {
        let mut shells = self.lock();
        f(shells.entry(user_id).or_default())
    }

    /// Current shell contents for the caller.
    #[must_use]
    pub fn snapshot(&self, user_id: Uuid) -> Shell {
        self.with_shell(user_id, |shell| shell.clone())
    }
}

impl Default for StudioStore {
    fn default() -> Self {
        Self::new()
    }
}
