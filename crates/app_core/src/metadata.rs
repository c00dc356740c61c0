//! Metadata panel state, section layout and persisted collapse flags

use crate::format::{display_value, format_file_size, pretty_json};
use crate::AppError;
use app_api::{ImageMetadata, WorkflowSummary};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Sections collapsed until the user opens them
pub const COLLAPSED_BY_DEFAULT: [&str; 2] = ["prompt", "workflow"];

/// Parameter values longer than this are rendered as long values
const LONG_VALUE_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionState {
    Collapsed,
    Expanded,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PanelFile {
    #[serde(default)]
    sections: BTreeMap<String, SectionState>,
}

/// Per-section collapsed flags, surviving restarts when backed by a file
#[derive(Debug, Clone, Default)]
pub struct PanelStates {
    path: Option<PathBuf>,
    sections: BTreeMap<String, SectionState>,
}

impl PanelStates {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load from `path`; unreadable files fall back to defaults
    pub fn open(path: &Path) -> Self {
        let sections = match Self::read(path) {
            Ok(file) => file.sections,
            Err(e) => {
                tracing::warn!("Ignoring panel state at {:?}: {}", path, e);
                BTreeMap::new()
            }
        };
        Self {
            path: Some(path.to_path_buf()),
            sections,
        }
    }

    fn read(path: &Path) -> Result<PanelFile, AppError> {
        if !path.exists() {
            return Ok(PanelFile::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    fn save(&self) -> Result<(), AppError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = PanelFile { sections: self.sections.clone() };
        std::fs::write(path, toml::to_string_pretty(&file)?)?;
        Ok(())
    }

    pub fn is_collapsed(&self, section: &str) -> bool {
        match self.sections.get(section) {
            Some(state) => *state == SectionState::Collapsed,
            None => COLLAPSED_BY_DEFAULT.contains(&section),
        }
    }

    /// Flip a section and persist; returns the new collapsed flag
    pub fn toggle(&mut self, section: &str) -> bool {
        let collapsed = !self.is_collapsed(section);
        let state = if collapsed { SectionState::Collapsed } else { SectionState::Expanded };
        self.sections.insert(section.to_string(), state);

        if let Err(e) = self.save() {
            tracing::warn!("Failed to persist panel state: {}", e);
        }
        collapsed
    }
}

/// Metadata for the current detail image
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataState {
    Idle,
    Loading { path: String },
    Loaded { path: String, metadata: Box<ImageMetadata> },
    Failed { path: String, message: String },
}

impl MetadataState {
    pub fn path(&self) -> Option<&str> {
        match self {
            MetadataState::Idle => None,
            MetadataState::Loading { path }
            | MetadataState::Loaded { path, .. }
            | MetadataState::Failed { path, .. } => Some(path),
        }
    }

    pub fn metadata(&self) -> Option<&ImageMetadata> {
        match self {
            MetadataState::Loaded { metadata, .. } => Some(metadata),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamView {
    pub key: String,
    pub value: String,
    pub long: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub id: String,
    pub node_type: String,
    /// Only when it differs from the node type
    pub title: Option<String>,
    pub params: Vec<ParamView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SectionContent {
    Items(Vec<(String, String)>),
    Json(String),
    Nodes(Vec<NodeView>),
    Empty(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView {
    pub id: String,
    pub title: String,
    pub collapsed: bool,
    pub content: SectionContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MetadataView {
    Loading,
    Error(String),
    Sections(Vec<SectionView>),
}

impl MetadataView {
    pub fn build(state: &MetadataState, panels: &PanelStates) -> Option<Self> {
        match state {
            MetadataState::Idle => None,
            MetadataState::Loading { .. } => Some(MetadataView::Loading),
            MetadataState::Failed { message, .. } => {
                Some(MetadataView::Error(format!("Error loading metadata: {}", message)))
            }
            MetadataState::Loaded { metadata, .. } => Some(match &metadata.error {
                Some(error) => MetadataView::Error(format!("Error: {}", error)),
                None => MetadataView::Sections(sections(metadata, panels)),
            }),
        }
    }
}

fn section(id: &str, title: &str, panels: &PanelStates, content: SectionContent) -> SectionView {
    SectionView {
        id: id.to_string(),
        title: title.to_string(),
        collapsed: panels.is_collapsed(id),
        content,
    }
}

fn sections(meta: &ImageMetadata, panels: &PanelStates) -> Vec<SectionView> {
    let na = || "N/A".to_string();
    let mut out = vec![section(
        "basic",
        "Basic Info",
        panels,
        SectionContent::Items(vec![
            ("Format".to_string(), meta.format.clone().unwrap_or_else(na)),
            (
                "Dimensions".to_string(),
                meta.size.map(|s| format!("{} × {}", s.width, s.height)).unwrap_or_else(na),
            ),
            ("Color Mode".to_string(), meta.mode.clone().unwrap_or_else(na)),
            ("File Size".to_string(), format_file_size(meta.file_size)),
        ]),
    )];

    if let Some(summary) = &meta.workflow_summary {
        out.push(section("workflow-summary", "Node Summary", panels, summary_content(summary)));
    }
    if let Some(prompt) = &meta.prompt {
        out.push(section("prompt", "ComfyUI Prompt", panels, SectionContent::Json(pretty_json(prompt))));
    }
    if let Some(workflow) = &meta.workflow {
        out.push(section("workflow", "ComfyUI Workflow", panels, SectionContent::Json(pretty_json(workflow))));
    }
    if !meta.parameters.is_empty() {
        let items = meta
            .parameters
            .iter()
            .map(|(k, v)| (k.clone(), display_value(v)))
            .collect();
        out.push(section("parameters", "Parameters", panels, SectionContent::Items(items)));
    }

    out
}

fn summary_content(summary: &WorkflowSummary) -> SectionContent {
    if summary.nodes.is_empty() {
        return SectionContent::Empty("No workflow nodes found".to_string());
    }

    let nodes = summary
        .nodes
        .iter()
        .map(|node| NodeView {
            id: display_value(&node.id),
            node_type: node.node_type.clone(),
            title: node.title.clone().filter(|t| *t != node.node_type),
            params: node
                .params
                .iter()
                .map(|(key, value)| {
                    let value = display_value(value);
                    ParamView {
                        key: key.clone(),
                        long: value.chars().count() > LONG_VALUE_CHARS,
                        value,
                    }
                })
                .collect(),
        })
        .collect();

    SectionContent::Nodes(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_api::{ImageSize, SummaryNode};
    use serde_json::json;
    use tempfile::TempDir;

    fn sample() -> ImageMetadata {
        ImageMetadata {
            format: Some("PNG".into()),
            size: Some(ImageSize { width: 512, height: 768 }),
            mode: Some("RGBA".into()),
            file_size: 1536,
            prompt: Some(json!({"3": {"class_type": "KSampler"}})),
            workflow: None,
            workflow_summary: Some(WorkflowSummary {
                nodes: vec![SummaryNode {
                    id: json!(3),
                    node_type: "KSampler".into(),
                    title: Some("KSampler".into()),
                    params: [("seed".to_string(), json!(42)), ("text".to_string(), json!("x".repeat(60)))]
                        .into_iter()
                        .collect(),
                }],
            }),
            parameters: [("steps".to_string(), json!(20))].into_iter().collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_collapsed_sections() {
        let panels = PanelStates::in_memory();
        assert!(panels.is_collapsed("prompt"));
        assert!(panels.is_collapsed("workflow"));
        assert!(!panels.is_collapsed("basic"));
        assert!(!panels.is_collapsed("parameters"));
    }

    #[test]
    fn test_toggle_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("panels.toml");

        let mut panels = PanelStates::open(&path);
        assert!(!panels.toggle("prompt"));
        assert!(panels.toggle("basic"));

        let reopened = PanelStates::open(&path);
        assert!(!reopened.is_collapsed("prompt"));
        assert!(reopened.is_collapsed("basic"));
        assert!(reopened.is_collapsed("workflow"));
    }

    #[test]
    fn test_corrupt_state_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("panels.toml");
        std::fs::write(&path, "sections = 12").unwrap();

        let panels = PanelStates::open(&path);
        assert!(panels.is_collapsed("prompt"));
    }

    #[test]
    fn test_sections_layout() {
        let state = MetadataState::Loaded { path: "a.png".into(), metadata: Box::new(sample()) };
        let Some(MetadataView::Sections(sections)) = MetadataView::build(&state, &PanelStates::in_memory()) else {
            panic!("expected sections");
        };

        let ids: Vec<_> = sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["basic", "workflow-summary", "prompt", "parameters"]);

        let SectionContent::Items(basic) = &sections[0].content else { panic!("basic items") };
        assert_eq!(basic[1], ("Dimensions".to_string(), "512 × 768".to_string()));
        assert_eq!(basic[3], ("File Size".to_string(), "1.5 KB".to_string()));

        let SectionContent::Nodes(nodes) = &sections[1].content else { panic!("nodes") };
        assert_eq!(nodes[0].id, "3");
        assert_eq!(nodes[0].title, None);
        assert!(!nodes[0].params[0].long);
        assert!(nodes[0].params[1].long);

        assert!(sections[2].collapsed);
        assert!(!sections[3].collapsed);
    }

    #[test]
    fn test_error_views() {
        let panels = PanelStates::in_memory();
        let meta = ImageMetadata { error: Some("not an image".into()), ..Default::default() };
        let state = MetadataState::Loaded { path: "a".into(), metadata: Box::new(meta) };
        assert_eq!(
            MetadataView::build(&state, &panels),
            Some(MetadataView::Error("Error: not an image".into()))
        );

        let state = MetadataState::Failed { path: "a".into(), message: "timeout".into() };
        assert_eq!(
            MetadataView::build(&state, &panels),
            Some(MetadataView::Error("Error loading metadata: timeout".into()))
        );
        assert_eq!(MetadataView::build(&MetadataState::Idle, &panels), None);
    }

    #[test]
    fn test_empty_summary() {
        let meta = ImageMetadata { workflow_summary: Some(WorkflowSummary::default()), ..Default::default() };
        let state = MetadataState::Loaded { path: "a".into(), metadata: Box::new(meta) };
        let Some(MetadataView::Sections(sections)) = MetadataView::build(&state, &PanelStates::in_memory()) else {
            panic!("expected sections");
        };
        assert_eq!(sections[1].content, SectionContent::Empty("No workflow nodes found".into()));
    }
}
