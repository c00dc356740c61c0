//! Context menu commands

use serde::Serialize;

/// What the context menu was opened on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum ContextTarget {
    Image(String),
    Folder(String),
}

impl ContextTarget {
    pub fn path(&self) -> &str {
        match self {
            ContextTarget::Image(path) | ContextTarget::Folder(path) => path,
        }
    }
}

/// Context menu action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ContextAction {
    Download,
    DownloadFolder,
    CopyPath,
    CopyMetadata,
    CopyWorkflow,
}

impl ContextAction {
    pub const DOWNLOAD: &'static str = "download";
    pub const DOWNLOAD_FOLDER: &'static str = "download-folder";
    pub const COPY_PATH: &'static str = "copy-path";
    pub const COPY_METADATA: &'static str = "copy-metadata";
    pub const COPY_WORKFLOW: &'static str = "copy-workflow";

    const IMAGE_ACTIONS: [ContextAction; 4] = [
        ContextAction::Download,
        ContextAction::CopyPath,
        ContextAction::CopyMetadata,
        ContextAction::CopyWorkflow,
    ];
    const FOLDER_ACTIONS: [ContextAction; 2] = [ContextAction::DownloadFolder, ContextAction::CopyPath];

    pub fn id(self) -> &'static str {
        match self {
            ContextAction::Download => Self::DOWNLOAD,
            ContextAction::DownloadFolder => Self::DOWNLOAD_FOLDER,
            ContextAction::CopyPath => Self::COPY_PATH,
            ContextAction::CopyMetadata => Self::COPY_METADATA,
            ContextAction::CopyWorkflow => Self::COPY_WORKFLOW,
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            Self::DOWNLOAD => Some(ContextAction::Download),
            Self::DOWNLOAD_FOLDER => Some(ContextAction::DownloadFolder),
            Self::COPY_PATH => Some(ContextAction::CopyPath),
            Self::COPY_METADATA => Some(ContextAction::CopyMetadata),
            Self::COPY_WORKFLOW => Some(ContextAction::CopyWorkflow),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ContextAction::Download => "Download",
            ContextAction::DownloadFolder => "Download Folder",
            ContextAction::CopyPath => "Copy Path",
            ContextAction::CopyMetadata => "Copy Metadata",
            ContextAction::CopyWorkflow => "Copy Workflow",
        }
    }

    /// Actions offered for `target`, in menu order
    pub fn available_for(target: &ContextTarget) -> &'static [ContextAction] {
        match target {
            ContextTarget::Image(_) => &Self::IMAGE_ACTIONS,
            ContextTarget::Folder(_) => &Self::FOLDER_ACTIONS,
        }
    }

    pub fn applies_to(self, target: &ContextTarget) -> bool {
        Self::available_for(target).contains(&self)
    }
}

/// An open context menu
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextMenu {
    pub target: ContextTarget,
    /// Pointer position the menu was requested at
    pub x: f32,
    pub y: f32,
}

impl ContextMenu {
    pub fn new(target: ContextTarget, x: f32, y: f32) -> Self {
        Self { target, x, y }
    }

    pub fn actions(&self) -> &'static [ContextAction] {
        ContextAction::available_for(&self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actions_per_target() {
        let image = ContextTarget::Image("a/b.png".into());
        let folder = ContextTarget::Folder("a".into());

        let ids: Vec<_> = ContextAction::available_for(&image).iter().map(|a| a.id()).collect();
        assert_eq!(ids, ["download", "copy-path", "copy-metadata", "copy-workflow"]);

        let ids: Vec<_> = ContextAction::available_for(&folder).iter().map(|a| a.id()).collect();
        assert_eq!(ids, ["download-folder", "copy-path"]);

        assert!(!ContextAction::CopyWorkflow.applies_to(&folder));
        assert!(!ContextAction::DownloadFolder.applies_to(&image));
        assert!(ContextAction::CopyPath.applies_to(&folder));
    }

    #[test]
    fn test_id_round_trip() {
        for action in ContextAction::IMAGE_ACTIONS.iter().chain(&ContextAction::FOLDER_ACTIONS) {
            assert_eq!(ContextAction::from_id(action.id()), Some(*action));
        }
        assert_eq!(ContextAction::from_id("delete"), None);
    }
}
