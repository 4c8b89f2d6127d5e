use super::notification::NotificationPresenter;
use crate::error::UploaderError;
use crate::upload::{
    FilePreview, ProcessingResult, ProgressTick, SelectedFile, UploadedFileHandle,
};

/// Where the pipeline currently stands. The upload handle only exists inside
/// the stages that may use it.
#[derive(Debug, Clone, Default)]
pub enum WorkflowStage {
    #[default]
    Empty,
    Selected {
        file: SelectedFile,
    },
    Uploading {
        file: SelectedFile,
    },
    /// Progress panel shown, waiting for the user to press start.
    Uploaded {
        file: SelectedFile,
        handle: UploadedFileHandle,
    },
    Progressing {
        file: SelectedFile,
        handle: UploadedFileHandle,
        run: u64,
    },
    Processing {
        file: SelectedFile,
        handle: UploadedFileHandle,
    },
    Done {
        file: SelectedFile,
        handle: UploadedFileHandle,
        result: ProcessingResult,
    },
    /// Processing failed; nothing is reset and the flow stays put.
    Stalled {
        file: SelectedFile,
        handle: UploadedFileHandle,
        reason: String,
    },
}

impl WorkflowStage {
    pub fn file(&self) -> Option<&SelectedFile> {
        match self {
            Self::Empty => None,
            Self::Selected { file }
            | Self::Uploading { file }
            | Self::Uploaded { file, .. }
            | Self::Progressing { file, .. }
            | Self::Processing { file, .. }
            | Self::Done { file, .. }
            | Self::Stalled { file, .. } => Some(file),
        }
    }

    pub fn handle(&self) -> Option<&UploadedFileHandle> {
        match self {
            Self::Uploaded { handle, .. }
            | Self::Progressing { handle, .. }
            | Self::Processing { handle, .. }
            | Self::Done { handle, .. }
            | Self::Stalled { handle, .. } => Some(handle),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Selected { .. } => "selected",
            Self::Uploading { .. } => "uploading",
            Self::Uploaded { .. } => "uploaded",
            Self::Progressing { .. } => "progressing",
            Self::Processing { .. } => "processing",
            Self::Done { .. } => "done",
            Self::Stalled { .. } => "stalled",
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::Uploading { .. } | Self::Progressing { .. } | Self::Processing { .. }
        )
    }
}

/// Results coming back from background tasks. Each carries the selection or
/// run it was started for so late arrivals can be discarded.
#[derive(Debug)]
pub enum WorkflowEvent {
    Uploaded {
        selection: u64,
        result: Result<UploadedFileHandle, UploaderError>,
    },
    Progress {
        run: u64,
        tick: ProgressTick,
    },
    Processed {
        selection: u64,
        result: Result<ProcessingResult, UploaderError>,
    },
}

#[derive(Debug, Default)]
pub struct UploadState {
    pub stage: WorkflowStage,
    /// Bumped on every selection and every reset.
    pub selection_id: u64,
    pub preview: Option<FilePreview>,
    pub sheet_name: Option<String>,
    pub notifications: NotificationPresenter,
}

impl UploadState {
    /// Forgets the selection and everything derived from it. Open
    /// notifications are left alone.
    pub fn clear(&mut self) {
        self.selection_id += 1;
        self.stage = WorkflowStage::Empty;
        self.preview = None;
        self.sheet_name = None;
    }

    pub fn can_upload(&self) -> bool {
        matches!(self.stage, WorkflowStage::Selected { .. })
    }

    pub fn is_current(&self, selection: u64) -> bool {
        self.selection_id == selection
    }
}
