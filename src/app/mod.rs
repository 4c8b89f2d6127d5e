mod notification;
mod state;
mod ui;

use crate::config::UploaderConfig;
use crate::error::UploaderError;
use crate::upload::{
    FileSelectionValidator, ProcessingResult, ProgressSimulator, SelectedFile, SheetApi,
    UploadedFileHandle,
};
use derivative::Derivative;
use eframe::{egui, App};
use reqwest::Url;
use std::path::PathBuf;
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{debug, error, info, warn};

pub use notification::{
    resolve_redirect, BrowserNavigator, DismissAction, Navigator, Notification, NotificationIcon,
};
pub use state::{UploadState, WorkflowEvent, WorkflowStage};

const NETWORK_ERROR_TEXT: &str = "There was a problem connecting to the server.";

/// One upload widget: owns its state, its progress timer and its channel back
/// from the background tasks.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct CsvUploader {
    state: UploadState,
    validator: FileSelectionValidator,
    base_url: Url,
    auto_upload: bool,
    #[derivative(Debug = "ignore")]
    progress: ProgressSimulator,
    #[derivative(Debug = "ignore")]
    api: Arc<dyn SheetApi>,
    #[derivative(Debug = "ignore")]
    navigator: Box<dyn Navigator>,
    #[derivative(Debug = "ignore")]
    runtime: Runtime,
    #[derivative(Debug = "ignore")]
    event_sender: std_mpsc::Sender<WorkflowEvent>,
    #[derivative(Debug = "ignore")]
    event_receiver: std_mpsc::Receiver<WorkflowEvent>,
}

impl CsvUploader {
    pub fn new(
        config: &UploaderConfig,
        api: Arc<dyn SheetApi>,
        navigator: Box<dyn Navigator>,
    ) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("sheet-uploader")
            .enable_all()
            .build()?;
        let (event_sender, event_receiver) = std_mpsc::channel();

        info!(server = %config.server_url, "initializing CSV sheet uploader");
        Ok(Self {
            state: UploadState::default(),
            validator: FileSelectionValidator::new(config.normalized_extensions()),
            base_url: config.base_url()?,
            auto_upload: config.auto_upload,
            progress: ProgressSimulator::new(Duration::from_millis(config.progress_tick_ms)),
            api,
            navigator,
            runtime,
            event_sender,
            event_receiver,
        })
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn progress(&self) -> &ProgressSimulator {
        &self.progress
    }

    pub fn allowed_extensions(&self) -> &[String] {
        self.validator.allowed_extensions()
    }

    /// The file picker produced a path, either from the dialog or a drop.
    pub fn select_path(&mut self, path: PathBuf) {
        // A new selection invalidates any handle, timer or request in flight.
        self.state.selection_id += 1;
        self.state.sheet_name = None;
        self.progress.reset();
        if self.state.notifications.current().is_some_and(|n| n.loading) {
            self.state.notifications.close();
        }

        match self.validator.inspect(&path) {
            Ok(file) => {
                info!(file = %file.name, bytes = file.size_bytes, "file selected");
                self.selection_changed(Some(&file));
                self.state.stage = WorkflowStage::Selected { file };
                if self.auto_upload {
                    self.start_upload();
                }
            }
            Err(err) => {
                warn!(path = %path.display(), "selection rejected: {}", err);
                self.state.stage = WorkflowStage::Empty;
                let notification = match err {
                    UploaderError::Validation { .. } => Notification::error(
                        "Invalid File Type",
                        &self.validator.rejection_message(),
                    ),
                    other => Notification::error("Invalid File", &other.to_string()),
                };
                self.state.notifications.show(
                    notification
                        .confirm_color("#d33")
                        .then(DismissAction::ResetSelection),
                );
            }
        }
    }

    /// Mirrors the picker's change signal onto the preview.
    fn selection_changed(&mut self, file: Option<&SelectedFile>) {
        self.state.preview = file.map(FileSelectionValidator::preview);
    }

    /// Clears the picker and replays the change signal so every dependent
    /// piece of UI lands in the same empty state.
    pub fn reset_selection(&mut self) {
        debug!("resetting file selection");
        self.progress.reset();
        self.state.clear();
        self.selection_changed(None);
    }

    pub fn start_upload(&mut self) {
        let file = match std::mem::take(&mut self.state.stage) {
            WorkflowStage::Selected { file } => file,
            other => {
                debug!(stage = other.label(), "upload requested without a fresh selection");
                self.state.stage = other;
                return;
            }
        };

        info!(file = %file.name, "starting upload");
        self.state.notifications.show(Notification::loading(
            "Uploading...",
            "Please wait while the file is being uploaded...",
        ));
        self.state.stage = WorkflowStage::Uploading { file: file.clone() };

        let selection = self.state.selection_id;
        let api = Arc::clone(&self.api);
        let sender = self.event_sender.clone();
        self.runtime.spawn(async move {
            let result = api.upload_temp_file(&file).await;
            let _ = sender.send(WorkflowEvent::Uploaded { selection, result });
        });
    }

    /// The progress panel's start button.
    pub fn activate_progress(&mut self) {
        let (file, handle) = match std::mem::take(&mut self.state.stage) {
            WorkflowStage::Uploaded { file, handle } => (file, handle),
            other => {
                debug!(stage = other.label(), "progress activation ignored");
                self.state.stage = other;
                return;
            }
        };

        let sender = self.event_sender.clone();
        let activated = self.progress.activate(self.runtime.handle(), move |run, tick| {
            let _ = sender.send(WorkflowEvent::Progress { run, tick });
        });

        self.state.stage = match activated {
            Some(run) => WorkflowStage::Progressing { file, handle, run },
            None => WorkflowStage::Uploaded { file, handle },
        };
    }

    /// User confirmed the open notification.
    pub fn dismiss_notification(&mut self) {
        match self.state.notifications.dismiss() {
            Some(DismissAction::ResetSelection) => self.reset_selection(),
            Some(DismissAction::Navigate(target)) => self.navigate(&target),
            Some(DismissAction::Nothing) | None => {}
        }
    }

    /// Drains everything the background tasks reported since the last frame.
    pub fn pump_events(&mut self) -> bool {
        let mut had_updates = false;
        while let Ok(event) = self.event_receiver.try_recv() {
            had_updates = true;
            match event {
                WorkflowEvent::Uploaded { selection, result } => {
                    self.on_uploaded(selection, result)
                }
                WorkflowEvent::Progress { run, tick } => {
                    let current = matches!(
                        self.state.stage,
                        WorkflowStage::Progressing { run: active, .. } if active == run
                    );
                    if current && self.progress.apply(run, tick) {
                        self.confirm_processing();
                    }
                }
                WorkflowEvent::Processed { selection, result } => {
                    self.on_processed(selection, result)
                }
            }
        }
        had_updates
    }

    fn on_uploaded(&mut self, selection: u64, result: Result<UploadedFileHandle, UploaderError>) {
        if !self.state.is_current(selection)
            || !matches!(self.state.stage, WorkflowStage::Uploading { .. })
        {
            debug!(selection, "discarding upload result for a replaced selection");
            return;
        }
        let WorkflowStage::Uploading { file } = std::mem::take(&mut self.state.stage) else {
            return;
        };

        self.state.notifications.close();
        match result {
            Ok(handle) => {
                info!(file = %file.name, handle = %handle.file_name, "upload accepted");
                self.state.stage = WorkflowStage::Uploaded { file, handle };
                self.progress.start();
            }
            Err(err @ (UploaderError::UploadRejected(_) | UploaderError::ReadFile { .. })) => {
                warn!(file = %file.name, "upload rejected: {}", err);
                let text = match &err {
                    UploaderError::UploadRejected(message) => message.clone(),
                    other => other.to_string(),
                };
                self.state.stage = WorkflowStage::Selected { file };
                self.state.notifications.show(
                    Notification::error("Upload Error", &text).then(DismissAction::ResetSelection),
                );
            }
            Err(err) => {
                error!(file = %file.name, "upload failed: {}", err);
                self.state.stage = WorkflowStage::Selected { file };
                self.state
                    .notifications
                    .show(Notification::error("Network Error", NETWORK_ERROR_TEXT));
            }
        }
    }

    /// Fires once the simulated progress completes. Without a handle for the
    /// current selection there is nothing to process.
    fn confirm_processing(&mut self) {
        let (file, handle) = match std::mem::take(&mut self.state.stage) {
            WorkflowStage::Progressing { file, handle, .. } => (file, handle),
            other => {
                debug!(stage = other.label(), "no uploaded file to process");
                self.state.stage = other;
                return;
            }
        };

        info!(handle = %handle.file_name, "requesting processing");
        self.state.notifications.show(Notification::loading(
            "Processing File...",
            "Validating and processing uploaded file...",
        ));
        self.state.stage = WorkflowStage::Processing {
            file,
            handle: handle.clone(),
        };

        let selection = self.state.selection_id;
        let api = Arc::clone(&self.api);
        let sender = self.event_sender.clone();
        self.runtime.spawn(async move {
            let result = api.process_file(&handle).await;
            let _ = sender.send(WorkflowEvent::Processed { selection, result });
        });
    }

    fn on_processed(&mut self, selection: u64, result: Result<ProcessingResult, UploaderError>) {
        if !self.state.is_current(selection)
            || !matches!(self.state.stage, WorkflowStage::Processing { .. })
        {
            debug!(selection, "discarding processing result for a replaced selection");
            return;
        }
        let WorkflowStage::Processing { file, handle } = std::mem::take(&mut self.state.stage)
        else {
            return;
        };

        match result {
            Ok(result) => {
                info!(
                    handle = %handle.file_name,
                    sheet = %result.sheet_name,
                    redirect = %result.redirect_url,
                    "processing finished"
                );
                self.state.sheet_name = Some(result.sheet_name.clone());
                self.state.notifications.show(
                    Notification::success(
                        "Success",
                        &format!(
                            "{} uploaded successfully! Sheet: {}",
                            handle.file_name, result.sheet_name
                        ),
                    )
                    .confirm_label("View Invoice")
                    .then(DismissAction::Navigate(result.redirect_url.clone())),
                );
                self.state.stage = WorkflowStage::Done {
                    file,
                    handle,
                    result,
                };
            }
            Err(err) => {
                let (title, text) = match &err {
                    UploaderError::ProcessingRejected(message) => {
                        warn!(handle = %handle.file_name, "processing rejected: {}", message);
                        ("Processing Error", message.clone())
                    }
                    other => {
                        error!(handle = %handle.file_name, "processing failed: {}", other);
                        ("Network Error", NETWORK_ERROR_TEXT.to_string())
                    }
                };
                self.state.notifications.show(Notification::error(title, &text));
                self.state.stage = WorkflowStage::Stalled {
                    file,
                    handle,
                    reason: err.to_string(),
                };
            }
        }
    }

    fn navigate(&mut self, target: &str) {
        let outcome = resolve_redirect(&self.base_url, target)
            .and_then(|url| {
                info!(%url, "opening result page");
                self.navigator.navigate(&url)
            });
        if let Err(err) = outcome {
            error!("navigation failed: {}", err);
            self.state
                .notifications
                .show(Notification::error("Navigation Error", &err.to_string()));
        }
    }

    pub fn update_state(&mut self, ctx: &egui::Context) {
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .collect()
        });
        if let Some(path) = dropped.into_iter().next() {
            if self.state.notifications.is_open() {
                debug!(path = %path.display(), "ignoring drop while a notification is open");
            } else {
                self.select_path(path);
            }
        }

        let had_updates = self.pump_events();
        if had_updates || self.state.stage.is_busy() || self.progress.is_ticking() {
            ctx.request_repaint();
        }
    }
}

impl App for CsvUploader {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_state(ctx);
        self.render(ctx);
    }
}
