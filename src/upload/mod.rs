mod client;
pub mod progress;
mod types;
mod validator;

pub use client::{ApiFuture, HttpSheetClient, SheetApi};
pub use progress::{ProgressSimulator, ProgressTick};
pub use types::{FilePreview, ProcessingResult, SelectedFile, UploadedFileHandle};
pub use validator::FileSelectionValidator;
