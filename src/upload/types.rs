use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A file the user picked that passed the extension check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub extension: String,
    pub size_bytes: u64,
    pub path: PathBuf,
}

/// Server-side temporary name returned by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFileHandle {
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingResult {
    pub sheet_name: String,
    pub redirect_url: String,
}

/// What the preview panel shows for an accepted selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePreview {
    pub display_name: String,
    pub extension_label: String,
    pub size_label: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProcessRequest<'a> {
    pub file_name: &'a str,
}

/// Both endpoints answer with either an `error` field or their payload, often
/// alongside a 400 status, so every field is optional here.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct UploadResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProcessResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub sheet_name: Option<String>,
    #[serde(default)]
    pub redirect_url: Option<String>,
}

/// An `error` counts only when it carries text, the same truthiness the page used.
pub(crate) fn server_error(error: &Option<String>) -> Option<&str> {
    error.as_deref().filter(|message| !message.is_empty())
}
