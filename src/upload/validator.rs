use super::types::{FilePreview, SelectedFile};
use crate::error::UploaderError;
use crate::utils::file_size::FileSizeUtils;
use std::path::Path;

/// Gatekeeper between the file picker and the upload stage.
#[derive(Debug, Clone)]
pub struct FileSelectionValidator {
    allowed_extensions: Vec<String>,
}

impl FileSelectionValidator {
    /// `allowed_extensions` must already be lowercase.
    pub fn new(allowed_extensions: Vec<String>) -> Self {
        Self { allowed_extensions }
    }

    /// Everything after the last `.`; a name without one is its own extension.
    pub fn extension_of(file_name: &str) -> String {
        file_name
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_lowercase()
    }

    pub fn validate(
        &self,
        name: &str,
        size_bytes: u64,
        path: &Path,
    ) -> Result<SelectedFile, UploaderError> {
        let extension = Self::extension_of(name);
        if !self.allowed_extensions.contains(&extension) {
            return Err(UploaderError::Validation {
                file_name: name.to_string(),
                extension,
            });
        }

        Ok(SelectedFile {
            name: name.to_string(),
            extension,
            size_bytes,
            path: path.to_path_buf(),
        })
    }

    /// Validates the name first, then reads the size from disk.
    pub fn inspect(&self, path: &Path) -> Result<SelectedFile, UploaderError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut file = self.validate(&name, 0, path)?;
        file.size_bytes = std::fs::metadata(path)
            .map_err(|source| UploaderError::ReadFile {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        Ok(file)
    }

    pub fn preview(file: &SelectedFile) -> FilePreview {
        FilePreview {
            display_name: file.name.clone(),
            extension_label: file.extension.to_uppercase(),
            size_label: FileSizeUtils::format_size(file.size_bytes),
        }
    }

    /// Text for the "Invalid File Type" notification, e.g. "Only CSV files are allowed!".
    pub fn rejection_message(&self) -> String {
        let labels: Vec<String> = self
            .allowed_extensions
            .iter()
            .map(|ext| ext.to_uppercase())
            .collect();
        format!("Only {} files are allowed!", labels.join("/"))
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }
}
