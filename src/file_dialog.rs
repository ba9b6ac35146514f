use crate::{UploaderError, UploaderResult};

use rfd::AsyncFileDialog;
use std::path::{Path, PathBuf};

/// A file chosen by the user, read into memory.
#[derive(Debug, Clone)]
pub struct PickedFile {
    /// Name shown in the status line and logs.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl PickedFile {
    /// Reads the file at `path`.
    pub async fn read(path: &Path) -> UploaderResult<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(PickedFile {
            name: display_name(path),
            bytes,
        })
    }
}

/// Opens a native file dialog filtered to CSV files.
///
/// # Returns
///
/// - `Ok(PathBuf)`: The path to the selected file.
/// - `Err(UploaderError::Other)`: If the user cancels the dialog.
pub async fn open_file() -> UploaderResult<PathBuf> {
    let opt_file = AsyncFileDialog::new()
        .add_filter("CSV", &["csv", "txt"])
        .add_filter("All files", &["*"])
        .pick_file()
        .await;

    opt_file
        .map(|file| file.path().to_path_buf())
        .ok_or_else(|| UploaderError::Other("No file selected.".to_string()))
}

/// Last path component, or the full path when there is none.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
