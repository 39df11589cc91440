//! Upload path resolution for project files and documents.

use std::path::{Path, PathBuf};

use crate::constants::ALLOWED_FILE_EXTENSIONS;

/// Resolves where a project's uploads live below the media root.
#[derive(Debug, Clone)]
pub struct UploadPaths {
    media_root: PathBuf,
}

impl UploadPaths {
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self {
            media_root: media_root.into(),
        }
    }

    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    /// Path stored on the file row, relative to the media root.
    pub fn relative_file_path(project_id: i32, file_name: &str) -> String {
        format!("uploads/projects/{}/{}", project_id, file_name)
    }

    /// Directory holding every upload of a project.
    pub fn project_dir(&self, project_id: i32) -> PathBuf {
        self.media_root
            .join("uploads")
            .join("projects")
            .join(project_id.to_string())
    }

    /// Absolute location of a stored relative path.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.media_root.join(relative)
    }
}

/// Whether a file name carries an extension from the upload allow-list.
pub fn is_allowed_file(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    match lower.rsplit_once('.') {
        Some((_, ext)) => ALLOWED_FILE_EXTENSIONS.contains(&ext),
        None => false,
    }
}
