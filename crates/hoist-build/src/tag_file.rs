use std::path::{Path, PathBuf};

/// Directory hoist keeps its local state in.
pub const STATE_DIR: &str = ".hoist";

/// File recording the tag of the most recent build.
pub const TAG_FILE: &str = "last-tag";

pub fn tag_file_path(project_dir: &Path) -> PathBuf {
    project_dir.join(STATE_DIR).join(TAG_FILE)
}

/// Record `tag` as the last built tag, overwriting any previous value.
pub fn write_last_tag(project_dir: &Path, tag: &str) -> Result<PathBuf, TagFileError> {
    let state_dir = project_dir.join(STATE_DIR);
    std::fs::create_dir_all(&state_dir).map_err(|e| TagFileError::CreateDir {
        path: state_dir.clone(),
        source: e,
    })?;

    let path = tag_file_path(project_dir);
    std::fs::write(&path, format!("{tag}\n")).map_err(|e| TagFileError::Write {
        path: path.clone(),
        source: e,
    })?;

    Ok(path)
}

/// Read the last built tag. `Ok(None)` when nothing has been built yet.
pub fn read_last_tag(project_dir: &Path) -> Result<Option<String>, TagFileError> {
    let path = tag_file_path(project_dir);
    if !path.exists() {
        return Ok(None);
    }

    let content =
        std::fs::read_to_string(&path).map_err(|e| TagFileError::Read { path, source: e })?;
    let tag = content.trim();
    Ok((!tag.is_empty()).then(|| tag.to_owned()))
}

#[derive(Debug, thiserror::Error)]
pub enum TagFileError {
    #[error("failed to create {}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write tag file {}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read tag file {}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}
