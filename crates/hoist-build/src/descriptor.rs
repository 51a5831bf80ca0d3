use std::path::{Path, PathBuf};

/// Locate the build descriptor (Dockerfile) that `docker buildx build` will use.
///
/// `descriptor` is interpreted relative to `project_dir` unless absolute.
/// This runs before any external tool is invoked, so a missing descriptor
/// fails the build without touching docker or the registry.
pub fn locate_descriptor(project_dir: &Path, descriptor: &Path) -> Result<PathBuf, DescriptorError> {
    let path = if descriptor.is_absolute() {
        descriptor.to_path_buf()
    } else {
        project_dir.join(descriptor)
    };

    if path.is_file() {
        tracing::debug!(path = %path.display(), "build descriptor found");
        Ok(path)
    } else if path.exists() {
        Err(DescriptorError::NotAFile(path))
    } else {
        Err(DescriptorError::NotFound(path))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("build descriptor not found at {} — run from the directory containing your Dockerfile or set DOCKERFILE", .0.display())]
    NotFound(PathBuf),
    #[error("build descriptor at {} is not a file", .0.display())]
    NotAFile(PathBuf),
}
