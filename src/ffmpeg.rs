use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum FfmpegError {
    #[error("{0} was not found on PATH; it is required to merge and convert media")]
    NotFound(String),
    #[error("I/O error")]
    IoError(#[from] std::io::Error),
    #[error("{0} exited with {1}")]
    Unusable(PathBuf, std::process::ExitStatus),
}

/// Resolves the media processor through the search path.
pub fn locate(program: &str) -> Result<PathBuf, FfmpegError> {
    which::which(program).map_err(|_| FfmpegError::NotFound(program.to_string()))
}

/// Returns the first line of `ffmpeg -version`.
pub async fn version(path: &Path) -> Result<String, FfmpegError> {
    let output = tokio::process::Command::new(path)
        .arg("-hide_banner")
        .arg("-version")
        .stdin(std::process::Stdio::null())
        .kill_on_drop(true)
        .output()
        .await?;

    if !output.status.success() {
        return Err(FfmpegError::Unusable(path.to_path_buf(), output.status));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
}
