use std::path::PathBuf;

/// Compiled-in defaults for a run. There are no flags or config files; the
/// only environment inputs are `PATH` and `RUST_LOG`.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Offered as the default answer to the output directory prompt.
    pub output_dir: PathBuf,
    pub ytdlp_program: String,
    pub ffmpeg_program: String,
    /// Container used when yt-dlp merges separate video and audio streams.
    pub merge_format: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("downloads"),
            ytdlp_program: "yt-dlp".to_string(),
            ffmpeg_program: "ffmpeg".to_string(),
            merge_format: "mp4".to_string(),
        }
    }
}
