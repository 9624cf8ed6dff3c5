use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use async_trait::async_trait;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_default_from_null;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::{wrappers::SplitStream, StreamExt};

use crate::{
    ffmpeg,
    options::DownloadOptions,
    settings::Settings,
    stats::{self, DownloadProgress, OutputLine},
    util,
};

#[derive(thiserror::Error, Debug)]
pub enum DownloadError {
    #[error("{0} was not found on PATH")]
    ToolNotFound(String),
    #[error(transparent)]
    MediaProcessor(#[from] ffmpeg::FfmpegError),
    #[error("could not start {0}: {1}")]
    Spawn(PathBuf, #[source] std::io::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("could not read video information: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("{0}")]
    Failed(String),
}

/// Metadata about the requested URL, fetched before downloading.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub title: String,
    pub duration: Option<f64>,
    pub uploader: Option<String>,
    pub is_playlist: bool,
    pub entry_count: usize,
}

#[derive(Deserialize)]
struct RawInfo {
    #[serde(default, deserialize_with = "deserialize_default_from_null")]
    title: String,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(rename = "_type", default)]
    kind: Option<String>,
    #[serde(default)]
    entries: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    playlist_count: Option<usize>,
}

impl MediaInfo {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: RawInfo = serde_json::from_str(json)?;
        let is_playlist = raw.entries.is_some() || raw.kind.as_deref() == Some("playlist");
        let entry_count = raw
            .entries
            .as_ref()
            .map(Vec::len)
            .or(raw.playlist_count)
            .unwrap_or(if is_playlist { 0 } else { 1 });

        Ok(Self {
            title: raw.title,
            duration: raw.duration,
            uploader: raw.uploader,
            is_playlist,
            entry_count,
        })
    }

    /// Human readable lines describing the media.
    pub fn summary(&self) -> Vec<String> {
        let title = if self.title.is_empty() {
            "Unknown Title"
        } else {
            self.title.as_str()
        };

        if self.is_playlist {
            return vec![
                format!("Playlist: {}", title),
                format!("Number of videos: {}", self.entry_count),
            ];
        }

        let mut lines = vec![format!("Title: {}", title)];
        if let Some(uploader) = &self.uploader {
            lines.push(format!("Uploader: {}", uploader));
        }
        lines.push(format!(
            "Duration: {}",
            util::format_duration(self.duration.unwrap_or_default())
        ));
        lines
    }
}

/// The external downloader. Implementations own whatever they spawn and must
/// release it before returning, on success and on error.
#[async_trait]
pub trait Downloader {
    async fn probe(&self, options: &DownloadOptions) -> Result<MediaInfo, DownloadError>;

    /// Downloads everything `options` selects and returns the final file paths.
    async fn download(
        &self,
        options: &DownloadOptions,
        progress: &mut DownloadProgress,
    ) -> Result<Vec<PathBuf>, DownloadError>;
}

/// Drives the `yt-dlp` executable.
pub struct YtDlp {
    pub program: PathBuf,
    pub ffmpeg: PathBuf,
}

fn last_error(output: &str) -> Option<String> {
    output.lines().rev().find_map(|line| match OutputLine::parse(line) {
        OutputLine::Error(msg) => Some(msg),
        _ => None,
    })
}

impl YtDlp {
    /// Finds yt-dlp and ffmpeg on the search path and checks ffmpeg runs.
    pub async fn locate(settings: &Settings) -> Result<Self, DownloadError> {
        let program = which::which(&settings.ytdlp_program)
            .map_err(|_| DownloadError::ToolNotFound(settings.ytdlp_program.clone()))?;
        let ffmpeg = ffmpeg::locate(&settings.ffmpeg_program)?;

        debug!("Found {}", program.display());
        let version = ffmpeg::version(&ffmpeg).await?;
        debug!("Found {} ({})", ffmpeg.display(), version);

        Ok(Self { program, ffmpeg })
    }

    fn command(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.program);
        command
            .arg("--ffmpeg-location")
            .arg(&self.ffmpeg)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        command
    }

    fn spawn_error(&self, e: std::io::Error) -> DownloadError {
        DownloadError::Spawn(self.program.clone(), e)
    }
}

#[async_trait]
impl Downloader for YtDlp {
    async fn probe(&self, options: &DownloadOptions) -> Result<MediaInfo, DownloadError> {
        let mut command = self.command();
        command
            .arg("--dump-single-json")
            .arg("--flat-playlist")
            .arg("--no-warnings");
        if options.no_playlist {
            command.arg("--no-playlist");
        }
        command.arg(&options.url);

        let output = command.output().await.map_err(|e| self.spawn_error(e))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DownloadError::Failed(last_error(&stderr).unwrap_or_else(
                || format!("{} exited with {}", self.program.display(), output.status),
            )));
        }

        Ok(MediaInfo::from_json(&String::from_utf8_lossy(&output.stdout))?)
    }

    async fn download(
        &self,
        options: &DownloadOptions,
        progress: &mut DownloadProgress,
    ) -> Result<Vec<PathBuf>, DownloadError> {
        tokio::fs::create_dir_all(&options.output_dir).await?;

        let mut command = self.command();
        command
            .arg("--newline")
            .arg("--progress")
            .arg("--progress-template")
            .arg(stats::PROGRESS_TEMPLATE)
            .arg("--print")
            .arg(stats::FILE_TEMPLATE)
            .args(options.to_args())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        info!("Starting download from: {}", options.url);
        let mut child = command.spawn().map_err(|e| self.spawn_error(e))?;

        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => (stdout, stderr),
            _ => return Err(DownloadError::Failed("yt-dlp output is not captured".to_string())),
        };
        // Raw bytes: titles may arrive in the console's native encoding
        let mut lines = SplitStream::new(BufReader::new(stdout).split(b'\n'))
            .merge(SplitStream::new(BufReader::new(stderr).split(b'\n')));

        let mut failure = None;
        while let Some(line) = lines.next().await {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("Stopped reading yt-dlp output: {}", e);
                    break;
                }
            };
            match OutputLine::parse(&String::from_utf8_lossy(&line)) {
                OutputLine::Progress {
                    percent,
                    downloaded,
                    total,
                } => progress.update(percent, downloaded, total),
                OutputLine::File(path) => progress.finish_file(path),
                OutputLine::Error(msg) => {
                    error!("{}", msg);
                    failure = Some(msg);
                }
                OutputLine::Warning(msg) => warn!("{}", msg),
                OutputLine::Other(msg) if !msg.is_empty() => debug!("{}", msg),
                OutputLine::Other(_) => (),
            }
        }

        let status = child.wait().await?;
        if !status.success() {
            return Err(DownloadError::Failed(failure.unwrap_or_else(|| {
                format!("{} exited with {}", self.program.display(), status)
            })));
        }

        Ok(progress.files.clone())
    }
}

/// Resolves a path yt-dlp printed relative to its working directory.
pub fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_video_info() {
        let json = r#"{
            "id": "abc",
            "title": "A Talk",
            "duration": 754.0,
            "uploader": "Someone",
            "_type": "video"
        }"#;
        let info = MediaInfo::from_json(json).unwrap();

        assert_eq!(info.title, "A Talk");
        assert!(!info.is_playlist);
        assert_eq!(info.entry_count, 1);
        assert_eq!(
            info.summary(),
            vec!["Title: A Talk", "Uploader: Someone", "Duration: 12:34"]
        );
    }

    #[test]
    fn parses_playlist_info() {
        let json = r#"{
            "title": null,
            "_type": "playlist",
            "entries": [{"id": "a"}, {"id": "b"}, {"id": "c"}]
        }"#;
        let info = MediaInfo::from_json(json).unwrap();

        assert!(info.is_playlist);
        assert_eq!(info.entry_count, 3);
        assert_eq!(
            info.summary(),
            vec!["Playlist: Unknown Title", "Number of videos: 3"]
        );
    }

    #[test]
    fn rejects_non_json() {
        assert!(MediaInfo::from_json("ERROR: nope").is_err());
    }

    #[test]
    fn finds_last_error_line() {
        let stderr = "WARNING: slow\nERROR: first\n[info] x\nERROR: Unsupported URL: https://video.example\n";
        assert_eq!(
            last_error(stderr).as_deref(),
            Some("Unsupported URL: https://video.example")
        );
        assert_eq!(last_error("nothing here"), None);
    }

    #[cfg(unix)]
    fn fake_ytdlp(dir: &Path, body: &str) -> YtDlp {
        use std::os::unix::fs::PermissionsExt;

        let program = dir.join("yt-dlp");
        std::fs::write(&program, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();
        YtDlp {
            program,
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }

    #[cfg(unix)]
    fn options_into(output_dir: PathBuf) -> DownloadOptions {
        use crate::request::{parse_url, DownloadRequest, PlaylistSelection, Selection, VideoQuality};

        let request = DownloadRequest {
            url: parse_url("https://video.example/watch?id=123").unwrap(),
            selection: Selection::Video(VideoQuality::Best),
            output_dir,
            playlist: PlaylistSelection::Single,
        };
        DownloadOptions::from_request(&request, &Settings::default())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn download_collects_files_and_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let ytdlp = fake_ytdlp(
            dir.path(),
            "echo '[progress]  50.0%|512|1024'\necho 'WARNING: slow' >&2\necho '[file] /x/a.mp4'\nexit 0",
        );
        let output_dir = dir.path().join("nested").join("out");

        let files = ytdlp
            .download(&options_into(output_dir.clone()), &mut DownloadProgress::quiet())
            .await
            .unwrap();

        assert_eq!(files, vec![PathBuf::from("/x/a.mp4")]);
        assert!(output_dir.is_dir());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn download_survives_non_utf8_output() {
        let dir = tempfile::tempdir().unwrap();
        let ytdlp = fake_ytdlp(
            dir.path(),
            "printf '[download] caf\\351\\n'\necho '[file] /x/b.mp4'\nexit 0",
        );

        let files = ytdlp
            .download(&options_into(dir.path().join("out")), &mut DownloadProgress::quiet())
            .await
            .unwrap();

        assert_eq!(files, vec![PathBuf::from("/x/b.mp4")]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn download_failure_carries_last_error() {
        let dir = tempfile::tempdir().unwrap();
        let ytdlp = fake_ytdlp(
            dir.path(),
            "echo 'ERROR: first' >&2\necho 'ERROR: [x] Video unavailable' >&2\nexit 1",
        );

        let err = ytdlp
            .download(&options_into(dir.path().join("out")), &mut DownloadProgress::quiet())
            .await
            .unwrap_err();

        assert!(matches!(&err, DownloadError::Failed(msg) if msg == "[x] Video unavailable"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn probe_reads_json_from_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let ytdlp = fake_ytdlp(
            dir.path(),
            r#"echo '{"title": "A Talk", "duration": 61, "_type": "video"}'"#,
        );

        let info = ytdlp.probe(&options_into(dir.path().join("out"))).await.unwrap();

        assert_eq!(info.title, "A Talk");
        assert_eq!(info.duration, Some(61.0));
        assert!(!info.is_playlist);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn probe_failure_carries_last_error() {
        let dir = tempfile::tempdir().unwrap();
        let ytdlp = fake_ytdlp(
            dir.path(),
            "echo 'ERROR: [x] Video unavailable' >&2\nexit 1",
        );

        let err = ytdlp
            .probe(&options_into(dir.path().join("out")))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "[x] Video unavailable");
    }

    #[test]
    fn relative_paths_are_anchored() {
        let path = absolute(Path::new("downloads/a.mp3"));
        assert!(path.is_absolute());
        assert!(path.ends_with("downloads/a.mp3"));
    }
}
