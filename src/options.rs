use std::path::PathBuf;

use crate::{
    request::{AudioFormat, AudioQuality, DownloadRequest, PlaylistSelection, Selection, VideoQuality},
    settings::Settings,
};

/// Options handed to yt-dlp for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    pub url: String,
    /// yt-dlp format selector passed to `-f`.
    pub format: String,
    pub audio_only: bool,
    /// Quality tier label, `best`, `worst`, `720p`, `192k` and so on.
    pub quality: String,
    pub audio_format: Option<AudioFormat>,
    /// Value for `--audio-quality`; `0` is the best VBR setting.
    pub audio_bitrate: Option<String>,
    pub merge_format: Option<String>,
    pub output_dir: PathBuf,
    pub output_template: String,
    pub playlist_items: Option<String>,
    pub playlist_start: Option<u32>,
    pub playlist_end: Option<u32>,
    pub no_playlist: bool,
}

fn video_format(quality: VideoQuality) -> String {
    match quality {
        VideoQuality::Best => "bestvideo*+bestaudio/best".to_string(),
        VideoQuality::Worst => "worstvideo+worstaudio/worst".to_string(),
        q => {
            let height = q.height().unwrap_or_default();
            format!(
                "bestvideo[height<={}]+bestaudio/best[height<={}]",
                height, height
            )
        }
    }
}

fn audio_bitrate(quality: AudioQuality) -> String {
    match quality.kbps() {
        Some(kbps) => format!("{}K", kbps),
        None => "0".to_string(),
    }
}

impl DownloadOptions {
    /// Maps a request onto yt-dlp options. Pure: no I/O, same input gives the
    /// same output.
    pub fn from_request(request: &DownloadRequest, settings: &Settings) -> Self {
        let (format, quality, audio_format, bitrate, merge_format) = match request.selection {
            Selection::Video(q) => (
                video_format(q),
                q.label(),
                None,
                None,
                Some(settings.merge_format.clone()),
            ),
            Selection::Audio { quality, format } => (
                "bestaudio/best".to_string(),
                quality.label(),
                Some(format),
                Some(audio_bitrate(quality)),
                None,
            ),
        };

        let output_template = request
            .output_dir
            .join("%(title)s.%(ext)s")
            .to_string_lossy()
            .into_owned();

        let mut options = Self {
            url: request.url.to_string(),
            format,
            audio_only: request.selection.is_audio_only(),
            quality,
            audio_format,
            audio_bitrate: bitrate,
            merge_format,
            output_dir: request.output_dir.clone(),
            output_template,
            playlist_items: None,
            playlist_start: None,
            playlist_end: None,
            no_playlist: false,
        };

        match &request.playlist {
            PlaylistSelection::Single => options.no_playlist = true,
            PlaylistSelection::All => (),
            PlaylistSelection::Range { start, end } => {
                options.playlist_start = Some(*start);
                options.playlist_end = Some(*end);
            }
            PlaylistSelection::Items(items) => {
                let items: Vec<String> = items.iter().map(u32::to_string).collect();
                options.playlist_items = Some(items.join(","));
            }
        }

        options
    }

    /// Renders the options as yt-dlp arguments, URL last.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            self.format.clone(),
            "-o".to_string(),
            self.output_template.clone(),
            "--abort-on-error".to_string(),
        ];

        if self.audio_only {
            args.push("-x".to_string());
            if let Some(format) = self.audio_format {
                args.push("--audio-format".to_string());
                args.push(format.to_string());
            }
            if let Some(bitrate) = &self.audio_bitrate {
                args.push("--audio-quality".to_string());
                args.push(bitrate.clone());
            }
        } else if let Some(merge) = &self.merge_format {
            args.push("--merge-output-format".to_string());
            args.push(merge.clone());
        }

        if self.no_playlist {
            args.push("--no-playlist".to_string());
        }
        if let Some(start) = self.playlist_start {
            args.push("--playlist-start".to_string());
            args.push(start.to_string());
        }
        if let Some(end) = self.playlist_end {
            args.push("--playlist-end".to_string());
            args.push(end.to_string());
        }
        if let Some(items) = &self.playlist_items {
            args.push("--playlist-items".to_string());
            args.push(items.clone());
        }

        args.push(self.url.clone());
        args
    }
}
