use std::{fmt, path::PathBuf};

use url::Url;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum UrlError {
    #[error("URL must not be empty")]
    Empty,
    #[error("not a valid URL: {0}")]
    Malformed(#[from] url::ParseError),
    #[error("unsupported URL scheme \"{0}\", expected http or https")]
    UnsupportedScheme(String),
    #[error("URL has no host")]
    MissingHost,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum IndexError {
    #[error("expected a positive number, got \"{0}\"")]
    NotANumber(String),
    #[error("indices start at 1")]
    Zero,
    #[error("end index {end} is before start index {start}")]
    Reversed { start: u32, end: u32 },
    #[error("no video numbers given")]
    Empty,
}

/// Parses user input as an absolute http(s) URL.
pub fn parse_url(input: &str) -> Result<Url, UrlError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(UrlError::Empty);
    }

    let url = Url::parse(input)?;
    match url.scheme() {
        "http" | "https" => (),
        other => return Err(UrlError::UnsupportedScheme(other.to_string())),
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(UrlError::MissingHost),
    }
}

/// A URL points at a playlist when its path mentions one or it carries a
/// `list` query parameter.
pub fn is_playlist_url(url: &Url) -> bool {
    url.path().contains("playlist") || url.query_pairs().any(|(k, _)| k == "list")
}

/// Parses a single 1-based playlist index.
pub fn parse_index(input: &str) -> Result<u32, IndexError> {
    let input = input.trim();
    if input.is_empty() || !input.chars().all(|c| c.is_ascii_digit()) {
        return Err(IndexError::NotANumber(input.to_string()));
    }
    match input.parse::<u32>() {
        Ok(0) => Err(IndexError::Zero),
        Ok(n) => Ok(n),
        Err(_) => Err(IndexError::NotANumber(input.to_string())),
    }
}

/// Parses a comma separated list such as `1, 3,5`.
pub fn parse_index_list(input: &str) -> Result<Vec<u32>, IndexError> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(IndexError::Empty);
    }
    cleaned.split(',').map(parse_index).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoQuality {
    Best,
    P1080,
    P720,
    P480,
    P360,
    Worst,
}

impl VideoQuality {
    /// Maximum frame height, when the tier caps it.
    pub fn height(&self) -> Option<u32> {
        match self {
            Self::P1080 => Some(1080),
            Self::P720 => Some(720),
            Self::P480 => Some(480),
            Self::P360 => Some(360),
            Self::Best | Self::Worst => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Best => "best".to_string(),
            Self::Worst => "worst".to_string(),
            _ => format!("{}p", self.height().unwrap_or_default()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioQuality {
    Best,
    Kbps320,
    Kbps192,
    Kbps128,
}

impl AudioQuality {
    pub fn kbps(&self) -> Option<u32> {
        match self {
            Self::Best => None,
            Self::Kbps320 => Some(320),
            Self::Kbps192 => Some(192),
            Self::Kbps128 => Some(128),
        }
    }

    pub fn label(&self) -> String {
        match self.kbps() {
            Some(kbps) => format!("{}k", kbps),
            None => "best".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioFormat {
    #[default]
    Mp3,
    M4a,
    Wav,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 3] = [AudioFormat::Mp3, AudioFormat::M4a, AudioFormat::Wav];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::M4a => "m4a",
            Self::Wav => "wav",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to fetch. Audio extraction always carries a target format, video
/// never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Video(VideoQuality),
    Audio {
        quality: AudioQuality,
        format: AudioFormat,
    },
}

impl Selection {
    pub fn is_audio_only(&self) -> bool {
        matches!(self, Self::Audio { .. })
    }
}

/// Entries of the quality menu, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Video(VideoQuality),
    Audio(AudioQuality),
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 10] = [
        MenuChoice::Video(VideoQuality::Best),
        MenuChoice::Video(VideoQuality::P1080),
        MenuChoice::Video(VideoQuality::P720),
        MenuChoice::Video(VideoQuality::P480),
        MenuChoice::Video(VideoQuality::P360),
        MenuChoice::Video(VideoQuality::Worst),
        MenuChoice::Audio(AudioQuality::Best),
        MenuChoice::Audio(AudioQuality::Kbps320),
        MenuChoice::Audio(AudioQuality::Kbps192),
        MenuChoice::Audio(AudioQuality::Kbps128),
    ];

    /// Completes the choice into a selection. The format is ignored for video.
    pub fn with_format(self, format: AudioFormat) -> Selection {
        match self {
            Self::Video(quality) => Selection::Video(quality),
            Self::Audio(quality) => Selection::Audio { quality, format },
        }
    }

    pub fn needs_audio_format(&self) -> bool {
        matches!(self, Self::Audio(_))
    }
}

impl fmt::Display for MenuChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video(VideoQuality::Best) => f.write_str("Best video + audio"),
            Self::Video(VideoQuality::Worst) => f.write_str("Smallest video (worst)"),
            Self::Video(q) => write!(f, "Video {}", q.label()),
            Self::Audio(AudioQuality::Best) => f.write_str("Audio only (best)"),
            Self::Audio(q) => write!(f, "Audio only ({} kbps)", q.kbps().unwrap_or_default()),
        }
    }
}

/// Which entries of a playlist to fetch. Indices are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaylistSelection {
    /// The URL is not a playlist.
    #[default]
    Single,
    All,
    Range {
        start: u32,
        end: u32,
    },
    Items(Vec<u32>),
}

impl PlaylistSelection {
    pub fn range(start: u32, end: u32) -> Result<Self, IndexError> {
        if start == 0 {
            return Err(IndexError::Zero);
        }
        if end < start {
            return Err(IndexError::Reversed { start, end });
        }
        Ok(Self::Range { start, end })
    }

    pub fn items(items: Vec<u32>) -> Result<Self, IndexError> {
        if items.is_empty() {
            return Err(IndexError::Empty);
        }
        if items.contains(&0) {
            return Err(IndexError::Zero);
        }
        Ok(Self::Items(items))
    }
}

impl fmt::Display for PlaylistSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => f.write_str("single video"),
            Self::All => f.write_str("full playlist"),
            Self::Range { start, end } => write!(f, "videos {}-{}", start, end),
            Self::Items(items) => {
                let items: Vec<String> = items.iter().map(u32::to_string).collect();
                write!(f, "videos {}", items.join(","))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: Url,
    pub selection: Selection,
    pub output_dir: PathBuf,
    pub playlist: PlaylistSelection,
}
