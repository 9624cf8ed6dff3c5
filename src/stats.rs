use std::{io::Write, path::PathBuf, sync::OnceLock};

use regex::Regex;

use crate::util;

/// Marker yt-dlp prefixes progress lines with, see [`PROGRESS_TEMPLATE`].
pub const PROGRESS_PREFIX: &str = "[progress]";
/// Marker yt-dlp prefixes finished file paths with.
pub const FILE_PREFIX: &str = "[file] ";

pub const PROGRESS_TEMPLATE: &str = "download:[progress] %(progress._percent_str)s|%(progress.downloaded_bytes)s|%(progress.total_bytes,progress.total_bytes_estimate)s";
pub const FILE_TEMPLATE: &str = "after_move:[file] %(filepath)s";

/// One line of yt-dlp output, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputLine {
    Progress {
        percent: f64,
        downloaded: Option<u64>,
        total: Option<u64>,
    },
    File(PathBuf),
    Error(String),
    Warning(String),
    Other(String),
}

fn progress_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\[progress\]\s*([\d.]+)%\|(\d+|NA)\|([\d.]+|NA)")
            .expect("progress regex is valid")
    })
}

fn parse_bytes(field: &str) -> Option<u64> {
    field.parse::<f64>().ok().map(|b| b as u64)
}

impl OutputLine {
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end();

        if let Some(path) = line.strip_prefix(FILE_PREFIX) {
            return Self::File(PathBuf::from(path.trim()));
        }
        if line.starts_with(PROGRESS_PREFIX) {
            if let Some(caps) = progress_regex().captures(line) {
                if let Ok(percent) = caps[1].parse::<f64>() {
                    return Self::Progress {
                        percent,
                        downloaded: parse_bytes(&caps[2]),
                        total: parse_bytes(&caps[3]),
                    };
                }
            }
        }
        if let Some(msg) = line.strip_prefix("ERROR:") {
            return Self::Error(msg.trim().to_string());
        }
        if let Some(msg) = line.strip_prefix("WARNING:") {
            return Self::Warning(msg.trim().to_string());
        }

        Self::Other(line.to_string())
    }
}

/// Running totals for one delegated download.
#[derive(Debug, Default)]
pub struct DownloadProgress {
    pub percent: f64,
    pub bytes_downloaded: u64,
    pub bytes_total: Option<u64>,
    pub files: Vec<PathBuf>,
    /// Suppresses terminal output; used when nobody is watching.
    pub quiet: bool,
}

impl DownloadProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quiet() -> Self {
        Self {
            quiet: true,
            ..Self::default()
        }
    }

    pub fn update(&mut self, percent: f64, downloaded: Option<u64>, total: Option<u64>) {
        self.percent = percent.clamp(0.0, 100.0);
        if let Some(downloaded) = downloaded {
            self.bytes_downloaded = downloaded;
        }
        if total.is_some() {
            self.bytes_total = total;
        }
        self.print();
    }

    pub fn finish_file(&mut self, path: PathBuf) {
        if !self.quiet {
            println!();
        }
        self.files.push(path);
        self.percent = 0.0;
        self.bytes_downloaded = 0;
        self.bytes_total = None;
    }

    pub fn print(&self) {
        if self.quiet {
            return;
        }
        let total = self
            .bytes_total
            .map(util::format_bytes)
            .unwrap_or_else(|| "?".to_string());
        print!(
            "\x1b[2K\rDownloading: {:.1}% ({} of {})",
            self.percent,
            util::format_bytes(self.bytes_downloaded),
            total
        );
        let _ = std::io::stdout().lock().flush();
    }
}
