//! # ytdl-prompt
//!
//! An interactive front end for [yt-dlp](https://github.com/yt-dlp/yt-dlp).
//! It asks for a URL, a quality or audio preset and, for playlists, which
//! entries to fetch, then hands the work to `yt-dlp`, which in turn uses
//! `ffmpeg` for merging and audio extraction. Both tools must be on `PATH`.
//!
//! ## Usage
//!
//! The binary wires the pieces together like this:
//!
//! ```rust,no_run
//! use ytdl_prompt::{
//!     orchestrator::{self, Session},
//!     prompt::TerminalPrompter,
//!     settings::Settings,
//!     stats::DownloadProgress,
//!     ytdlp::YtDlp,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = Settings::default();
//!
//!     // Find yt-dlp and ffmpeg on PATH
//!     let downloader = YtDlp::locate(&settings).await.unwrap();
//!
//!     // Ask the questions, download, print the result
//!     let outcome = orchestrator::run(
//!         &mut TerminalPrompter::new(),
//!         &downloader,
//!         &settings,
//!         &mut DownloadProgress::new(),
//!         &mut Session::new(),
//!     )
//!     .await;
//!
//!     std::process::exit(outcome.exit_code().into());
//! }
//! ```
//!
//! The translation from menu choices to yt-dlp options lives in
//! [`options::DownloadOptions::from_request`] and never touches the network,
//! so it can be tested on its own.

#![forbid(unsafe_code)]
#[macro_use]
extern crate log;

pub mod ffmpeg;
pub mod options;
pub mod orchestrator;
pub mod prompt;
pub mod request;
pub mod settings;
pub mod stats;
pub mod util;
pub mod ytdlp;
