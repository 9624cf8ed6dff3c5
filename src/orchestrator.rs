use std::path::PathBuf;

use crate::{
    options::DownloadOptions,
    prompt::{self, PromptError, Prompter},
    request::PlaylistSelection,
    settings::Settings,
    stats::DownloadProgress,
    ytdlp::{self, DownloadError, Downloader},
};

/// Stages of a single run. A run only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Idle,
    CollectingInput,
    Configuring,
    Delegating,
    Reporting,
    Terminated,
}

#[derive(Debug)]
pub struct Session {
    phase: Phase,
    pub history: Vec<Phase>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            history: vec![Phase::Idle],
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns to `Idle` so the session can drive another run.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.history = vec![Phase::Idle];
    }

    fn advance(&mut self, next: Phase) {
        debug_assert!(next > self.phase, "{:?} -> {:?}", self.phase, next);
        debug!("{:?} -> {:?}", self.phase, next);
        self.phase = next;
        self.history.push(next);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error(transparent)]
    Download(#[from] DownloadError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Completed {
        files: Vec<PathBuf>,
        output_dir: PathBuf,
    },
    Cancelled,
    Failed {
        message: String,
    },
}

impl DownloadOutcome {
    pub fn failed(err: impl std::fmt::Display) -> Self {
        Self::Failed {
            message: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    pub fn report(&self) {
        match self {
            Self::Completed { files, output_dir } => {
                println!("Download completed successfully!");
                if files.is_empty() {
                    println!("Saved to {}", ytdlp::absolute(output_dir).display());
                }
                for file in files {
                    println!("Saved to {}", ytdlp::absolute(file).display());
                }
            }
            Self::Cancelled => println!("Download cancelled"),
            Self::Failed { message } => eprintln!("Download failed: {}", message),
        }
    }
}

async fn delegate<D>(
    prompter: &mut dyn Prompter,
    downloader: &D,
    options: &DownloadOptions,
    progress: &mut DownloadProgress,
) -> Result<Option<Vec<PathBuf>>, RunError>
where
    D: Downloader + ?Sized,
{
    let media = downloader.probe(options).await?;
    for line in media.summary() {
        info!("{}", line);
    }

    if !prompter.confirm("Proceed with download?", true)? {
        info!("Download cancelled by user");
        return Ok(None);
    }

    let files = downloader.download(options, progress).await?;
    Ok(Some(files))
}

/// Runs one request from the first prompt to the final report.
pub async fn run<D>(
    prompter: &mut dyn Prompter,
    downloader: &D,
    settings: &Settings,
    progress: &mut DownloadProgress,
    session: &mut Session,
) -> DownloadOutcome
where
    D: Downloader + ?Sized,
{
    session.reset();
    session.advance(Phase::CollectingInput);
    let outcome = match prompt::collect_request(prompter, settings) {
        Ok(request) => {
            session.advance(Phase::Configuring);
            let options = DownloadOptions::from_request(&request, settings);
            debug!("{:?}", options);
            if request.playlist != PlaylistSelection::Single {
                info!("Playlist selection: {}", request.playlist);
            }

            session.advance(Phase::Delegating);
            match delegate(prompter, downloader, &options, progress).await {
                Ok(Some(files)) => DownloadOutcome::Completed {
                    files,
                    output_dir: options.output_dir.clone(),
                },
                Ok(None) => DownloadOutcome::Cancelled,
                Err(e) => {
                    error!("An error occurred: {}", e);
                    DownloadOutcome::failed(e)
                }
            }
        }
        Err(e) => {
            error!("Could not read input: {}", e);
            DownloadOutcome::failed(e)
        }
    };

    session.advance(Phase::Reporting);
    outcome.report();
    session.advance(Phase::Terminated);

    outcome
}
