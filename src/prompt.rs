use std::path::PathBuf;

use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use url::Url;

use crate::{
    request::{self, AudioFormat, DownloadRequest, MenuChoice, PlaylistSelection, Selection},
    settings::Settings,
};

#[derive(thiserror::Error, Debug)]
pub enum PromptError {
    #[error("terminal prompt failed: {0}")]
    Terminal(#[from] dialoguer::Error),
    #[error("input closed before all questions were answered")]
    Closed,
}

/// Source of interactive answers.
pub trait Prompter {
    fn input(&mut self, prompt: &str, default: Option<&str>) -> Result<String, PromptError>;
    fn select(&mut self, prompt: &str, items: &[String], default: usize)
        -> Result<usize, PromptError>;
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool, PromptError>;
    /// Shows a message that needs no answer.
    fn notify(&mut self, message: &str);
}

pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn input(&mut self, prompt: &str, default: Option<&str>) -> Result<String, PromptError> {
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        Ok(input.interact_text()?)
    }

    fn select(
        &mut self,
        prompt: &str,
        items: &[String],
        default: usize,
    ) -> Result<usize, PromptError> {
        Ok(Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(default)
            .interact()?)
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool, PromptError> {
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    }

    fn notify(&mut self, message: &str) {
        eprintln!("{}", message);
    }
}

fn reject(prompter: &mut dyn Prompter, what: &str, input: &str, err: &dyn std::fmt::Display) {
    warn!("Rejected {} {:?}: {}", what, input, err);
    prompter.notify(&format!("{}, please try again", err));
}

/// Asks for a URL until one parses. Nothing downstream sees rejected input.
pub fn collect_url(prompter: &mut dyn Prompter) -> Result<Url, PromptError> {
    loop {
        let input = prompter.input("Enter the video URL (video or playlist)", None)?;
        match request::parse_url(&input) {
            Ok(url) => return Ok(url),
            Err(e) => reject(prompter, "URL", &input, &e),
        }
    }
}

pub fn collect_output_dir(
    prompter: &mut dyn Prompter,
    settings: &Settings,
) -> Result<PathBuf, PromptError> {
    let default = settings.output_dir.to_string_lossy();
    let input = prompter.input("Enter output directory path", Some(&*default))?;
    let input = input.trim();

    if input.is_empty() {
        Ok(settings.output_dir.clone())
    } else {
        Ok(PathBuf::from(input))
    }
}

fn collect_index(prompter: &mut dyn Prompter, prompt: &str) -> Result<u32, PromptError> {
    loop {
        let input = prompter.input(prompt, None)?;
        match request::parse_index(&input) {
            Ok(index) => return Ok(index),
            Err(e) => reject(prompter, "index", &input, &e),
        }
    }
}

pub fn collect_playlist(prompter: &mut dyn Prompter) -> Result<PlaylistSelection, PromptError> {
    let options = [
        "Full playlist".to_string(),
        "Select range".to_string(),
        "Specific videos".to_string(),
    ];

    match prompter.select("Playlist download options", &options, 0)? {
        1 => loop {
            let start = collect_index(prompter, "Enter start index (e.g., 1)")?;
            let end = collect_index(prompter, "Enter end index (e.g., 5)")?;
            match PlaylistSelection::range(start, end) {
                Ok(range) => return Ok(range),
                Err(e) => reject(prompter, "range", &format!("{}-{}", start, end), &e),
            }
        },
        2 => loop {
            let input = prompter.input(
                "Enter video numbers separated by commas (e.g., 1,3,5)",
                None,
            )?;
            match request::parse_index_list(&input).and_then(PlaylistSelection::items) {
                Ok(items) => return Ok(items),
                Err(e) => reject(prompter, "video numbers", &input, &e),
            }
        },
        _ => Ok(PlaylistSelection::All),
    }
}

pub fn collect_selection(prompter: &mut dyn Prompter) -> Result<Selection, PromptError> {
    let items: Vec<String> = MenuChoice::ALL.iter().map(|c| c.to_string()).collect();
    let index = prompter.select("What would you like to download?", &items, 0)?;
    let choice = MenuChoice::ALL
        .get(index)
        .copied()
        .unwrap_or(MenuChoice::ALL[0]);

    if !choice.needs_audio_format() {
        return Ok(choice.with_format(AudioFormat::default()));
    }

    let formats: Vec<String> = AudioFormat::ALL.iter().map(|f| f.to_string()).collect();
    let index = prompter.select("Select audio format", &formats, 0)?;
    let format = AudioFormat::ALL.get(index).copied().unwrap_or_default();

    Ok(choice.with_format(format))
}

/// Runs the full questionnaire for one download.
pub fn collect_request(
    prompter: &mut dyn Prompter,
    settings: &Settings,
) -> Result<DownloadRequest, PromptError> {
    let url = collect_url(prompter)?;
    let output_dir = collect_output_dir(prompter, settings)?;
    let playlist = if request::is_playlist_url(&url) {
        collect_playlist(prompter)?
    } else {
        PlaylistSelection::Single
    };
    let selection = collect_selection(prompter)?;

    Ok(DownloadRequest {
        url,
        selection,
        output_dir,
        playlist,
    })
}

/// Prompter that replays canned answers, for tests.
#[cfg(test)]
pub mod scripted {
    use std::collections::VecDeque;

    use super::{PromptError, Prompter};

    #[derive(Debug, Clone, PartialEq)]
    pub enum Answer {
        Text(&'static str),
        Choice(usize),
        Confirm(bool),
    }

    #[derive(Default)]
    pub struct ScriptedPrompter {
        answers: VecDeque<Answer>,
        pub asked: Vec<String>,
        pub notices: Vec<String>,
    }

    impl ScriptedPrompter {
        pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
            Self {
                answers: answers.into_iter().collect(),
                ..Self::default()
            }
        }

        pub fn remaining(&self) -> usize {
            self.answers.len()
        }
    }

    impl Prompter for ScriptedPrompter {
        fn input(&mut self, prompt: &str, default: Option<&str>) -> Result<String, PromptError> {
            self.asked.push(prompt.to_string());
            match self.answers.pop_front() {
                Some(Answer::Text("")) if default.is_some() => {
                    Ok(default.unwrap_or_default().to_string())
                }
                Some(Answer::Text(text)) => Ok(text.to_string()),
                _ => Err(PromptError::Closed),
            }
        }

        fn select(
            &mut self,
            prompt: &str,
            items: &[String],
            _default: usize,
        ) -> Result<usize, PromptError> {
            self.asked.push(prompt.to_string());
            match self.answers.pop_front() {
                Some(Answer::Choice(i)) if i < items.len() => Ok(i),
                _ => Err(PromptError::Closed),
            }
        }

        fn confirm(&mut self, prompt: &str, _default: bool) -> Result<bool, PromptError> {
            self.asked.push(prompt.to_string());
            match self.answers.pop_front() {
                Some(Answer::Confirm(b)) => Ok(b),
                _ => Err(PromptError::Closed),
            }
        }

        fn notify(&mut self, message: &str) {
            self.notices.push(message.to_string());
        }
    }
}
