use std::process::ExitCode;

use ytdl_prompt::{
    orchestrator::{self, DownloadOutcome, Session},
    prompt::TerminalPrompter,
    settings::Settings,
    stats::DownloadProgress,
    ytdlp::YtDlp,
};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Keep panics out of the user's face; the exit status still reports them
    std::panic::set_hook(Box::new(|info| {
        log::error!("internal error: {}", info);
        eprintln!("Something went wrong. Run with RUST_LOG=debug for details.");
    }));

    println!("\n=== Video Downloader ===\n");
    let settings = Settings::default();

    // Find the external tools before asking any questions
    let downloader = match YtDlp::locate(&settings).await {
        Ok(downloader) => downloader,
        Err(e) => {
            log::error!("{}", e);
            let outcome = DownloadOutcome::failed(e);
            outcome.report();
            return ExitCode::from(outcome.exit_code());
        }
    };

    let outcome = orchestrator::run(
        &mut TerminalPrompter::new(),
        &downloader,
        &settings,
        &mut DownloadProgress::new(),
        &mut Session::new(),
    )
    .await;

    ExitCode::from(outcome.exit_code())
}
