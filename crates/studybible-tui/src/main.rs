mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use anyhow::{anyhow, Result};
use std::sync::Arc;
use studybible_core::{Config, Corpus, SimilarityClient, SimilaritySearch, StudySession};

use app::App;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init()?;

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "config unreadable, using defaults");
        Config::new()
    });

    let corpus_path = config.corpus_path();
    let corpus = Corpus::load(&corpus_path).await.map_err(|e| {
        anyhow!(
            "{}\nPoint STUDYBIBLE_CORPUS or corpus_path in the config file at a corpus JSON file.",
            e
        )
    })?;

    let service_url = config.service_url();
    let search: Arc<dyn SimilaritySearch> = Arc::new(SimilarityClient::new(&service_url));
    let session = StudySession::new(corpus, search, config.retrieval_options())?;
    tracing::info!(service = %service_url, corpus = %corpus_path.display(), "session started");

    let mut app = App::new(session, service_url);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut events = tui::EventHandler::new();

    while !app.should_quit {
        app.apply_finished_retrievals();
        terminal.draw(|frame| ui::render(app, frame))?;

        tokio::select! {
            event = events.next() => match event {
                Some(event) => handler::handle_event(app, event)?,
                None => break,
            },
            Some(outcome) = app.session.next_retrieval() => app.on_retrieval(outcome),
        }
    }

    Ok(())
}
