mod backend;
mod config;
mod error;
mod presenter;
mod ui;

use backend::mangadex::fetch_cover_image;
use backend::source::SourceManager;
use backend::store::SqliteStore;
use config::{Cli, Settings};
use image::DynamicImage;
use presenter::{CataloguePresenter, PresenterEvent};
use ui::ui::{App, Focus, ui};

use clap::Parser;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{error::Error, fs, io, path::Path, process::ExitCode, sync::Arc};
use tokio::sync::mpsc;

enum BackgroundTask {
    CoverLoaded { url: String, image: DynamicImage },
}

fn init_logging(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new().create(true).append(true).open(path)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    let cli = Cli::parse();
    let settings = Settings::from_cli(&cli)?;
    init_logging(&settings.log_path())?;

    let database_path = settings.database_path();
    if let Some(parent) = database_path.parent() {
        fs::create_dir_all(parent)?;
    }
    log::info!("using database {}", database_path.display());
    let store = SqliteStore::open(&database_path).await?;
    let sources = SourceManager::with_builtin()?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<PresenterEvent>();
    let (task_tx, mut task_rx) = mpsc::unbounded_channel::<BackgroundTask>();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // The image picker queries the terminal, so the app is built on the alternate screen
    let mut presenter = CataloguePresenter::new(
        App::new(settings.default_source),
        Arc::new(store),
        settings.presenter(),
        event_tx,
    );

    let res: Result<(), Box<dyn Error>> = match presenter.initialize(&sources) {
        Ok(()) => run_app(
            &mut terminal,
            &mut presenter,
            &mut event_rx,
            &mut task_rx,
            task_tx,
        )
        .await
        .map_err(Into::into),
        Err(err) => Err(err.into()),
    };

    presenter.teardown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if report_failure(res) {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Logs and prints a failed run once the terminal is back to normal.
/// Returns whether it failed.
fn report_failure(res: Result<(), Box<dyn Error>>) -> bool {
    match res {
        Ok(()) => false,
        Err(err) => {
            log::error!("{}", err);
            eprintln!("{err}");
            true
        }
    }
}

fn spawn_cover_loader(url: String, tx: mpsc::UnboundedSender<BackgroundTask>) {
    tokio::spawn(async move {
        match fetch_cover_image(&url).await {
            Some(image) => {
                let _ = tx.send(BackgroundTask::CoverLoaded { url, image });
            }
            None => log::warn!("could not load cover {}", url),
        }
    });
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    presenter: &mut CataloguePresenter<App>,
    event_rx: &mut mpsc::UnboundedReceiver<PresenterEvent>,
    task_rx: &mut mpsc::UnboundedReceiver<BackgroundTask>,
    task_tx: mpsc::UnboundedSender<BackgroundTask>,
) -> io::Result<()> {
    let mut event_stream = EventStream::new();

    loop {
        // Requests the view queued while handling the last event
        if let Some(page) = presenter.view_mut().take_page_request() {
            presenter.load_more(page);
        }
        for url in presenter.view_mut().take_cover_requests() {
            spawn_cover_loader(url, task_tx.clone());
        }
        let search_mode = presenter.search_state().search_mode;
        presenter.view_mut().search_mode = search_mode;

        terminal.draw(|f| ui(f, presenter.view_mut()))?;

        tokio::select! {
            // Keeps the spinner moving
            _ = tokio::time::sleep(tokio::time::Duration::from_millis(100)) => {}

            Some(Ok(event)) = event_stream.next() => {
                if let Event::Key(key) = event {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if !handle_key(presenter, key.code) {
                        return Ok(());
                    }
                }
            }

            Some(event) = event_rx.recv() => {
                presenter.handle_event(event);
            }

            Some(task) = task_rx.recv() => {
                match task {
                    BackgroundTask::CoverLoaded { url, image } => {
                        presenter.view_mut().add_cover_image(&url, image);
                    }
                }
            }
        }
    }
}

/// Returns false when the user asked to quit.
fn handle_key(presenter: &mut CataloguePresenter<App>, key: KeyCode) -> bool {
    let app = presenter.view_mut();
    app.status = None;

    match app.focus {
        Focus::Search => match key {
            KeyCode::Char(c) => {
                app.search_query.push(c);
                let query = app.search_query.clone();
                presenter.on_query_text_change(&query);
            }
            KeyCode::Backspace => {
                if app.search_query.pop().is_some() {
                    let query = app.search_query.clone();
                    presenter.on_query_text_change(&query);
                }
            }
            KeyCode::Esc | KeyCode::Enter | KeyCode::Down => {
                app.focus = Focus::List;
            }
            _ => {}
        },
        Focus::List => match key {
            KeyCode::Char('q') => return false,
            KeyCode::Down | KeyCode::Char('j') => app.select_next(),
            KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
            KeyCode::Char('/') => app.focus = Focus::Search,
            KeyCode::Char('o') => open_in_browser(presenter),
            _ => {}
        },
    }
    true
}

fn open_in_browser(presenter: &mut CataloguePresenter<App>) {
    let Some(url) = presenter.view().selected_manga().map(|m| m.url.clone()) else {
        return;
    };
    let Some(web_url) = presenter.source().map(|s| s.web_url(&url)) else {
        return;
    };

    let app = presenter.view_mut();
    match webbrowser::open(&web_url) {
        Ok(()) => app.set_status(format!("Opened {}", web_url)),
        Err(err) => {
            log::warn!("could not open {}: {}", web_url, err);
            app.set_status(format!("Could not open browser: {}", err));
        }
    }
}
