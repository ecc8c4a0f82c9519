use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;

use docflow::app::App;
use docflow::logging::{self, LogTarget};
use docflow::session::{ChatSession, Role, UploadState};
use docflow::tui::{self, EventHandler, Tui};
use docflow::{handler, ui, BackendClient, Config};

#[derive(Parser)]
#[command(name = "docflow")]
#[command(version, about = "Upload a PDF and ask questions about it")]
struct Cli {
    /// Backend origin, e.g. http://127.0.0.1:8000
    #[arg(long, global = true)]
    backend: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat (default)
    Tui {
        /// PDF to upload on start
        file: Option<PathBuf>,
    },
    /// Upload a PDF and print how many chunks were indexed
    Upload {
        file: PathBuf,
    },
    /// Upload a PDF, ask one question and print the conversation
    Ask {
        file: PathBuf,
        question: String,
        /// Print the transcript as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().context("loading config")?;
    let backend = BackendClient::new(&config.resolve_backend_url(cli.backend.as_deref()));

    match cli.command.unwrap_or(Commands::Tui { file: None }) {
        Commands::Tui { file } => run_tui(backend, config, file).await,
        Commands::Upload { file } => {
            logging::init(LogTarget::Stderr, config.log_filter.as_deref())?;
            upload_once(&backend, file).await.map(|_| ())
        }
        Commands::Ask { file, question, json } => {
            logging::init(LogTarget::Stderr, config.log_filter.as_deref())?;
            ask_once(&backend, file, &question, json).await
        }
    }
}

async fn run_tui(backend: BackendClient, config: Config, file: Option<PathBuf>) -> Result<()> {
    let log_file = logging::default_log_file()?;
    logging::init(LogTarget::File(log_file), config.log_filter.as_deref())?;
    tracing::info!(backend = %backend.base_url(), "starting tui");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(backend, events.sender(), config.start_dir.clone());

    if let Some(file) = file {
        app.start_upload(file);
    }

    let result = run_loop(&mut terminal, &mut app, &mut events).await;
    tui::restore()?;

    if app.start_dir != config.start_dir {
        if let Some(dir) = &app.start_dir {
            if let Err(err) = Config::save_start_dir(dir) {
                tracing::warn!(error = %err, "could not remember upload directory");
            }
        }
    }

    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}

/// Run the upload flow once and print the resulting status line.
async fn upload_once(backend: &BackendClient, file: PathBuf) -> Result<ChatSession> {
    let mut session = ChatSession::new();

    if let Ok(doc) = session.select_document(&file) {
        println!("📄 Uploading {} to {}", doc.name.bold(), backend.base_url().dimmed());
        let result = backend.upload(&doc).await;
        if let Err(err) = &result {
            eprintln!("{}", err.to_string().dimmed());
        }
        session.finish_upload(&doc, result);
    }

    let message = session.upload().message.clone().unwrap_or_default();
    match session.upload_state() {
        UploadState::Success => println!("{}", message.green()),
        _ => {
            println!("{}", message.red());
            bail!("upload did not succeed");
        }
    }

    Ok(session)
}

async fn ask_once(backend: &BackendClient, file: PathBuf, question: &str, json: bool) -> Result<()> {
    let mut session = upload_once(backend, file).await?;

    match session.submit_question(question) {
        Some(question) => {
            let result = backend.ask(&question).await;
            session.finish_ask(result);
        }
        None => bail!("question is empty"),
    }

    if json {
        println!("{}", serde_json::to_string_pretty(session.transcript())?);
        return Ok(());
    }

    println!();
    for msg in session.transcript() {
        let stamp = msg.created_at.format("%H:%M").to_string();
        match msg.role {
            Role::User => println!("{} {}", "You:".bold().cyan(), stamp.dimmed()),
            Role::Assistant => println!("{} {}", "AI:".bold().yellow(), stamp.dimmed()),
        }
        println!("{}\n", msg.content);
    }

    Ok(())
}
