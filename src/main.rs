mod assistant;
mod auth;
mod config;
mod conversation;
mod entity;
mod feedback;
mod interrupt;
mod markdown;
mod models;
mod session;
mod store;

use anyhow::{Context, Result};
use config::{Config, StorageBackend};
use models::{Rating, Role};
use session::{ChatSession, SessionError, TranscriptEntry};
use std::sync::Arc;
use store::Store;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const RENDER_WIDTH: u16 = 100;

const HELP: &str = "Commands:\n  \
    /useful               rate the last answer as useful\n  \
    /not-useful [reason]  rate the last answer as not useful\n  \
    /clear-rating         remove your rating of the last answer\n  \
    /history              reload the conversation\n  \
    /quit                 exit\n\
    Press Ctrl-C while waiting to cancel a request, or at the prompt to exit.";

fn print_entry(entry: &TranscriptEntry, rating: Option<Rating>) {
    match entry.role() {
        Role::User => println!("\nyou> {}", entry.text()),
        Role::Assistant => {
            println!("\nlumi>\n{}", markdown::render_reply(entry.text(), RENDER_WIDTH));
            if let Some(rating) = rating {
                println!("[rated: {}]", rating);
            }
        }
    }
}

fn print_transcript(session: &ChatSession) {
    for entry in session.transcript() {
        let rating = match entry {
            TranscriptEntry::Message(m) => session.rating_for(&m.id),
            TranscriptEntry::Notice(_) => None,
        };
        print_entry(entry, rating);
    }
}

async fn open_store(config: &Config) -> Result<Arc<dyn Store>> {
    let store: Arc<dyn Store> = match config.storage_backend {
        StorageBackend::Sqlite => store::SqliteStore::open(&config.data_dir)
            .await
            .context("Failed to open SQLite store")?,
        StorageBackend::Memory => {
            info!("Using in-memory store; history will not survive restarts");
            Arc::new(store::MemoryStore::new())
        }
    };
    Ok(store)
}

async fn handle_command(session: &mut ChatSession, line: &str) -> bool {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let last_id = session.last_assistant_message().map(|m| m.id.clone());

    let outcome = match (command, last_id) {
        ("/quit", _) => return false,
        ("/help", _) => {
            println!("{}", HELP);
            Ok(())
        }
        ("/history", _) => session.load_history().await.map(|_| print_transcript(session)),
        ("/useful" | "/not-useful" | "/clear-rating", None) => {
            println!("Nothing to rate yet.");
            Ok(())
        }
        ("/useful", Some(id)) => session.rate(&id, Rating::Useful, None).await.map(|_| ()),
        ("/not-useful", Some(id)) => {
            let comment = Some(rest.trim().to_string()).filter(|c| !c.is_empty());
            session.rate(&id, Rating::NotUseful, comment).await.map(|_| ())
        }
        ("/clear-rating", Some(id)) => session.clear_rating(&id).await,
        _ => {
            println!("Unknown command. Type /help for a list.");
            Ok(())
        }
    };

    match outcome {
        Ok(()) => {}
        Err(SessionError::Feedback(feedback::FeedbackError::NotAuthenticated))
        | Err(SessionError::NotSignedIn) => println!("Please sign in to leave feedback."),
        Err(e) => println!("Error: {}", e),
    }
    true
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load()?;
    let store = open_store(&config).await?;

    let assistant = assistant::HttpAssistant::new(&config.api_url, config.api_timeout)
        .context("Failed to build chat client")?;
    match &config.user {
        Some(user) => info!("Signed in as {}", user.email.as_deref().unwrap_or(user.id.as_str())),
        None => warn!("No user configured; sending and feedback are disabled"),
    }
    let auth = auth::StaticAuth::new(config.user.clone());

    let mut session = ChatSession::new(
        conversation::ConversationService::new(store.clone()),
        feedback::FeedbackService::new(store),
        Arc::new(assistant),
        Arc::new(auth),
        config.profile.clone(),
        config.history_limit,
    );

    match session.load_history().await {
        Ok(_) => print_transcript(&session),
        Err(e) => warn!("Failed to load history: {}", e),
    }
    println!("\nAsk Lumi anything. Type /help for commands.");

    let interrupts = interrupt::Interrupts::new();
    let listener = interrupts.listen();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = interrupts.shutdown().cancelled() => break,
            line = lines.next_line() => match line? {
                Some(line) => line,
                None => break,
            },
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('/') {
            if !handle_command(&mut session, line).await {
                break;
            }
            continue;
        }

        let cancel = interrupts.begin_request();
        let before = session.transcript().len();
        if let Err(e) = session.send(line, &cancel).await {
            debug!("Send ended with {}; notice already in transcript", e);
        }
        interrupts.end_request();

        for entry in session.transcript().iter().skip(before) {
            if entry.role() == Role::Assistant {
                print_entry(entry, None);
            }
        }
    }
    listener.abort();

    info!("Goodbye");
    Ok(())
}
