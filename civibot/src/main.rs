//! civibot CLI: interactive chat session or one-shot appointment booking.
//! Config from env (.env supported) with optional CLI overrides.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use civibot::booking::{BookingRequest, BookingWorkflow};
use civibot::{BotSink, ChatSession, Config, GreetRegistry, MessageStore};
use records_client::RecordsClient;

#[derive(Parser)]
#[command(name = "civibot")]
#[command(about = "Municipal assistant: chat with CiviBot, book appointments", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat (inputs starting with / are commands; /quit exits).
    Chat {
        /// Room label; the session identity derives from it.
        #[arg(short, long)]
        room: Option<String>,
        /// Display name for echoed messages.
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Run the booking workflow once and print the resulting messages.
    Book {
        #[arg(long)]
        dni: String,
        #[arg(long)]
        department_id: String,
        #[arg(long)]
        department_name: String,
        /// YYYY-MM-DD, a weekday after today.
        #[arg(long)]
        date: String,
        /// One of 09:00, 10:00, 11:00, 14:00, 15:00, 16:00.
        #[arg(long)]
        time: String,
        /// Free-text reason; drives procedure selection.
        #[arg(long)]
        reason: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match cli.command {
        Commands::Chat { room, username } => run_chat(room, username).await,
        Commands::Book {
            dni,
            department_id,
            department_name,
            date,
            time,
            reason,
        } => {
            run_book(BookingRequest {
                dni,
                department_id,
                department_name,
                date,
                time,
                reason,
            })
            .await
        }
    }
}

async fn run_chat(room: Option<String>, username: Option<String>) -> Result<()> {
    let mut config = Config::from_env();
    if let Some(room) = room {
        config.room = room;
    }
    if let Some(username) = username {
        config.username = username;
    }
    civi_core::init_tracing(&config.log_file).context("initialize tracing")?;

    let greetings = Arc::new(GreetRegistry::new());
    let session = Arc::new(ChatSession::new(&config, greetings));

    // Print messages as the merged list grows; the list is rebuilt on every
    // append, so track what was already shown by id.
    let mut rx = session.subscribe();
    let printer = tokio::spawn(async move {
        let mut printed: HashSet<String> = HashSet::new();
        loop {
            let snapshot = rx.borrow_and_update().clone();
            for message in snapshot {
                if printed.insert(message.id.clone()) {
                    println!("[{}] {}", message.author.name, message.content);
                    for button in &message.buttons {
                        println!("    ▸ {} → {}", button.title, button.payload);
                    }
                }
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
    });

    session.greet_if_new().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line == "/quit" {
            break;
        }
        session.send(line).await;
    }

    printer.abort();
    Ok(())
}

async fn run_book(request: BookingRequest) -> Result<()> {
    let config = Config::from_env();
    civi_core::init_tracing(&config.log_file).context("initialize tracing")?;

    if let Err(message) = request.validate() {
        println!("{message}");
        return Ok(());
    }

    let store = Arc::new(MessageStore::new());
    let sink = BotSink::new(store.clone(), config.bot_name.clone());
    let workflow = BookingWorkflow::new(RecordsClient::new(&config.records_url), sink);
    workflow.run(&request).await;

    for message in store.snapshot() {
        println!("{}", message.content);
    }
    Ok(())
}
