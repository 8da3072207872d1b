use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    AuthDirectoryService, HttpAuthDirectoryService, HttpPairingRecordService, PairBoard,
    SessionState, SystemClock,
};
use shared::error::ClientError;
use storage::Storage;
use tracing::info;

mod config;

use config::{load_settings, prepare_database_url};

#[derive(Parser, Debug)]
#[command(name = "pairboard", about = "Vending-machine pairing coordination client")]
struct Args {
    /// Base URL of the pairing server; overrides config file and environment.
    #[arg(long)]
    server_url: Option<String>,
    /// Sqlite database holding the persisted session credential.
    #[arg(long)]
    database_url: Option<String>,
    /// Organization clock offset from UTC, in minutes.
    #[arg(long)]
    utc_offset_minutes: Option<i32>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and persist the session credential.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create a directory account and log in.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Drop the persisted session credential.
    Logout,
    /// Show the logged-in identity.
    Whoami,
    /// Server health plus today's pairing gate.
    Status,
    /// Register today's pair with the given partner id.
    Pair { partner_id: i64 },
    /// This week's pairing history.
    History,
    /// Who has not paired today.
    Unpaired,
}

fn fail(err: ClientError) -> anyhow::Error {
    let hint = match &err {
        ClientError::Unreachable(_) => "check the server URL and your connection",
        ClientError::Unauthorized => "your session ended, log in again",
        ClientError::InvalidCredentials(_) => "check email and password",
        ClientError::InvalidPartner(_) => "pick a different partner",
        ClientError::DuplicateForToday => "you already paired today",
        ClientError::ConsistencyViolation(_) => "server data looks inconsistent, try again",
    };
    anyhow::anyhow!("{err} ({hint})")
}

async fn require_session(board: &Arc<PairBoard>) -> Result<()> {
    match board.session().restore().await {
        SessionState::Authenticated(snapshot) => {
            info!(user = %snapshot.user.name, "session restored");
            Ok(())
        }
        SessionState::Anonymous => bail!("not logged in; run `pairboard login` first"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    if let Some(database_url) = args.database_url {
        settings.database_url = database_url;
    }
    if let Some(utc_offset_minutes) = args.utc_offset_minutes {
        settings.utc_offset_minutes = utc_offset_minutes;
    }

    let auth = Arc::new(HttpAuthDirectoryService::new(&settings.server_url)?);
    let pairing = Arc::new(HttpPairingRecordService::new(&settings.server_url)?);
    let database_url = prepare_database_url(&settings.database_url)?;
    let credentials = Arc::new(Storage::new(&database_url).await?);
    let clock = SystemClock::with_offset_minutes(settings.utc_offset_minutes)
        .context("utc_offset_minutes is out of range")?;
    let auth_service: Arc<dyn AuthDirectoryService> = auth.clone();
    let board = PairBoard::new(auth_service, pairing, credentials, Arc::new(clock));

    match args.command {
        Command::Login { email, password } => {
            let user = board
                .session()
                .login(&email, &password)
                .await
                .map_err(fail)?;
            println!("Logged in as {} <{}>", user.name, user.email);
        }
        Command::Register {
            name,
            email,
            password,
        } => {
            let user = board
                .session()
                .register_account(&name, &email, &password)
                .await
                .map_err(fail)?;
            println!("Account created; logged in as {} <{}>", user.name, user.email);
        }
        Command::Logout => {
            board.session().logout().await;
            println!("Logged out.");
        }
        Command::Whoami => {
            require_session(&board).await?;
            let user = board.directory().current_user().await.map_err(fail)?;
            println!("{} <{}> (id {})", user.name, user.email, user.id.0);
        }
        Command::Status => {
            match auth.health().await {
                Ok(()) => println!("Server: reachable"),
                Err(err) => println!("Server: {err}"),
            }
            require_session(&board).await?;
            let resolved = board.registration().refresh_gate().await.map_err(fail)?;
            if let Some(violation) = &resolved.violation {
                eprintln!("Warning: {violation}");
            }
            match resolved.record {
                Some(record) => println!(
                    "Today: paired with {} ({})",
                    record.partner_name, record.pair_date
                ),
                None => println!("Today: not paired yet"),
            }
        }
        Command::Pair { partner_id } => {
            require_session(&board).await?;
            let resolved = board.registration().refresh_gate().await.map_err(fail)?;
            if let Some(record) = resolved.record {
                bail!("already paired today with {}", record.partner_name);
            }
            let partners = board
                .registration()
                .available_partners()
                .await
                .map_err(fail)?;
            let Some(partner) = partners.into_iter().find(|user| user.id.0 == partner_id) else {
                bail!("no partner with id {partner_id}; run `pairboard unpaired` for candidates");
            };
            board.registration().select(partner).await;
            let record = board.registration().submit().await.map_err(fail)?;
            println!("Paired with {} for {}", record.partner_name, record.pair_date);
        }
        Command::History => {
            require_session(&board).await?;
            println!("Fetching this week's history...");
            let records = board.history().refresh().await.map_err(fail)?;
            if records.is_empty() {
                println!("No pairings recorded this week.");
            } else {
                for record in records {
                    println!("{}  {}", record.pair_date, record.partner_name);
                }
            }
        }
        Command::Unpaired => {
            require_session(&board).await?;
            println!("Fetching today's unpaired roster...");
            let users = board.unpaired().refresh().await.map_err(fail)?;
            if users.is_empty() {
                println!("Everyone has paired today.");
            } else {
                for user in users {
                    println!("{:>4}  {} <{}>", user.id.0, user.name, user.email);
                }
            }
        }
    }

    Ok(())
}
