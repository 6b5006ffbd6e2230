// command line interface

use crate::{Db, Server};
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "trivia", about = "Serve a trivia question bank over http")]
struct Cli {
    /// database connection url (postgres or sqlite)
    #[arg(long, short, env = "DATABASE_URL", global = true)]
    db: Option<String>,

    /// more log output (-v info, -vv debug, -vvv trace); RUST_LOG wins when set
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// start the http api (the default)
    Serve {
        /// port number
        #[arg(long, short, default_value = "5000")]
        port: u16,

        /// host to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// create the tables and seed categories before serving
        #[arg(long)]
        init: bool,
    },

    /// create the tables
    Init {
        /// add the default categories when none exist
        #[arg(long)]
        seed: bool,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let db = cli
        .db
        .ok_or_else(|| miette::miette!("database url required (--db or DATABASE_URL)"))?;

    match cli.command {
        Some(Commands::Serve { port, host, init }) => {
            Server::run(&db, &host, port, init).await.into_diagnostic()
        }

        Some(Commands::Init { seed }) => {
            let conn = Db::connect(&db).await.into_diagnostic()?;
            conn.init_schema(seed).await.into_diagnostic()?;
            info!(dialect = conn.dialect_name(), seed, "schema created");
            Ok(())
        }

        None => Server::run(&db, "127.0.0.1", 5000, false)
            .await
            .into_diagnostic(),
    }
}

fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
