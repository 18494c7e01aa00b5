use anyhow::Context;
use carelink_core::CarelinkConfig;
use carelink_server::{AppState, commands};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "carelink-server", version, about = "Carelink API server")]
struct Cli {
    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the API server (default).
    Serve {
        /// Bind address; overrides `server.bind` from the config file.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Issue or verify bearer tokens.
    Token {
        #[command(subcommand)]
        cmd: TokenCommand,
    },

    /// Seal or open payload envelopes (debugging aid).
    Envelope {
        #[command(subcommand)]
        cmd: EnvelopeCommand,
    },
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Issue a token with the configured secret and lifetime.
    Mint {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        role: String,
        /// Mark the identity as approved (doctor accounts).
        #[arg(long, default_value_t = false)]
        approved: bool,
    },
    /// Verify a token and print its claims.
    Verify { token: String },
}

#[derive(Subcommand, Debug)]
enum EnvelopeCommand {
    /// Encrypt a JSON document.
    Seal { json: String },
    /// Decrypt an envelope string.
    Open { envelope: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let cfg = CarelinkConfig::load().context("failed to load configuration")?;
    // Key, iv and secret invariants are checked here, once; a bad value stops
    // the process before it serves anything.
    let state = AppState::from_config(&cfg).context("invalid security configuration")?;

    match cli.cmd.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| cfg.server.bind.clone());
            commands::serve(state, &bind).await?;
        }
        Command::Token { cmd } => match cmd {
            TokenCommand::Mint { id, role, approved } => {
                println!("{}", commands::token_mint(&state, id, &role, approved)?);
            }
            TokenCommand::Verify { token } => {
                println!("{}", commands::token_verify(&state, &token)?);
            }
        },
        Command::Envelope { cmd } => match cmd {
            EnvelopeCommand::Seal { json } => {
                println!("{}", commands::envelope_seal(&state, &json)?);
            }
            EnvelopeCommand::Open { envelope } => {
                println!("{}", commands::envelope_open(&state, &envelope)?);
            }
        },
    }

    Ok(())
}
