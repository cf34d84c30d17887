//! Debate session client binary.
//!
//! # Usage
//!
//! ```bash
//! # Join session 42 on a local backend, token from DEBATE_ACCESS_TOKEN
//! debate-client 42
//!
//! # Remote backend, token kept in a file the web login refreshes
//! debate-client 42 --endpoint wss://debate.example.com --token-file ~/.debate/token
//! ```

use std::{io, path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};
use debate_cli::{ConsoleListener, FileToken, Input};
use debate_client::{
    Backoff, ClientConfig, Command, CredentialStore, DEFAULT_ENDPOINT, Endpoint, EnvToken, Runtime,
    SessionClient, SystemEnv, transport::WsDriver,
};
use debate_proto::SessionId;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackoffArg {
    Fixed,
    Exponential,
}

/// Debate session client
#[derive(Parser, Debug)]
#[command(name = "debate-client")]
#[command(about = "Join a debate session from the terminal")]
#[command(version)]
struct Args {
    /// Session to join
    #[arg(env = "DEBATE_SESSION")]
    session: u64,

    /// Realtime endpoint (ws:// or wss://)
    #[arg(short, long, env = "DEBATE_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// File holding the bearer token, re-read at every connect
    #[arg(long, env = "DEBATE_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    /// Environment variable holding the bearer token, when no file is given
    #[arg(long, default_value = EnvToken::DEFAULT_VAR)]
    token_env: String,

    /// Retries after an abnormal close before giving up
    #[arg(long, env = "DEBATE_MAX_RECONNECT_ATTEMPTS", default_value_t = 5)]
    max_reconnect_attempts: u32,

    /// Seconds to wait before a retry
    #[arg(long, env = "DEBATE_RECONNECT_DELAY", default_value_t = 3)]
    reconnect_delay: u64,

    /// How the retry delay grows
    #[arg(long, value_enum, default_value_t = BackoffArg::Fixed)]
    backoff: BackoffArg,

    /// Longest retry delay in seconds, with exponential backoff
    #[arg(long, default_value_t = 60)]
    max_delay: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "DEBATE_LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

impl Args {
    fn config(&self) -> Result<ClientConfig, Box<dyn std::error::Error>> {
        let backoff = match self.backoff {
            BackoffArg::Fixed => Backoff::Fixed,
            BackoffArg::Exponential => {
                Backoff::Exponential { max_delay: Duration::from_secs(self.max_delay) }
            },
        };
        Ok(ClientConfig {
            endpoint: Endpoint::parse(&self.endpoint)?,
            max_reconnect_attempts: self.max_reconnect_attempts,
            reconnect_delay: Duration::from_secs(self.reconnect_delay),
            backoff,
            ..ClientConfig::default()
        })
    }

    fn credentials(&self) -> Box<dyn CredentialStore> {
        match &self.token_file {
            Some(path) => Box::new(FileToken::new(path)),
            None => Box::new(EnvToken::new(&self.token_env)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // Logs go to stderr so stdout carries only session output
    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let session = SessionId::new(args.session)?;
    let config = args.config()?;
    tracing::info!(%session, endpoint = %config.endpoint, "starting");

    let client: SessionClient = SessionClient::new(session, &config, args.credentials());
    let listener = ConsoleListener::new(io::stdout());
    let (runtime, handle) = Runtime::new(client, WsDriver::new(), SystemEnv::new(), listener);
    let runtime = tokio::spawn(runtime.run());

    handle.connect().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };

        match Input::parse(&line) {
            Ok(input) => {
                let Some(command) = input.into_command() else { continue };
                let quit = command == Command::Shutdown;
                handle.send(command).await?;
                if quit {
                    break;
                }
            },
            Err(error) => tracing::warn!(%error, "ignoring input"),
        }
    }

    // The runtime disconnects once the last handle is gone
    drop(handle);
    runtime.await?;
    Ok(())
}
