use std::future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use soletrando::config::{load_dotenv, BACKEND_URL_ENV, POLL_MS_ENV, RECONNECT_MS_ENV};
use soletrando::robot::DEFAULT_ROBOT_ADDRESS;
use soletrando::{
    BackendEndpoints, ConfigError, GameApi, HttpGameApi, RobotLink, RobotStatus, SyncConfig,
    SyncView, Synchronizer,
};
use soletrando_core::encode;
use tracing::info;

mod game;

#[derive(Parser)]
#[command(name = "soletrando-cli", version, about = "Watch and drive a Soletrando backend")]
struct Cli {
    /// HTTP base of the backend. Falls back to VITE_BACKEND_URL, then localhost.
    #[arg(long, global = true, env = BACKEND_URL_ENV)]
    backend_url: Option<String>,
    /// Delay before each reconnection attempt.
    #[arg(long, global = true, env = RECONNECT_MS_ENV)]
    reconnect_ms: Option<u64>,
    /// Also pull the state on this period; 0 turns polling off.
    #[arg(long, global = true, env = POLL_MS_ENV)]
    poll_ms: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every status change and applied snapshot.
    Watch {
        #[arg(long)]
        duration_secs: Option<u64>,
    },
    /// Send one game action once the live connection is open.
    Game {
        #[command(subcommand)]
        action: game::GameCommand,
        #[arg(long, default_value_t = 10)]
        connect_timeout_secs: u64,
    },
    /// Attach or release the NAO robot.
    Nao {
        #[command(subcommand)]
        command: NaoCommand,
    },
    /// Pull the current snapshot once and print it as JSON.
    State,
}

#[derive(Subcommand)]
enum NaoCommand {
    Connect {
        #[arg(long, default_value = DEFAULT_ROBOT_ADDRESS)]
        ip: String,
    },
    Disconnect,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_dotenv(Path::new("."));
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Watch { duration_secs } => {
            watch(&config, duration_secs.map(Duration::from_secs)).await?;
        }
        Commands::Game {
            action,
            connect_timeout_secs,
        } => {
            game::run(
                &config,
                action.action(),
                Duration::from_secs(connect_timeout_secs),
            )
            .await?;
        }
        Commands::Nao { command } => {
            let link = RobotLink::new(Arc::new(HttpGameApi::new(config.backend.clone())));
            let status = match command {
                NaoCommand::Connect { ip } => link.connect(&ip).await?,
                NaoCommand::Disconnect => link.disconnect().await?,
            };
            match status {
                RobotStatus::Connected { address } => println!("nao: connected to {address}"),
                RobotStatus::Disconnected => println!("nao: disconnected"),
            }
        }
        Commands::State => {
            let api = HttpGameApi::new(config.backend.clone());
            let state = api.fetch_state().await?;
            match encode(&state) {
                Some(json) => println!("{json}"),
                None => return Err("snapshot could not be encoded".into()),
            }
        }
    }

    Ok(())
}

/// Environment and dotenv files first, then explicit flags on top.
fn load_config(cli: &Cli) -> Result<SyncConfig, ConfigError> {
    let mut config = SyncConfig::from_env()?;
    if let Some(url) = &cli.backend_url {
        config.backend = BackendEndpoints::parse(url)?;
    }
    if let Some(ms) = cli.reconnect_ms {
        config.sync = config.sync.with_reconnect_delay(Duration::from_millis(ms));
    }
    if let Some(ms) = cli.poll_ms {
        config.sync = config
            .sync
            .with_poll_interval(Some(Duration::from_millis(ms)));
    }
    Ok(config)
}

async fn watch(
    config: &SyncConfig,
    duration: Option<Duration>,
) -> Result<(), Box<dyn std::error::Error>> {
    let sync = Synchronizer::start(config);
    let mut view = sync.subscribe();
    info!(url = %config.backend.ws_url(), "watching");

    let deadline = async {
        match duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => future::pending().await,
        }
    };
    tokio::pin!(deadline);

    let current = view.borrow_and_update().clone();
    println!("{}", describe(&current));
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = view.borrow_and_update().clone();
                println!("{}", describe(&current));
            }
        }
    }
    sync.shutdown();
    Ok(())
}

fn describe(view: &SyncView) -> String {
    let Some(state) = view.state() else {
        return format!("[{}] loading", view.status());
    };
    let level = state
        .selected_level
        .map_or_else(|| "?".to_string(), |level| level.to_string());
    let mut line = format!(
        "[{}] rev {} level={} mic={} audio={}",
        view.status(),
        view.revision(),
        level,
        state.mic_source,
        state.audio_output,
    );
    if !state.game_started {
        line.push_str(" waiting to start");
    } else if state.game_over {
        line.push_str(" game over");
    } else {
        line.push_str(&format!(
            " word={} spelling={:?} result={}",
            state.current_word, state.user_spelling, state.round_result
        ));
    }
    line.push_str(&format!(
        " score={}/{}",
        state.score.correct, state.score.incorrect
    ));
    if state.listening {
        line.push_str(" listening");
    }
    if state.robot_connected {
        line.push_str(" nao");
    }
    if let Some(message) = &state.error_message {
        line.push_str(&format!(" error={message:?}"));
    }
    line
}
