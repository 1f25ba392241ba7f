use super::*;

use soletrando::{
    AudioOutput, ConnectionStatus, Dispatch, GameAction, GradeLevel, MicSource,
};
use tokio::time::timeout;

#[derive(clap::Subcommand)]
pub(super) enum GameCommand {
    Start,
    NextRound,
    /// Start listening for the player's spelling.
    Spell,
    StopSpelling,
    Check,
    Backspace,
    /// Grade level, 1 to 6 (`3`, `3_ano` and `3º Ano` all work).
    Level {
        level: GradeLevel,
    },
    /// `pc`, `nao` or `hibrido`.
    MicSource {
        source: MicSource,
    },
    /// `sistema` or `nao`.
    AudioOutput {
        output: AudioOutput,
    },
}

impl GameCommand {
    pub(super) fn action(&self) -> GameAction {
        match self {
            GameCommand::Start => GameAction::StartGame,
            GameCommand::NextRound => GameAction::NextRound,
            GameCommand::Spell => GameAction::Spell,
            GameCommand::StopSpelling => GameAction::StopSpelling,
            GameCommand::Check => GameAction::CheckSpelling,
            GameCommand::Backspace => GameAction::Backspace,
            GameCommand::Level { level } => GameAction::SetLevel(*level),
            GameCommand::MicSource { source } => GameAction::SetMicSource(*source),
            GameCommand::AudioOutput { output } => GameAction::SetAudioOutput(*output),
        }
    }
}

/// Waits for the live connection, sends `action`, then prints the snapshot
/// the backend pushes in response.
pub(super) async fn run(
    config: &SyncConfig,
    action: GameAction,
    connect_timeout: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let sync = Synchronizer::start(config);
    let mut view = sync.subscribe();
    let opened = timeout(
        connect_timeout,
        view.wait_for(|view| view.status() == ConnectionStatus::Open),
    )
    .await
    .map(|result| result.is_ok());
    match opened {
        Ok(true) => {}
        Ok(false) => return Err("synchronizer stopped before connecting".into()),
        Err(_) => {
            return Err(format!(
                "no live connection to {} after {}s",
                config.backend.ws_url(),
                connect_timeout.as_secs()
            )
            .into())
        }
    }

    let revision = sync.view().revision();
    let outcome = sync.dispatch(action).await;
    let result = match outcome {
        Dispatch::Sent => {
            println!("sent: {}", action.name());
            let next = timeout(
                connect_timeout,
                view.wait_for(|view| view.revision() > revision),
            )
            .await
            .ok()
            .and_then(|result| result.ok().map(|view| view.clone()));
            match next {
                Some(next) => println!("{}", describe(&next)),
                None => info!("no snapshot followed the action"),
            }
            Ok(())
        }
        Dispatch::Skipped(status) => Err(format!("not sent, connection is {status}").into()),
        Dispatch::Failed(notice) | Dispatch::Rejected(notice) => Err(notice.to_string().into()),
    };
    sync.shutdown();
    result
}
