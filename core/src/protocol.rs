use serde::Deserialize;

use crate::level::GradeLevel;
use crate::state::{AudioOutput, MicSource};

pub const STATE_PATH: &str = "/game/state";
pub const GAME_WS_PATH: &str = "/ws/game";

/// Requests the presentation layer can ask the backend to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameAction {
    StartGame,
    NextRound,
    Spell,
    StopSpelling,
    CheckSpelling,
    Backspace,
    SetLevel(GradeLevel),
    SetMicSource(MicSource),
    SetAudioOutput(AudioOutput),
}

impl GameAction {
    pub fn path(&self) -> &'static str {
        match self {
            GameAction::StartGame => "/game/start",
            GameAction::NextRound => "/game/next-round",
            GameAction::Spell => "/game/spell",
            GameAction::StopSpelling => "/game/stop-spelling",
            GameAction::CheckSpelling => "/game/check",
            GameAction::Backspace => "/game/backspace",
            GameAction::SetLevel(_) => "/game/level",
            GameAction::SetMicSource(_) => "/game/mic-source",
            GameAction::SetAudioOutput(_) => "/game/audio-output",
        }
    }

    pub fn query(&self) -> Option<(&'static str, String)> {
        match self {
            GameAction::SetLevel(level) => Some(("level", level.as_param())),
            GameAction::SetMicSource(source) => Some(("source", source.as_str().to_string())),
            GameAction::SetAudioOutput(output) => Some(("output", output.as_str().to_string())),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GameAction::StartGame => "start_game",
            GameAction::NextRound => "next_round",
            GameAction::Spell => "spell",
            GameAction::StopSpelling => "stop_spelling",
            GameAction::CheckSpelling => "check_spelling",
            GameAction::Backspace => "backspace",
            GameAction::SetLevel(_) => "set_level",
            GameAction::SetMicSource(_) => "set_mic_source",
            GameAction::SetAudioOutput(_) => "set_audio_output",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RobotAction {
    Connect { ip: String },
    Disconnect,
}

impl RobotAction {
    pub fn path(&self) -> &'static str {
        match self {
            RobotAction::Connect { .. } => "/nao/connect",
            RobotAction::Disconnect => "/nao/disconnect",
        }
    }

    pub fn query(&self) -> Option<(&'static str, String)> {
        match self {
            RobotAction::Connect { ip } => Some(("ip", ip.clone())),
            RobotAction::Disconnect => None,
        }
    }
}

const STATUS_ERROR: &str = "erro";

/// Body the backend returns from action endpoints.
///
/// Shapes vary per endpoint (`{"status": ..}`, `{"palavra": ..}`,
/// `{"erro": ..}`); only the parts that signal a refusal are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ActionReply {
    pub status: Option<String>,
    #[serde(alias = "message")]
    pub mensagem: Option<String>,
    #[serde(alias = "error")]
    pub erro: Option<String>,
    pub ip: Option<String>,
}

impl ActionReply {
    /// Message to surface when the backend accepted the request but refused
    /// the action.
    pub fn rejection(&self) -> Option<String> {
        if let Some(erro) = self.erro.as_deref().filter(|text| !text.trim().is_empty()) {
            return Some(erro.trim().to_string());
        }
        if self.status.as_deref() == Some(STATUS_ERROR) {
            let message = self
                .mensagem
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .unwrap_or("backend reported an error");
            return Some(message.to_string());
        }
        None
    }
}
