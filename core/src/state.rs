use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::level::GradeLevel;

/// Server-authoritative snapshot of one game session.
///
/// Field names on the wire are the backend's (`palavra_atual`, ...); the
/// English names are accepted as aliases. Absent and `null` fields take their
/// default so that every snapshot is a complete value on its own.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameState {
    #[serde(rename = "palavra_atual", alias = "currentWord", deserialize_with = "null_as_default")]
    pub current_word: String,
    #[serde(
        rename = "soletracao_usuario",
        alias = "userSpelling",
        deserialize_with = "null_as_default"
    )]
    pub user_spelling: String,
    /// `None` when the backend reports no level or one outside 1..=6.
    #[serde(rename = "nivel_atual", alias = "selectedLevel", deserialize_with = "lenient_level")]
    pub selected_level: Option<GradeLevel>,
    #[serde(rename = "fonte_microfone", alias = "micSource", deserialize_with = "null_as_default")]
    pub mic_source: MicSource,
    #[serde(rename = "saida_audio", alias = "audioOutput", deserialize_with = "null_as_default")]
    pub audio_output: AudioOutput,
    #[serde(rename = "escutando", alias = "listening", deserialize_with = "null_as_default")]
    pub listening: bool,
    #[serde(rename = "jogo_iniciado", alias = "gameStarted", deserialize_with = "null_as_default")]
    pub game_started: bool,
    #[serde(rename = "fim_de_jogo", alias = "gameOver", deserialize_with = "null_as_default")]
    pub game_over: bool,
    #[serde(
        rename = "resultado_rodada",
        alias = "roundResult",
        deserialize_with = "null_as_default"
    )]
    pub round_result: RoundResult,
    #[serde(rename = "pontuacao", alias = "score", deserialize_with = "null_as_default")]
    pub score: Score,
    #[serde(rename = "erro", alias = "errorMessage")]
    pub error_message: Option<String>,
    #[serde(rename = "nao_conectado", alias = "robotConnected", deserialize_with = "null_as_default")]
    pub robot_connected: bool,
}

impl GameState {
    /// `gameOver` without `gameStarted` never comes from a healthy backend.
    pub fn lifecycle_consistent(&self) -> bool {
        !self.game_over || self.game_started
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Score {
    #[serde(rename = "acertos", alias = "correct")]
    pub correct: u32,
    #[serde(rename = "erros", alias = "incorrect")]
    pub incorrect: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RoundResult {
    #[default]
    None,
    Correct,
    Incorrect,
}

impl RoundResult {
    pub fn as_str(self) -> &'static str {
        match self {
            RoundResult::None => "none",
            RoundResult::Correct => "acertou",
            RoundResult::Incorrect => "errou",
        }
    }
}

impl std::str::FromStr for RoundResult {
    type Err = ParseOptionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match fold(value).as_str() {
            "" | "none" | "nenhum" => Ok(RoundResult::None),
            "acertou" | "correto" | "correct" => Ok(RoundResult::Correct),
            "errou" | "incorreto" | "incorrect" => Ok(RoundResult::Incorrect),
            _ => Err(ParseOptionError::new("round result", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MicSource {
    #[default]
    Pc,
    Robot,
    Hybrid,
}

impl MicSource {
    /// Value of the `source` query parameter expected by `/game/mic-source`.
    pub fn as_str(self) -> &'static str {
        match self {
            MicSource::Pc => "pc",
            MicSource::Robot => "nao",
            MicSource::Hybrid => "hibrido",
        }
    }
}

impl std::str::FromStr for MicSource {
    type Err = ParseOptionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match fold(value).as_str() {
            "pc" => Ok(MicSource::Pc),
            "nao" | "robot" => Ok(MicSource::Robot),
            "hibrido" | "hybrid" => Ok(MicSource::Hybrid),
            _ => Err(ParseOptionError::new("microphone source", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AudioOutput {
    #[default]
    System,
    Robot,
}

impl AudioOutput {
    /// Value of the `output` query parameter expected by `/game/audio-output`.
    pub fn as_str(self) -> &'static str {
        match self {
            AudioOutput::System => "sistema",
            AudioOutput::Robot => "nao",
        }
    }
}

impl std::str::FromStr for AudioOutput {
    type Err = ParseOptionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match fold(value).as_str() {
            "sistema" | "system" => Ok(AudioOutput::System),
            "nao" | "robot" => Ok(AudioOutput::Robot),
            _ => Err(ParseOptionError::new("audio output", value)),
        }
    }
}

macro_rules! string_wire {
    ($ty:ty) => {
        impl TryFrom<String> for $ty {
            type Error = ParseOptionError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.as_str().to_string()
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_wire!(RoundResult);
string_wire!(MicSource);
string_wire!(AudioOutput);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseOptionError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseOptionError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.trim().to_string(),
        }
    }
}

fn fold(value: &str) -> String {
    value
        .trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|ch| match ch {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The backend stores whatever level string it is given, so an unknown level
/// must not make the rest of the snapshot unreadable.
fn lenient_level<'de, D>(deserializer: D) -> Result<Option<GradeLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let level = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => GradeLevel::parse(&text).ok(),
        Some(Value::Number(number)) => number
            .as_u64()
            .and_then(|grade| u8::try_from(grade).ok())
            .and_then(|grade| GradeLevel::new(grade).ok()),
        _ => None,
    };
    Ok(level)
}
