use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const GRADE_LEVEL_MIN: u8 = 1;
pub const GRADE_LEVEL_MAX: u8 = 6;

/// School grade whose word list the backend draws from.
///
/// Accepts `"3"`, `"3_ano"` and `"3º Ano"` alike; the `level` query
/// parameter is always sent as `"3_ano"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GradeLevel(u8);

impl GradeLevel {
    pub fn new(grade: u8) -> Result<Self, GradeLevelError> {
        if !(GRADE_LEVEL_MIN..=GRADE_LEVEL_MAX).contains(&grade) {
            return Err(GradeLevelError::OutOfRange { found: grade });
        }
        Ok(Self(grade))
    }

    pub fn parse(value: &str) -> Result<Self, GradeLevelError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(GradeLevelError::Empty);
        }
        let digits: String = trimmed.chars().take_while(|ch| ch.is_ascii_digit()).collect();
        if digits.is_empty() {
            return Err(GradeLevelError::Unrecognized(trimmed.to_string()));
        }
        let rest = trimmed[digits.len()..].trim().to_lowercase();
        let suffix_ok = matches!(rest.as_str(), "" | "_ano" | "º ano" | "° ano" | "ano");
        if !suffix_ok {
            return Err(GradeLevelError::Unrecognized(trimmed.to_string()));
        }
        let grade = digits
            .parse::<u8>()
            .map_err(|_| GradeLevelError::Unrecognized(trimmed.to_string()))?;
        Self::new(grade)
    }

    pub fn grade(self) -> u8 {
        self.0
    }

    /// Value of the `level` query parameter expected by `/game/level`.
    pub fn as_param(self) -> String {
        format!("{}_ano", self.0)
    }
}

impl fmt::Display for GradeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}º Ano", self.0)
    }
}

impl std::str::FromStr for GradeLevel {
    type Err = GradeLevelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for GradeLevel {
    type Error = GradeLevelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<GradeLevel> for String {
    fn from(level: GradeLevel) -> Self {
        level.0.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GradeLevelError {
    #[error("grade level is empty")]
    Empty,
    #[error("grade level must be between {GRADE_LEVEL_MIN} and {GRADE_LEVEL_MAX}, got {found}")]
    OutOfRange { found: u8 },
    #[error("unrecognized grade level '{0}'")]
    Unrecognized(String),
}
