pub mod codec;
pub mod level;
pub mod protocol;
pub mod state;

pub use codec::{decode, encode};
pub use level::{GradeLevel, GradeLevelError, GRADE_LEVEL_MAX, GRADE_LEVEL_MIN};
pub use protocol::{ActionReply, GameAction, RobotAction, GAME_WS_PATH, STATE_PATH};
pub use state::{AudioOutput, GameState, MicSource, ParseOptionError, RoundResult, Score};
