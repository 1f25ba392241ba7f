use std::fmt;
use std::sync::Arc;

use soletrando_core::GameState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionStatus {
    #[default]
    Connecting,
    Open,
    Reconnecting,
    Closed,
}

impl ConnectionStatus {
    pub fn can_dispatch(self) -> bool {
        matches!(self, ConnectionStatus::Open)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Open => "open",
            ConnectionStatus::Reconnecting => "reconnecting",
            ConnectionStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the presentation layer observes: the connection status and the one
/// current snapshot, if any has arrived yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncView {
    status: ConnectionStatus,
    state: Option<Arc<GameState>>,
    revision: u64,
}

impl SyncView {
    pub(crate) fn new(
        status: ConnectionStatus,
        state: Option<Arc<GameState>>,
        revision: u64,
    ) -> Self {
        Self {
            status,
            state,
            revision,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn state(&self) -> Option<&Arc<GameState>> {
        self.state.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_none()
    }

    /// Bumped once per applied snapshot.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// A non-fatal, dismissible failure report for one dispatched action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub action: &'static str,
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.action, self.message)
    }
}

/// Outcome of one action call. Never an error: failures are already logged
/// and broadcast as a [`Notice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Sent,
    /// Not attempted because the connection was not open.
    Skipped(ConnectionStatus),
    /// The request did not complete.
    Failed(Notice),
    /// The backend answered but refused the action.
    Rejected(Notice),
}

impl Dispatch {
    pub fn is_sent(&self) -> bool {
        matches!(self, Dispatch::Sent)
    }

    pub fn notice(&self) -> Option<&Notice> {
        match self {
            Dispatch::Failed(notice) | Dispatch::Rejected(notice) => Some(notice),
            Dispatch::Sent | Dispatch::Skipped(_) => None,
        }
    }
}
