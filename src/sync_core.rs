//! Reconciliation of pulled and pushed snapshots, free of any I/O.
//!
//! Snapshots carry no sequence number, so arrival order is snapshot order.
//! The one exception is a pull response that lands after a push applied
//! since the pull was issued: that response is older than what is already on
//! screen and is discarded.

use std::sync::Arc;

use soletrando_core::{decode, GameState};
use tracing::warn;

use crate::runtime::{ConnectionStatus, SyncView};

/// Issued with every pull; remembers how many pushes had been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullTicket {
    id: u64,
    pushes_seen: u64,
}

impl PullTicket {
    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOutcome {
    Applied,
    /// A push, or a later pull, was applied after this pull was issued.
    StalePull,
    Malformed,
    AfterClose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkChange {
    Opened { resync: bool },
    Lost,
    Unchanged,
}

#[derive(Debug, Default)]
pub struct SyncCore {
    status: ConnectionStatus,
    state: Option<Arc<GameState>>,
    revision: u64,
    pushes_applied: u64,
    next_ticket: u64,
    last_pull_applied: Option<u64>,
}

impl SyncCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn state(&self) -> Option<&Arc<GameState>> {
        self.state.as_ref()
    }

    pub fn view(&self) -> SyncView {
        SyncView::new(self.status, self.state.clone(), self.revision)
    }

    pub fn issue_pull(&mut self) -> PullTicket {
        self.next_ticket = self.next_ticket.wrapping_add(1);
        PullTicket {
            id: self.next_ticket,
            pushes_seen: self.pushes_applied,
        }
    }

    pub fn apply_pull(&mut self, ticket: PullTicket, state: GameState) -> SnapshotOutcome {
        if self.status == ConnectionStatus::Closed {
            return SnapshotOutcome::AfterClose;
        }
        if self.pushes_applied != ticket.pushes_seen {
            return SnapshotOutcome::StalePull;
        }
        if self.last_pull_applied.is_some_and(|applied| applied > ticket.id) {
            return SnapshotOutcome::StalePull;
        }
        self.last_pull_applied = Some(ticket.id);
        self.replace(state);
        SnapshotOutcome::Applied
    }

    pub fn apply_push(&mut self, payload: &str) -> SnapshotOutcome {
        if self.status == ConnectionStatus::Closed {
            return SnapshotOutcome::AfterClose;
        }
        let Some(state) = decode::<GameState>(payload) else {
            return SnapshotOutcome::Malformed;
        };
        self.pushes_applied = self.pushes_applied.wrapping_add(1);
        self.replace(state);
        SnapshotOutcome::Applied
    }

    pub fn link_opened(&mut self) -> LinkChange {
        match self.status {
            ConnectionStatus::Connecting => {
                self.status = ConnectionStatus::Open;
                LinkChange::Opened { resync: false }
            }
            ConnectionStatus::Reconnecting => {
                self.status = ConnectionStatus::Open;
                LinkChange::Opened { resync: true }
            }
            ConnectionStatus::Open | ConnectionStatus::Closed => LinkChange::Unchanged,
        }
    }

    /// A failed handshake counts as a loss too; either way the next attempt
    /// is a reconnection.
    pub fn link_lost(&mut self) -> LinkChange {
        match self.status {
            ConnectionStatus::Connecting | ConnectionStatus::Open => {
                self.status = ConnectionStatus::Reconnecting;
                LinkChange::Lost
            }
            ConnectionStatus::Reconnecting | ConnectionStatus::Closed => LinkChange::Unchanged,
        }
    }

    pub fn close(&mut self) -> bool {
        if self.status == ConnectionStatus::Closed {
            return false;
        }
        self.status = ConnectionStatus::Closed;
        true
    }

    fn replace(&mut self, state: GameState) {
        if !state.lifecycle_consistent() {
            warn!("snapshot reports game over before game start");
        }
        self.state = Some(Arc::new(state));
        self.revision = self.revision.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use soletrando_core::{encode, RoundResult, Score};

    use super::*;

    fn push_json(state: &GameState) -> String {
        encode(state).unwrap()
    }

    fn word(word: &str) -> GameState {
        GameState {
            current_word: word.to_string(),
            ..GameState::default()
        }
    }

    fn opened() -> SyncCore {
        let mut core = SyncCore::new();
        assert_eq!(core.link_opened(), LinkChange::Opened { resync: false });
        core
    }

    #[test]
    fn starts_connecting_without_state() {
        let core = SyncCore::new();
        assert_eq!(core.status(), ConnectionStatus::Connecting);
        assert!(core.view().is_loading());
        assert_eq!(core.view().revision(), 0);
    }

    #[test]
    fn later_snapshot_replaces_every_field() {
        let mut core = opened();
        let first = GameState {
            current_word: "SOL".to_string(),
            user_spelling: "SO".to_string(),
            listening: true,
            score: Score {
                correct: 2,
                incorrect: 1,
            },
            error_message: Some("aviso".to_string()),
            ..GameState::default()
        };
        assert_eq!(core.apply_push(&push_json(&first)), SnapshotOutcome::Applied);
        assert_eq!(core.apply_push(r#"{"palavra_atual":"LUA"}"#), SnapshotOutcome::Applied);

        let state = core.state().unwrap();
        assert_eq!(state.as_ref(), &word("LUA"));
        assert_eq!(core.view().revision(), 2);
    }

    #[test]
    fn pull_is_discarded_after_a_newer_push() {
        let mut core = opened();
        let ticket = core.issue_pull();
        assert_eq!(core.apply_push(&push_json(&word("PUSH"))), SnapshotOutcome::Applied);
        assert_eq!(core.apply_pull(ticket, word("PULL")), SnapshotOutcome::StalePull);
        assert_eq!(core.state().unwrap().current_word, "PUSH");
    }

    #[test]
    fn pull_issued_after_push_applies() {
        let mut core = opened();
        assert_eq!(core.apply_push(&push_json(&word("PUSH"))), SnapshotOutcome::Applied);
        let ticket = core.issue_pull();
        assert_eq!(core.apply_pull(ticket, word("PULL")), SnapshotOutcome::Applied);
        assert_eq!(core.state().unwrap().current_word, "PULL");
    }

    #[test]
    fn older_pull_never_overwrites_a_newer_pull() {
        let mut core = SyncCore::new();
        let older = core.issue_pull();
        let newer = core.issue_pull();
        assert_eq!(core.apply_pull(newer, word("NEW")), SnapshotOutcome::Applied);
        assert_eq!(core.apply_pull(older, word("OLD")), SnapshotOutcome::StalePull);
        assert_eq!(core.state().unwrap().current_word, "NEW");
    }

    #[test]
    fn malformed_push_keeps_current_state() {
        let mut core = opened();
        core.apply_push(&push_json(&word("GATO")));
        assert_eq!(core.apply_push("{oops"), SnapshotOutcome::Malformed);
        assert_eq!(
            core.apply_push(r#"{"fonte_microfone":"radio"}"#),
            SnapshotOutcome::Malformed
        );
        assert_eq!(core.state().unwrap().current_word, "GATO");
        assert_eq!(core.view().revision(), 1);
    }

    #[test]
    fn unknown_level_does_not_freeze_state() {
        let mut core = opened();
        core.apply_push(&push_json(&word("GATO")));
        assert_eq!(
            core.apply_push(r#"{"palavra_atual":"CASA","nivel_atual":"7_ano"}"#),
            SnapshotOutcome::Applied
        );
        let state = core.state().unwrap();
        assert_eq!(state.current_word, "CASA");
        assert_eq!(state.selected_level, None);
    }

    #[test]
    fn malformed_push_does_not_invalidate_pending_pull() {
        let mut core = opened();
        let ticket = core.issue_pull();
        core.apply_push("garbage");
        assert_eq!(core.apply_pull(ticket, word("PULL")), SnapshotOutcome::Applied);
    }

    #[test]
    fn lifecycle_reconnects_and_requests_resync() {
        let mut core = SyncCore::new();
        assert_eq!(core.link_lost(), LinkChange::Lost);
        assert_eq!(core.status(), ConnectionStatus::Reconnecting);
        assert_eq!(core.link_lost(), LinkChange::Unchanged);
        assert_eq!(core.link_opened(), LinkChange::Opened { resync: true });
        assert_eq!(core.status(), ConnectionStatus::Open);
        assert_eq!(core.link_opened(), LinkChange::Unchanged);
        assert_eq!(core.link_lost(), LinkChange::Lost);
        assert_eq!(core.link_opened(), LinkChange::Opened { resync: true });
    }

    #[test]
    fn closed_is_terminal() {
        let mut core = opened();
        let ticket = core.issue_pull();
        assert!(core.close());
        assert!(!core.close());
        assert_eq!(core.link_opened(), LinkChange::Unchanged);
        assert_eq!(core.link_lost(), LinkChange::Unchanged);
        assert_eq!(core.apply_pull(ticket, word("LATE")), SnapshotOutcome::AfterClose);
        assert_eq!(
            core.apply_push(&push_json(&word("LATE"))),
            SnapshotOutcome::AfterClose
        );
        assert_eq!(core.status(), ConnectionStatus::Closed);
        assert!(core.state().is_none());
    }

    #[test]
    fn round_flow_ends_on_second_word_with_one_point() {
        let mut core = SyncCore::new();
        let ticket = core.issue_pull();
        assert_eq!(core.apply_pull(ticket, GameState::default()), SnapshotOutcome::Applied);
        core.link_opened();

        let mut server = GameState {
            game_started: true,
            current_word: "GATO".to_string(),
            round_result: RoundResult::None,
            ..GameState::default()
        };
        core.apply_push(&push_json(&server));

        server.round_result = RoundResult::Correct;
        server.score.correct = 1;
        core.apply_push(&push_json(&server));

        server.current_word = "CASA".to_string();
        server.round_result = RoundResult::None;
        core.apply_push(&push_json(&server));

        let state = core.state().unwrap();
        assert_eq!(state.score.correct, 1);
        assert_eq!(state.current_word, "CASA");
        assert_eq!(state.round_result, RoundResult::None);
    }

    #[test]
    fn drop_keeps_state_until_resync_pull() {
        let mut core = opened();
        core.apply_push(&push_json(&word("SOL")));
        core.link_lost();
        assert_eq!(core.state().unwrap().current_word, "SOL");

        let LinkChange::Opened { resync: true } = core.link_opened() else {
            panic!("expected a resync on reconnect");
        };
        let ticket = core.issue_pull();
        assert_eq!(core.apply_pull(ticket, word("LUA")), SnapshotOutcome::Applied);
        assert_eq!(core.state().unwrap().current_word, "LUA");
    }
}
