//! Client-side owner of the one current game snapshot.
//!
//! A [`Synchronizer`] is a cheap, cloneable handle. Behind it a single actor
//! task owns the [`SyncCore`] and applies, in order, everything that can
//! change it: push payloads and link events from the connection task, and
//! pull responses from short-lived fetch tasks. Readers observe the result
//! through a `watch` channel; action methods only talk to the backend and
//! never touch the snapshot themselves.

use std::future;
use std::sync::Arc;
use std::time::Duration;

use soletrando_core::{AudioOutput, GameAction, GameState, GradeLevel, MicSource};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::{SyncConfig, SyncOptions};
use crate::error::TransportError;
use crate::game_socket::{PushConnector, WsConnector};
use crate::http_api::{GameApi, HttpGameApi};
use crate::runtime::{ConnectionStatus, Dispatch, Notice, SyncView};
use crate::sync_core::{LinkChange, PullTicket, SnapshotOutcome, SyncCore};

enum Command {
    Opened,
    Push(String),
    Lost,
    Refresh,
    PullDone {
        ticket: PullTicket,
        result: Result<GameState, TransportError>,
    },
    Shutdown,
}

struct Shared {
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<SyncView>,
    notices: broadcast::Sender<Notice>,
    api: Arc<dyn GameApi>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}

/// Handle to the running synchronizer. Dropping the last clone tears it down.
#[derive(Clone)]
pub struct Synchronizer {
    shared: Arc<Shared>,
}

impl Synchronizer {
    /// Connects to the backend described by `config`. Must be called from
    /// within a tokio runtime.
    pub fn start(config: &SyncConfig) -> Self {
        let api = Arc::new(HttpGameApi::new(config.backend.clone()));
        let connector = Arc::new(WsConnector::new(config.backend.ws_url().clone()));
        Self::with_transports(api, connector, config.sync.clone())
    }

    pub fn with_transports(
        api: Arc<dyn GameApi>,
        connector: Arc<dyn PushConnector>,
        options: SyncOptions,
    ) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let core = SyncCore::new();
        let (view_tx, view_rx) = watch::channel(core.view());
        let (notices, _) = broadcast::channel(options.notice_capacity.max(1));
        let (link_stop_tx, link_stop_rx) = watch::channel(false);

        tokio::spawn(connection_loop(
            connector,
            commands_tx.clone(),
            link_stop_rx,
            options.reconnect_delay,
        ));
        let actor = SyncActor {
            core,
            api: api.clone(),
            commands: commands_tx.clone(),
            view: view_tx,
            link_stop: link_stop_tx,
            pulls_in_flight: 0,
        };
        tokio::spawn(actor.run(commands_rx, options.poll_interval));

        Self {
            shared: Arc::new(Shared {
                commands: commands_tx,
                view: view_rx,
                notices,
                api,
            }),
        }
    }

    pub fn view(&self) -> SyncView {
        self.shared.view.borrow().clone()
    }

    /// `None` until the first snapshot has arrived.
    pub fn state(&self) -> Option<Arc<GameState>> {
        self.shared.view.borrow().state().cloned()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.shared.view.borrow().status()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncView> {
        self.shared.view.clone()
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.shared.notices.subscribe()
    }

    /// Issues one pull, reconciled like any other.
    pub fn refresh(&self) {
        let _ = self.shared.commands.send(Command::Refresh);
    }

    /// Closes the live connection. Later pull responses are discarded.
    pub fn shutdown(&self) {
        let _ = self.shared.commands.send(Command::Shutdown);
    }

    pub async fn dispatch(&self, action: GameAction) -> Dispatch {
        let status = self.status();
        if !status.can_dispatch() {
            debug!(action = action.name(), %status, "action skipped while not connected");
            return Dispatch::Skipped(status);
        }
        match self.shared.api.send_action(&action).await {
            Ok(reply) => match reply.rejection() {
                None => {
                    debug!(action = action.name(), "action sent");
                    Dispatch::Sent
                }
                Some(message) => {
                    info!(action = action.name(), %message, "backend refused action");
                    Dispatch::Rejected(self.publish_notice(&action, message))
                }
            },
            Err(err) => {
                warn!(action = action.name(), error = %err, "action request failed");
                Dispatch::Failed(self.publish_notice(&action, err.to_string()))
            }
        }
    }

    pub async fn start_game(&self) -> Dispatch {
        self.dispatch(GameAction::StartGame).await
    }

    pub async fn next_round(&self) -> Dispatch {
        self.dispatch(GameAction::NextRound).await
    }

    pub async fn spell(&self) -> Dispatch {
        self.dispatch(GameAction::Spell).await
    }

    pub async fn stop_spelling(&self) -> Dispatch {
        self.dispatch(GameAction::StopSpelling).await
    }

    pub async fn check_spelling(&self) -> Dispatch {
        self.dispatch(GameAction::CheckSpelling).await
    }

    pub async fn backspace(&self) -> Dispatch {
        self.dispatch(GameAction::Backspace).await
    }

    pub async fn set_level(&self, level: GradeLevel) -> Dispatch {
        self.dispatch(GameAction::SetLevel(level)).await
    }

    pub async fn set_mic_source(&self, source: MicSource) -> Dispatch {
        self.dispatch(GameAction::SetMicSource(source)).await
    }

    pub async fn set_audio_output(&self, output: AudioOutput) -> Dispatch {
        self.dispatch(GameAction::SetAudioOutput(output)).await
    }

    fn publish_notice(&self, action: &GameAction, message: String) -> Notice {
        let notice = Notice {
            action: action.name(),
            message,
        };
        // No subscribers is fine; the notice is also returned to the caller.
        let _ = self.shared.notices.send(notice.clone());
        notice
    }
}

struct SyncActor {
    core: SyncCore,
    api: Arc<dyn GameApi>,
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Sender<SyncView>,
    link_stop: watch::Sender<bool>,
    pulls_in_flight: usize,
}

impl SyncActor {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        poll_interval: Option<Duration>,
    ) {
        let mut poll = poll_interval.filter(|period| !period.is_zero()).map(|period| {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        self.pull();
        loop {
            let command = tokio::select! {
                command = commands.recv() => command,
                _ = next_poll(&mut poll) => {
                    self.poll();
                    continue;
                }
            };
            let Some(command) = command else {
                break;
            };
            if !self.handle(command) {
                break;
            }
        }
        debug!("synchronizer stopped");
    }

    /// Returns `false` once the synchronizer is closed.
    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Opened => match self.core.link_opened() {
                LinkChange::Opened { resync } => {
                    info!(resync, "live connection open");
                    self.publish();
                    if resync {
                        self.pull();
                    }
                }
                LinkChange::Lost | LinkChange::Unchanged => {}
            },
            Command::Lost => {
                if self.core.link_lost() == LinkChange::Lost {
                    info!("live connection lost, reconnecting");
                    self.publish();
                }
            }
            Command::Push(payload) => match self.core.apply_push(&payload) {
                SnapshotOutcome::Applied => self.publish(),
                SnapshotOutcome::Malformed => {
                    warn!(len = payload.len(), "dropping malformed push message");
                }
                SnapshotOutcome::StalePull | SnapshotOutcome::AfterClose => {}
            },
            Command::Refresh => self.pull(),
            Command::PullDone { ticket, result } => {
                self.pulls_in_flight = self.pulls_in_flight.saturating_sub(1);
                self.pull_done(ticket, result);
            }
            Command::Shutdown => {
                if self.core.close() {
                    info!("synchronizer closed");
                    let _ = self.link_stop.send(true);
                    self.publish();
                }
                return false;
            }
        }
        true
    }

    fn pull_done(&mut self, ticket: PullTicket, result: Result<GameState, TransportError>) {
        match result {
            Ok(state) => match self.core.apply_pull(ticket, state) {
                SnapshotOutcome::Applied => self.publish(),
                SnapshotOutcome::StalePull => {
                    debug!(ticket = ticket.id(), "discarding stale pull response");
                }
                SnapshotOutcome::Malformed | SnapshotOutcome::AfterClose => {}
            },
            Err(err) => {
                warn!(ticket = ticket.id(), error = %err, "state fetch failed");
            }
        }
    }

    /// Periodic pulls never stack up behind a backend that stopped answering.
    fn poll(&mut self) {
        if self.pulls_in_flight > 0 {
            debug!(in_flight = self.pulls_in_flight, "previous pull pending, skipping poll");
            return;
        }
        self.pull();
    }

    fn pull(&mut self) {
        if self.core.status() == ConnectionStatus::Closed {
            return;
        }
        self.pulls_in_flight += 1;
        let ticket = self.core.issue_pull();
        let api = self.api.clone();
        let commands = self.commands.clone();
        debug!(ticket = ticket.id(), "pulling state");
        tokio::spawn(async move {
            let result = api.fetch_state().await;
            let _ = commands.send(Command::PullDone { ticket, result });
        });
    }

    fn publish(&self) {
        self.view.send_replace(self.core.view());
    }
}

async fn next_poll(poll: &mut Option<Interval>) {
    match poll {
        Some(interval) => {
            interval.tick().await;
        }
        None => future::pending().await,
    }
}

/// Keeps one live connection up until told to stop, retrying after a fixed
/// delay for as long as it takes.
async fn connection_loop(
    connector: Arc<dyn PushConnector>,
    commands: mpsc::UnboundedSender<Command>,
    mut stop: watch::Receiver<bool>,
    reconnect_delay: Duration,
) {
    loop {
        let attempt = tokio::select! {
            _ = stop.changed() => return,
            attempt = connector.connect() => attempt,
        };
        match attempt {
            Ok(mut stream) => {
                if commands.send(Command::Opened).is_err() {
                    stream.close().await;
                    return;
                }
                loop {
                    let message = tokio::select! {
                        _ = stop.changed() => {
                            stream.close().await;
                            return;
                        }
                        message = stream.next_message() => message,
                    };
                    match message {
                        Some(Ok(payload)) => {
                            if commands.send(Command::Push(payload)).is_err() {
                                stream.close().await;
                                return;
                            }
                        }
                        Some(Err(err)) => {
                            warn!(error = %err, "live connection failed");
                            stream.close().await;
                            break;
                        }
                        None => break,
                    }
                }
            }
            Err(err) => warn!(error = %err, "live connection attempt failed"),
        }
        if commands.send(Command::Lost).is_err() {
            return;
        }
        tokio::select! {
            _ = stop.changed() => return,
            _ = tokio::time::sleep(reconnect_delay) => {}
        }
    }
}
