//! Client-side state synchronization for the Soletrando spelling game.
//!
//! The backend owns every game rule. This crate keeps one current
//! [`GameState`] snapshot in step with it over two channels, a `GET
//! /game/state` pull and a `/ws/game` push connection, and forwards player
//! actions as fire-and-forget requests. See [`Synchronizer`].

pub mod config;
pub mod error;
pub mod game_socket;
pub mod http_api;
pub mod robot;
pub mod runtime;
pub mod sync_core;
pub mod synchronizer;

pub use config::{BackendEndpoints, SyncConfig, SyncOptions};
pub use error::{ConfigError, RobotError, TransportError};
pub use game_socket::{PushConnector, PushStream, WsConnector};
pub use http_api::{GameApi, HttpGameApi};
pub use robot::{RobotLink, RobotStatus};
pub use runtime::{ConnectionStatus, Dispatch, Notice, SyncView};
pub use synchronizer::Synchronizer;

pub use soletrando_core::{
    AudioOutput, GameAction, GameState, GradeLevel, MicSource, RoundResult, Score,
};
