use std::sync::Arc;

use soletrando_core::RobotAction;
use tracing::{info, warn};
use url::Host;

use crate::error::RobotError;
use crate::http_api::GameApi;

pub const DEFAULT_ROBOT_ADDRESS: &str = "192.168.0.100";

const STATUS_CONNECTED: &str = "conectado";
const STATUS_DISCONNECTED: &str = "desconectado";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RobotStatus {
    Connected { address: String },
    Disconnected,
}

/// Asks the backend to attach or release the NAO robot.
///
/// Robot state is not tracked here; later snapshots report it through
/// `robot_connected`.
#[derive(Clone)]
pub struct RobotLink {
    api: Arc<dyn GameApi>,
}

impl RobotLink {
    pub fn new(api: Arc<dyn GameApi>) -> Self {
        Self { api }
    }

    pub async fn connect(&self, address: &str) -> Result<RobotStatus, RobotError> {
        let address = validate_address(address)?;
        let reply = self
            .api
            .send_robot(&RobotAction::Connect {
                ip: address.clone(),
            })
            .await
            .inspect_err(|err| warn!(%address, error = %err, "robot connect request failed"))?;
        if let Some(message) = reply.rejection() {
            warn!(%address, %message, "robot connect refused");
            return Err(RobotError::Refused(message));
        }
        match reply.status.as_deref() {
            Some(STATUS_CONNECTED) => {
                let address = reply.ip.unwrap_or(address);
                info!(%address, "robot connected");
                Ok(RobotStatus::Connected { address })
            }
            other => Err(RobotError::Refused(unexpected_status(other))),
        }
    }

    pub async fn disconnect(&self) -> Result<RobotStatus, RobotError> {
        let reply = self.api.send_robot(&RobotAction::Disconnect).await?;
        if let Some(message) = reply.rejection() {
            return Err(RobotError::Refused(message));
        }
        match reply.status.as_deref() {
            Some(STATUS_DISCONNECTED) | None => {
                info!("robot disconnected");
                Ok(RobotStatus::Disconnected)
            }
            other => Err(RobotError::Refused(unexpected_status(other))),
        }
    }
}

fn unexpected_status(status: Option<&str>) -> String {
    match status {
        Some(status) => format!("unexpected status '{status}'"),
        None => "missing status in reply".to_string(),
    }
}

fn validate_address(raw: &str) -> Result<String, RobotError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RobotError::MissingAddress);
    }
    if trimmed.contains(char::is_whitespace) {
        return Err(RobotError::InvalidAddress(trimmed.to_string()));
    }
    match Host::parse(trimmed) {
        Ok(_) => Ok(trimmed.to_string()),
        Err(_) => Err(RobotError::InvalidAddress(trimmed.to_string())),
    }
}
