use async_trait::async_trait;
use soletrando_core::{decode, ActionReply, GameAction, GameState, RobotAction, STATE_PATH};
use tracing::debug;
use url::Url;

use crate::config::BackendEndpoints;
use crate::error::TransportError;

/// Request/response side of the backend.
#[async_trait]
pub trait GameApi: Send + Sync + 'static {
    async fn fetch_state(&self) -> Result<GameState, TransportError>;

    async fn send_action(&self, action: &GameAction) -> Result<ActionReply, TransportError>;

    async fn send_robot(&self, action: &RobotAction) -> Result<ActionReply, TransportError>;
}

#[derive(Debug, Clone)]
pub struct HttpGameApi {
    client: reqwest::Client,
    endpoints: BackendEndpoints,
}

impl HttpGameApi {
    pub fn new(endpoints: BackendEndpoints) -> Self {
        Self::with_client(reqwest::Client::new(), endpoints)
    }

    pub fn with_client(client: reqwest::Client, endpoints: BackendEndpoints) -> Self {
        Self { client, endpoints }
    }

    async fn post(
        &self,
        path: &'static str,
        query: Option<(&'static str, String)>,
    ) -> Result<ActionReply, TransportError> {
        let url = post_url(&self.endpoints, path, query);
        debug!(%url, "posting");
        let response = self.client.post(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                path,
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        Ok(decode::<ActionReply>(&body).unwrap_or_default())
    }
}

/// Parameters travel as query pairs with an empty body.
fn post_url(endpoints: &BackendEndpoints, path: &str, query: Option<(&str, String)>) -> Url {
    let mut url = endpoints.http_url(path);
    if let Some((key, value)) = query {
        url.query_pairs_mut().append_pair(key, &value);
    }
    url
}

#[async_trait]
impl GameApi for HttpGameApi {
    async fn fetch_state(&self) -> Result<GameState, TransportError> {
        let response = self.client.get(self.endpoints.state_url()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                path: STATE_PATH,
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        decode::<GameState>(&body).ok_or(TransportError::Malformed(STATE_PATH))
    }

    async fn send_action(&self, action: &GameAction) -> Result<ActionReply, TransportError> {
        self.post(action.path(), action.query()).await
    }

    async fn send_robot(&self, action: &RobotAction) -> Result<ActionReply, TransportError> {
        self.post(action.path(), action.query()).await
    }
}
