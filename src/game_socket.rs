use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};
use url::Url;

use crate::error::TransportError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens the live connection. Each call is one handshake attempt.
#[async_trait]
pub trait PushConnector: Send + Sync + 'static {
    async fn connect(&self) -> Result<Box<dyn PushStream>, TransportError>;
}

/// An open live connection yielding raw snapshot payloads.
#[async_trait]
pub trait PushStream: Send {
    /// `None` once the server closed the connection.
    async fn next_message(&mut self) -> Option<Result<String, TransportError>>;

    async fn close(&mut self);
}

#[derive(Debug, Clone)]
pub struct WsConnector {
    url: Url,
}

impl WsConnector {
    pub fn new(url: Url) -> Self {
        Self { url }
    }
}

#[async_trait]
impl PushConnector for WsConnector {
    async fn connect(&self) -> Result<Box<dyn PushStream>, TransportError> {
        let (ws, _response) = connect_async(self.url.as_str()).await?;
        info!(url = %self.url, "websocket connected");
        Ok(Box::new(WsPushStream {
            ws,
            url: self.url.clone(),
        }))
    }
}

struct WsPushStream {
    ws: WsStream,
    url: Url,
}

#[async_trait]
impl PushStream for WsPushStream {
    async fn next_message(&mut self) -> Option<Result<String, TransportError>> {
        while let Some(message) = self.ws.next().await {
            let message = match message {
                Ok(message) => message,
                Err(err) => return Some(Err(err.into())),
            };
            match message {
                Message::Text(text) => return Some(Ok(text.as_str().to_string())),
                Message::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => {
                        debug!(url = %self.url, len = bytes.len(), "dropping non-utf8 binary frame");
                    }
                },
                Message::Close(frame) => {
                    match frame {
                        Some(frame) if !frame.reason.is_empty() => info!(
                            url = %self.url,
                            code = u16::from(frame.code),
                            reason = %frame.reason,
                            "websocket closed"
                        ),
                        Some(frame) => {
                            info!(url = %self.url, code = u16::from(frame.code), "websocket closed")
                        }
                        None => info!(url = %self.url, "websocket closed"),
                    }
                    return None;
                }
                _ => {}
            }
        }
        None
    }

    async fn close(&mut self) {
        let _ = self.ws.close(None).await;
    }
}
