//! Transport seam between the reconnect loop and the WebSocket

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::{ClientError, ClientResult};

/// Inbound frame as seen by the subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    /// Peer closed, with its close code if it sent one
    Close(Option<u16>),
}

/// One open push connection
#[async_trait]
pub trait PushConnection: Send {
    /// Next inbound frame, `None` once the transport is gone
    async fn recv(&mut self) -> Option<ClientResult<Frame>>;

    /// Send a close frame with `code`
    async fn close(&mut self, code: u16) -> ClientResult<()>;
}

/// Opens push connections
#[async_trait]
pub trait PushConnector: Send + Sync + 'static {
    async fn connect(&self) -> ClientResult<Box<dyn PushConnection>>;
}

/// tokio-tungstenite connector for `ws://` / `wss://` URLs
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
    connect_timeout: Option<Duration>,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: None,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[async_trait]
impl PushConnector for WsConnector {
    async fn connect(&self) -> ClientResult<Box<dyn PushConnection>> {
        let handshake = tokio_tungstenite::connect_async(self.url.as_str());
        let (stream, _response) = match self.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, handshake)
                .await
                .map_err(|_| ClientError::ConnectTimeout(limit))??,
            None => handshake.await?,
        };
        tracing::debug!(url = %self.url, "Push channel handshake complete");
        Ok(Box::new(WsConnection { stream }))
    }
}

struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl PushConnection for WsConnection {
    async fn recv(&mut self) -> Option<ClientResult<Frame>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(Frame::Text(text.as_str().to_owned()))),
                Ok(Message::Close(frame)) => {
                    return Some(Ok(Frame::Close(frame.map(|f| u16::from(f.code)))));
                }
                // Ping is answered by tungstenite; Binary, Pong are ignored
                Ok(_) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
    }

    async fn close(&mut self, code: u16) -> ClientResult<()> {
        self.stream
            .close(Some(CloseFrame {
                code: CloseCode::from(code),
                reason: "client shutdown".into(),
            }))
            .await?;
        Ok(())
    }
}
