//! WebSocket connection to a workspace server.
//!
//! DESIGN
//! ======
//! Thin wrapper over a `tokio-tungstenite` stream that speaks the protocol
//! crate's vocabulary: commands go out as JSON text frames, text frames come
//! back as decoded events. Control frames are handled by tungstenite and
//! never surface here.

use futures_util::{SinkExt, StreamExt};
use protocol::{CodecError, Command, Event};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("websocket error: {0}")]
    Ws(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("frame codec failed: {0}")]
    Codec(#[from] CodecError),
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Ws(Box::new(err))
    }
}

pub struct Connection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Connection {
    /// Open a session. The first event the server sends is `init`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Ws`] if the handshake fails.
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let (stream, _response) = connect_async(url).await?;
        info!(url, "connected to workspace");
        Ok(Self { stream })
    }

    /// Send one command.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Codec`] for `Command::Unrecognized` and
    /// [`ClientError::Ws`] if the socket write fails.
    pub async fn send(&mut self, command: &Command) -> Result<(), ClientError> {
        let text = protocol::encode_command(command)?;
        debug!(kind = command.kind(), "send command");
        self.stream.send(Message::Text(text.into())).await?;
        Ok(())
    }

    /// Send raw text, bypassing the codec.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Ws`] if the socket write fails.
    pub async fn send_raw(&mut self, text: &str) -> Result<(), ClientError> {
        self.stream.send(Message::Text(text.to_owned().into())).await?;
        Ok(())
    }

    /// Wait for the next event. `Ok(None)` means the server closed the session.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Ws`] on socket errors and [`ClientError::Codec`]
    /// if the server sends a frame that does not decode.
    pub async fn next_event(&mut self) -> Result<Option<Event>, ClientError> {
        while let Some(msg) = self.stream.next().await {
            match msg? {
                Message::Text(text) => return Ok(Some(protocol::decode_event(text.as_str())?)),
                Message::Close(_) => return Ok(None),
                _ => {}
            }
        }
        Ok(None)
    }

    /// Close the session cleanly.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Ws`] if the close handshake cannot be sent.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.stream.close(None).await?;
        Ok(())
    }
}
