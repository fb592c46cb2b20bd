//! Realtime chat over a WebSocket.
//!
//! Every text frame carries one JSON envelope `{"event": ..., "data": {...}}`.
//! The bearer token travels in an `auth` event sent as the first frame after
//! the handshake, never in the URL. Frames with events this client does not
//! know are skipped.

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat connect failed: {0}")]
    Connect(Box<tokio_tungstenite::tungstenite::Error>),

    #[error("chat socket error: {0}")]
    Socket(Box<tokio_tungstenite::tungstenite::Error>),

    #[error("invalid chat payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// One envelope on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum ChatEvent {
    /// client → server, always first
    Auth { token: String },
    /// client → server
    Message { message: String },
    /// server → client
    Response { message: String },
}

impl ChatEvent {
    fn to_frame(&self) -> Result<Message, ChatError> {
        Ok(Message::Text(serde_json::to_string(self)?.into()))
    }
}

/// Who said a line in the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Bot,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::User => "user",
            Speaker::Bot => "bot",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: Speaker,
    pub text: String,
}

/// Messages of one chat visit, oldest first
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage {
            sender: Speaker::User,
            text: text.into(),
        });
    }

    pub fn push_bot(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage {
            sender: Speaker::Bot,
            text: text.into(),
        });
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

/// Write half of an authenticated chat socket
pub struct ChatSender {
    sink: SplitSink<Socket, Message>,
}

/// Read half of an authenticated chat socket
pub struct ChatReceiver {
    stream: SplitStream<Socket>,
}

/// Open a socket to `url` and authenticate with `token`.
/// Returns once the `auth` frame has been written.
pub async fn connect(url: &str, token: &str) -> Result<(ChatSender, ChatReceiver), ChatError> {
    let (socket, _) = connect_async(url)
        .await
        .map_err(|e| ChatError::Connect(Box::new(e)))?;
    let (mut sink, stream) = socket.split();

    sink.send(
        ChatEvent::Auth {
            token: token.to_string(),
        }
        .to_frame()?,
    )
    .await
    .map_err(|e| ChatError::Connect(Box::new(e)))?;
    info!("Chat connected");

    Ok((ChatSender { sink }, ChatReceiver { stream }))
}

impl ChatSender {
    /// Send one user message. Blank input sends nothing and returns `false`.
    pub async fn send_message(&mut self, text: &str) -> Result<bool, ChatError> {
        if text.trim().is_empty() {
            return Ok(false);
        }
        let frame = ChatEvent::Message {
            message: text.to_string(),
        }
        .to_frame()?;
        self.sink
            .send(frame)
            .await
            .map_err(|e| ChatError::Socket(Box::new(e)))?;
        Ok(true)
    }

    pub async fn close(mut self) -> Result<(), ChatError> {
        debug!("Closing chat");
        match self.sink.close().await {
            Ok(())
            | Err(tokio_tungstenite::tungstenite::Error::ConnectionClosed)
            | Err(tokio_tungstenite::tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(e) => Err(ChatError::Socket(Box::new(e))),
        }
    }
}

impl ChatReceiver {
    /// Wait for the next bot reply. `None` means the server closed the chat.
    pub async fn next_reply(&mut self) -> Option<Result<String, ChatError>> {
        loop {
            let message = match self.stream.next().await? {
                Ok(message) => message,
                Err(tokio_tungstenite::tungstenite::Error::ConnectionClosed) => return None,
                Err(e) => return Some(Err(ChatError::Socket(Box::new(e)))),
            };
            match message {
                Message::Text(text) => match serde_json::from_str::<ChatEvent>(&text) {
                    Ok(ChatEvent::Response { message }) => return Some(Ok(message)),
                    Ok(_) => debug!("Ignoring non-response event"),
                    Err(e) => debug!(error = %e, "Ignoring unrecognised chat frame"),
                },
                Message::Close(_) => return None,
                _ => {}
            }
        }
    }
}
