use brokerdesk_core::{LiveError, LiveMessage};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// One WebSocket subscription to a live endpoint.
pub struct WsChannel {
    url: String,
    stream: WsStream,
}

impl WsChannel {
    pub async fn connect(url: &str) -> Result<Self, LiveError> {
        debug!(url, "Connecting WebSocket");
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| LiveError::Connect(e.to_string()))?;
        info!(url, "WebSocket connected");
        Ok(Self {
            url: url.to_string(),
            stream,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Wait for the next message this client understands.
    ///
    /// Frames of unknown type and frames that fail to parse are skipped. An
    /// error means the connection is gone and the channel must be dropped.
    pub async fn next_message(&mut self) -> Result<LiveMessage, LiveError> {
        loop {
            let frame = match self.stream.next().await {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => return Err(LiveError::Closed(e.to_string())),
                None => return Err(LiveError::Closed("stream ended".to_string())),
            };

            let text = match frame {
                Message::Text(text) => text,
                Message::Binary(data) => match String::from_utf8(data) {
                    Ok(text) => text,
                    Err(_) => {
                        debug!(url = %self.url, "Skipping non-UTF-8 binary frame");
                        continue;
                    }
                },
                Message::Ping(_) => {
                    // tungstenite queues the pong itself; flush sends it now
                    if let Err(e) = self.stream.flush().await {
                        return Err(LiveError::Closed(e.to_string()));
                    }
                    continue;
                }
                Message::Pong(_) | Message::Frame(_) => continue,
                Message::Close(frame) => {
                    let reason = frame
                        .map(|f| f.reason.to_string())
                        .filter(|r| !r.is_empty())
                        .unwrap_or_else(|| "closed by server".to_string());
                    info!(url = %self.url, %reason, "WebSocket closed");
                    return Err(LiveError::Closed(reason));
                }
            };

            match LiveMessage::parse(&text) {
                Ok(Some(message)) => return Ok(message),
                Ok(None) => debug!(url = %self.url, "Ignoring message of unknown type"),
                Err(e) => warn!(url = %self.url, error = %e, "Malformed live message"),
            }
        }
    }

    /// Send a close frame. Errors are irrelevant at this point.
    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
        debug!(url = %self.url, "WebSocket closed by client");
    }
}
