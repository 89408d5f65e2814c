use futures::StreamExt;
use liveboard_protocol::RoundMessage;
use log::{debug, warn};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("websocket connect failed: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Subscribe to a round's feed.
///
/// Returns the decoded message stream and the reader task. The channel
/// closes when the socket does; reconnecting is the caller's decision.
pub async fn connect(
    url: &str,
) -> Result<(mpsc::UnboundedReceiver<RoundMessage>, JoinHandle<()>), FeedError> {
    let (socket, _) = connect_async(url).await?;
    let (tx, rx) = mpsc::unbounded_channel();

    let reader = tokio::spawn(async move {
        let (_, mut incoming) = socket.split();
        while let Some(frame) = incoming.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<RoundMessage>(&text) {
                        Ok(message) => {
                            if tx.send(message).is_err() {
                                break;
                            }
                        }
                        // The feed multiplexes topics this client does not
                        // track; skip anything that is not a round frame.
                        Err(err) => debug!("skipping frame: {err}"),
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(err) => {
                    warn!("round feed socket error: {err}");
                    break;
                }
            }
        }
    });

    Ok((rx, reader))
}
