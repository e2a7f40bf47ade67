//! Stream readers: one thread per inbound connection.
//!
//! A reader loops over a blocking event iterator and publishes each decoded
//! event. It holds no lock while blocked waiting for the next message, only
//! while appending. Readers are never killed: stopping means revoking the
//! publisher, after which the thread exits on its next publish attempt (or
//! when the stream ends). A new reader is always a fresh instance with a
//! fresh publisher.

use std::thread::JoinHandle;

use lichess_client::{ClientError, ClientResult};

use crate::events::InboundEvent;
use crate::queue::{Publisher, StopHandle};

/// Which inbound connection a reader owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamRole {
    Lobby,
    Game,
}

impl std::fmt::Display for StreamRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamRole::Lobby => write!(f, "lobby"),
            StreamRole::Game => write!(f, "game"),
        }
    }
}

pub struct StreamReader {
    role: StreamRole,
    stop: StopHandle<InboundEvent>,
    handle: JoinHandle<()>,
}

impl StreamReader {
    /// Start a reader thread over the given blocking event source.
    pub fn spawn<I>(role: StreamRole, source: I, publisher: Publisher<InboundEvent>) -> std::io::Result<Self>
    where
        I: Iterator<Item = ClientResult<InboundEvent>> + Send + 'static,
    {
        let stop = publisher.stop_handle();
        let handle = std::thread::Builder::new()
            .name(format!("{role}-reader"))
            .spawn(move || run(role, source, publisher))?;
        Ok(Self { role, stop, handle })
    }

    pub fn role(&self) -> StreamRole {
        self.role
    }

    /// Whether the reader thread has exited (stream ended or errored).
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Revoke the reader's publisher. The thread itself may stay blocked on
    /// its iterator until the next message arrives; that message is dropped.
    pub fn stop(&self) {
        self.stop.stop();
    }
}

fn run<I>(role: StreamRole, source: I, publisher: Publisher<InboundEvent>)
where
    I: Iterator<Item = ClientResult<InboundEvent>>,
{
    for item in source {
        match item {
            Ok(event) => {
                if !publisher.publish(event) {
                    tracing::debug!(%role, "reader stopped, dropping late event");
                    return;
                }
            }
            // One bad payload is dropped; the connection is still good.
            Err(ClientError::Decode(e)) => {
                tracing::warn!(%role, error = %e, "skipping malformed event");
            }
            Err(e) => {
                tracing::warn!(%role, error = %e, "stream failed");
                return;
            }
        }
    }
    tracing::info!(%role, "stream ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::EventQueue;
    use lichess_client::LobbyEvent;

    fn lobby_other() -> InboundEvent {
        InboundEvent::Lobby(LobbyEvent::Other)
    }

    #[test]
    fn publishes_all_events_then_finishes() {
        let queue = EventQueue::new();
        let source = vec![Ok(lobby_other()), Ok(lobby_other())].into_iter();
        let reader = StreamReader::spawn(StreamRole::Lobby, source, queue.publisher()).unwrap();
        while !reader.is_finished() {
            std::thread::yield_now();
        }
        assert_eq!(queue.drain().len(), 2);
    }

    #[test]
    fn stops_at_first_transport_error() {
        let queue = EventQueue::new();
        let source = vec![
            Ok(lobby_other()),
            Err(lichess_client::ClientError::Rejected {
                status: 500,
                message: "boom".into(),
            }),
            Ok(lobby_other()),
        ]
        .into_iter();
        let reader = StreamReader::spawn(StreamRole::Lobby, source, queue.publisher()).unwrap();
        while !reader.is_finished() {
            std::thread::yield_now();
        }
        assert_eq!(queue.drain().len(), 1);
    }

    #[test]
    fn decode_errors_are_skipped() {
        let queue = EventQueue::new();
        let bad = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let source = vec![
            Err(lichess_client::ClientError::Decode(bad)),
            Ok(lobby_other()),
        ]
        .into_iter();
        let reader = StreamReader::spawn(StreamRole::Lobby, source, queue.publisher()).unwrap();
        while !reader.is_finished() {
            std::thread::yield_now();
        }
        assert_eq!(queue.drain().len(), 1);
    }

    #[test]
    fn stopped_reader_drops_late_events() {
        let queue = EventQueue::new();
        let (tx, rx) = std::sync::mpsc::channel::<ClientResult<InboundEvent>>();
        let reader =
            StreamReader::spawn(StreamRole::Game, rx.into_iter(), queue.publisher()).unwrap();

        tx.send(Ok(lobby_other())).unwrap();
        // Give the reader time to publish the first event, then revoke.
        while queue.is_empty() {
            std::thread::yield_now();
        }
        reader.stop();
        tx.send(Ok(lobby_other())).unwrap();
        drop(tx);
        while !reader.is_finished() {
            std::thread::yield_now();
        }
        assert_eq!(queue.drain().len(), 1);
    }
}
