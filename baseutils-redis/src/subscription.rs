//! Pub/sub subscription handle.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use futures::stream::{BoxStream, StreamExt};

/// A message received on a subscribed channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    channel: String,
    pattern: Option<String>,
    payload: Vec<u8>,
}

impl Message {
    /// Create a message. `pattern` is the matching pattern for
    /// pattern subscriptions.
    pub fn new(
        channel: impl Into<String>,
        pattern: Option<String>,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            channel: channel.into(),
            pattern,
            payload: payload.into(),
        }
    }

    /// Channel the message was published on.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Pattern that matched, for pattern subscriptions.
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    /// Raw payload.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload decoded as UTF-8, if valid.
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}

impl From<redis::Msg> for Message {
    fn from(msg: redis::Msg) -> Self {
        let pattern = if msg.from_pattern() {
            msg.get_pattern::<String>().ok()
        } else {
            None
        };
        Self {
            channel: msg.get_channel_name().to_owned(),
            pattern,
            payload: msg.get_payload_bytes().to_vec(),
        }
    }
}

/// Live subscription returned by [`Redis::subscribe`] and
/// [`Redis::psubscribe`].
///
/// Yields every message received after the subscription was established.
/// Dropping it closes the dedicated pub/sub connection.
///
/// [`Redis::subscribe`]: crate::Redis::subscribe
/// [`Redis::psubscribe`]: crate::Redis::psubscribe
pub struct Subscription {
    messages: BoxStream<'static, Message>,
}

impl Subscription {
    /// Wrap any message stream, e.g. from a custom
    /// [`Connection`](crate::Connection) implementation.
    pub fn from_stream<S>(messages: S) -> Self
    where
        S: Stream<Item = Message> + Send + 'static,
    {
        Self {
            messages: messages.boxed(),
        }
    }

    /// Waits for the next message. `None` once the connection is closed.
    pub async fn next_message(&mut self) -> Option<Message> {
        self.messages.next().await
    }
}

impl Stream for Subscription {
    type Item = Message;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.messages.poll_next_unpin(cx)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
