//! Server-sent events decoding shared by the HTTP providers.
//!
//! Framing is done by `eventsource_stream` on the raw response body.
//! [`pump`] drives the resulting events through a provider-specific decoder
//! and forwards the result as [`StreamEvent`]s.

use chorus_domain::{Model, StreamEvent};
use eventsource_stream::{Event, EventStreamError};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// One complete event from the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseEvent {
    /// Value of the `event:` field, if the server named the event.
    pub event: Option<String>,
    /// `data:` lines joined with `\n`.
    pub data: String,
}

impl From<Event> for SseEvent {
    fn from(event: Event) -> Self {
        // Unnamed events come back as "message".
        let name = match event.event.as_str() {
            "" | "message" => None,
            _ => Some(event.event),
        };
        Self {
            event: name,
            data: event.data,
        }
    }
}

/// What a provider decoder made of one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseStep {
    Delta(String),
    /// Keep-alives, metadata and other events without text.
    Skip,
    /// The provider signalled the end of the answer.
    Done,
    /// The provider reported an error inside the stream.
    Fail(String),
}

/// Forward an event stream to `tx`, decoding each event with `decode`.
///
/// `events` is a response body wrapped with
/// [`Eventsource::eventsource`](eventsource_stream::Eventsource::eventsource).
/// A decoder error or a malformed frame is a bad individual delta: it is
/// logged and skipped. A transport error ends the stream. The stream ends
/// with exactly one terminal event unless the receiver went away first.
pub async fn pump<S, E, F>(model: Model, events: S, tx: mpsc::Sender<StreamEvent>, mut decode: F)
where
    S: Stream<Item = Result<Event, EventStreamError<E>>>,
    E: std::fmt::Display,
    F: FnMut(&SseEvent) -> Result<SseStep, String>,
{
    let mut events = Box::pin(events);

    while let Some(item) = events.next().await {
        let event = match item {
            Ok(event) => SseEvent::from(event),
            Err(EventStreamError::Transport(e)) => {
                let _ = tx
                    .send(StreamEvent::Error(format!("Stream interrupted: {}", e)))
                    .await;
                return;
            }
            Err(e) => {
                warn!("Skipping malformed event from {}: {}", model, e);
                continue;
            }
        };
        if let Flow::Stop = forward(&model, &event, &tx, &mut decode).await {
            return;
        }
    }

    debug!("{} stream closed without an end event", model);
    let _ = tx.send(StreamEvent::Completed).await;
}

enum Flow {
    Continue,
    Stop,
}

async fn forward<F>(
    model: &Model,
    event: &SseEvent,
    tx: &mpsc::Sender<StreamEvent>,
    decode: &mut F,
) -> Flow
where
    F: FnMut(&SseEvent) -> Result<SseStep, String>,
{
    let step = match decode(event) {
        Ok(step) => step,
        Err(e) => {
            warn!("Skipping undecodable chunk from {}: {}", model, e);
            return Flow::Continue;
        }
    };
    let outgoing = match step {
        SseStep::Skip => return Flow::Continue,
        SseStep::Delta(text) => StreamEvent::Delta(text),
        SseStep::Done => StreamEvent::Completed,
        SseStep::Fail(message) => StreamEvent::Error(message),
    };
    let terminal = outgoing.is_terminal();
    if tx.send(outgoing).await.is_err() {
        debug!("Receiver for {} dropped; abandoning stream", model);
        return Flow::Stop;
    }
    if terminal { Flow::Stop } else { Flow::Continue }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventsource_stream::Eventsource;
    use futures::stream;

    fn decode_plain(event: &SseEvent) -> Result<SseStep, String> {
        match event.data.as_str() {
            "[DONE]" => Ok(SseStep::Done),
            "bad" => Err("not json".to_string()),
            "boom" => Ok(SseStep::Fail("overloaded".to_string())),
            text => Ok(SseStep::Delta(text.to_string())),
        }
    }

    async fn run(chunks: Vec<Result<&'static [u8], String>>) -> Vec<StreamEvent> {
        let (tx, mut rx) = mpsc::channel(16);
        let body = stream::iter(chunks).eventsource();
        pump(Model::Gpt4o, body, tx, decode_plain).await;
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    fn text(chunk: &'static str) -> Result<&'static [u8], String> {
        Ok(chunk.as_bytes())
    }

    #[tokio::test]
    async fn test_events_split_across_chunks() {
        let events = run(vec![text("data: {\"a\""), text(":1}\n\ndata: [DO"), text("NE]\n\n")]).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("{\"a\":1}".to_string()),
                StreamEvent::Completed,
            ]
        );
    }

    #[tokio::test]
    async fn test_multibyte_text_split_across_chunks() {
        let raw = "data: こんにちは\n\n".as_bytes();
        // Byte 7 falls inside the first character.
        let events = run(vec![Ok(&raw[..7]), Ok(&raw[7..])]).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("こんにちは".to_string()),
                StreamEvent::Completed,
            ]
        );
    }

    #[tokio::test]
    async fn test_crlf_blank_line_split_across_chunks() {
        let events = run(vec![text("data: x\r\n\r"), text("\ndata: y\r\n\r\n")]).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("x".to_string()),
                StreamEvent::Delta("y".to_string()),
                StreamEvent::Completed,
            ]
        );
    }

    #[tokio::test]
    async fn test_named_events_and_comments() {
        let (tx, _rx) = mpsc::channel(16);
        let body = stream::iter(vec![text(": keep-alive\n\nevent: ping\ndata: {}\r\n\r\ndata: plain\n\n")])
            .eventsource();
        let mut seen = Vec::new();
        pump(Model::Gpt4o, body, tx, |event: &SseEvent| {
            seen.push(event.clone());
            Ok(SseStep::Skip)
        })
        .await;

        let named: Vec<&SseEvent> = seen.iter().filter(|e| !e.data.is_empty()).collect();
        assert_eq!(
            named,
            vec![
                &SseEvent {
                    event: Some("ping".to_string()),
                    data: "{}".to_string()
                },
                &SseEvent {
                    event: None,
                    data: "plain".to_string()
                },
            ]
        );
        assert!(seen.iter().all(|e| !e.data.contains("keep-alive")));
    }

    #[tokio::test]
    async fn test_bad_delta_is_skipped_not_fatal() {
        let events = run(vec![text("data: a\n\ndata: bad\n\ndata: b\n\ndata: [DONE]\n\n")]).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("a".to_string()),
                StreamEvent::Delta("b".to_string()),
                StreamEvent::Completed,
            ]
        );
    }

    #[tokio::test]
    async fn test_in_band_error_ends_stream() {
        let events = run(vec![text("data: a\n\ndata: boom\n\ndata: never\n\n")]).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("a".to_string()),
                StreamEvent::Error("overloaded".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_transport_error_becomes_terminal_error() {
        let events = run(vec![text("data: a\n\n"), Err("reset".to_string())]).await;
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], StreamEvent::Error(m) if m.contains("reset")));
    }

    #[tokio::test]
    async fn test_missing_done_still_completes() {
        let events = run(vec![text("data: a\n\n")]).await;
        assert_eq!(events.last(), Some(&StreamEvent::Completed));
    }
}
