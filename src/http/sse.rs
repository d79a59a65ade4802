// src/http/sse.rs

//! Server-Sent-Events framing of orchestrator frames.
//!
//! - progress: unnamed event, `data:` is the bare integer percent
//! - done: `event: done`, `data:` is the certificate JSON
//! - error: `event: error`, `data:` is the reason

use std::convert::Infallible;

use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tracing::error;

use crate::orchestrator::{Frame, FrameReceiver};

/// Payload sent if a certificate cannot be encoded.
const FAILED_PAYLOAD: &str = r#"{"status":"FAILED"}"#;

pub fn frame_event(frame: &Frame) -> Event {
    match frame {
        Frame::Progress(percent) => Event::default().data(percent.to_string()),
        Frame::Done(cert) => {
            let payload = serde_json::to_string(cert).unwrap_or_else(|e| {
                error!(error = %e, "failed to encode certificate; sending FAILED payload");
                FAILED_PAYLOAD.to_string()
            });
            Event::default().event("done").data(payload)
        }
        Frame::Error(reason) => Event::default().event("error").data(reason),
    }
}

/// Stream every frame of a subscription; ends when the job's channel closes.
pub fn frame_stream(rx: FrameReceiver) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = ReceiverStream::new(rx).map(|frame| Ok(frame_event(&frame)));
    Sse::new(events).keep_alive(KeepAlive::default())
}

/// A stream consisting of one frame, e.g. a rejection.
pub fn single_frame(frame: Frame) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    Sse::new(tokio_stream::once(Ok(frame_event(&frame))))
}
