use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use feynman_types::StreamEvent;

use crate::classifier::FrameClassifier;
use crate::decoder::FrameDecoder;
use crate::error::{Result, StreamError};

pub type FrameStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// Turn a chunked response body into classified stream events.
///
/// Events come out in wire order. The stream ends with `StreamEvent::End`
/// when the transport closes, or with a single error when a chunk fails to
/// read or `cancel` fires. Nothing is yielded after the terminal item.
pub fn read_frames<S, B, E>(
    body: S,
    classifier: Arc<dyn FrameClassifier>,
    cancel: CancellationToken,
) -> FrameStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut chunks = Box::pin(body);
        let mut decoder = FrameDecoder::with_capacity(4096);
        let mut frames = 0usize;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                next = chunks.next() => Some(next),
            };

            let next = match next {
                Some(next) => next,
                None => {
                    tracing::debug!("Stream cancelled after {} frames", frames);
                    yield Err(StreamError::Cancelled);
                    return;
                }
            };

            match next {
                Some(Ok(bytes)) => {
                    decoder.extend(bytes.as_ref());

                    while let Some(payload) = decoder.next_frame() {
                        // frames already buffered must not outlive a cancel
                        if cancel.is_cancelled() {
                            tracing::debug!("Stream cancelled after {} frames", frames);
                            yield Err(StreamError::Cancelled);
                            return;
                        }
                        frames += 1;
                        if let Some(event) = classifier.classify(&payload) {
                            yield Ok(event);
                        }
                    }
                }
                Some(Err(e)) => {
                    tracing::error!("Stream read failed after {} frames: {}", frames, e);
                    yield Err(StreamError::Read(e.to_string()));
                    return;
                }
                None => break,
            }
        }

        if cancel.is_cancelled() {
            tracing::debug!("Stream cancelled after {} frames", frames);
            yield Err(StreamError::Cancelled);
            return;
        }

        if let Some(payload) = decoder.finish() {
            frames += 1;
            if let Some(event) = classifier.classify(&payload) {
                yield Ok(event);
            }
        }

        tracing::debug!("Stream closed after {} frames", frames);
        yield Ok(StreamEvent::End);
    })
}
