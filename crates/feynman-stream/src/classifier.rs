use feynman_types::{StreamEvent, ThreadRenameNotice};

use crate::error::{Result, StreamError};

/// Sentinel opening a thread-rename control frame. The JSON body follows
/// immediately, with no separator.
pub const THREAD_UPDATE_SENTINEL: &str = "__THREAD_UPDATE__";

/// Strategy for turning one frame payload into an event
pub trait FrameClassifier: Send + Sync {
    /// Returns None when the frame must be dropped
    fn classify(&self, payload: &str) -> Option<StreamEvent>;
}

/// Parser for one kind of sentinel-prefixed control frame
pub trait ControlFrameParser: Send + Sync {
    fn sentinel(&self) -> &'static str;

    /// Parse the frame body that follows the sentinel
    fn parse(&self, body: &str) -> Result<StreamEvent>;
}

/// `__THREAD_UPDATE__{"thread_id": ..., "thread_name": ...}`
pub struct ThreadUpdateParser;

impl ControlFrameParser for ThreadUpdateParser {
    fn sentinel(&self) -> &'static str {
        THREAD_UPDATE_SENTINEL
    }

    fn parse(&self, body: &str) -> Result<StreamEvent> {
        let notice: ThreadRenameNotice =
            serde_json::from_str(body).map_err(|e| StreamError::ControlFrame {
                sentinel: THREAD_UPDATE_SENTINEL,
                reason: e.to_string(),
            })?;
        Ok(StreamEvent::ThreadRename(notice))
    }
}

/// Prefix-sniffing classifier.
///
/// A payload starting with a registered sentinel is handed to that parser and
/// never treated as content, even when parsing fails. Every other payload is a
/// content delta. New control frames are added with [`with_parser`].
///
/// [`with_parser`]: SentinelClassifier::with_parser
pub struct SentinelClassifier {
    parsers: Vec<Box<dyn ControlFrameParser>>,
}

impl SentinelClassifier {
    /// Classifier knowing the thread-update control frame
    pub fn new() -> Self {
        Self::content_only().with_parser(ThreadUpdateParser)
    }

    /// Classifier treating every payload as content
    pub fn content_only() -> Self {
        Self { parsers: Vec::new() }
    }

    pub fn with_parser(mut self, parser: impl ControlFrameParser + 'static) -> Self {
        self.parsers.push(Box::new(parser));
        self
    }
}

impl Default for SentinelClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClassifier for SentinelClassifier {
    fn classify(&self, payload: &str) -> Option<StreamEvent> {
        for parser in &self.parsers {
            if let Some(body) = payload.strip_prefix(parser.sentinel()) {
                return match parser.parse(body) {
                    Ok(event) => Some(event),
                    Err(e) => {
                        tracing::warn!("Discarding control frame: {}", e);
                        None
                    }
                };
            }
        }

        Some(StreamEvent::Content {
            delta: payload.to_string(),
        })
    }
}
