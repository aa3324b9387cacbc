//! # Feynman
//!
//! Client core for a streaming tutoring chat service: it sends a message,
//! reads the reply as it is generated and keeps the conversation list and
//! the open conversation up to date frame by frame.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use feynman::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = Arc::new(
//!         HttpChatClient::builder("http://localhost:8000")
//!             .session_cookie("session=...")
//!             .build()?,
//!     );
//!     let store = Arc::new(InMemorySessionStore::new());
//!     let session = ChatSession::new(client, store.clone());
//!
//!     // Watch the reply grow while it streams
//!     let mut updates = store.subscribe();
//!     tokio::spawn(async move {
//!         while updates.changed().await.is_ok() {
//!             let snapshot = updates.borrow_and_update().clone();
//!             if let Some(reply) = snapshot.active.as_ref().and_then(|c| c.streaming_message()) {
//!                 println!("{}", render_view(&reply.content));
//!             }
//!         }
//!     });
//!
//!     let report = session.submit("Explain entropy", Vec::new()).await?;
//!     println!("{:?}: {}", report.outcome, report.content);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`feynman-types`**: conversations, messages, stream events, thread listings
//! - **`feynman-stream`**: line buffering, `data:` frame decoding, control-frame
//!   classification and the HTTP backend
//! - **`feynman-session`**: session store, reply accumulation, thread renames and
//!   the reconciler that drives a reply from placeholder to final text
//!
//! ## Wire format
//!
//! Replies arrive as newline-separated `data: <payload>` lines. A payload is
//! either a text delta, appended verbatim, or a control frame such as
//! `__THREAD_UPDATE__{"thread_id": "...", "thread_name": "..."}` which renames
//! a conversation and never shows up in the reply text. The reply is complete
//! when the connection closes.
//!
//! ## License
//!
//! MIT

pub mod prelude;

pub use feynman_types::{
    client_thread_id, normalize_history, AttachmentRef, ChatMode, Conversation,
    ConversationHandle, LectureTranscript, Message, MessageId, MessageKind, StreamEvent,
    ThreadHistory, ThreadRenameNotice, ThreadSummary,
};

pub use feynman_stream::{
    frame_payload, read_frames, ChatBackend, ControlFrameParser, FrameClassifier, FrameDecoder,
    FrameStream, HttpChatClient, HttpChatClientBuilder, SentinelClassifier, StreamError,
    StreamRequest, ThreadUpdateParser, DATA_PREFIX, THREAD_UPDATE_SENTINEL,
};

pub use feynman_session::{
    apply_thread_rename, has_open_fence, render_view, visible_prefix, ChatOptions, ChatSession,
    InMemorySessionStore, MessageAccumulator, Reconciler, SessionError, SessionSnapshot,
    SessionStore, StreamOutcome, StreamPhase, StreamReport, MAX_ATTACHMENTS,
    PROCESSING_PLACEHOLDER, STREAM_ERROR_NOTICE,
};
