//! Prelude module for convenient imports
//!
//! Import everything you need with:
//! ```rust
//! use feynman::prelude::*;
//! ```

pub use crate::{
    render_view, AttachmentRef, ChatBackend, ChatMode, ChatSession, Conversation,
    InMemorySessionStore, HttpChatClient, Message, MessageKind, SessionError, SessionStore,
    StreamError, StreamEvent, StreamOutcome, StreamReport,
};
