//! Core types for the Feynman chat client.
//!
//! Conversations, messages and the decoded stream events that mutate them.
//! These types are shared by the stream decoder, the session store and
//! anything rendering the conversation state.

pub mod conversation;
pub mod events;
pub mod history;
pub mod message;
pub mod thread;

pub use conversation::{client_thread_id, Conversation, ConversationHandle};
pub use events::{StreamEvent, ThreadRenameNotice};
pub use history::{normalize_history, ThreadHistory};
pub use message::{AttachmentRef, Message, MessageId, MessageKind};
pub use thread::{ChatMode, LectureTranscript, ThreadSummary};
