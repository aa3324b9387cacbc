pub mod accumulator;
pub mod chat;
pub mod error;
pub mod reconciler;
pub mod rename;
pub mod store;
pub mod view;

pub use accumulator::MessageAccumulator;
pub use chat::{ChatOptions, ChatSession, MAX_ATTACHMENTS};
pub use error::{Result, SessionError};
pub use reconciler::{Reconciler, StreamOutcome, StreamPhase, StreamReport, STREAM_ERROR_NOTICE};
pub use rename::apply_thread_rename;
pub use store::{InMemorySessionStore, SessionSnapshot, SessionStore};
pub use view::{has_open_fence, render_view, visible_prefix, PROCESSING_PLACEHOLDER};
