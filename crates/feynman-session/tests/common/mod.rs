#![allow(dead_code)]

use async_trait::async_trait;
use futures::channel::mpsc::UnboundedReceiver;
use futures::stream;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use feynman_session::{ChatSession, InMemorySessionStore, SessionSnapshot, SessionStore};
use feynman_stream::{
    read_frames, ChatBackend, FrameStream, Result, SentinelClassifier, StreamError, StreamRequest,
};
use feynman_types::{Conversation, ConversationHandle, LectureTranscript, Message, ThreadSummary};

type Interleaved = Box<dyn FnOnce(&InMemorySessionStore) + Send>;

pub type Chunk = std::result::Result<Vec<u8>, String>;

pub enum Reply {
    Chunks(Vec<&'static str>),
    Live(UnboundedReceiver<Chunk>),
    Refused,
}

/// Backend replaying canned replies in order
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Reply>>,
    pub requests: Mutex<Vec<StreamRequest>>,
    pub threads: Mutex<Vec<ThreadSummary>>,
    pub history: Mutex<Vec<Message>>,
}

impl ScriptedBackend {
    pub fn with_replies(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        })
    }

    pub fn requests(&self) -> Vec<StreamRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn open_stream(&self, request: StreamRequest, cancel: CancellationToken) -> Result<FrameStream> {
        self.requests.lock().unwrap().push(request);
        let reply = self.replies.lock().unwrap().pop_front();
        let classifier = Arc::new(SentinelClassifier::new());

        match reply {
            Some(Reply::Chunks(chunks)) => {
                let body: Vec<Chunk> = chunks.into_iter().map(|c| Ok(c.as_bytes().to_vec())).collect();
                Ok(read_frames(stream::iter(body), classifier, cancel))
            }
            Some(Reply::Live(rx)) => Ok(read_frames(rx, classifier, cancel)),
            Some(Reply::Refused) | None => Err(StreamError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            }),
        }
    }

    async fn list_threads(&self) -> Result<Vec<ThreadSummary>> {
        Ok(self.threads.lock().unwrap().clone())
    }

    async fn thread_history(&self, _thread_id: &str) -> Result<Vec<Message>> {
        Ok(self.history.lock().unwrap().clone())
    }

    async fn import_lecture(&self, lecture_url: &str) -> Result<LectureTranscript> {
        Ok(LectureTranscript {
            status: "success".to_string(),
            lecture_url: lecture_url.to_string(),
            transcript: "transcript".to_string(),
        })
    }
}

/// Store wrapper asserting after every write that the active view and the
/// list agree, and recording the streaming content seen at each step
#[derive(Default)]
pub struct CheckingStore {
    inner: InMemorySessionStore,
    pub streaming_contents: Mutex<Vec<String>>,
    interleaved: Mutex<Option<Interleaved>>,
}

impl CheckingStore {
    /// Run `write` once, as if it came from another task, the first time the
    /// list is read or merged
    pub fn interleave(&self, write: impl FnOnce(&InMemorySessionStore) + Send + 'static) {
        *self.interleaved.lock().unwrap() = Some(Box::new(write));
    }

    fn run_interleaved(&self) {
        let write = self.interleaved.lock().unwrap().take();
        if let Some(write) = write {
            write(&self.inner);
        }
    }

    fn check(&self) {
        let snapshot = self.inner.snapshot();
        if let Some(active) = &snapshot.active {
            if let Some(listed) = snapshot.conversation(active.handle) {
                assert_eq!(active, listed, "active view diverged from conversation list");
            }
            if let Some(msg) = active.streaming_message() {
                self.streaming_contents.lock().unwrap().push(msg.content.clone());
            }
        }
        let streaming = snapshot
            .conversations
            .iter()
            .map(|c| c.messages.iter().filter(|m| m.is_streaming).count())
            .max()
            .unwrap_or(0);
        assert!(streaming <= 1, "more than one streaming message in a conversation");
    }
}

impl SessionStore for CheckingStore {
    fn get_conversation(&self, handle: ConversationHandle) -> Option<Conversation> {
        self.inner.get_conversation(handle)
    }

    fn find_conversation(&self, id: &str) -> Option<Conversation> {
        self.inner.find_conversation(id)
    }

    fn upsert_conversation(&self, conversation: Conversation) {
        self.inner.upsert_conversation(conversation);
        self.check();
    }

    fn update_conversation(&self, handle: ConversationHandle, apply: &mut dyn FnMut(&mut Conversation)) -> bool {
        let found = self.inner.update_conversation(handle, apply);
        self.check();
        found
    }

    fn rename_conversation(&self, id: &str, title: &str) -> bool {
        let found = self.inner.rename_conversation(id, title);
        self.check();
        found
    }

    fn remove_conversation(&self, id: &str) -> Option<Conversation> {
        self.inner.remove_conversation(id)
    }

    fn merge_threads(&self, threads: Vec<ThreadSummary>) -> usize {
        self.run_interleaved();
        let total = self.inner.merge_threads(threads);
        self.check();
        total
    }

    fn set_active(&self, handle: Option<ConversationHandle>) -> Option<Conversation> {
        self.inner.set_active(handle)
    }

    fn active(&self) -> Option<Conversation> {
        self.inner.active()
    }

    fn set_loading(&self, loading: bool) {
        self.inner.set_loading(loading)
    }

    fn is_loading(&self) -> bool {
        self.inner.is_loading()
    }

    fn snapshot(&self) -> SessionSnapshot {
        self.run_interleaved();
        self.inner.snapshot()
    }
}

pub fn session(backend: Arc<ScriptedBackend>) -> (ChatSession, Arc<CheckingStore>) {
    let store = Arc::new(CheckingStore::default());
    (ChatSession::new(backend, store.clone()), store)
}

/// Yield to the runtime until `condition` holds
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
