use std::sync::{PoisonError, RwLock};
use tokio::sync::watch;

use std::collections::HashSet;

use feynman_types::{Conversation, ConversationHandle, ThreadSummary};

/// Everything the UI renders: the sidebar list, the open conversation and
/// the global loading flag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub conversations: Vec<Conversation>,
    pub active: Option<Conversation>,
    pub is_loading: bool,
}

impl SessionSnapshot {
    pub fn conversation(&self, handle: ConversationHandle) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.handle == handle)
    }

    pub fn conversation_by_id(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    /// Fold a server thread listing into the conversation list.
    ///
    /// Local-only conversations stay at the top, followed by the server
    /// threads in server order. Conversations already present keep their
    /// handle and messages and take the server title.
    fn merge_threads(&mut self, threads: Vec<ThreadSummary>) {
        let server_ids: HashSet<&str> = threads.iter().map(|t| t.thread_id.as_str()).collect();
        let (mut merged, mut known): (Vec<Conversation>, Vec<Conversation>) = self
            .conversations
            .drain(..)
            .partition(|c| !server_ids.contains(c.id.as_str()));

        for thread in threads {
            match known.iter().position(|c| c.id == thread.thread_id) {
                Some(index) => {
                    let mut local = known.swap_remove(index);
                    local.title = thread.thread_name;
                    merged.push(local);
                }
                None => merged.push(Conversation::from(thread)),
            }
        }
        self.conversations = merged;

        if let Some(handle) = self.active.as_ref().map(|a| a.handle) {
            if let Some(listed) = self.conversation(handle).cloned() {
                self.active = Some(listed);
            }
        }
    }

    fn is_active(&self, handle: ConversationHandle) -> bool {
        self.active.as_ref().is_some_and(|a| a.handle == handle)
    }

    /// Apply `apply` to the conversation in the list and mirror the result
    /// into the active view, so both always hold the same value.
    fn modify(&mut self, handle: ConversationHandle, apply: &mut dyn FnMut(&mut Conversation)) -> bool {
        let mirror_active = self.is_active(handle);

        if let Some(conv) = self.conversations.iter_mut().find(|c| c.handle == handle) {
            apply(conv);
            if mirror_active {
                self.active = Some(conv.clone());
            }
            return true;
        }

        match self.active.as_mut() {
            Some(active) if active.handle == handle => {
                apply(active);
                true
            }
            _ => false,
        }
    }
}

/// Owner of the session state the streaming core reads and writes.
///
/// Every mutation updates the conversation list and the active view in one
/// step; observers never see one updated without the other.
pub trait SessionStore: Send + Sync {
    fn get_conversation(&self, handle: ConversationHandle) -> Option<Conversation>;

    fn find_conversation(&self, id: &str) -> Option<Conversation>;

    /// Replace the conversation with the same handle, or prepend it to the list
    fn upsert_conversation(&self, conversation: Conversation);

    /// Mutate one conversation in place; false if the handle is unknown
    fn update_conversation(
        &self,
        handle: ConversationHandle,
        apply: &mut dyn FnMut(&mut Conversation),
    ) -> bool;

    /// Set the title of the conversation whose id is `id`
    fn rename_conversation(&self, id: &str, title: &str) -> bool;

    /// Give a conversation a new id without touching anything else about it
    fn rebind_conversation(&self, handle: ConversationHandle, new_id: &str) -> bool {
        self.update_conversation(handle, &mut |conv| conv.id = new_id.to_string())
    }

    fn remove_conversation(&self, id: &str) -> Option<Conversation>;

    /// Merge a server thread listing into the list in one step, so writes
    /// to streaming replies are never overwritten by a stale copy. Returns
    /// the resulting number of conversations.
    fn merge_threads(&self, threads: Vec<ThreadSummary>) -> usize;

    /// Make a listed conversation active, or clear the active view with None
    fn set_active(&self, handle: Option<ConversationHandle>) -> Option<Conversation>;

    fn active(&self) -> Option<Conversation>;

    fn set_loading(&self, loading: bool);

    fn is_loading(&self) -> bool;

    fn snapshot(&self) -> SessionSnapshot;
}

/// In-process store publishing a snapshot after every mutation
pub struct InMemorySessionStore {
    state: RwLock<SessionSnapshot>,
    publisher: watch::Sender<SessionSnapshot>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        let (publisher, _) = watch::channel(SessionSnapshot::default());
        Self {
            state: RwLock::new(SessionSnapshot::default()),
            publisher,
        }
    }

    /// Receiver that sees the state after each mutation
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.publisher.subscribe()
    }

    fn read<R>(&self, f: impl FnOnce(&SessionSnapshot) -> R) -> R {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    // Publishing happens under the write lock so snapshots go out in order
    fn write<R>(&self, f: impl FnOnce(&mut SessionSnapshot) -> R) -> R {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let result = f(&mut guard);
        self.publisher.send_replace(guard.clone());
        result
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get_conversation(&self, handle: ConversationHandle) -> Option<Conversation> {
        self.read(|s| {
            s.conversation(handle)
                .or_else(|| s.active.as_ref().filter(|a| a.handle == handle))
                .cloned()
        })
    }

    fn find_conversation(&self, id: &str) -> Option<Conversation> {
        self.read(|s| s.conversation_by_id(id).cloned())
    }

    fn upsert_conversation(&self, conversation: Conversation) {
        self.write(|s| {
            if s.is_active(conversation.handle) {
                s.active = Some(conversation.clone());
            }
            match s.conversations.iter_mut().find(|c| c.handle == conversation.handle) {
                Some(existing) => *existing = conversation,
                None => s.conversations.insert(0, conversation),
            }
        })
    }

    fn update_conversation(
        &self,
        handle: ConversationHandle,
        apply: &mut dyn FnMut(&mut Conversation),
    ) -> bool {
        self.write(|s| s.modify(handle, apply))
    }

    fn rename_conversation(&self, id: &str, title: &str) -> bool {
        self.write(|s| {
            let handle = s
                .conversation_by_id(id)
                .or_else(|| s.active.as_ref().filter(|a| a.id == id))
                .map(|c| c.handle);
            match handle {
                Some(handle) => s.modify(handle, &mut |conv| {
                    conv.title = title.to_string();
                    conv.touch();
                }),
                None => false,
            }
        })
    }

    fn remove_conversation(&self, id: &str) -> Option<Conversation> {
        self.write(|s| {
            let index = s.conversations.iter().position(|c| c.id == id);
            let removed = index.map(|i| s.conversations.remove(i));
            if s.active.as_ref().is_some_and(|a| a.id == id) {
                let active = s.active.take();
                return removed.or(active);
            }
            removed
        })
    }

    fn merge_threads(&self, threads: Vec<ThreadSummary>) -> usize {
        self.write(|s| {
            s.merge_threads(threads);
            s.conversations.len()
        })
    }

    fn set_active(&self, handle: Option<ConversationHandle>) -> Option<Conversation> {
        self.write(|s| {
            s.active = handle.and_then(|h| s.conversation(h).cloned());
            s.active.clone()
        })
    }

    fn active(&self) -> Option<Conversation> {
        self.read(|s| s.active.clone())
    }

    fn set_loading(&self, loading: bool) {
        self.write(|s| s.is_loading = loading)
    }

    fn is_loading(&self) -> bool {
        self.read(|s| s.is_loading)
    }

    fn snapshot(&self) -> SessionSnapshot {
        self.read(Clone::clone)
    }
}
