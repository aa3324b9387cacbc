use feynman_types::ThreadRenameNotice;

use crate::store::SessionStore;

/// Apply a thread rename to both session views.
///
/// Only the title changes; the conversation keeps its handle and messages,
/// including a reply that is still streaming. Unknown thread ids are a no-op.
pub fn apply_thread_rename(store: &dyn SessionStore, notice: &ThreadRenameNotice) -> bool {
    let renamed = store.rename_conversation(&notice.thread_id, &notice.thread_name);
    if renamed {
        tracing::info!("Thread {} renamed to {:?}", notice.thread_id, notice.thread_name);
    } else {
        tracing::warn!(
            "Ignoring rename for unknown thread {} ({:?})",
            notice.thread_id,
            notice.thread_name
        );
    }
    renamed
}
