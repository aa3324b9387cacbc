use std::sync::Arc;

use feynman_session::{ChatOptions, ChatSession, InMemorySessionStore};
use feynman_stream::HttpChatClient;

use crate::config::Config;
use crate::error::AppResult;

/// Everything the driver shares between the input loop and the printer task
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<InMemorySessionStore>,
    pub session: Arc<ChatSession>,
}

impl AppState {
    pub fn new(config: Config) -> AppResult<Self> {
        let mut builder = HttpChatClient::builder(&config.server.base_url)
            .connect_timeout(config.server.connect_timeout());
        if let Some(cookie) = &config.session_cookie {
            builder = builder.session_cookie(cookie);
        }
        let client = Arc::new(builder.build()?);

        let store = Arc::new(InMemorySessionStore::new());
        let options = ChatOptions {
            mode: config.chat.mode,
            model: config.chat.model.clone(),
        };
        let session = Arc::new(ChatSession::with_options(client, store.clone(), options));

        Ok(Self {
            config: Arc::new(config),
            store,
            session,
        })
    }
}
