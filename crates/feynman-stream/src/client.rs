use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE};
use reqwest::Response;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use feynman_types::{normalize_history, ChatMode, LectureTranscript, Message, ThreadHistory, ThreadSummary};

use crate::classifier::{FrameClassifier, SentinelClassifier};
use crate::error::{Result, StreamError};
use crate::reader::{read_frames, FrameStream};
use crate::traits::{ChatBackend, StreamRequest};

const SIMPLE_CHAT_PATH: &str = "/simplechat";
const FEYNMAN_CHAT_PATH: &str = "/api/feynman";
const THREADS_PATH: &str = "/api/threads";
const THREAD_HISTORY_PATH: &str = "/api/thread_history";
const TRANSCRIPT_PATH: &str = "/lectures/transcript";

/// Backend client over plain HTTP (reqwest)
pub struct HttpChatClient {
    http_client: reqwest::Client,
    base_url: String,
    classifier: Arc<dyn FrameClassifier>,
}

impl HttpChatClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::builder(base_url).build()
    }

    pub fn builder(base_url: impl Into<String>) -> HttpChatClientBuilder {
        HttpChatClientBuilder::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn chat_path(mode: ChatMode) -> &'static str {
        match mode {
            ChatMode::Standard => SIMPLE_CHAT_PATH,
            ChatMode::Feynman => FEYNMAN_CHAT_PATH,
        }
    }

    /// Fail on non-2xx, keeping the body for the log
    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::error!("Backend returned {}: {}", status, body);
        Err(StreamError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ChatBackend for HttpChatClient {
    async fn open_stream(
        &self,
        request: StreamRequest,
        cancel: CancellationToken,
    ) -> Result<FrameStream> {
        let url = self.url(Self::chat_path(request.mode));
        tracing::info!(
            "Opening {:?} stream for thread {}",
            request.mode,
            request.thread_id
        );

        let send = self
            .http_client
            .post(&url)
            .header(ACCEPT, "text/event-stream")
            .form(&request.form_fields())
            .send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StreamError::Cancelled),
            response = send => response?,
        };
        let response = Self::check_status(response).await?;

        Ok(read_frames(
            response.bytes_stream(),
            Arc::clone(&self.classifier),
            cancel,
        ))
    }

    async fn list_threads(&self) -> Result<Vec<ThreadSummary>> {
        let response = self.http_client.get(self.url(THREADS_PATH)).send().await?;
        let threads: Vec<ThreadSummary> = Self::check_status(response).await?.json().await?;
        tracing::debug!("Fetched {} threads", threads.len());
        Ok(threads)
    }

    async fn thread_history(&self, thread_id: &str) -> Result<Vec<Message>> {
        let mut url = reqwest::Url::parse(&self.url(THREAD_HISTORY_PATH))
            .map_err(|e| StreamError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| StreamError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push(thread_id);
        let response = self.http_client.get(url).send().await?;
        let history: ThreadHistory = Self::check_status(response).await?.json().await?;
        let messages = normalize_history(&history.messages);
        tracing::debug!(
            "Thread {} history: {} entries, {} messages",
            thread_id,
            history.messages.len(),
            messages.len()
        );
        Ok(messages)
    }

    async fn import_lecture(&self, lecture_url: &str) -> Result<LectureTranscript> {
        tracing::info!("Importing lecture {}", lecture_url);
        let response = self
            .http_client
            .post(self.url(TRANSCRIPT_PATH))
            .form(&[("lecture_url", lecture_url)])
            .send()
            .await?;
        let transcript: LectureTranscript = Self::check_status(response).await?.json().await?;
        if !transcript.is_success() {
            return Err(StreamError::Rejected(format!(
                "lecture import returned status {:?}",
                transcript.status
            )));
        }
        Ok(transcript)
    }
}

pub struct HttpChatClientBuilder {
    base_url: String,
    session_cookie: Option<String>,
    connect_timeout: Duration,
    classifier: Option<Arc<dyn FrameClassifier>>,
}

impl HttpChatClientBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            session_cookie: None,
            connect_timeout: Duration::from_secs(10),
            classifier: None,
        }
    }

    /// Raw `Cookie` header value carrying the authenticated session
    pub fn session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn classifier(mut self, classifier: Arc<dyn FrameClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn build(self) -> Result<HttpChatClient> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = self.session_cookie.filter(|c| !c.is_empty()) {
            let value = HeaderValue::from_str(&cookie)
                .map_err(|e| StreamError::InvalidHeader(e.to_string()))?;
            headers.insert(COOKIE, value);
        }

        // No overall timeout: response bodies stay open for the whole reply
        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(self.connect_timeout)
            .build()?;

        Ok(HttpChatClient {
            http_client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            classifier: self
                .classifier
                .unwrap_or_else(|| Arc::new(SentinelClassifier::new())),
        })
    }
}
