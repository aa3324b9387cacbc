pub mod classifier;
pub mod client;
pub mod decoder;
pub mod error;
pub mod reader;
pub mod traits;

pub use classifier::{
    ControlFrameParser, FrameClassifier, SentinelClassifier, ThreadUpdateParser,
    THREAD_UPDATE_SENTINEL,
};
pub use client::{HttpChatClient, HttpChatClientBuilder};
pub use decoder::{frame_payload, FrameDecoder, DATA_PREFIX};
pub use error::{Result, StreamError};
pub use reader::{read_frames, FrameStream};
pub use traits::{ChatBackend, StreamRequest};
