use async_trait::async_trait;
use facematch_avatar::{
    Error, Result,
    flow::{AvatarApi, GenerationResult},
    photo::NormalizedImage,
};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum GenerateReply {
    Success(GenerationResult),
    Status(u16, String),
    Failure(String),
}

#[derive(Debug, Clone)]
pub enum FetchReply {
    Bytes(Vec<u8>),
    Status(u16),
    Failure(String),
}

/// Mock avatar endpoint for testing
#[derive(Debug)]
pub struct MockAvatarApi {
    pub generate_reply: Mutex<GenerateReply>,
    pub fetch_reply: Mutex<FetchReply>,
    pub generate_calls: Arc<Mutex<Vec<NormalizedImage>>>,
    pub fetch_calls: Arc<Mutex<Vec<String>>>,
}

impl MockAvatarApi {
    pub fn new() -> Self {
        Self {
            generate_reply: Mutex::new(GenerateReply::Failure(
                "No mock reply configured".to_string(),
            )),
            fetch_reply: Mutex::new(FetchReply::Status(404)),
            generate_calls: Arc::new(Mutex::new(Vec::new())),
            fetch_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_generate(self, reply: GenerateReply) -> Self {
        *self.generate_reply.lock().unwrap() = reply;
        self
    }

    pub fn with_fetch(self, reply: FetchReply) -> Self {
        *self.fetch_reply.lock().unwrap() = reply;
        self
    }

    pub fn generate_count(&self) -> usize {
        self.generate_calls.lock().unwrap().len()
    }

    pub fn fetched_urls(&self) -> Vec<String> {
        self.fetch_calls.lock().unwrap().clone()
    }
}

impl Default for MockAvatarApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AvatarApi for MockAvatarApi {
    async fn generate(&self, image: NormalizedImage) -> Result<GenerationResult> {
        self.generate_calls.lock().unwrap().push(image);

        match self.generate_reply.lock().unwrap().clone() {
            GenerateReply::Success(result) => Ok(result),
            GenerateReply::Status(status, body) => Err(Error::Server { status, body }),
            GenerateReply::Failure(message) => Err(Error::internal(message)),
        }
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        self.fetch_calls.lock().unwrap().push(url.to_string());

        match self.fetch_reply.lock().unwrap().clone() {
            FetchReply::Bytes(bytes) => Ok(bytes),
            FetchReply::Status(status) => Err(Error::Server {
                status,
                body: String::new(),
            }),
            FetchReply::Failure(message) => Err(Error::internal(message)),
        }
    }
}
