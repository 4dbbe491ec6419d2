use super::response::{ApiResponse, GenerationResult};
use crate::{
    Error, Result,
    config::ApiConfig,
    photo::{NORMALIZED_CONTENT_TYPE, NormalizedImage},
};
use async_trait::async_trait;
use reqwest::{StatusCode, multipart};
use std::time::Duration;
use tracing::{debug, warn};

/// The remote avatar service.
#[async_trait]
pub trait AvatarApi: Send + Sync {
    /// Posts the image and decodes the JSON answer. Any status other than
    /// 200 is returned as [`Error::Server`].
    async fn generate(&self, image: NormalizedImage) -> Result<GenerationResult>;

    /// Downloads the bytes behind an output image URL.
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct HttpAvatarApi {
    client: reqwest::Client,
    url: String,
    generate_timeout: Option<Duration>,
    fetch_timeout: Option<Duration>,
}

impl HttpAvatarApi {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.url.clone(),
            generate_timeout: config.generate_timeout(),
            fetch_timeout: config.fetch_timeout(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn map_request_error(e: reqwest::Error, url: &str, timeout: Option<Duration>) -> Error {
    match timeout {
        Some(limit) if e.is_timeout() => Error::Timeout {
            url: url.to_string(),
            secs: limit.as_secs(),
        },
        _ => Error::Network(e),
    }
}

#[async_trait]
impl AvatarApi for HttpAvatarApi {
    async fn generate(&self, image: NormalizedImage) -> Result<GenerationResult> {
        debug!(
            "Posting {} ({}x{}, {} bytes) to {}",
            image.filename,
            image.width,
            image.height,
            image.bytes.len(),
            self.url
        );

        let part = multipart::Part::bytes(image.bytes)
            .file_name(image.filename)
            .mime_str(NORMALIZED_CONTENT_TYPE)?;
        let form = multipart::Form::new().part("image", part);

        let mut request = self.client.post(&self.url).multipart(form);
        if let Some(timeout) = self.generate_timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_request_error(e, &self.url, self.generate_timeout))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| map_request_error(e, &self.url, self.generate_timeout))?;

        if status != StatusCode::OK {
            warn!("Avatar API returned {}: {}", status.as_u16(), body);
            return Err(Error::Server {
                status: status.as_u16(),
                body,
            });
        }

        let result = ApiResponse::from_json(&body)?.into_result();
        debug!("Avatar API returned output image {:?}", result.output_image_url);
        Ok(result)
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        debug!("Fetching generated image from {}", url);

        let mut request = self.client.get(url);
        if let Some(timeout) = self.fetch_timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_request_error(e, url, self.fetch_timeout))?;
        let status = response.status();

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Server {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| map_request_error(e, url, self.fetch_timeout))?;
        Ok(bytes.to_vec())
    }
}
