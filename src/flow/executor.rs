use super::{
    client::AvatarApi,
    fsm::{FlowEvent, FlowStateMachine},
    response::GenerationResult,
    session::SessionState,
};
use crate::{
    Error, Result,
    config::ImageConfig,
    photo::{self, FetchedImage, UploadedImage},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const SUCCESS_MESSAGE: &str = "Image processed successfully!";

/// Inline message shown after an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Self::Success(message) | Self::Error(message) => message,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

#[derive(Debug, Clone)]
pub enum AvatarDisplay {
    Image(FetchedImage),
    Error(String),
}

/// Everything the page shows below the upload form.
#[derive(Debug, Clone, Default)]
pub struct RenderedView {
    pub description: Option<String>,
    pub chinese_description: Option<String>,
    pub avatar: Option<AvatarDisplay>,
}

pub struct AvatarRequestFlow {
    api: Arc<dyn AvatarApi>,
    image_config: ImageConfig,
}

impl AvatarRequestFlow {
    pub fn new(api: Arc<dyn AvatarApi>, image_config: ImageConfig) -> Self {
        Self { api, image_config }
    }

    /// Normalizes and submits `upload`. The session is only written when the
    /// endpoint answers 200 with a JSON body; every failure becomes an error
    /// notice.
    pub async fn generate(
        &self,
        session: &mut SessionState,
        upload: UploadedImage,
    ) -> Result<Notice> {
        let mut fsm = FlowStateMachine::new();
        fsm.transition(FlowEvent::UploadSelected)?;
        fsm.transition(FlowEvent::GenerateRequested)?;

        let filename = upload.filename.clone();
        let notice = match self.process(upload).await {
            Ok(result) => {
                fsm.transition(FlowEvent::ProcessingSucceeded)?;
                session.apply(result);
                info!("Generated avatar for {}", filename);
                Notice::Success(SUCCESS_MESSAGE.to_string())
            }
            Err(e) => {
                fsm.transition(FlowEvent::ProcessingFailed)?;
                warn!("Failed to generate avatar for {}: {}", filename, e);
                Notice::Error(failure_message(&e))
            }
        };

        fsm.transition(FlowEvent::Rendered)?;
        Ok(notice)
    }

    async fn process(&self, upload: UploadedImage) -> Result<GenerationResult> {
        let image_config = self.image_config.clone();
        let normalized =
            tokio::task::spawn_blocking(move || photo::normalize(&upload, &image_config))
                .await
                .map_err(|e| Error::internal(format!("Normalization task failed: {e}")))??;

        self.api.generate(normalized).await
    }

    /// Builds the result blocks for `session`. The output image is fetched
    /// again on every call.
    pub async fn render(&self, session: &SessionState) -> RenderedView {
        let description = Some(session.description.clone()).filter(|d| !d.is_empty());
        let chinese_description =
            Some(session.chinese_description.clone()).filter(|d| !d.is_empty());

        let avatar = match session.output_image_url.as_deref() {
            Some(url) if !url.is_empty() => Some(self.fetch_avatar(url).await),
            _ => None,
        };

        RenderedView {
            description,
            chinese_description,
            avatar,
        }
    }

    async fn fetch_avatar(&self, url: &str) -> AvatarDisplay {
        match self.api.fetch_image(url).await {
            Ok(bytes) => match photo::decode_fetched(bytes) {
                Ok(image) => {
                    debug!(
                        "Loaded generated image {} ({}x{})",
                        url, image.width, image.height
                    );
                    AvatarDisplay::Image(image)
                }
                Err(e) => {
                    error!("Generated image at {} did not decode: {}", url, e);
                    AvatarDisplay::Error(format!("Error displaying generated image: {e}"))
                }
            },
            Err(Error::Server { status, .. }) => {
                warn!("Generated image fetch returned {}", status);
                AvatarDisplay::Error(format!("Failed to load generated image: {status}"))
            }
            Err(e) => {
                error!("Failed to fetch generated image {}: {}", url, e);
                AvatarDisplay::Error(format!("Error displaying generated image: {e}"))
            }
        }
    }
}

fn failure_message(e: &Error) -> String {
    match e {
        Error::Server { .. } => e.to_string(),
        _ => format!("Failed to process image: {e}"),
    }
}
