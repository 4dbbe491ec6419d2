use base64::{Engine as _, engine::general_purpose};

/// MIME type of every buffer produced by [`super::normalize`].
pub const NORMALIZED_CONTENT_TYPE: &str = "image/jpeg";

/// A file as received from the upload form. Dropped once the flow returns.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    pub fn new(
        filename: impl Into<String>,
        content_type: Option<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type,
            bytes: bytes.into(),
        }
    }
}

/// RGB JPEG ready to be posted to the avatar endpoint.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

/// Output image fetched for display, checked to decode.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl FetchedImage {
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}
