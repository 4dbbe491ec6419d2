use serde::{Deserialize, Deserializer, Serialize};

pub const NO_URL: &str = "No URL available";
pub const NO_DESCRIPTION: &str = "No description available";
pub const NO_TRANSLATION: &str = "No translation available";

/// JSON body returned by the avatar endpoint on success.
///
/// The outer `Option` records whether the key was sent at all, the inner one
/// whether its value was `null`. Only absent keys get fallback text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub output_image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub chinese_description: Option<Option<String>>,
}

// Only called for keys that are in the document, so `null` becomes `Some(None)`.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// An [`ApiResponse`] with fallbacks applied. A `null` URL stays `None` and
/// a `null` text becomes empty, so neither is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub input_image_url: Option<String>,
    pub output_image_url: Option<String>,
    pub description: String,
    pub chinese_description: String,
}

fn url_or_fallback(value: Option<Option<String>>) -> Option<String> {
    value.unwrap_or_else(|| Some(NO_URL.to_string()))
}

fn text_or_fallback(value: Option<Option<String>>, fallback: &str) -> String {
    match value {
        None => fallback.to_string(),
        Some(text) => text.unwrap_or_default(),
    }
}

impl ApiResponse {
    pub fn from_json(body: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    pub fn into_result(self) -> GenerationResult {
        GenerationResult {
            input_image_url: url_or_fallback(self.image_url),
            output_image_url: url_or_fallback(self.output_image_url),
            description: text_or_fallback(self.description, NO_DESCRIPTION),
            chinese_description: text_or_fallback(self.chinese_description, NO_TRANSLATION),
        }
    }
}
