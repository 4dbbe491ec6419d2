mod normalize;
mod types;

pub use normalize::{decode_fetched, fit_within, normalize, validate_upload};
pub use types::{FetchedImage, NORMALIZED_CONTENT_TYPE, NormalizedImage, UploadedImage};
