use super::types::{FetchedImage, NormalizedImage, UploadedImage};
use crate::{Error, Result, config::ImageConfig};
use image::{ImageEncoder, ImageFormat, codecs::jpeg::JpegEncoder, imageops::FilterType};
use tracing::debug;

const ACCEPTED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/pjpeg", "image/png"];
const ACCEPTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Checks the declared type of an upload. Browsers sometimes send a generic
/// type, in which case the filename extension decides.
pub fn validate_upload(upload: &UploadedImage) -> Result<()> {
    let declared = upload
        .content_type
        .as_deref()
        .map(|ct| ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");

    match declared {
        Some(ct) if ACCEPTED_CONTENT_TYPES.contains(&ct.as_str()) => Ok(()),
        Some(ct) => Err(Error::unsupported_image(ct)),
        None => {
            let extension = upload
                .filename
                .rsplit_once('.')
                .map(|(_, ext)| ext.to_ascii_lowercase())
                .unwrap_or_default();
            if ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
                Ok(())
            } else {
                Err(Error::unsupported_image(format!(
                    "file '{}'",
                    upload.filename
                )))
            }
        }
    }
}

/// Largest size that fits in a `max` x `max` box with the same aspect ratio.
/// Images already inside the box are returned as-is.
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }

    let scale = |short: u32, long: u32| -> u32 {
        let scaled = (u64::from(short) * u64::from(max) + u64::from(long) / 2) / u64::from(long);
        scaled.clamp(1, u64::from(max)) as u32
    };

    if width >= height {
        (max, scale(height, width))
    } else {
        (scale(width, height), max)
    }
}

/// Decodes a JPEG or PNG upload, drops alpha and palette information,
/// shrinks it to fit `max_dimension` and re-encodes it as JPEG.
pub fn normalize(upload: &UploadedImage, config: &ImageConfig) -> Result<NormalizedImage> {
    validate_upload(upload)?;

    let format = image::guess_format(&upload.bytes)?;
    if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
        return Err(Error::unsupported_image(format!(
            "{} content in '{}'",
            format.to_mime_type(),
            upload.filename
        )));
    }

    let decoded = image::load_from_memory_with_format(&upload.bytes, format)?;
    let (source_width, source_height) = (decoded.width(), decoded.height());
    let mut rgb = decoded.to_rgb8();

    let (width, height) = fit_within(source_width, source_height, config.max_dimension);
    if (width, height) != (source_width, source_height) {
        debug!(
            "Downscaling {} from {}x{} to {}x{}",
            upload.filename, source_width, source_height, width, height
        );
        rgb = image::imageops::resize(&rgb, width, height, FilterType::Lanczos3);
    }

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, config.jpeg_quality).write_image(
        rgb.as_raw(),
        width,
        height,
        image::ExtendedColorType::Rgb8,
    )?;

    debug!(
        "Normalized {} to {}x{} JPEG ({} bytes)",
        upload.filename,
        width,
        height,
        bytes.len()
    );

    Ok(NormalizedImage {
        filename: upload.filename.clone(),
        width,
        height,
        bytes,
    })
}

/// Confirms fetched bytes are a decodable image and records its type.
pub fn decode_fetched(bytes: Vec<u8>) -> Result<FetchedImage> {
    let format = image::guess_format(&bytes)?;
    let decoded = image::load_from_memory_with_format(&bytes, format)?;

    Ok(FetchedImage {
        mime_type: format.to_mime_type().to_string(),
        width: decoded.width(),
        height: decoded.height(),
        bytes,
    })
}
