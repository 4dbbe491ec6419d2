use facematch_avatar::{
    config::{ApiConfig, Config, ImageConfig},
    flow::GenerationResult,
};
use image::{DynamicImage, ImageBuffer, ImageFormat, LumaA, Rgb, Rgba};
use std::io::Cursor;

/// Create a test configuration pointing at `api_url`
pub fn create_test_config(api_url: &str) -> Config {
    Config {
        api: ApiConfig {
            url: api_url.to_string(),
            generate_timeout_secs: Some(5),
            fetch_timeout_secs: Some(5),
        },
        ..Config::default()
    }
}

pub fn image_config() -> ImageConfig {
    ImageConfig::default()
}

fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, format)
        .expect("Failed to encode fixture image");
    buffer.into_inner()
}

/// Semi-transparent RGBA PNG
pub fn png_rgba(width: u32, height: u32) -> Vec<u8> {
    let image = ImageBuffer::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 100])
    });
    encode(DynamicImage::ImageRgba8(image), ImageFormat::Png)
}

/// Grayscale-with-alpha PNG
pub fn png_luma_alpha(width: u32, height: u32) -> Vec<u8> {
    let image = ImageBuffer::from_fn(width, height, |x, _| LumaA([(x % 256) as u8, 200]));
    encode(DynamicImage::ImageLumaA8(image), ImageFormat::Png)
}

pub fn jpeg_rgb(width: u32, height: u32) -> Vec<u8> {
    let image = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 64])
    });
    encode(DynamicImage::ImageRgb8(image), ImageFormat::Jpeg)
}

pub fn full_result() -> GenerationResult {
    GenerationResult {
        input_image_url: Some("https://cdn.example.com/input/me.jpg".to_string()),
        output_image_url: Some("https://cdn.example.com/output/me.png".to_string()),
        description: "A cheerful person with curly hair".to_string(),
        chinese_description: "一个卷发的开朗的人".to_string(),
    }
}
