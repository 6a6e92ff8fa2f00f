//! Image encoding: `DynamicImage` → base64 JPEG wrapped in `ImageData`.
//!
//! VLM APIs (OpenAI, Anthropic, Gemini, OpenRouter) accept images as base64
//! data-URIs embedded in the JSON request body. JPEG is chosen over PNG
//! because a 300-DPI textbook page PNG easily exceeds request-size limits;
//! at quality 85 the JPEG is a fraction of the size and printed text stays
//! sharp enough for character-exact transcription. `detail: "high"`
//! instructs GPT-4-class models to use the full image tile budget; without
//! it small print and diacritics are lost.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rasterised page as JPEG bytes at the given quality.
///
/// pdfium bitmaps come back as RGBA; JPEG has no alpha channel, so the
/// image is flattened to RGB first.
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    let mut cursor = Cursor::new(&mut buf);
    let encoder = JpegEncoder::new_with_quality(&mut cursor, quality);
    rgb.write_with_encoder(encoder)?;
    debug!("Encoded page → {} JPEG bytes (q{})", buf.len(), quality);
    Ok(buf)
}

/// Wrap JPEG bytes as a base64 `ImageData` ready for the VLM API.
pub fn to_image_data(jpeg: &[u8]) -> ImageData {
    ImageData::new(STANDARD.encode(jpeg), "image/jpeg").with_detail("high")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encode_small_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let jpeg = encode_jpeg(&img, 85).expect("encode should succeed");
        // JPEG SOI marker
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let data = to_image_data(&jpeg);
        assert_eq!(data.mime_type, "image/jpeg");
        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        assert_eq!(decoded, jpeg);
    }

    #[test]
    fn quality_changes_output_size() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(64, 64, |x, y| {
            Rgba([(x * 4) as u8, (y * 4) as u8, 128, 255])
        }));
        let hi = encode_jpeg(&img, 95).unwrap();
        let lo = encode_jpeg(&img, 10).unwrap();
        assert!(lo.len() < hi.len());
    }
}
