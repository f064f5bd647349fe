//! JPEG encoding for page images and crops.
//!
//! Images are encoded into memory first and written in one call, so an
//! encoder failure and a filesystem failure surface as different errors.

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use tracing::debug;

/// Encode an RGB raster as a baseline JPEG at the given quality (1–100).
pub fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    img.write_with_encoder(encoder)?;

    debug!(
        "Encoded {}x{} image → {} bytes JPEG",
        img.width(),
        img.height(),
        buf.len()
    );
    Ok(buf)
}
