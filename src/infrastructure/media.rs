//! Storage for base64-encoded image payloads.
//!
//! Recipe images arrive inline as `data:<mime>;base64,<payload>` strings,
//! are decoded, format-sniffed and written under the media root. Handlers
//! store the returned relative path and serve it back as `/media/<path>`.

use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::ImageFormat;

const IMAGE_DIR: &str = "recipes/images";

/// Decode a data-URL image payload and persist it under `media_root`.
///
/// Returns the stored path relative to the media root.
pub fn store_image(media_root: &str, data_url: &str) -> Result<String, String> {
    let payload = data_url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, payload)| payload)
        .ok_or_else(|| "Expected a base64-encoded data URL.".to_string())?;

    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|_| "Invalid base64 image payload.".to_string())?;

    let format = image::guess_format(&bytes)
        .map_err(|_| "Unrecognized image format.".to_string())?;
    let extension = match format {
        ImageFormat::Png => "png",
        ImageFormat::Jpeg => "jpg",
        _ => return Err("Only PNG and JPEG images are supported.".to_string()),
    };

    let filename = format!(
        "{}_{:08x}.{}",
        chrono::Utc::now().format("%Y%m%d%H%M%S"),
        rand::random::<u32>(),
        extension
    );
    let relative = format!("{}/{}", IMAGE_DIR, filename);

    let dir = Path::new(media_root).join(IMAGE_DIR);
    std::fs::create_dir_all(&dir).map_err(|e| e.to_string())?;
    std::fs::write(Path::new(media_root).join(&relative), bytes).map_err(|e| e.to_string())?;

    Ok(relative)
}

/// Public URL for a stored relative path.
pub fn media_url(relative: &str) -> String {
    if relative.is_empty() {
        return String::new();
    }
    format!("/media/{}", relative)
}
