//! Plant observations (notes and photos).

use crate::error::{CoreError, GrowError};
use crate::hashing::sha256_hex;

/// Extensions accepted for observation photos.
pub const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "heic"];

/// Clean up an observation: blank notes become `None`, blank URLs are
/// dropped. Fails with [`GrowError::EmptyObservation`] when nothing remains.
pub fn validate_observation(
    notes: Option<&str>,
    photo_urls: &[String],
) -> Result<(Option<String>, Vec<String>), GrowError> {
    let notes = notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);
    let photos: Vec<String> = photo_urls
        .iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .collect();

    if notes.is_none() && photos.is_empty() {
        return Err(GrowError::EmptyObservation);
    }
    Ok((notes, photos))
}

/// Lower-cased extension of an uploaded file name, if it is an accepted
/// photo type.
pub fn photo_extension(file_name: &str) -> Result<String, CoreError> {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if PHOTO_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(CoreError::Validation(format!(
            "Unsupported photo type '{file_name}'. Allowed: {}",
            PHOTO_EXTENSIONS.join(", ")
        )))
    }
}

/// Content-addressed file name, so the same photo uploaded twice is stored
/// once.
pub fn photo_file_name(data: &[u8], extension: &str) -> String {
    format!("{}.{extension}", sha256_hex(data))
}
