use crate::error::ApiError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fs;
use std::path::Path;
use uuid::Uuid;

/// Decodes a `data:image/<ext>;base64,<payload>` URL and writes the bytes
/// under `<media_root>/<subdir>/<uuid>.<ext>`. Returns the public URL path
/// (`/media/<subdir>/<file>`), which is what gets stored on the entity.
pub fn save_data_url_image(
    media_root: &str,
    subdir: &str,
    data_url: &str,
) -> Result<String, ApiError> {
    let (header, payload) = data_url
        .split_once(";base64,")
        .ok_or_else(|| ApiError::Validation("Image must be a base64 data URL".to_string()))?;
    let ext = header
        .strip_prefix("data:image/")
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .ok_or_else(|| ApiError::Validation("Unsupported image data URL".to_string()))?;

    let bytes = STANDARD
        .decode(payload)
        .map_err(|_| ApiError::Validation("Invalid base64 image payload".to_string()))?;

    let dir = Path::new(media_root).join(subdir);
    fs::create_dir_all(&dir).map_err(|e| {
        log::error!("Failed to create media dir {:?}: {}", dir, e);
        ApiError::Validation("Could not store image".to_string())
    })?;

    let file_name = format!("{}.{}", Uuid::new_v4(), ext);
    let path = dir.join(&file_name);
    fs::write(&path, bytes).map_err(|e| {
        log::error!("Failed to write image {:?}: {}", path, e);
        ApiError::Validation("Could not store image".to_string())
    })?;

    Ok(format!("/media/{}/{}", subdir, file_name))
}

/// Best-effort removal of a previously stored file; missing files are fine.
pub fn delete_media_file(media_root: &str, url_path: &str) {
    if let Some(relative) = url_path.strip_prefix("/media/") {
        let path = Path::new(media_root).join(relative);
        if let Err(e) = fs::remove_file(&path) {
            log::warn!("Failed to remove media file {:?}: {}", path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_data_url() {
        let err = save_data_url_image("media", "recipe/image", "not-a-data-url").unwrap_err();
        assert!(err.to_string().contains("data URL"));
    }

    #[test]
    fn rejects_non_image_header() {
        let err =
            save_data_url_image("media", "recipe/image", "data:text/plain;base64,aGk=").unwrap_err();
        assert!(err.to_string().contains("Unsupported"));
    }

    #[test]
    fn stores_and_deletes_png() {
        let root = std::env::temp_dir().join(format!("foodgram-media-{}", Uuid::new_v4()));
        let root = root.to_str().unwrap().to_string();

        // 1x1 transparent PNG
        let data_url = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";
        let url = save_data_url_image(&root, "recipe/image", data_url).unwrap();
        assert!(url.starts_with("/media/recipe/image/"));
        assert!(url.ends_with(".png"));

        let on_disk = Path::new(&root).join(url.strip_prefix("/media/").unwrap());
        assert!(on_disk.exists());

        delete_media_file(&root, &url);
        assert!(!on_disk.exists());

        fs::remove_dir_all(&root).ok();
    }
}
