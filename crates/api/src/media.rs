//! Storage of uploaded images under the configured media root.
//!
//! Files are written to `<media_dir>/<folder>/<name>.<ext>` and referenced
//! by their public path `/media/<folder>/<name>.<ext>`, which is what the
//! database stores and the API returns.

use std::path::Path;

use axum::extract::Multipart;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// URL prefix under which the media root is served.
pub const MEDIA_URL_PREFIX: &str = "/media";

/// Accepted image file extensions (lowercase).
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];

/// A file part read from a multipart body.
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Text and file parts of a multipart form.
#[derive(Debug, Default)]
pub struct FormParts {
    pub fields: Vec<(String, String)>,
    pub files: Vec<(String, UploadedFile)>,
}

impl FormParts {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        let idx = self.files.iter().position(|(field, _)| field == name)?;
        Some(self.files.swap_remove(idx).1)
    }
}

/// Drain a multipart body. Parts with a filename are files, the rest text.
pub async fn read_form(mut multipart: Multipart) -> AppResult<FormParts> {
    let mut parts = FormParts::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match field.file_name().map(str::to_string) {
            Some(filename) => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                parts.files.push((
                    name,
                    UploadedFile {
                        filename,
                        data: data.to_vec(),
                    },
                ));
            }
            None => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                parts.fields.push((name, text));
            }
        }
    }

    Ok(parts)
}

/// Lowercase extension of `filename` if it is an accepted image type.
pub fn image_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Write an uploaded image below `media_dir/folder` and return its public path.
///
/// `field` names the form field for the error reported on a bad extension.
pub async fn store_image(
    media_dir: &Path,
    folder: &str,
    field: &'static str,
    file: &UploadedFile,
) -> AppResult<String> {
    let ext = image_extension(&file.filename).ok_or_else(|| {
        AppError::field(
            field,
            format!(
                "Unsupported image format. Allowed: {}.",
                IMAGE_EXTENSIONS.join(", ")
            ),
        )
    })?;

    let dir = media_dir.join(folder);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::InternalError(format!("Cannot create {}: {e}", dir.display())))?;

    let stored_name = format!("{}.{ext}", Uuid::new_v4().simple());
    let path = dir.join(&stored_name);
    tokio::fs::write(&path, &file.data)
        .await
        .map_err(|e| AppError::InternalError(format!("Cannot write {}: {e}", path.display())))?;

    tracing::debug!(path = %path.display(), bytes = file.data.len(), "Stored uploaded image");
    Ok(format!("{MEDIA_URL_PREFIX}/{folder}/{stored_name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_case_insensitive() {
        assert_eq!(image_extension("Poster.JPG").as_deref(), Some("jpg"));
        assert_eq!(image_extension("avatar.webp").as_deref(), Some("webp"));
    }

    #[test]
    fn unsupported_or_missing_extension_is_rejected() {
        assert_eq!(image_extension("notes.txt"), None);
        assert_eq!(image_extension("no-extension"), None);
    }

    #[tokio::test]
    async fn stored_image_lands_under_the_folder() {
        let root = std::env::temp_dir().join(format!("hoshidori-media-{}", Uuid::new_v4()));
        let file = UploadedFile {
            filename: "face.png".into(),
            data: vec![1, 2, 3],
        };

        let public = store_image(&root, "profile_images", "profile_image", &file)
            .await
            .unwrap();

        assert!(public.starts_with("/media/profile_images/"));
        assert!(public.ends_with(".png"));
        let stored = root.join(public.trim_start_matches("/media/"));
        assert_eq!(tokio::fs::read(&stored).await.unwrap(), vec![1, 2, 3]);
        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}
