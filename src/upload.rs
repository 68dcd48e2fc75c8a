use std::io;
use std::path::{Path, PathBuf};

use actix_multipart::{Field, Multipart};
use chrono::Utc;
use futures_util::StreamExt;
use log::{debug, warn};

use crate::error::AppError;
use crate::response::INVALID_BODY;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
const MAX_TEXT_BYTES: usize = 1024 * 1024;
const MAX_SECONDARY_IMAGES: usize = 10;
const ALLOWED_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];
const DEFAULT_EXTENSION: &str = ".jpg";

/// Public prefix stored images are served under.
pub const NEWS_PUBLIC_PREFIX: &str = "/uploads/news";

pub const FILE_TOO_LARGE: &str = "파일 크기는 5MB를 초과할 수 없습니다.";
pub const FILE_TYPE_NOT_ALLOWED: &str = "jpg, png, gif, webp만 업로드 가능합니다.";
const UNEXPECTED_FIELD: &str = "Unexpected field";
const UPLOAD_FAILED: &str = "파일 업로드 요청을 읽을 수 없습니다.";

/// A validated image held in memory until the whole request has been checked.
pub struct PendingImage {
    file_name: String,
    bytes: Vec<u8>,
}

#[derive(Default)]
pub struct PendingImages {
    /// `image` field, the lead image.
    pub image: Option<PendingImage>,
    /// `images` field, in upload order.
    pub images: Vec<PendingImage>,
}

impl PendingImages {
    pub fn is_empty(&self) -> bool {
        self.image.is_none() && self.images.is_empty()
    }
}

/// Text fields and files of a multipart news submission.
#[derive(Default)]
pub struct NewsForm {
    pub title: Option<String>,
    pub content: Option<String>,
    pub writer: Option<String>,
    /// Already-stored image paths sent as plain text fields.
    pub image_url: Option<String>,
    pub image_refs: Vec<String>,
    pub files: PendingImages,
}

/// Reads the whole form, rejecting it at the first disallowed or oversized file.
///
/// Nothing is written to disk here.
pub async fn read_news_form(mut payload: Multipart) -> Result<NewsForm, AppError> {
    let mut form = NewsForm::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|_| AppError::bad_request(UPLOAD_FAILED))?;
        let name = field
            .content_disposition()
            .get_name()
            .unwrap_or_default()
            .to_string();
        let filename = field
            .content_disposition()
            .get_filename()
            .map(|s| s.to_string());

        let Some(filename) = filename else {
            let bytes = read_limited(&mut field, MAX_TEXT_BYTES, INVALID_BODY).await?;
            let value = String::from_utf8(bytes).map_err(|_| AppError::bad_request(INVALID_BODY))?;
            match name.as_str() {
                "title" => form.title = Some(value),
                "content" => form.content = Some(value),
                "writer" => form.writer = Some(value),
                "image_url" => form.image_url = Some(value),
                "images" => form.image_refs.push(value),
                _ => {}
            }
            continue;
        };

        // a file input left empty in a browser form
        if filename.is_empty() {
            read_limited(&mut field, MAX_IMAGE_BYTES, FILE_TOO_LARGE).await?;
            continue;
        }

        let slot_taken = match name.as_str() {
            "image" => form.files.image.is_some(),
            "images" => form.files.images.len() >= MAX_SECONDARY_IMAGES,
            _ => true,
        };
        if slot_taken {
            return Err(AppError::bad_request(UNEXPECTED_FIELD));
        }

        let allowed = field
            .content_type()
            .map(|mime| ALLOWED_TYPES.contains(&mime.essence_str()))
            .unwrap_or(false);
        if !allowed {
            return Err(AppError::bad_request(FILE_TYPE_NOT_ALLOWED));
        }

        let bytes = read_limited(&mut field, MAX_IMAGE_BYTES, FILE_TOO_LARGE).await?;
        let image = PendingImage {
            file_name: generate_file_name(&filename),
            bytes,
        };
        if name == "image" {
            form.files.image = Some(image);
        } else {
            form.files.images.push(image);
        }
    }

    Ok(form)
}

async fn read_limited(field: &mut Field, limit: usize, too_large: &str) -> Result<Vec<u8>, AppError> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.next().await {
        let data = chunk.map_err(|_| AppError::bad_request(UPLOAD_FAILED))?;
        if buf.len() + data.len() > limit {
            return Err(AppError::bad_request(too_large));
        }
        buf.extend_from_slice(&data);
    }
    Ok(buf)
}

/// Files written for one request, with their public paths.
#[derive(Debug, Default)]
pub struct StoredImages {
    pub image_url: Option<String>,
    pub images: Vec<String>,
    written: Vec<PathBuf>,
}

impl StoredImages {
    /// Removes the files again, e.g. when the row referencing them was not saved.
    pub async fn discard(self) {
        for path in self.written {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!("failed to remove {}: {}", path.display(), e);
            }
        }
    }
}

/// Writes every pending image into `dir`. On failure, files already written are removed.
pub async fn store(dir: &Path, pending: PendingImages) -> io::Result<StoredImages> {
    let mut stored = StoredImages::default();
    if pending.is_empty() {
        return Ok(stored);
    }
    tokio::fs::create_dir_all(dir).await?;

    if let Some(image) = pending.image {
        match write_image(dir, &image, &mut stored).await {
            Ok(url) => stored.image_url = Some(url),
            Err(e) => {
                stored.discard().await;
                return Err(e);
            }
        }
    }
    for image in &pending.images {
        match write_image(dir, image, &mut stored).await {
            Ok(url) => stored.images.push(url),
            Err(e) => {
                stored.discard().await;
                return Err(e);
            }
        }
    }
    Ok(stored)
}

async fn write_image(dir: &Path, image: &PendingImage, stored: &mut StoredImages) -> io::Result<String> {
    let target = dir.join(&image.file_name);
    tokio::fs::write(&target, &image.bytes).await?;
    debug!("stored {} ({} bytes)", target.display(), image.bytes.len());
    stored.written.push(target);
    Ok(format!("{}/{}", NEWS_PUBLIC_PREFIX, image.file_name))
}

/// `<unix millis>-<random suffix><original extension>`, `.jpg` when the upload has none.
fn generate_file_name(original: &str) -> String {
    let extension = Path::new(original)
        .extension()
        .and_then(|s| s.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
    let suffix: String = (0..11)
        .map(|_| {
            let idx = rand::random::<u8>() % 36;
            if idx < 10 {
                (b'0' + idx) as char
            } else {
                (b'a' + idx - 10) as char
            }
        })
        .collect();
    format!("{}-{}{}", Utc::now().timestamp_millis(), suffix, extension)
}
