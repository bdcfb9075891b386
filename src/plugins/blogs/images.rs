use axum::extract::Multipart;
use futures::future::{join_all, try_join_all};

use crate::http_error::AppError;
use crate::media::{MediaError, MediaHost, UploadFile};
use crate::store::BlogImage;

/// Multipart field carrying image files.
pub const FILE_FIELD: &str = "images";

/// Files and per-file metadata read from an upload form.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub files: Vec<UploadFile>,
    pub alt_texts: Vec<String>,
    pub captions: Vec<String>,
}

/// `altTexts` and `captions` hold JSON string arrays.
fn text_list(field: &str, raw: &str) -> Result<Vec<String>, AppError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).map_err(|_| AppError::validation(format!("{field} must be a JSON array of strings")))
}

pub async fn read_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FILE_FIELD => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                form.files.push(UploadFile { file_name, content_type, bytes: bytes.to_vec() });
            }
            "altTexts" => form.alt_texts = text_list("altTexts", &field.text().await?)?,
            "captions" => form.captions = text_list("captions", &field.text().await?)?,
            _ => tracing::debug!(field = %name, "ignoring unknown upload field"),
        }
    }
    Ok(form)
}

/// Uploads every file concurrently. Any failure fails the batch.
pub async fn upload_all(media: &dyn MediaHost, form: UploadForm) -> Result<Vec<BlogImage>, MediaError> {
    let UploadForm { files, alt_texts, captions } = form;
    let uploaded = try_join_all(files.into_iter().map(|file| media.upload(file))).await?;

    Ok(uploaded
        .into_iter()
        .enumerate()
        .map(|(i, m)| BlogImage {
            url: m.url,
            public_id: m.public_id,
            position: i as i32,
            alt_text: alt_texts.get(i).cloned().unwrap_or_default(),
            caption: captions.get(i).cloned().unwrap_or_default(),
        })
        .collect())
}

/// Deletes the hosted copies of `images`, returning the ones that failed.
pub async fn delete_all(media: &dyn MediaHost, images: &[BlogImage]) -> Vec<(String, MediaError)> {
    let results = join_all(images.iter().map(|img| async move {
        media.delete(&img.public_id).await.map_err(|e| (img.public_id.clone(), e))
    }))
    .await;
    results.into_iter().filter_map(Result::err).collect()
}
