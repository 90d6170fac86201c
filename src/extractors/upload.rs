//! Multipart post form: optional `content` text plus up to two image `attachment` files.

use crate::error::AppError;
use crate::storage::UploadedFile;
use axum::extract::Multipart;

pub const MAX_ATTACHMENTS: usize = 2;
pub const ATTACHMENT_FIELD: &str = "attachment";

/// Accepted image types and the extension stored for each.
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpg", "jpg"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
];

pub fn image_extension(content_type: &str) -> Result<&'static str, AppError> {
    let ct = content_type.trim().to_ascii_lowercase();
    IMAGE_TYPES
        .iter()
        .find(|(t, _)| *t == ct)
        .map(|(_, ext)| *ext)
        .ok_or_else(|| AppError::BadRequest(format!("invalid file format: {}", content_type)))
}

/// `content` is `None` when the field was not sent and `Some("")` when it was sent blank.
#[derive(Debug, Default)]
pub struct PostForm {
    pub content: Option<String>,
    pub files: Vec<UploadedFile>,
}

impl PostForm {
    pub fn has_content(&self) -> bool {
        self.content.as_deref().map_or(false, |c| !c.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        !self.has_content() && self.files.is_empty()
    }

    pub fn set_content(&mut self, text: String) {
        self.content = Some(text.trim().to_string());
    }

    pub fn push_file(&mut self, file: UploadedFile) -> Result<(), AppError> {
        if self.files.len() >= MAX_ATTACHMENTS {
            return Err(AppError::BadRequest(format!(
                "at most {} attachments are allowed",
                MAX_ATTACHMENTS
            )));
        }
        self.files.push(file);
        Ok(())
    }

    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = PostForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "content" => {
                    let text = field.text().await.map_err(|e| AppError::BadRequest(e.body_text()))?;
                    form.set_content(text);
                }
                ATTACHMENT_FIELD => {
                    let content_type = field.content_type().unwrap_or("").to_string();
                    let extension = image_extension(&content_type)?;
                    let bytes = field.bytes().await.map_err(|e| AppError::BadRequest(e.body_text()))?;
                    form.push_file(UploadedFile {
                        content_type,
                        extension,
                        bytes: bytes.to_vec(),
                    })?;
                }
                other => {
                    tracing::debug!(field = %other, "ignoring unknown multipart field");
                }
            }
        }
        Ok(form)
    }
}
