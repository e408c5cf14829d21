use std::collections::HashMap;

use axum::extract::Multipart;

use crate::error::{AppError, AppResult};

/// An image file pulled out of a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Drain a multipart form into its text fields and at most one file part.
/// Later parts with the same name overwrite earlier ones.
pub async fn read_form(
    mut multipart: Multipart,
) -> AppResult<(HashMap<String, String>, Option<UploadedImage>)> {
    let mut fields = HashMap::new();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(filename) = field.file_name() {
            let filename = filename.to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?
                .to_vec();
            image = Some(UploadedImage { filename, bytes });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            fields.insert(name, value);
        }
    }

    Ok((fields, image))
}

/// Required text field, rejecting absent or blank values.
pub fn require_field<'a>(fields: &'a HashMap<String, String>, name: &str) -> AppResult<&'a str> {
    fields
        .get(name)
        .map(String::as_str)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{name} is required")))
}
