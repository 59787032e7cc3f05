use std::collections::HashMap;

use axum::extract::Multipart;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    storage::UploadedFile,
};

/// A multipart body checked against the fields an endpoint accepts.
#[derive(Debug, Default)]
pub struct MultipartForm {
    text: HashMap<String, String>,
    files: HashMap<String, Vec<UploadedFile>>,
}

impl MultipartForm {
    /// Reads every part. Unknown field names are rejected, as are text values
    /// sent under a file field and vice versa.
    pub async fn collect(
        mut multipart: Multipart,
        text_fields: &[&str],
        file_fields: &[&str],
    ) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if file_fields.contains(&name.as_str()) {
                let Some(filename) = field.file_name().map(str::to_string) else {
                    return Err(AppError::BadRequest(format!("Field '{}' must be a file", name)));
                };
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;
                // Browsers send an empty part when no file was chosen.
                if filename.is_empty() && data.is_empty() {
                    continue;
                }
                form.files.entry(name).or_default().push(UploadedFile {
                    filename,
                    data: data.to_vec(),
                });
            } else if text_fields.contains(&name.as_str()) {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read field: {}", e)))?;
                form.text.insert(name, value);
            } else {
                return Err(AppError::BadRequest(format!("Unknown field '{}'", name)));
            }
        }

        Ok(form)
    }

    /// Trimmed value, `None` when missing or blank.
    pub fn optional(&mut self, name: &str) -> Option<String> {
        self.text
            .remove(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn required(&mut self, name: &str) -> Result<String> {
        self.optional(name)
            .ok_or_else(|| AppError::Validation(format!("Field '{}' is required", name)))
    }

    pub fn optional_uuid(&mut self, name: &str) -> Result<Option<Uuid>> {
        self.optional(name)
            .map(|v| {
                Uuid::parse_str(&v)
                    .map_err(|_| AppError::Validation(format!("Field '{}' must be a valid id", name)))
            })
            .transpose()
    }

    pub fn required_uuid(&mut self, name: &str) -> Result<Uuid> {
        self.optional_uuid(name)?
            .ok_or_else(|| AppError::Validation(format!("Field '{}' is required", name)))
    }

    pub fn file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name).and_then(|mut files| {
            if files.is_empty() {
                None
            } else {
                Some(files.remove(0))
            }
        })
    }

    pub fn files(&mut self, name: &str) -> Vec<UploadedFile> {
        self.files.remove(name).unwrap_or_default()
    }

    /// Fails on any text field that is allowed on the endpoint but was not
    /// read for this particular request.
    pub fn finish(self) -> Result<()> {
        let mut leftover: Vec<&str> = self
            .text
            .iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .map(|(name, _)| name.as_str())
            .collect();
        if leftover.is_empty() {
            return Ok(());
        }
        leftover.sort_unstable();
        Err(AppError::BadRequest(format!("Unknown field '{}'", leftover.join("', '"))))
    }
}
