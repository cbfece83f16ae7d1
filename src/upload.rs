//! Image upload contract. The transport lives in the web shell; this module
//! only knows the request field and how to read the server's answer.

use serde::Deserialize;

use crate::element::ElementId;
use crate::error::{BuilderError, BuilderResult};

/// Multipart field carrying the file.
pub const UPLOAD_FIELD: &str = "image";

/// Body returned by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl UploadResponse {
    pub fn from_json(body: &str) -> BuilderResult<Self> {
        serde_json::from_str(body).map_err(|e| BuilderError::Upload(e.to_string()))
    }

    /// Public URL of the stored image, or the server's failure message.
    pub fn into_url(self) -> BuilderResult<String> {
        if self.success && !self.url.is_empty() {
            return Ok(self.url);
        }
        Err(BuilderError::Upload(
            self.message.unwrap_or_else(|| "Unknown error".to_string()),
        ))
    }
}

/// An upload in flight for one image element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTicket {
    pub id: ElementId,
}

/// Text shown to the user when an upload fails.
pub fn failure_message(error: &BuilderError) -> String {
    match error {
        BuilderError::Upload(message) if !message.is_empty() => {
            format!("Failed to upload image: {}", message)
        }
        _ => "Error uploading image".to_string(),
    }
}
