use axum::body::Bytes;
use serde::{Deserialize, Serialize};

/// One file of an upload call, as declared by the client.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub data: Bytes,
    pub content_type: String,
    pub file_name: String,
}

impl UploadRequest {
    pub fn new(
        data: impl Into<Bytes>,
        content_type: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
            file_name: file_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMedia {
    pub filename: String,
    pub url: String,
    pub content_type: String,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaEntry {
    pub filename: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub size: u64,
}
