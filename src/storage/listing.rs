use tokio::fs;

use crate::error::MediaError;
use crate::storage::{MediaEntry, MediaKind, MediaStore};

const IMAGE_SUFFIXES: &[&str] = &[".png", ".jpg", ".jpeg", ".webp", ".gif"];
const VIDEO_SUFFIXES: &[&str] = &[".mp4", ".webm", ".ogv"];

/// Classifies a stored file by its (case-insensitive) extension.
pub fn classify(file_name: &str) -> Option<MediaKind> {
    let lowered = file_name.to_lowercase();
    if IMAGE_SUFFIXES.iter().any(|ext| lowered.ends_with(ext)) {
        Some(MediaKind::Image)
    } else if VIDEO_SUFFIXES.iter().any(|ext| lowered.ends_with(ext)) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

/// Lists every image and video file directly inside the store, sorted by name.
pub async fn list_media(storage: &MediaStore) -> Result<Vec<MediaEntry>, MediaError> {
    let mut names: Vec<String> = Vec::new();
    let mut dir = match fs::read_dir(storage.root()).await {
        Ok(dir) => dir,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };
    while let Some(entry) = dir.next_entry().await? {
        if let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }
    names.sort();

    let mut items = Vec::new();
    for name in names {
        let Some(kind) = classify(&name) else {
            continue;
        };
        // Follows symlinks; entries that vanished since the scan are skipped.
        let meta = match fs::metadata(storage.resolve_path(&name)).await {
            Ok(meta) => meta,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
            Err(err) => return Err(err.into()),
        };
        if !meta.is_file() {
            continue;
        }
        items.push(MediaEntry {
            url: storage.public_url(&name),
            filename: name,
            kind,
            size: meta.len(),
        });
    }
    Ok(items)
}
