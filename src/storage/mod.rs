pub mod filename;
pub mod listing;
pub mod metadata;
pub mod mime;
pub mod store;

pub use listing::{classify, list_media};
pub use metadata::*;
pub use mime::{ALLOWED_MIME_TYPES, extension_for};
pub use store::MediaStore;

/// Path the media directory is mounted under, and the prefix of every media URL.
pub const UPLOADS_MOUNT: &str = "/uploads";
