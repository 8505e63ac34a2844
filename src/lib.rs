pub mod api;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod storage;

pub use error::MediaError;
