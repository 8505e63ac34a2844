use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    handler::HandlerWithoutStateExt,
    routing::{get, post},
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::warn;

use crate::{
    config::DatabaseSettings,
    diagnostics::{self, DiagnosticReport},
    error::MediaError,
    storage::{self, MediaEntry, MediaStore, StoredMedia, UPLOADS_MOUNT, UploadRequest},
};

/// Multipart field that carries uploaded files.
const FILES_FIELD: &str = "files";

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<MediaStore>,
    pub database: Arc<DatabaseSettings>,
}

impl AppState {
    pub fn new(storage: MediaStore, database: DatabaseSettings) -> Self {
        Self {
            storage: Arc::new(storage),
            database: Arc::new(database),
        }
    }
}

#[derive(Serialize)]
pub struct MessageResponse {
    message: &'static str,
}

#[derive(Serialize)]
pub struct UploadResponse {
    uploaded: Vec<StoredMedia>,
}

#[derive(Serialize)]
pub struct MediaListResponse {
    media: Vec<MediaEntry>,
}

pub fn router(state: AppState, upload_body_limit: usize) -> Router {
    let uploads = ServeDir::new(state.storage.root()).not_found_service(missing_upload.into_service());
    Router::new()
        .route("/", get(read_root))
        .route("/api/hello", get(hello))
        .route("/test", get(test_dependencies))
        .route(
            "/upload",
            post(upload_media).layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        .route("/media", get(list_media))
        .nest_service(UPLOADS_MOUNT, uploads)
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn read_root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Hello from the Backend!",
    })
}

pub async fn hello() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Hello from the backend API!",
    })
}

pub async fn test_dependencies(State(state): State<AppState>) -> Json<DiagnosticReport> {
    Json(diagnostics::collect_report(&state.database).await)
}

pub async fn upload_media(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, MediaError> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        files.push(UploadRequest {
            data,
            content_type,
            file_name,
        });
    }

    let uploaded = state.storage.store(files).await.inspect_err(|err| {
        if !matches!(err, MediaError::Io(_)) {
            warn!("upload rejected: {err}");
        }
    })?;
    Ok(Json(UploadResponse { uploaded }))
}

pub async fn list_media(State(state): State<AppState>) -> Result<Json<MediaListResponse>, MediaError> {
    let media = storage::list_media(&state.storage).await?;
    Ok(Json(MediaListResponse { media }))
}

async fn missing_upload() -> MediaError {
    MediaError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum_test::{
        TestServer,
        multipart::{MultipartForm, Part},
    };
    use serde_json::{Value, json};
    use tempfile::TempDir;

    fn test_server(dir: &TempDir) -> TestServer {
        test_server_with_limit(dir, 1024 * 1024)
    }

    fn test_server_with_limit(dir: &TempDir, upload_body_limit: usize) -> TestServer {
        let storage = MediaStore::new(dir.path().to_path_buf(), UPLOADS_MOUNT);
        let state = AppState::new(storage, DatabaseSettings::default());
        TestServer::new(router(state, upload_body_limit)).unwrap()
    }

    fn file_part(bytes: &[u8], name: &str, mime: &str) -> Part {
        Part::bytes(bytes.to_vec()).file_name(name).mime_type(mime)
    }

    #[tokio::test]
    async fn greetings_are_served() {
        let dir = TempDir::new().unwrap();
        let server = test_server(&dir);

        let root: Value = server.get("/").await.json();
        assert_eq!(root["message"], "Hello from the Backend!");
        let hello: Value = server.get("/api/hello").await.json();
        assert_eq!(hello["message"], "Hello from the backend API!");
    }

    #[tokio::test]
    async fn upload_returns_stored_metadata() {
        let dir = TempDir::new().unwrap();
        let server = test_server(&dir);

        let response = server
            .post("/upload")
            .multipart(MultipartForm::new().add_part("files", file_part(&[1u8; 10], "My Photo!!.png", "image/png")))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "uploaded": [{
                "filename": "My_Photo.png",
                "url": "/uploads/My_Photo.png",
                "content_type": "image/png",
                "size": 10
            }]
        }));
    }

    #[tokio::test]
    async fn uploaded_file_is_served_back() {
        let dir = TempDir::new().unwrap();
        let server = test_server(&dir);

        server
            .post("/upload")
            .multipart(MultipartForm::new().add_part("files", file_part(b"webm-bytes", "clip.webm", "video/webm")))
            .await
            .assert_status_ok();

        let response = server.get("/uploads/clip.webm").await;
        response.assert_status_ok();
        assert_eq!(response.as_bytes().to_vec(), b"webm-bytes".to_vec());
    }

    #[tokio::test]
    async fn missing_static_file_is_404() {
        let dir = TempDir::new().unwrap();
        let server = test_server(&dir);

        let response = server.get("/uploads/nope.png").await;

        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_json(&json!({"detail": "Not Found"}));
    }

    #[tokio::test]
    async fn multiple_files_in_one_request() {
        let dir = TempDir::new().unwrap();
        let server = test_server(&dir);

        let form = MultipartForm::new()
            .add_text("caption", "ignored")
            .add_part("files", file_part(b"a", "same.gif", "image/gif"))
            .add_part("files", file_part(b"bb", "same.gif", "image/gif"));
        let body: Value = server.post("/upload").multipart(form).await.json();

        assert_eq!(body["uploaded"][0]["filename"], "same.gif");
        assert_eq!(body["uploaded"][1]["filename"], "same-1.gif");
        assert_eq!(body["uploaded"][1]["size"], 2);
    }

    #[tokio::test]
    async fn unsupported_type_is_rejected_and_nothing_is_written() {
        let dir = TempDir::new().unwrap();
        let server = test_server(&dir);

        let response = server
            .post("/upload")
            .multipart(MultipartForm::new().add_part("files", file_part(b"%PDF", "doc.pdf", "application/pdf")))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["detail"].as_str().unwrap().contains("application/pdf"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn oversized_upload_is_payload_too_large() {
        let dir = TempDir::new().unwrap();
        let server = test_server_with_limit(&dir, 1024);

        let response = server
            .post("/upload")
            .multipart(MultipartForm::new().add_part("files", file_part(&[0u8; 4096], "big.png", "image/png")))
            .await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        let body: Value = response.json();
        assert!(body["detail"].as_str().unwrap().starts_with("Invalid multipart body"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn form_without_files_is_an_empty_upload() {
        let dir = TempDir::new().unwrap();
        let server = test_server(&dir);

        let response = server
            .post("/upload")
            .multipart(MultipartForm::new().add_text("caption", "no files here"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({"detail": "No files uploaded"}));
    }

    #[tokio::test]
    async fn media_listing_is_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.png"), b"bb").unwrap();
        std::fs::write(dir.path().join("a.png"), b"a").unwrap();
        std::fs::write(dir.path().join("c.mp4"), b"ccc").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"skip me").unwrap();
        let server = test_server(&dir);

        let response = server.get("/media").await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "media": [
                {"filename": "a.png", "url": "/uploads/a.png", "type": "image", "size": 1},
                {"filename": "b.png", "url": "/uploads/b.png", "type": "image", "size": 2},
                {"filename": "c.mp4", "url": "/uploads/c.mp4", "type": "video", "size": 3}
            ]
        }));
    }

    #[tokio::test]
    async fn diagnostics_always_answer() {
        let dir = TempDir::new().unwrap();
        let server = test_server(&dir);

        let response = server.get("/test").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["backend"], "running");
        assert_eq!(body["database"]["status"], "unavailable");
        assert_eq!(body["database_url"], "not_set");
        assert_eq!(body["database_name"], "not_set");
    }
}
