use std::time::Duration;

use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use telegram_file_relay::error::RelayError;
use telegram_file_relay::services::backend::{BackendClient, UploadBackend, UploadVerdict};
use telegram_file_relay::services::staging;
use url::Url;

/// Bind a throwaway backend on an ephemeral port and return its endpoint.
async fn spawn_backend(app: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://{addr}/process-file")).unwrap()
}

fn client(endpoint: Url) -> BackendClient {
    BackendClient::new(endpoint, "bot".to_string(), Duration::from_secs(5)).unwrap()
}

fn staged_file(name: &str, contents: &[u8]) -> std::path::PathBuf {
    let path = staging::allocate_staged(name).unwrap();
    std::fs::write(&path, contents).unwrap();
    path
}

/// Echoes the multipart fields back as a verdict: `overwrite=true` turns a
/// would-be duplicate into a processed upload, mirroring the real backend.
async fn process_file(mut multipart: Multipart) -> Json<Value> {
    let mut file_name = String::new();
    let mut file_len = 0usize;
    let mut source = String::new();
    let mut overwrite = false;

    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                file_name = field.file_name().unwrap_or_default().to_string();
                file_len = field.bytes().await.unwrap().len();
            }
            "source" => source = field.text().await.unwrap(),
            "overwrite" => overwrite = field.text().await.unwrap() == "true",
            _ => {}
        }
    }

    assert_eq!(source, "bot");
    assert!(file_len > 0);

    if overwrite {
        Json(json!({ "status": "processed" }))
    } else {
        Json(json!({ "status": "duplicate", "file_key": format!("docs/{file_name}") }))
    }
}

#[tokio::test]
async fn upload_without_overwrite_reports_duplicate() {
    let endpoint = spawn_backend(Router::new().route("/process-file", post(process_file))).await;
    let client = client(endpoint);
    let staged = staged_file("informe.pdf", b"%PDF-1.5 payload");

    let verdict = client.upload(&staged, "informe.pdf", false).await.unwrap();
    assert_eq!(
        verdict,
        UploadVerdict::Duplicate {
            file_key: "docs/informe.pdf".to_string()
        }
    );

    staging::discard_staged(&staged);
}

#[tokio::test]
async fn upload_with_overwrite_reports_processed() {
    let endpoint = spawn_backend(Router::new().route("/process-file", post(process_file))).await;
    let client = client(endpoint);
    let staged = staged_file("informe.pdf", b"%PDF-1.5 payload");

    let verdict = client.upload(&staged, "informe.pdf", true).await.unwrap();
    assert_eq!(verdict, UploadVerdict::Processed);

    staging::discard_staged(&staged);
}

#[tokio::test]
async fn non_200_is_passed_through_verbatim() {
    let app = Router::new().route(
        "/process-file",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "db down") }),
    );
    let endpoint = spawn_backend(app).await;
    let client = client(endpoint);
    let staged = staged_file("a.mp3", b"ID3 payload");

    let verdict = client.upload(&staged, "a.mp3", false).await.unwrap();
    assert_eq!(
        verdict,
        UploadVerdict::Rejected {
            status: 500,
            body: "db down".to_string()
        }
    );

    staging::discard_staged(&staged);
}

#[tokio::test]
async fn unknown_status_is_unexpected() {
    let app = Router::new().route(
        "/process-file",
        post(|| async { Json(json!({ "status": "quarantined" })) }),
    );
    let endpoint = spawn_backend(app).await;
    let client = client(endpoint);
    let staged = staged_file("a.pdf", b"%PDF-1.5");

    let verdict = client.upload(&staged, "a.pdf", false).await.unwrap();
    assert_eq!(
        verdict,
        UploadVerdict::Unexpected(json!({ "status": "quarantined" }))
    );

    staging::discard_staged(&staged);
}

#[tokio::test]
async fn slow_backend_times_out_as_transport_error() {
    let app = Router::new().route(
        "/process-file",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "status": "processed" }))
        }),
    );
    let endpoint = spawn_backend(app).await;
    let client =
        BackendClient::new(endpoint, "bot".to_string(), Duration::from_millis(300)).unwrap();
    let staged = staged_file("a.pdf", b"%PDF-1.5");

    let err = client.upload(&staged, "a.pdf", false).await.unwrap_err();
    assert!(matches!(err, RelayError::Transport(_)));

    staging::discard_staged(&staged);
}

#[tokio::test]
async fn missing_file_surfaces_as_staging_error() {
    let endpoint = spawn_backend(Router::new().route("/process-file", post(process_file))).await;
    let client = client(endpoint);

    let err = client
        .upload(std::path::Path::new("/nonexistent/a.pdf"), "a.pdf", false)
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::Staging(_)));
}
