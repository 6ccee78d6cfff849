use super::*;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use anyhow::Result;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use shared::error::PayloadError;
use tokio::{
    net::TcpListener,
    sync::{Mutex, Notify},
};

const SINGLE_BODY: &str = r#"{"mode":"single","image_file":"x.png","results":{"ModelA":{"prediction":"No_DR","inference_time":0.12,"params":25000000,"accuracy":91.2,"train_time":"3h"}}}"#;
const FOLDER_BODY: &str = r#"{"mode":"folder","total_images":10,"avg_times":{"ModelA":0.15},"model_info":{"ModelA":{"accuracy":90.0,"train_time":"3h"}}}"#;

#[derive(Debug, Clone)]
struct ReceivedPart {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    len: usize,
}

#[derive(Clone)]
struct ClassifierState {
    received: Arc<Mutex<Vec<ReceivedPart>>>,
    requests: Arc<AtomicUsize>,
    status: StatusCode,
    body: Arc<String>,
    delay: Duration,
}

async fn handle_upload(
    State(state): State<ClassifierState>,
    mut multipart: Multipart,
) -> (StatusCode, String) {
    state.requests.fetch_add(1, Ordering::SeqCst);
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let len = field.bytes().await.map(|bytes| bytes.len()).unwrap_or(0);
        state.received.lock().await.push(ReceivedPart {
            name,
            filename,
            content_type,
            len,
        });
    }
    tokio::time::sleep(state.delay).await;
    (state.status, state.body.as_ref().clone())
}

async fn serve_uploaded_image() -> Vec<u8> {
    b"\x89PNG-test-bytes".to_vec()
}

async fn spawn_classifier(
    status: StatusCode,
    body: &str,
    delay: Duration,
) -> Result<(Url, ClassifierState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ClassifierState {
        received: Arc::new(Mutex::new(Vec::new())),
        requests: Arc::new(AtomicUsize::new(0)),
        status,
        body: Arc::new(body.to_string()),
        delay,
    };
    let app = Router::new()
        .route("/upload", post(handle_upload))
        .route("/static/uploads/x.png", get(serve_uploaded_image))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((Url::parse(&format!("http://{addr}"))?, state))
}

fn http_coordinator(server_url: Url, timeout: Duration) -> UploadCoordinator<HttpClassificationService> {
    UploadCoordinator::new(HttpClassificationService::new(server_url, timeout))
}

fn image_upload() -> FileUpload {
    FileUpload::new("eye.png", b"fake-png".to_vec())
}

fn completed(outcome: SubmitOutcome) -> Result<UploadResult, UploadFailure> {
    match outcome {
        SubmitOutcome::Completed(result) => result,
        other => panic!("expected a completed submission, got {other:?}"),
    }
}

#[tokio::test]
async fn single_upload_sends_one_file_part_and_parses_result() {
    let (server_url, state) = spawn_classifier(StatusCode::OK, SINGLE_BODY, Duration::ZERO)
        .await
        .expect("spawn server");
    let coordinator = http_coordinator(server_url, DEFAULT_UPLOAD_TIMEOUT);

    let result = completed(coordinator.submit(Some(image_upload())).await).expect("upload");

    match result {
        UploadResult::Single {
            image_file,
            results,
        } => {
            assert_eq!(image_file, "x.png");
            assert_eq!(results["ModelA"].prediction.to_string(), "No_DR");
        }
        other => panic!("unexpected result {other:?}"),
    }

    let parts = state.received.lock().await.clone();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].name, "file");
    assert_eq!(parts[0].filename.as_deref(), Some("eye.png"));
    assert_eq!(parts[0].content_type.as_deref(), Some("image/png"));
    assert_eq!(parts[0].len, b"fake-png".len());
    assert_eq!(state.requests.load(Ordering::SeqCst), 1);
    assert!(!coordinator.is_in_flight());
}

#[tokio::test]
async fn archive_upload_parses_folder_result() {
    let (server_url, state) = spawn_classifier(StatusCode::OK, FOLDER_BODY, Duration::ZERO)
        .await
        .expect("spawn server");
    let coordinator = http_coordinator(server_url, DEFAULT_UPLOAD_TIMEOUT);
    let archive = FileUpload::new("batch.zip", vec![0x50, 0x4b, 0x03, 0x04]);
    assert!(archive.is_archive());

    let result = completed(coordinator.submit(Some(archive)).await).expect("upload");

    assert!(matches!(
        result,
        UploadResult::Folder { total_images: 10, .. }
    ));
    let parts = state.received.lock().await.clone();
    assert_eq!(parts[0].content_type.as_deref(), Some("application/zip"));
}

#[tokio::test]
async fn non_success_status_is_a_failure() {
    let (server_url, _) = spawn_classifier(
        StatusCode::INTERNAL_SERVER_ERROR,
        "model crashed",
        Duration::ZERO,
    )
    .await
    .expect("spawn server");
    let coordinator = http_coordinator(server_url, DEFAULT_UPLOAD_TIMEOUT);

    let err = completed(coordinator.submit(Some(image_upload())).await).expect_err("should fail");
    assert!(
        matches!(err, UploadFailure::Status { status: 500, ref body } if body == "model crashed")
    );
}

#[tokio::test]
async fn malformed_body_is_a_payload_failure() {
    let (server_url, _) = spawn_classifier(StatusCode::OK, "<html>oops</html>", Duration::ZERO)
        .await
        .expect("spawn server");
    let coordinator = http_coordinator(server_url, DEFAULT_UPLOAD_TIMEOUT);

    let err = completed(coordinator.submit(Some(image_upload())).await).expect_err("should fail");
    assert!(matches!(err, UploadFailure::Payload(PayloadError::Malformed(_))));
}

#[tokio::test]
async fn unknown_mode_fails_loudly() {
    let (server_url, _) = spawn_classifier(
        StatusCode::OK,
        r#"{"mode":"video","frames":3}"#,
        Duration::ZERO,
    )
    .await
    .expect("spawn server");
    let coordinator = http_coordinator(server_url, DEFAULT_UPLOAD_TIMEOUT);

    let err = completed(coordinator.submit(Some(image_upload())).await).expect_err("should fail");
    assert!(err.to_string().contains("unrecognized result mode 'video'"));
}

#[tokio::test]
async fn slow_service_times_out_and_frees_the_slot() {
    let (server_url, _) = spawn_classifier(StatusCode::OK, SINGLE_BODY, Duration::from_secs(5))
        .await
        .expect("spawn server");
    let coordinator = http_coordinator(server_url, Duration::from_millis(200));

    let err = completed(coordinator.submit(Some(image_upload())).await).expect_err("should fail");
    assert!(matches!(err, UploadFailure::Timeout { .. }));
    assert!(!coordinator.is_in_flight());
}

#[tokio::test]
async fn unreachable_service_is_a_transport_failure() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let server_url = Url::parse(&format!("http://{addr}")).expect("url");
    let coordinator = http_coordinator(server_url, DEFAULT_UPLOAD_TIMEOUT);

    let err = completed(coordinator.submit(Some(image_upload())).await).expect_err("should fail");
    assert!(matches!(err, UploadFailure::Transport(_)));
}

#[tokio::test]
async fn fetches_uploaded_image_from_static_prefix() {
    let (server_url, _) = spawn_classifier(StatusCode::OK, SINGLE_BODY, Duration::ZERO)
        .await
        .expect("spawn server");
    let service = HttpClassificationService::new(server_url, DEFAULT_UPLOAD_TIMEOUT);

    let bytes = service.fetch_uploaded_image("x.png").await.expect("image");
    assert_eq!(bytes, b"\x89PNG-test-bytes");
    assert!(matches!(
        service.fetch_uploaded_image("missing.png").await,
        Err(AssetError::Status(404))
    ));
}

#[tokio::test]
async fn submit_path_reads_file_from_disk() {
    let (server_url, state) = spawn_classifier(StatusCode::OK, SINGLE_BODY, Duration::ZERO)
        .await
        .expect("spawn server");
    let coordinator = http_coordinator(server_url, DEFAULT_UPLOAD_TIMEOUT);
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("retina.jpg");
    std::fs::write(&path, b"jpeg-bytes").expect("write");

    completed(coordinator.submit_path(Some(path)).await).expect("upload");

    let parts = state.received.lock().await.clone();
    assert_eq!(parts[0].filename.as_deref(), Some("retina.jpg"));
    assert_eq!(parts[0].content_type.as_deref(), Some("image/jpeg"));

    let missing = dir.path().join("missing.png");
    let err = completed(coordinator.submit_path(Some(missing)).await).expect_err("should fail");
    assert!(matches!(err, UploadFailure::ReadFile { .. }));
}

#[cfg(unix)]
#[tokio::test]
async fn non_utf8_file_name_keeps_its_archive_extension() {
    use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(OsStr::from_bytes(b"scans-\xff.zip"));
    std::fs::write(&path, b"PK\x03\x04").expect("write");

    let upload = FileUpload::from_path(&path).await.expect("read");
    assert!(upload.filename.ends_with(".zip"));
    assert!(upload.is_archive());
    assert_eq!(upload.mime_type, "application/zip");
}

#[derive(Default)]
struct GatedService {
    calls: AtomicUsize,
    entered: Notify,
    gate: Notify,
}

#[async_trait]
impl ClassificationService for GatedService {
    async fn classify(&self, _upload: FileUpload) -> Result<UploadResult, UploadFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.gate.notified().await;
        Ok(UploadResult::from_slice(SINGLE_BODY.as_bytes())?)
    }
}

#[tokio::test]
async fn missing_file_never_reaches_the_service() {
    let coordinator = UploadCoordinator::new(GatedService::default());

    assert!(matches!(coordinator.submit(None).await, SubmitOutcome::NoFile));
    assert!(matches!(
        coordinator.submit_path(None).await,
        SubmitOutcome::NoFile
    ));
    assert_eq!(coordinator.service().calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn second_submission_is_ignored_while_first_is_in_flight() {
    let coordinator = Arc::new(UploadCoordinator::new(GatedService::default()));
    let first = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.submit(Some(image_upload())).await })
    };
    coordinator.service().entered.notified().await;
    assert!(coordinator.is_in_flight());

    assert!(matches!(
        coordinator.submit(Some(image_upload())).await,
        SubmitOutcome::Busy
    ));

    coordinator.service().gate.notify_one();
    completed(first.await.expect("join")).expect("first upload");
    assert!(!coordinator.is_in_flight());

    coordinator.service().gate.notify_one();
    completed(coordinator.submit(Some(image_upload())).await).expect("later upload");
    assert_eq!(coordinator.service().calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn path_submission_is_ignored_while_another_upload_is_in_flight() {
    let coordinator = Arc::new(UploadCoordinator::new(GatedService::default()));
    let first = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.submit(Some(image_upload())).await })
    };
    coordinator.service().entered.notified().await;

    // The path does not exist, so a read attempt would complete with an error instead.
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(matches!(
        coordinator
            .submit_path(Some(dir.path().join("never-read.png")))
            .await,
        SubmitOutcome::Busy
    ));

    coordinator.service().gate.notify_one();
    completed(first.await.expect("join")).expect("first upload");
    assert_eq!(coordinator.service().calls.load(Ordering::SeqCst), 1);
}

struct FlakyService {
    calls: AtomicUsize,
}

#[async_trait]
impl ClassificationService for FlakyService {
    async fn classify(&self, _upload: FileUpload) -> Result<UploadResult, UploadFailure> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(UploadFailure::Timeout {
                after: Duration::from_secs(1),
            });
        }
        Ok(UploadResult::from_slice(FOLDER_BODY.as_bytes())?)
    }
}

#[tokio::test]
async fn retry_after_failure_succeeds() {
    let coordinator = UploadCoordinator::new(FlakyService {
        calls: AtomicUsize::new(0),
    });

    assert!(completed(coordinator.submit(Some(image_upload())).await).is_err());
    assert!(!coordinator.is_in_flight());
    let result = completed(coordinator.submit(Some(image_upload())).await).expect("retry");
    assert_eq!(result.model_count(), 1);
}
