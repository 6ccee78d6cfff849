//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::{HttpClassificationService, SubmitOutcome, UploadCoordinator};
use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;
use crate::config::StartupConfig;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::ui::app::PreviewImage;

type Coordinator = UploadCoordinator<HttpClassificationService>;

const PREVIEW_MAX_EDGE: u32 = 512;

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, startup: StartupConfig) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        let coordinator = Arc::new(UploadCoordinator::new(HttpClassificationService::new(
            startup.server_url.clone(),
            startup.upload_timeout,
        )));
        tracing::info!(
            server_url = %startup.server_url,
            timeout_secs = startup.upload_timeout.as_secs(),
            "backend worker ready"
        );
        let _ = ui_tx.try_send(UiEvent::Info(format!(
            "Connected to {}",
            startup.server_url
        )));

        while let Ok(cmd) = cmd_rx.recv() {
            tracing::debug!(command = cmd.name(), "backend: received command");
            let coordinator = coordinator.clone();
            let ui_tx = ui_tx.clone();
            runtime.spawn(async move {
                if let Some(event) = handle_command(&coordinator, cmd).await {
                    deliver(&ui_tx, event);
                }
            });
        }
        tracing::info!("ui command channel closed; backend worker exiting");
    });
}

async fn handle_command(coordinator: &Coordinator, cmd: BackendCommand) -> Option<UiEvent> {
    match cmd {
        BackendCommand::Upload { path } => match coordinator.submit_path(Some(path)).await {
            SubmitOutcome::NoFile => None,
            SubmitOutcome::Busy => Some(UiEvent::UploadIgnored),
            SubmitOutcome::Completed(Ok(result)) => Some(UiEvent::UploadCompleted(result)),
            SubmitOutcome::Completed(Err(err)) => {
                tracing::error!("backend: upload failed: {err}");
                Some(UiEvent::UploadFailed(UiError::from_upload_failure(&err)))
            }
        },
        BackendCommand::FetchUploadedImage {
            generation,
            image_file,
        } => {
            let fetched = coordinator
                .service()
                .fetch_uploaded_image(&image_file)
                .await
                .map_err(|err| err.to_string())
                .and_then(|bytes| decode_preview_image(&bytes));
            Some(match fetched {
                Ok(image) => UiEvent::UploadedImageLoaded {
                    generation,
                    image_file,
                    image,
                },
                Err(reason) => {
                    tracing::warn!(%image_file, "backend: uploaded image unavailable: {reason}");
                    UiEvent::UploadedImageFailed {
                        generation,
                        image_file,
                        reason,
                    }
                }
            })
        }
    }
}

/// Hands a command outcome to the UI. A full queue is waited out rather than dropped:
/// losing an upload outcome would leave the UI in flight forever.
fn deliver(ui_tx: &Sender<UiEvent>, event: UiEvent) {
    match ui_tx.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => {
            tracing::warn!("backend: ui event queue full; waiting for the UI to drain it");
            if tokio::task::block_in_place(|| ui_tx.send(event)).is_err() {
                tracing::warn!("backend: ui event channel closed; dropping event");
            }
        }
        Err(TrySendError::Disconnected(_)) => {
            tracing::warn!("backend: ui event channel closed; dropping event");
        }
    }
}

fn decode_preview_image(bytes: &[u8]) -> Result<PreviewImage, String> {
    let dynamic = image::load_from_memory(bytes).map_err(|err| err.to_string())?;
    let resized = if dynamic.width() > PREVIEW_MAX_EDGE || dynamic.height() > PREVIEW_MAX_EDGE {
        dynamic.thumbnail(PREVIEW_MAX_EDGE, PREVIEW_MAX_EDGE)
    } else {
        dynamic
    }
    .to_rgba8();
    let width = resized.width() as usize;
    let height = resized.height() as usize;
    Ok(PreviewImage {
        width,
        height,
        rgba: resized.into_raw(),
    })
}
