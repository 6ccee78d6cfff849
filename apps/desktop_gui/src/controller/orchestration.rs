//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext};

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
) -> Result<(), UiError> {
    let cmd_name = cmd.name();
    let context = match &cmd {
        BackendCommand::Upload { .. } => UiErrorContext::Upload,
        BackendCommand::FetchUploadedImage { .. } => UiErrorContext::ImagePreview,
    };

    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            Ok(())
        }
        Err(TrySendError::Full(_)) => {
            tracing::warn!(command = cmd_name, "ui->backend command queue is full");
            Err(UiError::from_message(
                context,
                "UI command queue is full; please retry",
            ))
        }
        Err(TrySendError::Disconnected(_)) => {
            tracing::error!(command = cmd_name, "backend command processor disconnected");
            Err(UiError::from_message(
                context,
                "Backend command processor disconnected (possible startup/runtime failure); restart the app",
            ))
        }
    }
}
