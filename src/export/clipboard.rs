//! Wayland clipboard integration.

use super::types::ExportError;
use std::io::Write;
use std::process::{Command, Stdio};
use wl_clipboard_rs::copy::{MimeType, Options, ServeRequests, Source};

/// Puts `bytes` on the Wayland clipboard as `mime_type`.
///
/// The `wl-copy` binary is tried first because it keeps serving the selection
/// after we exit; wl-clipboard-rs is the fallback.
pub fn copy_bytes(bytes: &[u8], mime_type: &str) -> Result<(), ExportError> {
    log::debug!("Copying {} bytes of {} to clipboard", bytes.len(), mime_type);

    let command_err = match copy_via_command(bytes, mime_type) {
        Ok(()) => {
            log::info!("Copied {} to clipboard via wl-copy", mime_type);
            return Ok(());
        }
        Err(e) => e,
    };
    log::warn!("wl-copy failed ({}), falling back to wl-clipboard-rs", command_err);

    copy_via_library(bytes, mime_type).map_err(|lib_err| {
        ExportError::Clipboard(format!(
            "wl-copy failed: {} ; wl-clipboard-rs failed: {}",
            command_err, lib_err
        ))
    })?;
    log::info!("Copied {} to clipboard via wl-clipboard-rs", mime_type);
    Ok(())
}

fn copy_via_library(bytes: &[u8], mime_type: &str) -> Result<(), String> {
    let mut opts = Options::new();
    // One paste is served before the process lets go of the selection.
    opts.serve_requests(ServeRequests::Only(1));
    opts.copy(
        Source::Bytes(bytes.into()),
        MimeType::Specific(mime_type.to_string()),
    )
    .map_err(|e| e.to_string())
}

fn copy_via_command(bytes: &[u8], mime_type: &str) -> Result<(), String> {
    let mut child = Command::new("wl-copy")
        .args(["--type", mime_type])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("failed to spawn wl-copy (is it installed?): {}", e))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(bytes)
            .map_err(|e| format!("failed to write to wl-copy stdin: {}", e))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| format!("failed to wait for wl-copy: {}", e))?;
    if !output.status.success() {
        return Err(String::from_utf8_lossy(&output.stderr).trim().to_string());
    }
    Ok(())
}
