use super::types::{CaptureError, CaptureMode, CaptureRequest};

/// Converts a delay in seconds into whole milliseconds.
///
/// The product is truncated toward zero, so values whose binary representation
/// lands just below an integer lose a millisecond (`1.005` gives `1004`).
/// Negative and NaN delays saturate to zero.
pub fn delay_ms_from_seconds(delay_seconds: f64) -> u64 {
    if delay_seconds.is_nan() || delay_seconds < 0.0 {
        log::warn!("Capture delay {} is not a valid duration, using 0", delay_seconds);
    }
    (delay_seconds * 1000.0) as u64
}

/// Validates the UI's capture parameters and builds a [`CaptureRequest`].
///
/// # Errors
/// [`CaptureError::InvalidMode`] when `mode_token` is not one of `fullScreen`,
/// `currentScreen`, `activeWindow` or `rectangularRegion`.
pub fn resolve_capture_request(
    mode_token: &str,
    delay_seconds: f64,
    include_pointer: bool,
    include_decorations: bool,
) -> Result<CaptureRequest, CaptureError> {
    let mode: CaptureMode = mode_token.parse()?;

    Ok(CaptureRequest {
        mode,
        delay_ms: delay_ms_from_seconds(delay_seconds),
        include_pointer,
        include_decorations,
    })
}
