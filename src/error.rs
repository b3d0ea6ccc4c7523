use thiserror::Error;
use tracing::{error, warn};

/// Severity classification for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// Crate-wide error type for the popup assistant backend.
///
/// Variants correspond 1:1 to the error kinds in the propagation policy:
/// `CaptureTimeout` is swallowed before it reaches the UI, `HotkeyConflict`/
/// `HotkeyParse` are logged and never abort hotkey sync, `Cancelled` is never
/// shown to the user.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("clipboard unavailable: {0}")]
    ClipboardUnavailable(String),

    #[error("selection capture timed out")]
    CaptureTimeout,

    #[error("hotkey conflict registering '{accelerator}': {reason}")]
    HotkeyConflict { accelerator: String, reason: String },

    #[error("could not parse accelerator '{0}'")]
    HotkeyParse(String),

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("request failed with status {code}: {body}")]
    HttpStatus { code: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("window operation failed: {0}")]
    WindowError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::CaptureTimeout | Self::Cancelled => ErrorSeverity::Info,
            Self::HotkeyConflict { .. } | Self::HotkeyParse(_) => ErrorSeverity::Warning,
            Self::InvalidConfig(_) => ErrorSeverity::Warning,
            Self::ClipboardUnavailable(_)
            | Self::NetworkError(_)
            | Self::HttpStatus { .. }
            | Self::Decode(_)
            | Self::WindowError(_)
            | Self::Io(_) => ErrorSeverity::Error,
        }
    }

    /// The single user-visible string the Command Surface hands back to the
    /// UI for terminal, non-swallowed errors (spec.md §7).
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidConfig(msg) => format!("Configuration issue: {msg}"),
            Self::ClipboardUnavailable(msg) => format!("Clipboard unavailable: {msg}"),
            Self::CaptureTimeout => "No text could be captured".to_string(),
            Self::HotkeyConflict { accelerator, reason } => {
                format!("Could not register {accelerator}: {reason}")
            }
            Self::HotkeyParse(raw) => format!("Invalid accelerator: {raw}"),
            Self::NetworkError(msg) => format!("Network error: {msg}"),
            Self::HttpStatus { code, body } => format!("Request failed ({code}): {body}"),
            Self::Decode(msg) => format!("Could not parse response: {msg}"),
            Self::Cancelled => "Cancelled".to_string(),
            Self::WindowError(msg) => msg.clone(),
            Self::Io(e) => format!("I/O error: {e}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Extension trait for logging-and-discarding recoverable failures without
/// propagating them, used at fire-and-forget call sites (hotkey sync,
/// background clipboard restore).
pub trait ResultExt<T> {
    fn log_err(self) -> Option<T>;
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                let caller = std::panic::Location::caller();
                error!(error = ?err, file = caller.file(), line = caller.line(), "operation failed");
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                let caller = std::panic::Location::caller();
                warn!(error = ?err, file = caller.file(), line = caller.line(), "operation had warning");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_timeout_is_never_user_facing_as_invalid_config() {
        assert_eq!(CoreError::CaptureTimeout.severity(), ErrorSeverity::Info);
    }

    #[test]
    fn cancelled_is_info_severity_never_shown_as_error() {
        assert_eq!(CoreError::Cancelled.severity(), ErrorSeverity::Info);
    }

    #[test]
    fn hotkey_conflict_is_warning_not_fatal() {
        let err = CoreError::HotkeyConflict {
            accelerator: "Alt+S".into(),
            reason: "already registered".into(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert!(err.user_message().contains("Alt+S"));
    }

    #[test]
    fn http_status_includes_body_verbatim() {
        let err = CoreError::HttpStatus {
            code: 429,
            body: "rate limited".into(),
        };
        assert!(err.user_message().contains("rate limited"));
        assert!(err.user_message().contains("429"));
    }
}
